pub mod encryption;
pub mod postgrest;
pub mod record_store;
pub mod vault;

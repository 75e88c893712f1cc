pub mod account;
pub mod connection;
pub mod holding;
pub mod link;
pub mod security;
pub mod sync;
pub mod user;

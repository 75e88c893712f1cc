pub mod auth;
pub mod link_service;
pub mod portfolio_store;
pub mod rate_limit;
pub mod sync_service;

pub mod normalize;
pub mod traits;

// Provider client implementations
pub mod plaid;

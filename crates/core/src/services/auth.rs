use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::user::AuthUser;

/// Boundary to the session provider: verifies a bearer token and resolves
/// the current user.
///
/// The auth system itself is an external collaborator; the core only needs
/// this one operation, performed before any vault or provider call. Failures
/// map to `CoreError::Auth` and are always recoverable by re-login.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn verify(&self, bearer_token: &str) -> Result<AuthUser, CoreError>;
}

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The "current user" shape returned by the auth collaborator after
/// verifying a bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
}

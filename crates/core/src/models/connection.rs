use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored link between one user and one provider item.
///
/// `encrypted_secret` is always ciphertext — the plaintext access secret
/// exists only transiently in memory during exchange and use. The record
/// is created on token exchange, read on every sync, and never mutated
/// except for `updated_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    /// Owning user.
    pub user_id: Uuid,

    /// Provider-assigned item identifier (opaque string).
    pub item_id: String,

    /// AES-256-GCM ciphertext of the provider access secret, base64-encoded.
    #[serde(rename = "access_token_encrypted")]
    pub encrypted_secret: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

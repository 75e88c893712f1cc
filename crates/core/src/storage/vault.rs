use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::connection::Connection;
use super::encryption::TokenCipher;
use super::record_store::RecordStore;

/// Store table holding one row per linked provider item.
const CONNECTIONS_TABLE: &str = "provider_connections";

/// Encrypts, persists, and reveals per-user provider access secrets.
///
/// The plaintext secret only ever exists in memory: it is encrypted before
/// the insert and decrypted on demand during a sync. Connection rows are
/// never mutated after creation (unlinking is out of scope).
pub struct CredentialVault {
    cipher: TokenCipher,
    store: Arc<dyn RecordStore>,
}

impl CredentialVault {
    pub fn new(cipher: TokenCipher, store: Arc<dyn RecordStore>) -> Self {
        Self { cipher, store }
    }

    /// Encrypt a freshly exchanged access secret and insert its connection
    /// row. A write that stores nothing is a `Storage` error — the caller
    /// must know the link did not stick.
    pub async fn store_secret(
        &self,
        user_id: Uuid,
        item_id: &str,
        plaintext_secret: &str,
    ) -> Result<Connection, CoreError> {
        let encrypted = self.cipher.encrypt(plaintext_secret)?;
        let now = Utc::now();

        let connection = Connection {
            user_id,
            item_id: item_id.to_string(),
            encrypted_secret: encrypted,
            created_at: now,
            updated_at: now,
        };

        let inserted = self
            .store
            .insert(CONNECTIONS_TABLE, serde_json::to_value(&connection)?)
            .await?;

        if inserted.is_empty() {
            // Re-select: some drivers do not echo inserted rows.
            let reselect = self
                .store
                .select(
                    CONNECTIONS_TABLE,
                    &[
                        ("user_id", user_id.to_string()),
                        ("item_id", item_id.to_string()),
                    ],
                )
                .await?;
            if reselect.is_empty() {
                return Err(CoreError::Storage(format!(
                    "Connection row for item {item_id} was not persisted"
                )));
            }
        }

        info!(user_id = %user_id, item_id, "Stored encrypted access secret");
        Ok(connection)
    }

    /// All stored connections for a user. Empty is a valid, non-error state
    /// — the caller decides whether zero connections is a problem.
    pub async fn list_connections(&self, user_id: Uuid) -> Result<Vec<Connection>, CoreError> {
        let rows = self
            .store
            .select(CONNECTIONS_TABLE, &[("user_id", user_id.to_string())])
            .await?;

        rows.into_iter()
            .map(|row| {
                serde_json::from_value(row)
                    .map_err(|e| CoreError::Storage(format!("Malformed connection row: {e}")))
            })
            .collect()
    }

    /// Decrypt a connection's stored secret. `Decryption` failures are
    /// connection-scoped: one unreadable secret must not take down a whole
    /// sync.
    pub fn reveal(&self, connection: &Connection) -> Result<String, CoreError> {
        self.cipher.decrypt(&connection.encrypted_secret)
    }
}

use thiserror::Error;

/// Unified error type for the entire portfolio-link-core library.
/// Every public function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Auth ────────────────────────────────────────────────────────
    #[error("Authentication failed: {0}")]
    Auth(String),

    // ── Provider ────────────────────────────────────────────────────
    #[error("Provider error ({kind}/{code}): {}", .message.as_deref().unwrap_or(.code.as_str()))]
    Provider {
        kind: String,
        code: String,
        message: Option<String>,
    },

    #[error("No linked accounts for this user")]
    NoLinkedAccounts,

    // ── Crypto ──────────────────────────────────────────────────────
    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Decryption failed — rotated application secret or corrupted ciphertext")]
    Decryption,

    // ── Storage ─────────────────────────────────────────────────────
    #[error("Storage error: {0}")]
    Storage(String),

    // ── Network ─────────────────────────────────────────────────────
    #[error("Network error: {0}")]
    Network(String),

    // ── Configuration / Validation ──────────────────────────────────
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Rate limit exceeded")]
    RateLimited,
}

impl CoreError {
    /// Build a provider error from an upstream error body, preferring the
    /// human-readable display message over the machine code.
    pub fn provider(
        kind: impl Into<String>,
        code: impl Into<String>,
        message: Option<String>,
    ) -> Self {
        CoreError::Provider {
            kind: kind.into(),
            code: code.into(),
            message,
        }
    }
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // Sanitize error message: strip query parameters from URLs to prevent
        // credential leakage. reqwest errors often contain full URLs.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        CoreError::Network(sanitized)
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Storage(format!("Malformed record: {e}"))
    }
}

impl From<aes_gcm::Error> for CoreError {
    fn from(_: aes_gcm::Error) -> Self {
        CoreError::Decryption
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A short-lived session handed to the end-user linking UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkSession {
    pub link_token: String,
    pub expiration: DateTime<Utc>,
}

/// Result of the sandbox-only bootstrap helper: which institution was
/// searched up and linked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxLink {
    pub institution_id: String,
    pub institution_name: Option<String>,
}

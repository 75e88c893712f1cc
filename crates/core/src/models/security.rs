use serde::{Deserialize, Serialize};

/// Reference data describing a tradable instrument.
///
/// Securities are never persisted by this core — they exist only as a
/// lookup table to backfill `symbol`/`name` on holdings that reference
/// them by `external_security_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Security {
    pub external_security_id: String,
    pub symbol: Option<String>,
    pub name: String,
    pub kind: Option<String>,
    pub currency: String,
}

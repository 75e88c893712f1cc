use serde::{Deserialize, Serialize};

use super::account::Account;
use super::holding::Holding;
use super::security::Security;

/// The full aggregate produced by one sync pass: everything fetched across
/// all of a user's connections, in provider-returned order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncResult {
    pub accounts: Vec<Account>,
    pub holdings: Vec<Holding>,
    pub securities: Vec<Security>,
}

/// How one connection fared during a sync pass.
///
/// Per-connection failures never abort the whole sync; the status records
/// which non-fatal path was taken so callers (and tests) can tell the
/// failure modes apart instead of inferring them from missing data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionStatus {
    /// Accounts and holdings both fetched.
    Synced,
    /// Accounts fetched; the holdings endpoint rejected the item (not all
    /// accounts support investment data). Contributes zero holdings.
    HoldingsUnavailable,
    /// Stored secret could not be decrypted; connection skipped entirely.
    SecretUnreadable,
    /// Account listing failed upstream; connection skipped entirely.
    AccountsFetchFailed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionOutcome {
    pub item_id: String,
    pub status: ConnectionStatus,
}

/// Whether the post-fetch upsert made it to the store. A `Failed` persist
/// does not fail the sync — the freshly fetched data is still returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PersistStatus {
    Saved,
    Failed,
}

/// A sync aggregate together with its per-connection outcomes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    pub result: SyncResult,
    pub connections: Vec<ConnectionOutcome>,
    pub persistence: PersistStatus,
}

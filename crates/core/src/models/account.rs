use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One financial account surfaced by a provider connection, already
/// normalized into the canonical schema.
///
/// `external_account_id` is provider-scoped but stable: together with the
/// owning user it forms the idempotency key for persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Provider-assigned account identifier (opaque, stable across syncs).
    pub external_account_id: String,

    /// Display name as reported by the institution (e.g., "Plaid IRA").
    pub name: String,

    /// Primary account type (e.g., "depository", "investment").
    pub kind: String,

    /// Optional refinement of the type (e.g., "checking", "ira").
    pub subkind: Option<String>,

    /// Current balance.
    pub balance: Decimal,

    /// ISO currency code. Providers occasionally omit it; defaults to USD.
    pub currency: String,
}

impl Account {
    /// The type string persisted to the store: the subtype when the provider
    /// reports one, otherwise the primary type.
    pub fn resolved_kind(&self) -> &str {
        self.subkind.as_deref().unwrap_or(&self.kind)
    }
}

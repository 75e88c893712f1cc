use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Symbol stored for holdings whose security could not be resolved.
///
/// Because the store keys holdings on (account, symbol), every unresolved
/// holding on one account collides into a single row. That collapse is
/// intentional, inherited behavior — see the collision test in
/// `tests/store_tests.rs`.
pub const UNKNOWN_SYMBOL: &str = "UNKNOWN";

/// One position within an account.
///
/// `symbol` and `name` start out unresolved ("Unknown Security") and are
/// backfilled from the security registry during reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Holding {
    /// Provider-assigned id of the account this position belongs to.
    pub external_account_id: String,

    /// Provider-assigned id of the underlying security, when known.
    pub external_security_id: Option<String>,

    /// Ticker symbol, resolved from the security registry.
    pub symbol: Option<String>,

    /// Display name of the security.
    pub name: String,

    /// Number of units held.
    pub quantity: Decimal,

    /// Price per unit as reported by the institution.
    pub unit_price: Decimal,

    /// Current market value of the position.
    pub market_value: Decimal,

    /// Total acquisition cost, when the institution reports it.
    pub cost_basis: Option<Decimal>,
}

impl Holding {
    /// Average acquisition cost per unit: cost_basis / quantity when both
    /// are present and quantity is positive, otherwise zero (no division
    /// by zero on empty positions).
    pub fn average_cost(&self) -> Decimal {
        match self.cost_basis {
            Some(basis) if self.quantity > Decimal::ZERO => basis / self.quantity,
            _ => Decimal::ZERO,
        }
    }

    /// Unrealized gain/loss: market value minus cost basis, treating a
    /// missing cost basis as zero.
    pub fn gain_loss(&self) -> Decimal {
        self.market_value - self.cost_basis.unwrap_or(Decimal::ZERO)
    }

    /// The symbol under which this holding is keyed in the store.
    pub fn storage_symbol(&self) -> &str {
        self.symbol.as_deref().unwrap_or(UNKNOWN_SYMBOL)
    }
}

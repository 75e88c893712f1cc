use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::account::Account;
use crate::models::holding::Holding;
use crate::storage::record_store::RecordStore;

const ACCOUNTS_TABLE: &str = "portfolio_accounts";
const HOLDINGS_TABLE: &str = "holdings";

/// Counters for one upsert pass, mirrored into the summary log line.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UpsertSummary {
    pub inserted_accounts: usize,
    pub updated_accounts: usize,
    pub upserted_holdings: usize,
    /// Accounts whose internal id could not be recovered after insert;
    /// their holdings were not written.
    pub skipped_accounts: usize,
}

/// Writes the fetched aggregate into the portfolio tables.
///
/// Idempotency comes from natural keys, not from the store: accounts are
/// keyed by (`user_id`, `plaid_account_id`), holdings by
/// (`account_id`, `symbol`). Each write is an existence-check followed by an
/// insert or update — no transaction spans the pair, so two concurrent syncs
/// for the same user can race (accepted, see DESIGN.md).
pub struct PortfolioStore {
    store: Arc<dyn RecordStore>,
}

impl PortfolioStore {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Upsert all accounts, then each persisted account's holdings.
    ///
    /// An account whose internal id cannot be recovered is skipped along
    /// with its holdings — recorded in the summary, not raised. Derived
    /// holding fields are recomputed here, at write time, rather than
    /// trusted from upstream.
    pub async fn upsert(
        &self,
        user_id: Uuid,
        accounts: &[Account],
        holdings: &[Holding],
    ) -> Result<UpsertSummary, CoreError> {
        let mut summary = UpsertSummary::default();
        let now = chrono::Utc::now();

        for account in accounts {
            let natural_key = [
                ("user_id", user_id.to_string()),
                ("plaid_account_id", account.external_account_id.clone()),
            ];

            let existing = self.store.select(ACCOUNTS_TABLE, &natural_key).await?;

            let mut account_row = json!({
                "user_id": user_id,
                "account_name": account.name,
                "account_type": account.resolved_kind(),
                "total_value": account.balance,
                "plaid_account_id": account.external_account_id,
                "updated_at": now,
            });

            let account_db_id = if let Some(id) = existing.first().and_then(row_id) {
                self.store
                    .update(ACCOUNTS_TABLE, account_row, &[("id", id.clone())])
                    .await?;
                summary.updated_accounts += 1;
                id
            } else {
                account_row["created_at"] = json!(now);
                let inserted = self.store.insert(ACCOUNTS_TABLE, account_row).await?;

                let id = match inserted.first().and_then(row_id) {
                    Some(id) => Some(id),
                    // The store did not echo the new row; recover the id by
                    // re-querying the natural key.
                    None => self
                        .store
                        .select(ACCOUNTS_TABLE, &natural_key)
                        .await?
                        .first()
                        .and_then(row_id),
                };

                match id {
                    Some(id) => {
                        summary.inserted_accounts += 1;
                        id
                    }
                    None => {
                        // Cannot link holdings without a parent id. Data loss
                        // for this account, but not a crash.
                        error!(
                            user_id = %user_id,
                            external_account_id = %account.external_account_id,
                            "Failed to recover inserted account id; skipping its holdings"
                        );
                        summary.skipped_accounts += 1;
                        continue;
                    }
                }
            };

            for holding in holdings
                .iter()
                .filter(|h| h.external_account_id == account.external_account_id)
            {
                self.upsert_holding(&account_db_id, holding, &mut summary).await?;
            }
        }

        info!(
            user_id = %user_id,
            inserted_accounts = summary.inserted_accounts,
            updated_accounts = summary.updated_accounts,
            upserted_holdings = summary.upserted_holdings,
            skipped_accounts = summary.skipped_accounts,
            "Portfolio upsert complete"
        );

        Ok(summary)
    }

    async fn upsert_holding(
        &self,
        account_db_id: &str,
        holding: &Holding,
        summary: &mut UpsertSummary,
    ) -> Result<(), CoreError> {
        let symbol = holding.storage_symbol();
        let now = chrono::Utc::now();

        let mut holding_row = json!({
            "account_id": account_db_id,
            "symbol": symbol,
            "shares": holding.quantity,
            "avg_cost": holding.average_cost(),
            "current_price": holding.unit_price,
            "total_value": holding.market_value,
            "gain_loss": holding.gain_loss(),
            "security_name": holding.name,
            "updated_at": now,
        });

        let natural_key = [
            ("account_id", account_db_id.to_string()),
            ("symbol", symbol.to_string()),
        ];
        let existing = self.store.select(HOLDINGS_TABLE, &natural_key).await?;

        if let Some(id) = existing.first().and_then(row_id) {
            self.store
                .update(HOLDINGS_TABLE, holding_row, &[("id", id)])
                .await?;
        } else {
            holding_row["created_at"] = json!(now);
            self.store.insert(HOLDINGS_TABLE, holding_row).await?;
        }
        summary.upserted_holdings += 1;

        Ok(())
    }
}

/// Internal ids may come back as numbers or strings depending on the
/// column type; filters always travel as strings.
fn row_id(row: &Value) -> Option<String> {
    match row.get("id") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

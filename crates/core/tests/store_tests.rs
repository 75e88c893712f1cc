// ═══════════════════════════════════════════════════════════════════
// Portfolio Store Tests — natural-key upserts
// ═══════════════════════════════════════════════════════════════════

use async_trait::async_trait;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use portfolio_link_core::errors::CoreError;
use portfolio_link_core::models::account::Account;
use portfolio_link_core::models::holding::Holding;
use portfolio_link_core::services::portfolio_store::PortfolioStore;
use portfolio_link_core::storage::record_store::RecordStore;

// ═══════════════════════════════════════════════════════════════════
// In-memory record store
// ═══════════════════════════════════════════════════════════════════

#[derive(Default)]
struct MemoryStore {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    next_id: Mutex<u64>,
    /// Suppress the inserted-row echo, as some drivers do.
    silent_inserts: bool,
    /// Accept inserts but store nothing; the id is unrecoverable.
    dropped_inserts: bool,
}

impl MemoryStore {
    fn silent_inserts() -> Self {
        Self {
            silent_inserts: true,
            ..Self::default()
        }
    }

    fn dropped_inserts() -> Self {
        Self {
            dropped_inserts: true,
            ..Self::default()
        }
    }

    fn rows(&self, table: &str) -> Vec<Value> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }
}

fn value_matches(value: &Value, expected: &str) -> bool {
    match value {
        Value::String(s) => s == expected,
        Value::Number(n) => n.to_string() == expected,
        _ => false,
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn select(
        &self,
        table: &str,
        filters: &[(&str, String)],
    ) -> Result<Vec<Value>, CoreError> {
        let tables = self.tables.lock().unwrap();
        let rows = tables.get(table).cloned().unwrap_or_default();
        Ok(rows
            .into_iter()
            .filter(|row| {
                filters.iter().all(|(col, val)| {
                    row.get(*col).map(|v| value_matches(v, val)).unwrap_or(false)
                })
            })
            .collect())
    }

    async fn insert(&self, table: &str, mut row: Value) -> Result<Vec<Value>, CoreError> {
        if self.dropped_inserts {
            return Ok(Vec::new());
        }
        if row.get("id").is_none() {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            if let Some(obj) = row.as_object_mut() {
                obj.insert("id".to_string(), json!(*next));
            }
        }
        let mut tables = self.tables.lock().unwrap();
        tables.entry(table.to_string()).or_default().push(row.clone());
        if self.silent_inserts {
            Ok(Vec::new())
        } else {
            Ok(vec![row])
        }
    }

    async fn update(
        &self,
        table: &str,
        row: Value,
        filters: &[(&str, String)],
    ) -> Result<Vec<Value>, CoreError> {
        let mut tables = self.tables.lock().unwrap();
        let rows = tables.entry(table.to_string()).or_default();
        let mut updated = Vec::new();
        for existing in rows.iter_mut() {
            let matches = filters.iter().all(|(col, val)| {
                existing.get(*col).map(|v| value_matches(v, val)).unwrap_or(false)
            });
            if matches {
                if let (Some(target), Some(patch)) = (existing.as_object_mut(), row.as_object()) {
                    for (key, value) in patch {
                        target.insert(key.clone(), value.clone());
                    }
                }
                updated.push(existing.clone());
            }
        }
        Ok(updated)
    }
}

// ═══════════════════════════════════════════════════════════════════
// Fixtures
// ═══════════════════════════════════════════════════════════════════

fn account(external_id: &str, name: &str) -> Account {
    Account {
        external_account_id: external_id.to_string(),
        name: name.to_string(),
        kind: "investment".to_string(),
        subkind: Some("brokerage".to_string()),
        balance: dec!(1502.50),
        currency: "USD".to_string(),
    }
}

fn holding(account_external_id: &str, symbol: Option<&str>) -> Holding {
    Holding {
        external_account_id: account_external_id.to_string(),
        external_security_id: Some("sec-1".to_string()),
        symbol: symbol.map(str::to_string),
        name: "Vanguard Total Stock Market ETF".to_string(),
        quantity: dec!(10),
        unit_price: dec!(150.25),
        market_value: dec!(1502.50),
        cost_basis: Some(dec!(1400)),
    }
}

// ═══════════════════════════════════════════════════════════════════
// Upsert behavior
// ═══════════════════════════════════════════════════════════════════

mod upsert {
    use super::*;

    #[tokio::test]
    async fn first_pass_inserts_accounts_and_holdings() {
        let memory = Arc::new(MemoryStore::default());
        let store = PortfolioStore::new(memory.clone());
        let user_id = Uuid::new_v4();

        let summary = store
            .upsert(
                user_id,
                &[account("acct-1", "Brokerage")],
                &[holding("acct-1", Some("VTI"))],
            )
            .await
            .unwrap();

        assert_eq!(summary.inserted_accounts, 1);
        assert_eq!(summary.updated_accounts, 0);
        assert_eq!(summary.upserted_holdings, 1);
        assert_eq!(summary.skipped_accounts, 0);

        assert_eq!(memory.rows("portfolio_accounts").len(), 1);
        assert_eq!(memory.rows("holdings").len(), 1);
    }

    #[tokio::test]
    async fn second_pass_updates_instead_of_duplicating() {
        let memory = Arc::new(MemoryStore::default());
        let store = PortfolioStore::new(memory.clone());
        let user_id = Uuid::new_v4();
        let accounts = [account("acct-1", "Brokerage")];
        let holdings = [holding("acct-1", Some("VTI"))];

        store.upsert(user_id, &accounts, &holdings).await.unwrap();
        let summary = store.upsert(user_id, &accounts, &holdings).await.unwrap();

        assert_eq!(summary.inserted_accounts, 0);
        assert_eq!(summary.updated_accounts, 1);
        assert_eq!(memory.rows("portfolio_accounts").len(), 1);
        assert_eq!(memory.rows("holdings").len(), 1);
    }

    #[tokio::test]
    async fn balance_changes_overwrite_in_place() {
        let memory = Arc::new(MemoryStore::default());
        let store = PortfolioStore::new(memory.clone());
        let user_id = Uuid::new_v4();

        store
            .upsert(user_id, &[account("acct-1", "Brokerage")], &[])
            .await
            .unwrap();

        let mut changed = account("acct-1", "Brokerage");
        changed.balance = dec!(2000);
        store.upsert(user_id, &[changed], &[]).await.unwrap();

        let rows = memory.rows("portfolio_accounts");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["total_value"].as_f64(), Some(2000.0));
    }

    #[tokio::test]
    async fn accounts_are_keyed_per_user() {
        let memory = Arc::new(MemoryStore::default());
        let store = PortfolioStore::new(memory.clone());

        // Same external account id under two different users must not collide.
        store
            .upsert(Uuid::new_v4(), &[account("acct-1", "Brokerage")], &[])
            .await
            .unwrap();
        let summary = store
            .upsert(Uuid::new_v4(), &[account("acct-1", "Brokerage")], &[])
            .await
            .unwrap();

        assert_eq!(summary.inserted_accounts, 1);
        assert_eq!(memory.rows("portfolio_accounts").len(), 2);
    }

    #[tokio::test]
    async fn derived_fields_are_recomputed_at_write_time() {
        let memory = Arc::new(MemoryStore::default());
        let store = PortfolioStore::new(memory.clone());

        store
            .upsert(
                Uuid::new_v4(),
                &[account("acct-1", "Brokerage")],
                &[holding("acct-1", Some("VTI"))],
            )
            .await
            .unwrap();

        let rows = memory.rows("holdings");
        assert_eq!(rows[0]["avg_cost"].as_f64(), Some(140.0));
        assert_eq!(rows[0]["gain_loss"].as_f64(), Some(102.5));
        assert_eq!(rows[0]["shares"].as_f64(), Some(10.0));
        assert_eq!(rows[0]["security_name"], json!("Vanguard Total Stock Market ETF"));
    }

    #[tokio::test]
    async fn account_type_uses_resolved_kind() {
        let memory = Arc::new(MemoryStore::default());
        let store = PortfolioStore::new(memory.clone());

        store
            .upsert(Uuid::new_v4(), &[account("acct-1", "Brokerage")], &[])
            .await
            .unwrap();

        let rows = memory.rows("portfolio_accounts");
        assert_eq!(rows[0]["account_type"], json!("brokerage"));
    }
}

// ═══════════════════════════════════════════════════════════════════
// Degraded store behavior
// ═══════════════════════════════════════════════════════════════════

mod degraded {
    use super::*;

    #[tokio::test]
    async fn silent_insert_recovers_id_by_reselect() {
        let memory = Arc::new(MemoryStore::silent_inserts());
        let store = PortfolioStore::new(memory.clone());

        let summary = store
            .upsert(
                Uuid::new_v4(),
                &[account("acct-1", "Brokerage")],
                &[holding("acct-1", Some("VTI"))],
            )
            .await
            .unwrap();

        assert_eq!(summary.inserted_accounts, 1);
        assert_eq!(summary.skipped_accounts, 0);

        // Holdings were linked to the re-selected account id.
        let accounts = memory.rows("portfolio_accounts");
        let holdings = memory.rows("holdings");
        assert_eq!(holdings.len(), 1);
        assert_eq!(
            holdings[0]["account_id"].as_str().unwrap(),
            accounts[0]["id"].to_string()
        );
    }

    #[tokio::test]
    async fn unrecoverable_account_id_skips_its_holdings() {
        let memory = Arc::new(MemoryStore::dropped_inserts());
        let store = PortfolioStore::new(memory.clone());

        let summary = store
            .upsert(
                Uuid::new_v4(),
                &[account("acct-1", "Brokerage")],
                &[holding("acct-1", Some("VTI"))],
            )
            .await
            .unwrap();

        assert_eq!(summary.skipped_accounts, 1);
        assert_eq!(summary.upserted_holdings, 0);
        assert!(memory.rows("holdings").is_empty());
    }
}

// ═══════════════════════════════════════════════════════════════════
// Unresolved-symbol collision
// ═══════════════════════════════════════════════════════════════════

mod unknown_symbol {
    use super::*;

    #[tokio::test]
    async fn symbolless_holdings_collapse_into_one_row() {
        let memory = Arc::new(MemoryStore::default());
        let store = PortfolioStore::new(memory.clone());

        // Two distinct unresolved positions on the same account share the
        // UNKNOWN key, so the second write lands on the first row.
        let mut second = holding("acct-1", None);
        second.external_security_id = Some("sec-2".to_string());
        second.market_value = dec!(500);

        let summary = store
            .upsert(
                Uuid::new_v4(),
                &[account("acct-1", "Brokerage")],
                &[holding("acct-1", None), second],
            )
            .await
            .unwrap();

        assert_eq!(summary.upserted_holdings, 2);

        let rows = memory.rows("holdings");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["symbol"], json!("UNKNOWN"));
        // Last write wins.
        assert_eq!(rows[0]["total_value"].as_f64(), Some(500.0));
    }
}

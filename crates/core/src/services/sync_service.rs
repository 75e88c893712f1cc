use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::security::Security;
use crate::models::sync::{
    ConnectionOutcome, ConnectionStatus, PersistStatus, SyncReport, SyncResult,
};
use crate::providers::traits::ProviderClient;
use crate::storage::vault::CredentialVault;
use super::portfolio_store::PortfolioStore;

/// Orchestrates one sync pass: for every stored connection, fetch accounts
/// and holdings, merge the security registry into the holdings, then upsert
/// the whole aggregate into the portfolio store.
///
/// Failure policy (partial results beat none):
/// - unreadable secret → skip that connection, keep going
/// - account listing failed → skip that connection, keep going
/// - holdings fetch failed → keep the connection's accounts, zero holdings
/// - persistence failed → log it; the freshly fetched data is still returned
pub struct SyncService {
    provider: Arc<dyn ProviderClient>,
    vault: Arc<CredentialVault>,
    portfolio: PortfolioStore,
}

impl SyncService {
    pub fn new(
        provider: Arc<dyn ProviderClient>,
        vault: Arc<CredentialVault>,
        portfolio: PortfolioStore,
    ) -> Self {
        Self {
            provider,
            vault,
            portfolio,
        }
    }

    /// Run a full sync for one user.
    ///
    /// Connections are processed sequentially: the security registry is
    /// shared mutably across the loop, and serialized provider calls sit
    /// better with upstream rate limits. All state is call-local, so
    /// concurrent syncs for different users don't interact.
    pub async fn sync(&self, user_id: Uuid) -> Result<SyncReport, CoreError> {
        let connections = self.vault.list_connections(user_id).await?;
        if connections.is_empty() {
            return Err(CoreError::NoLinkedAccounts);
        }

        info!(
            user_id = %user_id,
            connections = connections.len(),
            "Sync: loaded stored connections"
        );

        let mut aggregate = SyncResult::default();
        let mut outcomes = Vec::with_capacity(connections.len());

        for connection in &connections {
            let item_id = connection.item_id.clone();

            let secret = match self.vault.reveal(connection) {
                Ok(secret) => secret,
                Err(e) => {
                    warn!(item_id, %e, "Sync: stored secret unreadable; skipping connection");
                    outcomes.push(ConnectionOutcome {
                        item_id,
                        status: ConnectionStatus::SecretUnreadable,
                    });
                    continue;
                }
            };

            let accounts = match self.provider.fetch_accounts(&secret).await {
                Ok(accounts) => accounts,
                Err(e) => {
                    error!(item_id, %e, "Sync: account listing failed; skipping connection");
                    outcomes.push(ConnectionOutcome {
                        item_id,
                        status: ConnectionStatus::AccountsFetchFailed,
                    });
                    continue;
                }
            };

            info!(item_id, accounts = accounts.len(), "Sync: accounts fetched");
            aggregate.accounts.extend(accounts);

            let status = match self.provider.fetch_holdings(&secret).await {
                Ok((holdings, securities)) => {
                    info!(
                        item_id,
                        holdings = holdings.len(),
                        securities = securities.len(),
                        "Sync: holdings fetched"
                    );
                    aggregate.holdings.extend(holdings);
                    aggregate.securities.extend(securities);

                    // Backfill runs against the whole aggregate after each
                    // connection's fetch, so a later connection's registry can
                    // still enrich an earlier connection's holdings when ids
                    // coincide. Duplicate ids resolve last-write-wins.
                    backfill_symbols(&mut aggregate);

                    ConnectionStatus::Synced
                }
                Err(e) => {
                    // Some items simply don't support the investments
                    // endpoint; their accounts still count.
                    warn!(item_id, %e, "Sync: could not fetch holdings for item");
                    ConnectionStatus::HoldingsUnavailable
                }
            };

            outcomes.push(ConnectionOutcome { item_id, status });
        }

        let persistence = match self
            .portfolio
            .upsert(user_id, &aggregate.accounts, &aggregate.holdings)
            .await
        {
            Ok(_) => PersistStatus::Saved,
            Err(e) => {
                // Returning accurate provider data outranks store consistency
                // for this call; the failure is logged, not raised.
                error!(user_id = %user_id, %e, "Sync: failed to persist portfolio data");
                PersistStatus::Failed
            }
        };

        info!(
            user_id = %user_id,
            accounts = aggregate.accounts.len(),
            holdings = aggregate.holdings.len(),
            "Sync: pass complete"
        );

        Ok(SyncReport {
            result: aggregate,
            connections: outcomes,
            persistence,
        })
    }
}

/// Resolve `symbol`/`name` on every holding whose security id appears in
/// the registry accumulated so far.
fn backfill_symbols(aggregate: &mut SyncResult) {
    let registry: HashMap<&str, &Security> = aggregate
        .securities
        .iter()
        .map(|s| (s.external_security_id.as_str(), s))
        .collect();

    for holding in &mut aggregate.holdings {
        let Some(security_id) = holding.external_security_id.as_deref() else {
            continue;
        };
        if let Some(security) = registry.get(security_id) {
            holding.symbol = security.symbol.clone();
            holding.name = security.name.clone();
        }
    }
}

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::account::Account;
use crate::models::holding::Holding;
use crate::models::link::LinkSession;
use crate::models::security::Security;
use crate::providers::plaid::ProviderEnvironment;

/// Result of a one-shot public-token exchange.
///
/// Not idempotent: the same public token must not be replayed after a
/// successful exchange.
#[derive(Debug, Clone)]
pub struct TokenExchange {
    /// The long-lived access secret. Plaintext only in memory — the vault
    /// encrypts it before it touches the store.
    pub access_token: String,
    /// Provider-side identifier for the linked institution session.
    pub item_id: String,
}

/// An institution returned by a provider search.
#[derive(Debug, Clone)]
pub struct Institution {
    pub institution_id: String,
    pub name: String,
}

/// Trait abstraction over the financial-data provider's API.
///
/// The reconciliation engine only ever sees canonical types; all response
/// shape variance is resolved inside the implementation. Swapping providers
/// (or mocking one in tests) touches nothing else.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Which environment this client is configured against.
    fn environment(&self) -> ProviderEnvironment;

    /// Request a short-lived session token for the end-user linking UI.
    async fn create_link_session(
        &self,
        user_id: Uuid,
        user_email: &str,
    ) -> Result<LinkSession, CoreError>;

    /// Exchange a public token for a long-lived access secret. One-shot.
    async fn exchange_public_token(
        &self,
        public_token: &str,
    ) -> Result<TokenExchange, CoreError>;

    /// List the accounts reachable through an access secret.
    ///
    /// A failure here aborts the owning connection's sync entirely.
    async fn fetch_accounts(&self, access_token: &str) -> Result<Vec<Account>, CoreError>;

    /// Fetch investment holdings and their security registry.
    ///
    /// May legitimately fail per connection — not every account supports
    /// investment data. Callers treat that as "zero holdings", not fatal.
    async fn fetch_holdings(
        &self,
        access_token: &str,
    ) -> Result<(Vec<Holding>, Vec<Security>), CoreError>;

    /// Search institutions supporting investments (sandbox bootstrap).
    async fn search_institutions(&self, query: &str) -> Result<Vec<Institution>, CoreError>;

    /// Create a sandbox public token for an institution (sandbox only).
    async fn create_sandbox_public_token(
        &self,
        institution_id: &str,
    ) -> Result<String, CoreError>;
}

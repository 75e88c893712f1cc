pub mod config;
pub mod errors;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;

use std::sync::Arc;

use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use config::AppConfig;
use errors::CoreError;
use models::link::{LinkSession, SandboxLink};
use models::sync::{SyncReport, SyncResult};
use models::user::AuthUser;
use providers::plaid::PlaidClient;
use providers::traits::ProviderClient;
use services::auth::AuthProvider;
use services::link_service::LinkService;
use services::portfolio_store::PortfolioStore;
use services::rate_limit::RateLimiter;
use services::sync_service::SyncService;
use storage::encryption::TokenCipher;
use storage::postgrest::PostgrestStore;
use storage::record_store::RecordStore;
use storage::vault::CredentialVault;

/// Main entry point for the account-linking and reconciliation core.
///
/// Wires the provider client, credential vault, portfolio store, and rate
/// limiter together and exposes the boundary operations: authorize, create
/// a link session, complete a link, sync, and the sandbox bootstrap helper.
/// All state is per-call; one instance serves all users concurrently.
#[must_use]
pub struct PortfolioLink {
    store: Arc<dyn RecordStore>,
    auth: Arc<dyn AuthProvider>,
    link_service: LinkService,
    sync_service: SyncService,
    rate_limiter: RateLimiter,
}

impl PortfolioLink {
    /// Build the production wiring from configuration: Plaid client against
    /// the configured environment, PostgREST record store, vault key derived
    /// from the application secret.
    pub fn from_config(
        config: &AppConfig,
        auth: Arc<dyn AuthProvider>,
    ) -> Result<Self, CoreError> {
        let provider: Arc<dyn ProviderClient> = Arc::new(PlaidClient::new(
            config.provider_client_id.clone(),
            config.provider_secret.clone(),
            config.provider_env,
        ));
        let store: Arc<dyn RecordStore> =
            Arc::new(PostgrestStore::new(&config.store_url, &config.store_api_key));
        Self::with_parts(provider, store, auth, &config.app_secret)
    }

    /// Build from explicit parts. This is the seam tests use to inject mock
    /// providers and in-memory stores.
    pub fn with_parts(
        provider: Arc<dyn ProviderClient>,
        store: Arc<dyn RecordStore>,
        auth: Arc<dyn AuthProvider>,
        app_secret: &str,
    ) -> Result<Self, CoreError> {
        let cipher = TokenCipher::new(app_secret)?;
        let vault = Arc::new(CredentialVault::new(cipher, store.clone()));

        let link_service = LinkService::new(provider.clone(), vault.clone());
        let sync_service = SyncService::new(
            provider,
            vault,
            PortfolioStore::new(store.clone()),
        );

        Ok(Self {
            store,
            auth,
            link_service,
            sync_service,
            rate_limiter: RateLimiter::default(),
        })
    }

    // ── Boundary operations ─────────────────────────────────────────

    /// Resolve the current user from a bearer token. Runs the per-caller
    /// rate limiter first, then the auth collaborator.
    pub async fn authorize(&self, bearer_token: &str) -> Result<AuthUser, CoreError> {
        self.rate_limiter.check(bearer_token)?;
        self.auth.verify(bearer_token).await
    }

    /// Create a short-lived session for the end-user linking UI.
    pub async fn create_link_session(
        &self,
        user_id: Uuid,
        user_email: &str,
    ) -> Result<LinkSession, CoreError> {
        self.link_service.create_link_session(user_id, user_email).await
    }

    /// Exchange a public token and persist the new connection. One-shot; do
    /// not replay the same public token after success.
    pub async fn complete_link(
        &self,
        user_id: Uuid,
        public_token: &str,
    ) -> Result<bool, CoreError> {
        self.link_service.complete_link(user_id, public_token).await
    }

    /// Fetch, reconcile, and persist all of a user's connections, returning
    /// the full aggregate. Fails with `NoLinkedAccounts` when the user has
    /// no stored connections.
    pub async fn sync(&self, user_id: Uuid) -> Result<SyncResult, CoreError> {
        Ok(self.sync_service.sync(user_id).await?.result)
    }

    /// Like [`sync`](Self::sync), but also returns the per-connection
    /// outcomes and persistence status for callers that need to distinguish
    /// the non-fatal failure modes.
    pub async fn sync_with_report(&self, user_id: Uuid) -> Result<SyncReport, CoreError> {
        self.sync_service.sync(user_id).await
    }

    /// Sandbox-only: link a sandbox investments institution and run an
    /// initial sync to populate the portfolio tables.
    pub async fn sandbox_bootstrap(
        &self,
        user_id: Uuid,
        query: Option<&str>,
        institution_id: Option<&str>,
    ) -> Result<SandboxLink, CoreError> {
        let link = self
            .link_service
            .sandbox_link(user_id, query, institution_id)
            .await?;
        self.sync_service.sync(user_id).await?;
        Ok(link)
    }

    /// Read back the persisted portfolio: account rows with their holdings
    /// nested under a `holdings` key.
    pub async fn portfolio(&self, user_id: Uuid) -> Result<Vec<Value>, CoreError> {
        let mut accounts = self
            .store
            .select("portfolio_accounts", &[("user_id", user_id.to_string())])
            .await?;

        for account in &mut accounts {
            let holdings = match account.get("id") {
                Some(Value::String(id)) => {
                    self.store
                        .select("holdings", &[("account_id", id.clone())])
                        .await?
                }
                Some(Value::Number(id)) => {
                    self.store
                        .select("holdings", &[("account_id", id.to_string())])
                        .await?
                }
                _ => Vec::new(),
            };
            if let Some(obj) = account.as_object_mut() {
                obj.insert("holdings".into(), Value::Array(holdings));
            }
        }

        info!(user_id = %user_id, accounts = accounts.len(), "Portfolio read-back");
        Ok(accounts)
    }
}

use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::link::{LinkSession, SandboxLink};
use crate::providers::plaid::ProviderEnvironment;
use crate::providers::traits::ProviderClient;
use crate::storage::vault::CredentialVault;

/// Establishes new provider connections: link sessions, the one-shot
/// public-token exchange, and the sandbox bootstrap helper.
///
/// Unlike the sync path, storage failures here are fatal and reported to
/// the caller — a link that did not persist must not look successful.
pub struct LinkService {
    provider: Arc<dyn ProviderClient>,
    vault: Arc<CredentialVault>,
}

impl LinkService {
    pub fn new(provider: Arc<dyn ProviderClient>, vault: Arc<CredentialVault>) -> Self {
        Self { provider, vault }
    }

    /// Request a short-lived session token for the linking UI. Upstream
    /// rejections surface directly; there is no local retry.
    pub async fn create_link_session(
        &self,
        user_id: Uuid,
        user_email: &str,
    ) -> Result<LinkSession, CoreError> {
        info!(user_id = %user_id, "Creating link session");
        self.provider.create_link_session(user_id, user_email).await
    }

    /// Exchange a public token and store the resulting secret. The exchange
    /// is one-shot: a public token must not be replayed after success.
    pub async fn complete_link(
        &self,
        user_id: Uuid,
        public_token: &str,
    ) -> Result<bool, CoreError> {
        let exchange = self.provider.exchange_public_token(public_token).await?;
        self.vault
            .store_secret(user_id, &exchange.item_id, &exchange.access_token)
            .await?;
        Ok(true)
    }

    /// Search up a sandbox investments institution, mint a public token for
    /// it, and link it — a test-environment shortcut around the end-user UI.
    ///
    /// Hard-gated on the sandbox environment: invoked anywhere else it fails
    /// with a configuration error before touching the provider.
    pub async fn sandbox_link(
        &self,
        user_id: Uuid,
        query: Option<&str>,
        institution_id: Option<&str>,
    ) -> Result<SandboxLink, CoreError> {
        if self.provider.environment() != ProviderEnvironment::Sandbox {
            return Err(CoreError::Config(
                "Sandbox bootstrap is only available in the sandbox environment".into(),
            ));
        }

        let (institution_id, institution_name) = match institution_id {
            Some(id) => (id.to_string(), None),
            None => {
                let query = query.unwrap_or("invest");
                let institutions = self.provider.search_institutions(query).await?;
                let Some(first) = institutions.into_iter().next() else {
                    error!(query, "No sandbox investments institutions found");
                    return Err(CoreError::Validation(format!(
                        "No sandbox investments institutions found for query '{query}'"
                    )));
                };
                (first.institution_id, Some(first.name))
            }
        };

        let public_token = self
            .provider
            .create_sandbox_public_token(&institution_id)
            .await?;
        self.complete_link(user_id, &public_token).await?;

        info!(user_id = %user_id, institution_id, "Sandbox institution linked");
        Ok(SandboxLink {
            institution_id,
            institution_name,
        })
    }
}

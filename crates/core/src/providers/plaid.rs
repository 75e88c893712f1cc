use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::account::Account;
use crate::models::holding::Holding;
use crate::models::link::LinkSession;
use crate::models::security::Security;
use super::normalize::{currency_or_default, enum_to_string, EnumField, NumField};
use super::traits::{Institution, ProviderClient, TokenExchange};

const SANDBOX_HOST: &str = "https://sandbox.plaid.com";
const PRODUCTION_HOST: &str = "https://production.plaid.com";

/// Which Plaid environment to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderEnvironment {
    Sandbox,
    Development,
    Production,
}

impl ProviderEnvironment {
    /// Parse from a config string, case-insensitively. Unknown values fall
    /// back to sandbox rather than failing startup.
    pub fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "production" => ProviderEnvironment::Production,
            "development" => ProviderEnvironment::Development,
            _ => ProviderEnvironment::Sandbox,
        }
    }

    /// API host for this environment. Development uses the sandbox host —
    /// Plaid retired the separate development stack.
    pub fn host(&self) -> &'static str {
        match self {
            ProviderEnvironment::Production => PRODUCTION_HOST,
            _ => SANDBOX_HOST,
        }
    }

}

/// Plaid REST API client.
///
/// Every call is a JSON POST carrying `client_id`/`secret` in the body.
/// Non-2xx responses carry a structured error body which is mapped into
/// `CoreError::Provider` with the upstream display message when present.
pub struct PlaidClient {
    client: Client,
    client_id: String,
    secret: String,
    environment: ProviderEnvironment,
    base_url: String,
}

impl PlaidClient {
    pub fn new(
        client_id: impl Into<String>,
        secret: impl Into<String>,
        environment: ProviderEnvironment,
    ) -> Self {
        let base_url = environment.host().to_string();
        Self::with_base_url(client_id, secret, environment, base_url)
    }

    /// Construct against an explicit base URL (mock servers in tests).
    pub fn with_base_url(
        client_id: impl Into<String>,
        secret: impl Into<String>,
        environment: ProviderEnvironment,
        base_url: impl Into<String>,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            client_id: client_id.into(),
            secret: secret.into(),
            environment,
            base_url: base_url.into(),
        }
    }

    /// POST a JSON body (credentials injected) and deserialize the response,
    /// mapping upstream error bodies into `CoreError::Provider`.
    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        mut body: serde_json::Value,
    ) -> Result<T, CoreError> {
        if let Some(obj) = body.as_object_mut() {
            obj.insert("client_id".into(), json!(self.client_id));
            obj.insert("secret".into(), json!(self.secret));
        }

        let url = format!("{}{path}", self.base_url);
        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let error: ErrorBody = response.json().await.unwrap_or_default();
            return Err(CoreError::provider(
                error.error_type.unwrap_or_else(|| "UNKNOWN".into()),
                error.error_code.unwrap_or_else(|| status.to_string()),
                error.display_message,
            ));
        }

        response.json().await.map_err(|e| CoreError::Provider {
            kind: "API_RESPONSE".into(),
            code: "MALFORMED_BODY".into(),
            message: Some(format!("Failed to parse {path} response: {e}")),
        })
    }
}

// ── Wire types ──────────────────────────────────────────────────────
// Field shapes go through the normalize layer: enum-like fields may be
// plain strings or `{value}` objects, numerics may be numbers, strings,
// or null.

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error_type: Option<String>,
    error_code: Option<String>,
    display_message: Option<String>,
}

#[derive(Deserialize)]
struct LinkTokenResponse {
    link_token: String,
    expiration: DateTime<Utc>,
}

#[derive(Deserialize)]
struct ExchangeResponse {
    access_token: String,
    item_id: String,
}

#[derive(Deserialize)]
struct AccountsResponse {
    #[serde(default)]
    accounts: Vec<AccountWire>,
}

#[derive(Deserialize)]
struct AccountWire {
    account_id: String,
    name: String,
    #[serde(rename = "type")]
    kind: EnumField,
    subtype: Option<EnumField>,
    balances: Option<BalancesWire>,
}

#[derive(Default, Deserialize)]
struct BalancesWire {
    #[serde(default)]
    current: NumField,
    iso_currency_code: Option<String>,
}

impl AccountWire {
    fn into_account(self) -> Account {
        let balances = self.balances.unwrap_or_default();
        Account {
            external_account_id: self.account_id,
            name: self.name,
            kind: self.kind.into_inner(),
            subkind: enum_to_string(self.subtype),
            balance: balances.current.to_decimal(),
            currency: currency_or_default(balances.iso_currency_code),
        }
    }
}

#[derive(Deserialize)]
struct HoldingsResponse {
    #[serde(default)]
    holdings: Vec<HoldingWire>,
    #[serde(default)]
    securities: Vec<SecurityWire>,
}

#[derive(Deserialize)]
struct HoldingWire {
    account_id: String,
    security_id: Option<String>,
    #[serde(default)]
    quantity: NumField,
    #[serde(default)]
    institution_price: NumField,
    #[serde(default)]
    institution_value: NumField,
    #[serde(default)]
    cost_basis: NumField,
}

impl HoldingWire {
    fn into_holding(self) -> Holding {
        Holding {
            external_account_id: self.account_id,
            external_security_id: self.security_id,
            // Resolved later from the security registry during reconciliation.
            symbol: None,
            name: "Unknown Security".to_string(),
            quantity: self.quantity.to_decimal(),
            unit_price: self.institution_price.to_decimal(),
            market_value: self.institution_value.to_decimal(),
            cost_basis: self.cost_basis.to_decimal_opt(),
        }
    }
}

#[derive(Deserialize)]
struct SecurityWire {
    security_id: String,
    ticker_symbol: Option<String>,
    name: Option<String>,
    #[serde(rename = "type")]
    kind: Option<EnumField>,
    iso_currency_code: Option<String>,
}

impl SecurityWire {
    fn into_security(self) -> Security {
        Security {
            external_security_id: self.security_id,
            symbol: self.ticker_symbol,
            name: self.name.unwrap_or_else(|| "Unknown Security".to_string()),
            kind: enum_to_string(self.kind),
            currency: currency_or_default(self.iso_currency_code),
        }
    }
}

#[derive(Deserialize)]
struct InstitutionsResponse {
    #[serde(default)]
    institutions: Vec<InstitutionWire>,
}

#[derive(Deserialize)]
struct InstitutionWire {
    institution_id: String,
    name: String,
}

#[derive(Deserialize)]
struct SandboxTokenResponse {
    public_token: String,
}

#[derive(Serialize)]
struct LinkUser {
    client_user_id: String,
}

#[async_trait]
impl ProviderClient for PlaidClient {
    fn name(&self) -> &str {
        "Plaid"
    }

    fn environment(&self) -> ProviderEnvironment {
        self.environment
    }

    async fn create_link_session(
        &self,
        user_id: Uuid,
        _user_email: &str,
    ) -> Result<LinkSession, CoreError> {
        let body = json!({
            "client_name": "Portfolio App",
            "language": "en",
            "country_codes": ["US"],
            "products": ["investments"],
            "user": LinkUser { client_user_id: user_id.to_string() },
        });

        let resp: LinkTokenResponse = self.post("/link/token/create", body).await?;
        Ok(LinkSession {
            link_token: resp.link_token,
            expiration: resp.expiration,
        })
    }

    async fn exchange_public_token(
        &self,
        public_token: &str,
    ) -> Result<TokenExchange, CoreError> {
        let body = json!({ "public_token": public_token });
        let resp: ExchangeResponse = self.post("/item/public_token/exchange", body).await?;
        Ok(TokenExchange {
            access_token: resp.access_token,
            item_id: resp.item_id,
        })
    }

    async fn fetch_accounts(&self, access_token: &str) -> Result<Vec<Account>, CoreError> {
        let body = json!({ "access_token": access_token });
        let resp: AccountsResponse = self.post("/accounts/get", body).await?;
        Ok(resp.accounts.into_iter().map(AccountWire::into_account).collect())
    }

    async fn fetch_holdings(
        &self,
        access_token: &str,
    ) -> Result<(Vec<Holding>, Vec<Security>), CoreError> {
        let body = json!({ "access_token": access_token });
        let resp: HoldingsResponse = self.post("/investments/holdings/get", body).await?;
        let holdings = resp.holdings.into_iter().map(HoldingWire::into_holding).collect();
        let securities = resp
            .securities
            .into_iter()
            .map(SecurityWire::into_security)
            .collect();
        Ok((holdings, securities))
    }

    async fn search_institutions(&self, query: &str) -> Result<Vec<Institution>, CoreError> {
        let body = json!({
            "query": query,
            "products": ["investments"],
            "country_codes": ["US"],
        });
        let resp: InstitutionsResponse = self.post("/institutions/search", body).await?;
        Ok(resp
            .institutions
            .into_iter()
            .map(|i| Institution {
                institution_id: i.institution_id,
                name: i.name,
            })
            .collect())
    }

    async fn create_sandbox_public_token(
        &self,
        institution_id: &str,
    ) -> Result<String, CoreError> {
        let body = json!({
            "institution_id": institution_id,
            "initial_products": ["investments"],
        });
        let resp: SandboxTokenResponse = self.post("/sandbox/public_token/create", body).await?;
        Ok(resp.public_token)
    }
}

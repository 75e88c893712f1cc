use crate::errors::CoreError;
use crate::providers::plaid::ProviderEnvironment;

/// Process-wide configuration, read once at startup from the environment.
///
/// `app_secret` is the password fed into the token cipher's key derivation.
/// It must stay stable across restarts — rotating it makes every stored
/// connection secret undecryptable.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Provider API credentials.
    pub provider_client_id: String,
    pub provider_secret: String,
    /// Which provider environment to talk to (sandbox by default).
    pub provider_env: ProviderEnvironment,

    /// Base URL of the record store's REST endpoint.
    pub store_url: String,
    /// API key sent with every store request.
    pub store_api_key: String,

    /// Application-level secret used to derive the credential-vault key.
    pub app_secret: String,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Required: `STORE_URL`, `STORE_API_KEY`, `PROVIDER_CLIENT_ID`,
    /// `PROVIDER_SECRET`. Optional: `PROVIDER_ENV` (defaults to sandbox),
    /// `APP_SECRET` (defaults to the store API key, mirroring deployments
    /// where the two are provisioned together).
    pub fn from_env() -> Result<Self, CoreError> {
        let require = |key: &str| {
            std::env::var(key)
                .map_err(|_| CoreError::Config(format!("Missing environment variable {key}")))
        };

        let store_api_key = require("STORE_API_KEY")?;
        let app_secret = std::env::var("APP_SECRET").unwrap_or_else(|_| store_api_key.clone());

        Ok(Self {
            provider_client_id: require("PROVIDER_CLIENT_ID")?,
            provider_secret: require("PROVIDER_SECRET")?,
            provider_env: std::env::var("PROVIDER_ENV")
                .map(|v| ProviderEnvironment::parse(&v))
                .unwrap_or(ProviderEnvironment::Sandbox),
            store_url: require("STORE_URL")?,
            store_api_key,
            app_secret,
        })
    }
}

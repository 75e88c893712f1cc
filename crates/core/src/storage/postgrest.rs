use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::errors::CoreError;
use super::record_store::RecordStore;

/// `RecordStore` backed by a PostgREST endpoint (Supabase-style).
///
/// Filters become `column=eq.value` query parameters. Inserts and updates
/// ask for `return=representation` so the store echoes the affected rows;
/// row-level security can still cause an empty echo, which callers handle
/// via the re-select fallback.
pub struct PostgrestStore {
    client: Client,
    base_url: String,
    api_key: String,
    bearer: String,
}

impl PostgrestStore {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let api_key = api_key.into();
        let bearer = api_key.clone();
        Self::with_bearer(base_url, api_key, bearer)
    }

    /// Use the caller's own bearer token so row-level security policies
    /// evaluate against the end user rather than the service key.
    pub fn with_bearer(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        bearer: impl Into<String>,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            bearer: bearer.into(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    fn eq_filters(filters: &[(&str, String)]) -> Vec<(String, String)> {
        filters
            .iter()
            .map(|(col, val)| ((*col).to_string(), format!("eq.{val}")))
            .collect()
    }

    async fn read_rows(&self, response: reqwest::Response) -> Result<Vec<Value>, CoreError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CoreError::Storage(format!("Store returned {status}: {body}")));
        }

        if response.content_length() == Some(0) {
            return Ok(Vec::new());
        }

        match response.json::<Value>().await {
            Ok(Value::Array(rows)) => Ok(rows),
            Ok(Value::Null) => Ok(Vec::new()),
            Ok(other) => Ok(vec![other]),
            // Stores without return=representation support reply with an
            // empty body; treat that as "no rows echoed".
            Err(_) => Ok(Vec::new()),
        }
    }
}

#[async_trait]
impl RecordStore for PostgrestStore {
    async fn select(
        &self,
        table: &str,
        filters: &[(&str, String)],
    ) -> Result<Vec<Value>, CoreError> {
        let response = self
            .client
            .get(self.table_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.bearer)
            .query(&Self::eq_filters(filters))
            .send()
            .await?;
        self.read_rows(response).await
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Vec<Value>, CoreError> {
        let response = self
            .client
            .post(self.table_url(table))
            .header("apikey", &self.api_key)
            .header("Prefer", "return=representation")
            .bearer_auth(&self.bearer)
            .json(&row)
            .send()
            .await?;
        self.read_rows(response).await
    }

    async fn update(
        &self,
        table: &str,
        row: Value,
        filters: &[(&str, String)],
    ) -> Result<Vec<Value>, CoreError> {
        let response = self
            .client
            .patch(self.table_url(table))
            .header("apikey", &self.api_key)
            .header("Prefer", "return=representation")
            .bearer_auth(&self.bearer)
            .query(&Self::eq_filters(filters))
            .json(&row)
            .send()
            .await?;
        self.read_rows(response).await
    }
}

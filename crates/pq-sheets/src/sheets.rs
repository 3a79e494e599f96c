//! Google Sheets v4 values API as a [`TabularStore`]
//!
//! Endpoints used:
//! - `GET    /v4/spreadsheets/{id}/values/{range}`
//! - `POST   /v4/spreadsheets/{id}/values/{range}:clear`
//! - `PUT    /v4/spreadsheets/{id}/values/{anchor}?valueInputOption=RAW`
//! - `GET    /v4/spreadsheets/{id}?fields=sheets.properties.title`
//! - `POST   /v4/spreadsheets/{id}:batchUpdate` (`addSheet`)
//!
//! Cells come back as JSON values; anything that is not a string is
//! stringified so the codec only ever sees text.

use crate::config::{SheetsConfig, SHEETS_SCOPE};
use crate::error::{error_message, store_transport, AdapterError};
use async_trait::async_trait;
use parking_lot::Mutex;
use pq_core::Row;
use pq_sync::tabular::anchor_a1;
use pq_sync::{StoreError, TabRange, TabularStore};
use reqwest::{Method, Response, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

/// Where bearer tokens come from
#[derive(Clone)]
enum Credentials {
    Static(String),
    Provider(Arc<dyn gcp_auth::TokenProvider>),
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Static(_) => f.write_str("Static(..)"),
            Self::Provider(_) => f.write_str("Provider(..)"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueWrite<'a> {
    range: &'a str,
    major_dimension: &'static str,
    values: &'a [Row],
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

/// Sheets API client for one spreadsheet
#[derive(Debug)]
pub struct SheetsApiStore {
    config: SheetsConfig,
    base: Url,
    client: reqwest::Client,
    credentials: Credentials,
    known_tabs: Mutex<HashSet<String>>,
}

impl SheetsApiStore {
    /// Build a client.
    ///
    /// Credentials are taken from, in order: the configured static token,
    /// the configured service account JSON, then whatever service-account
    /// credentials the environment provides.
    ///
    /// # Errors
    /// - `AdapterError::Config` for a blank spreadsheet id or bad base URL
    /// - `AdapterError::Auth` if no credentials can be found
    /// - `AdapterError::Client` if the HTTP client cannot be built
    pub async fn connect(config: SheetsConfig) -> Result<Self, AdapterError> {
        let token = config.access_token.as_deref().map(str::trim).filter(|t| !t.is_empty());
        let key = config
            .service_account_json
            .as_deref()
            .filter(|json| !json.trim().is_empty());

        let credentials = match (token, key) {
            (Some(token), _) => Credentials::Static(token.to_string()),
            (None, Some(json)) => {
                let account = gcp_auth::CustomServiceAccount::from_json(json)
                    .map_err(|e| AdapterError::Auth(e.to_string()))?;
                Credentials::Provider(Arc::new(account))
            }
            (None, None) => {
                let provider = gcp_auth::provider()
                    .await
                    .map_err(|e| AdapterError::Auth(e.to_string()))?;
                Credentials::Provider(provider)
            }
        };
        Self::build(config, credentials)
    }

    /// Build a client with a fixed bearer token
    ///
    /// # Errors
    /// - `AdapterError::Config` for a blank spreadsheet id or bad base URL
    /// - `AdapterError::Client` if the HTTP client cannot be built
    pub fn with_token(config: SheetsConfig, token: impl Into<String>) -> Result<Self, AdapterError> {
        Self::build(config, Credentials::Static(token.into()))
    }

    fn build(config: SheetsConfig, credentials: Credentials) -> Result<Self, AdapterError> {
        if config.spreadsheet_id.trim().is_empty() {
            return Err(AdapterError::config("spreadsheet_id cannot be empty"));
        }
        let base = Url::parse(&config.api_base)
            .map_err(|e| AdapterError::config(format!("invalid api_base: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(AdapterError::config("api_base cannot be a base URL"));
        }
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            config,
            base,
            client,
            credentials,
            known_tabs: Mutex::new(HashSet::new()),
        })
    }

    /// Spreadsheet id
    #[inline]
    #[must_use]
    pub fn spreadsheet_id(&self) -> &str {
        &self.config.spreadsheet_id
    }

    async fn bearer(&self) -> Result<String, StoreError> {
        match &self.credentials {
            Credentials::Static(token) => Ok(token.clone()),
            Credentials::Provider(provider) => provider
                .token(&[SHEETS_SCOPE])
                .await
                .map(|t| t.as_str().to_string())
                .map_err(|e| StoreError::Unavailable(format!("failed to get access token: {e}"))),
        }
    }

    /// `{base}/v4/spreadsheets/{id}` plus `tail` segments, each percent-encoded
    fn url(&self, tail: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["v4", "spreadsheets"])
                .extend(tail);
        }
        url
    }

    fn values_url(&self, range: &str, suffix: &str) -> Url {
        self.url(&[
            &self.config.spreadsheet_id,
            "values",
            &format!("{range}{suffix}"),
        ])
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<Response, StoreError> {
        let token = self.bearer().await?;
        let mut request = self.client.request(method.clone(), url.clone()).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| store_transport(&e))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = error_message(&text);
        tracing::debug!(%method, path = url.path(), status = status.as_u16(), %message, "sheets request rejected");
        Err(StoreError::Rejected {
            status: status.as_u16(),
            message,
        })
    }

    async fn tab_titles(&self) -> Result<Vec<String>, StoreError> {
        let mut url = self.url(&[&self.config.spreadsheet_id]);
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties.title");
        let meta: SpreadsheetMeta = self
            .send::<()>(Method::GET, url, None)
            .await?
            .json()
            .await
            .map_err(|e| store_transport(&e))?;
        Ok(meta.sheets.into_iter().map(|s| s.properties.title).collect())
    }
}

/// Render a JSON cell as text
fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl TabularStore for SheetsApiStore {
    async fn read_range(&self, range: &TabRange) -> Result<Vec<Row>, StoreError> {
        let mut url = self.values_url(&range.to_a1(), "");
        url.query_pairs_mut().append_pair("majorDimension", "ROWS");

        let body: ValueRange = self
            .send::<()>(Method::GET, url, None)
            .await?
            .json()
            .await
            .map_err(|e| store_transport(&e))?;

        Ok(body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }

    async fn clear_range(&self, range: &TabRange) -> Result<(), StoreError> {
        let url = self.values_url(&range.to_a1(), ":clear");
        self.send(Method::POST, url, Some(&serde_json::json!({})))
            .await?;
        Ok(())
    }

    async fn write_rows(
        &self,
        tab: &str,
        first_row: usize,
        rows: &[Row],
    ) -> Result<(), StoreError> {
        let anchor = anchor_a1(tab, first_row);
        let mut url = self.values_url(&anchor, "");
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");

        let body = ValueWrite {
            range: &anchor,
            major_dimension: "ROWS",
            values: rows,
        };
        self.send(Method::PUT, url, Some(&body)).await?;
        tracing::debug!(tab, first_row, rows = rows.len(), "wrote rows");
        Ok(())
    }

    async fn ensure_tab(&self, tab: &str) -> Result<(), StoreError> {
        if self.known_tabs.lock().contains(tab) {
            return Ok(());
        }

        let titles = self.tab_titles().await?;
        if !titles.iter().any(|t| t == tab) {
            let url = self.url(&[&format!("{}:batchUpdate", self.config.spreadsheet_id)]);
            let body = serde_json::json!({
                "requests": [{ "addSheet": { "properties": { "title": tab } } }]
            });
            self.send(Method::POST, url, Some(&body)).await?;
            tracing::info!(tab, "created sheet tab");
        }

        let mut known = self.known_tabs.lock();
        known.extend(titles);
        known.insert(tab.to_string());
        Ok(())
    }
}

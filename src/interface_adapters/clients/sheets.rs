use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::domain::errors::{DirectoryError, TransportError};
use crate::domain::ports::SheetReader;

pub const DEFAULT_SHEETS_API_URL: &str = "https://sheets.googleapis.com";

// Connection settings shared by both sheet readers.
#[derive(Debug, Clone)]
pub struct SheetsClientConfig {
    pub api_url: String,
    pub spreadsheet_id: String,
    pub timeout: Duration,
}

// `GET /v4/spreadsheets/{id}/values/{range}` response body.
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorResponse {
    error: GoogleErrorBody,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    message: String,
}

enum Credential<'a> {
    ApiKey(&'a str),
    Bearer(&'a str),
}

// Reader for sheets shared as "anyone with the link", scoped by an API key.
#[derive(Clone)]
pub struct ApiKeySheetsClient {
    http: Client,
    config: SheetsClientConfig,
    api_key: String,
}

impl ApiKeySheetsClient {
    pub fn new(
        config: SheetsClientConfig,
        api_key: impl Into<String>,
    ) -> Result<Self, DirectoryError> {
        let api_key = api_key.into();
        require("Google Sheet ID", &config.spreadsheet_id)?;
        require("Google API key", &api_key)?;

        Ok(Self {
            http: build_http(config.timeout)?,
            config,
            api_key,
        })
    }
}

#[async_trait]
impl SheetReader for ApiKeySheetsClient {
    async fn read_range(&self, range: &str) -> Result<Vec<Vec<String>>, DirectoryError> {
        read_values(&self.http, &self.config, range, Credential::ApiKey(&self.api_key)).await
    }
}

// Reader for private sheets using an OAuth access token obtained elsewhere.
#[derive(Clone)]
pub struct OAuthSheetsClient {
    http: Client,
    config: SheetsClientConfig,
    access_token: String,
}

impl OAuthSheetsClient {
    pub fn new(
        config: SheetsClientConfig,
        access_token: impl Into<String>,
    ) -> Result<Self, DirectoryError> {
        let access_token = access_token.into();
        require("Google Sheet ID", &config.spreadsheet_id)?;
        require("Google OAuth access token", &access_token)?;

        Ok(Self {
            http: build_http(config.timeout)?,
            config,
            access_token,
        })
    }
}

#[async_trait]
impl SheetReader for OAuthSheetsClient {
    async fn read_range(&self, range: &str) -> Result<Vec<Vec<String>>, DirectoryError> {
        read_values(
            &self.http,
            &self.config,
            range,
            Credential::Bearer(&self.access_token),
        )
        .await
    }
}

// Stand-in used when the deployment lacks credentials; every read fails with
// the same configuration error so lookups surface it to the guest.
#[derive(Debug, Clone)]
pub struct UnconfiguredReader {
    reason: String,
}

impl UnconfiguredReader {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl SheetReader for UnconfiguredReader {
    async fn read_range(&self, _range: &str) -> Result<Vec<Vec<String>>, DirectoryError> {
        Err(DirectoryError::Configuration(self.reason.clone()))
    }
}

fn require(what: &str, value: &str) -> Result<(), DirectoryError> {
    if value.trim().is_empty() {
        return Err(DirectoryError::Configuration(format!("{what} is not configured")));
    }
    Ok(())
}

fn build_http(timeout: Duration) -> Result<Client, DirectoryError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|err| DirectoryError::Configuration(format!("failed to build http client: {err}")))
}

fn values_url(config: &SheetsClientConfig, range: &str) -> Result<Url, DirectoryError> {
    let mut url = Url::parse(&config.api_url).map_err(|err| {
        DirectoryError::Configuration(format!("invalid sheets api url {:?}: {err}", config.api_url))
    })?;
    url.path_segments_mut()
        .map_err(|_| {
            DirectoryError::Configuration(format!(
                "sheets api url {:?} cannot be a base",
                config.api_url
            ))
        })?
        .pop_if_empty()
        .extend(["v4", "spreadsheets", config.spreadsheet_id.as_str(), "values", range]);
    Ok(url)
}

async fn read_values(
    http: &Client,
    config: &SheetsClientConfig,
    range: &str,
    credential: Credential<'_>,
) -> Result<Vec<Vec<String>>, DirectoryError> {
    // One unauthenticated-or-token read per call; no retry, no cache.
    let mut url = values_url(config, range)?;
    let request = match credential {
        Credential::ApiKey(key) => {
            url.query_pairs_mut().append_pair("key", key);
            http.get(url)
        }
        Credential::Bearer(token) => http.get(url).bearer_auth(token),
    };

    let res = request
        .send()
        .await
        .map_err(|err| TransportError::Network(err.to_string()))?;
    let status = res.status();

    // Keep the upstream status so callers can tell permission from not-found.
    if !status.is_success() {
        let message = res
            .json::<GoogleErrorResponse>()
            .await
            .ok()
            .map(|payload| payload.error.message);
        tracing::warn!(status = status.as_u16(), ?message, "sheets read rejected");
        return Err(TransportError::Upstream {
            status: status.as_u16(),
            message,
        }
        .into());
    }

    let body = res
        .json::<ValueRange>()
        .await
        .map_err(|err| TransportError::Decode(err.to_string()))?;
    tracing::debug!(rows = body.values.len(), "sheets range read");

    Ok(body
        .values
        .into_iter()
        .map(|row| row.into_iter().map(cell_text).collect())
        .collect())
}

// Formatted values arrive as strings; anything else is rendered as JSON text.
fn cell_text(cell: Value) -> String {
    match cell {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

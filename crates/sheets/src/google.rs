//! Google Sheets API v4 source.
//!
//! Reads use `GET spreadsheets/{id}/values/{range}`; commits use a single
//! `PUT spreadsheets/{id}/values/{B5:C5}?valueInputOption=RAW` so the status
//! and content cells of a row change together.

use crate::auth::TokenProvider;
use crate::range::SheetRange;
use crate::source::{ensure_content, TopicSource};
use crate::topic::{pending_topics, RowId, Topic, STATUS_GENERATED};
use postgen_core::{AppError, AppResult};
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Public Sheets API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://sheets.googleapis.com/v4";

const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueUpdate<'a> {
    range: &'a str,
    major_dimension: &'static str,
    values: [[&'a str; 2]; 1],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateResponse {
    #[serde(default)]
    updated_cells: Option<u32>,
}

/// Topic source backed by a Google spreadsheet.
#[derive(Clone)]
pub struct GoogleSheetsSource {
    base_url: Url,
    spreadsheet_id: String,
    range: SheetRange,
    tokens: Arc<dyn TokenProvider>,
    client: reqwest::Client,
}

impl std::fmt::Debug for GoogleSheetsSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleSheetsSource")
            .field("base_url", &self.base_url.as_str())
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("range", &self.range.to_string())
            .finish_non_exhaustive()
    }
}

impl GoogleSheetsSource {
    pub fn new(
        spreadsheet_id: impl Into<String>,
        range: SheetRange,
        tokens: Arc<dyn TokenProvider>,
    ) -> AppResult<Self> {
        Self::with_base_url(spreadsheet_id, range, tokens, DEFAULT_ENDPOINT)
    }

    /// Create a source against a custom endpoint (tests, proxies).
    pub fn with_base_url(
        spreadsheet_id: impl Into<String>,
        range: SheetRange,
        tokens: Arc<dyn TokenProvider>,
        url: &str,
    ) -> AppResult<Self> {
        let base_url = Url::parse(url)
            .map_err(|e| AppError::Config(format!("Invalid Sheets endpoint '{}': {}", url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Config(format!(
                "Invalid Sheets endpoint '{}': not a base URL",
                url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create Sheets HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            spreadsheet_id: spreadsheet_id.into(),
            range,
            tokens,
            client,
        })
    }

    /// `{base}/spreadsheets/{id}/values/{range}` with each segment encoded.
    fn values_url(&self, a1_range: &str) -> AppResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Config("Sheets endpoint cannot be a base URL".to_string()))?
            .pop_if_empty()
            .extend(["spreadsheets", self.spreadsheet_id.as_str(), "values", a1_range]);
        Ok(url)
    }

    async fn read_values(&self) -> AppResult<Vec<Vec<String>>> {
        let url = self.values_url(&self.range.to_string())?;
        let token = self.tokens.access_token().await?;

        let response = self
            .client
            .get(url)
            .bearer_auth(token.expose())
            .send()
            .await
            .map_err(|e| AppError::Source(format!("Failed to reach Sheets API: {}", e)))?;

        let response = check_status(response).await?;
        let body: ValueRange = response
            .json()
            .await
            .map_err(|e| AppError::Source(format!("Malformed Sheets response: {}", e)))?;

        Ok(body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }
}

#[async_trait::async_trait]
impl TopicSource for GoogleSheetsSource {
    fn name(&self) -> &str {
        "google-sheets"
    }

    async fn fetch_pending(&self) -> AppResult<Vec<Topic>> {
        let values = self.read_values().await?;
        let topics = pending_topics(&values, self.range.anchor_row);

        tracing::debug!(
            rows = values.len(),
            pending = topics.len(),
            range = %self.range,
            "Read topic range"
        );
        Ok(topics)
    }

    async fn commit(&self, row: RowId, content: &str) -> AppResult<()> {
        ensure_content(row, content)?;
        if !self.range.contains_row(row) {
            return Err(AppError::Source(format!(
                "Row {} is outside the configured range {}",
                row, self.range
            )));
        }

        let target = self.range.commit_range(row);
        let mut url = self.values_url(&target)?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");

        let token = self.tokens.access_token().await?;
        let body = ValueUpdate {
            range: &target,
            major_dimension: "ROWS",
            values: [[STATUS_GENERATED, content]],
        };

        let response = self
            .client
            .put(url)
            .bearer_auth(token.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Source(format!("Failed to reach Sheets API: {}", e)))?;

        let response = check_status(response).await?;
        match response.json::<UpdateResponse>().await {
            Ok(UpdateResponse {
                updated_cells: Some(cells),
            }) if cells != 2 => {
                tracing::warn!(
                    row = row.0,
                    updated_cells = cells,
                    "Unexpected number of cells updated"
                );
            }
            Ok(_) => {}
            Err(e) => tracing::debug!(error = %e, "Ignoring unreadable update response"),
        }

        tracing::debug!(row = row.0, range = %target, "Committed generated content");
        Ok(())
    }
}

fn cell_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

async fn check_status(response: reqwest::Response) -> AppResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::Source(format!(
            "Sheets credential expired or invalid ({}): {}",
            status, body
        )),
        _ => AppError::Source(format!("Sheets API error ({}): {}", status, body)),
    })
}

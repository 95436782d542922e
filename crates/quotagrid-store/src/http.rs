//! REST API store.
//!
//! Talks to the specification endpoints of the assessment backend:
//! `GET {base}/tos/{id}/?role={role}` for the record and its rows, and
//! `PUT {base}/tos/{id}/update-rows/` to persist edited rows.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use quotagrid_core::model::{Row, Specification};
use quotagrid_core::traits::SpecificationStore;

use crate::error::StoreError;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Store backed by the assessment REST API.
pub struct HttpStore {
    base_url: String,
    token: Option<String>,
    role: Option<String>,
    client: reqwest::Client,
}

impl HttpStore {
    pub fn new(
        base_url: &str,
        token: Option<String>,
        role: Option<String>,
    ) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| StoreError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
            role: role.filter(|r| !r.is_empty()),
            client,
        })
    }

    fn url(&self, path: &str) -> Result<reqwest::Url, StoreError> {
        reqwest::Url::parse(&format!("{}{path}", self.base_url))
            .map_err(|e| StoreError::Network(format!("invalid URL {}{path}: {e}", self.base_url)))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn fetch_record(&self, id: u64) -> Result<WireSpecification, StoreError> {
        let mut url = self.url(&format!("/tos/{id}/"))?;
        if let Some(role) = &self.role {
            url.query_pairs_mut().append_pair("role", role);
        }

        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(map_send_error)?;
        let response = check_status(response, id).await?;

        response.json().await.map_err(|e| StoreError::Api {
            status: 0,
            message: format!("failed to parse response: {e}"),
        })
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct WireSpecification {
    id: u64,
    total_items: u32,
    #[serde(default)]
    col1_percentage: Option<u32>,
    #[serde(default)]
    col2_percentage: Option<u32>,
    #[serde(default)]
    col3_percentage: Option<u32>,
    #[serde(default)]
    col4_percentage: Option<u32>,
    #[serde(default)]
    col1_expected: Option<u32>,
    #[serde(default)]
    col2_expected: Option<u32>,
    #[serde(default)]
    col3_expected: Option<u32>,
    #[serde(default)]
    col4_expected: Option<u32>,
    #[serde(default)]
    tos_rows: Vec<WireRow>,
}

impl WireSpecification {
    fn to_specification(&self) -> anyhow::Result<Specification> {
        let percentages = [
            self.col1_percentage,
            self.col2_percentage,
            self.col3_percentage,
            self.col4_percentage,
        ]
        .map(|p| p.unwrap_or(0));
        let spec = Specification::new(self.id, self.total_items, percentages)
            .with_context(|| format!("specification {} has unusable column percentages", self.id))?;

        // stored targets win, but only when all four are present
        let expected = [
            self.col1_expected,
            self.col2_expected,
            self.col3_expected,
            self.col4_expected,
        ];
        Ok(match expected {
            [Some(a), Some(b), Some(c), Some(d)] => spec.with_expected([a, b, c, d]),
            _ => spec,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct WireRow {
    id: u64,
    #[serde(default)]
    topic: Option<String>,
    #[serde(default)]
    no_hours: Option<f64>,
    #[serde(default)]
    percent: Option<u32>,
    #[serde(default)]
    no_items: Option<u32>,
    #[serde(default)]
    col1_value: Option<u32>,
    #[serde(default)]
    col2_value: Option<u32>,
    #[serde(default)]
    col3_value: Option<u32>,
    #[serde(default)]
    col4_value: Option<u32>,
}

impl From<WireRow> for Row {
    fn from(w: WireRow) -> Self {
        Row {
            id: w.id,
            topic: w.topic.unwrap_or_default(),
            hours: w.no_hours.unwrap_or(0.0),
            percent: w.percent.unwrap_or(0),
            item_quota: w.no_items.unwrap_or(0),
            cells: [w.col1_value, w.col2_value, w.col3_value, w.col4_value].map(|v| v.unwrap_or(0)),
        }
    }
}

impl From<&Row> for WireRow {
    fn from(row: &Row) -> Self {
        let [c1, c2, c3, c4] = row.cells;
        WireRow {
            id: row.id,
            topic: Some(row.topic.clone()),
            no_hours: Some(row.hours),
            percent: Some(row.percent),
            no_items: Some(row.item_quota),
            col1_value: Some(c1),
            col2_value: Some(c2),
            col3_value: Some(c3),
            col4_value: Some(c4),
        }
    }
}

#[derive(Serialize)]
struct UpdateRowsRequest {
    rows: Vec<WireRow>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    detail: String,
}

fn map_send_error(e: reqwest::Error) -> StoreError {
    if e.is_timeout() {
        StoreError::Timeout(DEFAULT_TIMEOUT_SECS)
    } else {
        StoreError::Network(e.to_string())
    }
}

async fn check_status(response: reqwest::Response, id: u64) -> Result<reqwest::Response, StoreError> {
    let status = response.status().as_u16();
    if status == 401 || status == 403 {
        let body = response.text().await.unwrap_or_default();
        return Err(StoreError::Unauthorized(body));
    }
    if status == 404 {
        return Err(StoreError::NotFound(id));
    }
    if status >= 400 {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .map(|e| e.detail)
            .unwrap_or(body);
        return Err(StoreError::Api { status, message });
    }
    Ok(response)
}

#[async_trait]
impl SpecificationStore for HttpStore {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self))]
    async fn get_specification(&self, id: u64) -> anyhow::Result<Specification> {
        let record = self.fetch_record(id).await?;
        record.to_specification()
    }

    #[instrument(skip(self))]
    async fn get_rows(&self, id: u64) -> anyhow::Result<Vec<Row>> {
        let record = self.fetch_record(id).await?;
        Ok(record.tos_rows.into_iter().map(Row::from).collect())
    }

    /// One `GET` serves both halves: the record embeds its rows.
    #[instrument(skip(self))]
    async fn get_grid(&self, id: u64) -> anyhow::Result<(Specification, Vec<Row>)> {
        let record = self.fetch_record(id).await?;
        let spec = record.to_specification()?;
        let rows = record.tos_rows.into_iter().map(Row::from).collect();
        Ok((spec, rows))
    }

    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    async fn save_rows(&self, id: u64, rows: &[Row]) -> anyhow::Result<()> {
        let body = UpdateRowsRequest {
            rows: rows.iter().map(WireRow::from).collect(),
        };
        let url = self.url(&format!("/tos/{id}/update-rows/"))?;

        let response = self
            .authorize(self.client.put(url))
            .json(&body)
            .send()
            .await
            .map_err(map_send_error)?;
        check_status(response, id).await?;

        tracing::debug!(id, "rows accepted by API");
        Ok(())
    }
}

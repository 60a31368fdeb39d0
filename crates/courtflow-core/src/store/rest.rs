//! Remote record store speaking PostgREST conventions over HTTP.
//!
//! | operation | request |
//! |---|---|
//! | select | `GET /rest/v1/{table}?{col}=eq.{v}&order={col}.asc` |
//! | insert | `POST /rest/v1/{table}` + `Prefer: return=representation` |
//! | update | `PATCH /rest/v1/{table}?id=eq.{id}` + `Prefer: return=representation` |
//! | delete | `DELETE /rest/v1/{table}?id=eq.{id}` |
//!
//! Any non-2xx status or connection failure surfaces as
//! [`CourtflowError::Transport`]. Nothing is retried.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use tracing::debug;

use super::{Query, RecordStore, Row};
use crate::error::{CourtflowError, Result};
use crate::types::Collection;

const REST_PREFIX: &str = "rest/v1";
const RETURN_REPRESENTATION: &str = "return=representation";

pub struct RestStore {
    client: Client,
    base_url: String,
}

impl RestStore {
    pub fn new(base_url: &str, api_key: impl AsRef<str>, timeout_secs: u64) -> Result<Self> {
        let key = api_key.as_ref();
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(key).map_err(|_| CourtflowError::invalid_value("api_key", "<redacted>"))?,
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|_| CourtflowError::invalid_value("api_key", "<redacted>"))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, collection: Collection) -> String {
        format!("{}/{REST_PREFIX}/{}", self.base_url, collection.as_str())
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response> {
        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(CourtflowError::Transport(format!("{status}: {body}")))
    }
}

/// PostgREST filter operand: strings go through bare, everything else as
/// its JSON text.
fn operand(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

fn query_pairs(query: &Query) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = query
        .filters
        .iter()
        .map(|(col, v)| {
            let op = if v.is_null() { "is" } else { "eq" };
            (col.clone(), format!("{op}.{}", operand(v)))
        })
        .collect();
    if let Some(order) = &query.order {
        let dir = if order.ascending { "asc" } else { "desc" };
        pairs.push(("order".to_string(), format!("{}.{dir}", order.column)));
    }
    pairs
}

fn id_filter(id: &str) -> [(&'static str, String); 1] {
    [("id", format!("eq.{id}"))]
}

#[async_trait]
impl RecordStore for RestStore {
    async fn select(&self, collection: Collection, query: &Query) -> Result<Vec<Row>> {
        debug!(%collection, filters = query.filters.len(), "rest select");
        let req = self
            .client
            .get(self.url(collection))
            .query(&query_pairs(query));
        let rows: Vec<Row> = self.send(req).await?.json().await?;
        Ok(rows)
    }

    async fn insert(&self, collection: Collection, row: Row) -> Result<Row> {
        debug!(%collection, "rest insert");
        let req = self
            .client
            .post(self.url(collection))
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&row);
        let mut rows: Vec<Row> = self.send(req).await?.json().await?;
        if rows.is_empty() {
            return Err(CourtflowError::MalformedRow {
                collection: collection.to_string(),
                reason: "insert returned no representation".to_string(),
            });
        }
        Ok(rows.swap_remove(0))
    }

    async fn update(&self, collection: Collection, id: &str, patch: Row) -> Result<()> {
        debug!(%collection, id, "rest update");
        let req = self
            .client
            .patch(self.url(collection))
            .query(&id_filter(id))
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&patch);
        let rows: Vec<Row> = self.send(req).await?.json().await?;
        if rows.is_empty() {
            return Err(CourtflowError::not_found(collection, id));
        }
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<()> {
        debug!(%collection, id, "rest delete");
        let req = self
            .client
            .delete(self.url(collection))
            .query(&id_filter(id));
        self.send(req).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

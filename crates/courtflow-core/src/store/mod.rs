//! Record store: the tabular persistence collaborator.
//!
//! Every backend speaks the same row-level contract: `select` with equality
//! filters and an optional ordering, `insert` returning the stored row,
//! `update` of a partial row by id, and an idempotent `delete` by id. Rows are
//! JSON objects; typed records are decoded at the edge with [`decode`].
//!
//! ```text
//! RecordList<R> / PracticePlans / ActivitySequencer
//!         │
//!         ▼
//! Arc<dyn RecordStore>
//!   ├── MemoryStore   (tests, ephemeral runs)
//!   ├── RedbStore     (single-file local store)
//!   └── RestStore     (PostgREST-style remote backend)
//! ```

pub mod local;
pub mod memory;
pub mod rest;

use std::cmp::Ordering;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::config::StoreBackend;
use crate::error::{CourtflowError, Result};
use crate::types::Collection;

pub use local::RedbStore;
pub use memory::MemoryStore;
pub use rest::RestStore;

/// One stored row.
pub type Row = serde_json::Map<String, Value>;

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// Equality filters plus an optional single-column ordering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<(String, Value)>,
    pub order: Option<Order>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push((column.into(), value.into()));
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order = Some(Order {
            column: column.into(),
            ascending,
        });
        self
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.filters
            .iter()
            .all(|(col, want)| row.get(col).unwrap_or(&Value::Null) == want)
    }

    /// Stable sort by the query's ordering; rows without an ordering keep
    /// their fetch order.
    pub fn sort(&self, rows: &mut [Row]) {
        let Some(order) = &self.order else {
            return;
        };
        rows.sort_by(|a, b| {
            let ord = compare_values(
                a.get(&order.column).unwrap_or(&Value::Null),
                b.get(&order.column).unwrap_or(&Value::Null),
            );
            if order.ascending {
                ord
            } else {
                ord.reverse()
            }
        });
    }
}

/// Total order over JSON scalars: null < bool < number < string.
/// ISO dates and clock values compare correctly as strings.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

// ---------------------------------------------------------------------------
// RecordStore
// ---------------------------------------------------------------------------

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Rows of `collection` matching every filter, in the requested order.
    async fn select(&self, collection: Collection, query: &Query) -> Result<Vec<Row>>;

    /// Store a new row. The store assigns `id` (unless one is supplied),
    /// `created_at` and `updated_at`, and returns the row as stored.
    async fn insert(&self, collection: Collection, row: Row) -> Result<Row>;

    /// Merge `patch` into the row with `id`. Fails with `NotFound` when no
    /// row matched.
    async fn update(&self, collection: Collection, id: &str, patch: Row) -> Result<()>;

    /// Remove the row with `id`. Deleting a missing row succeeds.
    async fn delete(&self, collection: Collection, id: &str) -> Result<()>;
}

/// Open the backend selected in config. Relative local paths resolve
/// against the project root.
pub fn open_store(root: &Path, backend: &StoreBackend) -> Result<Arc<dyn RecordStore>> {
    match backend {
        StoreBackend::Local { path } => {
            let path = if path.is_absolute() {
                path.clone()
            } else {
                root.join(path)
            };
            Ok(Arc::new(RedbStore::open(&path)?))
        }
        StoreBackend::Remote {
            url,
            api_key,
            timeout_secs,
        } => {
            let key = std::env::var("COURTFLOW_API_KEY").unwrap_or_else(|_| api_key.clone());
            Ok(Arc::new(RestStore::new(url, key, *timeout_secs)?))
        }
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
    }
}

// ---------------------------------------------------------------------------
// Row helpers
// ---------------------------------------------------------------------------

pub(crate) fn now_stamp() -> Value {
    Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true))
}

/// Stamp the server-assigned columns onto a row about to be inserted by a
/// local backend.
pub(crate) fn stamp_new_row(mut row: Row) -> Row {
    let needs_id = !matches!(row.get("id"), Some(Value::String(s)) if !s.is_empty());
    if needs_id {
        row.insert(
            "id".to_string(),
            Value::String(uuid::Uuid::new_v4().to_string()),
        );
    }
    let now = now_stamp();
    row.insert("created_at".to_string(), now.clone());
    row.insert("updated_at".to_string(), now);
    row
}

/// Merge a partial row into a stored one. `id` and `created_at` are never
/// overwritten; `updated_at` is refreshed.
pub(crate) fn merge_patch(target: &mut Row, patch: Row) {
    for (k, v) in patch {
        if k == "id" || k == "created_at" {
            continue;
        }
        target.insert(k, v);
    }
    target.insert("updated_at".to_string(), now_stamp());
}

pub(crate) fn row_id(row: &Row) -> Option<&str> {
    row.get("id").and_then(Value::as_str)
}

pub fn encode<T: Serialize>(value: &T) -> Result<Row> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(CourtflowError::MalformedRow {
            collection: "record".to_string(),
            reason: format!("expected object, got {other}"),
        }),
    }
}

pub fn decode<T: DeserializeOwned>(collection: Collection, row: Row) -> Result<T> {
    serde_json::from_value(Value::Object(row)).map_err(|e| CourtflowError::MalformedRow {
        collection: collection.to_string(),
        reason: e.to_string(),
    })
}

pub fn decode_all<T: DeserializeOwned>(collection: Collection, rows: Vec<Row>) -> Result<Vec<T>> {
    rows.into_iter().map(|r| decode(collection, r)).collect()
}

/// A single-column row, as sent for field edits.
pub fn single(column: &str, value: Value) -> Row {
    let mut row = Row::new();
    row.insert(column.to_string(), value);
    row
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(v: Value) -> Row {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn query_matches_all_filters() {
        let q = Query::new().eq("organization_id", "o1").eq("name", "Ann");
        assert!(q.matches(&row(json!({"organization_id": "o1", "name": "Ann"}))));
        assert!(!q.matches(&row(json!({"organization_id": "o1", "name": "Bo"}))));
        assert!(!q.matches(&row(json!({"name": "Ann"}))));
    }

    #[test]
    fn sort_is_stable_for_ties() {
        let q = Query::new().order_by("order_index", true);
        let mut rows = vec![
            row(json!({"id": "b", "order_index": 1})),
            row(json!({"id": "a", "order_index": 0})),
            row(json!({"id": "c", "order_index": 1})),
        ];
        q.sort(&mut rows);
        let ids: Vec<_> = rows.iter().map(|r| row_id(r).unwrap()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn sort_descending_dates() {
        let q = Query::new().order_by("date", false);
        let mut rows = vec![
            row(json!({"date": "2025-01-02"})),
            row(json!({"date": "2025-03-01"})),
        ];
        q.sort(&mut rows);
        assert_eq!(rows[0]["date"], "2025-03-01");
    }

    #[test]
    fn stamp_keeps_supplied_id() {
        let stamped = stamp_new_row(row(json!({"id": "user-1"})));
        assert_eq!(stamped["id"], "user-1");
        assert!(stamped.contains_key("created_at"));

        let generated = stamp_new_row(row(json!({"name": "x"})));
        assert!(uuid::Uuid::parse_str(row_id(&generated).unwrap()).is_ok());
    }

    #[test]
    fn merge_patch_protects_identity() {
        let mut target = stamp_new_row(row(json!({"name": "a"})));
        let id = row_id(&target).unwrap().to_string();
        merge_patch(&mut target, row(json!({"id": "other", "name": "b"})));
        assert_eq!(row_id(&target), Some(id.as_str()));
        assert_eq!(target["name"], "b");
    }
}

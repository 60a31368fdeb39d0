//! Typed records over the row store, and the optimistic list every simple
//! view (roster, drills, playbook, scouting) is built on.
//!
//! A mutation on a [`RecordList`] is two-phase: the local copy changes first,
//! then the store call is awaited. If the store call fails the local copy is
//! restored and the list is reloaded from the store, so the caller never sees
//! a local state that diverges from what was persisted.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{CourtflowError, Result};
use crate::store::{decode, decode_all, encode, single, Query, RecordStore, Row};
use crate::types::Collection;

// ---------------------------------------------------------------------------
// OrgContext
// ---------------------------------------------------------------------------

/// The organization every query is scoped to. Passed explicitly; there is no
/// ambient "current organization".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgContext {
    pub organization_id: String,
}

impl OrgContext {
    pub fn new(organization_id: impl Into<String>) -> Self {
        Self {
            organization_id: organization_id.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// FieldSpec / Record
// ---------------------------------------------------------------------------

/// The closed set of user-editable columns of one record type.
pub trait FieldSpec: Copy + fmt::Debug + PartialEq + Send + Sync + 'static {
    fn all() -> &'static [Self];

    fn column(self) -> &'static str;

    /// Validate form input and convert it into the stored column value.
    fn encode(self, raw: &str) -> Result<Value>;

    /// Look a field up by column name; `-` is accepted for `_`.
    fn parse(name: &str) -> Result<Self> {
        let want = name.trim().replace('-', "_");
        Self::all()
            .iter()
            .copied()
            .find(|f| f.column() == want)
            .ok_or_else(|| CourtflowError::invalid_value("field", name))
    }
}

pub trait Record: Serialize + DeserializeOwned + Clone + fmt::Debug + Send + Sync + 'static {
    type Field: FieldSpec;

    const COLLECTION: Collection;

    /// Foreign key column scoping this record to its owner.
    const OWNER_COLUMN: &'static str = "organization_id";

    fn id(&self) -> &str;

    /// `(column, ascending)` used by list views.
    fn default_order() -> (&'static str, bool);

    /// Column values of a newly created record before any user input.
    fn blank() -> Row;
}

/// Plain text column: stored as-is.
pub(crate) fn text(raw: &str) -> Value {
    Value::String(raw.to_string())
}

/// Optional text column: blank input clears it.
pub(crate) fn optional_text(raw: &str) -> Value {
    if raw.trim().is_empty() {
        Value::Null
    } else {
        Value::String(raw.trim().to_string())
    }
}

/// Return a copy of `record` with one column replaced.
pub fn with_field<R: Record>(record: &R, field: R::Field, value: &Value) -> Result<R> {
    let mut row = encode(record)?;
    row.insert(field.column().to_string(), value.clone());
    decode(R::COLLECTION, row)
}

/// All records owned by `owner_id`, in the type's default order.
pub async fn fetch_owned<R: Record>(store: &dyn RecordStore, owner_id: &str) -> Result<Vec<R>> {
    let (column, ascending) = R::default_order();
    let query = Query::new()
        .eq(R::OWNER_COLUMN, owner_id)
        .order_by(column, ascending);
    let rows = store.select(R::COLLECTION, &query).await?;
    decode_all(R::COLLECTION, rows)
}

/// Build an insert row: blank defaults, owner key, then validated overrides.
pub fn draft_row<R: Record>(owner_id: &str, fields: &[(R::Field, &str)]) -> Result<Row> {
    let mut row = R::blank();
    row.insert(R::OWNER_COLUMN.to_string(), Value::String(owner_id.to_string()));
    for &(field, raw) in fields {
        row.insert(field.column().to_string(), field.encode(raw)?);
    }
    Ok(row)
}

// ---------------------------------------------------------------------------
// RecordList
// ---------------------------------------------------------------------------

pub struct RecordList<R: Record> {
    store: Arc<dyn RecordStore>,
    owner_id: String,
    items: Vec<R>,
}

impl<R: Record> RecordList<R> {
    /// Load the organization's records of this type.
    pub async fn open(store: Arc<dyn RecordStore>, org: &OrgContext) -> Result<Self> {
        let mut list = Self {
            store,
            owner_id: org.organization_id.clone(),
            items: Vec::new(),
        };
        list.reload().await?;
        Ok(list)
    }

    pub fn items(&self) -> &[R] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&R> {
        self.items.iter().find(|r| r.id() == id)
    }

    pub async fn reload(&mut self) -> Result<()> {
        self.items = fetch_owned(&*self.store, &self.owner_id).await?;
        Ok(())
    }

    /// Insert a new record with defaults overridden by `fields`. Ascending
    /// lists get it at the end, descending lists at the top.
    pub async fn create(&mut self, fields: &[(R::Field, &str)]) -> Result<R> {
        let row = draft_row::<R>(&self.owner_id, fields)?;
        let stored = self.store.insert(R::COLLECTION, row).await?;
        let record: R = decode(R::COLLECTION, stored)?;
        if R::default_order().1 {
            self.items.push(record.clone());
        } else {
            self.items.insert(0, record.clone());
        }
        debug!(collection = %R::COLLECTION, id = record.id(), "record created");
        Ok(record)
    }

    /// Edit one field. Validation failures touch nothing; store failures
    /// revert and reload.
    pub async fn patch(&mut self, id: &str, field: R::Field, raw: &str) -> Result<R> {
        let pos = self
            .position(id)
            .ok_or_else(|| CourtflowError::not_found(R::COLLECTION, id))?;
        let value = field.encode(raw)?;
        let updated = with_field(&self.items[pos], field, &value)?;

        let snapshot = std::mem::replace(&mut self.items[pos], updated.clone());
        let result = self
            .store
            .update(R::COLLECTION, id, single(field.column(), value))
            .await;
        if let Err(e) = result {
            self.items[pos] = snapshot;
            return Err(self.reconcile(e).await);
        }
        Ok(updated)
    }

    /// Remove a record. Returns `false` when it was not in the list.
    pub async fn delete(&mut self, id: &str) -> Result<bool> {
        let Some(pos) = self.position(id) else {
            return Ok(false);
        };
        let removed = self.items.remove(pos);
        if let Err(e) = self.store.delete(R::COLLECTION, id).await {
            self.items.insert(pos, removed);
            return Err(self.reconcile(e).await);
        }
        Ok(true)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|r| r.id() == id)
    }

    async fn reconcile(&mut self, err: CourtflowError) -> CourtflowError {
        warn!(collection = %R::COLLECTION, error = %err, "write failed; reloading");
        if let Err(reload_err) = self.reload().await {
            warn!(collection = %R::COLLECTION, error = %reload_err, "reload after failed write failed");
        }
        err
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

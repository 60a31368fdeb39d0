//! Single-file local record store using redb.
//!
//! # Table design
//!
//! One redb table per [`Collection`], keyed by row id:
//! ```text
//! <collection name>: id (&str) -> JSON-encoded row (&[u8])
//! ```
//!
//! Filtering and ordering happen in application code after a full table
//! scan; collections here hold a single program's rows, so scans stay small.
//! Unordered selects return rows in key (id) order.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use redb::{Database, ReadableTable, TableDefinition};

use super::{merge_patch, row_id, stamp_new_row, Query, RecordStore, Row};
use crate::error::{CourtflowError, Result};
use crate::types::Collection;

fn table(collection: Collection) -> TableDefinition<'static, &'static str, &'static [u8]> {
    TableDefinition::new(collection.as_str())
}

fn db_err(e: impl std::fmt::Display) -> CourtflowError {
    CourtflowError::Transport(format!("local store: {e}"))
}

// ---------------------------------------------------------------------------
// RedbStore
// ---------------------------------------------------------------------------

pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Open or create the database at `path`, creating every collection
    /// table so reads never race table creation.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            crate::io::ensure_dir(parent)?;
        }
        let db = Database::create(path).map_err(db_err)?;
        let wt = db.begin_write().map_err(db_err)?;
        for &collection in Collection::all() {
            wt.open_table(table(collection)).map_err(db_err)?;
        }
        wt.commit().map_err(db_err)?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Run a blocking closure against the database off the async executor.
    async fn with_db<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| CourtflowError::Transport(format!("local store task failed: {e}")))?
    }
}

fn read_all(db: &Database, collection: Collection) -> Result<Vec<Row>> {
    let rt = db.begin_read().map_err(db_err)?;
    let t = rt.open_table(table(collection)).map_err(db_err)?;
    let mut rows = Vec::new();
    for entry in t.iter().map_err(db_err)? {
        let (_, v) = entry.map_err(db_err)?;
        let row: Row = serde_json::from_slice(v.value())?;
        rows.push(row);
    }
    Ok(rows)
}

#[async_trait]
impl RecordStore for RedbStore {
    async fn select(&self, collection: Collection, query: &Query) -> Result<Vec<Row>> {
        let query = query.clone();
        self.with_db(move |db| {
            let mut rows: Vec<Row> = read_all(db, collection)?
                .into_iter()
                .filter(|r| query.matches(r))
                .collect();
            query.sort(&mut rows);
            Ok(rows)
        })
        .await
    }

    async fn insert(&self, collection: Collection, row: Row) -> Result<Row> {
        let row = stamp_new_row(row);
        self.with_db(move |db| {
            let id = row_id(&row).unwrap_or_default().to_string();
            let value = serde_json::to_vec(&row)?;
            let wt = db.begin_write().map_err(db_err)?;
            {
                let mut t = wt.open_table(table(collection)).map_err(db_err)?;
                let exists = t.get(id.as_str()).map_err(db_err)?.is_some();
                if exists {
                    return Err(CourtflowError::Transport(format!(
                        "duplicate key in {collection}: {id}"
                    )));
                }
                t.insert(id.as_str(), value.as_slice()).map_err(db_err)?;
            }
            wt.commit().map_err(db_err)?;
            Ok(row)
        })
        .await
    }

    async fn update(&self, collection: Collection, id: &str, patch: Row) -> Result<()> {
        let id = id.to_string();
        self.with_db(move |db| {
            let wt = db.begin_write().map_err(db_err)?;
            {
                let mut t = wt.open_table(table(collection)).map_err(db_err)?;
                let existing: Option<Vec<u8>> = t
                    .get(id.as_str())
                    .map_err(db_err)?
                    .map(|guard| guard.value().to_vec());
                let Some(bytes) = existing else {
                    return Err(CourtflowError::not_found(collection, id));
                };
                let mut row: Row = serde_json::from_slice(&bytes)?;
                merge_patch(&mut row, patch);
                let value = serde_json::to_vec(&row)?;
                t.insert(id.as_str(), value.as_slice()).map_err(db_err)?;
            }
            wt.commit().map_err(db_err)?;
            Ok(())
        })
        .await
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<()> {
        let id = id.to_string();
        self.with_db(move |db| {
            let wt = db.begin_write().map_err(db_err)?;
            {
                let mut t = wt.open_table(table(collection)).map_err(db_err)?;
                t.remove(id.as_str()).map_err(db_err)?;
            }
            wt.commit().map_err(db_err)?;
            Ok(())
        })
        .await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

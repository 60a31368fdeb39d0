//! In-process record store for tests and throwaway sessions.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use super::{merge_patch, row_id, stamp_new_row, Query, RecordStore, Row};
use crate::error::{CourtflowError, Result};
use crate::types::Collection;

/// Rows live in insertion order per collection, which is also the fetch order
/// for unordered selects.
pub struct MemoryStore {
    tables: RwLock<HashMap<Collection, Vec<Row>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
        }
    }

    /// Number of rows currently stored in `collection`.
    pub fn len(&self, collection: Collection) -> usize {
        self.tables
            .read()
            .map(|t| t.get(&collection).map_or(0, Vec::len))
            .unwrap_or(0)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> CourtflowError {
    CourtflowError::Transport(format!("memory store lock poisoned: {e}"))
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn select(&self, collection: Collection, query: &Query) -> Result<Vec<Row>> {
        let tables = self.tables.read().map_err(poisoned)?;
        let mut rows: Vec<Row> = tables
            .get(&collection)
            .map(|rows| rows.iter().filter(|r| query.matches(r)).cloned().collect())
            .unwrap_or_default();
        query.sort(&mut rows);
        Ok(rows)
    }

    async fn insert(&self, collection: Collection, row: Row) -> Result<Row> {
        let row = stamp_new_row(row);
        let mut tables = self.tables.write().map_err(poisoned)?;
        let rows = tables.entry(collection).or_default();
        if rows.iter().any(|r| row_id(r) == row_id(&row)) {
            return Err(CourtflowError::Transport(format!(
                "duplicate key in {collection}: {}",
                row_id(&row).unwrap_or_default()
            )));
        }
        rows.push(row.clone());
        Ok(row)
    }

    async fn update(&self, collection: Collection, id: &str, patch: Row) -> Result<()> {
        let mut tables = self.tables.write().map_err(poisoned)?;
        let target = tables
            .get_mut(&collection)
            .and_then(|rows| rows.iter_mut().find(|r| row_id(r) == Some(id)))
            .ok_or_else(|| CourtflowError::not_found(collection, id))?;
        merge_patch(target, patch);
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<()> {
        let mut tables = self.tables.write().map_err(poisoned)?;
        if let Some(rows) = tables.get_mut(&collection) {
            rows.retain(|r| row_id(r) != Some(id));
        }
        Ok(())
    }
}

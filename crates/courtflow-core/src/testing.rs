//! Failure-injecting store used by unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{CourtflowError, Result};
use crate::store::{MemoryStore, Query, RecordStore, Row};
use crate::types::Collection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Select,
    Insert,
    Update,
    Delete,
}

/// A [`MemoryStore`] that can be told to fail calls of an operation with a
/// transport error, and that counts every call it sees.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    /// per op: calls still allowed through, then calls to fail
    failures: Mutex<HashMap<Op, (u32, u32)>>,
    calls: Mutex<HashMap<Op, u32>>,
    write_delay: Mutex<Option<Duration>>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next(&self, op: Op, times: u32) {
        self.fail_after(op, 0, times);
    }

    /// Let `passes` calls of `op` succeed, then fail the next `times`.
    pub fn fail_after(&self, op: Op, passes: u32, times: u32) {
        self.failures.lock().unwrap().insert(op, (passes, times));
    }

    pub fn calls(&self, op: Op) -> u32 {
        self.calls.lock().unwrap().get(&op).copied().unwrap_or(0)
    }

    pub fn writes(&self) -> u32 {
        self.calls(Op::Insert) + self.calls(Op::Update) + self.calls(Op::Delete)
    }

    /// Make every insert, update and delete sleep before touching the store.
    pub fn slow_writes(&self, delay: Duration) {
        *self.write_delay.lock().unwrap() = Some(delay);
    }

    async fn enter(&self, op: Op) -> Result<()> {
        *self.calls.lock().unwrap().entry(op).or_default() += 1;
        let delay = *self.write_delay.lock().unwrap();
        if let (Some(d), true) = (delay, op != Op::Select) {
            tokio::time::sleep(d).await;
        }
        let mut failures = self.failures.lock().unwrap();
        match failures.get_mut(&op) {
            Some((passes, _)) if *passes > 0 => {
                *passes -= 1;
                Ok(())
            }
            Some((_, times)) if *times > 0 => {
                *times -= 1;
                Err(CourtflowError::Transport(format!("injected {op:?} failure")))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl RecordStore for FlakyStore {
    async fn select(&self, collection: Collection, query: &Query) -> Result<Vec<Row>> {
        self.enter(Op::Select).await?;
        self.inner.select(collection, query).await
    }

    async fn insert(&self, collection: Collection, row: Row) -> Result<Row> {
        self.enter(Op::Insert).await?;
        self.inner.insert(collection, row).await
    }

    async fn update(&self, collection: Collection, id: &str, patch: Row) -> Result<()> {
        self.enter(Op::Update).await?;
        self.inner.update(collection, id, patch).await
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<()> {
        self.enter(Op::Delete).await?;
        self.inner.delete(collection, id).await
    }
}

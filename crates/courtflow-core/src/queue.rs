//! Per-plan write queues.
//!
//! Each practice plan gets one worker task that runs that plan's store
//! writes one at a time, in the order they were submitted. Submitting is
//! synchronous, so a unit is queued the moment the mutation that produced
//! it runs, and it runs to completion whether or not anyone still waits for
//! its result.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::error::{CourtflowError, Result};

type Unit = Pin<Box<dyn Future<Output = ()> + Send>>;

#[derive(Clone, Default)]
pub struct PlanQueues {
    inner: Arc<Mutex<HashMap<String, mpsc::UnboundedSender<Unit>>>>,
}

impl PlanQueues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `work` behind everything already submitted for `plan_id`.
    ///
    /// Must be called from inside a tokio runtime. The receiver yields the
    /// result; dropping it does not cancel the unit.
    pub fn submit<T, F>(&self, plan_id: &str, work: F) -> oneshot::Receiver<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply, result) = oneshot::channel();
        let mut unit: Unit = Box::pin(async move {
            let _ = reply.send(work.await);
        });

        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(sender) = map.get(plan_id) {
            match sender.send(unit) {
                Ok(()) => return result,
                // worker is gone (its runtime shut down); start a new one
                Err(mpsc::error::SendError(back)) => unit = back,
            }
        }
        let sender = spawn_worker(plan_id);
        let _ = sender.send(unit);
        map.insert(plan_id.to_string(), sender);
        result
    }

    /// Submit `work` and wait for it. The unit is queued on the first poll;
    /// dropping this future afterwards leaves it running.
    pub async fn run<T, F>(&self, plan_id: &str, work: F) -> Result<T>
    where
        F: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        self.submit(plan_id, work)
            .await
            .map_err(|_| CourtflowError::Transport("write queue stopped before the write finished".into()))?
    }

    /// Close the queue of a deleted plan. Units already queued still run.
    pub fn forget(&self, plan_id: &str) {
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        map.remove(plan_id);
    }
}

fn spawn_worker(plan_id: &str) -> mpsc::UnboundedSender<Unit> {
    let (sender, mut units) = mpsc::unbounded_channel::<Unit>();
    let plan_id = plan_id.to_string();
    tokio::spawn(async move {
        while let Some(unit) = units.recv().await {
            unit.await;
        }
        debug!(plan_id = %plan_id, "write queue closed");
    });
    sender
}

//! Ordered editing of one practice plan's activities.
//!
//! Every mutation runs in two phases:
//!
//! 1. the local list is changed immediately (the view shows the result);
//! 2. the matching store writes are queued on the plan's write queue in the
//!    same step, and awaited.
//!
//! If phase 2 fails the local list goes back to its pre-mutation snapshot and
//! the plan is reloaded from the store; the store error is returned. Writes
//! for one plan go out in the order the mutations were issued, and a queued
//! unit finishes even if the caller stops waiting for it.

use std::future::Future;
use std::sync::Arc;

use serde_json::json;
use tracing::{debug, warn};

use crate::activity::{load_activities, Activity, ActivityDraft, ActivityField};
use crate::error::{CourtflowError, Result};
use crate::ordering::{self, IndexChange};
use crate::queue::PlanQueues;
use crate::record::{with_field, FieldSpec};
use crate::store::{decode, single, RecordStore};
use crate::types::Collection;

const ACTIVITIES: Collection = Collection::PracticeActivities;

pub struct ActivitySequencer {
    store: Arc<dyn RecordStore>,
    queues: PlanQueues,
    plan_id: String,
    activities: Vec<Activity>,
}

impl ActivitySequencer {
    /// Load a plan's activities and start editing them.
    pub async fn open(
        store: Arc<dyn RecordStore>,
        queues: PlanQueues,
        plan_id: impl Into<String>,
    ) -> Result<Self> {
        let mut seq = Self {
            store,
            queues,
            plan_id: plan_id.into(),
            activities: Vec::new(),
        };
        seq.load().await?;
        Ok(seq)
    }

    /// Activities in display order.
    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    pub fn get(&self, id: &str) -> Option<&Activity> {
        self.activities.iter().find(|a| a.id == id)
    }

    /// Replace the local list with the store's view of the plan.
    pub async fn load(&mut self) -> Result<&[Activity]> {
        self.activities = load_activities(&*self.store, &self.plan_id).await?;
        debug!(plan_id = %self.plan_id, count = self.activities.len(), "activities loaded");
        Ok(&self.activities)
    }

    /// Add an activity right after position `after`, or at the end when no
    /// anchor is given. An anchor past the end appends.
    pub async fn insert_after(
        &mut self,
        after: Option<usize>,
        draft: ActivityDraft,
    ) -> Result<Activity> {
        let target = ordering::insertion_index(after, self.activities.len());
        let snapshot = self.activities.clone();
        let mut shifts = ordering::shift_for_insert(&mut self.activities, target);
        // highest index first, new row last: an interrupted insert leaves a
        // gap in the stored indices, never two rows on one index
        shifts.reverse();

        let store = Arc::clone(&self.store);
        let row = draft.into_row(&self.plan_id, ordering::index_of(target));
        let result = self
            .remote(async move {
                write_indices(&*store, &shifts).await?;
                store.insert(ACTIVITIES, row).await
            })
            .await
            .and_then(|stored| decode::<Activity>(ACTIVITIES, stored));

        match result {
            Ok(activity) => {
                self.activities.insert(target, activity.clone());
                debug!(plan_id = %self.plan_id, id = %activity.id, index = target, "activity inserted");
                Ok(activity)
            }
            Err(e) => Err(self.reconcile(snapshot, e).await),
        }
    }

    /// Remove an activity and close the gap. Returns `false` without
    /// touching the store when the id is not in the plan.
    pub async fn delete(&mut self, id: &str) -> Result<bool> {
        let Some(pos) = self.position(id) else {
            return Ok(false);
        };
        let snapshot = self.activities.clone();
        self.activities.remove(pos);
        let shifts = ordering::renumber(&mut self.activities);

        let store = Arc::clone(&self.store);
        let id_owned = id.to_string();
        let result = self
            .remote(async move {
                store.delete(ACTIVITIES, &id_owned).await?;
                write_indices(&*store, &shifts).await
            })
            .await;

        match result {
            Ok(()) => {
                debug!(plan_id = %self.plan_id, id, "activity deleted");
                Ok(true)
            }
            Err(e) => Err(self.reconcile(snapshot, e).await),
        }
    }

    /// Edit one column of an activity. Never moves it.
    pub async fn update_field(
        &mut self,
        id: &str,
        field: ActivityField,
        raw: &str,
    ) -> Result<Activity> {
        let pos = self
            .position(id)
            .ok_or_else(|| CourtflowError::not_found(ACTIVITIES, id))?;
        let value = field.encode(raw)?;
        let updated = with_field(&self.activities[pos], field, &value)?;
        let snapshot = self.activities.clone();
        self.activities[pos] = updated.clone();

        let store = Arc::clone(&self.store);
        let id_owned = id.to_string();
        let patch = single(field.column(), value);
        let result = self
            .remote(async move { store.update(ACTIVITIES, &id_owned, patch).await })
            .await;

        match result {
            Ok(()) => Ok(updated),
            Err(e) => Err(self.reconcile(snapshot, e).await),
        }
    }

    /// Put the plan's activities in the given order. `ordered` must contain
    /// every activity id of the plan exactly once; anything else is rejected
    /// before the store is touched.
    pub async fn reindex(&mut self, ordered: &[&str]) -> Result<()> {
        ordering::validate_permutation(&self.activities, ordered)?;
        let snapshot = self.activities.clone();
        ordering::apply_order(&mut self.activities, ordered);
        let changes = ordering::renumber(&mut self.activities);
        self.commit_indices(snapshot, changes).await
    }

    /// Move one activity to `to`, clamped to the last position.
    pub async fn move_to(&mut self, id: &str, to: usize) -> Result<usize> {
        let from = self
            .position(id)
            .ok_or_else(|| CourtflowError::not_found(ACTIVITIES, id))?;
        let snapshot = self.activities.clone();
        let landed = ordering::move_item(&mut self.activities, from, to);
        let changes = ordering::renumber(&mut self.activities);
        self.commit_indices(snapshot, changes).await?;
        Ok(landed)
    }

    // -----------------------------------------------------------------------
    // internals
    // -----------------------------------------------------------------------

    fn position(&self, id: &str) -> Option<usize> {
        self.activities.iter().position(|a| a.id == id)
    }

    async fn commit_indices(&mut self, snapshot: Vec<Activity>, changes: Vec<IndexChange>) -> Result<()> {
        if changes.is_empty() {
            return Ok(());
        }
        let store = Arc::clone(&self.store);
        let result = self
            .remote(async move { write_indices(&*store, &changes).await })
            .await;
        match result {
            Ok(()) => {
                debug!(plan_id = %self.plan_id, "activities reordered");
                Ok(())
            }
            Err(e) => Err(self.reconcile(snapshot, e).await),
        }
    }

    /// Queue `work` on the plan's write queue and wait for it. The unit is
    /// queued in the same poll that made the local change.
    async fn remote<T, F>(&self, work: F) -> Result<T>
    where
        F: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let plan_id = self.plan_id.clone();
        self.queues
            .run(&self.plan_id, async move {
                let result = work.await;
                // the caller may have stopped waiting
                if let Err(e) = &result {
                    warn!(plan_id = %plan_id, error = %e, "activity write failed");
                }
                result
            })
            .await
    }

    async fn reconcile(&mut self, snapshot: Vec<Activity>, err: CourtflowError) -> CourtflowError {
        debug!(plan_id = %self.plan_id, error = %err, "reloading plan after failed write");
        self.activities = snapshot;
        if let Err(reload_err) = self.load().await {
            warn!(plan_id = %self.plan_id, error = %reload_err, "reload after failed write failed");
        }
        err
    }
}

async fn write_indices(store: &dyn RecordStore, changes: &[IndexChange]) -> Result<()> {
    for change in changes {
        store
            .update(
                ACTIVITIES,
                &change.id,
                single("order_index", json!(change.order_index)),
            )
            .await?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, Query};
    use crate::testing::{FlakyStore, Op};
    use std::time::Duration;
    use tokio::sync::oneshot;

    const PLAN: &str = "plan-1";

    async fn empty() -> (Arc<FlakyStore>, ActivitySequencer) {
        let flaky = Arc::new(FlakyStore::new());
        let store: Arc<dyn RecordStore> = flaky.clone();
        let seq = ActivitySequencer::open(store, PlanQueues::new(), PLAN)
            .await
            .unwrap();
        (flaky, seq)
    }

    async fn with_titles(titles: &[&str]) -> (Arc<FlakyStore>, ActivitySequencer) {
        let (flaky, mut seq) = empty().await;
        for t in titles {
            seq.insert_after(None, ActivityDraft::titled(*t)).await.unwrap();
        }
        (flaky, seq)
    }

    fn titles(seq: &ActivitySequencer) -> Vec<&str> {
        seq.activities()
            .iter()
            .map(|a| a.activity_text.as_str())
            .collect()
    }

    fn indices(seq: &ActivitySequencer) -> Vec<u32> {
        seq.activities().iter().map(|a| a.order_index).collect()
    }

    fn local(seq: &ActivitySequencer) -> Vec<(String, u32)> {
        seq.activities()
            .iter()
            .map(|a| (a.activity_text.clone(), a.order_index))
            .collect()
    }

    async fn stored(seq: &ActivitySequencer) -> Vec<(String, u32)> {
        let fresh = load_activities(&*seq.store, PLAN).await.unwrap();
        fresh
            .into_iter()
            .map(|a| (a.activity_text, a.order_index))
            .collect()
    }

    #[tokio::test]
    async fn appends_to_empty_plan() {
        let (_, mut seq) = empty().await;
        let a = seq
            .insert_after(None, ActivityDraft::titled("Warm-up"))
            .await
            .unwrap();
        assert_eq!(a.order_index, 0);
        let b = seq
            .insert_after(None, ActivityDraft::titled("Scrimmage"))
            .await
            .unwrap();
        assert_eq!(b.order_index, 1);
    }

    #[tokio::test]
    async fn insert_after_anchor_shifts_followers() {
        let (flaky, mut seq) = with_titles(&["A", "B", "C"]).await;
        let before = flaky.writes();
        seq.insert_after(Some(0), ActivityDraft::titled("X"))
            .await
            .unwrap();
        assert_eq!(titles(&seq), vec!["A", "X", "B", "C"]);
        assert_eq!(indices(&seq), vec![0, 1, 2, 3]);
        // one insert plus the two shifted rows
        assert_eq!(flaky.writes() - before, 3);
        assert_eq!(
            stored(&seq).await,
            vec![
                ("A".to_string(), 0),
                ("X".to_string(), 1),
                ("B".to_string(), 2),
                ("C".to_string(), 3)
            ]
        );
    }

    #[tokio::test]
    async fn anchor_past_end_appends() {
        let (_, mut seq) = with_titles(&["A"]).await;
        let x = seq
            .insert_after(Some(7), ActivityDraft::titled("X"))
            .await
            .unwrap();
        assert_eq!(x.order_index, 1);
        assert_eq!(titles(&seq), vec!["A", "X"]);
    }

    #[tokio::test]
    async fn delete_closes_gap() {
        let (_, mut seq) = with_titles(&["A", "B", "C", "D"]).await;
        let b = seq.activities()[1].id.clone();
        assert!(seq.delete(&b).await.unwrap());
        assert_eq!(titles(&seq), vec!["A", "C", "D"]);
        assert_eq!(indices(&seq), vec![0, 1, 2]);
        assert_eq!(
            stored(&seq).await,
            vec![
                ("A".to_string(), 0),
                ("C".to_string(), 1),
                ("D".to_string(), 2)
            ]
        );
    }

    #[tokio::test]
    async fn delete_unknown_is_a_quiet_no_op() {
        let (flaky, mut seq) = with_titles(&["A", "B"]).await;
        let id = seq.activities()[0].id.clone();
        assert!(seq.delete(&id).await.unwrap());
        let writes = flaky.writes();
        assert!(!seq.delete(&id).await.unwrap());
        assert!(!seq.delete("never-existed").await.unwrap());
        assert_eq!(flaky.writes(), writes);
        assert_eq!(titles(&seq), vec!["B"]);
    }

    #[tokio::test]
    async fn inserted_row_survives_reload() {
        let (_, mut seq) = with_titles(&["A"]).await;
        let mut draft = ActivityDraft::titled("Shell");
        draft.set(ActivityField::CueText, "jump to the ball").unwrap();
        draft.set(ActivityField::StartClock, "16:15").unwrap();
        let made = seq.insert_after(Some(0), draft).await.unwrap();

        seq.load().await.unwrap();
        let back = seq.get(&made.id).unwrap();
        assert_eq!(back.cue_text, "jump to the ball");
        assert_eq!(back.start_clock, made.start_clock);
        assert_eq!(back.order_index, 1);
    }

    #[tokio::test]
    async fn update_field_keeps_position() {
        let (_, mut seq) = with_titles(&["A", "B"]).await;
        let b = seq.activities()[1].id.clone();
        let updated = seq
            .update_field(&b, ActivityField::EndClock, "16:45")
            .await
            .unwrap();
        assert_eq!(updated.order_index, 1);
        assert_eq!(updated.end_clock.format("%H:%M").to_string(), "16:45");

        let err = seq
            .update_field("ghost", ActivityField::CueText, "x")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        let err = seq
            .update_field(&b, ActivityField::StartClock, "half past")
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn failed_update_reverts_to_stored_value() {
        let (flaky, mut seq) = with_titles(&["A"]).await;
        let a = seq.activities()[0].id.clone();
        seq.update_field(&a, ActivityField::CueText, "stored")
            .await
            .unwrap();

        flaky.fail_next(Op::Update, 1);
        let err = seq
            .update_field(&a, ActivityField::CueText, "lost")
            .await
            .unwrap_err();
        assert!(err.is_transport());
        assert_eq!(seq.get(&a).unwrap().cue_text, "stored");
    }

    #[tokio::test]
    async fn failed_insert_leaves_gap_not_collision() {
        let (flaky, mut seq) = with_titles(&["A", "B"]).await;
        // "B" is shifted, then the insert itself fails
        flaky.fail_next(Op::Insert, 1);
        let err = seq
            .insert_after(Some(0), ActivityDraft::titled("X"))
            .await
            .unwrap_err();
        assert!(err.is_transport());
        assert_eq!(titles(&seq), vec!["A", "B"]);
        assert_eq!(indices(&seq), vec![0, 2]);
        assert_eq!(local(&seq), stored(&seq).await);

        // the next structural edit closes the gap
        seq.insert_after(None, ActivityDraft::titled("C")).await.unwrap();
        assert!(ordering::is_dense(seq.activities()));
        assert_eq!(local(&seq), stored(&seq).await);
    }

    #[tokio::test]
    async fn interrupted_shift_never_duplicates_an_index() {
        let (flaky, mut seq) = with_titles(&["A", "B", "C"]).await;
        // "C" moves to 3, the shift of "B" fails, the insert never runs
        flaky.fail_after(Op::Update, 1, 1);
        assert!(seq
            .insert_after(Some(0), ActivityDraft::titled("X"))
            .await
            .is_err());
        assert_eq!(titles(&seq), vec!["A", "B", "C"]);
        assert_eq!(indices(&seq), vec![0, 1, 3]);

        let c = seq.activities()[2].id.clone();
        seq.move_to(&c, 2).await.unwrap();
        assert!(ordering::is_dense(seq.activities()));
        assert_eq!(local(&seq), stored(&seq).await);
    }

    #[tokio::test]
    async fn failed_delete_keeps_the_row() {
        let (flaky, mut seq) = with_titles(&["A", "B", "C"]).await;
        let b = seq.activities()[1].id.clone();
        flaky.fail_next(Op::Delete, 1);
        let err = seq.delete(&b).await.unwrap_err();
        assert!(err.is_transport());
        assert_eq!(titles(&seq), vec!["A", "B", "C"]);
        assert!(seq.get(&b).is_some());
        assert_eq!(local(&seq), stored(&seq).await);
    }

    #[tokio::test]
    async fn failed_renumber_after_delete_matches_store() {
        let (flaky, mut seq) = with_titles(&["A", "B", "C"]).await;
        let a = seq.activities()[0].id.clone();
        // the row is gone but "B" keeps its old index
        flaky.fail_next(Op::Update, 1);
        let err = seq.delete(&a).await.unwrap_err();
        assert!(err.is_transport());
        assert_eq!(titles(&seq), vec!["B", "C"]);
        assert_eq!(local(&seq), stored(&seq).await);
    }

    #[tokio::test]
    async fn failed_reindex_reverts_to_stored_order() {
        let (flaky, mut seq) = with_titles(&["A", "B", "C"]).await;
        let ids: Vec<String> = seq.activities().iter().map(|a| a.id.clone()).collect();
        flaky.fail_next(Op::Update, 1);
        let err = seq
            .reindex(&[ids[2].as_str(), ids[0].as_str(), ids[1].as_str()])
            .await
            .unwrap_err();
        assert!(err.is_transport());
        assert_eq!(titles(&seq), vec!["A", "B", "C"]);
        assert_eq!(local(&seq), stored(&seq).await);
    }

    #[tokio::test]
    async fn failed_move_reverts_to_stored_order() {
        let (flaky, mut seq) = with_titles(&["A", "B", "C"]).await;
        let a = seq.activities()[0].id.clone();
        flaky.fail_next(Op::Update, 1);
        let err = seq.move_to(&a, 2).await.unwrap_err();
        assert!(err.is_transport());
        assert_eq!(titles(&seq), vec!["A", "B", "C"]);
        assert_eq!(indices(&seq), vec![0, 1, 2]);
        assert_eq!(local(&seq), stored(&seq).await);
    }

    #[tokio::test]
    async fn reindex_persists_new_order() {
        let (_, mut seq) = with_titles(&["A", "B", "C"]).await;
        let ids: Vec<String> = seq.activities().iter().map(|a| a.id.clone()).collect();
        seq.reindex(&[ids[2].as_str(), ids[0].as_str(), ids[1].as_str()]).await.unwrap();
        assert_eq!(titles(&seq), vec!["C", "A", "B"]);
        seq.load().await.unwrap();
        assert_eq!(titles(&seq), vec!["C", "A", "B"]);
        assert_eq!(indices(&seq), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn reindex_rejects_non_permutations_without_writing() {
        let (flaky, mut seq) = with_titles(&["A", "B"]).await;
        let ids: Vec<String> = seq.activities().iter().map(|a| a.id.clone()).collect();
        let writes = flaky.writes();

        for bad in [
            vec![ids[0].as_str()],
            vec![ids[0].as_str(), ids[0].as_str()],
            vec![ids[0].as_str(), ids[1].as_str(), "stranger"],
        ] {
            let err = seq.reindex(&bad).await.unwrap_err();
            assert!(matches!(err, CourtflowError::InvalidOrder(_)));
        }
        assert_eq!(flaky.writes(), writes);
        assert_eq!(titles(&seq), vec!["A", "B"]);
    }

    #[tokio::test]
    async fn move_to_clamps_and_renumbers() {
        let (_, mut seq) = with_titles(&["A", "B", "C"]).await;
        let a = seq.activities()[0].id.clone();
        assert_eq!(seq.move_to(&a, 10).await.unwrap(), 2);
        assert_eq!(titles(&seq), vec!["B", "C", "A"]);
        assert_eq!(
            stored(&seq).await,
            vec![
                ("B".to_string(), 0),
                ("C".to_string(), 1),
                ("A".to_string(), 2)
            ]
        );
        assert!(seq.move_to("ghost", 0).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn indices_stay_dense_through_mixed_edits() {
        let (_, mut seq) = empty().await;
        // deterministic pseudo-random walk over inserts and deletes
        let mut state: u64 = 0x2545_f491;
        for step in 0..60 {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            let len = seq.activities().len();
            let roll = (state >> 33) as usize;
            if len > 0 && roll % 3 == 0 {
                let id = seq.activities()[roll % len].id.clone();
                seq.delete(&id).await.unwrap();
            } else {
                let anchor = if roll % 2 == 0 { None } else { Some(roll % (len + 2)) };
                seq.insert_after(anchor, ActivityDraft::titled(format!("s{step}")))
                    .await
                    .unwrap();
            }
            assert!(ordering::is_dense(seq.activities()), "local drift at step {step}");
        }
        let titles_before: Vec<String> = titles(&seq).iter().map(|s| s.to_string()).collect();
        seq.load().await.unwrap();
        assert!(ordering::is_dense(seq.activities()));
        assert_eq!(titles(&seq), titles_before);
    }

    #[tokio::test]
    async fn dropped_caller_does_not_cancel_write() {
        let (flaky, mut seq) = with_titles(&["A"]).await;
        let a = seq.activities()[0].id.clone();
        flaky.slow_writes(Duration::from_millis(50));

        let gave_up = tokio::time::timeout(
            Duration::from_millis(5),
            seq.update_field(&a, ActivityField::ActivityText, "Finished anyway"),
        )
        .await;
        assert!(gave_up.is_err());

        tokio::time::sleep(Duration::from_millis(150)).await;
        let rows = flaky
            .inner
            .select(ACTIVITIES, &Query::new().eq("id", a.as_str()))
            .await
            .unwrap();
        assert_eq!(rows[0]["activity_text"], "Finished anyway");
    }

    #[tokio::test]
    async fn edit_waiting_in_queue_lands_after_caller_gives_up() {
        let (_, mut seq) = with_titles(&["A"]).await;
        let a = seq.activities()[0].id.clone();
        let (open, gate) = oneshot::channel::<()>();
        drop(seq.queues.submit(PLAN, async move {
            let _ = gate.await;
        }));

        let gave_up = tokio::time::timeout(
            Duration::from_millis(20),
            seq.update_field(&a, ActivityField::CueText, "queued"),
        )
        .await;
        assert!(gave_up.is_err());
        assert_eq!(seq.get(&a).unwrap().cue_text, "queued");

        open.send(()).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        let fresh = load_activities(&*seq.store, PLAN).await.unwrap();
        assert_eq!(fresh[0].cue_text, "queued");
    }

    #[tokio::test]
    async fn two_editors_on_one_plan_apply_in_issue_order() {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
        let queues = PlanQueues::new();
        let mut first = ActivitySequencer::open(Arc::clone(&store), queues.clone(), PLAN)
            .await
            .unwrap();
        let a = first
            .insert_after(None, ActivityDraft::titled("A"))
            .await
            .unwrap();
        let mut second = ActivitySequencer::open(Arc::clone(&store), queues, PLAN)
            .await
            .unwrap();

        first
            .update_field(&a.id, ActivityField::CueText, "one")
            .await
            .unwrap();
        second
            .update_field(&a.id, ActivityField::CueText, "two")
            .await
            .unwrap();

        let fresh = load_activities(&*store, PLAN).await.unwrap();
        assert_eq!(fresh[0].cue_text, "two");
    }
}

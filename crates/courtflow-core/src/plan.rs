//! Practice plans: the dated header row plus its ordered activities.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::activity::{load_activities, seed_drafts, Activity};
use crate::error::{CourtflowError, Result};
use crate::queue::PlanQueues;
use crate::record::{optional_text, FieldSpec, OrgContext, Record, RecordList};
use crate::sequencer::ActivitySequencer;
use crate::store::{RecordStore, Row};
use crate::types::{parse_clock, parse_date, Collection};

pub const DEFAULT_NOTES: &str = "Today's focus areas...";
const DEFAULT_START: &str = "16:00:00";

// ---------------------------------------------------------------------------
// PracticePlan
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PracticePlan {
    pub id: String,
    pub organization_id: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub team1_roster: Option<String>,
    pub team2_roster: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanField {
    Date,
    StartTime,
    Team1Roster,
    Team2Roster,
    Notes,
}

impl FieldSpec for PlanField {
    fn all() -> &'static [Self] {
        &[
            PlanField::Date,
            PlanField::StartTime,
            PlanField::Team1Roster,
            PlanField::Team2Roster,
            PlanField::Notes,
        ]
    }

    fn column(self) -> &'static str {
        match self {
            PlanField::Date => "date",
            PlanField::StartTime => "start_time",
            PlanField::Team1Roster => "team1_roster",
            PlanField::Team2Roster => "team2_roster",
            PlanField::Notes => "notes",
        }
    }

    fn encode(self, raw: &str) -> Result<Value> {
        match self {
            PlanField::Date => {
                let date = parse_date(self.column(), raw)?;
                Ok(json!(date.format("%Y-%m-%d").to_string()))
            }
            PlanField::StartTime => {
                let t = parse_clock(self.column(), raw)?;
                Ok(json!(t.format("%H:%M:%S").to_string()))
            }
            PlanField::Team1Roster | PlanField::Team2Roster | PlanField::Notes => {
                Ok(optional_text(raw))
            }
        }
    }
}

impl Record for PracticePlan {
    type Field = PlanField;
    const COLLECTION: Collection = Collection::PracticePlans;

    fn id(&self) -> &str {
        &self.id
    }

    fn default_order() -> (&'static str, bool) {
        ("date", false)
    }

    fn blank() -> Row {
        let today = Utc::now().date_naive();
        let mut row = Row::new();
        row.insert("date".into(), json!(today.format("%Y-%m-%d").to_string()));
        row.insert("start_time".into(), json!(DEFAULT_START));
        row.insert("team1_roster".into(), Value::Null);
        row.insert("team2_roster".into(), Value::Null);
        row.insert("notes".into(), json!(DEFAULT_NOTES));
        row
    }
}

/// A plan together with its activities in display order.
#[derive(Debug, Clone, Serialize)]
pub struct PlanSheet {
    pub plan: PracticePlan,
    pub activities: Vec<Activity>,
}

// ---------------------------------------------------------------------------
// PracticePlans
// ---------------------------------------------------------------------------

pub struct PracticePlans {
    store: Arc<dyn RecordStore>,
    queues: PlanQueues,
    plans: RecordList<PracticePlan>,
}

impl PracticePlans {
    pub async fn open(
        store: Arc<dyn RecordStore>,
        queues: PlanQueues,
        org: &OrgContext,
    ) -> Result<Self> {
        let plans = RecordList::open(Arc::clone(&store), org).await?;
        Ok(Self {
            store,
            queues,
            plans,
        })
    }

    /// Plans newest first, without their activities.
    pub fn plans(&self) -> &[PracticePlan] {
        self.plans.items()
    }

    pub fn get(&self, id: &str) -> Option<&PracticePlan> {
        self.plans.get(id)
    }

    /// Every plan with its activities, newest first.
    pub async fn list(&self) -> Result<Vec<PlanSheet>> {
        let mut sheets = Vec::with_capacity(self.plans.items().len());
        for plan in self.plans.items() {
            sheets.push(self.sheet_for(plan.clone()).await?);
        }
        Ok(sheets)
    }

    pub async fn sheet(&self, id: &str) -> Result<PlanSheet> {
        let plan = self
            .get(id)
            .cloned()
            .ok_or_else(|| CourtflowError::not_found(Collection::PracticePlans, id))?;
        self.sheet_for(plan).await
    }

    async fn sheet_for(&self, plan: PracticePlan) -> Result<PlanSheet> {
        let activities = load_activities(&*self.store, &plan.id).await?;
        Ok(PlanSheet { plan, activities })
    }

    /// Create a plan for `date` (today when omitted) with the standard
    /// opening activities.
    pub async fn create(&mut self, date: Option<NaiveDate>) -> Result<PlanSheet> {
        let date = date.map(|d| d.format("%Y-%m-%d").to_string());
        let fields: Vec<(PlanField, &str)> = date
            .as_deref()
            .map(|d| vec![(PlanField::Date, d)])
            .unwrap_or_default();
        let plan = self.plans.create(&fields).await?;

        let mut seq = self.sequencer(&plan.id).await?;
        for draft in seed_drafts() {
            seq.insert_after(None, draft).await?;
        }
        info!(plan_id = %plan.id, date = %plan.date, "practice plan created");
        Ok(PlanSheet {
            activities: seq.activities().to_vec(),
            plan,
        })
    }

    pub async fn patch(&mut self, id: &str, field: PlanField, raw: &str) -> Result<PracticePlan> {
        self.plans.patch(id, field, raw).await
    }

    /// Delete a plan and all of its activities. Returns `false` when the plan
    /// is not in this organization's list.
    pub async fn delete(&mut self, id: &str) -> Result<bool> {
        if self.get(id).is_none() {
            return Ok(false);
        }
        let store = Arc::clone(&self.store);
        let plan_id = id.to_string();
        self.queues
            .run(id, async move {
                for a in load_activities(&*store, &plan_id).await? {
                    if let Err(e) = store.delete(Collection::PracticeActivities, &a.id).await {
                        warn!(plan_id = %plan_id, error = %e, "activity delete failed; plan kept");
                        return Err(e);
                    }
                }
                Ok(())
            })
            .await?;
        self.plans.delete(id).await?;
        self.queues.forget(id);
        info!(plan_id = id, "practice plan deleted");
        Ok(true)
    }

    /// Start editing a plan's activities on the shared per-plan write queue.
    pub async fn sequencer(&self, plan_id: &str) -> Result<ActivitySequencer> {
        if self.get(plan_id).is_none() {
            return Err(CourtflowError::not_found(Collection::PracticePlans, plan_id));
        }
        ActivitySequencer::open(Arc::clone(&self.store), self.queues.clone(), plan_id).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::ActivityDraft;
    use crate::store::MemoryStore;
    use crate::testing::{FlakyStore, Op};

    fn org() -> OrgContext {
        OrgContext::new("org-1")
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[tokio::test]
    async fn new_plan_has_defaults_and_seeds() {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
        let mut plans = PracticePlans::open(store, PlanQueues::new(), &org())
            .await
            .unwrap();
        let sheet = plans.create(None).await.unwrap();

        assert_eq!(sheet.plan.date, Utc::now().date_naive());
        assert_eq!(sheet.plan.start_time.format("%H:%M").to_string(), "16:00");
        assert_eq!(sheet.plan.notes.as_deref(), Some(DEFAULT_NOTES));
        let texts: Vec<_> = sheet
            .activities
            .iter()
            .map(|a| (a.activity_text.as_str(), a.order_index))
            .collect();
        assert_eq!(
            texts,
            vec![("Warm-up / Stretching", 0), ("Ball Handling Drills", 1)]
        );
    }

    #[tokio::test]
    async fn list_is_newest_first_with_sorted_activities() {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
        let queues = PlanQueues::new();
        let mut plans = PracticePlans::open(Arc::clone(&store), queues.clone(), &org())
            .await
            .unwrap();
        let older = plans.create(Some(day("2024-03-01"))).await.unwrap();
        plans.create(Some(day("2024-03-08"))).await.unwrap();

        let mut seq = plans.sequencer(&older.plan.id).await.unwrap();
        seq.insert_after(Some(0), ActivityDraft::titled("Shell"))
            .await
            .unwrap();

        let fresh = PracticePlans::open(store, queues, &org()).await.unwrap();
        let sheets = fresh.list().await.unwrap();
        assert_eq!(sheets[0].plan.date, day("2024-03-08"));
        let older_texts: Vec<_> = sheets[1]
            .activities
            .iter()
            .map(|a| a.activity_text.as_str())
            .collect();
        assert_eq!(
            older_texts,
            vec!["Warm-up / Stretching", "Shell", "Ball Handling Drills"]
        );
    }

    #[tokio::test]
    async fn delete_cascades_to_activities() {
        let mem = Arc::new(MemoryStore::new());
        let store: Arc<dyn RecordStore> = mem.clone();
        let mut plans = PracticePlans::open(store, PlanQueues::new(), &org())
            .await
            .unwrap();
        let keep = plans.create(None).await.unwrap();
        let gone = plans.create(None).await.unwrap();
        assert_eq!(mem.len(Collection::PracticeActivities), 4);

        assert!(plans.delete(&gone.plan.id).await.unwrap());
        assert_eq!(mem.len(Collection::PracticeActivities), 2);
        assert_eq!(mem.len(Collection::PracticePlans), 1);
        assert!(plans.get(&keep.plan.id).is_some());
        assert!(!plans.delete(&gone.plan.id).await.unwrap());
    }

    #[tokio::test]
    async fn failed_activity_delete_keeps_plan() {
        let flaky = Arc::new(FlakyStore::new());
        let store: Arc<dyn RecordStore> = flaky.clone();
        let mut plans = PracticePlans::open(store, PlanQueues::new(), &org())
            .await
            .unwrap();
        let sheet = plans.create(None).await.unwrap();

        flaky.fail_next(Op::Delete, 1);
        assert!(plans.delete(&sheet.plan.id).await.is_err());
        assert!(plans.get(&sheet.plan.id).is_some());
        assert_eq!(flaky.inner.len(Collection::PracticePlans), 1);
    }

    #[tokio::test]
    async fn patch_plan_fields() {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
        let mut plans = PracticePlans::open(store, PlanQueues::new(), &org())
            .await
            .unwrap();
        let id = plans.create(None).await.unwrap().plan.id;

        let p = plans
            .patch(&id, PlanField::Team1Roster, "Ann, Bo, Cy")
            .await
            .unwrap();
        assert_eq!(p.team1_roster.as_deref(), Some("Ann, Bo, Cy"));
        let p = plans.patch(&id, PlanField::StartTime, "15:30").await.unwrap();
        assert_eq!(p.start_time.format("%H:%M").to_string(), "15:30");
        assert!(plans
            .patch(&id, PlanField::Date, "tomorrow")
            .await
            .unwrap_err()
            .is_validation());
    }

    #[tokio::test]
    async fn sequencer_requires_known_plan() {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
        let plans = PracticePlans::open(store, PlanQueues::new(), &org())
            .await
            .unwrap();
        match plans.sequencer("nope").await {
            Err(e) => assert!(e.is_not_found()),
            Ok(_) => panic!("expected not found"),
        }
    }
}

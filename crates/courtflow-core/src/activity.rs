//! A timed segment of a practice plan.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::Result;
use crate::record::{fetch_owned, text, FieldSpec, Record};
use crate::store::{RecordStore, Row};
use crate::types::{parse_clock, Collection};

const CLOCK_FORMAT: &str = "%H:%M:%S";

// ---------------------------------------------------------------------------
// Activity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    pub practice_plan_id: String,
    pub start_clock: NaiveTime,
    pub end_clock: NaiveTime,
    pub activity_text: String,
    /// Coaching points shown next to the activity.
    pub cue_text: String,
    pub order_index: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Activity {
    /// Scheduled length in minutes. Negative when the end clock precedes the
    /// start clock; the two are edited independently.
    pub fn duration_minutes(&self) -> i64 {
        (self.end_clock - self.start_clock).num_minutes()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityField {
    StartClock,
    EndClock,
    ActivityText,
    CueText,
}

impl FieldSpec for ActivityField {
    fn all() -> &'static [Self] {
        &[
            ActivityField::StartClock,
            ActivityField::EndClock,
            ActivityField::ActivityText,
            ActivityField::CueText,
        ]
    }

    fn column(self) -> &'static str {
        match self {
            ActivityField::StartClock => "start_clock",
            ActivityField::EndClock => "end_clock",
            ActivityField::ActivityText => "activity_text",
            ActivityField::CueText => "cue_text",
        }
    }

    fn encode(self, raw: &str) -> Result<Value> {
        match self {
            ActivityField::StartClock | ActivityField::EndClock => {
                let t = parse_clock(self.column(), raw)?;
                Ok(json!(t.format(CLOCK_FORMAT).to_string()))
            }
            ActivityField::ActivityText | ActivityField::CueText => Ok(text(raw)),
        }
    }
}

impl Record for Activity {
    type Field = ActivityField;
    const COLLECTION: Collection = Collection::PracticeActivities;
    const OWNER_COLUMN: &'static str = "practice_plan_id";

    fn id(&self) -> &str {
        &self.id
    }

    fn default_order() -> (&'static str, bool) {
        ("order_index", true)
    }

    fn blank() -> Row {
        ActivityDraft::default().columns()
    }
}

// ---------------------------------------------------------------------------
// ActivityDraft
// ---------------------------------------------------------------------------

/// Column values for an activity that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityDraft {
    pub start_clock: NaiveTime,
    pub end_clock: NaiveTime,
    pub activity_text: String,
    pub cue_text: String,
}

impl Default for ActivityDraft {
    fn default() -> Self {
        Self {
            start_clock: clock(16, 0),
            end_clock: clock(16, 15),
            activity_text: String::new(),
            cue_text: String::new(),
        }
    }
}

impl ActivityDraft {
    pub fn titled(activity_text: impl Into<String>) -> Self {
        Self {
            activity_text: activity_text.into(),
            ..Self::default()
        }
    }

    /// Apply one validated form field.
    pub fn set(&mut self, field: ActivityField, raw: &str) -> Result<()> {
        match field {
            ActivityField::StartClock => self.start_clock = parse_clock(field.column(), raw)?,
            ActivityField::EndClock => self.end_clock = parse_clock(field.column(), raw)?,
            ActivityField::ActivityText => self.activity_text = raw.to_string(),
            ActivityField::CueText => self.cue_text = raw.to_string(),
        }
        Ok(())
    }

    fn columns(&self) -> Row {
        let mut row = Row::new();
        row.insert(
            "start_clock".into(),
            json!(self.start_clock.format(CLOCK_FORMAT).to_string()),
        );
        row.insert(
            "end_clock".into(),
            json!(self.end_clock.format(CLOCK_FORMAT).to_string()),
        );
        row.insert("activity_text".into(), json!(self.activity_text));
        row.insert("cue_text".into(), json!(self.cue_text));
        row
    }

    pub fn into_row(self, plan_id: &str, order_index: u32) -> Row {
        let mut row = self.columns();
        row.insert("practice_plan_id".into(), json!(plan_id));
        row.insert("order_index".into(), json!(order_index));
        row
    }
}

fn clock(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN)
}

/// The two activities every new plan starts with.
pub fn seed_drafts() -> Vec<ActivityDraft> {
    vec![
        ActivityDraft {
            start_clock: clock(16, 0),
            end_clock: clock(16, 15),
            activity_text: "Warm-up / Stretching".to_string(),
            cue_text: "Focus on dynamic stretching and injury prevention routines.".to_string(),
        },
        ActivityDraft {
            start_clock: clock(16, 15),
            end_clock: clock(16, 30),
            activity_text: "Ball Handling Drills".to_string(),
            cue_text: "Mikan drill, figure 8s, weak-hand emphasis.".to_string(),
        },
    ]
}

/// A plan's activities in display order. Rows sharing an index keep the
/// order the store returned them in.
pub async fn load_activities(store: &dyn RecordStore, plan_id: &str) -> Result<Vec<Activity>> {
    let mut activities: Vec<Activity> = fetch_owned(store, plan_id).await?;
    activities.sort_by_key(|a| a.order_index);
    Ok(activities)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn clock_fields_normalize_to_seconds() {
        assert_eq!(
            ActivityField::StartClock.encode("9:05").unwrap(),
            json!("09:05:00")
        );
        assert!(ActivityField::EndClock.encode("25:00").unwrap_err().is_validation());
        assert_eq!(ActivityField::CueText.encode(" loud ").unwrap(), json!(" loud "));
    }

    #[test]
    fn draft_set_validates_clocks() {
        let mut d = ActivityDraft::titled("Shell drill");
        d.set(ActivityField::EndClock, "16:40").unwrap();
        assert_eq!(d.end_clock, clock(16, 40));
        assert!(d.set(ActivityField::StartClock, "soon").is_err());
        assert_eq!(d.start_clock, clock(16, 0));
    }

    #[tokio::test]
    async fn load_sorts_by_index_and_keeps_ties_stable() {
        let store = MemoryStore::new();
        for (idx, name) in [(1, "B"), (0, "A"), (1, "C")] {
            store
                .insert(
                    Collection::PracticeActivities,
                    ActivityDraft::titled(name).into_row("p1", idx),
                )
                .await
                .unwrap();
        }
        store
            .insert(
                Collection::PracticeActivities,
                ActivityDraft::titled("other plan").into_row("p2", 0),
            )
            .await
            .unwrap();

        let loaded = load_activities(&store, "p1").await.unwrap();
        let names: Vec<_> = loaded.iter().map(|a| a.activity_text.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        assert_eq!(loaded[0].duration_minutes(), 15);
    }

    #[test]
    fn seeds_match_first_practice_block() {
        let seeds = seed_drafts();
        assert_eq!(seeds.len(), 2);
        assert_eq!(seeds[0].activity_text, "Warm-up / Stretching");
        assert_eq!(seeds[1].start_clock, seeds[0].end_clock);
    }
}

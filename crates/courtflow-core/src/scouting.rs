use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::Result;
use crate::record::{text, FieldSpec, Record};
use crate::store::Row;
use crate::types::{parse_date, Collection};

// ---------------------------------------------------------------------------
// ScoutingReport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoutingReport {
    pub id: String,
    pub organization_id: String,
    pub opponent: String,
    /// Game date the report is for.
    pub date: NaiveDate,
    pub personnel: String,
    pub offense_notes: String,
    pub defense_notes: String,
    pub special_notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportField {
    Opponent,
    Date,
    Personnel,
    OffenseNotes,
    DefenseNotes,
    SpecialNotes,
}

impl FieldSpec for ReportField {
    fn all() -> &'static [Self] {
        &[
            ReportField::Opponent,
            ReportField::Date,
            ReportField::Personnel,
            ReportField::OffenseNotes,
            ReportField::DefenseNotes,
            ReportField::SpecialNotes,
        ]
    }

    fn column(self) -> &'static str {
        match self {
            ReportField::Opponent => "opponent",
            ReportField::Date => "date",
            ReportField::Personnel => "personnel",
            ReportField::OffenseNotes => "offense_notes",
            ReportField::DefenseNotes => "defense_notes",
            ReportField::SpecialNotes => "special_notes",
        }
    }

    fn encode(self, raw: &str) -> Result<Value> {
        match self {
            ReportField::Date => {
                let date = parse_date(self.column(), raw)?;
                Ok(json!(date.format("%Y-%m-%d").to_string()))
            }
            _ => Ok(text(raw)),
        }
    }
}

impl Record for ScoutingReport {
    type Field = ReportField;
    const COLLECTION: Collection = Collection::ScoutingReports;

    fn id(&self) -> &str {
        &self.id
    }

    fn default_order() -> (&'static str, bool) {
        ("date", false)
    }

    fn blank() -> Row {
        let today = Utc::now().date_naive();
        let mut row = Row::new();
        row.insert("opponent".into(), json!(""));
        row.insert("date".into(), json!(today.format("%Y-%m-%d").to_string()));
        for col in ["personnel", "offense_notes", "defense_notes", "special_notes"] {
            row.insert(col.into(), json!(""));
        }
        row
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{OrgContext, RecordList};
    use crate::store::{MemoryStore, RecordStore};
    use std::sync::Arc;

    #[tokio::test]
    async fn reports_list_newest_first() {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
        let org = OrgContext::new("o");
        let mut reports = RecordList::<ScoutingReport>::open(Arc::clone(&store), &org)
            .await
            .unwrap();
        reports
            .create(&[(ReportField::Opponent, "Hawks"), (ReportField::Date, "2024-01-05")])
            .await
            .unwrap();
        reports
            .create(&[(ReportField::Opponent, "Lions"), (ReportField::Date, "2024-02-09")])
            .await
            .unwrap();
        // new reports go on top
        assert_eq!(reports.items()[0].opponent, "Lions");

        let reloaded = RecordList::<ScoutingReport>::open(store, &org).await.unwrap();
        let opponents: Vec<_> = reloaded.items().iter().map(|r| r.opponent.as_str()).collect();
        assert_eq!(opponents, vec!["Lions", "Hawks"]);
    }

    #[tokio::test]
    async fn new_report_is_dated_today() {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
        let mut reports = RecordList::<ScoutingReport>::open(store, &OrgContext::new("o"))
            .await
            .unwrap();
        let r = reports.create(&[]).await.unwrap();
        assert_eq!(r.date, Utc::now().date_naive());
    }

    #[test]
    fn bad_date_is_rejected() {
        let err = ReportField::Date.encode("next friday").unwrap_err();
        assert!(err.is_validation());
    }
}

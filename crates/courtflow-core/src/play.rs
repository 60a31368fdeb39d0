use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::Result;
use crate::record::{optional_text, text, FieldSpec, Record};
use crate::store::Row;
use crate::types::{Collection, PlayCategory};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Play {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    pub category: PlayCategory,
    pub description: String,
    /// Link to a whiteboard image or diagram.
    pub diagram_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayField {
    Name,
    Category,
    Description,
    DiagramUrl,
}

impl FieldSpec for PlayField {
    fn all() -> &'static [Self] {
        &[
            PlayField::Name,
            PlayField::Category,
            PlayField::Description,
            PlayField::DiagramUrl,
        ]
    }

    fn column(self) -> &'static str {
        match self {
            PlayField::Name => "name",
            PlayField::Category => "category",
            PlayField::Description => "description",
            PlayField::DiagramUrl => "diagram_url",
        }
    }

    fn encode(self, raw: &str) -> Result<Value> {
        match self {
            PlayField::Category => {
                let category: PlayCategory = raw.parse()?;
                Ok(json!(category.as_str()))
            }
            PlayField::DiagramUrl => Ok(optional_text(raw)),
            PlayField::Name | PlayField::Description => Ok(text(raw)),
        }
    }
}

impl Record for Play {
    type Field = PlayField;
    const COLLECTION: Collection = Collection::Plays;

    fn id(&self) -> &str {
        &self.id
    }

    fn default_order() -> (&'static str, bool) {
        ("name", true)
    }

    fn blank() -> Row {
        let mut row = Row::new();
        row.insert("name".into(), json!(""));
        row.insert("category".into(), json!(PlayCategory::default().as_str()));
        row.insert("description".into(), json!(""));
        row.insert("diagram_url".into(), Value::Null);
        row
    }
}

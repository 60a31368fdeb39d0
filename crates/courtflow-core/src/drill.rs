use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::embed;
use crate::error::Result;
use crate::record::{optional_text, text, FieldSpec, Record};
use crate::store::Row;
use crate::types::{Collection, DrillCategory};

// ---------------------------------------------------------------------------
// Drill
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drill {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    pub category: DrillCategory,
    /// Free-text focus area, e.g. "Ball Handling".
    pub focus: String,
    pub description: String,
    pub video_link: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Drill {
    /// Embeddable player URL for the drill's video link, if it has one that
    /// can be embedded.
    pub fn embed_url(&self) -> Option<String> {
        self.video_link
            .as_deref()
            .and_then(embed::youtube_embed_url)
    }
}

// ---------------------------------------------------------------------------
// DrillField
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrillField {
    Name,
    Category,
    Focus,
    Description,
    VideoLink,
}

impl FieldSpec for DrillField {
    fn all() -> &'static [Self] {
        &[
            DrillField::Name,
            DrillField::Category,
            DrillField::Focus,
            DrillField::Description,
            DrillField::VideoLink,
        ]
    }

    fn column(self) -> &'static str {
        match self {
            DrillField::Name => "name",
            DrillField::Category => "category",
            DrillField::Focus => "focus",
            DrillField::Description => "description",
            DrillField::VideoLink => "video_link",
        }
    }

    fn encode(self, raw: &str) -> Result<Value> {
        match self {
            DrillField::Category => {
                let category: DrillCategory = raw.parse()?;
                Ok(json!(category.as_str()))
            }
            DrillField::VideoLink => Ok(optional_text(raw)),
            DrillField::Name | DrillField::Focus | DrillField::Description => Ok(text(raw)),
        }
    }
}

impl Record for Drill {
    type Field = DrillField;
    const COLLECTION: Collection = Collection::Drills;

    fn id(&self) -> &str {
        &self.id
    }

    fn default_order() -> (&'static str, bool) {
        ("name", true)
    }

    fn blank() -> Row {
        let mut row = Row::new();
        row.insert("name".into(), json!(""));
        row.insert("category".into(), json!(DrillCategory::default().as_str()));
        row.insert("focus".into(), json!(""));
        row.insert("description".into(), json!(""));
        row.insert("video_link".into(), Value::Null);
        row
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

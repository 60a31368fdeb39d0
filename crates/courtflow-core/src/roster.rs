use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::Result;
use crate::record::{text, FieldSpec, Record};
use crate::store::Row;
use crate::types::Collection;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    /// Jersey number as written; "00" and "" are both valid.
    pub number: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Player {
    /// `#23 Jordan`, or just the name when no number is set.
    pub fn label(&self) -> String {
        if self.number.is_empty() {
            self.name.clone()
        } else {
            format!("#{} {}", self.number, self.name)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerField {
    Name,
    Number,
}

impl FieldSpec for PlayerField {
    fn all() -> &'static [Self] {
        &[PlayerField::Name, PlayerField::Number]
    }

    fn column(self) -> &'static str {
        match self {
            PlayerField::Name => "name",
            PlayerField::Number => "number",
        }
    }

    fn encode(self, raw: &str) -> Result<Value> {
        Ok(text(raw))
    }
}

impl Record for Player {
    type Field = PlayerField;
    const COLLECTION: Collection = Collection::Players;

    fn id(&self) -> &str {
        &self.id
    }

    fn default_order() -> (&'static str, bool) {
        ("name", true)
    }

    fn blank() -> Row {
        let mut row = Row::new();
        row.insert("name".into(), json!(""));
        row.insert("number".into(), json!(""));
        row
    }
}

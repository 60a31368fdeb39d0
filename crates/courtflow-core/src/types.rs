use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CourtflowError, Result};

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

/// A table in the record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Organizations,
    Users,
    Players,
    Drills,
    Plays,
    ScoutingReports,
    PracticePlans,
    PracticeActivities,
}

impl Collection {
    pub fn all() -> &'static [Collection] {
        &[
            Collection::Organizations,
            Collection::Users,
            Collection::Players,
            Collection::Drills,
            Collection::Plays,
            Collection::ScoutingReports,
            Collection::PracticePlans,
            Collection::PracticeActivities,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Organizations => "organizations",
            Collection::Users => "users",
            Collection::Players => "players",
            Collection::Drills => "drills",
            Collection::Plays => "plays",
            Collection::ScoutingReports => "scouting_reports",
            Collection::PracticePlans => "practice_plans",
            Collection::PracticeActivities => "practice_activities",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// DrillCategory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DrillCategory {
    #[default]
    Skill,
    Conditioning,
    #[serde(rename = "Team Defense")]
    TeamDefense,
    #[serde(rename = "Team Offense")]
    TeamOffense,
    #[serde(rename = "Special Situations")]
    SpecialSituations,
}

impl DrillCategory {
    pub fn all() -> &'static [DrillCategory] {
        &[
            DrillCategory::Skill,
            DrillCategory::Conditioning,
            DrillCategory::TeamDefense,
            DrillCategory::TeamOffense,
            DrillCategory::SpecialSituations,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DrillCategory::Skill => "Skill",
            DrillCategory::Conditioning => "Conditioning",
            DrillCategory::TeamDefense => "Team Defense",
            DrillCategory::TeamOffense => "Team Offense",
            DrillCategory::SpecialSituations => "Special Situations",
        }
    }
}

impl fmt::Display for DrillCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DrillCategory {
    type Err = CourtflowError;

    /// Accepts the display name in any case, or its kebab/snake form
    /// (`team-defense`, `team_defense`).
    fn from_str(s: &str) -> Result<Self> {
        let norm = normalize_label(s);
        DrillCategory::all()
            .iter()
            .copied()
            .find(|c| normalize_label(c.as_str()) == norm)
            .ok_or_else(|| CourtflowError::InvalidCategory(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// PlayCategory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PlayCategory {
    #[default]
    Offense,
    Defense,
    Special,
}

impl PlayCategory {
    pub fn all() -> &'static [PlayCategory] {
        &[
            PlayCategory::Offense,
            PlayCategory::Defense,
            PlayCategory::Special,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlayCategory::Offense => "Offense",
            PlayCategory::Defense => "Defense",
            PlayCategory::Special => "Special",
        }
    }
}

impl fmt::Display for PlayCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PlayCategory {
    type Err = CourtflowError;

    fn from_str(s: &str) -> Result<Self> {
        let norm = normalize_label(s);
        PlayCategory::all()
            .iter()
            .copied()
            .find(|c| normalize_label(c.as_str()) == norm)
            .ok_or_else(|| CourtflowError::InvalidCategory(s.to_string()))
    }
}

fn normalize_label(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| match c {
            '-' | '_' => ' ',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Clock and date helpers
// ---------------------------------------------------------------------------

/// Parse a wall-clock value as entered in a form: `HH:MM` or `HH:MM:SS`.
pub fn parse_clock(field: &str, raw: &str) -> Result<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| CourtflowError::invalid_value(field, raw))
}

/// Parse an ISO calendar date (`YYYY-MM-DD`).
pub fn parse_date(field: &str, raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| CourtflowError::invalid_value(field, raw))
}

/// 12-hour display used on the printed practice sheet: `16:00:00` → `4:00 PM`.
pub fn format_clock(t: NaiveTime) -> String {
    t.format("%-I:%M %p").to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

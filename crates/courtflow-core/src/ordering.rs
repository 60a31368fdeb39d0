//! Order-index bookkeeping for a plan's activities.
//!
//! Position in the local list is the source of truth. Every primitive here
//! rewrites `order_index` to match position and reports only the rows whose
//! stored index actually changed, so a list that drifted (gaps or duplicates
//! from an interrupted write) is healed by the next mutation.

use std::collections::{HashMap, HashSet};

use crate::activity::Activity;
use crate::error::{CourtflowError, Result};

/// One stored `order_index` that has to be rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexChange {
    pub id: String,
    pub order_index: u32,
}

/// Where a new activity lands: right after `after`, or at the end.
pub fn insertion_index(after: Option<usize>, len: usize) -> usize {
    match after {
        Some(a) => a.saturating_add(1).min(len),
        None => len,
    }
}

/// Stored index for a list position.
pub fn index_of(pos: usize) -> u32 {
    u32::try_from(pos).unwrap_or(u32::MAX)
}

fn set_index(item: &mut Activity, want: u32, changes: &mut Vec<IndexChange>) {
    if item.order_index != want {
        item.order_index = want;
        changes.push(IndexChange {
            id: item.id.clone(),
            order_index: want,
        });
    }
}

/// Open a gap at `target` for a row about to be inserted there.
pub fn shift_for_insert(items: &mut [Activity], target: usize) -> Vec<IndexChange> {
    let mut changes = Vec::new();
    for (pos, item) in items.iter_mut().enumerate() {
        let want = if pos < target { pos } else { pos + 1 };
        set_index(item, index_of(want), &mut changes);
    }
    changes
}

/// Make indices equal positions.
pub fn renumber(items: &mut [Activity]) -> Vec<IndexChange> {
    let mut changes = Vec::new();
    for (pos, item) in items.iter_mut().enumerate() {
        set_index(item, index_of(pos), &mut changes);
    }
    changes
}

/// `ordered` must name exactly the ids in `current`, each once.
pub fn validate_permutation(current: &[Activity], ordered: &[&str]) -> Result<()> {
    let mut seen = HashSet::new();
    for &id in ordered {
        if !seen.insert(id) {
            return Err(CourtflowError::InvalidOrder(format!(
                "duplicate id in order list: '{id}'"
            )));
        }
    }

    let existing: HashSet<&str> = current.iter().map(|a| a.id.as_str()).collect();
    for &id in ordered {
        if !existing.contains(id) {
            return Err(CourtflowError::InvalidOrder(format!(
                "'{id}' is not in this plan"
            )));
        }
    }

    for a in current {
        if !seen.contains(a.id.as_str()) {
            return Err(CourtflowError::InvalidOrder(format!(
                "missing id in order list: '{}'",
                a.id
            )));
        }
    }
    Ok(())
}

/// Rearrange `items` to follow `ordered`. Call [`validate_permutation`] first.
pub fn apply_order(items: &mut [Activity], ordered: &[&str]) {
    let rank: HashMap<&str, usize> = ordered.iter().enumerate().map(|(i, id)| (*id, i)).collect();
    items.sort_by_key(|a| rank.get(a.id.as_str()).copied().unwrap_or(usize::MAX));
}

/// Move the item at `from` to `to`, clamped to the last position. Returns
/// the position it ended up at.
pub fn move_item(items: &mut Vec<Activity>, from: usize, to: usize) -> usize {
    let to = to.min(items.len().saturating_sub(1));
    let item = items.remove(from);
    items.insert(to, item);
    to
}

/// Indices are exactly `0..len` in list order.
pub fn is_dense(items: &[Activity]) -> bool {
    items
        .iter()
        .enumerate()
        .all(|(pos, a)| a.order_index == index_of(pos))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, Utc};

    fn act(id: &str, idx: u32) -> Activity {
        Activity {
            id: id.to_string(),
            practice_plan_id: "p".to_string(),
            start_clock: NaiveTime::MIN,
            end_clock: NaiveTime::MIN,
            activity_text: id.to_uppercase(),
            cue_text: String::new(),
            order_index: idx,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn ids(items: &[Activity]) -> Vec<&str> {
        items.iter().map(|a| a.id.as_str()).collect()
    }

    #[test]
    fn insertion_index_clamps_anchor() {
        assert_eq!(insertion_index(None, 0), 0);
        assert_eq!(insertion_index(None, 3), 3);
        assert_eq!(insertion_index(Some(0), 3), 1);
        assert_eq!(insertion_index(Some(2), 3), 3);
        assert_eq!(insertion_index(Some(40), 3), 3);
    }

    #[test]
    fn shift_only_reports_rows_at_or_after_target() {
        let mut items = vec![act("a", 0), act("b", 1), act("c", 2)];
        let changes = shift_for_insert(&mut items, 1);
        assert_eq!(
            changes,
            vec![
                IndexChange { id: "b".into(), order_index: 2 },
                IndexChange { id: "c".into(), order_index: 3 },
            ]
        );

        // appending to a dense list moves nothing
        let mut dense = vec![act("a", 0), act("b", 1), act("c", 2)];
        assert!(shift_for_insert(&mut dense, 3).is_empty());
    }

    #[test]
    fn renumber_heals_drift() {
        let mut items = vec![act("a", 0), act("b", 0), act("c", 5)];
        let changes = renumber(&mut items);
        assert_eq!(changes.len(), 2);
        assert!(is_dense(&items));
        assert!(renumber(&mut items).is_empty());
    }

    #[test]
    fn permutation_errors() {
        let items = vec![act("a", 0), act("b", 1)];
        let dup = validate_permutation(&items, &["a", "a"]).unwrap_err();
        assert!(dup.to_string().contains("duplicate id"));
        let extra = validate_permutation(&items, &["a", "b", "z"]).unwrap_err();
        assert!(extra.to_string().contains("'z' is not in this plan"));
        let missing = validate_permutation(&items, &["b"]).unwrap_err();
        assert!(missing.to_string().contains("missing id"));
        assert!(missing.is_validation());
        validate_permutation(&items, &["b", "a"]).unwrap();
    }

    #[test]
    fn apply_order_then_renumber() {
        let mut items = vec![act("a", 0), act("b", 1), act("c", 2)];
        apply_order(&mut items, &["c", "a", "b"]);
        assert_eq!(ids(&items), vec!["c", "a", "b"]);
        let changes = renumber(&mut items);
        assert_eq!(changes.len(), 3);
        assert!(is_dense(&items));
    }

    #[test]
    fn move_item_clamps_to_last() {
        let mut items = vec![act("a", 0), act("b", 1), act("c", 2)];
        assert_eq!(move_item(&mut items, 0, 99), 2);
        assert_eq!(ids(&items), vec!["b", "c", "a"]);
        assert_eq!(move_item(&mut items, 2, 0), 0);
        assert_eq!(ids(&items), vec!["a", "b", "c"]);
    }
}

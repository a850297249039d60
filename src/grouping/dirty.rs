//! Dirty tracking for records.
//!
//! Only the vocabulary edit workflows rely on: which records were added,
//! modified or deleted, the original value of each edited field, and the set
//! of changed field keys. Entries are keyed by data index.

use std::collections::{BTreeSet, HashMap};

use crate::types::{CellValue, DirtyState};

/// Edit annotation for a single record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirtyEntry {
    pub state: DirtyState,
    /// Pre-edit value per changed field (`None` = was undefined)
    pub original: HashMap<String, Option<CellValue>>,
    pub changed_fields: BTreeSet<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DirtyTracker {
    entries: HashMap<usize, DirtyEntry>,
}

impl DirtyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, data_index: usize) -> DirtyState {
        self.entries
            .get(&data_index)
            .map_or(DirtyState::Pristine, |e| e.state)
    }

    pub fn entry(&self, data_index: usize) -> Option<&DirtyEntry> {
        self.entries.get(&data_index)
    }

    pub fn mark_added(&mut self, data_index: usize) {
        self.entries.entry(data_index).or_default().state = DirtyState::Added;
    }

    /// Record an edit of `field`. The first pre-edit value is kept as the shadow.
    /// Added and deleted records keep their state.
    pub fn mark_modified(&mut self, data_index: usize, field: &str, previous: Option<CellValue>) {
        let entry = self.entries.entry(data_index).or_default();
        if entry.state == DirtyState::Pristine {
            entry.state = DirtyState::Modified;
        }
        entry.original.entry(field.to_string()).or_insert(previous);
        entry.changed_fields.insert(field.to_string());
    }

    pub fn mark_deleted(&mut self, data_index: usize) {
        self.entries.entry(data_index).or_default().state = DirtyState::Deleted;
    }

    /// Drop any annotation for the record. Returns whether one existed.
    pub fn mark_pristine(&mut self, data_index: usize) -> bool {
        self.entries.remove(&data_index).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Data indices with a non-pristine state, ascending.
    pub fn dirty_indices(&self) -> Vec<usize> {
        let mut out: Vec<usize> = self.entries.keys().copied().collect();
        out.sort_unstable();
        out
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;

    #[test]
    fn keeps_first_original_value() {
        let mut dirty = DirtyTracker::new();
        dirty.mark_modified(3, "amount", Some(CellValue::Number(1.0)));
        dirty.mark_modified(3, "amount", Some(CellValue::Number(2.0)));
        dirty.mark_modified(3, "note", None);

        let entry = dirty.entry(3).unwrap();
        assert_eq!(entry.state, DirtyState::Modified);
        assert_eq!(entry.original["amount"], Some(CellValue::Number(1.0)));
        assert_eq!(entry.original["note"], None);
        assert_eq!(
            entry.changed_fields.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["amount", "note"]
        );
    }

    #[test]
    fn added_rows_stay_added_when_edited() {
        let mut dirty = DirtyTracker::new();
        dirty.mark_added(0);
        dirty.mark_modified(0, "x", None);
        assert_eq!(dirty.state(0), DirtyState::Added);
    }

    #[test]
    fn pristine_removes_entry() {
        let mut dirty = DirtyTracker::new();
        dirty.mark_deleted(5);
        dirty.mark_added(1);
        assert_eq!(dirty.dirty_indices(), vec![1, 5]);
        assert!(dirty.mark_pristine(5));
        assert!(!dirty.mark_pristine(5));
        assert_eq!(dirty.state(5), DirtyState::Pristine);
        assert_eq!(dirty.len(), 1);
    }
}

//! Grouping and aggregation engine.
//!
//! Turns a flat record list plus an ordered list of grouping columns into a
//! group tree with per-group aggregates, then flattens it into the display
//! sequence that scrolling, virtualization and selection index into.
//!
//! Layers:
//! - `key`: value identity and group ids
//! - `aggregate`: built-in and custom aggregate functions
//! - `tree`: the partition tree (rebuilt wholesale)
//! - `flatten`: tree -> display rows, honoring collapse state
//! - `dirty`: edit annotations carried onto data rows

mod aggregate;
mod dirty;
mod flatten;
mod key;
mod tree;

pub use aggregate::{AggregateDef, AggregateFn, AggregateSpec, BuiltinAggregate, Reducer};
pub use dirty::{DirtyEntry, DirtyTracker};
pub use flatten::FlattenOptions;
pub use key::GroupKey;
pub use tree::{GroupContent, GroupNode, GroupTree};

use std::collections::HashSet;
use std::rc::Rc;

use crate::config::GridConfig;
use crate::types::{
    CellValue, DirtyState, DisplayRow, GroupColumn, GroupId, Record, RowId,
};

/// Owns the dataset, grouping configuration, collapse state and the derived
/// tree and display sequence.
#[derive(Debug, Default)]
pub struct GroupingEngine {
    records: Vec<Rc<Record>>,
    columns: Vec<GroupColumn>,
    aggregates: Vec<AggregateSpec>,
    options: FlattenOptions,
    /// Collapsed group ids; kept across rebuilds so a refresh preserves them
    collapsed: HashSet<GroupId>,
    tree: GroupTree,
    group_ids: HashSet<GroupId>,
    rows: Vec<DisplayRow>,
    data_to_view: Vec<Option<usize>>,
    dirty: DirtyTracker,
}

impl GroupingEngine {
    pub fn new() -> Self {
        Self::with_options(FlattenOptions {
            show_group_footers: false,
            show_grand_total: true,
            always_show_grand_total: false,
        })
    }

    pub fn with_options(options: FlattenOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn from_config(config: &GridConfig) -> Self {
        Self::with_options(flatten_options(config))
    }

    /// Replace dataset, grouping columns and aggregates in one rebuild.
    pub fn build<I>(
        &mut self,
        records: I,
        columns: Vec<GroupColumn>,
        aggregates: Vec<AggregateSpec>,
    ) -> (&GroupTree, &[DisplayRow])
    where
        I: IntoIterator<Item = Record>,
    {
        self.records = records.into_iter().map(Rc::new).collect();
        self.columns = columns;
        self.aggregates = aggregates;
        self.dirty.clear();
        self.rebuild();
        (&self.tree, &self.rows)
    }

    /// Replace the dataset. Dirty annotations are dropped; collapse state is kept.
    pub fn set_records<I>(&mut self, records: I)
    where
        I: IntoIterator<Item = Record>,
    {
        self.records = records.into_iter().map(Rc::new).collect();
        self.dirty.clear();
        self.rebuild();
    }

    pub fn set_group_columns(&mut self, columns: Vec<GroupColumn>) {
        if self.columns != columns {
            self.columns = columns;
            self.rebuild();
        }
    }

    pub fn set_aggregates(&mut self, aggregates: Vec<AggregateSpec>) {
        self.aggregates = aggregates;
        self.rebuild();
    }

    pub fn set_options(&mut self, options: FlattenOptions) {
        if self.options != options {
            self.options = options;
            self.reflatten();
        }
    }

    pub fn options(&self) -> FlattenOptions {
        self.options
    }

    /// Flip a group's collapsed flag. Unknown ids are ignored (returns false).
    ///
    /// Returns whether the display sequence changed; a group hidden under a
    /// collapsed ancestor keeps its new flag for when the ancestor opens.
    pub fn toggle_group(&mut self, id: &GroupId) -> bool {
        let collapsed = !self.collapsed.contains(id);
        self.set_collapsed(id, collapsed)
    }

    /// Returns true when the display sequence changed.
    pub fn set_collapsed(&mut self, id: &GroupId, collapsed: bool) -> bool {
        if !self.group_ids.contains(id) || self.collapsed.contains(id) == collapsed {
            return false;
        }
        if collapsed {
            self.collapsed.insert(id.clone());
        } else {
            self.collapsed.remove(id);
        }
        if !self.header_shown(id) {
            return false;
        }
        self.reflatten();
        true
    }

    pub fn is_collapsed(&self, id: &GroupId) -> bool {
        self.collapsed.contains(id)
    }

    /// Clears every collapsed flag, including ones left over from earlier
    /// groupings. Returns true when a current group opened.
    pub fn expand_all(&mut self) -> bool {
        let any_live = self.collapsed.iter().any(|id| self.group_ids.contains(id));
        self.collapsed.clear();
        if !any_live {
            return false;
        }
        self.reflatten();
        true
    }

    pub fn collapse_all(&mut self) -> bool {
        let newly: Vec<GroupId> = self
            .group_ids
            .iter()
            .filter(|id| !self.collapsed.contains(*id))
            .cloned()
            .collect();
        let shown = newly.iter().any(|id| self.header_shown(id));
        self.collapsed.extend(newly);
        if !shown {
            return false;
        }
        self.reflatten();
        true
    }

    pub fn tree(&self) -> &GroupTree {
        &self.tree
    }

    pub fn group_columns(&self) -> &[GroupColumn] {
        &self.columns
    }

    pub fn find_group(&self, id: &GroupId) -> Option<&GroupNode> {
        if !self.group_ids.contains(id) {
            return None;
        }
        self.tree.find(id)
    }

    /// The flattened display sequence; a row's position is its view index.
    pub fn display_rows(&self) -> &[DisplayRow] {
        &self.rows
    }

    pub fn row(&self, view_index: usize) -> Option<&DisplayRow> {
        self.rows.get(view_index)
    }

    /// Number of display rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn record(&self, data_index: usize) -> Option<&Rc<Record>> {
        self.records.get(data_index)
    }

    /// Where a record currently sits in the display sequence; `None` when it is
    /// inside a collapsed group or out of range.
    pub fn view_index_of(&self, data_index: usize) -> Option<usize> {
        self.data_to_view.get(data_index).copied().flatten()
    }

    pub fn data_index_at(&self, view_index: usize) -> Option<usize> {
        self.rows.get(view_index).and_then(DisplayRow::data_index)
    }

    pub fn row_id(&self, data_index: usize) -> Option<RowId> {
        self.records
            .get(data_index)
            .map(|record| record.row_id(data_index))
    }

    pub fn dirty(&self) -> &DirtyTracker {
        &self.dirty
    }

    pub fn mark_added(&mut self, data_index: usize) -> bool {
        if data_index >= self.records.len() {
            return false;
        }
        self.dirty.mark_added(data_index);
        self.sync_dirty(data_index);
        true
    }

    pub fn mark_modified(
        &mut self,
        data_index: usize,
        field: &str,
        previous: Option<CellValue>,
    ) -> bool {
        if data_index >= self.records.len() {
            return false;
        }
        self.dirty.mark_modified(data_index, field, previous);
        self.sync_dirty(data_index);
        true
    }

    pub fn mark_deleted(&mut self, data_index: usize) -> bool {
        if data_index >= self.records.len() {
            return false;
        }
        self.dirty.mark_deleted(data_index);
        self.sync_dirty(data_index);
        true
    }

    pub fn mark_pristine(&mut self, data_index: usize) -> bool {
        if !self.dirty.mark_pristine(data_index) {
            return false;
        }
        self.sync_dirty(data_index);
        true
    }

    pub fn clear_dirty(&mut self) {
        let indices = self.dirty.dirty_indices();
        self.dirty.clear();
        for data_index in indices {
            self.sync_dirty(data_index);
        }
    }

    fn header_shown(&self, id: &GroupId) -> bool {
        self.rows
            .iter()
            .any(|row| matches!(row, DisplayRow::GroupHeader(h) if &h.id == id))
    }

    /// Patch the dirty flag of one visible data row in place.
    fn sync_dirty(&mut self, data_index: usize) {
        let state: DirtyState = self.dirty.state(data_index);
        let Some(view_index) = self.view_index_of(data_index) else {
            return;
        };
        if let Some(DisplayRow::Data(row)) = self.rows.get_mut(view_index) {
            row.dirty = state;
        }
    }

    fn rebuild(&mut self) {
        self.tree = GroupTree::build(&self.records, &self.columns, &self.aggregates);
        self.group_ids.clear();
        let ids = &mut self.group_ids;
        self.tree.visit(|node| {
            ids.insert(node.id.clone());
        });
        log::debug!(
            "regrouped {} records by {} column(s) into {} groups",
            self.records.len(),
            self.columns.len(),
            self.group_ids.len()
        );
        self.reflatten();
    }

    fn reflatten(&mut self) {
        self.rows = flatten::flatten(
            &self.tree,
            &self.records,
            &self.columns,
            &self.collapsed,
            &self.dirty,
            self.options,
        );
        self.data_to_view = flatten::data_to_view_map(&self.rows, self.records.len());
    }
}

pub(crate) fn flatten_options(config: &GridConfig) -> FlattenOptions {
    FlattenOptions {
        show_group_footers: config.show_group_footers,
        show_grand_total: config.show_grand_total,
        always_show_grand_total: config.always_show_grand_total,
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

    fn sample() -> Vec<Record> {
        vec![
            Record::new().set("team", "a").set("pts", 1.0),
            Record::new().set("team", "b").set("pts", 2.0),
            Record::new().set("team", "a").set("pts", 3.0),
        ]
    }

    #[test]
    fn index_translation_skips_headers() {
        let mut engine = GroupingEngine::new();
        engine.build(sample(), vec!["team".into()], vec![]);
        // header a, 0, 2, header b, 1
        assert_eq!(engine.len(), 5);
        assert_eq!(engine.view_index_of(0), Some(1));
        assert_eq!(engine.view_index_of(2), Some(2));
        assert_eq!(engine.view_index_of(1), Some(4));
        assert_eq!(engine.data_index_at(3), None);
        assert_eq!(engine.data_index_at(4), Some(1));
        assert_eq!(engine.view_index_of(99), None);
    }

    #[test]
    fn toggle_unknown_group_is_noop() {
        let mut engine = GroupingEngine::new();
        engine.build(sample(), vec!["team".into()], vec![]);
        let before = engine.display_rows().to_vec();
        assert!(!engine.toggle_group(&GroupId::new("team=s:zzz")));
        assert_eq!(engine.display_rows(), before.as_slice());
    }

    #[test]
    fn dirty_state_reaches_rows() {
        let mut engine = GroupingEngine::new();
        engine.build(sample(), vec![], vec![]);
        assert!(engine.mark_modified(1, "pts", Some(CellValue::Number(2.0))));
        assert!(!engine.mark_modified(9, "pts", None));
        assert_eq!(
            engine.row(1).unwrap().as_data().unwrap().dirty,
            DirtyState::Modified
        );
        engine.clear_dirty();
        assert_eq!(
            engine.row(1).unwrap().as_data().unwrap().dirty,
            DirtyState::Pristine
        );
    }

    #[test]
    fn collapse_state_survives_refresh() {
        let mut engine = GroupingEngine::new();
        engine.build(sample(), vec!["team".into()], vec![]);
        let a = engine.tree().roots()[0].id.clone();
        assert!(engine.toggle_group(&a));
        engine.set_records(sample());
        assert!(engine.is_collapsed(&a));
        assert_eq!(engine.len(), 3);
    }

    #[test]
    fn expand_all_ignores_stale_ids() {
        let mut engine = GroupingEngine::new();
        engine.build(sample(), vec!["team".into()], vec![]);
        let a = engine.tree().roots()[0].id.clone();
        assert!(engine.toggle_group(&a));
        engine.set_group_columns(vec![]);
        assert!(engine.is_collapsed(&a));
        assert!(!engine.expand_all());
        assert!(!engine.is_collapsed(&a));
    }

    #[test]
    fn toggling_hidden_group_keeps_display() {
        let mut engine = GroupingEngine::new();
        engine.build(sample(), vec!["team".into(), "pts".into()], vec![]);
        let a = engine.tree().roots()[0].id.clone();
        let inner = engine.tree().nodes_at_depth(1)[0].id.clone();
        assert!(engine.toggle_group(&a));
        let before = engine.display_rows().to_vec();

        assert!(!engine.toggle_group(&inner));
        assert!(engine.is_collapsed(&inner));
        assert_eq!(engine.display_rows(), before.as_slice());

        // the inner flag applies once its parent opens:
        // a, a/1 (collapsed), a/3, 2, b, b/2, 1
        assert!(engine.toggle_group(&a));
        assert_eq!(engine.len(), 7);
    }
}

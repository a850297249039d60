//! Flattening the group tree into the display sequence.
//!
//! Pre-order: header, then (unless collapsed) children in partition order,
//! then the group's footer and subtotal. A collapsed group contributes only
//! its header.

use std::collections::HashSet;
use std::rc::Rc;

use super::dirty::DirtyTracker;
use super::tree::{GroupContent, GroupNode, GroupTree};
use crate::types::{
    DataRow, DisplayRow, GrandTotalRow, GroupColumn, GroupHeaderRow, GroupId, GroupSummaryRow,
    Record,
};

/// Which synthetic rows to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlattenOptions {
    pub show_group_footers: bool,
    pub show_grand_total: bool,
    pub always_show_grand_total: bool,
}

/// Inputs shared by every level of the traversal.
struct Flattener<'a> {
    records: &'a [Rc<Record>],
    columns: &'a [GroupColumn],
    collapsed: &'a HashSet<GroupId>,
    dirty: &'a DirtyTracker,
    options: FlattenOptions,
    out: Vec<DisplayRow>,
}

pub fn flatten(
    tree: &GroupTree,
    records: &[Rc<Record>],
    columns: &[GroupColumn],
    collapsed: &HashSet<GroupId>,
    dirty: &DirtyTracker,
    options: FlattenOptions,
) -> Vec<DisplayRow> {
    let mut flattener = Flattener {
        records,
        columns,
        collapsed,
        dirty,
        options,
        out: Vec::with_capacity(records.len()),
    };

    match &tree.content {
        GroupContent::Groups(roots) => {
            let mut path = Vec::new();
            for root in roots {
                flattener.group(root, &mut path);
            }
        }
        GroupContent::Records(positions) => flattener.data_rows(positions, &[], 0),
    }

    let wants_total = options.show_grand_total
        && !tree.grand_total.is_empty()
        && (tree.record_count > 0 || options.always_show_grand_total);
    if wants_total {
        flattener.out.push(DisplayRow::GrandTotal(GrandTotalRow {
            count: tree.record_count,
            aggregates: tree.grand_total.clone(),
        }));
    }
    flattener.out
}

impl Flattener<'_> {
    fn group(&mut self, node: &GroupNode, path: &mut Vec<GroupId>) {
        let collapsed = self.collapsed.contains(&node.id);
        self.out.push(DisplayRow::GroupHeader(GroupHeaderRow {
            id: node.id.clone(),
            column: Rc::clone(&node.column),
            value: node.value.clone(),
            level: node.level,
            count: node.count,
            collapsed,
            aggregates: node.aggregates.clone(),
            path: node.path.clone(),
        }));
        if collapsed {
            return;
        }

        path.push(node.id.clone());
        match &node.content {
            GroupContent::Groups(children) => {
                for child in children {
                    self.group(child, path);
                }
            }
            GroupContent::Records(positions) => self.data_rows(positions, path, node.level + 1),
        }
        path.pop();

        if self.options.show_group_footers {
            self.out.push(DisplayRow::GroupFooter(summary(node)));
        }
        let subtotal = self
            .columns
            .get(node.level)
            .is_some_and(|c| c.show_subtotal);
        if subtotal {
            self.out.push(DisplayRow::Subtotal(summary(node)));
        }
    }

    fn data_rows(&mut self, positions: &[usize], path: &[GroupId], level: usize) {
        for &data_index in positions {
            let Some(record) = self.records.get(data_index) else {
                continue;
            };
            self.out.push(DisplayRow::Data(DataRow {
                data_index,
                record: Rc::clone(record),
                group_path: path.to_vec(),
                level,
                dirty: self.dirty.state(data_index),
            }));
        }
    }
}

fn summary(node: &GroupNode) -> GroupSummaryRow {
    GroupSummaryRow {
        id: node.id.clone(),
        column: Rc::clone(&node.column),
        value: node.value.clone(),
        level: node.level,
        count: node.count,
        aggregates: node.aggregates.clone(),
    }
}

/// `data index -> view index` for every record shown in `rows`.
pub fn data_to_view_map(rows: &[DisplayRow], record_count: usize) -> Vec<Option<usize>> {
    let mut map = vec![None; record_count];
    for (view_index, row) in rows.iter().enumerate() {
        if let Some(slot) = row.data_index().and_then(|i| map.get_mut(i)) {
            *slot = Some(view_index);
        }
    }
    map
}

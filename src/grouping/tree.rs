//! Hierarchical partition of records by the grouping columns.
//!
//! Records are split by the first column's value, each partition by the next
//! column, and so on; partitions keep the order in which their value first
//! appears. The tree is rebuilt wholesale whenever its inputs change.

use rustc_hash::FxHashMap;
use std::rc::Rc;

use super::aggregate::{aggregate, AggregateSpec};
use super::key::{child_group_id, path_segment, GroupKey};
use crate::types::{Aggregates, CellValue, GroupColumn, GroupId, PathSegment, Record};

/// Either child groups or, below the last grouping column, record positions.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupContent {
    Groups(Vec<GroupNode>),
    Records(Vec<usize>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupNode {
    pub id: GroupId,
    pub column: Rc<str>,
    pub key: GroupKey,
    /// Group value as found in the records; `None` for the undefined group.
    pub value: Option<CellValue>,
    /// Nesting depth, 0 for top-level groups
    pub level: usize,
    /// Ancestor (column, value) pairs including this node
    pub path: Vec<PathSegment>,
    /// Number of descendant records
    pub count: usize,
    pub aggregates: Aggregates,
    pub content: GroupContent,
}

impl GroupNode {
    pub fn children(&self) -> &[GroupNode] {
        match &self.content {
            GroupContent::Groups(children) => children,
            GroupContent::Records(_) => &[],
        }
    }

    /// Record positions for a leaf group; empty for interior groups.
    pub fn records(&self) -> &[usize] {
        match &self.content {
            GroupContent::Records(positions) => positions,
            GroupContent::Groups(_) => &[],
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.content, GroupContent::Records(_))
    }

    fn visit<'a>(&'a self, f: &mut dyn FnMut(&'a GroupNode)) {
        f(self);
        for child in self.children() {
            child.visit(f);
        }
    }
}

/// Result of partitioning a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupTree {
    /// Top-level groups, or every record when there are no grouping columns
    pub content: GroupContent,
    pub record_count: usize,
    /// Aggregates over the whole dataset
    pub grand_total: Aggregates,
}

impl Default for GroupTree {
    fn default() -> Self {
        Self {
            content: GroupContent::Records(Vec::new()),
            record_count: 0,
            grand_total: Aggregates::new(),
        }
    }
}

impl GroupTree {
    pub fn build(
        records: &[Rc<Record>],
        columns: &[GroupColumn],
        specs: &[AggregateSpec],
    ) -> Self {
        let all: Vec<usize> = (0..records.len()).collect();
        let grand_total = if specs.is_empty() {
            Aggregates::new()
        } else {
            aggregate(records, &all, specs)
        };
        let content = if columns.is_empty() {
            GroupContent::Records(all)
        } else {
            GroupContent::Groups(build_level(records, all, columns, specs, None, &[], 0))
        };
        GroupTree {
            content,
            record_count: records.len(),
            grand_total,
        }
    }

    /// Top-level groups (empty when ungrouped).
    pub fn roots(&self) -> &[GroupNode] {
        match &self.content {
            GroupContent::Groups(roots) => roots,
            GroupContent::Records(_) => &[],
        }
    }

    pub fn is_grouped(&self) -> bool {
        matches!(self.content, GroupContent::Groups(_))
    }

    /// Visit every group node in pre-order.
    pub fn visit<'a>(&'a self, mut f: impl FnMut(&'a GroupNode)) {
        for root in self.roots() {
            root.visit(&mut f);
        }
    }

    pub fn nodes_at_depth(&self, depth: usize) -> Vec<&GroupNode> {
        let mut out = Vec::new();
        self.visit(|node| {
            if node.level == depth {
                out.push(node);
            }
        });
        out
    }

    pub fn find(&self, id: &GroupId) -> Option<&GroupNode> {
        let mut found = None;
        self.visit(|node| {
            if found.is_none() && &node.id == id {
                found = Some(node);
            }
        });
        found
    }

    pub fn group_count(&self) -> usize {
        let mut count = 0;
        self.visit(|_| count += 1);
        count
    }
}

/// Partition `positions` by `column`, in first-appearance order.
fn partition(
    records: &[Rc<Record>],
    positions: Vec<usize>,
    column: &str,
) -> Vec<(GroupKey, Option<CellValue>, Vec<usize>)> {
    let mut slots: FxHashMap<GroupKey, usize> = FxHashMap::default();
    let mut parts: Vec<(GroupKey, Option<CellValue>, Vec<usize>)> = Vec::new();
    for pos in positions {
        let Some(record) = records.get(pos) else {
            continue;
        };
        let value = record.get(column);
        let key = GroupKey::from_value(value);
        match slots.get(&key) {
            Some(&slot) => {
                if let Some(part) = parts.get_mut(slot) {
                    part.2.push(pos);
                }
            }
            None => {
                slots.insert(key.clone(), parts.len());
                parts.push((key, value.cloned(), vec![pos]));
            }
        }
    }
    parts
}

fn build_level(
    records: &[Rc<Record>],
    positions: Vec<usize>,
    columns: &[GroupColumn],
    specs: &[AggregateSpec],
    parent: Option<&GroupId>,
    parent_path: &[PathSegment],
    level: usize,
) -> Vec<GroupNode> {
    let Some((column, rest)) = columns.split_first() else {
        return Vec::new();
    };
    let column_key: Rc<str> = Rc::from(column.key.as_str());

    partition(records, positions, &column.key)
        .into_iter()
        .map(|(key, value, members)| {
            let id = child_group_id(parent, &column.key, &key);
            let mut path = parent_path.to_vec();
            path.push(path_segment(&column_key, value.as_ref()));
            let aggregates = aggregate(records, &members, specs);
            let count = members.len();
            let content = if rest.is_empty() {
                GroupContent::Records(members)
            } else {
                GroupContent::Groups(build_level(
                    records,
                    members,
                    rest,
                    specs,
                    Some(&id),
                    &path,
                    level + 1,
                ))
            };
            GroupNode {
                id,
                column: Rc::clone(&column_key),
                key,
                value,
                level,
                path,
                count,
                aggregates,
                content,
            }
        })
        .collect()
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
    use crate::grouping::BuiltinAggregate;

    fn rec(region: &str, city: &str, amount: f64) -> Rc<Record> {
        Rc::new(
            Record::new()
                .set("region", region)
                .set("city", city)
                .set("amount", amount),
        )
    }

    #[test]
    fn partitions_in_first_appearance_order() {
        let records = vec![
            rec("West", "LA", 1.0),
            rec("East", "NY", 2.0),
            rec("West", "SF", 3.0),
            rec("East", "NY", 4.0),
        ];
        let tree = GroupTree::build(&records, &["region".into(), "city".into()], &[]);
        let roots = tree.roots();
        assert_eq!(roots.len(), 2);
        assert_eq!(roots[0].value, Some(CellValue::Text("West".into())));
        assert_eq!(roots[0].count, 2);
        assert_eq!(roots[1].children().len(), 1);
        assert_eq!(roots[1].children()[0].records(), &[1, 3]);
        assert!(roots[1].children()[0].is_leaf());
        assert_eq!(roots[1].children()[0].level, 1);
        assert_eq!(roots[1].children()[0].path.len(), 2);
    }

    #[test]
    fn undefined_values_form_their_own_group() {
        let records = vec![
            Rc::new(Record::new().set("k", "a")),
            Rc::new(Record::new()),
            Rc::new(Record::new().set("k", CellValue::Null)),
        ];
        let tree = GroupTree::build(&records, &["k".into()], &[]);
        assert_eq!(tree.roots().len(), 3);
        assert_eq!(tree.roots()[1].value, None);
        assert_eq!(tree.roots()[1].key, GroupKey::Undefined);
    }

    #[test]
    fn aggregates_cover_descendants() {
        let records = vec![
            rec("West", "LA", 1.0),
            rec("West", "SF", 3.0),
            rec("East", "NY", 4.0),
        ];
        let specs = [AggregateSpec::new("total", "amount", BuiltinAggregate::Sum)];
        let tree = GroupTree::build(&records, &["region".into(), "city".into()], &specs);
        assert_eq!(tree.roots()[0].aggregates["total"], CellValue::Number(4.0));
        assert_eq!(tree.grand_total["total"], CellValue::Number(8.0));
        let la = tree.find(&tree.roots()[0].children()[0].id).unwrap();
        assert_eq!(la.aggregates["total"], CellValue::Number(1.0));
    }

    #[test]
    fn ungrouped_tree_holds_all_records() {
        let records = vec![rec("a", "b", 1.0), rec("c", "d", 2.0)];
        let tree = GroupTree::build(&records, &[], &[]);
        assert!(!tree.is_grouped());
        assert_eq!(tree.content, GroupContent::Records(vec![0, 1]));
        assert_eq!(tree.group_count(), 0);
    }
}

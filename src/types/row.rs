use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use super::{CellValue, DirtyState, Record};

/// Aggregate key -> computed value.
pub type Aggregates = BTreeMap<String, CellValue>;

/// Identity of a group node, derived from its full ancestor path.
///
/// Stable across rebuilds as long as the grouping columns and values are the same,
/// which is what lets collapse state survive a dataset refresh.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GroupId(Rc<str>);

impl GroupId {
    pub fn new(id: &str) -> Self {
        Self(Rc::from(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GroupId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// One (column, value) step of a group's ancestor path.
/// `value` is `None` for the undefined group.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathSegment {
    pub column: Rc<str>,
    pub value: Option<CellValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupHeaderRow {
    pub id: GroupId,
    pub column: Rc<str>,
    pub value: Option<CellValue>,
    pub level: usize,
    pub count: usize,
    pub collapsed: bool,
    pub aggregates: Aggregates,
    pub path: Vec<PathSegment>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataRow {
    pub data_index: usize,
    pub record: Rc<Record>,
    /// Enclosing groups, outermost first.
    pub group_path: Vec<GroupId>,
    pub level: usize,
    pub dirty: DirtyState,
}

/// Footer and subtotal rows share a shape; the variant says where they came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummaryRow {
    pub id: GroupId,
    pub column: Rc<str>,
    pub value: Option<CellValue>,
    pub level: usize,
    pub count: usize,
    pub aggregates: Aggregates,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrandTotalRow {
    pub count: usize,
    pub aggregates: Aggregates,
}

/// One renderable row of the flattened display sequence.
///
/// The position of a row in that sequence is its view index.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum DisplayRow {
    GroupHeader(GroupHeaderRow),
    Data(DataRow),
    GroupFooter(GroupSummaryRow),
    Subtotal(GroupSummaryRow),
    GrandTotal(GrandTotalRow),
}

impl DisplayRow {
    pub fn is_data(&self) -> bool {
        matches!(self, DisplayRow::Data(_))
    }

    pub fn as_data(&self) -> Option<&DataRow> {
        match self {
            DisplayRow::Data(row) => Some(row),
            DisplayRow::GroupHeader(_)
            | DisplayRow::GroupFooter(_)
            | DisplayRow::Subtotal(_)
            | DisplayRow::GrandTotal(_) => None,
        }
    }

    pub fn data_index(&self) -> Option<usize> {
        self.as_data().map(|row| row.data_index)
    }

    /// Group owning this row: the header's group, or the group a footer/subtotal closes.
    pub fn group_id(&self) -> Option<&GroupId> {
        match self {
            DisplayRow::GroupHeader(h) => Some(&h.id),
            DisplayRow::GroupFooter(s) | DisplayRow::Subtotal(s) => Some(&s.id),
            DisplayRow::Data(d) => d.group_path.last(),
            DisplayRow::GrandTotal(_) => None,
        }
    }

    pub fn level(&self) -> usize {
        match self {
            DisplayRow::GroupHeader(h) => h.level,
            DisplayRow::Data(d) => d.level,
            DisplayRow::GroupFooter(s) | DisplayRow::Subtotal(s) => s.level,
            DisplayRow::GrandTotal(_) => 0,
        }
    }
}

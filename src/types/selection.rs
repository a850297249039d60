use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::rc::Rc;

use super::RowId;

/// What a click selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// Selection disabled
    None,
    /// Whole rows
    Row,
    /// Rectangular cell ranges
    #[default]
    Range,
    /// Cell ranges, with the owning rows tracked as a derived row set
    All,
}

impl SelectionMode {
    pub fn selects_cells(self) -> bool {
        matches!(self, SelectionMode::Range | SelectionMode::All)
    }
}

/// A selected cell, keyed by data identity rather than screen position so it
/// survives scrolling and regrouping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellKey {
    pub data_index: usize,
    pub column: Rc<str>,
}

impl CellKey {
    pub fn new(data_index: usize, column: &str) -> Self {
        Self {
            data_index,
            column: Rc::from(column),
        }
    }
}

/// Owned copy of the selection state handed to renderers and listeners.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionSnapshot {
    pub mode: SelectionMode,
    pub rows: BTreeSet<RowId>,
    pub cells: BTreeSet<CellKey>,
    pub anchor: Option<CellKey>,
    pub focus: Option<CellKey>,
    pub dragging: bool,
}

//! Copy support: the current selection as tab-separated text.
//!
//! Rows come out in display order and columns in visual order. Cell mode
//! copies the bounding column span of the selection and leaves unselected
//! cells inside it empty, the way spreadsheet copies behave.

use std::collections::BTreeSet;

use crate::grouping::GroupingEngine;
use crate::selection::{ColumnOrder, SelectionModel};
use crate::types::{DisplayRow, Record, RowId, SelectionMode};

/// Render the selection as TSV. Records hidden in collapsed groups are skipped.
pub fn selection_to_tsv(engine: &GroupingEngine, selection: &SelectionModel) -> String {
    let columns = selection.columns();
    let snapshot = selection.snapshot();

    let (column_span, filter) = match selection.mode() {
        SelectionMode::None => return String::new(),
        SelectionMode::Row => (
            (0..columns.len()).collect::<Vec<_>>(),
            RowFilter::Ids(snapshot.rows),
        ),
        SelectionMode::Range | SelectionMode::All => {
            let used: BTreeSet<usize> = snapshot
                .cells
                .iter()
                .filter_map(|cell| columns.index_of(&cell.column))
                .collect();
            let (Some(&lo), Some(&hi)) = (used.first(), used.last()) else {
                return String::new();
            };
            let data = snapshot.cells.iter().map(|c| c.data_index).collect();
            ((lo..=hi).collect(), RowFilter::Data(data))
        }
    };

    let mut lines = Vec::new();
    for row in engine.display_rows() {
        let DisplayRow::Data(row) = row else {
            continue;
        };
        if !filter.accepts(row.data_index, &row.record) {
            continue;
        }
        lines.push(format_line(
            selection,
            columns,
            &column_span,
            row.data_index,
            &row.record,
        ));
    }
    lines.join("\n")
}

enum RowFilter {
    Ids(BTreeSet<RowId>),
    Data(BTreeSet<usize>),
}

impl RowFilter {
    fn accepts(&self, data_index: usize, record: &Record) -> bool {
        match self {
            RowFilter::Ids(ids) => ids.contains(&record.row_id(data_index)),
            RowFilter::Data(indices) => indices.contains(&data_index),
        }
    }
}

fn format_line(
    selection: &SelectionModel,
    columns: &ColumnOrder,
    column_span: &[usize],
    data_index: usize,
    record: &Record,
) -> String {
    let cells_only = selection.mode().selects_cells();
    let mut line = String::new();
    for (n, &col) in column_span.iter().enumerate() {
        if n > 0 {
            line.push('\t');
        }
        let Some(key) = columns.key_at(col) else {
            continue;
        };
        if cells_only && !selection.is_cell_selected(data_index, key) {
            continue;
        }
        if let Some(value) = record.get(key) {
            line.push_str(&escape_cell_value(&value.to_string()));
        }
    }
    line
}

/// Quote a value that contains a tab, newline or quote, doubling inner quotes.
pub(crate) fn escape_cell_value(value: &str) -> String {
    let needs_quoting = value.contains('\t')
        || value.contains('\n')
        || value.contains('\r')
        || value.contains('"');

    if needs_quoting {
        let escaped = value.replace('"', "\"\"");
        format!("\"{}\"", escaped)
    } else {
        value.to_string()
    }
}

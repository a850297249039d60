//! Rectangular range materialization.
//!
//! Rows are walked by view index so headers, footers and totals drop out;
//! results are keyed by data index so they survive regrouping.

use std::rc::Rc;

use super::columns::ColumnOrder;
use super::RowSource;
use crate::types::{CellKey, DisplayRow};

/// Data indices of the data rows in the inclusive view span `[a, b]`.
pub(crate) fn data_rows_between<S>(source: &S, a: usize, b: usize) -> Vec<usize>
where
    S: RowSource + ?Sized,
{
    let (lo, hi) = (a.min(b), a.max(b));
    (lo..=hi)
        .filter_map(|view_index| match source.row(view_index)? {
            DisplayRow::Data(row) => Some(row.data_index),
            DisplayRow::GroupHeader(_)
            | DisplayRow::GroupFooter(_)
            | DisplayRow::Subtotal(_)
            | DisplayRow::GrandTotal(_) => None,
        })
        .collect()
}

/// Data indices spanned by `anchor..=target`.
///
/// A target that is not currently displayed yields nothing. An anchor that
/// scrolled into a collapsed group yields only the target.
pub(crate) fn row_span<S>(source: &S, anchor: usize, target: usize) -> Vec<usize>
where
    S: RowSource + ?Sized,
{
    let Some(to) = source.view_index_of(target) else {
        return Vec::new();
    };
    match source.view_index_of(anchor) {
        Some(from) => data_rows_between(source, from, to),
        None => vec![target],
    }
}

/// Every cell in the rectangle with corners `anchor` and `target`.
pub(crate) fn cell_span<S>(
    source: &S,
    columns: &ColumnOrder,
    anchor: &CellKey,
    target: &CellKey,
) -> Vec<CellKey>
where
    S: RowSource + ?Sized,
{
    let cols: &[Rc<str>] = match columns.span(&anchor.column, &target.column) {
        Some(span) => span,
        None if columns.contains(&target.column) => std::slice::from_ref(&target.column),
        None => return Vec::new(),
    };
    let rows = row_span(source, anchor.data_index, target.data_index);

    let mut cells = Vec::with_capacity(rows.len() * cols.len());
    for data_index in rows {
        for column in cols {
            cells.push(CellKey {
                data_index,
                column: Rc::clone(column),
            });
        }
    }
    cells
}

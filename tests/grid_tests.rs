//! Grid facade tests
//!
//! End-to-end flows through `DataGrid`: configuration, data loading, pointer
//! routing, virtualized windows and copy.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::*;
use gridview::{
    AggregateSpec, BuiltinAggregate, ColumnDef, DataGrid, DisplayRow, GridError, GroupColumn,
    KeyInput, PointerInput, Record, ScrollAlign, SelectionMode, VisibleRange,
};

const CONFIG: &str = r#"{
    "rowHeight": 20,
    "groupRowHeight": 20,
    "overscan": 2,
    "virtualization": "enabled"
}"#;

fn ledger_grid(n: usize) -> DataGrid {
    let mut grid = DataGrid::from_config_json(CONFIG).unwrap();
    grid.set_columns(vec![
        ColumnDef::new("name", 150.0),
        ColumnDef::new("amount", 80.0),
        ColumnDef::new("date", 100.0),
    ]);
    grid.set_data(ledger(n), vec![], vec![]);
    grid
}

fn sales_grid(n: usize) -> DataGrid {
    let mut grid = DataGrid::default();
    grid.set_columns(vec![
        ColumnDef::new("region", 100.0),
        ColumnDef::new("rep", 100.0),
        ColumnDef::new("amount", 80.0),
    ]);
    grid.set_data(
        sales(n),
        vec![GroupColumn::new("region")],
        vec![AggregateSpec::new("total", "amount", BuiltinAggregate::Sum)],
    );
    grid
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_config_json_is_partial_and_validated() {
    let grid = DataGrid::from_config_json(r#"{"selectionMode": "row"}"#).unwrap();
    assert_eq!(grid.config().selection_mode, SelectionMode::Row);
    assert_eq!(grid.config().row_height, 28.0);
    assert_eq!(grid.selection().mode(), SelectionMode::Row);

    assert!(matches!(
        DataGrid::from_config_json(r#"{"rowHeight": 0}"#),
        Err(GridError::Config(_))
    ));
    assert!(matches!(
        DataGrid::from_config_json("{"),
        Err(GridError::Json(_))
    ));
}

#[test]
fn test_mode_change_clears_selection() {
    let mut grid = ledger_grid(5);
    grid.select_all();
    assert_eq!(grid.selection().selected_cell_count(), 15);
    assert!(grid.apply_config_json(r#"{"selectionMode": "row", "virtualization": "enabled"}"#));
    assert_eq!(grid.selection().mode(), SelectionMode::Row);
    assert_eq!(grid.selection().selected_cell_count(), 0);
}

// ============================================================================
// Virtualized windows
// ============================================================================

#[test]
fn test_viewport_yields_row_and_column_windows() {
    let mut grid = ledger_grid(500);
    assert!(grid.visible_rows().is_none());
    assert!(grid.set_viewport(0.0, 200.0, 300.0, 100.0));

    let rows = grid.visible_rows().unwrap();
    assert_eq!((rows.start_index, rows.end_index), (8, 18));
    assert_eq!(rows.leading_offset, 160.0);
    assert_eq!(rows.total_extent, 10_000.0);

    let cols = grid.visible_columns().unwrap();
    assert_eq!((cols.start_index, cols.end_index), (0, 3));
    assert_eq!(cols.total_extent, 330.0);
}

#[test]
fn test_row_window_notifies_once_per_change() {
    let mut grid = ledger_grid(500);
    let seen: Rc<RefCell<Vec<Option<VisibleRange>>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    grid.subscribe_rows(move |range| sink.borrow_mut().push(*range));

    grid.set_viewport(0.0, 0.0, 300.0, 100.0);
    grid.set_viewport(0.0, 3.0, 300.0, 100.0);
    grid.set_viewport(0.0, 3.0, 300.0, 100.0);
    assert_eq!(seen.borrow().len(), 1);

    grid.set_viewport(0.0, 400.0, 300.0, 100.0);
    assert_eq!(seen.borrow().len(), 2);
    assert_eq!(seen.borrow()[1].unwrap().start_index, 18);
}

#[test]
fn test_collapse_shrinks_row_axis() {
    let mut grid = sales_grid(9);
    // three headers, nine records, grand total
    assert_eq!(grid.row_axis().len(), 13);
    assert_eq!(grid.row_axis().total_extent(), 4.0 * 32.0 + 9.0 * 28.0);

    assert!(grid.pointer_down(&PointerInput::at(0, "region")));
    assert_eq!(grid.row_axis().len(), 10);
    assert!(matches!(grid.display_rows()[1], DisplayRow::GroupHeader(_)));

    assert!(grid.expand_all());
    assert_eq!(grid.row_axis().len(), 13);
}

#[test]
fn test_scroll_offset_for_record() {
    let mut grid = ledger_grid(500);
    assert_eq!(grid.scroll_offset_for_record(100, ScrollAlign::Start), None);
    grid.set_viewport(0.0, 0.0, 300.0, 100.0);
    assert_eq!(
        grid.scroll_offset_for_record(100, ScrollAlign::Start),
        Some(2000.0)
    );
    assert_eq!(
        grid.scroll_offset_for_record(100, ScrollAlign::End),
        Some(1920.0)
    );
    assert_eq!(grid.scroll_offset_for_record(9999, ScrollAlign::Start), None);
}

#[test]
fn test_collapsed_record_has_no_scroll_target() {
    let mut grid = sales_grid(9);
    grid.set_viewport(0.0, 0.0, 300.0, 100.0);
    let north = first_group(grid.engine());
    assert!(grid.set_collapsed(&north, true));
    assert_eq!(grid.scroll_offset_for_record(0, ScrollAlign::Start), None);
    assert!(grid.scroll_offset_for_record(1, ScrollAlign::Start).is_some());
}

// ============================================================================
// Pointer routing and copy
// ============================================================================

#[test]
fn test_drag_then_copy() {
    let mut grid = ledger_grid(10);
    assert!(grid.pointer_down(&PointerInput::at(1, "name")));
    assert!(grid.pointer_move(&PointerInput::at(2, "amount")));
    assert!(grid.pointer_up());
    assert_eq!(grid.copy_selection(), "item 1\t2.5\nitem 2\t5");
}

#[test]
fn test_pointer_cancel_restores_selection() {
    let mut grid = ledger_grid(10);
    grid.pointer_down(&PointerInput::at(4, "date"));
    grid.pointer_up();
    let before = grid.selection_snapshot();

    grid.pointer_down(&PointerInput::at(0, "name"));
    grid.pointer_move(&PointerInput::at(6, "date"));
    assert!(grid.pointer_cancel());
    assert_eq!(grid.selection_snapshot(), before);
    assert_eq!(grid.copy_selection(), "2024-01-05");
}

#[test]
fn test_modifier_presses_are_clicks() {
    let mut grid = ledger_grid(10);
    grid.pointer_down(&PointerInput::at(2, "amount"));
    grid.pointer_up();
    assert!(grid.pointer_down(&PointerInput::at(4, "amount").shift()));
    assert!(!grid.selection().is_dragging());
    assert!(grid.pointer_down(&PointerInput::at(8, "date").ctrl()));
    assert_eq!(grid.selection().selected_cell_count(), 4);
    assert_eq!(grid.copy_selection(), "5\t\n7.5\t\n10\t\n\t2024-01-09");
}

#[test]
fn test_row_mode_copy_uses_every_column() {
    let mut grid = DataGrid::from_config_json(r#"{"selectionMode": "row"}"#).unwrap();
    grid.set_columns(vec![
        ColumnDef::new("name", 100.0),
        ColumnDef::new("amount", 100.0),
        ColumnDef::new("date", 100.0),
    ]);
    grid.set_data(ledger(3), vec![], vec![]);
    grid.pointer_down(&PointerInput::at(2, "amount"));
    grid.pointer_up();
    assert_eq!(grid.copy_selection(), "item 2\t5\t2024-01-03");
}

#[test]
fn test_copy_skips_group_rows() {
    let mut grid = sales_grid(6);
    assert!(grid.key_down(&KeyInput::new("a").ctrl()));
    let text = grid.copy_selection();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 6);
    // display order: north group first
    assert_eq!(lines[0], "north\tann\t0");
    assert_eq!(lines[1], "north\tbob\t30");
}

#[test]
fn test_press_on_total_row_is_ignored() {
    let mut grid = sales_grid(3);
    let last = grid.display_rows().len() - 1;
    assert!(matches!(grid.display_rows()[last], DisplayRow::GrandTotal(_)));
    assert!(!grid.pointer_down(&PointerInput::at(last, "amount")));
    assert!(!grid.pointer_down(&PointerInput::at(99, "amount")));
    assert!(grid.selection_snapshot().cells.is_empty());
}

#[test]
fn test_reload_clears_selection_and_dirty_state() {
    let mut grid = ledger_grid(4);
    grid.select_rows([1, 2]);
    grid.with_engine(|engine| engine.mark_deleted(2));
    assert_eq!(grid.selection().selected_cell_count(), 6);

    grid.set_records(ledger(4));
    assert_eq!(grid.selection().selected_cell_count(), 0);
    assert!(grid.engine().dirty().is_empty());
}

#[test]
fn test_engine_edits_resync_row_axis_and_selection() {
    let region = |r: &str| Record::new().set("region", r).set("amount", 1.0);
    let mut grid = DataGrid::default();
    grid.set_columns(vec![
        ColumnDef::new("region", 100.0),
        ColumnDef::new("amount", 80.0),
    ]);
    grid.set_data(
        vec![region("x"), region("x"), region("y")],
        vec![GroupColumn::new("region")],
        vec![],
    );
    // H x, 0, 1, H y, 2
    assert_eq!(grid.row_axis().size_of(2), Some(28.0));
    grid.select_all();
    assert_eq!(grid.selection().selected_cell_count(), 6);

    // same row count, header moved: H x, 0, H y, 1, 2
    grid.with_engine(|engine| engine.set_records(vec![region("x"), region("y"), region("y")]));
    assert_eq!(grid.display_rows().len(), 5);
    assert_eq!(grid.row_axis().size_of(2), Some(32.0));
    assert_eq!(grid.row_axis().size_of(4), Some(28.0));
    assert_eq!(grid.selection().selected_cell_count(), 6);

    grid.with_engine(|engine| engine.set_records(vec![region("y")]));
    assert_eq!(grid.row_axis().len(), 2);
    assert_eq!(grid.selection().selected_cell_count(), 2);
    assert!(!grid.selection().is_cell_selected(2, "amount"));
}

#[test]
fn test_live_config_update_is_partial() {
    let mut grid = DataGrid::from_config_json(r#"{"selectionMode": "row", "rowHeight": 40}"#)
        .unwrap();
    grid.set_columns(vec![ColumnDef::new("name", 100.0)]);
    grid.set_data(ledger(3), vec![], vec![]);
    grid.select_rows([1]);

    assert!(grid.apply_config_json(r#"{"overscan": 5}"#));
    assert_eq!(grid.config().selection_mode, SelectionMode::Row);
    assert_eq!(grid.config().row_height, 40.0);
    assert_eq!(grid.row_axis().overscan(), 5);
    assert_eq!(grid.selection().selected_row_count(), 1);

    assert!(!grid.apply_config_json("[]"));
    assert_eq!(grid.config().overscan, 5);
}

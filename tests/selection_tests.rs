//! Selection state machine tests
//!
//! Click, Shift/Ctrl, drag, keyboard and select-all behavior, in flat and
//! grouped display sequences.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod common;

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use common::*;
use gridview::{
    CellKey, GroupColumn, GroupingEngine, KeyInput, PointerInput, RowId, SelectionMode,
    SelectionModel, SelectionSnapshot,
};

fn flat(records: Vec<gridview::Record>) -> GroupingEngine {
    let mut engine = GroupingEngine::new();
    engine.build(records, vec![], vec![]);
    engine
}

fn keys(cells: &[(usize, &str)]) -> BTreeSet<CellKey> {
    cells.iter().map(|&(i, c)| CellKey::new(i, c)).collect()
}

// ============================================================================
// Click
// ============================================================================

#[test]
fn test_shift_click_selects_single_column_span() {
    let engine = flat(ledger(8));
    let mut sel = SelectionModel::with_columns(SelectionMode::Range, ["name", "amount", "date"]);

    sel.click(&engine, &PointerInput::at(2, "amount"));
    sel.click(&engine, &PointerInput::at(5, "amount").shift());
    assert_eq!(
        sel.snapshot().cells,
        keys(&[(2, "amount"), (3, "amount"), (4, "amount"), (5, "amount")])
    );

    sel.click(&engine, &PointerInput::at(7, "date").ctrl());
    assert_eq!(
        sel.snapshot().cells,
        keys(&[
            (2, "amount"),
            (3, "amount"),
            (4, "amount"),
            (5, "amount"),
            (7, "date")
        ])
    );
}

#[test]
fn test_ctrl_click_toggles_off() {
    let engine = flat(ledger(4));
    let mut sel = SelectionModel::with_columns(SelectionMode::Range, ["name"]);
    sel.click(&engine, &PointerInput::at(0, "name"));
    sel.click(&engine, &PointerInput::at(1, "name").ctrl());
    sel.click(&engine, &PointerInput::at(0, "name").ctrl());
    assert_eq!(sel.snapshot().cells, keys(&[(1, "name")]));
    assert_eq!(sel.anchor(), Some(&CellKey::new(0, "name")));
}

#[test]
fn test_ctrl_shift_extends() {
    let engine = flat(ledger(10));
    let mut sel = SelectionModel::with_columns(SelectionMode::Range, ["name"]);
    sel.click(&engine, &PointerInput::at(0, "name"));
    sel.click(&engine, &PointerInput::at(6, "name").ctrl());
    sel.click(&engine, &PointerInput::at(8, "name").ctrl().shift());
    assert_eq!(
        sel.snapshot().cells,
        keys(&[(0, "name"), (6, "name"), (7, "name"), (8, "name")])
    );
}

#[test]
fn test_shift_click_without_anchor_is_plain_click() {
    let engine = flat(ledger(4));
    let mut sel = SelectionModel::with_columns(SelectionMode::Range, ["name"]);
    sel.click(&engine, &PointerInput::at(3, "name").shift());
    assert_eq!(sel.snapshot().cells, keys(&[(3, "name")]));
    assert_eq!(sel.anchor(), Some(&CellKey::new(3, "name")));
}

#[test]
fn test_row_mode_range_skips_group_rows() {
    let mut engine = GroupingEngine::new();
    engine.build(sales(6), vec![GroupColumn::new("region")], vec![]);
    // H north, 0, 3, H south, 1, 4, H east, 2, 5
    let mut sel = SelectionModel::with_columns(SelectionMode::Row, ["region", "amount"]);
    assert!(!sel.click(&engine, &PointerInput::at(0, "region")));
    sel.click(&engine, &PointerInput::at(2, "region"));
    sel.click(&engine, &PointerInput::at(7, "region").shift());
    let rows: Vec<RowId> = sel.snapshot().rows.into_iter().collect();
    assert_eq!(
        rows,
        vec![RowId::Index(1), RowId::Index(2), RowId::Index(3), RowId::Index(4)]
    );
}

#[test]
fn test_records_with_ids_select_by_id() {
    let records = vec![
        gridview::Record::with_id("a-1").set("name", "x"),
        gridview::Record::with_id("b-2").set("name", "y"),
    ];
    let engine = flat(records);
    let mut sel = SelectionModel::with_columns(SelectionMode::Row, ["name"]);
    sel.click(&engine, &PointerInput::at(1, "name"));
    assert!(sel.is_row_selected(&RowId::Key("b-2".into())));
    assert!(!sel.is_row_selected(&RowId::Index(1)));
}

// ============================================================================
// Drag
// ============================================================================

#[test]
fn test_drag_then_cancel_restores_empty() {
    let engine = flat(table(5, 1));
    let mut sel = SelectionModel::with_columns(SelectionMode::Range, ["c0"]);
    let before = sel.snapshot();

    sel.start_drag(&engine, &PointerInput::at(0, "c0"));
    sel.update_drag(&engine, &PointerInput::at(3, "c0"));
    assert_eq!(sel.selected_cell_count(), 4);
    assert!(sel.cancel_drag());
    assert_eq!(sel.snapshot(), before);
}

#[test]
fn test_drag_then_cancel_restores_prior_selection() {
    let engine = flat(ledger(6));
    let mut sel = SelectionModel::with_columns(SelectionMode::Range, ["name", "amount"]);
    sel.click(&engine, &PointerInput::at(4, "amount"));
    let before = sel.snapshot();

    sel.start_drag(&engine, &PointerInput::at(0, "name"));
    sel.update_drag(&engine, &PointerInput::at(2, "amount"));
    assert_eq!(sel.selected_cell_count(), 6);
    assert!(sel.is_dragging());
    sel.cancel_drag();
    assert_eq!(sel.snapshot(), before);
    assert!(!sel.cancel_drag());
}

#[test]
fn test_press_during_open_drag_keeps_original_snapshot() {
    let engine = flat(table(8, 1));
    let mut sel = SelectionModel::with_columns(SelectionMode::Range, ["c0"]);
    let before = sel.snapshot();

    sel.start_drag(&engine, &PointerInput::at(0, "c0"));
    sel.update_drag(&engine, &PointerInput::at(3, "c0"));
    // release lost; a Ctrl press starts over while the first session is open
    sel.start_drag(&engine, &PointerInput::at(5, "c0").ctrl());
    sel.update_drag(&engine, &PointerInput::at(6, "c0"));
    assert_eq!(sel.selected_cell_count(), 6);

    assert!(sel.cancel_drag());
    assert_eq!(sel.snapshot(), before);
}

#[test]
fn test_drag_over_group_row_is_ignored() {
    let mut engine = GroupingEngine::new();
    engine.build(sales(6), vec![GroupColumn::new("region")], vec![]);
    let mut sel = SelectionModel::with_columns(SelectionMode::Range, ["region", "amount"]);

    assert!(!sel.start_drag(&engine, &PointerInput::at(0, "amount")));
    assert!(!sel.is_dragging());

    sel.start_drag(&engine, &PointerInput::at(1, "amount"));
    sel.update_drag(&engine, &PointerInput::at(4, "amount"));
    let during = sel.snapshot();
    assert!(!sel.update_drag(&engine, &PointerInput::at(3, "amount")));
    assert_eq!(sel.snapshot(), during);
    // rows 0, 3 (north) and 1 (south); the south header is skipped
    assert_eq!(
        during.cells,
        keys(&[(0, "amount"), (3, "amount"), (1, "amount")])
    );
}

#[test]
fn test_duplicate_move_is_idempotent() {
    let engine = flat(ledger(6));
    let mut sel = SelectionModel::with_columns(SelectionMode::Range, ["name", "amount"]);
    let events = Rc::new(RefCell::new(Vec::<SelectionSnapshot>::new()));
    let sink = Rc::clone(&events);
    sel.subscribe(move |snap| sink.borrow_mut().push(snap.clone()));

    sel.start_drag(&engine, &PointerInput::at(1, "name"));
    sel.update_drag(&engine, &PointerInput::at(3, "amount"));
    sel.update_drag(&engine, &PointerInput::at(3, "amount"));
    sel.commit_drag();

    let events = events.borrow();
    assert_eq!(events.len(), 3);
    assert!(events[1].dragging);
    assert!(!events[2].dragging);
    assert_eq!(events[1].cells, events[2].cells);
}

// ============================================================================
// Select all and derived rows
// ============================================================================

#[test]
fn test_select_all_in_all_mode_derives_rows() {
    let engine = flat(table(3, 2));
    let mut sel = SelectionModel::with_columns(SelectionMode::All, ["c0", "c1"]);
    sel.select_all(&engine);
    let snap = sel.snapshot();
    assert_eq!(snap.cells.len(), 6);
    assert_eq!(snap.rows.len(), 3);

    // row 1 still has c1 selected
    sel.click(&engine, &PointerInput::at(1, "c0").ctrl());
    assert_eq!(sel.snapshot().rows.len(), 3);
    sel.click(&engine, &PointerInput::at(1, "c1").ctrl());
    let snap = sel.snapshot();
    assert_eq!(snap.cells.len(), 4);
    assert_eq!(
        snap.rows,
        [RowId::Index(0), RowId::Index(2)].into_iter().collect()
    );
}

#[test]
fn test_select_all_row_mode_includes_collapsed() {
    let mut engine = GroupingEngine::new();
    engine.build(sales(9), vec![GroupColumn::new("region")], vec![]);
    engine.collapse_all();
    let mut sel = SelectionModel::with_columns(SelectionMode::Row, ["region"]);
    assert!(sel.on_key(&engine, &KeyInput::new("a").ctrl()));
    assert_eq!(sel.selected_row_count(), 9);
}

#[test]
fn test_snapshot_is_a_copy() {
    let engine = flat(ledger(3));
    let mut sel = SelectionModel::with_columns(SelectionMode::Range, ["name"]);
    sel.select_all(&engine);
    let mut snap = sel.snapshot();
    snap.cells.clear();
    snap.rows.insert(RowId::Index(99));
    assert_eq!(sel.selected_cell_count(), 3);
    assert!(!sel.is_row_selected(&RowId::Index(99)));
}

// ============================================================================
// Keyboard
// ============================================================================

#[test]
fn test_arrow_keys_skip_group_rows_and_clamp() {
    let mut engine = GroupingEngine::new();
    engine.build(sales(6), vec![GroupColumn::new("region")], vec![]);
    // H north, 0, 3, H south, 1, 4, H east, 2, 5
    let mut sel = SelectionModel::with_columns(SelectionMode::Range, ["region", "amount"]);
    sel.click(&engine, &PointerInput::at(2, "amount"));

    sel.on_key(&engine, &KeyInput::new("ArrowDown"));
    assert_eq!(sel.anchor(), Some(&CellKey::new(1, "amount")));
    sel.on_key(&engine, &KeyInput::new("ArrowUp"));
    sel.on_key(&engine, &KeyInput::new("ArrowUp"));
    sel.on_key(&engine, &KeyInput::new("ArrowUp"));
    assert_eq!(sel.anchor(), Some(&CellKey::new(0, "amount")));

    sel.on_key(&engine, &KeyInput::new("ArrowRight"));
    assert_eq!(sel.anchor(), Some(&CellKey::new(0, "amount")));
    sel.on_key(&engine, &KeyInput::new("Home"));
    assert_eq!(sel.anchor(), Some(&CellKey::new(0, "region")));
    sel.on_key(&engine, &KeyInput::new("End").ctrl());
    assert_eq!(sel.anchor(), Some(&CellKey::new(5, "region")));
}

#[test]
fn test_shift_arrows_extend_like_shift_click() {
    let engine = flat(ledger(5));
    let mut sel = SelectionModel::with_columns(SelectionMode::Range, ["name", "amount", "date"]);
    sel.click(&engine, &PointerInput::at(1, "name"));
    sel.on_key(&engine, &KeyInput::new("ArrowDown").shift());
    sel.on_key(&engine, &KeyInput::new("ArrowRight").shift());
    assert_eq!(
        sel.snapshot().cells,
        keys(&[(1, "name"), (1, "amount"), (2, "name"), (2, "amount")])
    );
    assert_eq!(sel.anchor(), Some(&CellKey::new(1, "name")));
}

#[test]
fn test_escape_clears_everything() {
    let engine = flat(ledger(5));
    let mut sel = SelectionModel::with_columns(SelectionMode::Range, ["name"]);
    sel.start_drag(&engine, &PointerInput::at(1, "name"));
    assert!(sel.on_key(&engine, &KeyInput::new("Escape")));
    let snap = sel.snapshot();
    assert!(snap.cells.is_empty());
    assert!(snap.anchor.is_none());
    assert!(!snap.dragging);
}

// ============================================================================
// Regrouping and reloads
// ============================================================================

#[test]
fn test_shrunk_dataset_drops_missing_records() {
    let mut engine = flat(ledger(5));
    let mut sel = SelectionModel::with_columns(SelectionMode::Range, ["name", "amount"]);
    sel.click(&engine, &PointerInput::at(4, "name"));
    sel.click(&engine, &PointerInput::at(0, "amount").shift());
    assert_eq!(sel.selected_cell_count(), 10);

    engine.set_records(ledger(2));
    assert!(sel.retain_resolvable(&engine));
    assert_eq!(
        sel.snapshot().cells,
        keys(&[(0, "name"), (0, "amount"), (1, "name"), (1, "amount")])
    );
    assert!(sel.anchor().is_none());
    assert_eq!(sel.focus(), Some(&CellKey::new(0, "amount")));
    assert!(!sel.retain_resolvable(&engine));
}

#[test]
fn test_selection_survives_regrouping() {
    let mut engine = GroupingEngine::new();
    engine.build(sales(6), vec![], vec![]);
    let mut sel = SelectionModel::with_columns(SelectionMode::Range, ["amount"]);
    sel.click(&engine, &PointerInput::at(4, "amount"));

    engine.set_group_columns(vec![GroupColumn::new("region")]);
    assert!(sel.is_cell_selected(4, "amount"));
    let view = engine.view_index_of(4).unwrap();
    assert_eq!(view, 5);
}

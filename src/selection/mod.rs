//! Selection state machine.
//!
//! Selection is structured state rather than a small enum: mode, the
//! selected row ids and cell keys, the anchor (fixed end of shift ranges),
//! the focus (moving end) and an optional drag session. Every operation runs
//! to completion and then compares the resulting snapshot with the last one
//! announced; listeners only hear about value changes.
//!
//! Rows are resolved through the display sequence (view indices, so group
//! rows are skipped) but stored by data identity, so a selection survives
//! scrolling, collapsing and regrouping.

mod columns;
mod keyboard;
mod range;

pub use columns::ColumnOrder;
pub use keyboard::{parse_key, KeyCommand, NavCommand};

use std::collections::HashSet;
use std::rc::Rc;

use crate::grouping::GroupingEngine;
use crate::notify::{ListenerId, Listeners};
use crate::types::{
    CellKey, DisplayRow, KeyInput, PointerInput, RowId, SelectionMode, SelectionSnapshot,
};

/// Read access to a display sequence, as the selection machine needs it.
pub trait RowSource {
    /// Number of display rows.
    fn row_count(&self) -> usize;

    fn row(&self, view_index: usize) -> Option<&DisplayRow>;

    /// `None` when the record is hidden (collapsed) or out of range.
    fn view_index_of(&self, data_index: usize) -> Option<usize>;

    /// `None` when the data index is out of range.
    fn row_id(&self, data_index: usize) -> Option<RowId>;

    /// Every record that "select all" covers.
    fn data_indices(&self) -> Vec<usize>;
}

impl RowSource for GroupingEngine {
    fn row_count(&self) -> usize {
        GroupingEngine::len(self)
    }

    fn row(&self, view_index: usize) -> Option<&DisplayRow> {
        GroupingEngine::row(self, view_index)
    }

    fn view_index_of(&self, data_index: usize) -> Option<usize> {
        GroupingEngine::view_index_of(self, data_index)
    }

    fn row_id(&self, data_index: usize) -> Option<RowId> {
        GroupingEngine::row_id(self, data_index)
    }

    /// Includes records inside collapsed groups.
    fn data_indices(&self) -> Vec<usize> {
        (0..self.record_count()).collect()
    }
}

/// A bare display sequence; only the records it shows exist.
impl RowSource for [DisplayRow] {
    fn row_count(&self) -> usize {
        self.len()
    }

    fn row(&self, view_index: usize) -> Option<&DisplayRow> {
        self.get(view_index)
    }

    fn view_index_of(&self, data_index: usize) -> Option<usize> {
        self.iter()
            .position(|row| row.data_index() == Some(data_index))
    }

    fn row_id(&self, data_index: usize) -> Option<RowId> {
        self.iter()
            .filter_map(DisplayRow::as_data)
            .find(|row| row.data_index == data_index)
            .map(|row| row.record.row_id(data_index))
    }

    fn data_indices(&self) -> Vec<usize> {
        self.iter().filter_map(DisplayRow::data_index).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Selected {
    rows: HashSet<RowId>,
    cells: HashSet<CellKey>,
    anchor: Option<CellKey>,
    focus: Option<CellKey>,
}

#[derive(Debug)]
struct DragSession {
    /// Selection as it was before the first press; restored on cancel.
    before: Selected,
    /// What a Ctrl drag adds its range to.
    base: Selected,
    /// Ctrl was held at the press: ranges add to `base` instead of replacing.
    extend: bool,
}

/// Row and cell selection with click, drag and keyboard semantics.
#[derive(Debug)]
pub struct SelectionModel {
    mode: SelectionMode,
    columns: ColumnOrder,
    current: Selected,
    drag: Option<DragSession>,
    listeners: Listeners<SelectionSnapshot>,
}

impl Default for SelectionModel {
    fn default() -> Self {
        Self::new(SelectionMode::default())
    }
}

impl SelectionModel {
    pub fn new(mode: SelectionMode) -> Self {
        let mut model = Self {
            mode,
            columns: ColumnOrder::default(),
            current: Selected::default(),
            drag: None,
            listeners: Listeners::new(),
        };
        let initial = model.snapshot();
        model.listeners.prime(&initial);
        model
    }

    pub fn with_columns<I, S>(mode: SelectionMode, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut model = Self::new(mode);
        model.columns.set(keys);
        model
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// Switch mode. Clears the selection; returns true when the mode changed.
    pub fn set_mode(&mut self, mode: SelectionMode) -> bool {
        if self.mode == mode {
            return false;
        }
        self.mode = mode;
        self.current = Selected::default();
        self.drag = None;
        self.notify();
        true
    }

    pub fn columns(&self) -> &ColumnOrder {
        &self.columns
    }

    /// Replace the visual column order. Selected cells keep their column keys.
    pub fn set_columns<I, S>(&mut self, keys: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.columns.set(keys)
    }

    pub fn anchor(&self) -> Option<&CellKey> {
        self.current.anchor.as_ref()
    }

    pub fn focus(&self) -> Option<&CellKey> {
        self.current.focus.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn is_row_selected(&self, id: &RowId) -> bool {
        self.current.rows.contains(id)
    }

    pub fn is_cell_selected(&self, data_index: usize, column: &str) -> bool {
        self.current.cells.contains(&CellKey::new(data_index, column))
    }

    pub fn selected_cell_count(&self) -> usize {
        self.current.cells.len()
    }

    pub fn selected_row_count(&self) -> usize {
        self.current.rows.len()
    }

    /// Owned copy of the current state.
    pub fn snapshot(&self) -> SelectionSnapshot {
        SelectionSnapshot {
            mode: self.mode,
            rows: self.current.rows.iter().cloned().collect(),
            cells: self.current.cells.iter().cloned().collect(),
            anchor: self.current.anchor.clone(),
            focus: self.current.focus.clone(),
            dragging: self.drag.is_some(),
        }
    }

    pub fn subscribe(&mut self, callback: impl FnMut(&SelectionSnapshot) + 'static) -> ListenerId {
        self.listeners.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    /// Plain click replaces, Ctrl toggles, Shift ranges from the anchor
    /// (adding to the selection when Ctrl is also held).
    ///
    /// Returns true when the selection changed. Presses on group rows and
    /// stale pointer data are ignored.
    pub fn click<S>(&mut self, source: &S, input: &PointerInput) -> bool
    where
        S: RowSource + ?Sized,
    {
        let Some(target) = self.resolve(source, input) else {
            return false;
        };
        match self.current.anchor.clone() {
            Some(anchor) if input.shift => {
                self.select_span(source, &anchor, &target, input.ctrl_or_cmd);
            }
            _ if input.ctrl_or_cmd => self.toggle(source, target),
            _ => self.select_single(source, target),
        }
        self.finish(source)
    }

    /// Begin a drag at the press position: remembers the current selection,
    /// moves the anchor and seeds the selection with the pressed row or cell.
    ///
    /// A press while a session is still open (the release was lost) keeps the
    /// original pre-drag selection for cancel.
    pub fn start_drag<S>(&mut self, source: &S, input: &PointerInput) -> bool
    where
        S: RowSource + ?Sized,
    {
        let Some(target) = self.resolve(source, input) else {
            return false;
        };
        let base = self.current.clone();
        let before = match self.drag.take() {
            Some(open) => {
                log::trace!("press during an open drag; keeping its starting selection");
                open.before
            }
            None => base.clone(),
        };
        let extend = input.ctrl_or_cmd;
        if !extend {
            self.current.rows.clear();
            self.current.cells.clear();
        }
        self.insert(source, &target);
        self.current.anchor = Some(target.clone());
        self.current.focus = Some(target);
        self.drag = Some(DragSession {
            before,
            base,
            extend,
        });
        self.finish(source)
    }

    /// Recompute the full span from the anchor to the pointer.
    pub fn update_drag<S>(&mut self, source: &S, input: &PointerInput) -> bool
    where
        S: RowSource + ?Sized,
    {
        let Some(drag) = &self.drag else {
            return false;
        };
        let Some(anchor) = self.current.anchor.clone() else {
            return false;
        };
        let Some(target) = self.resolve(source, input) else {
            return false;
        };
        if drag.extend {
            self.current.rows = drag.base.rows.clone();
            self.current.cells = drag.base.cells.clone();
        } else {
            self.current.rows.clear();
            self.current.cells.clear();
        }
        log::trace!(
            "drag {}:{} -> {}:{}",
            anchor.data_index,
            anchor.column,
            target.data_index,
            target.column
        );
        self.add_span(source, &anchor, &target);
        self.current.focus = Some(target);
        self.finish(source)
    }

    /// Keep the dragged selection and end the session.
    pub fn commit_drag(&mut self) -> bool {
        if self.drag.take().is_none() {
            return false;
        }
        self.notify()
    }

    /// Restore the selection exactly as it was before the drag.
    pub fn cancel_drag(&mut self) -> bool {
        let Some(drag) = self.drag.take() else {
            return false;
        };
        self.current = drag.before;
        self.notify()
    }

    /// Apply a key press. Returns true when the key is a grid command
    /// (whether or not the selection changed), so hosts can suppress the
    /// browser default.
    pub fn on_key<S>(&mut self, source: &S, input: &KeyInput) -> bool
    where
        S: RowSource + ?Sized,
    {
        if self.mode == SelectionMode::None {
            return false;
        }
        let Some(KeyCommand { command, extend }) = parse_key(input) else {
            return false;
        };
        match command {
            NavCommand::SelectAll => {
                self.select_all(source);
            }
            NavCommand::Clear => {
                self.clear();
            }
            _ => self.navigate(source, command, extend),
        }
        true
    }

    /// Row mode: every data row. Range and all modes: every cell of every data row.
    pub fn select_all<S>(&mut self, source: &S) -> bool
    where
        S: RowSource + ?Sized,
    {
        match self.mode {
            SelectionMode::None => return false,
            SelectionMode::Row => {
                self.current.rows = source
                    .data_indices()
                    .into_iter()
                    .filter_map(|i| source.row_id(i))
                    .collect();
            }
            SelectionMode::Range | SelectionMode::All => {
                self.current.cells = self.cells_of_rows(source, source.data_indices());
            }
        }
        self.finish(source)
    }

    /// Drop every selected row and cell, the anchor and any drag session.
    pub fn clear(&mut self) -> bool {
        self.current = Selected::default();
        self.drag = None;
        self.notify()
    }

    /// Drop rows and cells whose record no longer exists in `source`, after
    /// the dataset was replaced underneath the selection.
    pub fn retain_resolvable<S>(&mut self, source: &S) -> bool
    where
        S: RowSource + ?Sized,
    {
        let live: HashSet<RowId> = source
            .data_indices()
            .into_iter()
            .filter_map(|i| source.row_id(i))
            .collect();
        prune(&mut self.current, &live, source);
        if let Some(drag) = &mut self.drag {
            prune(&mut drag.before, &live, source);
            prune(&mut drag.base, &live, source);
        }
        self.notify()
    }

    /// Replace the selection with whole records. Out-of-range indices are skipped.
    pub fn select_rows<S, I>(&mut self, source: &S, data_indices: I) -> bool
    where
        S: RowSource + ?Sized,
        I: IntoIterator<Item = usize>,
    {
        let valid: Vec<usize> = data_indices
            .into_iter()
            .filter(|&i| source.row_id(i).is_some())
            .collect();
        match self.mode {
            SelectionMode::None => return false,
            SelectionMode::Row => {
                self.current.rows = valid.iter().filter_map(|&i| source.row_id(i)).collect();
            }
            SelectionMode::Range | SelectionMode::All => {
                self.current.cells = self.cells_of_rows(source, valid);
            }
        }
        self.finish(source)
    }

    /// Replace the selection with explicit cells. Cells naming unknown columns
    /// or records are skipped. Only meaningful in range and all modes.
    pub fn select_cells<S, I>(&mut self, source: &S, cells: I) -> bool
    where
        S: RowSource + ?Sized,
        I: IntoIterator<Item = CellKey>,
    {
        if !self.mode.selects_cells() {
            return false;
        }
        self.current.cells = cells
            .into_iter()
            .filter(|cell| {
                self.columns.contains(&cell.column) && source.row_id(cell.data_index).is_some()
            })
            .collect();
        self.finish(source)
    }

    fn resolve<S>(&self, source: &S, input: &PointerInput) -> Option<CellKey>
    where
        S: RowSource + ?Sized,
    {
        if self.mode == SelectionMode::None {
            return None;
        }
        let data_index = source.row(input.view_row_index)?.data_index()?;
        if input.data_index.is_some_and(|d| d != data_index) {
            log::trace!(
                "ignoring stale pointer: row {} shows record {} not {:?}",
                input.view_row_index,
                data_index,
                input.data_index
            );
            return None;
        }
        let column = match self.columns.index_of(&input.column_key) {
            Some(i) => Rc::clone(self.columns.key_at(i)?),
            None if self.mode.selects_cells() => return None,
            None => Rc::from(input.column_key.as_str()),
        };
        Some(CellKey { data_index, column })
    }

    fn select_single<S>(&mut self, source: &S, target: CellKey)
    where
        S: RowSource + ?Sized,
    {
        self.current.rows.clear();
        self.current.cells.clear();
        self.insert(source, &target);
        self.current.anchor = Some(target.clone());
        self.current.focus = Some(target);
    }

    fn toggle<S>(&mut self, source: &S, target: CellKey)
    where
        S: RowSource + ?Sized,
    {
        if self.mode.selects_cells() {
            if !self.current.cells.remove(&target) {
                self.current.cells.insert(target.clone());
            }
        } else if let Some(id) = source.row_id(target.data_index) {
            if !self.current.rows.remove(&id) {
                self.current.rows.insert(id);
            }
        }
        self.current.anchor = Some(target.clone());
        self.current.focus = Some(target);
    }

    /// Shift range from a fixed anchor; the anchor does not move.
    fn select_span<S>(&mut self, source: &S, anchor: &CellKey, target: &CellKey, extend: bool)
    where
        S: RowSource + ?Sized,
    {
        if !extend {
            self.current.rows.clear();
            self.current.cells.clear();
        }
        self.add_span(source, anchor, target);
        self.current.focus = Some(target.clone());
    }

    fn add_span<S>(&mut self, source: &S, anchor: &CellKey, target: &CellKey)
    where
        S: RowSource + ?Sized,
    {
        if self.mode.selects_cells() {
            let cells = range::cell_span(source, &self.columns, anchor, target);
            self.current.cells.extend(cells);
        } else {
            let rows = range::row_span(source, anchor.data_index, target.data_index);
            self.current
                .rows
                .extend(rows.into_iter().filter_map(|i| source.row_id(i)));
        }
    }

    fn insert<S>(&mut self, source: &S, target: &CellKey)
    where
        S: RowSource + ?Sized,
    {
        if self.mode.selects_cells() {
            self.current.cells.insert(target.clone());
        } else if let Some(id) = source.row_id(target.data_index) {
            self.current.rows.insert(id);
        }
    }

    fn cells_of_rows<S>(&self, source: &S, data_indices: Vec<usize>) -> HashSet<CellKey>
    where
        S: RowSource + ?Sized,
    {
        let mut cells = HashSet::with_capacity(data_indices.len() * self.columns.len());
        for data_index in data_indices {
            if source.row_id(data_index).is_none() {
                continue;
            }
            for column in self.columns.keys() {
                cells.insert(CellKey {
                    data_index,
                    column: Rc::clone(column),
                });
            }
        }
        cells
    }

    fn navigate<S>(&mut self, source: &S, command: NavCommand, extend: bool)
    where
        S: RowSource + ?Sized,
    {
        let origin = if extend {
            self.current.focus.clone().or_else(|| self.current.anchor.clone())
        } else {
            self.current.anchor.clone()
        };
        let target = match origin {
            Some(origin) => self.step(source, &origin, command),
            None => self.first_cell(source),
        };
        let Some(target) = target else {
            return;
        };
        match self.current.anchor.clone() {
            Some(anchor) if extend => self.select_span(source, &anchor, &target, false),
            _ => self.select_single(source, target),
        }
        self.finish(source);
    }

    fn step<S>(&self, source: &S, origin: &CellKey, command: NavCommand) -> Option<CellKey>
    where
        S: RowSource + ?Sized,
    {
        let same_column = |data_index: usize| CellKey {
            data_index,
            column: Rc::clone(&origin.column),
        };
        let same_row = |column: Option<&Rc<str>>| CellKey {
            data_index: origin.data_index,
            column: Rc::clone(column.unwrap_or(&origin.column)),
        };
        let key = match command {
            NavCommand::Up => same_column(adjacent_data_row(source, origin.data_index, false)?),
            NavCommand::Down => same_column(adjacent_data_row(source, origin.data_index, true)?),
            NavCommand::Left => same_row(self.columns.step(&origin.column, -1)),
            NavCommand::Right => same_row(self.columns.step(&origin.column, 1)),
            NavCommand::LineStart => same_row(self.columns.first()),
            NavCommand::LineEnd => same_row(self.columns.last()),
            NavCommand::FirstRow => same_column(first_data_row(source)?),
            NavCommand::LastRow => same_column(last_data_row(source)?),
            NavCommand::SelectAll | NavCommand::Clear => return None,
        };
        Some(key)
    }

    fn first_cell<S>(&self, source: &S) -> Option<CellKey>
    where
        S: RowSource + ?Sized,
    {
        let data_index = first_data_row(source)?;
        let column = match self.columns.first() {
            Some(column) => Rc::clone(column),
            None if self.mode.selects_cells() => return None,
            None => Rc::from(""),
        };
        Some(CellKey { data_index, column })
    }

    /// Re-derive the all-mode row set, then announce if anything changed.
    fn finish<S>(&mut self, source: &S) -> bool
    where
        S: RowSource + ?Sized,
    {
        if self.mode == SelectionMode::All {
            self.current.rows = rows_of_cells(&self.current.cells, source);
        }
        self.notify()
    }

    fn notify(&mut self) -> bool {
        let snapshot = self.snapshot();
        self.listeners.emit_if_changed(&snapshot)
    }
}

fn prune<S>(selected: &mut Selected, live: &HashSet<RowId>, source: &S)
where
    S: RowSource + ?Sized,
{
    let resolves = |cell: &CellKey| source.row_id(cell.data_index).is_some();
    selected.rows.retain(|id| live.contains(id));
    selected.cells.retain(&resolves);
    if !selected.anchor.as_ref().is_some_and(&resolves) {
        selected.anchor = None;
    }
    if !selected.focus.as_ref().is_some_and(&resolves) {
        selected.focus = None;
    }
}

/// Row ids owning at least one selected cell.
fn rows_of_cells<S>(cells: &HashSet<CellKey>, source: &S) -> HashSet<RowId>
where
    S: RowSource + ?Sized,
{
    cells
        .iter()
        .filter_map(|cell| source.row_id(cell.data_index))
        .collect()
}

fn first_data_row<S: RowSource + ?Sized>(source: &S) -> Option<usize> {
    (0..source.row_count()).find_map(|i| source.row(i)?.data_index())
}

fn last_data_row<S: RowSource + ?Sized>(source: &S) -> Option<usize> {
    (0..source.row_count())
        .rev()
        .find_map(|i| source.row(i)?.data_index())
}

/// Neighbouring data row in display order, clamped at the ends. A record
/// that is not displayed restarts from the first data row.
fn adjacent_data_row<S: RowSource + ?Sized>(
    source: &S,
    data_index: usize,
    forward: bool,
) -> Option<usize> {
    let Some(view) = source.view_index_of(data_index) else {
        return first_data_row(source);
    };
    let next = if forward {
        (view + 1..source.row_count()).find_map(|i| source.row(i)?.data_index())
    } else {
        (0..view).rev().find_map(|i| source.row(i)?.data_index())
    };
    Some(next.unwrap_or(data_index))
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::types::Record;
    use std::cell::RefCell;

    fn flat(n: usize) -> GroupingEngine {
        let mut engine = GroupingEngine::new();
        engine.build(
            (0..n).map(|i| Record::new().set("name", format!("r{i}")).set("amount", i as f64)),
            vec![],
            vec![],
        );
        engine
    }

    fn cells(model: &SelectionModel) -> Vec<(usize, String)> {
        model
            .snapshot()
            .cells
            .into_iter()
            .map(|c| (c.data_index, c.column.to_string()))
            .collect()
    }

    #[test]
    fn plain_click_replaces_and_sets_anchor() {
        let engine = flat(4);
        let mut model = SelectionModel::with_columns(SelectionMode::Range, ["name", "amount"]);
        assert!(model.click(&engine, &PointerInput::at(1, "name")));
        assert!(model.click(&engine, &PointerInput::at(2, "amount")));
        assert_eq!(cells(&model), vec![(2, "amount".to_string())]);
        assert_eq!(model.anchor(), Some(&CellKey::new(2, "amount")));
    }

    #[test]
    fn shift_click_keeps_anchor() {
        let engine = flat(6);
        let mut model = SelectionModel::with_columns(SelectionMode::Range, ["name", "amount"]);
        model.click(&engine, &PointerInput::at(1, "name"));
        model.click(&engine, &PointerInput::at(4, "name").shift());
        assert_eq!(model.selected_cell_count(), 4);
        model.click(&engine, &PointerInput::at(2, "name").shift());
        assert_eq!(model.selected_cell_count(), 2);
        assert_eq!(model.anchor(), Some(&CellKey::new(1, "name")));
        assert_eq!(model.focus(), Some(&CellKey::new(2, "name")));
    }

    #[test]
    fn ctrl_click_moves_anchor() {
        let engine = flat(6);
        let mut model = SelectionModel::with_columns(SelectionMode::Row, ["name"]);
        model.click(&engine, &PointerInput::at(0, "name"));
        model.click(&engine, &PointerInput::at(4, "name").ctrl());
        model.click(&engine, &PointerInput::at(5, "name").shift());
        // range restarts from row 4, not row 0
        let rows: Vec<RowId> = model.snapshot().rows.into_iter().collect();
        assert_eq!(rows, vec![RowId::Index(4), RowId::Index(5)]);
    }

    #[test]
    fn unknown_column_and_mode_none_are_noops() {
        let engine = flat(3);
        let mut model = SelectionModel::with_columns(SelectionMode::Range, ["name"]);
        assert!(!model.click(&engine, &PointerInput::at(0, "missing")));
        assert!(!model.click(&engine, &PointerInput::at(9, "name")));

        let mut none = SelectionModel::with_columns(SelectionMode::None, ["name"]);
        assert!(!none.click(&engine, &PointerInput::at(0, "name")));
        assert!(!none.select_all(&engine));
        assert!(!none.on_key(&engine, &KeyInput::new("ArrowDown")));
    }

    #[test]
    fn stale_data_index_is_ignored() {
        let engine = flat(3);
        let mut model = SelectionModel::with_columns(SelectionMode::Range, ["name"]);
        assert!(!model.click(&engine, &PointerInput::at(1, "name").with_data_index(2)));
        assert!(model.click(&engine, &PointerInput::at(1, "name").with_data_index(1)));
    }

    #[test]
    fn repeated_drag_move_notifies_once() {
        let engine = flat(5);
        let mut model = SelectionModel::with_columns(SelectionMode::Range, ["name"]);
        let fired = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&fired);
        model.subscribe(move |_| *counter.borrow_mut() += 1);

        model.start_drag(&engine, &PointerInput::at(0, "name"));
        assert!(model.update_drag(&engine, &PointerInput::at(3, "name")));
        let after_first = model.snapshot();
        assert!(!model.update_drag(&engine, &PointerInput::at(3, "name")));
        assert_eq!(model.snapshot(), after_first);
        assert_eq!(*fired.borrow(), 2);
    }

    #[test]
    fn ctrl_drag_adds_to_previous_selection() {
        let engine = flat(6);
        let mut model = SelectionModel::with_columns(SelectionMode::Range, ["name"]);
        model.click(&engine, &PointerInput::at(0, "name"));
        model.start_drag(&engine, &PointerInput::at(3, "name").ctrl());
        model.update_drag(&engine, &PointerInput::at(4, "name").ctrl());
        assert_eq!(model.selected_cell_count(), 3);
        assert!(model.commit_drag());
        assert!(!model.is_dragging());
        assert!(!model.commit_drag());
    }

    #[test]
    fn keyboard_moves_and_extends() {
        let engine = flat(4);
        let mut model = SelectionModel::with_columns(SelectionMode::Range, ["a", "b", "c"]);
        // no anchor yet: first cell
        assert!(model.on_key(&engine, &KeyInput::new("ArrowDown")));
        assert_eq!(model.anchor(), Some(&CellKey::new(0, "a")));

        model.on_key(&engine, &KeyInput::new("ArrowRight"));
        model.on_key(&engine, &KeyInput::new("ArrowDown").shift());
        model.on_key(&engine, &KeyInput::new("ArrowDown").shift());
        assert_eq!(model.anchor(), Some(&CellKey::new(0, "b")));
        assert_eq!(model.focus(), Some(&CellKey::new(2, "b")));
        assert_eq!(model.selected_cell_count(), 3);

        model.on_key(&engine, &KeyInput::new("End").ctrl());
        assert_eq!(cells(&model), vec![(3, "b".to_string())]);
        model.on_key(&engine, &KeyInput::new("ArrowDown"));
        assert_eq!(model.anchor(), Some(&CellKey::new(3, "b")));
        model.on_key(&engine, &KeyInput::new("End"));
        assert_eq!(model.anchor(), Some(&CellKey::new(3, "c")));

        assert!(model.on_key(&engine, &KeyInput::new("Escape")));
        assert_eq!(model.snapshot(), SelectionSnapshot {
            mode: SelectionMode::Range,
            ..SelectionSnapshot::default()
        });
        assert!(!model.on_key(&engine, &KeyInput::new("x")));
    }

    #[test]
    fn set_mode_clears() {
        let engine = flat(2);
        let mut model = SelectionModel::with_columns(SelectionMode::Range, ["a"]);
        model.select_all(&engine);
        assert!(model.set_mode(SelectionMode::Row));
        assert_eq!(model.selected_cell_count(), 0);
        assert!(!model.set_mode(SelectionMode::Row));
    }

    #[test]
    fn programmatic_selection_filters_invalid() {
        let engine = flat(3);
        let mut model = SelectionModel::with_columns(SelectionMode::All, ["a", "b"]);
        model.select_cells(
            &engine,
            [CellKey::new(0, "a"), CellKey::new(7, "a"), CellKey::new(1, "zz")],
        );
        assert_eq!(cells(&model), vec![(0, "a".to_string())]);
        assert!(model.is_row_selected(&RowId::Index(0)));

        model.select_rows(&engine, [1, 2, 99]);
        assert_eq!(model.selected_cell_count(), 4);
        assert_eq!(model.selected_row_count(), 2);
    }

    #[test]
    fn display_slice_works_as_source() {
        let engine = flat(3);
        let rows = engine.display_rows();
        let mut model = SelectionModel::with_columns(SelectionMode::Row, ["name"]);
        model.select_all(rows);
        assert_eq!(model.selected_row_count(), 3);
    }
}

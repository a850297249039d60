//! `DataGrid` - the composition root tying the engines together.
//!
//! This module owns one of each component and keeps them consistent:
//! - the grouping engine produces the display sequence
//! - the row axis is sized from that sequence (data rows vs group rows)
//! - the column axis is sized from the column widths
//! - the selection machine reads the display sequence on every interaction
//!
//! Normalized pointer and key input is routed here; the wasm export in
//! `bindings` is a thin shell over this type.

mod clipboard;

#[cfg(target_arch = "wasm32")]
mod bindings;

#[cfg(target_arch = "wasm32")]
pub use bindings::GridView;
pub use clipboard::selection_to_tsv;

use crate::config::GridConfig;
use crate::error::Result;
use crate::grouping::{flatten_options, AggregateSpec, GroupingEngine};
use crate::layout::{AxisVirtualizer, ScrollAlign, VisibleRange};
use crate::notify::ListenerId;
use crate::selection::SelectionModel;
use crate::types::{
    ColumnDef, DisplayRow, GroupColumn, GroupId, KeyInput, PointerInput, Record, SelectionSnapshot,
};

#[derive(Debug)]
pub struct DataGrid {
    config: GridConfig,
    engine: GroupingEngine,
    rows: AxisVirtualizer,
    cols: AxisVirtualizer,
    columns: Vec<ColumnDef>,
    selection: SelectionModel,
}

impl Default for DataGrid {
    fn default() -> Self {
        Self::new(GridConfig::default())
    }
}

impl DataGrid {
    pub fn new(config: GridConfig) -> Self {
        let axis = || {
            AxisVirtualizer::with_options(
                config.overscan,
                config.virtualization,
                config.virtualization_threshold,
            )
        };
        Self {
            engine: GroupingEngine::from_config(&config),
            rows: axis(),
            cols: axis(),
            columns: Vec::new(),
            selection: SelectionModel::new(config.selection_mode),
            config,
        }
    }

    /// Build a grid from a JSON configuration object.
    ///
    /// # Errors
    /// Returns an error if the JSON is malformed or fails validation.
    pub fn from_config_json(json: &str) -> Result<Self> {
        Ok(Self::new(GridConfig::from_json(json)?))
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Apply a new configuration to every component.
    pub fn apply_config(&mut self, config: GridConfig) {
        if config == self.config {
            return;
        }
        let heights_changed = config.row_height.to_bits() != self.config.row_height.to_bits()
            || config.group_row_height.to_bits() != self.config.group_row_height.to_bits();

        for axis in [&mut self.rows, &mut self.cols] {
            axis.set_overscan(config.overscan);
            axis.set_threshold(config.virtualization_threshold);
            axis.set_mode(config.virtualization);
        }
        let options = flatten_options(&config);
        let reflowed = options != self.engine.options();
        self.engine.set_options(options);
        self.selection.set_mode(config.selection_mode);
        self.config = config;

        if heights_changed || reflowed {
            self.sync_row_axis();
        }
    }

    /// Apply configuration JSON from the host over the current configuration;
    /// omitted fields keep their values. Malformed input is logged and
    /// ignored, keeping the current configuration. Returns whether it applied.
    pub fn apply_config_json(&mut self, json: &str) -> bool {
        match self.config.merge_json(json) {
            Ok(config) => {
                self.apply_config(config);
                true
            }
            Err(e) => {
                log::warn!("ignoring grid configuration: {e}");
                false
            }
        }
    }

    /// Replace the visible columns (visual order and widths).
    pub fn set_columns(&mut self, columns: Vec<ColumnDef>) {
        self.cols.configure(columns.iter().map(|c| c.width));
        self.selection
            .set_columns(columns.iter().map(|c| c.key.as_str()));
        self.columns = columns;
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// Load a dataset with its grouping and aggregates. Clears selection.
    pub fn set_data<I>(
        &mut self,
        records: I,
        group_by: Vec<GroupColumn>,
        aggregates: Vec<AggregateSpec>,
    ) where
        I: IntoIterator<Item = Record>,
    {
        self.engine.build(records, group_by, aggregates);
        self.selection.clear();
        self.sync_row_axis();
    }

    /// Replace the records, keeping grouping, aggregates and collapse state.
    pub fn set_records<I>(&mut self, records: I)
    where
        I: IntoIterator<Item = Record>,
    {
        self.engine.set_records(records);
        self.selection.clear();
        self.sync_row_axis();
    }

    /// Regroup. The selection is keyed by data index and survives.
    pub fn set_group_columns(&mut self, group_by: Vec<GroupColumn>) {
        self.engine.set_group_columns(group_by);
        self.sync_row_axis();
    }

    pub fn set_aggregates(&mut self, aggregates: Vec<AggregateSpec>) {
        self.engine.set_aggregates(aggregates);
        self.sync_row_axis();
    }

    pub fn toggle_group(&mut self, id: &GroupId) -> bool {
        let changed = self.engine.toggle_group(id);
        if changed {
            self.sync_row_axis();
        }
        changed
    }

    pub fn set_collapsed(&mut self, id: &GroupId, collapsed: bool) -> bool {
        let changed = self.engine.set_collapsed(id, collapsed);
        if changed {
            self.sync_row_axis();
        }
        changed
    }

    pub fn expand_all(&mut self) -> bool {
        let changed = self.engine.expand_all();
        if changed {
            self.sync_row_axis();
        }
        changed
    }

    pub fn collapse_all(&mut self) -> bool {
        let changed = self.engine.collapse_all();
        if changed {
            self.sync_row_axis();
        }
        changed
    }

    pub fn engine(&self) -> &GroupingEngine {
        &self.engine
    }

    /// Run `f` against the engine (dirty marking, lookups that need `&mut`),
    /// then resize the row axis and drop selected records that no longer exist.
    pub fn with_engine<R>(&mut self, f: impl FnOnce(&mut GroupingEngine) -> R) -> R {
        let result = f(&mut self.engine);
        self.sync_row_axis();
        self.selection.retain_resolvable(&self.engine);
        result
    }

    pub fn display_rows(&self) -> &[DisplayRow] {
        self.engine.display_rows()
    }

    pub fn row_axis(&self) -> &AxisVirtualizer {
        &self.rows
    }

    pub fn column_axis(&self) -> &AxisVirtualizer {
        &self.cols
    }

    /// Update both axes from the scroll container. Returns true when either
    /// visible range changed.
    pub fn set_viewport(&mut self, scroll_left: f32, scroll_top: f32, width: f32, height: f32) -> bool {
        let rows = self.rows.set_viewport(scroll_top, height);
        let cols = self.cols.set_viewport(scroll_left, width);
        rows || cols
    }

    pub fn visible_rows(&self) -> Option<VisibleRange> {
        self.rows.visible_range()
    }

    pub fn visible_columns(&self) -> Option<VisibleRange> {
        self.cols.visible_range()
    }

    /// Vertical scroll offset that reveals a record; `None` when it is hidden
    /// in a collapsed group or the viewport is unmeasured.
    pub fn scroll_offset_for_record(&self, data_index: usize, align: ScrollAlign) -> Option<f32> {
        let view_index = self.engine.view_index_of(data_index)?;
        self.rows.scroll_offset_for(view_index, align)
    }

    pub fn subscribe_rows(
        &mut self,
        callback: impl FnMut(&Option<VisibleRange>) + 'static,
    ) -> ListenerId {
        self.rows.subscribe(callback)
    }

    pub fn subscribe_columns(
        &mut self,
        callback: impl FnMut(&Option<VisibleRange>) + 'static,
    ) -> ListenerId {
        self.cols.subscribe(callback)
    }

    pub fn subscribe_selection(
        &mut self,
        callback: impl FnMut(&SelectionSnapshot) + 'static,
    ) -> ListenerId {
        self.selection.subscribe(callback)
    }

    pub fn selection(&self) -> &SelectionModel {
        &self.selection
    }

    pub fn selection_snapshot(&self) -> SelectionSnapshot {
        self.selection.snapshot()
    }

    /// Press on a row. Group headers toggle; Shift and Ctrl presses are
    /// clicks; a plain press starts a drag.
    pub fn pointer_down(&mut self, input: &PointerInput) -> bool {
        match self.engine.row(input.view_row_index) {
            Some(DisplayRow::GroupHeader(header)) => {
                let id = header.id.clone();
                self.toggle_group(&id)
            }
            Some(DisplayRow::Data(_)) => {
                if input.shift || input.ctrl_or_cmd {
                    self.selection.click(&self.engine, input)
                } else {
                    self.selection.start_drag(&self.engine, input)
                }
            }
            Some(DisplayRow::GroupFooter(_))
            | Some(DisplayRow::Subtotal(_))
            | Some(DisplayRow::GrandTotal(_))
            | None => false,
        }
    }

    pub fn pointer_move(&mut self, input: &PointerInput) -> bool {
        if !self.selection.is_dragging() {
            return false;
        }
        self.selection.update_drag(&self.engine, input)
    }

    pub fn pointer_up(&mut self) -> bool {
        self.selection.commit_drag()
    }

    pub fn pointer_cancel(&mut self) -> bool {
        self.selection.cancel_drag()
    }

    /// Returns true when the key is a grid command.
    pub fn key_down(&mut self, input: &KeyInput) -> bool {
        self.selection.on_key(&self.engine, input)
    }

    pub fn select_all(&mut self) -> bool {
        self.selection.select_all(&self.engine)
    }

    pub fn clear_selection(&mut self) -> bool {
        self.selection.clear()
    }

    pub fn select_rows<I>(&mut self, data_indices: I) -> bool
    where
        I: IntoIterator<Item = usize>,
    {
        self.selection.select_rows(&self.engine, data_indices)
    }

    /// Current selection as TSV for the clipboard.
    pub fn copy_selection(&self) -> String {
        selection_to_tsv(&self.engine, &self.selection)
    }

    fn sync_row_axis(&mut self) {
        let data = self.config.row_height;
        let group = self.config.group_row_height;
        self.rows
            .configure(self.engine.display_rows().iter().map(|row| match row {
                DisplayRow::Data(_) => data,
                DisplayRow::GroupHeader(_)
                | DisplayRow::GroupFooter(_)
                | DisplayRow::Subtotal(_)
                | DisplayRow::GrandTotal(_) => group,
            }));
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
    use crate::grouping::BuiltinAggregate;
    use crate::layout::VirtualizationMode;
    use crate::types::SelectionMode;

    fn grid() -> DataGrid {
        let mut grid = DataGrid::default();
        grid.set_columns(vec![ColumnDef::new("region", 100.0), ColumnDef::new("sales", 80.0)]);
        grid.set_data(
            vec![
                Record::new().set("region", "north").set("sales", 10.0),
                Record::new().set("region", "south").set("sales", 5.0),
                Record::new().set("region", "north").set("sales", 7.0),
            ],
            vec!["region".into()],
            vec![AggregateSpec::new("total", "sales", BuiltinAggregate::Sum)],
        );
        grid
    }

    #[test]
    fn row_axis_tracks_row_kinds() {
        let grid = grid();
        // header, 0, 2, header, 1, grand total
        assert_eq!(grid.row_axis().len(), 6);
        assert_eq!(grid.row_axis().total_extent(), 32.0 * 3.0 + 28.0 * 3.0);
        assert_eq!(grid.column_axis().total_extent(), 180.0);
    }

    #[test]
    fn header_press_toggles_group() {
        let mut grid = grid();
        assert!(grid.pointer_down(&PointerInput::at(0, "region")));
        assert_eq!(grid.display_rows().len(), 4);
        assert_eq!(grid.row_axis().len(), 4);
        assert!(grid.selection_snapshot().cells.is_empty());
    }

    #[test]
    fn plain_press_drags() {
        let mut grid = grid();
        assert!(grid.pointer_down(&PointerInput::at(1, "region")));
        assert!(grid.selection().is_dragging());
        assert!(grid.pointer_move(&PointerInput::at(4, "sales")));
        // rows 0, 2 and 1; header skipped
        assert_eq!(grid.selection().selected_cell_count(), 6);
        assert!(grid.pointer_up());
        assert!(!grid.pointer_move(&PointerInput::at(2, "sales")));
    }

    #[test]
    fn bad_config_keeps_previous() {
        let mut grid = grid();
        assert!(!grid.apply_config_json("{\"rowHeight\": -4}"));
        assert!(!grid.apply_config_json("not json"));
        assert_eq!(grid.config().row_height, 28.0);

        assert!(grid.apply_config_json("{\"rowHeight\": 20, \"virtualization\": \"enabled\"}"));
        assert_eq!(grid.row_axis().mode(), VirtualizationMode::Enabled);
        assert_eq!(grid.row_axis().total_extent(), 32.0 * 3.0 + 20.0 * 3.0);
    }

    #[test]
    fn partial_config_keeps_other_fields() {
        let mut grid = DataGrid::from_config_json(r#"{"selectionMode": "row", "rowHeight": 40}"#)
            .unwrap();
        grid.set_data(vec![Record::new().set("region", "x")], vec![], vec![]);
        grid.select_rows([0]);
        assert!(grid.apply_config_json(r#"{"overscan": 5}"#));
        assert_eq!(grid.config().overscan, 5);
        assert_eq!(grid.config().selection_mode, SelectionMode::Row);
        assert_eq!(grid.config().row_height, 40.0);
        assert_eq!(grid.selection().selected_row_count(), 1);
        assert_eq!(grid.row_axis().total_extent(), 40.0);
    }

    #[test]
    fn dirty_edits_through_engine() {
        let mut grid = grid();
        let marked = grid.with_engine(|engine| engine.mark_deleted(1));
        assert!(marked);
        assert_eq!(grid.engine().dirty().len(), 1);
    }
}

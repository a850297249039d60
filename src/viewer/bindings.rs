//! WASM-exported `GridView`, a thin JavaScript shell over [`DataGrid`].
//!
//! Values cross the boundary through `serde-wasm-bindgen`. After any call that
//! changes what a renderer would draw, the registered change callback is
//! invoked with no arguments; the host then pulls whatever it needs.

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::Function;
use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::prelude::*;

use super::DataGrid;
use crate::config::GridConfig;
use crate::error::GridError;
use crate::grouping::{AggregateDef, AggregateSpec};
use crate::types::{CellValue, ColumnDef, GroupColumn, GroupId, KeyInput, PointerInput, Record};

pub(crate) struct SharedState {
    pub(crate) grid: DataGrid,
    pub(crate) change_callback: Option<Function>,
}

#[wasm_bindgen]
pub struct GridView {
    state: Rc<RefCell<SharedState>>,
}

fn from_js<T: DeserializeOwned>(value: JsValue, what: &str) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value)
        .map_err(|e| GridError::InvalidInput(format!("{what}: {e}")).into())
}

/// Plain objects and `null` rather than `Map`s and `undefined`.
fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {e}")))
}

impl GridView {
    fn invoke_change_callback(callback: Option<Function>) {
        if let Some(callback) = callback {
            let _ = callback.call0(&JsValue::NULL);
        }
    }

    /// Run `f` with the grid borrowed; fire the change callback afterwards
    /// (outside the borrow) when `f` reports a change.
    fn update<R>(&self, f: impl FnOnce(&mut DataGrid) -> (R, bool)) -> R {
        let (result, callback) = {
            let mut s = self.state.borrow_mut();
            let (result, changed) = f(&mut s.grid);
            let callback = if changed {
                s.change_callback.clone()
            } else {
                None
            };
            (result, callback)
        };
        Self::invoke_change_callback(callback);
        result
    }
}

#[wasm_bindgen]
impl GridView {
    /// Create a grid. `config` may be `undefined` for defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<GridView, JsValue> {
        console_error_panic_hook::set_once();

        let config: GridConfig = if config.is_undefined() || config.is_null() {
            GridConfig::default()
        } else {
            let config: GridConfig = from_js(config, "config")?;
            config.validate()?;
            config
        };
        Ok(GridView {
            state: Rc::new(RefCell::new(SharedState {
                grid: DataGrid::new(config),
                change_callback: None,
            })),
        })
    }

    /// Apply a partial configuration object; omitted fields keep their
    /// current values. Invalid input keeps the current config.
    #[wasm_bindgen]
    pub fn set_config(&mut self, config: JsValue) -> bool {
        let parsed = from_js::<serde_json::Value>(config, "config").and_then(|patch| {
            let current = self.state.borrow().grid.config().clone();
            current.merge_value(patch).map_err(JsValue::from)
        });
        match parsed {
            Ok(config) => {
                self.update(|grid| {
                    grid.apply_config(config);
                    ((), true)
                });
                true
            }
            Err(e) => {
                log::warn!("ignoring grid configuration: {e:?}");
                false
            }
        }
    }

    /// Set visible columns: `[{ key, width }]` in visual order.
    #[wasm_bindgen]
    pub fn set_columns(&mut self, columns: JsValue) -> Result<(), JsValue> {
        let columns: Vec<ColumnDef> = from_js(columns, "columns")?;
        self.update(|grid| {
            grid.set_columns(columns);
            ((), true)
        });
        Ok(())
    }

    /// Load records, grouping columns and aggregate definitions.
    #[wasm_bindgen]
    pub fn set_data(
        &mut self,
        records: JsValue,
        group_by: JsValue,
        aggregates: JsValue,
    ) -> Result<(), JsValue> {
        let records: Vec<Record> = from_js(records, "records")?;
        let group_by: Vec<GroupColumn> = if group_by.is_undefined() {
            Vec::new()
        } else {
            from_js(group_by, "groupBy")?
        };
        let aggregates: Vec<AggregateDef> = if aggregates.is_undefined() {
            Vec::new()
        } else {
            from_js(aggregates, "aggregates")?
        };
        let aggregates = aggregates.into_iter().map(AggregateSpec::from).collect();
        self.update(|grid| {
            grid.set_data(records, group_by, aggregates);
            ((), true)
        });
        Ok(())
    }

    /// Replace records, keeping grouping and collapse state.
    #[wasm_bindgen]
    pub fn set_records(&mut self, records: JsValue) -> Result<(), JsValue> {
        let records: Vec<Record> = from_js(records, "records")?;
        self.update(|grid| {
            grid.set_records(records);
            ((), true)
        });
        Ok(())
    }

    #[wasm_bindgen]
    pub fn set_group_columns(&mut self, group_by: JsValue) -> Result<(), JsValue> {
        let group_by: Vec<GroupColumn> = from_js(group_by, "groupBy")?;
        self.update(|grid| {
            grid.set_group_columns(group_by);
            ((), true)
        });
        Ok(())
    }

    #[wasm_bindgen]
    pub fn toggle_group(&mut self, id: &str) -> bool {
        let id = GroupId::new(id);
        self.update(|grid| {
            let changed = grid.toggle_group(&id);
            (changed, changed)
        })
    }

    #[wasm_bindgen]
    pub fn expand_all(&mut self) -> bool {
        self.update(|grid| {
            let changed = grid.expand_all();
            (changed, changed)
        })
    }

    #[wasm_bindgen]
    pub fn collapse_all(&mut self) -> bool {
        self.update(|grid| {
            let changed = grid.collapse_all();
            (changed, changed)
        })
    }

    /// The flattened display sequence.
    #[wasm_bindgen]
    pub fn display_rows(&self) -> Result<JsValue, JsValue> {
        to_js(self.state.borrow().grid.display_rows())
    }

    /// A slice of the display sequence, typically the visible range.
    #[wasm_bindgen]
    pub fn display_rows_in(&self, start: usize, end: usize) -> Result<JsValue, JsValue> {
        let s = self.state.borrow();
        let rows = s.grid.display_rows();
        let end = end.min(rows.len());
        let start = start.min(end);
        to_js(rows.get(start..end).unwrap_or_default())
    }

    #[wasm_bindgen]
    pub fn row_count(&self) -> usize {
        self.state.borrow().grid.display_rows().len()
    }

    /// Update the scroll window; returns true when either visible range changed.
    #[wasm_bindgen]
    pub fn set_viewport(&mut self, scroll_left: f32, scroll_top: f32, width: f32, height: f32) -> bool {
        self.update(|grid| {
            let changed = grid.set_viewport(scroll_left, scroll_top, width, height);
            (changed, changed)
        })
    }

    /// `{ startIndex, endIndex, leadingOffset, totalExtent }` or `null`.
    #[wasm_bindgen]
    pub fn visible_rows(&self) -> Result<JsValue, JsValue> {
        to_js(&self.state.borrow().grid.visible_rows())
    }

    #[wasm_bindgen]
    pub fn visible_columns(&self) -> Result<JsValue, JsValue> {
        to_js(&self.state.borrow().grid.visible_columns())
    }

    #[wasm_bindgen]
    pub fn total_height(&self) -> f32 {
        self.state.borrow().grid.row_axis().total_extent()
    }

    #[wasm_bindgen]
    pub fn total_width(&self) -> f32 {
        self.state.borrow().grid.column_axis().total_extent()
    }

    #[wasm_bindgen]
    pub fn pointer_down(&mut self, input: JsValue) -> Result<bool, JsValue> {
        let input: PointerInput = from_js(input, "pointer")?;
        Ok(self.update(|grid| {
            let changed = grid.pointer_down(&input);
            (changed, changed)
        }))
    }

    #[wasm_bindgen]
    pub fn pointer_move(&mut self, input: JsValue) -> Result<bool, JsValue> {
        let input: PointerInput = from_js(input, "pointer")?;
        Ok(self.update(|grid| {
            let changed = grid.pointer_move(&input);
            (changed, changed)
        }))
    }

    #[wasm_bindgen]
    pub fn pointer_up(&mut self) -> bool {
        self.update(|grid| {
            let changed = grid.pointer_up();
            (changed, changed)
        })
    }

    #[wasm_bindgen]
    pub fn pointer_cancel(&mut self) -> bool {
        self.update(|grid| {
            let changed = grid.pointer_cancel();
            (changed, changed)
        })
    }

    /// Returns true when the key was handled (call `preventDefault`).
    #[wasm_bindgen]
    pub fn key_down(&mut self, input: JsValue) -> Result<bool, JsValue> {
        let input: KeyInput = from_js(input, "key")?;
        Ok(self.update(|grid| {
            let before = grid.selection_snapshot();
            let handled = grid.key_down(&input);
            let changed = grid.selection_snapshot() != before;
            (handled, changed)
        }))
    }

    #[wasm_bindgen]
    pub fn select_all(&mut self) -> bool {
        self.update(|grid| {
            let changed = grid.select_all();
            (changed, changed)
        })
    }

    #[wasm_bindgen]
    pub fn clear_selection(&mut self) -> bool {
        self.update(|grid| {
            let changed = grid.clear_selection();
            (changed, changed)
        })
    }

    /// Current selection snapshot (a copy).
    #[wasm_bindgen]
    pub fn selection(&self) -> Result<JsValue, JsValue> {
        to_js(&self.state.borrow().grid.selection_snapshot())
    }

    /// Selection as TSV, ready for `navigator.clipboard.writeText`.
    #[wasm_bindgen]
    pub fn copy_selection(&self) -> String {
        self.state.borrow().grid.copy_selection()
    }

    /// Record an edit. `previous` is the value before the edit (`undefined` if none).
    #[wasm_bindgen]
    pub fn mark_modified(
        &mut self,
        data_index: usize,
        field: &str,
        previous: JsValue,
    ) -> Result<bool, JsValue> {
        let previous: Option<CellValue> = if previous.is_undefined() {
            None
        } else {
            Some(from_js(previous, "previous")?)
        };
        Ok(self.update(|grid| {
            let changed = grid.with_engine(|e| e.mark_modified(data_index, field, previous));
            (changed, changed)
        }))
    }

    #[wasm_bindgen]
    pub fn mark_added(&mut self, data_index: usize) -> bool {
        self.update(|grid| {
            let changed = grid.with_engine(|e| e.mark_added(data_index));
            (changed, changed)
        })
    }

    #[wasm_bindgen]
    pub fn mark_deleted(&mut self, data_index: usize) -> bool {
        self.update(|grid| {
            let changed = grid.with_engine(|e| e.mark_deleted(data_index));
            (changed, changed)
        })
    }

    #[wasm_bindgen]
    pub fn clear_dirty(&mut self) {
        self.update(|grid| {
            grid.with_engine(|e| e.clear_dirty());
            ((), true)
        });
    }

    /// Register the function called after any visible change, or `null` to remove it.
    #[wasm_bindgen]
    pub fn set_change_callback(&mut self, callback: Option<Function>) {
        self.state.borrow_mut().change_callback = callback;
    }
}

//! gridview - grouping, virtualization and selection for data grids
//!
//! The non-visual core of a data-grid widget, usable from Rust or from the
//! browser via WebAssembly:
//! - Hierarchical grouping with per-group aggregates, flattened into a
//!   display sequence of headers, data rows, footers and totals
//! - Row and column virtualization over variable item sizes
//! - Row/cell selection with click, Shift/Ctrl, drag and keyboard semantics
//! - Change notification only when state actually changes
//!
//! # Usage (Rust)
//!
//! ```
//! use gridview::{ColumnDef, DataGrid, GridConfig, PointerInput, Record};
//!
//! let mut grid = DataGrid::new(GridConfig::default());
//! grid.set_columns(vec![ColumnDef::new("name", 120.0)]);
//! grid.set_data(vec![Record::new().set("name", "ann")], vec![], vec![]);
//! grid.pointer_down(&PointerInput::at(0, "name"));
//! grid.pointer_up();
//! assert_eq!(grid.copy_selection(), "ann");
//! ```
//!
//! # Usage (JavaScript)
//!
//! ```javascript
//! import init, { GridView } from 'gridview';
//! await init();
//! const grid = new GridView({ rowHeight: 28 });
//! grid.set_columns([{ key: 'region', width: 120 }, { key: 'sales', width: 90 }]);
//! grid.set_data(records, [{ key: 'region' }], [{ key: 'total', column: 'sales', func: 'sum' }]);
//! grid.set_change_callback(() => requestAnimationFrame(draw));
//! ```

pub mod config;
pub mod error;
pub mod grouping;
pub mod layout;
pub mod notify;
pub mod selection;
pub mod types;
pub mod viewer;

use wasm_bindgen::prelude::*;

pub use config::GridConfig;
pub use error::{GridError, Result};
pub use grouping::{AggregateSpec, BuiltinAggregate, GroupingEngine};
pub use layout::{AxisVirtualizer, ScrollAlign, VirtualizationMode, VisibleRange};
pub use notify::{ListenerId, Listeners};
pub use selection::{RowSource, SelectionModel};
pub use viewer::DataGrid;

#[cfg(target_arch = "wasm32")]
pub use viewer::GridView;

pub use types::*;

/// Get the library version
#[must_use]
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

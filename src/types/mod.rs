//! Data types shared by the grouping, layout and selection engines.

mod cell;
mod column;
mod input;
mod row;
mod selection;

pub use cell::*;
pub use column::*;
pub use input::*;
pub use row::*;
pub use selection::*;

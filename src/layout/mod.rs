//! Layout engine for virtualized axes.
//!
//! This module handles:
//! - Pre-computing cumulative offsets from item sizes
//! - Binary search for the visible window and for hit testing
//! - Overscan and auto-enable thresholds
//! - Change notification when the visible window moves

mod axis;

pub use axis::{
    AxisVirtualizer, ScrollAlign, VirtualizationMode, VisibleRange, DEFAULT_OVERSCAN,
    DEFAULT_THRESHOLD,
};

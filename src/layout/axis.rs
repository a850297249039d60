//! Virtualization along one axis (rows or columns).
//!
//! Item sizes are folded into a cumulative offset array once per change, so
//! both edges of the visible window are found with a binary search.

use serde::{Deserialize, Serialize};

use crate::notify::{ListenerId, Listeners};

/// Default number of extra items materialized on each side of the window.
pub const DEFAULT_OVERSCAN: usize = 3;

/// Default item count at which `Auto` virtualization turns on.
pub const DEFAULT_THRESHOLD: usize = 100;

/// Whether the axis reports a window or asks for everything to be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VirtualizationMode {
    Enabled,
    Disabled,
    /// Enabled once the item count reaches the threshold
    #[default]
    Auto,
}

/// Items to materialize: `start_index..end_index`, overscan included.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibleRange {
    pub start_index: usize,
    /// Exclusive
    pub end_index: usize,
    /// Offset of the first materialized item's leading edge
    pub leading_offset: f32,
    /// Sum of all item sizes
    pub total_extent: f32,
}

impl VisibleRange {
    pub fn len(&self) -> usize {
        self.end_index - self.start_index
    }

    pub fn is_empty(&self) -> bool {
        self.end_index == self.start_index
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start_index && index < self.end_index
    }
}

/// Where to place an item when scrolling it into view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollAlign {
    Start,
    Center,
    End,
    /// Scroll the minimum distance needed; stay put if already visible
    #[default]
    Nearest,
}

/// Sized items plus the current viewport of one axis.
pub struct AxisVirtualizer {
    /// Item sizes (0 for collapsed/hidden items)
    sizes: Vec<f32>,
    /// Cumulative offsets (`offsets[i]` = leading edge of item i, last = total)
    offsets: Vec<f32>,
    /// (offset, extent) once the host has measured the viewport
    viewport: Option<(f32, f32)>,
    overscan: usize,
    mode: VirtualizationMode,
    threshold: usize,
    /// Last reported `[start, end)` pair
    last_span: Option<(usize, usize)>,
    listeners: Listeners<Option<VisibleRange>>,
}

impl Default for AxisVirtualizer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AxisVirtualizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AxisVirtualizer")
            .field("items", &self.sizes.len())
            .field("total_extent", &self.total_extent())
            .field("viewport", &self.viewport)
            .field("overscan", &self.overscan)
            .field("mode", &self.mode)
            .field("threshold", &self.threshold)
            .finish()
    }
}

impl AxisVirtualizer {
    pub fn new() -> Self {
        Self {
            sizes: Vec::new(),
            offsets: vec![0.0],
            viewport: None,
            overscan: DEFAULT_OVERSCAN,
            mode: VirtualizationMode::Auto,
            threshold: DEFAULT_THRESHOLD,
            last_span: None,
            listeners: Listeners::new(),
        }
    }

    /// Create a virtualizer with explicit overscan, mode and auto threshold.
    pub fn with_options(overscan: usize, mode: VirtualizationMode, threshold: usize) -> Self {
        Self {
            overscan,
            mode,
            threshold,
            ..Self::new()
        }
    }

    /// Replace the item list. Negative or non-finite sizes count as 0.
    pub fn configure<I>(&mut self, sizes: I)
    where
        I: IntoIterator<Item = f32>,
    {
        self.sizes = sizes.into_iter().map(sanitize_size).collect();
        self.rebuild_offsets();
        self.refresh();
    }

    /// Change one item's size. Returns false for an unknown index.
    pub fn set_item_size(&mut self, index: usize, size: f32) -> bool {
        let size = sanitize_size(size);
        let Some(slot) = self.sizes.get_mut(index) else {
            return false;
        };
        if slot.to_bits() == size.to_bits() {
            return false;
        }
        *slot = size;
        self.rebuild_offsets();
        self.refresh();
        true
    }

    /// Update the visible window. An `extent` of 0 means "not measured yet" and is ignored.
    ///
    /// Returns true when the reported `[start, end)` pair changed.
    pub fn set_viewport(&mut self, offset: f32, extent: f32) -> bool {
        if !(extent.is_finite() && extent > 0.0) || !offset.is_finite() {
            return false;
        }
        self.viewport = Some((offset.max(0.0), extent));
        self.refresh()
    }

    pub fn set_overscan(&mut self, overscan: usize) {
        if self.overscan != overscan {
            self.overscan = overscan;
            self.refresh();
        }
    }

    pub fn set_mode(&mut self, mode: VirtualizationMode) {
        if self.mode != mode {
            self.mode = mode;
            self.refresh();
        }
    }

    pub fn set_threshold(&mut self, threshold: usize) {
        if self.threshold != threshold {
            self.threshold = threshold;
            self.refresh();
        }
    }

    pub fn overscan(&self) -> usize {
        self.overscan
    }

    pub fn mode(&self) -> VirtualizationMode {
        self.mode
    }

    pub fn viewport(&self) -> Option<(f32, f32)> {
        self.viewport
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Whether a window is computed at all (false means render everything).
    pub fn is_virtualized(&self) -> bool {
        match self.mode {
            VirtualizationMode::Enabled => true,
            VirtualizationMode::Disabled => false,
            VirtualizationMode::Auto => self.sizes.len() >= self.threshold,
        }
    }

    /// Items to materialize for the current viewport.
    ///
    /// `None` when virtualization is off, there are no items, or the viewport
    /// has not been measured yet; all three mean "render everything".
    pub fn visible_range(&self) -> Option<VisibleRange> {
        if !self.is_virtualized() || self.sizes.is_empty() {
            return None;
        }
        let (offset, extent) = self.viewport?;
        let (start, end) = self.strict_span(offset, extent)?;
        let n = self.sizes.len();
        let start_index = start.saturating_sub(self.overscan);
        let end_index = end.saturating_add(self.overscan).min(n);
        Some(VisibleRange {
            start_index,
            end_index,
            leading_offset: self.offsets.get(start_index).copied().unwrap_or(0.0),
            total_extent: self.total_extent(),
        })
    }

    /// Items intersecting `[offset, offset + extent)` before overscan, as `[start, end)`.
    pub fn strict_span(&self, offset: f32, extent: f32) -> Option<(usize, usize)> {
        let (_, item_starts) = self.offsets.split_last()?;
        let (_, item_ends) = self.offsets.split_first()?;
        if item_starts.is_empty() {
            return None;
        }
        let window_end = offset + extent;
        // Greatest index whose leading edge is <= offset.
        let start = item_starts
            .partition_point(|&pos| pos <= offset)
            .saturating_sub(1);
        // Smallest index whose trailing edge passes the window end.
        let last = item_ends.partition_point(|&pos| pos <= window_end);
        let end = (last + 1).min(item_starts.len()).max(start + 1);
        Some((start, end))
    }

    /// Find the item at `offset` (binary search).
    pub fn index_at_offset(&self, offset: f32) -> Option<usize> {
        let (_, item_starts) = self.offsets.split_last()?;
        if item_starts.is_empty() {
            return None;
        }
        Some(
            item_starts
                .partition_point(|&pos| pos <= offset)
                .saturating_sub(1),
        )
    }

    /// Leading edge of item `index`.
    pub fn offset_of(&self, index: usize) -> Option<f32> {
        if index >= self.sizes.len() {
            return None;
        }
        self.offsets.get(index).copied()
    }

    pub fn size_of(&self, index: usize) -> Option<f32> {
        self.sizes.get(index).copied()
    }

    /// Sum of all item sizes.
    pub fn total_extent(&self) -> f32 {
        self.offsets.last().copied().unwrap_or(0.0)
    }

    /// Scroll offset that brings item `index` into view with the given alignment.
    ///
    /// Needs a measured viewport; the result is clamped to the scrollable range.
    pub fn scroll_offset_for(&self, index: usize, align: ScrollAlign) -> Option<f32> {
        let (current, extent) = self.viewport?;
        let start = self.offset_of(index)?;
        let size = self.size_of(index)?;
        let end = start + size;
        let target = match align {
            ScrollAlign::Start => start,
            ScrollAlign::End => end - extent,
            ScrollAlign::Center => start + size / 2.0 - extent / 2.0,
            ScrollAlign::Nearest => {
                if start < current {
                    start
                } else if end > current + extent {
                    end - extent
                } else {
                    current
                }
            }
        };
        let max_offset = (self.total_extent() - extent).max(0.0);
        Some(target.clamp(0.0, max_offset))
    }

    /// Register a callback fired when the reported range changes.
    pub fn subscribe(&mut self, callback: impl FnMut(&Option<VisibleRange>) + 'static) -> ListenerId {
        self.listeners.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    fn rebuild_offsets(&mut self) {
        self.offsets.clear();
        self.offsets.reserve(self.sizes.len() + 1);
        let mut pos: f32 = 0.0;
        for &size in &self.sizes {
            self.offsets.push(pos);
            pos += size;
        }
        self.offsets.push(pos); // Final edge
    }

    /// Recompute the window; notify only when the `[start, end)` pair moved.
    /// Size changes that keep the pair are read back through `total_extent`.
    fn refresh(&mut self) -> bool {
        let range = self.visible_range();
        let span = range.map(|r| (r.start_index, r.end_index));
        if span == self.last_span {
            return false;
        }
        log::trace!("visible span {:?} -> {:?}", self.last_span, span);
        self.last_span = span;
        self.listeners.emit_if_changed(&range);
        true
    }
}

fn sanitize_size(size: f32) -> f32 {
    if size.is_finite() && size > 0.0 {
        size
    } else {
        0.0
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
    use std::cell::RefCell;
    use std::rc::Rc;

    fn uniform(count: usize, size: f32) -> AxisVirtualizer {
        let mut axis = AxisVirtualizer::with_options(0, VirtualizationMode::Enabled, 0);
        axis.configure(std::iter::repeat(size).take(count));
        axis
    }

    #[test]
    fn test_basic_offsets() {
        let axis = uniform(10, 20.0);
        assert_eq!(axis.len(), 10);
        assert_eq!(axis.total_extent(), 200.0);
        assert_eq!(axis.offset_of(0), Some(0.0));
        assert_eq!(axis.offset_of(3), Some(60.0));
        assert_eq!(axis.offset_of(10), None);
    }

    #[test]
    fn test_index_at_offset() {
        let axis = uniform(10, 20.0);
        assert_eq!(axis.index_at_offset(0.0), Some(0));
        assert_eq!(axis.index_at_offset(10.0), Some(0));
        assert_eq!(axis.index_at_offset(20.0), Some(1));
        assert_eq!(axis.index_at_offset(50.0), Some(2));
        assert_eq!(axis.index_at_offset(5000.0), Some(9));
    }

    #[test]
    fn test_strict_span_partial_items() {
        let axis = uniform(10, 20.0);
        // [30, 75) touches items 1..=3
        assert_eq!(axis.strict_span(30.0, 45.0), Some((1, 4)));
        // aligned window [40, 80): item 4 is the first to end past 80
        assert_eq!(axis.strict_span(40.0, 40.0), Some((2, 5)));
    }

    #[test]
    fn test_no_range_before_measurement() {
        let mut axis = uniform(10, 20.0);
        assert_eq!(axis.visible_range(), None);
        assert!(!axis.set_viewport(0.0, 0.0));
        assert_eq!(axis.visible_range(), None);
        assert!(axis.set_viewport(0.0, 50.0));
        assert!(axis.visible_range().is_some());
    }

    #[test]
    fn test_resize_invalidates_offsets() {
        let mut axis = uniform(4, 10.0);
        assert!(axis.set_item_size(1, 30.0));
        assert_eq!(axis.offset_of(2), Some(40.0));
        assert_eq!(axis.total_extent(), 60.0);
        assert!(!axis.set_item_size(9, 30.0));
        assert!(!axis.set_item_size(1, 30.0));
    }

    #[test]
    fn test_bad_sizes_are_zero() {
        let mut axis = AxisVirtualizer::new();
        axis.configure([10.0, -5.0, f32::NAN, 10.0]);
        assert_eq!(axis.total_extent(), 20.0);
        assert_eq!(axis.size_of(1), Some(0.0));
    }

    #[test]
    fn test_notifies_only_on_span_change() {
        let fired = Rc::new(RefCell::new(0));
        let mut axis = uniform(100, 10.0);
        let sink = Rc::clone(&fired);
        axis.subscribe(move |_| *sink.borrow_mut() += 1);

        axis.set_viewport(0.0, 50.0);
        assert_eq!(*fired.borrow(), 1);
        // Same items, different sub-pixel offset
        axis.set_viewport(2.0, 50.0);
        assert_eq!(*fired.borrow(), 1);
        axis.set_viewport(100.0, 50.0);
        assert_eq!(*fired.borrow(), 2);
    }

    #[test]
    fn test_resize_outside_window_is_silent() {
        let fired = Rc::new(RefCell::new(0));
        let mut axis = uniform(100, 10.0);
        axis.set_viewport(0.0, 50.0);
        let sink = Rc::clone(&fired);
        axis.subscribe(move |_| *sink.borrow_mut() += 1);

        assert!(axis.set_item_size(90, 40.0));
        assert_eq!(axis.total_extent(), 1030.0);
        assert_eq!(*fired.borrow(), 0);

        // Growing item 0 pushes the window end back
        assert!(axis.set_item_size(0, 30.0));
        assert_eq!(*fired.borrow(), 1);
    }

    #[test]
    fn test_scroll_offset_for() {
        let mut axis = uniform(100, 10.0);
        axis.set_viewport(100.0, 50.0);
        assert_eq!(axis.scroll_offset_for(20, ScrollAlign::Start), Some(200.0));
        assert_eq!(axis.scroll_offset_for(20, ScrollAlign::End), Some(160.0));
        assert_eq!(axis.scroll_offset_for(20, ScrollAlign::Center), Some(180.0));
        assert_eq!(axis.scroll_offset_for(12, ScrollAlign::Nearest), Some(100.0));
        assert_eq!(axis.scroll_offset_for(2, ScrollAlign::Nearest), Some(20.0));
        assert_eq!(axis.scroll_offset_for(99, ScrollAlign::Start), Some(950.0));
    }
}

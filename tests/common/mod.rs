//! Common test fixtures and assertion helpers.
//!
//! Each integration test declares `mod common;` and picks what it needs.
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic,
    clippy::cast_precision_loss,
    clippy::cast_possible_wrap
)]

use gridview::{DisplayRow, GroupId, GroupingEngine, Record};

// ============================================================================
// Datasets
// ============================================================================

/// Sales records: region x year x rep, `n` rows, deterministic.
pub fn sales(n: usize) -> Vec<Record> {
    const REGIONS: [&str; 3] = ["north", "south", "east"];
    const REPS: [&str; 4] = ["ann", "bob", "cy", "dee"];
    (0..n)
        .map(|i| {
            Record::new()
                .set("region", REGIONS[i % 3])
                .set("year", (2020 + (i / 3) % 2) as i64)
                .set("rep", REPS[(i / 2) % 4])
                .set("amount", (i * 10) as f64)
        })
        .collect()
}

/// `rows` records with columns `c0..c{cols}` holding `"r{row}c{col}"`.
pub fn table(rows: usize, cols: usize) -> Vec<Record> {
    (0..rows)
        .map(|r| {
            (0..cols).fold(Record::new(), |record, c| {
                record.set(&format!("c{c}"), format!("r{r}c{c}"))
            })
        })
        .collect()
}

/// Columns `["name", "amount", "date"]` filled for `n` flat records.
pub fn ledger(n: usize) -> Vec<Record> {
    (0..n)
        .map(|i| {
            Record::new()
                .set("name", format!("item {i}"))
                .set("amount", i as f64 * 2.5)
                .set("date", format!("2024-01-{:02}", i + 1))
        })
        .collect()
}

// ============================================================================
// Display sequence helpers
// ============================================================================

/// Compact description of a display sequence, e.g. `["H0", "D3", "F0", "T"]`.
pub fn shape(rows: &[DisplayRow]) -> Vec<String> {
    rows.iter()
        .map(|row| match row {
            DisplayRow::GroupHeader(h) => format!("H{}", h.level),
            DisplayRow::Data(d) => format!("D{}", d.data_index),
            DisplayRow::GroupFooter(f) => format!("F{}", f.level),
            DisplayRow::Subtotal(s) => format!("S{}", s.level),
            DisplayRow::GrandTotal(_) => "T".to_string(),
        })
        .collect()
}

/// Data indices in display order.
pub fn data_order(rows: &[DisplayRow]) -> Vec<usize> {
    rows.iter().filter_map(DisplayRow::data_index).collect()
}

/// Id of the first top-level group.
pub fn first_group(engine: &GroupingEngine) -> GroupId {
    engine
        .tree()
        .roots()
        .first()
        .map(|node| node.id.clone())
        .expect("engine has groups")
}

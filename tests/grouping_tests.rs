//! Grouping engine tests
//!
//! Partitioning, aggregation, flattening and collapse behavior of the
//! grouping engine.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod common;

use common::*;
use gridview::grouping::{AggregateSpec, BuiltinAggregate, FlattenOptions, GroupingEngine};
use gridview::{CellValue, DirtyState, DisplayRow, GroupColumn, Record};
use std::rc::Rc;

fn by(columns: &[&str]) -> Vec<GroupColumn> {
    columns.iter().map(|c| GroupColumn::new(c)).collect()
}

fn sum_amount() -> Vec<AggregateSpec> {
    vec![AggregateSpec::new("total", "amount", BuiltinAggregate::Sum)]
}

// ============================================================================
// Tree properties
// ============================================================================

#[test]
fn test_counts_at_every_depth_sum_to_record_count() {
    for n in [0usize, 1, 7, 24, 101] {
        let mut engine = GroupingEngine::new();
        engine.build(sales(n), by(&["region", "year", "rep"]), vec![]);
        for depth in 0..3 {
            let nodes = engine.tree().nodes_at_depth(depth);
            let total: usize = nodes.iter().map(|node| node.count).sum();
            assert_eq!(total, n, "depth {depth} with {n} records");
        }
    }
}

#[test]
fn test_partitions_keep_first_appearance_order() {
    let records = vec![
        Record::new().set("k", "b"),
        Record::new().set("k", "a"),
        Record::new().set("k", "b"),
        Record::new().set("k", "c"),
    ];
    let mut engine = GroupingEngine::new();
    engine.build(records, by(&["k"]), vec![]);
    let values: Vec<Option<CellValue>> = engine
        .tree()
        .roots()
        .iter()
        .map(|node| node.value.clone())
        .collect();
    assert_eq!(
        values,
        vec![
            Some(CellValue::from("b")),
            Some(CellValue::from("a")),
            Some(CellValue::from("c"))
        ]
    );
    assert_eq!(data_order(engine.display_rows()), vec![0, 2, 1, 3]);
}

#[test]
fn test_no_coercion_and_undefined_is_a_group() {
    let records = vec![
        Record::new().set("k", 1.0),
        Record::new().set("k", "1"),
        Record::new().set("k", true),
        Record::new(),
        Record::new().set("k", CellValue::Null),
        Record::new(),
    ];
    let mut engine = GroupingEngine::new();
    engine.build(records, by(&["k"]), vec![]);
    let roots = engine.tree().roots();
    assert_eq!(roots.len(), 5);
    let undefined = roots.iter().find(|node| node.value.is_none()).unwrap();
    assert_eq!(undefined.records(), &[3, 5]);
}

#[test]
fn test_group_ids_are_unique_per_path() {
    let mut engine = GroupingEngine::new();
    engine.build(sales(24), by(&["region", "year"]), vec![]);
    let mut ids = Vec::new();
    engine.tree().visit(|node| ids.push(node.id.clone()));
    let unique: std::collections::HashSet<_> = ids.iter().collect();
    assert_eq!(unique.len(), ids.len());
    // same year under two regions is two groups
    assert_eq!(engine.tree().nodes_at_depth(1).len(), 6);
}

// ============================================================================
// Aggregates
// ============================================================================

#[test]
fn test_aggregates_cover_all_descendants() {
    let mut engine = GroupingEngine::new();
    engine.build(sales(6), by(&["region", "year"]), sum_amount());
    // north: records 0 and 3 (amounts 0 and 30)
    let north = &engine.tree().roots()[0];
    assert_eq!(north.aggregates["total"], CellValue::Number(30.0));
    assert_eq!(engine.tree().grand_total["total"], CellValue::Number(150.0));
}

#[test]
fn test_builtins_exclude_non_numeric_but_count_them() {
    let records = vec![
        Record::new().set("g", "x").set("v", 4.0),
        Record::new().set("g", "x").set("v", "oops"),
        Record::new().set("g", "x"),
        Record::new().set("g", "x").set("v", 2.0),
    ];
    let specs = vec![
        AggregateSpec::new("sum", "v", BuiltinAggregate::Sum),
        AggregateSpec::new("avg", "v", BuiltinAggregate::Avg),
        AggregateSpec::new("count", "v", BuiltinAggregate::Count),
        AggregateSpec::new("min", "v", BuiltinAggregate::Min),
        AggregateSpec::new("max", "v", BuiltinAggregate::Max),
        AggregateSpec::new("first", "v", BuiltinAggregate::First),
        AggregateSpec::new("last", "v", BuiltinAggregate::Last),
    ];
    let mut engine = GroupingEngine::new();
    engine.build(records, by(&["g"]), specs);
    let agg = &engine.tree().roots()[0].aggregates;
    assert_eq!(agg["sum"], CellValue::Number(6.0));
    assert_eq!(agg["avg"], CellValue::Number(3.0));
    assert_eq!(agg["count"], CellValue::Number(4.0));
    assert_eq!(agg["min"], CellValue::Number(2.0));
    assert_eq!(agg["max"], CellValue::Number(4.0));
    assert_eq!(agg["first"], CellValue::Number(4.0));
    assert_eq!(agg["last"], CellValue::Number(2.0));
}

#[test]
fn test_custom_reducer_sees_raw_values() {
    let records = vec![
        Record::new().set("g", "x").set("tag", "a"),
        Record::new().set("g", "x"),
        Record::new().set("g", "x").set("tag", "b"),
    ];
    let joined = AggregateSpec::custom("tags", "tag", |values| {
        let parts: Vec<String> = values
            .iter()
            .map(|v| v.map_or("-".to_string(), ToString::to_string))
            .collect();
        CellValue::Text(parts.join(","))
    });
    let mut engine = GroupingEngine::new();
    engine.build(records, by(&["g"]), vec![joined]);
    assert_eq!(
        engine.tree().roots()[0].aggregates["tags"],
        CellValue::from("a,-,b")
    );
}

// ============================================================================
// Flattening
// ============================================================================

#[test]
fn test_flat_dataset_is_data_then_total() {
    let mut engine = GroupingEngine::new();
    engine.build(sales(3), vec![], sum_amount());
    assert_eq!(shape(engine.display_rows()), vec!["D0", "D1", "D2", "T"]);
    assert!(engine.display_rows()[..3].iter().all(|row| row.level() == 0));
}

#[test]
fn test_nested_flattening_is_preorder() {
    let mut engine = GroupingEngine::with_options(FlattenOptions {
        show_group_footers: true,
        show_grand_total: true,
        always_show_grand_total: false,
    });
    let records = vec![
        Record::new().set("a", "x").set("b", 1.0),
        Record::new().set("a", "y").set("b", 1.0),
        Record::new().set("a", "x").set("b", 2.0),
    ];
    engine.build(records, by(&["a", "b"]), vec![]);
    assert_eq!(
        shape(engine.display_rows()),
        vec!["H0", "H1", "D0", "F1", "H1", "D2", "F1", "F0", "H0", "H1", "D1", "F1", "F0"]
    );
    let data = engine.display_rows()[2].as_data().unwrap();
    assert_eq!(data.level, 2);
    assert_eq!(data.group_path.len(), 2);
}

#[test]
fn test_subtotals_per_level() {
    let mut engine = GroupingEngine::new();
    engine.build(
        sales(6),
        vec![GroupColumn::new("region").with_subtotal(), GroupColumn::new("year")],
        sum_amount(),
    );
    let rows = engine.display_rows();
    let subtotals: Vec<&DisplayRow> = rows
        .iter()
        .filter(|row| matches!(row, DisplayRow::Subtotal(_)))
        .collect();
    assert_eq!(subtotals.len(), 3);
    assert!(subtotals.iter().all(|row| row.level() == 0));
    assert!(matches!(rows.last(), Some(DisplayRow::GrandTotal(_))));
}

#[test]
fn test_empty_dataset_total_policy() {
    let mut engine = GroupingEngine::new();
    engine.build(Vec::new(), by(&["region"]), sum_amount());
    assert!(engine.display_rows().is_empty());

    let mut always = GroupingEngine::with_options(FlattenOptions {
        show_group_footers: false,
        show_grand_total: true,
        always_show_grand_total: true,
    });
    always.build(Vec::new(), by(&["region"]), sum_amount());
    assert_eq!(shape(always.display_rows()), vec!["T"]);

    // no aggregates requested: no total even when forced
    always.build(Vec::new(), by(&["region"]), vec![]);
    assert!(always.display_rows().is_empty());
}

// ============================================================================
// Collapse
// ============================================================================

#[test]
fn test_all_collapsed_yields_one_row_per_top_level_group() {
    for n in [3usize, 30, 300] {
        let mut engine = GroupingEngine::new();
        engine.build(sales(n), by(&["region", "year", "rep"]), sum_amount());
        engine.collapse_all();
        assert_eq!(shape(engine.display_rows()), vec!["H0", "H0", "H0", "T"]);
    }
}

#[test]
fn test_collapse_expand_round_trip() {
    let mut engine = GroupingEngine::new();
    engine.build(sales(24), by(&["region", "year"]), sum_amount());
    let before = engine.display_rows().to_vec();
    let target = engine.tree().nodes_at_depth(1)[1].id.clone();

    assert!(engine.toggle_group(&target));
    assert!(engine.display_rows().len() < before.len());
    assert!(engine.toggle_group(&target));

    let after = engine.display_rows();
    assert_eq!(after, before.as_slice());
    for (a, b) in after.iter().zip(&before) {
        if let (DisplayRow::Data(a), DisplayRow::Data(b)) = (a, b) {
            assert!(Rc::ptr_eq(&a.record, &b.record));
        }
    }
}

#[test]
fn test_collapsed_records_have_no_view_index() {
    let mut engine = GroupingEngine::new();
    engine.build(sales(6), by(&["region"]), vec![]);
    let north = first_group(&engine);
    engine.set_collapsed(&north, true);
    assert_eq!(engine.view_index_of(0), None);
    assert_eq!(engine.view_index_of(1), Some(2));
    assert!(!engine.set_collapsed(&north, true));
    assert!(engine.expand_all());
    assert_eq!(engine.view_index_of(0), Some(1));
}

#[test]
fn test_regrouping_keeps_dirty_state() {
    let mut engine = GroupingEngine::new();
    engine.build(sales(6), by(&["region"]), vec![]);
    engine.mark_modified(4, "amount", Some(CellValue::Number(40.0)));
    engine.set_group_columns(by(&["year"]));
    let view = engine.view_index_of(4).unwrap();
    assert_eq!(
        engine.row(view).unwrap().as_data().unwrap().dirty,
        DirtyState::Modified
    );

    engine.set_records(sales(6));
    assert!(engine.dirty().is_empty());
}

//! Per-group aggregates: built-in functions plus caller-supplied reducers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

use crate::types::{Aggregates, CellValue, Record};

/// Built-in aggregation functions.
///
/// `sum`, `avg`, `min` and `max` skip non-numeric and absent values;
/// `count` counts every record in the group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuiltinAggregate {
    Sum,
    Avg,
    Count,
    Min,
    Max,
    First,
    Last,
}

/// Caller-supplied reducer over a group's raw values in record order
/// (`None` for records where the column is undefined).
pub type Reducer = Rc<dyn Fn(&[Option<&CellValue>]) -> CellValue>;

#[derive(Clone)]
pub enum AggregateFn {
    Builtin(BuiltinAggregate),
    Custom(Reducer),
}

impl fmt::Debug for AggregateFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregateFn::Builtin(b) => f.debug_tuple("Builtin").field(b).finish(),
            AggregateFn::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// One aggregate to compute for every group: `key` names the result.
#[derive(Debug, Clone)]
pub struct AggregateSpec {
    pub key: String,
    pub column: String,
    pub func: AggregateFn,
}

impl AggregateSpec {
    pub fn new(key: &str, column: &str, func: BuiltinAggregate) -> Self {
        Self {
            key: key.to_string(),
            column: column.to_string(),
            func: AggregateFn::Builtin(func),
        }
    }

    pub fn custom<F>(key: &str, column: &str, reducer: F) -> Self
    where
        F: Fn(&[Option<&CellValue>]) -> CellValue + 'static,
    {
        Self {
            key: key.to_string(),
            column: column.to_string(),
            func: AggregateFn::Custom(Rc::new(reducer)),
        }
    }
}

/// Serializable form of a built-in aggregate, as hosts send it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateDef {
    pub key: String,
    pub column: String,
    pub func: BuiltinAggregate,
}

impl From<AggregateDef> for AggregateSpec {
    fn from(def: AggregateDef) -> Self {
        AggregateSpec::new(&def.key, &def.column, def.func)
    }
}

/// Running state for the built-ins over one column.
#[derive(Debug, Clone, Default)]
struct Accumulator {
    count: usize,
    numeric: usize,
    sum: f64,
    min: Option<f64>,
    max: Option<f64>,
    first: Option<CellValue>,
    last: Option<CellValue>,
}

impl Accumulator {
    fn add(&mut self, value: Option<&CellValue>) {
        self.count += 1;
        let owned = value.cloned().unwrap_or(CellValue::Null);
        if self.first.is_none() {
            self.first = Some(owned.clone());
        }
        self.last = Some(owned);

        if let Some(n) = value.and_then(CellValue::as_f64) {
            self.numeric += 1;
            self.sum += n;
            self.min = Some(self.min.map_or(n, |m| m.min(n)));
            self.max = Some(self.max.map_or(n, |m| m.max(n)));
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn compute(&self, func: BuiltinAggregate) -> CellValue {
        match func {
            BuiltinAggregate::Sum => CellValue::Number(self.sum),
            BuiltinAggregate::Count => CellValue::Number(self.count as f64),
            BuiltinAggregate::Avg => {
                if self.numeric > 0 {
                    CellValue::Number(self.sum / self.numeric as f64)
                } else {
                    CellValue::Null
                }
            }
            BuiltinAggregate::Min => self.min.map_or(CellValue::Null, CellValue::Number),
            BuiltinAggregate::Max => self.max.map_or(CellValue::Null, CellValue::Number),
            BuiltinAggregate::First => self.first.clone().unwrap_or_default(),
            BuiltinAggregate::Last => self.last.clone().unwrap_or_default(),
        }
    }
}

/// Evaluate every spec over the records at `positions`.
pub fn aggregate(records: &[Rc<Record>], positions: &[usize], specs: &[AggregateSpec]) -> Aggregates {
    let mut out = Aggregates::new();
    for spec in specs {
        let values = positions
            .iter()
            .filter_map(|&pos| records.get(pos))
            .map(|record| record.get(&spec.column));
        let result = match &spec.func {
            AggregateFn::Builtin(func) => {
                let mut acc = Accumulator::default();
                for value in values {
                    acc.add(value);
                }
                acc.compute(*func)
            }
            AggregateFn::Custom(reducer) => {
                let raw: Vec<Option<&CellValue>> = values.collect();
                reducer(&raw)
            }
        };
        out.insert(spec.key.clone(), result);
    }
    out
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
    use test_case::test_case;

    fn records() -> Vec<Rc<Record>> {
        vec![
            Rc::new(Record::new().set("v", 4.0)),
            Rc::new(Record::new().set("v", "n/a")),
            Rc::new(Record::new()),
            Rc::new(Record::new().set("v", 10.0)),
            Rc::new(Record::new().set("v", -2.0)),
        ]
    }

    #[test_case(BuiltinAggregate::Sum, CellValue::Number(12.0); "sum skips non-numeric")]
    #[test_case(BuiltinAggregate::Avg, CellValue::Number(4.0); "avg over numeric only")]
    #[test_case(BuiltinAggregate::Count, CellValue::Number(5.0); "count counts every record")]
    #[test_case(BuiltinAggregate::Min, CellValue::Number(-2.0); "min")]
    #[test_case(BuiltinAggregate::Max, CellValue::Number(10.0); "max")]
    #[test_case(BuiltinAggregate::First, CellValue::Number(4.0); "first")]
    #[test_case(BuiltinAggregate::Last, CellValue::Number(-2.0); "last")]
    fn builtin(func: BuiltinAggregate, expected: CellValue) {
        let recs = records();
        let out = aggregate(&recs, &[0, 1, 2, 3, 4], &[AggregateSpec::new("r", "v", func)]);
        assert_eq!(out["r"], expected);
    }

    #[test]
    fn empty_numeric_set() {
        let recs = records();
        let specs = [
            AggregateSpec::new("sum", "v", BuiltinAggregate::Sum),
            AggregateSpec::new("avg", "v", BuiltinAggregate::Avg),
            AggregateSpec::new("min", "v", BuiltinAggregate::Min),
            AggregateSpec::new("count", "v", BuiltinAggregate::Count),
        ];
        let out = aggregate(&recs, &[1, 2], &specs);
        assert_eq!(out["sum"], CellValue::Number(0.0));
        assert_eq!(out["avg"], CellValue::Null);
        assert_eq!(out["min"], CellValue::Null);
        assert_eq!(out["count"], CellValue::Number(2.0));
    }

    #[test]
    fn custom_reducer_sees_raw_values() {
        let recs = records();
        let spec = AggregateSpec::custom("defined", "v", |values| {
            let defined = values.iter().filter(|v| v.is_some()).count();
            CellValue::Number(defined as f64)
        });
        let out = aggregate(&recs, &[0, 1, 2, 3, 4], &[spec]);
        assert_eq!(out["defined"], CellValue::Number(4.0));
    }

    #[test]
    fn aggregate_def_from_json() {
        let def: AggregateDef =
            serde_json::from_str(r#"{"key":"total","column":"amount","func":"sum"}"#).unwrap();
        let spec: AggregateSpec = def.into();
        assert_eq!(spec.key, "total");
        assert!(matches!(spec.func, AggregateFn::Builtin(BuiltinAggregate::Sum)));
    }
}

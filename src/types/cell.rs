use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// A single cell value as handed over by the data source.
///
/// An absent key in a [`Record`] is the "undefined" value; `Null` is an
/// explicit null and is a distinct group value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    /// Structured value (JSON array)
    List(Vec<CellValue>),
}

impl CellValue {
    /// Numeric view of the value. No coercion: text holding digits is not a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) if !n.is_nan() => Some(*n),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i64> for CellValue {
    #[allow(clippy::cast_precision_loss)]
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Text(s) => f.write_str(s),
            CellValue::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

/// Stable identity of a data row.
///
/// Records that carry their own id use it; the rest fall back to their
/// position in the dataset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowId {
    Key(Rc<str>),
    Index(usize),
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowId::Key(k) => f.write_str(k),
            RowId::Index(i) => write!(f, "#{i}"),
        }
    }
}

/// One record of the external dataset: column key -> value.
///
/// The engine never mutates records; edits are tracked separately as dirty state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Rc<str>>,
    #[serde(default)]
    pub values: HashMap<String, CellValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(id: &str) -> Self {
        Self {
            id: Some(Rc::from(id)),
            values: HashMap::new(),
        }
    }

    /// Builder-style setter, mostly for fixtures.
    #[must_use]
    pub fn set(mut self, key: &str, value: impl Into<CellValue>) -> Self {
        self.values.insert(key.to_string(), value.into());
        self
    }

    /// Value under `key`; `None` means undefined.
    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.values.get(key)
    }

    /// Row identity, falling back to the record's position.
    pub fn row_id(&self, data_index: usize) -> RowId {
        match &self.id {
            Some(id) => RowId::Key(Rc::clone(id)),
            None => RowId::Index(data_index),
        }
    }
}

/// Edit state of a record relative to the last load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirtyState {
    #[default]
    Pristine,
    Added,
    Modified,
    Deleted,
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

    #[test]
    fn numbers_only_from_number_variant() {
        assert_eq!(CellValue::Number(2.5).as_f64(), Some(2.5));
        assert_eq!(CellValue::Text("2.5".into()).as_f64(), None);
        assert_eq!(CellValue::Bool(true).as_f64(), None);
        assert_eq!(CellValue::Number(f64::NAN).as_f64(), None);
    }

    #[test]
    fn record_deserializes_from_json() {
        let rec: Record =
            serde_json::from_str(r#"{"id":"r1","values":{"name":"Ann","age":31,"tags":["a",null]}}"#)
                .unwrap();
        assert_eq!(rec.row_id(7), RowId::Key(Rc::from("r1")));
        assert_eq!(rec.get("name"), Some(&CellValue::Text("Ann".into())));
        assert_eq!(rec.get("age"), Some(&CellValue::Number(31.0)));
        assert_eq!(
            rec.get("tags"),
            Some(&CellValue::List(vec![
                CellValue::Text("a".into()),
                CellValue::Null
            ]))
        );
        assert_eq!(rec.get("missing"), None);
    }

    #[test]
    fn row_id_falls_back_to_position() {
        assert_eq!(Record::new().row_id(4), RowId::Index(4));
    }

    #[test]
    fn display_formats_lists() {
        let v = CellValue::List(vec![1.0.into(), "x".into(), CellValue::Null]);
        assert_eq!(v.to_string(), "1, x, ");
    }
}

//! Hashable group values and path-derived group ids.

use std::rc::Rc;

use crate::types::{CellValue, GroupId, PathSegment};

/// Value identity used to partition records.
///
/// No coercion across types: `1`, `"1"` and `true` land in different groups.
/// All NaNs are one group and `-0.0` groups with `0.0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
    /// Column absent from the record
    Undefined,
    Null,
    Bool(bool),
    Number(u64),
    Text(String),
    /// Lists compare by their serialized form
    List(String),
}

const CANONICAL_NAN: u64 = 0x7ff8_0000_0000_0000;

impl GroupKey {
    pub fn from_value(value: Option<&CellValue>) -> Self {
        match value {
            None => GroupKey::Undefined,
            Some(CellValue::Null) => GroupKey::Null,
            Some(CellValue::Bool(b)) => GroupKey::Bool(*b),
            Some(CellValue::Number(n)) => GroupKey::Number(number_bits(*n)),
            Some(CellValue::Text(s)) => GroupKey::Text(s.clone()),
            Some(list @ CellValue::List(_)) => GroupKey::List(list_token(list)),
        }
    }

    /// Id fragment; type-tagged so values of different types never collide.
    fn token(&self) -> String {
        match self {
            GroupKey::Undefined => "~".to_string(),
            GroupKey::Null => "null".to_string(),
            GroupKey::Bool(b) => format!("b:{b}"),
            GroupKey::Number(bits) => format!("n:{}", f64::from_bits(*bits)),
            GroupKey::Text(s) => format!("s:{}", escape(s)),
            GroupKey::List(s) => format!("l:{}", escape(s)),
        }
    }
}

fn number_bits(n: f64) -> u64 {
    if n.is_nan() {
        CANONICAL_NAN
    } else if n == 0.0 {
        0.0_f64.to_bits()
    } else {
        n.to_bits()
    }
}

fn list_token(value: &CellValue) -> String {
    match value {
        CellValue::List(items) => {
            let inner: Vec<String> = items.iter().map(list_token).collect();
            format!("[{}]", inner.join(","))
        }
        other => GroupKey::from_value(Some(other)).token(),
    }
}

/// Escape the id separators so user text cannot forge another path.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        if matches!(ch, '\\' | '/' | '=') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Id of the child of `parent` holding `key` under `column`.
pub fn child_group_id(parent: Option<&GroupId>, column: &str, key: &GroupKey) -> GroupId {
    let segment = format!("{}={}", escape(column), key.token());
    match parent {
        Some(parent) => GroupId::new(&format!("{}/{segment}", parent.as_str())),
        None => GroupId::new(&segment),
    }
}

pub fn path_segment(column: &Rc<str>, value: Option<&CellValue>) -> PathSegment {
    PathSegment {
        column: Rc::clone(column),
        value: value.cloned(),
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

    #[test]
    fn no_cross_type_coercion() {
        let one = GroupKey::from_value(Some(&CellValue::Number(1.0)));
        let text = GroupKey::from_value(Some(&CellValue::Text("1".into())));
        let truth = GroupKey::from_value(Some(&CellValue::Bool(true)));
        assert_ne!(one, text);
        assert_ne!(one, truth);
        assert_ne!(text, truth);
    }

    #[test]
    fn undefined_and_null_are_distinct_groups() {
        assert_ne!(
            GroupKey::from_value(None),
            GroupKey::from_value(Some(&CellValue::Null))
        );
    }

    #[test]
    fn zero_and_nan_normalize() {
        assert_eq!(
            GroupKey::from_value(Some(&CellValue::Number(-0.0))),
            GroupKey::from_value(Some(&CellValue::Number(0.0)))
        );
        assert_eq!(
            GroupKey::from_value(Some(&CellValue::Number(f64::NAN))),
            GroupKey::from_value(Some(&CellValue::Number(-f64::NAN)))
        );
    }

    #[test]
    fn ids_escape_separators() {
        let a = child_group_id(None, "a", &GroupKey::Text("x/b=y".into()));
        let b = child_group_id(
            Some(&child_group_id(None, "a", &GroupKey::Text("x".into()))),
            "b",
            &GroupKey::Text("y".into()),
        );
        assert_ne!(a, b);
        assert_eq!(b.as_str(), "a=s:x/b=s:y");
    }
}

//! Row types and the restartable row source used by training.
//!
//! Rows are loose field-name → value maps; the set of fields may differ from
//! one row to the next. Training re-scans its source many times (once per
//! objective evaluation, statistics scan, polish and diagnostics), so a
//! `RowSource` hands out a fresh iterator on every call.
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

/// A single field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Num(f64),
    Cat(String),
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Num(v) => Some(*v),
            Value::Cat(s) => s.trim().parse::<f64>().ok(),
        }
    }

    /// The level name this value contributes when its field is categorical.
    pub fn as_level(&self) -> Cow<'_, str> {
        match self {
            Value::Num(v) => Cow::Owned(format_level(*v)),
            Value::Cat(s) => Cow::Borrowed(s.as_str()),
        }
    }

    pub fn is_categorical(&self) -> bool {
        matches!(self, Value::Cat(_))
    }

    /// Parse a raw text cell: numbers become `Num`, anything else `Cat`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Value::Num(v),
            _ => Value::Cat(raw.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Num(v) => write!(f, "{}", v),
            Value::Cat(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Num(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Cat(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Cat(value)
    }
}

fn format_level(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}

pub type Row = HashMap<String, Value>;

/// Build a row from `(field, value)` pairs.
pub fn row<K, V, I>(fields: I) -> Row
where
    K: Into<String>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    fields
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// A finite, restartable sequence of rows.
pub trait RowSource {
    /// Start a new pass over every row.
    fn rows(&self) -> Box<dyn Iterator<Item = Cow<'_, Row>> + '_>;

    fn count_rows(&self) -> usize {
        self.rows().count()
    }
}

impl RowSource for [Row] {
    fn rows(&self) -> Box<dyn Iterator<Item = Cow<'_, Row>> + '_> {
        Box::new(self.iter().map(Cow::Borrowed))
    }

    fn count_rows(&self) -> usize {
        self.len()
    }
}

impl RowSource for Vec<Row> {
    fn rows(&self) -> Box<dyn Iterator<Item = Cow<'_, Row>> + '_> {
        self.as_slice().rows()
    }

    fn count_rows(&self) -> usize {
        self.len()
    }
}

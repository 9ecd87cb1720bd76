//! Dynamic values carried by override maps and nested material specifications.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A string-keyed map of [`Value`]s. Used for override maps, group sub-maps,
/// nested material specifications and the `custom` property map.
pub type Table = BTreeMap<String, Value>;

/// A dynamically typed value, deserializable from any self-describing format
/// (TOML, RON, JSON).
///
/// [`Value::Unset`] is the explicit "not set" marker (JSON `null`). Override
/// entries holding it are skipped, so a child can never zero out an inherited
/// value by accident.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Unset,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    Table(Table),
}

/// Errors converting a [`Value`] into a typed property field.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
    /// The value has the wrong type for the field.
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        /// Expected type name.
        expected: &'static str,
        /// Actual type name.
        found: &'static str,
    },

    /// A fixed-length tuple (e.g. an RGBA color) has the wrong number of components.
    #[error("expected {expected} components, found {found}")]
    Length {
        /// Required component count.
        expected: usize,
        /// Supplied component count.
        found: usize,
    },

    /// A number lies outside the field's legal range.
    #[error("{value} is outside {min}..={max}")]
    OutOfRange {
        /// Supplied value.
        value: f64,
        /// Inclusive minimum.
        min: f64,
        /// Inclusive maximum.
        max: f64,
    },

    /// A string is not one of the field's enumerated choices.
    #[error("unknown value {value:?}, expected one of {allowed:?}")]
    UnknownVariant {
        /// Supplied string.
        value: String,
        /// Accepted spellings.
        allowed: &'static [&'static str],
    },
}

impl Value {
    /// Short type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Unset => "unset",
            Value::Bool(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Table(_) => "table",
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Value::Unset)
    }

    /// Numeric view: integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Value::Table(table) => Some(table),
            _ => None,
        }
    }

    /// Consumes the value, returning the table if it is one.
    pub fn into_table(self) -> Result<Table, Value> {
        match self {
            Value::Table(table) => Ok(table),
            other => Err(other),
        }
    }

    pub(crate) fn expect_f64(&self) -> Result<f64, ValueError> {
        self.as_f64().ok_or(ValueError::TypeMismatch {
            expected: "number",
            found: self.type_name(),
        })
    }

    pub(crate) fn expect_bool(&self) -> Result<bool, ValueError> {
        self.as_bool().ok_or(ValueError::TypeMismatch {
            expected: "boolean",
            found: self.type_name(),
        })
    }

    pub(crate) fn expect_str(&self) -> Result<&str, ValueError> {
        self.as_str().ok_or(ValueError::TypeMismatch {
            expected: "string",
            found: self.type_name(),
        })
    }

    pub(crate) fn expect_array(&self) -> Result<&[Value], ValueError> {
        self.as_array().ok_or(ValueError::TypeMismatch {
            expected: "array",
            found: self.type_name(),
        })
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unset => f.write_str("unset"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Table(table) => {
                f.write_str("{")?;
                for (i, (k, v)) in table.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k} = {v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<Table> for Value {
    fn from(table: Table) -> Self {
        Value::Table(table)
    }
}

impl<const N: usize> From<[f64; N]> for Value {
    fn from(items: [f64; N]) -> Self {
        Value::Array(items.into_iter().map(Value::Float).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Unset, Into::into)
    }
}

//! Dynamically-typed column values
//!
//! `SqlValue` is the loosely-typed substrate every value store and bound
//! argument list is built on. Exactly six scalar kinds plus null are
//! representable.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::ValueKind;

/// A single column value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum SqlValue {
    /// Explicit null
    Null,
    /// 32-bit signed integer
    Integer(i32),
    /// 64-bit signed integer
    Long(i64),
    /// 64-bit float
    Double(f64),
    /// UTF-8 text
    Text(String),
    /// Boolean
    Boolean(bool),
    /// Binary blob
    Blob(Vec<u8>),
}

impl SqlValue {
    /// Check if this value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The kind of this value, or `None` for null
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            Self::Null => None,
            Self::Integer(_) => Some(ValueKind::Integer),
            Self::Long(_) => Some(ValueKind::Long),
            Self::Double(_) => Some(ValueKind::Double),
            Self::Text(_) => Some(ValueKind::Text),
            Self::Boolean(_) => Some(ValueKind::Boolean),
            Self::Blob(_) => Some(ValueKind::Blob),
        }
    }

    /// Try to get as Integer
    pub fn as_integer(&self) -> Option<i32> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get as Long
    pub fn as_long(&self) -> Option<i64> {
        match self {
            Self::Long(l) => Some(*l),
            _ => None,
        }
    }

    /// Try to get as Double
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Self::Double(d) => Some(*d),
            _ => None,
        }
    }

    /// Try to get as Text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as Boolean
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get as Blob
    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            Self::Blob(b) => Some(b),
            _ => None,
        }
    }

    /// Canonical text form used when a value is cast to a text column.
    ///
    /// Returns `None` for null.
    pub fn to_canonical_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Integer(i) => Some(i.to_string()),
            Self::Long(l) => Some(l.to_string()),
            Self::Double(d) => Some(format_double(*d)),
            Self::Text(s) => Some(s.clone()),
            Self::Boolean(b) => Some(b.to_string()),
            Self::Blob(b) => Some(hex(b)),
        }
    }

    /// Create a text value
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Create a blob value
    pub fn blob(value: impl Into<Vec<u8>>) -> Self {
        Self::Blob(value.into())
    }
}

/// Render a double so that integral values keep a fractional part (`1.0`, not `1`)
pub fn format_double(value: f64) -> String {
    format!("{:?}", value)
}

/// Lowercase hex rendering of a byte slice
pub fn hex(bytes: &[u8]) -> String {
    use std::fmt::Write;

    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        // Writing to a String cannot fail
        let _ = write!(out, "{:02x}", b);
    }
    out
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Long(l) => write!(f, "{}L", l),
            Self::Double(d) => write!(f, "{}", format_double(*d)),
            Self::Text(s) => write!(f, "'{}'", s),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Blob(b) => write!(f, "X'{}'", hex(b)),
        }
    }
}

impl PartialEq for SqlValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Long(a), Self::Long(b)) => a == b,
            // IEEE equality: NaN never equals itself, 0.0 equals -0.0
            (Self::Double(a), Self::Double(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Blob(a), Self::Blob(b)) => a == b,
            _ => false,
        }
    }
}

impl Hash for SqlValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Null => {}
            Self::Integer(i) => i.hash(state),
            Self::Long(l) => l.hash(state),
            Self::Double(d) => {
                // 0.0 and -0.0 compare equal so they must hash equal
                let normalized = if *d == 0.0 { 0.0f64 } else { *d };
                normalized.to_bits().hash(state)
            }
            Self::Text(s) => s.hash(state),
            Self::Boolean(b) => b.hash(state),
            Self::Blob(b) => b.hash(state),
        }
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        Self::Integer(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        Self::Long(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Blob(value)
    }
}

impl From<&[u8]> for SqlValue {
    fn from(value: &[u8]) -> Self {
        Self::Blob(value.to_vec())
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

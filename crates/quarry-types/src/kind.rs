//! Column value kinds

use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of scalar kinds a column can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    /// 32-bit signed integer
    Integer,
    /// 64-bit signed integer
    Long,
    /// 64-bit floating point
    Double,
    /// UTF-8 text
    Text,
    /// Boolean, stored by SQLite as 0/1
    Boolean,
    /// Binary blob
    Blob,
}

impl ValueKind {
    /// All kinds, in declaration order
    pub const ALL: [ValueKind; 6] = [
        Self::Integer,
        Self::Long,
        Self::Double,
        Self::Text,
        Self::Boolean,
        Self::Blob,
    ];

    /// Get the simple name
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Integer => "Integer",
            Self::Long => "Long",
            Self::Double => "Double",
            Self::Text => "Text",
            Self::Boolean => "Boolean",
            Self::Blob => "Blob",
        }
    }

    /// SQLite storage class used for columns of this kind
    pub const fn sql_type(&self) -> &'static str {
        match self {
            Self::Integer | Self::Long | Self::Boolean => "INTEGER",
            Self::Double => "REAL",
            Self::Text => "TEXT",
            Self::Blob => "BLOB",
        }
    }

    /// Check if this kind is numeric
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Long | Self::Double)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

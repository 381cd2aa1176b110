//! Error codes shared by the Quarry crates
//!
//! Error code ranges:
//! - QRY0001-QRY0099: Coercion errors (casting values to a column kind)
//! - QRY0100-QRY0199: Model errors (value resolution)
//! - QRY0200-QRY0299: Compilation errors (SQL generation)
//! - QRY0300-QRY0399: Configuration errors

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Stable identifier of a failure, displayed as `QRY0001`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorCode(u16);

/// Subsystem an error code belongs to, derived from its numeric range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Coercion,
    Model,
    Compilation,
    Configuration,
    Unknown,
}

impl ErrorCode {
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    pub const fn code(&self) -> u16 {
        self.0
    }

    pub const fn category(&self) -> ErrorCategory {
        match self.0 {
            1..=99 => ErrorCategory::Coercion,
            100..=199 => ErrorCategory::Model,
            200..=299 => ErrorCategory::Compilation,
            300..=399 => ErrorCategory::Configuration,
            _ => ErrorCategory::Unknown,
        }
    }

    /// Registered description and help text; unregistered codes share a
    /// generic entry
    pub fn info(&self) -> &'static ErrorInfo {
        REGISTRY.get(self).unwrap_or(&UNREGISTERED)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QRY{:04}", self.0)
    }
}

/// Registered text for an error code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub description: &'static str,
    pub help: Option<&'static str>,
}

const fn described(description: &'static str) -> ErrorInfo {
    ErrorInfo {
        description,
        help: None,
    }
}

const fn helped(description: &'static str, help: &'static str) -> ErrorInfo {
    ErrorInfo {
        description,
        help: Some(help),
    }
}

static UNREGISTERED: ErrorInfo = described("Unregistered error code");

static REGISTRY: LazyLock<HashMap<ErrorCode, ErrorInfo>> = LazyLock::new(|| {
    HashMap::from([
        (QRY0001, described("Value cannot be cast to the column kind")),
        (
            QRY0002,
            helped(
                "Text is not a valid number",
                "Numeric columns accept text only when it parses as the column's numeric kind",
            ),
        ),
        (
            QRY0100,
            helped(
                "Value not found in model",
                "Set the value explicitly, read it from a row source, or give the column a default",
            ),
        ),
        (QRY0200, described("Compilation failed")),
        (
            QRY0201,
            helped(
                "Unsafe SQL fragment",
                "Raw fragments compiled for validation may not contain statement separators, comments or unbalanced delimiters",
            ),
        ),
        (QRY0202, described("Invalid literal")),
        (QRY0203, described("Incomplete statement")),
        (QRY0204, described("Column and value count mismatch")),
        (QRY0205, described("Invalid identifier")),
        (QRY0300, described("Invalid version code")),
        (QRY0301, described("Invalid compile options")),
    ])
});

// Coercion errors
pub const QRY0001: ErrorCode = ErrorCode::new(1);
pub const QRY0002: ErrorCode = ErrorCode::new(2);

// Model errors
pub const QRY0100: ErrorCode = ErrorCode::new(100);

// Compilation errors
pub const QRY0200: ErrorCode = ErrorCode::new(200);
pub const QRY0201: ErrorCode = ErrorCode::new(201);
pub const QRY0202: ErrorCode = ErrorCode::new(202);
pub const QRY0203: ErrorCode = ErrorCode::new(203);
pub const QRY0204: ErrorCode = ErrorCode::new(204);
pub const QRY0205: ErrorCode = ErrorCode::new(205);

// Configuration errors
pub const QRY0300: ErrorCode = ErrorCode::new(300);
pub const QRY0301: ErrorCode = ErrorCode::new(301);

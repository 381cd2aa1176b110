//! Compilation errors

use quarry_diagnostics::{
    ErrorCode, QRY0201, QRY0202, QRY0203, QRY0204, QRY0205, QRY0300, QRY0301, QuarryError,
};
use thiserror::Error;

/// Result type for compilation
pub type CompileResult<T> = Result<T, CompileError>;

/// Errors raised while compiling a node tree to SQL.
///
/// These signal misuse of the node API (an incomplete statement, mismatched
/// counts) or a fragment rejected under validation; none of them is
/// recoverable by retrying.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    /// A raw fragment could alter the structure of the statement
    #[error("Unsafe SQL fragment ({reason}): {fragment}")]
    UnsafeFragment {
        fragment: String,
        reason: &'static str,
    },

    /// A literal cannot be rendered safely
    #[error("Invalid literal: {message}")]
    InvalidLiteral { message: String },

    /// A statement is missing a required clause
    #[error("Incomplete {statement} statement: {message}")]
    Incomplete {
        statement: &'static str,
        message: String,
    },

    /// Number of values does not line up with the number of columns or placeholders
    #[error("{context}: expected {expected} values, found {found}")]
    CountMismatch {
        context: &'static str,
        expected: usize,
        found: usize,
    },

    /// An identifier is not a plain SQL name
    #[error("Invalid identifier: {name}")]
    InvalidIdentifier { name: String },
}

impl CompileError {
    pub fn unsafe_fragment(fragment: impl Into<String>, reason: &'static str) -> Self {
        Self::UnsafeFragment {
            fragment: fragment.into(),
            reason,
        }
    }

    pub fn incomplete(statement: &'static str, message: impl Into<String>) -> Self {
        Self::Incomplete {
            statement,
            message: message.into(),
        }
    }

    /// Error code for this failure
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::UnsafeFragment { .. } => QRY0201,
            Self::InvalidLiteral { .. } => QRY0202,
            Self::Incomplete { .. } => QRY0203,
            Self::CountMismatch { .. } => QRY0204,
            Self::InvalidIdentifier { .. } => QRY0205,
        }
    }
}

impl From<CompileError> for QuarryError {
    fn from(err: CompileError) -> Self {
        let context = match &err {
            CompileError::UnsafeFragment { fragment, .. } => Some(fragment.clone()),
            CompileError::InvalidIdentifier { name } => Some(name.clone()),
            _ => None,
        };
        let converted = QuarryError::compilation(err.code(), err.to_string());
        match context {
            Some(context) => converted.with_context(context),
            None => converted,
        }
    }
}

/// Configuration could not be loaded
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A dialect version string did not parse
    #[error("Invalid version code '{0}'")]
    InvalidVersion(String),

    /// Compile options JSON was malformed
    #[error("Invalid compile options: {0}")]
    InvalidOptions(String),
}

impl ConfigError {
    /// Error code for this failure
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidVersion(_) => QRY0300,
            Self::InvalidOptions(_) => QRY0301,
        }
    }
}

impl From<ConfigError> for QuarryError {
    fn from(err: ConfigError) -> Self {
        QuarryError::configuration(err.code(), err.to_string())
    }
}

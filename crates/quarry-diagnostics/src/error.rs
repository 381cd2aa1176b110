//! Quarry error types

use crate::ErrorCode;
use thiserror::Error;

/// Main Quarry error type
///
/// Each crate reports its own typed error (`CoercionError`, `ModelError`,
/// `CompileError`) and converts into this enum at API boundaries that mix
/// subsystems.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuarryError {
    /// A value could not be cast to a column's declared kind
    #[error("{code}: {message}")]
    Coercion {
        code: ErrorCode,
        message: String,
        /// Rendered form of the offending value
        value: String,
        /// Name of the kind the value was cast to
        target: String,
    },

    /// Model value resolution error
    #[error("{code}: {message}")]
    Model {
        code: ErrorCode,
        message: String,
        key: Option<String>,
    },

    /// SQL compilation error
    #[error("{code}: {message}")]
    Compilation {
        code: ErrorCode,
        message: String,
        context: Option<String>,
    },

    /// Configuration error
    #[error("{code}: {message}")]
    Configuration { code: ErrorCode, message: String },
}

impl QuarryError {
    /// Create a coercion error
    pub fn coercion(
        code: ErrorCode,
        message: impl Into<String>,
        value: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self::Coercion {
            code,
            message: message.into(),
            value: value.into(),
            target: target.into(),
        }
    }

    /// Create a model error
    pub fn model(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Model {
            code,
            message: message.into(),
            key: None,
        }
    }

    /// Create a compilation error
    pub fn compilation(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Compilation {
            code,
            message: message.into(),
            context: None,
        }
    }

    /// Create a configuration error
    pub fn configuration(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Configuration {
            code,
            message: message.into(),
        }
    }

    /// Attach the storage key a model error refers to
    pub fn with_key(mut self, new_key: impl Into<String>) -> Self {
        if let Self::Model { key, .. } = &mut self {
            *key = Some(new_key.into());
        }
        self
    }

    /// Attach context (usually the offending SQL fragment) to a compilation error
    pub fn with_context(mut self, new_context: impl Into<String>) -> Self {
        if let Self::Compilation { context, .. } = &mut self {
            *context = Some(new_context.into());
        }
        self
    }

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Coercion { code, .. } => *code,
            Self::Model { code, .. } => *code,
            Self::Compilation { code, .. } => *code,
            Self::Configuration { code, .. } => *code,
        }
    }

    /// Help text registered for this error's code, if any
    pub fn help(&self) -> Option<&'static str> {
        self.code().info().help
    }
}

//! Model errors

use quarry_diagnostics::{ErrorCode, QRY0100, QuarryError};
use quarry_types::CoercionError;
use thiserror::Error;

/// Result type for model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while reading or writing model values
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// A value could not be cast to its column's kind
    #[error(transparent)]
    Coercion(#[from] CoercionError),

    /// No store holds a value for the requested column
    #[error("Model {model} has no value for '{key}'")]
    ValueNotFound { model: String, key: String },
}

impl ModelError {
    /// Error code for this failure
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Coercion(err) => err.code(),
            Self::ValueNotFound { .. } => QRY0100,
        }
    }
}

impl From<ModelError> for QuarryError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Coercion(err) => err.into(),
            ModelError::ValueNotFound { ref key, .. } => {
                QuarryError::model(QRY0100, err.to_string()).with_key(key.clone())
            }
        }
    }
}

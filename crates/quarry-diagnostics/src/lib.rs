//! Quarry diagnostics and error handling
//!
//! This crate provides the error handling infrastructure shared by the Quarry
//! crates: stable error codes and the umbrella error type every per-crate
//! error converts into.

mod error;
mod error_code;

pub use error::*;
pub use error_code::*;

/// Result type for Quarry operations
pub type Result<T> = std::result::Result<T, QuarryError>;

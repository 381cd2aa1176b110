//! Quarry value types
//!
//! This crate defines the loosely-typed storage substrate shared by the SQL
//! compiler and the model layer:
//! - Column kinds (Integer, Long, Double, Text, Boolean, Blob)
//! - Dynamically-typed values and ordered value stores
//! - Coercion rules that cast values to a column's declared kind

pub mod coercion;
pub mod kind;
pub mod storage;
pub mod value;

pub use coercion::*;
pub use kind::*;
pub use storage::*;
pub use value::*;

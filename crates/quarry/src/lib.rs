//! Typed SQL compiler and layered row-value resolver for SQLite
//!
//! This crate re-exports the Quarry crates:
//! - [`types`]: column kinds, values, value stores and coercion rules
//! - [`sql`]: SQL nodes and their compilation into text and bound arguments
//! - [`model`]: rows resolving column values from layered stores
//! - [`diagnostics`]: error codes and the umbrella [`QuarryError`]
//!
//! # Example
//!
//! ```
//! use quarry::prelude::*;
//!
//! let spec = ModelSpec::builder("Person", "people")
//!     .column(ValueKind::Text, "name")
//!     .column_with_default(ValueKind::Integer, "lucky_number", 7)
//!     .build()?;
//! let name = spec.property("name").unwrap().clone();
//!
//! let mut person = spec.instantiate();
//! person.set(&name, "Ada")?;
//!
//! let insert = Insert::from_values(spec.table(), person.set_values().unwrap());
//! let compiled = insert.compile(VersionCode::LATEST)?;
//! assert_eq!(compiled.sql, "INSERT INTO people (name) VALUES (?)");
//! # Ok::<(), quarry::QuarryError>(())
//! ```

pub use quarry_diagnostics as diagnostics;
pub use quarry_model as model;
pub use quarry_sql as sql;
pub use quarry_types as types;

pub use quarry_diagnostics::{ErrorCode, QuarryError, Result};

/// Commonly used types
pub mod prelude {
    pub use quarry_diagnostics::{QuarryError, Result};
    pub use quarry_model::{Model, ModelSpec, Row, RowSource};
    pub use quarry_sql::{
        Compilable, CompileOptions, CompiledStatement, Criterion, Delete, Function, Insert,
        Property, Query, Table, Update, VersionCode,
    };
    pub use quarry_types::{SqlValue, ValueKind, ValuesStorage};
}

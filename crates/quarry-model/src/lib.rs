//! Quarry models
//!
//! A [`Model`] is one row of a row type described by a [`ModelSpec`]. Reading
//! a column value consults, in order:
//!
//! 1. values set by the caller since the last save
//! 2. values read from the database
//! 3. the row type's defaults, shared by every instance
//!
//! Columns belonging to other tables (joined or aliased columns) are kept in a
//! separate store without fallback. Every value is cast to the column's
//! declared kind by [`ValueCastingVisitor`] when stored and when read.
//!
//! # Example
//!
//! ```
//! use quarry_model::ModelSpec;
//! use quarry_types::{SqlValue, ValueKind};
//!
//! let spec = ModelSpec::builder("Person", "people")
//!     .column(ValueKind::Text, "name")
//!     .column_with_default(ValueKind::Integer, "lucky_number", 7)
//!     .build()
//!     .unwrap();
//! let lucky = spec.property("lucky_number").unwrap().clone();
//!
//! let mut person = spec.instantiate();
//! assert_eq!(person.get(&lucky).unwrap(), SqlValue::Integer(7));
//!
//! person.set(&lucky, "3").unwrap();
//! assert_eq!(person.get_as::<i32>(&lucky).unwrap(), 3);
//! assert!(person.is_modified());
//! ```

pub mod error;
pub mod model;
pub mod source;
pub mod spec;
pub mod visitor;

pub use error::{ModelError, ModelResult};
pub use model::{Model, TransitoryValue};
pub use source::{Row, RowSource};
pub use spec::{ModelSpec, ModelSpecBuilder};
pub use visitor::{ValueCastingVisitor, ValuesStorageSavingVisitor};

//! Quarry SQL compiler
//!
//! This crate turns trees of typed SQL nodes into SQL text for SQLite. A
//! compilation produces either:
//!
//! - **Raw SQL**: every value rendered inline as a sanitized literal, used for
//!   logging and debugging
//! - **Compiled statements**: SQL with `?` placeholders plus the ordered list
//!   of arguments bound to them, used for execution
//!
//! # Example
//!
//! ```
//! use quarry_sql::{Compilable, Query, Table, VersionCode};
//!
//! let people = Table::new("Person", "people");
//! let age = people.integer("age");
//! let query = Query::select([people.text("name")])
//!     .from(&people)
//!     .where_clause(age.gte(18));
//!
//! let compiled = query.compile(VersionCode::LATEST).unwrap();
//! assert_eq!(compiled.sql, "SELECT people.name FROM people WHERE people.age >= ?");
//! assert_eq!(compiled.args.len(), 1);
//! ```
//!
//! # Architecture
//!
//! - [`SqlBuilder`]: per-compilation accumulator of text, arguments and flags
//! - [`Compilable`]: the contract every node implements
//! - Nodes: [`Property`], [`Criterion`], [`Function`], [`Query`], [`Insert`],
//!   [`Update`], [`Delete`]
//!
//! Collections bind as a single `?[]` argument; [`CompiledStatement::flatten`]
//! expands them into plain positional placeholders.

pub mod builder;
pub mod compilable;
pub mod criterion;
pub mod error;
pub mod field;
pub mod function;
pub mod operand;
pub mod order;
pub mod query;
pub mod sql_utils;
pub mod statement;
pub mod table;
pub mod version;

pub use builder::{ARRAY_PLACEHOLDER, BoundArg, CompileFlags, EMPTY_LIST, PLACEHOLDER, SqlBuilder};
pub use compilable::{Compilable, CompileOptions, CompiledStatement};
pub use criterion::{ComparisonOp, Criterion, LogicalOp};
pub use error::{CompileError, CompileResult, ConfigError};
pub use field::{Field, Property, PropertyVisitor, TableModelName};
pub use function::{ArithmeticOp, Function};
pub use operand::Operand;
pub use order::{Direction, NullsOrder, Order};
pub use query::{CompoundOp, Join, JoinKind, Query, SelectItem, Source};
pub use statement::{ConflictAlgorithm, Delete, Insert, Update};
pub use table::Table;
pub use version::VersionCode;

//! The compile contract shared by every node

use quarry_types::SqlValue;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::builder::{ARRAY_PLACEHOLDER, EMPTY_LIST, PLACEHOLDER};
use crate::sql_utils::for_each_placeholder;
use crate::{BoundArg, CompileFlags, CompileResult, ConfigError, SqlBuilder, VersionCode};

/// A node that renders itself into a [`SqlBuilder`].
///
/// Implementors only provide [`append_to_sql_builder`](Self::append_to_sql_builder);
/// the entry points below create a builder, compile into it and package the
/// result.
pub trait Compilable: fmt::Debug + Send + Sync {
    /// Append this node's SQL to `builder`.
    ///
    /// `for_validation` requests the extra parentheses used when the SQL is
    /// compiled only to be checked.
    fn append_to_sql_builder(
        &self,
        builder: &mut SqlBuilder,
        for_validation: bool,
    ) -> CompileResult<()>;

    /// Whether this node is a full statement, parenthesized when nested
    fn is_statement(&self) -> bool {
        false
    }

    /// Flags a compilation of this node starts with
    fn default_flags(&self) -> CompileFlags {
        CompileFlags::NONE
    }

    /// Compile into a fresh builder
    fn build_sql(
        &self,
        version: VersionCode,
        with_arguments: bool,
        for_validation: bool,
        flags: CompileFlags,
    ) -> CompileResult<SqlBuilder> {
        log::trace!(
            "compiling {} (version {}, arguments: {}, flags: {:#04b})",
            if self.is_statement() { "statement" } else { "expression" },
            version,
            with_arguments,
            flags.bits()
        );
        let mut builder = SqlBuilder::new(version, with_arguments);
        builder.set_flag(flags);
        self.append_to_sql_builder(&mut builder, for_validation)?;
        Ok(builder)
    }

    /// SQL text with every value rendered as a literal
    fn to_raw_sql(&self, version: VersionCode) -> CompileResult<String> {
        self.to_raw_sql_with_flags(version, self.default_flags())
    }

    fn to_raw_sql_with_flags(
        &self,
        version: VersionCode,
        flags: CompileFlags,
    ) -> CompileResult<String> {
        let (sql, _, _) = self.build_sql(version, false, false, flags)?.into_parts();
        Ok(sql)
    }

    /// SQL text with placeholders plus the arguments bound to them
    fn compile(&self, version: VersionCode) -> CompileResult<CompiledStatement> {
        let builder = self.build_sql(version, true, false, self.default_flags())?;
        Ok(CompiledStatement::from_builder(builder))
    }

    /// Compile according to `options`.
    ///
    /// Without arguments the statement's SQL carries every value inline and
    /// its argument list is empty.
    fn compile_with(&self, options: &CompileOptions) -> CompileResult<CompiledStatement> {
        let builder = self.build_sql(
            options.version,
            options.with_arguments,
            false,
            self.default_flags() | options.flags,
        )?;
        Ok(CompiledStatement::from_builder(builder))
    }
}

/// Render a node through its literal SQL at the latest version
macro_rules! impl_display_as_raw_sql {
    ($($ty:ty),* $(,)?) => {
        $(
            impl std::fmt::Display for $ty {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    match $crate::Compilable::to_raw_sql(self, $crate::VersionCode::LATEST) {
                        Ok(sql) => f.write_str(&sql),
                        Err(err) => write!(f, "<{}>", err),
                    }
                }
            }
        )*
    };
}

pub(crate) use impl_display_as_raw_sql;

/// Settings for a compilation, loadable from JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompileOptions {
    pub version: VersionCode,
    pub flags: CompileFlags,
    pub with_arguments: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            version: VersionCode::LATEST,
            flags: CompileFlags::NONE,
            with_arguments: true,
        }
    }
}

impl CompileOptions {
    pub fn new(version: VersionCode) -> Self {
        Self {
            version,
            ..Self::default()
        }
    }

    /// Compile to literal SQL instead of binding arguments
    pub fn inline(mut self) -> Self {
        self.with_arguments = false;
        self
    }

    pub fn validated(mut self) -> Self {
        self.flags.insert(CompileFlags::NEEDS_VALIDATION);
        self
    }

    pub fn from_json(input: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(input).map_err(|e| ConfigError::InvalidOptions(e.to_string()))
    }
}

/// Execution-ready SQL and the arguments bound to its placeholders.
///
/// `args[i]` binds to the i-th placeholder of `sql`; a [`BoundArg::Array`]
/// sits at an `?[]` placeholder and has to be [flattened](Self::flatten)
/// before an engine can bind it.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledStatement {
    pub sql: String,
    pub args: Vec<BoundArg>,
    pub needs_validation: bool,
}

impl CompiledStatement {
    fn from_builder(builder: SqlBuilder) -> Self {
        let (sql, args, flags) = builder.into_parts();
        Self {
            sql,
            args: args.unwrap_or_default(),
            needs_validation: flags.contains(CompileFlags::NEEDS_VALIDATION),
        }
    }

    /// Number of `?` and `?[]` placeholders outside quoted text
    pub fn placeholder_count(&self) -> usize {
        let mut count = 0;
        for_each_placeholder(&self.sql, |_, _| count += 1);
        count
    }

    /// Expand every `?[]` into one `?` per element, yielding plain
    /// positional arguments.
    ///
    /// An empty collection has no placeholder form and is replaced by an
    /// empty sub-select.
    pub fn flatten(&self) -> (String, Vec<SqlValue>) {
        let mut sql = String::with_capacity(self.sql.len());
        let mut values = Vec::with_capacity(self.args.len());
        let mut args = self.args.iter();
        let mut last = 0;

        for_each_placeholder(&self.sql, |pos, is_array| {
            sql.push_str(&self.sql[last..pos]);
            last = pos + if is_array { ARRAY_PLACEHOLDER.len() } else { 1 };
            match args.next() {
                Some(BoundArg::Array(items)) if items.is_empty() => sql.push_str(EMPTY_LIST),
                Some(BoundArg::Array(items)) => {
                    let placeholders = vec![PLACEHOLDER; items.len()];
                    sql.push_str(&placeholders.join(", "));
                    values.extend(items.iter().cloned());
                }
                Some(BoundArg::Value(value)) => {
                    sql.push_str(PLACEHOLDER);
                    values.push(value.clone());
                }
                None => sql.push_str(&self.sql[pos..last]),
            }
        });
        sql.push_str(&self.sql[last..]);
        (sql, values)
    }
}

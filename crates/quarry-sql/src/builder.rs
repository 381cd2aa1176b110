//! Compilation context shared by every node of a statement

use quarry_types::SqlValue;
use serde::{Deserialize, Serialize};
use std::ops::BitOr;

use crate::sql_utils::{self, to_sanitized_string};
use crate::{Compilable, CompileResult, Operand, VersionCode};

/// Placeholder for a single bound argument
pub const PLACEHOLDER: &str = "?";

/// Placeholder for a bound collection, expanded by [`crate::CompiledStatement::flatten`]
pub const ARRAY_PLACEHOLDER: &str = "?[]";

/// Rendering of an empty collection: a sub-select yielding no rows
pub const EMPTY_LIST: &str = "SELECT NULL WHERE 0";

/// Compilation flags, carried by the builder and visible to every node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompileFlags(u8);

impl CompileFlags {
    pub const NONE: Self = Self(0);

    /// Raw fragments, identifiers and literals are checked while compiling
    pub const NEEDS_VALIDATION: Self = Self(1);

    /// Set while compiling the outermost `SELECT` of a statement
    pub const TOP_LEVEL_SELECT: Self = Self(1 << 1);

    pub const fn bits(&self) -> u8 {
        self.0
    }

    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

impl BitOr for CompileFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// An argument bound to a placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum BoundArg {
    /// Bound to `?`
    Value(SqlValue),
    /// Bound to `?[]`
    Array(Vec<SqlValue>),
}

impl BoundArg {
    /// Number of plain placeholders this argument occupies once flattened
    pub fn width(&self) -> usize {
        match self {
            Self::Value(_) => 1,
            Self::Array(values) => values.len(),
        }
    }
}

/// Accumulates SQL text and bound arguments while a node tree is compiled.
///
/// A builder is created per compilation and consumed by it. When it is
/// created without arguments every value is rendered inline as a literal;
/// otherwise scalars become `?` and collections become `?[]`.
#[derive(Debug, Clone)]
pub struct SqlBuilder {
    sql: String,
    version: VersionCode,
    args: Option<Vec<BoundArg>>,
    flags: CompileFlags,
}

impl SqlBuilder {
    pub fn new(version: VersionCode, with_arguments: bool) -> Self {
        Self {
            sql: String::with_capacity(128),
            version,
            args: with_arguments.then(Vec::new),
            flags: CompileFlags::NONE,
        }
    }

    pub fn version(&self) -> VersionCode {
        self.version
    }

    /// SQL text accumulated so far
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Bound arguments, or `None` when compiling to raw SQL
    pub fn bound_arguments(&self) -> Option<&[BoundArg]> {
        self.args.as_deref()
    }

    pub fn has_arguments(&self) -> bool {
        self.args.is_some()
    }

    pub fn into_parts(self) -> (String, Option<Vec<BoundArg>>, CompileFlags) {
        (self.sql, self.args, self.flags)
    }

    pub fn flags(&self) -> CompileFlags {
        self.flags
    }

    pub fn get_flag(&self, flag: CompileFlags) -> bool {
        self.flags.contains(flag)
    }

    pub fn set_flag(&mut self, flag: CompileFlags) {
        self.flags.insert(flag);
    }

    pub fn clear_flag(&mut self, flag: CompileFlags) {
        self.flags.remove(flag);
    }

    pub fn needs_validation(&self) -> bool {
        self.get_flag(CompileFlags::NEEDS_VALIDATION)
    }

    /// Append SQL syntax produced by the compiler itself
    pub fn append(&mut self, text: &str) -> &mut Self {
        self.sql.push_str(text);
        self
    }

    /// Append a user-supplied fragment, checked under validation
    pub fn append_fragment(&mut self, fragment: &str) -> CompileResult<()> {
        if self.needs_validation() {
            sql_utils::validate_fragment(fragment)?;
        }
        self.sql.push_str(fragment);
        Ok(())
    }

    /// Append a table, column or alias name, checked under validation
    pub fn append_identifier(&mut self, name: &str) -> CompileResult<()> {
        if self.needs_validation() {
            sql_utils::validate_identifier(name)?;
        }
        self.sql.push_str(name);
        Ok(())
    }

    /// Append an operand.
    ///
    /// Statements nested inside another node are parenthesized. Null is
    /// always rendered as the `NULL` keyword and never bound.
    pub fn append_value(&mut self, value: &Operand, for_validation: bool) -> CompileResult<()> {
        match value {
            Operand::Node(node) => {
                let nested = node.is_statement();
                if nested {
                    self.sql.push('(');
                }
                node.append_to_sql_builder(self, for_validation)?;
                if nested {
                    self.sql.push(')');
                }
                Ok(())
            }
            Operand::List(values) => self.append_list(values),
            Operand::Value(value) => self.append_scalar(value),
        }
    }

    /// Append a single value as `?` or as an inline literal
    pub fn append_scalar(&mut self, value: &SqlValue) -> CompileResult<()> {
        let needs_validation = self.needs_validation();
        match &mut self.args {
            _ if value.is_null() => self.sql.push_str("NULL"),
            Some(args) => {
                self.sql.push_str(PLACEHOLDER);
                args.push(BoundArg::Value(value.clone()));
            }
            None => self
                .sql
                .push_str(&to_sanitized_string(value, needs_validation)?),
        }
        Ok(())
    }

    /// Append a collection as `?[]` or as an inline comma-separated list
    pub fn append_list(&mut self, values: &[SqlValue]) -> CompileResult<()> {
        let needs_validation = self.needs_validation();
        match &mut self.args {
            Some(args) => {
                self.sql.push_str(ARRAY_PLACEHOLDER);
                args.push(BoundArg::Array(values.to_vec()));
            }
            None if values.is_empty() => self.sql.push_str(EMPTY_LIST),
            None => {
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        self.sql.push_str(", ");
                    }
                    self.sql
                        .push_str(&to_sanitized_string(value, needs_validation)?);
                }
            }
        }
        Ok(())
    }

    /// Append a raw fragment together with the arguments for its placeholders
    pub fn append_fragment_with_args(
        &mut self,
        fragment: &str,
        fragment_args: &[SqlValue],
    ) -> CompileResult<()> {
        if self.needs_validation() {
            sql_utils::validate_fragment(fragment)?;
        }
        let needs_validation = self.needs_validation();
        match &mut self.args {
            Some(args) => {
                let mut placeholders = 0;
                sql_utils::for_each_placeholder(fragment, |_, _| placeholders += 1);
                if placeholders != fragment_args.len() {
                    return Err(crate::CompileError::CountMismatch {
                        context: "raw fragment arguments",
                        expected: placeholders,
                        found: fragment_args.len(),
                    });
                }
                self.sql.push_str(fragment);
                args.extend(fragment_args.iter().cloned().map(BoundArg::Value));
            }
            None => {
                let inlined =
                    sql_utils::inline_arguments(fragment, fragment_args, needs_validation)?;
                self.sql.push_str(&inlined);
            }
        }
        Ok(())
    }

    /// Compile each item, separated by `separator`
    pub fn append_concatenated<'a, C>(
        &mut self,
        items: impl IntoIterator<Item = &'a C>,
        separator: &str,
        for_validation: bool,
    ) -> CompileResult<()>
    where
        C: Compilable + ?Sized + 'a,
    {
        for (i, item) in items.into_iter().enumerate() {
            if i > 0 {
                self.sql.push_str(separator);
            }
            item.append_to_sql_builder(self, for_validation)?;
        }
        Ok(())
    }

    /// Append each operand, separated by `separator`
    pub fn append_values<'a>(
        &mut self,
        values: impl IntoIterator<Item = &'a Operand>,
        separator: &str,
        for_validation: bool,
    ) -> CompileResult<()> {
        for (i, value) in values.into_iter().enumerate() {
            if i > 0 {
                self.sql.push_str(separator);
            }
            self.append_value(value, for_validation)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags() {
        let mut flags = CompileFlags::NONE;
        assert!(!flags.contains(CompileFlags::NEEDS_VALIDATION));
        flags.insert(CompileFlags::NEEDS_VALIDATION | CompileFlags::TOP_LEVEL_SELECT);
        assert!(flags.contains(CompileFlags::TOP_LEVEL_SELECT));
        flags.remove(CompileFlags::TOP_LEVEL_SELECT);
        assert_eq!(flags, CompileFlags::NEEDS_VALIDATION);
    }

    #[test]
    fn test_scalar_binding() {
        let mut builder = SqlBuilder::new(VersionCode::LATEST, true);
        builder.append_scalar(&SqlValue::Integer(3)).unwrap();
        builder.append(" ");
        builder.append_scalar(&SqlValue::Null).unwrap();
        assert_eq!(builder.sql(), "? NULL");
        assert_eq!(
            builder.bound_arguments(),
            Some(&[BoundArg::Value(SqlValue::Integer(3))][..])
        );
    }

    #[test]
    fn test_inline_list() {
        let mut builder = SqlBuilder::new(VersionCode::LATEST, false);
        builder
            .append_list(&[SqlValue::Integer(1), SqlValue::text("a")])
            .unwrap();
        assert_eq!(builder.sql(), "1, 'a'");
        assert_eq!(builder.bound_arguments(), None);

        let mut empty = SqlBuilder::new(VersionCode::LATEST, false);
        empty.append_list(&[]).unwrap();
        assert_eq!(empty.sql(), EMPTY_LIST);
    }

    #[test]
    fn test_bound_list_is_one_argument() {
        let mut builder = SqlBuilder::new(VersionCode::LATEST, true);
        builder.append_list(&[SqlValue::Integer(1), SqlValue::Integer(2)]).unwrap();
        assert_eq!(builder.sql(), "?[]");
        assert_eq!(builder.bound_arguments().map(<[_]>::len), Some(1));
        assert_eq!(builder.bound_arguments().unwrap()[0].width(), 2);
    }

    #[test]
    fn test_fragment_validation_follows_flag() {
        let mut lax = SqlBuilder::new(VersionCode::LATEST, false);
        assert!(lax.append_fragment("1; DROP TABLE t").is_ok());

        let mut strict = SqlBuilder::new(VersionCode::LATEST, false);
        strict.set_flag(CompileFlags::NEEDS_VALIDATION);
        assert!(strict.append_fragment("1; DROP TABLE t").is_err());
    }
}

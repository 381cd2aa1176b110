//! Typed column handles

use quarry_types::{SqlValue, ValueKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::compilable::impl_display_as_raw_sql;
use crate::{Compilable, CompileResult, Criterion, Operand, Order, Query, SqlBuilder};

/// Identity of a model bound to a table (or to an alias of one)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableModelName {
    pub model: String,
    pub table: String,
}

impl TableModelName {
    pub fn new(model: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            table: table.into(),
        }
    }
}

impl fmt::Display for TableModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.model, self.table)
    }
}

/// A named SQL expression, optionally owned by a table and optionally aliased
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    table: Option<TableModelName>,
    expression: String,
    alias: Option<String>,
}

impl Field {
    pub fn new(table: Option<TableModelName>, expression: impl Into<String>) -> Self {
        Self {
            table,
            expression: expression.into(),
            alias: None,
        }
    }

    pub fn table(&self) -> Option<&TableModelName> {
        self.table.as_ref()
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Expression qualified with its table, as used inside statements
    pub fn qualified_expression(&self) -> String {
        match &self.table {
            Some(table) => format!("{}.{}", table.table, self.expression),
            None => self.expression.clone(),
        }
    }

    /// Name of the column this field produces in a result set.
    ///
    /// The alias when one is set, otherwise the qualified expression.
    pub fn select_name(&self) -> String {
        match &self.alias {
            Some(alias) => alias.clone(),
            None => self.qualified_expression(),
        }
    }
}

/// A typed handle to a column.
///
/// The variant fixes the kind values are cast to when they are read from or
/// written to a model. Two handles are equal when they name the same
/// expression of the same table under the same alias, whatever their kind.
#[derive(Debug, Clone)]
pub enum Property {
    Integer(Field),
    Long(Field),
    Double(Field),
    Text(Field),
    Boolean(Field),
    Blob(Field),
}

/// Kind-dispatched operation over a [`Property`].
///
/// Each visit receives the property itself and a caller-supplied parameter.
pub trait PropertyVisitor<P> {
    type Output;

    fn visit_integer(&self, property: &Property, param: P) -> Self::Output;
    fn visit_long(&self, property: &Property, param: P) -> Self::Output;
    fn visit_double(&self, property: &Property, param: P) -> Self::Output;
    fn visit_text(&self, property: &Property, param: P) -> Self::Output;
    fn visit_boolean(&self, property: &Property, param: P) -> Self::Output;
    fn visit_blob(&self, property: &Property, param: P) -> Self::Output;
}

impl Property {
    pub fn new(kind: ValueKind, field: Field) -> Self {
        match kind {
            ValueKind::Integer => Self::Integer(field),
            ValueKind::Long => Self::Long(field),
            ValueKind::Double => Self::Double(field),
            ValueKind::Text => Self::Text(field),
            ValueKind::Boolean => Self::Boolean(field),
            ValueKind::Blob => Self::Blob(field),
        }
    }

    /// A handle owned by `table`
    pub fn column(kind: ValueKind, table: &TableModelName, expression: &str) -> Self {
        Self::new(kind, Field::new(Some(table.clone()), expression))
    }

    /// A handle not owned by any table, such as a computed column
    pub fn unowned(kind: ValueKind, expression: &str) -> Self {
        Self::new(kind, Field::new(None, expression))
    }

    pub fn field(&self) -> &Field {
        match self {
            Self::Integer(f)
            | Self::Long(f)
            | Self::Double(f)
            | Self::Text(f)
            | Self::Boolean(f)
            | Self::Blob(f) => f,
        }
    }

    fn field_mut(&mut self) -> &mut Field {
        match self {
            Self::Integer(f)
            | Self::Long(f)
            | Self::Double(f)
            | Self::Text(f)
            | Self::Boolean(f)
            | Self::Blob(f) => f,
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Integer(_) => ValueKind::Integer,
            Self::Long(_) => ValueKind::Long,
            Self::Double(_) => ValueKind::Double,
            Self::Text(_) => ValueKind::Text,
            Self::Boolean(_) => ValueKind::Boolean,
            Self::Blob(_) => ValueKind::Blob,
        }
    }

    /// Storage key of the column in its own table's stores
    pub fn expression(&self) -> &str {
        self.field().expression()
    }

    pub fn table_model_name(&self) -> Option<&TableModelName> {
        self.field().table()
    }

    pub fn alias(&self) -> Option<&str> {
        self.field().alias()
    }

    pub fn select_name(&self) -> String {
        self.field().select_name()
    }

    /// Whether the handle belongs to `owner`'s table
    pub fn belongs_to(&self, owner: &TableModelName) -> bool {
        self.table_model_name() == Some(owner)
    }

    /// Key under which a model owned by `owner` stores this column's value.
    ///
    /// Native handles use their expression. Handles of any other table use
    /// their select name, so they cannot collide with a native column of the
    /// same name.
    pub fn name_for_model_storage(&self, owner: &TableModelName) -> String {
        if self.belongs_to(owner) {
            self.expression().to_string()
        } else {
            self.select_name()
        }
    }

    /// The same column under a result-set alias
    pub fn as_alias(&self, alias: impl Into<String>) -> Self {
        let mut aliased = self.clone();
        aliased.field_mut().alias = Some(alias.into());
        aliased
    }

    /// The same column re-homed onto another table identity, e.g. a table alias
    pub fn with_table(&self, table: TableModelName) -> Self {
        let mut moved = self.clone();
        moved.field_mut().table = Some(table);
        moved
    }

    /// Dispatch on the property's kind
    pub fn accept<P, V: PropertyVisitor<P> + ?Sized>(&self, visitor: &V, param: P) -> V::Output {
        match self {
            Self::Integer(_) => visitor.visit_integer(self, param),
            Self::Long(_) => visitor.visit_long(self, param),
            Self::Double(_) => visitor.visit_double(self, param),
            Self::Text(_) => visitor.visit_text(self, param),
            Self::Boolean(_) => visitor.visit_boolean(self, param),
            Self::Blob(_) => visitor.visit_blob(self, param),
        }
    }

    /// `self = value`; comparing with null becomes `IS NULL`
    pub fn eq(&self, value: impl Into<Operand>) -> Criterion {
        let value = value.into();
        if value.is_null() {
            self.is_null()
        } else {
            Criterion::binary(self, crate::ComparisonOp::Eq, value)
        }
    }

    /// `self <> value`; comparing with null becomes `IS NOT NULL`
    pub fn neq(&self, value: impl Into<Operand>) -> Criterion {
        let value = value.into();
        if value.is_null() {
            self.is_not_null()
        } else {
            Criterion::binary(self, crate::ComparisonOp::Neq, value)
        }
    }

    pub fn gt(&self, value: impl Into<Operand>) -> Criterion {
        Criterion::binary(self, crate::ComparisonOp::Gt, value)
    }

    pub fn gte(&self, value: impl Into<Operand>) -> Criterion {
        Criterion::binary(self, crate::ComparisonOp::Gte, value)
    }

    pub fn lt(&self, value: impl Into<Operand>) -> Criterion {
        Criterion::binary(self, crate::ComparisonOp::Lt, value)
    }

    pub fn lte(&self, value: impl Into<Operand>) -> Criterion {
        Criterion::binary(self, crate::ComparisonOp::Lte, value)
    }

    pub fn is_null(&self) -> Criterion {
        Criterion::null_check(self, false)
    }

    pub fn is_not_null(&self) -> Criterion {
        Criterion::null_check(self, true)
    }

    pub fn in_values<T: Into<SqlValue>>(&self, values: impl IntoIterator<Item = T>) -> Criterion {
        Criterion::in_operand(self, Operand::list(values), false)
    }

    pub fn not_in_values<T: Into<SqlValue>>(
        &self,
        values: impl IntoIterator<Item = T>,
    ) -> Criterion {
        Criterion::in_operand(self, Operand::list(values), true)
    }

    pub fn in_query(&self, query: Query) -> Criterion {
        Criterion::in_operand(self, query, false)
    }

    pub fn not_in_query(&self, query: Query) -> Criterion {
        Criterion::in_operand(self, query, true)
    }

    pub fn between(&self, low: impl Into<Operand>, high: impl Into<Operand>) -> Criterion {
        Criterion::between(self, low, high, false)
    }

    pub fn like(&self, pattern: impl Into<Operand>) -> Criterion {
        Criterion::like(self, pattern, None, false)
    }

    pub fn like_with_escape(&self, pattern: impl Into<Operand>, escape: char) -> Criterion {
        Criterion::like(self, pattern, Some(escape), false)
    }

    pub fn not_like(&self, pattern: impl Into<Operand>) -> Criterion {
        Criterion::like(self, pattern, None, true)
    }

    pub fn asc(&self) -> Order {
        Order::asc(self)
    }

    pub fn desc(&self) -> Order {
        Order::desc(self)
    }
}

impl PartialEq for Property {
    fn eq(&self, other: &Self) -> bool {
        self.field() == other.field()
    }
}

impl Eq for Property {}

impl Hash for Property {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.field().hash(state);
    }
}

impl Compilable for Property {
    fn append_to_sql_builder(
        &self,
        builder: &mut SqlBuilder,
        _for_validation: bool,
    ) -> CompileResult<()> {
        builder.append_identifier(&self.field().qualified_expression())
    }
}

impl_display_as_raw_sql!(Property);

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> TableModelName {
        TableModelName::new("Person", "people")
    }

    #[test]
    fn test_storage_names() {
        let name = Property::column(ValueKind::Text, &people(), "name");
        assert_eq!(name.name_for_model_storage(&people()), "name");

        let other = TableModelName::new("Pet", "pets");
        assert_eq!(name.name_for_model_storage(&other), "people.name");
        assert_eq!(name.as_alias("owner").name_for_model_storage(&other), "owner");
    }

    #[test]
    fn test_equality_ignores_kind() {
        let a = Property::column(ValueKind::Integer, &people(), "age");
        let b = Property::column(ValueKind::Long, &people(), "age");
        assert_eq!(a, b);
        assert_ne!(a, a.as_alias("years"));
        assert_ne!(a, Property::unowned(ValueKind::Integer, "age"));
    }

    #[test]
    fn test_visitor_dispatch() {
        struct KindName;

        impl PropertyVisitor<&'static str> for KindName {
            type Output = String;

            fn visit_integer(&self, p: &Property, suffix: &'static str) -> String {
                format!("int {}{}", p.expression(), suffix)
            }
            fn visit_long(&self, p: &Property, suffix: &'static str) -> String {
                format!("long {}{}", p.expression(), suffix)
            }
            fn visit_double(&self, p: &Property, suffix: &'static str) -> String {
                format!("double {}{}", p.expression(), suffix)
            }
            fn visit_text(&self, p: &Property, suffix: &'static str) -> String {
                format!("text {}{}", p.expression(), suffix)
            }
            fn visit_boolean(&self, p: &Property, suffix: &'static str) -> String {
                format!("bool {}{}", p.expression(), suffix)
            }
            fn visit_blob(&self, p: &Property, suffix: &'static str) -> String {
                format!("blob {}{}", p.expression(), suffix)
            }
        }

        let flag = Property::column(ValueKind::Boolean, &people(), "active");
        assert_eq!(flag.accept(&KindName, "!"), "bool active!");
    }

    #[test]
    fn test_renders_qualified() {
        let name = Property::column(ValueKind::Text, &people(), "name");
        assert_eq!(name.to_string(), "people.name");
        assert_eq!(Property::unowned(ValueKind::Long, "total").to_string(), "total");
    }
}

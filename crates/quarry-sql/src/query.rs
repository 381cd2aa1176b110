//! SELECT statements

use crate::compilable::impl_display_as_raw_sql;
use crate::{
    Compilable, CompileFlags, CompileResult, Criterion, Operand, Order, Property, SqlBuilder,
    Table, VersionCode,
};

/// One entry of a select list
#[derive(Debug, Clone)]
pub enum SelectItem {
    /// A column, followed by `AS alias` when the handle is aliased
    Property(Property),
    /// A computed expression under a result-set alias
    Expression { expression: Operand, alias: String },
    /// `*`
    All,
    /// `table.*`
    AllOf(Table),
}

impl SelectItem {
    pub fn expression(expression: impl Into<Operand>, alias: impl Into<String>) -> Self {
        Self::Expression {
            expression: expression.into(),
            alias: alias.into(),
        }
    }

    fn append_to_sql_builder(
        &self,
        builder: &mut SqlBuilder,
        for_validation: bool,
    ) -> CompileResult<()> {
        match self {
            Self::Property(property) => {
                property.append_to_sql_builder(builder, for_validation)?;
                if let Some(alias) = property.alias() {
                    builder.append(" AS ");
                    builder.append_identifier(alias)?;
                }
            }
            Self::Expression { expression, alias } => {
                builder.append_value(expression, for_validation)?;
                builder.append(" AS ");
                builder.append_identifier(alias)?;
            }
            Self::All => {
                builder.append("*");
            }
            Self::AllOf(table) => {
                builder.append_identifier(table.qualified_name())?;
                builder.append(".*");
            }
        }
        Ok(())
    }
}

impl From<Property> for SelectItem {
    fn from(property: Property) -> Self {
        Self::Property(property)
    }
}

impl From<&Property> for SelectItem {
    fn from(property: &Property) -> Self {
        Self::Property(property.clone())
    }
}

/// Something rows can be selected from
#[derive(Debug, Clone)]
pub enum Source {
    Table(Table),
    SubQuery { query: Box<Query>, alias: String },
}

impl Source {
    fn append_to_sql_builder(
        &self,
        builder: &mut SqlBuilder,
        for_validation: bool,
    ) -> CompileResult<()> {
        match self {
            Self::Table(table) => table.append_to_sql_builder(builder, for_validation),
            Self::SubQuery { query, alias } => {
                builder.append("(");
                query.append_to_sql_builder(builder, for_validation)?;
                builder.append(") AS ");
                builder.append_identifier(alias)
            }
        }
    }
}

impl From<Table> for Source {
    fn from(table: Table) -> Self {
        Self::Table(table)
    }
}

impl From<&Table> for Source {
    fn from(table: &Table) -> Self {
        Self::Table(table.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinKind {
    Inner,
    Left,
    Cross,
}

impl JoinKind {
    const fn keyword(&self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
            Self::Cross => "CROSS JOIN",
        }
    }
}

/// A join clause, constrained by `ON` or by `USING` columns
#[derive(Debug, Clone)]
pub struct Join {
    kind: JoinKind,
    source: Source,
    on: Option<Criterion>,
    using: Vec<String>,
}

impl Join {
    pub fn new(kind: JoinKind, source: impl Into<Source>) -> Self {
        Self {
            kind,
            source: source.into(),
            on: None,
            using: Vec::new(),
        }
    }

    pub fn inner(source: impl Into<Source>, on: Criterion) -> Self {
        Self::new(JoinKind::Inner, source).on(on)
    }

    pub fn left(source: impl Into<Source>, on: Criterion) -> Self {
        Self::new(JoinKind::Left, source).on(on)
    }

    pub fn cross(source: impl Into<Source>) -> Self {
        Self::new(JoinKind::Cross, source)
    }

    pub fn on(mut self, criterion: Criterion) -> Self {
        self.on = Some(match self.on.take() {
            Some(existing) => existing.and(criterion),
            None => criterion,
        });
        self
    }

    /// Join on columns with the same name in both tables
    pub fn using<'a>(mut self, columns: impl IntoIterator<Item = &'a Property>) -> Self {
        self.using
            .extend(columns.into_iter().map(|p| p.expression().to_string()));
        self
    }

    fn append_to_sql_builder(
        &self,
        builder: &mut SqlBuilder,
        for_validation: bool,
    ) -> CompileResult<()> {
        builder.append(" ").append(self.kind.keyword()).append(" ");
        self.source.append_to_sql_builder(builder, for_validation)?;
        if let Some(on) = &self.on {
            builder.append(" ON ");
            on.append_to_sql_builder(builder, for_validation)?;
        } else if !self.using.is_empty() {
            builder.append(" USING (");
            for (i, column) in self.using.iter().enumerate() {
                if i > 0 {
                    builder.append(", ");
                }
                builder.append_identifier(column)?;
            }
            builder.append(")");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompoundOp {
    Union,
    UnionAll,
    Intersect,
    Except,
}

impl CompoundOp {
    const fn keyword(&self) -> &'static str {
        match self {
            Self::Union => "UNION",
            Self::UnionAll => "UNION ALL",
            Self::Intersect => "INTERSECT",
            Self::Except => "EXCEPT",
        }
    }
}

/// A SELECT statement.
///
/// Nested inside another node a query is parenthesized. ORDER BY is only
/// meaningful on the outermost select or together with LIMIT, so a nested
/// query without LIMIT or OFFSET leaves its ordering out.
#[derive(Debug, Clone, Default)]
pub struct Query {
    fields: Vec<SelectItem>,
    distinct: bool,
    from: Option<Source>,
    joins: Vec<Join>,
    where_criteria: Vec<Criterion>,
    group_by: Vec<Operand>,
    having: Vec<Criterion>,
    order_by: Vec<Order>,
    limit: Option<Operand>,
    offset: Option<Operand>,
    compounds: Vec<(CompoundOp, Query)>,
    needs_validation: bool,
}

impl Query {
    pub fn select<I>(fields: impl IntoIterator<Item = I>) -> Self
    where
        I: Into<SelectItem>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn select_distinct<I>(fields: impl IntoIterator<Item = I>) -> Self
    where
        I: Into<SelectItem>,
    {
        Self {
            distinct: true,
            ..Self::select(fields)
        }
    }

    /// `SELECT *`
    pub fn select_all() -> Self {
        Self::select([SelectItem::All])
    }

    pub fn fields(&self) -> &[SelectItem] {
        &self.fields
    }

    /// Add a column or expression to the select list
    pub fn field(mut self, field: impl Into<SelectItem>) -> Self {
        self.fields.push(field.into());
        self
    }

    pub fn from(mut self, source: impl Into<Source>) -> Self {
        self.from = Some(source.into());
        self
    }

    pub fn from_subquery(self, query: Query, alias: impl Into<String>) -> Self {
        self.from(Source::SubQuery {
            query: Box::new(query),
            alias: alias.into(),
        })
    }

    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    pub fn inner_join(self, source: impl Into<Source>, on: Criterion) -> Self {
        self.join(Join::inner(source, on))
    }

    pub fn left_join(self, source: impl Into<Source>, on: Criterion) -> Self {
        self.join(Join::left(source, on))
    }

    /// Add a WHERE condition; conditions are combined with AND
    pub fn where_clause(mut self, criterion: Criterion) -> Self {
        self.where_criteria.push(criterion);
        self
    }

    pub fn group_by(mut self, expression: impl Into<Operand>) -> Self {
        self.group_by.push(expression.into());
        self
    }

    /// Add a HAVING condition; conditions are combined with AND
    pub fn having(mut self, criterion: Criterion) -> Self {
        self.having.push(criterion);
        self
    }

    pub fn order_by(mut self, order: Order) -> Self {
        self.order_by.push(order);
        self
    }

    pub fn limit(mut self, limit: impl Into<Operand>) -> Self {
        self.limit = Some(limit.into());
        self
    }

    pub fn offset(mut self, offset: impl Into<Operand>) -> Self {
        self.offset = Some(offset.into());
        self
    }

    pub fn union(self, other: Query) -> Self {
        self.compound(CompoundOp::Union, other)
    }

    pub fn union_all(self, other: Query) -> Self {
        self.compound(CompoundOp::UnionAll, other)
    }

    pub fn intersect(self, other: Query) -> Self {
        self.compound(CompoundOp::Intersect, other)
    }

    pub fn except(self, other: Query) -> Self {
        self.compound(CompoundOp::Except, other)
    }

    fn compound(mut self, op: CompoundOp, other: Query) -> Self {
        self.compounds.push((op, other));
        self
    }

    /// Check raw fragments, identifiers and literals when this query is compiled
    pub fn request_validation(mut self) -> Self {
        self.needs_validation = true;
        self
    }

    pub fn needs_validation(&self) -> bool {
        self.needs_validation
    }

    /// Literal SQL with the extra parentheses used to check a query before
    /// running it
    pub fn sql_for_validation(&self, version: VersionCode) -> CompileResult<String> {
        let flags = self.default_flags() | CompileFlags::NEEDS_VALIDATION;
        let (sql, _, _) = self.build_sql(version, false, true, flags)?.into_parts();
        Ok(sql)
    }

    fn append_criteria(
        builder: &mut SqlBuilder,
        keyword: &str,
        criteria: &[Criterion],
        for_validation: bool,
    ) -> CompileResult<()> {
        if criteria.is_empty() {
            return Ok(());
        }
        builder.append(keyword);
        if for_validation {
            builder.append("(");
        }
        builder.append_concatenated(criteria, " AND ", for_validation)?;
        if for_validation {
            builder.append(")");
        }
        Ok(())
    }

    fn append_select(&self, builder: &mut SqlBuilder, for_validation: bool) -> CompileResult<()> {
        builder.append(if self.distinct { "SELECT DISTINCT " } else { "SELECT " });
        if self.fields.is_empty() {
            builder.append("*");
        }
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                builder.append(", ");
            }
            field.append_to_sql_builder(builder, for_validation)?;
        }

        if let Some(from) = &self.from {
            builder.append(" FROM ");
            from.append_to_sql_builder(builder, for_validation)?;
        }
        for join in &self.joins {
            join.append_to_sql_builder(builder, for_validation)?;
        }

        Self::append_criteria(builder, " WHERE ", &self.where_criteria, for_validation)?;

        if !self.group_by.is_empty() {
            builder.append(" GROUP BY ");
            builder.append_values(&self.group_by, ", ", for_validation)?;
        }
        Self::append_criteria(builder, " HAVING ", &self.having, for_validation)
    }
}

impl Query {
    /// Render this query as a member of another query's compound.
    ///
    /// A plain member contributes its select core. A member with compounds
    /// or limits of its own is wrapped as `SELECT * FROM (...)`, since SQLite
    /// accepts no parenthesized compound members.
    fn append_compound_member(
        &self,
        builder: &mut SqlBuilder,
        for_validation: bool,
    ) -> CompileResult<()> {
        let limited = self.limit.is_some() || self.offset.is_some();
        if self.compounds.is_empty() && !limited {
            return self.append_select(builder, for_validation);
        }
        builder.append("SELECT * FROM (");
        self.append_to_sql_builder(builder, for_validation)?;
        builder.append(")");
        Ok(())
    }
}

impl Compilable for Query {
    fn append_to_sql_builder(
        &self,
        builder: &mut SqlBuilder,
        for_validation: bool,
    ) -> CompileResult<()> {
        let top_level = builder.get_flag(CompileFlags::TOP_LEVEL_SELECT);
        builder.clear_flag(CompileFlags::TOP_LEVEL_SELECT);
        let enable_validation = self.needs_validation && !builder.needs_validation();
        if enable_validation {
            builder.set_flag(CompileFlags::NEEDS_VALIDATION);
        }

        self.append_select(builder, for_validation)?;
        for (op, other) in &self.compounds {
            builder.append(" ").append(op.keyword()).append(" ");
            other.append_compound_member(builder, for_validation)?;
        }

        let limited = self.limit.is_some() || self.offset.is_some();
        if !self.order_by.is_empty() && (top_level || limited) {
            builder.append(" ORDER BY ");
            for (i, order) in self.order_by.iter().enumerate() {
                if i > 0 {
                    builder.append(", ");
                }
                order.append_to_sql_builder(builder, for_validation)?;
            }
        }

        if limited {
            builder.append(" LIMIT ");
            match &self.limit {
                Some(limit) => builder.append_value(limit, for_validation)?,
                None => {
                    builder.append("-1");
                }
            }
            if let Some(offset) = &self.offset {
                builder.append(" OFFSET ");
                builder.append_value(offset, for_validation)?;
            }
        }

        if enable_validation {
            builder.clear_flag(CompileFlags::NEEDS_VALIDATION);
        }
        if top_level {
            builder.set_flag(CompileFlags::TOP_LEVEL_SELECT);
        }
        Ok(())
    }

    fn is_statement(&self) -> bool {
        true
    }

    fn default_flags(&self) -> CompileFlags {
        if self.needs_validation {
            CompileFlags::TOP_LEVEL_SELECT | CompileFlags::NEEDS_VALIDATION
        } else {
            CompileFlags::TOP_LEVEL_SELECT
        }
    }
}

impl_display_as_raw_sql!(Query);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BoundArg, Function};
    use pretty_assertions::assert_eq;
    use quarry_types::SqlValue;

    fn people() -> Table {
        Table::new("Person", "people")
    }

    #[test]
    fn test_simple_select() {
        let t = people();
        let query = Query::select([t.long("_id"), t.text("name")])
            .from(&t)
            .where_clause(t.integer("age").gte(18))
            .order_by(t.text("name").asc())
            .limit(10);
        assert_eq!(
            query.to_string(),
            "SELECT people._id, people.name FROM people WHERE people.age >= 18 \
             ORDER BY people.name ASC LIMIT 10"
        );
    }

    #[test]
    fn test_offset_without_limit() {
        let query = Query::select_all().from(people()).offset(5);
        assert_eq!(query.to_string(), "SELECT * FROM people LIMIT -1 OFFSET 5");
    }

    #[test]
    fn test_nested_query_drops_unlimited_order() {
        let t = people();
        let inner = Query::select([t.long("_id")])
            .from(&t)
            .order_by(t.text("name").asc());
        let outer = Query::select_all()
            .from(&t)
            .where_clause(t.long("_id").in_query(inner.clone()));
        assert_eq!(
            outer.to_string(),
            "SELECT * FROM people WHERE people._id IN (SELECT people._id FROM people)"
        );

        let limited = Query::select_all()
            .from(&t)
            .where_clause(t.long("_id").in_query(inner.limit(1)));
        assert_eq!(
            limited.to_string(),
            "SELECT * FROM people WHERE people._id IN \
             (SELECT people._id FROM people ORDER BY people.name ASC LIMIT 1)"
        );
    }

    #[test]
    fn test_group_by_having() {
        let t = people();
        let age = t.integer("age");
        let count = Function::count_all();
        let query = Query::select([SelectItem::from(&age), SelectItem::expression(count.clone(), "n")])
            .from(&t)
            .group_by(&age)
            .having(Criterion::binary(count, crate::ComparisonOp::Gt, 1));
        assert_eq!(
            query.to_string(),
            "SELECT people.age, COUNT(*) AS n FROM people GROUP BY people.age HAVING COUNT(*) > 1"
        );
    }

    #[test]
    fn test_joins_with_aliases() {
        let t = people();
        let boss = t.as_alias("boss");
        let query = Query::select([t.text("name"), boss.text("name").as_alias("boss_name")])
            .from(&t)
            .left_join(&boss, t.long("boss_id").eq(&boss.long("_id")));
        assert_eq!(
            query.to_string(),
            "SELECT people.name, boss.name AS boss_name FROM people \
             LEFT JOIN people AS boss ON people.boss_id = boss._id"
        );
    }

    #[test]
    fn test_compound_select() {
        let t = people();
        let query = Query::select([t.text("name")])
            .from(&t)
            .where_clause(t.integer("age").lt(18))
            .union_all(
                Query::select([t.text("name")])
                    .from(&t)
                    .where_clause(t.integer("age").gt(65)),
            )
            .order_by(t.text("name").desc());
        assert_eq!(
            query.to_string(),
            "SELECT people.name FROM people WHERE people.age < 18 UNION ALL \
             SELECT people.name FROM people WHERE people.age > 65 ORDER BY people.name DESC"
        );
    }

    fn age_band(filter: Criterion) -> Query {
        let t = people();
        Query::select([t.text("name")]).from(&t).where_clause(filter)
    }

    #[test]
    fn test_nested_compound_keeps_grouping() {
        let age = people().integer("age");
        let query = age_band(age.lt(18))
            .union(age_band(age.gt(65)).union(age_band(age.eq(40))));
        assert_eq!(
            query.to_string(),
            "SELECT people.name FROM people WHERE people.age < 18 UNION \
             SELECT * FROM (SELECT people.name FROM people WHERE people.age > 65 UNION \
             SELECT people.name FROM people WHERE people.age = 40)"
        );

        let compiled = query.compile(VersionCode::LATEST).unwrap();
        assert_eq!(
            compiled.sql,
            "SELECT people.name FROM people WHERE people.age < ? UNION \
             SELECT * FROM (SELECT people.name FROM people WHERE people.age > ? UNION \
             SELECT people.name FROM people WHERE people.age = ?)"
        );
        assert_eq!(
            compiled.args,
            vec![
                BoundArg::Value(SqlValue::Integer(18)),
                BoundArg::Value(SqlValue::Integer(65)),
                BoundArg::Value(SqlValue::Integer(40)),
            ]
        );
        assert_eq!(compiled.placeholder_count(), compiled.args.len());
    }

    #[test]
    fn test_limited_compound_member_is_wrapped() {
        let age = people().integer("age");
        let query = age_band(age.lt(18)).union_all(age_band(age.gt(65)).limit(5));
        assert_eq!(
            query.to_string(),
            "SELECT people.name FROM people WHERE people.age < 18 UNION ALL \
             SELECT * FROM (SELECT people.name FROM people WHERE people.age > 65 LIMIT 5)"
        );
    }

    #[test]
    fn test_validation_sql_adds_parentheses() {
        let t = people();
        let query = Query::select_all()
            .from(&t)
            .where_clause(t.integer("age").gt(1).and(t.integer("age").lt(9)));
        assert_eq!(
            query.sql_for_validation(VersionCode::LATEST).unwrap(),
            "SELECT * FROM people WHERE (((people.age > 1 AND people.age < 9)))"
        );
    }

    #[test]
    fn test_requested_validation_rejects_unsafe_fragments() {
        let query = Query::select_all()
            .from(people())
            .where_clause(Criterion::raw("1); DROP TABLE people; (", []));
        assert!(query.to_raw_sql(VersionCode::LATEST).is_ok());
        assert!(query.request_validation().to_raw_sql(VersionCode::LATEST).is_err());
    }
}

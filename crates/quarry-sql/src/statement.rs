//! INSERT, UPDATE and DELETE statements

use quarry_types::ValuesStorage;

use crate::compilable::impl_display_as_raw_sql;
use crate::{
    Compilable, CompileError, CompileResult, Criterion, Operand, Property, Query, SqlBuilder,
    Table, VersionCode,
};

/// Conflict resolution for INSERT and UPDATE
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ConflictAlgorithm {
    #[default]
    None,
    Rollback,
    Abort,
    Fail,
    Ignore,
    Replace,
}

impl ConflictAlgorithm {
    /// Clause inserted after the statement verb, e.g. `" OR REPLACE"`
    const fn clause(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::Rollback => " OR ROLLBACK",
            Self::Abort => " OR ABORT",
            Self::Fail => " OR FAIL",
            Self::Ignore => " OR IGNORE",
            Self::Replace => " OR REPLACE",
        }
    }
}

fn append_where(
    builder: &mut SqlBuilder,
    criteria: &[Criterion],
    for_validation: bool,
) -> CompileResult<()> {
    if criteria.is_empty() {
        return Ok(());
    }
    builder.append(" WHERE ");
    builder.append_concatenated(criteria, " AND ", for_validation)
}

/// An INSERT statement.
///
/// Rows come either from `VALUES` lists or from a query. Engines older than
/// 3.7.11 receive multiple rows as a `UNION ALL` of single-row selects.
#[derive(Debug, Clone)]
pub struct Insert {
    table: Table,
    columns: Vec<String>,
    rows: Vec<Vec<Operand>>,
    select: Option<Query>,
    default_values: bool,
    conflict: ConflictAlgorithm,
}

impl Insert {
    pub fn into(table: impl Into<Table>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            rows: Vec::new(),
            select: None,
            default_values: false,
            conflict: ConflictAlgorithm::None,
        }
    }

    /// An insert of one row holding every entry of `values`, keyed by column name
    pub fn from_values(table: impl Into<Table>, values: &ValuesStorage) -> Self {
        let mut insert = Self::into(table);
        insert.columns = values.keys().map(str::to_string).collect();
        insert
            .rows
            .push(values.iter().map(|(_, v)| Operand::Value(v.clone())).collect());
        insert
    }

    pub fn columns<'a>(mut self, columns: impl IntoIterator<Item = &'a Property>) -> Self {
        self.columns
            .extend(columns.into_iter().map(|p| p.expression().to_string()));
        self
    }

    pub fn values(mut self, row: impl IntoIterator<Item = Operand>) -> Self {
        self.rows.push(row.into_iter().collect());
        self
    }

    pub fn select(mut self, query: Query) -> Self {
        self.select = Some(query);
        self
    }

    pub fn default_values(mut self) -> Self {
        self.default_values = true;
        self
    }

    pub fn on_conflict(mut self, conflict: ConflictAlgorithm) -> Self {
        self.conflict = conflict;
        self
    }

    fn append_row(
        builder: &mut SqlBuilder,
        row: &[Operand],
        for_validation: bool,
    ) -> CompileResult<()> {
        builder.append_values(row, ", ", for_validation)
    }
}

impl Compilable for Insert {
    fn append_to_sql_builder(
        &self,
        builder: &mut SqlBuilder,
        for_validation: bool,
    ) -> CompileResult<()> {
        builder.append("INSERT").append(self.conflict.clause()).append(" INTO ");
        builder.append_identifier(self.table.name())?;

        if self.default_values {
            builder.append(" DEFAULT VALUES");
            return Ok(());
        }
        if self.columns.is_empty() {
            return Err(CompileError::incomplete("INSERT", "no columns"));
        }

        builder.append(" (");
        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                builder.append(", ");
            }
            builder.append_identifier(column)?;
        }
        builder.append(") ");

        if let Some(query) = &self.select {
            return query.append_to_sql_builder(builder, for_validation);
        }
        if self.rows.is_empty() {
            return Err(CompileError::incomplete("INSERT", "no values or select"));
        }
        if let Some(row) = self.rows.iter().find(|r| r.len() != self.columns.len()) {
            return Err(CompileError::CountMismatch {
                context: "INSERT row",
                expected: self.columns.len(),
                found: row.len(),
            });
        }

        if self.rows.len() > 1 && !builder.version().is_at_least(VersionCode::V3_7_11) {
            for (i, row) in self.rows.iter().enumerate() {
                builder.append(if i == 0 { "SELECT " } else { " UNION ALL SELECT " });
                Self::append_row(builder, row, for_validation)?;
            }
            return Ok(());
        }

        builder.append("VALUES ");
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                builder.append(", ");
            }
            builder.append("(");
            Self::append_row(builder, row, for_validation)?;
            builder.append(")");
        }
        Ok(())
    }

    fn is_statement(&self) -> bool {
        true
    }
}

/// An UPDATE statement
#[derive(Debug, Clone)]
pub struct Update {
    table: Table,
    assignments: Vec<(String, Operand)>,
    where_criteria: Vec<Criterion>,
    conflict: ConflictAlgorithm,
}

impl Update {
    pub fn table(table: impl Into<Table>) -> Self {
        Self {
            table: table.into(),
            assignments: Vec::new(),
            where_criteria: Vec::new(),
            conflict: ConflictAlgorithm::None,
        }
    }

    /// An update assigning every entry of `values`, keyed by column name
    pub fn from_values(table: impl Into<Table>, values: &ValuesStorage) -> Self {
        let mut update = Self::table(table);
        update.assignments = values
            .iter()
            .map(|(k, v)| (k.to_string(), Operand::Value(v.clone())))
            .collect();
        update
    }

    /// Assign `value` to `property`, replacing an earlier assignment to it
    pub fn set(mut self, property: &Property, value: impl Into<Operand>) -> Self {
        let column = property.expression();
        let value = value.into();
        match self.assignments.iter_mut().find(|(c, _)| c == column) {
            Some((_, existing)) => *existing = value,
            None => self.assignments.push((column.to_string(), value)),
        }
        self
    }

    pub fn where_clause(mut self, criterion: Criterion) -> Self {
        self.where_criteria.push(criterion);
        self
    }

    pub fn on_conflict(mut self, conflict: ConflictAlgorithm) -> Self {
        self.conflict = conflict;
        self
    }
}

impl Compilable for Update {
    fn append_to_sql_builder(
        &self,
        builder: &mut SqlBuilder,
        for_validation: bool,
    ) -> CompileResult<()> {
        if self.assignments.is_empty() {
            return Err(CompileError::incomplete("UPDATE", "no assignments"));
        }
        builder.append("UPDATE").append(self.conflict.clause()).append(" ");
        builder.append_identifier(self.table.name())?;
        builder.append(" SET ");
        for (i, (column, value)) in self.assignments.iter().enumerate() {
            if i > 0 {
                builder.append(", ");
            }
            builder.append_identifier(column)?;
            builder.append(" = ");
            builder.append_value(value, for_validation)?;
        }
        append_where(builder, &self.where_criteria, for_validation)
    }

    fn is_statement(&self) -> bool {
        true
    }
}

/// A DELETE statement
#[derive(Debug, Clone)]
pub struct Delete {
    table: Table,
    where_criteria: Vec<Criterion>,
}

impl Delete {
    pub fn from(table: impl Into<Table>) -> Self {
        Self {
            table: table.into(),
            where_criteria: Vec::new(),
        }
    }

    pub fn where_clause(mut self, criterion: Criterion) -> Self {
        self.where_criteria.push(criterion);
        self
    }
}

impl Compilable for Delete {
    fn append_to_sql_builder(
        &self,
        builder: &mut SqlBuilder,
        for_validation: bool,
    ) -> CompileResult<()> {
        builder.append("DELETE FROM ");
        builder.append_identifier(self.table.name())?;
        append_where(builder, &self.where_criteria, for_validation)
    }

    fn is_statement(&self) -> bool {
        true
    }
}

impl_display_as_raw_sql!(Insert, Update, Delete);

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quarry_types::SqlValue;

    fn people() -> Table {
        Table::new("Person", "people")
    }

    #[test]
    fn test_insert_rows() {
        let t = people();
        let insert = Insert::into(&t)
            .columns([&t.text("name"), &t.integer("age")])
            .values(["Ada".into(), 36.into()])
            .values(["Bob".into(), Operand::null()]);
        assert_eq!(
            insert.to_string(),
            "INSERT INTO people (name, age) VALUES ('Ada', 36), ('Bob', NULL)"
        );
        assert_eq!(
            insert.to_raw_sql(VersionCode::new(3, 7, 10, 0)).unwrap(),
            "INSERT INTO people (name, age) SELECT 'Ada', 36 UNION ALL SELECT 'Bob', NULL"
        );
    }

    #[test]
    fn test_insert_errors() {
        let t = people();
        let no_columns = Insert::into(&t).values([1.into()]);
        assert!(matches!(
            no_columns.to_raw_sql(VersionCode::LATEST),
            Err(CompileError::Incomplete { .. })
        ));

        let short = Insert::into(&t)
            .columns([&t.text("name"), &t.integer("age")])
            .values(["Ada".into()]);
        assert!(matches!(
            short.to_raw_sql(VersionCode::LATEST),
            Err(CompileError::CountMismatch { expected: 2, found: 1, .. })
        ));
    }

    #[test]
    fn test_insert_default_values_and_conflict() {
        let insert = Insert::into(people())
            .default_values()
            .on_conflict(ConflictAlgorithm::Ignore);
        assert_eq!(insert.to_string(), "INSERT OR IGNORE INTO people DEFAULT VALUES");
    }

    #[test]
    fn test_update_binds_values() {
        let t = people();
        let update = Update::table(&t)
            .set(&t.text("name"), "Ada")
            .set(&t.integer("age"), 37)
            .set(&t.text("name"), "Ada L.")
            .where_clause(t.long("_id").eq(1i64));
        let compiled = update.compile(VersionCode::LATEST).unwrap();
        assert_eq!(
            compiled.sql,
            "UPDATE people SET name = ?, age = ? WHERE people._id = ?"
        );
        assert_eq!(compiled.placeholder_count(), compiled.args.len());
        assert_eq!(
            compiled.flatten().1,
            vec![SqlValue::text("Ada L."), SqlValue::Integer(37), SqlValue::Long(1)]
        );
    }

    #[test]
    fn test_statements_from_values() {
        let mut values = ValuesStorage::new();
        values.put_text("name", "Ada");
        values.put_null("nickname");

        assert_eq!(
            Insert::from_values(people(), &values).to_string(),
            "INSERT INTO people (name, nickname) VALUES ('Ada', NULL)"
        );
        assert_eq!(
            Update::from_values(people(), &values).to_string(),
            "UPDATE people SET name = 'Ada', nickname = NULL"
        );
    }

    #[test]
    fn test_delete() {
        let t = people();
        let delete = Delete::from(&t).where_clause(t.integer("age").lt(0));
        assert_eq!(delete.to_string(), "DELETE FROM people WHERE people.age < 0");
    }
}

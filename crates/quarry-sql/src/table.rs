//! Tables and their column handles

use quarry_types::ValueKind;

use crate::compilable::impl_display_as_raw_sql;
use crate::{Compilable, CompileResult, Property, SqlBuilder, TableModelName};

/// A table backing a model, optionally under an alias
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Table {
    model: String,
    name: String,
    alias: Option<String>,
}

impl Table {
    pub fn new(model: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            name: name.into(),
            alias: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Name columns of this table are qualified with
    pub fn qualified_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// Identity of the model bound to this table under its current alias
    pub fn model_name(&self) -> TableModelName {
        TableModelName::new(self.model.as_str(), self.qualified_name())
    }

    pub fn as_alias(&self, alias: impl Into<String>) -> Self {
        Self {
            alias: Some(alias.into()),
            ..self.clone()
        }
    }

    pub fn property(&self, kind: ValueKind, column: &str) -> Property {
        Property::column(kind, &self.model_name(), column)
    }

    pub fn integer(&self, column: &str) -> Property {
        self.property(ValueKind::Integer, column)
    }

    pub fn long(&self, column: &str) -> Property {
        self.property(ValueKind::Long, column)
    }

    pub fn double(&self, column: &str) -> Property {
        self.property(ValueKind::Double, column)
    }

    pub fn text(&self, column: &str) -> Property {
        self.property(ValueKind::Text, column)
    }

    pub fn boolean(&self, column: &str) -> Property {
        self.property(ValueKind::Boolean, column)
    }

    pub fn blob(&self, column: &str) -> Property {
        self.property(ValueKind::Blob, column)
    }

    /// A handle of another instance of this table, re-qualified for this one
    pub fn qualify(&self, property: &Property) -> Property {
        property.with_table(self.model_name())
    }
}

impl Compilable for Table {
    fn append_to_sql_builder(
        &self,
        builder: &mut SqlBuilder,
        _for_validation: bool,
    ) -> CompileResult<()> {
        builder.append_identifier(&self.name)?;
        if let Some(alias) = &self.alias {
            builder.append(" AS ");
            builder.append_identifier(alias)?;
        }
        Ok(())
    }
}

impl From<&Table> for Table {
    fn from(table: &Table) -> Self {
        table.clone()
    }
}

impl_display_as_raw_sql!(Table);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_requalifies_columns() {
        let people = Table::new("Person", "people");
        let boss = people.as_alias("boss");
        let name = people.text("name");

        assert_eq!(boss.to_string(), "people AS boss");
        assert_eq!(boss.qualify(&name).to_string(), "boss.name");
        assert_ne!(boss.qualify(&name), name);
        assert_eq!(boss.model_name(), TableModelName::new("Person", "boss"));
    }
}

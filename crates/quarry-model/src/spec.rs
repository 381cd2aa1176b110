//! Row-type descriptions shared by every model instance

use parking_lot::RwLock;
use quarry_sql::{Property, Table, TableModelName};
use quarry_types::{SqlValue, ValueKind, ValuesStorage};
use std::sync::Arc;

use crate::visitor::ValuesStorageSavingVisitor;
use crate::{Model, ModelResult};

/// Describes a row type: its name, its table, its columns and the defaults
/// every instance falls back to.
///
/// The default store is shared by all instances and never copied into them.
/// Overriding a default is a global change seen immediately by every
/// instance; overriding several defaults is not atomic across keys.
#[derive(Debug)]
pub struct ModelSpec {
    name: String,
    table: Table,
    table_model_name: TableModelName,
    properties: Vec<Property>,
    defaults: RwLock<ValuesStorage>,
}

impl ModelSpec {
    pub fn builder(name: impl Into<String>, table: impl Into<String>) -> ModelSpecBuilder {
        let name = name.into();
        ModelSpecBuilder {
            table: Table::new(name.as_str(), table),
            name,
            properties: Vec::new(),
            defaults: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn table_model_name(&self) -> &TableModelName {
        &self.table_model_name
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// Column handle by column name
    pub fn property(&self, column: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.expression() == column)
    }

    /// Create an empty instance of this row type
    pub fn instantiate(self: &Arc<Self>) -> Model {
        Model::new(Arc::clone(self))
    }

    /// Snapshot of the default store
    pub fn default_values(&self) -> ValuesStorage {
        self.defaults.read().clone()
    }

    pub fn default_value(&self, key: &str) -> Option<SqlValue> {
        self.defaults.read().get(key).cloned()
    }

    /// Replace the default of `property` for every instance
    pub fn override_default(
        &self,
        property: &Property,
        value: impl Into<SqlValue>,
    ) -> ModelResult<()> {
        let value = value.into();
        log::debug!(
            "overriding default of {}.{} with {}",
            self.name,
            property.expression(),
            value
        );
        ValuesStorageSavingVisitor::NATIVE.save(property, &mut self.defaults.write(), &value)?;
        Ok(())
    }

    /// Remove the default of `property`
    pub fn clear_default(&self, property: &Property) -> Option<SqlValue> {
        log::debug!("clearing default of {}.{}", self.name, property.expression());
        self.defaults.write().remove(property.expression())
    }
}

/// Builder for [`ModelSpec`]
#[derive(Debug, Clone)]
pub struct ModelSpecBuilder {
    name: String,
    table: Table,
    properties: Vec<Property>,
    defaults: Vec<(Property, SqlValue)>,
}

impl ModelSpecBuilder {
    pub fn column(mut self, kind: ValueKind, column: &str) -> Self {
        self.properties.push(self.table.property(kind, column));
        self
    }

    /// Add a column whose value defaults to `default`
    pub fn column_with_default(
        mut self,
        kind: ValueKind,
        column: &str,
        default: impl Into<SqlValue>,
    ) -> Self {
        let property = self.table.property(kind, column);
        self.defaults.push((property.clone(), default.into()));
        self.properties.push(property);
        self
    }

    /// Build the row type, casting every default to its column's kind
    pub fn build(self) -> ModelResult<Arc<ModelSpec>> {
        let mut defaults = ValuesStorage::new();
        for (property, value) in &self.defaults {
            ValuesStorageSavingVisitor::NATIVE.save(property, &mut defaults, value)?;
        }
        Ok(Arc::new(ModelSpec {
            table_model_name: self.table.model_name(),
            name: self.name,
            table: self.table,
            properties: self.properties,
            defaults: RwLock::new(defaults),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> Arc<ModelSpec> {
        ModelSpec::builder("Person", "people")
            .column(ValueKind::Long, "_id")
            .column(ValueKind::Text, "name")
            .column_with_default(ValueKind::Integer, "lucky_number", 7)
            .column_with_default(ValueKind::Boolean, "active", 1)
            .build()
            .unwrap()
    }

    #[test]
    fn test_defaults_are_cast() {
        let spec = person();
        assert_eq!(spec.default_value("lucky_number"), Some(SqlValue::Integer(7)));
        assert_eq!(spec.default_value("active"), Some(SqlValue::Boolean(true)));
        assert_eq!(spec.default_value("name"), None);
    }

    #[test]
    fn test_invalid_default_fails_build() {
        let result = ModelSpec::builder("Person", "people")
            .column_with_default(ValueKind::Blob, "avatar", "not bytes")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_property_lookup() {
        let spec = person();
        let name = spec.property("name").unwrap();
        assert_eq!(name.kind(), ValueKind::Text);
        assert!(name.belongs_to(spec.table_model_name()));
        assert!(spec.property("missing").is_none());
    }

    #[test]
    fn test_override_and_clear_default() {
        let spec = person();
        let lucky = spec.property("lucky_number").unwrap().clone();
        spec.override_default(&lucky, "8").unwrap();
        assert_eq!(spec.default_value("lucky_number"), Some(SqlValue::Integer(8)));
        assert_eq!(spec.clear_default(&lucky), Some(SqlValue::Integer(8)));
        assert_eq!(spec.default_values().len(), 1);
    }
}

//! Rows that models can be read from

use quarry_sql::Property;
use quarry_types::SqlValue;

/// A result-set row addressed by column handle
pub trait RowSource {
    /// Whether the row carries a column for `property`
    fn has(&self, property: &Property) -> bool;

    /// Value of `property`'s column, `None` when the row lacks the column
    fn get(&self, property: &Property) -> Option<SqlValue>;

    /// Every column handle the row carries, in result-set order
    fn properties(&self) -> &[Property];
}

/// An in-memory row, e.g. one fetched by an executor
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    properties: Vec<Property>,
    values: Vec<SqlValue>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column, replacing the value of an existing one
    pub fn with(mut self, property: &Property, value: impl Into<SqlValue>) -> Self {
        let value = value.into();
        match self.position(property) {
            Some(i) => self.values[i] = value,
            None => {
                self.properties.push(property.clone());
                self.values.push(value);
            }
        }
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn position(&self, property: &Property) -> Option<usize> {
        self.properties.iter().position(|p| p == property)
    }
}

impl RowSource for Row {
    fn has(&self, property: &Property) -> bool {
        self.position(property).is_some()
    }

    fn get(&self, property: &Property) -> Option<SqlValue> {
        self.position(property).map(|i| self.values[i].clone())
    }

    fn properties(&self) -> &[Property] {
        &self.properties
    }
}

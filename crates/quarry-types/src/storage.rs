//! Ordered key/value stores backing model rows

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::SqlValue;

/// Ordered mapping from storage key to column value.
///
/// A key holds at most one value. A missing key and a key explicitly mapped
/// to [`SqlValue::Null`] are different states.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValuesStorage {
    values: IndexMap<String, SqlValue>,
}

impl ValuesStorage {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an integer
    pub fn put_integer(&mut self, key: impl Into<String>, value: i32) {
        self.values.insert(key.into(), SqlValue::Integer(value));
    }

    /// Insert a long
    pub fn put_long(&mut self, key: impl Into<String>, value: i64) {
        self.values.insert(key.into(), SqlValue::Long(value));
    }

    /// Insert a double
    pub fn put_double(&mut self, key: impl Into<String>, value: f64) {
        self.values.insert(key.into(), SqlValue::Double(value));
    }

    /// Insert text
    pub fn put_text(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), SqlValue::Text(value.into()));
    }

    /// Insert a boolean
    pub fn put_boolean(&mut self, key: impl Into<String>, value: bool) {
        self.values.insert(key.into(), SqlValue::Boolean(value));
    }

    /// Insert a blob
    pub fn put_blob(&mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.values.insert(key.into(), SqlValue::Blob(value.into()));
    }

    /// Map a key to an explicit null
    pub fn put_null(&mut self, key: impl Into<String>) {
        self.values.insert(key.into(), SqlValue::Null);
    }

    /// Insert any value, whatever its kind
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<SqlValue>) {
        self.values.insert(key.into(), value.into());
    }

    /// Get the value for a key
    pub fn get(&self, key: &str) -> Option<&SqlValue> {
        self.values.get(key)
    }

    /// Check whether the key is present (including explicit nulls)
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Remove a key, preserving the order of the remaining entries
    pub fn remove(&mut self, key: &str) -> Option<SqlValue> {
        self.values.shift_remove(key)
    }

    /// Copy every entry of `other` into this store, overwriting on collision
    pub fn put_all(&mut self, other: &ValuesStorage) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the store has no entries
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Remove every entry
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Serialize the store to a JSON object
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Load a store from a JSON object produced by [`ValuesStorage::to_json`]
    pub fn from_json(input: &str) -> serde_json::Result<Self> {
        serde_json::from_str(input)
    }
}

impl Hash for ValuesStorage {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Equality ignores insertion order, so the hash has to as well
        let mut entries: Vec<_> = self.values.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries.len().hash(state);
        for (key, value) in entries {
            key.hash(state);
            value.hash(state);
        }
    }
}

impl fmt::Display for ValuesStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", key, value)?;
        }
        write!(f, "}}")
    }
}

impl From<HashMap<String, SqlValue>> for ValuesStorage {
    fn from(map: HashMap<String, SqlValue>) -> Self {
        Self {
            values: map.into_iter().collect(),
        }
    }
}

impl FromIterator<(String, SqlValue)> for ValuesStorage {
    fn from_iter<I: IntoIterator<Item = (String, SqlValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ValuesStorage {
    type Item = (&'a String, &'a SqlValue);
    type IntoIter = indexmap::map::Iter<'a, String, SqlValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

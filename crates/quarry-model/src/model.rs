//! Layered value resolution for a single row

use quarry_sql::{Property, TableModelName};
use quarry_types::{FromSqlValue, SqlValue, ValuesStorage};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::visitor::{ValueCastingVisitor, ValuesStorageSavingVisitor};
use crate::{ModelError, ModelResult, ModelSpec, RowSource};

/// Short-lived metadata attached to a model, never persisted
pub type TransitoryValue = Arc<dyn Any + Send + Sync>;

/// A row of a model type, resolving column values from layered stores.
///
/// Values of the model's own table are looked up in the values set by the
/// caller, then in the values read from the database, then in the row type's
/// defaults. Values of columns from other tables (e.g. joined columns) live
/// in a separate store and have no fallback.
///
/// Every value is cast to its column's declared kind both when it is stored
/// and when it is read back.
#[derive(Debug, Clone)]
pub struct Model {
    spec: Arc<ModelSpec>,
    set_values: Option<ValuesStorage>,
    values: Option<ValuesStorage>,
    other_table_values: Option<ValuesStorage>,
    transitory: Option<HashMap<String, TransitoryValue>>,
}

/// Values cast and keyed, waiting to be committed to a model
#[derive(Default)]
struct Staged {
    native: ValuesStorage,
    foreign: ValuesStorage,
}

impl Model {
    pub fn new(spec: Arc<ModelSpec>) -> Self {
        Self {
            spec,
            set_values: None,
            values: None,
            other_table_values: None,
            transitory: None,
        }
    }

    pub fn spec(&self) -> &Arc<ModelSpec> {
        &self.spec
    }

    fn owner(&self) -> &TableModelName {
        self.spec.table_model_name()
    }

    fn is_native(&self, property: &Property) -> bool {
        property.belongs_to(self.owner())
    }

    fn storage_key(&self, property: &Property) -> String {
        property.name_for_model_storage(self.owner())
    }

    // --- reading values

    /// Uncast value of `property` from the highest-precedence store holding it
    fn lookup(&self, property: &Property) -> Option<SqlValue> {
        let key = self.storage_key(property);
        if !self.is_native(property) {
            return self
                .other_table_values
                .as_ref()
                .and_then(|store| store.get(&key))
                .cloned();
        }
        [&self.set_values, &self.values]
            .into_iter()
            .flatten()
            .find_map(|store| store.get(&key))
            .cloned()
            .or_else(|| self.spec.default_value(&key))
    }

    /// Value of `property`, cast to its kind; `Ok(None)` when no store has it
    pub fn try_get(&self, property: &Property) -> ModelResult<Option<SqlValue>> {
        match self.lookup(property) {
            Some(value) => Ok(Some(ValueCastingVisitor.cast(property, &value)?)),
            None => Ok(None),
        }
    }

    /// Value of `property`, cast to its kind
    pub fn get(&self, property: &Property) -> ModelResult<SqlValue> {
        self.try_get(property)?
            .ok_or_else(|| ModelError::ValueNotFound {
                model: self.spec.name().to_string(),
                key: self.storage_key(property),
            })
    }

    /// Value of `property` extracted as a Rust type
    pub fn get_as<T: FromSqlValue>(&self, property: &Property) -> ModelResult<T> {
        Ok(T::from_sql_value(&self.get(property)?)?)
    }

    /// Whether a value was set or read for `property`; defaults don't count
    pub fn contains_value(&self, property: &Property) -> bool {
        let key = self.storage_key(property);
        self.instance_stores(property)
            .iter()
            .any(|store| store.contains_key(&key))
    }

    /// Whether the set or the read value of `property` is present and not
    /// null; a null set over a non-null read value still counts
    pub fn contains_non_null_value(&self, property: &Property) -> bool {
        let key = self.storage_key(property);
        self.instance_stores(property)
            .iter()
            .any(|store| store.get(&key).is_some_and(|value| !value.is_null()))
    }

    /// Whether `property` has a value set by the caller since the last save
    pub fn is_field_dirty(&self, property: &Property) -> bool {
        self.is_native(property)
            && self
                .set_values
                .as_ref()
                .is_some_and(|store| store.contains_key(property.expression()))
    }

    /// Whether any value was set since the last save
    pub fn is_modified(&self) -> bool {
        self.set_values.as_ref().is_some_and(|store| !store.is_empty())
    }

    /// Stores a lookup of `property` consults, excluding defaults
    fn instance_stores(&self, property: &Property) -> Vec<&ValuesStorage> {
        if self.is_native(property) {
            [&self.set_values, &self.values].into_iter().flatten().collect()
        } else {
            self.other_table_values.iter().collect()
        }
    }

    /// Defaults overlaid by database values overlaid by set values
    pub fn merged_values(&self) -> ValuesStorage {
        let mut merged = self.spec.default_values();
        for store in [&self.values, &self.set_values].into_iter().flatten() {
            merged.put_all(store);
        }
        merged
    }

    /// Values set by the caller since the last save
    pub fn set_values(&self) -> Option<&ValuesStorage> {
        self.set_values.as_ref()
    }

    /// Values read from the database or folded in by [`Model::mark_saved`]
    pub fn database_values(&self) -> Option<&ValuesStorage> {
        self.values.as_ref()
    }

    /// Values of columns belonging to other tables
    pub fn other_table_values(&self) -> Option<&ValuesStorage> {
        self.other_table_values.as_ref()
    }

    pub fn default_values(&self) -> ValuesStorage {
        self.spec.default_values()
    }

    // --- writing values

    /// Set `property` to `value`, cast to the column's kind.
    ///
    /// A failed cast leaves the model unchanged. Setting a native column to
    /// the value already read from the database, without an earlier set,
    /// records nothing.
    pub fn set(&mut self, property: &Property, value: impl Into<SqlValue>) -> ModelResult<()> {
        let value = ValueCastingVisitor.cast(property, &value.into())?;
        self.commit_set(property, value);
        Ok(())
    }

    fn commit_set(&mut self, property: &Property, value: SqlValue) {
        let key = self.storage_key(property);
        if !self.is_native(property) {
            self.other_table_values
                .get_or_insert_with(ValuesStorage::new)
                .put(key, value);
        } else if self.should_save_value(&key, &value) {
            self.set_values
                .get_or_insert_with(ValuesStorage::new)
                .put(key, value);
        } else {
            log::debug!(
                "{}: '{}' already holds {}, not marking it dirty",
                self.spec.name(),
                key,
                value
            );
        }
    }

    /// Skip writes that would not change the row as stored in the database
    fn should_save_value(&self, key: &str, value: &SqlValue) -> bool {
        if self
            .set_values
            .as_ref()
            .is_some_and(|store| store.contains_key(key))
        {
            return true;
        }
        match self.values.as_ref().and_then(|store| store.get(key)) {
            Some(existing) => existing != value,
            None => true,
        }
    }

    /// Set every listed property found in `values`, as if by [`Model::set`].
    ///
    /// All values are cast before any is recorded.
    pub fn set_from_storage(
        &mut self,
        values: &ValuesStorage,
        properties: &[Property],
    ) -> ModelResult<()> {
        self.set_keyed(|_, key| values.get(key).cloned(), properties)
    }

    pub fn set_from_map(
        &mut self,
        values: &HashMap<String, SqlValue>,
        properties: &[Property],
    ) -> ModelResult<()> {
        self.set_keyed(|_, key| values.get(key).cloned(), properties)
    }

    /// Set every listed property `other` resolves a value for, as if by
    /// [`Model::set`]
    pub fn set_from_model(&mut self, other: &Model, properties: &[Property]) -> ModelResult<()> {
        self.set_keyed(|property, _| other.lookup(property), properties)
    }

    fn set_keyed(
        &mut self,
        lookup: impl Fn(&Property, &str) -> Option<SqlValue>,
        properties: &[Property],
    ) -> ModelResult<()> {
        let mut staged = Vec::with_capacity(properties.len());
        for property in properties {
            if let Some(value) = lookup(property, &self.storage_key(property)) {
                staged.push((property, ValueCastingVisitor.cast(property, &value)?));
            }
        }
        for (property, value) in staged {
            self.commit_set(property, value);
        }
        Ok(())
    }

    /// Remove the set and database values of `property`
    pub fn clear_value(&mut self, property: &Property) {
        let key = self.storage_key(property);
        if !self.is_native(property) {
            if let Some(store) = &mut self.other_table_values {
                store.remove(&key);
            }
            return;
        }
        for store in [&mut self.set_values, &mut self.values].into_iter().flatten() {
            store.remove(&key);
        }
    }

    // --- reading rows

    /// Read the listed properties from a row as database values.
    ///
    /// Values already read for other columns are kept; set values and
    /// transitory data are discarded. When any value fails to cast the
    /// model is left untouched.
    pub fn read_from_source<S: RowSource + ?Sized>(
        &mut self,
        source: &S,
        properties: &[Property],
    ) -> ModelResult<()> {
        let staged = self.stage_from_source(source, properties)?;
        self.commit_read(staged, false);
        Ok(())
    }

    /// Read every column of a row, replacing all database values
    pub fn read_all_from_source<S: RowSource + ?Sized>(&mut self, source: &S) -> ModelResult<()> {
        let staged = self.stage_from_source(source, source.properties())?;
        self.commit_read(staged, true);
        Ok(())
    }

    /// Read the listed properties found in `values` as database values
    pub fn read_from_storage(
        &mut self,
        values: &ValuesStorage,
        properties: &[Property],
    ) -> ModelResult<()> {
        let staged = self.stage_keyed(|key| values.get(key), properties)?;
        self.commit_read(staged, false);
        Ok(())
    }

    pub fn read_from_map(
        &mut self,
        values: &HashMap<String, SqlValue>,
        properties: &[Property],
    ) -> ModelResult<()> {
        let staged = self.stage_keyed(|key| values.get(key), properties)?;
        self.commit_read(staged, false);
        Ok(())
    }

    fn saver_for(&self, property: &Property) -> ValuesStorageSavingVisitor {
        if self.is_native(property) {
            ValuesStorageSavingVisitor::NATIVE
        } else {
            ValuesStorageSavingVisitor::FOREIGN
        }
    }

    fn stage_one(
        &self,
        staged: &mut Staged,
        property: &Property,
        value: &SqlValue,
    ) -> ModelResult<()> {
        let store = if self.is_native(property) {
            &mut staged.native
        } else {
            &mut staged.foreign
        };
        self.saver_for(property).save(property, store, value)?;
        Ok(())
    }

    fn stage_from_source<S: RowSource + ?Sized>(
        &self,
        source: &S,
        properties: &[Property],
    ) -> ModelResult<Staged> {
        log::trace!(
            "{}: reading {} columns from row",
            self.spec.name(),
            properties.len()
        );
        let mut staged = Staged::default();
        for property in properties {
            if !source.has(property) {
                continue;
            }
            match source.get(property) {
                Some(value) => self.stage_one(&mut staged, property, &value)?,
                None => log::warn!(
                    "{}: row reports column '{}' but has no value for it",
                    self.spec.name(),
                    property.select_name()
                ),
            }
        }
        Ok(staged)
    }

    fn stage_keyed<'a>(
        &self,
        lookup: impl Fn(&str) -> Option<&'a SqlValue>,
        properties: &[Property],
    ) -> ModelResult<Staged> {
        log::trace!(
            "{}: reading {} columns from values",
            self.spec.name(),
            properties.len()
        );
        let mut staged = Staged::default();
        for property in properties {
            if let Some(value) = lookup(&self.storage_key(property)) {
                self.stage_one(&mut staged, property, value)?;
            }
        }
        Ok(staged)
    }

    fn commit_read(&mut self, staged: Staged, replace: bool) {
        self.set_values = None;
        self.transitory = None;
        if replace {
            self.values = Some(staged.native);
            self.other_table_values = Some(staged.foreign);
            return;
        }
        self.values
            .get_or_insert_with(ValuesStorage::new)
            .put_all(&staged.native);
        self.other_table_values
            .get_or_insert_with(ValuesStorage::new)
            .put_all(&staged.foreign);
    }

    // --- lifecycle

    /// Fold set values into database values, e.g. after the row was written
    pub fn mark_saved(&mut self) {
        if let Some(set) = self.set_values.take() {
            match &mut self.values {
                Some(values) => values.put_all(&set),
                None => self.values = Some(set),
            }
        }
    }

    /// Discard every instance store; the row type's defaults remain
    pub fn clear(&mut self) {
        self.set_values = None;
        self.values = None;
        self.other_table_values = None;
        self.transitory = None;
    }

    // --- transitory data

    pub fn put_transitory(&mut self, key: impl Into<String>, value: impl Any + Send + Sync) {
        self.transitory
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), Arc::new(value));
    }

    /// Transitory value under `key`, if present and of type `T`
    pub fn get_transitory<T: Any>(&self, key: &str) -> Option<&T> {
        self.transitory
            .as_ref()?
            .get(key)
            .and_then(|value| value.downcast_ref::<T>())
    }

    pub fn clear_transitory(&mut self, key: &str) -> Option<TransitoryValue> {
        self.transitory.as_mut()?.remove(key)
    }

    pub fn has_transitory(&self, key: &str) -> bool {
        self.transitory
            .as_ref()
            .is_some_and(|map| map.contains_key(key))
    }

    /// Remove `key`, reporting whether it was present
    pub fn check_and_clear_transitory(&mut self, key: &str) -> bool {
        self.clear_transitory(key).is_some()
    }

    pub fn transitory_keys(&self) -> Vec<&str> {
        self.transitory
            .iter()
            .flat_map(|map| map.keys().map(String::as_str))
            .collect()
    }
}

/// A model is a row source for copying values between rows of one type
impl RowSource for Model {
    fn has(&self, property: &Property) -> bool {
        self.lookup(property).is_some()
    }

    fn get(&self, property: &Property) -> Option<SqlValue> {
        self.lookup(property)
    }

    fn properties(&self) -> &[Property] {
        self.spec.properties()
    }
}

impl PartialEq for Model {
    fn eq(&self, other: &Self) -> bool {
        self.spec.table_model_name() == other.spec.table_model_name()
            && self.merged_values() == other.merged_values()
    }
}

impl Hash for Model {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.spec.table_model_name().hash(state);
        self.merged_values().hash(state);
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |store: &Option<ValuesStorage>| {
            store
                .as_ref()
                .map_or_else(|| "{}".to_string(), ToString::to_string)
        };
        write!(
            f,
            "{} {{set: {}, values: {}}}",
            self.spec.name(),
            show(&self.set_values),
            show(&self.values)
        )
    }
}

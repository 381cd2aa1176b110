//! Kind-dispatched casting and storage of column values

use quarry_sql::{Property, PropertyVisitor};
use quarry_types::{CoercionResult, SqlValue, TypeCoercer, ValuesStorage};

/// Casts a value to the kind declared by the visited property.
///
/// Null passes through as null.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueCastingVisitor;

impl ValueCastingVisitor {
    pub fn cast(&self, property: &Property, value: &SqlValue) -> CoercionResult<SqlValue> {
        property.accept(self, value)
    }
}

impl<'v> PropertyVisitor<&'v SqlValue> for ValueCastingVisitor {
    type Output = CoercionResult<SqlValue>;

    fn visit_integer(&self, _property: &Property, value: &'v SqlValue) -> Self::Output {
        TypeCoercer.to_integer(value).map(SqlValue::from)
    }

    fn visit_long(&self, _property: &Property, value: &'v SqlValue) -> Self::Output {
        TypeCoercer.to_long(value).map(SqlValue::from)
    }

    fn visit_double(&self, _property: &Property, value: &'v SqlValue) -> Self::Output {
        TypeCoercer.to_double(value).map(SqlValue::from)
    }

    fn visit_text(&self, _property: &Property, value: &'v SqlValue) -> Self::Output {
        TypeCoercer.to_text(value).map(SqlValue::from)
    }

    fn visit_boolean(&self, _property: &Property, value: &'v SqlValue) -> Self::Output {
        TypeCoercer.to_boolean(value).map(SqlValue::from)
    }

    fn visit_blob(&self, _property: &Property, value: &'v SqlValue) -> Self::Output {
        TypeCoercer.to_blob(value).map(SqlValue::from)
    }
}

/// Which key a saved value is stored under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyMode {
    /// The property's expression, for columns of the model's own table
    Native,
    /// The property's select name, for columns of other tables
    Foreign,
}

/// Writes a value into a [`ValuesStorage`] using the typed write matching the
/// visited property's kind.
///
/// Null is written as an explicit null; anything else is cast first, and a
/// failed cast writes nothing.
#[derive(Debug, Clone, Copy)]
pub struct ValuesStorageSavingVisitor {
    mode: KeyMode,
}

impl ValuesStorageSavingVisitor {
    /// Saver keyed by expression
    pub const NATIVE: Self = Self {
        mode: KeyMode::Native,
    };

    /// Saver keyed by select name
    pub const FOREIGN: Self = Self {
        mode: KeyMode::Foreign,
    };

    pub fn save(
        &self,
        property: &Property,
        store: &mut ValuesStorage,
        value: &SqlValue,
    ) -> CoercionResult<()> {
        if value.is_null() {
            store.put_null(self.key(property));
            return Ok(());
        }
        property.accept(self, (store, value))
    }

    fn key(&self, property: &Property) -> String {
        match self.mode {
            KeyMode::Native => property.expression().to_string(),
            KeyMode::Foreign => property.select_name(),
        }
    }
}

macro_rules! save_typed {
    ($self:ident, $property:ident, $store:ident, $value:ident, $cast:ident, $put:ident) => {
        match TypeCoercer.$cast($value)? {
            Some(v) => $store.$put($self.key($property), v),
            None => $store.put_null($self.key($property)),
        }
    };
}

impl<'s, 'v> PropertyVisitor<(&'s mut ValuesStorage, &'v SqlValue)> for ValuesStorageSavingVisitor {
    type Output = CoercionResult<()>;

    fn visit_integer(
        &self,
        property: &Property,
        (store, value): (&'s mut ValuesStorage, &'v SqlValue),
    ) -> Self::Output {
        save_typed!(self, property, store, value, to_integer, put_integer);
        Ok(())
    }

    fn visit_long(
        &self,
        property: &Property,
        (store, value): (&'s mut ValuesStorage, &'v SqlValue),
    ) -> Self::Output {
        save_typed!(self, property, store, value, to_long, put_long);
        Ok(())
    }

    fn visit_double(
        &self,
        property: &Property,
        (store, value): (&'s mut ValuesStorage, &'v SqlValue),
    ) -> Self::Output {
        save_typed!(self, property, store, value, to_double, put_double);
        Ok(())
    }

    fn visit_text(
        &self,
        property: &Property,
        (store, value): (&'s mut ValuesStorage, &'v SqlValue),
    ) -> Self::Output {
        save_typed!(self, property, store, value, to_text, put_text);
        Ok(())
    }

    fn visit_boolean(
        &self,
        property: &Property,
        (store, value): (&'s mut ValuesStorage, &'v SqlValue),
    ) -> Self::Output {
        save_typed!(self, property, store, value, to_boolean, put_boolean);
        Ok(())
    }

    fn visit_blob(
        &self,
        property: &Property,
        (store, value): (&'s mut ValuesStorage, &'v SqlValue),
    ) -> Self::Output {
        save_typed!(self, property, store, value, to_blob, put_blob);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_sql::Table;

    #[test]
    fn test_cast_follows_declared_kind() {
        let t = Table::new("Person", "people");
        let caster = ValueCastingVisitor;
        assert_eq!(
            caster.cast(&t.boolean("active"), &SqlValue::Integer(1)).unwrap(),
            SqlValue::Boolean(true)
        );
        assert_eq!(
            caster.cast(&t.long("born"), &SqlValue::text("12")).unwrap(),
            SqlValue::Long(12)
        );
        assert!(caster.cast(&t.boolean("active"), &SqlValue::text("yes")).is_err());
        assert_eq!(caster.cast(&t.blob("avatar"), &SqlValue::Null).unwrap(), SqlValue::Null);
    }

    #[test]
    fn test_saver_keys() {
        let t = Table::new("Person", "people");
        let name = t.text("name");
        let mut store = ValuesStorage::new();

        ValuesStorageSavingVisitor::NATIVE
            .save(&name, &mut store, &SqlValue::Integer(5))
            .unwrap();
        ValuesStorageSavingVisitor::FOREIGN
            .save(&name, &mut store, &SqlValue::Null)
            .unwrap();

        assert_eq!(store.get("name"), Some(&SqlValue::text("5")));
        assert_eq!(store.get("people.name"), Some(&SqlValue::Null));
    }

    #[test]
    fn test_failed_save_writes_nothing() {
        let t = Table::new("Person", "people");
        let mut store = ValuesStorage::new();
        let result =
            ValuesStorageSavingVisitor::NATIVE.save(&t.blob("avatar"), &mut store, &"x".into());
        assert!(result.is_err());
        assert!(store.is_empty());
    }
}

//! Value coercion rules
//!
//! Every value read from or written to a model is cast to the declared kind
//! of its column. The rules per target kind are:
//! - Integer, Long, Double: numeric input widens or narrows, booleans map to
//!   1/0, text must parse as the target kind
//! - Text: any non-null value is rendered in its canonical text form
//! - Boolean: booleans pass, numbers are `!= 0`, anything else fails
//! - Blob: only blobs pass
//!
//! Null always passes through unchanged.

use quarry_diagnostics::{QRY0001, QRY0002, QuarryError};
use thiserror::Error;

use crate::{SqlValue, ValueKind};

/// Why a cast failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoercionReason {
    /// The value's kind has no conversion to the target kind
    WrongKind,
    /// Text could not be parsed as the numeric target kind
    UnparsableText,
    /// A non-nullable target received null
    Null,
}

/// A value could not be cast to a column's declared kind
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Value {value} could not be cast to {target}")]
pub struct CoercionError {
    /// The offending value
    pub value: SqlValue,
    /// The kind the value was cast to
    pub target: ValueKind,
    pub reason: CoercionReason,
}

impl CoercionError {
    fn new(value: &SqlValue, target: ValueKind, reason: CoercionReason) -> Self {
        Self {
            value: value.clone(),
            target,
            reason,
        }
    }

    /// Error code for this failure
    pub fn code(&self) -> quarry_diagnostics::ErrorCode {
        match self.reason {
            CoercionReason::UnparsableText => QRY0002,
            CoercionReason::WrongKind | CoercionReason::Null => QRY0001,
        }
    }
}

impl From<CoercionError> for QuarryError {
    fn from(err: CoercionError) -> Self {
        QuarryError::coercion(
            err.code(),
            err.to_string(),
            err.value.to_string(),
            err.target.name(),
        )
    }
}

/// Coercion result
pub type CoercionResult<T> = Result<T, CoercionError>;

/// Casts dynamically-typed values to column kinds.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeCoercer;

impl TypeCoercer {
    /// Create a new type coercer
    pub fn new() -> Self {
        Self
    }

    /// Cast `value` to `kind`, keeping null as null
    pub fn cast(&self, kind: ValueKind, value: &SqlValue) -> CoercionResult<SqlValue> {
        Ok(match kind {
            ValueKind::Integer => self.to_integer(value)?.into(),
            ValueKind::Long => self.to_long(value)?.into(),
            ValueKind::Double => self.to_double(value)?.into(),
            ValueKind::Text => self.to_text(value)?.into(),
            ValueKind::Boolean => self.to_boolean(value)?.into(),
            ValueKind::Blob => self.to_blob(value)?.into(),
        })
    }

    pub fn to_integer(&self, value: &SqlValue) -> CoercionResult<Option<i32>> {
        match value {
            SqlValue::Null => Ok(None),
            SqlValue::Integer(i) => Ok(Some(*i)),
            SqlValue::Long(l) => Ok(Some(*l as i32)),
            SqlValue::Double(d) => Ok(Some(*d as i32)),
            SqlValue::Boolean(b) => Ok(Some(i32::from(*b))),
            SqlValue::Text(s) => s.parse().map(Some).map_err(|_| {
                CoercionError::new(value, ValueKind::Integer, CoercionReason::UnparsableText)
            }),
            SqlValue::Blob(_) => Err(CoercionError::new(
                value,
                ValueKind::Integer,
                CoercionReason::WrongKind,
            )),
        }
    }

    pub fn to_long(&self, value: &SqlValue) -> CoercionResult<Option<i64>> {
        match value {
            SqlValue::Null => Ok(None),
            SqlValue::Integer(i) => Ok(Some(i64::from(*i))),
            SqlValue::Long(l) => Ok(Some(*l)),
            SqlValue::Double(d) => Ok(Some(*d as i64)),
            SqlValue::Boolean(b) => Ok(Some(i64::from(*b))),
            SqlValue::Text(s) => s.parse().map(Some).map_err(|_| {
                CoercionError::new(value, ValueKind::Long, CoercionReason::UnparsableText)
            }),
            SqlValue::Blob(_) => Err(CoercionError::new(
                value,
                ValueKind::Long,
                CoercionReason::WrongKind,
            )),
        }
    }

    pub fn to_double(&self, value: &SqlValue) -> CoercionResult<Option<f64>> {
        match value {
            SqlValue::Null => Ok(None),
            SqlValue::Integer(i) => Ok(Some(f64::from(*i))),
            SqlValue::Long(l) => Ok(Some(*l as f64)),
            SqlValue::Double(d) => Ok(Some(*d)),
            SqlValue::Boolean(b) => Ok(Some(if *b { 1.0 } else { 0.0 })),
            SqlValue::Text(s) => s.parse().map(Some).map_err(|_| {
                CoercionError::new(value, ValueKind::Double, CoercionReason::UnparsableText)
            }),
            SqlValue::Blob(_) => Err(CoercionError::new(
                value,
                ValueKind::Double,
                CoercionReason::WrongKind,
            )),
        }
    }

    pub fn to_text(&self, value: &SqlValue) -> CoercionResult<Option<String>> {
        Ok(value.to_canonical_text())
    }

    pub fn to_boolean(&self, value: &SqlValue) -> CoercionResult<Option<bool>> {
        match value {
            SqlValue::Null => Ok(None),
            SqlValue::Boolean(b) => Ok(Some(*b)),
            SqlValue::Integer(i) => Ok(Some(*i != 0)),
            SqlValue::Long(l) => Ok(Some(*l != 0)),
            SqlValue::Double(d) => Ok(Some(*d != 0.0)),
            SqlValue::Text(_) | SqlValue::Blob(_) => Err(CoercionError::new(
                value,
                ValueKind::Boolean,
                CoercionReason::WrongKind,
            )),
        }
    }

    pub fn to_blob(&self, value: &SqlValue) -> CoercionResult<Option<Vec<u8>>> {
        match value {
            SqlValue::Null => Ok(None),
            SqlValue::Blob(b) => Ok(Some(b.clone())),
            _ => Err(CoercionError::new(
                value,
                ValueKind::Blob,
                CoercionReason::WrongKind,
            )),
        }
    }
}

/// Rust types that a column value can be extracted into.
///
/// `Option<T>` maps null to `None`; the plain types reject null.
pub trait FromSqlValue: Sized {
    /// Column kind this type corresponds to
    const KIND: ValueKind;

    /// Cast `value` to [`Self::KIND`] and unwrap it
    fn from_sql_value(value: &SqlValue) -> CoercionResult<Self>;
}

macro_rules! impl_from_sql_value {
    ($ty:ty, $kind:expr, $method:ident) => {
        impl FromSqlValue for $ty {
            const KIND: ValueKind = $kind;

            fn from_sql_value(value: &SqlValue) -> CoercionResult<Self> {
                TypeCoercer
                    .$method(value)?
                    .ok_or_else(|| CoercionError::new(value, $kind, CoercionReason::Null))
            }
        }
    };
}

impl_from_sql_value!(i32, ValueKind::Integer, to_integer);
impl_from_sql_value!(i64, ValueKind::Long, to_long);
impl_from_sql_value!(f64, ValueKind::Double, to_double);
impl_from_sql_value!(String, ValueKind::Text, to_text);
impl_from_sql_value!(bool, ValueKind::Boolean, to_boolean);
impl_from_sql_value!(Vec<u8>, ValueKind::Blob, to_blob);

impl<T: FromSqlValue> FromSqlValue for Option<T> {
    const KIND: ValueKind = T::KIND;

    fn from_sql_value(value: &SqlValue) -> CoercionResult<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_sql_value(value).map(Some)
        }
    }
}

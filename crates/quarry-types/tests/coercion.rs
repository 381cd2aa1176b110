//! Coercion tests for the Quarry value types
//!
//! Covers:
//! - Identity casts for every kind
//! - Cross-kind numeric, boolean and text conversions
//! - Failures carrying the offending value and target kind

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use quarry_types::*;
use rstest::rstest;

fn cast(kind: ValueKind, value: impl Into<SqlValue>) -> CoercionResult<SqlValue> {
    TypeCoercer::new().cast(kind, &value.into())
}

// === Identity ===

proptest! {
    #[test]
    fn integer_identity(v in any::<i32>()) {
        prop_assert_eq!(cast(ValueKind::Integer, v).unwrap(), SqlValue::Integer(v));
    }

    #[test]
    fn long_identity(v in any::<i64>()) {
        prop_assert_eq!(cast(ValueKind::Long, v).unwrap(), SqlValue::Long(v));
    }

    #[test]
    fn double_identity(v in any::<f64>().prop_filter("NaN never equals itself", |d| !d.is_nan())) {
        prop_assert_eq!(cast(ValueKind::Double, v).unwrap(), SqlValue::Double(v));
    }

    #[test]
    fn text_identity(v in ".*") {
        prop_assert_eq!(cast(ValueKind::Text, v.clone()).unwrap(), SqlValue::Text(v));
    }

    #[test]
    fn boolean_identity(v in any::<bool>()) {
        prop_assert_eq!(cast(ValueKind::Boolean, v).unwrap(), SqlValue::Boolean(v));
    }

    #[test]
    fn blob_identity(v in proptest::collection::vec(any::<u8>(), 0..64)) {
        prop_assert_eq!(cast(ValueKind::Blob, v.clone()).unwrap(), SqlValue::Blob(v));
    }

    #[test]
    fn integer_text_round_trip(v in any::<i32>()) {
        let text = cast(ValueKind::Text, v).unwrap();
        prop_assert_eq!(cast(ValueKind::Integer, text).unwrap(), SqlValue::Integer(v));
    }
}

#[test]
fn nan_casts_to_nan() {
    let value = cast(ValueKind::Double, f64::NAN).unwrap();
    assert!(value.as_double().is_some_and(f64::is_nan));
}

// === Null passes through every kind ===

#[rstest]
fn null_passes_through(
    #[values(
        ValueKind::Integer,
        ValueKind::Long,
        ValueKind::Double,
        ValueKind::Text,
        ValueKind::Boolean,
        ValueKind::Blob
    )]
    kind: ValueKind,
) {
    assert_eq!(cast(kind, SqlValue::Null).unwrap(), SqlValue::Null);
}

// === Cross-kind conversions ===

#[rstest]
#[case(ValueKind::Integer, SqlValue::text("1"), SqlValue::Integer(1))]
#[case(ValueKind::Integer, SqlValue::Boolean(true), SqlValue::Integer(1))]
#[case(ValueKind::Long, SqlValue::Integer(1), SqlValue::Long(1))]
#[case(ValueKind::Long, SqlValue::text("-9000000000"), SqlValue::Long(-9_000_000_000))]
#[case(ValueKind::Double, SqlValue::Integer(1), SqlValue::Double(1.0))]
#[case(ValueKind::Double, SqlValue::text("2.5"), SqlValue::Double(2.5))]
#[case(ValueKind::Boolean, SqlValue::Integer(1), SqlValue::Boolean(true))]
#[case(ValueKind::Boolean, SqlValue::Long(0), SqlValue::Boolean(false))]
#[case(ValueKind::Boolean, SqlValue::Double(0.5), SqlValue::Boolean(true))]
#[case(ValueKind::Text, SqlValue::Double(1.0), SqlValue::text("1.0"))]
#[case(ValueKind::Text, SqlValue::Boolean(true), SqlValue::text("true"))]
fn converts_across_kinds(#[case] kind: ValueKind, #[case] input: SqlValue, #[case] expected: SqlValue) {
    assert_eq!(cast(kind, input).unwrap(), expected);
}

// === Failures ===

#[rstest]
#[case(ValueKind::Integer, SqlValue::text("one"), CoercionReason::UnparsableText)]
#[case(ValueKind::Integer, SqlValue::text(" 1"), CoercionReason::UnparsableText)]
#[case(ValueKind::Long, SqlValue::blob(vec![1u8]), CoercionReason::WrongKind)]
#[case(ValueKind::Double, SqlValue::text("1,5"), CoercionReason::UnparsableText)]
#[case(ValueKind::Boolean, SqlValue::text("yes"), CoercionReason::WrongKind)]
#[case(ValueKind::Boolean, SqlValue::blob(vec![0u8]), CoercionReason::WrongKind)]
#[case(ValueKind::Blob, SqlValue::Integer(3), CoercionReason::WrongKind)]
fn rejects_invalid_input(
    #[case] kind: ValueKind,
    #[case] input: SqlValue,
    #[case] reason: CoercionReason,
) {
    let err = cast(kind, input.clone()).unwrap_err();
    assert_eq!(err.reason, reason);
    assert_eq!(err.target, kind);
    assert_eq!(err.value, input);
}

#[test]
fn error_message_names_value_and_kind() {
    let err = cast(ValueKind::Boolean, "yes").unwrap_err();
    assert_eq!(err.to_string(), "Value 'yes' could not be cast to Boolean");
}

#[test]
fn extracts_typed_values() {
    assert_eq!(i64::from_sql_value(&SqlValue::Integer(3)).unwrap(), 3);
    assert_eq!(String::from_sql_value(&SqlValue::Long(3)).unwrap(), "3");
    assert_eq!(Option::<bool>::from_sql_value(&SqlValue::Integer(0)).unwrap(), Some(false));
    assert!(bool::from_sql_value(&SqlValue::text("true")).is_err());
}

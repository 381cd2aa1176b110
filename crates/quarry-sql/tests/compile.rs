//! End-to-end compilation tests

use insta::assert_snapshot;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use quarry_sql::{
    BoundArg, Compilable, CompileError, CompileOptions, Criterion, Function, Insert, Join,
    Operand, Property, Query, SelectItem, Table, VersionCode,
};
use quarry_types::SqlValue;
use rstest::rstest;

fn people() -> Table {
    Table::new("Person", "people")
}

fn pets() -> Table {
    Table::new("Pet", "pets")
}

#[test]
fn test_nested_criteria_bind_in_order() {
    let t = people();
    let (a, b, c) = (t.integer("a"), t.integer("b"), t.integer("c"));
    let criterion = a.eq(1).and(b.eq(2).or(c.eq(3)));

    assert_snapshot!(criterion.to_string(), @"(people.a = 1 AND (people.b = 2 OR people.c = 3))");

    let compiled = criterion.compile(VersionCode::LATEST).unwrap();
    assert_eq!(compiled.sql, "(people.a = ? AND (people.b = ? OR people.c = ?))");
    assert_eq!(
        compiled.args,
        vec![
            BoundArg::Value(SqlValue::Integer(1)),
            BoundArg::Value(SqlValue::Integer(2)),
            BoundArg::Value(SqlValue::Integer(3)),
        ]
    );
}

#[test]
fn test_null_is_never_bound() {
    let t = people();
    let query = Query::select_all()
        .from(&t)
        .where_clause(Criterion::binary(
            Function::ifnull(&t.text("nickname"), SqlValue::Null),
            quarry_sql::ComparisonOp::Is,
            Operand::null(),
        ));
    let compiled = query.compile(VersionCode::LATEST).unwrap();
    assert_eq!(
        compiled.sql,
        "SELECT * FROM people WHERE IFNULL(people.nickname, NULL) IS NULL"
    );
    assert!(compiled.args.is_empty());
}

#[test]
fn test_in_list_binds_one_array_argument() {
    let t = people();
    let query = Query::select([t.long("_id")])
        .from(&t)
        .where_clause(t.text("name").in_values(["Ada", "Bob", "Cy"]));

    let compiled = query.compile(VersionCode::LATEST).unwrap();
    assert_eq!(
        compiled.sql,
        "SELECT people._id FROM people WHERE people.name IN (?[])"
    );
    assert_eq!(compiled.args.len(), 1);

    let (sql, args) = compiled.flatten();
    assert_eq!(
        sql,
        "SELECT people._id FROM people WHERE people.name IN (?, ?, ?)"
    );
    assert_eq!(args.len(), 3);
}

#[test]
fn test_empty_in_list() {
    let t = people();
    let criterion = t.long("_id").in_values(Vec::<i64>::new());
    assert_snapshot!(criterion.to_string(), @"people._id IN (SELECT NULL WHERE 0)");

    let (sql, args) = criterion.compile(VersionCode::LATEST).unwrap().flatten();
    assert_eq!(sql, "people._id IN (SELECT NULL WHERE 0)");
    assert!(args.is_empty());
}

#[test]
fn test_join_with_subquery_and_aggregate() {
    let owners = people();
    let animals = pets();
    let owner_id = animals.long("owner_id");
    let pet_count = Query::select([
        SelectItem::from(&owner_id),
        SelectItem::expression(Function::count_all(), "n"),
    ])
    .from(&animals)
    .group_by(&owner_id);

    let query = Query::select([owners.text("name"), Property::unowned(quarry_types::ValueKind::Integer, "counts.n")])
        .from(&owners)
        .join(
            Join::inner(
                quarry_sql::Source::SubQuery {
                    query: Box::new(pet_count),
                    alias: "counts".to_string(),
                },
                Criterion::raw("counts.owner_id = people._id", []),
            ),
        )
        .order_by(owners.text("name").asc());

    assert_snapshot!(
        query.to_string(),
        @"SELECT people.name, counts.n FROM people INNER JOIN (SELECT pets.owner_id, COUNT(*) AS n FROM pets GROUP BY pets.owner_id) AS counts ON (counts.owner_id = people._id) ORDER BY people.name ASC"
    );
}

#[test]
fn test_insert_from_select() {
    let t = people();
    let archive = Table::new("Person", "people_archive");
    let insert = Insert::into(&archive)
        .columns([&t.long("_id"), &t.text("name")])
        .select(
            Query::select([t.long("_id"), t.text("name")])
                .from(&t)
                .where_clause(t.boolean("archived").eq(true)),
        );
    let compiled = insert.compile(VersionCode::LATEST).unwrap();
    assert_eq!(
        compiled.sql,
        "INSERT INTO people_archive (_id, name) SELECT people._id, people.name FROM people \
         WHERE people.archived = ?"
    );
    assert_eq!(compiled.args, vec![BoundArg::Value(SqlValue::Boolean(true))]);
}

#[rstest]
#[case(SqlValue::Integer(7), "7")]
#[case(SqlValue::Long(-7), "-7")]
#[case(SqlValue::Double(0.5), "0.5")]
#[case(SqlValue::Double(f64::NAN), "NULL")]
#[case(SqlValue::Double(f64::INFINITY), "9e999")]
#[case(SqlValue::text("O'Brien"), "'O''Brien'")]
#[case(SqlValue::Boolean(false), "0")]
#[case(SqlValue::blob(vec![0x01, 0xff]), "X'01ff'")]
fn test_inline_literals(#[case] value: SqlValue, #[case] expected: &str) {
    let t = people();
    let criterion = t.text("x").eq(value);
    assert_eq!(criterion.to_string(), format!("people.x = {expected}"));
}

#[rstest]
#[case::separator("1; DROP TABLE people")]
#[case::line_comment("1 -- ignore the rest")]
#[case::block_comment("1 /* hidden */")]
#[case::open_paren("(1")]
#[case::open_quote("name = 'x")]
fn test_validation_rejects(#[case] fragment: &str) {
    let query = Query::select_all()
        .from(people())
        .where_clause(Criterion::raw(fragment, []))
        .request_validation();
    let err = query.to_raw_sql(VersionCode::LATEST).unwrap_err();
    assert!(matches!(err, CompileError::UnsafeFragment { .. }), "{err}");
}

#[test]
fn test_validation_rejects_nul_in_text() {
    let t = people();
    let query = Query::select_all()
        .from(&t)
        .where_clause(t.text("name").eq("a\0b"));
    let options = CompileOptions::new(VersionCode::LATEST).inline().validated();
    assert!(query.compile_with(&options).is_err());
    assert!(query.to_raw_sql(VersionCode::LATEST).is_ok());
}

#[test]
fn test_compile_with_inline_options() {
    let t = people();
    let query = Query::select_all().from(&t).where_clause(t.integer("age").gt(3));
    let compiled = query
        .compile_with(&CompileOptions::new(VersionCode::LATEST).inline())
        .unwrap();
    assert_eq!(compiled.sql, "SELECT * FROM people WHERE people.age > 3");
    assert!(compiled.args.is_empty());
    assert!(!compiled.needs_validation);
}

#[test]
fn test_statement_needs_validation_flag() {
    let query = Query::select_all().from(people()).request_validation();
    assert!(query.compile(VersionCode::LATEST).unwrap().needs_validation);
    assert!(
        !Query::select_all()
            .from(people())
            .compile(VersionCode::LATEST)
            .unwrap()
            .needs_validation
    );
}

fn scalar() -> impl Strategy<Value = SqlValue> {
    prop_oneof![
        Just(SqlValue::Null),
        any::<i32>().prop_map(SqlValue::Integer),
        any::<i64>().prop_map(SqlValue::Long),
        any::<f64>().prop_map(SqlValue::Double),
        "[a-z' ?]{0,8}".prop_map(SqlValue::Text),
        any::<bool>().prop_map(SqlValue::Boolean),
    ]
}

proptest! {
    #[test]
    fn placeholders_match_arguments(
        values in prop::collection::vec(scalar(), 1..6),
        list in prop::collection::vec(any::<i32>(), 0..4),
    ) {
        let t = people();
        let criteria = values
            .iter()
            .enumerate()
            .map(|(i, v)| t.text(&format!("c{i}")).eq(v.clone()));
        let query = Query::select_all()
            .from(&t)
            .where_clause(Criterion::any(criteria))
            .where_clause(t.integer("n").in_values(list.clone()));

        let compiled = query.compile(VersionCode::LATEST).unwrap();
        prop_assert_eq!(compiled.placeholder_count(), compiled.args.len());

        let (sql, args) = compiled.flatten();
        let non_null = values.iter().filter(|v| !v.is_null()).count();
        prop_assert_eq!(args.len(), non_null + list.len());
        let flattened = quarry_sql::CompiledStatement {
            sql,
            args: args.into_iter().map(BoundArg::Value).collect(),
            needs_validation: false,
        };
        prop_assert_eq!(flattened.placeholder_count(), flattened.args.len());
    }
}

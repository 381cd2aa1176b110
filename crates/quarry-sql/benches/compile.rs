//! Compiler benchmarks using divan
//!
//! Benchmarks for turning node trees into SQL text and bound arguments.

use quarry_sql::{Compilable, Criterion, Function, Insert, Operand, Query, Table, VersionCode};

fn main() {
    divan::main();
}

fn people() -> Table {
    Table::new("Person", "people")
}

fn wide_query(conditions: usize) -> Query {
    let t = people();
    let criteria = (0..conditions).map(|i| t.integer(&format!("c{i}")).eq(i as i32));
    Query::select([t.long("_id"), t.text("name")])
        .from(&t)
        .where_clause(Criterion::all(criteria))
        .order_by(t.text("name").asc().nulls_last())
        .limit(50)
}

mod queries {
    use super::*;

    #[divan::bench(args = [1, 8, 64])]
    fn compile_with_arguments(bencher: divan::Bencher, conditions: usize) {
        let query = wide_query(conditions);
        bencher.bench_local(|| query.compile(VersionCode::LATEST));
    }

    #[divan::bench(args = [1, 8, 64])]
    fn raw_sql(bencher: divan::Bencher, conditions: usize) {
        let query = wide_query(conditions);
        bencher.bench_local(|| query.to_raw_sql(VersionCode::LATEST));
    }

    #[divan::bench]
    fn nulls_order_emulation(bencher: divan::Bencher) {
        let query = wide_query(4);
        let legacy = VersionCode::new(3, 8, 0, 0);
        bencher.bench_local(|| query.to_raw_sql(legacy));
    }
}

mod collections {
    use super::*;

    #[divan::bench(args = [10, 1000])]
    fn flatten_in_list(bencher: divan::Bencher, len: usize) {
        let t = people();
        let query = Query::select_all()
            .from(&t)
            .where_clause(t.long("_id").in_values((0..len).map(|i| i as i64)));
        let compiled = query.compile(VersionCode::LATEST).unwrap();
        bencher.bench_local(|| compiled.flatten());
    }

    #[divan::bench(args = [10, 100])]
    fn multi_row_insert(bencher: divan::Bencher, rows: usize) {
        let t = people();
        let name = t.text("name");
        let total = t.long("total");
        let mut insert = Insert::into(&t).columns([&name, &total]);
        for i in 0..rows {
            insert = insert.values([
                Operand::from(format!("row {i}")),
                Function::add(&total, i as i64).into(),
            ]);
        }
        bencher.bench_local(|| insert.compile(VersionCode::LATEST));
    }
}

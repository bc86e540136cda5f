use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use pgfluent::{ResultColumn, ResultColumnIndex, Table, TableAlias};

/// `n` aliases over `n / 2` physical tables (every table joined twice), each with `width`
/// columns, in the order PostgreSQL emits them for `SELECT *`.
fn joined_columns(n: usize, width: usize) -> (Vec<TableAlias>, Vec<ResultColumn>) {
    let mut aliases = Vec::with_capacity(n);
    let mut columns = Vec::with_capacity(n * width);
    for i in 0..n {
        let table = format!("t{}", i / 2);
        aliases.push(Table::new(table.clone()).alias(format!("a{i}")));
        for c in 0..width {
            columns.push(ResultColumn::new(format!("col{c}"), table.clone()));
        }
    }
    (aliases, columns)
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("column_index/build");

    for n in [2, 4, 8, 16] {
        let (aliases, columns) = joined_columns(n, 12);
        group.bench_with_input(
            BenchmarkId::from_parameter(n),
            &(aliases, columns),
            |b, (aliases, columns)| {
                b.iter(|| black_box(ResultColumnIndex::build(aliases, columns, &[])));
            },
        );
    }

    group.finish();
}

fn bench_lookup(c: &mut Criterion) {
    let (aliases, columns) = joined_columns(8, 12);
    let index = match ResultColumnIndex::build(&aliases, &columns, &[]) {
        Ok(index) => index,
        Err(e) => panic!("fixture does not resolve: {e}"),
    };

    c.bench_function("column_index/alias_ordinal", |b| {
        b.iter(|| black_box(index.alias_ordinal(black_box("a7"), black_box("col11"))));
    });
    c.bench_function("column_index/ordinal", |b| {
        b.iter(|| black_box(index.ordinal(black_box("col6"))));
    });
}

criterion_group!(benches, bench_build, bench_lookup);
criterion_main!(benches);

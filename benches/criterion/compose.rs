use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use dataselect::{
    Complement, Dataset, EvalOptions, Intersection, Localizable, QueryPath, RangeQuery, Selector,
    Union, ValueMatch,
};

const KINDS: [&str; 3] = ["setosa", "versicolor", "virginica"];

fn dataset(rows: usize) -> Dataset {
    let mut rng = fastrand::Rng::with_seed(17);
    let length: Vec<f64> = (0..rows).map(|_| 4.0 + rng.f64() * 4.0).collect();
    let width: Vec<i64> = (0..rows).map(|_| rng.i64(0..30)).collect();
    let kind: Vec<&str> = (0..rows).map(|_| KINDS[rng.usize(..KINDS.len())]).collect();
    Dataset::from_columns([
        ("length", Arc::new(Float64Array::from(length)) as ArrayRef),
        ("width", Arc::new(Int64Array::from(width)) as ArrayRef),
        ("kind", Arc::new(StringArray::from(kind)) as ArrayRef),
    ])
    .unwrap()
}

fn leaves() -> [Selector; 3] {
    [
        RangeQuery::max(5).on("length").into(),
        RangeQuery::between(10, 20).on("width").into(),
        ValueMatch::any_of(["setosa", "virginica"]).on("kind").into(),
    ]
}

/// `(a | b) & !c`, kept as one query expression.
fn as_query() -> Selector {
    let [a, b, c] = leaves();
    (a | b) & !c
}

/// `(a | b) & !c`, combined as row sets.
fn as_index() -> Selector {
    let [a, b, c] = leaves();
    let either = Selector::index(Union::new(a, b));
    Selector::index(Intersection::new(either, Selector::index(Complement::new(c))))
}

fn composition(c: &mut Criterion) {
    let mut group = c.benchmark_group("compose");
    let direct = EvalOptions::default().query_path(QueryPath::Direct);
    let expression = EvalOptions::default();

    for rows in [1_000, 100_000] {
        let dataset = dataset(rows);
        let query = as_query();
        let index = as_index();
        assert_eq!(
            query.get_indices(&dataset).unwrap(),
            index.get_indices(&dataset).unwrap()
        );

        group.bench_with_input(BenchmarkId::new("query/expression", rows), &dataset, |b, data| {
            b.iter(|| query.get_indices_with(data, &expression).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("query/direct", rows), &dataset, |b, data| {
            b.iter(|| query.get_indices_with(data, &direct).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("index", rows), &dataset, |b, data| {
            b.iter(|| index.get_indices_with(data, &expression).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, composition);
criterion_main!(benches);

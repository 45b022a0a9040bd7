#![allow(dead_code)]

use std::sync::Arc;

use arrow::{
    array::{ArrayRef, BooleanArray, Float64Array, Int32Array, StringArray, UInt16Array},
    record_batch::RecordBatch,
};
use dataselect::{
    Dataset, HasValue, Localizable, RangeQuery, RawQuery, Sample, Selector, UniqueElements,
    ValueMatch,
};
use fastrand::Rng;

pub const CATEGORIES: [&str; 4] = ["x", "y", "z", "w"];

const RAW_QUERIES: [&str; 6] = [
    "a == d",
    "b > a",
    "flag == true",
    "~(c in ['x', 'y']) | d >= 3",
    "d < 2.5",
    "c != 'z' and a is not null",
];

/// Dataset with nulls, NaNs and shuffled row ids:
/// `a: Int32`, `b: Float64`, `c: Utf8`, `d: UInt16`, `flag: Boolean`.
pub fn random_dataset(rng: &mut Rng, rows: usize) -> Dataset {
    let mut a = Vec::with_capacity(rows);
    let mut b = Vec::with_capacity(rows);
    let mut c = Vec::with_capacity(rows);
    let mut d = Vec::with_capacity(rows);
    let mut flag = Vec::with_capacity(rows);
    for _ in 0..rows {
        a.push(if rng.u8(..10) == 0 {
            None
        } else {
            Some(rng.i32(-10..10))
        });
        b.push(match rng.u8(..12) {
            0 => None,
            1 => Some(f64::NAN),
            _ => Some(f64::from(rng.i32(-20..20)) / 2.0),
        });
        c.push(if rng.u8(..8) == 0 {
            None
        } else {
            Some(CATEGORIES[rng.usize(..CATEGORIES.len())])
        });
        d.push(rng.u16(..6));
        flag.push(if rng.u8(..6) == 0 {
            None
        } else {
            Some(rng.bool())
        });
    }

    let mut ids: Vec<u32> = (0..(rows as u32) * 3).collect();
    rng.shuffle(&mut ids);
    ids.truncate(rows);

    let batch = RecordBatch::try_from_iter([
        ("a", Arc::new(Int32Array::from(a)) as ArrayRef),
        ("b", Arc::new(Float64Array::from(b)) as ArrayRef),
        ("c", Arc::new(StringArray::from(c)) as ArrayRef),
        ("d", Arc::new(UInt16Array::from(d)) as ArrayRef),
        ("flag", Arc::new(BooleanArray::from(flag)) as ArrayRef),
    ])
    .expect("batch");
    Dataset::with_index(batch, ids).expect("dataset")
}

/// A random leaf; `query_only` restricts it to query-expressible selectors.
pub fn random_leaf(rng: &mut Rng, query_only: bool) -> Selector {
    let choices = if query_only { 7 } else { 9 };
    match rng.usize(..choices) {
        0 => RangeQuery::between(rng.i64(-8..4), rng.i64(0..10))
            .min_inclusive(rng.bool())
            .max_inclusive(rng.bool())
            .on("a")
            .into(),
        1 => RangeQuery::min(f64::from(rng.i32(-10..10)) / 2.0)
            .on("b")
            .into(),
        2 => {
            let values: Vec<&str> = CATEGORIES
                .iter()
                .copied()
                .filter(|_| rng.bool())
                .collect();
            if rng.bool() {
                ValueMatch::any_of(values).on("c").into()
            } else {
                ValueMatch::none_of(values).on("c").into()
            }
        }
        3 => HasValue::new(["a", "b", "c", "flag"][rng.usize(..4)]).into(),
        4 => RawQuery::new(RAW_QUERIES[rng.usize(..RAW_QUERIES.len())]).into(),
        5 => RangeQuery::max(rng.u64(0..7))
            .max_inclusive(rng.bool())
            .on("d")
            .into(),
        6 => RangeQuery::min(rng.i64(-3..3)).on("d").into(),
        7 => UniqueElements::new(["c", "d"][rng.usize(..2)]).into(),
        _ => Sample::new(rng.usize(..30)).seed(rng.u64(..)).into(),
    }
}

/// A random selector tree of at most `depth` combinator levels.
pub fn random_selector(rng: &mut Rng, depth: usize, query_only: bool) -> Selector {
    if depth == 0 || rng.u8(..4) == 0 {
        return random_leaf(rng, query_only);
    }
    match rng.u8(..3) {
        0 => {
            let left = random_selector(rng, depth - 1, query_only);
            let right = random_selector(rng, depth - 1, query_only);
            left & right
        }
        1 => {
            let left = random_selector(rng, depth - 1, query_only);
            let right = random_selector(rng, depth - 1, query_only);
            left | right
        }
        _ => !random_selector(rng, depth - 1, query_only),
    }
}

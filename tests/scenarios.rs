use std::sync::Arc;

use arrow::array::{ArrayRef, Int64Array, StringArray};
use dataselect::{
    group_rows, label_rows, labels_to_array, Dataset, HasValue, Localizable, Localizer,
    RangeQuery, RawQuery, RowId, RowSet, Sample, SelectError, Selector, Sex, UniqueElements,
    ValueMatch,
};

fn patients() -> Dataset {
    Dataset::from_columns([
        (
            "age",
            Arc::new(Int64Array::from(vec![55, 55, 20])) as ArrayRef,
        ),
        (
            "heart_rate",
            Arc::new(Int64Array::from(vec![50, 70, 40])) as ArrayRef,
        ),
    ])
    .expect("dataset")
}

fn rows(selector: &Selector, dataset: &Dataset) -> Vec<RowId> {
    selector.get_indices(dataset).expect("indices").to_vec()
}

#[test]
fn range_on_a_single_column() {
    let ages: ArrayRef = Arc::new(Int64Array::from(vec![10, 55, 70, 20]));
    let dataset = Dataset::from_columns([("age", ages)]).expect("dataset");
    let adults: Selector = RangeQuery::between(50, 100).on("age").into();

    assert_eq!(rows(&adults, &dataset), vec![1, 2]);
    let applied = adults.apply(&dataset).expect("apply");
    assert_eq!(applied.num_rows(), 2);
    assert_eq!(applied.row_ids().values().to_vec(), vec![1, 2]);
}

#[test]
fn intersection_union_and_complement() {
    let dataset = patients();
    let older: Selector = RangeQuery::between(50, 100).on("age").into();
    let resting: Selector = RangeQuery::max(60).on("heart_rate").into();

    assert_eq!(rows(&(&older & &resting), &dataset), vec![0]);
    assert_eq!(rows(&(&older | &resting), &dataset), vec![0, 1, 2]);
    assert!(rows(&!(&older | &resting), &dataset).is_empty());

    let expression = (&older & &resting)
        .to_expression()
        .expect("query")
        .expect("expression");
    assert_eq!(
        expression,
        "(`age` >= 50) & (`age` < 100) & (`heart_rate` < 60)"
    );
}

#[test]
fn complement_of_nothing_and_everything() {
    let values: ArrayRef = Arc::new(Int64Array::from(vec![1, 2, 3, 4, 5]));
    let dataset = Dataset::from_columns([("n", values)]).expect("dataset");

    let nothing: Selector = RangeQuery::min(100).on("n").into();
    assert_eq!(rows(&!&nothing, &dataset), vec![0, 1, 2, 3, 4]);

    let everything: Selector = HasValue::new("n").into();
    assert!(rows(&!&everything, &dataset).is_empty());

    let first = Selector::from(UniqueElements::new("n").with_indexer(|_| 0));
    assert_eq!(rows(&!&first, &dataset), Vec::<RowId>::new());
}

#[test]
fn unbound_selectors_fail_only_when_evaluated() {
    let unbound: Selector = RangeQuery::between(50, 100).into();
    let combined = &unbound | RawQuery::new("`heart_rate` < 60");
    assert!(combined.is_query());

    let err = unbound.get_indices(&patients()).unwrap_err();
    assert!(matches!(err, SelectError::UnboundColumn { selector: "range" }));
    assert!(matches!(
        combined.get_indices(&patients()),
        Err(SelectError::UnboundColumn { .. })
    ));

    let bound = Localizer::new("age").bind(RangeQuery::between(50, 100));
    assert_eq!(rows(&bound.into(), &patients()), vec![0, 1]);
}

#[test]
fn missing_columns_and_bad_literals_are_errors() {
    let dataset = patients();
    assert!(matches!(
        Selector::from(RangeQuery::min(1).on("weight")).get_indices(&dataset),
        Err(SelectError::MissingColumn(_))
    ));
    assert!(matches!(
        Selector::from(ValueMatch::equals("old").on("age")).get_indices(&dataset),
        Err(SelectError::TypeMismatch { .. })
    ));
}

#[test]
fn sex_codes_select_rows() {
    let dataset = Dataset::from_columns([(
        "sex",
        Arc::new(Int64Array::from(vec![Some(0), Some(1), None, Some(0), Some(3)])) as ArrayRef,
    )])
    .expect("dataset");

    assert_eq!(rows(&Sex::Female.into(), &dataset), vec![0, 3]);
    assert_eq!(rows(&!Selector::from(Sex::Female), &dataset), vec![1, 2, 4]);
    assert_eq!("male".parse::<Sex>().expect("sex"), Sex::Male);
    assert!("7".parse::<Sex>().is_err());
}

#[test]
fn labels_and_groups_over_a_dataset() {
    let lengths: ArrayRef = Arc::new(Int64Array::from(vec![1, 4, 7, 3, 6]));
    let dataset = Dataset::from_columns([("length", lengths)]).expect("dataset");
    let short: Selector = RangeQuery::max(3).on("length").into();
    let medium: Selector = RangeQuery::between(3, 6).on("length").into();
    let long: Selector = RangeQuery::min(6).on("length").into();

    let labels = label_rows(
        &dataset,
        &[(short.clone(), "short"), (medium.clone(), "medium"), (long.clone(), "long")],
    )
    .expect("labels");
    assert_eq!(
        labels,
        vec![Some("short"), Some("medium"), Some("long"), Some("medium"), Some("long")]
    );

    let labelled = dataset
        .with_column("size", Arc::new(labels_to_array(&labels)))
        .expect("labelled");
    let long_rows = Selector::from(ValueMatch::equals("long").on("size"))
        .apply(&labelled)
        .expect("apply");
    assert_eq!(long_rows.row_ids().values().to_vec(), vec![2, 4]);

    let groups = group_rows(&dataset, &[short, medium, long], false).expect("groups");
    assert_eq!(groups, vec![Some(0), Some(1), Some(2), Some(1), Some(2)]);
}

#[test]
fn sample_and_unique_compose_with_queries() {
    let subjects: ArrayRef = Arc::new(StringArray::from(vec!["a", "b", "a", "c", "b", "c"]));
    let scores: ArrayRef = Arc::new(Int64Array::from(vec![9, 3, 7, 5, 8, 1]));
    let dataset = Dataset::from_columns([("subject", subjects), ("score", scores)])
        .expect("dataset");

    let high: Selector = RangeQuery::min(5).on("score").into();
    let unique_high = &high & UniqueElements::new("subject");
    assert_eq!(rows(&unique_high, &dataset), vec![0, 3]);

    let sampled = high.clone() >> Sample::new(2).seed(11);
    let drawn = sampled.get_indices(&dataset).expect("sample");
    assert_eq!(drawn.len(), 2);
    assert!(drawn.to_vec().iter().all(|id| [0, 2, 3, 4].contains(id)));
    assert_eq!(drawn, sampled.get_indices(&dataset).expect("sample"));
}

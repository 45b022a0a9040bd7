//! Labeling and grouping rows with a list of selectors.

use std::collections::HashMap;

use arrow::array::StringArray;

use crate::{
    error::SelectError,
    frame::Dataset,
    logging::select_log,
    option::{EvalOptions, LabelPriority},
    row_set::{BitmapRowSet, RowId, RowSet},
    selector::{EvalScope, Selector},
};

/// True when no row is matched by more than one of `selectors`.
///
/// All selectors resolve in one scope, so shared sub-selectors are evaluated
/// once.
pub fn are_disjoint(dataset: &Dataset, selectors: &[Selector]) -> Result<bool, SelectError> {
    Ok(overlapping_rows(dataset, selectors, &EvalOptions::default())? == 0)
}

/// True when `a` and `b` share no row of `dataset`.
pub fn disjoint(a: &Selector, b: &Selector, dataset: &Dataset) -> Result<bool, SelectError> {
    are_disjoint(dataset, &[a.clone(), b.clone()])
}

fn resolve_all(
    dataset: &Dataset,
    selectors: &[Selector],
    options: &EvalOptions,
) -> Result<Vec<BitmapRowSet>, SelectError> {
    let mut scope = EvalScope::new(dataset, options);
    selectors
        .iter()
        .map(|selector| scope.resolve(selector))
        .collect()
}

fn overlapping_rows(
    dataset: &Dataset,
    selectors: &[Selector],
    options: &EvalOptions,
) -> Result<u64, SelectError> {
    let mut seen = BitmapRowSet::new();
    let mut overlap = BitmapRowSet::new();
    for rows in resolve_all(dataset, selectors, options)? {
        overlap = overlap.union(&rows.intersect(&seen));
        seen = seen.union(&rows);
    }
    Ok(overlap.len() as u64)
}

/// Assigns `labels[i]` to the rows matched by the `i`-th selector.
///
/// The result is aligned with the dataset's rows; unmatched rows are `None`.
/// A row matched by several selectors keeps the first label.
pub fn label_rows<L: Clone>(
    dataset: &Dataset,
    labelled: &[(Selector, L)],
) -> Result<Vec<Option<L>>, SelectError> {
    label_rows_with(dataset, labelled, &EvalOptions::default())
}

/// [`label_rows`] with explicit options; [`EvalOptions::label_priority`]
/// decides which label a row matched by several selectors keeps.
pub fn label_rows_with<L: Clone>(
    dataset: &Dataset,
    labelled: &[(Selector, L)],
    options: &EvalOptions,
) -> Result<Vec<Option<L>>, SelectError> {
    let selectors: Vec<Selector> = labelled.iter().map(|(selector, _)| selector.clone()).collect();
    let matches = resolve_all(dataset, &selectors, options)?;

    let positions: HashMap<RowId, usize> = dataset
        .row_ids()
        .values()
        .iter()
        .enumerate()
        .map(|(row, id)| (*id, row))
        .collect();
    let mut out: Vec<Option<L>> = vec![None; dataset.num_rows()];
    let mut labelled_rows = 0usize;
    for ((_, label), rows) in labelled.iter().zip(&matches) {
        for id in rows.iter() {
            let Some(&row) = positions.get(&id) else {
                continue;
            };
            let slot = &mut out[row];
            if slot.is_none() {
                labelled_rows += 1;
            } else if options.priority() == LabelPriority::FirstMatch {
                continue;
            }
            *slot = Some(label.clone());
        }
    }
    select_log!(
        log::Level::Debug,
        "label_rows",
        "selectors={} labelled={} rows={} priority={:?}",
        labelled.len(),
        labelled_rows,
        dataset.num_rows(),
        options.priority()
    );
    Ok(out)
}

/// Labels every row with the position of the selector that matches it.
///
/// With `allow_overlap == false`, selectors sharing rows fail with
/// [`SelectError::Overlap`]; otherwise the first matching selector wins.
pub fn group_rows(
    dataset: &Dataset,
    selectors: &[Selector],
    allow_overlap: bool,
) -> Result<Vec<Option<usize>>, SelectError> {
    let options = EvalOptions::default();
    if !allow_overlap {
        let rows = overlapping_rows(dataset, selectors, &options)?;
        if rows > 0 {
            return Err(SelectError::Overlap { rows });
        }
    }
    let labelled: Vec<(Selector, usize)> = selectors.iter().cloned().zip(0..).collect();
    label_rows_with(dataset, &labelled, &options)
}

/// String labels as an Arrow column, ready for [`Dataset::with_column`].
pub fn labels_to_array<S: AsRef<str>>(labels: &[Option<S>]) -> StringArray {
    let values: Vec<Option<&str>> = labels
        .iter()
        .map(|label| label.as_ref().map(|s| s.as_ref()))
        .collect();
    StringArray::from(values)
}

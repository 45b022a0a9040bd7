#![deny(missing_docs)]
//! Composable row selectors over in-memory Arrow tables.
//!
//! Selectors describe *which rows* of a [`Dataset`] to keep. They combine with
//! `&` (intersection), `|` (union) and `!` (complement) into new selectors,
//! and nothing is evaluated until a dataset is supplied:
//!
//! ```
//! use std::sync::Arc;
//!
//! use arrow::array::{ArrayRef, Float64Array};
//! use dataselect::{Dataset, Localizable, RangeQuery, Selector};
//!
//! let lengths: ArrayRef = Arc::new(Float64Array::from(vec![4.8, 5.4, 6.1, 7.0]));
//! let iris = Dataset::from_columns([("sepal.length", lengths)]).unwrap();
//!
//! let outside: Selector = RangeQuery::max(5).on("sepal.length")
//!     | RangeQuery::min(6).on("sepal.length");
//! assert_eq!(outside.get_indices(&iris).unwrap().to_vec(), vec![0, 2, 3]);
//! ```
//!
//! Query-expressible selectors ([`QueryExpressible`]) compile to a boolean
//! expression string; combining two of them yields a single expression that
//! the dataset evaluates with Arrow kernels. Index-based selectors
//! ([`DataSelector`]) compute row ids directly, and combinations involving
//! one of them fall back to row-set algebra.

/// Error taxonomy.
pub mod error;
/// In-memory datasets and their query evaluator.
pub mod frame;
/// Labeling and grouping rows with lists of selectors.
pub mod labels;
mod logging;
/// Evaluation options.
pub mod option;
/// Predicate trees and the expression grammar.
pub mod predicate;
/// Row-id sets.
pub mod row_set;
/// The selector algebra: handles, combinators, localization.
pub mod selector;
/// Ready-made leaf selectors.
pub mod selectors;

pub use crate::{
    error::SelectError,
    frame::Dataset,
    labels::{are_disjoint, disjoint, group_rows, label_rows, label_rows_with, labels_to_array},
    option::{EvalOptions, LabelPriority, QueryPath},
    predicate::{ColumnRef, ComparisonOp, Predicate, PredicateBuilder, ScalarValue},
    row_set::{BitmapRowSet, RowId, RowSet},
    selector::{
        ColumnBinding, Complement, DataSelector, EvalScope, Intersection, Localizable, Localizer,
        QueryCombination, QueryExpressible, RawQuery, Selector, Union,
    },
    selectors::{Age, HasValue, RangeQuery, Sample, Sex, UniqueElements, ValueMatch},
};

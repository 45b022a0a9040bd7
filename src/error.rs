use arrow::{datatypes::DataType, error::ArrowError};
use thiserror::Error;

use crate::row_set::RowId;

/// Errors raised while building datasets or evaluating selectors.
#[derive(Debug, Error)]
pub enum SelectError {
    /// A localizable selector was evaluated before being bound to a column.
    #[error("{selector} selector is not bound to a column")]
    UnboundColumn {
        /// Kind of the selector that lacks a binding.
        selector: &'static str,
    },
    /// The referenced column does not exist in the dataset.
    #[error("Unknown column: {0}")]
    MissingColumn(String),
    /// An expression string could not be parsed or evaluated.
    #[error("Invalid expression `{expression}`: {reason}")]
    InvalidExpression {
        /// The offending expression text.
        expression: String,
        /// Why it was rejected.
        reason: String,
    },
    /// A literal or column cannot be compared with the column's values.
    #[error("Type mismatch for column '{column}': cannot compare {data_type:?} with {literal}")]
    TypeMismatch {
        /// Column being compared.
        column: String,
        /// Canonical type of the column.
        data_type: DataType,
        /// Description of the other side of the comparison.
        literal: String,
    },
    /// The column's Arrow type is not supported by predicate evaluation.
    #[error("Unsupported type {data_type:?} for column '{column}'")]
    UnsupportedType {
        /// Column carrying the type.
        column: String,
        /// The unsupported Arrow type.
        data_type: DataType,
    },
    /// A row index does not have one entry per table row.
    #[error("Row index has {actual} entries but the table has {expected} rows")]
    IndexLength {
        /// Number of rows in the table.
        expected: usize,
        /// Number of ids supplied.
        actual: usize,
    },
    /// A row index contains the same id twice.
    #[error("Duplicate row id {0} in row index")]
    DuplicateRowId(RowId),
    /// A unique-elements indexer picked a position outside its group.
    #[error("Indexer chose position {position} in a group of {len} rows")]
    IndexerOutOfRange {
        /// Position returned by the indexer.
        position: usize,
        /// Size of the group.
        len: usize,
    },
    /// Selectors that were required to be disjoint share rows.
    #[error("Selectors overlap on {rows} rows")]
    Overlap {
        /// Number of rows matched by more than one selector.
        rows: u64,
    },
    /// A constructor argument was rejected.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// An Arrow kernel failed.
    #[error("arrow error: {0}")]
    Arrow(#[from] ArrowError),
}

impl SelectError {
    pub(crate) fn invalid_expression(expression: &str, reason: impl Into<String>) -> Self {
        SelectError::InvalidExpression {
            expression: expression.to_owned(),
            reason: reason.into(),
        }
    }
}

//! Row-by-row evaluation of predicates, bypassing Arrow kernels.

use arrow::{
    array::{
        Array, ArrayRef, AsArray, BooleanArray, Float64Array, Int64Array, StringArray,
        UInt64Array,
    },
    datatypes::{DataType, Float64Type, Int64Type, UInt64Type},
};

use super::{check_column_pair, check_literal, Comparison, Dataset};
use crate::{
    error::SelectError,
    predicate::{ComparisonOp, PredicateLeaf, PredicateVisitor, ScalarValueRef},
    row_set::{BitmapRowSet, RowId, RowSet},
};

/// Typed view over a canonical column.
pub(crate) enum ColumnView<'a> {
    Int64(&'a Int64Array),
    UInt64(&'a UInt64Array),
    Float64(&'a Float64Array),
    Utf8(&'a StringArray),
    Boolean(&'a BooleanArray),
}

impl<'a> ColumnView<'a> {
    pub(crate) fn new(array: &'a ArrayRef) -> Self {
        match array.data_type() {
            DataType::Int64 => ColumnView::Int64(array.as_primitive::<Int64Type>()),
            DataType::UInt64 => ColumnView::UInt64(array.as_primitive::<UInt64Type>()),
            DataType::Float64 => ColumnView::Float64(array.as_primitive::<Float64Type>()),
            DataType::Boolean => ColumnView::Boolean(array.as_boolean()),
            _ => ColumnView::Utf8(array.as_string::<i32>()),
        }
    }

    pub(crate) fn value(&self, row: usize) -> ScalarValueRef<'a> {
        match self {
            ColumnView::Int64(values) if values.is_valid(row) => {
                ScalarValueRef::Int64(values.value(row))
            }
            ColumnView::UInt64(values) if values.is_valid(row) => {
                ScalarValueRef::UInt64(values.value(row))
            }
            ColumnView::Float64(values) if values.is_valid(row) => {
                ScalarValueRef::Float64(values.value(row))
            }
            ColumnView::Utf8(values) if values.is_valid(row) => {
                ScalarValueRef::Utf8(values.value(row))
            }
            ColumnView::Boolean(values) if values.is_valid(row) => {
                ScalarValueRef::Boolean(values.value(row))
            }
            _ => ScalarValueRef::Null,
        }
    }
}

/// Folds a predicate into the set of matching row ids.
pub(crate) struct RowScanVisitor<'a> {
    dataset: &'a Dataset,
}

impl<'a> RowScanVisitor<'a> {
    pub(crate) fn new(dataset: &'a Dataset) -> Self {
        Self { dataset }
    }

    fn rows_where(&self, mut keep: impl FnMut(usize) -> bool) -> BitmapRowSet {
        self.dataset
            .row_ids()
            .values()
            .iter()
            .enumerate()
            .filter_map(|(row, id): (usize, &RowId)| keep(row).then_some(*id))
            .collect()
    }
}

fn satisfies(op: ComparisonOp, lhs: ScalarValueRef<'_>, rhs: ScalarValueRef<'_>) -> bool {
    lhs.compare(rhs).is_some_and(|ordering| op.test_ordering(ordering))
}

impl PredicateVisitor for RowScanVisitor<'_> {
    type Error = SelectError;
    type Value = BitmapRowSet;

    fn visit_leaf(&mut self, leaf: &PredicateLeaf) -> Result<BitmapRowSet, SelectError> {
        match leaf {
            PredicateLeaf::Compare { left, op, right } => {
                match Comparison::from_operands(left, *op, right)? {
                    Comparison::Literal {
                        column,
                        op,
                        literal,
                    } => {
                        let array = self.dataset.canonical_column(column)?;
                        check_literal(column, array.data_type(), literal)?;
                        let view = ColumnView::new(&array);
                        Ok(self.rows_where(|row| satisfies(op, view.value(row), literal.as_ref())))
                    }
                    Comparison::Columns { left, op, right } => {
                        let lhs = self.dataset.canonical_column(left)?;
                        let rhs = self.dataset.canonical_column(right)?;
                        check_column_pair(left, lhs.data_type(), right, rhs.data_type())?;
                        let (lhs, rhs) = (ColumnView::new(&lhs), ColumnView::new(&rhs));
                        Ok(self.rows_where(|row| satisfies(op, lhs.value(row), rhs.value(row))))
                    }
                }
            }
            PredicateLeaf::InList {
                column,
                values,
                negated,
            } => {
                let column: &str = &column.name;
                let array = self.dataset.canonical_column(column)?;
                for value in values {
                    check_literal(column, array.data_type(), value)?;
                }
                let view = ColumnView::new(&array);
                Ok(self.rows_where(|row| {
                    let value = view.value(row);
                    if value.is_missing() {
                        return false;
                    }
                    let found = values
                        .iter()
                        .any(|item| satisfies(ComparisonOp::Equal, value, item.as_ref()));
                    found != *negated
                }))
            }
            PredicateLeaf::IsNull { column, negated } => {
                let column: &str = &column.name;
                let array = self.dataset.canonical_column(column)?;
                let view = ColumnView::new(&array);
                Ok(self.rows_where(|row| view.value(row).is_missing() != *negated))
            }
        }
    }

    fn combine_not(&mut self, child: BitmapRowSet) -> Result<BitmapRowSet, SelectError> {
        Ok(self.dataset.full_index().difference(&child))
    }

    fn combine_and(&mut self, children: Vec<BitmapRowSet>) -> Result<BitmapRowSet, SelectError> {
        let mut children = children.into_iter();
        let mut acc = children
            .next()
            .unwrap_or_else(|| self.dataset.full_index());
        for child in children {
            acc = acc.intersect(&child);
        }
        Ok(acc)
    }

    fn combine_or(&mut self, children: Vec<BitmapRowSet>) -> Result<BitmapRowSet, SelectError> {
        Ok(children
            .iter()
            .fold(BitmapRowSet::new(), |acc, child| acc.union(child)))
    }
}

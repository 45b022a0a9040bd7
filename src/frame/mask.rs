//! Arrow-kernel evaluation of predicates into row masks.

use std::{cmp::Ordering, sync::Arc};

use arrow::{
    array::{
        Array, ArrayRef, AsArray, BooleanArray, Datum, Float64Array, Int64Array, StringArray,
        UInt64Array,
    },
    compute::{
        and, cast,
        kernels::cmp::{eq, gt, gt_eq, lt, lt_eq, neq},
        not, or, prep_null_mask_filter,
    },
    datatypes::{DataType, Float64Type, Int64Type, UInt64Type},
    error::ArrowError,
};

use super::{check_column_pair, check_literal, normalize_zero, Comparison, Dataset};
use crate::{
    error::SelectError,
    predicate::{ComparisonOp, PredicateLeaf, PredicateVisitor, ScalarValue},
};

/// Folds a predicate into a null-free [`BooleanArray`] aligned with the rows.
pub(crate) struct MaskVisitor<'a> {
    dataset: &'a Dataset,
}

impl<'a> MaskVisitor<'a> {
    pub(crate) fn new(dataset: &'a Dataset) -> Self {
        Self { dataset }
    }

    fn constant(&self, value: bool) -> BooleanArray {
        BooleanArray::from(vec![value; self.dataset.num_rows()])
    }

    fn compare_literal(
        &self,
        column: &str,
        op: ComparisonOp,
        literal: &ScalarValue,
    ) -> Result<BooleanArray, SelectError> {
        let array = self.dataset.canonical_column(column)?;
        check_literal(column, array.data_type(), literal)?;
        if literal.is_missing() {
            return Ok(self.constant(false));
        }
        let raw = match (array.data_type(), literal) {
            (DataType::Int64, ScalarValue::Int64(value)) => {
                kernel(op, &array, &Int64Array::new_scalar(*value))?
            }
            (DataType::Int64, ScalarValue::UInt64(value)) => match i64::try_from(*value) {
                Ok(value) => kernel(op, &array, &Int64Array::new_scalar(value))?,
                Err(_) => return self.ordered(op, Ordering::Less, &array),
            },
            (DataType::UInt64, ScalarValue::UInt64(value)) => {
                kernel(op, &array, &UInt64Array::new_scalar(*value))?
            }
            (DataType::UInt64, ScalarValue::Int64(value)) => match u64::try_from(*value) {
                Ok(value) => kernel(op, &array, &UInt64Array::new_scalar(value))?,
                Err(_) => return self.ordered(op, Ordering::Greater, &array),
            },
            (_, ScalarValue::Float64(value)) => {
                let floats = as_float(&array)?;
                kernel(op, &floats, &Float64Array::new_scalar(normalize_zero(*value)))?
            }
            (DataType::Float64, ScalarValue::Int64(value)) => {
                kernel(op, &array, &Float64Array::new_scalar(*value as f64))?
            }
            (DataType::Float64, ScalarValue::UInt64(value)) => {
                kernel(op, &array, &Float64Array::new_scalar(*value as f64))?
            }
            (DataType::Utf8, ScalarValue::Utf8(value)) => {
                kernel(op, &array, &StringArray::new_scalar(value.as_str()))?
            }
            (DataType::Boolean, ScalarValue::Boolean(value)) => {
                kernel(op, &array, &BooleanArray::new_scalar(*value))?
            }
            (data_type, literal) => {
                return Err(SelectError::TypeMismatch {
                    column: column.to_owned(),
                    data_type: data_type.clone(),
                    literal: literal.to_string(),
                })
            }
        };
        Ok(and(&null_free(raw), &present(&array))?)
    }

    fn compare_columns(
        &self,
        left: &str,
        op: ComparisonOp,
        right: &str,
    ) -> Result<BooleanArray, SelectError> {
        let lhs = self.dataset.canonical_column(left)?;
        let rhs = self.dataset.canonical_column(right)?;
        check_column_pair(left, lhs.data_type(), right, rhs.data_type())?;
        let raw = match (lhs.data_type(), rhs.data_type()) {
            (l, r) if l == r => kernel(op, &lhs, &rhs)?,
            (DataType::Int64, DataType::UInt64) => mixed_sign(
                op,
                lhs.as_primitive::<Int64Type>(),
                rhs.as_primitive::<UInt64Type>(),
            ),
            (DataType::UInt64, DataType::Int64) => mixed_sign(
                op.flipped(),
                rhs.as_primitive::<Int64Type>(),
                lhs.as_primitive::<UInt64Type>(),
            ),
            _ => kernel(op, &as_float(&lhs)?, &as_float(&rhs)?)?,
        };
        let valid = and(&present(&lhs), &present(&rhs))?;
        Ok(and(&null_free(raw), &valid)?)
    }

    /// Rows whose value sits on the `ordering` side of an out-of-range literal.
    fn ordered(
        &self,
        op: ComparisonOp,
        ordering: Ordering,
        array: &ArrayRef,
    ) -> Result<BooleanArray, SelectError> {
        if op.test_ordering(ordering) {
            Ok(present(array))
        } else {
            Ok(self.constant(false))
        }
    }
}

fn kernel(op: ComparisonOp, lhs: &dyn Datum, rhs: &dyn Datum) -> Result<BooleanArray, ArrowError> {
    match op {
        ComparisonOp::Equal => eq(lhs, rhs),
        ComparisonOp::NotEqual => neq(lhs, rhs),
        ComparisonOp::LessThan => lt(lhs, rhs),
        ComparisonOp::LessThanOrEqual => lt_eq(lhs, rhs),
        ComparisonOp::GreaterThan => gt(lhs, rhs),
        ComparisonOp::GreaterThanOrEqual => gt_eq(lhs, rhs),
    }
}

/// Nulls in a kernel result become `false`.
fn null_free(raw: BooleanArray) -> BooleanArray {
    if raw.null_count() > 0 {
        prep_null_mask_filter(&raw)
    } else {
        raw
    }
}

fn as_float(array: &ArrayRef) -> Result<ArrayRef, ArrowError> {
    if array.data_type() == &DataType::Float64 {
        Ok(Arc::clone(array))
    } else {
        cast(array, &DataType::Float64)
    }
}

fn mixed_sign(
    op: ComparisonOp,
    signed: &Int64Array,
    unsigned: &UInt64Array,
) -> BooleanArray {
    signed
        .iter()
        .zip(unsigned.iter())
        .map(|pair| match pair {
            (Some(lhs), Some(rhs)) => Some(op.test_ordering(i128::from(lhs).cmp(&i128::from(rhs)))),
            _ => Some(false),
        })
        .collect()
}

/// True where the value is neither null nor NaN.
fn present(array: &ArrayRef) -> BooleanArray {
    if array.data_type() == &DataType::Float64 {
        array
            .as_primitive::<Float64Type>()
            .iter()
            .map(|value| Some(value.is_some_and(|v| !v.is_nan())))
            .collect()
    } else {
        (0..array.len()).map(|row| Some(array.is_valid(row))).collect()
    }
}

impl PredicateVisitor for MaskVisitor<'_> {
    type Error = SelectError;
    type Value = BooleanArray;

    fn visit_leaf(&mut self, leaf: &PredicateLeaf) -> Result<BooleanArray, SelectError> {
        match leaf {
            PredicateLeaf::Compare { left, op, right } => {
                match Comparison::from_operands(left, *op, right)? {
                    Comparison::Literal {
                        column,
                        op,
                        literal,
                    } => self.compare_literal(column, op, literal),
                    Comparison::Columns { left, op, right } => {
                        self.compare_columns(left, op, right)
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
                let mut matched = self.constant(false);
                for value in values {
                    let hit = self.compare_literal(column, ComparisonOp::Equal, value)?;
                    matched = or(&matched, &hit)?;
                }
                if *negated {
                    Ok(and(&not(&matched)?, &present(&array))?)
                } else {
                    Ok(matched)
                }
            }
            PredicateLeaf::IsNull { column, negated } => {
                let column: &str = &column.name;
                let valid = present(&self.dataset.canonical_column(column)?);
                if *negated {
                    Ok(valid)
                } else {
                    Ok(not(&valid)?)
                }
            }
        }
    }

    fn combine_not(&mut self, child: BooleanArray) -> Result<BooleanArray, SelectError> {
        Ok(not(&child)?)
    }

    fn combine_and(&mut self, children: Vec<BooleanArray>) -> Result<BooleanArray, SelectError> {
        let mut children = children.into_iter();
        let mut acc = children.next().unwrap_or_else(|| self.constant(true));
        for child in children {
            acc = and(&acc, &child)?;
        }
        Ok(acc)
    }

    fn combine_or(&mut self, children: Vec<BooleanArray>) -> Result<BooleanArray, SelectError> {
        let mut acc = self.constant(false);
        for child in children {
            acc = or(&acc, &child)?;
        }
        Ok(acc)
    }
}

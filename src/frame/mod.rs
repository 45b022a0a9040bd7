//! In-memory datasets: an Arrow [`RecordBatch`] plus a stable row index.
//!
//! A [`Dataset`] is never mutated by selectors; filtering returns a new dataset
//! that keeps the surviving rows' ids. Predicates are evaluated either through
//! Arrow compute kernels ([`Dataset::mask`]) or row by row
//! ([`Dataset::scan_indices`]); both share the value semantics below.
//!
//! Column values are compared in a canonical type: signed integers as `Int64`,
//! unsigned integers as `UInt64`, floats as `Float64`, plain and
//! dictionary-encoded strings as `Utf8`. Missing values (null or NaN) never
//! satisfy a comparison or a membership test.

mod mask;
mod scan;

pub(crate) use scan::ColumnView;

use std::{collections::HashSet, fmt, sync::Arc};

use arrow::{
    array::{Array, ArrayRef, AsArray, BooleanArray, Float64Array, UInt32Array},
    compute::{cast, filter, filter_record_batch},
    datatypes::{DataType, Field, Float64Type, Schema, SchemaRef, UInt32Type},
    record_batch::RecordBatch,
    util::pretty::pretty_format_batches,
};

use crate::{
    error::SelectError,
    logging::select_log,
    predicate::{ComparisonOp, Operand, Predicate, ScalarValue},
    row_set::{BitmapRowSet, RowId, RowSet},
};

/// Name of the index column printed by [`Dataset`]'s `Display`.
const INDEX_COLUMN: &str = "index";

/// Columnar table with a unique row id per row.
#[derive(Clone, Debug)]
pub struct Dataset {
    batch: RecordBatch,
    row_ids: UInt32Array,
}

impl Dataset {
    /// Wraps a record batch, numbering its rows `0..n`.
    pub fn new(batch: RecordBatch) -> Self {
        let row_ids = UInt32Array::from_iter_values((0..batch.num_rows()).map(|row| row as RowId));
        Self { batch, row_ids }
    }

    /// Wraps a record batch with an explicit row index.
    pub fn with_index(
        batch: RecordBatch,
        row_ids: impl IntoIterator<Item = RowId>,
    ) -> Result<Self, SelectError> {
        let row_ids: Vec<RowId> = row_ids.into_iter().collect();
        if row_ids.len() != batch.num_rows() {
            return Err(SelectError::IndexLength {
                expected: batch.num_rows(),
                actual: row_ids.len(),
            });
        }
        let mut seen = HashSet::with_capacity(row_ids.len());
        for id in &row_ids {
            if !seen.insert(*id) {
                return Err(SelectError::DuplicateRowId(*id));
            }
        }
        Ok(Self {
            batch,
            row_ids: UInt32Array::from(row_ids),
        })
    }

    /// Builds a dataset from named columns of equal length.
    pub fn from_columns<I, N>(columns: I) -> Result<Self, SelectError>
    where
        I: IntoIterator<Item = (N, ArrayRef)>,
        N: AsRef<str>,
    {
        Ok(Self::new(RecordBatch::try_from_iter(columns)?))
    }

    /// Number of rows.
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// True when the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    /// Schema of the underlying batch.
    pub fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    /// The underlying record batch.
    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    /// Row ids in row order.
    pub fn row_ids(&self) -> &UInt32Array {
        &self.row_ids
    }

    /// Every row id of the dataset.
    pub fn full_index(&self) -> BitmapRowSet {
        self.row_ids.values().iter().copied().collect()
    }

    /// Looks up a column by name.
    pub fn column(&self, name: &str) -> Result<&ArrayRef, SelectError> {
        self.batch
            .column_by_name(name)
            .ok_or_else(|| SelectError::MissingColumn(name.to_owned()))
    }

    /// Keeps the rows where `mask` is true. Null mask entries drop the row.
    pub fn filter(&self, mask: &BooleanArray) -> Result<Dataset, SelectError> {
        let batch = filter_record_batch(&self.batch, mask)?;
        let row_ids = filter(&self.row_ids, mask)?
            .as_primitive::<UInt32Type>()
            .clone();
        Ok(Dataset { batch, row_ids })
    }

    /// Keeps the rows whose id is in `rows`, in their original order.
    ///
    /// Ids that do not belong to this dataset are ignored.
    pub fn take(&self, rows: &BitmapRowSet) -> Result<Dataset, SelectError> {
        let mask: BooleanArray = self
            .row_ids
            .values()
            .iter()
            .map(|id| Some(rows.contains(*id)))
            .collect();
        self.filter(&mask)
    }

    /// Returns a copy with `array` stored under `name`, replacing any column of
    /// that name.
    pub fn with_column(&self, name: &str, array: ArrayRef) -> Result<Dataset, SelectError> {
        let schema = self.batch.schema();
        let mut fields = Vec::with_capacity(schema.fields().len() + 1);
        let mut columns = Vec::with_capacity(fields.capacity());
        for (field, column) in schema.fields().iter().zip(self.batch.columns()) {
            if field.name() != name {
                fields.push(Arc::clone(field));
                columns.push(Arc::clone(column));
            }
        }
        fields.push(Arc::new(Field::new(name, array.data_type().clone(), true)));
        columns.push(array);
        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?;
        Ok(Dataset {
            batch,
            row_ids: self.row_ids.clone(),
        })
    }

    /// Rows satisfying the expression string, as a new dataset.
    pub fn query(&self, expression: &str) -> Result<Dataset, SelectError> {
        let predicate = Predicate::parse(expression)?;
        self.filter(&self.mask(&predicate)?)
    }

    /// Ids of the rows satisfying the expression string.
    pub fn query_indices(&self, expression: &str) -> Result<BitmapRowSet, SelectError> {
        let predicate = Predicate::parse(expression)?;
        let rows = self.mask_to_rows(&self.mask(&predicate)?);
        select_log!(
            log::Level::Debug,
            "expression_evaluated",
            "expression={} matched={} rows={}",
            expression,
            rows.len(),
            self.num_rows()
        );
        Ok(rows)
    }

    /// Evaluates a predicate with Arrow kernels into a null-free row mask.
    pub fn mask(&self, predicate: &Predicate) -> Result<BooleanArray, SelectError> {
        self.check_columns(predicate)?;
        predicate.accept(&mut mask::MaskVisitor::new(self))
    }

    /// Evaluates a predicate row by row, without Arrow kernels.
    pub fn scan_indices(&self, predicate: &Predicate) -> Result<BitmapRowSet, SelectError> {
        self.check_columns(predicate)?;
        let rows = predicate.accept(&mut scan::RowScanVisitor::new(self))?;
        select_log!(
            log::Level::Debug,
            "predicate_scanned",
            "matched={} rows={}",
            rows.len(),
            self.num_rows()
        );
        Ok(rows)
    }

    fn check_columns(&self, predicate: &Predicate) -> Result<(), SelectError> {
        for name in predicate.columns() {
            self.column(&name)?;
        }
        Ok(())
    }

    fn mask_to_rows(&self, mask: &BooleanArray) -> BitmapRowSet {
        mask.iter()
            .zip(self.row_ids.values().iter())
            .filter_map(|(keep, id)| (keep == Some(true)).then_some(*id))
            .collect()
    }

    /// Column `name` cast to its canonical comparison type.
    pub(crate) fn canonical_column(&self, name: &str) -> Result<ArrayRef, SelectError> {
        let array = self.column(name)?;
        let target = canonical_type(name, array.data_type())?;
        let array = if array.data_type() == &target {
            Arc::clone(array)
        } else {
            cast(array, &target)?
        };
        if target == DataType::Float64 {
            // Arrow orders -0.0 below 0.0.
            let normalized: Float64Array = array
                .as_primitive::<Float64Type>()
                .unary(normalize_zero);
            return Ok(Arc::new(normalized));
        }
        Ok(array)
    }
}

fn canonical_type(column: &str, data_type: &DataType) -> Result<DataType, SelectError> {
    let canonical = match data_type {
        DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 => DataType::Int64,
        DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64 => {
            DataType::UInt64
        }
        DataType::Float16 | DataType::Float32 | DataType::Float64 => DataType::Float64,
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => DataType::Utf8,
        DataType::Dictionary(_, value)
            if matches!(value.as_ref(), DataType::Utf8 | DataType::LargeUtf8) =>
        {
            DataType::Utf8
        }
        DataType::Boolean => DataType::Boolean,
        other => {
            return Err(SelectError::UnsupportedType {
                column: column.to_owned(),
                data_type: other.clone(),
            })
        }
    };
    Ok(canonical)
}

pub(crate) fn normalize_zero(value: f64) -> f64 {
    if value == 0.0 {
        0.0
    } else {
        value
    }
}

fn is_numeric(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Int64 | DataType::UInt64 | DataType::Float64
    )
}

/// Fails unless a canonical column type can be compared with `literal`.
///
/// `null` compares with anything and matches nothing.
pub(crate) fn check_literal(
    column: &str,
    data_type: &DataType,
    literal: &ScalarValue,
) -> Result<(), SelectError> {
    let comparable = match literal {
        ScalarValue::Null => true,
        ScalarValue::Int64(_) | ScalarValue::UInt64(_) | ScalarValue::Float64(_) => {
            is_numeric(data_type)
        }
        ScalarValue::Utf8(_) => data_type == &DataType::Utf8,
        ScalarValue::Boolean(_) => data_type == &DataType::Boolean,
    };
    if comparable {
        Ok(())
    } else {
        Err(SelectError::TypeMismatch {
            column: column.to_owned(),
            data_type: data_type.clone(),
            literal: format!("{} literal {literal}", literal.type_name()),
        })
    }
}

/// Fails unless two canonical column types can be compared.
pub(crate) fn check_column_pair(
    left: &str,
    left_type: &DataType,
    right: &str,
    right_type: &DataType,
) -> Result<(), SelectError> {
    if left_type == right_type || (is_numeric(left_type) && is_numeric(right_type)) {
        Ok(())
    } else {
        Err(SelectError::TypeMismatch {
            column: left.to_owned(),
            data_type: left_type.clone(),
            literal: format!("column '{right}' of type {right_type:?}"),
        })
    }
}

/// A comparison leaf with the column moved to the left-hand side.
pub(crate) enum Comparison<'p> {
    Literal {
        column: &'p str,
        op: ComparisonOp,
        literal: &'p ScalarValue,
    },
    Columns {
        left: &'p str,
        op: ComparisonOp,
        right: &'p str,
    },
}

impl<'p> Comparison<'p> {
    pub(crate) fn from_operands(
        left: &'p Operand,
        op: ComparisonOp,
        right: &'p Operand,
    ) -> Result<Self, SelectError> {
        match (left, right) {
            (Operand::Column(column), Operand::Literal(literal)) => Ok(Comparison::Literal {
                column: &column.name,
                op,
                literal,
            }),
            (Operand::Literal(literal), Operand::Column(column)) => Ok(Comparison::Literal {
                column: &column.name,
                op: op.flipped(),
                literal,
            }),
            (Operand::Column(left), Operand::Column(right)) => Ok(Comparison::Columns {
                left: &left.name,
                op,
                right: &right.name,
            }),
            (Operand::Literal(lhs), Operand::Literal(rhs)) => Err(SelectError::invalid_expression(
                &format!("{lhs} {op} {rhs}"),
                "a comparison needs at least one column",
            )),
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let schema = self.batch.schema();
        let index: ArrayRef = Arc::new(self.row_ids.clone());
        let columns = std::iter::once((INDEX_COLUMN, index)).chain(
            schema
                .fields()
                .iter()
                .map(|field| field.name().as_str())
                .zip(self.batch.columns().iter().cloned()),
        );
        let batch = RecordBatch::try_from_iter(columns).map_err(|_| fmt::Error)?;
        let table = pretty_format_batches(&[batch]).map_err(|_| fmt::Error)?;
        write!(f, "{table}")
    }
}

#[cfg(test)]
mod tests {
    use arrow::array::{
        DictionaryArray, Float32Array, Int32Array, Int64Array, StringArray, UInt8Array,
    };
    use arrow::datatypes::Int8Type;

    use super::*;
    use crate::predicate::{ColumnRef, ComparisonOp};

    fn people() -> Dataset {
        Dataset::from_columns([
            (
                "age",
                Arc::new(Int32Array::from(vec![Some(34), Some(71), None, Some(50)])) as ArrayRef,
            ),
            (
                "hr",
                Arc::new(Float32Array::from(vec![Some(60.0), Some(f32::NAN), Some(88.5), None]))
                    as ArrayRef,
            ),
            (
                "name",
                Arc::new(StringArray::from(vec!["ann", "bob", "cy", "dee"])) as ArrayRef,
            ),
        ])
        .expect("dataset")
    }

    fn ids(rows: &BitmapRowSet) -> Vec<RowId> {
        rows.to_vec()
    }

    #[test]
    fn explicit_index_is_validated() {
        let batch = people().batch().clone();
        let err = Dataset::with_index(batch.clone(), [1, 2, 3]).unwrap_err();
        assert!(matches!(err, SelectError::IndexLength { expected: 4, actual: 3 }));
        let err = Dataset::with_index(batch.clone(), [1, 2, 2, 3]).unwrap_err();
        assert!(matches!(err, SelectError::DuplicateRowId(2)));
        let dataset = Dataset::with_index(batch, [10, 20, 30, 40]).expect("index");
        assert_eq!(ids(&dataset.full_index()), vec![10, 20, 30, 40]);
    }

    #[test]
    fn take_preserves_row_order_and_ids() {
        let dataset = Dataset::with_index(people().batch().clone(), [9, 3, 7, 1]).expect("index");
        let rows: BitmapRowSet = [1, 9, 100].into_iter().collect();
        let taken = dataset.take(&rows).expect("take");
        assert_eq!(taken.row_ids().values().to_vec(), vec![9, 1]);
        let names = taken.column("name").expect("name").as_string::<i32>();
        assert_eq!(names.value(0), "ann");
        assert_eq!(names.value(1), "dee");
        assert_eq!(taken.schema(), dataset.schema());
    }

    #[test]
    fn query_filters_with_missing_values_excluded() {
        let dataset = people();
        assert_eq!(ids(&dataset.query_indices("age >= 50").unwrap()), vec![1, 3]);
        assert_eq!(ids(&dataset.query_indices("age != 50").unwrap()), vec![0, 1]);
        assert_eq!(ids(&dataset.query_indices("~(age >= 50)").unwrap()), vec![0, 2]);
        assert_eq!(ids(&dataset.query_indices("hr < 100").unwrap()), vec![0, 2]);
        assert_eq!(ids(&dataset.query_indices("hr is null").unwrap()), vec![1, 3]);
        assert_eq!(
            ids(&dataset.query_indices("name not in ['bob', 'cy']").unwrap()),
            vec![0, 3]
        );
        assert_eq!(dataset.query("age > 40 & hr is not null").unwrap().num_rows(), 0);
    }

    #[test]
    fn both_paths_agree_on_mixed_types() {
        let dataset = Dataset::from_columns([
            ("small", Arc::new(UInt8Array::from(vec![0, 5, 255])) as ArrayRef),
            ("wide", Arc::new(Int64Array::from(vec![-1, 5, 300])) as ArrayRef),
            ("ratio", Arc::new(Float32Array::from(vec![-0.0, 5.0, 254.5])) as ArrayRef),
        ])
        .expect("dataset");
        for expression in [
            "small > -3",
            "small < 18446744073709551615",
            "wide <= 18446744073709551615",
            "small == wide",
            "small > ratio",
            "ratio == 0",
            "wide >= 4.5",
            "small in [5, 255, -1]",
            "50 > small",
        ] {
            let predicate = Predicate::parse(expression).expect(expression);
            assert_eq!(
                dataset.query_indices(expression).expect(expression),
                dataset.scan_indices(&predicate).expect(expression),
                "{expression}"
            );
        }
        assert_eq!(ids(&dataset.query_indices("small > -3").unwrap()), vec![0, 1, 2]);
        assert_eq!(ids(&dataset.query_indices("ratio == 0").unwrap()), vec![0]);
        assert_eq!(ids(&dataset.query_indices("small == wide").unwrap()), vec![1]);
    }

    #[test]
    fn dictionary_strings_compare_as_strings() {
        let kinds: DictionaryArray<Int8Type> = vec!["a", "b", "a"].into_iter().collect();
        let dataset =
            Dataset::from_columns([("kind", Arc::new(kinds) as ArrayRef)]).expect("dataset");
        assert_eq!(ids(&dataset.query_indices("kind == 'a'").unwrap()), vec![0, 2]);
    }

    #[test]
    fn evaluation_errors() {
        let dataset = people();
        assert!(matches!(
            dataset.query_indices("weight > 3"),
            Err(SelectError::MissingColumn(name)) if name == "weight"
        ));
        assert!(matches!(
            dataset.query_indices("name > 3"),
            Err(SelectError::TypeMismatch { .. })
        ));
        assert!(matches!(
            dataset.query_indices("age == name"),
            Err(SelectError::TypeMismatch { .. })
        ));
        assert!(matches!(
            dataset.query_indices("age >"),
            Err(SelectError::InvalidExpression { .. })
        ));
        let literal_only =
            Predicate::compare(ScalarValue::from(1), ComparisonOp::Equal, ScalarValue::from(1));
        assert!(matches!(
            dataset.mask(&literal_only),
            Err(SelectError::InvalidExpression { .. })
        ));
        assert!(matches!(
            dataset.scan_indices(&literal_only),
            Err(SelectError::InvalidExpression { .. })
        ));
    }

    #[test]
    fn null_and_nan_literals_match_nothing() {
        let dataset = people();
        for expression in ["age == null", "age != null", "hr != nan", "hr in [nan, null]"] {
            assert!(dataset.query_indices(expression).unwrap().is_empty(), "{expression}");
        }
        let predicate =
            Predicate::compare(ColumnRef::new("age"), ComparisonOp::NotEqual, ScalarValue::Null);
        assert!(dataset.scan_indices(&predicate).unwrap().is_empty());
    }

    #[test]
    fn with_column_replaces_and_display_prints_index() {
        let dataset = Dataset::with_index(people().batch().clone(), [5, 6, 7, 8]).expect("index");
        let labels: ArrayRef = Arc::new(StringArray::from(vec![Some("x"), None, Some("y"), None]));
        let labelled = dataset.with_column("label", labels).expect("column");
        assert_eq!(labelled.schema().fields().len(), 4);
        let replaced = labelled
            .with_column("label", Arc::new(Int64Array::from(vec![1, 2, 3, 4])))
            .expect("replace");
        assert_eq!(replaced.schema().fields().len(), 4);
        assert_eq!(replaced.column("label").unwrap().data_type(), &DataType::Int64);

        let rendered = labelled.to_string();
        assert!(rendered.contains("| index |"), "{rendered}");
        assert!(rendered.contains("| 7     |"), "{rendered}");
    }
}

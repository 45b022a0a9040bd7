use std::{collections::HashMap, fmt, sync::Arc};

use crate::{
    error::SelectError,
    frame::{ColumnView, Dataset},
    predicate::ScalarValueRef,
    row_set::{BitmapRowSet, RowId},
    selector::{selector_ops, DataSelector},
};

/// Chooses a position inside a group of rows sharing one value.
pub type Indexer = Arc<dyn Fn(&Dataset) -> usize + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum GroupKey {
    Boolean(bool),
    Int64(i64),
    UInt64(u64),
    Float64(u64),
    Utf8(String),
}

impl GroupKey {
    fn from_value(value: ScalarValueRef<'_>) -> Option<Self> {
        match value {
            ScalarValueRef::Null => None,
            ScalarValueRef::Float64(v) if v.is_nan() => None,
            ScalarValueRef::Float64(v) => Some(GroupKey::Float64(v.to_bits())),
            ScalarValueRef::Boolean(v) => Some(GroupKey::Boolean(v)),
            ScalarValueRef::Int64(v) => Some(GroupKey::Int64(v)),
            ScalarValueRef::UInt64(v) => Some(GroupKey::UInt64(v)),
            ScalarValueRef::Utf8(v) => Some(GroupKey::Utf8(v.to_owned())),
        }
    }
}

/// One row per distinct value of a column.
///
/// Rows are grouped by value; rows without a value form no group. The first
/// row of each group is kept unless an indexer picks another position.
#[derive(Clone)]
pub struct UniqueElements {
    column: Arc<str>,
    indexer: Option<Indexer>,
}

impl UniqueElements {
    /// Keeps the first row of every distinct value of `column`.
    pub fn new(column: impl Into<Arc<str>>) -> Self {
        Self {
            column: column.into(),
            indexer: None,
        }
    }

    /// Lets `indexer` pick the kept row; it sees each group as a dataset and
    /// returns a zero-based position within it.
    pub fn with_indexer<F>(self, indexer: F) -> Self
    where
        F: Fn(&Dataset) -> usize + Send + Sync + 'static,
    {
        Self {
            indexer: Some(Arc::new(indexer)),
            ..self
        }
    }

    /// The grouped column.
    pub fn column(&self) -> &str {
        &self.column
    }

    fn groups(&self, dataset: &Dataset) -> Result<Vec<Vec<RowId>>, SelectError> {
        let array = dataset.canonical_column(&self.column)?;
        let view = ColumnView::new(&array);
        let mut slots: HashMap<GroupKey, usize> = HashMap::new();
        let mut groups: Vec<Vec<RowId>> = Vec::new();
        for (row, id) in dataset.row_ids().values().iter().enumerate() {
            let Some(key) = GroupKey::from_value(view.value(row)) else {
                continue;
            };
            let slot = *slots.entry(key).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[slot].push(*id);
        }
        Ok(groups)
    }
}

impl fmt::Debug for UniqueElements {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UniqueElements")
            .field("column", &self.column)
            .field("indexer", &self.indexer.as_ref().map(|_| "Fn(&Dataset) -> usize"))
            .finish()
    }
}

impl DataSelector for UniqueElements {
    fn get_indices(&self, dataset: &Dataset) -> Result<BitmapRowSet, SelectError> {
        let mut rows = BitmapRowSet::new();
        for group in self.groups(dataset)? {
            let position = match &self.indexer {
                None => 0,
                Some(indexer) => {
                    let members: BitmapRowSet = group.iter().copied().collect();
                    indexer(&dataset.take(&members)?)
                }
            };
            let id = group.get(position).ok_or(SelectError::IndexerOutOfRange {
                position,
                len: group.len(),
            })?;
            rows.insert(*id);
        }
        Ok(rows)
    }
}

selector_ops!(UniqueElements => index);

#[cfg(test)]
mod tests {
    use arrow::array::{ArrayRef, Float64Array, StringArray};

    use super::*;

    fn visits() -> Dataset {
        Dataset::from_columns([
            (
                "subject",
                Arc::new(StringArray::from(vec![
                    Some("a"),
                    Some("b"),
                    Some("a"),
                    None,
                    Some("b"),
                    Some("a"),
                ])) as ArrayRef,
            ),
            (
                "score",
                Arc::new(Float64Array::from(vec![1.0, f64::NAN, 1.0, 2.0, 3.0, -0.0])) as ArrayRef,
            ),
        ])
        .expect("dataset")
    }

    #[test]
    fn first_row_per_value_by_default() {
        let unique = UniqueElements::new("subject");
        assert_eq!(unique.get_indices(&visits()).unwrap().to_vec(), vec![0, 1]);

        // NaN forms no group.
        let by_score = UniqueElements::new("score");
        assert_eq!(by_score.get_indices(&visits()).unwrap().to_vec(), vec![0, 3, 4, 5]);
    }

    #[test]
    fn indexer_picks_within_each_group() {
        let last = UniqueElements::new("subject").with_indexer(|group| group.num_rows() - 1);
        assert_eq!(last.get_indices(&visits()).unwrap().to_vec(), vec![4, 5]);

        let second = UniqueElements::new("subject").with_indexer(|_| 1);
        assert_eq!(second.get_indices(&visits()).unwrap().to_vec(), vec![2, 4]);

        let third = UniqueElements::new("subject").with_indexer(|_| 2);
        assert!(matches!(
            third.get_indices(&visits()),
            Err(SelectError::IndexerOutOfRange { position: 2, len: 2 })
        ));
    }

    #[test]
    fn missing_column_is_reported() {
        assert!(matches!(
            UniqueElements::new("visit").get_indices(&visits()),
            Err(SelectError::MissingColumn(_))
        ));
    }
}

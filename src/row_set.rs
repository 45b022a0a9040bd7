//! Sets of row ids, the currency every index selector trades in.

use roaring::RoaringBitmap;

/// Stable identifier of a dataset row. Survives filtering.
pub type RowId = u32;

/// Set algebra over row ids.
///
/// Iteration is always ascending, so two equal sets list their rows
/// identically no matter how they were built.
pub trait RowSet {
    /// Number of rows held.
    fn len(&self) -> usize;

    /// True when no row is held.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Membership test.
    fn contains(&self, row: RowId) -> bool;

    /// Rows in ascending order.
    fn iter(&self) -> Box<dyn Iterator<Item = RowId> + '_>;

    /// Rows present in both.
    fn intersect(&self, other: &Self) -> Self
    where
        Self: Sized;

    /// Rows present in either.
    fn union(&self, other: &Self) -> Self
    where
        Self: Sized;

    /// Rows of `self` absent from `other`.
    fn difference(&self, other: &Self) -> Self
    where
        Self: Sized;

    /// Whether `other` holds every row of `self`.
    fn is_subset(&self, other: &Self) -> bool
    where
        Self: Sized;
}

/// Compressed [`RowSet`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BitmapRowSet(RoaringBitmap);

impl BitmapRowSet {
    /// An empty set.
    #[must_use]
    pub fn new() -> Self {
        Self(RoaringBitmap::new())
    }

    /// Adds `row`; a row already present is left alone.
    pub fn insert(&mut self, row: RowId) {
        self.0.insert(row);
    }

    /// Ascending copy of the rows.
    #[must_use]
    pub fn to_vec(&self) -> Vec<RowId> {
        self.0.iter().collect()
    }
}

impl FromIterator<RowId> for BitmapRowSet {
    fn from_iter<I: IntoIterator<Item = RowId>>(rows: I) -> Self {
        Self(RoaringBitmap::from_iter(rows))
    }
}

impl RowSet for BitmapRowSet {
    fn len(&self) -> usize {
        self.0.len() as usize
    }

    fn contains(&self, row: RowId) -> bool {
        self.0.contains(row)
    }

    fn iter(&self) -> Box<dyn Iterator<Item = RowId> + '_> {
        Box::new(self.0.iter())
    }

    fn intersect(&self, other: &Self) -> Self {
        Self(&self.0 & &other.0)
    }

    fn union(&self, other: &Self) -> Self {
        Self(&self.0 | &other.0)
    }

    fn difference(&self, other: &Self) -> Self {
        Self(&self.0 - &other.0)
    }

    fn is_subset(&self, other: &Self) -> bool {
        self.0.is_subset(&other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(ids: &[RowId]) -> BitmapRowSet {
        ids.iter().copied().collect()
    }

    #[test]
    fn algebra_over_overlapping_sets() {
        let odd = rows(&[1, 3, 5, 7]);
        let mid = rows(&[3, 4, 5]);

        assert_eq!(odd.intersect(&mid).to_vec(), [3, 5]);
        assert_eq!(odd.union(&mid).to_vec(), [1, 3, 4, 5, 7]);
        assert_eq!(odd.difference(&mid).to_vec(), [1, 7]);
        assert_eq!(mid.difference(&odd).to_vec(), [4]);
        assert!(rows(&[3, 5]).is_subset(&odd));
        assert!(!mid.is_subset(&odd));
    }

    #[test]
    fn inserts_come_back_sorted() {
        let mut set = BitmapRowSet::new();
        for id in [9, 2, 40, 0, 9] {
            set.insert(id);
        }
        assert_eq!(set.iter().collect::<Vec<_>>(), [0, 2, 9, 40]);
        assert_eq!(set.len(), 4);
        assert!(set.contains(40));
        assert!(!set.contains(41));
    }

    #[test]
    fn empty_set() {
        let none = BitmapRowSet::new();
        assert!(none.is_empty());
        assert!(none.is_subset(&rows(&[1])));
        assert!(none.intersect(&rows(&[1, 2])).is_empty());
        assert_eq!(none.union(&rows(&[6])).to_vec(), [6]);
    }
}

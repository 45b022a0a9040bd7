use super::{resolve_alone, DataSelector, EvalScope, Selector};
use crate::{
    error::SelectError,
    frame::Dataset,
    row_set::{BitmapRowSet, RowSet},
};

/// Rows matched by both operands.
#[derive(Debug, Clone)]
pub struct Intersection {
    left: Selector,
    right: Selector,
}

impl Intersection {
    /// Intersection of `left` and `right`.
    pub fn new(left: Selector, right: Selector) -> Self {
        Self { left, right }
    }

    /// Left operand.
    pub fn left(&self) -> &Selector {
        &self.left
    }

    /// Right operand.
    pub fn right(&self) -> &Selector {
        &self.right
    }
}

impl DataSelector for Intersection {
    fn get_indices(&self, dataset: &Dataset) -> Result<BitmapRowSet, SelectError> {
        resolve_alone(self, dataset)
    }

    fn resolve(&self, scope: &mut EvalScope<'_>) -> Result<BitmapRowSet, SelectError> {
        // Both sides always run against the full dataset, so errors surface
        // regardless of what the other side matched.
        let left = scope.resolve(&self.left)?;
        let right = scope.resolve(&self.right)?;
        Ok(left.intersect(&right))
    }
}

/// Rows matched by either operand.
#[derive(Debug, Clone)]
pub struct Union {
    left: Selector,
    right: Selector,
}

impl Union {
    /// Union of `left` and `right`.
    pub fn new(left: Selector, right: Selector) -> Self {
        Self { left, right }
    }

    /// Left operand.
    pub fn left(&self) -> &Selector {
        &self.left
    }

    /// Right operand.
    pub fn right(&self) -> &Selector {
        &self.right
    }
}

impl DataSelector for Union {
    fn get_indices(&self, dataset: &Dataset) -> Result<BitmapRowSet, SelectError> {
        resolve_alone(self, dataset)
    }

    fn resolve(&self, scope: &mut EvalScope<'_>) -> Result<BitmapRowSet, SelectError> {
        let left = scope.resolve(&self.left)?;
        let right = scope.resolve(&self.right)?;
        Ok(left.union(&right))
    }
}

/// Rows of the dataset not matched by the operand.
#[derive(Debug, Clone)]
pub struct Complement {
    inner: Selector,
}

impl Complement {
    /// Complement of `inner`.
    pub fn new(inner: Selector) -> Self {
        Self { inner }
    }

    /// The complemented selector.
    pub fn inner(&self) -> &Selector {
        &self.inner
    }
}

impl DataSelector for Complement {
    fn get_indices(&self, dataset: &Dataset) -> Result<BitmapRowSet, SelectError> {
        resolve_alone(self, dataset)
    }

    fn resolve(&self, scope: &mut EvalScope<'_>) -> Result<BitmapRowSet, SelectError> {
        let inner = scope.resolve(&self.inner)?;
        Ok(scope.dataset().full_index().difference(&inner))
    }

    fn complemented(&self) -> Option<&Selector> {
        Some(&self.inner)
    }
}

//! Binding generic selectors to concrete column names.

use std::sync::Arc;

use crate::{error::SelectError, predicate::ColumnRef};

/// Column a localizable selector reads, if one has been chosen.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColumnBinding {
    column: Option<Arc<str>>,
}

impl ColumnBinding {
    /// A binding without a column.
    pub fn unbound() -> Self {
        Self::default()
    }

    /// A binding to `column`.
    pub fn bound(column: impl Into<Arc<str>>) -> Self {
        Self {
            column: Some(column.into()),
        }
    }

    /// Sets or replaces the bound column.
    pub fn bind(&mut self, column: impl Into<Arc<str>>) {
        self.column = Some(column.into());
    }

    /// The bound column name.
    pub fn get(&self) -> Option<&str> {
        self.column.as_deref()
    }

    /// The bound column, or [`SelectError::UnboundColumn`] naming `selector`.
    pub fn column(&self, selector: &'static str) -> Result<ColumnRef, SelectError> {
        self.column
            .as_ref()
            .map(|name| ColumnRef::new(Arc::clone(name)))
            .ok_or(SelectError::UnboundColumn { selector })
    }
}

/// Selector that reads a single column chosen after construction.
pub trait Localizable: Sized {
    /// Selector name used in [`SelectError::UnboundColumn`].
    const KIND: &'static str;

    /// Current binding.
    fn binding(&self) -> &ColumnBinding;

    /// Mutable binding.
    fn binding_mut(&mut self) -> &mut ColumnBinding;

    /// Binds the selector to `column`.
    fn on(mut self, column: impl Into<Arc<str>>) -> Self {
        self.binding_mut().bind(column);
        self
    }

    /// The bound column name, if any.
    fn column_name(&self) -> Option<&str> {
        self.binding().get()
    }

    /// The bound column, failing when the selector is unbound.
    fn column(&self) -> Result<ColumnRef, SelectError> {
        self.binding().column(Self::KIND)
    }
}

/// Reusable factory that binds selectors to one column.
///
/// ```
/// use dataselect::{Localizable, Localizer, RangeQuery};
///
/// let sepal_length = Localizer::new("sepal.length");
/// let short = sepal_length.bind(RangeQuery::max(5));
/// assert_eq!(short.column_name(), Some("sepal.length"));
/// ```
#[derive(Clone, Debug)]
pub struct Localizer {
    column: Arc<str>,
}

impl Localizer {
    /// A factory for `column`.
    pub fn new(column: impl Into<Arc<str>>) -> Self {
        Self {
            column: column.into(),
        }
    }

    /// The column selectors get bound to.
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Binds `selector` to this factory's column.
    pub fn bind<L: Localizable>(&self, selector: L) -> L {
        selector.on(Arc::clone(&self.column))
    }
}

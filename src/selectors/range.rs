use crate::{
    error::SelectError,
    predicate::{Predicate, PredicateBuilder, ScalarValue},
    selector::{selector_ops, ColumnBinding, Localizable, QueryExpressible},
};

/// Rows whose value lies within a range, `[min, max)` unless told otherwise.
///
/// ```
/// use dataselect::{Localizable, RangeQuery, QueryExpressible};
///
/// let range = RangeQuery::between(5, 6).on("sepal.length");
/// assert_eq!(
///     range.to_expression().unwrap(),
///     "(`sepal.length` >= 5) & (`sepal.length` < 6)"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct RangeQuery {
    binding: ColumnBinding,
    min: Option<ScalarValue>,
    max: Option<ScalarValue>,
    min_inclusive: bool,
    max_inclusive: bool,
}

impl RangeQuery {
    fn new(min: Option<ScalarValue>, max: Option<ScalarValue>) -> Self {
        Self {
            binding: ColumnBinding::unbound(),
            min,
            max,
            min_inclusive: true,
            max_inclusive: false,
        }
    }

    /// Values from `min` up to `max`.
    pub fn between(min: impl Into<ScalarValue>, max: impl Into<ScalarValue>) -> Self {
        Self::new(Some(min.into()), Some(max.into()))
    }

    /// Values from `min` upward.
    pub fn min(min: impl Into<ScalarValue>) -> Self {
        Self::new(Some(min.into()), None)
    }

    /// Values below `max`.
    pub fn max(max: impl Into<ScalarValue>) -> Self {
        Self::new(None, Some(max.into()))
    }

    /// Whether the lower bound itself matches (`>=` rather than `>`).
    pub fn min_inclusive(self, min_inclusive: bool) -> Self {
        Self {
            min_inclusive,
            ..self
        }
    }

    /// Whether the upper bound itself matches (`<=` rather than `<`).
    pub fn max_inclusive(self, max_inclusive: bool) -> Self {
        Self {
            max_inclusive,
            ..self
        }
    }

    /// Lower bound, if any.
    pub fn lower(&self) -> Option<&ScalarValue> {
        self.min.as_ref()
    }

    /// Upper bound, if any.
    pub fn upper(&self) -> Option<&ScalarValue> {
        self.max.as_ref()
    }
}

impl Localizable for RangeQuery {
    const KIND: &'static str = "range";

    fn binding(&self) -> &ColumnBinding {
        &self.binding
    }

    fn binding_mut(&mut self) -> &mut ColumnBinding {
        &mut self.binding
    }
}

impl QueryExpressible for RangeQuery {
    fn predicate(&self) -> Result<Predicate, SelectError> {
        let column = self.column()?;
        let mut builder = PredicateBuilder::all();
        if let Some(min) = &self.min {
            builder = builder.lower_bound(&column, min.clone(), self.min_inclusive);
        }
        if let Some(max) = &self.max {
            builder = builder.upper_bound(&column, max.clone(), self.max_inclusive);
        }
        builder
            .finish()
            .ok_or_else(|| SelectError::InvalidArgument("range without bounds".to_owned()))
    }
}

selector_ops!(RangeQuery => query);

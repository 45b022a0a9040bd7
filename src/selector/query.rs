use std::{fmt, sync::Arc};

use crate::{error::SelectError, predicate::Predicate};

/// Selector that compiles to a boolean predicate over columns.
///
/// Datasets evaluate the rendered expression with their own query evaluator, so
/// combinations of query-expressible selectors need no row-set algebra at all.
pub trait QueryExpressible: fmt::Debug + Send + Sync {
    /// The predicate this selector stands for.
    fn predicate(&self) -> Result<Predicate, SelectError>;

    /// The predicate rendered in the expression grammar.
    fn to_expression(&self) -> Result<String, SelectError> {
        Ok(self.predicate()?.to_string())
    }
}

/// Boolean combination of query-expressible selectors.
#[derive(Debug, Clone)]
pub enum QueryCombination {
    /// Both operands hold.
    And(Arc<dyn QueryExpressible>, Arc<dyn QueryExpressible>),
    /// Either operand holds.
    Or(Arc<dyn QueryExpressible>, Arc<dyn QueryExpressible>),
    /// The operand does not hold.
    Not(Arc<dyn QueryExpressible>),
}

impl QueryExpressible for QueryCombination {
    fn predicate(&self) -> Result<Predicate, SelectError> {
        let combined = match self {
            QueryCombination::And(left, right) => left.predicate()?.and(right.predicate()?),
            QueryCombination::Or(left, right) => left.predicate()?.or(right.predicate()?),
            QueryCombination::Not(inner) => inner.predicate()?.invert(),
        };
        Ok(combined.simplify())
    }
}

/// A hand-written expression string.
///
/// The text is parsed when the selector is evaluated, so a malformed
/// expression fails with [`SelectError::InvalidExpression`] at that point.
#[derive(Debug, Clone)]
pub struct RawQuery {
    expression: Arc<str>,
}

impl RawQuery {
    /// Wraps `expression` without parsing it.
    pub fn new(expression: impl Into<Arc<str>>) -> Self {
        Self {
            expression: expression.into(),
        }
    }

    /// The expression as written.
    pub fn expression(&self) -> &str {
        &self.expression
    }
}

impl QueryExpressible for RawQuery {
    fn predicate(&self) -> Result<Predicate, SelectError> {
        Predicate::parse(&self.expression)
    }

    fn to_expression(&self) -> Result<String, SelectError> {
        Ok(self.expression.to_string())
    }
}

impl QueryExpressible for Predicate {
    fn predicate(&self) -> Result<Predicate, SelectError> {
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::{ColumnRef, ComparisonOp, ScalarValue};

    #[test]
    fn combinations_flatten_and_drop_double_negation() {
        let a: Arc<dyn QueryExpressible> = Arc::new(RawQuery::new("a > 1"));
        let b: Arc<dyn QueryExpressible> = Arc::new(Predicate::compare(
            ColumnRef::new("b"),
            ComparisonOp::Equal,
            ScalarValue::from("x"),
        ));
        let c: Arc<dyn QueryExpressible> = Arc::new(RawQuery::new("c is null"));

        let ab: Arc<dyn QueryExpressible> = Arc::new(QueryCombination::And(a.clone(), b));
        let abc = QueryCombination::And(ab, c);
        assert_eq!(
            abc.to_expression().expect("expression"),
            "(`a` > 1) & (`b` == \"x\") & (`c` is null)"
        );

        let not_a: Arc<dyn QueryExpressible> = Arc::new(QueryCombination::Not(a.clone()));
        let not_not_a = QueryCombination::Not(not_a);
        assert_eq!(not_not_a.predicate().expect("predicate"), a.predicate().expect("predicate"));
    }

    #[test]
    fn raw_query_keeps_its_text_and_parses_lazily() {
        let raw = RawQuery::new("x >= 2 and y < 3");
        assert_eq!(raw.to_expression().expect("expression"), "x >= 2 and y < 3");
        assert_eq!(raw.predicate().expect("predicate").to_string(), "(`x` >= 2) & (`y` < 3)");

        let broken = RawQuery::new("x >=");
        assert!(matches!(
            broken.predicate(),
            Err(SelectError::InvalidExpression { .. })
        ));
    }
}

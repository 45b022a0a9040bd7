//! Incremental construction of predicates over columns.

use super::{ColumnRef, ComparisonOp, Predicate, ScalarValue};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Joiner {
    All,
    Any,
}

/// Collects row tests and joins them with `&` ([`all`]) or `|` ([`any`]).
///
/// ```
/// use dataselect::{ColumnRef, PredicateBuilder};
///
/// let age = ColumnRef::new("age");
/// let adults = PredicateBuilder::all()
///     .lower_bound(&age, 18, true)
///     .upper_bound(&age, 65, false)
///     .finish()
///     .unwrap();
/// assert_eq!(adults.to_string(), "(`age` >= 18) & (`age` < 65)");
/// ```
///
/// [`all`]: PredicateBuilder::all
/// [`any`]: PredicateBuilder::any
#[derive(Debug, Clone)]
pub struct PredicateBuilder {
    joiner: Joiner,
    clauses: Vec<Predicate>,
}

impl PredicateBuilder {
    fn new(joiner: Joiner) -> Self {
        Self {
            joiner,
            clauses: Vec::new(),
        }
    }

    /// Rows passing every clause.
    pub fn all() -> Self {
        Self::new(Joiner::All)
    }

    /// Rows passing at least one clause.
    pub fn any() -> Self {
        Self::new(Joiner::Any)
    }

    /// Adds a ready-made predicate.
    #[must_use]
    pub fn clause(mut self, predicate: Predicate) -> Self {
        self.clauses.push(predicate);
        self
    }

    /// Adds `column op value`.
    #[must_use]
    pub fn test(self, column: &ColumnRef, op: ComparisonOp, value: impl Into<ScalarValue>) -> Self {
        self.clause(Predicate::compare(column.clone(), op, value.into()))
    }

    /// Adds `column >= value`, or `column > value` when not `inclusive`.
    #[must_use]
    pub fn lower_bound(
        self,
        column: &ColumnRef,
        value: impl Into<ScalarValue>,
        inclusive: bool,
    ) -> Self {
        let op = if inclusive {
            ComparisonOp::GreaterThanOrEqual
        } else {
            ComparisonOp::GreaterThan
        };
        self.test(column, op, value)
    }

    /// Adds `column <= value`, or `column < value` when not `inclusive`.
    #[must_use]
    pub fn upper_bound(
        self,
        column: &ColumnRef,
        value: impl Into<ScalarValue>,
        inclusive: bool,
    ) -> Self {
        let op = if inclusive {
            ComparisonOp::LessThanOrEqual
        } else {
            ComparisonOp::LessThan
        };
        self.test(column, op, value)
    }

    /// Adds `column in values`, or `not in` when `negated`.
    #[must_use]
    pub fn one_of<I>(self, column: &ColumnRef, values: I, negated: bool) -> Self
    where
        I: IntoIterator,
        I::Item: Into<ScalarValue>,
    {
        let values = values.into_iter().map(Into::into);
        self.clause(Predicate::in_list(column.clone(), values, negated))
    }

    /// Adds `column is not null`.
    #[must_use]
    pub fn present(self, column: &ColumnRef) -> Self {
        self.clause(Predicate::is_null(column.clone(), true))
    }

    /// Adds `column is null`.
    #[must_use]
    pub fn missing(self, column: &ColumnRef) -> Self {
        self.clause(Predicate::is_null(column.clone(), false))
    }

    /// Adds everything `nested` collected as one parenthesised clause.
    /// An empty `nested` adds nothing.
    #[must_use]
    pub fn group(self, nested: PredicateBuilder) -> Self {
        match nested.finish() {
            Some(predicate) => self.clause(predicate),
            None => self,
        }
    }

    /// Adds the negation of everything `nested` collected.
    /// An empty `nested` adds nothing.
    #[must_use]
    pub fn negated(self, nested: PredicateBuilder) -> Self {
        match nested.finish() {
            Some(predicate) => self.clause(predicate.invert().simplify()),
            None => self,
        }
    }

    /// Number of clauses collected so far.
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// True before the first clause.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// The joined predicate, or `None` when no clause was added.
    pub fn finish(self) -> Option<Predicate> {
        match self.joiner {
            Joiner::All => Predicate::conjunction(self.clauses),
            Joiner::Any => Predicate::disjunction(self.clauses),
        }
    }
}

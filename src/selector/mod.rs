//! The selector algebra.
//!
//! A [`Selector`] is a cheap handle over either an index-based node
//! ([`DataSelector`]) or a query-expressible node ([`QueryExpressible`]).
//! Combining two selectors never evaluates anything: when both operands are
//! query-expressible the result is a new query node whose predicate is the
//! boolean combination of the operands' predicates; otherwise the result is an
//! index combinator ([`Intersection`], [`Union`], [`Complement`]) that combines
//! row sets at evaluation time.
//!
//! Evaluation happens against a [`Dataset`] through an [`EvalScope`], which
//! carries the [`EvalOptions`] and memoises the row set of every node for the
//! duration of one call.

mod combinator;
mod localize;
mod query;

use std::{
    collections::HashMap,
    fmt,
    ops::{BitAnd, BitOr, Not},
    sync::Arc,
};

pub use combinator::{Complement, Intersection, Union};
pub use localize::{ColumnBinding, Localizable, Localizer};
pub use query::{QueryCombination, QueryExpressible, RawQuery};

use crate::{
    error::SelectError,
    frame::Dataset,
    logging::{select_log, LogContext},
    option::{EvalOptions, QueryPath},
    predicate::Predicate,
    row_set::{BitmapRowSet, RowSet},
};

const SCOPE_LOG: LogContext = LogContext::new("scope");

/// Index-based selector: computes the matching row ids directly.
pub trait DataSelector: fmt::Debug + Send + Sync {
    /// Ids of the rows of `dataset` this selector matches.
    fn get_indices(&self, dataset: &Dataset) -> Result<BitmapRowSet, SelectError>;

    /// Rows of `dataset` this selector matches, in their original order.
    fn apply(&self, dataset: &Dataset) -> Result<Dataset, SelectError> {
        dataset.take(&self.get_indices(dataset)?)
    }

    /// Resolves the row set inside an evaluation scope.
    ///
    /// Nodes with children override this so the children resolve through the
    /// same scope and share its memo.
    fn resolve(&self, scope: &mut EvalScope<'_>) -> Result<BitmapRowSet, SelectError> {
        self.get_indices(scope.dataset())
    }

    /// The operand of this node if it is a complement.
    fn complemented(&self) -> Option<&Selector> {
        None
    }
}

/// Resolves a node with children in a fresh scope with default options.
pub(crate) fn resolve_alone<S>(node: &S, dataset: &Dataset) -> Result<BitmapRowSet, SelectError>
where
    S: DataSelector + ?Sized,
{
    let options = EvalOptions::default();
    let mut scope = EvalScope::new(dataset, &options);
    node.resolve(&mut scope)
}

/// Handle to a node of the selector algebra.
#[derive(Clone, Debug)]
pub enum Selector {
    /// Node that computes row ids directly.
    Index(Arc<dyn DataSelector>),
    /// Node that compiles to a boolean expression.
    Query(Arc<dyn QueryExpressible>),
}

impl Selector {
    /// Wraps an index-based node.
    pub fn index<S>(selector: S) -> Self
    where
        S: DataSelector + 'static,
    {
        Selector::Index(Arc::new(selector))
    }

    /// Wraps a query-expressible node.
    pub fn query<S>(selector: S) -> Self
    where
        S: QueryExpressible + 'static,
    {
        Selector::Query(Arc::new(selector))
    }

    /// True when this selector compiles to an expression.
    pub fn is_query(&self) -> bool {
        matches!(self, Selector::Query(_))
    }

    /// Ids of the rows of `dataset` this selector matches.
    pub fn get_indices(&self, dataset: &Dataset) -> Result<BitmapRowSet, SelectError> {
        self.get_indices_with(dataset, &EvalOptions::default())
    }

    /// [`Selector::get_indices`] with explicit options.
    pub fn get_indices_with(
        &self,
        dataset: &Dataset,
        options: &EvalOptions,
    ) -> Result<BitmapRowSet, SelectError> {
        EvalScope::new(dataset, options).resolve(self)
    }

    /// Rows of `dataset` this selector matches, in their original order.
    pub fn apply(&self, dataset: &Dataset) -> Result<Dataset, SelectError> {
        match self {
            Selector::Index(node) => node.apply(dataset),
            Selector::Query(_) => self.apply_with(dataset, &EvalOptions::default()),
        }
    }

    /// [`Selector::apply`] with explicit options.
    ///
    /// Query selectors on the expression path filter with the compiled
    /// expression; everything else filters by the resolved row ids.
    pub fn apply_with(
        &self,
        dataset: &Dataset,
        options: &EvalOptions,
    ) -> Result<Dataset, SelectError> {
        match (self, options.path()) {
            (Selector::Query(node), QueryPath::Expression) => dataset.query(&node.to_expression()?),
            _ => dataset.take(&self.get_indices_with(dataset, options)?),
        }
    }

    /// The compiled expression string, for query-expressible selectors.
    pub fn to_expression(&self) -> Option<Result<String, SelectError>> {
        match self {
            Selector::Query(node) => Some(node.to_expression()),
            Selector::Index(_) => None,
        }
    }

    /// The predicate tree, for query-expressible selectors.
    pub fn predicate(&self) -> Option<Result<Predicate, SelectError>> {
        match self {
            Selector::Query(node) => Some(node.predicate()),
            Selector::Index(_) => None,
        }
    }

    /// Rows matched by both `self` and `other`.
    pub fn intersect(&self, other: &Selector) -> Selector {
        match (self, other) {
            (Selector::Query(left), Selector::Query(right)) => {
                log_composition("and", "query");
                Selector::Query(Arc::new(QueryCombination::And(
                    Arc::clone(left),
                    Arc::clone(right),
                )))
            }
            _ => {
                log_composition("and", "index");
                Selector::index(Intersection::new(self.clone(), other.clone()))
            }
        }
    }

    /// Rows matched by `self` or `other`.
    pub fn unite(&self, other: &Selector) -> Selector {
        match (self, other) {
            (Selector::Query(left), Selector::Query(right)) => {
                log_composition("or", "query");
                Selector::Query(Arc::new(QueryCombination::Or(
                    Arc::clone(left),
                    Arc::clone(right),
                )))
            }
            _ => {
                log_composition("or", "index");
                Selector::index(Union::new(self.clone(), other.clone()))
            }
        }
    }

    /// Rows not matched by `self`. Complementing a complement returns its operand.
    pub fn complement(&self) -> Selector {
        match self {
            Selector::Query(inner) => {
                log_composition("not", "query");
                Selector::Query(Arc::new(QueryCombination::Not(Arc::clone(inner))))
            }
            Selector::Index(node) => match node.complemented() {
                Some(operand) => operand.clone(),
                None => {
                    log_composition("not", "index");
                    Selector::index(Complement::new(self.clone()))
                }
            },
        }
    }

    /// Identity of the node behind the handle.
    fn node_key(&self) -> usize {
        match self {
            Selector::Index(node) => Arc::as_ptr(node).cast::<()>() as usize,
            Selector::Query(node) => Arc::as_ptr(node).cast::<()>() as usize,
        }
    }
}

fn log_composition(op: &'static str, path: &'static str) {
    select_log!(log::Level::Trace, "compose", "op={} path={}", op, path);
}

impl From<&Selector> for Selector {
    fn from(selector: &Selector) -> Self {
        selector.clone()
    }
}

impl From<Predicate> for Selector {
    fn from(predicate: Predicate) -> Self {
        Selector::query(predicate)
    }
}

impl From<RawQuery> for Selector {
    fn from(query: RawQuery) -> Self {
        Selector::query(query)
    }
}

impl<R: Into<Selector>> BitAnd<R> for Selector {
    type Output = Selector;

    fn bitand(self, rhs: R) -> Selector {
        self.intersect(&rhs.into())
    }
}

impl<R: Into<Selector>> BitAnd<R> for &Selector {
    type Output = Selector;

    fn bitand(self, rhs: R) -> Selector {
        self.intersect(&rhs.into())
    }
}

impl<R: Into<Selector>> BitOr<R> for Selector {
    type Output = Selector;

    fn bitor(self, rhs: R) -> Selector {
        self.unite(&rhs.into())
    }
}

impl<R: Into<Selector>> BitOr<R> for &Selector {
    type Output = Selector;

    fn bitor(self, rhs: R) -> Selector {
        self.unite(&rhs.into())
    }
}

impl Not for Selector {
    type Output = Selector;

    fn not(self) -> Selector {
        self.complement()
    }
}

impl Not for &Selector {
    type Output = Selector;

    fn not(self) -> Selector {
        self.complement()
    }
}

/// Implements `From<$leaf> for Selector` plus the `&`, `|`, `!` and `>>`
/// operators for leaf selector types.
macro_rules! selector_ops {
    ($($leaf:ty => $wrap:ident),+ $(,)?) => {$(
        impl From<$leaf> for $crate::selector::Selector {
            fn from(leaf: $leaf) -> Self {
                $crate::selector::Selector::$wrap(leaf)
            }
        }

        impl<R: Into<$crate::selector::Selector>> ::std::ops::BitAnd<R> for $leaf {
            type Output = $crate::selector::Selector;

            fn bitand(self, rhs: R) -> Self::Output {
                $crate::selector::Selector::from(self).intersect(&rhs.into())
            }
        }

        impl<R: Into<$crate::selector::Selector>> ::std::ops::BitOr<R> for $leaf {
            type Output = $crate::selector::Selector;

            fn bitor(self, rhs: R) -> Self::Output {
                $crate::selector::Selector::from(self).unite(&rhs.into())
            }
        }

        impl ::std::ops::Not for $leaf {
            type Output = $crate::selector::Selector;

            fn not(self) -> Self::Output {
                $crate::selector::Selector::from(self).complement()
            }
        }

        impl ::std::ops::Shr<$crate::selectors::Sample> for $leaf {
            type Output = $crate::selector::Selector;

            fn shr(self, sample: $crate::selectors::Sample) -> Self::Output {
                $crate::selector::Selector::from(self) >> sample
            }
        }
    )+};
}

pub(crate) use selector_ops;

/// State of one evaluation call: the dataset, the options and a memo of
/// resolved row sets keyed by node identity.
pub struct EvalScope<'a> {
    dataset: &'a Dataset,
    options: &'a EvalOptions,
    memo: HashMap<usize, BitmapRowSet>,
    evaluated: usize,
}

impl<'a> EvalScope<'a> {
    /// Opens a scope over `dataset`.
    pub fn new(dataset: &'a Dataset, options: &'a EvalOptions) -> Self {
        Self {
            dataset,
            options,
            memo: HashMap::new(),
            evaluated: 0,
        }
    }

    /// The dataset every node of the call is evaluated against.
    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    /// Options of the call.
    pub fn options(&self) -> &'a EvalOptions {
        self.options
    }

    /// Number of nodes actually evaluated so far (memo hits excluded).
    pub fn evaluated(&self) -> usize {
        self.evaluated
    }

    /// Resolves `selector` to its row set, reusing earlier results for nodes
    /// already seen in this scope when memoisation is on.
    pub fn resolve(&mut self, selector: &Selector) -> Result<BitmapRowSet, SelectError> {
        let key = selector.node_key();
        if self.options.memoizes() {
            if let Some(rows) = self.memo.get(&key) {
                select_log!(
                    log::Level::Trace,
                    ctx: SCOPE_LOG,
                    "memo_hit",
                    "node={:#x} rows={}",
                    key,
                    rows.len()
                );
                return Ok(rows.clone());
            }
        }
        self.evaluated += 1;
        let rows = match selector {
            Selector::Index(node) => node.resolve(self)?,
            Selector::Query(node) => self.evaluate_query(node.as_ref())?,
        };
        if self.options.memoizes() {
            self.memo.insert(key, rows.clone());
        }
        Ok(rows)
    }

    fn evaluate_query(&self, node: &dyn QueryExpressible) -> Result<BitmapRowSet, SelectError> {
        match self.options.path() {
            QueryPath::Expression => self.dataset.query_indices(&node.to_expression()?),
            QueryPath::Direct => self.dataset.scan_indices(&node.predicate()?),
        }
    }
}

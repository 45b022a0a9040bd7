//! Predicate trees behind query-expressible selectors.
//!
//! A [`Predicate`] is a boolean expression over column comparisons. It renders to
//! the textual expression grammar (see [`render`]) and parses back from it (see
//! [`parse`]). Datasets evaluate predicates either through Arrow kernels or row
//! by row; both walk the tree with a [`PredicateVisitor`].

mod builder;
mod parse;
mod render;
mod visitor;

use std::{cmp::Ordering, collections::BTreeSet, fmt, sync::Arc};

pub use builder::PredicateBuilder;
pub use visitor::PredicateVisitor;

/// A literal in an expression.
#[derive(Clone, Debug, PartialEq)]
pub enum ScalarValue {
    /// `null`; compares with nothing.
    Null,
    /// `true` / `false`.
    Boolean(bool),
    /// Integer that fits `i64`.
    Int64(i64),
    /// Integer above `i64::MAX`, or any unsigned value built from Rust.
    UInt64(u64),
    /// Float, including `nan` and `±inf`.
    Float64(f64),
    /// Quoted string.
    Utf8(String),
}

impl ScalarValue {
    /// True for `null`.
    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }

    /// True for literals no row can match: `null` and `nan`.
    pub fn is_missing(&self) -> bool {
        self.as_ref().is_missing()
    }

    /// Ordering against `other`, `None` when the two are not comparable.
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        self.as_ref().compare(other.as_ref())
    }

    /// Borrowed form of the literal.
    pub fn as_ref(&self) -> ScalarValueRef<'_> {
        match self {
            ScalarValue::Null => ScalarValueRef::Null,
            ScalarValue::Boolean(value) => ScalarValueRef::Boolean(*value),
            ScalarValue::Int64(value) => ScalarValueRef::Int64(*value),
            ScalarValue::UInt64(value) => ScalarValueRef::UInt64(*value),
            ScalarValue::Float64(value) => ScalarValueRef::Float64(*value),
            ScalarValue::Utf8(value) => ScalarValueRef::Utf8(value),
        }
    }

    pub(crate) fn type_name(&self) -> &'static str {
        match self {
            ScalarValue::Null => "null",
            ScalarValue::Boolean(_) => "boolean",
            ScalarValue::Int64(_) => "int64",
            ScalarValue::UInt64(_) => "uint64",
            ScalarValue::Float64(_) => "float64",
            ScalarValue::Utf8(_) => "utf8",
        }
    }
}

macro_rules! scalar_from {
    ($variant:ident, $target:ty, $($source:ty),+) => {
        $(
            impl From<$source> for ScalarValue {
                fn from(value: $source) -> Self {
                    ScalarValue::$variant(<$target>::from(value))
                }
            }
        )+
    };
}

scalar_from!(Boolean, bool, bool);
scalar_from!(Int64, i64, i8, i16, i32, i64);
scalar_from!(UInt64, u64, u8, u16, u32, u64);
scalar_from!(Float64, f64, f32, f64);

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::Utf8(value.to_owned())
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        ScalarValue::Utf8(value)
    }
}

/// A cell value or literal, borrowed. Both evaluators compare through this.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScalarValueRef<'a> {
    /// Null cell or `null` literal.
    Null,
    /// Boolean.
    Boolean(bool),
    /// Signed integer.
    Int64(i64),
    /// Unsigned integer.
    UInt64(u64),
    /// Float.
    Float64(f64),
    /// String.
    Utf8(&'a str),
}

impl ScalarValueRef<'_> {
    /// True for null and NaN.
    pub fn is_missing(self) -> bool {
        match self {
            ScalarValueRef::Null => true,
            ScalarValueRef::Float64(value) => value.is_nan(),
            _ => false,
        }
    }

    /// Ordering against `other`, `None` when either side is missing or the
    /// kinds differ.
    ///
    /// Integers of different signedness compare exactly; integer/float mixes
    /// compare as `f64`.
    pub fn compare(self, other: ScalarValueRef<'_>) -> Option<Ordering> {
        use ScalarValueRef::*;
        match (self, other) {
            (Boolean(lhs), Boolean(rhs)) => Some(lhs.cmp(&rhs)),
            (Int64(lhs), Int64(rhs)) => Some(lhs.cmp(&rhs)),
            (UInt64(lhs), UInt64(rhs)) => Some(lhs.cmp(&rhs)),
            (Int64(lhs), UInt64(rhs)) => Some(i128::from(lhs).cmp(&i128::from(rhs))),
            (UInt64(lhs), Int64(rhs)) => Some(i128::from(lhs).cmp(&i128::from(rhs))),
            (Utf8(lhs), Utf8(rhs)) => Some(lhs.cmp(rhs)),
            (lhs, rhs) => lhs.as_f64()?.partial_cmp(&rhs.as_f64()?),
        }
    }

    fn as_f64(self) -> Option<f64> {
        match self {
            ScalarValueRef::Int64(value) => Some(value as f64),
            ScalarValueRef::UInt64(value) => Some(value as f64),
            ScalarValueRef::Float64(value) => Some(value),
            _ => None,
        }
    }
}

impl<'a> From<&'a ScalarValue> for ScalarValueRef<'a> {
    fn from(value: &'a ScalarValue) -> Self {
        value.as_ref()
    }
}

/// A column by name, resolved against a dataset only at evaluation time.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnRef {
    /// Column name.
    pub name: Arc<str>,
}

impl ColumnRef {
    /// Refers to the column called `name`.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self { name: name.into() }
    }
}

/// One side of a comparison.
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    /// A column.
    Column(ColumnRef),
    /// A literal.
    Literal(ScalarValue),
}

impl From<ColumnRef> for Operand {
    fn from(value: ColumnRef) -> Self {
        Self::Column(value)
    }
}

impl From<ScalarValue> for Operand {
    fn from(value: ScalarValue) -> Self {
        Self::Literal(value)
    }
}

/// `==`, `!=`, `<`, `<=`, `>`, `>=`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `<`
    LessThan,
    /// `<=`
    LessThanOrEqual,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterThanOrEqual,
}

impl ComparisonOp {
    /// The operator as written in expressions.
    pub fn as_str(self) -> &'static str {
        match self {
            ComparisonOp::Equal => "==",
            ComparisonOp::NotEqual => "!=",
            ComparisonOp::LessThan => "<",
            ComparisonOp::LessThanOrEqual => "<=",
            ComparisonOp::GreaterThan => ">",
            ComparisonOp::GreaterThanOrEqual => ">=",
        }
    }

    /// The operator with its operands swapped: `a < b` is `b > a`.
    pub fn flipped(self) -> Self {
        match self {
            ComparisonOp::LessThan => ComparisonOp::GreaterThan,
            ComparisonOp::LessThanOrEqual => ComparisonOp::GreaterThanOrEqual,
            ComparisonOp::GreaterThan => ComparisonOp::LessThan,
            ComparisonOp::GreaterThanOrEqual => ComparisonOp::LessThanOrEqual,
            symmetric => symmetric,
        }
    }

    /// Whether `lhs op rhs` holds given `lhs.cmp(rhs) == ordering`.
    pub fn test_ordering(self, ordering: Ordering) -> bool {
        match self {
            ComparisonOp::Equal => ordering.is_eq(),
            ComparisonOp::NotEqual => ordering.is_ne(),
            ComparisonOp::LessThan => ordering.is_lt(),
            ComparisonOp::LessThanOrEqual => ordering.is_le(),
            ComparisonOp::GreaterThan => ordering.is_gt(),
            ComparisonOp::GreaterThanOrEqual => ordering.is_ge(),
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row test with no sub-predicates.
#[derive(Clone, Debug, PartialEq)]
pub enum PredicateLeaf {
    /// `left op right`; at least one side is a column.
    Compare {
        /// Left operand.
        left: Operand,
        /// Operator.
        op: ComparisonOp,
        /// Right operand.
        right: Operand,
    },
    /// `column in [..]`, or `column not in [..]` when `negated`.
    InList {
        /// Tested column.
        column: ColumnRef,
        /// Candidate literals.
        values: Vec<ScalarValue>,
        /// `not in`.
        negated: bool,
    },
    /// `column is null`, or `column is not null` when `negated`. NaN counts
    /// as null.
    IsNull {
        /// Tested column.
        column: ColumnRef,
        /// `is not null`.
        negated: bool,
    },
}

/// Boolean expression over column comparisons.
///
/// `Not` is two-valued: a row fails the inner predicate, missing values
/// included, exactly when it passes the negation.
#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    /// A single row test.
    Leaf(PredicateLeaf),
    /// `~inner`
    Not(Box<Predicate>),
    /// `a & b & ..`, never empty.
    And(Vec<Predicate>),
    /// `a | b | ..`, never empty.
    Or(Vec<Predicate>),
}

#[derive(Clone, Copy)]
enum Junction {
    And,
    Or,
}

impl Predicate {
    /// `left op right`.
    pub fn compare(left: impl Into<Operand>, op: ComparisonOp, right: impl Into<Operand>) -> Self {
        Predicate::Leaf(PredicateLeaf::Compare {
            left: left.into(),
            op,
            right: right.into(),
        })
    }

    /// `column in values`, or `not in` when `negated`.
    pub fn in_list<I>(column: ColumnRef, values: I, negated: bool) -> Self
    where
        I: IntoIterator<Item = ScalarValue>,
    {
        Predicate::Leaf(PredicateLeaf::InList {
            column,
            values: values.into_iter().collect(),
            negated,
        })
    }

    /// `column is null`, or `is not null` when `negated`.
    pub fn is_null(column: ColumnRef, negated: bool) -> Self {
        Predicate::Leaf(PredicateLeaf::IsNull { column, negated })
    }

    /// `self & other`; nested conjunctions are merged.
    #[must_use]
    pub fn and(self, other: Predicate) -> Self {
        Self::join(Junction::And, self, [other])
    }

    /// `self | other`; nested disjunctions are merged.
    #[must_use]
    pub fn or(self, other: Predicate) -> Self {
        Self::join(Junction::Or, self, [other])
    }

    /// `~self`.
    #[must_use]
    pub fn invert(self) -> Self {
        Predicate::Not(Box::new(self))
    }

    /// Conjunction of every predicate, `None` for an empty list.
    pub fn conjunction(predicates: impl IntoIterator<Item = Predicate>) -> Option<Predicate> {
        let mut predicates = predicates.into_iter();
        let first = predicates.next()?;
        Some(Self::join(Junction::And, first, predicates))
    }

    /// Disjunction of every predicate, `None` for an empty list.
    pub fn disjunction(predicates: impl IntoIterator<Item = Predicate>) -> Option<Predicate> {
        let mut predicates = predicates.into_iter();
        let first = predicates.next()?;
        Some(Self::join(Junction::Or, first, predicates))
    }

    fn join(
        junction: Junction,
        first: Predicate,
        rest: impl IntoIterator<Item = Predicate>,
    ) -> Predicate {
        let mut clauses = Vec::new();
        for clause in std::iter::once(first).chain(rest) {
            match (junction, clause) {
                (Junction::And, Predicate::And(nested)) | (Junction::Or, Predicate::Or(nested)) => {
                    clauses.extend(nested)
                }
                (_, other) => clauses.push(other),
            }
        }
        match <[Predicate; 1]>::try_from(clauses) {
            Ok([single]) => single,
            Err(clauses) => match junction {
                Junction::And => Predicate::And(clauses),
                Junction::Or => Predicate::Or(clauses),
            },
        }
    }

    /// Drops double negations and merges nested conjunctions and
    /// disjunctions. Leaves are kept as they are.
    #[must_use]
    pub fn simplify(self) -> Self {
        match self {
            Predicate::Leaf(_) => self,
            Predicate::Not(inner) => match inner.simplify() {
                Predicate::Not(twice) => *twice,
                other => other.invert(),
            },
            Predicate::And(clauses) => Self::rejoin(Junction::And, clauses),
            Predicate::Or(clauses) => Self::rejoin(Junction::Or, clauses),
        }
    }

    fn rejoin(junction: Junction, clauses: Vec<Predicate>) -> Predicate {
        let mut clauses = clauses.into_iter().map(Predicate::simplify);
        match clauses.next() {
            Some(first) => Self::join(junction, first, clauses),
            None => match junction {
                Junction::And => Predicate::And(Vec::new()),
                Junction::Or => Predicate::Or(Vec::new()),
            },
        }
    }

    /// Names of every column the predicate reads, sorted.
    pub fn columns(&self) -> BTreeSet<Arc<str>> {
        let mut out = BTreeSet::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns(&self, out: &mut BTreeSet<Arc<str>>) {
        match self {
            Predicate::Leaf(PredicateLeaf::Compare { left, right, .. }) => {
                for operand in [left, right] {
                    if let Operand::Column(column) = operand {
                        out.insert(Arc::clone(&column.name));
                    }
                }
            }
            Predicate::Leaf(
                PredicateLeaf::InList { column, .. } | PredicateLeaf::IsNull { column, .. },
            ) => {
                out.insert(Arc::clone(&column.name));
            }
            Predicate::Not(inner) => inner.collect_columns(out),
            Predicate::And(clauses) | Predicate::Or(clauses) => {
                for clause in clauses {
                    clause.collect_columns(out);
                }
            }
        }
    }

    /// Folds the tree bottom-up with `visitor`.
    pub fn accept<V>(&self, visitor: &mut V) -> Result<V::Value, V::Error>
    where
        V: PredicateVisitor + ?Sized,
    {
        visitor.visit(self)
    }
}

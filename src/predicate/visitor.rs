use super::{Predicate, PredicateLeaf};

/// Folds a predicate tree bottom-up into one value.
///
/// Evaluators supply the leaf case and the three combinators; [`visit`]
/// owns the traversal. Every child is visited even when an earlier one
/// already decides the result.
///
/// [`visit`]: PredicateVisitor::visit
pub trait PredicateVisitor {
    /// Error raised by a leaf or a combinator.
    type Error;
    /// What each node folds into.
    type Value;

    /// Evaluates one row test.
    fn visit_leaf(&mut self, leaf: &PredicateLeaf) -> Result<Self::Value, Self::Error>;

    /// Negates a folded child.
    fn combine_not(&mut self, child: Self::Value) -> Result<Self::Value, Self::Error>;

    /// Intersects folded children.
    fn combine_and(&mut self, children: Vec<Self::Value>) -> Result<Self::Value, Self::Error>;

    /// Unites folded children.
    fn combine_or(&mut self, children: Vec<Self::Value>) -> Result<Self::Value, Self::Error>;

    /// Folds `predicate`.
    fn visit(&mut self, predicate: &Predicate) -> Result<Self::Value, Self::Error> {
        match predicate {
            Predicate::Leaf(leaf) => self.visit_leaf(leaf),
            Predicate::Not(inner) => {
                let child = self.visit(inner)?;
                self.combine_not(child)
            }
            Predicate::And(clauses) => {
                let children = self.visit_all(clauses)?;
                self.combine_and(children)
            }
            Predicate::Or(clauses) => {
                let children = self.visit_all(clauses)?;
                self.combine_or(children)
            }
        }
    }

    #[doc(hidden)]
    fn visit_all(&mut self, clauses: &[Predicate]) -> Result<Vec<Self::Value>, Self::Error> {
        clauses.iter().map(|clause| self.visit(clause)).collect()
    }
}

/// How query-expressible selectors are evaluated against a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryPath {
    /// Render the predicate to an expression string and hand it to the
    /// dataset's query evaluator (Arrow kernels).
    #[default]
    Expression,
    /// Walk the predicate tree row by row without rendering it.
    Direct,
}

/// Which label wins when a row is matched by more than one selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelPriority {
    /// The earliest selector in the list keeps the row.
    #[default]
    FirstMatch,
    /// Later selectors overwrite earlier ones.
    LastMatch,
}

/// Options for a single evaluation call.
#[derive(Debug, Clone)]
pub struct EvalOptions {
    pub(crate) memoize: bool,
    pub(crate) query_path: QueryPath,
    pub(crate) label_priority: LabelPriority,
}

impl Default for EvalOptions {
    fn default() -> Self {
        EvalOptions {
            memoize: true,
            query_path: QueryPath::Expression,
            label_priority: LabelPriority::FirstMatch,
        }
    }
}

impl EvalOptions {
    /// Cache the row set of every shared selector node for the rest of the call.
    pub fn memoize(self, memoize: bool) -> Self {
        EvalOptions { memoize, ..self }
    }

    /// Choose between the expression and direct evaluation paths.
    pub fn query_path(self, query_path: QueryPath) -> Self {
        EvalOptions { query_path, ..self }
    }

    /// Choose the labeling tie-break.
    pub fn label_priority(self, label_priority: LabelPriority) -> Self {
        EvalOptions {
            label_priority,
            ..self
        }
    }

    /// Whether row sets are cached within one call.
    pub fn memoizes(&self) -> bool {
        self.memoize
    }

    /// Selected evaluation path for query selectors.
    pub fn path(&self) -> QueryPath {
        self.query_path
    }

    /// Selected labeling tie-break.
    pub fn priority(&self) -> LabelPriority {
        self.label_priority
    }
}

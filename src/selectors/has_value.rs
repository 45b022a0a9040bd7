use std::sync::Arc;

use crate::{
    error::SelectError,
    predicate::Predicate,
    selector::{selector_ops, ColumnBinding, Localizable, QueryExpressible},
};

/// Rows where the column holds a value: neither null nor NaN.
#[derive(Debug, Clone, Default)]
pub struct HasValue {
    binding: ColumnBinding,
}

impl HasValue {
    /// Rows with a value in `column`.
    pub fn new(column: impl Into<Arc<str>>) -> Self {
        Self {
            binding: ColumnBinding::bound(column),
        }
    }
}

impl Localizable for HasValue {
    const KIND: &'static str = "has value";

    fn binding(&self) -> &ColumnBinding {
        &self.binding
    }

    fn binding_mut(&mut self) -> &mut ColumnBinding {
        &mut self.binding
    }
}

impl QueryExpressible for HasValue {
    fn predicate(&self) -> Result<Predicate, SelectError> {
        Ok(Predicate::is_null(self.column()?, true))
    }
}

selector_ops!(HasValue => query);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_as_is_not_null() {
        assert_eq!(HasValue::new("hr").to_expression().unwrap(), "`hr` is not null");
        assert!(matches!(
            HasValue::default().to_expression(),
            Err(SelectError::UnboundColumn { .. })
        ));
    }
}

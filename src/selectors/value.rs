use std::{fmt, str::FromStr};

use crate::{
    error::SelectError,
    predicate::{ComparisonOp, Predicate, ScalarValue},
    selector::{selector_ops, ColumnBinding, Localizable, QueryExpressible, Selector},
};

/// Rows whose value equals one of a set of literals, or none of them.
#[derive(Debug, Clone)]
pub struct ValueMatch {
    binding: ColumnBinding,
    values: Vec<ScalarValue>,
    negated: bool,
}

impl ValueMatch {
    /// Rows equal to `value`.
    pub fn equals(value: impl Into<ScalarValue>) -> Self {
        Self::any_of([value.into()])
    }

    /// Rows equal to any of `values`.
    pub fn any_of<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ScalarValue>,
    {
        Self {
            binding: ColumnBinding::unbound(),
            values: values.into_iter().map(Into::into).collect(),
            negated: false,
        }
    }

    /// Rows with a value that is none of `values`. Missing values never match.
    pub fn none_of<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ScalarValue>,
    {
        Self {
            negated: true,
            ..Self::any_of(values)
        }
    }

    /// The literals being matched.
    pub fn values(&self) -> &[ScalarValue] {
        &self.values
    }
}

impl Localizable for ValueMatch {
    const KIND: &'static str = "value match";

    fn binding(&self) -> &ColumnBinding {
        &self.binding
    }

    fn binding_mut(&mut self) -> &mut ColumnBinding {
        &mut self.binding
    }
}

impl QueryExpressible for ValueMatch {
    fn predicate(&self) -> Result<Predicate, SelectError> {
        let column = self.column()?;
        match self.values.as_slice() {
            [value] if !self.negated => {
                Ok(Predicate::compare(column, ComparisonOp::Equal, value.clone()))
            }
            values => Ok(Predicate::in_list(column, values.to_vec(), self.negated)),
        }
    }
}

selector_ops!(ValueMatch => query);

/// Subjects of one exact age.
///
/// ```
/// use dataselect::{Age, Localizable, QueryExpressible};
///
/// assert_eq!(Age::exactly(42).to_expression().unwrap(), "`age` == 42");
/// assert_eq!(Age::exactly(7).on("years").to_expression().unwrap(), "`years` == 7");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Age;

impl Age {
    /// Column the age selector reads unless rebound.
    pub const DEFAULT_COLUMN: &'static str = "age";

    /// Rows whose age equals `age`, on [`Age::DEFAULT_COLUMN`].
    pub fn exactly(age: impl Into<ScalarValue>) -> ValueMatch {
        ValueMatch::equals(age).on(Self::DEFAULT_COLUMN)
    }
}

/// Nominal sex codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Sex {
    /// Code 0.
    Female,
    /// Code 1.
    #[default]
    Male,
    /// Code 2, non-binary.
    Other,
    /// Code 3, known to be missing.
    Unknown,
}

impl Sex {
    /// Column the sex selector reads unless rebound.
    pub const DEFAULT_COLUMN: &'static str = "sex";

    /// Numeric code stored in the data.
    pub fn code(self) -> i64 {
        match self {
            Sex::Female => 0,
            Sex::Male => 1,
            Sex::Other => 2,
            Sex::Unknown => 3,
        }
    }

    /// Sex for a numeric code.
    pub fn from_code(code: i64) -> Result<Self, SelectError> {
        match code {
            0 => Ok(Sex::Female),
            1 => Ok(Sex::Male),
            2 => Ok(Sex::Other),
            3 => Ok(Sex::Unknown),
            other => Err(SelectError::InvalidArgument(format!("unknown sex code {other}"))),
        }
    }

    /// Selector for this sex on [`Sex::DEFAULT_COLUMN`]; rebind with
    /// [`Localizable::on`].
    pub fn selector(self) -> ValueMatch {
        ValueMatch::equals(self.code()).on(Self::DEFAULT_COLUMN)
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Sex::Female => "female",
            Sex::Male => "male",
            Sex::Other => "other",
            Sex::Unknown => "unknown",
        })
    }
}

impl FromStr for Sex {
    type Err = SelectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(code) = trimmed.parse::<i64>() {
            return Sex::from_code(code);
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "female" => Ok(Sex::Female),
            "male" => Ok(Sex::Male),
            "other" => Ok(Sex::Other),
            "unknown" => Ok(Sex::Unknown),
            _ => Err(SelectError::InvalidArgument(format!("unknown sex '{s}'"))),
        }
    }
}

impl From<Sex> for Selector {
    fn from(sex: Sex) -> Self {
        Selector::from(sex.selector())
    }
}

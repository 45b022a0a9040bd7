//! Rendering predicates to the textual expression grammar.
//!
//! Columns are always backtick-quoted, strings double-quoted, and every child of
//! `&`, `|` and `~` is parenthesised, so rendered fragments can be pasted into
//! a larger expression without changing meaning.

use std::fmt::{self, Write};

use super::{ColumnRef, Operand, Predicate, PredicateLeaf, ScalarValue};

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char('`')?;
        for ch in self.name.chars() {
            if ch == '`' {
                f.write_str("``")?;
            } else {
                f.write_char(ch)?;
            }
        }
        f.write_char('`')
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Null => f.write_str("null"),
            ScalarValue::Boolean(value) => write!(f, "{value}"),
            ScalarValue::Int64(value) => write!(f, "{value}"),
            ScalarValue::UInt64(value) => write!(f, "{value}"),
            ScalarValue::Float64(value) => {
                if value.is_nan() {
                    f.write_str("nan")
                } else if value.is_infinite() {
                    f.write_str(if *value > 0.0 { "inf" } else { "-inf" })
                } else {
                    // Debug keeps a fractional part or exponent; the literal reparses as a float.
                    write!(f, "{value:?}")
                }
            }
            ScalarValue::Utf8(value) => {
                f.write_char('"')?;
                for ch in value.chars() {
                    match ch {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        '\n' => f.write_str("\\n")?,
                        '\r' => f.write_str("\\r")?,
                        '\t' => f.write_str("\\t")?,
                        other => f.write_char(other)?,
                    }
                }
                f.write_char('"')
            }
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Column(column) => fmt::Display::fmt(column, f),
            Operand::Literal(value) => fmt::Display::fmt(value, f),
        }
    }
}

impl fmt::Display for PredicateLeaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredicateLeaf::Compare { left, op, right } => write!(f, "{left} {op} {right}"),
            PredicateLeaf::InList {
                column,
                values,
                negated,
            } => {
                write!(f, "{column} {}in [", if *negated { "not " } else { "" })?;
                for (idx, value) in values.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    fmt::Display::fmt(value, f)?;
                }
                f.write_char(']')
            }
            PredicateLeaf::IsNull { column, negated } => {
                write!(f, "{column} is {}null", if *negated { "not " } else { "" })
            }
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Leaf(leaf) => fmt::Display::fmt(leaf, f),
            Predicate::Not(inner) => write!(f, "~({inner})"),
            Predicate::And(clauses) => join(f, clauses, " & "),
            Predicate::Or(clauses) => join(f, clauses, " | "),
        }
    }
}

fn join(f: &mut fmt::Formatter<'_>, clauses: &[Predicate], sep: &str) -> fmt::Result {
    for (idx, clause) in clauses.iter().enumerate() {
        if idx > 0 {
            f.write_str(sep)?;
        }
        write!(f, "({clause})")?;
    }
    Ok(())
}

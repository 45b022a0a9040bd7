//! Parsing the textual expression grammar back into predicates.
//!
//! ```text
//! expr    := and (('|' | 'or') and)*
//! and     := unary (('&' | 'and') unary)*
//! unary   := ('~' | 'not') unary | '(' expr ')' | leaf
//! leaf    := operand cmp operand
//!          | column ['not'] 'in' '[' literal, ... ']'
//!          | column 'is' ['not'] 'null'
//! ```

use std::{iter::Peekable, str::CharIndices, str::FromStr};

use super::{ColumnRef, ComparisonOp, Operand, Predicate, ScalarValue};
use crate::error::SelectError;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    QuotedIdent(String),
    Str(String),
    Int(i64),
    UInt(u64),
    Float(f64),
    Cmp(ComparisonOp),
    Amp,
    Pipe,
    Tilde,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
}

impl Token {
    fn keyword(&self, word: &str) -> bool {
        matches!(self, Token::Ident(ident) if ident.eq_ignore_ascii_case(word))
    }
}

struct Tokenizer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Tokenizer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
        }
    }

    fn error(&self, position: usize, reason: &str) -> SelectError {
        SelectError::invalid_expression(self.input, format!("{reason} at offset {position}"))
    }

    fn tokenize(mut self) -> Result<Vec<Token>, SelectError> {
        let mut tokens = Vec::new();
        while let Some(&(position, ch)) = self.chars.peek() {
            match ch {
                c if c.is_whitespace() => {
                    self.chars.next();
                }
                '(' | ')' | '[' | ']' | ',' | '&' | '|' | '~' => {
                    self.chars.next();
                    tokens.push(match ch {
                        '(' => Token::LParen,
                        ')' => Token::RParen,
                        '[' => Token::LBracket,
                        ']' => Token::RBracket,
                        ',' => Token::Comma,
                        '&' => Token::Amp,
                        '|' => Token::Pipe,
                        _ => Token::Tilde,
                    });
                }
                '=' | '!' | '<' | '>' => tokens.push(self.comparison(position, ch)?),
                '`' => tokens.push(self.quoted_ident(position)?),
                '"' | '\'' => tokens.push(self.string(position, ch)?),
                '-' | '0'..='9' | '.' => tokens.push(self.number(position)?),
                c if c.is_alphabetic() || c == '_' => {
                    let mut ident = String::new();
                    while let Some(&(_, c)) = self.chars.peek() {
                        if c.is_alphanumeric() || c == '_' || c == '.' {
                            ident.push(c);
                            self.chars.next();
                        } else {
                            break;
                        }
                    }
                    tokens.push(Token::Ident(ident));
                }
                other => {
                    return Err(self.error(position, &format!("unexpected character '{other}'")))
                }
            }
        }
        Ok(tokens)
    }

    fn comparison(&mut self, position: usize, first: char) -> Result<Token, SelectError> {
        self.chars.next();
        let followed_by_eq = matches!(self.chars.peek(), Some(&(_, '=')));
        if followed_by_eq {
            self.chars.next();
        }
        let op = match (first, followed_by_eq) {
            ('=', true) => ComparisonOp::Equal,
            ('!', true) => ComparisonOp::NotEqual,
            ('<', true) => ComparisonOp::LessThanOrEqual,
            ('<', false) => ComparisonOp::LessThan,
            ('>', true) => ComparisonOp::GreaterThanOrEqual,
            ('>', false) => ComparisonOp::GreaterThan,
            _ => return Err(self.error(position, &format!("unexpected '{first}'"))),
        };
        Ok(Token::Cmp(op))
    }

    fn quoted_ident(&mut self, position: usize) -> Result<Token, SelectError> {
        self.chars.next();
        let mut name = String::new();
        loop {
            match self.chars.next() {
                Some((_, '`')) => {
                    if matches!(self.chars.peek(), Some(&(_, '`'))) {
                        self.chars.next();
                        name.push('`');
                    } else {
                        return Ok(Token::QuotedIdent(name));
                    }
                }
                Some((_, c)) => name.push(c),
                None => return Err(self.error(position, "unterminated column name")),
            }
        }
    }

    fn string(&mut self, position: usize, quote: char) -> Result<Token, SelectError> {
        self.chars.next();
        let mut value = String::new();
        loop {
            match self.chars.next() {
                Some((_, c)) if c == quote => return Ok(Token::Str(value)),
                Some((escape_at, '\\')) => match self.chars.next() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, 'r')) => value.push('\r'),
                    Some((_, 't')) => value.push('\t'),
                    Some((_, c @ ('\\' | '"' | '\''))) => value.push(c),
                    Some((_, other)) => {
                        return Err(self.error(escape_at, &format!("unknown escape '\\{other}'")))
                    }
                    None => return Err(self.error(escape_at, "dangling escape")),
                },
                Some((_, c)) => value.push(c),
                None => return Err(self.error(position, "unterminated string literal")),
            }
        }
    }

    fn number(&mut self, position: usize) -> Result<Token, SelectError> {
        let mut text = String::new();
        if let Some(&(_, '-')) = self.chars.peek() {
            text.push('-');
            self.chars.next();
            // `-inf` is the only non-digit that may follow a sign.
            if let Some(&(_, c)) = self.chars.peek() {
                if c.is_alphabetic() {
                    let mut word = String::new();
                    while let Some(&(_, c)) = self.chars.peek() {
                        if !c.is_alphanumeric() {
                            break;
                        }
                        word.push(c);
                        self.chars.next();
                    }
                    if word.eq_ignore_ascii_case("inf") {
                        return Ok(Token::Float(f64::NEG_INFINITY));
                    }
                    return Err(self.error(position, &format!("invalid number '-{word}'")));
                }
            }
        }
        let mut is_float = false;
        while let Some(&(_, c)) = self.chars.peek() {
            match c {
                '0'..='9' => text.push(c),
                '.' => {
                    is_float = true;
                    text.push(c);
                }
                'e' | 'E' => {
                    is_float = true;
                    text.push(c);
                    self.chars.next();
                    if let Some(&(_, sign @ ('+' | '-'))) = self.chars.peek() {
                        text.push(sign);
                    } else {
                        continue;
                    }
                }
                _ => break,
            }
            self.chars.next();
        }
        let invalid = || self.error(position, &format!("invalid number '{text}'"));
        if is_float {
            return text.parse::<f64>().map(Token::Float).map_err(|_| invalid());
        }
        if let Ok(value) = text.parse::<i64>() {
            return Ok(Token::Int(value));
        }
        text.parse::<u64>().map(Token::UInt).map_err(|_| invalid())
    }
}

/// Deepest nesting of `(`, `~` and `not` accepted by [`Predicate::parse`].
const MAX_DEPTH: usize = 256;

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    position: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, reason: impl Into<String>) -> SelectError {
        SelectError::invalid_expression(self.input, reason)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn peek_nth(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.position + n)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn expect(&mut self, expected: Token) -> Result<(), SelectError> {
        match self.next() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(self.error(format!("expected {expected:?}, found {token:?}"))),
            None => Err(self.error(format!("expected {expected:?}, found end of input"))),
        }
    }

    fn parse(mut self) -> Result<Predicate, SelectError> {
        if self.tokens.is_empty() {
            return Err(self.error("empty expression"));
        }
        let predicate = self.parse_or()?;
        match self.peek() {
            None => Ok(predicate),
            Some(token) => Err(self.error(format!("unexpected trailing token {token:?}"))),
        }
    }

    fn parse_or(&mut self) -> Result<Predicate, SelectError> {
        let mut predicate = self.parse_and()?;
        while matches!(self.peek(), Some(Token::Pipe))
            || self.peek().is_some_and(|t| t.keyword("or"))
        {
            self.next();
            predicate = predicate.or(self.parse_and()?);
        }
        Ok(predicate)
    }

    fn parse_and(&mut self) -> Result<Predicate, SelectError> {
        let mut predicate = self.parse_unary()?;
        while matches!(self.peek(), Some(Token::Amp))
            || self.peek().is_some_and(|t| t.keyword("and"))
        {
            self.next();
            predicate = predicate.and(self.parse_unary()?);
        }
        Ok(predicate)
    }

    fn parse_unary(&mut self) -> Result<Predicate, SelectError> {
        let nested = match self.peek() {
            Some(Token::Tilde | Token::LParen) => true,
            Some(token) => token.keyword("not"),
            None => return Err(self.error("unexpected end of input")),
        };
        if !nested {
            return self.parse_leaf();
        }
        if self.depth == MAX_DEPTH {
            return Err(self.error("expression nested too deeply"));
        }
        self.depth += 1;
        let parsed = self.parse_nested();
        self.depth -= 1;
        parsed
    }

    fn parse_nested(&mut self) -> Result<Predicate, SelectError> {
        if let Some(Token::LParen) = self.next() {
            let inner = self.parse_or()?;
            self.expect(Token::RParen)?;
            Ok(inner)
        } else {
            Ok(self.parse_unary()?.invert())
        }
    }

    fn parse_leaf(&mut self) -> Result<Predicate, SelectError> {
        let left = self.parse_operand()?;
        let is_membership = self.peek().is_some_and(|t| t.keyword("in"))
            || (self.peek().is_some_and(|t| t.keyword("not"))
                && self.peek_nth(1).is_some_and(|t| t.keyword("in")));
        if is_membership {
            let negated = self.peek().is_some_and(|t| t.keyword("not"));
            if negated {
                self.next();
            }
            self.next();
            let column = self.require_column(left, "in")?;
            return Ok(Predicate::in_list(column, self.parse_list()?, negated));
        }
        if self.peek().is_some_and(|t| t.keyword("is")) {
            self.next();
            let negated = self.peek().is_some_and(|t| t.keyword("not"));
            if negated {
                self.next();
            }
            match self.next() {
                Some(token) if token.keyword("null") => {}
                _ => return Err(self.error("expected 'null' after 'is'")),
            }
            let column = self.require_column(left, "is null")?;
            return Ok(Predicate::is_null(column, negated));
        }
        let op = match self.next() {
            Some(Token::Cmp(op)) => op,
            Some(token) => {
                return Err(self.error(format!("expected a comparison, found {token:?}")))
            }
            None => return Err(self.error("expected a comparison, found end of input")),
        };
        let right = self.parse_operand()?;
        if matches!((&left, &right), (Operand::Literal(_), Operand::Literal(_))) {
            return Err(self.error("a comparison needs at least one column"));
        }
        Ok(Predicate::compare(left, op, right))
    }

    fn require_column(&self, operand: Operand, op: &str) -> Result<ColumnRef, SelectError> {
        match operand {
            Operand::Column(column) => Ok(column),
            Operand::Literal(value) => Err(self.error(format!(
                "'{op}' needs a column on its left, found literal {value}"
            ))),
        }
    }

    fn parse_list(&mut self) -> Result<Vec<ScalarValue>, SelectError> {
        self.expect(Token::LBracket)?;
        let mut values = Vec::new();
        if matches!(self.peek(), Some(Token::RBracket)) {
            self.next();
            return Ok(values);
        }
        loop {
            match self.parse_operand()? {
                Operand::Literal(value) => values.push(value),
                Operand::Column(column) => {
                    return Err(self.error(format!("list entries must be literals, found {column}")))
                }
            }
            match self.next() {
                Some(Token::Comma) => continue,
                Some(Token::RBracket) => return Ok(values),
                _ => return Err(self.error("expected ',' or ']' in list")),
            }
        }
    }

    fn parse_operand(&mut self) -> Result<Operand, SelectError> {
        let operand = match self.next() {
            Some(Token::QuotedIdent(name)) => Operand::Column(ColumnRef::new(name)),
            Some(Token::Str(value)) => Operand::Literal(ScalarValue::Utf8(value)),
            Some(Token::Int(value)) => Operand::Literal(ScalarValue::Int64(value)),
            Some(Token::UInt(value)) => Operand::Literal(ScalarValue::UInt64(value)),
            Some(Token::Float(value)) => Operand::Literal(ScalarValue::Float64(value)),
            Some(Token::Ident(word)) => match word.to_ascii_lowercase().as_str() {
                "true" => Operand::Literal(ScalarValue::Boolean(true)),
                "false" => Operand::Literal(ScalarValue::Boolean(false)),
                "null" => Operand::Literal(ScalarValue::Null),
                "nan" => Operand::Literal(ScalarValue::Float64(f64::NAN)),
                "inf" => Operand::Literal(ScalarValue::Float64(f64::INFINITY)),
                "and" | "or" | "not" | "in" | "is" => {
                    return Err(self.error(format!("unexpected keyword '{word}'")))
                }
                _ => Operand::Column(ColumnRef::new(word)),
            },
            Some(token) => return Err(self.error(format!("expected an operand, found {token:?}"))),
            None => return Err(self.error("expected an operand, found end of input")),
        };
        Ok(operand)
    }
}

impl Predicate {
    /// Parses an expression string in the selector grammar.
    ///
    /// Bare identifiers are column names unless they are keywords (`true`, `false`,
    /// `null`, `nan`, `inf`, `and`, `or`, `not`, `in`, `is`); backticks quote any
    /// other name.
    pub fn parse(expression: &str) -> Result<Predicate, SelectError> {
        let tokens = Tokenizer::new(expression).tokenize()?;
        Parser {
            input: expression,
            tokens,
            position: 0,
            depth: 0,
        }
        .parse()
    }
}

impl FromStr for Predicate {
    type Err = SelectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Predicate::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::PredicateBuilder;

    fn col(name: &str) -> ColumnRef {
        ColumnRef::new(name)
    }

    fn reparse(predicate: &Predicate) -> Predicate {
        Predicate::parse(&predicate.to_string()).expect("rendered predicate parses")
    }

    #[test]
    fn rendered_predicates_parse_back_unchanged() {
        let length = col("sepal.length");
        let predicate = PredicateBuilder::all()
            .lower_bound(&length, 5, true)
            .upper_bound(&length, 6.5, false)
            .group(
                PredicateBuilder::any()
                    .one_of(&col("kind"), ["a\"b", "c"], false)
                    .missing(&col("we`ird")),
            )
            .negated(PredicateBuilder::all().test(&col("flag"), ComparisonOp::Equal, false))
            .finish()
            .expect("clauses");
        assert_eq!(reparse(&predicate), predicate);

        let extreme = Predicate::compare(
            col("n"),
            ComparisonOp::NotEqual,
            ScalarValue::UInt64(u64::MAX),
        )
        .or(Predicate::compare(col("f"), ComparisonOp::LessThan, ScalarValue::Float64(1e-9)))
        .or(Predicate::compare(
            col("g"),
            ComparisonOp::GreaterThan,
            ScalarValue::Float64(f64::NEG_INFINITY),
        ))
        .or(Predicate::in_list(col("e"), Vec::new(), true));
        assert_eq!(reparse(&extreme), extreme);
    }

    #[test]
    fn accepts_bare_identifiers_keywords_and_precedence() {
        let parsed = Predicate::parse("age >= 50 and not hr < 60 or name == 'x'").expect("parse");
        let Predicate::Or(clauses) = &parsed else {
            panic!("`or` binds loosest: {parsed:?}");
        };
        assert_eq!(clauses.len(), 2);
        assert!(matches!(clauses[0], Predicate::And(_)));
    }

    #[test]
    fn literal_on_the_left_is_kept_as_written() {
        let parsed = Predicate::parse("50 <= `age`").expect("parse");
        assert_eq!(
            parsed,
            Predicate::compare(
                ScalarValue::Int64(50),
                ComparisonOp::LessThanOrEqual,
                col("age")
            )
        );
    }

    #[test]
    fn negative_and_special_numbers() {
        let parsed =
            Predicate::parse("`x` > -3 & `y` != nan & `z` < -inf & `w` == 1.5e3").expect("parse");
        let Predicate::And(clauses) = &parsed else {
            panic!("expected conjunction");
        };
        assert_eq!(clauses[0].to_string(), "`x` > -3");
        assert_eq!(clauses[3].to_string(), "`w` == 1500.0");
    }

    #[test]
    fn malformed_expressions_are_rejected() {
        for text in [
            "",
            "`age` >",
            "`age` = 3",
            "(`age` > 3",
            "`age` > 3)",
            "1 < 2",
            "`a` in [`b`]",
            "3 in [1]",
            "`a` is 3",
            "\"open",
            "`a` == 'bad \\q'",
            "`a` > 3 $",
            "`a` > --1",
        ] {
            let err = Predicate::parse(text).expect_err(text);
            assert!(
                matches!(err, SelectError::InvalidExpression { .. }),
                "{text}: {err}"
            );
        }
    }

    #[test]
    fn nesting_is_capped() {
        let nested = |depth: usize| format!("{}`x` > 1{}", "(".repeat(depth), ")".repeat(depth));
        assert_eq!(
            Predicate::parse(&nested(MAX_DEPTH)).expect("at the cap"),
            Predicate::compare(col("x"), ComparisonOp::GreaterThan, ScalarValue::Int64(1))
        );

        for text in [
            nested(1000),
            format!("{}`x` > 1", "~".repeat(MAX_DEPTH + 1)),
            format!("{}`x` > 1", "not ".repeat(5000)),
        ] {
            let err = Predicate::parse(&text).expect_err("too deep");
            assert!(
                matches!(
                    &err,
                    SelectError::InvalidExpression { reason, .. }
                        if reason == "expression nested too deeply"
                ),
                "{err}"
            );
        }

        let flat = vec!["`x` > 1"; 2000].join(" | ");
        assert!(Predicate::parse(&flat).is_ok());
    }
}

//! Expression tree for the OQL query DSL.
//!
//! Expressions are immutable wrappers around rendered query text. Combinators
//! never mutate; they return a new `Expression` concatenating both operands
//! around the operator. No parenthesization is inserted automatically, so
//! nesting correctness is the caller's responsibility, exactly as if the
//! query were assembled by string concatenation.

use std::fmt;

use crate::error::{Error, Result};

/// An immutable fragment of OQL text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    value: String,
}

/// Shorthand for [`Expression::ident`].
pub fn ident(name: impl Into<String>) -> Expression {
    Expression::ident(name)
}

/// Shorthand for [`Expression::string_literal`].
pub fn string_literal(text: impl Into<String>) -> Expression {
    Expression::string_literal(text)
}

impl Expression {
    /// An identifier or raw fragment, rendered verbatim.
    pub fn ident(name: impl Into<String>) -> Self {
        Self { value: name.into() }
    }

    /// A single-quoted string literal.
    ///
    /// Embedded single quotes and backslashes are NOT escaped; callers that
    /// interpolate untrusted text must pre-escape it themselves. This matches
    /// the concatenation semantics of the rest of the DSL.
    pub fn string_literal(text: impl Into<String>) -> Self {
        Self {
            value: format!("'{}'", text.into()),
        }
    }

    pub fn int(value: i64) -> Self {
        Self {
            value: value.to_string(),
        }
    }

    pub fn float(value: f64) -> Self {
        Self {
            value: value.to_string(),
        }
    }

    pub fn boolean(value: bool) -> Self {
        Self {
            value: if value { "TRUE".into() } else { "FALSE".into() },
        }
    }

    /// A JSON value rendered with JSON literal syntax.
    pub fn json(value: &serde_json::Value) -> Self {
        Self {
            value: value.to_string(),
        }
    }

    pub fn null() -> Self {
        Self {
            value: "NULL".into(),
        }
    }

    pub fn missing() -> Self {
        Self {
            value: "MISSING".into(),
        }
    }

    /// The `*` wildcard.
    pub fn wildcard() -> Self {
        Self { value: "*".into() }
    }

    /// Generic infix combinator: `<self> <op> <other>`.
    ///
    /// Fails fast with an invalid-argument error when the operator is empty,
    /// rather than silently rendering a malformed statement.
    pub fn infix(self, op: &str, other: Expression) -> Result<Expression> {
        if op.trim().is_empty() {
            return Err(Error::InvalidArgument(
                "infix operator must not be empty".into(),
            ));
        }
        Ok(self.binary(op, other))
    }

    pub fn and(self, other: Expression) -> Expression {
        self.binary("AND", other)
    }

    pub fn or(self, other: Expression) -> Expression {
        self.binary("OR", other)
    }

    pub fn eq(self, other: Expression) -> Expression {
        self.binary("=", other)
    }

    pub fn ne(self, other: Expression) -> Expression {
        self.binary("!=", other)
    }

    pub fn gt(self, other: Expression) -> Expression {
        self.binary(">", other)
    }

    pub fn gte(self, other: Expression) -> Expression {
        self.binary(">=", other)
    }

    pub fn lt(self, other: Expression) -> Expression {
        self.binary("<", other)
    }

    pub fn lte(self, other: Expression) -> Expression {
        self.binary("<=", other)
    }

    /// Unary prefix negation: `NOT <self>`.
    pub fn not(self) -> Expression {
        Self {
            value: format!("NOT {}", self.value),
        }
    }

    fn binary(self, op: &str, other: Expression) -> Expression {
        Self {
            value: format!("{} {} {}", self.value, op, other.value),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl From<&str> for Expression {
    fn from(name: &str) -> Self {
        Expression::ident(name)
    }
}

impl From<String> for Expression {
    fn from(name: String) -> Self {
        Expression::ident(name)
    }
}

impl From<i64> for Expression {
    fn from(value: i64) -> Self {
        Expression::int(value)
    }
}

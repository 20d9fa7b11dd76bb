//! INSERT statement builder.

use std::fmt;

use super::element::{render_elements, Element};
use super::expression::Expression;
use super::select::renderable;

/// Begin an `INSERT INTO` statement.
pub fn insert_into(target: impl Into<Expression>) -> InsertSourcePath {
    InsertSourcePath {
        elements: vec![Element::InsertInto(target.into())],
    }
}

/// Stage at which the insert source is chosen: explicit key/value pairs or
/// a select statement.
#[derive(Debug, Clone)]
pub struct InsertSourcePath {
    elements: Vec<Element>,
}

impl InsertSourcePath {
    /// Add a `(key, value)` pair. Further pairs extend the same VALUES
    /// clause.
    pub fn values(
        mut self,
        key: impl Into<Expression>,
        value: impl Into<Expression>,
    ) -> InsertValuesPath {
        self.elements
            .push(Element::Values(vec![(key.into(), value.into())]));
        InsertValuesPath {
            elements: self.elements,
        }
    }

    /// Use a select statement as the insert source: `(KEY k) SELECT ...`.
    pub fn select(mut self, keys: impl Into<Expression>, select: impl fmt::Display) -> ReturningPath {
        self.elements.push(Element::SelectSource {
            keys: keys.into(),
            select: select.to_string(),
        });
        ReturningPath {
            elements: self.elements,
        }
    }
}

/// Stage after at least one VALUES pair.
#[derive(Debug, Clone)]
pub struct InsertValuesPath {
    elements: Vec<Element>,
}

impl InsertValuesPath {
    pub fn values(
        mut self,
        key: impl Into<Expression>,
        value: impl Into<Expression>,
    ) -> InsertValuesPath {
        match self.elements.last_mut() {
            Some(Element::Values(pairs)) => pairs.push((key.into(), value.into())),
            _ => self
                .elements
                .push(Element::Values(vec![(key.into(), value.into())])),
        }
        self
    }

    pub fn returning(self, expr: impl Into<Expression>) -> MutateStatement {
        ReturningPath {
            elements: self.elements,
        }
        .returning(expr)
    }
}

/// Stage at which `RETURNING` may be added.
#[derive(Debug, Clone)]
pub struct ReturningPath {
    elements: Vec<Element>,
}

impl ReturningPath {
    pub fn returning(mut self, expr: impl Into<Expression>) -> MutateStatement {
        self.elements.push(Element::Returning(expr.into()));
        MutateStatement {
            elements: self.elements,
        }
    }
}

/// A fully terminated mutation statement.
#[derive(Debug, Clone)]
pub struct MutateStatement {
    pub(crate) elements: Vec<Element>,
}

renderable!(InsertSourcePath, InsertValuesPath, ReturningPath, MutateStatement);

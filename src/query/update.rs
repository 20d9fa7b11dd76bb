//! UPDATE statement builder.

use std::fmt;

use super::element::{render_elements, Element};
use super::expression::Expression;
use super::insert::MutateStatement;
use super::select::renderable;

/// Begin an `UPDATE` statement.
pub fn update(target: impl Into<Expression>) -> SetPath {
    SetPath {
        elements: vec![Element::Update(target.into())],
    }
}

/// Stage at which `SET` assignments are added.
#[derive(Debug, Clone)]
pub struct SetPath {
    elements: Vec<Element>,
}

impl SetPath {
    /// Add an assignment. Further calls extend the same SET clause.
    pub fn set(mut self, path: impl Into<Expression>, value: impl Into<Expression>) -> SetPath {
        match self.elements.last_mut() {
            Some(Element::Set(pairs)) => pairs.push((path.into(), value.into())),
            _ => self
                .elements
                .push(Element::Set(vec![(path.into(), value.into())])),
        }
        self
    }

    pub fn unset(self, path: impl Into<Expression>) -> UnsetPath {
        UnsetPath {
            elements: self.elements,
        }
        .unset(path)
    }

    pub fn where_(mut self, condition: impl Into<Expression>) -> MutateReturningPath {
        self.elements.push(Element::Where(condition.into()));
        MutateReturningPath {
            elements: self.elements,
        }
    }

    pub fn returning(mut self, expr: impl Into<Expression>) -> MutateStatement {
        self.elements.push(Element::Returning(expr.into()));
        MutateStatement {
            elements: self.elements,
        }
    }
}

/// Stage at which `UNSET` paths are added.
#[derive(Debug, Clone)]
pub struct UnsetPath {
    elements: Vec<Element>,
}

impl UnsetPath {
    /// Remove a path. Further calls extend the same UNSET clause.
    pub fn unset(mut self, path: impl Into<Expression>) -> UnsetPath {
        match self.elements.last_mut() {
            Some(Element::Unset(paths)) => paths.push(path.into()),
            _ => self.elements.push(Element::Unset(vec![path.into()])),
        }
        self
    }

    pub fn where_(mut self, condition: impl Into<Expression>) -> MutateReturningPath {
        self.elements.push(Element::Where(condition.into()));
        MutateReturningPath {
            elements: self.elements,
        }
    }

    pub fn returning(mut self, expr: impl Into<Expression>) -> MutateStatement {
        self.elements.push(Element::Returning(expr.into()));
        MutateStatement {
            elements: self.elements,
        }
    }
}

/// Stage after `WHERE` in a mutation: only `RETURNING` remains.
#[derive(Debug, Clone)]
pub struct MutateReturningPath {
    elements: Vec<Element>,
}

impl MutateReturningPath {
    pub fn returning(mut self, expr: impl Into<Expression>) -> MutateStatement {
        self.elements.push(Element::Returning(expr.into()));
        MutateStatement {
            elements: self.elements,
        }
    }
}

renderable!(SetPath, UnsetPath, MutateReturningPath);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::expression::{ident, string_literal};

    #[test]
    fn test_update_set_where() {
        let q = update("beers")
            .set(ident("abv"), ident("6.5"))
            .where_(ident("name").eq(string_literal("amber")));
        assert_eq!(q.render(), "UPDATE beers SET abv = 6.5 WHERE name = 'amber'");
    }

    #[test]
    fn test_multiple_sets_share_one_clause() {
        let q = update("beers")
            .set(ident("abv"), ident("6.5"))
            .set(ident("ibu"), ident("40"));
        assert_eq!(q.render(), "UPDATE beers SET abv = 6.5, ibu = 40");
    }

    #[test]
    fn test_set_then_unset() {
        let q = update("beers")
            .set(ident("abv"), ident("6.5"))
            .unset(ident("draft"))
            .unset(ident("cask"));
        assert_eq!(q.render(), "UPDATE beers SET abv = 6.5 UNSET draft, cask");
    }

    #[test]
    fn test_update_with_returning() {
        let q = update("beers")
            .set(ident("abv"), ident("6.5"))
            .where_(ident("type").eq(string_literal("ale")))
            .returning(ident("name"));
        assert_eq!(
            q.render(),
            "UPDATE beers SET abv = 6.5 WHERE type = 'ale' RETURNING name"
        );
    }
}

//! SELECT statement builder.
//!
//! One struct per grammar state; every method consumes the current stage and
//! returns the stage whose method set is exactly the set of clauses still
//! legal at that point, so an out-of-order chain fails to compile. Each stage
//! holds its own element list, so a statement rendered at any stage is a
//! snapshot that later calls can never alter.

use std::fmt;

use super::element::{render_elements, Element, Sort};
use super::expression::Expression;

/// Begin a `SELECT` statement.
pub fn select<I>(exprs: I) -> FromPath
where
    I: IntoIterator,
    I::Item: Into<Expression>,
{
    FromPath {
        elements: vec![Element::Select {
            distinct: false,
            exprs: exprs.into_iter().map(Into::into).collect(),
        }],
    }
}

/// Begin a `SELECT DISTINCT` statement.
pub fn select_distinct<I>(exprs: I) -> FromPath
where
    I: IntoIterator,
    I::Item: Into<Expression>,
{
    FromPath {
        elements: vec![Element::Select {
            distinct: true,
            exprs: exprs.into_iter().map(Into::into).collect(),
        }],
    }
}

macro_rules! renderable {
    ($($stage:ty),+ $(,)?) => {$(
        impl $stage {
            /// Render the statement accumulated so far. Pure and idempotent.
            pub fn render(&self) -> String {
                render_elements(&self.elements)
            }
        }

        impl fmt::Display for $stage {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.render())
            }
        }
    )+};
}

pub(crate) use renderable;

/// Stage at which `FROM` may be added.
#[derive(Debug, Clone)]
pub struct FromPath {
    elements: Vec<Element>,
}

impl FromPath {
    pub fn from(mut self, source: impl Into<Expression>) -> KeysPath {
        self.elements.push(Element::From(source.into()));
        KeysPath {
            elements: self.elements,
        }
    }
}

/// Stage at which `USE KEYS` may still be added.
#[derive(Debug, Clone)]
pub struct KeysPath {
    elements: Vec<Element>,
}

impl KeysPath {
    /// Restrict the source to the given keys. The hint may appear at most
    /// once, so the returned stage no longer offers it.
    pub fn use_keys(mut self, keys: impl Into<Expression>) -> WherePath {
        self.elements.push(Element::UseKeys(keys.into()));
        WherePath {
            elements: self.elements,
        }
    }

    pub fn where_(self, condition: impl Into<Expression>) -> GroupByPath {
        WherePath {
            elements: self.elements,
        }
        .where_(condition)
    }

    pub fn group_by<I>(self, exprs: I) -> HavingPath
    where
        I: IntoIterator,
        I::Item: Into<Expression>,
    {
        GroupByPath {
            elements: self.elements,
        }
        .group_by(exprs)
    }

    pub fn order_by(self, sorts: Vec<Sort>) -> LimitPath {
        OrderByPath {
            elements: self.elements,
        }
        .order_by(sorts)
    }

    pub fn limit(self, limit: u64) -> OffsetPath {
        LimitPath {
            elements: self.elements,
        }
        .limit(limit)
    }

    pub fn offset(self, offset: u64) -> QueryStatement {
        OffsetPath {
            elements: self.elements,
        }
        .offset(offset)
    }
}

/// Stage at which `WHERE` may be added.
#[derive(Debug, Clone)]
pub struct WherePath {
    elements: Vec<Element>,
}

impl WherePath {
    pub fn where_(mut self, condition: impl Into<Expression>) -> GroupByPath {
        self.elements.push(Element::Where(condition.into()));
        GroupByPath {
            elements: self.elements,
        }
    }

    pub fn group_by<I>(self, exprs: I) -> HavingPath
    where
        I: IntoIterator,
        I::Item: Into<Expression>,
    {
        GroupByPath {
            elements: self.elements,
        }
        .group_by(exprs)
    }

    pub fn order_by(self, sorts: Vec<Sort>) -> LimitPath {
        OrderByPath {
            elements: self.elements,
        }
        .order_by(sorts)
    }

    pub fn limit(self, limit: u64) -> OffsetPath {
        LimitPath {
            elements: self.elements,
        }
        .limit(limit)
    }

    pub fn offset(self, offset: u64) -> QueryStatement {
        OffsetPath {
            elements: self.elements,
        }
        .offset(offset)
    }
}

/// Stage after `WHERE`: `GROUP BY`, `ORDER BY`, `LIMIT`, `OFFSET`.
#[derive(Debug, Clone)]
pub struct GroupByPath {
    elements: Vec<Element>,
}

impl GroupByPath {
    pub fn group_by<I>(mut self, exprs: I) -> HavingPath
    where
        I: IntoIterator,
        I::Item: Into<Expression>,
    {
        self.elements.push(Element::GroupBy(
            exprs.into_iter().map(Into::into).collect(),
        ));
        HavingPath {
            elements: self.elements,
        }
    }

    pub fn order_by(self, sorts: Vec<Sort>) -> LimitPath {
        OrderByPath {
            elements: self.elements,
        }
        .order_by(sorts)
    }

    pub fn limit(self, limit: u64) -> OffsetPath {
        LimitPath {
            elements: self.elements,
        }
        .limit(limit)
    }

    pub fn offset(self, offset: u64) -> QueryStatement {
        OffsetPath {
            elements: self.elements,
        }
        .offset(offset)
    }
}

/// Stage after `GROUP BY`: `HAVING`, `ORDER BY`, `LIMIT`.
#[derive(Debug, Clone)]
pub struct HavingPath {
    elements: Vec<Element>,
}

impl HavingPath {
    pub fn having(mut self, condition: impl Into<Expression>) -> OrderByPath {
        self.elements.push(Element::Having(condition.into()));
        OrderByPath {
            elements: self.elements,
        }
    }

    pub fn order_by(self, sorts: Vec<Sort>) -> LimitPath {
        OrderByPath {
            elements: self.elements,
        }
        .order_by(sorts)
    }

    pub fn limit(self, limit: u64) -> OffsetPath {
        LimitPath {
            elements: self.elements,
        }
        .limit(limit)
    }
}

/// Stage at which `ORDER BY` may be added.
#[derive(Debug, Clone)]
pub struct OrderByPath {
    elements: Vec<Element>,
}

impl OrderByPath {
    pub fn order_by(mut self, sorts: Vec<Sort>) -> LimitPath {
        self.elements.push(Element::OrderBy(sorts));
        LimitPath {
            elements: self.elements,
        }
    }

    pub fn limit(self, limit: u64) -> OffsetPath {
        LimitPath {
            elements: self.elements,
        }
        .limit(limit)
    }
}

/// Stage at which `LIMIT` may be added.
#[derive(Debug, Clone)]
pub struct LimitPath {
    elements: Vec<Element>,
}

impl LimitPath {
    pub fn limit(mut self, limit: u64) -> OffsetPath {
        self.elements.push(Element::Limit(limit));
        OffsetPath {
            elements: self.elements,
        }
    }

    pub fn offset(self, offset: u64) -> QueryStatement {
        OffsetPath {
            elements: self.elements,
        }
        .offset(offset)
    }
}

/// Stage at which `OFFSET` may be added.
#[derive(Debug, Clone)]
pub struct OffsetPath {
    elements: Vec<Element>,
}

impl OffsetPath {
    pub fn offset(mut self, offset: u64) -> QueryStatement {
        self.elements.push(Element::Offset(offset));
        QueryStatement {
            elements: self.elements,
        }
    }
}

/// A fully terminated statement; only rendering remains.
#[derive(Debug, Clone)]
pub struct QueryStatement {
    pub(crate) elements: Vec<Element>,
}

renderable!(
    FromPath,
    KeysPath,
    WherePath,
    GroupByPath,
    HavingPath,
    OrderByPath,
    LimitPath,
    OffsetPath,
    QueryStatement,
);

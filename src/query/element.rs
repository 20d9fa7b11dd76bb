//! Clause elements: the renderable fragments a statement is built from.

use std::fmt;

use super::expression::Expression;

/// Sort direction for ORDER BY clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    Desc,
}

impl fmt::Display for SortDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDir::Asc => write!(f, "ASC"),
            SortDir::Desc => write!(f, "DESC"),
        }
    }
}

/// A single ORDER BY term.
#[derive(Debug, Clone)]
pub struct Sort {
    expr: Expression,
    dir: Option<SortDir>,
}

impl Sort {
    /// Sort with the server default direction.
    pub fn def(expr: impl Into<Expression>) -> Self {
        Self {
            expr: expr.into(),
            dir: None,
        }
    }

    pub fn asc(expr: impl Into<Expression>) -> Self {
        Self {
            expr: expr.into(),
            dir: Some(SortDir::Asc),
        }
    }

    pub fn desc(expr: impl Into<Expression>) -> Self {
        Self {
            expr: expr.into(),
            dir: Some(SortDir::Desc),
        }
    }

    fn export(&self) -> String {
        match self.dir {
            Some(dir) => format!("{} {}", self.expr, dir),
            None => self.expr.to_string(),
        }
    }
}

/// One clause fragment of a statement.
///
/// `export` is pure: it can be called any number of times and always yields
/// the same text for the same element.
#[derive(Debug, Clone)]
pub enum Element {
    Select {
        distinct: bool,
        exprs: Vec<Expression>,
    },
    From(Expression),
    UseKeys(Expression),
    Where(Expression),
    GroupBy(Vec<Expression>),
    Having(Expression),
    OrderBy(Vec<Sort>),
    Limit(u64),
    Offset(u64),
    InsertInto(Expression),
    Values(Vec<(Expression, Expression)>),
    SelectSource {
        keys: Expression,
        select: String,
    },
    Update(Expression),
    Set(Vec<(Expression, Expression)>),
    Unset(Vec<Expression>),
    Returning(Expression),
}

fn join(exprs: &[Expression]) -> String {
    exprs
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl Element {
    pub fn export(&self) -> String {
        match self {
            Element::Select { distinct, exprs } => {
                if *distinct {
                    format!("SELECT DISTINCT {}", join(exprs))
                } else {
                    format!("SELECT {}", join(exprs))
                }
            }
            Element::From(e) => format!("FROM {}", e),
            Element::UseKeys(e) => format!("USE KEYS {}", e),
            Element::Where(e) => format!("WHERE {}", e),
            Element::GroupBy(exprs) => format!("GROUP BY {}", join(exprs)),
            Element::Having(e) => format!("HAVING {}", e),
            Element::OrderBy(sorts) => {
                let terms: Vec<String> = sorts.iter().map(Sort::export).collect();
                format!("ORDER BY {}", terms.join(", "))
            }
            Element::Limit(n) => format!("LIMIT {}", n),
            Element::Offset(n) => format!("OFFSET {}", n),
            Element::InsertInto(e) => format!("INSERT INTO {}", e),
            Element::Values(pairs) => {
                let tuples: Vec<String> = pairs
                    .iter()
                    .map(|(k, v)| format!("({}, {})", k, v))
                    .collect();
                format!("VALUES {}", tuples.join(", "))
            }
            Element::SelectSource { keys, select } => {
                format!("(KEY {}) {}", keys, select)
            }
            Element::Update(e) => format!("UPDATE {}", e),
            Element::Set(pairs) => {
                let assigns: Vec<String> = pairs
                    .iter()
                    .map(|(path, value)| format!("{} = {}", path, value))
                    .collect();
                format!("SET {}", assigns.join(", "))
            }
            Element::Unset(paths) => format!("UNSET {}", join(paths)),
            Element::Returning(e) => format!("RETURNING {}", e),
        }
    }
}

/// Fold an ordered element list into statement text, single-space separated.
pub(crate) fn render_elements(elements: &[Element]) -> String {
    elements
        .iter()
        .map(Element::export)
        .collect::<Vec<_>>()
        .join(" ")
}

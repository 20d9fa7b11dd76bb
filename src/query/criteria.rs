//! Criteria chains: field/operator/value predicates joined with `AND`.
//!
//! `Criteria::of("a").equal_to(1).and("b").greater_than(2)` renders
//! `a = 1 AND b > 2`. Negation (`.not()`) swaps the rendered operator per a
//! fixed lookup table rather than wrapping the predicate in `NOT (...)`.

use serde_json::Value;

use crate::error::{Error, Result};

/// Predicate operator. `keyword` returns the rendered form, `negated` its
/// entry in the negation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    Contains,
    In,
    Between,
    IsNull,
    IsMissing,
    IsValued,
}

impl Op {
    fn keyword(self, negated: bool) -> &'static str {
        match (self, negated) {
            (Op::Eq, false) => "=",
            (Op::Eq, true) => "!=",
            (Op::Gt, false) => ">",
            (Op::Gt, true) => "<=",
            (Op::Gte, false) => ">=",
            (Op::Gte, true) => "<",
            (Op::Lt, false) => "<",
            (Op::Lt, true) => ">=",
            (Op::Lte, false) => "<=",
            (Op::Lte, true) => ">",
            (Op::Like, false) => "LIKE",
            (Op::Like, true) => "NOT LIKE",
            (Op::Contains, false) => "CONTAINS",
            (Op::Contains, true) => "NOT CONTAINS",
            (Op::In, false) => "IN",
            (Op::In, true) => "NOT IN",
            (Op::Between, false) => "BETWEEN",
            (Op::Between, true) => "NOT BETWEEN",
            (Op::IsNull, false) => "IS NULL",
            (Op::IsNull, true) => "IS NOT NULL",
            (Op::IsMissing, false) => "IS MISSING",
            (Op::IsMissing, true) => "IS NOT MISSING",
            (Op::IsValued, false) => "IS VALUED",
            (Op::IsValued, true) => "IS NOT VALUED",
        }
    }

    /// Postfix operators render after the field with no value.
    fn is_postfix(self) -> bool {
        matches!(self, Op::IsNull | Op::IsMissing | Op::IsValued)
    }
}

#[derive(Debug, Clone)]
struct Predicate {
    field: String,
    op: Op,
    value: Option<Value>,
    negated: bool,
}

impl Predicate {
    fn render(&self) -> Result<String> {
        let kw = self.op.keyword(self.negated);
        if self.op.is_postfix() {
            return Ok(format!("{} {}", self.field, kw));
        }
        let value = self
            .value
            .as_ref()
            .ok_or_else(|| Error::Render(format!("{} predicate is missing a value", kw)))?;
        if self.op == Op::Between {
            // Arity is deliberately checked here and not at construction.
            let bounds = match value {
                Value::Array(items) if items.len() == 2 => items,
                _ => {
                    return Err(Error::InvalidArgument(
                        "BETWEEN requires exactly two bounds".into(),
                    ))
                }
            };
            return Ok(format!(
                "{} {} {} AND {}",
                self.field, kw, bounds[0], bounds[1]
            ));
        }
        Ok(format!("{} {} {}", self.field, kw, value))
    }
}

/// An ordered chain of committed predicates.
#[derive(Debug, Clone)]
pub struct Criteria {
    predicates: Vec<Predicate>,
}

impl Criteria {
    /// Start a chain with its first field.
    pub fn of(field: impl Into<String>) -> CriteriaField {
        CriteriaField {
            committed: Vec::new(),
            field: field.into(),
            negated: false,
        }
    }

    /// Commit the chain so far and open a predicate on the next field.
    pub fn and(self, field: impl Into<String>) -> CriteriaField {
        CriteriaField {
            committed: self.predicates,
            field: field.into(),
            negated: false,
        }
    }

    /// Render the chain, predicates joined with `" AND "` in insertion order.
    ///
    /// Value-shape invariants (BETWEEN arity) are validated here, not at
    /// construction.
    pub fn render(&self) -> Result<String> {
        let parts: Result<Vec<String>> = self.predicates.iter().map(Predicate::render).collect();
        Ok(parts?.join(" AND "))
    }
}

/// A predicate under construction: field chosen, operator pending.
#[derive(Debug, Clone)]
pub struct CriteriaField {
    committed: Vec<Predicate>,
    field: String,
    negated: bool,
}

impl CriteriaField {
    /// Negate the operator that terminates this predicate.
    pub fn not(mut self) -> Self {
        self.negated = true;
        self
    }

    pub fn equal_to(self, value: impl Into<Value>) -> Criteria {
        self.commit(Op::Eq, Some(value.into()))
    }

    pub fn greater_than(self, value: impl Into<Value>) -> Criteria {
        self.commit(Op::Gt, Some(value.into()))
    }

    pub fn greater_than_or_equal(self, value: impl Into<Value>) -> Criteria {
        self.commit(Op::Gte, Some(value.into()))
    }

    pub fn less_than(self, value: impl Into<Value>) -> Criteria {
        self.commit(Op::Lt, Some(value.into()))
    }

    pub fn less_than_or_equal(self, value: impl Into<Value>) -> Criteria {
        self.commit(Op::Lte, Some(value.into()))
    }

    pub fn like(self, pattern: impl Into<Value>) -> Criteria {
        self.commit(Op::Like, Some(pattern.into()))
    }

    pub fn contains(self, value: impl Into<Value>) -> Criteria {
        self.commit(Op::Contains, Some(value.into()))
    }

    /// Membership test against an array value.
    pub fn within(self, values: impl Into<Value>) -> Criteria {
        self.commit(Op::In, Some(values.into()))
    }

    /// Range test. The value is accepted as-is; render fails unless it is a
    /// two-element array.
    pub fn between(self, bounds: impl Into<Value>) -> Criteria {
        self.commit(Op::Between, Some(bounds.into()))
    }

    pub fn is_null(self) -> Criteria {
        self.commit(Op::IsNull, None)
    }

    pub fn is_missing(self) -> Criteria {
        self.commit(Op::IsMissing, None)
    }

    pub fn is_valued(self) -> Criteria {
        self.commit(Op::IsValued, None)
    }

    fn commit(self, op: Op, value: Option<Value>) -> Criteria {
        let mut predicates = self.committed;
        predicates.push(Predicate {
            field: self.field,
            op,
            value,
            negated: self.negated,
        });
        Criteria { predicates }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_predicate() {
        let c = Criteria::of("a").equal_to("foo");
        assert_eq!(c.render().unwrap(), r#"a = "foo""#);
    }

    #[test]
    fn test_negated_equal() {
        let c = Criteria::of("a").not().equal_to("foo");
        assert_eq!(c.render().unwrap(), r#"a != "foo""#);
    }

    #[test]
    fn test_negated_is_null() {
        let c = Criteria::of("g").not().is_null();
        assert_eq!(c.render().unwrap(), "g IS NOT NULL");
    }

    #[test]
    fn test_chain_preserves_insertion_order() {
        let c = Criteria::of("a")
            .equal_to(1)
            .and("b")
            .equal_to(2)
            .and("c")
            .equal_to(3);
        assert_eq!(c.render().unwrap(), "a = 1 AND b = 2 AND c = 3");
    }

    #[test]
    fn test_between_renders_bounds() {
        let c = Criteria::of("abv").between(json!([4, 6]));
        assert_eq!(c.render().unwrap(), "abv BETWEEN 4 AND 6");
    }

    #[test]
    fn test_between_wrong_arity_fails_at_render() {
        // Construction accepts the value; only render validates it.
        let c = Criteria::of("abv").between(json!([4, 6, 8]));
        assert!(matches!(c.render(), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_between_non_array_fails_at_render() {
        let c = Criteria::of("abv").between(5);
        assert!(matches!(c.render(), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_negation_table() {
        let cases: Vec<(Criteria, &str)> = vec![
            (Criteria::of("x").not().greater_than(1), "x <= 1"),
            (Criteria::of("x").not().greater_than_or_equal(1), "x < 1"),
            (Criteria::of("x").not().less_than(1), "x >= 1"),
            (Criteria::of("x").not().less_than_or_equal(1), "x > 1"),
            (Criteria::of("x").not().like("a%"), r#"x NOT LIKE "a%""#),
            (
                Criteria::of("x").not().within(json!(["a"])),
                r#"x NOT IN ["a"]"#,
            ),
            (
                Criteria::of("x").not().between(json!([1, 2])),
                "x NOT BETWEEN 1 AND 2",
            ),
            (Criteria::of("x").not().is_missing(), "x IS NOT MISSING"),
            (Criteria::of("x").not().is_valued(), "x IS NOT VALUED"),
        ];
        for (criteria, expected) in cases {
            assert_eq!(criteria.render().unwrap(), expected);
        }
    }

    #[test]
    fn test_render_is_idempotent() {
        let c = Criteria::of("a").equal_to(1).and("b").not().is_null();
        assert_eq!(c.render().unwrap(), c.render().unwrap());
    }
}

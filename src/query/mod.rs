//! OQL query DSL: expression tree, statement builders, criteria chains.
//!
//! Statements are assembled through fluent builder chains in which each stage
//! only exposes the clauses the grammar still allows, so an illegal chain
//! does not compile. Rendering is a pure fold over the accumulated clause
//! elements.

pub mod criteria;
pub mod element;
pub mod expression;
pub mod insert;
pub mod select;
pub mod update;

pub use criteria::{Criteria, CriteriaField};
pub use element::{Element, Sort, SortDir};
pub use expression::{ident, string_literal, Expression};
pub use insert::{insert_into, MutateStatement};
pub use select::{select, select_distinct, QueryStatement};
pub use update::update;

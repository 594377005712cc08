//! Typed search conditions for the medication-dispensing data layer.
//!
//! A search screen describes what it wants as `(field, operator, value)`
//! criteria. This crate turns each criterion into a [`Condition`], each
//! condition into a [`Predicate`], and lets the data-access layer either
//! evaluate predicates in memory or render them as SQL.

mod condition;
mod criteria;
pub mod error;
mod field;
mod operator;
mod predicate;
mod schema;
mod value;

pub use condition::*;
pub use criteria::*;
pub use error::*;
pub use field::*;
pub use operator::*;
pub use predicate::*;
pub use schema::*;
pub use value::*;

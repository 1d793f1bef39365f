//! Free-standing expression constructors.
//!
//! Column references come from the statement that binds them (see
//! `SelectStatement::field`); everything else is built here or through the
//! methods of [`Expr`] and [`Predicate`].

use crate::ast::{Expr, Predicate, Query};
use crate::error::Result;
use crate::types::ValueType;
use crate::value::ToSqlValue;

/// A bound parameter.
pub fn param<T: ToSqlValue>(value: T) -> Expr {
    Expr::param(value)
}

/// A value the dialect may inline when its type is injection-safe.
pub fn literal<T: ToSqlValue>(value: T) -> Expr {
    Expr::literal(value)
}

/// A typed NULL.
#[must_use]
pub const fn null(value_type: ValueType) -> Expr {
    Expr::null(value_type)
}

/// A named batch placeholder.
#[must_use]
pub fn batch_param(name: &str, value_type: ValueType) -> Expr {
    Expr::batch_param(name, value_type)
}

/// `a AND b`
#[must_use]
pub fn and(a: Predicate, b: Predicate) -> Predicate {
    a.and(b)
}

/// `a OR b`
#[must_use]
pub fn or(a: Predicate, b: Predicate) -> Predicate {
    a.or(b)
}

/// `NOT p`
#[must_use]
pub fn not(p: Predicate) -> Predicate {
    p.not()
}

/// AND-s every predicate together; `None` for an empty input.
pub fn all<I: IntoIterator<Item = Predicate>>(predicates: I) -> Option<Predicate> {
    predicates.into_iter().reduce(Predicate::and)
}

/// OR-s every predicate together; `None` for an empty input.
pub fn any<I: IntoIterator<Item = Predicate>>(predicates: I) -> Option<Predicate> {
    predicates.into_iter().reduce(Predicate::or)
}

/// `EXISTS (query)`
///
/// # Errors
///
/// Fails if the query is not prepared.
pub fn exists(query: impl Into<Query>) -> Result<Predicate> {
    Predicate::exists(query)
}

/// `NOT EXISTS (query)`
///
/// # Errors
///
/// Fails if the query is not prepared.
pub fn not_exists(query: impl Into<Query>) -> Result<Predicate> {
    Predicate::not_exists(query)
}

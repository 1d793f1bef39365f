//! CASE expressions.
//!
//! A CASE always has at least one branch: the builders are created together
//! with their first WHEN. Every THEN and ELSE must unify to one type.

use std::marker::PhantomData;

use crate::ast::{CaseExpr, Expr, Predicate};
use crate::error::Result;
use crate::types::{self, ValueType};

/// Marker: `CASE WHEN condition THEN ...`
pub struct Searched;
/// Marker: `CASE operand WHEN value THEN ...`
pub struct Simple;

/// A CASE expression under construction.
pub struct Case<F> {
    operand: Option<Box<Expr>>,
    branches: Vec<(Expr, Expr)>,
    value_type: ValueType,
    _flavor: PhantomData<F>,
}

/// A simple CASE awaiting its first branch.
pub struct CaseOn {
    operand: Expr,
}

/// Starts a searched CASE.
pub fn case_when(condition: Predicate, then: impl Into<Expr>) -> Case<Searched> {
    let then = then.into();
    Case {
        operand: None,
        value_type: then.value_type(),
        branches: vec![(condition.into_expr(), then)],
        _flavor: PhantomData,
    }
}

/// Starts a simple CASE over `operand`.
pub fn case_on(operand: impl Into<Expr>) -> CaseOn {
    CaseOn {
        operand: operand.into(),
    }
}

impl CaseOn {
    /// Adds the first branch.
    pub fn when(self, value: impl Into<Expr>, then: impl Into<Expr>) -> Case<Simple> {
        let then = then.into();
        let value = value.into().coerce_to(self.operand.value_type());
        Case {
            value_type: then.value_type(),
            operand: Some(Box::new(self.operand)),
            branches: vec![(value, then)],
            _flavor: PhantomData,
        }
    }
}

impl Case<Searched> {
    /// Adds a branch.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SqlError::TypeMismatch`] if `then` does not unify with
    /// the earlier branches.
    pub fn when(self, condition: Predicate, then: impl Into<Expr>) -> Result<Self> {
        self.push(condition.into_expr(), then.into())
    }
}

impl Case<Simple> {
    /// Adds a branch.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SqlError::TypeMismatch`] if `then` does not unify with
    /// the earlier branches.
    pub fn when(self, value: impl Into<Expr>, then: impl Into<Expr>) -> Result<Self> {
        let target = self
            .operand
            .as_ref()
            .map_or(ValueType::Unknown, |operand| operand.value_type());
        let value = value.into().coerce_to(target);
        self.push(value, then.into())
    }
}

impl<F> Case<F> {
    /// Finishes with an ELSE branch.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SqlError::TypeMismatch`] if the ELSE branch does not
    /// unify with the THEN branches.
    pub fn otherwise(self, value: impl Into<Expr>) -> Result<Expr> {
        let value = value.into();
        let value_type = types::common_type("CASE", self.value_type, value.value_type())?;
        Ok(Expr::Case(CaseExpr {
            operand: self.operand,
            branches: self.branches,
            otherwise: Some(Box::new(value)),
            value_type,
        }))
    }

    /// Finishes without ELSE; unmatched rows yield NULL.
    #[must_use]
    pub fn end(self) -> Expr {
        Expr::Case(CaseExpr {
            operand: self.operand,
            branches: self.branches,
            otherwise: None,
            value_type: self.value_type,
        })
    }

    fn push(mut self, condition: Expr, then: Expr) -> Result<Self> {
        self.value_type = types::common_type("CASE", self.value_type, then.value_type())?;
        self.branches.push((condition, then));
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SqlError;

    #[test]
    fn test_branch_types_unify() {
        let case = case_when(Predicate::constant(true), 1_i32)
            .when(Predicate::constant(false), 2_i64)
            .unwrap()
            .otherwise(0.5_f64)
            .unwrap();
        assert_eq!(case.value_type(), ValueType::Double);
    }

    #[test]
    fn test_incompatible_branch() {
        let result = case_when(Predicate::constant(true), 1_i32).when(Predicate::constant(false), "two");
        assert!(matches!(
            result,
            Err(SqlError::TypeMismatch { operator: "CASE", .. })
        ));
    }

    #[test]
    fn test_simple_case_without_else() {
        let case = case_on(3_i32).when(1_i32, "one").when(2_i32, "two").unwrap().end();
        let Expr::Case(case) = case else {
            panic!("expected a CASE node");
        };
        assert!(case.operand.is_some());
        assert_eq!(case.branches.len(), 2);
        assert_eq!(case.value_type, ValueType::Text);
    }
}

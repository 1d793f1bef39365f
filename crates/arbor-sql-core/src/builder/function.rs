//! Aggregate, scalar and window function constructors.

use crate::ast::{Expr, FunctionArgs, FunctionCall, FunctionKind};
use crate::error::{Result, SqlError};
use crate::types::{self, TypeCategory, ValueType};

/// `COUNT(*)`
#[must_use]
pub fn count_star() -> Expr {
    Expr::Function(FunctionCall {
        name: String::from("COUNT"),
        args: FunctionArgs::Star,
        distinct: false,
        kind: FunctionKind::Aggregate,
        return_type: ValueType::BigInt,
    })
}

/// `COUNT(expr)`
#[must_use]
pub fn count(expr: impl Into<Expr>) -> Expr {
    aggregate("COUNT", expr.into(), ValueType::BigInt)
}

/// `COUNT(DISTINCT expr)`
#[must_use]
pub fn count_distinct(expr: impl Into<Expr>) -> Expr {
    let mut call = FunctionCall::new(
        "COUNT",
        vec![expr.into()],
        FunctionKind::Aggregate,
        ValueType::BigInt,
    );
    call.distinct = true;
    Expr::Function(call)
}

/// `SUM(expr)`; integers sum to BIGINT.
///
/// # Errors
///
/// Returns [`SqlError::TypeMismatch`] for a non-numeric argument.
pub fn sum(expr: impl Into<Expr>) -> Result<Expr> {
    let expr = expr.into();
    let return_type = match numeric_category("SUM", &expr)? {
        TypeCategory::Integer => ValueType::BigInt,
        TypeCategory::Float => ValueType::Double,
        TypeCategory::Decimal => ValueType::Decimal,
        _ => ValueType::Unknown,
    };
    Ok(aggregate("SUM", expr, return_type))
}

/// `AVG(expr)`; integers and decimals average to DECIMAL.
///
/// # Errors
///
/// Returns [`SqlError::TypeMismatch`] for a non-numeric argument.
pub fn avg(expr: impl Into<Expr>) -> Result<Expr> {
    let expr = expr.into();
    let return_type = match numeric_category("AVG", &expr)? {
        TypeCategory::Float => ValueType::Double,
        TypeCategory::Unknown => ValueType::Unknown,
        _ => ValueType::Decimal,
    };
    Ok(aggregate("AVG", expr, return_type))
}

/// `MIN(expr)`
#[must_use]
pub fn min(expr: impl Into<Expr>) -> Expr {
    let expr = expr.into();
    let return_type = expr.value_type();
    aggregate("MIN", expr, return_type)
}

/// `MAX(expr)`
#[must_use]
pub fn max(expr: impl Into<Expr>) -> Expr {
    let expr = expr.into();
    let return_type = expr.value_type();
    aggregate("MAX", expr, return_type)
}

/// `COALESCE(a, b, ...)`, typed as the common type of its arguments.
///
/// # Errors
///
/// Returns [`SqlError::EmptyList`] without arguments and
/// [`SqlError::TypeMismatch`] when argument types do not unify.
pub fn coalesce<I, E>(args: I) -> Result<Expr>
where
    I: IntoIterator<Item = E>,
    E: Into<Expr>,
{
    let args: Vec<Expr> = args.into_iter().map(Into::into).collect();
    let mut arg_types = args.iter().map(Expr::value_type);
    let first = arg_types
        .next()
        .ok_or(SqlError::EmptyList { operator: "COALESCE" })?;
    let return_type =
        arg_types.try_fold(first, |acc, t| types::common_type("COALESCE", acc, t))?;
    Ok(Expr::Function(FunctionCall::new(
        "COALESCE",
        args,
        FunctionKind::Scalar,
        return_type,
    )))
}

/// `LOWER(expr)`
#[must_use]
pub fn lower(expr: impl Into<Expr>) -> Expr {
    scalar("LOWER", vec![expr.into()], ValueType::Text)
}

/// `UPPER(expr)`
#[must_use]
pub fn upper(expr: impl Into<Expr>) -> Expr {
    scalar("UPPER", vec![expr.into()], ValueType::Text)
}

/// Any other scalar function; the caller states its return type.
///
/// The name is written unquoted, so it must be a plain identifier, optionally
/// schema-qualified (`ext.levenshtein`).
///
/// # Errors
///
/// Returns [`SqlError::InvalidIdentifier`] for any other name.
pub fn function(name: &str, args: Vec<Expr>, return_type: ValueType) -> Result<Expr> {
    if !name.split('.').all(is_plain_identifier) {
        return Err(SqlError::InvalidIdentifier {
            context: "function name",
            name: String::from(name),
        });
    }
    Ok(scalar(name, args, return_type))
}

fn is_plain_identifier(part: &str) -> bool {
    let mut chars = part.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// `ROW_NUMBER()`; use with [`Expr::over`].
#[must_use]
pub fn row_number() -> Expr {
    window("ROW_NUMBER")
}

/// `RANK()`; use with [`Expr::over`].
#[must_use]
pub fn rank() -> Expr {
    window("RANK")
}

/// `DENSE_RANK()`; use with [`Expr::over`].
#[must_use]
pub fn dense_rank() -> Expr {
    window("DENSE_RANK")
}

fn aggregate(name: &str, arg: Expr, return_type: ValueType) -> Expr {
    Expr::Function(FunctionCall::new(
        name,
        vec![arg],
        FunctionKind::Aggregate,
        return_type,
    ))
}

fn scalar(name: &str, args: Vec<Expr>, return_type: ValueType) -> Expr {
    Expr::Function(FunctionCall::new(
        name,
        args,
        FunctionKind::Scalar,
        return_type,
    ))
}

fn window(name: &str) -> Expr {
    Expr::Function(FunctionCall::new(
        name,
        vec![],
        FunctionKind::Window,
        ValueType::BigInt,
    ))
}

fn numeric_category(operator: &'static str, expr: &Expr) -> Result<TypeCategory> {
    let value_type = expr.value_type();
    let category = value_type.category();
    if category.is_numeric() || category == TypeCategory::Unknown {
        Ok(category)
    } else {
        Err(SqlError::TypeMismatch {
            operator,
            left: value_type,
            right: None,
        })
    }
}

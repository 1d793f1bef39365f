//! Result-type resolution for operators.

use super::{TypeCategory, ValueType};
use crate::error::{Result, SqlError};
use crate::operator::{BinaryOp, LogicalOp, UnaryOp};

/// Promotes two operand types of an arithmetic operation.
///
/// Floating beats decimal, decimal beats integer, and between two types of
/// the same family the wider one wins. A temporal operand (date arithmetic)
/// beats any numeric one and an unknown operand takes the other side's type,
/// whichever side they are on. Ties resolve to the left operand's type.
#[must_use]
pub fn promote_numeric(left: ValueType, right: ValueType) -> ValueType {
    let (l, r) = (left.descriptor(), right.descriptor());
    match (l.category, r.category) {
        (TypeCategory::Unknown, _) => right,
        (_, TypeCategory::Unknown) => left,
        (TypeCategory::Float, TypeCategory::Float)
        | (TypeCategory::Integer, TypeCategory::Integer)
        | (TypeCategory::Temporal, TypeCategory::Temporal) => {
            if r.rank > l.rank {
                right
            } else {
                left
            }
        }
        (TypeCategory::Temporal, _) => left,
        (_, TypeCategory::Temporal) => right,
        (TypeCategory::Float, _) => left,
        (_, TypeCategory::Float) => right,
        (TypeCategory::Decimal, _) => left,
        (_, TypeCategory::Decimal) => right,
        _ => left,
    }
}

/// Resolves the result type of `left op right`.
///
/// # Errors
///
/// Returns [`SqlError::TypeMismatch`] when the operator is not defined for the
/// operand categories, e.g. arithmetic on a boolean.
pub fn binary_result_type(left: ValueType, op: BinaryOp, right: ValueType) -> Result<ValueType> {
    match op {
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
            if accepts_arithmetic(left) && accepts_arithmetic(right) {
                Ok(promote_numeric(left, right))
            } else {
                Err(binary_mismatch(op, left, right))
            }
        }
        BinaryOp::BitAnd
        | BinaryOp::BitOr
        | BinaryOp::BitXor
        | BinaryOp::LeftShift
        | BinaryOp::RightShift => {
            if accepts_bitwise(left) && accepts_bitwise(right) {
                Ok(promote_numeric(left, right))
            } else {
                Err(binary_mismatch(op, left, right))
            }
        }
        BinaryOp::Concat => Ok(ValueType::Text),
        BinaryOp::Eq
        | BinaryOp::NotEq
        | BinaryOp::Lt
        | BinaryOp::LtEq
        | BinaryOp::Gt
        | BinaryOp::GtEq
        | BinaryOp::NullSafeEq
        | BinaryOp::IsDistinctFrom
        | BinaryOp::IsNotDistinctFrom
        | BinaryOp::Like
        | BinaryOp::NotLike
        | BinaryOp::ILike
        | BinaryOp::NotILike
        | BinaryOp::RegexMatch => Ok(ValueType::Boolean),
    }
}

/// Resolves the result type of a unary operator applied to `operand`.
///
/// # Errors
///
/// Returns [`SqlError::TypeMismatch`] for `NOT` on a non-boolean, `-` on a
/// non-numeric or `~` on a non-integer operand.
pub fn unary_result_type(op: UnaryOp, operand: ValueType) -> Result<ValueType> {
    let accepted = match op {
        UnaryOp::Neg => operand.is_numeric() || operand == ValueType::Unknown,
        UnaryOp::BitNot => accepts_bitwise(operand),
        UnaryOp::Not => accepts_boolean(operand),
        UnaryOp::IsNull | UnaryOp::IsNotNull => true,
    };
    if !accepted {
        return Err(SqlError::TypeMismatch {
            operator: op.info().text,
            left: operand,
            right: None,
        });
    }
    Ok(match op {
        UnaryOp::Neg | UnaryOp::BitNot => operand,
        UnaryOp::Not | UnaryOp::IsNull | UnaryOp::IsNotNull => ValueType::Boolean,
    })
}

/// Checks that `operand` may appear under a logical `AND`/`OR`.
///
/// # Errors
///
/// Returns [`SqlError::TypeMismatch`] for non-boolean operands.
pub fn logical_operand(op: LogicalOp, operand: ValueType) -> Result<()> {
    if accepts_boolean(operand) {
        Ok(())
    } else {
        Err(SqlError::TypeMismatch {
            operator: op.info().text,
            left: operand,
            right: None,
        })
    }
}

/// Unifies two branch types, as needed by `CASE` and `COALESCE`.
///
/// # Errors
///
/// Returns [`SqlError::TypeMismatch`] (tagged with `construct`) when the two
/// types belong to different categories.
pub fn common_type(construct: &'static str, a: ValueType, b: ValueType) -> Result<ValueType> {
    if a == b || b == ValueType::Unknown {
        return Ok(a);
    }
    if a == ValueType::Unknown {
        return Ok(b);
    }
    if a.is_numeric() && b.is_numeric() {
        return Ok(promote_numeric(a, b));
    }
    let (da, db) = (a.descriptor(), b.descriptor());
    if da.category == db.category {
        return Ok(if db.rank > da.rank { b } else { a });
    }
    Err(SqlError::TypeMismatch {
        operator: construct,
        left: a,
        right: Some(b),
    })
}

fn accepts_arithmetic(value_type: ValueType) -> bool {
    matches!(
        value_type.category(),
        TypeCategory::Integer
            | TypeCategory::Decimal
            | TypeCategory::Float
            | TypeCategory::Temporal
            | TypeCategory::Unknown
    )
}

fn accepts_bitwise(value_type: ValueType) -> bool {
    matches!(
        value_type.category(),
        TypeCategory::Integer | TypeCategory::Unknown
    )
}

fn accepts_boolean(value_type: ValueType) -> bool {
    matches!(value_type, ValueType::Boolean | ValueType::Unknown)
}

fn binary_mismatch(op: BinaryOp, left: ValueType, right: ValueType) -> SqlError {
    SqlError::TypeMismatch {
        operator: op.info().text,
        left,
        right: Some(right),
    }
}

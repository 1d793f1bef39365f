//! MySQL dialect.

use super::{unsupported, Dialect, DialectOptions, LiteralPolicy, OperatorSyntax, QuotePolicy};
use crate::error::Result;
use crate::operator::{BinaryOp, PRECEDENCE_UNARY};
use crate::types::ValueType;

/// MySQL 8: backtick quoting, `CONCAT()` instead of `||`, `<=>` and REGEXP.
///
/// MySQL has neither FULL JOIN nor RETURNING, and no ILIKE or
/// `IS [NOT] DISTINCT FROM`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MySqlDialect {
    options: DialectOptions,
}

impl MySqlDialect {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            options: DialectOptions::new(),
        }
    }

    #[must_use]
    pub const fn with_options(options: DialectOptions) -> Self {
        Self { options }
    }
}

impl Dialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn identifier_quote(&self) -> char {
        '`'
    }

    fn quote_policy(&self) -> QuotePolicy {
        self.options.quote_policy
    }

    fn literal_policy(&self) -> LiteralPolicy {
        self.options.literal_policy
    }

    fn binary_operator(&self, op: BinaryOp) -> Result<OperatorSyntax> {
        match op {
            // `||` is logical OR unless PIPES_AS_CONCAT is set
            BinaryOp::Concat => Ok(OperatorSyntax::Function("CONCAT")),
            BinaryOp::RegexMatch => Ok(OperatorSyntax::Infix("REGEXP")),
            BinaryOp::ILike
            | BinaryOp::NotILike
            | BinaryOp::IsDistinctFrom
            | BinaryOp::IsNotDistinctFrom => Err(unsupported(self.name(), op.info().text)),
            _ => Ok(OperatorSyntax::Infix(op.info().text)),
        }
    }

    // `^` binds tighter than `*`, just below the unary operators.
    fn binary_precedence(&self, op: BinaryOp) -> u8 {
        match op {
            BinaryOp::BitXor => PRECEDENCE_UNARY,
            _ => op.info().precedence,
        }
    }

    fn cast_type(&self, value_type: ValueType) -> Result<&'static str> {
        match value_type {
            ValueType::TinyInt | ValueType::SmallInt | ValueType::Integer | ValueType::BigInt => {
                Ok("SIGNED")
            }
            ValueType::Char | ValueType::Varchar | ValueType::Text => Ok("CHAR"),
            ValueType::Real => Ok("FLOAT"),
            ValueType::Timestamp => Ok("DATETIME"),
            ValueType::Blob => Ok("BINARY"),
            ValueType::Boolean | ValueType::Unknown => Err(unsupported(
                self.name(),
                format!("CAST to {value_type}"),
            )),
            _ => Ok(value_type.sql_name()),
        }
    }

    fn limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        match (limit, offset) {
            // MySQL has no OFFSET without LIMIT
            (None, Some(offset)) => format!(" LIMIT {} OFFSET {offset}", u64::MAX),
            (Some(limit), Some(offset)) => format!(" LIMIT {limit} OFFSET {offset}"),
            (Some(limit), None) => format!(" LIMIT {limit}"),
            (None, None) => String::new(),
        }
    }

    fn supports_full_join(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mysql_quoting() {
        let dialect = MySqlDialect::new();
        assert_eq!(dialect.quote_identifier("select"), "`select`");
        assert_eq!(dialect.quote_identifier("a`b"), "`a``b`");
        assert_eq!(dialect.quote_identifier("orders"), "orders");
        assert_eq!(dialect.placeholder(2), "?");
    }

    #[test]
    fn test_mysql_operators() {
        let dialect = MySqlDialect::new();
        assert_eq!(
            dialect.binary_operator(BinaryOp::Concat),
            Ok(OperatorSyntax::Function("CONCAT"))
        );
        assert_eq!(
            dialect.binary_operator(BinaryOp::NullSafeEq),
            Ok(OperatorSyntax::Infix("<=>"))
        );
        assert!(dialect.binary_operator(BinaryOp::IsDistinctFrom).is_err());
        assert!(dialect.binary_operator(BinaryOp::ILike).is_err());
    }

    #[test]
    fn test_mysql_xor_binds_tighter_than_multiplication() {
        let dialect = MySqlDialect::new();
        assert!(
            dialect.binary_precedence(BinaryOp::BitXor) > dialect.binary_precedence(BinaryOp::Mul)
        );
        assert_eq!(
            dialect.binary_precedence(BinaryOp::BitAnd),
            BinaryOp::BitAnd.info().precedence
        );
    }

    #[test]
    fn test_mysql_offset_without_limit() {
        let dialect = MySqlDialect::new();
        assert_eq!(
            dialect.limit_offset(None, Some(3)),
            " LIMIT 18446744073709551615 OFFSET 3"
        );
    }

    #[test]
    fn test_mysql_capabilities() {
        let dialect = MySqlDialect::new();
        assert!(!dialect.supports_full_join());
        assert!(!dialect.supports_returning());
        assert_eq!(dialect.cast_type(ValueType::BigInt), Ok("SIGNED"));
        assert!(dialect.cast_type(ValueType::Boolean).is_err());
    }
}

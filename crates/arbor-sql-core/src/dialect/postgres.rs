//! PostgreSQL dialect.

use super::{
    unsupported, Dialect, DialectOptions, LiteralPolicy, OperatorSyntax, ParameterStyle, QuotePolicy,
};
use crate::error::Result;
use crate::operator::BinaryOp;
use crate::types::ValueType;

/// PostgreSQL: `$n` placeholders, ILIKE, POSIX regex matching and RETURNING.
#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresDialect {
    options: DialectOptions,
}

impl PostgresDialect {
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

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quote_policy(&self) -> QuotePolicy {
        self.options.quote_policy
    }

    fn literal_policy(&self) -> LiteralPolicy {
        self.options.literal_policy
    }

    fn parameter_style(&self) -> ParameterStyle {
        ParameterStyle::DollarNumbered
    }

    fn binary_operator(&self, op: BinaryOp) -> Result<OperatorSyntax> {
        Ok(OperatorSyntax::Infix(match op {
            // `^` is exponentiation in PostgreSQL
            BinaryOp::BitXor => "#",
            BinaryOp::NullSafeEq => "IS NOT DISTINCT FROM",
            _ => op.info().text,
        }))
    }

    // Bitwise operators, shifts and `||` share one left-associative level
    // below `+` and `-`.
    fn binary_precedence(&self, op: BinaryOp) -> u8 {
        match op {
            BinaryOp::Concat
            | BinaryOp::BitAnd
            | BinaryOp::BitOr
            | BinaryOp::BitXor
            | BinaryOp::LeftShift
            | BinaryOp::RightShift => BinaryOp::LeftShift.info().precedence,
            _ => op.info().precedence,
        }
    }

    fn cast_type(&self, value_type: ValueType) -> Result<&'static str> {
        match value_type {
            ValueType::TinyInt => Ok("SMALLINT"),
            ValueType::Double => Ok("DOUBLE PRECISION"),
            ValueType::Blob => Ok("BYTEA"),
            ValueType::Unknown => Err(unsupported(self.name(), "CAST to UNKNOWN")),
            _ => Ok(value_type.sql_name()),
        }
    }

    fn supports_returning(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postgres_dialect() {
        let dialect = PostgresDialect::new();
        assert_eq!(dialect.name(), "postgres");
        assert_eq!(dialect.placeholder(1), "$1");
        assert_eq!(dialect.placeholder(12), "$12");
        assert!(dialect.supports_returning());
    }

    #[test]
    fn test_postgres_operators() {
        let dialect = PostgresDialect::new();
        assert_eq!(
            dialect.binary_operator(BinaryOp::BitXor),
            Ok(OperatorSyntax::Infix("#"))
        );
        assert_eq!(
            dialect.binary_operator(BinaryOp::RegexMatch),
            Ok(OperatorSyntax::Infix("~"))
        );
        assert_eq!(
            dialect.binary_operator(BinaryOp::NotILike),
            Ok(OperatorSyntax::Infix("NOT ILIKE"))
        );
    }

    #[test]
    fn test_postgres_bitwise_share_a_level() {
        let dialect = PostgresDialect::new();
        let level = dialect.binary_precedence(BinaryOp::BitOr);
        assert_eq!(dialect.binary_precedence(BinaryOp::BitAnd), level);
        assert_eq!(dialect.binary_precedence(BinaryOp::Concat), level);
        assert!(dialect.binary_precedence(BinaryOp::Add) > level);
        assert!(dialect.binary_precedence(BinaryOp::Eq) < level);
    }

    #[test]
    fn test_postgres_cast_types() {
        let dialect = PostgresDialect::new();
        assert_eq!(dialect.cast_type(ValueType::Double), Ok("DOUBLE PRECISION"));
        assert_eq!(dialect.cast_type(ValueType::Blob), Ok("BYTEA"));
        assert_eq!(dialect.cast_type(ValueType::Date), Ok("DATE"));
    }
}

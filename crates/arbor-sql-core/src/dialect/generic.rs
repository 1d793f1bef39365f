//! Generic SQL dialect.

use super::{Dialect, DialectOptions, LiteralPolicy, QuotePolicy};

/// A generic SQL dialect using ANSI SQL standards.
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericDialect {
    options: DialectOptions,
}

impl GenericDialect {
    /// Creates a new generic dialect.
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

impl Dialect for GenericDialect {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn quote_policy(&self) -> QuotePolicy {
        self.options.quote_policy
    }

    fn literal_policy(&self) -> LiteralPolicy {
        self.options.literal_policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{OperatorSyntax, ParameterStyle};
    use crate::error::SqlError;
    use crate::operator::BinaryOp;
    use crate::types::ValueType;
    use crate::value::{SqlValue, TypedValue};

    #[test]
    fn test_generic_dialect() {
        let dialect = GenericDialect::new();
        assert_eq!(dialect.name(), "generic");
        assert_eq!(dialect.identifier_quote(), '"');
        assert_eq!(dialect.parameter_style(), ParameterStyle::QuestionMark);
        assert_eq!(dialect.placeholder(3), "?");
        assert!(!dialect.supports_returning());
        assert!(dialect.supports_full_join());
    }

    #[test]
    fn test_quoting_when_needed() {
        let dialect = GenericDialect::new();
        assert_eq!(dialect.quote_identifier("users"), "users");
        assert_eq!(dialect.quote_identifier("order"), "\"order\"");
        assert_eq!(dialect.quote_identifier("UserId"), "\"UserId\"");
        assert_eq!(dialect.quote_identifier("2fa"), "\"2fa\"");
        assert_eq!(dialect.quote_identifier("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_quote_policies() {
        let always = GenericDialect::with_options(
            DialectOptions::new().quote_policy(QuotePolicy::Always),
        );
        assert_eq!(always.quote_identifier("users"), "\"users\"");
        let never =
            GenericDialect::with_options(DialectOptions::new().quote_policy(QuotePolicy::Never));
        assert_eq!(never.quote_identifier("order"), "order");
    }

    #[test]
    fn test_format_literal() {
        let dialect = GenericDialect::new();
        let literal = |value_type, value| {
            dialect.format_literal(&TypedValue::new(value_type, value).unwrap())
        };
        assert_eq!(literal(ValueType::Integer, SqlValue::Int(-4)).unwrap(), "-4");
        assert_eq!(literal(ValueType::Boolean, SqlValue::Bool(true)).unwrap(), "TRUE");
        assert_eq!(literal(ValueType::Double, SqlValue::Float(2.0)).unwrap(), "2.0");
        assert_eq!(literal(ValueType::BigInt, SqlValue::Null).unwrap(), "NULL");
        assert!(literal(ValueType::Double, SqlValue::Float(f64::NAN)).is_err());
        assert!(matches!(
            literal(ValueType::Text, SqlValue::Text(String::from("x"))),
            Err(SqlError::UnsupportedForDialect { dialect: "generic", .. })
        ));
    }

    #[test]
    fn test_text_and_blobs_are_never_inlined() {
        let optimizing = GenericDialect::with_options(
            DialectOptions::new().literal_policy(LiteralPolicy::Optimizing),
        );
        let hostile = TypedValue::from_host("'; DROP TABLE users; --");
        assert!(optimizing.format_literal(&hostile).is_err());
        let blob = TypedValue::from_host(vec![0x48_u8, 0x49]);
        assert!(optimizing.format_literal(&blob).is_err());
    }

    #[test]
    fn test_operators() {
        let dialect = GenericDialect::new();
        assert_eq!(
            dialect.binary_operator(BinaryOp::Concat),
            Ok(OperatorSyntax::Infix("||"))
        );
        assert_eq!(
            dialect.binary_operator(BinaryOp::IsDistinctFrom),
            Ok(OperatorSyntax::Infix("IS DISTINCT FROM"))
        );
        assert!(dialect.binary_operator(BinaryOp::NullSafeEq).is_err());
        assert!(dialect.binary_operator(BinaryOp::ILike).is_err());
    }

    #[test]
    fn test_limit_offset() {
        let dialect = GenericDialect::new();
        assert_eq!(dialect.limit_offset(Some(10), Some(20)), " LIMIT 10 OFFSET 20");
        assert_eq!(dialect.limit_offset(None, Some(5)), " OFFSET 5");
        assert_eq!(dialect.limit_offset(None, None), "");
    }

    #[test]
    fn test_options_from_json() {
        let options: DialectOptions =
            serde_json::from_str(r#"{"literal_policy": "optimizing"}"#).unwrap();
        assert_eq!(options.literal_policy, LiteralPolicy::Optimizing);
        assert_eq!(options.quote_policy, QuotePolicy::WhenNeeded);
        let dialect = GenericDialect::with_options(options);
        assert_eq!(dialect.literal_policy(), LiteralPolicy::Optimizing);
    }
}

//! SQLite dialect implementation.

use arbor_sql_core::ast::SetOperator;
use arbor_sql_core::dialect::{
    ansi_literal, unsupported, Dialect, DialectOptions, LiteralPolicy, OperatorSyntax, QuotePolicy,
};
use arbor_sql_core::operator::{BinaryOp, PRECEDENCE_UNARY};
use arbor_sql_core::types::ValueType;
use arbor_sql_core::{Result, SqlValue, TypedValue};

/// SQLite dialect.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteDialect {
    options: DialectOptions,
}

impl SqliteDialect {
    /// Creates a new SQLite dialect.
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

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn identifier_quote(&self) -> char {
        '"' // SQLite also accepts backticks, but double quotes are standard
    }

    fn quote_policy(&self) -> QuotePolicy {
        self.options.quote_policy
    }

    fn literal_policy(&self) -> LiteralPolicy {
        self.options.literal_policy
    }

    fn format_literal(&self, value: &TypedValue) -> Result<String> {
        match value.value {
            SqlValue::Bool(b) if value.value_type == ValueType::Boolean => {
                Ok(String::from(if b { "1" } else { "0" }))
            }
            _ => ansi_literal(self.name(), value),
        }
    }

    fn binary_operator(&self, op: BinaryOp) -> Result<OperatorSyntax> {
        match op {
            BinaryOp::NullSafeEq | BinaryOp::IsNotDistinctFrom => Ok(OperatorSyntax::Infix("IS")),
            BinaryOp::IsDistinctFrom => Ok(OperatorSyntax::Infix("IS NOT")),
            BinaryOp::RegexMatch => Ok(OperatorSyntax::Infix("REGEXP")),
            BinaryOp::ILike | BinaryOp::NotILike | BinaryOp::BitXor => {
                Err(unsupported(self.name(), op.info().text))
            }
            _ => Ok(OperatorSyntax::Infix(op.info().text)),
        }
    }

    // `||` binds tighter than `*`, and `& | << >>` share one level below `+`.
    fn binary_precedence(&self, op: BinaryOp) -> u8 {
        match op {
            BinaryOp::Concat => PRECEDENCE_UNARY,
            BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::LeftShift | BinaryOp::RightShift => {
                BinaryOp::LeftShift.info().precedence
            }
            _ => op.info().precedence,
        }
    }

    fn limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        match (limit, offset) {
            (None, Some(offset)) => format!(" LIMIT -1 OFFSET {offset}"),
            (Some(limit), Some(offset)) => format!(" LIMIT {limit} OFFSET {offset}"),
            (Some(limit), None) => format!(" LIMIT {limit}"),
            (None, None) => String::new(),
        }
    }

    fn supports_returning(&self) -> bool {
        true // SQLite 3.35.0+
    }

    fn supports_lock(&self) -> bool {
        false
    }

    fn supports_set_operation(&self, op: SetOperator, all: bool) -> bool {
        !all || op == SetOperator::Union
    }

    fn supports_nested_set_operations(&self) -> bool {
        false
    }
}

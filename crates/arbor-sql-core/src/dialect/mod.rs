//! SQL Dialect support.
//!
//! Different databases have slightly different SQL syntax. A [`Dialect`]
//! describes one of them to the renderer: how identifiers are quoted, how
//! parameters are written, how inline literals are formatted and which
//! operators and clauses exist at all. Dialects are supplied by the caller;
//! nothing is detected from a connection.
//!
//! Anything a dialect cannot express is reported as
//! [`SqlError::UnsupportedForDialect`] instead of being rewritten into
//! something that means a different thing.

mod generic;
mod keywords;
mod mysql;
mod postgres;

use serde::{Deserialize, Serialize};

pub use generic::GenericDialect;
pub use keywords::is_reserved;
pub use mysql::MySqlDialect;
pub use postgres::PostgresDialect;

use crate::ast::SetOperator;
use crate::error::{Result, SqlError};
use crate::operator::BinaryOp;
use crate::types::ValueType;
use crate::value::{SqlValue, TypedValue};

/// When identifiers are quoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotePolicy {
    /// Quote every identifier.
    Always,
    /// Quote identifiers that are reserved words or not plain lowercase.
    #[default]
    WhenNeeded,
    /// Never quote; the caller guarantees every identifier is safe.
    Never,
}

/// Whether injection-safe parameters may be written inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiteralPolicy {
    /// Every parameter is bound.
    #[default]
    Strict,
    /// Parameters of injection-safe types are inlined, NULLs as `NULL`.
    Optimizing,
}

/// How bound parameters are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterStyle {
    /// `?`
    QuestionMark,
    /// `$1`, `$2`, ...
    DollarNumbered,
}

/// Caller-tunable behavior shared by the built-in dialects.
///
/// Loadable from any serde format; missing fields take their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DialectOptions {
    pub quote_policy: QuotePolicy,
    pub literal_policy: LiteralPolicy,
}

impl DialectOptions {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            quote_policy: QuotePolicy::WhenNeeded,
            literal_policy: LiteralPolicy::Strict,
        }
    }

    #[must_use]
    pub const fn quote_policy(mut self, policy: QuotePolicy) -> Self {
        self.quote_policy = policy;
        self
    }

    #[must_use]
    pub const fn literal_policy(mut self, policy: LiteralPolicy) -> Self {
        self.literal_policy = policy;
        self
    }
}

/// How a binary operator is spelled in a dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorSyntax {
    /// `left op right`
    Infix(&'static str),
    /// `name(left, right)`
    Function(&'static str),
}

/// Trait for SQL dialect-specific behavior.
///
/// The provided methods describe ANSI SQL; dialects override what differs.
pub trait Dialect {
    /// Returns the name of the dialect.
    fn name(&self) -> &'static str;

    /// Returns the identifier quote character (e.g., `"` for standard SQL, `` ` `` for MySQL).
    fn identifier_quote(&self) -> char {
        '"'
    }

    fn quote_policy(&self) -> QuotePolicy {
        QuotePolicy::WhenNeeded
    }

    fn literal_policy(&self) -> LiteralPolicy {
        LiteralPolicy::Strict
    }

    fn parameter_style(&self) -> ParameterStyle {
        ParameterStyle::QuestionMark
    }

    /// Returns whether `identifier` must be quoted to survive as written.
    ///
    /// Plain lowercase identifiers that are not reserved words pass through.
    fn needs_quoting(&self, identifier: &str) -> bool {
        let mut chars = identifier.chars();
        let plain_start = chars
            .next()
            .is_some_and(|c| c.is_ascii_lowercase() || c == '_');
        let plain_rest = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        !(plain_start && plain_rest) || is_reserved(identifier)
    }

    /// Quotes an identifier according to the quote policy.
    fn quote_identifier(&self, name: &str) -> String {
        let quote = match self.quote_policy() {
            QuotePolicy::Always => true,
            QuotePolicy::WhenNeeded => self.needs_quoting(name),
            QuotePolicy::Never => false,
        };
        if !quote {
            return String::from(name);
        }
        let q = self.identifier_quote();
        let escaped = name.replace(q, &format!("{q}{q}"));
        format!("{q}{escaped}{q}")
    }

    /// Returns the placeholder of the 1-based parameter `index`.
    fn placeholder(&self, index: usize) -> String {
        match self.parameter_style() {
            ParameterStyle::QuestionMark => String::from("?"),
            ParameterStyle::DollarNumbered => format!("${index}"),
        }
    }

    /// Formats a value of an injection-safe type as an inline literal.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::UnsupportedForDialect`] for values without a safe
    /// literal form: text, blobs, non-finite floats and every type that is
    /// not injection-safe.
    fn format_literal(&self, value: &TypedValue) -> Result<String> {
        ansi_literal(self.name(), value)
    }

    /// Spells a binary operator.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::UnsupportedForDialect`] for operators the dialect
    /// does not have. The ANSI default lacks `<=>`, ILIKE and regex matching.
    fn binary_operator(&self, op: BinaryOp) -> Result<OperatorSyntax> {
        match op {
            BinaryOp::NullSafeEq
            | BinaryOp::ILike
            | BinaryOp::NotILike
            | BinaryOp::RegexMatch => Err(unsupported(self.name(), op.info().text)),
            _ => Ok(OperatorSyntax::Infix(op.info().text)),
        }
    }

    /// Binding strength of `op` in this dialect, on the catalog's scale.
    ///
    /// The renderer brackets operands against these ranks, so a dialect
    /// whose parser groups operators differently from the catalog must
    /// override this. The default is the catalog rank.
    fn binary_precedence(&self, op: BinaryOp) -> u8 {
        op.info().precedence
    }

    /// The type name used in `CAST(x AS type)`.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::UnsupportedForDialect`] for types that cannot be a
    /// cast target.
    fn cast_type(&self, value_type: ValueType) -> Result<&'static str> {
        match value_type {
            ValueType::Unknown => Err(unsupported(self.name(), "CAST to UNKNOWN")),
            _ => Ok(value_type.sql_name()),
        }
    }

    /// Renders LIMIT and OFFSET, with a leading space when non-empty.
    fn limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        match (limit, offset) {
            (Some(limit), Some(offset)) => format!(" LIMIT {limit} OFFSET {offset}"),
            (Some(limit), None) => format!(" LIMIT {limit}"),
            (None, Some(offset)) => format!(" OFFSET {offset}"),
            (None, None) => String::new(),
        }
    }

    /// Returns whether the dialect supports RETURNING clause.
    fn supports_returning(&self) -> bool {
        false
    }

    fn supports_full_join(&self) -> bool {
        true
    }

    fn supports_window_functions(&self) -> bool {
        true
    }

    /// `FOR UPDATE` / `FOR SHARE`
    fn supports_lock(&self) -> bool {
        true
    }

    fn supports_set_operation(&self, _op: SetOperator, _all: bool) -> bool {
        true
    }

    /// Whether a set-operation operand may itself be a bracketed query.
    fn supports_nested_set_operations(&self) -> bool {
        true
    }
}

/// Formats an injection-safe value the ANSI way, on behalf of `dialect`.
///
/// # Errors
///
/// As [`Dialect::format_literal`].
pub fn ansi_literal(dialect: &'static str, value: &TypedValue) -> Result<String> {
    let not_inlinable = || unsupported(dialect, format!("inline {} literal", value.value_type));
    if !value.value_type.is_injection_safe() {
        return Err(not_inlinable());
    }
    match &value.value {
        SqlValue::Null => Ok(String::from("NULL")),
        SqlValue::Bool(b) => Ok(String::from(if *b { "TRUE" } else { "FALSE" })),
        SqlValue::Int(n) => Ok(n.to_string()),
        SqlValue::Float(f) if f.is_finite() => Ok(format!("{f:?}")),
        SqlValue::Float(f) => Err(unsupported(dialect, format!("float literal {f}"))),
        SqlValue::Text(_) | SqlValue::Blob(_) => Err(not_inlinable()),
    }
}

/// Builds the error for a construct the dialect `dialect` cannot express.
pub fn unsupported(dialect: &'static str, feature: impl Into<String>) -> SqlError {
    SqlError::UnsupportedForDialect {
        dialect,
        feature: feature.into(),
    }
}

//! Error types for statement construction and rendering.

use thiserror::Error;

use crate::ast::{Lifecycle, StatementKind};
use crate::scope::ScopeId;
use crate::types::ValueType;

/// Errors raised while building, preparing or rendering a statement.
///
/// Every fault aborts the statement under construction only. None of them
/// leaves the scope stack in a state that would affect statements built
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SqlError {
    /// An operator was applied to operands of an incompatible category.
    #[error("type mismatch: `{operator}` cannot be applied to {}", describe_operands(.left, .right))]
    TypeMismatch {
        /// Render text of the operator (or construct) that rejected its operands.
        operator: &'static str,
        /// Type of the left (or only) operand.
        left: ValueType,
        /// Type of the right operand, for binary operators.
        right: Option<ValueType>,
    },

    /// A scalar sub-query must select exactly one column.
    #[error("scalar sub-query must select exactly one column, found {found}")]
    ScalarArity {
        /// Number of selections in the sub-query.
        found: usize,
    },

    /// The operands of a set operation select different column counts.
    #[error("{operator} operands select {left} and {right} columns")]
    SetOperationArity {
        /// The set operator (`UNION`, `INTERSECT`, ...).
        operator: &'static str,
        /// Selection count of the left operand.
        left: usize,
        /// Selection count of the right operand.
        right: usize,
    },

    /// A column list and the values feeding it have different lengths.
    #[error("{context}: expected {expected} columns, found {found}")]
    ColumnCountMismatch {
        /// Where the mismatch happened.
        context: &'static str,
        /// The declared column count.
        expected: usize,
        /// The number of values supplied.
        found: usize,
    },

    /// An alias was registered twice in the same scope.
    #[error("alias `{alias}` is already defined in {scope}")]
    DuplicateAlias {
        /// The conflicting alias.
        alias: String,
        /// The scope that already holds it.
        scope: ScopeId,
    },

    /// An alias was empty.
    #[error("empty alias in {context}")]
    EmptyAlias {
        /// Where the alias was supplied.
        context: &'static str,
    },

    /// A name written verbatim into the SQL is not a plain identifier.
    #[error("`{name}` is not a valid {context}")]
    InvalidIdentifier {
        /// What the name was meant to be.
        context: &'static str,
        /// The name as supplied.
        name: String,
    },

    /// A scope was popped or mutated out of LIFO order.
    #[error("scope mismatch: expected {expected} on top of the stack, found {}", describe_top(.found))]
    ScopeMismatch {
        /// The scope the caller expected on top.
        expected: ScopeId,
        /// The scope actually on top, if any.
        found: Option<ScopeId>,
    },

    /// A second top-level statement was started while one is still building.
    #[error("a statement is already being built in this context ({active})")]
    ContextAlreadyActive {
        /// The scope of the statement still being built.
        active: ScopeId,
    },

    /// A scope operation was attempted without an open scope.
    #[error("no statement is being built in this context")]
    NoActiveContext,

    /// A lifecycle method was called in the wrong state.
    #[error("cannot {action} a {kind} statement in the {state} state")]
    IllegalLifecycleTransition {
        /// The statement kind.
        kind: StatementKind,
        /// The attempted action.
        action: &'static str,
        /// The state the statement was in.
        state: Lifecycle,
    },

    /// A statement lacks a clause its kind requires.
    #[error("{kind} statement requires {clause}")]
    MissingRequiredClause {
        /// The statement kind.
        kind: StatementKind,
        /// The missing clause.
        clause: &'static str,
    },

    /// A clause cannot be combined with one the statement already has.
    #[error("{kind} statement already has {clause}")]
    ConflictingClause {
        /// The statement kind.
        kind: StatementKind,
        /// The clause already present.
        clause: &'static str,
    },

    /// A table alias, column, selection alias or CTE could not be resolved.
    #[error("unresolved reference `{reference}`")]
    UnresolvedReference {
        /// The reference as written by the caller.
        reference: String,
    },

    /// A primary-key or version column was used as an assignment target.
    #[error("column `{column}` of `{table}` cannot be assigned")]
    NonUpdatableColumn {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
    },

    /// A list operator was given no elements.
    #[error("{operator} requires at least one element")]
    EmptyList {
        /// The operator or function.
        operator: &'static str,
    },

    /// A batch parameter had no value to bind.
    #[error("batch parameter `{name}` is not bound")]
    UnboundBatchParameter {
        /// The parameter name.
        name: String,
    },

    /// The target dialect cannot express a node of the statement.
    #[error("{feature} is not supported by the {dialect} dialect")]
    UnsupportedForDialect {
        /// Dialect name.
        dialect: &'static str,
        /// The construct that cannot be rendered.
        feature: String,
    },
}

/// Result type for this crate.
pub type Result<T> = std::result::Result<T, SqlError>;

fn describe_operands(left: &ValueType, right: &Option<ValueType>) -> String {
    match right {
        Some(right) => format!("{left} and {right}"),
        None => left.to_string(),
    }
}

fn describe_top(found: &Option<ScopeId>) -> String {
    found.map_or_else(|| String::from("an empty stack"), |id| id.to_string())
}

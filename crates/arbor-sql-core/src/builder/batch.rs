//! Batch statements: one prepared statement, many parameter rows.

use std::collections::BTreeMap;

use crate::ast::{Lifecycle, Statement};
use crate::error::{Result, SqlError};
use crate::value::{SqlValue, ToSqlValue};

/// Values for the named batch parameters of one execution.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchRow {
    values: BTreeMap<String, SqlValue>,
}

impl BatchRow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name` to `value`, replacing any earlier binding.
    #[must_use]
    pub fn bind<T: ToSqlValue>(mut self, name: impl Into<String>, value: T) -> Self {
        self.values.insert(name.into(), value.to_sql_value());
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.values.get(name)
    }
}

/// A prepared statement paired with the rows it is executed for.
///
/// The statement's SQL is rendered once; each row yields one parameter list.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchStatement {
    pub(crate) statement: Statement,
    pub(crate) rows: Vec<BatchRow>,
}

impl BatchStatement {
    /// Pairs a prepared statement with its rows.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::IllegalLifecycleTransition`] if the statement is
    /// not prepared and [`SqlError::EmptyList`] without rows.
    pub fn new(statement: impl Into<Statement>, rows: Vec<BatchRow>) -> Result<Self> {
        let statement = statement.into();
        statement
            .lifecycle()
            .require(Lifecycle::Prepared, statement.kind(), "batch")?;
        if rows.is_empty() {
            return Err(SqlError::EmptyList { operator: "batch" });
        }
        Ok(Self { statement, rows })
    }

    #[must_use]
    pub const fn statement(&self) -> &Statement {
        &self.statement
    }

    #[must_use]
    pub fn rows(&self) -> &[BatchRow] {
        &self.rows
    }
}

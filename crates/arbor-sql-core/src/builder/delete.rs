//! DELETE statement builders.
//!
//! A DELETE without a WHERE clause is refused at prepare time unless the
//! caller opts in with `unconditional()`.

use std::sync::Arc;

use tracing::{debug, warn};

use super::select::{nested_select, Select, Start};
use crate::ast::{
    DeleteStatement, Expr, Lifecycle, Predicate, SelectStatement, Selection, StatementKind,
};
use crate::error::{Result, SqlError};
use crate::schema::TableMeta;
use crate::scope::{Binding, CriteriaContext, Session};

impl DeleteStatement {
    /// Starts a DELETE from `table`, bound as `alias`.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::ContextAlreadyActive`] if `ctx` is busy.
    pub fn new(ctx: &CriteriaContext, table: &Arc<TableMeta>, alias: &str) -> Result<Self> {
        let (session, id) = Session::root(ctx, StatementKind::Delete)?;
        session.write(|stack, scope| {
            stack.register_alias(scope, alias, Binding::Table(Arc::clone(table)))
        })?;
        Ok(Self {
            session,
            id,
            lifecycle: Lifecycle::Building,
            table: Arc::clone(table),
            alias: String::from(alias),
            where_clause: vec![],
            unconditional: false,
            returning: vec![],
        })
    }

    /// Starts a SELECT nested in this statement.
    ///
    /// # Errors
    ///
    /// Fails unless the statement is building.
    pub fn sub_query(&self) -> Result<SelectStatement> {
        self.ensure_building("open a sub-query in")?;
        nested_select(&self.session)
    }

    /// Adds a WHERE predicate; multiple predicates are AND-ed.
    ///
    /// # Errors
    ///
    /// Fails unless the statement is building.
    pub fn where_clause(&mut self, predicate: Predicate) -> Result<&mut Self> {
        self.ensure_building("add a WHERE predicate to")?;
        self.where_clause.push(predicate);
        Ok(self)
    }

    /// Allows the statement to be prepared without a WHERE clause.
    ///
    /// # Errors
    ///
    /// Fails unless the statement is building.
    pub fn unconditional(&mut self) -> Result<&mut Self> {
        self.ensure_building("mark as unconditional")?;
        self.unconditional = true;
        Ok(self)
    }

    /// Adds a RETURNING column.
    ///
    /// # Errors
    ///
    /// Fails unless the statement is building. Returns
    /// [`SqlError::EmptyAlias`] or [`SqlError::DuplicateAlias`] for an alias
    /// that is empty or already returned.
    pub fn returning(&mut self, selection: Selection) -> Result<&mut Self> {
        self.ensure_building("add RETURNING to")?;
        let value_type = selection.value_type();
        self.session.write(|stack, scope| {
            stack.register_selection(scope, &selection.alias, value_type)
        })?;
        self.returning.push(selection);
        Ok(self)
    }

    /// Resolves a column of the target table.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::UnresolvedReference`] for an unknown column.
    pub fn field(&self, column: &str) -> Result<Expr> {
        let qualifier = &self.alias;
        self.session
            .read(|stack, scope| stack.resolve_field(scope, qualifier, column))
            .map(Expr::Field)
    }

    /// Validates and freezes the statement and closes its scope.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::MissingRequiredClause`] without a WHERE clause
    /// unless [`DeleteStatement::unconditional`] was called.
    pub fn prepare(&mut self) -> Result<&mut Self> {
        self.ensure_building("prepare")?;
        if self.where_clause.is_empty() {
            if !self.unconditional {
                return Err(SqlError::MissingRequiredClause {
                    kind: StatementKind::Delete,
                    clause: "a WHERE clause",
                });
            }
            warn!(table = self.table.name(), "DELETE without WHERE removes every row");
        }
        self.session.close()?;
        self.lifecycle = Lifecycle::Prepared;
        debug!(
            scope = %self.id,
            table = self.table.name(),
            predicates = self.where_clause.len(),
            "DELETE prepared"
        );
        Ok(self)
    }

    fn ensure_building(&self, action: &'static str) -> Result<()> {
        self.lifecycle
            .require(Lifecycle::Building, StatementKind::Delete, action)
    }
}

/// A consuming DELETE builder.
///
/// # Example
///
/// ```rust
/// use arbor_sql_core::builder::Delete;
/// use arbor_sql_core::schema::{ColumnMeta, TableMeta};
/// use arbor_sql_core::scope::CriteriaContext;
/// use arbor_sql_core::types::ValueType;
///
/// let sessions = TableMeta::new("sessions")
///     .column(ColumnMeta::new("id", ValueType::BigInt).primary_key())
///     .column(ColumnMeta::new("expired", ValueType::Boolean))
///     .build();
///
/// let ctx = CriteriaContext::new();
///
/// // No WHERE clause: refused.
/// assert!(Delete::from_table(&ctx, &sessions, "s")?.prepare().is_err());
///
/// let delete = Delete::from_table(&ctx, &sessions, "s")?;
/// let expired = delete.field("expired")?;
/// let statement = delete.where_clause(expired.eq(true))?.prepare()?;
/// # let _ = statement;
/// # Ok::<(), arbor_sql_core::SqlError>(())
/// ```
pub struct Delete {
    statement: DeleteStatement,
}

impl Delete {
    /// Starts a DELETE from `table`, bound as `alias`.
    ///
    /// # Errors
    ///
    /// As [`DeleteStatement::new`].
    pub fn from_table(ctx: &CriteriaContext, table: &Arc<TableMeta>, alias: &str) -> Result<Self> {
        Ok(Self {
            statement: DeleteStatement::new(ctx, table, alias)?,
        })
    }

    /// Adds a WHERE predicate.
    ///
    /// # Errors
    ///
    /// As [`DeleteStatement::where_clause`].
    pub fn where_clause(mut self, predicate: Predicate) -> Result<Self> {
        self.statement.where_clause(predicate)?;
        Ok(self)
    }

    /// Allows preparing without a WHERE clause.
    ///
    /// # Errors
    ///
    /// As [`DeleteStatement::unconditional`].
    pub fn unconditional(mut self) -> Result<Self> {
        self.statement.unconditional()?;
        Ok(self)
    }

    /// Adds a RETURNING column.
    ///
    /// # Errors
    ///
    /// As [`DeleteStatement::returning`].
    pub fn returning(mut self, selection: Selection) -> Result<Self> {
        self.statement.returning(selection)?;
        Ok(self)
    }

    /// Starts a SELECT nested in this statement.
    ///
    /// # Errors
    ///
    /// As [`DeleteStatement::sub_query`].
    pub fn sub_query(&self) -> Result<Select<Start>> {
        self.statement.sub_query().map(Select::wrap)
    }

    /// Resolves a column of the target table.
    ///
    /// # Errors
    ///
    /// As [`DeleteStatement::field`].
    pub fn field(&self, column: &str) -> Result<Expr> {
        self.statement.field(column)
    }

    /// Validates and freezes the statement.
    ///
    /// # Errors
    ///
    /// As [`DeleteStatement::prepare`].
    pub fn prepare(mut self) -> Result<DeleteStatement> {
        self.statement.prepare()?;
        Ok(self.statement)
    }
}

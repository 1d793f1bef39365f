//! INSERT statement builders.

use std::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use super::require_prepared;
use super::select::{nested_select, Select, Start};
use crate::ast::{
    Expr, InsertSource, InsertStatement, Lifecycle, Query, SelectStatement, Selection,
    StatementKind,
};
use crate::error::{Result, SqlError};
use crate::schema::TableMeta;
use crate::scope::{Binding, CriteriaContext, Session};

impl InsertStatement {
    /// Starts an INSERT into `table`.
    ///
    /// The table is bound under its own name, which RETURNING references use.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::ContextAlreadyActive`] if `ctx` is busy.
    pub fn new(ctx: &CriteriaContext, table: &Arc<TableMeta>) -> Result<Self> {
        let (session, id) = Session::root(ctx, StatementKind::Insert)?;
        session.write(|stack, scope| {
            stack.register_alias(scope, table.name(), Binding::Table(Arc::clone(table)))
        })?;
        Ok(Self {
            session,
            id,
            lifecycle: Lifecycle::Building,
            table: Arc::clone(table),
            columns: vec![],
            source: None,
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

    /// Appends a target column.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::UnresolvedReference`] for an unknown column and
    /// [`SqlError::DuplicateAlias`] for a column listed twice.
    pub fn column(&mut self, name: &str) -> Result<&mut Self> {
        self.ensure_building("add a column to")?;
        if self.source.is_some() {
            return Err(SqlError::ConflictingClause {
                kind: StatementKind::Insert,
                clause: "rows for the current column list",
            });
        }
        let column = self.table.require_column(name)?.clone();
        if self.columns.iter().any(|c| c.name == column.name) {
            return Err(SqlError::DuplicateAlias {
                alias: column.name,
                scope: self.id,
            });
        }
        self.columns.push(column);
        Ok(self)
    }

    /// Targets every column of the table, in declaration order.
    ///
    /// # Errors
    ///
    /// As [`InsertStatement::column`].
    pub fn all_columns(&mut self) -> Result<&mut Self> {
        let table = Arc::clone(&self.table);
        for column in table.columns() {
            self.column(&column.name)?;
        }
        Ok(self)
    }

    /// Appends a VALUES row.
    ///
    /// Each value is re-declared as its column's type.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::ColumnCountMismatch`] when the row width differs
    /// from the column list, [`SqlError::TypeMismatch`] when a value does not
    /// fit its column, and [`SqlError::ConflictingClause`] after
    /// [`InsertStatement::select`].
    pub fn values(&mut self, row: Vec<Expr>) -> Result<&mut Self> {
        self.ensure_building("add VALUES to")?;
        self.require_columns()?;
        if row.len() != self.columns.len() {
            return Err(SqlError::ColumnCountMismatch {
                context: "VALUES row",
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        let row = row
            .into_iter()
            .zip(&self.columns)
            .map(|(value, column)| value.coerce_strict(column.value_type, "INSERT value"))
            .collect::<Result<Vec<_>>>()?;
        match &mut self.source {
            None => self.source = Some(InsertSource::Values(vec![row])),
            Some(InsertSource::Values(rows)) => rows.push(row),
            Some(InsertSource::Query(_)) => {
                return Err(SqlError::ConflictingClause {
                    kind: StatementKind::Insert,
                    clause: "a SELECT source",
                })
            }
        }
        Ok(self)
    }

    /// Takes the rows from a prepared query.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::ColumnCountMismatch`] when the query's width
    /// differs from the column list, and [`SqlError::ConflictingClause`] if
    /// rows were already supplied.
    pub fn select(&mut self, query: impl Into<Query>) -> Result<&mut Self> {
        self.ensure_building("add a SELECT source to")?;
        self.require_columns()?;
        let query = query.into();
        require_prepared(&query, "insert from")?;
        if self.source.is_some() {
            return Err(SqlError::ConflictingClause {
                kind: StatementKind::Insert,
                clause: "a row source",
            });
        }
        if query.selection_count() != self.columns.len() {
            return Err(SqlError::ColumnCountMismatch {
                context: "INSERT ... SELECT",
                expected: self.columns.len(),
                found: query.selection_count(),
            });
        }
        self.source = Some(InsertSource::Query(Box::new(query)));
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
        let qualifier = self.table.name();
        self.session
            .read(|stack, scope| stack.resolve_field(scope, qualifier, column))
            .map(Expr::Field)
    }

    /// Validates and freezes the statement and closes its scope.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::MissingRequiredClause`] without a column list or
    /// rows, and [`SqlError::ScopeMismatch`] while a sub-query is open.
    pub fn prepare(&mut self) -> Result<&mut Self> {
        self.ensure_building("prepare")?;
        self.require_columns()?;
        let rows = match &self.source {
            None => {
                return Err(SqlError::MissingRequiredClause {
                    kind: StatementKind::Insert,
                    clause: "VALUES rows or a SELECT source",
                })
            }
            Some(InsertSource::Values(rows)) => rows.len(),
            Some(InsertSource::Query(_)) => 0,
        };
        self.session.close()?;
        self.lifecycle = Lifecycle::Prepared;
        debug!(
            scope = %self.id,
            table = self.table.name(),
            columns = self.columns.len(),
            rows,
            "INSERT prepared"
        );
        Ok(self)
    }

    fn ensure_building(&self, action: &'static str) -> Result<()> {
        self.lifecycle
            .require(Lifecycle::Building, StatementKind::Insert, action)
    }

    fn require_columns(&self) -> Result<()> {
        if self.columns.is_empty() {
            Err(SqlError::MissingRequiredClause {
                kind: StatementKind::Insert,
                clause: "a column list",
            })
        } else {
            Ok(())
        }
    }
}

// Typestate markers (zero-sized types)

/// Marker: no columns specified yet.
pub struct NoColumns;
/// Marker: columns specified, no rows yet.
pub struct HasColumns;
/// Marker: rows (or a SELECT source) supplied.
pub struct HasRows;

/// An INSERT builder using the typestate pattern.
///
/// `prepare()` is only available once columns and rows are supplied.
pub struct Insert<S> {
    statement: InsertStatement,
    _state: PhantomData<S>,
}

impl Insert<NoColumns> {
    /// Starts an INSERT into `table`.
    ///
    /// # Errors
    ///
    /// As [`InsertStatement::new`].
    pub fn new(ctx: &CriteriaContext, table: &Arc<TableMeta>) -> Result<Self> {
        Ok(Self {
            statement: InsertStatement::new(ctx, table)?,
            _state: PhantomData,
        })
    }

    /// Specifies the target columns.
    ///
    /// # Errors
    ///
    /// As [`InsertStatement::column`].
    pub fn columns(mut self, columns: &[&str]) -> Result<Insert<HasColumns>> {
        for column in columns {
            self.statement.column(column)?;
        }
        Ok(self.transition())
    }

    /// Targets every column of the table.
    ///
    /// # Errors
    ///
    /// As [`InsertStatement::all_columns`].
    pub fn all_columns(mut self) -> Result<Insert<HasColumns>> {
        self.statement.all_columns()?;
        Ok(self.transition())
    }
}

impl Insert<HasColumns> {
    /// Supplies the first row.
    ///
    /// # Errors
    ///
    /// As [`InsertStatement::values`].
    pub fn values(mut self, row: Vec<Expr>) -> Result<Insert<HasRows>> {
        self.statement.values(row)?;
        Ok(self.transition())
    }

    /// Takes the rows from a query.
    ///
    /// # Errors
    ///
    /// As [`InsertStatement::select`].
    pub fn select(mut self, query: impl Into<Query>) -> Result<Insert<HasRows>> {
        self.statement.select(query)?;
        Ok(self.transition())
    }
}

impl Insert<HasRows> {
    /// Supplies another row.
    ///
    /// # Errors
    ///
    /// As [`InsertStatement::values`].
    pub fn values(mut self, row: Vec<Expr>) -> Result<Self> {
        self.statement.values(row)?;
        Ok(self)
    }

    /// Adds a RETURNING column.
    ///
    /// # Errors
    ///
    /// As [`InsertStatement::returning`].
    pub fn returning(mut self, selection: Selection) -> Result<Self> {
        self.statement.returning(selection)?;
        Ok(self)
    }

    /// Validates and freezes the statement.
    ///
    /// # Errors
    ///
    /// As [`InsertStatement::prepare`].
    pub fn prepare(mut self) -> Result<InsertStatement> {
        self.statement.prepare()?;
        Ok(self.statement)
    }
}

impl<S> Insert<S> {
    /// Starts a SELECT nested in this statement, e.g. for `INSERT ... SELECT`.
    ///
    /// # Errors
    ///
    /// As [`InsertStatement::sub_query`].
    pub fn sub_query(&self) -> Result<Select<Start>> {
        self.statement.sub_query().map(Select::wrap)
    }

    /// Resolves a column of the target table.
    ///
    /// # Errors
    ///
    /// As [`InsertStatement::field`].
    pub fn field(&self, column: &str) -> Result<Expr> {
        self.statement.field(column)
    }

    fn transition<T>(self) -> Insert<T> {
        Insert {
            statement: self.statement,
            _state: PhantomData,
        }
    }
}

//! UPDATE statement builders.

use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{debug, warn};

use super::select::{nested_select, Select, Start};
use crate::ast::{
    Assignment, Expr, FieldRef, Lifecycle, Predicate, SelectStatement, Selection, StatementKind,
    UpdateStatement,
};
use crate::error::{Result, SqlError};
use crate::schema::TableMeta;
use crate::scope::{Binding, CriteriaContext, Session};
use crate::value::{SqlValue, TypedValue};

impl UpdateStatement {
    /// Starts an UPDATE of `table`, bound as `alias`.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::ContextAlreadyActive`] if `ctx` is busy.
    pub fn new(ctx: &CriteriaContext, table: &Arc<TableMeta>, alias: &str) -> Result<Self> {
        let (session, id) = Session::root(ctx, StatementKind::Update)?;
        session.write(|stack, scope| {
            stack.register_alias(scope, alias, Binding::Table(Arc::clone(table)))
        })?;
        Ok(Self {
            session,
            id,
            lifecycle: Lifecycle::Building,
            table: Arc::clone(table),
            alias: String::from(alias),
            assignments: vec![],
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

    /// Adds `column = value`.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::NonUpdatableColumn`] for primary-key and version
    /// columns, [`SqlError::DuplicateAlias`] for a column assigned twice and
    /// [`SqlError::TypeMismatch`] when the value does not fit the column.
    pub fn set(&mut self, column: &str, value: impl Into<Expr>) -> Result<&mut Self> {
        self.ensure_building("add an assignment to")?;
        let column = self.table.require_column(column)?.clone();
        if !column.is_assignable() {
            return Err(SqlError::NonUpdatableColumn {
                table: column.table,
                column: column.name,
            });
        }
        if self.assignments.iter().any(|a| a.column.name == column.name) {
            return Err(SqlError::DuplicateAlias {
                alias: column.name,
                scope: self.id,
            });
        }
        let value = value.into().coerce_strict(column.value_type, "assignment")?;
        self.assignments.push(Assignment { column, value });
        Ok(self)
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

    /// Resolves a column of the updated table.
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
    /// A table with a version column gets `version = version + 1` appended to
    /// its assignments.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::MissingRequiredClause`] without assignments, or
    /// without a WHERE clause unless [`UpdateStatement::unconditional`] was
    /// called.
    pub fn prepare(&mut self) -> Result<&mut Self> {
        self.ensure_building("prepare")?;
        if self.assignments.is_empty() {
            return Err(SqlError::MissingRequiredClause {
                kind: StatementKind::Update,
                clause: "at least one assignment",
            });
        }
        if self.where_clause.is_empty() && !self.unconditional {
            return Err(SqlError::MissingRequiredClause {
                kind: StatementKind::Update,
                clause: "a WHERE clause",
            });
        }
        let bump = self.version_bump()?;
        self.session.close()?;
        if let Some(bump) = bump {
            self.assignments.push(bump);
        }
        if self.unconditional && self.where_clause.is_empty() {
            warn!(table = self.table.name(), "UPDATE without WHERE affects every row");
        }
        self.lifecycle = Lifecycle::Prepared;
        debug!(
            scope = %self.id,
            table = self.table.name(),
            assignments = self.assignments.len(),
            "UPDATE prepared"
        );
        Ok(self)
    }

    fn ensure_building(&self, action: &'static str) -> Result<()> {
        self.lifecycle
            .require(Lifecycle::Building, StatementKind::Update, action)
    }

    fn version_bump(&self) -> Result<Option<Assignment>> {
        let Some(version) = self.table.version_column() else {
            return Ok(None);
        };
        let current = Expr::Field(FieldRef {
            qualifier: self.alias.clone(),
            column: version.name.clone(),
            value_type: version.value_type,
            nullable: version.nullable,
            depth: 0,
        });
        let one = TypedValue::new(version.value_type, SqlValue::Int(1))?;
        Ok(Some(Assignment {
            column: version.clone(),
            value: current.plus(Expr::Literal(one))?,
        }))
    }
}

// Typestate markers (zero-sized types)

/// Marker: no SET clause yet.
pub struct NoSet;
/// Marker: at least one assignment.
pub struct HasSet;

/// An UPDATE builder using the typestate pattern.
///
/// `prepare()` is only available after at least one `set()`.
pub struct Update<S> {
    statement: UpdateStatement,
    _state: PhantomData<S>,
}

impl Update<NoSet> {
    /// Starts an UPDATE of `table`, bound as `alias`.
    ///
    /// # Errors
    ///
    /// As [`UpdateStatement::new`].
    pub fn new(ctx: &CriteriaContext, table: &Arc<TableMeta>, alias: &str) -> Result<Self> {
        Ok(Self {
            statement: UpdateStatement::new(ctx, table, alias)?,
            _state: PhantomData,
        })
    }
}

impl<S> Update<S> {
    /// Adds `column = value`.
    ///
    /// # Errors
    ///
    /// As [`UpdateStatement::set`].
    pub fn set(mut self, column: &str, value: impl Into<Expr>) -> Result<Update<HasSet>> {
        self.statement.set(column, value)?;
        Ok(Update {
            statement: self.statement,
            _state: PhantomData,
        })
    }

    /// Adds a WHERE predicate.
    ///
    /// # Errors
    ///
    /// As [`UpdateStatement::where_clause`].
    pub fn where_clause(mut self, predicate: Predicate) -> Result<Self> {
        self.statement.where_clause(predicate)?;
        Ok(self)
    }

    /// Starts a SELECT nested in this statement.
    ///
    /// # Errors
    ///
    /// As [`UpdateStatement::sub_query`].
    pub fn sub_query(&self) -> Result<Select<Start>> {
        self.statement.sub_query().map(Select::wrap)
    }

    /// Resolves a column of the updated table.
    ///
    /// # Errors
    ///
    /// As [`UpdateStatement::field`].
    pub fn field(&self, column: &str) -> Result<Expr> {
        self.statement.field(column)
    }
}

impl Update<HasSet> {
    /// Allows preparing without a WHERE clause.
    ///
    /// # Errors
    ///
    /// As [`UpdateStatement::unconditional`].
    pub fn unconditional(mut self) -> Result<Self> {
        self.statement.unconditional()?;
        Ok(self)
    }

    /// Adds a RETURNING column.
    ///
    /// # Errors
    ///
    /// As [`UpdateStatement::returning`].
    pub fn returning(mut self, selection: Selection) -> Result<Self> {
        self.statement.returning(selection)?;
        Ok(self)
    }

    /// Validates and freezes the statement.
    ///
    /// # Errors
    ///
    /// As [`UpdateStatement::prepare`].
    pub fn prepare(mut self) -> Result<UpdateStatement> {
        self.statement.prepare()?;
        Ok(self.statement)
    }
}

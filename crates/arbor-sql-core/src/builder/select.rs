//! SELECT statement builders.
//!
//! [`SelectStatement`] carries the dynamic API: `&mut self` methods checked
//! at runtime. [`Select`] wraps it in a typestate so that clause ordering
//! mistakes (an ON without a join, a LIMIT before any selection, preparing a
//! statement with nothing selected) are compile errors.

use std::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use super::{require_prepared, selection_infos};
use crate::ast::{
    map_columns, Cte, CteColumn, Expr, Join, JoinType, Lifecycle, LockMode, OrderBy,
    OrderDirection, Predicate, Query, SelectStatement, Selection, StatementKind, TableRef,
};
use crate::error::{Result, SqlError};
use crate::schema::TableMeta;
use crate::scope::{Binding, CriteriaContext, Lookup, Session};
use crate::types::{self, ValueType};

impl SelectStatement {
    /// Starts a top-level SELECT in `ctx`.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::ContextAlreadyActive`] if `ctx` is building
    /// another top-level statement.
    pub fn new(ctx: &CriteriaContext) -> Result<Self> {
        let (session, id) = Session::root(ctx, StatementKind::Select)?;
        Ok(Self::empty(session, id))
    }

    /// Starts a SELECT nested in this one.
    ///
    /// The sub-query must be prepared before this statement is.
    ///
    /// # Errors
    ///
    /// Fails if this statement is not building or another sub-query is open.
    pub fn sub_query(&self) -> Result<Self> {
        self.ensure_building("open a sub-query in")?;
        nested_select(&self.session)
    }

    /// Adds a common table expression.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::DuplicateAlias`] if the name is already declared
    /// by this statement.
    pub fn with_cte(&mut self, cte: Cte) -> Result<&mut Self> {
        self.ensure_building("add a CTE to")?;
        let columns = Arc::clone(&cte.columns);
        self.session
            .write(|stack, scope| stack.register_cte(scope, &cte.name, columns))?;
        self.ctes.push(cte);
        Ok(self)
    }

    /// Adds a recursive CTE.
    ///
    /// The name and column types are declared first so that `body`, which
    /// builds the CTE's query as a sub-query of `self`, can reference the CTE.
    ///
    /// # Errors
    ///
    /// Fails if `body` fails, if the body's column count differs from
    /// `columns`, or if a body column's type conflicts with its declaration.
    pub fn with_recursive_cte<F>(
        &mut self,
        name: &str,
        columns: &[(&str, ValueType)],
        body: F,
    ) -> Result<&mut Self>
    where
        F: FnOnce(&Self) -> Result<Query>,
    {
        self.ensure_building("add a CTE to")?;
        let declared: Arc<[_]> = columns
            .iter()
            .enumerate()
            .map(|(source, (column, value_type))| CteColumn {
                name: String::from(*column),
                value_type: *value_type,
                source,
            })
            .collect();
        self.session
            .write(|stack, scope| stack.register_cte(scope, name, Arc::clone(&declared)))?;
        let built = body(self).and_then(|query| {
            require_prepared(&query, "use as a CTE")?;
            let names: Vec<String> = declared.iter().map(|c| c.name.clone()).collect();
            let mapped = map_columns(&names, query.selections())?;
            for (declared, found) in declared.iter().zip(mapped.iter()) {
                types::common_type("recursive CTE", declared.value_type, found.value_type)?;
            }
            Cte::assemble(String::from(name), Arc::clone(&declared), true, query, true)
        });
        match built {
            Ok(cte) => {
                self.ctes.push(cte);
                Ok(self)
            }
            Err(err) => {
                // The name must not outlive a CTE that was never added.
                self.session.write(|stack, scope| {
                    stack.unregister_cte(scope, name);
                    Ok(())
                })?;
                Err(err)
            }
        }
    }

    /// Sets the FROM source to a base table.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::ConflictingClause`] if FROM is already set, and
    /// alias registration errors.
    pub fn from_table(&mut self, table: &Arc<TableMeta>, alias: &str) -> Result<&mut Self> {
        let source = TableRef::Table {
            table: Arc::clone(table),
            alias: String::from(alias),
        };
        self.set_from(source, Binding::Table(Arc::clone(table)))
    }

    /// Sets the FROM source to a prepared sub-query.
    ///
    /// # Errors
    ///
    /// As [`SelectStatement::from_table`]; the query must be prepared.
    pub fn from_query(&mut self, query: impl Into<Query>, alias: &str) -> Result<&mut Self> {
        let query = query.into();
        require_prepared(&query, "use as a derived table")?;
        let binding = Binding::Derived(selection_infos(&query));
        let source = TableRef::Derived {
            query: Box::new(query),
            alias: String::from(alias),
        };
        self.set_from(source, binding)
    }

    /// Sets the FROM source to a CTE visible from this statement.
    ///
    /// # Errors
    ///
    /// As [`SelectStatement::from_table`]; the CTE must be declared by this
    /// statement or an enclosing one.
    pub fn from_cte(&mut self, name: &str, alias: &str) -> Result<&mut Self> {
        let binding = self.cte_binding(name)?;
        let source = TableRef::Cte {
            name: String::from(name),
            alias: String::from(alias),
        };
        self.set_from(source, binding)
    }

    /// Adds a join against a base table; follow with [`SelectStatement::on`]
    /// unless `join_type` is [`JoinType::Cross`].
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::MissingRequiredClause`] before a FROM source is
    /// set, and alias registration errors.
    pub fn join_table(
        &mut self,
        join_type: JoinType,
        table: &Arc<TableMeta>,
        alias: &str,
    ) -> Result<&mut Self> {
        let target = TableRef::Table {
            table: Arc::clone(table),
            alias: String::from(alias),
        };
        self.add_join(join_type, target, Binding::Table(Arc::clone(table)))
    }

    /// Adds a join against a prepared sub-query.
    ///
    /// # Errors
    ///
    /// As [`SelectStatement::join_table`].
    pub fn join_query(
        &mut self,
        join_type: JoinType,
        query: impl Into<Query>,
        alias: &str,
    ) -> Result<&mut Self> {
        let query = query.into();
        require_prepared(&query, "join")?;
        let binding = Binding::Derived(selection_infos(&query));
        let target = TableRef::Derived {
            query: Box::new(query),
            alias: String::from(alias),
        };
        self.add_join(join_type, target, binding)
    }

    /// Adds a join against a CTE.
    ///
    /// # Errors
    ///
    /// As [`SelectStatement::join_table`].
    pub fn join_cte(&mut self, join_type: JoinType, name: &str, alias: &str) -> Result<&mut Self> {
        let binding = self.cte_binding(name)?;
        let target = TableRef::Cte {
            name: String::from(name),
            alias: String::from(alias),
        };
        self.add_join(join_type, target, binding)
    }

    /// Sets the ON condition of the most recent join.
    ///
    /// # Errors
    ///
    /// Fails without a pending join, on a CROSS join, or if the join already
    /// has a condition.
    pub fn on(&mut self, condition: Predicate) -> Result<&mut Self> {
        self.ensure_building("add a join condition to")?;
        let join = self
            .joins
            .last_mut()
            .ok_or(SqlError::MissingRequiredClause {
                kind: StatementKind::Select,
                clause: "a join before ON",
            })?;
        if join.join_type == JoinType::Cross || join.on.is_some() {
            return Err(SqlError::ConflictingClause {
                kind: StatementKind::Select,
                clause: "a complete join",
            });
        }
        join.on = Some(condition);
        Ok(self)
    }

    /// Adds an output column.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::DuplicateAlias`] or [`SqlError::EmptyAlias`].
    pub fn select(&mut self, selection: Selection) -> Result<&mut Self> {
        self.ensure_building("add a selection to")?;
        let value_type = selection.value_type();
        self.session.write(|stack, scope| {
            stack.register_selection(scope, &selection.alias, value_type)
        })?;
        self.selections.push(selection);
        Ok(self)
    }

    /// Selects `qualifier.column` under the column's own name.
    ///
    /// # Errors
    ///
    /// Fails if the column cannot be resolved, or as [`SelectStatement::select`].
    pub fn select_column(&mut self, qualifier: &str, column: &str) -> Result<&mut Self> {
        let expr = self.field(qualifier, column)?;
        self.select(Selection::new(expr, column))
    }

    /// Turns the statement into `SELECT DISTINCT`.
    ///
    /// # Errors
    ///
    /// Fails unless the statement is building.
    pub fn distinct(&mut self) -> Result<&mut Self> {
        self.ensure_building("add DISTINCT to")?;
        self.distinct = true;
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

    /// Adds a GROUP BY expression.
    ///
    /// # Errors
    ///
    /// Fails unless the statement is building.
    pub fn group_by(&mut self, expr: impl Into<Expr>) -> Result<&mut Self> {
        self.ensure_building("add GROUP BY to")?;
        self.group_by.push(expr.into());
        Ok(self)
    }

    /// Adds a HAVING predicate; multiple predicates are AND-ed.
    ///
    /// # Errors
    ///
    /// Fails unless the statement is building.
    pub fn having(&mut self, predicate: Predicate) -> Result<&mut Self> {
        self.ensure_building("add HAVING to")?;
        self.having.push(predicate);
        Ok(self)
    }

    /// Adds an ORDER BY entry.
    ///
    /// # Errors
    ///
    /// Fails unless the statement is building.
    pub fn order_by(&mut self, order: OrderBy) -> Result<&mut Self> {
        self.ensure_building("add ORDER BY to")?;
        self.order_by.push(order);
        Ok(self)
    }

    /// Sets LIMIT.
    ///
    /// # Errors
    ///
    /// Fails unless the statement is building.
    pub fn limit(&mut self, limit: u64) -> Result<&mut Self> {
        self.ensure_building("add LIMIT to")?;
        self.limit = Some(limit);
        Ok(self)
    }

    /// Sets OFFSET.
    ///
    /// # Errors
    ///
    /// Fails unless the statement is building.
    pub fn offset(&mut self, offset: u64) -> Result<&mut Self> {
        self.ensure_building("add OFFSET to")?;
        self.offset = Some(offset);
        Ok(self)
    }

    /// Adds a row-locking clause.
    ///
    /// # Errors
    ///
    /// Fails unless the statement is building.
    pub fn lock(&mut self, mode: LockMode) -> Result<&mut Self> {
        self.ensure_building("add a locking clause to")?;
        self.lock = Some(mode);
        Ok(self)
    }

    /// Resolves `qualifier.column` against this statement's own sources.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::UnresolvedReference`]; aliases of enclosing
    /// statements are not searched, see [`SelectStatement::outer_field`].
    pub fn field(&self, qualifier: &str, column: &str) -> Result<Expr> {
        self.session
            .read(|stack, scope| stack.resolve_field(scope, qualifier, column))
            .map(Expr::Field)
    }

    /// Resolves a correlated reference to an enclosing statement's source.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::UnresolvedReference`] if no open enclosing
    /// statement binds the qualifier.
    pub fn outer_field(&self, qualifier: &str, column: &str) -> Result<Expr> {
        self.session
            .read(|stack, scope| stack.resolve_outer_field(scope, qualifier, column))
            .map(Expr::Field)
    }

    /// References one of this statement's selection aliases.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::UnresolvedReference`] for an unknown alias.
    pub fn selection_ref(&self, name: &str) -> Result<Expr> {
        self.session
            .read(|stack, scope| stack.resolve_selection_alias(scope, name, Lookup::Current))
            .map(Expr::Selection)
    }

    /// References a selection alias of this or an enclosing statement.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::UnresolvedReference`] for an unknown alias.
    pub fn outer_selection_ref(&self, name: &str) -> Result<Expr> {
        self.session
            .read(|stack, scope| stack.resolve_selection_alias(scope, name, Lookup::Enclosing))
            .map(Expr::Selection)
    }

    /// Validates and freezes the statement and closes its scope.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::MissingRequiredClause`] when nothing is selected
    /// or a join lacks its condition, and [`SqlError::ScopeMismatch`] while
    /// a sub-query is still open. On error the statement stays building.
    pub fn prepare(&mut self) -> Result<&mut Self> {
        self.ensure_building("prepare")?;
        if self.selections.is_empty() {
            return Err(SqlError::MissingRequiredClause {
                kind: StatementKind::Select,
                clause: "at least one selection",
            });
        }
        if self
            .joins
            .iter()
            .any(|j| j.join_type != JoinType::Cross && j.on.is_none())
        {
            return Err(SqlError::MissingRequiredClause {
                kind: StatementKind::Select,
                clause: "an ON condition for every join",
            });
        }
        self.session.close()?;
        self.lifecycle = Lifecycle::Prepared;
        debug!(
            scope = %self.id,
            selections = self.selections.len(),
            joins = self.joins.len(),
            ctes = self.ctes.len(),
            "SELECT prepared"
        );
        Ok(self)
    }

    fn ensure_building(&self, action: &'static str) -> Result<()> {
        self.lifecycle
            .require(Lifecycle::Building, StatementKind::Select, action)
    }

    fn set_from(&mut self, source: TableRef, binding: Binding) -> Result<&mut Self> {
        self.ensure_building("add a FROM source to")?;
        if self.from.is_some() {
            return Err(SqlError::ConflictingClause {
                kind: StatementKind::Select,
                clause: "a FROM source",
            });
        }
        self.session
            .write(|stack, scope| stack.register_alias(scope, source.alias(), binding))?;
        self.from = Some(source);
        Ok(self)
    }

    fn add_join(&mut self, join_type: JoinType, table: TableRef, binding: Binding) -> Result<&mut Self> {
        self.ensure_building("add a join to")?;
        if self.from.is_none() {
            return Err(SqlError::MissingRequiredClause {
                kind: StatementKind::Select,
                clause: "a FROM source before joins",
            });
        }
        self.session
            .write(|stack, scope| stack.register_alias(scope, table.alias(), binding))?;
        self.joins.push(Join {
            join_type,
            table,
            on: None,
        });
        Ok(self)
    }

    fn cte_binding(&self, name: &str) -> Result<Binding> {
        let columns = self
            .session
            .read(|stack, scope| stack.resolve_cte(scope, name))?;
        Ok(Binding::Cte {
            name: String::from(name),
            columns,
        })
    }
}

/// Opens a SELECT nested in the statement owning `session`.
pub(crate) fn nested_select(session: &Session) -> Result<SelectStatement> {
    let (session, id) = session.nested(StatementKind::Select)?;
    Ok(SelectStatement::empty(session, id))
}

// Typestate markers (zero-sized types)

/// Marker: nothing added yet.
pub struct Start;
/// Marker: a FROM source is set and no join is pending.
pub struct Sourced;
/// Marker: a join awaits its ON condition.
pub struct Joining;
/// Marker: at least one column is selected.
pub struct Projected;
/// Marker: LIMIT is set.
pub struct Limited;

/// States in which WHERE, GROUP BY and HAVING may be added.
pub trait Filterable {}
impl Filterable for Sourced {}
impl Filterable for Projected {}

/// States in which the statement may be prepared.
pub trait Complete {}
impl Complete for Projected {}
impl Complete for Limited {}

/// A SELECT builder whose clause order is checked at compile time.
///
/// # Example
///
/// ```rust
/// use arbor_sql_core::builder::Select;
/// use arbor_sql_core::schema::{ColumnMeta, TableMeta};
/// use arbor_sql_core::scope::CriteriaContext;
/// use arbor_sql_core::types::ValueType;
///
/// let users = TableMeta::new("users")
///     .column(ColumnMeta::new("id", ValueType::BigInt).primary_key())
///     .column(ColumnMeta::new("name", ValueType::Varchar))
///     .build();
///
/// let ctx = CriteriaContext::new();
/// let select = Select::new(&ctx)?.from(&users, "u")?;
/// let id = select.field("u", "id")?;
/// let statement = select
///     .columns("u", &["id", "name"])?
///     .where_clause(id.gt(10_i64))?
///     .prepare()?;
/// assert_eq!(statement.selections().len(), 2);
/// assert!(!ctx.is_active());
/// # Ok::<(), arbor_sql_core::SqlError>(())
/// ```
pub struct Select<S> {
    statement: SelectStatement,
    _state: PhantomData<S>,
}

impl Select<Start> {
    /// Starts a top-level SELECT.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::ContextAlreadyActive`] if `ctx` is busy.
    pub fn new(ctx: &CriteriaContext) -> Result<Self> {
        SelectStatement::new(ctx).map(Self::wrap)
    }

    /// Adds a CTE.
    ///
    /// # Errors
    ///
    /// As [`SelectStatement::with_cte`].
    pub fn with(mut self, cte: Cte) -> Result<Self> {
        self.statement.with_cte(cte)?;
        Ok(self)
    }

    /// Starts a typestate SELECT nested in a dynamic statement, e.g. the
    /// body of a recursive CTE.
    ///
    /// # Errors
    ///
    /// As [`SelectStatement::sub_query`].
    pub fn nested(parent: &SelectStatement) -> Result<Self> {
        parent.sub_query().map(Self::wrap)
    }

    /// Adds a recursive CTE; see [`SelectStatement::with_recursive_cte`].
    /// Build the body with [`Select::nested`].
    ///
    /// # Errors
    ///
    /// As [`SelectStatement::with_recursive_cte`].
    pub fn with_recursive<F>(
        mut self,
        name: &str,
        columns: &[(&str, ValueType)],
        body: F,
    ) -> Result<Self>
    where
        F: FnOnce(&SelectStatement) -> Result<Query>,
    {
        self.statement.with_recursive_cte(name, columns, body)?;
        Ok(self)
    }

    /// FROM a base table.
    ///
    /// # Errors
    ///
    /// As [`SelectStatement::from_table`].
    pub fn from(mut self, table: &Arc<TableMeta>, alias: &str) -> Result<Select<Sourced>> {
        self.statement.from_table(table, alias)?;
        Ok(self.transition())
    }

    /// FROM a derived table.
    ///
    /// # Errors
    ///
    /// As [`SelectStatement::from_query`].
    pub fn from_query(mut self, query: impl Into<Query>, alias: &str) -> Result<Select<Sourced>> {
        self.statement.from_query(query, alias)?;
        Ok(self.transition())
    }

    /// FROM a CTE.
    ///
    /// # Errors
    ///
    /// As [`SelectStatement::from_cte`].
    pub fn from_cte(mut self, name: &str, alias: &str) -> Result<Select<Sourced>> {
        self.statement.from_cte(name, alias)?;
        Ok(self.transition())
    }

    /// Selects without a FROM clause (`SELECT 1`).
    ///
    /// # Errors
    ///
    /// As [`SelectStatement::select`].
    pub fn select(mut self, selection: Selection) -> Result<Select<Projected>> {
        self.statement.select(selection)?;
        Ok(self.transition())
    }
}

impl Select<Sourced> {
    /// INNER JOIN a base table.
    ///
    /// # Errors
    ///
    /// As [`SelectStatement::join_table`].
    pub fn join(self, table: &Arc<TableMeta>, alias: &str) -> Result<Select<Joining>> {
        self.join_with(JoinType::Inner, table, alias)
    }

    /// LEFT JOIN a base table.
    ///
    /// # Errors
    ///
    /// As [`SelectStatement::join_table`].
    pub fn left_join(self, table: &Arc<TableMeta>, alias: &str) -> Result<Select<Joining>> {
        self.join_with(JoinType::Left, table, alias)
    }

    /// RIGHT JOIN a base table.
    ///
    /// # Errors
    ///
    /// As [`SelectStatement::join_table`].
    pub fn right_join(self, table: &Arc<TableMeta>, alias: &str) -> Result<Select<Joining>> {
        self.join_with(JoinType::Right, table, alias)
    }

    /// FULL JOIN a base table.
    ///
    /// # Errors
    ///
    /// As [`SelectStatement::join_table`].
    pub fn full_join(self, table: &Arc<TableMeta>, alias: &str) -> Result<Select<Joining>> {
        self.join_with(JoinType::Full, table, alias)
    }

    /// Joins a derived table.
    ///
    /// # Errors
    ///
    /// As [`SelectStatement::join_query`].
    pub fn join_query(
        mut self,
        join_type: JoinType,
        query: impl Into<Query>,
        alias: &str,
    ) -> Result<Select<Joining>> {
        self.statement.join_query(join_type, query, alias)?;
        Ok(self.transition())
    }

    /// Joins a CTE.
    ///
    /// # Errors
    ///
    /// As [`SelectStatement::join_cte`].
    pub fn join_cte(mut self, join_type: JoinType, name: &str, alias: &str) -> Result<Select<Joining>> {
        self.statement.join_cte(join_type, name, alias)?;
        Ok(self.transition())
    }

    /// CROSS JOIN a base table.
    ///
    /// # Errors
    ///
    /// As [`SelectStatement::join_table`].
    pub fn cross_join(mut self, table: &Arc<TableMeta>, alias: &str) -> Result<Self> {
        self.statement.join_table(JoinType::Cross, table, alias)?;
        Ok(self)
    }

    /// Adds the first output column.
    ///
    /// # Errors
    ///
    /// As [`SelectStatement::select`].
    pub fn select(mut self, selection: Selection) -> Result<Select<Projected>> {
        self.statement.select(selection)?;
        Ok(self.transition())
    }

    /// Selects several columns of one source under their own names.
    ///
    /// # Errors
    ///
    /// As [`SelectStatement::select_column`].
    pub fn columns(mut self, qualifier: &str, columns: &[&str]) -> Result<Select<Projected>> {
        for column in columns {
            self.statement.select_column(qualifier, column)?;
        }
        Ok(self.transition())
    }

    fn join_with(
        mut self,
        join_type: JoinType,
        table: &Arc<TableMeta>,
        alias: &str,
    ) -> Result<Select<Joining>> {
        self.statement.join_table(join_type, table, alias)?;
        Ok(self.transition())
    }
}

impl Select<Joining> {
    /// Sets the join condition.
    ///
    /// # Errors
    ///
    /// As [`SelectStatement::on`].
    pub fn on(mut self, condition: Predicate) -> Result<Select<Sourced>> {
        self.statement.on(condition)?;
        Ok(self.transition())
    }
}

impl<S: Filterable> Select<S> {
    /// Adds a WHERE predicate.
    ///
    /// # Errors
    ///
    /// As [`SelectStatement::where_clause`].
    pub fn where_clause(mut self, predicate: Predicate) -> Result<Self> {
        self.statement.where_clause(predicate)?;
        Ok(self)
    }

    /// Adds a GROUP BY expression.
    ///
    /// # Errors
    ///
    /// As [`SelectStatement::group_by`].
    pub fn group_by(mut self, expr: impl Into<Expr>) -> Result<Self> {
        self.statement.group_by(expr)?;
        Ok(self)
    }

    /// Adds a HAVING predicate.
    ///
    /// # Errors
    ///
    /// As [`SelectStatement::having`].
    pub fn having(mut self, predicate: Predicate) -> Result<Self> {
        self.statement.having(predicate)?;
        Ok(self)
    }
}

impl Select<Projected> {
    /// Adds another output column.
    ///
    /// # Errors
    ///
    /// As [`SelectStatement::select`].
    pub fn select(mut self, selection: Selection) -> Result<Self> {
        self.statement.select(selection)?;
        Ok(self)
    }

    /// Selects more columns of one source.
    ///
    /// # Errors
    ///
    /// As [`SelectStatement::select_column`].
    pub fn columns(mut self, qualifier: &str, columns: &[&str]) -> Result<Self> {
        for column in columns {
            self.statement.select_column(qualifier, column)?;
        }
        Ok(self)
    }

    /// `SELECT DISTINCT`
    ///
    /// # Errors
    ///
    /// As [`SelectStatement::distinct`].
    pub fn distinct(mut self) -> Result<Self> {
        self.statement.distinct()?;
        Ok(self)
    }

    /// Sets LIMIT.
    ///
    /// # Errors
    ///
    /// As [`SelectStatement::limit`].
    pub fn limit(mut self, limit: u64) -> Result<Select<Limited>> {
        self.statement.limit(limit)?;
        Ok(self.transition())
    }
}

impl<S: Complete> Select<S> {
    /// Adds an ORDER BY entry.
    ///
    /// # Errors
    ///
    /// As [`SelectStatement::order_by`].
    pub fn order_by(mut self, order: OrderBy) -> Result<Self> {
        self.statement.order_by(order)?;
        Ok(self)
    }

    /// Orders by one of the statement's selection aliases.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::UnresolvedReference`] for an unknown alias.
    pub fn order_by_selection(mut self, alias: &str, direction: OrderDirection) -> Result<Self> {
        let expr = self.statement.selection_ref(alias)?;
        self.statement.order_by(OrderBy::new(expr, direction))?;
        Ok(self)
    }

    /// Sets OFFSET.
    ///
    /// # Errors
    ///
    /// As [`SelectStatement::offset`].
    pub fn offset(mut self, offset: u64) -> Result<Self> {
        self.statement.offset(offset)?;
        Ok(self)
    }

    /// Adds a row-locking clause.
    ///
    /// # Errors
    ///
    /// As [`SelectStatement::lock`].
    pub fn lock(mut self, mode: LockMode) -> Result<Self> {
        self.statement.lock(mode)?;
        Ok(self)
    }

    /// Validates and freezes the statement.
    ///
    /// # Errors
    ///
    /// As [`SelectStatement::prepare`].
    pub fn prepare(mut self) -> Result<SelectStatement> {
        self.statement.prepare()?;
        Ok(self.statement)
    }
}

impl<S> Select<S> {
    /// Starts a SELECT nested in this one.
    ///
    /// # Errors
    ///
    /// As [`SelectStatement::sub_query`].
    pub fn sub_query(&self) -> Result<Select<Start>> {
        self.statement.sub_query().map(Select::wrap)
    }

    /// Resolves a column of this statement's sources.
    ///
    /// # Errors
    ///
    /// As [`SelectStatement::field`].
    pub fn field(&self, qualifier: &str, column: &str) -> Result<Expr> {
        self.statement.field(qualifier, column)
    }

    /// Resolves a correlated reference.
    ///
    /// # Errors
    ///
    /// As [`SelectStatement::outer_field`].
    pub fn outer_field(&self, qualifier: &str, column: &str) -> Result<Expr> {
        self.statement.outer_field(qualifier, column)
    }

    /// References a selection alias of this statement.
    ///
    /// # Errors
    ///
    /// As [`SelectStatement::selection_ref`].
    pub fn selection_ref(&self, name: &str) -> Result<Expr> {
        self.statement.selection_ref(name)
    }

    /// References a selection alias of this or an enclosing statement.
    ///
    /// # Errors
    ///
    /// As [`SelectStatement::outer_selection_ref`].
    pub fn outer_selection_ref(&self, name: &str) -> Result<Expr> {
        self.statement.outer_selection_ref(name)
    }

    /// Gives up the typestate and returns the dynamic statement.
    #[must_use]
    pub fn into_statement(self) -> SelectStatement {
        self.statement
    }

    pub(crate) const fn wrap(statement: SelectStatement) -> Self {
        Self {
            statement,
            _state: PhantomData,
        }
    }

    fn transition<T>(self) -> Select<T> {
        Select {
            statement: self.statement,
            _state: PhantomData,
        }
    }
}

//! Statement nodes.
//!
//! The structs here are the dynamic form of every statement: the builders in
//! [`crate::builder`] fill them in, the renderer reads them. Clause fields are
//! crate-private so that a statement can only change through methods that
//! check its [`Lifecycle`].

use std::fmt;
use std::sync::Arc;

use super::expression::{Expr, Predicate};
use crate::error::{Result, SqlError};
use crate::schema::{ColumnMeta, TableMeta};
use crate::scope::{ScopeId, Session};
use crate::types::ValueType;

/// The statement kinds the builder produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    /// A set operation over two queries.
    Compound,
    /// A prepared statement paired with parameter rows.
    Batch,
}

impl StatementKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Select => "SELECT",
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Compound => "COMPOUND",
            Self::Batch => "BATCH",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a statement: `Building -> Prepared -> Cleared`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lifecycle {
    /// Clauses may be added.
    #[default]
    Building,
    /// Validated and frozen; may be rendered.
    Prepared,
    /// Contents released; terminal.
    Cleared,
}

impl Lifecycle {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Building => "building",
            Self::Prepared => "prepared",
            Self::Cleared => "cleared",
        }
    }

    /// Fails unless the state is `expected`.
    pub(crate) fn require(
        self,
        expected: Self,
        kind: StatementKind,
        action: &'static str,
    ) -> Result<()> {
        if self == expected {
            Ok(())
        } else {
            Err(SqlError::IllegalLifecycleTransition {
                kind,
                action,
                state: self,
            })
        }
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order direction for ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    /// Ascending order (default).
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

impl OrderDirection {
    /// Returns the SQL representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Null ordering for ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullOrdering {
    /// NULLs come first.
    First,
    /// NULLs come last.
    Last,
}

impl NullOrdering {
    /// Returns the SQL representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::First => "NULLS FIRST",
            Self::Last => "NULLS LAST",
        }
    }
}

/// An ORDER BY entry.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub expr: Expr,
    pub direction: OrderDirection,
    pub nulls: Option<NullOrdering>,
}

impl OrderBy {
    #[must_use]
    pub const fn new(expr: Expr, direction: OrderDirection) -> Self {
        Self {
            expr,
            direction,
            nulls: None,
        }
    }

    #[must_use]
    pub const fn nulls_first(mut self) -> Self {
        self.nulls = Some(NullOrdering::First);
        self
    }

    #[must_use]
    pub const fn nulls_last(mut self) -> Self {
        self.nulls = Some(NullOrdering::Last);
        self
    }
}

/// Join type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    /// INNER JOIN.
    Inner,
    /// LEFT OUTER JOIN.
    Left,
    /// RIGHT OUTER JOIN.
    Right,
    /// FULL OUTER JOIN.
    Full,
    /// CROSS JOIN.
    Cross,
}

impl JoinType {
    /// Returns the SQL representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
            Self::Right => "RIGHT JOIN",
            Self::Full => "FULL JOIN",
            Self::Cross => "CROSS JOIN",
        }
    }
}

/// A source in a FROM or JOIN clause.
#[derive(Debug, Clone, PartialEq)]
pub enum TableRef {
    /// A base table.
    Table { table: Arc<TableMeta>, alias: String },
    /// A sub-query in FROM position.
    Derived { query: Box<Query>, alias: String },
    /// A reference to a common table expression.
    Cte { name: String, alias: String },
}

impl TableRef {
    #[must_use]
    pub fn alias(&self) -> &str {
        match self {
            Self::Table { alias, .. } | Self::Derived { alias, .. } | Self::Cte { alias, .. } => {
                alias
            }
        }
    }
}

/// A JOIN clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub join_type: JoinType,
    pub table: TableRef,
    /// Absent only for CROSS joins.
    pub on: Option<Predicate>,
}

/// One output column of a query.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub expr: Expr,
    pub alias: String,
}

impl Selection {
    #[must_use]
    pub fn new(expr: impl Into<Expr>, alias: impl Into<String>) -> Self {
        Self {
            expr: expr.into(),
            alias: alias.into(),
        }
    }

    #[must_use]
    pub fn value_type(&self) -> ValueType {
        self.expr.value_type()
    }
}

/// One column of a CTE and the selection it maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CteColumn {
    pub name: String,
    pub value_type: ValueType,
    /// Index of the selection in the CTE body feeding this column.
    pub source: usize,
}

/// A common table expression.
///
/// The column mapping is computed once, when the CTE is created; a column
/// list whose length differs from the body's selection count is rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct Cte {
    pub(crate) name: String,
    pub(crate) columns: Arc<[CteColumn]>,
    pub(crate) explicit_columns: bool,
    pub(crate) query: Query,
    pub(crate) recursive: bool,
}

impl Cte {
    /// Creates a CTE over a prepared query.
    ///
    /// An empty `columns` list takes the column names from the query's
    /// selection aliases.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::EmptyAlias`] for an empty name,
    /// [`SqlError::IllegalLifecycleTransition`] if the query is not prepared,
    /// and [`SqlError::ColumnCountMismatch`] if the column list and the
    /// query's selections differ in length.
    pub fn new(name: impl Into<String>, columns: &[&str], query: impl Into<Query>) -> Result<Self> {
        let query = query.into();
        query
            .lifecycle()
            .require(Lifecycle::Prepared, query.kind(), "use as a CTE")?;
        let explicit_columns = !columns.is_empty();
        let mapped = if explicit_columns {
            let names: Vec<String> = columns.iter().map(|c| String::from(*c)).collect();
            map_columns(&names, query.selections())?
        } else {
            query
                .selections()
                .iter()
                .enumerate()
                .map(|(source, s)| CteColumn {
                    name: s.alias.clone(),
                    value_type: s.value_type(),
                    source,
                })
                .collect()
        };
        Self::assemble(name.into(), mapped, explicit_columns, query, false)
    }

    pub(crate) fn assemble(
        name: String,
        columns: Arc<[CteColumn]>,
        explicit_columns: bool,
        query: Query,
        recursive: bool,
    ) -> Result<Self> {
        if name.is_empty() {
            return Err(SqlError::EmptyAlias {
                context: "CTE name",
            });
        }
        if columns.len() != query.selection_count() {
            return Err(SqlError::ColumnCountMismatch {
                context: "CTE column list",
                expected: columns.len(),
                found: query.selection_count(),
            });
        }
        Ok(Self {
            name,
            columns,
            explicit_columns,
            query,
            recursive,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn columns(&self) -> &Arc<[CteColumn]> {
        &self.columns
    }

    #[must_use]
    pub const fn query(&self) -> &Query {
        &self.query
    }

    #[must_use]
    pub const fn is_recursive(&self) -> bool {
        self.recursive
    }
}

/// Maps explicit CTE column names onto the body's selections, by position.
pub(crate) fn map_columns(names: &[String], selections: &[Selection]) -> Result<Arc<[CteColumn]>> {
    if names.len() != selections.len() {
        return Err(SqlError::ColumnCountMismatch {
            context: "CTE column list",
            expected: names.len(),
            found: selections.len(),
        });
    }
    Ok(names
        .iter()
        .zip(selections)
        .enumerate()
        .map(|(source, (name, selection))| CteColumn {
            name: name.clone(),
            value_type: selection.value_type(),
            source,
        })
        .collect())
}

/// Row-locking clause of a SELECT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// `FOR UPDATE`
    Update,
    /// `FOR SHARE`
    Share,
}

impl LockMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Update => "FOR UPDATE",
            Self::Share => "FOR SHARE",
        }
    }
}

/// A SELECT statement.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    pub(crate) session: Session,
    pub(crate) id: ScopeId,
    pub(crate) lifecycle: Lifecycle,
    pub(crate) ctes: Vec<Cte>,
    pub(crate) distinct: bool,
    pub(crate) selections: Vec<Selection>,
    pub(crate) from: Option<TableRef>,
    pub(crate) joins: Vec<Join>,
    pub(crate) where_clause: Vec<Predicate>,
    pub(crate) group_by: Vec<Expr>,
    pub(crate) having: Vec<Predicate>,
    pub(crate) order_by: Vec<OrderBy>,
    pub(crate) limit: Option<u64>,
    pub(crate) offset: Option<u64>,
    pub(crate) lock: Option<LockMode>,
}

impl SelectStatement {
    pub(crate) fn empty(session: Session, id: ScopeId) -> Self {
        Self {
            session,
            id,
            lifecycle: Lifecycle::Building,
            ctes: vec![],
            distinct: false,
            selections: vec![],
            from: None,
            joins: vec![],
            where_clause: vec![],
            group_by: vec![],
            having: vec![],
            order_by: vec![],
            limit: None,
            offset: None,
            lock: None,
        }
    }

    #[must_use]
    pub const fn id(&self) -> ScopeId {
        self.id
    }

    #[must_use]
    pub const fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    #[must_use]
    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }

    #[must_use]
    pub fn ctes(&self) -> &[Cte] {
        &self.ctes
    }

    #[must_use]
    pub const fn source(&self) -> Option<&TableRef> {
        self.from.as_ref()
    }

    #[must_use]
    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    /// The WHERE predicates, implicitly AND-ed.
    #[must_use]
    pub fn predicates(&self) -> &[Predicate] {
        &self.where_clause
    }

    /// Releases the statement's clauses.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::IllegalLifecycleTransition`] unless prepared.
    pub fn clear(&mut self) -> Result<()> {
        self.lifecycle
            .require(Lifecycle::Prepared, StatementKind::Select, "clear")?;
        *self = Self::empty(Session::default(), self.id);
        self.lifecycle = Lifecycle::Cleared;
        Ok(())
    }
}

/// The set operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetOperator {
    Union,
    Intersect,
    Except,
}

impl SetOperator {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Union => "UNION",
            Self::Intersect => "INTERSECT",
            Self::Except => "EXCEPT",
        }
    }
}

/// Two queries combined by a set operator.
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundQuery {
    pub(crate) left: Query,
    pub(crate) op: SetOperator,
    pub(crate) all: bool,
    pub(crate) right: Query,
    pub(crate) order_by: Vec<OrderBy>,
    pub(crate) limit: Option<u64>,
    pub(crate) offset: Option<u64>,
    pub(crate) lifecycle: Lifecycle,
}

impl CompoundQuery {
    #[must_use]
    pub const fn operator(&self) -> SetOperator {
        self.op
    }

    #[must_use]
    pub const fn is_all(&self) -> bool {
        self.all
    }

    #[must_use]
    pub const fn left(&self) -> &Query {
        &self.left
    }

    #[must_use]
    pub const fn right(&self) -> &Query {
        &self.right
    }
}

/// A statement that produces rows: a SELECT or a set operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Select(Box<SelectStatement>),
    Compound(Box<CompoundQuery>),
}

impl Query {
    /// The output columns; a compound query takes its left operand's.
    #[must_use]
    pub fn selections(&self) -> &[Selection] {
        match self {
            Self::Select(select) => &select.selections,
            Self::Compound(compound) => compound.left.selections(),
        }
    }

    #[must_use]
    pub fn selection_count(&self) -> usize {
        self.selections().len()
    }

    #[must_use]
    pub const fn lifecycle(&self) -> Lifecycle {
        match self {
            Self::Select(select) => select.lifecycle,
            Self::Compound(compound) => compound.lifecycle,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> StatementKind {
        match self {
            Self::Select(_) => StatementKind::Select,
            Self::Compound(_) => StatementKind::Compound,
        }
    }

    /// Releases the query's contents.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::IllegalLifecycleTransition`] unless prepared.
    pub fn clear(&mut self) -> Result<()> {
        match self {
            Self::Select(select) => select.clear(),
            Self::Compound(compound) => {
                compound
                    .lifecycle
                    .require(Lifecycle::Prepared, StatementKind::Compound, "clear")?;
                compound.left.clear()?;
                compound.right.clear()?;
                compound.order_by = vec![];
                compound.limit = None;
                compound.offset = None;
                compound.lifecycle = Lifecycle::Cleared;
                Ok(())
            }
        }
    }
}

impl From<SelectStatement> for Query {
    fn from(select: SelectStatement) -> Self {
        Self::Select(Box::new(select))
    }
}

impl From<CompoundQuery> for Query {
    fn from(compound: CompoundQuery) -> Self {
        Self::Compound(Box::new(compound))
    }
}

/// Where the rows of an INSERT come from.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertSource {
    /// One or more VALUES rows.
    Values(Vec<Vec<Expr>>),
    /// `INSERT ... SELECT`.
    Query(Box<Query>),
}

/// An INSERT statement.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    pub(crate) session: Session,
    pub(crate) id: ScopeId,
    pub(crate) lifecycle: Lifecycle,
    pub(crate) table: Arc<TableMeta>,
    pub(crate) columns: Vec<ColumnMeta>,
    pub(crate) source: Option<InsertSource>,
    pub(crate) returning: Vec<Selection>,
}

impl InsertStatement {
    #[must_use]
    pub const fn id(&self) -> ScopeId {
        self.id
    }

    #[must_use]
    pub const fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    #[must_use]
    pub fn table(&self) -> &TableMeta {
        &self.table
    }

    #[must_use]
    pub fn columns(&self) -> &[ColumnMeta] {
        &self.columns
    }

    /// Releases the statement's contents.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::IllegalLifecycleTransition`] unless prepared.
    pub fn clear(&mut self) -> Result<()> {
        self.lifecycle
            .require(Lifecycle::Prepared, StatementKind::Insert, "clear")?;
        self.columns = vec![];
        self.source = None;
        self.returning = vec![];
        self.lifecycle = Lifecycle::Cleared;
        Ok(())
    }
}

/// One `column = value` pair of an UPDATE.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: ColumnMeta,
    pub value: Expr,
}

/// An UPDATE statement.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    pub(crate) session: Session,
    pub(crate) id: ScopeId,
    pub(crate) lifecycle: Lifecycle,
    pub(crate) table: Arc<TableMeta>,
    pub(crate) alias: String,
    pub(crate) assignments: Vec<Assignment>,
    pub(crate) where_clause: Vec<Predicate>,
    pub(crate) unconditional: bool,
    pub(crate) returning: Vec<Selection>,
}

impl UpdateStatement {
    #[must_use]
    pub const fn id(&self) -> ScopeId {
        self.id
    }

    #[must_use]
    pub const fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    #[must_use]
    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    /// Releases the statement's contents.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::IllegalLifecycleTransition`] unless prepared.
    pub fn clear(&mut self) -> Result<()> {
        self.lifecycle
            .require(Lifecycle::Prepared, StatementKind::Update, "clear")?;
        self.assignments = vec![];
        self.where_clause = vec![];
        self.returning = vec![];
        self.lifecycle = Lifecycle::Cleared;
        Ok(())
    }
}

/// A DELETE statement.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStatement {
    pub(crate) session: Session,
    pub(crate) id: ScopeId,
    pub(crate) lifecycle: Lifecycle,
    pub(crate) table: Arc<TableMeta>,
    pub(crate) alias: String,
    pub(crate) where_clause: Vec<Predicate>,
    pub(crate) unconditional: bool,
    pub(crate) returning: Vec<Selection>,
}

impl DeleteStatement {
    #[must_use]
    pub const fn id(&self) -> ScopeId {
        self.id
    }

    #[must_use]
    pub const fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Releases the statement's contents.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::IllegalLifecycleTransition`] unless prepared.
    pub fn clear(&mut self) -> Result<()> {
        self.lifecycle
            .require(Lifecycle::Prepared, StatementKind::Delete, "clear")?;
        self.where_clause = vec![];
        self.returning = vec![];
        self.lifecycle = Lifecycle::Cleared;
        Ok(())
    }
}

/// Any statement the compiler renders.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Query(Query),
    Insert(InsertStatement),
    Update(UpdateStatement),
    Delete(DeleteStatement),
}

impl Statement {
    #[must_use]
    pub const fn kind(&self) -> StatementKind {
        match self {
            Self::Query(query) => query.kind(),
            Self::Insert(_) => StatementKind::Insert,
            Self::Update(_) => StatementKind::Update,
            Self::Delete(_) => StatementKind::Delete,
        }
    }

    #[must_use]
    pub const fn lifecycle(&self) -> Lifecycle {
        match self {
            Self::Query(query) => query.lifecycle(),
            Self::Insert(insert) => insert.lifecycle,
            Self::Update(update) => update.lifecycle,
            Self::Delete(delete) => delete.lifecycle,
        }
    }

    /// Releases the statement's contents.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::IllegalLifecycleTransition`] unless prepared.
    pub fn clear(&mut self) -> Result<()> {
        match self {
            Self::Query(query) => query.clear(),
            Self::Insert(insert) => insert.clear(),
            Self::Update(update) => update.clear(),
            Self::Delete(delete) => delete.clear(),
        }
    }
}

impl From<Query> for Statement {
    fn from(query: Query) -> Self {
        Self::Query(query)
    }
}

impl From<SelectStatement> for Statement {
    fn from(select: SelectStatement) -> Self {
        Self::Query(select.into())
    }
}

impl From<InsertStatement> for Statement {
    fn from(insert: InsertStatement) -> Self {
        Self::Insert(insert)
    }
}

impl From<UpdateStatement> for Statement {
    fn from(update: UpdateStatement) -> Self {
        Self::Update(update)
    }
}

impl From<DeleteStatement> for Statement {
    fn from(delete: DeleteStatement) -> Self {
        Self::Delete(delete)
    }
}

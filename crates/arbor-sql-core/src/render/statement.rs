//! Statement rendering.

use tracing::debug;

use super::{CompiledBatch, RenderContext, RenderScope, Renderable};
use crate::ast::{
    CompoundQuery, Cte, DeleteStatement, Expr, InsertSource, InsertStatement, JoinType, Lifecycle,
    Query, SelectStatement, Selection, SetOperator, Statement, StatementKind, TableRef,
    UpdateStatement,
};
use crate::builder::BatchStatement;
use crate::dialect::Dialect;
use crate::error::{Result, SqlError};
use crate::schema::TableMeta;

fn selection_names(selections: &[Selection]) -> Vec<String> {
    selections.iter().map(|s| s.alias.clone()).collect()
}

impl RenderContext<'_> {
    pub(crate) fn query(&mut self, query: &Query) -> Result<()> {
        match query {
            Query::Select(select) => self.select(select),
            Query::Compound(compound) => self.compound(compound),
        }
    }

    /// Renders `(query)`.
    pub(crate) fn sub_query(&mut self, query: &Query) -> Result<()> {
        self.push_str("(");
        self.query(query)?;
        self.push_str(")");
        Ok(())
    }

    /// Renders `body` with `scope` pushed, popping it on every path.
    fn scoped(
        &mut self,
        scope: RenderScope,
        body: impl FnOnce(&mut Self) -> Result<()>,
    ) -> Result<()> {
        self.enter(scope);
        let result = body(self);
        self.leave();
        result
    }

    fn statement(&mut self, statement: &Statement) -> Result<()> {
        match statement {
            Statement::Query(query) => self.query(query),
            Statement::Insert(insert) => self.insert(insert),
            Statement::Update(update) => self.update(update),
            Statement::Delete(delete) => self.delete(delete),
        }
    }

    fn select(&mut self, select: &SelectStatement) -> Result<()> {
        select
            .lifecycle
            .require(Lifecycle::Prepared, StatementKind::Select, "render")?;
        let aliases = select
            .from
            .iter()
            .chain(select.joins.iter().map(|join| &join.table))
            .map(|source| String::from(source.alias()))
            .collect();
        let scope = RenderScope {
            aliases,
            selections: selection_names(&select.selections),
        };
        self.scoped(scope, |ctx| ctx.select_body(select))
    }

    fn select_body(&mut self, select: &SelectStatement) -> Result<()> {
        self.with_clause(&select.ctes)?;
        self.push_str("SELECT ");
        if select.distinct {
            self.push_str("DISTINCT ");
        }
        self.selections(&select.selections)?;

        if let Some(source) = &select.from {
            self.push_str(" FROM ");
            self.table_ref(source)?;
        }

        for join in &select.joins {
            if join.join_type == JoinType::Full && !self.dialect.supports_full_join() {
                return Err(self.unsupported(JoinType::Full.as_str()));
            }
            self.push_str(" ");
            self.push_str(join.join_type.as_str());
            self.push_str(" ");
            self.table_ref(&join.table)?;
            if let Some(on) = &join.on {
                self.push_str(" ON ");
                self.expr(on.as_expr())?;
            }
        }

        if !select.where_clause.is_empty() {
            self.push_str(" WHERE ");
            self.predicates(&select.where_clause)?;
        }

        if !select.group_by.is_empty() {
            self.push_str(" GROUP BY ");
            self.list(&select.group_by)?;
        }

        if !select.having.is_empty() {
            self.push_str(" HAVING ");
            self.predicates(&select.having)?;
        }

        if !select.order_by.is_empty() {
            self.push_str(" ORDER BY ");
            self.order_items(&select.order_by)?;
        }

        let limit_offset = self.dialect.limit_offset(select.limit, select.offset);
        self.push_str(&limit_offset);

        if let Some(lock) = select.lock {
            if !self.dialect.supports_lock() {
                return Err(self.unsupported(lock.as_str()));
            }
            self.push_str(" ");
            self.push_str(lock.as_str());
        }
        Ok(())
    }

    fn with_clause(&mut self, ctes: &[Cte]) -> Result<()> {
        if ctes.is_empty() {
            return Ok(());
        }
        self.push_str("WITH ");
        if ctes.iter().any(Cte::is_recursive) {
            self.push_str("RECURSIVE ");
        }
        for (i, cte) in ctes.iter().enumerate() {
            if i > 0 {
                self.push_str(", ");
            }
            self.identifier(cte.name());
            if cte.explicit_columns {
                self.push_str(" (");
                for (j, column) in cte.columns.iter().enumerate() {
                    if j > 0 {
                        self.push_str(", ");
                    }
                    self.identifier(&column.name);
                }
                self.push_str(")");
            }
            self.push_str(" AS ");
            self.sub_query(&cte.query)?;
        }
        self.push_str(" ");
        Ok(())
    }

    /// Renders a selection list, omitting `AS` where the alias repeats the
    /// column name.
    fn selections(&mut self, selections: &[Selection]) -> Result<()> {
        for (i, selection) in selections.iter().enumerate() {
            if i > 0 {
                self.push_str(", ");
            }
            self.expr(&selection.expr)?;
            let implicit =
                matches!(&selection.expr, Expr::Field(field) if field.column == selection.alias);
            if !implicit {
                self.push_str(" AS ");
                self.identifier(&selection.alias);
            }
        }
        Ok(())
    }

    fn table_name(&mut self, table: &TableMeta) {
        if let Some(schema) = table.schema() {
            self.identifier(schema);
            self.push_str(".");
        }
        self.identifier(table.name());
    }

    fn table_alias(&mut self, name: &str, alias: &str) {
        if name != alias {
            self.push_str(" AS ");
            self.identifier(alias);
        }
    }

    fn table_ref(&mut self, source: &TableRef) -> Result<()> {
        match source {
            TableRef::Table { table, alias } => {
                self.table_name(table);
                self.table_alias(table.name(), alias);
            }
            TableRef::Derived { query, alias } => {
                self.sub_query(query)?;
                self.push_str(" AS ");
                self.identifier(alias);
            }
            TableRef::Cte { name, alias } => {
                self.identifier(name);
                self.table_alias(name, alias);
            }
        }
        Ok(())
    }

    fn compound(&mut self, compound: &CompoundQuery) -> Result<()> {
        compound
            .lifecycle
            .require(Lifecycle::Prepared, StatementKind::Compound, "render")?;
        let op = compound.op;
        if !self.dialect.supports_set_operation(op, compound.all) {
            let all = if compound.all { " ALL" } else { "" };
            return Err(self.unsupported(format!("{}{all}", op.as_str())));
        }
        self.set_operand(&compound.left, op, true)?;
        self.push_str(" ");
        self.push_str(op.as_str());
        if compound.all {
            self.push_str(" ALL");
        }
        self.push_str(" ");
        self.set_operand(&compound.right, op, false)?;

        if !compound.order_by.is_empty() {
            let scope = RenderScope {
                aliases: vec![],
                selections: selection_names(compound.left.selections()),
            };
            self.scoped(scope, |ctx| {
                ctx.push_str(" ORDER BY ");
                ctx.order_items(&compound.order_by)
            })?;
        }
        let limit_offset = self.dialect.limit_offset(compound.limit, compound.offset);
        self.push_str(&limit_offset);
        Ok(())
    }

    /// Renders one operand of a set operation.
    ///
    /// A plain SELECT is written as is. A compound on the left is written
    /// flat when reading it left to right gives the same grouping, which
    /// holds unless an INTERSECT would capture part of it. Everything else
    /// is bracketed.
    fn set_operand(&mut self, query: &Query, parent: SetOperator, leftmost: bool) -> Result<()> {
        let flat = match query {
            Query::Select(select) => {
                select.ctes.is_empty()
                    && select.order_by.is_empty()
                    && select.limit.is_none()
                    && select.offset.is_none()
                    && select.lock.is_none()
            }
            Query::Compound(compound) => {
                leftmost
                    && compound.order_by.is_empty()
                    && compound.limit.is_none()
                    && compound.offset.is_none()
                    && (parent != SetOperator::Intersect || compound.op == SetOperator::Intersect)
            }
        };
        if flat {
            return self.query(query);
        }
        if !self.dialect.supports_nested_set_operations() {
            return Err(self.unsupported("bracketed set-operation operand"));
        }
        self.sub_query(query)
    }

    fn returning(&mut self, returning: &[Selection]) -> Result<()> {
        if returning.is_empty() {
            return Ok(());
        }
        if !self.dialect.supports_returning() {
            return Err(self.unsupported("RETURNING"));
        }
        self.push_str(" RETURNING ");
        self.selections(returning)
    }

    fn insert(&mut self, insert: &InsertStatement) -> Result<()> {
        insert
            .lifecycle
            .require(Lifecycle::Prepared, StatementKind::Insert, "render")?;
        let scope = RenderScope {
            aliases: vec![String::from(insert.table.name())],
            selections: selection_names(&insert.returning),
        };
        self.scoped(scope, |ctx| {
            ctx.push_str("INSERT INTO ");
            ctx.table_name(&insert.table);
            ctx.push_str(" (");
            for (i, column) in insert.columns.iter().enumerate() {
                if i > 0 {
                    ctx.push_str(", ");
                }
                ctx.identifier(&column.name);
            }
            ctx.push_str(")");
            match &insert.source {
                Some(InsertSource::Values(rows)) => {
                    ctx.push_str(" VALUES ");
                    for (i, row) in rows.iter().enumerate() {
                        if i > 0 {
                            ctx.push_str(", ");
                        }
                        ctx.push_str("(");
                        ctx.list(row)?;
                        ctx.push_str(")");
                    }
                }
                Some(InsertSource::Query(query)) => {
                    ctx.push_str(" ");
                    ctx.query(query)?;
                }
                None => {
                    return Err(SqlError::MissingRequiredClause {
                        kind: StatementKind::Insert,
                        clause: "VALUES rows or a SELECT source",
                    })
                }
            }
            ctx.returning(&insert.returning)
        })
    }

    fn update(&mut self, update: &UpdateStatement) -> Result<()> {
        update
            .lifecycle
            .require(Lifecycle::Prepared, StatementKind::Update, "render")?;
        let scope = RenderScope {
            aliases: vec![update.alias.clone()],
            selections: selection_names(&update.returning),
        };
        self.scoped(scope, |ctx| {
            ctx.push_str("UPDATE ");
            ctx.table_name(&update.table);
            ctx.table_alias(update.table.name(), &update.alias);
            ctx.push_str(" SET ");
            for (i, assignment) in update.assignments.iter().enumerate() {
                if i > 0 {
                    ctx.push_str(", ");
                }
                ctx.identifier(&assignment.column.name);
                ctx.push_str(" = ");
                ctx.expr(&assignment.value)?;
            }
            if !update.where_clause.is_empty() {
                ctx.push_str(" WHERE ");
                ctx.predicates(&update.where_clause)?;
            }
            ctx.returning(&update.returning)
        })
    }

    fn delete(&mut self, delete: &DeleteStatement) -> Result<()> {
        delete
            .lifecycle
            .require(Lifecycle::Prepared, StatementKind::Delete, "render")?;
        let scope = RenderScope {
            aliases: vec![delete.alias.clone()],
            selections: selection_names(&delete.returning),
        };
        self.scoped(scope, |ctx| {
            ctx.push_str("DELETE FROM ");
            ctx.table_name(&delete.table);
            ctx.table_alias(delete.table.name(), &delete.alias);
            if !delete.where_clause.is_empty() {
                ctx.push_str(" WHERE ");
                ctx.predicates(&delete.where_clause)?;
            }
            ctx.returning(&delete.returning)
        })
    }
}

impl Renderable for SelectStatement {
    fn render_to(&self, ctx: &mut RenderContext<'_>) -> Result<()> {
        ctx.select(self)
    }

    fn label(&self) -> &'static str {
        "SELECT"
    }
}

impl Renderable for CompoundQuery {
    fn render_to(&self, ctx: &mut RenderContext<'_>) -> Result<()> {
        ctx.compound(self)
    }

    fn label(&self) -> &'static str {
        "COMPOUND"
    }
}

impl Renderable for Query {
    fn render_to(&self, ctx: &mut RenderContext<'_>) -> Result<()> {
        ctx.query(self)
    }

    fn label(&self) -> &'static str {
        self.kind().as_str()
    }
}

impl Renderable for InsertStatement {
    fn render_to(&self, ctx: &mut RenderContext<'_>) -> Result<()> {
        ctx.insert(self)
    }

    fn label(&self) -> &'static str {
        "INSERT"
    }
}

impl Renderable for UpdateStatement {
    fn render_to(&self, ctx: &mut RenderContext<'_>) -> Result<()> {
        ctx.update(self)
    }

    fn label(&self) -> &'static str {
        "UPDATE"
    }
}

impl Renderable for DeleteStatement {
    fn render_to(&self, ctx: &mut RenderContext<'_>) -> Result<()> {
        ctx.delete(self)
    }

    fn label(&self) -> &'static str {
        "DELETE"
    }
}

impl Renderable for Statement {
    fn render_to(&self, ctx: &mut RenderContext<'_>) -> Result<()> {
        ctx.statement(self)
    }

    fn label(&self) -> &'static str {
        self.kind().as_str()
    }
}

impl BatchStatement {
    /// Renders the statement once and one parameter group per row.
    ///
    /// # Errors
    ///
    /// As [`Renderable::render`]; additionally
    /// [`SqlError::UnboundBatchParameter`] when a row lacks a value for one
    /// of the statement's batch parameters, and [`SqlError::TypeMismatch`]
    /// when a row's value does not fit the parameter's type.
    pub fn render(&self, dialect: &dyn Dialect) -> Result<CompiledBatch> {
        let mut ctx = RenderContext::new(dialect);
        ctx.statement(&self.statement)?;
        let compiled = ctx.into_batch(&self.rows)?;
        debug!(
            dialect = dialect.name(),
            statement = self.statement.kind().as_str(),
            rows = compiled.param_groups.len(),
            "rendered batch"
        );
        Ok(compiled)
    }
}

//! Rendering of prepared statements into SQL text and parameters.
//!
//! The renderer walks a frozen tree once, appending to a single buffer.
//! Values become placeholders unless the dialect may inline them, and every
//! placeholder is recorded in order so the parameter list always lines up
//! with the text. Rendering never mutates the statement: the same statement
//! and dialect always produce the same output.
//!
//! # Example
//!
//! ```rust
//! use arbor_sql_core::builder::Delete;
//! use arbor_sql_core::dialect::PostgresDialect;
//! use arbor_sql_core::render::Renderable;
//! use arbor_sql_core::schema::{ColumnMeta, TableMeta};
//! use arbor_sql_core::scope::CriteriaContext;
//! use arbor_sql_core::types::ValueType;
//!
//! let users = TableMeta::new("users")
//!     .column(ColumnMeta::new("id", ValueType::BigInt).primary_key())
//!     .build();
//!
//! let ctx = CriteriaContext::new();
//! let delete = Delete::from_table(&ctx, &users, "u")?;
//! let id = delete.field("id")?;
//! let statement = delete.where_clause(id.eq(42_i64))?.prepare()?;
//!
//! let compiled = statement.render(&PostgresDialect::new())?;
//! assert_eq!(compiled.sql, "DELETE FROM users AS u WHERE u.id = $1");
//! assert_eq!(compiled.params.len(), 1);
//! # Ok::<(), arbor_sql_core::SqlError>(())
//! ```

mod expr;
mod statement;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ast::{FieldRef, SelectionRef};
use crate::builder::BatchRow;
use crate::dialect::{self, Dialect};
use crate::error::{Result, SqlError};
use crate::types::ValueType;
use crate::value::{SqlValue, TypedValue};

/// SQL text and the parameters bound to its placeholders, in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledStatement {
    pub sql: String,
    pub params: Vec<TypedValue>,
}

/// SQL text rendered once with one parameter list per batch row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledBatch {
    pub sql: String,
    pub param_groups: Vec<Vec<TypedValue>>,
}

#[derive(Debug, Clone)]
enum ParamSlot {
    Value(TypedValue),
    Batch { name: String, value_type: ValueType },
}

/// Names visible to references rendered inside one query level.
#[derive(Debug, Default)]
struct RenderScope {
    aliases: Vec<String>,
    selections: Vec<String>,
}

/// State of one rendering pass.
pub struct RenderContext<'d> {
    dialect: &'d dyn Dialect,
    sql: String,
    slots: Vec<ParamSlot>,
    scopes: Vec<RenderScope>,
}

impl<'d> RenderContext<'d> {
    fn new(dialect: &'d dyn Dialect) -> Self {
        Self {
            dialect,
            sql: String::new(),
            slots: vec![],
            scopes: vec![],
        }
    }

    /// The dialect being rendered for.
    #[must_use]
    pub fn dialect(&self) -> &'d dyn Dialect {
        self.dialect
    }

    fn push_str(&mut self, text: &str) {
        self.sql.push_str(text);
    }

    fn identifier(&mut self, name: &str) {
        let quoted = self.dialect.quote_identifier(name);
        self.sql.push_str(&quoted);
    }

    fn bind(&mut self, slot: ParamSlot) {
        self.slots.push(slot);
        let placeholder = self.dialect.placeholder(self.slots.len());
        self.sql.push_str(&placeholder);
    }

    fn value(&mut self, value: &TypedValue, inline: bool) -> Result<()> {
        let finite = !matches!(value.value, SqlValue::Float(f) if !f.is_finite());
        if inline && finite {
            let literal = self.dialect.format_literal(value)?;
            self.sql.push_str(&literal);
        } else {
            self.bind(ParamSlot::Value(value.clone()));
        }
        Ok(())
    }

    fn unsupported(&self, feature: impl Into<String>) -> SqlError {
        dialect::unsupported(self.dialect.name(), feature)
    }

    fn enter(&mut self, scope: RenderScope) {
        self.scopes.push(scope);
    }

    fn leave(&mut self) {
        self.scopes.pop();
    }

    /// The scope `depth` levels above the innermost one.
    fn scope_at(&self, depth: usize) -> Option<&RenderScope> {
        self.scopes
            .len()
            .checked_sub(depth + 1)
            .and_then(|index| self.scopes.get(index))
    }

    /// Checks that a column reference is bound where it is rendered.
    ///
    /// A reference rendered outside any query (an expression on its own) is
    /// accepted at depth zero. A correlated reference needs its enclosing
    /// query to be part of the same rendering pass.
    fn check_field(&self, field: &FieldRef) -> Result<()> {
        if self.scopes.is_empty() && field.depth == 0 {
            return Ok(());
        }
        let bound = self
            .scope_at(field.depth)
            .is_some_and(|scope| scope.aliases.iter().any(|a| *a == field.qualifier));
        if bound {
            Ok(())
        } else {
            Err(SqlError::UnresolvedReference {
                reference: format!("{}.{}", field.qualifier, field.column),
            })
        }
    }

    fn check_selection(&self, selection: &SelectionRef) -> Result<()> {
        if self.scopes.is_empty() && selection.depth == 0 {
            return Ok(());
        }
        let bound = self
            .scope_at(selection.depth)
            .is_some_and(|scope| scope.selections.iter().any(|s| *s == selection.name));
        if bound {
            Ok(())
        } else {
            Err(SqlError::UnresolvedReference {
                reference: selection.name.clone(),
            })
        }
    }

    fn into_compiled(self) -> Result<CompiledStatement> {
        let params = self
            .slots
            .into_iter()
            .map(|slot| match slot {
                ParamSlot::Value(value) => Ok(value),
                ParamSlot::Batch { name, .. } => Err(SqlError::UnboundBatchParameter { name }),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(CompiledStatement {
            sql: self.sql,
            params,
        })
    }

    fn into_batch(self, rows: &[BatchRow]) -> Result<CompiledBatch> {
        let param_groups = rows
            .iter()
            .map(|row| {
                self.slots
                    .iter()
                    .map(|slot| match slot {
                        ParamSlot::Value(value) => Ok(value.clone()),
                        ParamSlot::Batch { name, value_type } => {
                            let value = row
                                .get(name)
                                .ok_or_else(|| SqlError::UnboundBatchParameter {
                                    name: name.clone(),
                                })?;
                            TypedValue::new(*value_type, value.clone())
                        }
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(CompiledBatch {
            sql: self.sql,
            param_groups,
        })
    }
}

/// Anything that renders to SQL on its own: statements, expressions and
/// predicates.
pub trait Renderable {
    /// Appends the node to `ctx`.
    ///
    /// # Errors
    ///
    /// Fails when the node is not prepared, when a reference is not bound in
    /// the rendering pass, or when the dialect cannot express the node.
    fn render_to(&self, ctx: &mut RenderContext<'_>) -> Result<()>;

    /// Short name of the node, used in logs.
    fn label(&self) -> &'static str;

    /// Renders the node for `dialect`.
    ///
    /// # Errors
    ///
    /// As [`Renderable::render_to`]; additionally
    /// [`SqlError::UnboundBatchParameter`] when the node holds batch
    /// parameters, which only a [`BatchStatement`](crate::builder::BatchStatement)
    /// can fill.
    fn render(&self, dialect: &dyn Dialect) -> Result<CompiledStatement> {
        let mut ctx = RenderContext::new(dialect);
        self.render_to(&mut ctx)?;
        let compiled = ctx.into_compiled()?;
        debug!(
            dialect = dialect.name(),
            statement = self.label(),
            params = compiled.params.len(),
            "rendered statement"
        );
        Ok(compiled)
    }
}

/// Renders `node` for `dialect`.
///
/// # Errors
///
/// As [`Renderable::render`].
pub fn render<R: Renderable + ?Sized>(node: &R, dialect: &dyn Dialect) -> Result<CompiledStatement> {
    node.render(dialect)
}

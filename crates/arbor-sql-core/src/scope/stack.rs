//! The scope stack proper.

use std::sync::Arc;

use tracing::trace;

use super::ScopeId;
use crate::ast::{CteColumn, FieldRef, SelectionRef, StatementKind};
use crate::error::{Result, SqlError};
use crate::schema::TableMeta;
use crate::types::ValueType;

/// What an alias is bound to.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// A base table.
    Table(Arc<TableMeta>),
    /// A derived table; its columns are the selections of the sub-query.
    Derived(Arc<[SelectionInfo]>),
    /// A reference to a common table expression.
    Cte {
        name: String,
        columns: Arc<[CteColumn]>,
    },
}

impl Binding {
    /// Returns the type and nullability of `column`, if the binding has it.
    fn column(&self, column: &str) -> Option<(ValueType, bool)> {
        match self {
            Self::Table(table) => table
                .find_column(column)
                .map(|c| (c.value_type, c.nullable)),
            Self::Derived(selections) => selections
                .iter()
                .find(|s| s.alias == column)
                .map(|s| (s.value_type, true)),
            Self::Cte { columns, .. } => columns
                .iter()
                .find(|c| c.name == column)
                .map(|c| (c.value_type, true)),
        }
    }
}

/// Alias and type of one output column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionInfo {
    pub alias: String,
    pub value_type: ValueType,
}

/// How far a selection-alias lookup may search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// Only the caller's own selection list.
    Current,
    /// The caller's list, then the lists of open enclosing scopes.
    Enclosing,
}

#[derive(Debug)]
struct Scope {
    id: ScopeId,
    kind: StatementKind,
    bindings: Vec<(String, Binding)>,
    selections: Vec<SelectionInfo>,
    ctes: Vec<(String, Arc<[CteColumn]>)>,
}

impl Scope {
    fn binding(&self, alias: &str) -> Option<&Binding> {
        self.bindings
            .iter()
            .find(|(name, _)| name == alias)
            .map(|(_, binding)| binding)
    }
}

/// A LIFO stack of scopes, one per statement being built.
///
/// Only open scopes are stored; each is the child of the one below it.
/// Closing a scope drops it together with its bindings. Scope ids are never
/// reused, so an id outlives its scope: lookups through the id of a closed
/// scope resolve nothing, and a stale id can never address a newer scope.
#[derive(Debug, Default)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
    next_id: usize,
}

impl ScopeStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the scope on top of the stack.
    #[must_use]
    pub fn current(&self) -> Option<ScopeId> {
        self.scopes.last().map(|scope| scope.id)
    }

    /// Returns the number of open scopes.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    #[must_use]
    pub fn is_open(&self, id: ScopeId) -> bool {
        self.position(id).is_some()
    }

    /// Returns the statement kind of an open scope.
    #[must_use]
    pub fn kind(&self, id: ScopeId) -> Option<StatementKind> {
        self.position(id).map(|i| self.scopes[i].kind)
    }

    /// Opens the scope of a top-level statement.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::ContextAlreadyActive`] if any scope is open.
    pub fn push_root(&mut self, kind: StatementKind) -> Result<ScopeId> {
        if let Some(active) = self.current() {
            return Err(SqlError::ContextAlreadyActive { active });
        }
        Ok(self.open_scope(kind))
    }

    /// Opens a child of the current top scope.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::NoActiveContext`] on an empty stack.
    pub fn push(&mut self, kind: StatementKind) -> Result<ScopeId> {
        if self.scopes.is_empty() {
            return Err(SqlError::NoActiveContext);
        }
        Ok(self.open_scope(kind))
    }

    /// Opens a child of `parent`, which must be the current top scope.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::ScopeMismatch`] if `parent` is not on top.
    pub fn push_nested(&mut self, parent: ScopeId, kind: StatementKind) -> Result<ScopeId> {
        self.expect_top(parent)?;
        Ok(self.open_scope(kind))
    }

    /// Closes `expected`, which must be the current top scope.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::ScopeMismatch`] if another scope is on top.
    pub fn pop(&mut self, expected: ScopeId) -> Result<()> {
        self.expect_top(expected)?;
        self.scopes.pop();
        trace!(scope = %expected, depth = self.scopes.len(), "scope popped");
        Ok(())
    }

    /// Closes `id` and every scope opened above it.
    ///
    /// Used to clean up after a statement that was abandoned while building.
    /// Returns false if `id` was not open.
    pub fn discard(&mut self, id: ScopeId) -> bool {
        let Some(position) = self.position(id) else {
            return false;
        };
        self.scopes.truncate(position);
        true
    }

    /// Binds `alias` in `scope`.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::EmptyAlias`], [`SqlError::ScopeMismatch`] when
    /// `scope` is not on top, or [`SqlError::DuplicateAlias`] when `scope`
    /// already binds the alias. Aliases of enclosing scopes do not conflict.
    pub fn register_alias(&mut self, scope: ScopeId, alias: &str, binding: Binding) -> Result<()> {
        if alias.is_empty() {
            return Err(SqlError::EmptyAlias {
                context: "table alias",
            });
        }
        let entry = self.top_mut(scope)?;
        if entry.binding(alias).is_some() {
            return Err(SqlError::DuplicateAlias {
                alias: String::from(alias),
                scope,
            });
        }
        trace!(scope = %scope, alias, "alias registered");
        entry.bindings.push((String::from(alias), binding));
        Ok(())
    }

    /// Adds an output column alias to `scope`.
    ///
    /// # Errors
    ///
    /// Same faults as [`ScopeStack::register_alias`].
    pub fn register_selection(
        &mut self,
        scope: ScopeId,
        alias: &str,
        value_type: ValueType,
    ) -> Result<()> {
        if alias.is_empty() {
            return Err(SqlError::EmptyAlias {
                context: "selection alias",
            });
        }
        let entry = self.top_mut(scope)?;
        if entry.selections.iter().any(|s| s.alias == alias) {
            return Err(SqlError::DuplicateAlias {
                alias: String::from(alias),
                scope,
            });
        }
        entry.selections.push(SelectionInfo {
            alias: String::from(alias),
            value_type,
        });
        Ok(())
    }

    /// Declares a CTE name in `scope`.
    ///
    /// # Errors
    ///
    /// Same faults as [`ScopeStack::register_alias`].
    pub fn register_cte(
        &mut self,
        scope: ScopeId,
        name: &str,
        columns: Arc<[CteColumn]>,
    ) -> Result<()> {
        if name.is_empty() {
            return Err(SqlError::EmptyAlias {
                context: "CTE name",
            });
        }
        let entry = self.top_mut(scope)?;
        if entry.ctes.iter().any(|(existing, _)| existing == name) {
            return Err(SqlError::DuplicateAlias {
                alias: String::from(name),
                scope,
            });
        }
        trace!(scope = %scope, cte = name, "CTE registered");
        entry.ctes.push((String::from(name), columns));
        Ok(())
    }

    /// Withdraws a CTE name declared in `scope`.
    ///
    /// Returns false if `scope` is closed or does not declare `name`.
    pub fn unregister_cte(&mut self, scope: ScopeId, name: &str) -> bool {
        let Some(position) = self.position(scope) else {
            return false;
        };
        let ctes = &mut self.scopes[position].ctes;
        let before = ctes.len();
        ctes.retain(|(existing, _)| existing != name);
        trace!(scope = %scope, cte = name, "CTE withdrawn");
        ctes.len() != before
    }

    /// Resolves `qualifier.column` in `scope` only.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::UnresolvedReference`] when `scope` does not bind
    /// the qualifier or the binding has no such column.
    pub fn resolve_field(&self, scope: ScopeId, qualifier: &str, column: &str) -> Result<FieldRef> {
        self.chain(scope)?
            .next()
            .and_then(|entry| entry.binding(qualifier))
            .and_then(|binding| field_ref(binding, qualifier, column, 0))
            .ok_or_else(|| unresolved_field(qualifier, column))
    }

    /// Resolves `qualifier.column` in the scopes enclosing `scope`.
    ///
    /// The search walks outwards through the open enclosing scopes and
    /// returns a reference recording how many levels it crossed.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::UnresolvedReference`] when no open enclosing scope
    /// binds the qualifier, including after the enclosing statement was
    /// prepared.
    pub fn resolve_outer_field(
        &self,
        scope: ScopeId,
        qualifier: &str,
        column: &str,
    ) -> Result<FieldRef> {
        self.chain(scope)?
            .enumerate()
            .skip(1)
            .find_map(|(depth, entry)| entry.binding(qualifier).map(|b| (depth, b)))
            .and_then(|(depth, binding)| field_ref(binding, qualifier, column, depth))
            .ok_or_else(|| unresolved_field(qualifier, column))
    }

    /// Resolves a bare selection alias.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::UnresolvedReference`] if no searched selection
    /// list has the alias.
    pub fn resolve_selection_alias(
        &self,
        scope: ScopeId,
        name: &str,
        lookup: Lookup,
    ) -> Result<SelectionRef> {
        let levels = match lookup {
            Lookup::Current => 1,
            Lookup::Enclosing => usize::MAX,
        };
        self.chain(scope)?
            .take(levels)
            .enumerate()
            .find_map(|(depth, entry)| {
                entry
                    .selections
                    .iter()
                    .find(|s| s.alias == name)
                    .map(|selection| SelectionRef {
                        name: selection.alias.clone(),
                        value_type: selection.value_type,
                        depth,
                    })
            })
            .ok_or_else(|| SqlError::UnresolvedReference {
                reference: String::from(name),
            })
    }

    /// Finds the columns of the CTE `name` visible from `scope`.
    ///
    /// CTE names are lexically scoped: a CTE declared by a statement is
    /// visible to its sub-queries while the statement is open.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::UnresolvedReference`] if no open scope declares it.
    pub fn resolve_cte(&self, scope: ScopeId, name: &str) -> Result<Arc<[CteColumn]>> {
        self.chain(scope)?
            .find_map(|entry| entry.ctes.iter().find(|(cte, _)| cte == name))
            .map(|(_, columns)| Arc::clone(columns))
            .ok_or_else(|| SqlError::UnresolvedReference {
                reference: String::from(name),
            })
    }

    fn open_scope(&mut self, kind: StatementKind) -> ScopeId {
        let id = ScopeId::new(self.next_id);
        self.next_id += 1;
        self.scopes.push(Scope {
            id,
            kind,
            bindings: vec![],
            selections: vec![],
            ctes: vec![],
        });
        trace!(scope = %id, %kind, depth = self.scopes.len(), "scope pushed");
        id
    }

    // Ids grow from the bottom of the stack to the top.
    fn position(&self, id: ScopeId) -> Option<usize> {
        self.scopes.binary_search_by_key(&id, |scope| scope.id).ok()
    }

    /// `scope` followed by its enclosing scopes, innermost first. Empty
    /// once `scope` is closed.
    fn chain(&self, scope: ScopeId) -> Result<impl Iterator<Item = &Scope>> {
        if scope.index() >= self.next_id {
            return Err(SqlError::NoActiveContext);
        }
        let below = self.position(scope).map_or(0, |position| position + 1);
        Ok(self.scopes[..below].iter().rev())
    }

    fn top_mut(&mut self, id: ScopeId) -> Result<&mut Scope> {
        self.expect_top(id)?;
        self.scopes.last_mut().ok_or(SqlError::NoActiveContext)
    }

    fn expect_top(&self, id: ScopeId) -> Result<()> {
        let found = self.current();
        if found == Some(id) {
            Ok(())
        } else {
            Err(SqlError::ScopeMismatch {
                expected: id,
                found,
            })
        }
    }
}

fn field_ref(binding: &Binding, qualifier: &str, column: &str, depth: usize) -> Option<FieldRef> {
    binding.column(column).map(|(value_type, nullable)| FieldRef {
        qualifier: String::from(qualifier),
        column: String::from(column),
        value_type,
        nullable,
        depth,
    })
}

fn unresolved_field(qualifier: &str, column: &str) -> SqlError {
    SqlError::UnresolvedReference {
        reference: format!("{qualifier}.{column}"),
    }
}

//! Scope tracking for nested statements.
//!
//! Each statement under construction owns one scope on a [`ScopeStack`]. A
//! scope records the table aliases, derived tables, CTEs and selection
//! aliases visible at its level. Sub-queries push child scopes; the stack
//! is strictly LIFO and a scope is closed when its statement is prepared.
//!
//! Qualified references only resolve against the caller's own scope.
//! Looking into an enclosing scope (a correlated reference) is always an
//! explicit request, see [`ScopeStack::resolve_outer_field`].
//!
//! The stack is reached through a [`CriteriaContext`], a handle that is
//! passed explicitly to every builder.

mod context;
mod stack;

use std::fmt;

pub use context::CriteriaContext;
pub(crate) use context::Session;
pub use stack::{Binding, Lookup, ScopeStack, SelectionInfo};

/// Identity of one scope within a [`ScopeStack`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(usize);

impl ScopeId {
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scope#{}", self.0)
    }
}

//! The explicit context handle and the per-statement scope guard.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::warn;

use super::{ScopeId, ScopeStack};
use crate::ast::StatementKind;
use crate::error::{Result, SqlError};

/// Handle to the scope stack of one builder session.
///
/// Cloning the handle shares the stack. A context belongs to one thread; use
/// a separate context per thread to build statements concurrently.
#[derive(Debug, Clone, Default)]
pub struct CriteriaContext {
    stack: Rc<RefCell<ScopeStack>>,
}

impl CriteriaContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true while a statement is being built.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.stack.borrow().current().is_some()
    }

    /// Returns the innermost open scope.
    #[must_use]
    pub fn current(&self) -> Option<ScopeId> {
        self.stack.borrow().current()
    }

    /// Returns the number of open scopes.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.borrow().depth()
    }

    fn read<R>(&self, f: impl FnOnce(&ScopeStack) -> R) -> R {
        f(&self.stack.borrow())
    }

    fn write<R>(&self, f: impl FnOnce(&mut ScopeStack) -> R) -> R {
        f(&mut self.stack.borrow_mut())
    }
}

#[derive(Debug)]
struct ScopeGuard {
    ctx: CriteriaContext,
    id: ScopeId,
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        let Ok(mut stack) = self.ctx.stack.try_borrow_mut() else {
            return;
        };
        if stack.discard(self.id) {
            warn!(scope = %self.id, "discarded scope of a statement dropped while building");
        }
    }
}

/// Binds a statement to its open scope.
///
/// Dropping a session whose scope is still open discards that scope, so an
/// abandoned statement never blocks the statements built after it. Clones
/// are detached: a copied statement cannot register into the original scope.
#[derive(Debug, Default)]
pub(crate) struct Session {
    guard: Option<ScopeGuard>,
}

impl Session {
    /// Opens a top-level scope.
    pub(crate) fn root(ctx: &CriteriaContext, kind: StatementKind) -> Result<(Self, ScopeId)> {
        let id = ctx.write(|stack| stack.push_root(kind))?;
        Ok((Self::attached(ctx.clone(), id), id))
    }

    /// Opens a scope nested in this session's scope.
    pub(crate) fn nested(&self, kind: StatementKind) -> Result<(Self, ScopeId)> {
        let guard = self.guard()?;
        let id = guard.ctx.write(|stack| stack.push_nested(guard.id, kind))?;
        Ok((Self::attached(guard.ctx.clone(), id), id))
    }

    pub(crate) fn read<R>(&self, f: impl FnOnce(&ScopeStack, ScopeId) -> Result<R>) -> Result<R> {
        let guard = self.guard()?;
        guard.ctx.read(|stack| f(stack, guard.id))
    }

    pub(crate) fn write<R>(
        &self,
        f: impl FnOnce(&mut ScopeStack, ScopeId) -> Result<R>,
    ) -> Result<R> {
        let guard = self.guard()?;
        guard.ctx.write(|stack| f(stack, guard.id))
    }

    /// Pops the scope; on failure the session stays attached.
    pub(crate) fn close(&mut self) -> Result<()> {
        let guard = self.guard()?;
        guard.ctx.write(|stack| stack.pop(guard.id))?;
        self.guard = None;
        Ok(())
    }

    const fn attached(ctx: CriteriaContext, id: ScopeId) -> Self {
        Self {
            guard: Some(ScopeGuard { ctx, id }),
        }
    }

    fn guard(&self) -> Result<&ScopeGuard> {
        self.guard.as_ref().ok_or(SqlError::NoActiveContext)
    }
}

impl Clone for Session {
    fn clone(&self) -> Self {
        Self::default()
    }
}

impl PartialEq for Session {
    fn eq(&self, _: &Self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dropping_session_discards_scope() {
        let ctx = CriteriaContext::new();
        let (session, _) = Session::root(&ctx, StatementKind::Select).unwrap();
        let (nested, _) = session.nested(StatementKind::Select).unwrap();
        assert_eq!(ctx.depth(), 2);
        drop(session);
        assert!(!ctx.is_active());
        drop(nested);
        assert!(Session::root(&ctx, StatementKind::Update).is_ok());
    }

    #[test]
    fn test_close_detaches_session() {
        let ctx = CriteriaContext::new();
        let (mut session, id) = Session::root(&ctx, StatementKind::Delete).unwrap();
        assert_eq!(ctx.current(), Some(id));
        session.close().unwrap();
        assert!(!ctx.is_active());
        assert_eq!(session.close(), Err(SqlError::NoActiveContext));
    }

    #[test]
    fn test_close_out_of_order_keeps_session() {
        let ctx = CriteriaContext::new();
        let (mut outer, _) = Session::root(&ctx, StatementKind::Select).unwrap();
        let (mut inner, _) = outer.nested(StatementKind::Select).unwrap();
        assert!(matches!(
            outer.close(),
            Err(SqlError::ScopeMismatch { .. })
        ));
        inner.close().unwrap();
        outer.close().unwrap();
        assert_eq!(ctx.depth(), 0);
    }

    #[test]
    fn test_clone_is_detached() {
        let ctx = CriteriaContext::new();
        let (session, _) = Session::root(&ctx, StatementKind::Select).unwrap();
        let copy = session.clone();
        assert_eq!(
            copy.read(|_, id| Ok(id)),
            Err(SqlError::NoActiveContext)
        );
        assert!(ctx.is_active());
    }
}

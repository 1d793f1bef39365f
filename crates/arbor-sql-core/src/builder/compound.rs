//! Set operations: UNION, INTERSECT and EXCEPT.

use tracing::debug;

use super::require_prepared;
use crate::ast::{
    CompoundQuery, Expr, Lifecycle, OrderBy, OrderDirection, Query, SelectionRef, SetOperator,
};
use crate::error::{Result, SqlError};

impl Query {
    /// `self UNION rhs`
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::SetOperationArity`] when the operands select
    /// different column counts; both operands must be prepared.
    pub fn union(self, rhs: impl Into<Self>) -> Result<Compound> {
        Compound::combine(self, SetOperator::Union, false, rhs.into())
    }

    /// `self UNION ALL rhs`
    ///
    /// # Errors
    ///
    /// As [`Query::union`].
    pub fn union_all(self, rhs: impl Into<Self>) -> Result<Compound> {
        Compound::combine(self, SetOperator::Union, true, rhs.into())
    }

    /// `self INTERSECT rhs`
    ///
    /// # Errors
    ///
    /// As [`Query::union`].
    pub fn intersect(self, rhs: impl Into<Self>) -> Result<Compound> {
        Compound::combine(self, SetOperator::Intersect, false, rhs.into())
    }

    /// `self INTERSECT ALL rhs`
    ///
    /// # Errors
    ///
    /// As [`Query::union`].
    pub fn intersect_all(self, rhs: impl Into<Self>) -> Result<Compound> {
        Compound::combine(self, SetOperator::Intersect, true, rhs.into())
    }

    /// `self EXCEPT rhs`
    ///
    /// # Errors
    ///
    /// As [`Query::union`].
    pub fn except(self, rhs: impl Into<Self>) -> Result<Compound> {
        Compound::combine(self, SetOperator::Except, false, rhs.into())
    }

    /// `self EXCEPT ALL rhs`
    ///
    /// # Errors
    ///
    /// As [`Query::union`].
    pub fn except_all(self, rhs: impl Into<Self>) -> Result<Compound> {
        Compound::combine(self, SetOperator::Except, true, rhs.into())
    }
}

/// A set operation under construction.
///
/// ORDER BY of a compound query may only name the output columns, i.e. the
/// selection aliases of the left operand.
#[derive(Debug, Clone, PartialEq)]
pub struct Compound {
    query: CompoundQuery,
}

impl Compound {
    fn combine(left: Query, op: SetOperator, all: bool, right: Query) -> Result<Self> {
        require_prepared(&left, "combine")?;
        require_prepared(&right, "combine")?;
        if left.selection_count() != right.selection_count() {
            return Err(SqlError::SetOperationArity {
                operator: op.as_str(),
                left: left.selection_count(),
                right: right.selection_count(),
            });
        }
        Ok(Self {
            query: CompoundQuery {
                left,
                op,
                all,
                right,
                order_by: vec![],
                limit: None,
                offset: None,
                lifecycle: Lifecycle::Building,
            },
        })
    }

    /// Prepares this operation and unions it with `rhs`.
    ///
    /// # Errors
    ///
    /// As [`Query::union`].
    pub fn union(self, rhs: impl Into<Query>) -> Result<Self> {
        self.prepare()?.union(rhs)
    }

    /// Prepares this operation and unions it with `rhs`, keeping duplicates.
    ///
    /// # Errors
    ///
    /// As [`Query::union`].
    pub fn union_all(self, rhs: impl Into<Query>) -> Result<Self> {
        self.prepare()?.union_all(rhs)
    }

    /// Orders the combined result by an output column.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::UnresolvedReference`] if `alias` is not an output
    /// column.
    pub fn order_by(mut self, alias: &str, direction: OrderDirection) -> Result<Self> {
        let selection = self
            .query
            .left
            .selections()
            .iter()
            .find(|s| s.alias == alias)
            .ok_or_else(|| SqlError::UnresolvedReference {
                reference: String::from(alias),
            })?;
        let expr = Expr::Selection(SelectionRef {
            name: selection.alias.clone(),
            value_type: selection.value_type(),
            depth: 0,
        });
        self.query.order_by.push(OrderBy::new(expr, direction));
        Ok(self)
    }

    #[must_use]
    pub const fn limit(mut self, limit: u64) -> Self {
        self.query.limit = Some(limit);
        self
    }

    #[must_use]
    pub const fn offset(mut self, offset: u64) -> Self {
        self.query.offset = Some(offset);
        self
    }

    /// Freezes the operation into a query.
    ///
    /// # Errors
    ///
    /// Never fails today; the signature matches the statement builders.
    pub fn prepare(mut self) -> Result<Query> {
        self.query.lifecycle = Lifecycle::Prepared;
        debug!(
            operator = self.query.op.as_str(),
            all = self.query.all,
            columns = self.query.left.selection_count(),
            "compound query prepared"
        );
        Ok(Query::from(self.query))
    }
}

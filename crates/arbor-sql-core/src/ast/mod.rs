//! Statement and expression trees.

mod expression;
mod function;
mod statement;

pub use expression::{Expr, FieldRef, Predicate, SelectionRef};
pub use function::{
    CaseExpr, FrameBound, FrameUnits, FunctionArgs, FunctionCall, FunctionKind, WindowFrame,
    WindowFunction, WindowSpec,
};
pub(crate) use statement::map_columns;
pub use statement::{
    Assignment, CompoundQuery, Cte, CteColumn, DeleteStatement, InsertSource, InsertStatement,
    Join, JoinType, Lifecycle, LockMode, NullOrdering, OrderBy, OrderDirection, Query,
    SelectStatement, Selection, SetOperator, Statement, StatementKind, TableRef, UpdateStatement,
};

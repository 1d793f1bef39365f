//! Function calls, CASE expressions and window specifications.

use super::expression::Expr;
use super::statement::OrderBy;
use crate::types::ValueType;

/// How a function may be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    /// A row-level function such as `LOWER`.
    Scalar,
    /// An aggregate such as `SUM`; may also be used as a window function.
    Aggregate,
    /// A pure window function such as `ROW_NUMBER`; requires `OVER`.
    Window,
}

/// Arguments of a function call.
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionArgs {
    /// `COUNT(*)`
    Star,
    List(Vec<Expr>),
}

/// A function call.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub args: FunctionArgs,
    pub distinct: bool,
    pub kind: FunctionKind,
    pub return_type: ValueType,
}

impl FunctionCall {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        args: Vec<Expr>,
        kind: FunctionKind,
        return_type: ValueType,
    ) -> Self {
        Self {
            name: name.into(),
            args: FunctionArgs::List(args),
            distinct: false,
            kind,
            return_type,
        }
    }
}

/// A CASE expression.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseExpr {
    /// The operand of a simple CASE (`CASE x WHEN 1 THEN ...`).
    pub operand: Option<Box<Expr>>,
    /// `(WHEN, THEN)` pairs, in order.
    pub branches: Vec<(Expr, Expr)>,
    pub otherwise: Option<Box<Expr>>,
    /// Common type of every THEN and ELSE branch.
    pub value_type: ValueType,
}

/// A function evaluated over a window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowFunction {
    pub function: FunctionCall,
    pub spec: WindowSpec,
}

/// The `OVER (...)` clause of a window function.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WindowSpec {
    pub partition_by: Vec<Expr>,
    pub order_by: Vec<OrderBy>,
    pub frame: Option<WindowFrame>,
}

impl WindowSpec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn partition_by(mut self, expr: impl Into<Expr>) -> Self {
        self.partition_by.push(expr.into());
        self
    }

    #[must_use]
    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }

    /// `ROWS BETWEEN start AND end`
    #[must_use]
    pub const fn rows(mut self, start: FrameBound, end: FrameBound) -> Self {
        self.frame = Some(WindowFrame {
            units: FrameUnits::Rows,
            start,
            end,
        });
        self
    }

    /// `RANGE BETWEEN start AND end`
    #[must_use]
    pub const fn range(mut self, start: FrameBound, end: FrameBound) -> Self {
        self.frame = Some(WindowFrame {
            units: FrameUnits::Range,
            start,
            end,
        });
        self
    }
}

/// A window frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowFrame {
    pub units: FrameUnits,
    pub start: FrameBound,
    pub end: FrameBound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameUnits {
    Rows,
    Range,
}

impl FrameUnits {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rows => "ROWS",
            Self::Range => "RANGE",
        }
    }
}

/// One end of a window frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameBound {
    UnboundedPreceding,
    Preceding(u64),
    CurrentRow,
    Following(u64),
    UnboundedFollowing,
}

impl FrameBound {
    /// Returns the SQL representation.
    #[must_use]
    pub fn to_sql(self) -> String {
        match self {
            Self::UnboundedPreceding => String::from("UNBOUNDED PRECEDING"),
            Self::Preceding(n) => format!("{n} PRECEDING"),
            Self::CurrentRow => String::from("CURRENT ROW"),
            Self::Following(n) => format!("{n} FOLLOWING"),
            Self::UnboundedFollowing => String::from("UNBOUNDED FOLLOWING"),
        }
    }
}

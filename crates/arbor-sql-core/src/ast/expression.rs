//! Expression and predicate nodes.
//!
//! [`Expr`] is a closed sum type; every node carries or derives its
//! [`ValueType`], so type errors surface while the expression is built rather
//! than when it is rendered. Comparisons and other boolean-valued operations
//! return a [`Predicate`], the only thing WHERE, HAVING and ON accept.

use std::ops;

use super::function::{CaseExpr, FunctionCall, FunctionKind, WindowFunction, WindowSpec};
use super::statement::{Lifecycle, OrderBy, OrderDirection, Query, Selection};
use crate::error::{Result, SqlError};
use crate::operator::{
    BinaryOp, LogicalOp, UnaryOp, PRECEDENCE_AND, PRECEDENCE_ATOM, PRECEDENCE_COMPARISON,
    PRECEDENCE_NOT, PRECEDENCE_OR,
};
use crate::types::{self, ValueType};
use crate::value::{SqlValue, ToSqlValue, TypedValue};

/// A resolved reference to a column of a table, derived table or CTE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRef {
    /// The alias the column is reached through.
    pub qualifier: String,
    pub column: String,
    pub value_type: ValueType,
    pub nullable: bool,
    /// Number of scopes between the reference and its binding; zero unless
    /// the reference is correlated.
    pub depth: usize,
}

/// A resolved reference to a selection alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionRef {
    pub name: String,
    pub value_type: ValueType,
    pub depth: usize,
}

/// An SQL expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Field(FieldRef),
    Selection(SelectionRef),
    /// A value the caller asked to appear in the SQL text where safe.
    Literal(TypedValue),
    /// A value bound as a parameter unless the dialect inlines it.
    Param(TypedValue),
    /// A named placeholder filled from the rows of a batch.
    BatchParam { name: String, value_type: ValueType },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        value_type: ValueType,
    },
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
        value_type: ValueType,
    },
    Between {
        expr: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
        negated: bool,
    },
    InList {
        expr: Box<Expr>,
        list: Vec<Expr>,
        negated: bool,
    },
    InQuery {
        expr: Box<Expr>,
        query: Box<Query>,
        negated: bool,
    },
    Exists { query: Box<Query>, negated: bool },
    /// A sub-query selecting exactly one column.
    ScalarQuery(Box<Query>),
    Function(FunctionCall),
    /// A row value, `(a, b)`.
    Row(Vec<Expr>),
    Case(CaseExpr),
    Window(WindowFunction),
    Cast { expr: Box<Expr>, target: ValueType },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
}

impl Expr {
    /// A parameter holding a host value.
    pub fn param<T: ToSqlValue>(value: T) -> Self {
        Self::Param(TypedValue::from_host(value))
    }

    /// A literal holding a host value.
    pub fn literal<T: ToSqlValue>(value: T) -> Self {
        Self::Literal(TypedValue::from_host(value))
    }

    /// A parameter with an explicit type.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::TypeMismatch`] if the value does not fit the type.
    pub fn typed_param(value_type: ValueType, value: SqlValue) -> Result<Self> {
        TypedValue::new(value_type, value).map(Self::Param)
    }

    /// A typed NULL parameter.
    #[must_use]
    pub const fn null(value_type: ValueType) -> Self {
        Self::Param(TypedValue::null(value_type))
    }

    /// A placeholder bound per row of a batch.
    #[must_use]
    pub fn batch_param(name: impl Into<String>, value_type: ValueType) -> Self {
        Self::BatchParam {
            name: name.into(),
            value_type,
        }
    }

    /// A row value.
    #[must_use]
    pub fn row<I, E>(items: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Self>,
    {
        Self::Row(items.into_iter().map(Into::into).collect())
    }

    /// A scalar sub-query.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::ScalarArity`] unless the query selects exactly one
    /// column, and [`SqlError::IllegalLifecycleTransition`] if it is not
    /// prepared.
    pub fn scalar(query: impl Into<Query>) -> Result<Self> {
        let query = sub_query(query.into())?;
        let found = query.selection_count();
        if found != 1 {
            return Err(SqlError::ScalarArity { found });
        }
        Ok(Self::ScalarQuery(query))
    }

    /// Returns the type the expression evaluates to.
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Field(field) => field.value_type,
            Self::Selection(selection) => selection.value_type,
            Self::Literal(value) | Self::Param(value) => value.value_type,
            Self::BatchParam { value_type, .. }
            | Self::Unary { value_type, .. }
            | Self::Binary { value_type, .. } => *value_type,
            Self::Between { .. }
            | Self::InList { .. }
            | Self::InQuery { .. }
            | Self::Exists { .. }
            | Self::And(..)
            | Self::Or(..)
            | Self::Not(_) => ValueType::Boolean,
            Self::ScalarQuery(query) => query
                .selections()
                .first()
                .map_or(ValueType::Unknown, Selection::value_type),
            Self::Function(call) => call.return_type,
            Self::Row(_) => ValueType::Unknown,
            Self::Case(case) => case.value_type,
            Self::Window(window) => window.function.return_type,
            Self::Cast { target, .. } => *target,
        }
    }

    /// Returns the binding strength of the node's outermost operator.
    #[must_use]
    pub const fn precedence(&self) -> u8 {
        match self {
            Self::Or(..) => PRECEDENCE_OR,
            Self::And(..) => PRECEDENCE_AND,
            Self::Not(_) => PRECEDENCE_NOT,
            Self::Unary { op, .. } => op.info().precedence,
            Self::Binary { op, .. } => op.info().precedence,
            Self::Between { .. } | Self::InList { .. } | Self::InQuery { .. } => {
                PRECEDENCE_COMPARISON
            }
            _ => PRECEDENCE_ATOM,
        }
    }

    /// Names the expression as an output column.
    #[must_use]
    pub fn alias(self, name: impl Into<String>) -> Selection {
        Selection::new(self, name)
    }

    #[must_use]
    pub const fn asc(self) -> OrderBy {
        OrderBy::new(self, OrderDirection::Asc)
    }

    #[must_use]
    pub const fn desc(self) -> OrderBy {
        OrderBy::new(self, OrderDirection::Desc)
    }

    /// `CAST(self AS target)`
    #[must_use]
    pub fn cast(self, target: ValueType) -> Self {
        Self::Cast {
            expr: Box::new(self),
            target,
        }
    }

    /// Applies a window to an aggregate or window function.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::TypeMismatch`] if the expression is not such a
    /// function call.
    pub fn over(self, spec: WindowSpec) -> Result<Self> {
        match self {
            Self::Function(function) if function.kind != FunctionKind::Scalar => {
                Ok(Self::Window(WindowFunction { function, spec }))
            }
            other => Err(SqlError::TypeMismatch {
                operator: "OVER",
                left: other.value_type(),
                right: None,
            }),
        }
    }

    // ---- comparisons -------------------------------------------------

    #[allow(clippy::should_implement_trait)]
    pub fn eq(self, rhs: impl Into<Self>) -> Predicate {
        self.compare(BinaryOp::Eq, rhs.into())
    }

    pub fn not_eq(self, rhs: impl Into<Self>) -> Predicate {
        self.compare(BinaryOp::NotEq, rhs.into())
    }

    pub fn lt(self, rhs: impl Into<Self>) -> Predicate {
        self.compare(BinaryOp::Lt, rhs.into())
    }

    pub fn lt_eq(self, rhs: impl Into<Self>) -> Predicate {
        self.compare(BinaryOp::LtEq, rhs.into())
    }

    pub fn gt(self, rhs: impl Into<Self>) -> Predicate {
        self.compare(BinaryOp::Gt, rhs.into())
    }

    pub fn gt_eq(self, rhs: impl Into<Self>) -> Predicate {
        self.compare(BinaryOp::GtEq, rhs.into())
    }

    /// Equality that treats two NULLs as equal.
    pub fn null_safe_eq(self, rhs: impl Into<Self>) -> Predicate {
        self.compare(BinaryOp::NullSafeEq, rhs.into())
    }

    pub fn is_distinct_from(self, rhs: impl Into<Self>) -> Predicate {
        self.compare(BinaryOp::IsDistinctFrom, rhs.into())
    }

    pub fn is_not_distinct_from(self, rhs: impl Into<Self>) -> Predicate {
        self.compare(BinaryOp::IsNotDistinctFrom, rhs.into())
    }

    pub fn like(self, pattern: impl Into<Self>) -> Predicate {
        self.compare(BinaryOp::Like, pattern.into())
    }

    pub fn not_like(self, pattern: impl Into<Self>) -> Predicate {
        self.compare(BinaryOp::NotLike, pattern.into())
    }

    /// Case-insensitive LIKE.
    pub fn ilike(self, pattern: impl Into<Self>) -> Predicate {
        self.compare(BinaryOp::ILike, pattern.into())
    }

    pub fn not_ilike(self, pattern: impl Into<Self>) -> Predicate {
        self.compare(BinaryOp::NotILike, pattern.into())
    }

    pub fn regex_match(self, pattern: impl Into<Self>) -> Predicate {
        self.compare(BinaryOp::RegexMatch, pattern.into())
    }

    #[must_use]
    pub fn is_null(self) -> Predicate {
        self.null_test(UnaryOp::IsNull)
    }

    #[must_use]
    pub fn is_not_null(self) -> Predicate {
        self.null_test(UnaryOp::IsNotNull)
    }

    pub fn between(self, low: impl Into<Self>, high: impl Into<Self>) -> Predicate {
        self.range(low.into(), high.into(), false)
    }

    pub fn not_between(self, low: impl Into<Self>, high: impl Into<Self>) -> Predicate {
        self.range(low.into(), high.into(), true)
    }

    /// `self IN (v1, v2, ...)`
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::EmptyList`] for an empty list.
    pub fn in_list<I, E>(self, values: I) -> Result<Predicate>
    where
        I: IntoIterator<Item = E>,
        E: Into<Self>,
    {
        self.membership(values, false)
    }

    /// `self NOT IN (v1, v2, ...)`
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::EmptyList`] for an empty list.
    pub fn not_in_list<I, E>(self, values: I) -> Result<Predicate>
    where
        I: IntoIterator<Item = E>,
        E: Into<Self>,
    {
        self.membership(values, true)
    }

    /// `self IN (SELECT ...)`
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::ColumnCountMismatch`] when the query's column count
    /// differs from the width of `self` (one, or the length of a row value).
    pub fn in_query(self, query: impl Into<Query>) -> Result<Predicate> {
        self.membership_query(query.into(), false)
    }

    /// `self NOT IN (SELECT ...)`
    ///
    /// # Errors
    ///
    /// Same as [`Expr::in_query`].
    pub fn not_in_query(self, query: impl Into<Query>) -> Result<Predicate> {
        self.membership_query(query.into(), true)
    }

    // ---- arithmetic --------------------------------------------------

    /// `self + rhs`
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::TypeMismatch`] for non-numeric operands.
    pub fn plus(self, rhs: impl Into<Self>) -> Result<Self> {
        self.binary(BinaryOp::Add, rhs.into())
    }

    /// `self - rhs`
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::TypeMismatch`] for non-numeric operands.
    pub fn minus(self, rhs: impl Into<Self>) -> Result<Self> {
        self.binary(BinaryOp::Sub, rhs.into())
    }

    /// `self * rhs`
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::TypeMismatch`] for non-numeric operands.
    pub fn times(self, rhs: impl Into<Self>) -> Result<Self> {
        self.binary(BinaryOp::Mul, rhs.into())
    }

    /// `self / rhs`
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::TypeMismatch`] for non-numeric operands.
    pub fn divide(self, rhs: impl Into<Self>) -> Result<Self> {
        self.binary(BinaryOp::Div, rhs.into())
    }

    /// `self % rhs`
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::TypeMismatch`] for non-numeric operands.
    pub fn modulo(self, rhs: impl Into<Self>) -> Result<Self> {
        self.binary(BinaryOp::Mod, rhs.into())
    }

    /// `self & rhs`
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::TypeMismatch`] for non-integer operands.
    pub fn bit_and(self, rhs: impl Into<Self>) -> Result<Self> {
        self.binary(BinaryOp::BitAnd, rhs.into())
    }

    /// `self | rhs`
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::TypeMismatch`] for non-integer operands.
    pub fn bit_or(self, rhs: impl Into<Self>) -> Result<Self> {
        self.binary(BinaryOp::BitOr, rhs.into())
    }

    /// `self ^ rhs`
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::TypeMismatch`] for non-integer operands.
    pub fn bit_xor(self, rhs: impl Into<Self>) -> Result<Self> {
        self.binary(BinaryOp::BitXor, rhs.into())
    }

    /// `self << rhs`
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::TypeMismatch`] for non-integer operands.
    pub fn shift_left(self, rhs: impl Into<Self>) -> Result<Self> {
        self.binary(BinaryOp::LeftShift, rhs.into())
    }

    /// `self >> rhs`
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::TypeMismatch`] for non-integer operands.
    pub fn shift_right(self, rhs: impl Into<Self>) -> Result<Self> {
        self.binary(BinaryOp::RightShift, rhs.into())
    }

    /// `self || rhs`
    ///
    /// # Errors
    ///
    /// Never fails today; the signature matches the other operators.
    pub fn concat(self, rhs: impl Into<Self>) -> Result<Self> {
        self.binary(BinaryOp::Concat, rhs.into())
    }

    /// `-self`
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::TypeMismatch`] for a non-numeric operand.
    pub fn negate(self) -> Result<Self> {
        self.unary(UnaryOp::Neg)
    }

    /// `~self`
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::TypeMismatch`] for a non-integer operand.
    pub fn bit_not(self) -> Result<Self> {
        self.unary(UnaryOp::BitNot)
    }

    // ---- helpers -----------------------------------------------------

    /// Re-declares an untyped value as `target` where the value fits.
    ///
    /// Used on the value side of comparisons so that `age = 30` binds the
    /// parameter with the column's type.
    pub(crate) fn coerce_to(self, target: ValueType) -> Self {
        if target == ValueType::Unknown {
            return self;
        }
        match self {
            Self::Param(value) => Self::Param(adopt(value, target)),
            Self::Literal(value) => Self::Literal(adopt(value, target)),
            Self::BatchParam {
                name,
                value_type: ValueType::Unknown,
            } => Self::BatchParam {
                name,
                value_type: target,
            },
            other => other,
        }
    }

    /// Like [`Expr::coerce_to`], but fails when the value cannot take the
    /// target type. Used for INSERT values and UPDATE assignments.
    pub(crate) fn coerce_strict(self, target: ValueType, construct: &'static str) -> Result<Self> {
        match self {
            Self::Param(value) => value.retype(target).map(Self::Param),
            Self::Literal(value) => value.retype(target).map(Self::Literal),
            Self::BatchParam { name, value_type } => {
                types::common_type(construct, target, value_type)?;
                Ok(Self::BatchParam {
                    name,
                    value_type: target,
                })
            }
            other => {
                types::common_type(construct, target, other.value_type())?;
                Ok(other)
            }
        }
    }

    fn compare(self, op: BinaryOp, rhs: Self) -> Predicate {
        let rhs = rhs.coerce_to(self.value_type());
        Predicate(Self::Binary {
            left: Box::new(self),
            op,
            right: Box::new(rhs),
            value_type: ValueType::Boolean,
        })
    }

    fn binary(self, op: BinaryOp, rhs: Self) -> Result<Self> {
        let value_type = types::binary_result_type(self.value_type(), op, rhs.value_type())?;
        Ok(Self::Binary {
            left: Box::new(self),
            op,
            right: Box::new(rhs),
            value_type,
        })
    }

    fn unary(self, op: UnaryOp) -> Result<Self> {
        let value_type = types::unary_result_type(op, self.value_type())?;
        Ok(Self::Unary {
            op,
            operand: Box::new(self),
            value_type,
        })
    }

    fn null_test(self, op: UnaryOp) -> Predicate {
        Predicate(Self::Unary {
            op,
            operand: Box::new(self),
            value_type: ValueType::Boolean,
        })
    }

    fn range(self, low: Self, high: Self, negated: bool) -> Predicate {
        let target = self.value_type();
        Predicate(Self::Between {
            expr: Box::new(self),
            low: Box::new(low.coerce_to(target)),
            high: Box::new(high.coerce_to(target)),
            negated,
        })
    }

    fn membership<I, E>(self, values: I, negated: bool) -> Result<Predicate>
    where
        I: IntoIterator<Item = E>,
        E: Into<Self>,
    {
        let target = self.value_type();
        let list: Vec<Self> = values
            .into_iter()
            .map(|value| value.into().coerce_to(target))
            .collect();
        if list.is_empty() {
            return Err(SqlError::EmptyList {
                operator: if negated { "NOT IN" } else { "IN" },
            });
        }
        Ok(Predicate(Self::InList {
            expr: Box::new(self),
            list,
            negated,
        }))
    }

    fn membership_query(self, query: Query, negated: bool) -> Result<Predicate> {
        let query = sub_query(query)?;
        let expected = match &self {
            Self::Row(items) => items.len(),
            _ => 1,
        };
        let found = query.selection_count();
        if expected != found {
            return Err(SqlError::ColumnCountMismatch {
                context: "IN sub-query",
                expected,
                found,
            });
        }
        Ok(Predicate(Self::InQuery {
            expr: Box::new(self),
            query,
            negated,
        }))
    }
}

/// Checks that a query embedded in an expression has been prepared.
fn sub_query(query: Query) -> Result<Box<Query>> {
    query
        .lifecycle()
        .require(Lifecycle::Prepared, query.kind(), "embed")?;
    Ok(Box::new(query))
}

fn adopt(value: TypedValue, target: ValueType) -> TypedValue {
    if value.value_type == target {
        return value;
    }
    TypedValue::new(target, value.value.clone()).unwrap_or(value)
}

macro_rules! impl_from_host {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Expr {
                fn from(value: $ty) -> Self {
                    Self::param(value)
                }
            }
        )*
    };
}

impl_from_host!(bool, i8, i16, i32, i64, u8, u16, u32, f32, f64, String, &str, Vec<u8>, SqlValue);

impl<T: ToSqlValue> From<Option<T>> for Expr {
    fn from(value: Option<T>) -> Self {
        Self::param(value)
    }
}

impl From<TypedValue> for Expr {
    fn from(value: TypedValue) -> Self {
        Self::Param(value)
    }
}

impl From<FieldRef> for Expr {
    fn from(field: FieldRef) -> Self {
        Self::Field(field)
    }
}

impl From<SelectionRef> for Expr {
    fn from(selection: SelectionRef) -> Self {
        Self::Selection(selection)
    }
}

impl From<Predicate> for Expr {
    fn from(predicate: Predicate) -> Self {
        predicate.0
    }
}

impl From<FunctionCall> for Expr {
    fn from(call: FunctionCall) -> Self {
        Self::Function(call)
    }
}

/// A boolean-valued expression.
///
/// WHERE, HAVING and ON only accept predicates, so a non-boolean condition
/// is a compile error rather than a runtime one. Predicates compose with
/// [`Predicate::and`], [`Predicate::or`] and [`Predicate::not`], or with the
/// `&`, `|` and `!` operators.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate(Expr);

impl Predicate {
    /// `self AND other`
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self(Expr::And(Box::new(self.0), Box::new(other.0)))
    }

    /// `self OR other`
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self(Expr::Or(Box::new(self.0), Box::new(other.0)))
    }

    /// `NOT self`; negating a negation yields the original predicate.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        match self.0 {
            Expr::Not(inner) => Self(*inner),
            other => Self(Expr::Not(Box::new(other))),
        }
    }

    /// `EXISTS (query)`
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::IllegalLifecycleTransition`] if the query is not
    /// prepared.
    pub fn exists(query: impl Into<Query>) -> Result<Self> {
        Ok(Self(Expr::Exists {
            query: sub_query(query.into())?,
            negated: false,
        }))
    }

    /// `NOT EXISTS (query)`
    ///
    /// # Errors
    ///
    /// Same as [`Predicate::exists`].
    pub fn not_exists(query: impl Into<Query>) -> Result<Self> {
        Ok(Self(Expr::Exists {
            query: sub_query(query.into())?,
            negated: true,
        }))
    }

    /// A constant predicate.
    #[must_use]
    pub fn constant(value: bool) -> Self {
        Self(Expr::literal(value))
    }

    #[must_use]
    pub const fn as_expr(&self) -> &Expr {
        &self.0
    }

    #[must_use]
    pub fn into_expr(self) -> Expr {
        self.0
    }
}

impl TryFrom<Expr> for Predicate {
    type Error = SqlError;

    /// Accepts boolean-typed expressions (and expressions of unknown type).
    fn try_from(expr: Expr) -> Result<Self> {
        types::logical_operand(LogicalOp::And, expr.value_type())?;
        Ok(Self(expr))
    }
}

impl ops::Not for Predicate {
    type Output = Self;

    fn not(self) -> Self {
        Self::not(self)
    }
}

impl ops::BitAnd for Predicate {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        self.and(rhs)
    }
}

impl ops::BitOr for Predicate {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.or(rhs)
    }
}

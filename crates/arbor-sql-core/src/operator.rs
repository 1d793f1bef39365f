//! Operator catalog.
//!
//! Every operator is identified by an enum variant and described by a single
//! [`OperatorInfo`] row: render text, arity, fixity, precedence and class.
//! The renderer consults the catalog for bracket placement; the type resolver
//! consults it for error messages. Operators compare by identity, never by
//! their text (`-` is both [`UnaryOp::Neg`] and [`BinaryOp::Sub`]).

/// Number of operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arity {
    Unary,
    Binary,
    Ternary,
}

/// Where the operator text goes relative to its operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fixity {
    /// `op x`
    Prefix,
    /// `x op y`, or `x op y AND z` for ternaries.
    Infix,
    /// `x op`
    Postfix,
    /// `op (x)`
    Wrap,
}

/// Operator family, used for bracketing and type checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorClass {
    Arithmetic,
    Bitwise,
    Concat,
    Comparison,
    Pattern,
    NullTest,
    Range,
    Membership,
    Existence,
    Logical,
}

impl OperatorClass {
    /// Operators of these classes do not chain: `a = b = c` is not SQL.
    #[must_use]
    pub const fn is_non_associative(self) -> bool {
        matches!(
            self,
            Self::Comparison | Self::Pattern | Self::NullTest | Self::Range | Self::Membership
        )
    }
}

/// One row of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorInfo {
    /// Render text in the generic dialect.
    pub text: &'static str,
    pub arity: Arity,
    pub fixity: Fixity,
    /// Binding strength; higher binds tighter.
    pub precedence: u8,
    pub class: OperatorClass,
}

const fn info(
    text: &'static str,
    arity: Arity,
    fixity: Fixity,
    precedence: u8,
    class: OperatorClass,
) -> OperatorInfo {
    OperatorInfo {
        text,
        arity,
        fixity,
        precedence,
        class,
    }
}

/// Precedence of OR.
pub const PRECEDENCE_OR: u8 = 1;
/// Precedence of AND.
pub const PRECEDENCE_AND: u8 = 2;
/// Precedence of NOT.
pub const PRECEDENCE_NOT: u8 = 3;
/// Precedence shared by comparisons, pattern matches, null tests, ranges and
/// membership tests.
pub const PRECEDENCE_COMPARISON: u8 = 4;
/// Precedence of unary minus and bitwise NOT.
pub const PRECEDENCE_UNARY: u8 = 11;
/// Precedence of atoms: columns, literals, parameters, calls, sub-queries.
pub const PRECEDENCE_ATOM: u8 = u8::MAX;

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Arithmetic negation (`-`).
    Neg,
    /// Bitwise NOT (`~`).
    BitNot,
    /// Logical NOT.
    Not,
    IsNull,
    IsNotNull,
}

impl UnaryOp {
    /// Returns the catalog row of the operator.
    #[must_use]
    pub const fn info(self) -> OperatorInfo {
        use Arity::Unary;
        use Fixity::{Postfix, Prefix};
        match self {
            Self::Neg => info("-", Unary, Prefix, PRECEDENCE_UNARY, OperatorClass::Arithmetic),
            Self::BitNot => info("~", Unary, Prefix, PRECEDENCE_UNARY, OperatorClass::Bitwise),
            Self::Not => info("NOT", Unary, Prefix, PRECEDENCE_NOT, OperatorClass::Logical),
            Self::IsNull => info(
                "IS NULL",
                Unary,
                Postfix,
                PRECEDENCE_COMPARISON,
                OperatorClass::NullTest,
            ),
            Self::IsNotNull => info(
                "IS NOT NULL",
                Unary,
                Postfix,
                PRECEDENCE_COMPARISON,
                OperatorClass::NullTest,
            ),
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,

    // Bitwise
    BitAnd,
    BitOr,
    BitXor,
    LeftShift,
    RightShift,

    // String
    Concat,

    // Comparison
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    /// MySQL `<=>`.
    NullSafeEq,
    IsDistinctFrom,
    IsNotDistinctFrom,

    // Pattern matching
    Like,
    NotLike,
    /// PostgreSQL case-insensitive LIKE.
    ILike,
    NotILike,
    /// POSIX regular expression match (`~` in PostgreSQL).
    RegexMatch,
}

impl BinaryOp {
    /// Returns the catalog row of the operator.
    #[must_use]
    pub const fn info(self) -> OperatorInfo {
        use Arity::Binary;
        use Fixity::Infix;
        use OperatorClass::{Arithmetic, Bitwise, Comparison, Concat, Pattern};
        match self {
            Self::Mul => info("*", Binary, Infix, 10, Arithmetic),
            Self::Div => info("/", Binary, Infix, 10, Arithmetic),
            Self::Mod => info("%", Binary, Infix, 10, Arithmetic),
            Self::Add => info("+", Binary, Infix, 9, Arithmetic),
            Self::Sub => info("-", Binary, Infix, 9, Arithmetic),
            Self::Concat => info("||", Binary, Infix, 9, Concat),
            Self::LeftShift => info("<<", Binary, Infix, 8, Bitwise),
            Self::RightShift => info(">>", Binary, Infix, 8, Bitwise),
            Self::BitAnd => info("&", Binary, Infix, 7, Bitwise),
            Self::BitXor => info("^", Binary, Infix, 6, Bitwise),
            Self::BitOr => info("|", Binary, Infix, 5, Bitwise),
            Self::Eq => info("=", Binary, Infix, PRECEDENCE_COMPARISON, Comparison),
            Self::NotEq => info("!=", Binary, Infix, PRECEDENCE_COMPARISON, Comparison),
            Self::Lt => info("<", Binary, Infix, PRECEDENCE_COMPARISON, Comparison),
            Self::LtEq => info("<=", Binary, Infix, PRECEDENCE_COMPARISON, Comparison),
            Self::Gt => info(">", Binary, Infix, PRECEDENCE_COMPARISON, Comparison),
            Self::GtEq => info(">=", Binary, Infix, PRECEDENCE_COMPARISON, Comparison),
            Self::NullSafeEq => info("<=>", Binary, Infix, PRECEDENCE_COMPARISON, Comparison),
            Self::IsDistinctFrom => info(
                "IS DISTINCT FROM",
                Binary,
                Infix,
                PRECEDENCE_COMPARISON,
                Comparison,
            ),
            Self::IsNotDistinctFrom => info(
                "IS NOT DISTINCT FROM",
                Binary,
                Infix,
                PRECEDENCE_COMPARISON,
                Comparison,
            ),
            Self::Like => info("LIKE", Binary, Infix, PRECEDENCE_COMPARISON, Pattern),
            Self::NotLike => info("NOT LIKE", Binary, Infix, PRECEDENCE_COMPARISON, Pattern),
            Self::ILike => info("ILIKE", Binary, Infix, PRECEDENCE_COMPARISON, Pattern),
            Self::NotILike => info("NOT ILIKE", Binary, Infix, PRECEDENCE_COMPARISON, Pattern),
            Self::RegexMatch => info("~", Binary, Infix, PRECEDENCE_COMPARISON, Pattern),
        }
    }

    /// Returns true for operators producing a boolean.
    #[must_use]
    pub const fn is_predicate(self) -> bool {
        matches!(
            self.info().class,
            OperatorClass::Comparison | OperatorClass::Pattern
        )
    }
}

/// Boolean connectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    #[must_use]
    pub const fn info(self) -> OperatorInfo {
        match self {
            Self::And => info(
                "AND",
                Arity::Binary,
                Fixity::Infix,
                PRECEDENCE_AND,
                OperatorClass::Logical,
            ),
            Self::Or => info(
                "OR",
                Arity::Binary,
                Fixity::Infix,
                PRECEDENCE_OR,
                OperatorClass::Logical,
            ),
        }
    }
}

/// `BETWEEN` and `NOT BETWEEN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeOp {
    Between,
    NotBetween,
}

impl RangeOp {
    #[must_use]
    pub const fn from_negated(negated: bool) -> Self {
        if negated {
            Self::NotBetween
        } else {
            Self::Between
        }
    }

    #[must_use]
    pub const fn info(self) -> OperatorInfo {
        let text = match self {
            Self::Between => "BETWEEN",
            Self::NotBetween => "NOT BETWEEN",
        };
        info(
            text,
            Arity::Ternary,
            Fixity::Infix,
            PRECEDENCE_COMPARISON,
            OperatorClass::Range,
        )
    }
}

/// `IN` and `NOT IN`, over a value list or a sub-query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MembershipOp {
    In,
    NotIn,
}

impl MembershipOp {
    #[must_use]
    pub const fn from_negated(negated: bool) -> Self {
        if negated {
            Self::NotIn
        } else {
            Self::In
        }
    }

    #[must_use]
    pub const fn info(self) -> OperatorInfo {
        let text = match self {
            Self::In => "IN",
            Self::NotIn => "NOT IN",
        };
        info(
            text,
            Arity::Binary,
            Fixity::Infix,
            PRECEDENCE_COMPARISON,
            OperatorClass::Membership,
        )
    }
}

/// `EXISTS` and `NOT EXISTS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExistsOp {
    Exists,
    NotExists,
}

impl ExistsOp {
    #[must_use]
    pub const fn from_negated(negated: bool) -> Self {
        if negated {
            Self::NotExists
        } else {
            Self::Exists
        }
    }

    #[must_use]
    pub const fn info(self) -> OperatorInfo {
        let text = match self {
            Self::Exists => "EXISTS",
            Self::NotExists => "NOT EXISTS",
        };
        info(
            text,
            Arity::Unary,
            Fixity::Wrap,
            PRECEDENCE_ATOM,
            OperatorClass::Existence,
        )
    }
}

/// Any operator of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Unary(UnaryOp),
    Binary(BinaryOp),
    Logical(LogicalOp),
    Range(RangeOp),
    Membership(MembershipOp),
    Exists(ExistsOp),
}

impl Operator {
    /// Returns the catalog row of the operator.
    #[must_use]
    pub const fn info(self) -> OperatorInfo {
        match self {
            Self::Unary(op) => op.info(),
            Self::Binary(op) => op.info(),
            Self::Logical(op) => op.info(),
            Self::Range(op) => op.info(),
            Self::Membership(op) => op.info(),
            Self::Exists(op) => op.info(),
        }
    }
}

impl From<UnaryOp> for Operator {
    fn from(op: UnaryOp) -> Self {
        Self::Unary(op)
    }
}

impl From<BinaryOp> for Operator {
    fn from(op: BinaryOp) -> Self {
        Self::Binary(op)
    }
}

impl From<LogicalOp> for Operator {
    fn from(op: LogicalOp) -> Self {
        Self::Logical(op)
    }
}

/// Position of a child relative to its parent operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Decides whether a child of `parent` needs brackets.
///
/// A child binding more loosely than its parent is always bracketed. At equal
/// precedence the right operand is bracketed (operators are left
/// associative), and both operands of a non-associative class are bracketed.
/// Prefix operators treat their single operand as a right operand.
#[must_use]
pub fn needs_brackets(parent: Operator, child_precedence: u8, side: Side) -> bool {
    needs_brackets_at(parent, parent.info().precedence, child_precedence, side)
}

/// As [`needs_brackets`], with the parent bound at `parent_precedence`
/// instead of its catalog rank. Dialects that rank binary operators
/// differently render through this.
#[must_use]
pub fn needs_brackets_at(
    parent: Operator,
    parent_precedence: u8,
    child_precedence: u8,
    side: Side,
) -> bool {
    let parent = parent.info();
    if child_precedence == PRECEDENCE_ATOM {
        return false;
    }
    let side = if parent.fixity == Fixity::Prefix {
        Side::Right
    } else {
        side
    };
    child_precedence < parent_precedence
        || (child_precedence == parent_precedence
            && (side == Side::Right || parent.class.is_non_associative()))
}

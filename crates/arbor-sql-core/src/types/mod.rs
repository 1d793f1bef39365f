//! Value types and the type registry.
//!
//! Every SQL value flowing through the compiler carries a [`ValueType`] tag.
//! The tag indexes a read-only registry of [`TypeDescriptor`]s that tells the
//! resolver how a type promotes and tells the renderer whether a value of that
//! type may be written inline as a literal.

mod resolve;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use resolve::{
    binary_result_type, common_type, logical_operand, promote_numeric, unary_result_type,
};

/// The declared type of a column, parameter or expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Boolean,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Decimal,
    Real,
    Double,
    Char,
    Varchar,
    Text,
    Blob,
    Date,
    Time,
    Timestamp,
    Json,
    /// Type not known at construction time (untyped NULL, opaque function).
    Unknown,
}

/// Broad family of a [`ValueType`], used by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCategory {
    Boolean,
    Integer,
    Decimal,
    Float,
    Text,
    Binary,
    Temporal,
    Json,
    Unknown,
}

impl TypeCategory {
    /// Returns true for integer, decimal and floating categories.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Decimal | Self::Float)
    }
}

/// Registry entry describing one [`ValueType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeDescriptor {
    /// The described type.
    pub value_type: ValueType,
    /// Its category.
    pub category: TypeCategory,
    /// Canonical SQL spelling.
    pub sql_name: &'static str,
    /// Width rank inside the category; wider types have higher ranks.
    pub rank: u8,
    /// Whether values of this type may be written inline without binding.
    pub injection_safe: bool,
}

const fn descriptor(
    value_type: ValueType,
    category: TypeCategory,
    sql_name: &'static str,
    rank: u8,
    injection_safe: bool,
) -> TypeDescriptor {
    TypeDescriptor {
        value_type,
        category,
        sql_name,
        rank,
        injection_safe,
    }
}

// Indexed by `ValueType as usize`; entries must follow declaration order.
static REGISTRY: [TypeDescriptor; 17] = [
    descriptor(ValueType::Boolean, TypeCategory::Boolean, "BOOLEAN", 0, true),
    descriptor(ValueType::TinyInt, TypeCategory::Integer, "TINYINT", 1, true),
    descriptor(ValueType::SmallInt, TypeCategory::Integer, "SMALLINT", 2, true),
    descriptor(ValueType::Integer, TypeCategory::Integer, "INTEGER", 3, true),
    descriptor(ValueType::BigInt, TypeCategory::Integer, "BIGINT", 4, true),
    descriptor(ValueType::Decimal, TypeCategory::Decimal, "DECIMAL", 0, false),
    descriptor(ValueType::Real, TypeCategory::Float, "REAL", 1, true),
    descriptor(ValueType::Double, TypeCategory::Float, "DOUBLE", 2, true),
    descriptor(ValueType::Char, TypeCategory::Text, "CHAR", 0, false),
    descriptor(ValueType::Varchar, TypeCategory::Text, "VARCHAR", 1, false),
    descriptor(ValueType::Text, TypeCategory::Text, "TEXT", 2, false),
    descriptor(ValueType::Blob, TypeCategory::Binary, "BLOB", 0, false),
    descriptor(ValueType::Date, TypeCategory::Temporal, "DATE", 0, false),
    descriptor(ValueType::Time, TypeCategory::Temporal, "TIME", 1, false),
    descriptor(ValueType::Timestamp, TypeCategory::Temporal, "TIMESTAMP", 2, false),
    descriptor(ValueType::Json, TypeCategory::Json, "JSON", 0, false),
    descriptor(ValueType::Unknown, TypeCategory::Unknown, "UNKNOWN", 0, false),
];

impl ValueType {
    /// Every value type, in registry order.
    pub const ALL: [Self; 17] = [
        Self::Boolean,
        Self::TinyInt,
        Self::SmallInt,
        Self::Integer,
        Self::BigInt,
        Self::Decimal,
        Self::Real,
        Self::Double,
        Self::Char,
        Self::Varchar,
        Self::Text,
        Self::Blob,
        Self::Date,
        Self::Time,
        Self::Timestamp,
        Self::Json,
        Self::Unknown,
    ];

    /// Returns the registry entry for this type.
    #[must_use]
    pub fn descriptor(self) -> &'static TypeDescriptor {
        &REGISTRY[self as usize]
    }

    #[must_use]
    pub fn category(self) -> TypeCategory {
        self.descriptor().category
    }

    #[must_use]
    pub fn sql_name(self) -> &'static str {
        self.descriptor().sql_name
    }

    #[must_use]
    pub fn is_numeric(self) -> bool {
        self.category().is_numeric()
    }

    /// Returns whether values of this type may be rendered as inline literals.
    #[must_use]
    pub fn is_injection_safe(self) -> bool {
        self.descriptor().injection_safe
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_name())
    }
}

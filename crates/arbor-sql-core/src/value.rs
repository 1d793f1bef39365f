//! SQL values and parameter handling.
//!
//! Host values enter the compiler through [`ToSqlValue`], which yields both
//! the [`SqlValue`] and the [`ValueType`] it is declared as. The pair travels
//! as a [`TypedValue`] all the way to the compiled parameter list.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SqlError};
use crate::types::{TypeCategory, ValueType};

/// A SQL value that can be used as a parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Binary blob value.
    Blob(Vec<u8>),
}

impl SqlValue {
    /// Returns the type a value has when nothing else is known about it.
    #[must_use]
    pub const fn natural_type(&self) -> ValueType {
        match self {
            Self::Null => ValueType::Unknown,
            Self::Bool(_) => ValueType::Boolean,
            Self::Int(_) => ValueType::BigInt,
            Self::Float(_) => ValueType::Double,
            Self::Text(_) => ValueType::Text,
            Self::Blob(_) => ValueType::Blob,
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// A value together with its declared type.
///
/// Construction through [`TypedValue::new`] guarantees that the value can be
/// represented by the type, so the renderer can decide between literal and
/// placeholder from the type alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedValue {
    pub value_type: ValueType,
    pub value: SqlValue,
}

impl TypedValue {
    /// Pairs `value` with `value_type`.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::TypeMismatch`] when the value cannot be represented
    /// by the declared type, including integers out of the type's range.
    pub fn new(value_type: ValueType, value: SqlValue) -> Result<Self> {
        if accepts(value_type, &value) {
            Ok(Self { value_type, value })
        } else {
            Err(SqlError::TypeMismatch {
                operator: "value",
                left: value_type,
                right: Some(value.natural_type()),
            })
        }
    }

    /// A NULL of the given type.
    #[must_use]
    pub const fn null(value_type: ValueType) -> Self {
        Self {
            value_type,
            value: SqlValue::Null,
        }
    }

    /// Converts a host value using its declared type.
    pub fn from_host<T: ToSqlValue>(value: T) -> Self {
        Self {
            value_type: value.value_type(),
            value: value.to_sql_value(),
        }
    }

    /// Re-declares the value as `value_type`, if the value fits.
    ///
    /// # Errors
    ///
    /// Same as [`TypedValue::new`].
    pub fn retype(self, value_type: ValueType) -> Result<Self> {
        Self::new(value_type, self.value)
    }
}

fn accepts(value_type: ValueType, value: &SqlValue) -> bool {
    let category = value_type.category();
    match value {
        SqlValue::Null => true,
        _ if category == TypeCategory::Unknown => true,
        SqlValue::Bool(_) => category == TypeCategory::Boolean,
        SqlValue::Int(n) => match value_type {
            ValueType::TinyInt => i8::try_from(*n).is_ok(),
            ValueType::SmallInt => i16::try_from(*n).is_ok(),
            ValueType::Integer => i32::try_from(*n).is_ok(),
            _ => category.is_numeric(),
        },
        SqlValue::Float(_) => {
            matches!(category, TypeCategory::Float | TypeCategory::Decimal)
        }
        SqlValue::Text(_) => matches!(
            category,
            TypeCategory::Text | TypeCategory::Temporal | TypeCategory::Json | TypeCategory::Decimal
        ),
        SqlValue::Blob(_) => category == TypeCategory::Binary,
    }
}

/// Trait for types that can be converted to SQL values.
pub trait ToSqlValue {
    /// The type values of `Self` are declared as.
    fn declared_type() -> ValueType;

    /// The declared type of this particular value.
    fn value_type(&self) -> ValueType {
        Self::declared_type()
    }

    /// Converts the value to a `SqlValue`.
    fn to_sql_value(self) -> SqlValue;
}

impl ToSqlValue for SqlValue {
    fn declared_type() -> ValueType {
        ValueType::Unknown
    }

    fn value_type(&self) -> ValueType {
        self.natural_type()
    }

    fn to_sql_value(self) -> SqlValue {
        self
    }
}

macro_rules! impl_to_sql_value {
    ($($ty:ty => $value_type:ident, |$v:ident| $convert:expr;)*) => {
        $(
            impl ToSqlValue for $ty {
                fn declared_type() -> ValueType {
                    ValueType::$value_type
                }

                fn to_sql_value(self) -> SqlValue {
                    let $v = self;
                    $convert
                }
            }
        )*
    };
}

impl_to_sql_value! {
    bool => Boolean, |v| SqlValue::Bool(v);
    i8 => TinyInt, |v| SqlValue::Int(i64::from(v));
    i16 => SmallInt, |v| SqlValue::Int(i64::from(v));
    i32 => Integer, |v| SqlValue::Int(i64::from(v));
    i64 => BigInt, |v| SqlValue::Int(v);
    u8 => SmallInt, |v| SqlValue::Int(i64::from(v));
    u16 => Integer, |v| SqlValue::Int(i64::from(v));
    u32 => BigInt, |v| SqlValue::Int(i64::from(v));
    f32 => Real, |v| SqlValue::Float(f64::from(v));
    f64 => Double, |v| SqlValue::Float(v);
    String => Text, |v| SqlValue::Text(v);
    &str => Text, |v| SqlValue::Text(String::from(v));
    Vec<u8> => Blob, |v| SqlValue::Blob(v);
    &[u8] => Blob, |v| SqlValue::Blob(v.to_vec());
}

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn declared_type() -> ValueType {
        T::declared_type()
    }

    fn value_type(&self) -> ValueType {
        self.as_ref().map_or_else(T::declared_type, ToSqlValue::value_type)
    }

    fn to_sql_value(self) -> SqlValue {
        match self {
            Some(v) => v.to_sql_value(),
            None => SqlValue::Null,
        }
    }
}

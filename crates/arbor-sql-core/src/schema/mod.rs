//! Table and column metadata.
//!
//! The compiler never derives metadata itself. Callers describe their tables
//! once, share them behind an [`Arc`], and hand them to the statement
//! builders.
//!
//! ```rust
//! use arbor_sql_core::schema::{ColumnMeta, TableMeta};
//! use arbor_sql_core::types::ValueType;
//!
//! let users = TableMeta::new("users")
//!     .column(ColumnMeta::new("id", ValueType::BigInt).primary_key())
//!     .column(ColumnMeta::new("name", ValueType::Varchar))
//!     .column(ColumnMeta::new("email", ValueType::Varchar).nullable())
//!     .build();
//!
//! assert_eq!(users.find_column("email").map(|c| c.nullable), Some(true));
//! ```

use std::sync::Arc;

use crate::error::{Result, SqlError};
use crate::types::ValueType;

/// Metadata of one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMeta {
    /// Name of the owning table; filled in by [`TableMeta::column`].
    pub table: String,
    pub name: String,
    pub value_type: ValueType,
    pub nullable: bool,
    pub primary_key: bool,
    /// Optimistic-locking version counter.
    pub version: bool,
}

impl ColumnMeta {
    /// Creates a non-null, non-key column.
    #[must_use]
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            table: String::new(),
            name: name.into(),
            value_type,
            nullable: false,
            primary_key: false,
            version: false,
        }
    }

    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    #[must_use]
    pub const fn version(mut self) -> Self {
        self.version = true;
        self
    }

    /// Primary-key and version columns are maintained by the engine.
    #[must_use]
    pub const fn is_assignable(&self) -> bool {
        !self.primary_key && !self.version
    }
}

/// Metadata of one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMeta {
    schema: Option<String>,
    name: String,
    columns: Vec<ColumnMeta>,
}

impl TableMeta {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
            columns: vec![],
        }
    }

    /// Places the table in a schema.
    #[must_use]
    pub fn in_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Adds a column, taking ownership of it.
    #[must_use]
    pub fn column(mut self, mut column: ColumnMeta) -> Self {
        column.table.clone_from(&self.name);
        self.columns.push(column);
        self
    }

    /// Wraps the finished metadata for sharing between statements.
    #[must_use]
    pub fn build(self) -> Arc<Self> {
        Arc::new(self)
    }

    #[must_use]
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn columns(&self) -> &[ColumnMeta] {
        &self.columns
    }

    #[must_use]
    pub fn find_column(&self, name: &str) -> Option<&ColumnMeta> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Looks up a column, failing with [`SqlError::UnresolvedReference`].
    ///
    /// # Errors
    ///
    /// Returns an error when the table has no such column.
    pub fn require_column(&self, name: &str) -> Result<&ColumnMeta> {
        self.find_column(name)
            .ok_or_else(|| SqlError::UnresolvedReference {
                reference: format!("{}.{name}", self.name),
            })
    }

    #[must_use]
    pub fn primary_key(&self) -> Option<&ColumnMeta> {
        self.columns.iter().find(|c| c.primary_key)
    }

    #[must_use]
    pub fn version_column(&self) -> Option<&ColumnMeta> {
        self.columns.iter().find(|c| c.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accounts() -> Arc<TableMeta> {
        TableMeta::new("accounts")
            .in_schema("bank")
            .column(ColumnMeta::new("id", ValueType::BigInt).primary_key())
            .column(ColumnMeta::new("balance", ValueType::Decimal))
            .column(ColumnMeta::new("revision", ValueType::Integer).version())
            .build()
    }

    #[test]
    fn test_columns_know_their_table() {
        let table = accounts();
        assert!(table.columns().iter().all(|c| c.table == "accounts"));
        assert_eq!(table.schema(), Some("bank"));
    }

    #[test]
    fn test_key_and_version_lookup() {
        let table = accounts();
        assert_eq!(table.primary_key().map(|c| c.name.as_str()), Some("id"));
        assert_eq!(
            table.version_column().map(|c| c.name.as_str()),
            Some("revision")
        );
        assert!(!table.primary_key().is_some_and(ColumnMeta::is_assignable));
    }

    #[test]
    fn test_require_column() {
        let table = accounts();
        assert!(table.require_column("balance").is_ok());
        assert_eq!(
            table.require_column("owner"),
            Err(SqlError::UnresolvedReference {
                reference: String::from("accounts.owner"),
            })
        );
    }
}

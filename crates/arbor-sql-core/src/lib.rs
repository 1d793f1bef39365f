//! # arbor-sql-core
//!
//! A typed SQL expression and statement compiler.
//!
//! This crate provides:
//! - A closed, typed expression tree whose operators come from a single
//!   catalog of precedence and render text
//! - A type resolver that decides result types while expressions are built
//! - A scope stack that resolves table aliases, derived-table columns, CTEs
//!   and correlated references across nested queries
//! - SELECT/INSERT/UPDATE/DELETE builders with a
//!   `Building -> Prepared -> Cleared` lifecycle, in a runtime-checked and a
//!   typestate flavor
//! - A renderer producing SQL text plus an ordered parameter list for a
//!   caller-supplied [`Dialect`]
//!
//! ## Building and rendering
//!
//! ```rust
//! use arbor_sql_core::builder::Select;
//! use arbor_sql_core::dialect::GenericDialect;
//! use arbor_sql_core::schema::{ColumnMeta, TableMeta};
//! use arbor_sql_core::types::ValueType;
//! use arbor_sql_core::{CriteriaContext, Renderable};
//!
//! let users = TableMeta::new("users")
//!     .column(ColumnMeta::new("id", ValueType::BigInt).primary_key())
//!     .column(ColumnMeta::new("name", ValueType::Varchar))
//!     .column(ColumnMeta::new("active", ValueType::Boolean))
//!     .build();
//!
//! let ctx = CriteriaContext::new();
//! let select = Select::new(&ctx)?.from(&users, "u")?;
//! let active = select.field("u", "active")?;
//! let query = select
//!     .columns("u", &["id", "name"])?
//!     .where_clause(active.eq(true))?
//!     .prepare()?;
//!
//! let compiled = query.render(&GenericDialect::new())?;
//! assert_eq!(compiled.sql, "SELECT u.id, u.name FROM users AS u WHERE u.active = ?");
//! assert_eq!(compiled.params.len(), 1);
//! # Ok::<(), arbor_sql_core::SqlError>(())
//! ```
//!
//! ## SQL Injection Prevention
//!
//! Text and binary values are always bound as parameters. Only values of
//! injection-safe types (booleans, integers, floats) are ever written into
//! the SQL text, and only when the node is a literal or the dialect's
//! literal policy is [`LiteralPolicy::Optimizing`](dialect::LiteralPolicy).
//!
//! ```rust
//! use arbor_sql_core::builder::Select;
//! use arbor_sql_core::dialect::GenericDialect;
//! use arbor_sql_core::schema::{ColumnMeta, TableMeta};
//! use arbor_sql_core::types::ValueType;
//! use arbor_sql_core::{CriteriaContext, Renderable};
//!
//! let users = TableMeta::new("users")
//!     .column(ColumnMeta::new("id", ValueType::BigInt))
//!     .column(ColumnMeta::new("name", ValueType::Text))
//!     .build();
//!
//! let ctx = CriteriaContext::new();
//! let select = Select::new(&ctx)?.from(&users, "u")?;
//! let name = select.field("u", "name")?;
//! let query = select
//!     .columns("u", &["id"])?
//!     .where_clause(name.eq("'; DROP TABLE users; --"))?
//!     .prepare()?;
//!
//! let compiled = query.render(&GenericDialect::new())?;
//! assert_eq!(compiled.sql, "SELECT u.id FROM users AS u WHERE u.name = ?");
//! # Ok::<(), arbor_sql_core::SqlError>(())
//! ```

pub mod ast;
pub mod builder;
pub mod dialect;
pub mod error;
pub mod operator;
pub mod render;
pub mod schema;
pub mod scope;
pub mod types;
pub mod value;

pub use ast::{Expr, Predicate, Query, Statement};
pub use builder::{Delete, Insert, Select, Update};
pub use dialect::Dialect;
pub use error::{Result, SqlError};
pub use render::{render, CompiledBatch, CompiledStatement, Renderable};
pub use scope::CriteriaContext;
pub use value::{SqlValue, ToSqlValue, TypedValue};

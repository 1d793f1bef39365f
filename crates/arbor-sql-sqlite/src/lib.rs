//! # arbor-sql-sqlite
//!
//! The SQLite dialect for `arbor-sql-core`.
//!
//! The core crate renders for whatever [`Dialect`](arbor_sql_core::Dialect)
//! it is handed; this crate is one such dialect, kept outside the core.
//!
//! # How SQLite differs from other dialects
//!
//! - **[RETURNING]**: SQLite supports `RETURNING` clauses on
//!   INSERT, UPDATE, and DELETE (since SQLite 3.35.0).
//! - **Identifier quoting**: SQLite uses double quotes (`"`) as
//!   the standard quoting style, though it also accepts backticks
//!   and square brackets. See [SQLite keywords].
//! - **[Booleans]**: SQLite has no boolean storage class; `TRUE` and
//!   `FALSE` are aliases for `1` and `0`, which is how booleans are inlined.
//! - **Null-safe comparison**: `IS` and `IS NOT` compare NULLs as values,
//!   and `REGEXP` is available when the application registers a
//!   `regexp()` function.
//! - **[Compound SELECT]**: operands of `UNION`/`INTERSECT`/`EXCEPT`
//!   cannot be parenthesized, and there is no `INTERSECT ALL` or
//!   `EXCEPT ALL`.
//! - **No row locking**: `FOR UPDATE` / `FOR SHARE` do not exist; SQLite
//!   locks the whole database.
//! - **OFFSET needs LIMIT**: a negative LIMIT means "no limit".
//! - **Operator levels**: `||` binds tighter than `*`, `& | << >>` share
//!   one level below `+`, and there is no XOR operator.
//!
//! [RETURNING]: https://www.sqlite.org/lang_returning.html
//! [SQLite keywords]: https://www.sqlite.org/lang_keywords.html
//! [Booleans]: https://www.sqlite.org/datatype3.html
//! [Compound SELECT]: https://www.sqlite.org/lang_select.html#compound
//!
//! ## Example
//!
//! ```rust
//! use arbor_sql_core::builder::Update;
//! use arbor_sql_core::schema::{ColumnMeta, TableMeta};
//! use arbor_sql_core::types::ValueType;
//! use arbor_sql_core::{CriteriaContext, Renderable};
//! use arbor_sql_sqlite::SqliteDialect;
//!
//! let accounts = TableMeta::new("accounts")
//!     .column(ColumnMeta::new("id", ValueType::BigInt).primary_key())
//!     .column(ColumnMeta::new("balance", ValueType::BigInt))
//!     .build();
//!
//! let ctx = CriteriaContext::new();
//! let update = Update::new(&ctx, &accounts, "a")?;
//! let id = update.field("id")?;
//! let statement = update
//!     .set("balance", 100_i64)?
//!     .where_clause(id.eq(7_i64))?
//!     .prepare()?;
//!
//! let compiled = statement.render(&SqliteDialect::new())?;
//! assert_eq!(compiled.sql, "UPDATE accounts AS a SET balance = ? WHERE a.id = ?");
//! # Ok::<(), arbor_sql_core::SqlError>(())
//! ```

mod dialect;

pub use dialect::SqliteDialect;

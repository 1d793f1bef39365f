//! Statement builders.
//!
//! Every statement kind comes in two forms. The dynamic statement structs
//! ([`SelectStatement`](crate::ast::SelectStatement) and friends) take
//! `&mut self` methods whose misuse is reported as a
//! [`SqlError`](crate::SqlError). The typestate wrappers ([`Select`],
//! [`Insert`], [`Update`], [`Delete`]) move between marker states so that
//! clause-order mistakes do not compile.
//!
//! Each builder opens a scope on the [`CriteriaContext`](crate::CriteriaContext)
//! it is given and closes it when prepared.
//!
//! # Example
//!
//! ```rust
//! use arbor_sql_core::builder::{count_star, Select};
//! use arbor_sql_core::schema::{ColumnMeta, TableMeta};
//! use arbor_sql_core::scope::CriteriaContext;
//! use arbor_sql_core::types::ValueType;
//!
//! let orders = TableMeta::new("orders")
//!     .column(ColumnMeta::new("id", ValueType::BigInt).primary_key())
//!     .column(ColumnMeta::new("customer_id", ValueType::BigInt))
//!     .build();
//!
//! let ctx = CriteriaContext::new();
//! let select = Select::new(&ctx)?.from(&orders, "o")?;
//! let customer = select.field("o", "customer_id")?;
//! let statement = select
//!     .group_by(customer.clone())?
//!     .select(customer.alias("customer_id"))?
//!     .select(count_star().alias("orders"))?
//!     .prepare()?;
//! assert_eq!(statement.selections().len(), 2);
//! # Ok::<(), arbor_sql_core::SqlError>(())
//! ```

mod batch;
mod case;
mod compound;
mod delete;
mod expr;
mod function;
mod insert;
mod select;
mod update;

use std::sync::Arc;

pub use batch::{BatchRow, BatchStatement};
pub use case::{case_on, case_when, Case, CaseOn, Searched, Simple};
pub use compound::Compound;
pub use delete::Delete;
pub use expr::{all, and, any, batch_param, exists, literal, not, not_exists, null, or, param};
pub use function::{
    avg, coalesce, count, count_distinct, count_star, dense_rank, function, lower, max, min,
    rank, row_number, sum, upper,
};
pub use insert::{HasColumns, HasRows, Insert, NoColumns};
pub use select::{Complete, Filterable, Joining, Limited, Projected, Select, Sourced, Start};
pub use update::{HasSet, NoSet, Update};

use crate::ast::{Lifecycle, Query};
use crate::error::Result;
use crate::scope::SelectionInfo;

/// Fails unless `query` is prepared.
fn require_prepared(query: &Query, action: &'static str) -> Result<()> {
    query
        .lifecycle()
        .require(Lifecycle::Prepared, query.kind(), action)
}

/// The output columns of `query`, as a derived-table binding sees them.
fn selection_infos(query: &Query) -> Arc<[SelectionInfo]> {
    query
        .selections()
        .iter()
        .map(|s| SelectionInfo {
            alias: s.alias.clone(),
            value_type: s.value_type(),
        })
        .collect()
}

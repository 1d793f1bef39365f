//! Invoicing reports built with the typed builders.
//!
//! Three statements against a small invoicing schema:
//! - revenue per client, joined and grouped
//! - clients with an overdue invoice, as a correlated sub-query
//! - marking invoices paid in one batch
//!
//! Run with: cargo run --example invoicing

use std::sync::Arc;

use arbor_sql_core::ast::{OrderBy, OrderDirection};
use arbor_sql_core::builder::{batch_param, count_star, exists, sum, BatchRow, BatchStatement, Update};
use arbor_sql_core::dialect::{GenericDialect, PostgresDialect};
use arbor_sql_core::schema::{ColumnMeta, TableMeta};
use arbor_sql_core::types::ValueType;
use arbor_sql_core::{CompiledStatement, CriteriaContext, Renderable, Result, Select};

// =============================================================================
// SCHEMA
// =============================================================================

fn clients() -> Arc<TableMeta> {
    TableMeta::new("clients")
        .in_schema("billing")
        .column(ColumnMeta::new("id", ValueType::BigInt).primary_key())
        .column(ColumnMeta::new("name", ValueType::Varchar))
        .column(ColumnMeta::new("currency", ValueType::Char))
        .build()
}

fn invoices() -> Arc<TableMeta> {
    TableMeta::new("invoices")
        .in_schema("billing")
        .column(ColumnMeta::new("id", ValueType::BigInt).primary_key())
        .column(ColumnMeta::new("client_id", ValueType::BigInt))
        .column(ColumnMeta::new("amount", ValueType::Decimal))
        .column(ColumnMeta::new("status", ValueType::Varchar))
        .column(ColumnMeta::new("due_date", ValueType::Date))
        .column(ColumnMeta::new("paid_at", ValueType::Timestamp).nullable())
        .column(ColumnMeta::new("version", ValueType::Integer).version())
        .build()
}

// =============================================================================
// REPORTS
// =============================================================================

fn revenue_per_client(ctx: &CriteriaContext) -> Result<CompiledStatement> {
    let (clients, invoices) = (clients(), invoices());
    let select = Select::new(ctx)?.from(&clients, "c")?.join(&invoices, "i")?;
    let on = select.field("i", "client_id")?.eq(select.field("c", "id")?);
    let select = select.on(on)?;

    let name = select.field("c", "name")?;
    let status = select.field("i", "status")?;
    let revenue = sum(select.field("i", "amount")?)?;
    let query = select
        .where_clause(status.eq("paid"))?
        .group_by(name.clone())?
        .having(count_star().gt(2_i64))?
        .select(name.alias("client"))?
        .select(revenue.alias("revenue"))?
        .order_by_selection("revenue", OrderDirection::Desc)?
        .prepare()?;

    query.render(&PostgresDialect::new())
}

fn clients_with_overdue_invoices(ctx: &CriteriaContext) -> Result<CompiledStatement> {
    let (clients, invoices) = (clients(), invoices());
    let outer = Select::new(ctx)?.from(&clients, "c")?;

    let inner = outer.sub_query()?.from(&invoices, "i")?;
    let owner = inner.field("i", "client_id")?;
    let client = inner.outer_field("c", "id")?;
    let paid_at = inner.field("i", "paid_at")?;
    let due = inner.field("i", "due_date")?;
    let inner = inner
        .columns("i", &["id"])?
        .where_clause(owner.eq(client))?
        .where_clause(paid_at.is_null())?
        .where_clause(due.lt("2024-01-31"))?
        .prepare()?;

    let name = outer.field("c", "name")?;
    let query = outer
        .columns("c", &["id", "name"])?
        .where_clause(exists(inner)?)?
        .order_by(OrderBy::new(name, OrderDirection::Asc))?
        .prepare()?;

    query.render(&GenericDialect::new())
}

fn mark_paid(ctx: &CriteriaContext) -> Result<String> {
    let invoices = invoices();
    let update = Update::new(ctx, &invoices, "i")?;
    let id = update.field("id")?;
    let statement = update
        .set("status", "paid")?
        .set("paid_at", batch_param("paid_at", ValueType::Timestamp))?
        .where_clause(id.eq(batch_param("id", ValueType::BigInt)))?
        .prepare()?;

    let rows = vec![
        BatchRow::new().bind("id", 17_i64).bind("paid_at", "2024-02-01 09:30:00"),
        BatchRow::new().bind("id", 18_i64).bind("paid_at", "2024-02-01 09:31:00"),
    ];
    let batch = BatchStatement::new(statement, rows)?.render(&PostgresDialect::new())?;
    Ok(format!("{}\n  {} parameter groups", batch.sql, batch.param_groups.len()))
}

fn main() -> Result<()> {
    let ctx = CriteriaContext::new();

    let revenue = revenue_per_client(&ctx)?;
    println!("Revenue per client:\n  {}\n  {:?}\n", revenue.sql, revenue.params);

    let overdue = clients_with_overdue_invoices(&ctx)?;
    println!("Clients with overdue invoices:\n  {}\n  {:?}\n", overdue.sql, overdue.params);

    println!("Mark paid:\n  {}", mark_paid(&ctx)?);
    Ok(())
}

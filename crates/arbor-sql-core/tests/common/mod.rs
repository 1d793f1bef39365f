#![allow(dead_code)]

use std::sync::Arc;

use arbor_sql_core::dialect::{
    DialectOptions, GenericDialect, LiteralPolicy, MySqlDialect, PostgresDialect,
};
use arbor_sql_core::schema::{ColumnMeta, TableMeta};
use arbor_sql_core::types::ValueType;
use arbor_sql_core::{CompiledStatement, Renderable, SqlError};

pub fn users() -> Arc<TableMeta> {
    TableMeta::new("users")
        .column(ColumnMeta::new("id", ValueType::BigInt).primary_key())
        .column(ColumnMeta::new("name", ValueType::Varchar))
        .column(ColumnMeta::new("email", ValueType::Varchar).nullable())
        .column(ColumnMeta::new("age", ValueType::Integer).nullable())
        .column(ColumnMeta::new("active", ValueType::Boolean))
        .build()
}

pub fn orders() -> Arc<TableMeta> {
    TableMeta::new("orders")
        .column(ColumnMeta::new("id", ValueType::BigInt).primary_key())
        .column(ColumnMeta::new("user_id", ValueType::BigInt))
        .column(ColumnMeta::new("total", ValueType::Decimal))
        .column(ColumnMeta::new("status", ValueType::Varchar))
        .build()
}

pub fn accounts() -> Arc<TableMeta> {
    TableMeta::new("accounts")
        .in_schema("bank")
        .column(ColumnMeta::new("id", ValueType::BigInt).primary_key())
        .column(ColumnMeta::new("balance", ValueType::Decimal))
        .column(ColumnMeta::new("version", ValueType::Integer).version())
        .build()
}

/// Generic dialect: `?` placeholders, quoting only where needed.
pub fn generic() -> GenericDialect {
    GenericDialect::new()
}

pub fn optimizing() -> GenericDialect {
    GenericDialect::with_options(DialectOptions::new().literal_policy(LiteralPolicy::Optimizing))
}

pub fn postgres() -> PostgresDialect {
    PostgresDialect::new()
}

pub fn mysql() -> MySqlDialect {
    MySqlDialect::new()
}

pub fn compile(node: &impl Renderable) -> CompiledStatement {
    node.render(&generic())
        .unwrap_or_else(|e| panic!("Failed to render: {e}"))
}

pub fn sql(node: &impl Renderable) -> String {
    compile(node).sql
}

pub fn render_err(node: &impl Renderable) -> SqlError {
    node.render(&generic())
        .expect_err("Expected a rendering error")
}

//! Statements rendered with the SQLite dialect.

use std::sync::Arc;

use arbor_sql_core::ast::{LockMode, Query, SelectStatement};
use arbor_sql_core::builder::{literal, Delete};
use arbor_sql_core::dialect::{DialectOptions, LiteralPolicy};
use arbor_sql_core::schema::{ColumnMeta, TableMeta};
use arbor_sql_core::types::ValueType;
use arbor_sql_core::{CriteriaContext, Renderable, Select, SqlError};
use arbor_sql_sqlite::SqliteDialect;

fn users() -> Arc<TableMeta> {
    TableMeta::new("users")
        .column(ColumnMeta::new("id", ValueType::BigInt).primary_key())
        .column(ColumnMeta::new("name", ValueType::Varchar))
        .column(ColumnMeta::new("age", ValueType::Integer).nullable())
        .column(ColumnMeta::new("active", ValueType::Boolean))
        .build()
}

fn ids(ctx: &CriteriaContext, table: &Arc<TableMeta>) -> SelectStatement {
    Select::new(ctx)
        .unwrap()
        .from(table, "u")
        .unwrap()
        .columns("u", &["id"])
        .unwrap()
        .prepare()
        .unwrap()
}

fn sqlite_sql(node: &impl Renderable) -> String {
    node.render(&SqliteDialect::new())
        .unwrap_or_else(|e| panic!("Failed to render: {e}"))
        .sql
}

// ===================================================================
// Literals and operators
// ===================================================================

#[test]
fn booleans_inline_as_integers() {
    let ctx = CriteriaContext::new();
    let users = users();
    let select = Select::new(&ctx).unwrap().from(&users, "u").unwrap();
    let active = select.field("u", "active").unwrap();
    let query = select
        .columns("u", &["id"])
        .unwrap()
        .where_clause(active.eq(literal(false)))
        .unwrap()
        .prepare()
        .unwrap();
    assert_eq!(
        sqlite_sql(&query),
        "SELECT u.id FROM users AS u WHERE u.active = 0"
    );
}

#[test]
fn optimizing_inlines_boolean_parameters() {
    let ctx = CriteriaContext::new();
    let users = users();
    let select = Select::new(&ctx).unwrap().from(&users, "u").unwrap();
    let active = select.field("u", "active").unwrap();
    let name = select.field("u", "name").unwrap();
    let query = select
        .columns("u", &["id"])
        .unwrap()
        .where_clause(active.eq(true).and(name.eq("Ann")))
        .unwrap()
        .prepare()
        .unwrap();

    let dialect = SqliteDialect::with_options(
        DialectOptions::new().literal_policy(LiteralPolicy::Optimizing),
    );
    let compiled = query.render(&dialect).unwrap();
    assert_eq!(
        compiled.sql,
        "SELECT u.id FROM users AS u WHERE u.active = 1 AND u.name = ?"
    );
    assert_eq!(compiled.params.len(), 1);
}

#[test]
fn null_safe_equality_uses_is() {
    let ctx = CriteriaContext::new();
    let users = users();
    let select = Select::new(&ctx).unwrap().from(&users, "u").unwrap();
    let age = select.field("u", "age").unwrap();
    let name = select.field("u", "name").unwrap();
    let query = select
        .columns("u", &["id"])
        .unwrap()
        .where_clause(age.null_safe_eq(None::<i32>))
        .unwrap()
        .prepare()
        .unwrap();
    assert_eq!(
        sqlite_sql(&query),
        "SELECT u.id FROM users AS u WHERE u.age IS ?"
    );

    let ctx = CriteriaContext::new();
    let select = Select::new(&ctx).unwrap().from(&users, "u").unwrap();
    let query = select
        .columns("u", &["id"])
        .unwrap()
        .where_clause(name.ilike("a%"))
        .unwrap()
        .prepare()
        .unwrap();
    assert!(matches!(
        query.render(&SqliteDialect::new()),
        Err(SqlError::UnsupportedForDialect { dialect: "sqlite", .. })
    ));
}

#[test]
fn operator_levels_follow_sqlite() {
    let ctx = CriteriaContext::new();
    let users = users();
    let select = Select::new(&ctx).unwrap().from(&users, "u").unwrap();
    let id = select.field("u", "id").unwrap();
    let age = select.field("u", "age").unwrap();
    let name = select.field("u", "name").unwrap();

    let tag = name.concat(age.clone().times(id.clone()).unwrap()).unwrap();
    let or_of_and = id.clone().bit_or(age.clone().bit_and(id.clone()).unwrap()).unwrap();
    let and_of_or = id.clone().bit_or(age.clone()).unwrap().bit_and(id.clone()).unwrap();
    let shift_of_sum = id.clone().shift_left(age.plus(1).unwrap()).unwrap();
    let query = select
        .select(tag.alias("tag"))
        .unwrap()
        .select(or_of_and.alias("a"))
        .unwrap()
        .select(and_of_or.alias("b"))
        .unwrap()
        .select(shift_of_sum.alias("c"))
        .unwrap()
        .prepare()
        .unwrap();
    // `||` binds above `*`, and `& | <<` share a level below `+`.
    assert_eq!(
        sqlite_sql(&query),
        "SELECT u.name || (u.age * u.id) AS tag, u.id | (u.age & u.id) AS a, \
         u.id | u.age & u.id AS b, u.id << u.age + ? AS c FROM users AS u"
    );
}

#[test]
fn xor_is_refused() {
    let ctx = CriteriaContext::new();
    let users = users();
    let select = Select::new(&ctx).unwrap().from(&users, "u").unwrap();
    let id = select.field("u", "id").unwrap();
    let age = select.field("u", "age").unwrap();
    let query = select
        .select(id.bit_xor(age).unwrap().alias("x"))
        .unwrap()
        .prepare()
        .unwrap();
    assert!(matches!(
        query.render(&SqliteDialect::new()),
        Err(SqlError::UnsupportedForDialect { dialect: "sqlite", .. })
    ));
}

// ===================================================================
// Clauses
// ===================================================================

#[test]
fn offset_without_limit() {
    let ctx = CriteriaContext::new();
    let users = users();
    let query = Select::new(&ctx)
        .unwrap()
        .from(&users, "u")
        .unwrap()
        .columns("u", &["id"])
        .unwrap()
        .offset(20)
        .unwrap()
        .prepare()
        .unwrap();
    assert_eq!(
        sqlite_sql(&query),
        "SELECT u.id FROM users AS u LIMIT -1 OFFSET 20"
    );
}

#[test]
fn delete_returning() {
    let ctx = CriteriaContext::new();
    let users = users();
    let delete = Delete::from_table(&ctx, &users, "u").unwrap();
    let id = delete.field("id").unwrap();
    let name = delete.field("name").unwrap();
    let statement = delete
        .where_clause(id.eq(3_i64))
        .unwrap()
        .returning(name.alias("name"))
        .unwrap()
        .prepare()
        .unwrap();
    assert_eq!(
        sqlite_sql(&statement),
        "DELETE FROM users AS u WHERE u.id = ? RETURNING u.name"
    );
}

#[test]
fn row_locking_is_refused() {
    let ctx = CriteriaContext::new();
    let users = users();
    let query = Select::new(&ctx)
        .unwrap()
        .from(&users, "u")
        .unwrap()
        .columns("u", &["id"])
        .unwrap()
        .lock(LockMode::Update)
        .unwrap()
        .prepare()
        .unwrap();
    assert_eq!(
        query.render(&SqliteDialect::new()).unwrap_err(),
        SqlError::UnsupportedForDialect {
            dialect: "sqlite",
            feature: String::from("FOR UPDATE"),
        }
    );
}

// ===================================================================
// Set operations
// ===================================================================

#[test]
fn chained_unions_stay_flat() {
    let ctx = CriteriaContext::new();
    let users = users();
    let query = Query::from(ids(&ctx, &users))
        .union(ids(&ctx, &users))
        .unwrap()
        .union_all(ids(&ctx, &users))
        .unwrap()
        .prepare()
        .unwrap();
    assert_eq!(
        sqlite_sql(&query),
        "SELECT u.id FROM users AS u UNION SELECT u.id FROM users AS u \
         UNION ALL SELECT u.id FROM users AS u"
    );
}

#[test]
fn bracketed_operand_is_refused() {
    let ctx = CriteriaContext::new();
    let users = users();
    let right = Query::from(ids(&ctx, &users))
        .except(ids(&ctx, &users))
        .unwrap()
        .prepare()
        .unwrap();
    let query = Query::from(ids(&ctx, &users))
        .union(right)
        .unwrap()
        .prepare()
        .unwrap();
    assert_eq!(
        query.render(&SqliteDialect::new()).unwrap_err(),
        SqlError::UnsupportedForDialect {
            dialect: "sqlite",
            feature: String::from("bracketed set-operation operand"),
        }
    );
}

#[test]
fn intersect_all_is_refused() {
    let ctx = CriteriaContext::new();
    let users = users();
    let query = Query::from(ids(&ctx, &users))
        .intersect_all(ids(&ctx, &users))
        .unwrap()
        .prepare()
        .unwrap();
    assert_eq!(
        query.render(&SqliteDialect::new()).unwrap_err(),
        SqlError::UnsupportedForDialect {
            dialect: "sqlite",
            feature: String::from("INTERSECT ALL"),
        }
    );

    let plain = Query::from(ids(&ctx, &users))
        .intersect(ids(&ctx, &users))
        .unwrap()
        .prepare()
        .unwrap();
    assert_eq!(
        sqlite_sql(&plain),
        "SELECT u.id FROM users AS u INTERSECT SELECT u.id FROM users AS u"
    );
}

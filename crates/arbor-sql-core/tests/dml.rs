//! Tests for INSERT, UPDATE and DELETE statements and for batches.

mod common;
use common::*;

use arbor_sql_core::ast::{InsertStatement, StatementKind};
use arbor_sql_core::builder::{
    batch_param, not_exists, BatchRow, BatchStatement, Delete, Insert, Update,
};
use arbor_sql_core::types::ValueType;
use arbor_sql_core::value::{SqlValue, TypedValue};
use arbor_sql_core::{CriteriaContext, Expr, Renderable, SqlError};

// ===================================================================
// INSERT
// ===================================================================

#[test]
fn insert_multiple_rows() {
    let ctx = CriteriaContext::new();
    let users = users();
    let insert = Insert::new(&ctx, &users)
        .unwrap()
        .columns(&["name", "email", "active"])
        .unwrap()
        .values(vec![Expr::from("Ann"), Expr::from("ann@example.com"), Expr::from(true)])
        .unwrap()
        .values(vec![Expr::from("Bob"), Expr::from(None::<&str>), Expr::from(false)])
        .unwrap()
        .prepare()
        .unwrap();

    let compiled = compile(&insert);
    assert_eq!(
        compiled.sql,
        "INSERT INTO users (name, email, active) VALUES (?, ?, ?), (?, ?, ?)"
    );
    assert_eq!(compiled.params.len(), 6);
    // Values take the type of their column.
    assert_eq!(compiled.params[0].value_type, ValueType::Varchar);
    assert_eq!(compiled.params[4], TypedValue::null(ValueType::Varchar));
}

#[test]
fn insert_all_columns_follows_declaration_order() {
    let ctx = CriteriaContext::new();
    let orders = orders();
    let insert = Insert::new(&ctx, &orders)
        .unwrap()
        .all_columns()
        .unwrap()
        .values(vec![
            Expr::from(1_i64),
            Expr::from(2_i64),
            Expr::from(9.5_f64),
            Expr::from("open"),
        ])
        .unwrap()
        .prepare()
        .unwrap();
    assert_eq!(
        sql(&insert),
        "INSERT INTO orders (id, user_id, total, status) VALUES (?, ?, ?, ?)"
    );
}

#[test]
fn insert_row_width_must_match_columns() {
    let ctx = CriteriaContext::new();
    let users = users();
    let err = Insert::new(&ctx, &users)
        .unwrap()
        .columns(&["name", "active"])
        .unwrap()
        .values(vec![Expr::from("Ann")])
        .err()
        .unwrap();
    assert_eq!(
        err,
        SqlError::ColumnCountMismatch {
            context: "VALUES row",
            expected: 2,
            found: 1,
        }
    );
}

#[test]
fn insert_value_must_fit_column() {
    let ctx = CriteriaContext::new();
    let users = users();
    let err = Insert::new(&ctx, &users)
        .unwrap()
        .columns(&["age"])
        .unwrap()
        .values(vec![Expr::from("thirty")])
        .err()
        .unwrap();
    assert_eq!(
        err,
        SqlError::TypeMismatch {
            operator: "value",
            left: ValueType::Integer,
            right: Some(ValueType::Text),
        }
    );
}

#[test]
fn insert_unknown_column() {
    let ctx = CriteriaContext::new();
    let users = users();
    assert!(matches!(
        Insert::new(&ctx, &users).unwrap().columns(&["nickname"]),
        Err(SqlError::UnresolvedReference { .. })
    ));
}

#[test]
fn insert_from_select() {
    let ctx = CriteriaContext::new();
    let (users, orders) = (users(), orders());
    let insert = Insert::new(&ctx, &orders)
        .unwrap()
        .columns(&["user_id", "status"])
        .unwrap();

    let source = insert.sub_query().unwrap().from(&users, "u").unwrap();
    let active = source.field("u", "active").unwrap();
    let source = source
        .columns("u", &["id", "name"])
        .unwrap()
        .where_clause(active.eq(true))
        .unwrap()
        .prepare()
        .unwrap();

    let insert = insert.select(source).unwrap().prepare().unwrap();
    assert_eq!(
        sql(&insert),
        "INSERT INTO orders (user_id, status) SELECT u.id, u.name FROM users AS u WHERE u.active = ?"
    );
}

#[test]
fn insert_from_select_checks_width() {
    let ctx = CriteriaContext::new();
    let (users, orders) = (users(), orders());
    let insert = Insert::new(&ctx, &orders)
        .unwrap()
        .columns(&["user_id", "status"])
        .unwrap();
    let source = insert
        .sub_query()
        .unwrap()
        .from(&users, "u")
        .unwrap()
        .columns("u", &["id"])
        .unwrap()
        .prepare()
        .unwrap();
    assert_eq!(
        insert.select(source).err().unwrap(),
        SqlError::ColumnCountMismatch {
            context: "INSERT ... SELECT",
            expected: 2,
            found: 1,
        }
    );
}

#[test]
fn insert_returning_needs_dialect_support() {
    let ctx = CriteriaContext::new();
    let orders = orders();
    let insert = Insert::new(&ctx, &orders)
        .unwrap()
        .columns(&["user_id", "status"])
        .unwrap()
        .values(vec![Expr::from(3_i64), Expr::from("open")])
        .unwrap();
    let id = insert.field("id").unwrap();
    let insert = insert.returning(id.alias("id")).unwrap().prepare().unwrap();

    assert_eq!(
        render_err(&insert),
        SqlError::UnsupportedForDialect {
            dialect: "generic",
            feature: String::from("RETURNING"),
        }
    );
    assert_eq!(
        insert.render(&postgres()).unwrap().sql,
        "INSERT INTO orders (user_id, status) VALUES ($1, $2) RETURNING orders.id"
    );
}

// ===================================================================
// UPDATE
// ===================================================================

#[test]
fn update_appends_version_bump() {
    let ctx = CriteriaContext::new();
    let accounts = accounts();
    let update = Update::new(&ctx, &accounts, "a").unwrap();
    let id = update.field("id").unwrap();
    let statement = update
        .set("balance", 100.5_f64)
        .unwrap()
        .where_clause(id.eq(1_i64))
        .unwrap()
        .prepare()
        .unwrap();

    let compiled = compile(&statement);
    assert_eq!(
        compiled.sql,
        "UPDATE bank.accounts AS a SET balance = ?, version = a.version + 1 WHERE a.id = ?"
    );
    assert_eq!(compiled.params[0].value_type, ValueType::Decimal);
    assert_eq!(compiled.params[1].value, SqlValue::Int(1));
    assert_eq!(statement.assignments().len(), 2);
}

#[test]
fn update_rejects_key_and_version_columns() {
    let ctx = CriteriaContext::new();
    let accounts = accounts();
    let err = Update::new(&ctx, &accounts, "a")
        .unwrap()
        .set("id", 2_i64)
        .err()
        .unwrap();
    assert_eq!(
        err,
        SqlError::NonUpdatableColumn {
            table: String::from("accounts"),
            column: String::from("id"),
        }
    );

    let err = Update::new(&ctx, &accounts, "a")
        .unwrap()
        .set("version", 7)
        .err()
        .unwrap();
    assert!(matches!(err, SqlError::NonUpdatableColumn { .. }));
}

#[test]
fn update_rejects_duplicate_assignment() {
    let ctx = CriteriaContext::new();
    let users = users();
    let err = Update::new(&ctx, &users, "u")
        .unwrap()
        .set("name", "Ann")
        .unwrap()
        .set("name", "Bob")
        .err()
        .unwrap();
    assert!(matches!(err, SqlError::DuplicateAlias { .. }));
}

#[test]
fn update_requires_where_unless_unconditional() {
    let ctx = CriteriaContext::new();
    let users = users();
    let err = Update::new(&ctx, &users, "u")
        .unwrap()
        .set("active", false)
        .unwrap()
        .prepare()
        .err()
        .unwrap();
    assert_eq!(
        err,
        SqlError::MissingRequiredClause {
            kind: StatementKind::Update,
            clause: "a WHERE clause",
        }
    );

    let statement = Update::new(&ctx, &users, "u")
        .unwrap()
        .set("active", false)
        .unwrap()
        .unconditional()
        .unwrap()
        .prepare()
        .unwrap();
    assert_eq!(sql(&statement), "UPDATE users AS u SET active = ?");
}

#[test]
fn update_with_expression_and_sub_query() {
    let ctx = CriteriaContext::new();
    let (users, orders) = (users(), orders());
    let update = Update::new(&ctx, &orders, "o").unwrap();
    let total = update.field("total").unwrap();
    let owner = update.field("user_id").unwrap();

    let inactive = update.sub_query().unwrap().from(&users, "u").unwrap();
    let active = inactive.field("u", "active").unwrap();
    let inactive = inactive
        .columns("u", &["id"])
        .unwrap()
        .where_clause(active.eq(false))
        .unwrap()
        .prepare()
        .unwrap();

    let statement = update
        .set("total", total.times(2).unwrap())
        .unwrap()
        .where_clause(owner.in_query(inactive).unwrap())
        .unwrap()
        .prepare()
        .unwrap();
    assert_eq!(
        sql(&statement),
        "UPDATE orders AS o SET total = o.total * ? \
         WHERE o.user_id IN (SELECT u.id FROM users AS u WHERE u.active = ?)"
    );
}

#[test]
fn update_returning_on_postgres() {
    let ctx = CriteriaContext::new();
    let users = users();
    let update = Update::new(&ctx, &users, "u").unwrap();
    let id = update.field("id").unwrap();
    let name = update.field("name").unwrap();
    let statement = update
        .set("name", "Ann")
        .unwrap()
        .where_clause(id.eq(1_i64))
        .unwrap()
        .returning(name.alias("name"))
        .unwrap()
        .prepare()
        .unwrap();
    assert_eq!(
        statement.render(&postgres()).unwrap().sql,
        "UPDATE users AS u SET name = $1 WHERE u.id = $2 RETURNING u.name"
    );
}

#[test]
fn returning_aliases_are_checked() {
    let ctx = CriteriaContext::new();
    let users = users();
    let update = Update::new(&ctx, &users, "u").unwrap();
    let name = update.field("name").unwrap();
    assert_eq!(
        update.set("name", "Ann").unwrap().returning(name.alias("")).err(),
        Some(SqlError::EmptyAlias {
            context: "selection alias",
        })
    );

    let ctx = CriteriaContext::new();
    let update = Update::new(&ctx, &users, "u").unwrap();
    let scope = ctx.current().unwrap();
    let id = update.field("id").unwrap();
    let name = update.field("name").unwrap();
    let update = update
        .set("name", "Ann")
        .unwrap()
        .where_clause(id.clone().eq(1_i64))
        .unwrap()
        .returning(id.alias("k"))
        .unwrap();
    assert_eq!(
        update.returning(name.alias("k")).err(),
        Some(SqlError::DuplicateAlias {
            alias: String::from("k"),
            scope,
        })
    );
}

#[test]
fn returning_aliases_are_checked_for_insert_and_delete() {
    let ctx = CriteriaContext::new();
    let orders = orders();
    let insert = Insert::new(&ctx, &orders)
        .unwrap()
        .columns(&["user_id", "status"])
        .unwrap()
        .values(vec![Expr::from(3_i64), Expr::from("open")])
        .unwrap();
    let id = insert.field("id").unwrap();
    let status = insert.field("status").unwrap();
    let insert = insert.returning(id.alias("id")).unwrap();
    assert!(matches!(
        insert.returning(status.alias("id")),
        Err(SqlError::DuplicateAlias { ref alias, .. }) if alias == "id"
    ));

    let ctx = CriteriaContext::new();
    let delete = Delete::from_table(&ctx, &orders, "o").unwrap();
    let id = delete.field("id").unwrap();
    let total = delete.field("total").unwrap();
    let delete = delete.returning(id.alias("id")).unwrap();
    assert!(matches!(
        delete.returning(total.alias("")),
        Err(SqlError::EmptyAlias { .. })
    ));
}

// ===================================================================
// DELETE
// ===================================================================

#[test]
fn delete_unconditional() {
    let ctx = CriteriaContext::new();
    let orders = orders();
    let statement = Delete::from_table(&ctx, &orders, "orders")
        .unwrap()
        .unconditional()
        .unwrap()
        .prepare()
        .unwrap();
    assert_eq!(sql(&statement), "DELETE FROM orders");
}

#[test]
fn delete_with_exists() {
    let ctx = CriteriaContext::new();
    let (users, orders) = (users(), orders());
    let delete = Delete::from_table(&ctx, &users, "u").unwrap();
    let inner = delete.sub_query().unwrap().from(&orders, "o").unwrap();
    let owner = inner.field("o", "user_id").unwrap();
    let user = inner.outer_field("u", "id").unwrap();
    let inner = inner
        .columns("o", &["id"])
        .unwrap()
        .where_clause(owner.eq(user))
        .unwrap()
        .prepare()
        .unwrap();

    let statement = delete
        .where_clause(not_exists(inner).unwrap())
        .unwrap()
        .prepare()
        .unwrap();
    assert_eq!(
        sql(&statement),
        "DELETE FROM users AS u WHERE NOT EXISTS (SELECT o.id FROM orders AS o WHERE o.user_id = u.id)"
    );
}

// ===================================================================
// Batches
// ===================================================================

fn batch_insert(ctx: &CriteriaContext) -> InsertStatement {
    let users = users();
    Insert::new(ctx, &users)
        .unwrap()
        .columns(&["name", "active"])
        .unwrap()
        .values(vec![
            batch_param("name", ValueType::Unknown),
            batch_param("active", ValueType::Boolean),
        ])
        .unwrap()
        .prepare()
        .unwrap()
}

#[test]
fn batch_renders_once_per_statement() {
    let ctx = CriteriaContext::new();
    let rows = vec![
        BatchRow::new().bind("name", "Ann").bind("active", true),
        BatchRow::new().bind("name", "Bob").bind("active", false),
    ];
    let batch = BatchStatement::new(batch_insert(&ctx), rows).unwrap();

    let compiled = batch.render(&postgres()).unwrap();
    assert_eq!(compiled.sql, "INSERT INTO users (name, active) VALUES ($1, $2)");
    assert_eq!(compiled.param_groups.len(), 2);
    assert_eq!(
        compiled.param_groups[1],
        vec![
            TypedValue::new(ValueType::Varchar, SqlValue::Text(String::from("Bob"))).unwrap(),
            TypedValue::new(ValueType::Boolean, SqlValue::Bool(false)).unwrap(),
        ]
    );
}

#[test]
fn batch_mixes_fixed_and_named_parameters() {
    let ctx = CriteriaContext::new();
    let users = users();
    let update = Update::new(&ctx, &users, "u").unwrap();
    let id = update.field("id").unwrap();
    let statement = update
        .set("active", true)
        .unwrap()
        .where_clause(id.eq(batch_param("id", ValueType::Unknown)))
        .unwrap()
        .prepare()
        .unwrap();
    let rows = vec![
        BatchRow::new().bind("id", 1_i64),
        BatchRow::new().bind("id", 2_i64),
    ];

    let compiled = BatchStatement::new(statement, rows)
        .unwrap()
        .render(&generic())
        .unwrap();
    assert_eq!(compiled.sql, "UPDATE users AS u SET active = ? WHERE u.id = ?");
    for (group, id) in compiled.param_groups.iter().zip([1, 2]) {
        assert_eq!(group[0].value, SqlValue::Bool(true));
        assert_eq!(group[1].value, SqlValue::Int(id));
        assert_eq!(group[1].value_type, ValueType::BigInt);
    }
}

#[test]
fn batch_row_missing_a_value() {
    let ctx = CriteriaContext::new();
    let rows = vec![BatchRow::new().bind("name", "Ann")];
    let batch = BatchStatement::new(batch_insert(&ctx), rows).unwrap();
    assert_eq!(
        batch.render(&generic()).unwrap_err(),
        SqlError::UnboundBatchParameter {
            name: String::from("active"),
        }
    );
}

#[test]
fn batch_row_value_of_wrong_type() {
    let ctx = CriteriaContext::new();
    let rows = vec![BatchRow::new().bind("name", "Ann").bind("active", "yes")];
    let batch = BatchStatement::new(batch_insert(&ctx), rows).unwrap();
    assert!(matches!(
        batch.render(&generic()),
        Err(SqlError::TypeMismatch { .. })
    ));
}

#[test]
fn batch_requires_rows() {
    let ctx = CriteriaContext::new();
    assert_eq!(
        BatchStatement::new(batch_insert(&ctx), vec![]).unwrap_err(),
        SqlError::EmptyList { operator: "batch" }
    );
}

#[test]
fn batch_parameters_cannot_render_alone() {
    let ctx = CriteriaContext::new();
    assert_eq!(
        render_err(&batch_insert(&ctx)),
        SqlError::UnboundBatchParameter {
            name: String::from("name"),
        }
    );
}

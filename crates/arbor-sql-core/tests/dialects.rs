//! The same statements rendered for the built-in dialects.

mod common;
use common::*;

use std::sync::Arc;

use arbor_sql_core::ast::SelectStatement;
use arbor_sql_core::dialect::{DialectOptions, GenericDialect, LiteralPolicy, QuotePolicy};
use arbor_sql_core::schema::{ColumnMeta, TableMeta};
use arbor_sql_core::types::ValueType;
use arbor_sql_core::{
    CompiledStatement, CriteriaContext, Renderable, Select, SqlError, SqlValue, TypedValue,
};

/// A table whose identifiers all need quoting.
fn awkward() -> Arc<TableMeta> {
    TableMeta::new("order")
        .column(ColumnMeta::new("select", ValueType::Integer))
        .column(ColumnMeta::new("Label", ValueType::Varchar))
        .column(ColumnMeta::new("value", ValueType::Double))
        .build()
}

fn adults_named_a(ctx: &CriteriaContext) -> SelectStatement {
    let users = users();
    let select = Select::new(ctx).unwrap().from(&users, "u").unwrap();
    let age = select.field("u", "age").unwrap();
    let name = select.field("u", "name").unwrap();
    select
        .columns("u", &["id", "name"])
        .unwrap()
        .where_clause(age.gt(30))
        .unwrap()
        .where_clause(name.like("A%"))
        .unwrap()
        .limit(10)
        .unwrap()
        .prepare()
        .unwrap()
}

// ===================================================================
// Placeholders and quoting
// ===================================================================

#[test]
fn placeholders_follow_the_dialect() {
    let ctx = CriteriaContext::new();
    let query = adults_named_a(&ctx);

    let generic = query.render(&generic()).unwrap();
    assert_eq!(
        generic.sql,
        "SELECT u.id, u.name FROM users AS u WHERE u.age > ? AND u.name LIKE ? LIMIT 10"
    );

    let pg = query.render(&postgres()).unwrap();
    assert_eq!(
        pg.sql,
        "SELECT u.id, u.name FROM users AS u WHERE u.age > $1 AND u.name LIKE $2 LIMIT 10"
    );

    let my = query.render(&mysql()).unwrap();
    assert_eq!(my.sql, generic.sql);

    // Parameters are identical whatever the placeholder syntax.
    assert_eq!(generic.params, pg.params);
    assert_eq!(
        generic.params,
        vec![
            TypedValue::new(ValueType::Integer, SqlValue::Int(30)).unwrap(),
            TypedValue::new(ValueType::Varchar, SqlValue::Text(String::from("A%"))).unwrap(),
        ]
    );
}

#[test]
fn reserved_and_mixed_case_identifiers_are_quoted() {
    let ctx = CriteriaContext::new();
    let table = awkward();
    let query = Select::new(&ctx)
        .unwrap()
        .from(&table, "o")
        .unwrap()
        .columns("o", &["select", "Label", "value"])
        .unwrap()
        .prepare()
        .unwrap();

    assert_eq!(
        sql(&query),
        r#"SELECT o."select", o."Label", o.value FROM "order" AS o"#
    );
    assert_eq!(
        query.render(&mysql()).unwrap().sql,
        "SELECT o.`select`, o.`Label`, o.value FROM `order` AS o"
    );

    let always = GenericDialect::with_options(DialectOptions::new().quote_policy(QuotePolicy::Always));
    assert_eq!(
        query.render(&always).unwrap().sql,
        r#"SELECT "o"."select", "o"."Label", "o"."value" FROM "order" AS "o""#
    );
}

// ===================================================================
// Literal policy
// ===================================================================

#[test]
fn optimizing_inlines_only_injection_safe_values() {
    let ctx = CriteriaContext::new();
    let users = users();
    let select = Select::new(&ctx).unwrap().from(&users, "u").unwrap();
    let age = select.field("u", "age").unwrap();
    let name = select.field("u", "name").unwrap();
    let active = select.field("u", "active").unwrap();
    let query = select
        .columns("u", &["id"])
        .unwrap()
        .where_clause(age.eq(30).and(name.eq("Bob")).and(active.eq(true)))
        .unwrap()
        .prepare()
        .unwrap();

    let strict = compile(&query);
    assert_eq!(
        strict.sql,
        "SELECT u.id FROM users AS u WHERE u.age = ? AND u.name = ? AND u.active = ?"
    );
    assert_eq!(strict.params.len(), 3);

    let optimized = query.render(&optimizing()).unwrap();
    assert_eq!(
        optimized.sql,
        "SELECT u.id FROM users AS u WHERE u.age = 30 AND u.name = ? AND u.active = TRUE"
    );
    assert_eq!(
        optimized.params,
        vec![TypedValue::new(ValueType::Varchar, SqlValue::Text(String::from("Bob"))).unwrap()]
    );
}

#[test]
fn optimizing_binds_non_finite_floats() {
    let ctx = CriteriaContext::new();
    let table = awkward();
    let select = Select::new(&ctx).unwrap().from(&table, "o").unwrap();
    let value = select.field("o", "value").unwrap();
    let query = select
        .columns("o", &["value"])
        .unwrap()
        .where_clause(value.clone().gt(1.5))
        .unwrap()
        .where_clause(value.lt(f64::INFINITY))
        .unwrap()
        .prepare()
        .unwrap();

    let compiled = query.render(&optimizing()).unwrap();
    assert_eq!(
        compiled.sql,
        r#"SELECT o.value FROM "order" AS o WHERE o.value > 1.5 AND o.value < ?"#
    );
    assert_eq!(compiled.params.len(), 1);
    assert_eq!(compiled.params[0].value, SqlValue::Float(f64::INFINITY));
}

// ===================================================================
// Dialect-specific syntax
// ===================================================================

#[test]
fn full_join_is_refused_by_mysql() {
    let ctx = CriteriaContext::new();
    let (users, orders) = (users(), orders());
    let select = Select::new(&ctx)
        .unwrap()
        .from(&users, "u")
        .unwrap()
        .full_join(&orders, "o")
        .unwrap();
    let on = select
        .field("o", "user_id")
        .unwrap()
        .eq(select.field("u", "id").unwrap());
    let query = select
        .on(on)
        .unwrap()
        .columns("u", &["id"])
        .unwrap()
        .prepare()
        .unwrap();

    assert_eq!(
        sql(&query),
        "SELECT u.id FROM users AS u FULL JOIN orders AS o ON o.user_id = u.id"
    );
    assert!(matches!(
        query.render(&mysql()),
        Err(SqlError::UnsupportedForDialect {
            dialect: "mysql",
            ..
        })
    ));
}

#[test]
fn mysql_offset_needs_a_limit() {
    let ctx = CriteriaContext::new();
    let users = users();
    let query = Select::new(&ctx)
        .unwrap()
        .from(&users, "u")
        .unwrap()
        .columns("u", &["id"])
        .unwrap()
        .offset(3)
        .unwrap()
        .prepare()
        .unwrap();

    assert_eq!(sql(&query), "SELECT u.id FROM users AS u OFFSET 3");
    assert_eq!(
        query.render(&mysql()).unwrap().sql,
        "SELECT u.id FROM users AS u LIMIT 18446744073709551615 OFFSET 3"
    );
}

#[test]
fn ilike_only_where_the_dialect_has_it() {
    let ctx = CriteriaContext::new();
    let users = users();
    let select = Select::new(&ctx).unwrap().from(&users, "u").unwrap();
    let email = select.field("u", "email").unwrap();
    let query = select
        .columns("u", &["id"])
        .unwrap()
        .where_clause(email.ilike("%@example.com"))
        .unwrap()
        .prepare()
        .unwrap();

    assert_eq!(
        query.render(&postgres()).unwrap().sql,
        "SELECT u.id FROM users AS u WHERE u.email ILIKE $1"
    );
    assert!(matches!(
        render_err(&query),
        SqlError::UnsupportedForDialect {
            dialect: "generic",
            ..
        }
    ));
    assert!(query.render(&mysql()).is_err());
}

#[test]
fn concat_and_cast_per_dialect() {
    let ctx = CriteriaContext::new();
    let users = users();
    let select = Select::new(&ctx).unwrap().from(&users, "u").unwrap();
    let name = select.field("u", "name").unwrap();
    let age = select.field("u", "age").unwrap();
    let query = select
        .select(name.concat("!").unwrap().alias("shout"))
        .unwrap()
        .select(age.cast(ValueType::Varchar).alias("age_text"))
        .unwrap()
        .prepare()
        .unwrap();

    assert_eq!(
        sql(&query),
        "SELECT u.name || ? AS shout, CAST(u.age AS VARCHAR) AS age_text FROM users AS u"
    );
    assert_eq!(
        query.render(&mysql()).unwrap().sql,
        "SELECT CONCAT(u.name, ?) AS shout, CAST(u.age AS CHAR) AS age_text FROM users AS u"
    );
}

#[test]
fn mixed_bitwise_nesting_follows_each_dialect() {
    let ctx = CriteriaContext::new();
    let users = users();
    let select = Select::new(&ctx).unwrap().from(&users, "u").unwrap();
    let id = select.field("u", "id").unwrap();
    let age = select.field("u", "age").unwrap();

    let or_of_and = id.clone().bit_or(age.clone().bit_and(id.clone()).unwrap()).unwrap();
    let and_of_or = id.clone().bit_or(age.clone()).unwrap().bit_and(id.clone()).unwrap();
    let and_of_shift = id
        .clone()
        .bit_and(age.clone().shift_left(id.clone()).unwrap())
        .unwrap();
    let query = select
        .select(or_of_and.alias("a"))
        .unwrap()
        .select(and_of_or.alias("b"))
        .unwrap()
        .select(and_of_shift.alias("c"))
        .unwrap()
        .prepare()
        .unwrap();

    assert_eq!(
        sql(&query),
        "SELECT u.id | u.age & u.id AS a, (u.id | u.age) & u.id AS b, \
         u.id & u.age << u.id AS c FROM users AS u"
    );
    // PostgreSQL evaluates these operators left to right on a single level.
    assert_eq!(
        query.render(&postgres()).unwrap().sql,
        "SELECT u.id | (u.age & u.id) AS a, u.id | u.age & u.id AS b, \
         u.id & (u.age << u.id) AS c FROM users AS u"
    );
    assert_eq!(query.render(&mysql()).unwrap().sql, sql(&query));
}

#[test]
fn xor_against_multiplication_per_dialect() {
    let ctx = CriteriaContext::new();
    let users = users();
    let select = Select::new(&ctx).unwrap().from(&users, "u").unwrap();
    let id = select.field("u", "id").unwrap();
    let age = select.field("u", "age").unwrap();

    let xor_of_product = id.clone().bit_xor(age.clone().times(id.clone()).unwrap()).unwrap();
    let product_of_xor = id.clone().bit_xor(age).unwrap().times(id).unwrap();
    let query = select
        .select(xor_of_product.alias("a"))
        .unwrap()
        .select(product_of_xor.alias("b"))
        .unwrap()
        .prepare()
        .unwrap();

    assert_eq!(
        sql(&query),
        "SELECT u.id ^ u.age * u.id AS a, (u.id ^ u.age) * u.id AS b FROM users AS u"
    );
    assert_eq!(
        query.render(&postgres()).unwrap().sql,
        "SELECT u.id # u.age * u.id AS a, (u.id # u.age) * u.id AS b FROM users AS u"
    );
    // MySQL binds `^` above `*`.
    assert_eq!(
        query.render(&mysql()).unwrap().sql,
        "SELECT u.id ^ (u.age * u.id) AS a, u.id ^ u.age * u.id AS b FROM users AS u"
    );
}

#[test]
fn concat_operand_inside_arithmetic() {
    let ctx = CriteriaContext::new();
    let users = users();
    let select = Select::new(&ctx).unwrap().from(&users, "u").unwrap();
    let name = select.field("u", "name").unwrap();
    let age = select.field("u", "age").unwrap();
    let id = select.field("u", "id").unwrap();

    let query = select
        .select(name.concat(age.times(id).unwrap()).unwrap().alias("tag"))
        .unwrap()
        .prepare()
        .unwrap();

    assert_eq!(
        sql(&query),
        "SELECT u.name || u.age * u.id AS tag FROM users AS u"
    );
    // CONCAT(...) is a call, so its arguments never need brackets.
    assert_eq!(
        query.render(&mysql()).unwrap().sql,
        "SELECT CONCAT(u.name, u.age * u.id) AS tag FROM users AS u"
    );
}

#[test]
fn cast_to_boolean_is_refused_by_mysql() {
    let ctx = CriteriaContext::new();
    let users = users();
    let select = Select::new(&ctx).unwrap().from(&users, "u").unwrap();
    let age = select.field("u", "age").unwrap();
    let query = select
        .select(age.cast(ValueType::Boolean).alias("adult"))
        .unwrap()
        .prepare()
        .unwrap();

    assert_eq!(
        sql(&query),
        "SELECT CAST(u.age AS BOOLEAN) AS adult FROM users AS u"
    );
    assert_eq!(
        query.render(&mysql()).unwrap_err(),
        SqlError::UnsupportedForDialect {
            dialect: "mysql",
            feature: String::from("CAST to BOOLEAN"),
        }
    );
}

// ===================================================================
// Serialization
// ===================================================================

#[test]
fn compiled_statement_serializes() {
    let ctx = CriteriaContext::new();
    let compiled = compile(&adults_named_a(&ctx));
    let json = serde_json::to_string(&compiled).unwrap();
    assert!(json.contains("\"integer\""));
    let back: CompiledStatement = serde_json::from_str(&json).unwrap();
    assert_eq!(back, compiled);
}

#[test]
fn dialect_options_load_from_json() {
    let options: DialectOptions =
        serde_json::from_str(r#"{"quote_policy": "always", "literal_policy": "optimizing"}"#)
            .unwrap();
    assert_eq!(options.quote_policy, QuotePolicy::Always);
    assert_eq!(options.literal_policy, LiteralPolicy::Optimizing);

    let defaults: DialectOptions = serde_json::from_str("{}").unwrap();
    assert_eq!(defaults, DialectOptions::new());
}

//! Expression rendering and bracket placement.

use super::{ParamSlot, RenderContext, Renderable};
use crate::ast::{
    CaseExpr, Expr, FieldRef, FunctionArgs, FunctionCall, FunctionKind, OrderBy, OrderDirection,
    Predicate, StatementKind, WindowFunction,
};
use crate::dialect::{LiteralPolicy, OperatorSyntax};
use crate::error::{Result, SqlError};
use crate::operator::{
    needs_brackets_at, BinaryOp, ExistsOp, Fixity, MembershipOp, Operator, RangeOp, Side, UnaryOp,
    PRECEDENCE_ATOM,
};

impl RenderContext<'_> {
    pub(crate) fn expr(&mut self, expr: &Expr) -> Result<()> {
        match expr {
            Expr::Field(field) => self.field(field),
            Expr::Selection(selection) => {
                self.check_selection(selection)?;
                self.identifier(&selection.name);
                Ok(())
            }
            Expr::Literal(value) => self.value(value, value.value_type.is_injection_safe()),
            Expr::Param(value) => {
                let inline = self.dialect.literal_policy() == LiteralPolicy::Optimizing
                    && value.value_type.is_injection_safe();
                self.value(value, inline)
            }
            Expr::BatchParam { name, value_type } => {
                self.bind(ParamSlot::Batch {
                    name: name.clone(),
                    value_type: *value_type,
                });
                Ok(())
            }
            Expr::Unary { op, operand, .. } => self.unary(*op, operand),
            Expr::Binary {
                left, op, right, ..
            } => self.binary(left, *op, right),
            Expr::Between {
                expr,
                low,
                high,
                negated,
            } => {
                let op = Operator::Range(RangeOp::from_negated(*negated));
                self.operand(op, expr, Side::Left)?;
                self.keyword(op.info().text);
                self.operand(op, low, Side::Right)?;
                self.push_str(" AND ");
                self.operand(op, high, Side::Right)
            }
            Expr::InList {
                expr,
                list,
                negated,
            } => {
                let op = Operator::Membership(MembershipOp::from_negated(*negated));
                if list.is_empty() {
                    return Err(SqlError::EmptyList {
                        operator: op.info().text,
                    });
                }
                self.operand(op, expr, Side::Left)?;
                self.keyword(op.info().text);
                self.push_str("(");
                self.list(list)?;
                self.push_str(")");
                Ok(())
            }
            Expr::InQuery {
                expr,
                query,
                negated,
            } => {
                let op = Operator::Membership(MembershipOp::from_negated(*negated));
                self.operand(op, expr, Side::Left)?;
                self.keyword(op.info().text);
                self.sub_query(query)
            }
            Expr::Exists { query, negated } => {
                self.push_str(ExistsOp::from_negated(*negated).info().text);
                self.push_str(" ");
                self.sub_query(query)
            }
            Expr::ScalarQuery(query) => self.sub_query(query),
            Expr::Function(call) => {
                if call.kind == FunctionKind::Window {
                    return Err(SqlError::MissingRequiredClause {
                        kind: StatementKind::Select,
                        clause: "an OVER clause for a window function",
                    });
                }
                self.function(call)
            }
            Expr::Row(items) => {
                self.push_str("(");
                self.list(items)?;
                self.push_str(")");
                Ok(())
            }
            Expr::Case(case) => self.case(case),
            Expr::Window(window) => self.window(window),
            Expr::Cast { expr, target } => {
                let target = self.dialect.cast_type(*target)?;
                self.push_str("CAST(");
                self.expr(expr)?;
                self.push_str(" AS ");
                self.push_str(target);
                self.push_str(")");
                Ok(())
            }
            Expr::And(left, right) => {
                self.conjunct(left)?;
                self.push_str(" AND ");
                self.conjunct(right)
            }
            Expr::Or(left, right) => {
                self.disjunct(left)?;
                self.push_str(" OR ");
                self.disjunct(right)
            }
            Expr::Not(inner) => {
                self.push_str("NOT ");
                if matches!(**inner, Expr::And(..) | Expr::Or(..) | Expr::Not(_)) {
                    self.bracketed(inner)
                } else {
                    self.expr(inner)
                }
            }
        }
    }

    /// Renders predicates joined by AND.
    pub(crate) fn predicates(&mut self, predicates: &[Predicate]) -> Result<()> {
        if let [only] = predicates {
            return self.expr(only.as_expr());
        }
        for (i, predicate) in predicates.iter().enumerate() {
            if i > 0 {
                self.push_str(" AND ");
            }
            self.conjunct(predicate.as_expr())?;
        }
        Ok(())
    }

    /// Renders expressions separated by commas.
    pub(crate) fn list(&mut self, items: &[Expr]) -> Result<()> {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.push_str(", ");
            }
            self.expr(item)?;
        }
        Ok(())
    }

    pub(crate) fn order_items(&mut self, items: &[OrderBy]) -> Result<()> {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.push_str(", ");
            }
            self.expr(&item.expr)?;
            if item.direction == OrderDirection::Desc {
                self.push_str(" DESC");
            }
            if let Some(nulls) = item.nulls {
                self.push_str(" ");
                self.push_str(nulls.as_str());
            }
        }
        Ok(())
    }

    fn field(&mut self, field: &FieldRef) -> Result<()> {
        self.check_field(field)?;
        self.identifier(&field.qualifier);
        self.push_str(".");
        self.identifier(&field.column);
        Ok(())
    }

    fn keyword(&mut self, text: &str) {
        self.push_str(" ");
        self.push_str(text);
        self.push_str(" ");
    }

    fn bracketed(&mut self, expr: &Expr) -> Result<()> {
        self.push_str("(");
        self.expr(expr)?;
        self.push_str(")");
        Ok(())
    }

    /// Rank of `op` as the dialect parses it.
    fn rank(&self, op: Operator) -> u8 {
        match op {
            Operator::Binary(op) => self.dialect.binary_precedence(op),
            _ => op.info().precedence,
        }
    }

    // Operators spelled as function calls bind like atoms.
    fn child_rank(&self, child: &Expr) -> u8 {
        match child {
            Expr::Binary { op, .. } => match self.dialect.binary_operator(*op) {
                Ok(OperatorSyntax::Function(_)) => PRECEDENCE_ATOM,
                _ => self.dialect.binary_precedence(*op),
            },
            _ => child.precedence(),
        }
    }

    fn operand(&mut self, parent: Operator, child: &Expr, side: Side) -> Result<()> {
        if needs_brackets_at(parent, self.rank(parent), self.child_rank(child), side) {
            self.bracketed(child)
        } else {
            self.expr(child)
        }
    }

    // An AND operand needs brackets only when it is an OR.
    fn conjunct(&mut self, expr: &Expr) -> Result<()> {
        if matches!(expr, Expr::Or(..)) {
            self.bracketed(expr)
        } else {
            self.expr(expr)
        }
    }

    // An OR operand needs brackets when it is an AND or a NOT.
    fn disjunct(&mut self, expr: &Expr) -> Result<()> {
        if matches!(expr, Expr::And(..) | Expr::Not(_)) {
            self.bracketed(expr)
        } else {
            self.expr(expr)
        }
    }

    fn unary(&mut self, op: UnaryOp, operand: &Expr) -> Result<()> {
        let info = op.info();
        let parent = Operator::Unary(op);
        if info.fixity == Fixity::Postfix {
            self.operand(parent, operand, Side::Left)?;
            self.push_str(" ");
            self.push_str(info.text);
            return Ok(());
        }
        self.push_str(info.text);
        if info.text.ends_with(|c: char| c.is_ascii_alphabetic()) {
            self.push_str(" ");
        }
        let start = self.sql.len();
        self.operand(parent, operand, Side::Right)?;
        // `--` would start a comment
        if op == UnaryOp::Neg && self.sql[start..].starts_with('-') {
            self.sql.insert(start, '(');
            self.sql.push(')');
        }
        Ok(())
    }

    fn binary(&mut self, left: &Expr, op: BinaryOp, right: &Expr) -> Result<()> {
        match self.dialect.binary_operator(op)? {
            OperatorSyntax::Infix(text) => {
                let parent = Operator::Binary(op);
                self.operand(parent, left, Side::Left)?;
                self.keyword(text);
                self.operand(parent, right, Side::Right)
            }
            OperatorSyntax::Function(name) => {
                self.push_str(name);
                self.push_str("(");
                self.expr(left)?;
                self.push_str(", ");
                self.expr(right)?;
                self.push_str(")");
                Ok(())
            }
        }
    }

    fn function(&mut self, call: &FunctionCall) -> Result<()> {
        self.push_str(&call.name);
        self.push_str("(");
        if call.distinct {
            self.push_str("DISTINCT ");
        }
        match &call.args {
            FunctionArgs::Star => self.push_str("*"),
            FunctionArgs::List(args) => self.list(args)?,
        }
        self.push_str(")");
        Ok(())
    }

    fn case(&mut self, case: &CaseExpr) -> Result<()> {
        self.push_str("CASE");
        if let Some(operand) = &case.operand {
            self.push_str(" ");
            self.expr(operand)?;
        }
        for (condition, then) in &case.branches {
            self.push_str(" WHEN ");
            self.expr(condition)?;
            self.push_str(" THEN ");
            self.expr(then)?;
        }
        if let Some(otherwise) = &case.otherwise {
            self.push_str(" ELSE ");
            self.expr(otherwise)?;
        }
        self.push_str(" END");
        Ok(())
    }

    fn window(&mut self, window: &WindowFunction) -> Result<()> {
        if !self.dialect.supports_window_functions() {
            return Err(self.unsupported("window functions"));
        }
        self.function(&window.function)?;
        self.push_str(" OVER (");
        let spec = &window.spec;
        let mut separator = "";
        if !spec.partition_by.is_empty() {
            self.push_str("PARTITION BY ");
            self.list(&spec.partition_by)?;
            separator = " ";
        }
        if !spec.order_by.is_empty() {
            self.push_str(separator);
            self.push_str("ORDER BY ");
            self.order_items(&spec.order_by)?;
            separator = " ";
        }
        if let Some(frame) = spec.frame {
            self.push_str(separator);
            self.push_str(frame.units.as_str());
            self.push_str(" BETWEEN ");
            self.push_str(&frame.start.to_sql());
            self.push_str(" AND ");
            self.push_str(&frame.end.to_sql());
        }
        self.push_str(")");
        Ok(())
    }
}

impl Renderable for Expr {
    fn render_to(&self, ctx: &mut RenderContext<'_>) -> Result<()> {
        ctx.expr(self)
    }

    fn label(&self) -> &'static str {
        "expression"
    }
}

impl Renderable for Predicate {
    fn render_to(&self, ctx: &mut RenderContext<'_>) -> Result<()> {
        ctx.expr(self.as_expr())
    }

    fn label(&self) -> &'static str {
        "predicate"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{FrameBound, WindowSpec};
    use crate::builder::{case_when, count_star, row_number};
    use crate::dialect::{DialectOptions, GenericDialect, MySqlDialect, PostgresDialect};
    use crate::types::ValueType;
    use crate::value::SqlValue;

    fn column(name: &str, value_type: ValueType) -> Expr {
        Expr::Field(FieldRef {
            qualifier: String::from("t"),
            column: String::from(name),
            value_type,
            nullable: false,
            depth: 0,
        })
    }

    fn sql(node: &impl Renderable) -> String {
        node.render(&GenericDialect::new()).unwrap().sql
    }

    #[test]
    fn test_or_of_and_brackets_the_and() {
        let a = column("a", ValueType::Integer);
        let b = column("b", ValueType::Integer);
        let c = column("c", ValueType::Integer);
        let predicate = a
            .eq(Expr::literal(5_i32))
            .or(b.eq(Expr::literal(6_i32)).and(c.eq(Expr::literal(7_i32))));
        assert_eq!(sql(&predicate), "t.a = 5 OR (t.b = 6 AND t.c = 7)");
    }

    #[test]
    fn test_and_of_or_brackets_the_or() {
        let a = column("a", ValueType::Boolean);
        let b = column("b", ValueType::Boolean);
        let c = column("c", ValueType::Boolean);
        let predicate = a
            .is_null()
            .or(b.is_null())
            .and(c.is_not_null());
        assert_eq!(sql(&predicate), "(t.a IS NULL OR t.b IS NULL) AND t.c IS NOT NULL");
    }

    #[test]
    fn test_nested_or_is_flat() {
        let a = column("a", ValueType::Integer);
        let predicate = a
            .clone()
            .eq(Expr::literal(1_i32))
            .or(a.clone().eq(Expr::literal(2_i32)))
            .or(a.eq(Expr::literal(3_i32)));
        assert_eq!(sql(&predicate), "t.a = 1 OR t.a = 2 OR t.a = 3");
    }

    #[test]
    fn test_not_inside_or_and_not_of_composite() {
        let a = column("a", ValueType::Integer);
        let b = column("b", ValueType::Integer);
        let left = a.clone().eq(Expr::literal(1_i32)).not();
        let predicate = left.or(b.clone().eq(Expr::literal(2_i32)));
        assert_eq!(sql(&predicate), "(NOT t.a = 1) OR t.b = 2");

        let negated = a
            .eq(Expr::literal(1_i32))
            .and(b.eq(Expr::literal(2_i32)))
            .not();
        assert_eq!(sql(&negated), "NOT (t.a = 1 AND t.b = 2)");
    }

    #[test]
    fn test_arithmetic_precedence() {
        let a = column("a", ValueType::Integer);
        let b = column("b", ValueType::Integer);
        let c = column("c", ValueType::Integer);
        let sum = a.clone().plus(b.clone()).unwrap();
        let product = sum.times(c.clone()).unwrap();
        assert_eq!(sql(&product), "(t.a + t.b) * t.c");

        let difference = a.clone().minus(b.clone().minus(c.clone()).unwrap()).unwrap();
        assert_eq!(sql(&difference), "t.a - (t.b - t.c)");

        let left_assoc = a.minus(b).unwrap().minus(c).unwrap();
        assert_eq!(sql(&left_assoc), "t.a - t.b - t.c");
    }

    #[test]
    fn test_comparison_of_arithmetic_is_unbracketed() {
        let a = column("a", ValueType::Integer);
        let b = column("b", ValueType::Integer);
        let predicate = a.plus(Expr::literal(1_i32)).unwrap().gt(b);
        assert_eq!(sql(&predicate), "t.a + 1 > t.b");
    }

    #[test]
    fn test_negating_a_negative_literal() {
        let negated = Expr::literal(-5_i32).negate().unwrap();
        assert_eq!(sql(&negated), "-(-5)");
    }

    #[test]
    fn test_params_and_literals() {
        let a = column("a", ValueType::Text);
        let compiled = a
            .clone()
            .eq(Expr::literal("x"))
            .render(&GenericDialect::new())
            .unwrap();
        assert_eq!(compiled.sql, "t.a = ?");
        assert_eq!(compiled.params[0].value, SqlValue::Text(String::from("x")));

        let n = column("n", ValueType::BigInt);
        let strict = n.clone().eq(7_i64).render(&GenericDialect::new()).unwrap();
        assert_eq!(strict.sql, "t.n = ?");
        let optimizing = GenericDialect::with_options(
            DialectOptions::new().literal_policy(LiteralPolicy::Optimizing),
        );
        let inlined = n.clone().eq(7_i64).render(&optimizing).unwrap();
        assert_eq!(inlined.sql, "t.n = 7");
        assert!(inlined.params.is_empty());
        let text = a.eq("y").render(&optimizing).unwrap();
        assert_eq!(text.sql, "t.a = ?");
    }

    #[test]
    fn test_null_param_under_optimizing_policy() {
        let optimizing = GenericDialect::with_options(
            DialectOptions::new().literal_policy(LiteralPolicy::Optimizing),
        );
        let n = column("n", ValueType::Integer);
        let compiled = n
            .clone()
            .eq(Expr::null(ValueType::Integer))
            .render(&optimizing)
            .unwrap();
        assert_eq!(compiled.sql, "t.n = NULL");
        let strict = n.eq(Expr::null(ValueType::Integer)).render(&GenericDialect::new()).unwrap();
        assert_eq!(strict.sql, "t.n = ?");
        assert_eq!(strict.params[0].value, SqlValue::Null);
    }

    #[test]
    fn test_between_and_in_list() {
        let a = column("a", ValueType::Integer);
        let between = a.clone().between(1_i32, 10_i32);
        assert_eq!(sql(&between), "t.a BETWEEN ? AND ?");
        let in_list = a.not_in_list([1_i32, 2, 3]).unwrap();
        assert_eq!(sql(&in_list), "t.a NOT IN (?, ?, ?)");
    }

    #[test]
    fn test_placeholders_are_numbered_in_order() {
        let a = column("a", ValueType::Integer);
        let b = column("b", ValueType::Text);
        let predicate = a.eq(1_i32).and(b.like("x%"));
        let compiled = predicate.render(&PostgresDialect::new()).unwrap();
        assert_eq!(compiled.sql, "t.a = $1 AND t.b LIKE $2");
        assert_eq!(compiled.params.len(), 2);
    }

    #[test]
    fn test_concat_in_mysql() {
        let a = column("a", ValueType::Text);
        let b = column("b", ValueType::Text);
        let joined = a.concat(b).unwrap();
        assert_eq!(
            joined.render(&MySqlDialect::new()).unwrap().sql,
            "CONCAT(t.a, t.b)"
        );
        assert_eq!(sql(&joined), "t.a || t.b");
    }

    #[test]
    fn test_unsupported_operator_is_reported() {
        let a = column("a", ValueType::Text);
        let predicate = a.ilike("x%");
        assert!(matches!(
            predicate.render(&MySqlDialect::new()),
            Err(SqlError::UnsupportedForDialect { dialect: "mysql", .. })
        ));
        assert!(predicate.render(&PostgresDialect::new()).is_ok());
    }

    #[test]
    fn test_case_and_cast() {
        let a = column("a", ValueType::Integer);
        let case = case_when(a.clone().gt(Expr::literal(0_i32)), Expr::literal(1_i32))
            .otherwise(Expr::literal(0_i32))
            .unwrap();
        assert_eq!(sql(&case), "CASE WHEN t.a > 0 THEN 1 ELSE 0 END");
        let cast = a.cast(ValueType::Double);
        assert_eq!(
            cast.render(&PostgresDialect::new()).unwrap().sql,
            "CAST(t.a AS DOUBLE PRECISION)"
        );
    }

    #[test]
    fn test_window_function() {
        let a = column("a", ValueType::Integer);
        let b = column("b", ValueType::Integer);
        let spec = WindowSpec::new()
            .partition_by(a)
            .order_by(b.desc())
            .rows(FrameBound::UnboundedPreceding, FrameBound::CurrentRow);
        let ranked = row_number().over(spec).unwrap();
        assert_eq!(
            sql(&ranked),
            "ROW_NUMBER() OVER (PARTITION BY t.a ORDER BY t.b DESC \
             ROWS BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW)"
        );
        assert_eq!(sql(&count_star().over(WindowSpec::new()).unwrap()), "COUNT(*) OVER ()");
    }

    #[test]
    fn test_window_function_without_over_fails() {
        assert!(matches!(
            row_number().render(&GenericDialect::new()),
            Err(SqlError::MissingRequiredClause { .. })
        ));
    }

    #[test]
    fn test_rendering_is_idempotent() {
        let a = column("a", ValueType::Integer);
        let predicate = a.clone().eq(1_i32).or(a.in_list([2_i32, 3]).unwrap());
        let dialect = PostgresDialect::new();
        assert_eq!(predicate.render(&dialect), predicate.render(&dialect));
    }
}

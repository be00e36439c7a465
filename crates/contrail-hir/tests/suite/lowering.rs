use contrail_hir::{
    lower_body, lower_compilation_unit, BinaryOp, Body, Expr, ExprId, LiteralKind, Stmt, StmtId,
};
use contrail_syntax::{parse, parse_block};
use pretty_assertions::assert_eq;

fn body(text: &str) -> Body {
    let (block, errors) = parse_block(text, 0);
    assert!(errors.is_empty(), "{errors:?}");
    let body = lower_body(&block);
    body.validate().expect("lowered bodies are well formed");
    body
}

/// Renders an expression back to a compact s-expression for assertions.
fn render(body: &Body, expr: ExprId) -> String {
    match &body.exprs[expr] {
        Expr::Name { name, .. } => name.clone(),
        Expr::Literal { value, .. } => value.clone(),
        Expr::This { .. } => "this".to_string(),
        Expr::Polyadic { op, operands, .. } => {
            let operands: Vec<_> = operands.iter().map(|&e| render(body, e)).collect();
            format!("({op:?} {})", operands.join(" "))
        }
        Expr::Paren { expr, .. } => format!("[{}]", render(body, *expr)),
        Expr::Unary { op, expr, .. } => format!("({op:?} {})", render(body, *expr)),
        Expr::InstanceOf { expr, ty, .. } => format!("(instanceof {} {ty})", render(body, *expr)),
        Expr::Call { callee, args, .. } => {
            let args: Vec<_> = args.iter().map(|&e| render(body, e)).collect();
            format!("{}({})", render(body, *callee), args.join(", "))
        }
        Expr::FieldAccess { receiver, name, .. } => format!("{}.{name}", render(body, *receiver)),
        Expr::New { class, .. } => format!("new {class}"),
        Expr::Cast { ty, expr, .. } => format!("(cast {ty} {})", render(body, *expr)),
        Expr::Lambda { .. } => "lambda".to_string(),
        Expr::MethodRef { receiver, name, .. } => format!("{}::{name}", render(body, *receiver)),
        other => format!("{other:?}"),
    }
}

fn return_expr(body: &Body, stmt: StmtId) -> ExprId {
    match &body.stmts[stmt] {
        Stmt::Return {
            expr: Some(expr), ..
        } => *expr,
        other => panic!("expected return, got {other:?}"),
    }
}

#[test]
fn same_operator_chains_become_one_polyadic_node() {
    let body = body("{ return a && b && c; }");
    let expr = return_expr(&body, body.statements()[0]);
    assert_eq!(render(&body, expr), "(And a b c)");
}

#[test]
fn casts_lambdas_and_method_references_lower() {
    let body = body("{ return (String) o == null ? () -> o : Objects::isNull; }");
    let expr = return_expr(&body, body.statements()[0]);
    let Expr::Conditional {
        condition,
        then_expr,
        else_expr,
        ..
    } = &body.exprs[expr]
    else {
        panic!("expected conditional");
    };
    assert_eq!(render(&body, *condition), "(Eq (cast String o) null)");
    assert_eq!(render(&body, *then_expr), "lambda");
    assert_eq!(render(&body, *else_expr), "Objects::isNull");
}

#[test]
fn parentheses_stop_flattening() {
    let body = body("{ return a && (b && c); }");
    let expr = return_expr(&body, body.statements()[0]);
    assert_eq!(render(&body, expr), "(And a [(And b c)])");
}

#[test]
fn mixed_operators_nest_by_precedence() {
    let body = body("{ return a == null || b != null && c; }");
    let expr = return_expr(&body, body.statements()[0]);
    assert_eq!(
        render(&body, expr),
        "(Or (Eq a null) (And (NotEq b null) c))"
    );
}

#[test]
fn literals_keep_their_kind() {
    let body = body("{ return flag ? true : null; }");
    let expr = return_expr(&body, body.statements()[0]);
    let Expr::Conditional {
        then_expr,
        else_expr,
        ..
    } = &body.exprs[expr]
    else {
        panic!("expected conditional");
    };
    assert!(matches!(
        body.exprs[*then_expr],
        Expr::Literal {
            literal: LiteralKind::True,
            ..
        }
    ));
    assert!(matches!(
        body.exprs[*else_expr],
        Expr::Literal {
            literal: LiteralKind::Null,
            ..
        }
    ));
}

#[test]
fn if_without_else_and_throw() {
    let body = body("{ if (s == null) { throw new IllegalStateException(\"s\"); } return s; }");
    let stmts = body.statements();
    assert_eq!(stmts.len(), 2);
    let Stmt::If {
        condition,
        then_branch,
        else_branch,
        ..
    } = &body.stmts[stmts[0]]
    else {
        panic!("expected if");
    };
    assert_eq!(render(&body, *condition), "(Eq s null)");
    assert!(else_branch.is_none());
    let Stmt::Block { statements, .. } = &body.stmts[*then_branch] else {
        panic!("expected block");
    };
    let Stmt::Throw { expr, .. } = &body.stmts[statements[0]] else {
        panic!("expected throw");
    };
    assert_eq!(render(&body, *expr), "new IllegalStateException");
}

#[test]
fn loops_and_locals_are_kept() {
    let body = body("{ int n = 0; for (;;) { } while (n < 3) n++; }");
    let kinds: Vec<_> = body
        .statements()
        .iter()
        .map(|&stmt| match &body.stmts[stmt] {
            Stmt::Let { name, .. } => format!("let {name}"),
            Stmt::Opaque { keyword, .. } => keyword.clone(),
            Stmt::While { .. } => "while".to_string(),
            other => format!("{other:?}"),
        })
        .collect();
    assert_eq!(kinds, vec!["let n", "for", "while"]);
}

#[test]
fn compilation_units_lower_methods_with_owners() {
    let text = r#"
        class Outer {
            Outer() {}
            static { init(); }

            @Contract("null -> false")
            boolean isSet(Object value) { return value != null; }

            static class Inner {
                void run() {}
            }
        }
    "#;
    let parse = parse(text);
    assert!(parse.errors().is_empty(), "{:?}", parse.errors());
    let methods = lower_compilation_unit(parse.compilation_unit());

    let names: Vec<_> = methods.iter().map(|m| m.signature()).collect();
    assert_eq!(names, vec!["Outer.isSet(Object)", "Outer.Inner.run()"]);

    let is_set = &methods[0];
    assert_eq!(is_set.param_index("value"), Some(0));
    assert_eq!(is_set.annotations[0].name, "Contract");
    assert_eq!(is_set.annotations[0].value.as_deref(), Some("null -> false"));
    assert!(methods[1].body.as_ref().unwrap().statements().is_empty());
}

#[test]
fn lowered_methods_round_trip_through_json() {
    let parse = parse("class A { Object f(Object o) { return o == null ? null : o; } }");
    let methods = lower_compilation_unit(parse.compilation_unit());
    let json = serde_json::to_string(&methods).unwrap();
    let back: Vec<contrail_hir::Method> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, methods);
}

#[test]
fn builder_matches_lowered_shape() {
    let mut b = contrail_hir::BodyBuilder::new();
    let a = b.name("a");
    let c = b.name("b");
    let and = b.binary(BinaryOp::And, a, c);
    let ret = b.ret(Some(and));
    let built = b.block_body(vec![ret]);
    built.validate().unwrap();

    let lowered = body("{ return a && b; }");
    let built_expr = return_expr(&built, built.statements()[0]);
    let lowered_expr = return_expr(&lowered, lowered.statements()[0]);
    assert_eq!(render(&built, built_expr), render(&lowered, lowered_expr));
}

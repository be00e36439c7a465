use contrail_flow::{format_contracts, infer_contracts, parse_contracts, ValueConstraint};
use contrail_hir::{BinaryOp, BodyBuilder, ExprId, Method, StmtId};
use proptest::prelude::*;

const PARAMS: [&str; 3] = ["a", "b", "c"];

#[derive(Debug, Clone)]
enum Shape {
    Param(usize),
    Local,
    Null,
    Bool(bool),
    Compare {
        param: usize,
        literal: u8,
        equal: bool,
        literal_first: bool,
    },
    And(Vec<Shape>),
    Or(Vec<Shape>),
    Not(Box<Shape>),
    Paren(Box<Shape>),
    Conditional(Box<Shape>, Box<Shape>, Box<Shape>),
    InstanceOf(usize),
}

#[derive(Debug, Clone)]
enum StmtShape {
    Return(Shape),
    Throw,
    Guard(Shape),
    Assert(Shape),
    Opaque,
}

fn arb_shape() -> impl Strategy<Value = Shape> {
    let leaf = prop_oneof![
        (0..PARAMS.len()).prop_map(Shape::Param),
        Just(Shape::Local),
        Just(Shape::Null),
        any::<bool>().prop_map(Shape::Bool),
        (0..PARAMS.len(), 0u8..3, any::<bool>(), any::<bool>()).prop_map(
            |(param, literal, equal, literal_first)| Shape::Compare {
                param,
                literal,
                equal,
                literal_first,
            }
        ),
        (0..PARAMS.len()).prop_map(Shape::InstanceOf),
    ];

    leaf.prop_recursive(4, 24, 3, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 2..4).prop_map(Shape::And),
            prop::collection::vec(inner.clone(), 2..4).prop_map(Shape::Or),
            inner.clone().prop_map(|s| Shape::Not(Box::new(s))),
            inner.clone().prop_map(|s| Shape::Paren(Box::new(s))),
            (inner.clone(), inner.clone(), inner).prop_map(|(c, t, e)| {
                Shape::Conditional(Box::new(c), Box::new(t), Box::new(e))
            }),
        ]
    })
}

fn arb_stmt() -> impl Strategy<Value = StmtShape> {
    prop_oneof![
        3 => arb_shape().prop_map(StmtShape::Return),
        1 => Just(StmtShape::Throw),
        3 => arb_shape().prop_map(StmtShape::Guard),
        1 => arb_shape().prop_map(StmtShape::Assert),
        1 => Just(StmtShape::Opaque),
    ]
}

fn build_expr(b: &mut BodyBuilder, shape: &Shape) -> ExprId {
    match shape {
        Shape::Param(idx) => b.name(PARAMS[*idx]),
        Shape::Local => b.name("local"),
        Shape::Null => b.null(),
        Shape::Bool(value) => b.bool(*value),
        Shape::Compare {
            param,
            literal,
            equal,
            literal_first,
        } => {
            let p = b.name(PARAMS[*param]);
            let lit = match literal {
                0 => b.null(),
                1 => b.bool(true),
                _ => b.bool(false),
            };
            let op = if *equal { BinaryOp::Eq } else { BinaryOp::NotEq };
            if *literal_first {
                b.binary(op, lit, p)
            } else {
                b.binary(op, p, lit)
            }
        }
        Shape::And(operands) | Shape::Or(operands) => {
            let ids = operands.iter().map(|s| build_expr(b, s)).collect();
            let op = if matches!(shape, Shape::And(_)) {
                BinaryOp::And
            } else {
                BinaryOp::Or
            };
            b.polyadic(op, ids)
        }
        Shape::Not(inner) => {
            let inner = build_expr(b, inner);
            b.not(inner)
        }
        Shape::Paren(inner) => {
            let inner = build_expr(b, inner);
            b.paren(inner)
        }
        Shape::Conditional(c, t, e) => {
            let c = build_expr(b, c);
            let t = build_expr(b, t);
            let e = build_expr(b, e);
            b.conditional(c, t, e)
        }
        Shape::InstanceOf(idx) => {
            let p = b.name(PARAMS[*idx]);
            b.instance_of(p, "String")
        }
    }
}

fn build_stmt(b: &mut BodyBuilder, shape: &StmtShape) -> StmtId {
    match shape {
        StmtShape::Return(expr) => {
            let expr = build_expr(b, expr);
            b.ret(Some(expr))
        }
        StmtShape::Throw => b.throw_new("IllegalStateException"),
        StmtShape::Guard(cond) => {
            let cond = build_expr(b, cond);
            let throw = b.throw_new("IllegalArgumentException");
            b.if_(cond, throw, None)
        }
        StmtShape::Assert(cond) => {
            let cond = build_expr(b, cond);
            b.assert(cond)
        }
        StmtShape::Opaque => b.opaque("for"),
    }
}

fn build_method(stmts: &[StmtShape]) -> Method {
    let mut b = BodyBuilder::new();
    let ids = stmts.iter().map(|s| build_stmt(&mut b, s)).collect();
    Method::new("generated", PARAMS).with_body(b.block_body(ids))
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    #[test]
    fn contracts_are_well_formed(stmts in prop::collection::vec(arb_stmt(), 1..4)) {
        let method = build_method(&stmts);
        let contracts = infer_contracts(&method);
        for contract in &contracts {
            prop_assert_eq!(contract.arguments.len(), PARAMS.len());
            prop_assert!(contract
                .arguments
                .as_slice()
                .iter()
                .all(|c| *c != ValueConstraint::Throw));
        }
    }

    #[test]
    fn inference_is_deterministic(stmts in prop::collection::vec(arb_stmt(), 1..4)) {
        let method = build_method(&stmts);
        prop_assert_eq!(infer_contracts(&method), infer_contracts(&method));
    }

    #[test]
    fn inferred_contracts_survive_the_text_form(stmts in prop::collection::vec(arb_stmt(), 1..4)) {
        let contracts = infer_contracts(&build_method(&stmts));
        let text = format_contracts(&contracts);
        prop_assert_eq!(parse_contracts(&text).unwrap(), contracts);
    }

    #[test]
    fn negation_is_an_involution(c in prop::sample::select(ValueConstraint::ALL.to_vec())) {
        prop_assert_eq!(c.negate().negate(), c);
    }
}

use contrail_flow::{
    infer_contracts, infer_contracts_with, InferenceConfig, ValueConstraint, DEFAULT_MAX_STATES,
};
use contrail_hir::{BinaryOp, BodyBuilder, ExprId, Method};

fn is_null(b: &mut BodyBuilder, param: &str) -> ExprId {
    let p = b.name(param);
    let null = b.null();
    b.binary(BinaryOp::Eq, p, null)
}

/// `return (((p0 == null) ? p1 == null : p1 == null) ? p2 == null : ...)`
/// nested `depth` times. The TRUE states of each level double, so level `k`
/// evaluates its branches under `2^(k-1)` states.
fn nested_conditionals(depth: usize) -> Method {
    let names: Vec<String> = (0..=depth).map(|i| format!("p{i}")).collect();
    let mut b = BodyBuilder::new();
    let mut cond = is_null(&mut b, &names[0]);
    for name in &names[1..] {
        let then_expr = is_null(&mut b, name);
        let else_expr = is_null(&mut b, name);
        cond = b.conditional(cond, then_expr, else_expr);
    }
    let ret = b.ret(Some(cond));
    Method::new("deep", names.iter().map(String::as_str)).with_body(b.block_body(vec![ret]))
}

#[test]
fn default_fuse_allows_exactly_three_hundred_states() {
    assert_eq!(DEFAULT_MAX_STATES, 300);

    // Branches of the outermost conditional run under 256 states.
    let contracts = infer_contracts(&nested_conditionals(9));
    assert_eq!(contracts.len(), 1024);
    assert!(contracts.iter().all(|c| c.arguments.len() == 10));

    // One more level needs 512 states and yields nothing.
    assert!(infer_contracts(&nested_conditionals(10)).is_empty());
}

#[test]
fn fuse_only_cuts_the_expensive_subtree() {
    // `return x == null || <nested>` with a fuse of one state: the nested
    // conditional's branches need two states and yield nothing, while the
    // first operand of `||` still produces its contract.
    let mut b = BodyBuilder::new();
    let x_null = is_null(&mut b, "x");
    let a_null = is_null(&mut b, "a");
    let mut cond = a_null;
    for name in ["b", "c"] {
        let then_expr = is_null(&mut b, name);
        let else_expr = is_null(&mut b, name);
        cond = b.conditional(cond, then_expr, else_expr);
    }
    let or = b.binary(BinaryOp::Or, x_null, cond);
    let ret = b.ret(Some(or));
    let method = Method::new("f", ["x", "a", "b", "c"]).with_body(b.block_body(vec![ret]));

    let tight = InferenceConfig { max_states: 1 };
    let contracts = infer_contracts_with(&method, &tight);
    assert_eq!(contracts.len(), 1);
    assert_eq!(contracts[0].to_string(), "null, _, _, _ -> true");

    let roomy = InferenceConfig { max_states: 2 };
    let contracts = infer_contracts_with(&method, &roomy);
    // Four TRUE results finish the `||`, four FALSE ones fall through.
    assert_eq!(contracts.len(), 1 + 4 + 4);
    assert!(contracts[1..]
        .iter()
        .all(|c| c.arguments[0] == ValueConstraint::NotNull));
}

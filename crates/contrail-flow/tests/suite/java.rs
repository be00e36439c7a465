use contrail_flow::{
    check_declared_contract, format_contracts, infer_contracts, method_contracts,
    ContractConfig, ContractSource,
};
use contrail_hir::{lower_compilation_unit, lower_method, Method};
use contrail_syntax::{parse, parse_method};
use pretty_assertions::assert_eq;

fn method(text: &str) -> Method {
    let parse = parse_method(text);
    assert!(parse.errors.is_empty(), "{:?}", parse.errors);
    lower_method(&parse.method.expect("method"), None)
}

fn contracts(text: &str) -> String {
    format_contracts(&infer_contracts(&method(text)))
}

#[test]
fn null_guard_then_return() {
    assert_eq!(
        contracts(
            "Object requireNonNull(Object x) {
                if (x == null) throw new NullPointerException();
                return x;
            }"
        ),
        "null -> fail; !null -> !null"
    );
}

#[test]
fn conjunction_of_two_flags() {
    assert_eq!(
        contracts("boolean both(boolean a, boolean b) { return a && b; }"),
        "false, _ -> false; true, false -> false; true, true -> true"
    );
}

#[test]
fn if_else_returning_null_or_parameter() {
    assert_eq!(
        contracts(
            "Object id(Object p) {
                if (p == null) return null; else return p;
            }"
        ),
        "null -> null; !null -> !null"
    );
}

#[test]
fn braces_around_single_statements_are_transparent() {
    assert_eq!(
        contracts(
            "Object id(Object p) {
                if (p == null) { return null; } else { return p; }
            }"
        ),
        "null -> null; !null -> !null"
    );
}

#[test]
fn loops_first_yield_nothing() {
    assert_eq!(contracts("void spin(Object a) { while (a != null) { } }"), "");
    assert_eq!(contracts("void each(Object a) { for (;;) { return; } }"), "");
}

#[test]
fn guard_chain_continues_through_terminating_ifs() {
    assert_eq!(
        contracts(
            "String pick(String a, String b) {
                if (a == null) throw new IllegalArgumentException(\"a\");
                if (b == null) {
                    log(\"b\");
                    return a;
                }
                return b;
            }"
        ),
        "null, _ -> fail; !null, !null -> !null"
    );
}

#[test]
fn multi_statement_then_branch_contributes_nothing() {
    // The then-branch is a block of two statements, which is not analysed,
    // but it always returns so the FALSE states still reach `return b;`.
    assert_eq!(
        contracts(
            "Object f(Object b) {
                if (b == null) { log(); return null; }
                return b;
            }"
        ),
        "!null -> !null"
    );
}

#[test]
fn non_terminating_then_branch_stops_analysis() {
    assert_eq!(
        contracts(
            "Object f(Object b) {
                if (b == null) log();
                return b;
            }"
        ),
        ""
    );
}

#[test]
fn assert_statement_first() {
    assert_eq!(
        contracts("void check(Object o) { assert o != null : \"o\"; }"),
        "null -> fail"
    );
}

#[test]
fn ternary_and_negation() {
    assert_eq!(
        contracts("boolean isEmpty(String s) { return !(s != null) ? true : false; }"),
        "null -> true; !null -> false"
    );
}

#[test]
fn qualified_and_this_references_do_not_resolve() {
    assert_eq!(
        contracts("boolean f(Object x) { return this.x == null; }"),
        ""
    );
    assert_eq!(contracts("boolean f(Object x) { return y == null; }"), "");
}

#[test]
fn instanceof_with_and_chain() {
    assert_eq!(
        contracts("boolean isText(Object o, boolean strict) { return o instanceof String && strict; }"),
        "null, _ -> false"
    );
}

#[test]
fn casts_and_lambdas_contribute_nothing() {
    assert_eq!(
        contracts(
            "boolean equals(Object o) {
                if (o == null) return false;
                Point other = (Point) o;
                return x == other.x;
            }"
        ),
        "null -> false"
    );
    assert_eq!(contracts("Object cast(Object o) { return (String) o; }"), "");
    assert_eq!(
        contracts("Object task(Object o) { return () -> o; }"),
        ""
    );
}

#[test]
fn abstract_methods_have_no_contracts() {
    let parse = parse("interface I { Object get(Object key); }");
    let methods = lower_compilation_unit(parse.compilation_unit());
    assert_eq!(methods.len(), 1);
    assert!(infer_contracts(&methods[0]).is_empty());
}

#[test]
fn declared_contract_from_source() {
    let parse = parse(
        r#"
        import org.jetbrains.annotations.Contract;

        final class Strings {
            @Contract("null -> true")
            static boolean isEmpty(String s) {
                return s == null || s.length() == 0;
            }

            @Contract(value = "_, _ -> true", pure = true)
            static boolean wrong(String s) {
                return true;
            }
        }
        "#,
    );
    assert!(parse.errors().is_empty(), "{:?}", parse.errors());
    let methods = lower_compilation_unit(parse.compilation_unit());

    let (source, declared) = method_contracts(&methods[0], &ContractConfig::default());
    assert_eq!(source, ContractSource::Declared);
    assert_eq!(format_contracts(&declared), "null -> true");
    assert_eq!(
        format_contracts(&infer_contracts(&methods[0])),
        "null -> true"
    );

    let diags = check_declared_contract(&methods[1]);
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, "CONTRACT_ARITY");
    assert!(diags[0].span.is_some());
}

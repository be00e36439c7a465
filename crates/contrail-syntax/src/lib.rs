//! Java front end for Contrail.
//!
//! A small recursive-descent parser that understands enough Java to find
//! method declarations, their annotations and parameters, and the statement
//! and expression forms contract inference looks at. It is error tolerant:
//! every entry point returns a tree plus a list of [`ParseError`]s.

pub mod ast;
mod lexer;
mod parser;

use contrail_types::Span;
use serde::Serialize;

use crate::parser::Parser;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parse {
    compilation_unit: ast::CompilationUnit,
    errors: Vec<ParseError>,
}

impl Parse {
    #[must_use]
    pub fn compilation_unit(&self) -> &ast::CompilationUnit {
        &self.compilation_unit
    }

    #[must_use]
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn into_parts(self) -> (ast::CompilationUnit, Vec<ParseError>) {
        (self.compilation_unit, self.errors)
    }
}

/// Parse a whole compilation unit.
#[must_use]
pub fn parse(text: &str) -> Parse {
    let mut parser = Parser::new(text, 0);
    let compilation_unit = parser.parse_compilation_unit();
    let errors = parser.finish();
    tracing::trace!(
        target: "contrail.syntax",
        types = compilation_unit.types.len(),
        errors = errors.len(),
        "parsed compilation unit"
    );
    Parse {
        compilation_unit,
        errors,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodParse {
    pub method: Option<ast::MethodDecl>,
    pub errors: Vec<ParseError>,
}

/// Parse a single method declaration, without an enclosing class.
///
/// Anything after the first member is reported as an error.
#[must_use]
pub fn parse_method(text: &str) -> MethodParse {
    let mut parser = Parser::new(text, 0);
    let member = parser.parse_member_decl("");
    let trailing = !parser.is_eof();
    let mut errors = parser.finish();

    let method = match member {
        Some(ast::MemberDecl::Method(method)) => Some(method),
        other => {
            let range = other.map_or(Span::new(0, text.len()), |member| member_range(&member));
            errors.push(ParseError {
                message: "expected method declaration".to_string(),
                range,
            });
            None
        }
    };
    if trailing && method.is_some() {
        let start = method.as_ref().map_or(0, |m| m.range.end);
        errors.push(ParseError {
            message: "unexpected input after method declaration".to_string(),
            range: Span::new(start, text.len()),
        });
    }

    MethodParse { method, errors }
}

fn member_range(member: &ast::MemberDecl) -> Span {
    match member {
        ast::MemberDecl::Field(decl) => decl.range,
        ast::MemberDecl::Method(decl) => decl.range,
        ast::MemberDecl::Constructor(decl) => decl.range,
        ast::MemberDecl::Initializer(decl) => decl.range,
        ast::MemberDecl::Type(decl) => decl.range,
    }
}

/// Parse a Java block statement (`{ ... }`).
///
/// `offset` specifies the byte offset of `text` within the original file so
/// returned spans are file-relative.
pub fn parse_block(text: &str, offset: usize) -> (ast::Block, Vec<ParseError>) {
    let mut parser = Parser::new(text, offset);
    let block = parser.parse_block();
    (block, parser.finish())
}

/// Parse a single Java expression.
pub fn parse_expression(text: &str, offset: usize) -> (ast::Expr, Vec<ParseError>) {
    let mut parser = Parser::new(text, offset);
    let expr = parser.parse_expr();
    (expr, parser.finish())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ast::{BinaryOp, Expr, MemberDecl, Stmt};

    fn methods(text: &str) -> Vec<ast::MethodDecl> {
        let parse = parse(text);
        assert!(parse.errors().is_empty(), "{:?}", parse.errors());
        parse.compilation_unit().types[0]
            .members
            .iter()
            .filter_map(|member| match member {
                MemberDecl::Method(method) => Some(method.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn parses_class_with_annotated_method() {
        let text = r#"
            package p;
            import org.jetbrains.annotations.Contract;

            public class Util {
                private int count;

                @Contract("null -> fail")
                public static String check(String s) {
                    if (s == null) throw new IllegalArgumentException();
                    return s;
                }
            }
        "#;
        let methods = methods(text);
        assert_eq!(methods.len(), 1);
        let method = &methods[0];
        assert_eq!(method.name, "check");
        assert_eq!(method.params[0].name, "s");
        assert_eq!(method.params[0].ty.text, "String");
        assert_eq!(method.annotations[0].name, "Contract");
        assert_eq!(method.annotations[0].string_value("value"), Some("null -> fail"));
        let body = method.body.as_ref().unwrap();
        assert_eq!(body.statements.len(), 2);
        assert!(matches!(body.statements[0], Stmt::If(_)));
        assert!(matches!(body.statements[1], Stmt::Return(_)));
    }

    #[test]
    fn named_annotation_arguments() {
        let text = r#"class A {
            @org.jetbrains.annotations.Contract(value = "_ -> !null", pure = true)
            Object id(Object o) { return o; }
        }"#;
        let method = &methods(text)[0];
        let annotation = &method.annotations[0];
        assert_eq!(annotation.name, "org.jetbrains.annotations.Contract");
        assert_eq!(annotation.string_value("value"), Some("_ -> !null"));
        assert_eq!(annotation.args[1].name.as_deref(), Some("pure"));
        assert_eq!(
            annotation.args[1].value,
            ast::AnnotationValue::Other("true".to_string())
        );
    }

    #[test]
    fn abstract_methods_have_no_body() {
        let method = &methods("interface I { boolean test(Object o); }")[0];
        assert!(method.body.is_none());
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let (expr, errors) = parse_expression("a || b && c", 0);
        assert!(errors.is_empty());
        let Expr::Binary(or) = expr else {
            panic!("expected binary expression");
        };
        assert_eq!(or.op, BinaryOp::OrOr);
        let Expr::Binary(and) = *or.rhs else {
            panic!("expected nested binary expression");
        };
        assert_eq!(and.op, BinaryOp::AndAnd);
    }

    #[test]
    fn parenthesized_expressions_keep_their_node() {
        let (expr, errors) = parse_expression("(a == null)", 0);
        assert!(errors.is_empty());
        let Expr::Paren(paren) = expr else {
            panic!("expected paren expression");
        };
        assert!(matches!(*paren.expr, Expr::Binary(_)));
    }

    #[test]
    fn instanceof_with_pattern_binding() {
        let (expr, errors) = parse_expression("o instanceof String s && s.isEmpty()", 0);
        assert!(errors.is_empty());
        let Expr::Binary(and) = expr else {
            panic!("expected binary expression");
        };
        let Expr::InstanceOf(instance_of) = *and.lhs else {
            panic!("expected instanceof");
        };
        assert_eq!(instance_of.ty.text, "String");
    }

    #[test]
    fn conditional_and_negation() {
        let (expr, errors) = parse_expression("!a ? null : b", 0);
        assert!(errors.is_empty());
        let Expr::Conditional(cond) = expr else {
            panic!("expected conditional");
        };
        assert!(matches!(*cond.condition, Expr::Unary(_)));
        assert!(matches!(*cond.then_expr, Expr::NullLiteral(_)));
    }

    #[test]
    fn assert_and_opaque_statements() {
        let (block, errors) = parse_block(
            "{ assert x != null : \"x\"; for (int i = 0; i < n; i++) { f(i); } try { g(); } catch (Exception e) { } }",
            0,
        );
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(block.statements.len(), 3);
        let Stmt::Assert(assert_stmt) = &block.statements[0] else {
            panic!("expected assert");
        };
        assert!(assert_stmt.message.is_some());
        let keywords: Vec<_> = block.statements[1..]
            .iter()
            .map(|stmt| match stmt {
                Stmt::Opaque(opaque) => opaque.keyword.as_str(),
                _ => "",
            })
            .collect();
        assert_eq!(keywords, vec!["for", "try"]);
    }

    #[test]
    fn local_variables_and_generic_types() {
        let (block, errors) = parse_block("{ Map<String, List<Integer>> m = null; x = 1; }", 0);
        assert!(errors.is_empty());
        let Stmt::LocalVar(local) = &block.statements[0] else {
            panic!("expected local variable");
        };
        assert_eq!(local.ty.text, "Map<String, List<Integer>>");
        assert!(matches!(block.statements[1], Stmt::Expr(_)));
    }

    #[test]
    fn parse_method_without_class() {
        let parse = parse_method("boolean f(Object a, int... rest) { return a == null; }");
        assert!(parse.errors.is_empty());
        let method = parse.method.unwrap();
        assert_eq!(method.params.len(), 2);
        assert_eq!(method.params[1].ty.text, "int...");
    }

    #[test]
    fn parse_method_reports_non_methods() {
        let parse = parse_method("int x;");
        assert!(parse.method.is_none());
        assert_eq!(parse.errors.len(), 1);
    }

    #[test]
    fn recovers_from_missing_semicolon() {
        let (block, errors) = parse_block("{ return a }", 0);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "expected `;`");
        assert!(matches!(block.statements[0], Stmt::Return(_)));
    }

    #[test]
    fn spans_respect_offset() {
        let (expr, _) = parse_expression("a == b", 100);
        assert_eq!(expr.range(), Span::new(100, 106));
    }

    #[test]
    fn casts_bind_to_their_unary_operand() {
        let (expr, errors) = parse_expression("(String) o == null", 0);
        assert!(errors.is_empty(), "{errors:?}");
        let Expr::Binary(eq) = expr else {
            panic!("expected binary expression");
        };
        let Expr::Cast(cast) = *eq.lhs else {
            panic!("expected cast");
        };
        assert_eq!(cast.ty.text, "String");
        assert!(matches!(*cast.expr, Expr::Name(_)));

        let (expr, errors) = parse_expression("(int) -x", 0);
        assert!(errors.is_empty(), "{errors:?}");
        assert!(matches!(expr, Expr::Cast(_)));

        let (expr, errors) = parse_expression("(List<String>) (Object) o", 0);
        assert!(errors.is_empty(), "{errors:?}");
        let Expr::Cast(cast) = expr else {
            panic!("expected cast");
        };
        assert_eq!(cast.ty.text, "List<String>");
        assert!(matches!(*cast.expr, Expr::Cast(_)));
    }

    #[test]
    fn parenthesized_names_before_operators_are_not_casts() {
        let (expr, errors) = parse_expression("(a) - b", 0);
        assert!(errors.is_empty(), "{errors:?}");
        let Expr::Binary(sub) = expr else {
            panic!("expected binary expression");
        };
        assert_eq!(sub.op, BinaryOp::Sub);
        assert!(matches!(*sub.lhs, Expr::Paren(_)));

        let (expr, errors) = parse_expression("(o) instanceof String", 0);
        assert!(errors.is_empty(), "{errors:?}");
        assert!(matches!(expr, Expr::InstanceOf(_)));
    }

    #[test]
    fn lambdas_and_method_references_are_opaque() {
        let (expr, errors) = parse_expression("x -> x + 1", 0);
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(expr, Expr::Lambda(Span::new(0, 10)));

        let (expr, errors) = parse_expression("(a, b) -> { return a; }", 0);
        assert!(errors.is_empty(), "{errors:?}");
        assert!(matches!(expr, Expr::Lambda(_)));

        let (expr, errors) = parse_expression("(Runnable) () -> {}", 0);
        assert!(errors.is_empty(), "{errors:?}");
        let Expr::Cast(cast) = expr else {
            panic!("expected cast");
        };
        assert!(matches!(*cast.expr, Expr::Lambda(_)));

        let (expr, errors) = parse_expression("list.map(String::valueOf)", 0);
        assert!(errors.is_empty(), "{errors:?}");
        let Expr::Call(call) = expr else {
            panic!("expected call");
        };
        let Expr::MethodRef(method_ref) = &call.args[0] else {
            panic!("expected method reference");
        };
        assert_eq!(method_ref.name, "valueOf");
    }

    #[test]
    fn modern_expressions_keep_later_members() {
        let text = r#"
            class Eq {
                private final String name;

                @Override
                public boolean equals(Object o) {
                    if (o == null) return false;
                    Eq other = (Eq) o;
                    Runnable r = () -> {};
                    String json = """
                        {"name": "eq"}
                        """;
                    return name.equals(other.name);
                }

                @Contract("null -> fail")
                Object req(Object o) {
                    if (o == null) throw new NullPointerException();
                    return o;
                }
            }
        "#;
        let methods = methods(text);
        let names: Vec<_> = methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["equals", "req"]);
        let body = methods[0].body.as_ref().unwrap();
        assert_eq!(body.statements.len(), 5);
        assert_eq!(
            methods[1].annotations[0].string_value("value"),
            Some("null -> fail")
        );
    }
}

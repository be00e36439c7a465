use contrail_syntax::ast as syntax;
use contrail_types::Span;

use crate::hir::{
    Annotation, Arena, BinaryOp, Body, Expr, ExprId, LiteralKind, Method, Param, Stmt, StmtId,
    UnaryOp,
};

/// Lowers every method of every type in `unit`, nested types included.
///
/// Constructors and initializers are skipped. Owners are dotted type names
/// (`Outer.Inner`).
#[must_use]
pub fn lower_compilation_unit(unit: &syntax::CompilationUnit) -> Vec<Method> {
    let mut methods = Vec::new();
    for decl in &unit.types {
        lower_type_decl(decl, None, &mut methods);
    }
    methods
}

fn lower_type_decl(decl: &syntax::TypeDecl, outer: Option<&str>, out: &mut Vec<Method>) {
    let owner = match outer {
        Some(outer) => format!("{outer}.{}", decl.name),
        None => decl.name.clone(),
    };
    for member in &decl.members {
        match member {
            syntax::MemberDecl::Method(method) => out.push(lower_method(method, Some(&owner))),
            syntax::MemberDecl::Type(nested) => lower_type_decl(nested, Some(&owner), out),
            syntax::MemberDecl::Field(_)
            | syntax::MemberDecl::Constructor(_)
            | syntax::MemberDecl::Initializer(_) => {}
        }
    }
}

#[must_use]
pub fn lower_method(method: &syntax::MethodDecl, owner: Option<&str>) -> Method {
    Method {
        name: method.name.clone(),
        owner: owner.map(str::to_string),
        params: method.params.iter().map(lower_param).collect(),
        annotations: method.annotations.iter().map(lower_annotation).collect(),
        body: method.body.as_ref().map(lower_body),
        range: method.range,
    }
}

fn lower_param(param: &syntax::ParamDecl) -> Param {
    Param {
        name: param.name.clone(),
        ty: param.ty.text.clone(),
    }
}

fn lower_annotation(annotation: &syntax::Annotation) -> Annotation {
    Annotation {
        name: annotation.name.clone(),
        value: annotation.string_value("value").map(str::to_string),
        range: annotation.range,
    }
}

#[must_use]
pub fn lower_body(block: &syntax::Block) -> Body {
    let mut ctx = BodyLower::default();
    let root = ctx.lower_block(block);
    Body {
        root,
        stmts: ctx.stmts,
        exprs: ctx.exprs,
    }
}

#[derive(Default)]
struct BodyLower {
    stmts: Arena<Stmt>,
    exprs: Arena<Expr>,
}

impl BodyLower {
    fn alloc_stmt(&mut self, stmt: Stmt) -> StmtId {
        StmtId::from_raw(self.stmts.alloc(stmt))
    }

    fn alloc_expr(&mut self, expr: Expr) -> ExprId {
        ExprId::from_raw(self.exprs.alloc(expr))
    }

    fn lower_block(&mut self, block: &syntax::Block) -> StmtId {
        let statements = block
            .statements
            .iter()
            .map(|stmt| self.lower_stmt(stmt))
            .collect();
        self.alloc_stmt(Stmt::Block {
            statements,
            range: block.range,
        })
    }

    fn lower_stmt(&mut self, stmt: &syntax::Stmt) -> StmtId {
        match stmt {
            syntax::Stmt::LocalVar(local) => {
                let initializer = local.initializer.as_ref().map(|expr| self.lower_expr(expr));
                self.alloc_stmt(Stmt::Let {
                    name: local.name.clone(),
                    initializer,
                    range: local.range,
                })
            }
            syntax::Stmt::Expr(expr_stmt) => {
                let expr = self.lower_expr(&expr_stmt.expr);
                self.alloc_stmt(Stmt::Expr {
                    expr,
                    range: expr_stmt.range,
                })
            }
            syntax::Stmt::Return(ret) => {
                let expr = ret.expr.as_ref().map(|expr| self.lower_expr(expr));
                self.alloc_stmt(Stmt::Return {
                    expr,
                    range: ret.range,
                })
            }
            syntax::Stmt::Throw(throw) => {
                let expr = self.lower_expr(&throw.expr);
                self.alloc_stmt(Stmt::Throw {
                    expr,
                    range: throw.range,
                })
            }
            syntax::Stmt::If(if_stmt) => {
                let condition = self.lower_expr(&if_stmt.condition);
                let then_branch = self.lower_stmt(&if_stmt.then_branch);
                let else_branch = if_stmt
                    .else_branch
                    .as_ref()
                    .map(|stmt| self.lower_stmt(stmt));
                self.alloc_stmt(Stmt::If {
                    condition,
                    then_branch,
                    else_branch,
                    range: if_stmt.range,
                })
            }
            syntax::Stmt::Assert(assert) => {
                let condition = self.lower_expr(&assert.condition);
                let message = assert.message.as_ref().map(|expr| self.lower_expr(expr));
                self.alloc_stmt(Stmt::Assert {
                    condition,
                    message,
                    range: assert.range,
                })
            }
            syntax::Stmt::While(while_stmt) => {
                let condition = self.lower_expr(&while_stmt.condition);
                let body = self.lower_stmt(&while_stmt.body);
                self.alloc_stmt(Stmt::While {
                    condition,
                    body,
                    range: while_stmt.range,
                })
            }
            syntax::Stmt::Opaque(opaque) => self.alloc_stmt(Stmt::Opaque {
                keyword: opaque.keyword.clone(),
                range: opaque.range,
            }),
            syntax::Stmt::Block(block) => self.lower_block(block),
            syntax::Stmt::Empty(range) => self.alloc_stmt(Stmt::Empty { range: *range }),
        }
    }

    fn lower_literal(&mut self, literal: LiteralKind, value: &str, range: Span) -> ExprId {
        self.alloc_expr(Expr::Literal {
            literal,
            value: value.to_string(),
            range,
        })
    }

    fn lower_expr(&mut self, expr: &syntax::Expr) -> ExprId {
        match expr {
            syntax::Expr::Name(name) => self.alloc_expr(Expr::Name {
                name: name.name.clone(),
                range: name.range,
            }),
            syntax::Expr::IntLiteral(lit) => {
                self.lower_literal(LiteralKind::Int, &lit.value, lit.range)
            }
            syntax::Expr::StringLiteral(lit) => {
                self.lower_literal(LiteralKind::String, &lit.value, lit.range)
            }
            syntax::Expr::CharLiteral(lit) => {
                self.lower_literal(LiteralKind::Char, &lit.value, lit.range)
            }
            syntax::Expr::BoolLiteral(lit) => {
                let (kind, text) = if lit.value {
                    (LiteralKind::True, "true")
                } else {
                    (LiteralKind::False, "false")
                };
                self.lower_literal(kind, text, lit.range)
            }
            syntax::Expr::NullLiteral(range) => {
                self.lower_literal(LiteralKind::Null, "null", *range)
            }
            syntax::Expr::This(range) => self.alloc_expr(Expr::This { range: *range }),
            syntax::Expr::Call(call) => {
                let callee = self.lower_expr(&call.callee);
                let args = call.args.iter().map(|arg| self.lower_expr(arg)).collect();
                self.alloc_expr(Expr::Call {
                    callee,
                    args,
                    range: call.range,
                })
            }
            syntax::Expr::FieldAccess(access) => {
                let receiver = self.lower_expr(&access.receiver);
                self.alloc_expr(Expr::FieldAccess {
                    receiver,
                    name: access.name.clone(),
                    range: access.range,
                })
            }
            syntax::Expr::ArrayAccess(access) => {
                let array = self.lower_expr(&access.array);
                let index = self.lower_expr(&access.index);
                self.alloc_expr(Expr::ArrayAccess {
                    array,
                    index,
                    range: access.range,
                })
            }
            syntax::Expr::New(new) => {
                let args = new.args.iter().map(|arg| self.lower_expr(arg)).collect();
                self.alloc_expr(Expr::New {
                    class: new.ty.text.clone(),
                    args,
                    range: new.range,
                })
            }
            syntax::Expr::Unary(unary) => {
                let operand = self.lower_expr(&unary.operand);
                self.alloc_expr(Expr::Unary {
                    op: lower_unary_op(unary.op),
                    expr: operand,
                    range: unary.range,
                })
            }
            syntax::Expr::Binary(binary) => {
                let op = lower_binary_op(binary.op);
                let mut chain = Vec::new();
                collect_chain(binary, binary.op, &mut chain);
                let operands = chain.into_iter().map(|operand| self.lower_expr(operand)).collect();
                self.alloc_expr(Expr::Polyadic {
                    op,
                    operands,
                    range: binary.range,
                })
            }
            syntax::Expr::InstanceOf(instance_of) => {
                let operand = self.lower_expr(&instance_of.expr);
                self.alloc_expr(Expr::InstanceOf {
                    expr: operand,
                    ty: instance_of.ty.text.clone(),
                    range: instance_of.range,
                })
            }
            syntax::Expr::Conditional(cond) => {
                let condition = self.lower_expr(&cond.condition);
                let then_expr = self.lower_expr(&cond.then_expr);
                let else_expr = self.lower_expr(&cond.else_expr);
                self.alloc_expr(Expr::Conditional {
                    condition,
                    then_expr,
                    else_expr,
                    range: cond.range,
                })
            }
            syntax::Expr::Assign(assign) => {
                let target = self.lower_expr(&assign.target);
                let value = self.lower_expr(&assign.value);
                self.alloc_expr(Expr::Assign {
                    target,
                    value,
                    range: assign.range,
                })
            }
            syntax::Expr::Paren(paren) => {
                let inner = self.lower_expr(&paren.expr);
                self.alloc_expr(Expr::Paren {
                    expr: inner,
                    range: paren.range,
                })
            }
            syntax::Expr::Cast(cast) => {
                let inner = self.lower_expr(&cast.expr);
                self.alloc_expr(Expr::Cast {
                    ty: cast.ty.text.clone(),
                    expr: inner,
                    range: cast.range,
                })
            }
            syntax::Expr::Lambda(range) => self.alloc_expr(Expr::Lambda { range: *range }),
            syntax::Expr::MethodRef(method_ref) => {
                let receiver = self.lower_expr(&method_ref.receiver);
                self.alloc_expr(Expr::MethodRef {
                    receiver,
                    name: method_ref.name.clone(),
                    range: method_ref.range,
                })
            }
            syntax::Expr::Missing(range) => self.alloc_expr(Expr::Missing { range: *range }),
        }
    }
}

/// Operands of a left-nested chain of `op`. Parenthesized operands are kept
/// whole.
fn collect_chain<'a>(
    binary: &'a syntax::BinaryExpr,
    op: syntax::BinaryOp,
    out: &mut Vec<&'a syntax::Expr>,
) {
    match binary.lhs.as_ref() {
        syntax::Expr::Binary(lhs) if lhs.op == op => collect_chain(lhs, op, out),
        lhs => out.push(lhs),
    }
    out.push(&binary.rhs);
}

fn lower_unary_op(op: syntax::UnaryOp) -> UnaryOp {
    match op {
        syntax::UnaryOp::Not => UnaryOp::Not,
        syntax::UnaryOp::Neg => UnaryOp::Neg,
        syntax::UnaryOp::Plus => UnaryOp::Plus,
        syntax::UnaryOp::BitNot => UnaryOp::BitNot,
        syntax::UnaryOp::PreInc => UnaryOp::PreInc,
        syntax::UnaryOp::PreDec => UnaryOp::PreDec,
        syntax::UnaryOp::PostInc => UnaryOp::PostInc,
        syntax::UnaryOp::PostDec => UnaryOp::PostDec,
    }
}

fn lower_binary_op(op: syntax::BinaryOp) -> BinaryOp {
    match op {
        syntax::BinaryOp::Add => BinaryOp::Add,
        syntax::BinaryOp::Sub => BinaryOp::Sub,
        syntax::BinaryOp::Mul => BinaryOp::Mul,
        syntax::BinaryOp::Div => BinaryOp::Div,
        syntax::BinaryOp::Rem => BinaryOp::Rem,
        syntax::BinaryOp::EqEq => BinaryOp::Eq,
        syntax::BinaryOp::NotEq => BinaryOp::NotEq,
        syntax::BinaryOp::Lt => BinaryOp::Lt,
        syntax::BinaryOp::Gt => BinaryOp::Gt,
        syntax::BinaryOp::LtEq => BinaryOp::LtEq,
        syntax::BinaryOp::GtEq => BinaryOp::GtEq,
        syntax::BinaryOp::BitAnd => BinaryOp::BitAnd,
        syntax::BinaryOp::BitOr => BinaryOp::BitOr,
        syntax::BinaryOp::BitXor => BinaryOp::BitXor,
        syntax::BinaryOp::AndAnd => BinaryOp::And,
        syntax::BinaryOp::OrOr => BinaryOp::Or,
    }
}

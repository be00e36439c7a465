use contrail_types::Span;

use crate::hir::{Arena, BinaryOp, Body, Expr, ExprId, LiteralKind, Stmt, StmtId, UnaryOp};

/// Builds a [`Body`] by hand, for front ends other than the Java parser and
/// for tests. Children must be built before their parents, so the result
/// always passes [`Body::validate`].
///
/// ```
/// use contrail_hir::{BinaryOp, BodyBuilder};
///
/// let mut b = BodyBuilder::new();
/// let x = b.name("x");
/// let null = b.null();
/// let cond = b.binary(BinaryOp::Eq, x, null);
/// let throw = b.throw_new("IllegalArgumentException");
/// let check = b.if_(cond, throw, None);
/// let x = b.name("x");
/// let ret = b.ret(Some(x));
/// let body = b.block_body(vec![check, ret]);
/// assert_eq!(body.statements().len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct BodyBuilder {
    stmts: Arena<Stmt>,
    exprs: Arena<Expr>,
}

impl BodyBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expr(&mut self, expr: Expr) -> ExprId {
        ExprId::from_raw(self.exprs.alloc(expr))
    }

    pub fn stmt(&mut self, stmt: Stmt) -> StmtId {
        StmtId::from_raw(self.stmts.alloc(stmt))
    }

    #[must_use]
    pub fn finish(self, root: StmtId) -> Body {
        Body {
            root,
            stmts: self.stmts,
            exprs: self.exprs,
        }
    }

    /// Wraps `statements` in a root block and finishes the body.
    #[must_use]
    pub fn block_body(mut self, statements: Vec<StmtId>) -> Body {
        let root = self.block(statements);
        self.finish(root)
    }

    // Expressions.

    pub fn name(&mut self, name: &str) -> ExprId {
        self.expr(Expr::Name {
            name: name.to_string(),
            range: Span::default(),
        })
    }

    fn literal(&mut self, literal: LiteralKind, value: &str) -> ExprId {
        self.expr(Expr::Literal {
            literal,
            value: value.to_string(),
            range: Span::default(),
        })
    }

    pub fn null(&mut self) -> ExprId {
        self.literal(LiteralKind::Null, "null")
    }

    pub fn bool(&mut self, value: bool) -> ExprId {
        if value {
            self.literal(LiteralKind::True, "true")
        } else {
            self.literal(LiteralKind::False, "false")
        }
    }

    pub fn int(&mut self, value: i64) -> ExprId {
        self.literal(LiteralKind::Int, &value.to_string())
    }

    pub fn binary(&mut self, op: BinaryOp, lhs: ExprId, rhs: ExprId) -> ExprId {
        self.polyadic(op, vec![lhs, rhs])
    }

    pub fn polyadic(&mut self, op: BinaryOp, operands: Vec<ExprId>) -> ExprId {
        self.expr(Expr::Polyadic {
            op,
            operands,
            range: Span::default(),
        })
    }

    pub fn not(&mut self, operand: ExprId) -> ExprId {
        self.expr(Expr::Unary {
            op: UnaryOp::Not,
            expr: operand,
            range: Span::default(),
        })
    }

    pub fn paren(&mut self, inner: ExprId) -> ExprId {
        self.expr(Expr::Paren {
            expr: inner,
            range: Span::default(),
        })
    }

    pub fn instance_of(&mut self, operand: ExprId, ty: &str) -> ExprId {
        self.expr(Expr::InstanceOf {
            expr: operand,
            ty: ty.to_string(),
            range: Span::default(),
        })
    }

    pub fn conditional(
        &mut self,
        condition: ExprId,
        then_expr: ExprId,
        else_expr: ExprId,
    ) -> ExprId {
        self.expr(Expr::Conditional {
            condition,
            then_expr,
            else_expr,
            range: Span::default(),
        })
    }

    /// `callee(args)` where `callee` is a simple name.
    pub fn call(&mut self, callee: &str, args: Vec<ExprId>) -> ExprId {
        let callee = self.name(callee);
        self.expr(Expr::Call {
            callee,
            args,
            range: Span::default(),
        })
    }

    // Statements.

    pub fn block(&mut self, statements: Vec<StmtId>) -> StmtId {
        self.stmt(Stmt::Block {
            statements,
            range: Span::default(),
        })
    }

    pub fn ret(&mut self, expr: Option<ExprId>) -> StmtId {
        self.stmt(Stmt::Return {
            expr,
            range: Span::default(),
        })
    }

    pub fn throw(&mut self, expr: ExprId) -> StmtId {
        self.stmt(Stmt::Throw {
            expr,
            range: Span::default(),
        })
    }

    /// `throw new <class>();`
    pub fn throw_new(&mut self, class: &str) -> StmtId {
        let new = self.expr(Expr::New {
            class: class.to_string(),
            args: Vec::new(),
            range: Span::default(),
        });
        self.throw(new)
    }

    pub fn if_(
        &mut self,
        condition: ExprId,
        then_branch: StmtId,
        else_branch: Option<StmtId>,
    ) -> StmtId {
        self.stmt(Stmt::If {
            condition,
            then_branch,
            else_branch,
            range: Span::default(),
        })
    }

    pub fn assert(&mut self, condition: ExprId) -> StmtId {
        self.stmt(Stmt::Assert {
            condition,
            message: None,
            range: Span::default(),
        })
    }

    pub fn expr_stmt(&mut self, expr: ExprId) -> StmtId {
        self.stmt(Stmt::Expr {
            expr,
            range: Span::default(),
        })
    }

    pub fn opaque(&mut self, keyword: &str) -> StmtId {
        self.stmt(Stmt::Opaque {
            keyword: keyword.to_string(),
            range: Span::default(),
        })
    }
}

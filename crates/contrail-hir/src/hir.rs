use std::fmt;

use contrail_types::Span;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExprId(u32);

impl ExprId {
    pub(crate) fn from_raw(raw: u32) -> Self {
        ExprId(raw)
    }

    #[must_use]
    pub fn idx(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExprId({})", self.0)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StmtId(u32);

impl StmtId {
    pub(crate) fn from_raw(raw: u32) -> Self {
        StmtId(raw)
    }

    #[must_use]
    pub fn idx(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for StmtId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StmtId({})", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Arena<T> {
    data: Vec<T>,
}

impl<T> Arena<T> {
    pub fn alloc(&mut self, value: T) -> u32 {
        let idx = self.data.len() as u32;
        self.data.push(value);
        idx
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> {
        self.data.iter().enumerate().map(|(i, v)| (i as u32, v))
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Arena { data: Vec::new() }
    }
}

impl<T> std::ops::Index<ExprId> for Arena<T> {
    type Output = T;

    fn index(&self, index: ExprId) -> &Self::Output {
        &self.data[index.idx()]
    }
}

impl<T> std::ops::Index<StmtId> for Arena<T> {
    type Output = T;

    fn index(&self, index: StmtId) -> &Self::Output {
        &self.data[index.idx()]
    }
}

/// A method as seen by contract inference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    /// Dotted name of the enclosing type, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub body: Option<Body>,
    #[serde(default)]
    pub range: Span,
}

impl Method {
    pub fn new<'a>(name: impl Into<String>, params: impl IntoIterator<Item = &'a str>) -> Self {
        Method {
            name: name.into(),
            owner: None,
            params: params
                .into_iter()
                .map(|name| Param {
                    name: name.to_string(),
                    ty: String::new(),
                })
                .collect(),
            annotations: Vec::new(),
            body: None,
            range: Span::default(),
        }
    }

    #[must_use]
    pub fn with_body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn with_annotation(mut self, name: impl Into<String>, value: Option<&str>) -> Self {
        self.annotations.push(Annotation {
            name: name.into(),
            value: value.map(str::to_string),
            range: Span::default(),
        });
        self
    }

    /// Index of the parameter declared with `name`.
    #[must_use]
    pub fn param_index(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|param| param.name == name)
    }

    /// `Owner.name(T1, T2)`, falling back to parameter names when types are
    /// unknown.
    #[must_use]
    pub fn signature(&self) -> String {
        let params: Vec<&str> = self
            .params
            .iter()
            .map(|param| {
                if param.ty.is_empty() {
                    param.name.as_str()
                } else {
                    param.ty.as_str()
                }
            })
            .collect();
        match &self.owner {
            Some(owner) => format!("{owner}.{}({})", self.name, params.join(", ")),
            None => format!("{}({})", self.name, params.join(", ")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(default)]
    pub ty: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// Name as written, possibly qualified.
    pub name: String,
    /// The `value` element when it is a string literal.
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub range: Span,
}

impl Annotation {
    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Body {
    pub root: StmtId,
    pub stmts: Arena<Stmt>,
    pub exprs: Arena<Expr>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BodyError {
    #[error("root statement {0:?} is out of range")]
    RootOutOfRange(StmtId),
    #[error("statement {parent} refers to statement {child:?} which is not allocated before it")]
    BadStmtRef { parent: usize, child: StmtId },
    #[error("statement {parent} refers to expression {child:?} which does not exist")]
    BadStmtExprRef { parent: usize, child: ExprId },
    #[error("expression {parent} refers to expression {child:?} which is not allocated before it")]
    BadExprRef { parent: usize, child: ExprId },
}

impl Body {
    #[must_use]
    pub fn empty(range: Span) -> Self {
        let mut stmts = Arena::default();
        let root = StmtId::from_raw(stmts.alloc(Stmt::Block {
            statements: Vec::new(),
            range,
        }));
        Body {
            root,
            stmts,
            exprs: Arena::default(),
        }
    }

    /// Top-level statements: the root block's children, or the root itself
    /// when it is not a block.
    #[must_use]
    pub fn statements(&self) -> &[StmtId] {
        match &self.stmts[self.root] {
            Stmt::Block { statements, .. } => statements,
            _ => std::slice::from_ref(&self.root),
        }
    }

    /// Checks that every id is in range and that children are allocated
    /// before their parents, which rules out cycles.
    ///
    /// Bodies built by lowering or [`crate::BodyBuilder`] always pass; this
    /// is for bodies deserialized from external input.
    pub fn validate(&self) -> Result<(), BodyError> {
        if self.root.idx() >= self.stmts.len() {
            return Err(BodyError::RootOutOfRange(self.root));
        }

        for (idx, stmt) in self.stmts.iter() {
            let parent = idx as usize;
            let mut child_stmts = Vec::new();
            let mut child_exprs = Vec::new();
            stmt.children(&mut child_stmts, &mut child_exprs);
            if let Some(&child) = child_stmts.iter().find(|child| child.idx() >= parent) {
                return Err(BodyError::BadStmtRef { parent, child });
            }
            if let Some(&child) = child_exprs
                .iter()
                .find(|child| child.idx() >= self.exprs.len())
            {
                return Err(BodyError::BadStmtExprRef { parent, child });
            }
        }

        for (idx, expr) in self.exprs.iter() {
            let parent = idx as usize;
            let mut children = Vec::new();
            expr.children(&mut children);
            if let Some(&child) = children.iter().find(|child| child.idx() >= parent) {
                return Err(BodyError::BadExprRef { parent, child });
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Stmt {
    Block {
        statements: Vec<StmtId>,
        #[serde(default)]
        range: Span,
    },
    If {
        condition: ExprId,
        then_branch: StmtId,
        #[serde(default)]
        else_branch: Option<StmtId>,
        #[serde(default)]
        range: Span,
    },
    Throw {
        expr: ExprId,
        #[serde(default)]
        range: Span,
    },
    Return {
        #[serde(default)]
        expr: Option<ExprId>,
        #[serde(default)]
        range: Span,
    },
    Assert {
        condition: ExprId,
        #[serde(default)]
        message: Option<ExprId>,
        #[serde(default)]
        range: Span,
    },
    While {
        condition: ExprId,
        body: StmtId,
        #[serde(default)]
        range: Span,
    },
    Let {
        name: String,
        #[serde(default)]
        initializer: Option<ExprId>,
        #[serde(default)]
        range: Span,
    },
    Expr {
        expr: ExprId,
        #[serde(default)]
        range: Span,
    },
    /// A statement kept only by keyword (`for`, `try`, `switch`, ...).
    Opaque {
        keyword: String,
        #[serde(default)]
        range: Span,
    },
    Empty {
        #[serde(default)]
        range: Span,
    },
}

impl Stmt {
    #[must_use]
    pub fn range(&self) -> Span {
        match self {
            Stmt::Block { range, .. }
            | Stmt::If { range, .. }
            | Stmt::Throw { range, .. }
            | Stmt::Return { range, .. }
            | Stmt::Assert { range, .. }
            | Stmt::While { range, .. }
            | Stmt::Let { range, .. }
            | Stmt::Expr { range, .. }
            | Stmt::Opaque { range, .. }
            | Stmt::Empty { range } => *range,
        }
    }

    fn children(&self, stmts: &mut Vec<StmtId>, exprs: &mut Vec<ExprId>) {
        match self {
            Stmt::Block { statements, .. } => stmts.extend(statements.iter().copied()),
            Stmt::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                exprs.push(*condition);
                stmts.push(*then_branch);
                stmts.extend(*else_branch);
            }
            Stmt::Throw { expr, .. } | Stmt::Expr { expr, .. } => exprs.push(*expr),
            Stmt::Return { expr, .. } => exprs.extend(*expr),
            Stmt::Assert {
                condition, message, ..
            } => {
                exprs.push(*condition);
                exprs.extend(*message);
            }
            Stmt::While {
                condition, body, ..
            } => {
                exprs.push(*condition);
                stmts.push(*body);
            }
            Stmt::Let { initializer, .. } => exprs.extend(*initializer),
            Stmt::Opaque { .. } | Stmt::Empty { .. } => {}
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiteralKind {
    Null,
    True,
    False,
    Int,
    String,
    Char,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expr {
    Name {
        name: String,
        #[serde(default)]
        range: Span,
    },
    Literal {
        literal: LiteralKind,
        #[serde(default)]
        value: String,
        #[serde(default)]
        range: Span,
    },
    This {
        #[serde(default)]
        range: Span,
    },
    FieldAccess {
        receiver: ExprId,
        name: String,
        #[serde(default)]
        range: Span,
    },
    ArrayAccess {
        array: ExprId,
        index: ExprId,
        #[serde(default)]
        range: Span,
    },
    Call {
        callee: ExprId,
        #[serde(default)]
        args: Vec<ExprId>,
        #[serde(default)]
        range: Span,
    },
    New {
        class: String,
        #[serde(default)]
        args: Vec<ExprId>,
        #[serde(default)]
        range: Span,
    },
    Unary {
        op: UnaryOp,
        expr: ExprId,
        #[serde(default)]
        range: Span,
    },
    /// A chain of one binary operator, `a op b op c`, with 2+ operands.
    Polyadic {
        op: BinaryOp,
        operands: Vec<ExprId>,
        #[serde(default)]
        range: Span,
    },
    InstanceOf {
        expr: ExprId,
        ty: String,
        #[serde(default)]
        range: Span,
    },
    Conditional {
        condition: ExprId,
        then_expr: ExprId,
        else_expr: ExprId,
        #[serde(default)]
        range: Span,
    },
    Paren {
        expr: ExprId,
        #[serde(default)]
        range: Span,
    },
    Assign {
        target: ExprId,
        value: ExprId,
        #[serde(default)]
        range: Span,
    },
    Cast {
        ty: String,
        expr: ExprId,
        #[serde(default)]
        range: Span,
    },
    Lambda {
        #[serde(default)]
        range: Span,
    },
    MethodRef {
        receiver: ExprId,
        name: String,
        #[serde(default)]
        range: Span,
    },
    Missing {
        #[serde(default)]
        range: Span,
    },
}

impl Expr {
    #[must_use]
    pub fn range(&self) -> Span {
        match self {
            Expr::Name { range, .. }
            | Expr::Literal { range, .. }
            | Expr::This { range }
            | Expr::FieldAccess { range, .. }
            | Expr::ArrayAccess { range, .. }
            | Expr::Call { range, .. }
            | Expr::New { range, .. }
            | Expr::Unary { range, .. }
            | Expr::Polyadic { range, .. }
            | Expr::InstanceOf { range, .. }
            | Expr::Conditional { range, .. }
            | Expr::Paren { range, .. }
            | Expr::Assign { range, .. }
            | Expr::Cast { range, .. }
            | Expr::Lambda { range }
            | Expr::MethodRef { range, .. }
            | Expr::Missing { range } => *range,
        }
    }

    fn children(&self, out: &mut Vec<ExprId>) {
        match self {
            Expr::Name { .. }
            | Expr::Literal { .. }
            | Expr::This { .. }
            | Expr::Lambda { .. }
            | Expr::Missing { .. } => {}
            Expr::FieldAccess { receiver, .. } | Expr::MethodRef { receiver, .. } => {
                out.push(*receiver)
            }
            Expr::ArrayAccess { array, index, .. } => out.extend([*array, *index]),
            Expr::Call { callee, args, .. } => {
                out.push(*callee);
                out.extend(args.iter().copied());
            }
            Expr::New { args, .. } => out.extend(args.iter().copied()),
            Expr::Unary { expr, .. }
            | Expr::InstanceOf { expr, .. }
            | Expr::Paren { expr, .. }
            | Expr::Cast { expr, .. } => out.push(*expr),
            Expr::Polyadic { operands, .. } => out.extend(operands.iter().copied()),
            Expr::Conditional {
                condition,
                then_expr,
                else_expr,
                ..
            } => out.extend([*condition, *then_expr, *else_expr]),
            Expr::Assign { target, value, .. } => out.extend([*target, *value]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
    BitNot,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    BitAnd,
    BitOr,
    BitXor,
    And,
    Or,
}

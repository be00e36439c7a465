//! Lightweight Java AST.
//!
//! This is not a full-fidelity tree: trivia is dropped and constructs the
//! analysis never looks at (lambdas, switch, try) are either kept opaque or
//! degrade to [`Expr::Missing`]. Every node carries a byte [`Span`].

use contrail_types::Span;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationUnit {
    pub types: Vec<TypeDecl>,
    pub range: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Record,
    Annotation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDecl {
    pub kind: TypeKind,
    pub name: String,
    pub range: Span,
    pub body_range: Span,
    pub members: Vec<MemberDecl>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberDecl {
    Field(FieldDecl),
    Method(MethodDecl),
    Constructor(ConstructorDecl),
    Initializer(InitializerDecl),
    Type(TypeDecl),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Annotation name as written, without the leading `@`.
    pub name: String,
    pub args: Vec<AnnotationArg>,
    pub range: Span,
}

impl Annotation {
    /// Value of a string-valued element. A positional argument is the
    /// `value` element.
    pub fn string_value(&self, element: &str) -> Option<&str> {
        self.args.iter().find_map(|arg| {
            let name = arg.name.as_deref().unwrap_or("value");
            match &arg.value {
                AnnotationValue::String(value) if name == element => Some(value.as_str()),
                _ => None,
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationArg {
    pub name: Option<String>,
    pub value: AnnotationValue,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationValue {
    /// A single string literal, unescaped.
    String(String),
    /// Anything else, as source text.
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    pub text: String,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    pub ty: TypeRef,
    pub name: String,
    pub name_range: Span,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDecl {
    pub ty: TypeRef,
    pub name: String,
    pub name_range: Span,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDecl {
    pub annotations: Vec<Annotation>,
    pub return_ty: TypeRef,
    pub name: String,
    pub name_range: Span,
    pub params: Vec<ParamDecl>,
    pub body: Option<Block>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructorDecl {
    pub name: String,
    pub name_range: Span,
    pub params: Vec<ParamDecl>,
    pub body: Block,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitializerDecl {
    pub is_static: bool,
    pub body: Block,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub statements: Vec<Stmt>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    LocalVar(LocalVarStmt),
    Expr(ExprStmt),
    Return(ReturnStmt),
    Throw(ThrowStmt),
    If(IfStmt),
    Assert(AssertStmt),
    While(WhileStmt),
    /// Statements the analysis never inspects (`for`, `do`, `switch`, `try`,
    /// `break`, ...). Their structure is skipped, only the keyword is kept.
    Opaque(OpaqueStmt),
    Block(Block),
    Empty(Span),
}

impl Stmt {
    pub fn range(&self) -> Span {
        match self {
            Stmt::LocalVar(stmt) => stmt.range,
            Stmt::Expr(stmt) => stmt.range,
            Stmt::Return(stmt) => stmt.range,
            Stmt::Throw(stmt) => stmt.range,
            Stmt::If(stmt) => stmt.range,
            Stmt::Assert(stmt) => stmt.range,
            Stmt::While(stmt) => stmt.range,
            Stmt::Opaque(stmt) => stmt.range,
            Stmt::Block(block) => block.range,
            Stmt::Empty(range) => *range,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVarStmt {
    pub ty: TypeRef,
    pub name: String,
    pub name_range: Span,
    pub initializer: Option<Expr>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExprStmt {
    pub expr: Expr,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnStmt {
    pub expr: Option<Expr>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThrowStmt {
    pub expr: Expr,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_branch: Box<Stmt>,
    pub else_branch: Option<Box<Stmt>>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertStmt {
    pub condition: Expr,
    pub message: Option<Expr>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: Box<Stmt>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaqueStmt {
    pub keyword: String,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Name(NameExpr),
    IntLiteral(LiteralExpr),
    StringLiteral(LiteralExpr),
    CharLiteral(LiteralExpr),
    BoolLiteral(BoolLiteralExpr),
    NullLiteral(Span),
    This(Span),
    Call(CallExpr),
    FieldAccess(FieldAccessExpr),
    ArrayAccess(ArrayAccessExpr),
    New(NewExpr),
    Unary(UnaryExpr),
    Binary(BinaryExpr),
    InstanceOf(InstanceOfExpr),
    Conditional(ConditionalExpr),
    Assign(AssignExpr),
    Paren(ParenExpr),
    Cast(CastExpr),
    /// Lambda expression. Parameters and body are not kept.
    Lambda(Span),
    MethodRef(MethodRefExpr),
    Missing(Span),
}

impl Expr {
    pub fn range(&self) -> Span {
        match self {
            Expr::Name(expr) => expr.range,
            Expr::IntLiteral(expr) | Expr::StringLiteral(expr) | Expr::CharLiteral(expr) => {
                expr.range
            }
            Expr::BoolLiteral(expr) => expr.range,
            Expr::Call(expr) => expr.range,
            Expr::FieldAccess(expr) => expr.range,
            Expr::ArrayAccess(expr) => expr.range,
            Expr::New(expr) => expr.range,
            Expr::Unary(expr) => expr.range,
            Expr::Binary(expr) => expr.range,
            Expr::InstanceOf(expr) => expr.range,
            Expr::Conditional(expr) => expr.range,
            Expr::Assign(expr) => expr.range,
            Expr::Paren(expr) => expr.range,
            Expr::Cast(expr) => expr.range,
            Expr::MethodRef(expr) => expr.range,
            Expr::NullLiteral(range)
            | Expr::This(range)
            | Expr::Lambda(range)
            | Expr::Missing(range) => *range,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameExpr {
    pub name: String,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralExpr {
    pub value: String,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoolLiteralExpr {
    pub value: bool,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallExpr {
    pub callee: Box<Expr>,
    pub args: Vec<Expr>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldAccessExpr {
    pub receiver: Box<Expr>,
    pub name: String,
    pub name_range: Span,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayAccessExpr {
    pub array: Box<Expr>,
    pub index: Box<Expr>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExpr {
    pub ty: TypeRef,
    pub args: Vec<Expr>,
    pub range: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
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

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub operand: Box<Expr>,
    pub range: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    EqEq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    BitAnd,
    BitOr,
    BitXor,
    AndAnd,
    OrOr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryExpr {
    pub op: BinaryOp,
    pub lhs: Box<Expr>,
    pub rhs: Box<Expr>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceOfExpr {
    pub expr: Box<Expr>,
    pub ty: TypeRef,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionalExpr {
    pub condition: Box<Expr>,
    pub then_expr: Box<Expr>,
    pub else_expr: Box<Expr>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignExpr {
    pub target: Box<Expr>,
    pub value: Box<Expr>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParenExpr {
    pub expr: Box<Expr>,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CastExpr {
    pub ty: TypeRef,
    pub expr: Box<Expr>,
    pub range: Span,
}

/// `receiver::name`, where `name` may be `new`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodRefExpr {
    pub receiver: Box<Expr>,
    pub name: String,
    pub range: Span,
}

//! Method-level intermediate representation for contract inference.
//!
//! Bodies are stored in arenas indexed by [`StmtId`] and [`ExprId`]; a
//! [`Method`] carries its parameters, annotations and optional [`Body`].
//! Every type here is `serde`-serializable so other front ends can hand
//! bodies over as JSON.

mod builder;
pub mod hir;
pub mod lowering;

pub use builder::BodyBuilder;
pub use hir::{
    Annotation, Arena, BinaryOp, Body, BodyError, Expr, ExprId, LiteralKind, Method, Param, Stmt,
    StmtId, UnaryOp,
};
pub use lowering::{lower_body, lower_compilation_unit, lower_method};

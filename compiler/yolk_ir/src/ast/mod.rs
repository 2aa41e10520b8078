//! The statement/expression tree.
//!
//! Nodes own their children. Function bodies and spawned blocks sit behind
//! `Arc` so closures and tasks can keep them alive independently of the
//! program that declared them.

mod expr;
mod operators;
mod stmt;
mod types;

pub use expr::{Expr, ExprKind, FieldInit, InterpolationPart, MapEntry};
pub use operators::{BinaryOp, UnaryOp};
pub use stmt::{
    Block, ElseBranch, FunctionDecl, Param, Program, Stmt, StmtKind, SwitchCase, VarDecl,
};
pub use types::{FieldType, TypeExpr, TypeExprKind};

//! Yolk IR - the tree the evaluator walks.
//!
//! The lexer and parser live outside this workspace. They hand the runtime a
//! [`ast::Program`]: an ordered list of statements, every node stamped with a
//! [`Span`] (line and column) that runtime errors report.
//!
//! # Building trees by hand
//!
//! Hosts and tests can construct nodes directly through the associated
//! constructors on [`Expr`], [`Stmt`] and [`TypeExpr`]:
//!
//! ```text
//! let program = Program::new(vec![
//!     Stmt::var("x", Expr::int(5)).at(1, 1),
//!     Stmt::expr(Expr::call("println", vec![Expr::ident("x")])).at(2, 1),
//! ]);
//! ```
//!
//! With the `serde` feature enabled every node is serializable, so a parser
//! running in another process can ship the tree over as JSON.

pub mod ast;
mod span;

pub use ast::{
    BinaryOp, Block, ElseBranch, Expr, ExprKind, FieldInit, FieldType, FunctionDecl,
    InterpolationPart, MapEntry, Param, Program, Stmt, StmtKind, SwitchCase, TypeExpr,
    TypeExprKind, UnaryOp, VarDecl,
};
pub use span::Span;

//! Expression nodes.

use std::sync::Arc;

use super::{BinaryOp, FunctionDecl, TypeExpr, UnaryOp};
use crate::Span;

/// An expression with its source position.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExprKind {
    // Literals
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Nil,
    /// `"total: {n}"` - literal and expression parts, concatenated in order.
    Interpolated(Vec<InterpolationPart>),

    // Composite literals
    Tuple(Vec<Expr>),
    Array(Vec<Expr>),
    Map(Vec<MapEntry>),
    /// `Point{x: 1, y: 2}` when `type_name` is set, `struct{x: 1}` otherwise.
    Struct {
        type_name: Option<String>,
        fields: Vec<FieldInit>,
    },

    // Access
    Ident(String),
    Member {
        object: Box<Expr>,
        field: String,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },

    // Calls
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    MethodCall {
        receiver: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },
    /// Anonymous function literal; closes over the scope it is evaluated in.
    Function(Arc<FunctionDecl>),

    // Operators
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Grouped(Box<Expr>),
    /// Membership test: `x in collection`.
    In {
        element: Box<Expr>,
        collection: Box<Expr>,
    },
    /// `value.(T)` - recover a concrete type from a `thing`.
    TypeAssert {
        expr: Box<Expr>,
        ty: TypeExpr,
    },
}

/// Piece of an interpolated string.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InterpolationPart {
    Literal(String),
    Expr(Expr),
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MapEntry {
    pub key: Expr,
    pub value: Expr,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldInit {
    pub name: String,
    pub value: Expr,
}

impl Expr {
    pub fn new(kind: ExprKind) -> Self {
        Expr {
            kind,
            span: Span::DUMMY,
        }
    }

    /// Attach a source position.
    #[must_use]
    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.span = Span::new(line, column);
        self
    }

    pub fn int(n: i64) -> Self {
        Self::new(ExprKind::Int(n))
    }

    pub fn float(f: f64) -> Self {
        Self::new(ExprKind::Float(f))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Self::new(ExprKind::Str(s.into()))
    }

    pub fn bool(b: bool) -> Self {
        Self::new(ExprKind::Bool(b))
    }

    pub fn nil() -> Self {
        Self::new(ExprKind::Nil)
    }

    pub fn ident(name: impl Into<String>) -> Self {
        Self::new(ExprKind::Ident(name.into()))
    }

    pub fn interpolated(parts: Vec<InterpolationPart>) -> Self {
        Self::new(ExprKind::Interpolated(parts))
    }

    pub fn tuple(items: Vec<Expr>) -> Self {
        Self::new(ExprKind::Tuple(items))
    }

    pub fn array(items: Vec<Expr>) -> Self {
        Self::new(ExprKind::Array(items))
    }

    pub fn map(entries: Vec<(Expr, Expr)>) -> Self {
        Self::new(ExprKind::Map(
            entries
                .into_iter()
                .map(|(key, value)| MapEntry { key, value })
                .collect(),
        ))
    }

    /// Struct literal. `type_name == None` builds an anonymous struct.
    pub fn structure<S: Into<String>>(type_name: Option<&str>, fields: Vec<(S, Expr)>) -> Self {
        Self::new(ExprKind::Struct {
            type_name: type_name.map(str::to_string),
            fields: fields
                .into_iter()
                .map(|(name, value)| FieldInit {
                    name: name.into(),
                    value,
                })
                .collect(),
        })
    }

    pub fn member(object: Expr, field: impl Into<String>) -> Self {
        Self::new(ExprKind::Member {
            object: Box::new(object),
            field: field.into(),
        })
    }

    pub fn index(object: Expr, index: Expr) -> Self {
        Self::new(ExprKind::Index {
            object: Box::new(object),
            index: Box::new(index),
        })
    }

    /// Call a function by name.
    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::call_expr(Self::ident(name), args)
    }

    /// Call the result of an arbitrary callee expression.
    pub fn call_expr(callee: Expr, args: Vec<Expr>) -> Self {
        Self::new(ExprKind::Call {
            callee: Box::new(callee),
            args,
        })
    }

    pub fn method_call(receiver: Expr, method: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::new(ExprKind::MethodCall {
            receiver: Box::new(receiver),
            method: method.into(),
            args,
        })
    }

    pub fn function(decl: FunctionDecl) -> Self {
        Self::new(ExprKind::Function(Arc::new(decl)))
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Self::new(ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Self::new(ExprKind::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    pub fn grouped(inner: Expr) -> Self {
        Self::new(ExprKind::Grouped(Box::new(inner)))
    }

    pub fn contains(element: Expr, collection: Expr) -> Self {
        Self::new(ExprKind::In {
            element: Box::new(element),
            collection: Box::new(collection),
        })
    }

    pub fn type_assert(expr: Expr, ty: TypeExpr) -> Self {
        Self::new(ExprKind::TypeAssert {
            expr: Box::new(expr),
            ty,
        })
    }

    /// The name this expression refers to, if it is a bare identifier.
    pub fn as_ident(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Ident(name) => Some(name),
            _ => None,
        }
    }
}

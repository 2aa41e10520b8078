//! Type expressions as written in source (`int`, `[]string`, `map[string]int`, ...).

use crate::Span;

/// A type annotation node.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TypeExpr {
    pub kind: TypeExprKind,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TypeExprKind {
    /// A primitive (`int`, `thing`, ...) or declared type name.
    Named(String),
    /// `[]T`
    Array(Box<TypeExpr>),
    /// `map[K]V`
    Map {
        key: Box<TypeExpr>,
        value: Box<TypeExpr>,
    },
    /// `struct { x int; y int }`
    Struct(Vec<FieldType>),
    /// `func(P...) (R...)`
    Function {
        params: Vec<TypeExpr>,
        returns: Vec<TypeExpr>,
    },
}

/// One field of a struct type expression.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldType {
    pub name: String,
    pub ty: TypeExpr,
}

impl TypeExpr {
    fn new(kind: TypeExprKind) -> Self {
        TypeExpr {
            kind,
            span: Span::DUMMY,
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::new(TypeExprKind::Named(name.into()))
    }

    pub fn array(elem: TypeExpr) -> Self {
        Self::new(TypeExprKind::Array(Box::new(elem)))
    }

    pub fn map(key: TypeExpr, value: TypeExpr) -> Self {
        Self::new(TypeExprKind::Map {
            key: Box::new(key),
            value: Box::new(value),
        })
    }

    pub fn structure<S: Into<String>>(fields: Vec<(S, TypeExpr)>) -> Self {
        Self::new(TypeExprKind::Struct(
            fields
                .into_iter()
                .map(|(name, ty)| FieldType {
                    name: name.into(),
                    ty,
                })
                .collect(),
        ))
    }

    pub fn function(params: Vec<TypeExpr>, returns: Vec<TypeExpr>) -> Self {
        Self::new(TypeExprKind::Function { params, returns })
    }

    /// Attach a source position.
    #[must_use]
    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.span = Span::new(line, column);
        self
    }
}

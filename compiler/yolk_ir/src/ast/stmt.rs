//! Statement nodes, blocks and function declarations.

use std::sync::Arc;

use super::{Expr, TypeExpr};
use crate::Span;

/// A whole parsed program.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Program {
    pub stmts: Vec<Stmt>,
}

impl Program {
    pub fn new(stmts: Vec<Stmt>) -> Self {
        Program { stmts }
    }
}

/// A braced statement list.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

impl Block {
    pub fn new(stmts: Vec<Stmt>) -> Self {
        Block {
            stmts,
            span: Span::DUMMY,
        }
    }
}

/// A statement with its source position.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StmtKind {
    /// `egg`/`const` declarations, single or multi.
    VarDecl(VarDecl),
    /// `x = v` or `a, b = v1, v2`.
    Assign {
        targets: Vec<String>,
        values: Vec<Expr>,
    },
    /// `arr[i] = v`
    IndexAssign {
        object: Expr,
        index: Expr,
        value: Expr,
    },
    /// `p.x = v`
    MemberAssign {
        object: Expr,
        field: String,
        value: Expr,
    },
    /// `type P struct {...}`, `type Meters float`, `type Id = int` (`alias`).
    TypeDecl {
        name: String,
        ty: TypeExpr,
        alias: bool,
    },
    EnumDecl {
        name: String,
        variants: Vec<String>,
    },
    FuncDecl(Arc<FunctionDecl>),
    /// `func (p Point) norm() float {...}`
    MethodDecl {
        receiver_type: String,
        receiver_name: String,
        func: Arc<FunctionDecl>,
    },
    /// `if cond {...} elen ...`; a missing condition is a parser defect.
    If {
        condition: Option<Expr>,
        then_branch: Block,
        else_branch: Option<ElseBranch>,
    },
    /// C-style loop; init/condition/post live in a frame enclosing every iteration.
    For {
        init: Option<Box<Stmt>>,
        condition: Option<Expr>,
        post: Option<Box<Stmt>>,
        body: Block,
    },
    /// `for k, v in iterable {...}`
    RangeFor {
        key: String,
        value: Option<String>,
        iterable: Expr,
        body: Block,
    },
    While {
        condition: Option<Expr>,
        body: Block,
    },
    Switch {
        subject: Expr,
        cases: Vec<SwitchCase>,
        default: Option<Block>,
    },
    /// `with expr {...}` binds the value as constant `it` inside the body.
    With {
        value: Expr,
        body: Block,
    },
    /// Run the block on an independent task sharing the current scope chain.
    Spawn(Arc<Block>),
    /// Call expression run when the owning function returns.
    Defer(Expr),
    Break,
    Continue,
    Return(Vec<Expr>),
    Expr(Expr),
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ElseBranch {
    /// `elen if ...`
    If(Box<Stmt>),
    /// `elen {...}`
    Block(Block),
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SwitchCase {
    pub values: Vec<Expr>,
    pub body: Block,
}

/// Variable or constant declaration.
///
/// `egg x = 1 lifetime 2` is `VarDecl { names: ["x"], values: [1], lifetime: Some(2), .. }`.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VarDecl {
    pub names: Vec<String>,
    pub ty: Option<TypeExpr>,
    pub values: Vec<Expr>,
    pub constant: bool,
    pub lifetime: Option<Expr>,
}

impl VarDecl {
    pub fn new<S: Into<String>>(names: Vec<S>) -> Self {
        VarDecl {
            names: names.into_iter().map(Into::into).collect(),
            ..VarDecl::default()
        }
    }

    #[must_use]
    pub fn typed(mut self, ty: TypeExpr) -> Self {
        self.ty = Some(ty);
        self
    }

    #[must_use]
    pub fn values(mut self, values: Vec<Expr>) -> Self {
        self.values = values;
        self
    }

    #[must_use]
    pub fn constant(mut self) -> Self {
        self.constant = true;
        self
    }

    #[must_use]
    pub fn lifetime(mut self, ticks: Expr) -> Self {
        self.lifetime = Some(ticks);
        self
    }
}

/// A function parameter with an optional type annotation.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Param {
    pub name: String,
    pub ty: Option<TypeExpr>,
}

/// Named function, method body, or function literal.
///
/// An empty `returns` list means the function declares no result types and
/// its `return` values are passed through unchecked.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FunctionDecl {
    pub name: Option<String>,
    pub params: Vec<Param>,
    pub returns: Vec<TypeExpr>,
    pub body: Block,
    pub span: Span,
}

impl FunctionDecl {
    pub fn new(name: impl Into<String>) -> Self {
        FunctionDecl {
            name: Some(name.into()),
            ..FunctionDecl::default()
        }
    }

    pub fn anonymous() -> Self {
        FunctionDecl::default()
    }

    #[must_use]
    pub fn param(mut self, name: impl Into<String>, ty: Option<TypeExpr>) -> Self {
        self.params.push(Param {
            name: name.into(),
            ty,
        });
        self
    }

    #[must_use]
    pub fn returns(mut self, returns: Vec<TypeExpr>) -> Self {
        self.returns = returns;
        self
    }

    #[must_use]
    pub fn body(mut self, stmts: Vec<Stmt>) -> Self {
        self.body = Block::new(stmts);
        self
    }

    /// Display name for backtraces.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<anonymous>")
    }
}

impl Stmt {
    pub fn new(kind: StmtKind) -> Self {
        Stmt {
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

    pub fn decl(decl: VarDecl) -> Self {
        Self::new(StmtKind::VarDecl(decl))
    }

    /// `egg name = value`
    pub fn var(name: impl Into<String>, value: Expr) -> Self {
        Self::decl(VarDecl::new(vec![name.into()]).values(vec![value]))
    }

    /// `const name = value`
    pub fn constant(name: impl Into<String>, value: Expr) -> Self {
        Self::decl(VarDecl::new(vec![name.into()]).values(vec![value]).constant())
    }

    pub fn assign(target: impl Into<String>, value: Expr) -> Self {
        Self::new(StmtKind::Assign {
            targets: vec![target.into()],
            values: vec![value],
        })
    }

    pub fn multi_assign<S: Into<String>>(targets: Vec<S>, values: Vec<Expr>) -> Self {
        Self::new(StmtKind::Assign {
            targets: targets.into_iter().map(Into::into).collect(),
            values,
        })
    }

    pub fn index_assign(object: Expr, index: Expr, value: Expr) -> Self {
        Self::new(StmtKind::IndexAssign {
            object,
            index,
            value,
        })
    }

    pub fn member_assign(object: Expr, field: impl Into<String>, value: Expr) -> Self {
        Self::new(StmtKind::MemberAssign {
            object,
            field: field.into(),
            value,
        })
    }

    pub fn type_decl(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self::new(StmtKind::TypeDecl {
            name: name.into(),
            ty,
            alias: false,
        })
    }

    pub fn alias_decl(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self::new(StmtKind::TypeDecl {
            name: name.into(),
            ty,
            alias: true,
        })
    }

    pub fn enum_decl<S: Into<String>>(name: impl Into<String>, variants: Vec<S>) -> Self {
        Self::new(StmtKind::EnumDecl {
            name: name.into(),
            variants: variants.into_iter().map(Into::into).collect(),
        })
    }

    pub fn func(decl: FunctionDecl) -> Self {
        Self::new(StmtKind::FuncDecl(Arc::new(decl)))
    }

    pub fn method(
        receiver_type: impl Into<String>,
        receiver_name: impl Into<String>,
        decl: FunctionDecl,
    ) -> Self {
        Self::new(StmtKind::MethodDecl {
            receiver_type: receiver_type.into(),
            receiver_name: receiver_name.into(),
            func: Arc::new(decl),
        })
    }

    pub fn if_else(condition: Expr, then_branch: Vec<Stmt>, else_branch: Option<Vec<Stmt>>) -> Self {
        Self::new(StmtKind::If {
            condition: Some(condition),
            then_branch: Block::new(then_branch),
            else_branch: else_branch.map(|stmts| ElseBranch::Block(Block::new(stmts))),
        })
    }

    pub fn for_loop(
        init: Option<Stmt>,
        condition: Option<Expr>,
        post: Option<Stmt>,
        body: Vec<Stmt>,
    ) -> Self {
        Self::new(StmtKind::For {
            init: init.map(Box::new),
            condition,
            post: post.map(Box::new),
            body: Block::new(body),
        })
    }

    pub fn range_for(
        key: impl Into<String>,
        value: Option<&str>,
        iterable: Expr,
        body: Vec<Stmt>,
    ) -> Self {
        Self::new(StmtKind::RangeFor {
            key: key.into(),
            value: value.map(str::to_string),
            iterable,
            body: Block::new(body),
        })
    }

    pub fn while_loop(condition: Expr, body: Vec<Stmt>) -> Self {
        Self::new(StmtKind::While {
            condition: Some(condition),
            body: Block::new(body),
        })
    }

    pub fn switch(subject: Expr, cases: Vec<(Vec<Expr>, Vec<Stmt>)>, default: Option<Vec<Stmt>>) -> Self {
        Self::new(StmtKind::Switch {
            subject,
            cases: cases
                .into_iter()
                .map(|(values, body)| SwitchCase {
                    values,
                    body: Block::new(body),
                })
                .collect(),
            default: default.map(Block::new),
        })
    }

    pub fn with(value: Expr, body: Vec<Stmt>) -> Self {
        Self::new(StmtKind::With {
            value,
            body: Block::new(body),
        })
    }

    pub fn spawn(body: Vec<Stmt>) -> Self {
        Self::new(StmtKind::Spawn(Arc::new(Block::new(body))))
    }

    pub fn defer(call: Expr) -> Self {
        Self::new(StmtKind::Defer(call))
    }

    pub fn brk() -> Self {
        Self::new(StmtKind::Break)
    }

    pub fn cont() -> Self {
        Self::new(StmtKind::Continue)
    }

    pub fn ret(values: Vec<Expr>) -> Self {
        Self::new(StmtKind::Return(values))
    }

    pub fn expr(expr: Expr) -> Self {
        Self::new(StmtKind::Expr(expr))
    }
}

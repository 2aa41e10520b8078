//! Runtime values.
//!
//! [`Value`] is a closed sum type: every cross-cutting operation (rendering,
//! type projection, equality, hashing) matches it exhaustively.
//!
//! # Sharing
//!
//! Arrays, maps and structs are reference cells. Cloning a `Value` clones the
//! handle; mutation through one handle is visible through every other. The
//! `ty` on a handle is per-handle. Promoting into an alias of the same type
//! re-labels the handle; promoting into a different array or map type copies
//! the cell, so a write through the wider handle never reaches a narrower one.
//!
//! No cell ever reaches itself. Stores check [`Value::contains_cell`] first,
//! which is what lets rendering, equality and frozen copies recurse freely.
//!
//! Constants hold a [`Value::frozen_copy`], whose cells reject mutation.

mod cells;
mod display;
mod equality;

use std::sync::Arc;

use yolk_ir::{FunctionDecl, Span};
use yolk_types::{Idx, TypeRegistry};

use crate::environment::Environment;

pub use cells::{ArrayValue, CellId, CyclicStore, FrozenCell, MapValue, StructValue};
pub use equality::{values_equal, MapKey, NotComparable};

/// A runtime value.
#[derive(Clone, Debug)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    Bool(bool),
    Nil,
    /// Declared without initializer or type; accepts any first assignment.
    Uninitialized,
    /// Binding-level immutability tag. Unwrapped on every read.
    Const(Box<Value>),
    /// Multi-value carrier produced by multi-return calls.
    Tuple(Vec<Value>),
    Array(ArrayValue),
    Map(MapValue),
    Struct(StructValue),
    Enum(EnumValue),
    Function(FunctionValue),
    /// A value of a user named type, or an erased `thing` when `ty == Idx::ANY`.
    Named(NamedValue),
    Error(ErrorValue),
}

/// One variant of a declared enum.
#[derive(Clone, Debug)]
pub struct EnumValue {
    pub ty: Idx,
    pub type_name: Arc<str>,
    pub variant: Arc<str>,
    pub index: usize,
}

/// A value wrapped in a nominal type.
#[derive(Clone, Debug)]
pub struct NamedValue {
    pub ty: Idx,
    pub inner: Box<Value>,
}

/// A closure: declaration plus the frame it was defined in.
#[derive(Clone)]
pub struct FunctionValue {
    pub decl: Arc<FunctionDecl>,
    pub captured: Environment,
    pub ty: Idx,
    /// Receiver parameter name for methods.
    pub receiver: Option<Arc<str>>,
}

impl FunctionValue {
    pub fn name(&self) -> &str {
        self.decl.display_name()
    }
}

impl std::fmt::Debug for FunctionValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionValue")
            .field("name", &self.name())
            .field("ty", &self.ty)
            .finish_non_exhaustive()
    }
}

/// An error value. Raised when it reaches statement level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorValue {
    pub message: Arc<str>,
    pub span: Option<Span>,
}

impl ErrorValue {
    pub fn new(message: impl Into<Arc<str>>) -> Self {
        ErrorValue {
            message: message.into(),
            span: None,
        }
    }

    /// Stamp a position unless one is already recorded.
    #[must_use]
    pub fn at(mut self, span: Span) -> Self {
        if self.span.is_none() && !span.is_dummy() {
            self.span = Some(span);
        }
        self
    }
}

impl Value {
    // Factories

    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Value::Str(s.into())
    }

    pub fn error(message: impl Into<Arc<str>>) -> Self {
        Value::Error(ErrorValue::new(message))
    }

    pub fn array(items: Vec<Value>, ty: Idx) -> Self {
        Value::Array(ArrayValue::new(items, ty))
    }

    pub fn map(entries: rustc_hash::FxHashMap<MapKey, Value>, ty: Idx) -> Self {
        Value::Map(MapValue::new(entries, ty))
    }

    pub fn structure(name: Option<Arc<str>>, fields: Vec<(Arc<str>, Value)>, ty: Idx) -> Self {
        Value::Struct(StructValue::new(name, fields, ty))
    }

    pub fn named(ty: Idx, inner: Value) -> Self {
        Value::Named(NamedValue {
            ty,
            inner: Box::new(inner),
        })
    }

    /// Wrap into a `thing`. Already-erased values are not wrapped twice.
    pub fn erase(self) -> Self {
        match self {
            Value::Named(NamedValue { ty: Idx::ANY, .. }) => self,
            Value::Const(inner) => inner.erase(),
            other => Value::named(Idx::ANY, other),
        }
    }

    // Queries

    /// Runtime type projection. `Const` is transparent.
    pub fn type_of(&self) -> Idx {
        match self {
            Value::Int(_) => Idx::INT,
            Value::Float(_) => Idx::FLOAT,
            Value::Str(_) => Idx::STR,
            Value::Bool(_) => Idx::BOOL,
            Value::Nil => Idx::NIL,
            Value::Uninitialized => Idx::NONE,
            Value::Const(inner) => inner.type_of(),
            Value::Tuple(_) => Idx::TUPLE,
            Value::Array(a) => a.ty,
            Value::Map(m) => m.ty,
            Value::Struct(s) => s.ty,
            Value::Enum(e) => e.ty,
            Value::Function(f) => f.ty,
            Value::Named(n) => n.ty,
            Value::Error(_) => Idx::ERROR,
        }
    }

    /// Short kind name used in messages where no registry is at hand.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Bool(_) => "bool",
            Value::Nil => "nil",
            Value::Uninitialized => "uninitialized value",
            Value::Const(inner) => inner.kind_name(),
            Value::Tuple(_) => "tuple",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Struct(_) => "struct",
            Value::Enum(_) => "enum",
            Value::Function(_) => "function",
            Value::Named(NamedValue { ty: Idx::ANY, .. }) => "thing",
            Value::Named(_) => "named value",
            Value::Error(_) => "error",
        }
    }

    /// Type name for messages. Tuples and unset values have no registry entry.
    pub fn type_name(&self, types: &TypeRegistry) -> String {
        match self {
            Value::Const(inner) => inner.type_name(types),
            Value::Tuple(_) | Value::Uninitialized => self.kind_name().to_string(),
            _ => types.display(self.type_of()),
        }
    }

    /// Strip the `Const` tag.
    #[must_use]
    pub fn unconst(self) -> Self {
        match self {
            Value::Const(inner) => inner.unconst(),
            other => other,
        }
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// `Some` if this is an erased `thing`.
    pub fn as_erased(&self) -> Option<&Value> {
        match self {
            Value::Named(NamedValue { ty: Idx::ANY, inner }) => Some(inner),
            _ => None,
        }
    }

    /// The concrete value behind a `thing`, or the value itself.
    #[must_use]
    pub fn unerase(self) -> Self {
        match self {
            Value::Named(NamedValue {
                ty: Idx::ANY,
                inner,
            }) => *inner,
            Value::Const(inner) => inner.unerase(),
            other => other,
        }
    }

    /// Whether the cell `id` is this value or reachable from it.
    pub fn contains_cell(&self, id: CellId) -> bool {
        match self {
            Value::Const(inner) => inner.contains_cell(id),
            Value::Tuple(items) => items.iter().any(|item| item.contains_cell(id)),
            Value::Array(a) => {
                a.id() == id || a.snapshot().iter().any(|item| item.contains_cell(id))
            }
            Value::Map(m) => {
                m.id() == id || m.entries().iter().any(|(_, item)| item.contains_cell(id))
            }
            Value::Struct(s) => {
                s.id() == id || s.fields().iter().any(|(_, item)| item.contains_cell(id))
            }
            Value::Named(n) => n.inner.contains_cell(id),
            _ => false,
        }
    }

    /// Deep copy with every reachable array, map and struct cell frozen.
    #[must_use]
    pub fn frozen_copy(&self) -> Self {
        match self {
            Value::Const(inner) => inner.frozen_copy(),
            Value::Tuple(items) => Value::Tuple(items.iter().map(Value::frozen_copy).collect()),
            Value::Array(a) => Value::Array(a.frozen_copy()),
            Value::Map(m) => Value::Map(m.frozen_copy()),
            Value::Struct(s) => Value::Struct(s.frozen_copy()),
            Value::Named(n) => Value::named(n.ty, n.inner.frozen_copy()),
            other => other.clone(),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::string(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap for brevity")]
mod tests;

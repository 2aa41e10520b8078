//! Runtime side of the type system: zero values, value assignability and
//! promotion.
//!
//! The registry only knows types. These helpers look at values too: an
//! array is assignable to `[]T` when its elements are, and a value stored
//! into a `thing` slot gets erased.

use std::fmt;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use rustc_hash::FxHashMap;
use yolk_ir::TypeExpr;
use yolk_types::{Idx, TypeData, TypeRegistry};

use super::Interpreter;
use crate::errors::EvalError;
use crate::value::{EnumValue, Value};

/// The type registry of an interpreter, its forks and their tasks.
///
/// A type declared by any task is visible to all of them under the same
/// `Idx`. Never hold a guard while evaluating user code.
#[derive(Clone, Default)]
pub struct SharedTypes(Arc<RwLock<TypeRegistry>>);

impl SharedTypes {
    pub fn new(types: TypeRegistry) -> Self {
        SharedTypes(Arc::new(RwLock::new(types)))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, TypeRegistry> {
        self.0.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, TypeRegistry> {
        self.0.write()
    }
}

impl fmt::Debug for SharedTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedTypes")
            .field("registered", &self.read().len())
            .finish()
    }
}

/// Self-referential struct types stop producing zero fields past this depth.
const MAX_ZERO_DEPTH: usize = 16;

/// Whether `value` may be stored where `target` is declared.
///
/// `nil` fits `error` slots. Arrays and maps fit when their static type is
/// assignable or, failing that, every element is.
pub(crate) fn value_assignable(types: &TypeRegistry, value: &Value, target: Idx) -> bool {
    let target = types.resolve_alias(target);
    if target == Idx::ANY {
        return true;
    }
    match value {
        Value::Const(inner) => value_assignable(types, inner, target),
        Value::Nil => target == Idx::NIL || target == Idx::ERROR,
        Value::Uninitialized => false,
        Value::Array(array) => match types.array_elem(target) {
            Some(elem) => {
                types.assignable(array.ty, target)
                    || array
                        .snapshot()
                        .iter()
                        .all(|item| value_assignable(types, item, elem))
            }
            None => false,
        },
        Value::Map(map) => match types.map_types(target) {
            Some((key_ty, value_ty)) => {
                types.assignable(map.ty, target)
                    || map.entries().iter().all(|(key, item)| {
                        value_assignable(types, key.value(), key_ty)
                            && value_assignable(types, item, value_ty)
                    })
            }
            None => false,
        },
        other => types.assignable(other.type_of(), target),
    }
}

/// Adapt an assignable value to its destination type.
pub(crate) fn promote(types: &TypeRegistry, value: Value, target: Idx) -> Value {
    let resolved = types.resolve_alias(target);
    if resolved == Idx::ANY {
        return value.erase();
    }
    match value.unconst() {
        #[allow(clippy::cast_precision_loss, reason = "int to float widening")]
        Value::Int(n) if resolved == Idx::FLOAT => Value::Float(n as f64),
        // A handle of another type gets its own cell: writes through a wider
        // handle must not reach bindings of the narrower type.
        Value::Array(array) if types.array_elem(resolved).is_some() => {
            if types.resolve_alias(array.ty) == resolved {
                Value::Array(array.with_type(target))
            } else {
                Value::Array(array.retyped_copy(target))
            }
        }
        Value::Map(map) if types.map_types(resolved).is_some() => {
            if types.resolve_alias(map.ty) == resolved {
                Value::Map(map.with_type(target))
            } else {
                Value::Map(map.retyped_copy(target))
            }
        }
        other => other,
    }
}

/// Zero value of a declared type.
pub(crate) fn zero_value(types: &TypeRegistry, ty: Idx) -> Value {
    zero_at_depth(types, ty, 0)
}

fn zero_at_depth(types: &TypeRegistry, ty: Idx, depth: usize) -> Value {
    let resolved = types.resolve_alias(ty);
    let Some(data) = types.get(resolved) else {
        return Value::Uninitialized;
    };
    match data {
        TypeData::Int => Value::Int(0),
        TypeData::Float => Value::Float(0.0),
        TypeData::Str => Value::string(""),
        TypeData::Bool => Value::Bool(false),
        TypeData::Nil | TypeData::Error | TypeData::Tuple | TypeData::Function { .. } => {
            Value::Nil
        }
        TypeData::Any => Value::Nil.erase(),
        TypeData::Array { .. } => Value::array(Vec::new(), ty),
        TypeData::Map { .. } => Value::map(FxHashMap::default(), ty),
        TypeData::Struct { .. } if depth >= MAX_ZERO_DEPTH => Value::Nil,
        TypeData::Struct { name, fields } => Value::structure(
            name.as_deref().map(Arc::from),
            fields
                .iter()
                .map(|(field, field_ty)| {
                    (
                        Arc::from(field.as_str()),
                        zero_at_depth(types, *field_ty, depth + 1),
                    )
                })
                .collect(),
            resolved,
        ),
        TypeData::Enum { name, variants } => match variants.first() {
            Some(first) => Value::Enum(EnumValue {
                ty: resolved,
                type_name: Arc::from(name.as_str()),
                variant: Arc::from(first.as_str()),
                index: 0,
            }),
            None => Value::Nil,
        },
        TypeData::Named { underlying, .. } => {
            Value::named(resolved, zero_at_depth(types, *underlying, depth + 1))
        }
        // Aliases were resolved above.
        TypeData::Alias { target, .. } => zero_at_depth(types, *target, depth + 1),
    }
}

/// Most specific type shared by all values: the common type, `float` for a
/// mix of ints and floats, `thing` otherwise.
pub(crate) fn common_type<'a>(types: &TypeRegistry, values: impl IntoIterator<Item = &'a Value>) -> Idx {
    let mut common: Option<Idx> = None;
    for value in values {
        let ty = types.resolve_alias(value.type_of());
        common = Some(match common {
            None => ty,
            Some(current) if current == ty => current,
            Some(current)
                if matches!(
                    (current, ty),
                    (Idx::INT, Idx::FLOAT) | (Idx::FLOAT, Idx::INT)
                ) =>
            {
                Idx::FLOAT
            }
            Some(_) => return Idx::ANY,
        });
    }
    match common {
        Some(ty) if !ty.is_none() && ty != Idx::TUPLE => ty,
        _ => Idx::ANY,
    }
}

/// Message for a value that does not fit its destination.
pub(crate) fn cannot_use(types: &TypeRegistry, value: &Value, target: Idx, context: &str) -> Value {
    Value::error(format!(
        "cannot use {value} (type {}) as type {} in {context}",
        value.type_name(types),
        types.display(target),
    ))
}

impl Interpreter {
    /// Resolve an annotation. Unknown names are hard errors.
    pub(crate) fn resolve_type(&self, expr: &TypeExpr) -> Result<Idx, EvalError> {
        let resolved = self.types.write().resolve_type_expr(expr);
        Ok(resolved?)
    }

    pub(crate) fn resolve_optional(&self, expr: Option<&TypeExpr>) -> Result<Option<Idx>, EvalError> {
        expr.map(|ty| self.resolve_type(ty)).transpose()
    }

    /// Value-aware assignability check against the shared registry.
    pub fn value_assignable(&self, value: &Value, target: Idx) -> bool {
        value_assignable(&self.types.read(), value, target)
    }

    pub fn promote(&self, value: Value, target: Idx) -> Value {
        promote(&self.types.read(), value, target)
    }

    /// Check and promote in one step; the error value describes the mismatch.
    pub(crate) fn coerce(&self, value: Value, target: Idx, context: &str) -> Result<Value, Value> {
        let types = self.types.read();
        if value_assignable(&types, &value, target) {
            Ok(promote(&types, value, target))
        } else {
            Err(cannot_use(&types, &value, target, context))
        }
    }

    pub(crate) fn zero_value(&self, ty: Idx) -> Value {
        zero_value(&self.types.read(), ty)
    }

    /// Type name of a value for messages.
    pub fn describe_type(&self, value: &Value) -> String {
        value.type_name(&self.types.read())
    }

    pub(crate) fn array_type(&self, elem: Idx) -> Idx {
        self.types.write().array(elem)
    }
}

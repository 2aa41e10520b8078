//! Deep value equality and hashable map keys.

use std::hash::{Hash, Hasher};

use super::{NamedValue, Value};

/// Equality was requested on a value kind that has none.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{kind} values are not comparable")]
pub struct NotComparable {
    pub kind: &'static str,
}

/// Deep equality over comparable values.
///
/// Int and Float compare numerically. Values of different kinds are simply
/// unequal; arrays, maps, tuples and functions are not comparable at all.
pub fn values_equal(a: &Value, b: &Value) -> Result<bool, NotComparable> {
    match (a, b) {
        (Value::Const(a), b) => values_equal(a, b),
        (a, Value::Const(b)) => values_equal(a, b),

        (
            Value::Array(_) | Value::Map(_) | Value::Tuple(_) | Value::Function(_),
            _,
        ) => Err(NotComparable {
            kind: a.kind_name(),
        }),
        (
            _,
            Value::Array(_) | Value::Map(_) | Value::Tuple(_) | Value::Function(_),
        ) => Err(NotComparable {
            kind: b.kind_name(),
        }),

        (Value::Int(x), Value::Int(y)) => Ok(x == y),
        #[allow(
            clippy::cast_precision_loss,
            reason = "mixed int/float comparison promotes the int"
        )]
        (Value::Int(x), Value::Float(y)) | (Value::Float(y), Value::Int(x)) => {
            Ok((*x as f64) == *y)
        }
        #[allow(clippy::float_cmp, reason = "language equality is exact")]
        (Value::Float(x), Value::Float(y)) => Ok(x == y),
        (Value::Str(x), Value::Str(y)) => Ok(x == y),
        (Value::Bool(x), Value::Bool(y)) => Ok(x == y),
        (Value::Nil, Value::Nil) => Ok(true),
        (Value::Error(x), Value::Error(y)) => Ok(x.message == y.message),
        (Value::Enum(x), Value::Enum(y)) => Ok(x.ty == y.ty && x.index == y.index),
        (Value::Named(x), Value::Named(y)) => {
            if x.ty != y.ty {
                return Ok(false);
            }
            values_equal(&x.inner, &y.inner)
        }
        (Value::Struct(x), Value::Struct(y)) => {
            let (xf, yf) = (x.fields(), y.fields());
            // Comparability is a property of the type: reject before
            // short-circuiting on a type or value difference.
            for (_, value) in xf.iter().chain(&yf) {
                if let Value::Array(_) | Value::Map(_) | Value::Function(_) | Value::Tuple(_) =
                    value
                {
                    return Err(NotComparable { kind: "struct" });
                }
            }
            if x.ty != y.ty || xf.len() != yf.len() {
                return Ok(false);
            }
            for ((_, a), (_, b)) in xf.iter().zip(&yf) {
                if !values_equal(a, b)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        _ => Ok(false),
    }
}

/// A comparable value usable as a map key.
#[derive(Clone, Debug)]
pub struct MapKey(Value);

impl MapKey {
    /// Wrap a value, rejecting kinds without equality.
    pub fn new(value: Value) -> Result<Self, NotComparable> {
        let value = value.unconst();
        // Probe comparability (also recurses into struct fields).
        values_equal(&value, &value)?;
        Ok(MapKey(value))
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl PartialEq for MapKey {
    fn eq(&self, other: &Self) -> bool {
        values_equal(&self.0, &other.0).unwrap_or(false)
    }
}

impl Eq for MapKey {}

impl Hash for MapKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_value(&self.0, state);
    }
}

fn hash_value<H: Hasher>(value: &Value, state: &mut H) {
    match value {
        Value::Int(n) => {
            0u8.hash(state);
            n.hash(state);
        }
        Value::Float(x) => {
            // Integral floats must hash like the equal int.
            #[allow(
                clippy::cast_possible_truncation,
                clippy::cast_precision_loss,
                reason = "round-trip check guards the conversion"
            )]
            let as_int = *x as i64;
            #[allow(clippy::cast_precision_loss, clippy::float_cmp, reason = "round-trip check")]
            let integral = x.fract() == 0.0 && (as_int as f64) == *x;
            if integral {
                0u8.hash(state);
                as_int.hash(state);
            } else {
                1u8.hash(state);
                x.to_bits().hash(state);
            }
        }
        Value::Str(s) => {
            2u8.hash(state);
            s.hash(state);
        }
        Value::Bool(b) => {
            3u8.hash(state);
            b.hash(state);
        }
        Value::Nil => 4u8.hash(state),
        Value::Error(e) => {
            5u8.hash(state);
            e.message.hash(state);
        }
        Value::Enum(e) => {
            6u8.hash(state);
            e.ty.hash(state);
            e.index.hash(state);
        }
        Value::Named(NamedValue { ty, inner }) => {
            7u8.hash(state);
            ty.hash(state);
            hash_value(inner, state);
        }
        Value::Struct(s) => {
            8u8.hash(state);
            s.ty.hash(state);
            for (_, field) in s.fields() {
                hash_value(&field, state);
            }
        }
        Value::Const(inner) => hash_value(inner, state),
        Value::Uninitialized
        | Value::Tuple(_)
        | Value::Array(_)
        | Value::Map(_)
        | Value::Function(_) => 9u8.hash(state),
    }
}

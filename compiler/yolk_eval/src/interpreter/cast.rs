//! Conversions written as calls: `int(x)`, `string(x)`, `Meters(x)`, `thing(x)`.
//!
//! A failed conversion is an error value, never a hard error.

use yolk_types::{Idx, TypeData, TypeRegistry};

use super::types::{promote, value_assignable};
use super::Interpreter;
use crate::value::Value;

impl Interpreter {
    /// Convert `value` to `target`.
    pub(crate) fn cast(&self, value: Value, target: Idx) -> Value {
        cast_value(&self.types.read(), value.unconst(), target)
    }
}

#[cold]
fn cannot_convert(types: &TypeRegistry, value: &Value, target: Idx) -> Value {
    Value::error(format!(
        "cannot convert {value} (type {}) to type {}",
        value.type_name(types),
        types.display(target),
    ))
}

fn cast_value(types: &TypeRegistry, value: Value, target: Idx) -> Value {
    let resolved = types.resolve_alias(target);
    match (value, resolved) {
        // `error(msg)` builds an error; every other conversion propagates one.
        (err @ Value::Error(_), _) => err,
        (value, Idx::ERROR) => match value {
            Value::Nil => Value::Nil,
            other => Value::error(other.unerase().to_string()),
        },
        (value, Idx::ANY) => value.erase(),
        // Conversions are explicit, so they look through `thing`.
        (value, _) if value.as_erased().is_some() => cast_value(types, value.unerase(), target),
        (value, _) => convert(types, value, target, resolved),
    }
}

fn convert(types: &TypeRegistry, value: Value, target: Idx, resolved: Idx) -> Value {
    let Some(data) = types.get(resolved) else {
        return cannot_convert(types, &value, target);
    };
    match data {
        TypeData::Int => to_int(types, strip_named(value), target),
        TypeData::Float => to_float(types, strip_named(value), target),
        TypeData::Str => Value::string(value.to_string()),
        TypeData::Bool => to_bool(types, strip_named(value), target),
        TypeData::Enum { name, variants } => {
            if matches!(&value, Value::Enum(e) if e.ty == resolved) {
                return value;
            }
            let index = match &value {
                Value::Int(n) => usize::try_from(*n).ok().filter(|i| *i < variants.len()),
                Value::Str(s) => variants.iter().position(|v| v == &**s),
                _ => None,
            };
            match index {
                Some(index) => Value::Enum(crate::value::EnumValue {
                    ty: resolved,
                    type_name: name.as_str().into(),
                    variant: variants[index].as_str().into(),
                    index,
                }),
                None => cannot_convert(types, &value, target),
            }
        }
        TypeData::Named { underlying, .. } => {
            let converted = cast_value(types, strip_named(value), *underlying);
            if converted.is_error() {
                converted
            } else {
                Value::named(resolved, converted)
            }
        }
        _ if value_assignable(types, &value, resolved) => promote(types, value, target),
        _ => cannot_convert(types, &value, target),
    }
}

/// Drop a user named-type wrapper (`Meters(3)` converts like `3`).
fn strip_named(value: Value) -> Value {
    match value {
        Value::Named(named) if named.ty != Idx::ANY => strip_named(*named.inner),
        other => other,
    }
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "float to int conversion truncates toward zero"
)]
fn to_int(types: &TypeRegistry, value: Value, target: Idx) -> Value {
    match value {
        Value::Int(_) => value,
        Value::Float(f) if f.is_finite() && f.abs() < 9.2e18 => Value::Int(f.trunc() as i64),
        Value::Bool(b) => Value::Int(i64::from(b)),
        Value::Str(ref s) => {
            let trimmed = s.trim();
            if let Ok(n) = trimmed.parse::<i64>() {
                return Value::Int(n);
            }
            match trimmed.parse::<f64>() {
                Ok(f) if f.is_finite() && f.abs() < 9.2e18 => Value::Int(f.trunc() as i64),
                _ => cannot_convert(types, &value, target),
            }
        }
        other => cannot_convert(types, &other, target),
    }
}

#[allow(clippy::cast_precision_loss, reason = "int to float conversion")]
fn to_float(types: &TypeRegistry, value: Value, target: Idx) -> Value {
    match value {
        Value::Float(_) => value,
        Value::Int(n) => Value::Float(n as f64),
        Value::Bool(b) => Value::Float(if b { 1.0 } else { 0.0 }),
        Value::Str(ref s) => match s.trim().parse::<f64>() {
            Ok(f) => Value::Float(f),
            Err(_) => cannot_convert(types, &value, target),
        },
        other => cannot_convert(types, &other, target),
    }
}

fn to_bool(types: &TypeRegistry, value: Value, target: Idx) -> Value {
    match value {
        Value::Bool(_) => value,
        Value::Int(n) => Value::Bool(n != 0),
        Value::Str(ref s) => match s.trim() {
            "yes" | "true" => Value::Bool(true),
            "no" | "false" => Value::Bool(false),
            _ => cannot_convert(types, &value, target),
        },
        other => cannot_convert(types, &other, target),
    }
}

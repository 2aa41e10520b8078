//! Array and map builtins, plus `len` and `typeof`.
//!
//! Arrays and maps are shared cells, so mutation is visible through every
//! handle: `push(xs, 1)` changes the array bound to `xs`. Applied to a
//! fresh literal, only the return value shows the change.

use yolk_types::Idx;

use super::{first_error, integer, invalid_argument, Arity, BuiltinRegistry, CallSite};
use crate::errors::EvalError;
use crate::interpreter::Interpreter;
use crate::value::{ArrayValue, CellId, CyclicStore, FrozenCell, MapKey, MapValue, Value};

pub(super) fn register(registry: &mut BuiltinRegistry) {
    registry.register("len", Arity::Fixed(1), len);
    registry.register("push", Arity::Variadic { min: 2 }, push);
    registry.register("pop", Arity::Fixed(1), pop);
    registry.register("insert", Arity::Fixed(3), insert);
    registry.register("remove", Arity::Fixed(2), remove);
    registry.register("clear", Arity::Fixed(1), clear);
    registry.register("keys", Arity::Fixed(1), keys);
    registry.register("values", Arity::Fixed(1), values);
    registry.register("typeof", Arity::Fixed(1), type_of);
}

type BuiltinResult = Result<Value, EvalError>;

#[cold]
fn frozen(err: FrozenCell) -> Value {
    Value::error(err.to_string())
}

/// Error value when storing `value` into the cell `into` would make the
/// cell reach itself.
fn cyclic(value: &Value, into: CellId) -> Option<Value> {
    value
        .contains_cell(into)
        .then(|| Value::error(CyclicStore.to_string()))
}

fn int_value(n: usize) -> Value {
    Value::Int(i64::try_from(n).unwrap_or(i64::MAX))
}

fn elem_type(interp: &Interpreter, array: &ArrayValue) -> Idx {
    interp.types.read().array_elem(array.ty).unwrap_or(Idx::ANY)
}

fn entry_types(interp: &Interpreter, map: &MapValue) -> (Idx, Idx) {
    interp
        .types
        .read()
        .map_types(map.ty)
        .unwrap_or((Idx::ANY, Idx::ANY))
}

/// Key for a map whose key type is `key_ty`. Keys of `thing` maps stay
/// concrete, the same way map literals store them.
fn map_key(interp: &Interpreter, key: Value, key_ty: Idx, context: &str) -> Result<MapKey, Value> {
    let key = key.unerase();
    let key = if key_ty == Idx::ANY {
        key
    } else {
        interp.coerce(key, key_ty, context)?
    };
    MapKey::new(key).map_err(|err| Value::error(format!("invalid map key: {err}")))
}

fn len(interp: &mut Interpreter, site: &CallSite, args: Vec<Value>) -> BuiltinResult {
    if let Some(err) = first_error(&args) {
        return Ok(err);
    }
    Ok(match args.first().map(|arg| arg.clone().unerase()) {
        Some(Value::Array(array)) => int_value(array.len()),
        Some(Value::Map(map)) => int_value(map.len()),
        Some(Value::Str(s)) => int_value(s.chars().count()),
        Some(Value::Tuple(items)) => int_value(items.len()),
        Some(other) => invalid_argument(interp, site, &other),
        None => Value::Nil,
    })
}

/// `push(xs, v...)`: append, returning the array.
fn push(interp: &mut Interpreter, site: &CallSite, args: Vec<Value>) -> BuiltinResult {
    if let Some(err) = first_error(&args) {
        return Ok(err);
    }
    let mut args = args.into_iter();
    let Some(Value::Array(array)) = args.next().map(Value::unerase) else {
        return Ok(Value::error("push: first argument must be an array"));
    };
    let elem = elem_type(interp, &array);
    let mut items = Vec::with_capacity(args.len());
    for value in args {
        match interp.coerce(value, elem, site.name) {
            Ok(value) => items.push(value),
            Err(err) => return Ok(err),
        }
    }
    if let Some(err) = items.iter().find_map(|item| cyclic(item, array.id())) {
        return Ok(err);
    }
    match array.write() {
        Ok(mut cell) => cell.extend(items),
        Err(err) => return Ok(frozen(err)),
    }
    Ok(Value::Array(array))
}

/// `pop(xs)`: remove and return the last element.
fn pop(interp: &mut Interpreter, site: &CallSite, args: Vec<Value>) -> BuiltinResult {
    if let Some(err) = first_error(&args) {
        return Ok(err);
    }
    let Some(Value::Array(array)) = args.into_iter().next().map(Value::unerase) else {
        return Ok(Value::error("pop: argument must be an array"));
    };
    let popped = match array.write() {
        Ok(mut cell) => cell.pop(),
        Err(err) => return Ok(frozen(err)),
    };
    Ok(match popped {
        Some(value) => interp.promote(value, elem_type(interp, &array)),
        None => Value::error(format!("{}: array is empty", site.name)),
    })
}

/// `insert(m, key, value)` on maps, `insert(xs, index, value)` on arrays.
/// Returns the collection.
fn insert(interp: &mut Interpreter, site: &CallSite, args: Vec<Value>) -> BuiltinResult {
    if let Some(err) = first_error(&args) {
        return Ok(err);
    }
    let mut args = args.into_iter();
    let (Some(collection), Some(at), Some(value)) = (args.next(), args.next(), args.next()) else {
        return Ok(Value::Nil);
    };
    match collection.unerase() {
        Value::Map(map) => {
            let (key_ty, value_ty) = entry_types(interp, &map);
            let key = match map_key(interp, at, key_ty, site.name) {
                Ok(key) => key,
                Err(err) => return Ok(err),
            };
            let value = match interp.coerce(value, value_ty, site.name) {
                Ok(value) => value,
                Err(err) => return Ok(err),
            };
            if let Some(err) = cyclic(&value, map.id()) {
                return Ok(err);
            }
            match map.write() {
                Ok(mut cell) => {
                    cell.insert(key, value);
                }
                Err(err) => return Ok(frozen(err)),
            }
            Ok(Value::Map(map))
        }
        Value::Array(array) => {
            let Some(index) = integer(&at) else {
                return Ok(invalid_argument(interp, site, &at));
            };
            let value = match interp.coerce(value, elem_type(interp, &array), site.name) {
                Ok(value) => value,
                Err(err) => return Ok(err),
            };
            if let Some(err) = cyclic(&value, array.id()) {
                return Ok(err);
            }
            match array.write() {
                Ok(mut cell) => match usize::try_from(index).ok().filter(|i| *i <= cell.len()) {
                    Some(i) => cell.insert(i, value),
                    None => {
                        return Ok(Value::error(format!(
                            "index out of range [{index}] with length {}",
                            cell.len()
                        )))
                    }
                },
                Err(err) => return Ok(frozen(err)),
            }
            Ok(Value::Array(array))
        }
        other => Ok(invalid_argument(interp, site, &other)),
    }
}

/// `remove(m, key)` or `remove(xs, index)`: remove and return the entry.
fn remove(interp: &mut Interpreter, site: &CallSite, args: Vec<Value>) -> BuiltinResult {
    if let Some(err) = first_error(&args) {
        return Ok(err);
    }
    let mut args = args.into_iter();
    let (Some(collection), Some(at)) = (args.next(), args.next()) else {
        return Ok(Value::Nil);
    };
    match collection.unerase() {
        Value::Map(map) => {
            let (key_ty, value_ty) = entry_types(interp, &map);
            let key = match map_key(interp, at, key_ty, site.name) {
                Ok(key) => key,
                Err(err) => return Ok(err),
            };
            let removed = match map.write() {
                Ok(mut cell) => cell.remove(&key),
                Err(err) => return Ok(frozen(err)),
            };
            Ok(match removed {
                Some(value) => interp.promote(value, value_ty),
                None => Value::error(format!("key {} not found in map", key.value())),
            })
        }
        Value::Array(array) => {
            let Some(index) = integer(&at) else {
                return Ok(invalid_argument(interp, site, &at));
            };
            let removed = match array.write() {
                Ok(mut cell) => match usize::try_from(index).ok().filter(|i| *i < cell.len()) {
                    Some(i) => Ok(cell.remove(i)),
                    None => Err(cell.len()),
                },
                Err(err) => return Ok(frozen(err)),
            };
            Ok(match removed {
                Ok(value) => interp.promote(value, elem_type(interp, &array)),
                Err(len) => Value::error(format!("index out of range [{index}] with length {len}")),
            })
        }
        other => Ok(invalid_argument(interp, site, &other)),
    }
}

/// `clear(c)`: empty an array or map, returning it.
fn clear(interp: &mut Interpreter, site: &CallSite, args: Vec<Value>) -> BuiltinResult {
    if let Some(err) = first_error(&args) {
        return Ok(err);
    }
    Ok(match args.into_iter().next().map(Value::unerase) {
        Some(Value::Array(array)) => {
            let cleared = array.write().map(|mut cell| cell.clear());
            match cleared {
                Ok(()) => Value::Array(array),
                Err(err) => frozen(err),
            }
        }
        Some(Value::Map(map)) => {
            let cleared = map.write().map(|mut cell| cell.clear());
            match cleared {
                Ok(()) => Value::Map(map),
                Err(err) => frozen(err),
            }
        }
        Some(other) => invalid_argument(interp, site, &other),
        None => Value::Nil,
    })
}

/// Keys in the order maps are printed.
fn keys(interp: &mut Interpreter, site: &CallSite, args: Vec<Value>) -> BuiltinResult {
    if let Some(err) = first_error(&args) {
        return Ok(err);
    }
    let map = match args.into_iter().next().map(Value::unerase) {
        Some(Value::Map(map)) => map,
        Some(other) => return Ok(invalid_argument(interp, site, &other)),
        None => return Ok(Value::Nil),
    };
    let (key_ty, _) = entry_types(interp, &map);
    let items = map
        .sorted_entries()
        .into_iter()
        .map(|(key, _)| interp.promote(key.into_value(), key_ty))
        .collect();
    let ty = interp.array_type(key_ty);
    Ok(Value::array(items, ty))
}

/// Values ordered by their keys.
fn values(interp: &mut Interpreter, site: &CallSite, args: Vec<Value>) -> BuiltinResult {
    if let Some(err) = first_error(&args) {
        return Ok(err);
    }
    let map = match args.into_iter().next().map(Value::unerase) {
        Some(Value::Map(map)) => map,
        Some(other) => return Ok(invalid_argument(interp, site, &other)),
        None => return Ok(Value::Nil),
    };
    let (_, value_ty) = entry_types(interp, &map);
    let items = map
        .sorted_entries()
        .into_iter()
        .map(|(_, value)| interp.promote(value, value_ty))
        .collect();
    let ty = interp.array_type(value_ty);
    Ok(Value::array(items, ty))
}

/// `typeof(x)`: the type name as a string. Error values are not raised.
fn type_of(interp: &mut Interpreter, _site: &CallSite, args: Vec<Value>) -> BuiltinResult {
    Ok(match args.first() {
        Some(value) => Value::string(interp.describe_type(value)),
        None => Value::Nil,
    })
}

//! Binary operator implementations.
//!
//! Direct enum dispatch over the operand kinds. Every failure here is an
//! error *value*: the caller decides whether it raises. Short-circuit `&&`
//! and `||` are handled by the evaluator before operands reach this module.
//!
//! Rules, applied in order:
//! 1. an `Error` operand propagates (except `==`/`!=`, which compare)
//! 2. `nil` supports only `==`/`!=`
//! 3. an erased `thing` operand is rejected
//! 4. named operands must share a type; the result of arithmetic is re-wrapped
//! 5. int/float mixes promote the int
//! 6. otherwise operand kinds must match

use yolk_ir::BinaryOp;
use yolk_types::TypeRegistry;

use crate::value::{values_equal, NamedValue, Value};

#[cold]
fn division_by_zero() -> Value {
    Value::error("division by zero")
}

#[cold]
fn modulo_by_zero() -> Value {
    Value::error("modulo by zero")
}

#[cold]
fn integer_overflow(operation: &str) -> Value {
    Value::error(format!("integer overflow in {operation}"))
}

#[cold]
fn not_defined(op: BinaryOp, operand: &str) -> Value {
    Value::error(format!(
        "invalid operation: operator {op} not defined on {operand}"
    ))
}

#[cold]
fn mismatched(op: BinaryOp, left: &Value, right: &Value, types: &TypeRegistry) -> Value {
    Value::error(format!(
        "invalid operation: {left} {op} {right} (mismatched types {} and {})",
        left.type_name(types),
        right.type_name(types),
    ))
}

#[inline]
fn checked_int(result: Option<i64>, operation: &str) -> Value {
    result.map_or_else(|| integer_overflow(operation), Value::Int)
}

/// Evaluate `left op right`.
#[allow(
    clippy::needless_pass_by_value,
    clippy::cast_precision_loss,
    reason = "operands are consumed by named re-wrapping; mixed int operands promote to float"
)]
pub fn evaluate_binary(left: Value, right: Value, op: BinaryOp, types: &TypeRegistry) -> Value {
    let left = left.unconst();
    let right = right.unconst();

    // 1. Errors
    if left.is_error() || right.is_error() {
        let both_equal = match (&left, &right) {
            (Value::Error(a), Value::Error(b)) => Some(a.message == b.message),
            _ => None,
        };
        match op {
            BinaryOp::Eq => return Value::Bool(both_equal.unwrap_or(false)),
            BinaryOp::NotEq => return Value::Bool(!both_equal.unwrap_or(false)),
            _ => {}
        }
        return if left.is_error() { left } else { right };
    }

    // 2. Nil
    if matches!(left, Value::Nil) || matches!(right, Value::Nil) {
        let both = matches!((&left, &right), (Value::Nil, Value::Nil));
        return match op {
            BinaryOp::Eq => Value::Bool(both),
            BinaryOp::NotEq => Value::Bool(!both),
            _ => not_defined(op, "nil"),
        };
    }

    // 3. Erased things
    if left.as_erased().is_some() || right.as_erased().is_some() {
        return Value::error(format!(
            "invalid operation: operator {op} not defined on thing (assert a concrete type first)"
        ));
    }

    match (left, right) {
        // 4. Named
        (Value::Named(a), Value::Named(b)) => eval_named_binary(a, b, op, types),
        (l @ Value::Named(_), r) | (l, r @ Value::Named(_)) => mismatched(op, &l, &r, types),

        // 5./6. Same-kind scalars
        (Value::Int(a), Value::Int(b)) => eval_int_binary(a, b, op),
        (Value::Int(a), Value::Float(b)) => eval_float_binary(a as f64, b, op),
        (Value::Float(a), Value::Int(b)) => eval_float_binary(a, b as f64, op),
        (Value::Float(a), Value::Float(b)) => eval_float_binary(a, b, op),
        (Value::Str(a), Value::Str(b)) => eval_string_binary(&a, &b, op),
        (Value::Bool(a), Value::Bool(b)) => eval_bool_binary(a, b, op),
        (l @ Value::Enum(_), r @ Value::Enum(_)) if l.type_of() == r.type_of() => {
            eval_equality(&l, &r, op)
        }
        (l @ Value::Struct(_), r @ Value::Struct(_)) if l.type_of() == r.type_of() => {
            eval_equality(&l, &r, op)
        }
        (l, r) if std::mem::discriminant(&l) == std::mem::discriminant(&r)
            && l.type_of() == r.type_of() =>
        {
            // Same kind, but no operators at all (arrays, maps, functions, tuples).
            not_defined(op, &l.type_name(types))
        }
        (l, r) => mismatched(op, &l, &r, types),
    }
}

fn eval_named_binary(a: NamedValue, b: NamedValue, op: BinaryOp, types: &TypeRegistry) -> Value {
    if a.ty != b.ty {
        return mismatched(op, &Value::Named(a), &Value::Named(b), types);
    }
    let ty = a.ty;
    let result = evaluate_binary(*a.inner, *b.inner, op, types);
    let arithmetic = matches!(
        op,
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod
    );
    if arithmetic && !result.is_error() {
        Value::named(ty, result)
    } else {
        result
    }
}

/// Integer operations. `/` always produces a float.
#[allow(clippy::cast_precision_loss, reason = "int division yields float")]
fn eval_int_binary(a: i64, b: i64, op: BinaryOp) -> Value {
    match op {
        BinaryOp::Add => checked_int(a.checked_add(b), "addition"),
        BinaryOp::Sub => checked_int(a.checked_sub(b), "subtraction"),
        BinaryOp::Mul => checked_int(a.checked_mul(b), "multiplication"),
        BinaryOp::Div => {
            if b == 0 {
                division_by_zero()
            } else {
                Value::Float(a as f64 / b as f64)
            }
        }
        BinaryOp::Mod => {
            if b == 0 {
                modulo_by_zero()
            } else {
                checked_int(a.checked_rem(b), "remainder")
            }
        }
        BinaryOp::Eq => Value::Bool(a == b),
        BinaryOp::NotEq => Value::Bool(a != b),
        BinaryOp::Lt => Value::Bool(a < b),
        BinaryOp::LtEq => Value::Bool(a <= b),
        BinaryOp::Gt => Value::Bool(a > b),
        BinaryOp::GtEq => Value::Bool(a >= b),
        BinaryOp::And | BinaryOp::Or => not_defined(op, "int"),
    }
}

#[allow(clippy::float_cmp, reason = "language equality is exact")]
fn eval_float_binary(a: f64, b: f64, op: BinaryOp) -> Value {
    match op {
        BinaryOp::Add => Value::Float(a + b),
        BinaryOp::Sub => Value::Float(a - b),
        BinaryOp::Mul => Value::Float(a * b),
        BinaryOp::Div => {
            if b == 0.0 {
                division_by_zero()
            } else {
                Value::Float(a / b)
            }
        }
        BinaryOp::Eq => Value::Bool(a == b),
        BinaryOp::NotEq => Value::Bool(a != b),
        BinaryOp::Lt => Value::Bool(a < b),
        BinaryOp::LtEq => Value::Bool(a <= b),
        BinaryOp::Gt => Value::Bool(a > b),
        BinaryOp::GtEq => Value::Bool(a >= b),
        BinaryOp::Mod | BinaryOp::And | BinaryOp::Or => not_defined(op, "float"),
    }
}

fn eval_string_binary(a: &str, b: &str, op: BinaryOp) -> Value {
    match op {
        BinaryOp::Add => {
            let mut out = String::with_capacity(a.len() + b.len());
            out.push_str(a);
            out.push_str(b);
            Value::string(out)
        }
        BinaryOp::Eq => Value::Bool(a == b),
        BinaryOp::NotEq => Value::Bool(a != b),
        BinaryOp::Lt => Value::Bool(a < b),
        BinaryOp::LtEq => Value::Bool(a <= b),
        BinaryOp::Gt => Value::Bool(a > b),
        BinaryOp::GtEq => Value::Bool(a >= b),
        _ => not_defined(op, "string"),
    }
}

fn eval_bool_binary(a: bool, b: bool, op: BinaryOp) -> Value {
    match op {
        BinaryOp::Eq => Value::Bool(a == b),
        BinaryOp::NotEq => Value::Bool(a != b),
        BinaryOp::And => Value::Bool(a && b),
        BinaryOp::Or => Value::Bool(a || b),
        _ => not_defined(op, "bool"),
    }
}

/// Enums and structs only support (deep) equality.
fn eval_equality(left: &Value, right: &Value, op: BinaryOp) -> Value {
    let equal = match values_equal(left, right) {
        Ok(equal) => equal,
        Err(err) => return Value::error(format!("invalid operation: {err}")),
    };
    match op {
        BinaryOp::Eq => Value::Bool(equal),
        BinaryOp::NotEq => Value::Bool(!equal),
        _ => not_defined(op, left.kind_name()),
    }
}

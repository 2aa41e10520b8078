//! Unary operator implementations.

use yolk_ir::UnaryOp;

use crate::errors::{non_bool_operand, EvalError};
use crate::value::{NamedValue, Value};

/// Evaluate a prefix operator.
///
/// `!` on anything but a bool is a hard error; `-` failures are error values.
pub fn evaluate_unary(operand: Value, op: UnaryOp) -> Result<Value, EvalError> {
    let operand = operand.unconst();
    if operand.is_error() {
        return Ok(operand);
    }
    match op {
        UnaryOp::Not => match operand {
            Value::Bool(b) => Ok(Value::Bool(!b)),
            other => Err(non_bool_operand("!", other.kind_name())),
        },
        UnaryOp::Neg => Ok(negate(operand)),
    }
}

fn negate(operand: Value) -> Value {
    match operand {
        Value::Int(n) => n
            .checked_neg()
            .map_or_else(|| Value::error("integer overflow in negation"), Value::Int),
        Value::Float(x) => Value::Float(-x),
        Value::Named(NamedValue { ty, inner }) if operand_is_numeric(&inner) => {
            let result = negate(*inner);
            if result.is_error() {
                result
            } else {
                Value::named(ty, result)
            }
        }
        other => Value::error(format!(
            "invalid operation: operator - not defined on {}",
            other.kind_name()
        )),
    }
}

fn operand_is_numeric(value: &Value) -> bool {
    matches!(value, Value::Int(_) | Value::Float(_))
}

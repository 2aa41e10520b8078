use std::time::Duration;

use super::{first_error, invalid_argument, number, Arity, BuiltinRegistry, CallSite};
use crate::errors::EvalError;
use crate::interpreter::Interpreter;
use crate::value::Value;

pub(super) fn register(registry: &mut BuiltinRegistry) {
    registry.register("sleep", Arity::Fixed(1), sleep);
}

/// `sleep(ms)`. Blocks only the calling task; negative durations return at once.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "milliseconds are clamped to a non-negative finite value first"
)]
fn sleep(interp: &mut Interpreter, site: &CallSite, args: Vec<Value>) -> Result<Value, EvalError> {
    if let Some(err) = first_error(&args) {
        return Ok(err);
    }
    let Some(ms) = args.first().and_then(number).filter(|ms| ms.is_finite()) else {
        return Ok(args
            .first()
            .map_or(Value::Nil, |arg| invalid_argument(interp, site, arg)));
    };
    let ms = ms.max(0.0);
    std::thread::sleep(Duration::from_micros((ms * 1000.0) as u64));
    Ok(Value::Nil)
}

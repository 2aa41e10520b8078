//! `randInt` and `randFloat`.
//!
//! With no arguments `randInt` gives 0 or 1 and `randFloat` a value in
//! `[0, 1)`. One argument is an inclusive upper bound from 0, two an
//! inclusive range. Reversed bounds are swapped.

use rand::Rng;

use super::{first_error, integer, invalid_argument, number, Arity, BuiltinRegistry, CallSite};
use crate::errors::EvalError;
use crate::interpreter::Interpreter;
use crate::value::Value;

pub(super) fn register(registry: &mut BuiltinRegistry) {
    registry.register("randInt", Arity::Range { min: 0, max: 2 }, rand_int);
    registry.register("randFloat", Arity::Range { min: 0, max: 2 }, rand_float);
}

fn ordered<T: PartialOrd>(a: T, b: T) -> (T, T) {
    if a > b {
        (b, a)
    } else {
        (a, b)
    }
}

/// Uniform float in `[low, high]`. Bounds whose distance overflows `f64`
/// are interpolated instead, since `gen_range` rejects an infinite span.
pub(super) fn float_between(rng: &mut impl Rng, low: f64, high: f64) -> f64 {
    if (high - low).is_finite() {
        rng.gen_range(low..=high)
    } else {
        let t: f64 = rng.gen();
        (low * (1.0 - t) + high * t).clamp(low, high)
    }
}

fn rand_int(interp: &mut Interpreter, site: &CallSite, args: Vec<Value>) -> Result<Value, EvalError> {
    if let Some(err) = first_error(&args) {
        return Ok(err);
    }
    let mut bounds = Vec::with_capacity(args.len());
    for arg in &args {
        match integer(arg) {
            Some(n) => bounds.push(n),
            None => return Ok(invalid_argument(interp, site, arg)),
        }
    }
    let (low, high) = match bounds.as_slice() {
        [] => (0, 1),
        [max] => ordered(0, *max),
        [min, max, ..] => ordered(*min, *max),
    };
    Ok(Value::Int(rand::thread_rng().gen_range(low..=high)))
}

fn rand_float(interp: &mut Interpreter, site: &CallSite, args: Vec<Value>) -> Result<Value, EvalError> {
    if let Some(err) = first_error(&args) {
        return Ok(err);
    }
    let mut bounds = Vec::with_capacity(args.len());
    for arg in &args {
        match number(arg).filter(|f| f.is_finite()) {
            Some(f) => bounds.push(f),
            None => return Ok(invalid_argument(interp, site, arg)),
        }
    }
    let mut rng = rand::thread_rng();
    let value = match bounds.as_slice() {
        [] => rng.gen::<f64>(),
        [max] => {
            let (low, high) = ordered(0.0, *max);
            float_between(&mut rng, low, high)
        }
        [min, max, ..] => {
            let (low, high) = ordered(*min, *max);
            float_between(&mut rng, low, high)
        }
    };
    Ok(Value::Float(value))
}

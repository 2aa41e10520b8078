use super::{first_error, invalid_argument, number, Arity, BuiltinRegistry, CallSite};
use crate::errors::EvalError;
use crate::interpreter::Interpreter;
use crate::value::Value;

pub(super) fn register(registry: &mut BuiltinRegistry) {
    registry.register("sin", Arity::Fixed(1), sin);
    registry.register("cos", Arity::Fixed(1), cos);
    registry.register("tan", Arity::Fixed(1), tan);
    registry.register("sqrt", Arity::Fixed(1), sqrt);
}

/// Apply `f` to a single int or float argument.
fn unary(
    interp: &Interpreter,
    site: &CallSite,
    args: &[Value],
    f: fn(f64) -> f64,
) -> Value {
    if let Some(err) = first_error(args) {
        return err;
    }
    match args.first() {
        Some(arg) => match number(arg) {
            Some(x) => Value::Float(f(x)),
            None => invalid_argument(interp, site, arg),
        },
        None => Value::Nil,
    }
}

fn sin(interp: &mut Interpreter, site: &CallSite, args: Vec<Value>) -> Result<Value, EvalError> {
    Ok(unary(interp, site, &args, f64::sin))
}

fn cos(interp: &mut Interpreter, site: &CallSite, args: Vec<Value>) -> Result<Value, EvalError> {
    Ok(unary(interp, site, &args, f64::cos))
}

fn tan(interp: &mut Interpreter, site: &CallSite, args: Vec<Value>) -> Result<Value, EvalError> {
    Ok(unary(interp, site, &args, f64::tan))
}

fn sqrt(interp: &mut Interpreter, site: &CallSite, args: Vec<Value>) -> Result<Value, EvalError> {
    if args.first().and_then(number).is_some_and(|x| x < 0.0) {
        return Ok(Value::error("sqrt of negative number"));
    }
    Ok(unary(interp, site, &args, f64::sqrt))
}

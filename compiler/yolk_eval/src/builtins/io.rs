//! `print`, `println`, `input` and `key`.

use super::{first_error, Arity, BuiltinRegistry, CallSite};
use crate::errors::EvalError;
use crate::interpreter::Interpreter;
use crate::value::Value;

pub(super) fn register(registry: &mut BuiltinRegistry) {
    registry.register("print", Arity::Variadic { min: 0 }, print);
    registry.register("println", Arity::Variadic { min: 0 }, println);
    registry.register("input", Arity::Range { min: 0, max: 1 }, input);
    registry.register("key", Arity::Fixed(0), key);
}

/// Arguments rendered and joined by single spaces. Error values print
/// their message.
fn join(args: &[Value]) -> String {
    args.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

fn print(interp: &mut Interpreter, _site: &CallSite, args: Vec<Value>) -> Result<Value, EvalError> {
    interp.print_handler().print(&join(&args));
    Ok(Value::Nil)
}

fn println(interp: &mut Interpreter, _site: &CallSite, args: Vec<Value>) -> Result<Value, EvalError> {
    interp.print_handler().println(&join(&args));
    Ok(Value::Nil)
}

/// `input()` or `input(prompt)`: one line, without its terminator.
fn input(interp: &mut Interpreter, _site: &CallSite, args: Vec<Value>) -> Result<Value, EvalError> {
    if let Some(err) = first_error(&args) {
        return Ok(err);
    }
    if let Some(prompt) = args.first() {
        interp.print_handler().print(&prompt.to_string());
    }
    Ok(match interp.input_handler().read_line() {
        Some(line) => Value::string(line),
        None => Value::error("input: end of input"),
    })
}

/// `key()`: a single character as a one-character string.
fn key(interp: &mut Interpreter, _site: &CallSite, _args: Vec<Value>) -> Result<Value, EvalError> {
    Ok(match interp.input_handler().read_key() {
        Some(c) => Value::string(c.to_string()),
        None => Value::error("key: end of input"),
    })
}

//! Host functions callable by name from Yolk programs.
//!
//! A builtin receives the interpreter, its call site and the evaluated
//! arguments. A single tuple argument is spread before the arity check, so
//! `println(divmod(7, 2))` prints both results. Builtins receive error
//! values like any other argument; most of them return the first one
//! unchanged.

mod collections;
mod io;
mod math;
mod random;
mod time;

use std::fmt;

use rustc_hash::FxHashMap;
use yolk_ir::Span;

use crate::errors::{arity_mismatch, EvalError};
use crate::interpreter::Interpreter;
use crate::value::Value;

/// Signature of every builtin.
pub type BuiltinFn = fn(&mut Interpreter, &CallSite, Vec<Value>) -> Result<Value, EvalError>;

/// Accepted argument counts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arity {
    Fixed(usize),
    Variadic { min: usize },
    /// Between `min` and `max` arguments, inclusive.
    Range { min: usize, max: usize },
}

impl Arity {
    /// Arity mismatches are hard errors.
    pub fn check(self, name: &str, got: usize) -> Result<(), EvalError> {
        let ok = match self {
            Arity::Fixed(n) => got == n,
            Arity::Variadic { min } => got >= min,
            Arity::Range { min, max } => (min..=max).contains(&got),
        };
        if ok {
            Ok(())
        } else {
            Err(arity_mismatch(name, self, got))
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Fixed(n) => write!(f, "{n}"),
            Arity::Variadic { min } => write!(f, "at least {min}"),
            Arity::Range { min, max } => write!(f, "{min} to {max}"),
        }
    }
}

/// Where a builtin was called from.
#[derive(Clone, Copy, Debug)]
pub struct CallSite {
    pub name: &'static str,
    pub span: Span,
}

#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub arity: Arity,
    pub func: BuiltinFn,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builtin")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// Name-keyed builtin table. Fixed once the interpreter is built.
#[derive(Clone, Debug, Default)]
pub struct BuiltinRegistry {
    entries: FxHashMap<&'static str, Builtin>,
}

impl BuiltinRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Output, input, sleep, random numbers, trigonometry and collections.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        io::register(&mut registry);
        time::register(&mut registry);
        random::register(&mut registry);
        math::register(&mut registry);
        collections::register(&mut registry);
        registry
    }

    /// Add a builtin, replacing one with the same name.
    pub fn register(&mut self, name: &'static str, arity: Arity, func: BuiltinFn) {
        self.entries.insert(name, Builtin { name, arity, func });
    }

    pub fn get(&self, name: &str) -> Option<&Builtin> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.entries.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

/// The first error among the arguments, if any.
fn first_error(args: &[Value]) -> Option<Value> {
    args.iter().find(|arg| arg.is_error()).cloned()
}

/// A value that does not fit the builtin.
#[cold]
fn invalid_argument(interp: &Interpreter, site: &CallSite, value: &Value) -> Value {
    Value::error(format!(
        "invalid argument {value} (type {}) for {}",
        interp.describe_type(value),
        site.name
    ))
}

/// Numeric argument as `f64`. Named numeric types and `thing`s are looked
/// through.
#[allow(clippy::cast_precision_loss, reason = "int to float conversion")]
fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Int(n) => Some(*n as f64),
        Value::Float(f) => Some(*f),
        Value::Named(named) => number(&named.inner),
        Value::Const(inner) => number(inner),
        _ => None,
    }
}

/// Integer argument. Named types and `thing`s are looked through.
fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Int(n) => Some(*n),
        Value::Named(named) => integer(&named.inner),
        Value::Const(inner) => integer(inner),
        _ => None,
    }
}

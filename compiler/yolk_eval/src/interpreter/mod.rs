//! Tree-walking interpreter for Yolk.
//!
//! # Architecture
//!
//! Statements evaluate to a [`Flow`], expressions to a [`Value`]. Both return
//! through `Result<_, EvalError>`, where `Err` is a hard error that aborts the
//! program. Error *values* travel inside `Ok` and become [`Flow::Raised`] when
//! they reach statement level.
//!
//! - `stmt` - statement dispatch, loops, declarations, assignment
//! - `expr` - literals, access, operators, type assertions
//! - `call` - call resolution, user calls, defers, return validation
//! - `cast` - `T(x)` conversions
//! - `types` - zero values, assignability of values, promotion
//! - `spawn` - task launching and the host-side [`TaskGroup`]
//!
//! # Sharing between tasks
//!
//! Every spawned task runs on a fork of the interpreter: registries, handlers
//! and the task group are shared handles, the call stack is per task. The
//! scope chain itself is shared through [`Environment`] handles.

/// Evaluate an expression inside a statement; an error value raises.
macro_rules! eval_or_raise {
    ($interp:expr, $expr:expr, $env:expr) => {
        match $interp.eval_expr($expr, $env)? {
            $crate::value::Value::Error(err) => {
                return Ok($crate::interpreter::Flow::Raised(err));
            }
            value => value,
        }
    };
}

/// Evaluate an expression inside an expression; an error value is returned as is.
macro_rules! eval_or_return {
    ($interp:expr, $expr:expr, $env:expr) => {
        match $interp.eval_expr($expr, $env)? {
            err @ $crate::value::Value::Error(_) => return Ok(err),
            value => value,
        }
    };
}

mod builder;
mod call;
mod cast;
mod expr;
mod spawn;
mod stmt;
mod types;

pub use builder::InterpreterBuilder;
pub use spawn::TaskGroup;
pub use types::SharedTypes;

use std::sync::Arc;

use yolk_ir::Program;
use yolk_types::Idx;

use crate::builtins::BuiltinRegistry;
use crate::config::EvalConfig;
use crate::diagnostics::CallStack;
use crate::environment::Environment;
use crate::errors::{break_outside_loop, uncaught, EvalError};
use crate::input_handler::SharedInputHandler;
use crate::print_handler::SharedPrintHandler;
use crate::value::{ErrorValue, FunctionValue, Value};

/// A resolved callee.
///
/// Deferred calls are resolved when `defer` runs, so the callee is stored in
/// this form rather than as an expression.
#[derive(Clone, Debug)]
pub enum CallTarget {
    /// Conversion `T(x)` to a registered type.
    Cast(Idx),
    Builtin(String),
    Function(FunctionValue),
}

/// How a statement completed.
#[derive(Clone, Debug)]
pub(crate) enum Flow {
    Normal,
    Break,
    Continue,
    Return(Vec<Value>),
    Raised(ErrorValue),
}

/// The interpreter for one program and the tasks it spawns.
pub struct Interpreter {
    pub(crate) types: SharedTypes,
    pub(crate) builtins: Arc<BuiltinRegistry>,
    pub(crate) print_handler: SharedPrintHandler,
    pub(crate) input_handler: SharedInputHandler,
    pub(crate) config: EvalConfig,
    pub(crate) tasks: TaskGroup,
    pub(crate) call_stack: CallStack,
    /// Root frame of the most recent `run`.
    globals: Option<Environment>,
}

impl Interpreter {
    /// Interpreter with stdout/stdin handlers and the default builtins.
    pub fn new() -> Self {
        InterpreterBuilder::new().build()
    }

    /// Run a program to completion.
    ///
    /// Each run gets a fresh root frame. Declared types persist in the
    /// registry. Spawned tasks keep running after this returns; see
    /// [`wait_for_tasks`](Self::wait_for_tasks).
    #[tracing::instrument(level = "debug", skip_all, fields(stmts = program.stmts.len()))]
    pub fn run(&mut self, program: &Program) -> Result<(), EvalError> {
        let root = Environment::root();
        self.globals = Some(root.clone());
        self.call_stack = CallStack::new(self.config.max_call_depth);

        let outcome = self.exec_block(&program.stmts, &root);
        match self.finish_frame(&root, outcome)? {
            Flow::Normal | Flow::Return(_) => Ok(()),
            Flow::Raised(err) => Err(uncaught(&err)),
            Flow::Break => Err(break_outside_loop("break")),
            Flow::Continue => Err(break_outside_loop("continue")),
        }
    }

    /// Block until every task spawned so far (including tasks spawned by
    /// those tasks) has finished.
    pub fn wait_for_tasks(&self) {
        self.tasks.join_all();
    }

    /// Read a top-level binding of the last run.
    pub fn global(&self, name: &str) -> Option<Value> {
        self.globals.as_ref()?.get(name).map(Value::unconst)
    }

    /// Type lookup used for cast dispatch: `int(x)`, `Meters(x)`, `thing(x)`.
    pub fn lookup_type(&self, name: &str) -> Option<Idx> {
        self.types.read().lookup(name)
    }

    pub fn types(&self) -> &SharedTypes {
        &self.types
    }

    pub fn print_handler(&self) -> &SharedPrintHandler {
        &self.print_handler
    }

    pub fn input_handler(&self) -> &SharedInputHandler {
        &self.input_handler
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Interpreter for a spawned task: shared registries, handlers and task
    /// group, a fresh call stack.
    pub(crate) fn fork(&self) -> Self {
        Interpreter {
            types: self.types.clone(),
            builtins: self.builtins.clone(),
            print_handler: self.print_handler.clone(),
            input_handler: self.input_handler.clone(),
            config: self.config.clone(),
            tasks: self.tasks.clone(),
            call_stack: CallStack::new(self.config.max_call_depth),
            globals: None,
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

//! Yolk Eval - tree-walking interpreter for the Yolk scripting language.
//!
//! Runs an already-parsed [`yolk_ir::Program`] against a gradual type
//! system ([`yolk_types`]).
//!
//! # Architecture
//!
//! - [`Value`]: closed runtime value enum; arrays, maps and structs are
//!   shared cells
//! - [`Environment`]: lexical scope chain of lock-guarded frames, shared by
//!   spawned tasks
//! - [`Interpreter`]: statement and expression evaluation, calls, defers,
//!   `spawn`
//! - [`builtins`]: host functions (`println`, `len`, `randInt`, ...)
//! - [`EvalError`]: hard errors; recoverable failures are
//!   [`Value::Error`] values instead
//!
//! # Example
//!
//! ```
//! use yolk_eval::{buffer_handler, InterpreterBuilder};
//! use yolk_ir::{BinaryOp, Expr, Program, Stmt};
//!
//! let output = buffer_handler();
//! let mut interp = InterpreterBuilder::new().print_handler(output.clone()).build();
//! let program = Program::new(vec![Stmt::expr(Expr::call(
//!     "println",
//!     vec![Expr::binary(BinaryOp::Div, Expr::int(5), Expr::int(2))],
//! ))]);
//! interp.run(&program).unwrap();
//! assert_eq!(output.get_output(), "2.5\n");
//! ```

pub mod builtins;
pub mod config;
mod diagnostics;
mod environment;
pub mod errors;
mod input_handler;
pub mod interpreter;
mod operators;
mod print_handler;
mod stack;
mod unary_operators;
pub mod value;

use std::sync::Once;

pub use builtins::{Arity, Builtin, BuiltinFn, BuiltinRegistry, CallSite};
pub use config::EvalConfig;
pub use environment::{AssignError, DeferredCall, DefineError, Environment, FrameKind, NO_LIFETIME};
pub use errors::{BacktraceFrame, EvalBacktrace, EvalError, EvalErrorKind};
pub use input_handler::{
    scripted_handler, stdin_handler, InputHandlerImpl, SharedInputHandler,
};
pub use interpreter::{CallTarget, Interpreter, InterpreterBuilder, SharedTypes, TaskGroup};
pub use operators::evaluate_binary;
pub use print_handler::{
    buffer_handler, silent_handler, stdout_handler, PrintHandlerImpl, SharedPrintHandler,
};
pub use stack::ensure_sufficient_stack;
pub use unary_operators::evaluate_unary;
pub use value::{ErrorValue, FunctionValue, MapKey, Value};
pub use yolk_types::{Idx, TypeRegistry};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call multiple times. Does nothing unless `RUST_LOG` is set, e.g.
/// `RUST_LOG=yolk_eval=debug` for calls and task launches or
/// `RUST_LOG=yolk_eval=trace` for every statement.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}

//! `InterpreterBuilder` for creating interpreters with non-default handlers,
//! registries or limits.

use std::sync::Arc;

use super::{Interpreter, SharedTypes, TaskGroup};
use crate::builtins::BuiltinRegistry;
use crate::config::EvalConfig;
use crate::diagnostics::CallStack;
use crate::input_handler::{stdin_handler, SharedInputHandler};
use crate::print_handler::{stdout_handler, SharedPrintHandler};

/// Builder for [`Interpreter`].
///
/// Unset parts default to stdout, stdin, the standard builtins, a fresh
/// type registry and [`EvalConfig::from_env`].
#[derive(Default)]
pub struct InterpreterBuilder {
    config: Option<EvalConfig>,
    print_handler: Option<SharedPrintHandler>,
    input_handler: Option<SharedInputHandler>,
    builtins: Option<BuiltinRegistry>,
    types: Option<SharedTypes>,
}

impl InterpreterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn config(mut self, config: EvalConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Where `print`/`println` write. Tests use [`buffer_handler`](crate::buffer_handler).
    #[must_use]
    pub fn print_handler(mut self, handler: SharedPrintHandler) -> Self {
        self.print_handler = Some(handler);
        self
    }

    /// Where `input`/`key` read from.
    #[must_use]
    pub fn input_handler(mut self, handler: SharedInputHandler) -> Self {
        self.input_handler = Some(handler);
        self
    }

    /// Replace the builtin set. Start from [`BuiltinRegistry::standard`] to extend it.
    #[must_use]
    pub fn builtins(mut self, builtins: BuiltinRegistry) -> Self {
        self.builtins = Some(builtins);
        self
    }

    /// Share a type registry, e.g. with another interpreter.
    #[must_use]
    pub fn types(mut self, types: SharedTypes) -> Self {
        self.types = Some(types);
        self
    }

    pub fn build(self) -> Interpreter {
        let config = self.config.unwrap_or_else(EvalConfig::from_env);
        let call_stack = CallStack::new(config.max_call_depth);
        Interpreter {
            types: self.types.unwrap_or_default(),
            builtins: Arc::new(self.builtins.unwrap_or_else(BuiltinRegistry::standard)),
            print_handler: self.print_handler.unwrap_or_else(stdout_handler),
            input_handler: self.input_handler.unwrap_or_else(stdin_handler),
            config,
            tasks: TaskGroup::new(),
            call_stack,
            globals: None,
        }
    }
}

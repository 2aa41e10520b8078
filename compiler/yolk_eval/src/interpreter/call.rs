//! Calls: resolution, argument binding, return validation and defers.

use std::sync::Arc;

use yolk_ir::{Expr, ExprKind, FunctionDecl, Span};
use yolk_types::Idx;

use super::{CallTarget, Flow, Interpreter};
use crate::builtins::CallSite;
use crate::diagnostics::CallFrame;
use crate::environment::{Environment, NO_LIFETIME};
use crate::errors::{arity_mismatch, break_outside_loop, uncaught, EvalError};
use crate::value::{ErrorValue, FunctionValue, Value};

/// A resolved callee with evaluated arguments, or the error value that
/// stopped resolution.
type Prepared = Result<(CallTarget, Vec<Value>), Value>;

/// Spread a single tuple argument over several parameters.
fn flatten_args(args: Vec<Value>, expected: usize) -> Vec<Value> {
    match <[Value; 1]>::try_from(args) {
        Ok([Value::Tuple(items)]) if expected != 1 => items,
        Ok([single]) => vec![single],
        Err(args) => args,
    }
}

/// Result of a call from its returned values: nothing is `nil`, one value
/// is itself, several are a tuple.
fn collapse(mut values: Vec<Value>) -> Value {
    match values.len() {
        0 => Value::Nil,
        1 => values.pop().unwrap_or(Value::Nil),
        _ => Value::Tuple(values),
    }
}

/// Combine the outcome of a frame with one of its deferred calls.
fn after_defer(
    outcome: Result<Flow, EvalError>,
    deferred: Result<Value, EvalError>,
    span: Span,
) -> Result<Flow, EvalError> {
    match deferred {
        Ok(Value::Error(failed)) => match outcome {
            Ok(Flow::Raised(original)) => Ok(Flow::Raised(ErrorValue {
                message: format!("{}; {}", original.message, failed.message).into(),
                span: original.span,
            })),
            Ok(_) => Ok(Flow::Raised(failed.at(span))),
            Err(hard) => Err(hard.with_context(&failed.message)),
        },
        Ok(_) => outcome,
        Err(hard) => match outcome {
            Ok(Flow::Raised(original)) => Err(uncaught(&original).with_context(&hard.message)),
            Ok(_) => Err(hard.with_span(span)),
            Err(first) => Err(first.with_context(&hard.message)),
        },
    }
}

impl Interpreter {
    pub(crate) fn eval_call(
        &mut self,
        callee: &Expr,
        args: &[Expr],
        span: Span,
        env: &Environment,
    ) -> Result<Value, EvalError> {
        match self.prepare_call(callee, args, env)? {
            Ok((target, args)) => self.invoke(&target, args, span),
            Err(err) => Ok(err),
        }
    }

    pub(crate) fn eval_method_call(
        &mut self,
        receiver: &Expr,
        method: &str,
        args: &[Expr],
        span: Span,
        env: &Environment,
    ) -> Result<Value, EvalError> {
        match self.prepare_method_call(receiver, method, args, env)? {
            Ok((target, args)) => self.invoke(&target, args, span),
            Err(err) => Ok(err),
        }
    }

    /// Resolve a callee and evaluate its arguments without calling it.
    ///
    /// A bare name is tried as a type (conversion), then as a builtin, and
    /// only then evaluated as an expression.
    pub(crate) fn prepare_call(
        &mut self,
        callee: &Expr,
        args: &[Expr],
        env: &Environment,
    ) -> Result<Prepared, EvalError> {
        let target = if let ExprKind::Ident(name) = &callee.kind {
            if let Some(ty) = self.lookup_type(name) {
                Some(CallTarget::Cast(ty))
            } else if self.builtins.get(name).is_some() {
                Some(CallTarget::Builtin(name.clone()))
            } else {
                None
            }
        } else {
            None
        };
        let target = match target {
            Some(target) => target,
            None => match self.eval_expr(callee, env)?.unerase() {
                Value::Function(func) => CallTarget::Function(func),
                err @ Value::Error(_) => return Ok(Err(err)),
                other => {
                    return Ok(Err(Value::error(format!(
                        "cannot call non-function {other} (type {})",
                        self.describe_type(&other)
                    ))))
                }
            },
        };
        let args = self.eval_args(args, env)?;
        Ok(Ok((target, args)))
    }

    /// Resolve `receiver.method(args)`.
    ///
    /// Methods declared for the receiver's runtime type win; a struct field
    /// holding a function is the fallback.
    pub(crate) fn prepare_method_call(
        &mut self,
        receiver: &Expr,
        method: &str,
        args: &[Expr],
        env: &Environment,
    ) -> Result<Prepared, EvalError> {
        let receiver = match self.eval_expr(receiver, env)?.unerase() {
            err @ Value::Error(_) => return Ok(Err(err)),
            value => value,
        };
        let ty = self.types.read().resolve_alias(receiver.type_of());
        if let Some(func) = env.get_method(ty, method) {
            let mut values = Vec::with_capacity(args.len() + 1);
            values.push(receiver);
            values.extend(self.eval_args(args, env)?);
            return Ok(Ok((CallTarget::Function(func), values)));
        }
        if let Value::Struct(fields) = &receiver {
            if let Some(Value::Function(func)) = fields.get_field(method).map(Value::unerase) {
                let values = self.eval_args(args, env)?;
                return Ok(Ok((CallTarget::Function(func), values)));
            }
        }
        Ok(Err(Value::error(format!(
            "{} has no method {method}",
            self.describe_type(&receiver)
        ))))
    }

    /// Arguments are evaluated left to right; error values are kept so that
    /// builtins can receive them.
    fn eval_args(&mut self, args: &[Expr], env: &Environment) -> Result<Vec<Value>, EvalError> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval_expr(arg, env)?);
        }
        Ok(values)
    }

    /// Call a resolved target.
    pub(crate) fn invoke(
        &mut self,
        target: &CallTarget,
        args: Vec<Value>,
        span: Span,
    ) -> Result<Value, EvalError> {
        match target {
            CallTarget::Cast(ty) => {
                let got = args.len();
                let Ok([value]) = <[Value; 1]>::try_from(args) else {
                    let name = self.types.read().display(*ty);
                    return Err(arity_mismatch(&name, 1, got).with_span(span));
                };
                Ok(self.cast(value, *ty))
            }
            CallTarget::Builtin(name) => {
                let builtins = self.builtins.clone();
                let Some(builtin) = builtins.get(name) else {
                    return Err(EvalError::new(format!("undefined builtin: {name}")).with_span(span));
                };
                let args = flatten_args(args, 0);
                builtin
                    .arity
                    .check(builtin.name, args.len())
                    .map_err(|err| err.with_span(span))?;
                let site = CallSite {
                    name: builtin.name,
                    span,
                };
                (builtin.func)(self, &site, args)
            }
            CallTarget::Function(func) => self.call_function(func, args, span),
        }
    }

    /// Call a user function or method.
    #[tracing::instrument(level = "debug", skip_all, fields(function = func.name()))]
    pub(crate) fn call_function(
        &mut self,
        func: &FunctionValue,
        args: Vec<Value>,
        span: Span,
    ) -> Result<Value, EvalError> {
        let decl = &func.decl;
        let expected = decl.params.len() + usize::from(func.receiver.is_some());
        let args = flatten_args(args, expected);
        if args.len() != expected {
            return Err(arity_mismatch(func.name(), expected, args.len()).with_span(span));
        }

        let mut param_types = Vec::with_capacity(decl.params.len());
        for param in &decl.params {
            param_types.push(self.resolve_optional(param.ty.as_ref())?);
        }
        // An error argument fails the call unless the parameter takes errors.
        let receiver_slots = expected - decl.params.len();
        for (i, arg) in args.iter().enumerate() {
            let accepts_error = i
                .checked_sub(receiver_slots)
                .and_then(|p| param_types[p])
                .is_some_and(|ty| self.types.read().resolve_alias(ty) == Idx::ERROR);
            if arg.is_error() && !accepts_error {
                return Ok(arg.clone());
            }
        }

        self.call_stack.push(CallFrame {
            name: func.name().to_string(),
            call_span: span,
        })?;
        let result = self
            .run_function(func, &param_types, args)
            .map_err(|err| err.with_backtrace(self.call_stack.capture()));
        self.call_stack.pop();
        result
    }

    fn run_function(
        &mut self,
        func: &FunctionValue,
        param_types: &[Option<Idx>],
        args: Vec<Value>,
    ) -> Result<Value, EvalError> {
        let decl = &func.decl;
        let frame = func.captured.call_frame();
        let mut args = args.into_iter();
        if let Some(receiver) = &func.receiver {
            if let Some(value) = args.next() {
                frame.define(receiver, value.unconst())?;
            }
        }
        for ((param, ty), value) in decl.params.iter().zip(param_types).zip(args) {
            let value = match ty {
                Some(ty) => {
                    let context = format!("argument to {}", func.name());
                    match self.coerce(value.unconst(), *ty, &context) {
                        Ok(value) => value,
                        Err(err) => return Ok(err),
                    }
                }
                None => value.unconst(),
            };
            frame.define_typed(&param.name, value, *ty, NO_LIFETIME)?;
        }

        let outcome = self.exec_block(&decl.body.stmts, &frame);
        match self.finish_frame(&frame, outcome)? {
            Flow::Return(values) => self.check_returns(func, values),
            Flow::Normal if decl.returns.is_empty() => Ok(Value::Nil),
            Flow::Normal => Ok(Value::error(format!("missing return in {}", func.name()))),
            Flow::Raised(err) => Ok(Value::Error(err)),
            Flow::Break => Err(break_outside_loop("break")),
            Flow::Continue => Err(break_outside_loop("continue")),
        }
    }

    /// Validate returned values against the declared result types.
    fn check_returns(&self, func: &FunctionValue, values: Vec<Value>) -> Result<Value, EvalError> {
        let decl = &func.decl;
        if decl.returns.is_empty() {
            return Ok(collapse(values));
        }
        let mut returns = Vec::with_capacity(decl.returns.len());
        for ty in &decl.returns {
            returns.push(self.resolve_type(ty)?);
        }
        let values = flatten_args(values, returns.len());
        if values.len() != returns.len() {
            return Ok(Value::error(format!(
                "wrong number of return values from {}: want {}, got {}",
                func.name(),
                returns.len(),
                values.len()
            )));
        }

        let context = format!("return from {}", func.name());
        let mut checked = Vec::with_capacity(values.len());
        for (value, ty) in values.into_iter().zip(returns) {
            let slot = self.types.read().resolve_alias(ty);
            if value.is_error() && slot != Idx::ERROR && slot != Idx::ANY {
                return Ok(value);
            }
            match self.coerce(value, ty, &context) {
                Ok(value) => checked.push(value),
                Err(err) => return Ok(err),
            }
        }
        Ok(collapse(checked))
    }

    /// Run the defers of a frame that is being left, newest first.
    ///
    /// Defers run whatever the outcome. A failing defer replaces a normal
    /// outcome and is appended to a failed one.
    pub(crate) fn finish_frame(
        &mut self,
        frame: &Environment,
        outcome: Result<Flow, EvalError>,
    ) -> Result<Flow, EvalError> {
        let mut outcome = outcome;
        for deferred in frame.take_defers() {
            let result = self.invoke(&deferred.target, deferred.args, deferred.span);
            outcome = after_defer(outcome, result, deferred.span);
        }
        outcome
    }

    /// Build a closure over `env`. Untyped parameters are `thing` in the
    /// function's type.
    pub(crate) fn make_function(
        &self,
        decl: &Arc<FunctionDecl>,
        env: &Environment,
        receiver: Option<&str>,
    ) -> Result<FunctionValue, EvalError> {
        let mut params = Vec::with_capacity(decl.params.len());
        for param in &decl.params {
            params.push(self.resolve_optional(param.ty.as_ref())?.unwrap_or(Idx::ANY));
        }
        let mut returns = Vec::with_capacity(decl.returns.len());
        for ty in &decl.returns {
            returns.push(self.resolve_type(ty)?);
        }
        let ty = self.types.write().function(params, returns);
        Ok(FunctionValue {
            decl: Arc::clone(decl),
            captured: env.clone(),
            ty,
            receiver: receiver.map(Arc::from),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_flatten_single_tuple() {
        let tuple = vec![Value::Tuple(vec![Value::Int(1), Value::Int(2)])];
        assert_eq!(flatten_args(tuple.clone(), 2).len(), 2);
        // A one-parameter function receives the tuple whole.
        assert_eq!(flatten_args(tuple, 1).len(), 1);
        assert_eq!(flatten_args(vec![Value::Int(1), Value::Int(2)], 2).len(), 2);
    }

    #[test]
    fn test_collapse() {
        assert!(matches!(collapse(Vec::new()), Value::Nil));
        assert!(matches!(collapse(vec![Value::Int(3)]), Value::Int(3)));
        assert!(matches!(
            collapse(vec![Value::Int(3), Value::Int(4)]),
            Value::Tuple(items) if items.len() == 2
        ));
    }

    #[test]
    fn test_failing_defer_replaces_success() {
        let span = Span::new(3, 1);
        let flow = after_defer(Ok(Flow::Normal), Ok(Value::error("closed")), span);
        let Ok(Flow::Raised(err)) = flow else {
            panic!("expected a raised error, got {flow:?}");
        };
        assert_eq!(&*err.message, "closed");
        assert_eq!(err.span, Some(span));
    }

    #[test]
    fn test_failing_defer_accompanies_failure() {
        let original = ErrorValue::new("read failed");
        let flow = after_defer(
            Ok(Flow::Raised(original)),
            Ok(Value::error("close failed")),
            Span::DUMMY,
        );
        let Ok(Flow::Raised(err)) = flow else {
            panic!("expected a raised error, got {flow:?}");
        };
        assert_eq!(&*err.message, "read failed; close failed");
    }

    #[test]
    fn test_hard_defer_failure_keeps_raised_message() {
        let flow = after_defer(
            Ok(Flow::Raised(ErrorValue::new("boom"))),
            Err(EvalError::new("bad defer")),
            Span::DUMMY,
        );
        let Err(err) = flow else {
            panic!("expected a hard error, got {flow:?}");
        };
        assert_eq!(err.message, "boom; bad defer");
    }

    #[test]
    fn test_successful_defer_keeps_outcome() {
        let flow = after_defer(Ok(Flow::Return(vec![Value::Int(1)])), Ok(Value::Nil), Span::DUMMY);
        assert!(matches!(flow, Ok(Flow::Return(values)) if values.len() == 1));
    }
}

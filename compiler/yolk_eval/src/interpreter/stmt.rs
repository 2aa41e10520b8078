//! Statement evaluation.

use std::sync::Arc;

use yolk_ir::{Block, ElseBranch, Expr, Stmt, StmtKind, SwitchCase, VarDecl};
use yolk_types::Idx;

use super::{Flow, Interpreter};
use crate::environment::{DeferredCall, Environment, NO_LIFETIME};
use crate::errors::{
    const_without_initializer, invalid_range_form, missing_condition, non_bool_condition,
    EvalError,
};
use crate::stack::ensure_sufficient_stack;
use crate::value::{values_equal, CyclicStore, ErrorValue, NamedValue, Value};

type ExecResult = Result<Flow, EvalError>;

/// Loop bookkeeping after one iteration: `None` keeps looping.
fn loop_exit(flow: Flow) -> Option<Flow> {
    match flow {
        Flow::Normal | Flow::Continue => None,
        Flow::Break => Some(Flow::Normal),
        other => Some(other),
    }
}

/// `break` inside a switch case ends the switch.
fn switch_exit(flow: Flow) -> Flow {
    match flow {
        Flow::Break => Flow::Normal,
        other => other,
    }
}

fn raise(message: impl Into<Arc<str>>) -> Flow {
    Flow::Raised(ErrorValue::new(message))
}

fn raise_value(value: Value) -> Flow {
    match value {
        Value::Error(err) => Flow::Raised(err),
        other => raise(other.to_string()),
    }
}

/// Condition value, looking through named bool types.
fn truth(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Const(inner) => truth(inner),
        Value::Named(NamedValue { ty, inner }) if *ty != Idx::ANY => truth(inner),
        _ => None,
    }
}

/// Spread a single tuple over several slots.
fn spread(mut values: Vec<Value>, slots: usize) -> Vec<Value> {
    if slots > 1 && values.len() == 1 && matches!(values[0], Value::Tuple(_)) {
        if let Some(Value::Tuple(items)) = values.pop() {
            return items;
        }
    }
    values
}

#[cold]
fn count_mismatch(names: usize, values: usize) -> Flow {
    raise(format!(
        "assignment mismatch: {names} variable{} but {values} value{}",
        if names == 1 { "" } else { "s" },
        if values == 1 { "" } else { "s" },
    ))
}

impl Interpreter {
    /// Run statements in order in `env`.
    ///
    /// Stops at the first non-`Normal` flow. Lifetimes of `env` tick after
    /// every statement that completes normally.
    pub(crate) fn exec_block(&mut self, stmts: &[Stmt], env: &Environment) -> ExecResult {
        for stmt in stmts {
            match self.exec_stmt(stmt, env)? {
                Flow::Normal => env.tick_lifetimes(),
                other => return Ok(other),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_body(&mut self, body: &Block, env: &Environment) -> ExecResult {
        self.exec_block(&body.stmts, &env.child())
    }

    pub(crate) fn exec_stmt(&mut self, stmt: &Stmt, env: &Environment) -> ExecResult {
        tracing::trace!(span = %stmt.span, "exec stmt");
        let flow = ensure_sufficient_stack(|| self.exec_stmt_inner(stmt, env))
            .map_err(|err| err.with_span(stmt.span))?;
        Ok(match flow {
            Flow::Raised(err) => Flow::Raised(err.at(stmt.span)),
            other => other,
        })
    }

    fn exec_stmt_inner(&mut self, stmt: &Stmt, env: &Environment) -> ExecResult {
        match &stmt.kind {
            StmtKind::VarDecl(decl) => self.exec_var_decl(decl, env),
            StmtKind::Assign { targets, values } => self.exec_assign(targets, values, env),
            StmtKind::IndexAssign {
                object,
                index,
                value,
            } => self.exec_index_assign(object, index, value, env),
            StmtKind::MemberAssign {
                object,
                field,
                value,
            } => self.exec_member_assign(object, field, value, env),
            StmtKind::TypeDecl { name, ty, alias } => {
                let declared = self.types.write().declare_from_expr(name, ty, *alias);
                declared?;
                Ok(Flow::Normal)
            }
            StmtKind::EnumDecl { name, variants } => {
                let declared = self.types.write().declare_enum(name, variants.clone());
                declared?;
                Ok(Flow::Normal)
            }
            StmtKind::FuncDecl(decl) => {
                let func = self.make_function(decl, env, None)?;
                env.define(decl.display_name(), Value::Function(func))?;
                Ok(Flow::Normal)
            }
            StmtKind::MethodDecl {
                receiver_type,
                receiver_name,
                func,
            } => {
                let receiver = self.lookup_type(receiver_type).ok_or_else(|| {
                    yolk_types::TypeError::Unresolved {
                        name: receiver_type.clone(),
                    }
                })?;
                let receiver = self.types.read().resolve_alias(receiver);
                let method = self.make_function(func, env, Some(receiver_name.as_str()))?;
                tracing::debug!(
                    receiver = %receiver_type,
                    method = func.display_name(),
                    "declared method"
                );
                env.set_method(receiver, func.display_name(), method);
                Ok(Flow::Normal)
            }
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let Some(condition) = condition else {
                    return Err(missing_condition("if"));
                };
                let holds = match self.eval_condition(condition, "if", env)? {
                    Ok(holds) => holds,
                    Err(err) => return Ok(Flow::Raised(err)),
                };
                if holds {
                    self.exec_body(then_branch, env)
                } else {
                    match else_branch {
                        Some(ElseBranch::If(stmt)) => self.exec_stmt(stmt, env),
                        Some(ElseBranch::Block(block)) => self.exec_body(block, env),
                        None => Ok(Flow::Normal),
                    }
                }
            }
            StmtKind::While { condition, body } => {
                let Some(condition) = condition else {
                    return Err(missing_condition("while"));
                };
                loop {
                    match self.eval_condition(condition, "while", env)? {
                        Ok(true) => {}
                        Ok(false) => break,
                        Err(err) => return Ok(Flow::Raised(err)),
                    }
                    if let Some(flow) = loop_exit(self.exec_body(body, env)?) {
                        return Ok(flow);
                    }
                }
                Ok(Flow::Normal)
            }
            StmtKind::For {
                init,
                condition,
                post,
                body,
            } => self.exec_for(init.as_deref(), condition.as_ref(), post.as_deref(), body, env),
            StmtKind::RangeFor {
                key,
                value,
                iterable,
                body,
            } => self.exec_range_for(key, value.as_deref(), iterable, body, env),
            StmtKind::Switch {
                subject,
                cases,
                default,
            } => self.exec_switch(subject, cases, default.as_ref(), env),
            StmtKind::With { value, body } => {
                let value = eval_or_raise!(self, value, env);
                let frame = env.child();
                frame.define("it", Value::Const(Box::new(value.frozen_copy())))?;
                self.exec_block(&body.stmts, &frame)
            }
            StmtKind::Spawn(block) => {
                self.spawn_block(Arc::clone(block), env)?;
                Ok(Flow::Normal)
            }
            StmtKind::Defer(call) => self.exec_defer(call, stmt.span, env),
            StmtKind::Break => Ok(Flow::Break),
            StmtKind::Continue => Ok(Flow::Continue),
            StmtKind::Return(exprs) => {
                // Every value is computed before any defer runs; error values
                // are checked against the result types by the caller.
                let mut values = Vec::with_capacity(exprs.len());
                for expr in exprs {
                    values.push(self.eval_expr(expr, env)?);
                }
                Ok(Flow::Return(values))
            }
            StmtKind::Expr(expr) => {
                eval_or_raise!(self, expr, env);
                Ok(Flow::Normal)
            }
        }
    }

    /// Evaluate a condition. An error value comes back as `Err` to be
    /// raised; a non-bool condition is a hard error.
    fn eval_condition(
        &mut self,
        condition: &Expr,
        construct: &'static str,
        env: &Environment,
    ) -> Result<Result<bool, ErrorValue>, EvalError> {
        match self.eval_expr(condition, env)? {
            Value::Error(err) => Ok(Err(err)),
            value => match truth(&value) {
                Some(holds) => Ok(Ok(holds)),
                None => Err(non_bool_condition(construct, &self.describe_type(&value))),
            },
        }
    }

    // Declarations and assignment

    fn exec_var_decl(&mut self, decl: &VarDecl, env: &Environment) -> ExecResult {
        let declared = self.resolve_optional(decl.ty.as_ref())?;
        if decl.constant && decl.values.is_empty() {
            return Err(const_without_initializer(&decl.names.join(", ")));
        }

        let lifetime = match &decl.lifetime {
            None => NO_LIFETIME,
            Some(expr) => match eval_or_raise!(self, expr, env).unconst() {
                Value::Int(n) if n == NO_LIFETIME || n >= 1 => n,
                other => {
                    return Ok(raise(format!(
                        "invalid lifetime {other}: must be -1 or a positive integer"
                    )))
                }
            },
        };

        let values = if decl.values.is_empty() {
            decl.names
                .iter()
                .map(|_| declared.map_or(Value::Uninitialized, |ty| self.zero_value(ty)))
                .collect()
        } else {
            let mut values = Vec::with_capacity(decl.values.len());
            for expr in &decl.values {
                values.push(eval_or_raise!(self, expr, env).unconst());
            }
            spread(values, decl.names.len())
        };
        if values.len() != decl.names.len() {
            return Ok(count_mismatch(decl.names.len(), values.len()));
        }

        for (name, value) in decl.names.iter().zip(values) {
            let value = match declared {
                Some(ty) => match self.coerce(value, ty, "declaration") {
                    Ok(value) => value,
                    Err(err) => return Ok(raise_value(err)),
                },
                None => value,
            };
            let value = if decl.constant {
                Value::Const(Box::new(value.frozen_copy()))
            } else {
                value
            };
            env.define_typed(name, value, declared, lifetime)?;
        }
        Ok(Flow::Normal)
    }

    fn exec_assign(&mut self, targets: &[String], exprs: &[Expr], env: &Environment) -> ExecResult {
        let mut values = Vec::with_capacity(exprs.len());
        for expr in exprs {
            values.push(eval_or_raise!(self, expr, env).unconst());
        }
        let values = spread(values, targets.len());
        if values.len() != targets.len() {
            return Ok(count_mismatch(targets.len(), values.len()));
        }
        for (target, value) in targets.iter().zip(values) {
            if let Some(flow) = self.assign_name(target, value, env)? {
                return Ok(flow);
            }
        }
        Ok(Flow::Normal)
    }

    /// Store into an existing binding. `Some(flow)` when the assignment raised.
    fn assign_name(
        &mut self,
        name: &str,
        value: Value,
        env: &Environment,
    ) -> Result<Option<Flow>, EvalError> {
        let Some((current, declared)) = env.get_typed(name) else {
            return Ok(Some(raise(format!("undefined variable: {name}"))));
        };
        let value = match current {
            Value::Const(_) => {
                return Err(crate::environment::AssignError::Constant {
                    name: name.to_string(),
                }
                .into())
            }
            // Only a binding declared with neither type nor value takes its
            // first value as is.
            Value::Uninitialized if declared.is_none() => value,
            existing => {
                let target = declared.unwrap_or_else(|| existing.type_of());
                match self.coerce(value, target, "assignment") {
                    Ok(value) => value,
                    Err(err) => return Ok(Some(raise_value(err))),
                }
            }
        };
        env.set(name, value)?;
        Ok(None)
    }

    fn exec_index_assign(
        &mut self,
        object: &Expr,
        index: &Expr,
        value: &Expr,
        env: &Environment,
    ) -> ExecResult {
        let object = eval_or_raise!(self, object, env).unconst();
        let index = eval_or_raise!(self, index, env).unconst();
        let value = eval_or_raise!(self, value, env).unconst();

        let array = match object {
            Value::Array(array) => array,
            Value::Map(_) => {
                return Ok(raise(
                    "cannot assign to map index: use insert(m, key, value)",
                ))
            }
            other => {
                return Ok(raise(format!(
                    "cannot index {other} (type {})",
                    self.describe_type(&other)
                )))
            }
        };
        let Value::Int(i) = index else {
            return Ok(raise(format!(
                "invalid array index {index} (type {}): must be int",
                self.describe_type(&index)
            )));
        };
        let elem = self.types.read().array_elem(array.ty).unwrap_or(Idx::ANY);
        let value = match self.coerce(value, elem, "assignment") {
            Ok(value) => value,
            Err(err) => return Ok(raise_value(err)),
        };
        if value.contains_cell(array.id()) {
            return Ok(raise(CyclicStore.to_string()));
        }
        let mut items = match array.write() {
            Ok(items) => items,
            Err(frozen) => return Ok(raise(frozen.to_string())),
        };
        let len = items.len();
        match usize::try_from(i).ok().and_then(|i| items.get_mut(i)) {
            Some(slot) => {
                *slot = value;
                Ok(Flow::Normal)
            }
            None => Ok(raise(format!(
                "index out of range [{i}] with length {len}"
            ))),
        }
    }

    fn exec_member_assign(
        &mut self,
        object: &Expr,
        field: &str,
        value: &Expr,
        env: &Environment,
    ) -> ExecResult {
        let object = eval_or_raise!(self, object, env).unconst();
        let value = eval_or_raise!(self, value, env).unconst();
        let Value::Struct(target) = object else {
            return Ok(raise(format!(
                "cannot assign to field {field} of {object} (type {})",
                self.describe_type(&object)
            )));
        };

        let value = {
            let types = self.types.read();
            let Some(field_ty) = types.field_type(target.ty, field) else {
                return Ok(raise(format!(
                    "{} has no field {field}",
                    types.display(target.ty)
                )));
            };
            let resolved = types.resolve_alias(field_ty);
            // Field stores are exact: no numeric widening.
            let exact = match &value {
                Value::Array(_) | Value::Map(_) => {
                    super::types::value_assignable(&types, &value, resolved)
                }
                Value::Nil => resolved == Idx::ERROR || resolved == Idx::NIL,
                other => resolved == Idx::ANY || types.resolve_alias(other.type_of()) == resolved,
            };
            if !exact {
                return Ok(raise_value(super::types::cannot_use(
                    &types,
                    &value,
                    field_ty,
                    "field assignment",
                )));
            }
            super::types::promote(&types, value, field_ty)
        };
        if value.contains_cell(target.id()) {
            return Ok(raise(CyclicStore.to_string()));
        }

        match target.set_field(field, value) {
            Ok(_) => Ok(Flow::Normal),
            Err(frozen) => Ok(raise(frozen.to_string())),
        }
    }

    // Loops and branching

    fn exec_for(
        &mut self,
        init: Option<&Stmt>,
        condition: Option<&Expr>,
        post: Option<&Stmt>,
        body: &Block,
        env: &Environment,
    ) -> ExecResult {
        let loop_env = env.child();
        if let Some(init) = init {
            match self.exec_stmt(init, &loop_env)? {
                Flow::Normal => {}
                other => return Ok(other),
            }
        }
        loop {
            if let Some(condition) = condition {
                match self.eval_condition(condition, "for", &loop_env)? {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(err) => return Ok(Flow::Raised(err)),
                }
            }
            if let Some(flow) = loop_exit(self.exec_body(body, &loop_env)?) {
                return Ok(flow);
            }
            if let Some(post) = post {
                match self.exec_stmt(post, &loop_env)? {
                    Flow::Normal => {}
                    other => return Ok(other),
                }
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_range_for(
        &mut self,
        key: &str,
        value_name: Option<&str>,
        iterable: &Expr,
        body: &Block,
        env: &Environment,
    ) -> ExecResult {
        let iterable = eval_or_raise!(self, iterable, env).unconst();
        let pairs: Vec<(Value, Value)> = match iterable {
            Value::Array(array) => {
                let elem = self.types.read().array_elem(array.ty).unwrap_or(Idx::ANY);
                array
                    .snapshot()
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| (index_value(i), self.promote(item, elem)))
                    .collect()
            }
            Value::Map(map) => {
                let value_ty = self
                    .types
                    .read()
                    .map_types(map.ty)
                    .map_or(Idx::ANY, |(_, v)| v);
                map.entries()
                    .into_iter()
                    .map(|(k, v)| (k.into_value(), self.promote(v, value_ty)))
                    .collect()
            }
            Value::Str(s) => s
                .chars()
                .enumerate()
                .map(|(i, c)| (index_value(i), Value::string(c.to_string())))
                .collect(),
            Value::Int(n) => {
                if value_name.is_some() {
                    return Err(invalid_range_form(
                        "range over int permits only one iteration variable",
                    ));
                }
                (0..n.max(0)).map(|i| (Value::Int(i), Value::Nil)).collect()
            }
            other => {
                return Ok(raise(format!(
                    "cannot range over {other} (type {})",
                    self.describe_type(&other)
                )))
            }
        };

        for (k, v) in pairs {
            let frame = env.child();
            if key != "_" {
                frame.define(key, k)?;
            }
            if let Some(name) = value_name.filter(|name| *name != "_") {
                frame.define(name, v)?;
            }
            if let Some(flow) = loop_exit(self.exec_block(&body.stmts, &frame)?) {
                return Ok(flow);
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_switch(
        &mut self,
        subject: &Expr,
        cases: &[SwitchCase],
        default: Option<&Block>,
        env: &Environment,
    ) -> ExecResult {
        let subject = eval_or_raise!(self, subject, env).unerase();
        for case in cases {
            for candidate in &case.values {
                let candidate = eval_or_raise!(self, candidate, env).unerase();
                match values_equal(&subject, &candidate) {
                    Ok(true) => return Ok(switch_exit(self.exec_body(&case.body, env)?)),
                    Ok(false) => {}
                    Err(err) => {
                        return Ok(raise(format!(
                            "invalid case {candidate} in switch on {subject}: {err}"
                        )))
                    }
                }
            }
        }
        match default {
            Some(block) => Ok(switch_exit(self.exec_body(block, env)?)),
            None => Ok(Flow::Normal),
        }
    }

    fn exec_defer(&mut self, call: &Expr, span: yolk_ir::Span, env: &Environment) -> ExecResult {
        let prepared = match &call.kind {
            yolk_ir::ExprKind::Call { callee, args } => self.prepare_call(callee, args, env)?,
            yolk_ir::ExprKind::MethodCall {
                receiver,
                method,
                args,
            } => self.prepare_method_call(receiver, method, args, env)?,
            _ => return Err(EvalError::new("expression in defer must be function call")),
        };
        match prepared {
            Ok((target, args)) => {
                env.add_defer(DeferredCall { target, args, span });
                Ok(Flow::Normal)
            }
            Err(err) => Ok(raise_value(err)),
        }
    }
}

fn index_value(i: usize) -> Value {
    Value::Int(i64::try_from(i).unwrap_or(i64::MAX))
}

//! Expression evaluation.
//!
//! Error values produced by a sub-expression are returned unevaluated by
//! the enclosing expression; only statements raise them.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use yolk_ir::{BinaryOp, Expr, ExprKind, FieldInit, InterpolationPart, MapEntry, TypeExpr};
use yolk_types::{Idx, TypeError};

use super::types::common_type;
use super::Interpreter;
use crate::environment::Environment;
use crate::errors::{invalid_type_assertion, non_bool_operand, EvalError};
use crate::operators::evaluate_binary;
use crate::stack::ensure_sufficient_stack;
use crate::unary_operators::evaluate_unary;
use crate::value::{values_equal, EnumValue, MapKey, Value};

type EvalResult = Result<Value, EvalError>;

#[cold]
fn undefined_variable(name: &str) -> Value {
    Value::error(format!("undefined variable: {name}"))
}

#[cold]
fn index_out_of_range(index: i64, len: usize) -> Value {
    Value::error(format!("index out of range [{index}] with length {len}"))
}

fn bool_operand(value: &Value, op: BinaryOp) -> Result<bool, EvalError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Named(named) if named.ty != Idx::ANY => bool_operand(&named.inner, op),
        other => Err(non_bool_operand(op.as_symbol(), other.kind_name())),
    }
}

impl Interpreter {
    /// Evaluate an expression.
    pub(crate) fn eval_expr(&mut self, expr: &Expr, env: &Environment) -> EvalResult {
        let value = ensure_sufficient_stack(|| self.eval_expr_inner(expr, env))
            .map_err(|err| err.with_span(expr.span))?;
        Ok(match value {
            Value::Error(err) => Value::Error(err.at(expr.span)),
            other => other,
        })
    }

    fn eval_expr_inner(&mut self, expr: &Expr, env: &Environment) -> EvalResult {
        match &expr.kind {
            ExprKind::Int(n) => Ok(Value::Int(*n)),
            ExprKind::Float(f) => Ok(Value::Float(*f)),
            ExprKind::Str(s) => Ok(Value::string(s.as_str())),
            ExprKind::Bool(b) => Ok(Value::Bool(*b)),
            ExprKind::Nil => Ok(Value::Nil),
            ExprKind::Interpolated(parts) => self.eval_interpolated(parts, env),

            ExprKind::Tuple(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(eval_or_return!(self, item, env).unconst());
                }
                Ok(Value::Tuple(values))
            }
            ExprKind::Array(items) => self.eval_array_literal(items, env),
            ExprKind::Map(entries) => self.eval_map_literal(entries, env),
            ExprKind::Struct { type_name, fields } => {
                self.eval_struct_literal(type_name.as_deref(), fields, env)
            }

            ExprKind::Ident(name) => Ok(env
                .get(name)
                .map_or_else(|| undefined_variable(name), Value::unconst)),
            ExprKind::Member { object, field } => self.eval_member(object, field, env),
            ExprKind::Index { object, index } => {
                let object = eval_or_return!(self, object, env).unconst();
                let index = eval_or_return!(self, index, env).unconst();
                Ok(self.eval_index(object, index))
            }

            ExprKind::Call { callee, args } => self.eval_call(callee, args, expr.span, env),
            ExprKind::MethodCall {
                receiver,
                method,
                args,
            } => self.eval_method_call(receiver, method, args, expr.span, env),
            ExprKind::Function(decl) => {
                Ok(Value::Function(self.make_function(decl, env, None)?))
            }

            ExprKind::Binary { op, left, right } => self.eval_binary(*op, left, right, env),
            ExprKind::Unary { op, operand } => {
                let operand = self.eval_expr(operand, env)?;
                evaluate_unary(operand, *op)
            }
            ExprKind::Grouped(inner) => self.eval_expr(inner, env),
            ExprKind::In {
                element,
                collection,
            } => {
                let element = eval_or_return!(self, element, env).unerase();
                let collection = eval_or_return!(self, collection, env).unconst();
                Ok(self.eval_in(&element, collection))
            }
            ExprKind::TypeAssert { expr, ty } => self.eval_type_assert(expr, ty, env),
        }
    }

    fn eval_interpolated(&mut self, parts: &[InterpolationPart], env: &Environment) -> EvalResult {
        let mut out = String::new();
        for part in parts {
            match part {
                InterpolationPart::Literal(text) => out.push_str(text),
                InterpolationPart::Expr(expr) => {
                    let value = eval_or_return!(self, expr, env);
                    out.push_str(&value.to_string());
                }
            }
        }
        Ok(Value::string(out))
    }

    // Composite literals

    fn eval_array_literal(&mut self, items: &[Expr], env: &Environment) -> EvalResult {
        let mut values = Vec::with_capacity(items.len());
        for item in items {
            values.push(eval_or_return!(self, item, env).unconst());
        }
        let elem = common_type(&self.types.read(), &values);
        let ty = self.array_type(elem);
        let values = values
            .into_iter()
            .map(|value| self.promote(value, elem))
            .collect();
        Ok(Value::array(values, ty))
    }

    fn eval_map_literal(&mut self, entries: &[MapEntry], env: &Environment) -> EvalResult {
        let mut pairs = Vec::with_capacity(entries.len());
        for entry in entries {
            let key = eval_or_return!(self, &entry.key, env).unerase();
            let value = eval_or_return!(self, &entry.value, env).unconst();
            pairs.push((key, value));
        }
        let (key_ty, value_ty) = {
            let types = self.types.read();
            (
                common_type(&types, pairs.iter().map(|(k, _)| k)),
                common_type(&types, pairs.iter().map(|(_, v)| v)),
            )
        };
        let map_ty = self.types.write().map(key_ty, value_ty);
        let map_ty = match map_ty {
            Ok(ty) => ty,
            Err(err) => return Ok(Value::error(err.to_string())),
        };

        let mut map = FxHashMap::default();
        for (key, value) in pairs {
            // `thing` keys stay concrete so lookups by plain values hit.
            let key = if key_ty == Idx::ANY {
                key
            } else {
                self.promote(key, key_ty)
            };
            let key = match MapKey::new(key) {
                Ok(key) => key,
                Err(err) => return Ok(Value::error(format!("invalid map key: {err}"))),
            };
            map.insert(key, self.promote(value, value_ty));
        }
        Ok(Value::map(map, map_ty))
    }

    fn eval_struct_literal(
        &mut self,
        type_name: Option<&str>,
        inits: &[FieldInit],
        env: &Environment,
    ) -> EvalResult {
        let mut given: Vec<(String, Value)> = Vec::with_capacity(inits.len());
        for init in inits {
            if given.iter().any(|(name, _)| *name == init.name) {
                return Ok(Value::error(format!(
                    "duplicate field {} in struct literal",
                    init.name
                )));
            }
            let value = eval_or_return!(self, &init.value, env).unconst();
            given.push((init.name.clone(), value));
        }

        let Some(type_name) = type_name else {
            let fields = given
                .iter()
                .map(|(name, value)| {
                    let ty = match value {
                        Value::Uninitialized => Idx::ANY,
                        other => other.type_of(),
                    };
                    (name.clone(), ty)
                })
                .collect();
            let ty = self.types.write().anonymous_struct(fields);
            let ty = match ty {
                Ok(ty) => ty,
                Err(err) => return Ok(Value::error(err.to_string())),
            };
            let fields = given
                .into_iter()
                .map(|(name, value)| (Arc::from(name.as_str()), value))
                .collect();
            return Ok(Value::structure(None, fields, ty));
        };

        let ty = self
            .lookup_type(type_name)
            .ok_or_else(|| TypeError::Unresolved {
                name: type_name.to_string(),
            })?;
        let declared = {
            let types = self.types.read();
            let ty = types.resolve_alias(ty);
            types.struct_fields(ty).map(|fields| (ty, fields.to_vec()))
        };
        let Some((ty, declared)) = declared else {
            return Ok(Value::error(format!("{type_name} is not a struct type")));
        };
        if let Some((unknown, _)) = given
            .iter()
            .find(|(name, _)| !declared.iter().any(|(field, _)| field == name))
        {
            return Ok(Value::error(format!(
                "unknown field {unknown} in struct literal of type {type_name}"
            )));
        }

        let mut fields = Vec::with_capacity(declared.len());
        for (field, field_ty) in declared {
            let value = match given.iter().position(|(name, _)| *name == field) {
                Some(pos) => match self.coerce(given.swap_remove(pos).1, field_ty, "struct literal") {
                    Ok(value) => value,
                    Err(err) => return Ok(err),
                },
                None => self.zero_value(field_ty),
            };
            fields.push((Arc::from(field.as_str()), value));
        }
        Ok(Value::structure(Some(Arc::from(type_name)), fields, ty))
    }

    // Access

    fn eval_member(&mut self, object: &Expr, field: &str, env: &Environment) -> EvalResult {
        // `Color.Red`, unless a variable shadows the type name.
        if let Some(name) = object.as_ident() {
            if env.get(name).is_none() {
                if let Some(value) = self.enum_variant(name, field) {
                    return Ok(value);
                }
            }
        }
        match eval_or_return!(self, object, env).unconst() {
            Value::Struct(s) => Ok(s.get_field(field).unwrap_or_else(|| {
                Value::error(format!(
                    "{} has no field {field}",
                    self.types.read().display(s.ty)
                ))
            })),
            other => Ok(Value::error(format!(
                "{other} (type {}) has no field {field}",
                self.describe_type(&other)
            ))),
        }
    }

    /// `Some` when `type_name` names an enum; unknown variants are errors.
    fn enum_variant(&self, type_name: &str, variant: &str) -> Option<Value> {
        let types = self.types.read();
        let ty = types.resolve_alias(types.lookup(type_name)?);
        let variants = types.enum_variants(ty)?;
        Some(match variants.iter().position(|v| v == variant) {
            Some(index) => Value::Enum(EnumValue {
                ty,
                type_name: Arc::from(type_name),
                variant: Arc::from(variant),
                index,
            }),
            None => Value::error(format!("{type_name} has no variant {variant}")),
        })
    }

    /// `object[index]` on arrays, maps and strings.
    pub(crate) fn eval_index(&self, object: Value, index: Value) -> Value {
        match object {
            Value::Array(array) => {
                let Value::Int(i) = index else {
                    return self.bad_index(&index);
                };
                match usize::try_from(i).ok().and_then(|i| array.get(i)) {
                    Some(item) => {
                        let elem = self.types.read().array_elem(array.ty).unwrap_or(Idx::ANY);
                        self.promote(item, elem)
                    }
                    None => index_out_of_range(i, array.len()),
                }
            }
            Value::Map(map) => {
                let key = match MapKey::new(index.unerase()) {
                    Ok(key) => key,
                    Err(err) => return Value::error(format!("invalid map key: {err}")),
                };
                match map.get(&key) {
                    Some(value) => {
                        let value_ty = self
                            .types
                            .read()
                            .map_types(map.ty)
                            .map_or(Idx::ANY, |(_, v)| v);
                        self.promote(value, value_ty)
                    }
                    None => Value::error(format!("key {} not found in map", key.value())),
                }
            }
            Value::Str(s) => {
                let Value::Int(i) = index else {
                    return self.bad_index(&index);
                };
                match usize::try_from(i).ok().and_then(|i| s.chars().nth(i)) {
                    Some(c) => Value::string(c.to_string()),
                    None => index_out_of_range(i, s.chars().count()),
                }
            }
            other => Value::error(format!(
                "cannot index {other} (type {})",
                self.describe_type(&other)
            )),
        }
    }

    #[cold]
    fn bad_index(&self, index: &Value) -> Value {
        Value::error(format!(
            "invalid index {index} (type {}): must be int",
            self.describe_type(index)
        ))
    }

    // Operators

    fn eval_binary(
        &mut self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
        env: &Environment,
    ) -> EvalResult {
        if op.is_logical() {
            let left = eval_or_return!(self, left, env).unconst();
            let lhs = bool_operand(&left, op)?;
            match (op, lhs) {
                (BinaryOp::And, false) => return Ok(Value::Bool(false)),
                (BinaryOp::Or, true) => return Ok(Value::Bool(true)),
                _ => {}
            }
            let right = eval_or_return!(self, right, env).unconst();
            return Ok(Value::Bool(bool_operand(&right, op)?));
        }
        let left = self.eval_expr(left, env)?;
        let right = self.eval_expr(right, env)?;
        Ok(evaluate_binary(left, right, op, &self.types.read()))
    }

    /// `element in collection`: array membership, map key, substring.
    fn eval_in(&self, element: &Value, collection: Value) -> Value {
        match collection {
            Value::Array(array) => {
                for item in array.snapshot() {
                    match values_equal(&item.unerase(), element) {
                        Ok(true) => return Value::Bool(true),
                        Ok(false) => {}
                        Err(err) => return Value::error(format!("invalid operation: {err}")),
                    }
                }
                Value::Bool(false)
            }
            Value::Map(map) => match MapKey::new(element.clone()) {
                Ok(key) => Value::Bool(map.contains_key(&key)),
                Err(err) => Value::error(format!("invalid map key: {err}")),
            },
            Value::Str(haystack) => match element {
                Value::Str(needle) => Value::Bool(haystack.contains(&**needle)),
                other => Value::error(format!(
                    "invalid operation: {other} (type {}) in string",
                    self.describe_type(other)
                )),
            },
            other => Value::error(format!(
                "invalid operation: in not defined on {}",
                self.describe_type(&other)
            )),
        }
    }

    /// `value.(T)`: recover a concrete type from a `thing`.
    fn eval_type_assert(&mut self, expr: &Expr, ty: &TypeExpr, env: &Environment) -> EvalResult {
        let value = eval_or_return!(self, expr, env).unconst();
        let target = self.resolve_type(ty)?;
        let Some(inner) = value.as_erased() else {
            return Err(invalid_type_assertion(&self.describe_type(&value)));
        };
        if self.value_assignable(inner, target) {
            Ok(self.promote(inner.clone(), target))
        } else {
            let types = self.types.read();
            Ok(Value::error(format!(
                "type assertion failed: thing holds {}, not {}",
                inner.type_name(&types),
                types.display(target)
            )))
        }
    }
}

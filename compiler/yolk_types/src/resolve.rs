//! Resolution of source type expressions into registry entries.

use yolk_ir::{TypeExpr, TypeExprKind};

use crate::{Idx, TypeError, TypeRegistry};

impl TypeRegistry {
    /// Resolve a type annotation, registering any structural shapes it names.
    pub fn resolve_type_expr(&mut self, expr: &TypeExpr) -> Result<Idx, TypeError> {
        match &expr.kind {
            TypeExprKind::Named(name) => {
                self.lookup(name).ok_or_else(|| TypeError::Unresolved { name: name.clone() })
            }
            TypeExprKind::Array(elem) => {
                let elem = self.resolve_type_expr(elem)?;
                Ok(self.array(elem))
            }
            TypeExprKind::Map { key, value } => {
                let key = self.resolve_type_expr(key)?;
                let value = self.resolve_type_expr(value)?;
                self.map(key, value)
            }
            TypeExprKind::Struct(fields) => {
                let fields = self.resolve_fields(fields)?;
                self.anonymous_struct(fields)
            }
            TypeExprKind::Function { params, returns } => {
                let params = params
                    .iter()
                    .map(|p| self.resolve_type_expr(p))
                    .collect::<Result<Vec<_>, _>>()?;
                let returns = returns
                    .iter()
                    .map(|r| self.resolve_type_expr(r))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(self.function(params, returns))
            }
        }
    }

    /// Handle a `type` declaration.
    ///
    /// A struct body declares a nominal struct (fields may refer to the type
    /// itself). Otherwise `alias` picks between a transparent alias and a
    /// nominally distinct named type over the resolved underlying type.
    pub fn declare_from_expr(
        &mut self,
        name: &str,
        expr: &TypeExpr,
        alias: bool,
    ) -> Result<Idx, TypeError> {
        if let (TypeExprKind::Struct(fields), false) = (&expr.kind, alias) {
            let idx = self.reserve_struct(name)?;
            let fields = self.resolve_fields(fields)?;
            self.set_struct_fields(idx, fields)?;
            return Ok(idx);
        }
        if self.lookup(name).is_some() {
            return Err(TypeError::AlreadyDeclared {
                name: name.to_string(),
            });
        }
        let target = self.resolve_type_expr(expr)?;
        if alias {
            self.declare_alias(name, target)
        } else {
            self.declare_named(name, target)
        }
    }

    fn resolve_fields(
        &mut self,
        fields: &[yolk_ir::FieldType],
    ) -> Result<Vec<(String, Idx)>, TypeError> {
        fields
            .iter()
            .map(|field| Ok((field.name.clone(), self.resolve_type_expr(&field.ty)?)))
            .collect()
    }
}

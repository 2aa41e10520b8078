//! The type registry: arena, name table, assignability.
//!
//! # Design
//!
//! - Arena of [`TypeData`] addressed by [`Idx`]; primitives occupy the first
//!   `Idx::PRIMITIVE_COUNT` slots.
//! - Structural shapes are interned through an `FxHashMap` so identical
//!   shapes compare equal by index.
//! - Declared names (`type`, `enum`) live in a separate name table shared with
//!   the primitive names, which is also what call-site cast dispatch queries.

use rustc_hash::FxHashMap;

use crate::{Idx, TypeData, TypeError};

/// Source names that resolve to primitive types.
const PRIMITIVE_NAMES: &[(&str, Idx)] = &[
    ("int", Idx::INT),
    ("float", Idx::FLOAT),
    ("string", Idx::STR),
    ("bool", Idx::BOOL),
    ("nil", Idx::NIL),
    ("error", Idx::ERROR),
    ("thing", Idx::ANY),
    ("any", Idx::ANY),
];

/// Arena of every type known to a program run.
#[derive(Clone, Debug)]
pub struct TypeRegistry {
    types: Vec<TypeData>,
    interned: FxHashMap<TypeData, Idx>,
    names: FxHashMap<String, Idx>,
}

impl TypeRegistry {
    /// Create a registry holding only the primitive types.
    pub fn new() -> Self {
        let types = vec![
            TypeData::Int,
            TypeData::Float,
            TypeData::Str,
            TypeData::Bool,
            TypeData::Nil,
            TypeData::Error,
            TypeData::Any,
            TypeData::Tuple,
        ];
        debug_assert_eq!(types.len(), Idx::PRIMITIVE_COUNT as usize);
        let names = PRIMITIVE_NAMES
            .iter()
            .map(|(name, idx)| ((*name).to_string(), *idx))
            .collect();
        TypeRegistry {
            types,
            interned: FxHashMap::default(),
            names,
        }
    }

    /// Number of registered types (primitives included).
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Look up the descriptor for an index.
    #[inline]
    pub fn get(&self, idx: Idx) -> Option<&TypeData> {
        if idx.is_none() {
            return None;
        }
        self.types.get(idx.index())
    }

    /// Look up a type by source name (primitive or declared).
    pub fn lookup(&self, name: &str) -> Option<Idx> {
        self.names.get(name).copied()
    }

    fn push(&mut self, data: TypeData) -> Idx {
        let raw = u32::try_from(self.types.len()).unwrap_or(u32::MAX - 1);
        let idx = Idx::from_raw(raw);
        self.types.push(data);
        idx
    }

    fn intern(&mut self, data: TypeData) -> Idx {
        debug_assert!(data.is_structural());
        if let Some(idx) = self.interned.get(&data) {
            return *idx;
        }
        let idx = self.push(data.clone());
        self.interned.insert(data, idx);
        idx
    }

    fn claim_name(&self, name: &str) -> Result<(), TypeError> {
        if self.names.contains_key(name) {
            return Err(TypeError::AlreadyDeclared {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    // Structural constructors

    pub fn array(&mut self, elem: Idx) -> Idx {
        self.intern(TypeData::Array { elem })
    }

    pub fn map(&mut self, key: Idx, value: Idx) -> Result<Idx, TypeError> {
        if key != Idx::ANY && !self.is_comparable(key) {
            return Err(TypeError::InvalidMapKey {
                ty: self.display(key),
            });
        }
        Ok(self.intern(TypeData::Map { key, value }))
    }

    pub fn function(&mut self, params: Vec<Idx>, returns: Vec<Idx>) -> Idx {
        self.intern(TypeData::Function { params, returns })
    }

    pub fn anonymous_struct(&mut self, fields: Vec<(String, Idx)>) -> Result<Idx, TypeError> {
        check_unique_fields(&fields)?;
        Ok(self.intern(TypeData::Struct { name: None, fields }))
    }

    // Nominal declarations

    /// Reserve a named struct with no fields yet.
    ///
    /// Lets field types refer back to the struct being declared; complete
    /// it with [`set_struct_fields`](Self::set_struct_fields).
    pub fn reserve_struct(&mut self, name: &str) -> Result<Idx, TypeError> {
        self.claim_name(name)?;
        let idx = self.push(TypeData::Struct {
            name: Some(name.to_string()),
            fields: Vec::new(),
        });
        self.names.insert(name.to_string(), idx);
        tracing::debug!(name, ?idx, "declared struct type");
        Ok(idx)
    }

    pub fn set_struct_fields(
        &mut self,
        idx: Idx,
        new_fields: Vec<(String, Idx)>,
    ) -> Result<(), TypeError> {
        check_unique_fields(&new_fields)?;
        if let Some(TypeData::Struct { fields, .. }) = self.types.get_mut(idx.index()) {
            *fields = new_fields;
        }
        Ok(())
    }

    pub fn declare_struct(
        &mut self,
        name: &str,
        fields: Vec<(String, Idx)>,
    ) -> Result<Idx, TypeError> {
        check_unique_fields(&fields)?;
        let idx = self.reserve_struct(name)?;
        self.set_struct_fields(idx, fields)?;
        Ok(idx)
    }

    pub fn declare_named(&mut self, name: &str, underlying: Idx) -> Result<Idx, TypeError> {
        self.claim_name(name)?;
        let idx = self.push(TypeData::Named {
            name: name.to_string(),
            underlying,
        });
        self.names.insert(name.to_string(), idx);
        tracing::debug!(name, ?idx, "declared named type");
        Ok(idx)
    }

    pub fn declare_alias(&mut self, name: &str, target: Idx) -> Result<Idx, TypeError> {
        self.claim_name(name)?;
        let idx = self.push(TypeData::Alias {
            name: name.to_string(),
            target,
        });
        self.names.insert(name.to_string(), idx);
        Ok(idx)
    }

    pub fn declare_enum(&mut self, name: &str, variants: Vec<String>) -> Result<Idx, TypeError> {
        self.claim_name(name)?;
        if variants.is_empty() {
            return Err(TypeError::EmptyEnum {
                name: name.to_string(),
            });
        }
        for (i, variant) in variants.iter().enumerate() {
            if variants[..i].contains(variant) {
                return Err(TypeError::DuplicateVariant {
                    name: name.to_string(),
                    variant: variant.clone(),
                });
            }
        }
        let idx = self.push(TypeData::Enum {
            name: name.to_string(),
            variants,
        });
        self.names.insert(name.to_string(), idx);
        tracing::debug!(name, ?idx, "declared enum type");
        Ok(idx)
    }

    // Queries

    /// Follow alias links until a non-alias type is reached.
    pub fn resolve_alias(&self, mut idx: Idx) -> Idx {
        while let Some(TypeData::Alias { target, .. }) = self.get(idx) {
            idx = *target;
        }
        idx
    }

    /// Descriptor after alias resolution.
    pub fn resolved(&self, idx: Idx) -> Option<&TypeData> {
        self.get(self.resolve_alias(idx))
    }

    /// Whether `idx` is (an alias of) `thing`.
    pub fn is_any(&self, idx: Idx) -> bool {
        self.resolve_alias(idx) == Idx::ANY
    }

    pub fn array_elem(&self, idx: Idx) -> Option<Idx> {
        match self.resolved(idx)? {
            TypeData::Array { elem } => Some(*elem),
            _ => None,
        }
    }

    pub fn map_types(&self, idx: Idx) -> Option<(Idx, Idx)> {
        match self.resolved(idx)? {
            TypeData::Map { key, value } => Some((*key, *value)),
            _ => None,
        }
    }

    pub fn struct_fields(&self, idx: Idx) -> Option<&[(String, Idx)]> {
        match self.resolved(idx)? {
            TypeData::Struct { fields, .. } => Some(fields),
            _ => None,
        }
    }

    /// Declared type of one struct field.
    pub fn field_type(&self, idx: Idx, field: &str) -> Option<Idx> {
        self.struct_fields(idx)?
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, ty)| *ty)
    }

    pub fn enum_variants(&self, idx: Idx) -> Option<&[String]> {
        match self.resolved(idx)? {
            TypeData::Enum { variants, .. } => Some(variants),
            _ => None,
        }
    }

    pub fn named_underlying(&self, idx: Idx) -> Option<Idx> {
        match self.resolved(idx)? {
            TypeData::Named { underlying, .. } => Some(*underlying),
            _ => None,
        }
    }

    pub fn function_signature(&self, idx: Idx) -> Option<(&[Idx], &[Idx])> {
        match self.resolved(idx)? {
            TypeData::Function { params, returns } => Some((params, returns)),
            _ => None,
        }
    }

    /// One-directional compatibility: may a value of `from` be stored where
    /// `to` is declared?
    pub fn assignable(&self, from: Idx, to: Idx) -> bool {
        let from = self.resolve_alias(from);
        let to = self.resolve_alias(to);
        if to == Idx::ANY || from == to {
            return true;
        }
        match (self.get(from), self.get(to)) {
            // Numeric widening only goes one way.
            (Some(TypeData::Int), Some(TypeData::Float)) => true,
            (Some(TypeData::Array { elem: a }), Some(TypeData::Array { elem: b })) => {
                self.assignable(*a, *b)
            }
            (
                Some(TypeData::Map { key: k1, value: v1 }),
                Some(TypeData::Map { key: k2, value: v2 }),
            ) => self.assignable(*k1, *k2) && self.assignable(*v1, *v2),
            (
                Some(TypeData::Function {
                    params: p1,
                    returns: r1,
                }),
                Some(TypeData::Function {
                    params: p2,
                    returns: r2,
                }),
            ) => {
                p1.len() == p2.len()
                    && r1.len() == r2.len()
                    && p1.iter().zip(p2).all(|(a, b)| self.assignable(*a, *b))
                    && r1.iter().zip(r2).all(|(a, b)| self.assignable(*a, *b))
            }
            // Enums, named types and declared structs are nominal: only the
            // identical entry (handled above) is assignable.
            _ => false,
        }
    }

    /// Whether values of this type may be compared with `==` and used as map keys.
    pub fn is_comparable(&self, idx: Idx) -> bool {
        match self.resolved(idx) {
            Some(
                TypeData::Int
                | TypeData::Float
                | TypeData::Str
                | TypeData::Bool
                | TypeData::Nil
                | TypeData::Error
                | TypeData::Enum { .. },
            ) => true,
            Some(TypeData::Named { underlying, .. }) => self.is_comparable(*underlying),
            Some(TypeData::Struct { fields, .. }) => {
                fields.iter().all(|(_, ty)| self.is_comparable(*ty))
            }
            _ => false,
        }
    }

    /// Human-readable type name for diagnostics.
    pub fn display(&self, idx: Idx) -> String {
        let Some(data) = self.get(idx) else {
            return idx.to_string();
        };
        if let Some(name) = data.declared_name() {
            return name.to_string();
        }
        match data {
            TypeData::Array { elem } => format!("[]{}", self.display(*elem)),
            TypeData::Map { key, value } => {
                format!("map[{}]{}", self.display(*key), self.display(*value))
            }
            TypeData::Struct { fields, .. } => {
                let fields: Vec<String> = fields
                    .iter()
                    .map(|(name, ty)| format!("{name} {}", self.display(*ty)))
                    .collect();
                format!("struct{{{}}}", fields.join(", "))
            }
            TypeData::Function { params, returns } => {
                let params: Vec<String> = params.iter().map(|p| self.display(*p)).collect();
                let mut out = format!("func({})", params.join(", "));
                match returns.as_slice() {
                    [] => {}
                    [single] => {
                        out.push(' ');
                        out.push_str(&self.display(*single));
                    }
                    many => {
                        let many: Vec<String> = many.iter().map(|r| self.display(*r)).collect();
                        out.push_str(&format!(" ({})", many.join(", ")));
                    }
                }
                out
            }
            _ => idx.to_string(),
        }
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn check_unique_fields(fields: &[(String, Idx)]) -> Result<(), TypeError> {
    for (i, (name, _)) in fields.iter().enumerate() {
        if fields[..i].iter().any(|(other, _)| other == name) {
            return Err(TypeError::DuplicateField {
                field: name.clone(),
            });
        }
    }
    Ok(())
}

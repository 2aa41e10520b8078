//! Type descriptors stored in the registry.

use crate::Idx;

/// What a registry entry describes.
///
/// Structural entries (arrays, maps, functions, anonymous structs) are
/// hash-consed: building the same shape twice yields the same `Idx`.
/// Nominal entries (named types, enums, declared structs) get a fresh `Idx`
/// per declaration.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeData {
    Int,
    Float,
    Str,
    Bool,
    Nil,
    Error,
    Any,
    Tuple,
    Array {
        elem: Idx,
    },
    Map {
        key: Idx,
        value: Idx,
    },
    /// `name` is `Some` for `type P struct {...}` and `None` for anonymous
    /// struct types. Fields keep declaration order.
    Struct {
        name: Option<String>,
        fields: Vec<(String, Idx)>,
    },
    Enum {
        name: String,
        variants: Vec<String>,
    },
    Function {
        params: Vec<Idx>,
        returns: Vec<Idx>,
    },
    /// Nominally distinct wrapper over `underlying` (`type Meters float`).
    Named {
        name: String,
        underlying: Idx,
    },
    /// Transparent alias (`type Id = int`).
    Alias {
        name: String,
        target: Idx,
    },
}

impl TypeData {
    /// Whether entries of this shape are deduplicated structurally.
    pub(crate) fn is_structural(&self) -> bool {
        match self {
            TypeData::Array { .. } | TypeData::Map { .. } | TypeData::Function { .. } => true,
            TypeData::Struct { name, .. } => name.is_none(),
            _ => false,
        }
    }

    /// The declared name of a nominal type, if any.
    pub fn declared_name(&self) -> Option<&str> {
        match self {
            TypeData::Struct { name, .. } => name.as_deref(),
            TypeData::Enum { name, .. }
            | TypeData::Named { name, .. }
            | TypeData::Alias { name, .. } => Some(name),
            _ => None,
        }
    }
}

//! Type index handle.
//!
//! Every type lives in the [`TypeRegistry`](crate::TypeRegistry) arena and is
//! referred to by its 32-bit index. Equality of indices is type identity:
//! nominal types (named types, enums, declared structs) are never shared, so
//! comparing two `Idx` values is the nominal equality check. Method tables are
//! keyed by `Idx` as well.

use std::fmt;

/// A 32-bit index into the type registry.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct Idx(u32);

impl Idx {
    // === Primitive Types ===
    // Pre-registered at registry creation, fixed positions.

    /// The `int` type (64-bit signed integer).
    pub const INT: Self = Self(0);
    /// The `float` type (64-bit floating point).
    pub const FLOAT: Self = Self(1);
    /// The `string` type.
    pub const STR: Self = Self(2);
    /// The `bool` type.
    pub const BOOL: Self = Self(3);
    /// The type of `nil`.
    pub const NIL: Self = Self(4);
    /// The built-in `error` type.
    pub const ERROR: Self = Self(5);
    /// `thing`: accepts every value, must be asserted before use.
    pub const ANY: Self = Self(6);
    /// Multi-value carrier. Never declared, only reported.
    pub const TUPLE: Self = Self(7);

    /// Number of pre-registered primitive types.
    pub const PRIMITIVE_COUNT: u32 = 8;

    /// Sentinel for "no type yet" (uninitialized bindings).
    pub const NONE: Self = Self(u32::MAX);

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_primitive(self) -> bool {
        self.0 < Self::PRIMITIVE_COUNT
    }

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }

    /// Source-level name for primitives, `None` for registry-allocated types.
    #[inline]
    pub const fn name(self) -> Option<&'static str> {
        match self.0 {
            0 => Some("int"),
            1 => Some("float"),
            2 => Some("string"),
            3 => Some("bool"),
            4 => Some("nil"),
            5 => Some("error"),
            6 => Some("thing"),
            7 => Some("tuple"),
            u32::MAX => Some("<uninitialized>"),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for Idx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "Idx::{name}"),
            None => write!(f, "Idx({})", self.0),
        }
    }
}

impl fmt::Display for Idx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "type#{}", self.0),
        }
    }
}

const _: () = assert!(std::mem::size_of::<Idx>() == 4);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_check_works() {
        assert!(Idx::INT.is_primitive());
        assert!(Idx::TUPLE.is_primitive());
        assert!(!Idx::from_raw(Idx::PRIMITIVE_COUNT).is_primitive());
        assert!(!Idx::NONE.is_primitive());
    }

    #[test]
    fn display_uses_source_names() {
        assert_eq!(Idx::STR.to_string(), "string");
        assert_eq!(Idx::ANY.to_string(), "thing");
        assert_eq!(Idx::from_raw(40).to_string(), "type#40");
        assert_eq!(format!("{:?}", Idx::INT), "Idx::int");
    }
}

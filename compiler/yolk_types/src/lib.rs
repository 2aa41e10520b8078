//! Yolk types - the registry behind the gradual type system.
//!
//! Values carry an [`Idx`] naming their type. The [`TypeRegistry`] maps those
//! indices to [`TypeData`] descriptors and answers the two questions the
//! evaluator keeps asking:
//!
//! - [`TypeRegistry::assignable`]: may a value of one type be stored where
//!   another is declared?
//! - [`TypeRegistry::is_comparable`]: may values of this type be compared with
//!   `==` or used as map keys?
//!
//! `thing` ([`Idx::ANY`]) accepts everything; a value stored into it must be
//! asserted back to a concrete type before use.

mod data;
mod error;
mod idx;
mod registry;
mod resolve;

pub use data::TypeData;
pub use error::TypeError;
pub use idx::Idx;
pub use registry::TypeRegistry;

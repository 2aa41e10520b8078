//! Registry errors.

use thiserror::Error;

/// Failure to declare or resolve a type.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TypeError {
    #[error("undefined type: {name}")]
    Unresolved { name: String },

    #[error("type {name} is already declared")]
    AlreadyDeclared { name: String },

    #[error("invalid map key type: {ty} is not comparable")]
    InvalidMapKey { ty: String },

    #[error("duplicate field {field} in struct type")]
    DuplicateField { field: String },

    #[error("duplicate variant {variant} in enum {name}")]
    DuplicateVariant { name: String, variant: String },

    #[error("enum {name} must declare at least one variant")]
    EmptyEnum { name: String },
}

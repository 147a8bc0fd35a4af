//! Type shapes the analyses care about.
//!
//! The analyses only ever inspect types to classify method receivers, so
//! the model is deliberately shallow: named types with their defining
//! package, pointers, anonymous structs, and an opaque escape hatch for
//! everything else.

use serde::{Deserialize, Serialize};

use crate::TypeId;

/// The shape of a type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeKind {
    /// A declared named type, e.g. `Executor` in `example.com/app`.
    Named { package: String, name: String },
    /// A pointer to another type.
    Pointer { elem: TypeId },
    /// An anonymous struct shape. These appear as the receivers of
    /// bound-method wrappers and are never matchable by pattern.
    Struct,
    /// Any other shape, carried for display only.
    Opaque { display: String },
}

//! Index types for the program arenas.
//!
//! These are lightweight aliases for indices into the arenas owned by
//! [`Program`](crate::Program). They provide documentation value without
//! runtime cost; arenas are append-only, so an id handed out by a builder
//! or loader never dangles.

/// Index into the package arena.
pub type PackageId = u32;

/// Index into the function arena.
pub type FuncId = u32;

/// Index into the value arena.
pub type ValueId = u32;

/// Index into the type arena.
pub type TypeId = u32;

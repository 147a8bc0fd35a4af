//! Program IR for replaycheck.
//!
//! This crate defines the data handed to the analyses: an SSA-flavored
//! whole-program IR (packages, functions, values, types), the call graph
//! with its root-extension builder, a [`ProgramBuilder`] for frontends and
//! tests, and the JSON program-file loader.
//!
//! # Architecture
//!
//! ```text
//! frontend export (JSON) ── load ──▶ Program ──▶ CallGraphBuilder ──▶ analyses
//!                                       ▲
//! ProgramBuilder (frontends, tests) ────┘
//! ```
//!
//! A [`Program`] is immutable once finalized. The call graph is rebuilt from
//! its root set whenever the roots grow; the analyses extend the roots
//! between phases, never during a traversal.

mod build;
mod callgraph;
mod ids;
mod load;
mod program;
mod span;
mod types;
mod value;

#[cfg(test)]
mod callgraph_tests;

pub use build::ProgramBuilder;
pub use callgraph::{CallGraph, CallGraphBuilder, Edge, SiteRef};
pub use ids::{FuncId, PackageId, TypeId, ValueId};
pub use load::{LoadError, load_program, read_program};
pub use program::{CallSite, Function, Package, Param, Program};
pub use span::Span;
pub use types::TypeKind;
pub use value::{UnaryOp, ValueKind};

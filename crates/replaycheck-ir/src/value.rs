//! SSA value nodes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{FuncId, ValueId};

/// Unary operators that can appear in a value chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    /// Pointer load. The only operator the resolver follows through.
    Deref,
    Not,
    Neg,
    Complement,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UnaryOp::Deref => "deref",
            UnaryOp::Not => "not",
            UnaryOp::Neg => "neg",
            UnaryOp::Complement => "complement",
        };
        f.write_str(name)
    }
}

/// A node in the SSA value graph.
///
/// The resolver pattern-matches over this sum. Kinds it does not understand
/// are modeled as [`ValueKind::Opaque`] so an unknown node degrades into a
/// warning instead of defeating the whole analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueKind {
    /// A direct reference to a function.
    FuncRef { func: FuncId },
    /// Boxing a value into an interface.
    MakeInterface { operand: ValueId },
    /// Merge of the values flowing in from multiple predecessors.
    Phi { edges: Vec<ValueId> },
    /// Unary operator application.
    UnOp { op: UnaryOp, operand: ValueId },
    /// A formal parameter of `func`, identified by name.
    Parameter { func: FuncId, name: String },
    /// Closure construction over `func`, capturing `bindings`.
    MakeClosure {
        func: FuncId,
        #[serde(default)]
        bindings: Vec<ValueId>,
    },
    /// A slice over a backing array.
    Slice { base: ValueId },
    /// A stack or heap allocation.
    Alloc,
    /// The address of an element of `base`.
    IndexAddr {
        base: ValueId,
        #[serde(default)]
        index: Option<ValueId>,
    },
    /// A store instruction. Never resolvable itself; reachable only through
    /// the referrer index.
    Store { addr: ValueId, value: ValueId },
    /// A node kind the resolver does not model.
    Opaque { display: String },
}

impl ValueKind {
    /// Short kind name used in resolver diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ValueKind::FuncRef { .. } => "function reference",
            ValueKind::MakeInterface { .. } => "interface box",
            ValueKind::Phi { .. } => "phi",
            ValueKind::UnOp { .. } => "unary op",
            ValueKind::Parameter { .. } => "parameter",
            ValueKind::MakeClosure { .. } => "closure",
            ValueKind::Slice { .. } => "slice",
            ValueKind::Alloc => "alloc",
            ValueKind::IndexAddr { .. } => "index address",
            ValueKind::Store { .. } => "store",
            ValueKind::Opaque { .. } => "opaque",
        }
    }

    /// The value operands of this node, for the referrer index.
    pub(crate) fn operands(&self) -> Vec<ValueId> {
        match self {
            ValueKind::FuncRef { .. } | ValueKind::Alloc | ValueKind::Parameter { .. } => {
                Vec::new()
            }
            ValueKind::MakeInterface { operand } | ValueKind::UnOp { operand, .. } => {
                vec![*operand]
            }
            ValueKind::Phi { edges } => edges.clone(),
            ValueKind::MakeClosure { bindings, .. } => bindings.clone(),
            ValueKind::Slice { base } => vec![*base],
            ValueKind::IndexAddr { base, index } => {
                let mut operands = vec![*base];
                operands.extend(*index);
                operands
            }
            ValueKind::Store { addr, value } => vec![*addr, *value],
            ValueKind::Opaque { .. } => Vec::new(),
        }
    }
}

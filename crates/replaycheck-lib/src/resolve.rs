//! Back-solving SSA values to the functions they may hold.
//!
//! Best-effort by contract: the resolver over-approximates where that is
//! safe (φ-nodes, parameter back-propagation) and gives up with an error
//! where IR reasoning is defeated. Callers convert errors into warnings at
//! the callsite boundary; a resolver failure never aborts an analysis run.

use indexmap::IndexSet;

use replaycheck_ir::{CallGraph, FuncId, Program, UnaryOp, ValueId, ValueKind};

/// Why a value could not be resolved.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ResolveError {
    /// The value chain re-entered itself.
    #[error("value chain loops back on itself")]
    Cycle,
    /// An operator the resolver does not follow through.
    #[error("unsupported operator {0} in value chain")]
    UnsupportedOperator(UnaryOp),
    /// A node kind the resolver does not model.
    #[error("unsupported {0} node in value chain")]
    UnsupportedNode(&'static str),
    /// A parameter value names no parameter of its function.
    #[error("parameter {name} not found in signature of {func}")]
    UnknownParameter { func: String, name: String },
    /// A caller passes no argument in the parameter's operand slot.
    #[error("callsite passes no argument for parameter slot {0}")]
    MissingArgument(usize),
}

/// Resolve the set of concrete functions `value` may hold at runtime.
///
/// `seen` tracks the values already on this resolution's path; re-entering
/// one aborts the branch with [`ResolveError::Cycle`]. The result may
/// contain duplicates when several chains reach the same function.
pub fn resolve_functions(
    program: &Program,
    graph: &CallGraph,
    value: ValueId,
    seen: &mut IndexSet<ValueId>,
) -> Result<Vec<FuncId>, ResolveError> {
    if !seen.insert(value) {
        return Err(ResolveError::Cycle);
    }

    match program.value(value) {
        ValueKind::FuncRef { func } => Ok(vec![*func]),

        ValueKind::MakeInterface { operand } => resolve_functions(program, graph, *operand, seen),

        ValueKind::Phi { edges } => {
            let mut result = Vec::new();
            for &edge in edges {
                result.extend(resolve_functions(program, graph, edge, seen)?);
            }
            Ok(result)
        }

        ValueKind::UnOp { op, operand } => match op {
            UnaryOp::Deref => resolve_functions(program, graph, *operand, seen),
            other => Err(ResolveError::UnsupportedOperator(*other)),
        },

        // Back-propagate through every caller: the parameter holds whatever
        // each callsite passes in its operand slot.
        ValueKind::Parameter { func, name } => {
            let owner = program.function(*func);
            let index = owner
                .param_index(name)
                .ok_or_else(|| ResolveError::UnknownParameter {
                    func: program.qualified_name(*func),
                    name: name.clone(),
                })?;
            let slot = index + 1;

            let mut result = Vec::new();
            for edge in graph.callers_of(*func) {
                let site = program.call_site(edge.site.func, edge.site.index);
                let &argument = site
                    .operands
                    .get(slot)
                    .ok_or(ResolveError::MissingArgument(slot))?;
                result.extend(resolve_functions(program, graph, argument, seen)?);
            }
            Ok(result)
        }

        ValueKind::MakeClosure { func, .. } => Ok(vec![*func]),

        // Variadic provider lists arrive as a slice over a backing array.
        ValueKind::Slice { base } => resolve_functions(program, graph, *base, seen),

        ValueKind::Alloc => {
            let mut result = Vec::new();
            for &referrer in program.referrers(value) {
                match program.value(referrer) {
                    // The slice that exposed this allocation refers back to
                    // it; following it would only close a trivial loop.
                    ValueKind::Slice { .. } => continue,
                    // Stores are instructions, not values.
                    ValueKind::Store { .. } => continue,
                    _ => result.extend(resolve_functions(program, graph, referrer, seen)?),
                }
            }
            Ok(result)
        }

        ValueKind::IndexAddr { .. } => {
            let mut result = Vec::new();
            for &referrer in program.referrers(value) {
                match program.value(referrer) {
                    ValueKind::Store { value: stored, .. } => {
                        result.extend(resolve_functions(program, graph, *stored, seen)?);
                    }
                    _ => result.extend(resolve_functions(program, graph, referrer, seen)?),
                }
            }
            Ok(result)
        }

        other @ (ValueKind::Store { .. } | ValueKind::Opaque { .. }) => {
            Err(ResolveError::UnsupportedNode(other.kind_name()))
        }
    }
}

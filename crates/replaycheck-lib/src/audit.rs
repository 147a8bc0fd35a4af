//! The deny-path audit.
//!
//! Walks the call graph forward from one workflow root and classifies every
//! edge's callee against the allow and deny sets. A deny hit is a finding
//! carrying the full path as evidence; an allow hit fences off the subtree
//! (the wrapper is trusted). Everything else is descended into.

use std::io;

use indexmap::IndexSet;

use replaycheck_ir::{CallGraph, Edge, FuncId, Program};

use crate::config;
use crate::pattern::Pattern;
use crate::reporter::TerminalReporter;
use crate::runner::Check;

/// Finding kind for reachable non-deterministic calls.
pub const KIND_NON_DETERMINISTIC_CALL: &str = "ERROR-NON-DETERMINISTIC-CALL";

/// Fatal audit failures.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    /// The root was never added to the call graph.
    #[error("could not find call graph node for function {0}")]
    MissingRoot(String),
    /// The reporter's output stream failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Flags calls from workflow code into deny-listed functions.
#[derive(Debug, Clone)]
pub struct DenyPathCheck {
    allow: IndexSet<Pattern>,
    deny: IndexSet<Pattern>,
}

impl DenyPathCheck {
    pub fn new(
        allow: impl IntoIterator<Item = Pattern>,
        deny: impl IntoIterator<Item = Pattern>,
    ) -> Self {
        Self {
            allow: allow.into_iter().collect(),
            deny: deny.into_iter().collect(),
        }
    }
}

impl Default for DenyPathCheck {
    /// The built-in allow and deny lists.
    fn default() -> Self {
        Self::new(config::allow_patterns(), config::deny_patterns())
    }
}

impl Check for DenyPathCheck {
    fn check(
        &self,
        func: FuncId,
        program: &Program,
        graph: &CallGraph,
        reporter: &mut TerminalReporter<'_>,
    ) -> Result<(), CheckError> {
        if !graph.contains(func) {
            return Err(CheckError::MissingRoot(program.qualified_name(func)));
        }

        // Shared sub-trees are reached through more than one prefix; the
        // path key keeps each reported prefix unique under this root.
        let mut seen_paths: IndexSet<String> = IndexSet::new();

        visit_edges(graph, func, |edge, previous| {
            if !seen_paths.insert(path_key(program, previous, edge)) {
                return Ok(false);
            }

            let pattern = match Pattern::from_function(program, edge.callee) {
                Ok(pattern) => pattern,
                Err(err) => {
                    let pos = reporter.format_call_site(program, edge);
                    reporter.warning(&format!(
                        "Unable to determine function signature of callee at {pos}: {err}"
                    ))?;
                    // Unknown is not denied; keep walking underneath it.
                    return Ok(true);
                }
            };
            let Some(pattern) = pattern else {
                // Anonymous functions are pass-through.
                return Ok(true);
            };

            reporter.debug(&format!(
                "workflow calls {}:{}:{}",
                pattern.package, pattern.receiver, pattern.method
            ))?;

            if self.deny.contains(&pattern) {
                let mut trace = previous.to_vec();
                trace.push(*edge);
                let message = format!("detected call to {}", program.qualified_name(edge.callee));
                reporter.workflow_issue(program, KIND_NON_DETERMINISTIC_CALL, &message, &trace)?;
                return Ok(false);
            }
            if self.allow.contains(&pattern) {
                return Ok(false);
            }
            Ok(true)
        })
    }
}

/// Depth-first edge traversal with a per-root visited set.
///
/// The callback sees each edge plus the path taken to its caller and
/// decides whether to descend past it. Callees already expanded on an
/// earlier path are pruned, which keeps the walk finite on cyclic graphs at
/// the cost of not enumerating every distinct path through shared
/// sub-trees.
fn visit_edges<F>(graph: &CallGraph, root: FuncId, mut callback: F) -> Result<(), CheckError>
where
    F: FnMut(&Edge, &[Edge]) -> Result<bool, CheckError>,
{
    let mut visited: IndexSet<FuncId> = IndexSet::new();
    let mut stack: Vec<Edge> = Vec::new();
    visit(graph, root, &mut callback, &mut visited, &mut stack)
}

fn visit<F>(
    graph: &CallGraph,
    node: FuncId,
    callback: &mut F,
    visited: &mut IndexSet<FuncId>,
    stack: &mut Vec<Edge>,
) -> Result<(), CheckError>
where
    F: FnMut(&Edge, &[Edge]) -> Result<bool, CheckError>,
{
    if !visited.insert(node) {
        return Ok(());
    }

    for &edge in graph.callees_of(node) {
        if callback(&edge, stack)? {
            stack.push(edge);
            visit(graph, edge.callee, callback, visited, stack)?;
            stack.pop();
        }
    }
    Ok(())
}

/// Deduplication key: the callers along the path, then the final callee.
fn path_key(program: &Program, previous: &[Edge], edge: &Edge) -> String {
    let mut key = String::new();
    for e in previous.iter().chain(std::iter::once(edge)) {
        key.push_str(&program.qualified_name(e.caller));
        key.push(';');
    }
    key.push_str(&program.qualified_name(edge.callee));
    key
}

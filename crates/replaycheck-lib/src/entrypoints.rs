//! Workflow entrypoint discovery.
//!
//! Registration functions (`workflow.Register` and friends) record their
//! argument as a workflow root. Discovery locates the registrar by pattern,
//! enumerates its callers through the call graph, and back-solves the
//! registered value at each callsite to concrete functions.

use std::io;

use indexmap::IndexSet;

use replaycheck_ir::{CallGraph, Edge, FuncId, Program};

use crate::pattern::{Pattern, strip_vendor};
use crate::reporter::TerminalReporter;
use crate::resolve::resolve_functions;

/// Fatal discovery failures.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    /// Registration patterns cannot name methods.
    #[error("unable to find registration function {0}: pattern matching on receiver types is unsupported")]
    ReceiverPattern(Pattern),
    /// The reporter's output stream failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Find every function registered through callsites of the function that
/// matches `pattern`.
///
/// A missing registrar yields no functions: the analyzed program may not
/// use the framework at all. Callsites the resolver cannot handle are
/// reported as warnings and skipped; discovery continues on the rest of the
/// program.
pub fn find_registered_functions(
    reporter: &mut TerminalReporter<'_>,
    program: &Program,
    graph: &CallGraph,
    pattern: &Pattern,
) -> Result<Vec<FuncId>, DiscoveryError> {
    let Some(registrar) = find_registrar(program, pattern)? else {
        reporter.debug(&format!("registration function {pattern} not in program"))?;
        return Ok(Vec::new());
    };
    reporter.debug(&format!("found registration function {pattern}"))?;

    let call_sites: Vec<Edge> = graph.callers_of(registrar).copied().collect();
    reporter.debug(&format!("found {} callers to {pattern}", call_sites.len()))?;

    let mut result = Vec::new();
    for edge in &call_sites {
        let site = program.call_site(edge.site.func, edge.site.index);
        let Some(&registered) = site.operands.get(1) else {
            reporter.warning(&format!(
                "Unable to infer registered function at callsite {}: callsite has no argument",
                site.pos
            ))?;
            continue;
        };

        let mut seen = IndexSet::new();
        match resolve_functions(program, graph, registered, &mut seen) {
            Ok(functions) if functions.is_empty() => {
                reporter.warning(&format!(
                    "Unable to infer registered function at callsite {}: inferred 0 functions",
                    site.pos
                ))?;
            }
            Ok(functions) => result.extend(functions),
            Err(err) => {
                reporter.warning(&format!(
                    "Unable to infer registered function at callsite {}: {err}",
                    site.pos
                ))?;
            }
        }
    }

    reporter.debug(&format!(
        "found {} functions registered using {pattern}",
        result.len()
    ))?;
    Ok(result)
}

/// Locate the function `pattern` names, scanning packages in declaration
/// order. `None` when the program does not link the framework.
fn find_registrar(program: &Program, pattern: &Pattern) -> Result<Option<FuncId>, DiscoveryError> {
    if !pattern.receiver.is_empty() {
        return Err(DiscoveryError::ReceiverPattern(pattern.clone()));
    }

    for (id, pkg) in program.packages() {
        if strip_vendor(&pkg.path) == pattern.package
            && let Some(func) = program.package_function(id, &pattern.method)
        {
            return Ok(Some(func));
        }
    }

    Ok(None)
}

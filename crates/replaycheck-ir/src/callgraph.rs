//! The call graph and its root-extension builder.
//!
//! The graph is a directed multigraph of statically resolvable call edges,
//! recomputed from a root set by a breadth-first walk. A function that is
//! only ever passed around as a value has no edges until it becomes a root;
//! the runner re-roots the graph between its discovery phases for exactly
//! that reason.

use std::collections::VecDeque;

use indexmap::{IndexMap, IndexSet};

use crate::{FuncId, Program};

/// Identifies a callsite as (owning function, index into its callsite list).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SiteRef {
    pub func: FuncId,
    pub index: u32,
}

/// One call edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub caller: FuncId,
    pub callee: FuncId,
    pub site: SiteRef,
}

#[derive(Debug, Default)]
struct Node {
    incoming: Vec<usize>,
    outgoing: Vec<usize>,
}

/// A call graph over the functions reachable from a root set.
///
/// Duplicate edges are kept as-is; consumers that care deduplicate by path.
#[derive(Debug, Default)]
pub struct CallGraph {
    nodes: IndexMap<FuncId, Node>,
    edges: Vec<Edge>,
}

impl CallGraph {
    pub fn contains(&self, func: FuncId) -> bool {
        self.nodes.contains_key(&func)
    }

    /// Number of functions in the graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Edges into `func`. Empty when the function is not in the graph.
    pub fn callers_of(&self, func: FuncId) -> impl Iterator<Item = &Edge> + '_ {
        self.nodes
            .get(&func)
            .into_iter()
            .flat_map(move |node| node.incoming.iter().map(move |&i| &self.edges[i]))
    }

    /// Edges out of `func`. Empty when the function is not in the graph.
    pub fn callees_of(&self, func: FuncId) -> impl Iterator<Item = &Edge> + '_ {
        self.nodes
            .get(&func)
            .into_iter()
            .flat_map(move |node| node.outgoing.iter().map(move |&i| &self.edges[i]))
    }

    fn ensure_node(&mut self, func: FuncId) {
        self.nodes.entry(func).or_default();
    }

    fn add_edge(&mut self, edge: Edge) {
        let index = self.edges.len();
        self.edges.push(edge);
        self.nodes.entry(edge.caller).or_default().outgoing.push(index);
        self.nodes.entry(edge.callee).or_default().incoming.push(index);
    }
}

/// Owns the root set and rebuilds the graph whenever it grows.
#[derive(Debug)]
pub struct CallGraphBuilder<'p> {
    program: &'p Program,
    roots: IndexSet<FuncId>,
    graph: CallGraph,
}

impl<'p> CallGraphBuilder<'p> {
    pub fn new(program: &'p Program) -> Self {
        Self {
            program,
            roots: IndexSet::new(),
            graph: CallGraph::default(),
        }
    }

    pub fn graph(&self) -> &CallGraph {
        &self.graph
    }

    /// Seed the roots with every `main` and `init` function of the
    /// program's main packages and rebuild.
    pub fn add_program_entries(&mut self) {
        for (id, pkg) in self.program.packages() {
            if pkg.name != "main" {
                continue;
            }
            for entry in ["main", "init"] {
                if let Some(func) = self.program.package_function(id, entry) {
                    self.roots.insert(func);
                }
            }
        }
        self.rebuild();
    }

    /// Extend the root set and rebuild.
    pub fn add_roots(&mut self, roots: impl IntoIterator<Item = FuncId>) {
        self.roots.extend(roots);
        self.rebuild();
    }

    fn rebuild(&mut self) {
        let mut graph = CallGraph::default();
        let mut seen: IndexSet<FuncId> = self.roots.iter().copied().collect();
        let mut queue: VecDeque<FuncId> = seen.iter().copied().collect();

        for &root in &self.roots {
            graph.ensure_node(root);
        }

        while let Some(func) = queue.pop_front() {
            for (index, site) in self.program.function(func).call_sites.iter().enumerate() {
                graph.add_edge(Edge {
                    caller: func,
                    callee: site.callee,
                    site: SiteRef {
                        func,
                        index: index as u32,
                    },
                });
                if seen.insert(site.callee) {
                    queue.push_back(site.callee);
                }
            }
        }

        self.graph = graph;
    }
}

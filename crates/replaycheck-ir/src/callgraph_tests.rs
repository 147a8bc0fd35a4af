//! Tests for call graph construction.

use crate::{CallGraphBuilder, FuncId, ProgramBuilder, Program, Span};

fn pos(line: u32) -> Span {
    Span::new("app/main.src", line, 1)
}

/// main -> a -> b, with c unreachable.
fn diamond_free_program() -> (Program, FuncId, FuncId, FuncId, FuncId) {
    let mut b = ProgramBuilder::new();
    let pkg = b.add_package("example.com/app", "main");
    let main = b.add_function(Some(pkg), "main");
    let a = b.add_function(Some(pkg), "a");
    let bee = b.add_function(Some(pkg), "b");
    let c = b.add_function(Some(pkg), "c");
    b.add_call(main, pos(2), a, &[]);
    b.add_call(a, pos(6), bee, &[]);
    b.add_call(c, pos(9), bee, &[]);
    (b.finish(), main, a, bee, c)
}

#[test]
fn entries_walk_reachable_functions_only() {
    let (program, main, a, bee, c) = diamond_free_program();
    let mut builder = CallGraphBuilder::new(&program);
    builder.add_program_entries();
    let graph = builder.graph();

    assert!(graph.contains(main));
    assert!(graph.contains(a));
    assert!(graph.contains(bee));
    assert!(!graph.contains(c));

    let callees: Vec<FuncId> = graph.callees_of(main).map(|e| e.callee).collect();
    assert_eq!(callees, vec![a]);
    let callers: Vec<FuncId> = graph.callers_of(bee).map(|e| e.caller).collect();
    assert_eq!(callers, vec![a]);
}

#[test]
fn add_roots_recomputes_the_graph() {
    let (program, _, _, bee, c) = diamond_free_program();
    let mut builder = CallGraphBuilder::new(&program);
    builder.add_program_entries();
    assert!(!builder.graph().contains(c));

    builder.add_roots([c]);
    let graph = builder.graph();
    assert!(graph.contains(c));
    // Roots are walked breadth-first, so the new root's edge lands before
    // the one discovered through main.
    let callers: Vec<FuncId> = graph.callers_of(bee).map(|e| e.caller).collect();
    assert_eq!(callers, vec![c, builder_caller_a(&program)]);
}

fn builder_caller_a(program: &Program) -> FuncId {
    program
        .functions()
        .find(|(_, f)| f.name == "a")
        .map(|(id, _)| id)
        .unwrap()
}

#[test]
fn only_main_packages_seed_entries() {
    let mut b = ProgramBuilder::new();
    let lib = b.add_package("example.com/lib", "lib");
    let f = b.add_function(Some(lib), "main");
    let program = b.finish();

    let mut builder = CallGraphBuilder::new(&program);
    builder.add_program_entries();
    assert!(!builder.graph().contains(f));
    assert!(builder.graph().is_empty());
}

#[test]
fn init_is_an_entry_of_main_packages() {
    let mut b = ProgramBuilder::new();
    let pkg = b.add_package("example.com/app", "main");
    let init = b.add_function(Some(pkg), "init");
    let helper = b.add_function(Some(pkg), "helper");
    b.add_call(init, pos(1), helper, &[]);
    let program = b.finish();

    let mut builder = CallGraphBuilder::new(&program);
    builder.add_program_entries();
    assert!(builder.graph().contains(init));
    assert!(builder.graph().contains(helper));
}

#[test]
fn duplicate_call_sites_keep_duplicate_edges() {
    let mut b = ProgramBuilder::new();
    let pkg = b.add_package("example.com/app", "main");
    let main = b.add_function(Some(pkg), "main");
    let helper = b.add_function(Some(pkg), "helper");
    b.add_call(main, pos(2), helper, &[]);
    b.add_call(main, pos(3), helper, &[]);
    let program = b.finish();

    let mut builder = CallGraphBuilder::new(&program);
    builder.add_program_entries();
    assert_eq!(builder.graph().callees_of(main).count(), 2);
    assert_eq!(builder.graph().callers_of(helper).count(), 2);
}

#[test]
fn cyclic_programs_terminate() {
    let mut b = ProgramBuilder::new();
    let pkg = b.add_package("example.com/app", "main");
    let main = b.add_function(Some(pkg), "main");
    let ping = b.add_function(Some(pkg), "ping");
    let pong = b.add_function(Some(pkg), "pong");
    b.add_call(main, pos(2), ping, &[]);
    b.add_call(ping, pos(5), pong, &[]);
    b.add_call(pong, pos(8), ping, &[]);
    let program = b.finish();

    let mut builder = CallGraphBuilder::new(&program);
    builder.add_program_entries();
    assert_eq!(builder.graph().len(), 3);
    assert_eq!(builder.graph().callers_of(ping).count(), 2);
}

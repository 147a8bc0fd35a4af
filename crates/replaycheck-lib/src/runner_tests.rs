//! End-to-end runner tests.
//!
//! Each test assembles a whole program the way the corresponding real-world
//! registration idiom lowers into the IR, runs the default (or a substitute)
//! configuration, and compares the full report line-for-line.

use std::io::Write;

use indoc::indoc;

use replaycheck_ir::{Program, ProgramBuilder, Span};

use crate::audit::DenyPathCheck;
use crate::config::{provider_patterns, registration_patterns};
use crate::pattern::Pattern;
use crate::reporter::TerminalReporter;
use crate::runner::{Check, Runner, RunnerError, run, run_program};

fn pos(line: u32) -> Span {
    Span::new("app/main.src", line, 1)
}

/// A main package plus the workflow framework's registrars.
struct Harness {
    b: ProgramBuilder,
    app: replaycheck_ir::PackageId,
    main: replaycheck_ir::FuncId,
    register: replaycheck_ir::FuncId,
    register_with_options: replaycheck_ir::FuncId,
}

fn harness() -> Harness {
    let mut b = ProgramBuilder::new();
    let app = b.add_package("example.com/app", "main");
    let main = b.add_function(Some(app), "main");
    b.set_pos(main, pos(5));
    let workflow = b.add_package("go.uber.org/cadence/workflow", "workflow");
    let register = b.add_function(Some(workflow), "Register");
    let register_with_options = b.add_function(Some(workflow), "RegisterWithOptions");
    Harness {
        b,
        app,
        main,
        register,
        register_with_options,
    }
}

fn run_to_string(program: &Program, verbose: bool) -> String {
    let mut out = Vec::new();
    run_program(program, &mut out, verbose).expect("analysis should succeed");
    String::from_utf8(out).expect("utf-8 output")
}

fn lines(parts: &[&str]) -> String {
    parts.join("\n") + "\n"
}

#[test]
fn direct_registration_of_clean_workflow() {
    let mut h = harness();
    let wf = h.b.add_function(Some(h.app), "workflowImpl");
    let arg = h.b.func_ref(wf);
    h.b.add_call(h.main, pos(10), h.register, &[arg]);
    let program = h.b.finish();

    let output = run_to_string(&program, false);
    assert_eq!(
        output,
        lines(&["CHECK example.com/app.workflowImpl", "OK - No issues found"])
    );
}

#[test]
fn workflow_calling_time_now_is_flagged() {
    let mut h = harness();
    let time = h.b.add_package("time", "time");
    let now = h.b.add_function(Some(time), "Now");
    h.b.set_pos(now, Span::new("time/time.src", 40, 1));
    let wf = h.b.add_function(Some(h.app), "workflowImpl");
    h.b.set_pos(wf, pos(3));
    h.b.add_call(wf, Span::new("app/main.src", 4, 9), now, &[]);
    let arg = h.b.func_ref(wf);
    h.b.add_call(h.main, pos(10), h.register, &[arg]);
    let program = h.b.finish();

    let output = run_to_string(&program, false);
    let expected = lines(&[
        "CHECK example.com/app.workflowImpl",
        "[ERROR-NON-DETERMINISTIC-CALL] detected call to time.Now",
        "\t#  1 app/main.src:4:9 (example.com/app.workflowImpl) -->",
        "\t#  2 time/time.src:40:1 (time.Now)",
        "Found 1 issues",
    ]);
    assert_eq!(output, expected);
}

#[test]
fn provider_registered_constructor_is_discovered() {
    let mut h = harness();
    let fx = h.b.add_package("go.uber.org/fx", "fx");
    let provide = h.b.add_function(Some(fx), "Provide");
    let init = h.b.add_function(Some(h.app), "init");
    let new_executor = h.b.add_function(Some(h.app), "NewExecutor");
    let wf = h.b.add_function(Some(h.app), "workflowImpl");

    // fx.Provide(NewExecutor) is variadic: the constructor arrives as a
    // slice over a one-element allocation.
    let alloc = h.b.alloc();
    let ia = h.b.index_addr(alloc, None);
    let ctor = h.b.func_ref(new_executor);
    let boxed = h.b.make_interface(ctor);
    h.b.store(ia, boxed);
    let variadic = h.b.slice(alloc);
    h.b.add_call(init, pos(14), provide, &[variadic]);

    // The framework, not main, invokes NewExecutor; registration happens
    // inside it.
    let warg = h.b.func_ref(wf);
    let wboxed = h.b.make_interface(warg);
    let opts = h.b.opaque_value("workflow.RegisterOptions literal");
    h.b.add_call(
        new_executor,
        pos(30),
        h.register_with_options,
        &[wboxed, opts],
    );
    let program = h.b.finish();

    let output = run_to_string(&program, false);
    assert_eq!(
        output,
        lines(&["CHECK example.com/app.workflowImpl", "OK - No issues found"])
    );
}

#[test]
fn bound_method_registration_resolves_to_the_wrapper() {
    let mut h = harness();
    let fx = h.b.add_package("go.uber.org/fx", "fx");
    let provide = h.b.add_function(Some(fx), "Provide");
    let init = h.b.add_function(Some(h.app), "init");
    let new_executor = h.b.add_function(Some(h.app), "NewExecutor");

    let executor_ty = h.b.named_type("example.com/app", "Executor");
    let executor_ptr = h.b.pointer_type(executor_ty);
    let run_workflow = h.b.add_function(Some(h.app), "runWorkflow");
    h.b.set_receiver(run_workflow, "e", executor_ty);
    h.b.set_pos(run_workflow, pos(24));

    // executor.runWorkflow as a value: a closure over the synthetic $bound
    // wrapper, which calls the method on its captured receiver.
    let bound = h.b.add_function(Some(h.app), "runWorkflow$bound");
    h.b.add_free_var(bound, "executor", executor_ptr);
    let captured_recv = h.b.opaque_value("free variable executor");
    h.b.add_call(bound, pos(24), run_workflow, &[captured_recv]);

    let alloc = h.b.alloc();
    let ia = h.b.index_addr(alloc, None);
    let ctor = h.b.func_ref(new_executor);
    let ctor_boxed = h.b.make_interface(ctor);
    h.b.store(ia, ctor_boxed);
    let variadic = h.b.slice(alloc);
    h.b.add_call(init, pos(14), provide, &[variadic]);

    let executor = h.b.alloc();
    let closure = h.b.make_closure(bound, &[executor]);
    let closure_boxed = h.b.make_interface(closure);
    let opts = h.b.opaque_value("workflow.RegisterOptions literal");
    h.b.add_call(
        new_executor,
        pos(27),
        h.register_with_options,
        &[closure_boxed, opts],
    );
    let program = h.b.finish();

    let output = run_to_string(&program, false);
    assert_eq!(
        output,
        lines(&[
            "CHECK example.com/app.runWorkflow$bound",
            "OK - No issues found",
        ])
    );
}

#[test]
fn phi_merged_registration_audits_both_branches() {
    let mut h = harness();
    let wf1 = h.b.add_function(Some(h.app), "workflowImpl1");
    let wf2 = h.b.add_function(Some(h.app), "workflowImpl2");
    let r1 = h.b.func_ref(wf1);
    let r2 = h.b.func_ref(wf2);
    let merged = h.b.phi(&[r1, r2]);
    h.b.add_call(h.main, pos(18), h.register, &[merged]);
    let program = h.b.finish();

    let output = run_to_string(&program, false);
    assert_eq!(
        output,
        lines(&[
            "CHECK example.com/app.workflowImpl1",
            "CHECK example.com/app.workflowImpl2",
            "OK - No issues found",
        ])
    );
}

/// wf calls (zap.Logger).Info, whose body calls time.Now.
fn logger_program() -> Program {
    let mut h = harness();
    let zap = h.b.add_package("go.uber.org/zap", "zap");
    let logger_ty = h.b.named_type("go.uber.org/zap", "Logger");
    let logger_ptr = h.b.pointer_type(logger_ty);
    let info = h.b.add_function(Some(zap), "Info");
    h.b.set_receiver(info, "log", logger_ptr);
    h.b.set_pos(info, Span::new("zap/logger.src", 180, 1));
    let time = h.b.add_package("time", "time");
    let now = h.b.add_function(Some(time), "Now");
    h.b.add_call(info, Span::new("zap/logger.src", 184, 2), now, &[]);

    let wf = h.b.add_function(Some(h.app), "workflowImpl");
    h.b.set_pos(wf, pos(3));
    let logger = h.b.alloc();
    h.b.add_call(wf, Span::new("app/main.src", 4, 2), info, &[logger]);
    let arg = h.b.func_ref(wf);
    h.b.add_call(h.main, pos(10), h.register, &[arg]);
    h.b.finish()
}

#[test]
fn logger_info_is_flagged_by_the_builtin_deny_list() {
    let program = logger_program();
    let output = run_to_string(&program, false);
    let expected = lines(&[
        "CHECK example.com/app.workflowImpl",
        "[ERROR-NON-DETERMINISTIC-CALL] detected call to (*go.uber.org/zap.Logger).Info",
        "\t#  1 app/main.src:4:2 (example.com/app.workflowImpl) -->",
        "\t#  2 zap/logger.src:180:1 ((*go.uber.org/zap.Logger).Info)",
        "Found 1 issues",
    ]);
    assert_eq!(output, expected);
}

#[test]
fn allow_listed_logger_method_is_a_fence() {
    // Same program, but with the logger call moved to the allow list: no
    // finding, and the time.Now call inside the logger stays invisible.
    let program = logger_program();

    let mut out = Vec::new();
    let reporter = TerminalReporter::new(&mut out, false);
    let checks: Vec<Box<dyn Check>> = vec![Box::new(DenyPathCheck::new(
        [Pattern::method("go.uber.org/zap", "Logger", "Info")],
        [Pattern::function("time", "Now")],
    ))];
    let mut runner = Runner::new(reporter, checks, registration_patterns(), provider_patterns());
    runner.run(&program).expect("analysis should succeed");

    let output = String::from_utf8(out).expect("utf-8 output");
    assert_eq!(
        output,
        lines(&["CHECK example.com/app.workflowImpl", "OK - No issues found"])
    );
}

#[test]
fn slice_iteration_gives_up_with_a_warning() {
    let mut h = harness();
    let wf1 = h.b.add_function(Some(h.app), "workflowImpl1");
    let wf2 = h.b.add_function(Some(h.app), "workflowImpl2");

    let alloc = h.b.alloc();
    let ia0 = h.b.index_addr(alloc, None);
    let r1 = h.b.func_ref(wf1);
    h.b.store(ia0, r1);
    let ia1 = h.b.index_addr(alloc, None);
    let r2 = h.b.func_ref(wf2);
    h.b.store(ia1, r2);

    // The loop loads each element back out before registering it; the
    // load re-enters the index-address chain and the resolver gives up.
    let load_addr = h.b.index_addr(alloc, None);
    let element = h.b.un_op(replaycheck_ir::UnaryOp::Deref, load_addr);
    h.b.add_call(h.main, pos(16), h.register, &[element]);
    let program = h.b.finish();

    let output = run_to_string(&program, false);
    let expected = lines(&[
        "WARNING Unable to infer registered function at callsite app/main.src:16:1: \
         value chain loops back on itself",
        "OK - No issues found",
    ]);
    assert_eq!(output, expected);
}

#[test]
fn wrapper_registration_back_propagates_to_caller_argument() {
    let mut h = harness();
    let gateway_ty = h.b.named_type("example.com/app", "gateway");
    let iface = h.b.opaque_type("interface{}");
    let gw_register = h.b.add_function(Some(h.app), "Register");
    h.b.set_receiver(gw_register, "g", gateway_ty);
    h.b.add_param(gw_register, "wf", iface);
    let wf_impl = h.b.add_function(Some(h.app), "workflowImpl");

    // main: g := gateway{}; g.Register(workflowImpl)
    let recv = h.b.alloc();
    let arg = h.b.func_ref(wf_impl);
    h.b.add_call(h.main, pos(17), gw_register, &[recv, arg]);

    // The wrapper forwards its parameter to the framework registrar.
    let forwarded = h.b.parameter(gw_register, "wf");
    h.b.add_call(gw_register, pos(10), h.register, &[forwarded]);
    let program = h.b.finish();

    let output = run_to_string(&program, false);
    assert_eq!(
        output,
        lines(&["CHECK example.com/app.workflowImpl", "OK - No issues found"])
    );
}

#[test]
fn duplicate_registrations_audit_once() {
    let mut h = harness();
    let wf = h.b.add_function(Some(h.app), "workflowImpl");
    let a1 = h.b.func_ref(wf);
    h.b.add_call(h.main, pos(10), h.register, &[a1]);
    let a2 = h.b.func_ref(wf);
    h.b.add_call(h.main, pos(11), h.register, &[a2]);
    let program = h.b.finish();

    let output = run_to_string(&program, false);
    assert_eq!(
        output,
        lines(&["CHECK example.com/app.workflowImpl", "OK - No issues found"])
    );
}

#[test]
fn empty_program_is_ok() {
    let program = ProgramBuilder::new().finish();
    let output = run_to_string(&program, false);
    assert_eq!(output, "OK - No issues found\n");
}

#[test]
fn analysis_is_deterministic() {
    let mut h = harness();
    let time = h.b.add_package("time", "time");
    let now = h.b.add_function(Some(time), "Now");
    let wf = h.b.add_function(Some(h.app), "workflowImpl");
    h.b.add_call(wf, pos(4), now, &[]);
    let arg = h.b.func_ref(wf);
    h.b.add_call(h.main, pos(10), h.register, &[arg]);
    let program = h.b.finish();

    let first = run_to_string(&program, true);
    let second = run_to_string(&program, true);
    assert_eq!(first, second);
}

#[test]
fn verbose_mode_traces_discovery() {
    let mut h = harness();
    let wf = h.b.add_function(Some(h.app), "workflowImpl");
    let arg = h.b.func_ref(wf);
    h.b.add_call(h.main, pos(10), h.register, &[arg]);
    let program = h.b.finish();

    let output = run_to_string(&program, true);
    let expected = lines(&[
        "DEBUG registration function go.uber.org/fx.Provide not in program",
        "DEBUG found registration function go.uber.org/cadence/workflow.Register",
        "DEBUG found 1 callers to go.uber.org/cadence/workflow.Register",
        "DEBUG found 1 functions registered using go.uber.org/cadence/workflow.Register",
        "DEBUG found registration function go.uber.org/cadence/workflow.RegisterWithOptions",
        "DEBUG found 0 callers to go.uber.org/cadence/workflow.RegisterWithOptions",
        "DEBUG found 0 functions registered using go.uber.org/cadence/workflow.RegisterWithOptions",
        "CHECK example.com/app.workflowImpl",
        "OK - No issues found",
    ]);
    assert_eq!(output, expected);
}

#[test]
fn runs_end_to_end_from_a_program_file() {
    let text = indoc! {r#"
        {
          "packages": [
            {"path": "example.com/app", "name": "main", "functions": [0, 1]},
            {"path": "go.uber.org/cadence/workflow", "name": "workflow", "functions": [2]}
          ],
          "functions": [
            {
              "name": "main",
              "package": 0,
              "pos": {"file": "app/main.src", "line": 5, "col": 1},
              "call_sites": [
                {"pos": {"file": "app/main.src", "line": 6, "col": 2}, "callee": 2, "operands": [0, 1]}
              ]
            },
            {"name": "workflowImpl", "package": 0, "pos": {"file": "app/main.src", "line": 3, "col": 1}},
            {"name": "Register", "package": 1}
          ],
          "values": [
            {"kind": "func_ref", "func": 2},
            {"kind": "func_ref", "func": 1}
          ],
          "types": []
        }
    "#};
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(text.as_bytes()).expect("write fixture");

    let mut out = Vec::new();
    run(file.path(), &mut out, false).expect("analysis should succeed");
    assert_eq!(
        String::from_utf8(out).expect("utf-8 output"),
        lines(&["CHECK example.com/app.workflowImpl", "OK - No issues found"])
    );
}

#[test]
fn unreadable_program_file_is_fatal() {
    let mut out = Vec::new();
    let err = run(std::path::Path::new("does/not/exist.json"), &mut out, false).unwrap_err();
    assert!(matches!(err, RunnerError::Load(_)));
    assert!(out.is_empty());
}

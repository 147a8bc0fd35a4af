//! Run orchestration.
//!
//! The runner sequences one analysis: build the call graph from the program
//! entries, discover provider constructors and re-root, discover workflow
//! registrations and re-root once more, then audit every workflow with each
//! configured check and print the summary footer.

use std::io::{self, Write};
use std::path::Path;

use indexmap::IndexSet;

use replaycheck_ir::{CallGraph, CallGraphBuilder, FuncId, LoadError, Program, load_program};

use crate::audit::{CheckError, DenyPathCheck};
use crate::config;
use crate::entrypoints::{DiscoveryError, find_registered_functions};
use crate::pattern::Pattern;
use crate::reporter::TerminalReporter;

/// One analysis over one workflow root.
pub trait Check {
    fn check(
        &self,
        func: FuncId,
        program: &Program,
        graph: &CallGraph,
        reporter: &mut TerminalReporter<'_>,
    ) -> Result<(), CheckError>;
}

/// Fatal failures that abort a run. Findings are never errors.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
    #[error(transparent)]
    Check(#[from] CheckError),
    #[error("unable to write output: {0}")]
    Io(#[from] io::Error),
}

/// Sequences discovery and auditing over one program.
pub struct Runner<'w> {
    reporter: TerminalReporter<'w>,
    checks: Vec<Box<dyn Check>>,
    registration_patterns: Vec<Pattern>,
    provider_patterns: Vec<Pattern>,
}

impl<'w> Runner<'w> {
    pub fn new(
        reporter: TerminalReporter<'w>,
        checks: Vec<Box<dyn Check>>,
        registration_patterns: Vec<Pattern>,
        provider_patterns: Vec<Pattern>,
    ) -> Self {
        Self {
            reporter,
            checks,
            registration_patterns,
            provider_patterns,
        }
    }

    /// Run every configured check over every workflow discovered in
    /// `program`.
    pub fn run(&mut self, program: &Program) -> Result<(), RunnerError> {
        let mut builder = CallGraphBuilder::new(program);
        builder.add_program_entries();

        // Constructors handed to a DI provider are invoked by the framework,
        // not by any code the initial graph can see. Rooting them makes the
        // registrations inside them visible.
        let mut providers: IndexSet<FuncId> = IndexSet::new();
        for pattern in &self.provider_patterns {
            providers.extend(find_registered_functions(
                &mut self.reporter,
                program,
                builder.graph(),
                pattern,
            )?);
        }
        builder.add_roots(providers);

        let mut workflows: IndexSet<FuncId> = IndexSet::new();
        for pattern in &self.registration_patterns {
            workflows.extend(find_registered_functions(
                &mut self.reporter,
                program,
                builder.graph(),
                pattern,
            )?);
        }
        // Workflows are re-rooted too: the static builder has no edges out
        // of a function that is only ever passed around as a value.
        builder.add_roots(workflows.iter().copied());

        for &func in &workflows {
            self.reporter.enter_workflow(&program.qualified_name(func))?;
            for check in &self.checks {
                check.check(func, program, builder.graph(), &mut self.reporter)?;
            }
            self.reporter.exit_workflow()?;
        }

        self.reporter.footer()?;
        Ok(())
    }
}

/// Load the program at `path` and run the default checker configuration,
/// writing the report to `out`.
pub fn run(path: &Path, out: &mut dyn Write, verbose: bool) -> Result<(), RunnerError> {
    let program = load_program(path)?;
    run_program(&program, out, verbose)
}

/// Run the default checker configuration against an already-loaded program.
pub fn run_program(program: &Program, out: &mut dyn Write, verbose: bool) -> Result<(), RunnerError> {
    let reporter = TerminalReporter::new(out, verbose);
    let checks: Vec<Box<dyn Check>> = vec![Box::new(DenyPathCheck::default())];
    let mut runner = Runner::new(
        reporter,
        checks,
        config::registration_patterns(),
        config::provider_patterns(),
    );
    runner.run(program)
}

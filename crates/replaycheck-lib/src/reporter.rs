//! Line-oriented terminal reporting.
//!
//! The reporter owns the output stream and the issue counter for one
//! analysis. Every line format here is stable output surface; tests compare
//! it verbatim. Write failures propagate as errors and abort the run.

use std::io::{self, Write};

use replaycheck_ir::{Edge, FuncId, Program};

pub struct TerminalReporter<'a> {
    out: &'a mut dyn Write,
    verbose: bool,
    issues: usize,
}

impl<'a> TerminalReporter<'a> {
    pub fn new(out: &'a mut dyn Write, verbose: bool) -> Self {
        Self {
            out,
            verbose,
            issues: 0,
        }
    }

    /// Number of findings reported so far.
    pub fn issue_count(&self) -> usize {
        self.issues
    }

    /// Debug-level progress, printed only in verbose mode.
    pub fn debug(&mut self, message: &str) -> io::Result<()> {
        if self.verbose {
            writeln!(self.out, "DEBUG {message}")
        } else {
            Ok(())
        }
    }

    /// A recoverable analysis gap.
    pub fn warning(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "WARNING {message}")
    }

    /// Marks the start of one workflow audit.
    pub fn enter_workflow(&mut self, name: &str) -> io::Result<()> {
        writeln!(self.out, "CHECK {name}")
    }

    /// Marks the end of one workflow audit.
    pub fn exit_workflow(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Report one finding with its evidence path.
    ///
    /// Each edge prints one arrow frame; a final arrowless frame names the
    /// callee the path ends at, positioned at its definition.
    pub fn workflow_issue(
        &mut self,
        program: &Program,
        kind: &str,
        message: &str,
        trace: &[Edge],
    ) -> io::Result<()> {
        self.issues += 1;
        writeln!(self.out, "[{kind}] {message}")?;

        let mut index = 1;
        for edge in trace {
            let pos = self.format_call_site(program, edge);
            let caller = program.qualified_name(edge.caller);
            writeln!(self.out, "\t#{index:>3} {pos} ({caller}) -->")?;
            index += 1;
        }
        if let Some(last) = trace.last() {
            let pos = self.format_function(program, last.callee);
            let callee = program.qualified_name(last.callee);
            writeln!(self.out, "\t#{index:>3} {pos} ({callee})")?;
        }
        Ok(())
    }

    /// Final summary line.
    pub fn footer(&mut self) -> io::Result<()> {
        if self.issues > 0 {
            writeln!(self.out, "Found {} issues", self.issues)
        } else {
            writeln!(self.out, "OK - No issues found")
        }
    }

    /// The source position of an edge's callsite.
    pub fn format_call_site(&self, program: &Program, edge: &Edge) -> String {
        program.call_site(edge.site.func, edge.site.index).pos.to_string()
    }

    /// The source position of a function's definition, `-` when absent.
    pub fn format_function(&self, program: &Program, func: FuncId) -> String {
        match &program.function(func).pos {
            Some(pos) => pos.to_string(),
            None => "-".to_string(),
        }
    }
}

//! CLI definition: argument builders and params extraction.

use std::path::PathBuf;

use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};

pub fn build_cli() -> Command {
    Command::new("replaycheck")
        .about("Determinism linter for durable workflow programs")
        .arg(
            Arg::new("program")
                .value_name("PROGRAM")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("Program IR file to analyze"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Print debug information"),
        )
}

pub struct CheckParams {
    pub program: PathBuf,
    pub verbose: bool,
}

impl CheckParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            program: m
                .get_one::<PathBuf>("program")
                .cloned()
                .expect("PROGRAM is required"),
            verbose: m.get_flag("verbose"),
        }
    }
}

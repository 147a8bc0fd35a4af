mod cli;


use std::io::{self, Write};
use std::process;

use cli::CheckParams;

fn main() {
    let matches = cli::build_cli().get_matches();
    let params = CheckParams::from_matches(&matches);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Err(err) = replaycheck_lib::run(&params.program, &mut out, params.verbose) {
        let _ = out.flush();
        eprintln!("error: {err}");
        process::exit(1);
    }
}

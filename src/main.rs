//! CLI binary for `deadlines`.
//!
//! This binary is a thin wrapper that parses arguments and delegates to the
//! library.

use std::process::ExitCode;

use clap::Parser;
use deadlines::cli::{run, Cli};
use deadlines::paths;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let output = run(cli.command, &paths::data_dir());

    for line in output.stdout {
        println!("{line}");
    }
    for msg in output.stderr {
        eprintln!("{msg}");
    }

    output.exit_code
}

//! CLI entrypoint for Sift.
//!
//! The binary delegates to [`sift_cli::run`], which parses arguments,
//! compiles the pattern and writes results to the locked standard streams.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    sift_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}

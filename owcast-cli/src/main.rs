//! Binary crate for the `owcast` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive credential setup
//! - Human-friendly output formatting and error reporting

use clap::Parser;
use std::process::ExitCode;

mod cli;
mod logging;
mod render;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cmd = cli::Cli::parse();
    logging::init(cmd.verbose);

    match cmd.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => ExitCode::from(render::report_error(&err)),
    }
}

//! Proxysweep: find and remove stray proxy configuration.
//!
//! This is the main entry point for the `proxysweep` CLI. It parses
//! arguments, dispatches to the appropriate command handler, and handles
//! errors with proper exit codes.

mod backend;
mod backup;
mod cli;
mod commands;
mod config;
mod error;
mod exit_codes;
mod fs;
mod journal;
mod locate;
mod mirror;
mod platform;
mod report;
mod rules;
mod runner;

#[cfg(test)]
mod test_support;

use cli::Cli;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    match commands::dispatch(cli.command) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            // Print user-actionable error message to stderr
            eprintln!("Error: {}", err);

            // Return appropriate exit code
            ExitCode::from(err.exit_code() as u8)
        }
    }
}

//! Command implementations for proxysweep.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations. Each command loads preferences itself, invokes the
//! core, and renders the returned data; no state is shared between them.

mod backup;
mod clean;
mod config_cmd;
mod mirror;
mod scan;

use crate::cli::Command;
use crate::error::Result;

/// Dispatch a command to its implementation.
pub fn dispatch(command: Command) -> Result<()> {
    match command {
        Command::Scan(args) => scan::cmd_scan(args),
        Command::Clean(args) => clean::cmd_clean(args),
        Command::Mirror(mirror) => mirror::dispatch(mirror.action),
        Command::Backup(backup) => backup::dispatch(backup.action),
        Command::Config(config) => config_cmd::dispatch(config.action),
    }
}

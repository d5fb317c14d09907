//! Implementation of the `proxysweep clean` command.
//!
//! Removes proxy configuration across every enabled category:
//! - Desktop/system proxy settings
//! - Proxy environment variables (process and shell rc files)
//! - Git's global proxy
//! - APT proxy files and proxied source entries (Linux)
//! - npm/yarn/pip and wget/curl configs
//!
//! # Safety
//!
//! - Default behavior is dry-run (prints what would be removed)
//! - Requires `--yes` to actually modify anything
//! - The APT sources are snapshotted before mutation; a failed snapshot is
//!   reported in the run's outcome list but does not abort the run
//!
//! Per-category preferences from the config file apply first; `--skip-*`
//! flags override them for one invocation.

mod display;

#[cfg(test)]
mod tests;

use crate::backend;
use crate::cli::CleanArgs;
use crate::config::{CleanOptions, Preferences, prefs_path};
use crate::error::{Result, SweepError};
use crate::journal::{self, JournalAction};
use crate::platform;
use serde_json::json;

use display::{print_dry_run, print_report};

/// Execute the `proxysweep clean` command.
pub fn cmd_clean(args: CleanArgs) -> Result<()> {
    let platform = platform::current();
    let backend = backend::for_platform(platform).ok_or_else(|| {
        SweepError::Unsupported(format!("no proxy backend for platform '{}'", platform))
    })?;

    let prefs = Preferences::load(&prefs_path()).unwrap_or_default();
    let options = effective_options(&prefs, &args);

    if !args.yes {
        let findings = backend.detect_all();
        print_dry_run(&findings, prefs.language, platform::is_elevated());
        return Ok(());
    }

    let report = backend.clean_all(&options);

    journal::record(
        JournalAction::Clean,
        json!({
            "success": report.success_count,
            "failed": report.failed_count,
            "skipped": report.skipped_count,
        }),
    );

    if args.json {
        let body = serde_json::to_string_pretty(&report)
            .map_err(|e| SweepError::UserError(format!("failed to serialize report: {}", e)))?;
        println!("{}", body);
    } else {
        print_report(&report, prefs.language);
    }

    Ok(())
}

/// Per-category switches for this run: preferences first, CLI skips on top.
fn effective_options(prefs: &Preferences, args: &CleanArgs) -> CleanOptions {
    let mut options = CleanOptions::from(prefs);
    if args.skip_system {
        options.system_proxy = false;
    }
    if args.skip_env {
        options.env_variables = false;
    }
    if args.skip_git {
        options.git_proxy = false;
    }
    if args.skip_apt {
        options.apt_proxy = false;
    }
    options
}

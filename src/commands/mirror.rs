//! Implementation of the `proxysweep mirror` commands.
//!
//! `list` and `status` are read-only. `apply` snapshots the affected files,
//! then configures every selected tool independently and prints a per-tool
//! outcome map.

use crate::backup::BackupManager;
use crate::cli::{MirrorAction, MirrorApplyArgs};
use crate::config::backups_dir;
use crate::error::{Result, SweepError};
use crate::journal::{self, JournalAction};
use crate::mirror::catalog::{self, CatalogOverride};
use crate::mirror::configure::{self, MirrorSelections, MirrorTargets};
use crate::mirror::MirrorProvider;
use serde_json::json;

/// Dispatch mirror subcommands.
pub fn dispatch(action: MirrorAction) -> Result<()> {
    match action {
        MirrorAction::List => cmd_list(),
        MirrorAction::Status => cmd_status(),
        MirrorAction::Apply(args) => cmd_apply(args),
    }
}

fn cmd_list() -> Result<()> {
    println!("Known mirror providers:");
    println!();
    for provider in MirrorProvider::all() {
        let endpoints = catalog::builtin(provider);
        println!(
            "  {:<10} {} / {}",
            provider.key(),
            endpoints.name,
            endpoints.name_zh
        );
    }
    println!();
    println!("Select with e.g. `proxysweep mirror apply --apt tsinghua --npm aliyun`.");
    Ok(())
}

fn cmd_status() -> Result<()> {
    let targets = MirrorTargets::resolve();
    let status = configure::current_status(&targets);
    let not_detected = "未检测到 / Not detected";

    println!("Current mirrors:");
    println!("  APT: {}", status.apt.as_deref().unwrap_or(not_detected));
    println!("  NPM: {}", status.npm.as_deref().unwrap_or(not_detected));
    println!("  Pip: {}", status.pip.as_deref().unwrap_or(not_detected));
    Ok(())
}

fn cmd_apply(args: MirrorApplyArgs) -> Result<()> {
    let selections = MirrorSelections {
        apt: args.apt,
        npm: args.npm,
        pip: args.pip,
        yarn: args.yarn,
        snap: args.snap,
    };

    if selections.is_empty() {
        return Err(SweepError::UserError(
            "no tool selected.\n\
             Pass at least one of --apt/--npm/--pip/--yarn/--snap with a provider."
                .to_string(),
        ));
    }

    let override_table: Option<CatalogOverride> = args
        .catalog
        .as_deref()
        .map(CatalogOverride::load)
        .transpose()?;

    let targets = MirrorTargets::resolve();
    let backup = BackupManager::new(backups_dir("mirrors"), "mirrors_backup");

    let results = configure::configure_all(&targets, &selections, override_table.as_ref(), &backup);

    journal::record(JournalAction::MirrorApply, json!(results));

    println!();
    println!("Mirror configuration results:");
    for (tool, ok) in &results {
        println!("  {:<8} {}", tool, if *ok { "ok" } else { "FAILED" });
    }

    // The snapshot entry is informational; the command fails only when
    // every selected tool failed.
    let all_failed = results
        .iter()
        .filter(|(tool, _)| **tool != "backup")
        .all(|(_, ok)| !ok);
    if all_failed {
        return Err(SweepError::ToolError(
            "no selected tool could be configured; see warnings above".to_string(),
        ));
    }

    Ok(())
}

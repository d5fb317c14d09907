//! Implementation of the `proxysweep backup` commands.
//!
//! Two archive families share the same manager: `mirrors` archives are taken
//! around mirror configuration, `sources` archives around APT source
//! cleaning. Restore maps each archive's logical member names back onto the
//! current locations of the real files.

use crate::backup::{BackupManager, SnapshotSet};
use crate::cli::{BackupAction, BackupRestoreArgs, BackupScope, BackupScopeArgs};
use crate::config::backups_dir;
use crate::error::Result;
use crate::journal::{self, JournalAction};
use crate::mirror::configure::{self, MirrorTargets};
use serde_json::json;
use std::path::PathBuf;

/// Dispatch backup subcommands.
pub fn dispatch(action: BackupAction) -> Result<()> {
    match action {
        BackupAction::List(args) => cmd_list(args),
        BackupAction::Create(args) => cmd_create(args),
        BackupAction::Restore(args) => cmd_restore(args),
    }
}

fn manager_for(scope: BackupScope) -> BackupManager {
    BackupManager::new(backups_dir(scope.dir_name()), scope.prefix())
}

/// The file set a scope covers, with the same logical names used at
/// snapshot time.
fn set_for(scope: BackupScope) -> Result<SnapshotSet> {
    match scope {
        BackupScope::Mirrors => Ok(configure::backup_set(&MirrorTargets::resolve())),
        #[cfg(unix)]
        BackupScope::Sources => {
            use crate::backup::{BackupMember, BackupTree};
            let paths = crate::locate::ToolPaths::resolve();
            Ok(SnapshotSet {
                files: vec![BackupMember::new("sources.list", &paths.sources_list)],
                trees: vec![BackupTree::new(
                    "sources.list.d",
                    &paths.sources_list_dir,
                    "*.list",
                )],
            })
        }
        #[cfg(not(unix))]
        BackupScope::Sources => Err(crate::error::SweepError::Unsupported(
            "the 'sources' backup family only exists on Linux".to_string(),
        )),
    }
}

fn cmd_list(args: BackupScopeArgs) -> Result<()> {
    let manager = manager_for(args.scope);
    let archives = manager.list();

    if archives.is_empty() {
        println!("No backups found in {}.", manager.dir().display());
        return Ok(());
    }

    println!("Backups in {} (newest first):", manager.dir().display());
    for archive in &archives {
        let name = archive
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        println!("  {}", name);
    }
    Ok(())
}

fn cmd_create(args: BackupScopeArgs) -> Result<()> {
    let manager = manager_for(args.scope);
    let set = set_for(args.scope)?;

    let archive = manager.snapshot(&set)?;

    journal::record(
        JournalAction::BackupCreate,
        json!({ "archive": archive.display().to_string() }),
    );

    println!("Backup created: {}", archive.display());
    Ok(())
}

fn cmd_restore(args: BackupRestoreArgs) -> Result<()> {
    let manager = manager_for(args.scope);
    let set = set_for(args.scope)?;

    // A bare file name refers to an archive in the managed directory;
    // anything with a separator is taken as a path.
    let candidate = PathBuf::from(&args.archive);
    let archive = if candidate.components().count() > 1 || candidate.is_file() {
        candidate
    } else {
        manager.dir().join(&args.archive)
    };

    let restored = manager.restore(&archive, &set)?;

    journal::record(
        JournalAction::BackupRestore,
        json!({
            "archive": archive.display().to_string(),
            "restored": restored,
        }),
    );

    if restored.is_empty() {
        println!("Archive contained no recognized members; nothing restored.");
    } else {
        println!("Restored {} file(s):", restored.len());
        for name in &restored {
            println!("  {}", name);
        }
    }
    Ok(())
}

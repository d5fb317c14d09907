//! CLI argument parsing for proxysweep.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use crate::mirror::MirrorProvider;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Proxysweep: find and remove stray proxy configuration.
///
/// Scans shell rc files, desktop proxy settings, Git, package managers
/// (APT, NPM, Yarn, Pip), and download tools for leftover proxy
/// configuration; removes it on request with a snapshot taken first; and
/// can point the package managers at alternate mirror endpoints.
#[derive(Parser, Debug)]
#[command(name = "proxysweep")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Available commands for proxysweep.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan for proxy configuration without changing anything.
    ///
    /// Reports one finding per tool/location; safe to run repeatedly.
    Scan(ScanArgs),

    /// Remove detected proxy configuration.
    ///
    /// Dry-run by default: shows what would be cleaned. Requires --yes
    /// to mutate files and settings; a snapshot of the APT sources is
    /// taken before they are touched.
    Clean(CleanArgs),

    /// Inspect and switch package-manager mirror endpoints.
    Mirror(MirrorCommand),

    /// Manage snapshot archives of the touched configuration files.
    Backup(BackupCommand),

    /// Show or change stored preferences.
    Config(ConfigCommand),
}

/// Arguments for the `scan` command.
#[derive(Parser, Debug)]
pub struct ScanArgs {
    /// Emit findings as JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `clean` command.
#[derive(Parser, Debug)]
pub struct CleanArgs {
    /// Perform the clean. Without this flag nothing is modified.
    #[arg(long)]
    pub yes: bool,

    /// Leave the desktop/system proxy untouched.
    #[arg(long)]
    pub skip_system: bool,

    /// Leave environment variables and shell rc files untouched.
    #[arg(long)]
    pub skip_env: bool,

    /// Leave the Git global proxy untouched.
    #[arg(long)]
    pub skip_git: bool,

    /// Leave APT proxy files and sources untouched.
    #[arg(long)]
    pub skip_apt: bool,

    /// Emit the report as JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

/// Mirror management commands.
#[derive(Parser, Debug)]
pub struct MirrorCommand {
    #[command(subcommand)]
    pub action: MirrorAction,
}

#[derive(Subcommand, Debug)]
pub enum MirrorAction {
    /// List the known mirror providers.
    List,

    /// Show which mirrors the package managers currently use.
    Status,

    /// Point selected tools at a provider's endpoints.
    ///
    /// The affected files are snapshotted first; each tool is configured
    /// independently, so one failure does not stop the others.
    Apply(MirrorApplyArgs),
}

/// Arguments for `mirror apply`.
#[derive(Parser, Debug)]
pub struct MirrorApplyArgs {
    /// Provider for the APT sources.
    #[arg(long, value_enum)]
    pub apt: Option<MirrorProvider>,

    /// Provider for the npm registry.
    #[arg(long, value_enum)]
    pub npm: Option<MirrorProvider>,

    /// Provider for the pip index.
    #[arg(long, value_enum)]
    pub pip: Option<MirrorProvider>,

    /// Provider for the yarn registry.
    #[arg(long, value_enum)]
    pub yarn: Option<MirrorProvider>,

    /// Provider for the snap endpoint.
    #[arg(long, value_enum)]
    pub snap: Option<MirrorProvider>,

    /// JSON document overriding the built-in endpoint catalog.
    #[arg(long, value_name = "FILE")]
    pub catalog: Option<PathBuf>,
}

/// Backup management commands.
#[derive(Parser, Debug)]
pub struct BackupCommand {
    #[command(subcommand)]
    pub action: BackupAction,
}

#[derive(Subcommand, Debug)]
pub enum BackupAction {
    /// List archives, newest first.
    List(BackupScopeArgs),

    /// Snapshot the affected files now.
    Create(BackupScopeArgs),

    /// Restore an archive's files to their original locations.
    Restore(BackupRestoreArgs),
}

/// Which backup family a backup command operates on.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackupScope {
    /// Archives taken around mirror configuration.
    Mirrors,
    /// Archives of the APT sources taken before cleaning.
    Sources,
}

impl BackupScope {
    pub fn dir_name(self) -> &'static str {
        match self {
            BackupScope::Mirrors => "mirrors",
            BackupScope::Sources => "sources",
        }
    }

    /// Archive file-name prefix for this family.
    pub fn prefix(self) -> &'static str {
        match self {
            BackupScope::Mirrors => "mirrors_backup",
            BackupScope::Sources => "sources",
        }
    }
}

/// Arguments selecting a backup family.
#[derive(Parser, Debug)]
pub struct BackupScopeArgs {
    #[arg(long, value_enum, default_value_t = BackupScope::Mirrors)]
    pub scope: BackupScope,
}

/// Preference management commands.
#[derive(Parser, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the active preferences as JSON.
    Show,

    /// Set one preference key.
    ///
    /// Boolean keys take true/false; `language` takes bilingual, zh, or en.
    Set(ConfigSetArgs),
}

/// Arguments for `config set`.
#[derive(Parser, Debug)]
pub struct ConfigSetArgs {
    /// Preference key, e.g. clean_git_proxy.
    pub key: String,

    /// New value.
    pub value: String,
}

/// Arguments for `backup restore`.
#[derive(Parser, Debug)]
pub struct BackupRestoreArgs {
    /// Archive file name (as shown by `backup list`) or a full path.
    pub archive: String,

    #[arg(long, value_enum, default_value_t = BackupScope::Mirrors)]
    pub scope: BackupScope,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn clean_defaults_to_dry_run() {
        let cli = Cli::try_parse_from(["proxysweep", "clean"]).unwrap();
        match cli.command {
            Command::Clean(args) => {
                assert!(!args.yes);
                assert!(!args.skip_apt);
            }
            other => panic!("expected clean, got {:?}", other),
        }
    }

    #[test]
    fn mirror_apply_parses_providers() {
        let cli = Cli::try_parse_from([
            "proxysweep", "mirror", "apply", "--apt", "tsinghua", "--npm", "aliyun",
        ])
        .unwrap();
        match cli.command {
            Command::Mirror(mirror) => match mirror.action {
                MirrorAction::Apply(args) => {
                    assert_eq!(args.apt, Some(MirrorProvider::Tsinghua));
                    assert_eq!(args.npm, Some(MirrorProvider::Aliyun));
                    assert_eq!(args.pip, None);
                }
                other => panic!("expected apply, got {:?}", other),
            },
            other => panic!("expected mirror, got {:?}", other),
        }
    }

    #[test]
    fn unknown_provider_is_rejected() {
        assert!(Cli::try_parse_from(["proxysweep", "mirror", "apply", "--apt", "sjtu"]).is_err());
    }

    #[test]
    fn backup_restore_takes_archive_and_scope() {
        let cli = Cli::try_parse_from([
            "proxysweep", "backup", "restore", "mirrors_backup_20250806_120000.tar.gz",
            "--scope", "mirrors",
        ])
        .unwrap();
        match cli.command {
            Command::Backup(backup) => match backup.action {
                BackupAction::Restore(args) => {
                    assert_eq!(args.archive, "mirrors_backup_20250806_120000.tar.gz");
                    assert_eq!(args.scope, BackupScope::Mirrors);
                }
                other => panic!("expected restore, got {:?}", other),
            },
            other => panic!("expected backup, got {:?}", other),
        }
    }
}

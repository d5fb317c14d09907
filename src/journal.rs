//! Operation journal for proxysweep.
//!
//! Append-only NDJSON log of the runs that touch the system, one JSON object
//! per line in `<config dir>/journal.ndjson`:
//!
//! - `ts`: RFC3339 timestamp
//! - `action`: what ran (clean, mirror_apply, backup_create, backup_restore)
//! - `actor`: `user@HOST`
//! - `details`: freeform object with run-specific counts and selections
//!
//! Appends are best-effort at every call site: a journal that cannot be
//! written prints a warning and the operation carries on.

use crate::error::{Result, SweepError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Actions recorded in the journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalAction {
    /// A clean run mutated (or attempted to mutate) proxy settings.
    Clean,
    /// Mirror endpoints were applied to one or more tools.
    MirrorApply,
    /// A backup archive was created on request.
    BackupCreate,
    /// A backup archive was restored.
    BackupRestore,
}

impl std::fmt::Display for JournalAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JournalAction::Clean => write!(f, "clean"),
            JournalAction::MirrorApply => write!(f, "mirror_apply"),
            JournalAction::BackupCreate => write!(f, "backup_create"),
            JournalAction::BackupRestore => write!(f, "backup_restore"),
        }
    }
}

/// One journal record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    /// RFC3339 timestamp when the operation ran.
    pub ts: DateTime<Utc>,

    /// The operation that ran.
    pub action: JournalAction,

    /// Who ran it (e.g., `user@HOST`).
    pub actor: String,

    /// Freeform details: counts, provider selections, archive names.
    pub details: Value,
}

impl JournalEntry {
    /// Create an entry stamped with the current time and actor.
    pub fn new(action: JournalAction) -> Self {
        Self {
            ts: Utc::now(),
            action,
            actor: actor_string(),
            details: Value::Object(serde_json::Map::new()),
        }
    }

    /// Attach the details object.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    fn to_ndjson_line(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| SweepError::UserError(format!("failed to serialize journal entry: {}", e)))
    }
}

fn actor_string() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}

/// Default journal location.
pub fn journal_path() -> PathBuf {
    crate::config::config_dir().join("journal.ndjson")
}

/// Append an entry to the journal file, creating file and directories on
/// first use. One call, one line.
pub fn append_entry(path: &Path, entry: &JournalEntry) -> Result<()> {
    let json_line = entry.to_ndjson_line()?;

    if let Some(parent) = path.parent()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| {
            SweepError::UserError(format!(
                "failed to create journal directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            SweepError::UserError(format!(
                "failed to open journal '{}': {}",
                path.display(),
                e
            ))
        })?;

    writeln!(file, "{}", json_line).map_err(|e| {
        SweepError::UserError(format!(
            "failed to write journal '{}': {}",
            path.display(),
            e
        ))
    })?;

    Ok(())
}

/// Append an entry, downgrading failure to a stderr warning.
pub fn record(action: JournalAction, details: Value) {
    let entry = JournalEntry::new(action).with_details(details);
    if let Err(e) = append_entry(&journal_path(), &entry) {
        eprintln!("Warning: failed to record {} in journal: {}", action, e);
    }
}

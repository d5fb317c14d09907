//! Snapshot and restore of the files a mutation is about to touch.
//!
//! Snapshots are gzip-compressed tar archives named
//! `{prefix}_{YYYYmmdd_HHMMSS}.tar.gz` (UTC, second resolution). Member
//! paths inside an archive are logical (`apt/sources.list`, `npm/.npmrc`),
//! decoupled from the real filesystem locations, so a restore can land on a
//! different absolute path than the one that was backed up.
//!
//! Archive creation is atomic from the caller's perspective: the archive is
//! built under a temporary name and renamed into place only when complete,
//! so a failed snapshot never appears in `list()`.
//!
//! Restore extracts to a staging directory first — a corrupt archive leaves
//! every target untouched — then copies recognized members one by one. A
//! failure mid-copy can leave a mixed state; that limitation is accepted.
//!
//! After every successful snapshot, retention keeps the `MAX_BACKUPS` newest
//! archives and deletes the rest, oldest first.

use crate::error::{Result, SweepError};
use chrono::Utc;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use globset::{Glob, GlobMatcher};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Number of archives the retention pass keeps.
pub const MAX_BACKUPS: usize = 5;

/// One file in a snapshot: its logical archive name and its real location.
#[derive(Debug, Clone)]
pub struct BackupMember {
    pub arcname: String,
    pub path: PathBuf,
}

impl BackupMember {
    pub fn new(arcname: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            arcname: arcname.into(),
            path: path.into(),
        }
    }
}

/// A directory of same-shaped files in a snapshot (e.g. `sources.list.d`):
/// every file matching `pattern` inside `dir` is archived under
/// `{arcdir}/{file name}` and restored back by name.
#[derive(Debug, Clone)]
pub struct BackupTree {
    pub arcdir: String,
    pub dir: PathBuf,
    pub pattern: String,
}

impl BackupTree {
    pub fn new(arcdir: impl Into<String>, dir: impl Into<PathBuf>, pattern: impl Into<String>) -> Self {
        Self {
            arcdir: arcdir.into(),
            dir: dir.into(),
            pattern: pattern.into(),
        }
    }

    fn matcher(&self) -> Option<GlobMatcher> {
        Glob::new(&self.pattern).ok().map(|g| g.compile_matcher())
    }
}

/// The full file set one snapshot covers.
#[derive(Debug, Clone, Default)]
pub struct SnapshotSet {
    pub files: Vec<BackupMember>,
    pub trees: Vec<BackupTree>,
}

impl SnapshotSet {
    /// Expand trees against the live filesystem into concrete members.
    /// Missing files and directories are simply absent from the result.
    fn expand(&self) -> Vec<BackupMember> {
        let mut members: Vec<BackupMember> = self
            .files
            .iter()
            .filter(|m| m.path.is_file())
            .cloned()
            .collect();

        for tree in &self.trees {
            let Some(matcher) = tree.matcher() else { continue };
            let Ok(entries) = fs::read_dir(&tree.dir) else { continue };
            let mut found: Vec<PathBuf> = entries
                .flatten()
                .map(|e| e.path())
                .filter(|p| {
                    p.is_file()
                        && p.file_name().map(|n| matcher.is_match(n)).unwrap_or(false)
                })
                .collect();
            found.sort();
            for path in found {
                let name = path.file_name().unwrap_or_default().to_string_lossy();
                members.push(BackupMember::new(format!("{}/{}", tree.arcdir, name), path));
            }
        }

        members
    }
}

/// Creates, lists, restores, and prunes snapshot archives in one directory.
#[derive(Debug)]
pub struct BackupManager {
    dir: PathBuf,
    prefix: String,
}

impl BackupManager {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Archive every currently-existing file in the set.
    ///
    /// Returns the path of the new archive. On failure no archive appears in
    /// `list()`. A successful snapshot triggers the retention pass.
    pub fn snapshot(&self, set: &SnapshotSet) -> Result<PathBuf> {
        let stamp = Utc::now().format("%Y%m%d_%H%M%S").to_string();
        self.snapshot_named(set, &stamp)
    }

    fn snapshot_named(&self, set: &SnapshotSet, stamp: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            SweepError::BackupError(format!(
                "failed to create backup directory '{}': {}",
                self.dir.display(),
                e
            ))
        })?;

        let archive_name = format!("{}_{}.tar.gz", self.prefix, stamp);
        let final_path = self.dir.join(&archive_name);
        let temp_path = self.dir.join(format!(".{}.tmp", archive_name));

        if let Err(e) = self.write_archive(&temp_path, &set.expand()) {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }

        fs::rename(&temp_path, &final_path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            SweepError::BackupError(format!(
                "failed to finalize archive '{}': {}",
                final_path.display(),
                e
            ))
        })?;

        self.prune();
        Ok(final_path)
    }

    fn write_archive(&self, path: &Path, members: &[BackupMember]) -> Result<()> {
        let file = File::create(path).map_err(|e| {
            SweepError::BackupError(format!(
                "failed to create archive '{}': {}",
                path.display(),
                e
            ))
        })?;

        let encoder = GzEncoder::new(file, Compression::default());
        let mut builder = tar::Builder::new(encoder);

        for member in members {
            builder
                .append_path_with_name(&member.path, &member.arcname)
                .map_err(|e| {
                    SweepError::BackupError(format!(
                        "failed to archive '{}': {}",
                        member.path.display(),
                        e
                    ))
                })?;
        }

        let encoder = builder
            .into_inner()
            .map_err(|e| SweepError::BackupError(format!("failed to finish archive: {}", e)))?;
        encoder
            .finish()
            .map_err(|e| SweepError::BackupError(format!("failed to flush archive: {}", e)))?;

        Ok(())
    }

    /// All archives matching this manager's naming convention, newest first.
    pub fn list(&self) -> Vec<PathBuf> {
        let Ok(glob) = Glob::new(&format!("{}_*.tar.gz", self.prefix)) else {
            return Vec::new();
        };
        let matcher = glob.compile_matcher();

        let Ok(entries) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };

        let mut archives: Vec<(SystemTime, PathBuf)> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| {
                p.is_file()
                    && p.file_name().map(|n| matcher.is_match(n)).unwrap_or(false)
            })
            .map(|p| {
                let mtime = fs::metadata(&p)
                    .and_then(|m| m.modified())
                    .unwrap_or(SystemTime::UNIX_EPOCH);
                (mtime, p)
            })
            .collect();

        // Newest first; the name embeds the timestamp, so it breaks mtime ties.
        archives.sort_by(|a, b| b.cmp(a));
        archives.into_iter().map(|(_, p)| p).collect()
    }

    /// Delete every archive beyond the newest `MAX_BACKUPS`.
    /// Deletion failures are logged, never propagated.
    fn prune(&self) {
        for old in self.list().into_iter().skip(MAX_BACKUPS) {
            if let Err(e) = fs::remove_file(&old) {
                eprintln!(
                    "Warning: failed to remove old backup '{}': {}",
                    old.display(),
                    e
                );
            }
        }
    }

    /// Restore an archive's recognized members to their target paths.
    ///
    /// Extracts to a staging directory first, then copies each member of the
    /// set that is present in the archive. Members the set does not describe
    /// are skipped. Returns the logical names that were restored.
    pub fn restore(&self, archive: &Path, set: &SnapshotSet) -> Result<Vec<String>> {
        if !archive.is_file() {
            return Err(SweepError::UserError(format!(
                "backup archive not found: {}",
                archive.display()
            )));
        }

        let staging = self.dir.join(".restore-staging");
        if staging.exists() {
            let _ = fs::remove_dir_all(&staging);
        }
        fs::create_dir_all(&staging).map_err(|e| {
            SweepError::BackupError(format!("failed to create staging directory: {}", e))
        })?;

        let result = self.restore_staged(archive, set, &staging);
        let _ = fs::remove_dir_all(&staging);
        result
    }

    fn restore_staged(
        &self,
        archive: &Path,
        set: &SnapshotSet,
        staging: &Path,
    ) -> Result<Vec<String>> {
        let file = File::open(archive).map_err(|e| {
            SweepError::BackupError(format!(
                "failed to open archive '{}': {}",
                archive.display(),
                e
            ))
        })?;

        let mut tar = tar::Archive::new(GzDecoder::new(file));
        tar.unpack(staging).map_err(|e| {
            SweepError::BackupError(format!(
                "failed to extract archive '{}': {}",
                archive.display(),
                e
            ))
        })?;

        // Extraction is complete; from here on each copy lands directly on
        // its real target. A failure partway through leaves earlier targets
        // restored and later ones untouched.
        let mut restored = Vec::new();

        for member in &set.files {
            let staged = staging.join(&member.arcname);
            if staged.is_file() {
                copy_into_place(&staged, &member.path)?;
                restored.push(member.arcname.clone());
            }
        }

        for tree in &set.trees {
            let Some(matcher) = tree.matcher() else { continue };
            let staged_dir = staging.join(&tree.arcdir);
            let Ok(entries) = fs::read_dir(&staged_dir) else {
                continue;
            };
            let mut staged: Vec<PathBuf> = entries
                .flatten()
                .map(|e| e.path())
                .filter(|p| {
                    p.is_file()
                        && p.file_name().map(|n| matcher.is_match(n)).unwrap_or(false)
                })
                .collect();
            staged.sort();
            for path in staged {
                let name = path.file_name().unwrap_or_default().to_string_lossy().to_string();
                copy_into_place(&path, &tree.dir.join(&name))?;
                restored.push(format!("{}/{}", tree.arcdir, name));
            }
        }

        Ok(restored)
    }
}

fn copy_into_place(staged: &Path, target: &Path) -> Result<()> {
    if let Some(parent) = target.parent()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| {
            SweepError::BackupError(format!(
                "failed to create directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }

    fs::copy(staged, target).map_err(|e| {
        SweepError::BackupError(format!(
            "failed to restore '{}': {}",
            target.display(),
            e
        ))
    })?;

    Ok(())
}

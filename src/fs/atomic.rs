//! Atomic file writes.
//!
//! Every configuration rewrite in this crate goes through `atomic_write`:
//! the new content lands in a temporary file in the target's directory, is
//! synced to disk, and then atomically replaces the target. A crash mid-write
//! leaves either the old file or the new one, never a truncated mix.
//!
//! On POSIX systems `rename()` gives us the replace step directly. On Windows
//! a plain rename fails when the destination exists, so an existing target is
//! replaced through `MoveFileExW` with `MOVEFILE_REPLACE_EXISTING`.
//!
//! The temporary file is named `.{filename}.tmp`; one may be left behind
//! after a crash.

use crate::error::{Result, SweepError};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Atomically write bytes to a file, creating parent directories as needed.
pub fn atomic_write<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| {
            SweepError::UserError(format!(
                "failed to create parent directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }

    let temp_path = temp_path_for(path)?;
    write_and_sync(&temp_path, content)?;
    atomic_replace(&temp_path, path)?;

    Ok(())
}

/// Atomically write a string to a file.
pub fn atomic_write_text<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
    atomic_write(path, content.as_bytes())
}

/// Temporary file path in the same directory as the target, so the final
/// rename never crosses a filesystem boundary.
fn temp_path_for(target: &Path) -> Result<std::path::PathBuf> {
    let parent = target.parent().unwrap_or(Path::new("."));
    let filename = target
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| SweepError::UserError(format!("invalid file path '{}'", target.display())))?;

    Ok(parent.join(format!(".{}.tmp", filename)))
}

fn write_and_sync(path: &Path, content: &[u8]) -> Result<()> {
    let mut file = File::create(path).map_err(|e| {
        SweepError::UserError(format!(
            "failed to create temporary file '{}': {}",
            path.display(),
            e
        ))
    })?;

    file.write_all(content).map_err(|e| {
        let _ = fs::remove_file(path);
        SweepError::UserError(format!("failed to write temporary file: {}", e))
    })?;

    file.sync_all().map_err(|e| {
        let _ = fs::remove_file(path);
        SweepError::UserError(format!("failed to sync temporary file to disk: {}", e))
    })?;

    Ok(())
}

#[cfg(unix)]
fn atomic_replace(source: &Path, target: &Path) -> Result<()> {
    // rename() replaces an existing destination atomically on POSIX.
    fs::rename(source, target).map_err(|e| {
        let _ = fs::remove_file(source);
        SweepError::UserError(format!(
            "failed to atomically replace '{}': {}",
            target.display(),
            e
        ))
    })?;

    // Persist the directory entry as well.
    if let Some(parent) = target.parent()
        && let Ok(dir) = File::open(parent)
    {
        let _ = dir.sync_all();
    }

    Ok(())
}

#[cfg(windows)]
fn atomic_replace(source: &Path, target: &Path) -> Result<()> {
    use std::os::windows::ffi::OsStrExt;

    // A plain rename works when the target does not exist yet.
    match fs::rename(source, target) {
        Ok(()) => return Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
        Err(e) => {
            let _ = fs::remove_file(source);
            return Err(SweepError::UserError(format!(
                "failed to atomically replace '{}': {}",
                target.display(),
                e
            )));
        }
    }

    unsafe {
        let source_wide: Vec<u16> = source
            .as_os_str()
            .encode_wide()
            .chain(std::iter::once(0))
            .collect();
        let target_wide: Vec<u16> = target
            .as_os_str()
            .encode_wide()
            .chain(std::iter::once(0))
            .collect();

        const MOVEFILE_REPLACE_EXISTING: u32 = 0x1;
        const MOVEFILE_WRITE_THROUGH: u32 = 0x8;

        #[link(name = "kernel32")]
        unsafe extern "system" {
            fn MoveFileExW(
                lpExistingFileName: *const u16,
                lpNewFileName: *const u16,
                dwFlags: u32,
            ) -> i32;

            fn GetLastError() -> u32;
        }

        let result = MoveFileExW(
            source_wide.as_ptr(),
            target_wide.as_ptr(),
            MOVEFILE_REPLACE_EXISTING | MOVEFILE_WRITE_THROUGH,
        );

        if result == 0 {
            let error_code = GetLastError();
            let _ = fs::remove_file(source);
            return Err(SweepError::UserError(format!(
                "failed to atomically replace '{}': Windows error code {}",
                target.display(),
                error_code
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn writes_new_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("wgetrc");

        atomic_write(&file_path, b"use_proxy = on\n").unwrap();

        let content = fs::read_to_string(&file_path).unwrap();
        assert_eq!(content, "use_proxy = on\n");
    }

    #[test]
    fn replaces_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join(".npmrc");

        fs::write(&file_path, "proxy=http://127.0.0.1:7890\n").unwrap();
        atomic_write_text(&file_path, "registry=https://registry.npmjs.org/\n").unwrap();

        let content = fs::read_to_string(&file_path).unwrap();
        assert_eq!(content, "registry=https://registry.npmjs.org/\n");
    }

    #[test]
    fn creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join(".config").join("pip").join("pip.conf");

        atomic_write(&file_path, b"[global]\n").unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "[global]\n");
    }

    #[test]
    fn leaves_no_temp_file_on_success() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("sources.list");

        atomic_write(&file_path, b"deb http://deb.debian.org/debian trixie main\n").unwrap();

        assert!(!temp_dir.path().join(".sources.list.tmp").exists());
    }

    #[test]
    fn preserves_multiline_content() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join(".bashrc");
        let content = "alias ll='ls -l'\n\nexport EDITOR=vim\n";

        atomic_write_text(&file_path, content).unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), content);
    }

    #[test]
    fn handles_empty_content() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("empty.conf");

        atomic_write(&file_path, b"").unwrap();

        assert!(fs::read(&file_path).unwrap().is_empty());
    }
}

//! Candidate locations of proxy and mirror configuration.
//!
//! Resolves, per operating system, every file that may hold proxy or mirror
//! settings for a tool. Paths are computed from the current home directory
//! and well-known system directories at call time — nothing is cached, so a
//! changed `HOME` is respected within one process.
//!
//! Missing files are a normal, expected state; this module only answers
//! "where would it be", existence is checked downstream.

use globset::Glob;
use std::path::{Path, PathBuf};

/// Proxy environment variable names, lower- and upper-case forms.
pub const PROXY_ENV_VARS: [&str; 12] = [
    "http_proxy",
    "HTTP_PROXY",
    "https_proxy",
    "HTTPS_PROXY",
    "all_proxy",
    "ALL_PROXY",
    "no_proxy",
    "NO_PROXY",
    "ftp_proxy",
    "FTP_PROXY",
    "socks_proxy",
    "SOCKS_PROXY",
];

fn home() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Resolved candidate paths for every tool on this platform.
///
/// Built fresh per operation via `resolve()`; tests construct it directly
/// with paths inside a temporary directory.
#[cfg(unix)]
#[derive(Debug, Clone)]
pub struct ToolPaths {
    /// Shell rc files that may export proxy variables.
    pub shell_profiles: Vec<PathBuf>,
    /// APT proxy configuration candidates.
    pub apt_proxy_files: Vec<PathBuf>,
    pub sources_list: PathBuf,
    pub sources_list_dir: PathBuf,
    /// KDE kioslaverc/kiorc locations.
    pub kde_proxy_files: Vec<PathBuf>,
    pub npmrc: PathBuf,
    pub yarnrc: PathBuf,
    /// Both pip config locations; each is inspected independently.
    pub pip_confs: Vec<PathBuf>,
    pub wgetrc: PathBuf,
    pub curlrc: PathBuf,
    pub os_release: PathBuf,
}

#[cfg(unix)]
impl ToolPaths {
    /// Resolve all candidate paths from the current environment.
    pub fn resolve() -> Self {
        let home = home();
        Self {
            shell_profiles: vec![
                home.join(".bashrc"),
                home.join(".bash_profile"),
                home.join(".profile"),
                home.join(".zshrc"),
                home.join(".config").join("fish").join("config.fish"),
                PathBuf::from("/etc/environment"),
            ],
            apt_proxy_files: vec![
                PathBuf::from("/etc/apt/apt.conf.d/proxy.conf"),
                PathBuf::from("/etc/apt/apt.conf.d/00proxy"),
                PathBuf::from("/etc/apt/apt.conf.d/01proxy"),
                PathBuf::from("/etc/apt/apt.conf"),
            ],
            sources_list: PathBuf::from("/etc/apt/sources.list"),
            sources_list_dir: PathBuf::from("/etc/apt/sources.list.d"),
            kde_proxy_files: vec![
                home.join(".config").join("kioslaverc"),
                home.join(".config").join("kiorc"),
            ],
            npmrc: home.join(".npmrc"),
            yarnrc: home.join(".yarnrc"),
            pip_confs: vec![
                home.join(".pip").join("pip.conf"),
                home.join(".config").join("pip").join("pip.conf"),
            ],
            wgetrc: home.join(".wgetrc"),
            curlrc: home.join(".curlrc"),
            os_release: PathBuf::from("/etc/os-release"),
        }
    }
}

/// Resolved candidate paths for every tool on this platform.
#[cfg(windows)]
#[derive(Debug, Clone)]
pub struct ToolPaths {
    pub npmrc: PathBuf,
    pub yarnrc: PathBuf,
    /// Both pip.ini locations; each is inspected independently.
    pub pip_confs: Vec<PathBuf>,
}

#[cfg(windows)]
impl ToolPaths {
    /// Resolve all candidate paths from the current environment.
    pub fn resolve() -> Self {
        let home = home();
        let appdata = std::env::var_os("APPDATA")
            .map(PathBuf::from)
            .unwrap_or_else(|| home.clone());
        Self {
            npmrc: home.join(".npmrc"),
            yarnrc: home.join(".yarnrc"),
            pip_confs: vec![
                home.join("pip").join("pip.ini"),
                appdata.join("pip").join("pip.ini"),
            ],
        }
    }
}

/// Enumerate `*.list` fragments in a sources.list.d-style directory, sorted
/// by file name for stable ordering.
pub fn list_fragments(dir: &Path) -> Vec<PathBuf> {
    let Ok(matcher) = Glob::new("*.list").map(|g| g.compile_matcher()) else {
        return Vec::new();
    };

    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut fragments: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.file_name()
                    .map(|name| matcher.is_match(name))
                    .unwrap_or(false)
        })
        .collect();
    fragments.sort();
    fragments
}

/// Whether the current user can modify the file (or create it, when absent).
#[cfg(unix)]
pub fn can_write(path: &Path) -> bool {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let probe: &Path = if path.exists() {
        path
    } else {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    };

    let Ok(cpath) = CString::new(probe.as_os_str().as_bytes()) else {
        return false;
    };
    // Safety: cpath is a valid NUL-terminated string for the call duration.
    unsafe { libc::access(cpath.as_ptr(), libc::W_OK) == 0 }
}

/// Whether the current user can modify the file (or create it, when absent).
#[cfg(windows)]
pub fn can_write(path: &Path) -> bool {
    if path.exists() {
        std::fs::metadata(path)
            .map(|m| !m.permissions().readonly())
            .unwrap_or(false)
    } else {
        path.parent().map(Path::exists).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::HomeGuard;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    #[serial]
    #[cfg(unix)]
    fn paths_follow_home_at_call_time() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();

        let under_first = {
            let _guard = HomeGuard::set(first.path());
            ToolPaths::resolve().npmrc
        };
        let under_second = {
            let _guard = HomeGuard::set(second.path());
            ToolPaths::resolve().npmrc
        };

        assert_eq!(under_first, first.path().join(".npmrc"));
        assert_eq!(under_second, second.path().join(".npmrc"));
    }

    #[test]
    #[serial]
    #[cfg(unix)]
    fn both_pip_locations_are_listed() {
        let home = TempDir::new().unwrap();
        let _guard = HomeGuard::set(home.path());

        let paths = ToolPaths::resolve();
        assert_eq!(paths.pip_confs.len(), 2);
        assert!(paths.pip_confs[0].ends_with(".pip/pip.conf"));
        assert!(paths.pip_confs[1].ends_with(".config/pip/pip.conf"));
    }

    #[test]
    fn fragments_are_list_files_only_sorted() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.list"), "deb x y z\n").unwrap();
        fs::write(dir.path().join("a.list"), "deb x y z\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored\n").unwrap();
        fs::write(dir.path().join("c.list.save"), "ignored\n").unwrap();

        let fragments = list_fragments(dir.path());
        let names: Vec<_> = fragments
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.list", "b.list"]);
    }

    #[test]
    fn fragments_of_missing_dir_are_empty() {
        let dir = TempDir::new().unwrap();
        assert!(list_fragments(&dir.path().join("nope")).is_empty());
    }

    #[test]
    fn can_write_own_tempfile() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("file.conf");
        fs::write(&file, "x").unwrap();
        assert!(can_write(&file));
        // Absent file in a writable directory counts as writable.
        assert!(can_write(&dir.path().join("new.conf")));
    }
}

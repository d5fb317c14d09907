//! User preferences for proxysweep.
//!
//! Preferences live in a JSON file under the per-OS application data
//! directory (`~/.config/proxysweep` on Linux, `%APPDATA%\proxysweep` on
//! Windows). Parsing is forward-compatible: unknown fields are ignored and
//! missing fields take their defaults, so older and newer builds can share
//! one file.
//!
//! Core operations never read this module; they receive a `CleanOptions`
//! struct of plain booleans derived from it.

use crate::error::{Result, SweepError};
use crate::fs::atomic_write_text;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Display language for findings, outcomes, and summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Chinese and English side by side.
    #[default]
    Bilingual,
    Zh,
    En,
}

/// User preferences with the fixed key set shared with the desktop builds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub auto_clean_on_startup: bool,
    pub show_notification: bool,
    pub clean_system_proxy: bool,
    pub clean_env_variables: bool,
    pub clean_git_proxy: bool,
    pub clean_apt_proxy: bool,
    pub minimize_to_tray: bool,
    pub language: Language,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            auto_clean_on_startup: true,
            show_notification: true,
            clean_system_proxy: true,
            clean_env_variables: true,
            clean_git_proxy: true,
            clean_apt_proxy: true,
            minimize_to_tray: true,
            language: Language::Bilingual,
        }
    }
}

impl Preferences {
    /// Load preferences from a JSON file.
    ///
    /// A missing file yields the defaults. Call sites that should survive a
    /// corrupt file use `Preferences::load(..).unwrap_or_default()`.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            SweepError::UserError(format!(
                "failed to read preferences '{}': {}",
                path.display(),
                e
            ))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            SweepError::UserError(format!(
                "failed to parse preferences '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Persist preferences as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| SweepError::UserError(format!("failed to serialize preferences: {}", e)))?;
        atomic_write_text(path, &content)
    }
}

/// Per-category switches for one clean run.
///
/// Derived from preferences (or CLI flags) and passed into the backend
/// explicitly; the core never reaches into a global settings object.
#[derive(Debug, Clone, Copy)]
pub struct CleanOptions {
    pub system_proxy: bool,
    pub env_variables: bool,
    pub git_proxy: bool,
    pub apt_proxy: bool,
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self {
            system_proxy: true,
            env_variables: true,
            git_proxy: true,
            apt_proxy: true,
        }
    }
}

impl From<&Preferences> for CleanOptions {
    fn from(prefs: &Preferences) -> Self {
        Self {
            system_proxy: prefs.clean_system_proxy,
            env_variables: prefs.clean_env_variables,
            git_proxy: prefs.clean_git_proxy,
            apt_proxy: prefs.clean_apt_proxy,
        }
    }
}

/// Application data directory for preferences, journal, and backups.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("proxysweep")
}

/// Path of the preferences file.
pub fn prefs_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Backup directory for a given scope ("sources" or "mirrors").
pub fn backups_dir(scope: &str) -> PathBuf {
    config_dir().join("backups").join(scope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_enable_everything() {
        let prefs = Preferences::default();
        assert!(prefs.auto_clean_on_startup);
        assert!(prefs.clean_system_proxy);
        assert!(prefs.clean_apt_proxy);
        assert_eq!(prefs.language, Language::Bilingual);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let prefs = Preferences::load(&temp_dir.path().join("config.json")).unwrap();
        assert!(prefs.clean_env_variables);
    }

    #[test]
    fn roundtrips_through_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");

        let mut prefs = Preferences::default();
        prefs.clean_git_proxy = false;
        prefs.language = Language::En;
        prefs.save(&path).unwrap();

        let loaded = Preferences::load(&path).unwrap();
        assert!(!loaded.clean_git_proxy);
        assert_eq!(loaded.language, Language::En);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"clean_system_proxy": false, "future_option": 42}"#,
        )
        .unwrap();

        let prefs = Preferences::load(&path).unwrap();
        assert!(!prefs.clean_system_proxy);
        // Missing fields keep their defaults.
        assert!(prefs.show_notification);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();

        assert!(Preferences::load(&path).is_err());
    }

    #[test]
    fn clean_options_follow_preferences() {
        let mut prefs = Preferences::default();
        prefs.clean_apt_proxy = false;
        let opts = CleanOptions::from(&prefs);
        assert!(opts.system_proxy);
        assert!(!opts.apt_proxy);
    }

    #[test]
    fn language_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Language::Bilingual).unwrap(),
            "\"bilingual\""
        );
        assert_eq!(serde_json::to_string(&Language::Zh).unwrap(), "\"zh\"");
    }
}

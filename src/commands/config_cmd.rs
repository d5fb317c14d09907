//! Implementation of the `proxysweep config` commands.
//!
//! Preferences live in one JSON file with a fixed key set; `show` prints it
//! and `set` changes a single key. The clean command picks the values up on
//! its next run.

use crate::cli::{ConfigAction, ConfigSetArgs};
use crate::config::{Language, Preferences, prefs_path};
use crate::error::{Result, SweepError};

/// Dispatch config subcommands.
pub fn dispatch(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => cmd_show(),
        ConfigAction::Set(args) => cmd_set(args),
    }
}

fn cmd_show() -> Result<()> {
    let prefs = Preferences::load(&prefs_path())?;
    let body = serde_json::to_string_pretty(&prefs)
        .map_err(|e| SweepError::UserError(format!("failed to serialize preferences: {}", e)))?;
    println!("{}", body);
    Ok(())
}

fn cmd_set(args: ConfigSetArgs) -> Result<()> {
    let path = prefs_path();
    let mut prefs = Preferences::load(&path).unwrap_or_default();

    apply_setting(&mut prefs, &args.key, &args.value)?;
    prefs.save(&path)?;

    println!("Set {} = {}", args.key, args.value);
    Ok(())
}

/// Apply one key/value pair to the preference set.
fn apply_setting(prefs: &mut Preferences, key: &str, value: &str) -> Result<()> {
    if key == "language" {
        prefs.language = match value {
            "bilingual" => Language::Bilingual,
            "zh" => Language::Zh,
            "en" => Language::En,
            other => {
                return Err(SweepError::UserError(format!(
                    "invalid language '{}'; expected bilingual, zh, or en",
                    other
                )));
            }
        };
        return Ok(());
    }

    let flag = value.parse::<bool>().map_err(|_| {
        SweepError::UserError(format!(
            "invalid value '{}' for '{}'; expected true or false",
            value, key
        ))
    })?;

    match key {
        "auto_clean_on_startup" => prefs.auto_clean_on_startup = flag,
        "show_notification" => prefs.show_notification = flag,
        "clean_system_proxy" => prefs.clean_system_proxy = flag,
        "clean_env_variables" => prefs.clean_env_variables = flag,
        "clean_git_proxy" => prefs.clean_git_proxy = flag,
        "clean_apt_proxy" => prefs.clean_apt_proxy = flag,
        "minimize_to_tray" => prefs.minimize_to_tray = flag,
        other => {
            return Err(SweepError::UserError(format!(
                "unknown preference key '{}'.\n\
                 Keys: auto_clean_on_startup, show_notification, clean_system_proxy,\n\
                 clean_env_variables, clean_git_proxy, clean_apt_proxy, minimize_to_tray, language",
                other
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boolean_keys_are_applied() {
        let mut prefs = Preferences::default();
        apply_setting(&mut prefs, "clean_apt_proxy", "false").unwrap();
        assert!(!prefs.clean_apt_proxy);

        apply_setting(&mut prefs, "clean_apt_proxy", "true").unwrap();
        assert!(prefs.clean_apt_proxy);
    }

    #[test]
    fn language_accepts_known_values_only() {
        let mut prefs = Preferences::default();
        apply_setting(&mut prefs, "language", "en").unwrap();
        assert_eq!(prefs.language, Language::En);

        assert!(apply_setting(&mut prefs, "language", "fr").is_err());
    }

    #[test]
    fn unknown_keys_and_non_bool_values_are_rejected() {
        let mut prefs = Preferences::default();
        assert!(apply_setting(&mut prefs, "no_such_key", "true").is_err());
        assert!(apply_setting(&mut prefs, "clean_git_proxy", "yes").is_err());
    }
}

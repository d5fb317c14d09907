//! Tests for the clean command.

use super::effective_options;
use crate::cli::CleanArgs;
use crate::config::Preferences;

fn args() -> CleanArgs {
    CleanArgs {
        yes: false,
        skip_system: false,
        skip_env: false,
        skip_git: false,
        skip_apt: false,
        json: false,
    }
}

#[test]
fn preferences_drive_the_defaults() {
    let mut prefs = Preferences::default();
    prefs.clean_git_proxy = false;

    let options = effective_options(&prefs, &args());
    assert!(options.system_proxy);
    assert!(!options.git_proxy);
}

#[test]
fn skip_flags_override_preferences() {
    let prefs = Preferences::default();
    let mut skip_args = args();
    skip_args.skip_apt = true;
    skip_args.skip_system = true;

    let options = effective_options(&prefs, &skip_args);
    assert!(!options.apt_proxy);
    assert!(!options.system_proxy);
    assert!(options.env_variables);
    assert!(options.git_proxy);
}

#[test]
fn skip_flags_never_enable_a_disabled_category() {
    let mut prefs = Preferences::default();
    prefs.clean_env_variables = false;

    let options = effective_options(&prefs, &args());
    assert!(!options.env_variables);
}

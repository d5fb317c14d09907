//! Implementation of the `proxysweep scan` command.
//!
//! Runs the platform backend's detection pass and renders the findings.
//! Read-only: nothing on the system changes, so no confirmation is needed.

use crate::backend;
use crate::cli::ScanArgs;
use crate::config::{Language, Preferences, prefs_path};
use crate::error::{Result, SweepError};
use crate::platform;
use crate::report::Finding;

/// Execute the `proxysweep scan` command.
pub fn cmd_scan(args: ScanArgs) -> Result<()> {
    let platform = platform::current();
    let backend = backend::for_platform(platform).ok_or_else(|| {
        SweepError::Unsupported(format!("no proxy backend for platform '{}'", platform))
    })?;

    let prefs = Preferences::load(&prefs_path()).unwrap_or_default();
    let findings = backend.detect_all();

    if args.json {
        let body = serde_json::to_string_pretty(&findings)
            .map_err(|e| SweepError::UserError(format!("failed to serialize findings: {}", e)))?;
        println!("{}", body);
        return Ok(());
    }

    print_findings(&findings, prefs.language);
    Ok(())
}

fn print_findings(findings: &[Finding], language: Language) {
    println!("Scan results ({} checks):", findings.len());
    println!();

    for finding in findings {
        let marker = if finding.found { "!" } else { " " };
        println!("  [{}] {}", marker, finding.message(language));
    }

    println!();
    let found = findings.iter().filter(|f| f.found).count();
    if found == 0 {
        println!("No proxy configuration detected.");
    } else {
        println!(
            "{} item(s) detected. Run `proxysweep clean --yes` to remove them.",
            found
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendering_does_not_panic_on_mixed_findings() {
        let findings = vec![
            Finding::found(
                "env_HTTP_PROXY",
                Some("http://127.0.0.1:7890".to_string()),
                "环境变量已设置",
                "Environment variable set",
            ),
            Finding::absent("git_proxy", "Git 代理未设置", "Git proxy not set"),
        ];
        print_findings(&findings, Language::Bilingual);
        print_findings(&findings, Language::En);
        print_findings(&[], Language::Zh);
    }
}

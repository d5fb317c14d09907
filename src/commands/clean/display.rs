//! Display and formatting utilities for clean command output.

use crate::config::Language;
use crate::report::{CleanReport, Finding, Status};

/// Print what a real run would target, without touching anything.
pub fn print_dry_run(findings: &[Finding], language: Language, elevated: bool) {
    let found: Vec<&Finding> = findings.iter().filter(|f| f.found).collect();

    if found.is_empty() {
        println!("No proxy configuration detected; nothing to clean.");
        return;
    }

    println!("Would clean {} item(s):", found.len());
    println!();
    for finding in &found {
        println!("  - {}", finding.message(language));
    }
    println!();
    if !elevated {
        println!("Note: running unprivileged; system-owned files may be skipped.");
    }
    println!("Dry-run mode: no changes made.");
    println!("Run with --yes to perform the clean.");
}

/// Print the outcome list and summary of a completed run.
pub fn print_report(report: &CleanReport, language: Language) {
    println!("Clean outcomes:");
    println!();

    for outcome in &report.outcomes {
        println!("  [{}] {}", status_label(outcome.status), outcome.message(language));
        if let Some(details) = &outcome.details {
            println!("        {}", details);
        }
    }

    println!();
    println!("{}", report.summary(language));
}

fn status_label(status: Status) -> &'static str {
    match status {
        Status::Success => "ok",
        Status::Failed => "FAILED",
        Status::Skipped => "skip",
        Status::NotFound => "none",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Outcome;

    #[test]
    fn status_labels_are_distinct() {
        let labels = [
            status_label(Status::Success),
            status_label(Status::Failed),
            status_label(Status::Skipped),
            status_label(Status::NotFound),
        ];
        for (i, a) in labels.iter().enumerate() {
            for (j, b) in labels.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b);
                }
            }
        }
    }

    #[test]
    fn printing_handles_all_shapes() {
        let mut report = CleanReport::new();
        report.push(Outcome::new("a", Status::Success, "好", "ok").with_details("detail"));
        report.push(Outcome::new("b", Status::Failed, "坏", "bad"));
        print_report(&report, Language::Bilingual);

        print_dry_run(&[], Language::En, true);
        let findings = vec![Finding::found("x", None, "找到", "found")];
        print_dry_run(&findings, Language::En, false);
    }
}

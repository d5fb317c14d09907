//! Detection findings and mutation outcomes.
//!
//! These are the plain data structures the core hands back to whatever is
//! displaying them. Findings come out of a scan, outcomes out of a clean run;
//! both carry their message in Chinese and English and are rendered according
//! to the configured language. Nothing here is persisted.

use crate::config::Language;
use serde::Serialize;

/// Result of one mutation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Success,
    Failed,
    Skipped,
    NotFound,
}

/// A single detection result for one tool/location.
///
/// `value` is only ever present when `found` is true.
#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    pub item: String,
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub message_zh: String,
    pub message_en: String,
}

impl Finding {
    /// A positive finding, optionally carrying the detected value.
    pub fn found(
        item: impl Into<String>,
        value: Option<String>,
        message_zh: impl Into<String>,
        message_en: impl Into<String>,
    ) -> Self {
        Self {
            item: item.into(),
            found: true,
            value,
            message_zh: message_zh.into(),
            message_en: message_en.into(),
        }
    }

    /// A negative finding. Carries no value by construction.
    pub fn absent(
        item: impl Into<String>,
        message_zh: impl Into<String>,
        message_en: impl Into<String>,
    ) -> Self {
        Self {
            item: item.into(),
            found: false,
            value: None,
            message_zh: message_zh.into(),
            message_en: message_en.into(),
        }
    }

    /// Render the message in the requested language.
    pub fn message(&self, language: Language) -> String {
        render(language, &self.message_zh, &self.message_en)
    }
}

/// A single mutation result for one tool/location.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    pub item: String,
    pub status: Status,
    pub message_zh: String,
    pub message_en: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl Outcome {
    pub fn new(
        item: impl Into<String>,
        status: Status,
        message_zh: impl Into<String>,
        message_en: impl Into<String>,
    ) -> Self {
        Self {
            item: item.into(),
            status,
            message_zh: message_zh.into(),
            message_en: message_en.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Render the message in the requested language.
    pub fn message(&self, language: Language) -> String {
        render(language, &self.message_zh, &self.message_en)
    }
}

/// Ordered outcomes of one clean run, with running counts per status.
///
/// Owned by the caller that requested the run; discarded after display.
#[derive(Debug, Default, Serialize)]
pub struct CleanReport {
    pub outcomes: Vec<Outcome>,
    pub success_count: usize,
    pub failed_count: usize,
    pub skipped_count: usize,
}

impl CleanReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an outcome and update the running counts.
    pub fn push(&mut self, outcome: Outcome) {
        match outcome.status {
            Status::Success => self.success_count += 1,
            Status::Failed => self.failed_count += 1,
            Status::Skipped | Status::NotFound => self.skipped_count += 1,
        }
        self.outcomes.push(outcome);
    }

    pub fn summary_zh(&self) -> String {
        format!(
            "清理完成: 成功 {}, 失败 {}, 跳过 {}",
            self.success_count, self.failed_count, self.skipped_count
        )
    }

    pub fn summary_en(&self) -> String {
        format!(
            "Clean completed: Success {}, Failed {}, Skipped {}",
            self.success_count, self.failed_count, self.skipped_count
        )
    }

    /// Render the summary in the requested language.
    pub fn summary(&self, language: Language) -> String {
        render(language, &self.summary_zh(), &self.summary_en())
    }
}

fn render(language: Language, zh: &str, en: &str) -> String {
    match language {
        Language::Zh => zh.to_string(),
        Language::En => en.to_string(),
        Language::Bilingual => format!("{} / {}", zh, en),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_finding_carries_no_value() {
        let finding = Finding::absent("git_proxy", "Git 代理未设置", "Git proxy not set");
        assert!(!finding.found);
        assert!(finding.value.is_none());
    }

    #[test]
    fn found_finding_keeps_value() {
        let finding = Finding::found(
            "env_HTTP_PROXY",
            Some("http://127.0.0.1:7890".to_string()),
            "环境变量已设置",
            "Environment variable set",
        );
        assert!(finding.found);
        assert_eq!(finding.value.as_deref(), Some("http://127.0.0.1:7890"));
    }

    #[test]
    fn report_counts_by_status() {
        let mut report = CleanReport::new();
        report.push(Outcome::new("a", Status::Success, "好", "ok"));
        report.push(Outcome::new("b", Status::Failed, "坏", "bad"));
        report.push(Outcome::new("c", Status::Skipped, "跳", "skip"));
        report.push(Outcome::new("d", Status::NotFound, "无", "none"));

        assert_eq!(report.success_count, 1);
        assert_eq!(report.failed_count, 1);
        assert_eq!(report.skipped_count, 2);
        assert_eq!(report.outcomes.len(), 4);
    }

    #[test]
    fn messages_render_per_language() {
        let outcome = Outcome::new("x", Status::Success, "系统代理已清理", "System proxy cleaned");
        assert_eq!(outcome.message(Language::Zh), "系统代理已清理");
        assert_eq!(outcome.message(Language::En), "System proxy cleaned");
        assert_eq!(
            outcome.message(Language::Bilingual),
            "系统代理已清理 / System proxy cleaned"
        );
    }

    #[test]
    fn summary_reflects_counts() {
        let mut report = CleanReport::new();
        report.push(Outcome::new("a", Status::Success, "好", "ok"));
        assert_eq!(report.summary_en(), "Clean completed: Success 1, Failed 0, Skipped 0");
    }

    #[test]
    fn findings_serialize_without_null_value() {
        let finding = Finding::absent("apt_proxy", "未设置", "not set");
        let json = serde_json::to_string(&finding).unwrap();
        assert!(!json.contains("value"));
    }
}

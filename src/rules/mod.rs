//! Per-tool detection predicates and strip transforms.
//!
//! One rule per tool knows two things about that tool's config format: how
//! to tell whether proxy configuration is present (`matches`/`extract`), and
//! how to remove it (`strip`). Rules operate on content only — no I/O — so
//! the same rule serves detection, dry runs, and cleaning.
//!
//! `strip` is line-oriented and idempotent: matching lines are removed and
//! any run of three or more consecutive blank lines collapses to a single
//! blank line. The collapse only happens when a removal occurred; content
//! with nothing to remove comes back byte-identical with `changed = false`,
//! so stripping twice is always a no-op the second time.

use regex::Regex;
use std::sync::LazyLock;

/// Loopback-style substrings treated as a sign that a repository source
/// goes through a local proxy. Deliberately crude: it misses proxies on
/// other hosts/ports and can flag a genuine local mirror.
pub const PROXY_INDICATORS: [&str; 6] = [
    "http://127.0.0.1",
    "http://localhost",
    ":7890",
    ":1080",
    ":8080",
    ":10809",
];

const SHELL_VAR_NAMES: &str = "https?_proxy|HTTP_PROXY|HTTPS_PROXY|all_proxy|ALL_PROXY|\
                               no_proxy|NO_PROXY|ftp_proxy|FTP_PROXY|socks_proxy|SOCKS_PROXY";

static SHELL_EXPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?m)^export\s+(?:{})=.*$", SHELL_VAR_NAMES)).unwrap()
});
static SHELL_ASSIGN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?m)^(?:{})=.*$", SHELL_VAR_NAMES)).unwrap());
static SHELL_VALUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?m)^(?:export\s+)?(?:{})=(.*)$", SHELL_VAR_NAMES)).unwrap()
});

static APT_PROXY_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^Acquire::.*(?i:proxy).*$").unwrap());

static SOURCES_LOOPBACK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"http://127\.0\.0\.1:\d+").unwrap());
static SOURCES_LOCALHOST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"http://localhost:\d+").unwrap());

static KDE_PROXY_TYPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ProxyType=\d+").unwrap());

static NPMRC_PROXY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(?:https?-)?proxy=.*$").unwrap());
static NPMRC_VALUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(?:https?-)?proxy=(.*)$").unwrap());

static YARNRC_PROXY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(?:https?-)?proxy.*$").unwrap());

static PIP_PROXY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^proxy\s*=.*$").unwrap());
static PIP_VALUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^proxy\s*=\s*(.*)$").unwrap());

static WGETRC_PROXY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?mi)^(?:https?_proxy|use_proxy)\s*=.*$").unwrap());
static WGETRC_VALUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?mi)^(?:https?_proxy|use_proxy)\s*=\s*(.*)$").unwrap());

static CURLRC_PROXY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?mi)^(?:-x|--proxy|proxy)\s*.*$").unwrap());

static BLANK_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// The tool config formats this crate knows how to inspect and rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolRule {
    /// Shell rc files with `export VAR=...` / `VAR=...` lines.
    ShellRc,
    /// APT conf files with `Acquire::*::Proxy` directives.
    AptConf,
    /// APT sources.list with loopback-proxied repository URLs.
    SourcesList,
    /// KDE kioslaverc/kiorc with a `ProxyType=` key.
    KdeRc,
    Npmrc,
    Yarnrc,
    PipConf,
    Wgetrc,
    Curlrc,
}

impl ToolRule {
    /// Whether the content carries proxy configuration for this tool.
    pub fn matches(self, content: &str) -> bool {
        match self {
            ToolRule::ShellRc => SHELL_VALUE_RE.is_match(content),
            ToolRule::AptConf => {
                content.contains("Acquire::") && content.to_lowercase().contains("proxy")
            }
            ToolRule::SourcesList => PROXY_INDICATORS.iter().any(|ind| content.contains(ind)),
            ToolRule::KdeRc => KDE_PROXY_TYPE_RE
                .find_iter(content)
                .any(|m| m.as_str() != "ProxyType=0"),
            ToolRule::Npmrc | ToolRule::Yarnrc | ToolRule::PipConf | ToolRule::Wgetrc => {
                content.to_lowercase().contains("proxy")
            }
            // A bare `-x host:port` line has no "proxy" substring, so curl
            // detection matches on the same lines the strip removes.
            ToolRule::Curlrc => CURLRC_PROXY_RE.is_match(content),
        }
    }

    /// Extract a displayable value for a positive detection, when the format
    /// has one worth showing.
    pub fn extract(self, content: &str) -> Option<String> {
        let captured = match self {
            ToolRule::ShellRc => SHELL_VALUE_RE
                .captures(content)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().trim().trim_matches(['"', '\'']).to_string()),
            ToolRule::AptConf => {
                if self.matches(content) {
                    Some(content.trim().chars().take(100).collect())
                } else {
                    None
                }
            }
            ToolRule::SourcesList => PROXY_INDICATORS
                .iter()
                .find(|ind| content.contains(*ind))
                .map(|ind| ind.to_string()),
            ToolRule::KdeRc => KDE_PROXY_TYPE_RE
                .find_iter(content)
                .find(|m| m.as_str() != "ProxyType=0")
                .map(|m| m.as_str().to_string()),
            ToolRule::Npmrc => NPMRC_VALUE_RE
                .captures(content)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().trim().to_string()),
            ToolRule::Yarnrc => YARNRC_PROXY_RE
                .find(content)
                .map(|m| m.as_str().trim().to_string()),
            ToolRule::PipConf => PIP_VALUE_RE
                .captures(content)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().trim().to_string()),
            ToolRule::Wgetrc => WGETRC_VALUE_RE
                .captures(content)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().trim().to_string()),
            ToolRule::Curlrc => CURLRC_PROXY_RE
                .find(content)
                .map(|m| m.as_str().trim().to_string()),
        };
        captured.filter(|v| !v.is_empty())
    }

    /// Remove this tool's proxy configuration from the content.
    ///
    /// Returns the new content and whether anything changed. Idempotent:
    /// stripping already-stripped content returns it unchanged.
    pub fn strip(self, content: &str) -> (String, bool) {
        match self {
            ToolRule::ShellRc => strip_lines(content, &[&SHELL_EXPORT_RE, &SHELL_ASSIGN_RE]),
            ToolRule::AptConf => strip_lines(content, &[&APT_PROXY_LINE_RE]),
            ToolRule::SourcesList => {
                strip_lines(content, &[&SOURCES_LOOPBACK_RE, &SOURCES_LOCALHOST_RE])
            }
            ToolRule::KdeRc => {
                let stripped = KDE_PROXY_TYPE_RE.replace_all(content, "ProxyType=0");
                if stripped == content {
                    (content.to_string(), false)
                } else {
                    (stripped.into_owned(), true)
                }
            }
            ToolRule::Npmrc => strip_lines(content, &[&NPMRC_PROXY_RE]),
            ToolRule::Yarnrc => strip_lines(content, &[&YARNRC_PROXY_RE]),
            ToolRule::PipConf => strip_lines(content, &[&PIP_PROXY_RE]),
            ToolRule::Wgetrc => strip_lines(content, &[&WGETRC_PROXY_RE]),
            ToolRule::Curlrc => strip_lines(content, &[&CURLRC_PROXY_RE]),
        }
    }
}

/// Apply removal patterns and, when anything was removed, collapse blank
/// runs left behind.
fn strip_lines(content: &str, patterns: &[&LazyLock<Regex>]) -> (String, bool) {
    let mut stripped = content.to_string();
    for pattern in patterns {
        stripped = pattern.replace_all(&stripped, "").into_owned();
    }

    if stripped == content {
        (stripped, false)
    } else {
        (collapse_blank_runs(&stripped), true)
    }
}

/// Collapse every run of 3+ consecutive newlines to exactly one blank line.
fn collapse_blank_runs(content: &str) -> String {
    BLANK_RUN_RE.replace_all(content, "\n\n").into_owned()
}

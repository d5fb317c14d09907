//! Distribution detection and source-line parsing.

use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

static CODENAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"VERSION_CODENAME=(\w+)").unwrap());

static SOURCE_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(deb(?:-src)?)\s+(?:\[.*?\]\s+)?(\S+)\s+(\S+)\s+(.+)$").unwrap()
});

/// Linux distribution families with known APT layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistroKind {
    Debian,
    Ubuntu,
    Unknown,
}

/// Classify the distribution and release codename from an os-release file.
///
/// Absence or unreadability of the file yields `Unknown`; configure
/// operations fail closed on that.
pub fn detect_distro(os_release: &Path) -> (DistroKind, String) {
    let Ok(content) = fs::read_to_string(os_release) else {
        return (DistroKind::Unknown, "unknown".to_string());
    };

    let lower = content.to_lowercase();
    let codename = |fallback: &str| {
        CODENAME_RE
            .captures(&content)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| fallback.to_string())
    };

    // Check Ubuntu first: its os-release lists debian in ID_LIKE.
    if lower.contains("ubuntu") {
        (DistroKind::Ubuntu, codename("jammy"))
    } else if lower.contains("debian") {
        (DistroKind::Debian, codename("stable"))
    } else {
        (DistroKind::Unknown, "unknown".to_string())
    }
}

/// One parsed package-repository declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    /// True for `deb-src` lines.
    pub is_source_variant: bool,
    pub base_url: String,
    pub release_name: String,
    pub components: Vec<String>,
}

/// Parse a single `deb` / `deb-src` line. Comments, blanks, and anything
/// else yield `None`.
pub fn parse_source_line(line: &str) -> Option<SourceEntry> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let captures = SOURCE_LINE_RE.captures(line)?;
    Some(SourceEntry {
        is_source_variant: &captures[1] == "deb-src",
        base_url: captures[2].to_string(),
        release_name: captures[3].to_string(),
        components: captures[4].split_whitespace().map(str::to_string).collect(),
    })
}

/// Parse every declaration in a sources.list body.
pub fn parse_sources(content: &str) -> Vec<SourceEntry> {
    content.lines().filter_map(parse_source_line).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::write_file;
    use tempfile::TempDir;

    const UBUNTU_OS_RELEASE: &str = "\
NAME=\"Ubuntu\"
ID=ubuntu
ID_LIKE=debian
VERSION_CODENAME=jammy
";

    const DEBIAN_OS_RELEASE: &str = "\
NAME=\"Debian GNU/Linux\"
ID=debian
VERSION_CODENAME=trixie
";

    #[test]
    fn detects_ubuntu_with_codename() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("os-release");
        write_file(&path, UBUNTU_OS_RELEASE);

        let (kind, release) = detect_distro(&path);
        assert_eq!(kind, DistroKind::Ubuntu);
        assert_eq!(release, "jammy");
    }

    #[test]
    fn detects_debian_despite_id_like_ordering() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("os-release");
        write_file(&path, DEBIAN_OS_RELEASE);

        let (kind, release) = detect_distro(&path);
        assert_eq!(kind, DistroKind::Debian);
        assert_eq!(release, "trixie");
    }

    #[test]
    fn missing_codename_falls_back() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("os-release");
        write_file(&path, "ID=debian\n");

        let (kind, release) = detect_distro(&path);
        assert_eq!(kind, DistroKind::Debian);
        assert_eq!(release, "stable");
    }

    #[test]
    fn unknown_distro_fails_closed() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("os-release");
        write_file(&path, "ID=fedora\nVERSION_CODENAME=rawhide\n");

        assert_eq!(detect_distro(&path).0, DistroKind::Unknown);
        assert_eq!(detect_distro(&temp.path().join("missing")).0, DistroKind::Unknown);
    }

    #[test]
    fn parses_deb_and_deb_src_lines() {
        let entry =
            parse_source_line("deb https://mirrors.ustc.edu.cn/ubuntu jammy main universe").unwrap();
        assert!(!entry.is_source_variant);
        assert_eq!(entry.base_url, "https://mirrors.ustc.edu.cn/ubuntu");
        assert_eq!(entry.release_name, "jammy");
        assert_eq!(entry.components, vec!["main", "universe"]);

        let src = parse_source_line("deb-src http://deb.debian.org/debian trixie main").unwrap();
        assert!(src.is_source_variant);
    }

    #[test]
    fn parses_options_bracket_form() {
        let entry = parse_source_line(
            "deb [arch=amd64 signed-by=/usr/share/keyrings/x.gpg] https://example.com/apt stable main",
        )
        .unwrap();
        assert_eq!(entry.base_url, "https://example.com/apt");
        assert_eq!(entry.release_name, "stable");
    }

    #[test]
    fn skips_comments_and_garbage() {
        assert!(parse_source_line("# deb http://x y z").is_none());
        assert!(parse_source_line("").is_none());
        assert!(parse_source_line("deb incomplete").is_none());

        let content = "# header\ndeb http://a b c\n\nnot-a-source\ndeb-src http://d e f\n";
        assert_eq!(parse_sources(content).len(), 2);
    }
}

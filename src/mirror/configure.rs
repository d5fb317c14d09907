//! Per-tool mirror configuration.
//!
//! Each `apply_*` function rewrites exactly the registry/index-relevant
//! parts of its tool's configuration, preserving unrelated content, and
//! answers with a plain bool — configuration failures are warnings for the
//! user, never errors that stop the other tools.
//!
//! The APT rewrite is additive-with-preservation: new declarations go on
//! top, every original non-comment line is kept below as a commented
//! "original" line, so uncommon custom entries survive the switch.

use crate::backup::{BackupManager, BackupMember, BackupTree, SnapshotSet};
use crate::fs::atomic_write_text;
use crate::locate;
use crate::mirror::catalog::{self, CatalogOverride, MirrorProvider, ProviderEndpoints};
use crate::mirror::distro::{self, DistroKind, detect_distro};
use crate::runner::{self, run_tool};
use chrono::Local;
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::LazyLock;

static PIP_MIRROR_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:index-url|trusted-host)\s*=").unwrap());

static URL_HOST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://([^/\s]+)").unwrap());
static NPM_REGISTRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^registry\s*=\s*(\S+)").unwrap());
static PIP_INDEX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^index-url\s*=\s*(\S+)").unwrap());

/// The files mirror configuration reads and rewrites.
///
/// Resolved from the live environment by `resolve()`; tests construct it
/// against a temporary directory.
#[derive(Debug, Clone)]
pub struct MirrorTargets {
    pub os_release: PathBuf,
    pub sources_list: PathBuf,
    pub sources_list_dir: PathBuf,
    pub npmrc: PathBuf,
    pub yarnrc: PathBuf,
    /// Primary pip config location, used for writes.
    pub pip_conf: PathBuf,
    /// All pip config candidates, probed for status.
    pub pip_confs: Vec<PathBuf>,
}

impl MirrorTargets {
    #[cfg(unix)]
    pub fn resolve() -> Self {
        let paths = locate::ToolPaths::resolve();
        Self {
            os_release: paths.os_release,
            sources_list: paths.sources_list,
            sources_list_dir: paths.sources_list_dir,
            npmrc: paths.npmrc,
            yarnrc: paths.yarnrc,
            pip_conf: paths.pip_confs[0].clone(),
            pip_confs: paths.pip_confs,
        }
    }

    #[cfg(windows)]
    pub fn resolve() -> Self {
        let paths = locate::ToolPaths::resolve();
        // APT has no Windows counterpart; empty paths make apply_apt fail closed.
        Self {
            os_release: PathBuf::new(),
            sources_list: PathBuf::new(),
            sources_list_dir: PathBuf::new(),
            npmrc: paths.npmrc,
            yarnrc: paths.yarnrc,
            pip_conf: paths.pip_confs[0].clone(),
            pip_confs: paths.pip_confs,
        }
    }
}

/// Which provider, if any, to apply per tool.
#[derive(Debug, Clone, Copy, Default)]
pub struct MirrorSelections {
    pub apt: Option<MirrorProvider>,
    pub npm: Option<MirrorProvider>,
    pub pip: Option<MirrorProvider>,
    pub yarn: Option<MirrorProvider>,
    pub snap: Option<MirrorProvider>,
}

impl MirrorSelections {
    pub fn is_empty(&self) -> bool {
        self.apt.is_none()
            && self.npm.is_none()
            && self.pip.is_none()
            && self.yarn.is_none()
            && self.snap.is_none()
    }
}

/// Currently configured endpoints, probed from the live files.
#[derive(Debug, Clone, Default)]
pub struct MirrorStatus {
    pub apt: Option<String>,
    pub npm: Option<String>,
    pub pip: Option<String>,
}

/// Probe which mirror hosts the package managers currently point at.
pub fn current_status(targets: &MirrorTargets) -> MirrorStatus {
    let mut status = MirrorStatus::default();

    if let Ok(content) = fs::read_to_string(&targets.sources_list) {
        status.apt = distro::parse_sources(&content)
            .iter()
            .find(|entry| !entry.is_source_variant)
            .and_then(|entry| URL_HOST_RE.captures(&entry.base_url))
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string());
    }

    if let Ok(content) = fs::read_to_string(&targets.npmrc) {
        status.npm = NPM_REGISTRY_RE
            .captures(&content)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string());
    }

    for pip_conf in &targets.pip_confs {
        if let Ok(content) = fs::read_to_string(pip_conf)
            && let Some(captures) = PIP_INDEX_RE.captures(&content)
        {
            status.pip = captures.get(1).map(|m| m.as_str().to_string());
            break;
        }
    }

    status
}

/// The file set snapshotted before any mirror mutation, with logical
/// archive names shared with restore.
pub fn backup_set(targets: &MirrorTargets) -> SnapshotSet {
    let pip_source = targets
        .pip_confs
        .iter()
        .find(|p| p.is_file())
        .cloned()
        .unwrap_or_else(|| targets.pip_conf.clone());

    SnapshotSet {
        files: vec![
            BackupMember::new("apt/sources.list", &targets.sources_list),
            BackupMember::new("npm/.npmrc", &targets.npmrc),
            BackupMember::new("yarn/.yarnrc", &targets.yarnrc),
            BackupMember::new("pip/pip.conf", pip_source),
        ],
        trees: vec![BackupTree::new(
            "apt/sources.list.d",
            &targets.sources_list_dir,
            "*.list",
        )],
    }
}

/// Point APT at the provider's mirror for the detected distro and release.
///
/// Fails closed (no mutation) when the distribution is unrecognized or the
/// sources file is unreadable.
pub fn apply_apt(targets: &MirrorTargets, endpoints: &ProviderEndpoints) -> bool {
    let (distro, release) = detect_distro(&targets.os_release);
    if distro == DistroKind::Unknown {
        eprintln!("Warning: cannot classify this distribution; APT sources left untouched");
        return false;
    }

    let content = match fs::read_to_string(&targets.sources_list) {
        Ok(content) => content,
        Err(e) => {
            eprintln!(
                "Warning: cannot read '{}': {}",
                targets.sources_list.display(),
                e
            );
            return false;
        }
    };

    let stamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let rebuilt = rebuild_sources(&content, endpoints, distro, &release, &stamp);

    match atomic_write_text(&targets.sources_list, &rebuilt) {
        Ok(()) => true,
        Err(e) => {
            eprintln!("Warning: failed to rewrite APT sources: {}", e);
            false
        }
    }
}

/// Build the new sources.list body: header, fresh declarations for the
/// release and its updates/backports/security variants, then the original
/// content with every active line commented out.
pub fn rebuild_sources(
    original: &str,
    endpoints: &ProviderEndpoints,
    distro: DistroKind,
    release: &str,
    date: &str,
) -> String {
    let mut lines = vec![
        "# Mirror source configured by proxysweep".to_string(),
        "# 镜像源由 proxysweep 配置".to_string(),
        format!(
            "# Provider: {} / 提供商: {}",
            endpoints.name, endpoints.name_zh
        ),
        format!("# Date: {}", date),
        String::new(),
    ];

    match distro {
        DistroKind::Debian => {
            let base = format!("{}/debian", endpoints.apt_url);
            let security = format!("{}/debian-security", endpoints.apt_url);
            let components = "main contrib non-free non-free-firmware";
            lines.push(format!("deb {} {} {}", base, release, components));
            lines.push(format!("deb {} {}-updates {}", base, release, components));
            lines.push(format!("deb {} {}-backports {}", base, release, components));
            lines.push(format!("deb {} {}-security {}", security, release, components));
        }
        DistroKind::Ubuntu => {
            let base = format!("{}/ubuntu", endpoints.apt_url);
            let components = "main restricted universe multiverse";
            lines.push(format!("deb {} {} {}", base, release, components));
            lines.push(format!("deb {} {}-updates {}", base, release, components));
            lines.push(format!("deb {} {}-backports {}", base, release, components));
            lines.push(format!("deb {} {}-security {}", base, release, components));
        }
        DistroKind::Unknown => {}
    }

    lines.push(String::new());
    lines.push("# ========== Original Sources / 原始源 ==========".to_string());

    for line in original.lines() {
        let trimmed = line.trim();
        if !trimmed.is_empty() && !trimmed.starts_with('#') {
            lines.push(format!("# [Original/原始] {}", line));
        } else {
            lines.push(line.to_string());
        }
    }

    let mut body = lines.join("\n");
    body.push('\n');
    body
}

/// Point the npm registry at the provider, preserving every other key.
pub fn apply_npm(targets: &MirrorTargets, endpoints: &ProviderEndpoints) -> bool {
    let existing = fs::read_to_string(&targets.npmrc).unwrap_or_default();

    let mut lines = vec![format!("registry={}", endpoints.npm_registry)];
    lines.extend(
        existing
            .lines()
            .filter(|line| !line.trim_start().starts_with("registry"))
            .map(str::to_string),
    );

    write_config(&targets.npmrc, &lines, "npm")
}

/// Point the yarn registry at the provider, preserving every other key.
pub fn apply_yarn(targets: &MirrorTargets, endpoints: &ProviderEndpoints) -> bool {
    let existing = fs::read_to_string(&targets.yarnrc).unwrap_or_default();

    let mut lines = vec![format!("registry \"{}\"", endpoints.npm_registry)];
    lines.extend(
        existing
            .lines()
            .filter(|line| !line.trim_start().starts_with("registry"))
            .map(str::to_string),
    );

    write_config(&targets.yarnrc, &lines, "yarn")
}

/// Point the pip index at the provider.
///
/// Removes only existing `index-url`/`trusted-host` lines and inserts the
/// new keys under `[global]`; unrelated keys and sections are preserved.
pub fn apply_pip(targets: &MirrorTargets, endpoints: &ProviderEndpoints) -> bool {
    let existing = fs::read_to_string(&targets.pip_conf).unwrap_or_default();

    let kept: Vec<&str> = existing
        .lines()
        .filter(|line| !PIP_MIRROR_KEY_RE.is_match(line))
        .collect();

    let index_line = format!("index-url = {}", endpoints.pip_index);
    let trusted_line = format!("trusted-host = {}", endpoints.pip_trusted_host);

    let mut lines: Vec<String> = Vec::with_capacity(kept.len() + 3);
    if let Some(global_at) = kept.iter().position(|line| line.trim() == "[global]") {
        for (i, line) in kept.iter().enumerate() {
            lines.push(line.to_string());
            if i == global_at {
                lines.push(index_line.clone());
                lines.push(trusted_line.clone());
            }
        }
    } else {
        lines.push("[global]".to_string());
        lines.push(index_line);
        lines.push(trusted_line);
        if !kept.is_empty() {
            lines.push(String::new());
            lines.extend(kept.iter().map(|line| line.to_string()));
        }
    }

    write_config(&targets.pip_conf, &lines, "pip")
}

/// Configure snapd's endpoint through its own configuration command.
///
/// Fails closed when the provider has no snap endpoint or snapd is absent.
pub fn apply_snap(endpoints: &ProviderEndpoints) -> bool {
    if endpoints.snap_url.is_empty() {
        eprintln!(
            "Warning: {} has no snap endpoint; snap left untouched",
            endpoints.name
        );
        return false;
    }

    // snapd can take a while to acknowledge configuration changes.
    let http = format!("proxy.http={}", endpoints.snap_url);
    let https = format!("proxy.https={}", endpoints.snap_url);
    match run_tool(
        "snap",
        &["set", "system", &http, &https],
        runner::LONG_TIMEOUT,
    ) {
        Ok(_) => true,
        Err(e) => {
            eprintln!("Warning: failed to configure snap: {}", e);
            false
        }
    }
}

fn write_config(path: &std::path::Path, lines: &[String], tool: &str) -> bool {
    let mut body = lines.join("\n");
    body.push('\n');
    match atomic_write_text(path, &body) {
        Ok(()) => true,
        Err(e) => {
            eprintln!("Warning: failed to rewrite {} config: {}", tool, e);
            false
        }
    }
}

/// Snapshot the affected files, then configure every selected tool
/// independently. One tool's failure never prevents the others.
pub fn configure_all(
    targets: &MirrorTargets,
    selections: &MirrorSelections,
    override_table: Option<&CatalogOverride>,
    backup: &BackupManager,
) -> BTreeMap<&'static str, bool> {
    let mut results = BTreeMap::new();

    match backup.snapshot(&backup_set(targets)) {
        Ok(archive) => {
            results.insert("backup", true);
            println!("Backup created: {}", archive.display());
        }
        Err(e) => {
            results.insert("backup", false);
            eprintln!("Warning: backup failed, continuing: {}", e);
        }
    }

    if let Some(provider) = selections.apt {
        let endpoints = catalog::resolve(provider, override_table);
        results.insert("apt", apply_apt(targets, &endpoints));
    }
    if let Some(provider) = selections.npm {
        let endpoints = catalog::resolve(provider, override_table);
        results.insert("npm", apply_npm(targets, &endpoints));
    }
    if let Some(provider) = selections.pip {
        let endpoints = catalog::resolve(provider, override_table);
        results.insert("pip", apply_pip(targets, &endpoints));
    }
    if let Some(provider) = selections.yarn {
        let endpoints = catalog::resolve(provider, override_table);
        results.insert("yarn", apply_yarn(targets, &endpoints));
    }
    if let Some(provider) = selections.snap {
        let endpoints = catalog::resolve(provider, override_table);
        results.insert("snap", apply_snap(&endpoints));
    }

    results
}

//! Linux proxy detection and cleaning.
//!
//! Covers the GNOME/KDE desktop proxy, proxy environment variables in shell
//! rc files and the process environment, Git's global proxy, APT proxy
//! files and sources lists, npm/yarn/pip configs, and wget/curl rc files.
//!
//! Before the APT sources are touched, a snapshot of sources.list and its
//! fragment directory is taken; a failed snapshot is reported but does not
//! stop the run.

use crate::backup::{BackupManager, BackupMember, BackupTree, SnapshotSet};
use crate::config::CleanOptions;
use crate::fs::atomic_write_text;
use crate::locate::{self, PROXY_ENV_VARS, ToolPaths};
use crate::report::{CleanReport, Finding, Outcome, Status};
use crate::rules::ToolRule;
use crate::runner::{self, ToolFailure, ToolOutput, probe_tool, run_tool};
use std::fs;
use std::path::{Path, PathBuf};

use super::ProxyBackend;

pub struct LinuxBackend {
    paths: ToolPaths,
    backup_dir: PathBuf,
}

impl LinuxBackend {
    pub fn new() -> Self {
        Self {
            paths: ToolPaths::resolve(),
            backup_dir: crate::config::backups_dir("sources"),
        }
    }

    /// Backend operating on explicit paths; used by tests.
    pub fn with_paths(paths: ToolPaths, backup_dir: PathBuf) -> Self {
        Self { paths, backup_dir }
    }
}

impl Default for LinuxBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ProxyBackend for LinuxBackend {
    fn detect_all(&self) -> Vec<Finding> {
        let mut findings = Vec::new();

        findings.push(self.detect_desktop_proxy());
        findings.push(self.detect_kde_apps_proxy());
        findings.extend(self.detect_env_variables());
        findings.push(self.detect_git_proxy());
        findings.extend(self.detect_apt_proxy());
        findings.extend(self.detect_sources_proxy());
        findings.extend(self.detect_package_manager_proxy());
        findings.extend(self.detect_download_tools_proxy());

        findings
    }

    fn clean_all(&self, options: &CleanOptions) -> CleanReport {
        let mut report = CleanReport::new();

        if options.apt_proxy
            && let Some(outcome) = self.backup_sources()
        {
            report.push(outcome);
        }

        if options.system_proxy {
            report.push(self.clean_system_proxy());
            report.push(self.clean_kde_apps_proxy());
        }

        if options.env_variables {
            report.push(self.clean_env_variables());
        }

        if options.git_proxy {
            report.push(self.clean_git_proxy());
        }

        if options.apt_proxy {
            for outcome in self.clean_apt_proxy() {
                report.push(outcome);
            }
            for outcome in self.clean_sources_proxy() {
                report.push(outcome);
            }
        }

        report.push(self.clean_npm_yarn_proxy());
        for outcome in self.clean_pip_proxy() {
            report.push(outcome);
        }
        report.push(self.clean_download_tools_proxy());

        report
    }
}

/// Whether the tool ran at all — a non-zero exit still means the tool is
/// present and was asked to do its part.
fn tool_attempted(result: &Result<ToolOutput, ToolFailure>) -> bool {
    matches!(result, Ok(_) | Err(ToolFailure::Exited { .. }))
}

fn file_item(prefix: &str, path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    format!("{}_{}", prefix, name)
}

impl LinuxBackend {
    // ---- detection ----

    fn detect_desktop_proxy(&self) -> Finding {
        if let Some(raw) = probe_tool("gsettings", &["get", "org.gnome.system.proxy", "mode"]) {
            let mode = raw.trim().trim_matches('\'').to_string();
            if mode != "none" {
                return Finding::found(
                    "desktop_proxy",
                    Some(mode.clone()),
                    format!("GNOME 系统代理模式: {}", mode),
                    format!("GNOME system proxy mode: {}", mode),
                );
            }
        }

        Finding::absent("desktop_proxy", "桌面代理未设置", "Desktop proxy not set")
    }

    fn detect_kde_apps_proxy(&self) -> Finding {
        for kde_file in &self.paths.kde_proxy_files {
            if let Ok(content) = fs::read_to_string(kde_file)
                && ToolRule::KdeRc.matches(&content)
            {
                return Finding::found(
                    "kde_apps_proxy",
                    Some(kde_file.display().to_string()),
                    "KDE 应用代理已设置",
                    "KDE apps proxy is set",
                );
            }
        }

        Finding::absent("kde_apps_proxy", "KDE 应用代理未设置", "KDE apps proxy not set")
    }

    fn detect_env_variables(&self) -> Vec<Finding> {
        let mut findings = Vec::new();
        for var in PROXY_ENV_VARS {
            if let Ok(value) = std::env::var(var)
                && !value.is_empty()
            {
                findings.push(Finding::found(
                    format!("env_{}", var),
                    Some(value.clone()),
                    format!("环境变量 {}={}", var, value),
                    format!("Environment variable {}={}", var, value),
                ));
            }
        }
        findings
    }

    fn detect_git_proxy(&self) -> Finding {
        if let Some(value) = probe_tool("git", &["config", "--global", "--get", "http.proxy"]) {
            return Finding::found(
                "git_proxy",
                Some(value.clone()),
                format!("Git 代理已设置: {}", value),
                format!("Git proxy set: {}", value),
            );
        }

        Finding::absent("git_proxy", "Git 代理未设置", "Git proxy not set")
    }

    fn detect_apt_proxy(&self) -> Vec<Finding> {
        let mut findings = Vec::new();

        for apt_file in &self.paths.apt_proxy_files {
            if let Ok(content) = fs::read_to_string(apt_file)
                && ToolRule::AptConf.matches(&content)
            {
                findings.push(Finding::found(
                    file_item("apt_proxy", apt_file),
                    ToolRule::AptConf.extract(&content),
                    format!("APT 代理文件: {}", apt_file.display()),
                    format!("APT proxy file: {}", apt_file.display()),
                ));
            }
        }

        if findings.is_empty() {
            findings.push(Finding::absent("apt_proxy", "APT 代理未设置", "APT proxy not set"));
        }
        findings
    }

    fn detect_sources_proxy(&self) -> Vec<Finding> {
        let mut findings = Vec::new();

        // sources.list and every fragment are inspected independently; a
        // proxied entry hiding in a fragment must not be shadowed by a clean
        // main file.
        for src_file in self.sources_files() {
            if let Ok(content) = fs::read_to_string(&src_file)
                && let Some(indicator) = ToolRule::SourcesList.extract(&content)
            {
                findings.push(Finding::found(
                    "sources_proxy",
                    Some(format!("{}: {}", src_file.display(), indicator)),
                    format!("软件源可能使用代理: {}", src_file.display()),
                    format!("Sources may use proxy: {}", src_file.display()),
                ));
            }
        }

        if findings.is_empty() {
            findings.push(Finding::absent(
                "sources_proxy",
                "软件源未使用代理",
                "Sources not using proxy",
            ));
        }
        findings
    }

    fn sources_files(&self) -> Vec<PathBuf> {
        let mut files = vec![self.paths.sources_list.clone()];
        files.extend(locate::list_fragments(&self.paths.sources_list_dir));
        files
    }

    fn detect_package_manager_proxy(&self) -> Vec<Finding> {
        let mut findings = Vec::new();

        if let Ok(content) = fs::read_to_string(&self.paths.npmrc)
            && ToolRule::Npmrc.matches(&content)
        {
            findings.push(Finding::found(
                "npm_proxy",
                Some(self.paths.npmrc.display().to_string()),
                "NPM 代理已设置",
                "NPM proxy is set",
            ));
        }

        if let Ok(content) = fs::read_to_string(&self.paths.yarnrc)
            && ToolRule::Yarnrc.matches(&content)
        {
            findings.push(Finding::found(
                "yarn_proxy",
                Some(self.paths.yarnrc.display().to_string()),
                "Yarn 代理已设置",
                "Yarn proxy is set",
            ));
        }

        // Both pip locations are reported independently; a second shadow
        // config must not be hidden by the first.
        for pip_conf in &self.paths.pip_confs {
            if let Ok(content) = fs::read_to_string(pip_conf)
                && ToolRule::PipConf.matches(&content)
            {
                findings.push(Finding::found(
                    "pip_proxy",
                    Some(pip_conf.display().to_string()),
                    "Pip 代理已设置",
                    "Pip proxy is set",
                ));
            }
        }

        findings
    }

    fn detect_download_tools_proxy(&self) -> Vec<Finding> {
        let mut findings = Vec::new();

        if let Ok(content) = fs::read_to_string(&self.paths.wgetrc)
            && ToolRule::Wgetrc.matches(&content)
        {
            findings.push(Finding::found(
                "wget_proxy",
                Some(self.paths.wgetrc.display().to_string()),
                "Wget 代理已设置",
                "Wget proxy is set",
            ));
        }

        if let Ok(content) = fs::read_to_string(&self.paths.curlrc)
            && ToolRule::Curlrc.matches(&content)
        {
            findings.push(Finding::found(
                "curl_proxy",
                Some(self.paths.curlrc.display().to_string()),
                "Curl 代理已设置",
                "Curl proxy is set",
            ));
        }

        findings
    }

    // ---- backup ----

    fn backup_sources(&self) -> Option<Outcome> {
        if !self.paths.sources_list.exists() {
            return None;
        }

        let manager = BackupManager::new(&self.backup_dir, "sources");
        let set = SnapshotSet {
            files: vec![BackupMember::new("sources.list", &self.paths.sources_list)],
            trees: vec![BackupTree::new(
                "sources.list.d",
                &self.paths.sources_list_dir,
                "*.list",
            )],
        };

        Some(match manager.snapshot(&set) {
            Ok(archive) => {
                let name = archive
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                Outcome::new(
                    "backup_sources",
                    Status::Success,
                    format!("软件源已备份: {}", name),
                    format!("Sources backed up: {}", name),
                )
                .with_details(archive.display().to_string())
            }
            Err(e) => Outcome::new(
                "backup_sources",
                Status::Failed,
                format!("备份软件源失败: {}", e),
                format!("Failed to backup sources: {}", e),
            ),
        })
    }

    // ---- cleaning ----

    fn clean_system_proxy(&self) -> Outcome {
        let gnome = run_tool(
            "gsettings",
            &["set", "org.gnome.system.proxy", "mode", "none"],
            runner::DEFAULT_TIMEOUT,
        );
        let kde = run_tool(
            "kwriteconfig5",
            &[
                "--file",
                "kioslaverc",
                "--group",
                "Proxy Settings",
                "--key",
                "ProxyType",
                "0",
            ],
            runner::DEFAULT_TIMEOUT,
        );

        if tool_attempted(&gnome) || tool_attempted(&kde) {
            Outcome::new(
                "system_proxy",
                Status::Success,
                "桌面系统代理已清理",
                "Desktop system proxy cleaned",
            )
        } else {
            Outcome::new(
                "system_proxy",
                Status::Skipped,
                "未检测到桌面代理设置",
                "No desktop proxy settings detected",
            )
        }
    }

    fn clean_kde_apps_proxy(&self) -> Outcome {
        let mut cleaned = false;

        for kwrite in ["kwriteconfig6", "kwriteconfig5"] {
            let slaverc = run_tool(
                kwrite,
                &[
                    "--file",
                    "kioslaverc",
                    "--group",
                    "Proxy Settings",
                    "--key",
                    "ProxyType",
                    "0",
                ],
                runner::DEFAULT_TIMEOUT,
            );
            let kiorc = run_tool(
                kwrite,
                &[
                    "--file",
                    "kiorc",
                    "--group",
                    "Proxy Settings",
                    "--key",
                    "ProxyType",
                    "0",
                ],
                runner::DEFAULT_TIMEOUT,
            );
            if tool_attempted(&slaverc) || tool_attempted(&kiorc) {
                cleaned = true;
                break;
            }
        }

        for kde_file in &self.paths.kde_proxy_files {
            if let Ok(content) = fs::read_to_string(kde_file) {
                let (stripped, changed) = ToolRule::KdeRc.strip(&content);
                if changed && atomic_write_text(kde_file, &stripped).is_ok() {
                    cleaned = true;
                }
            }
        }

        if cleaned {
            Outcome::new(
                "kde_apps_proxy",
                Status::Success,
                "KDE 应用代理已清理",
                "KDE apps proxy cleaned",
            )
        } else {
            Outcome::new(
                "kde_apps_proxy",
                Status::Skipped,
                "未检测到 KDE 应用代理",
                "No KDE apps proxy detected",
            )
        }
    }

    fn clean_env_variables(&self) -> Outcome {
        // Clear the running process first so children launched from here on
        // are unaffected even if a file rewrite below fails.
        for var in PROXY_ENV_VARS {
            if std::env::var_os(var).is_some() {
                // Safety: single-threaded CLI; no other thread reads the
                // environment concurrently.
                unsafe { std::env::remove_var(var) };
            }
        }

        let mut cleaned_files: Vec<String> = Vec::new();
        for profile in &self.paths.shell_profiles {
            if !profile.exists() || !locate::can_write(profile) {
                continue;
            }
            match fs::read_to_string(profile) {
                Ok(content) => {
                    let (stripped, changed) = ToolRule::ShellRc.strip(&content);
                    if changed {
                        match atomic_write_text(profile, &stripped) {
                            Ok(()) => cleaned_files.push(profile.display().to_string()),
                            Err(e) => {
                                eprintln!("Warning: failed to clean {}: {}", profile.display(), e)
                            }
                        }
                    }
                }
                Err(e) => eprintln!(
                    "Warning: skipping unreadable {}: {}",
                    profile.display(),
                    e
                ),
            }
        }

        let mut outcome = Outcome::new(
            "env_variables",
            Status::Success,
            format!("环境变量已清理 ({} 个文件)", cleaned_files.len()),
            format!("Environment variables cleaned ({} files)", cleaned_files.len()),
        );
        if !cleaned_files.is_empty() {
            outcome = outcome.with_details(cleaned_files.join(", "));
        }
        outcome
    }

    fn clean_git_proxy(&self) -> Outcome {
        let unset_http = run_tool(
            "git",
            &["config", "--global", "--unset", "http.proxy"],
            runner::DEFAULT_TIMEOUT,
        );

        match &unset_http {
            Err(failure) if failure.is_not_installed() => {
                return Outcome::new("git_proxy", Status::Skipped, "Git 未安装", "Git not installed");
            }
            Err(failure @ (ToolFailure::TimedOut(_) | ToolFailure::Io(_))) => {
                return Outcome::new(
                    "git_proxy",
                    Status::Failed,
                    format!("清理 Git 代理失败: {}", failure),
                    format!("Failed to clean Git proxy: {}", failure),
                );
            }
            // A non-zero exit means the key was already absent.
            _ => {}
        }

        let _ = run_tool(
            "git",
            &["config", "--global", "--unset", "https.proxy"],
            runner::DEFAULT_TIMEOUT,
        );

        Outcome::new("git_proxy", Status::Success, "Git 代理已清理", "Git proxy cleaned")
    }

    fn clean_apt_proxy(&self) -> Vec<Outcome> {
        let mut outcomes = Vec::new();

        for apt_file in &self.paths.apt_proxy_files {
            if !apt_file.exists() {
                continue;
            }
            let item = file_item("apt_proxy", apt_file);

            if !locate::can_write(apt_file) {
                outcomes.push(
                    Outcome::new(
                        item,
                        Status::Skipped,
                        "需要 root 权限清理 APT 代理",
                        "Root permission required for APT proxy",
                    )
                    .with_details(apt_file.display().to_string()),
                );
                continue;
            }

            let content = match fs::read_to_string(apt_file) {
                Ok(content) => content,
                Err(e) => {
                    outcomes.push(Outcome::new(
                        item,
                        Status::Failed,
                        format!("读取 APT 代理文件失败: {}", e),
                        format!("Failed to read APT proxy file: {}", e),
                    ));
                    continue;
                }
            };

            let (stripped, changed) = ToolRule::AptConf.strip(&content);
            if !changed {
                outcomes.push(
                    Outcome::new(
                        item,
                        Status::Skipped,
                        "未检测到 APT 代理",
                        "No APT proxy entries",
                    )
                    .with_details(apt_file.display().to_string()),
                );
                continue;
            }

            // A file reduced to nothing is removed rather than left empty.
            let write_result = if stripped.trim().is_empty() {
                fs::remove_file(apt_file).map_err(|e| e.to_string())
            } else {
                atomic_write_text(apt_file, &stripped).map_err(|e| e.to_string())
            };

            outcomes.push(match write_result {
                Ok(()) => Outcome::new(item, Status::Success, "APT 代理已清理", "APT proxy cleaned")
                    .with_details(apt_file.display().to_string()),
                Err(e) => Outcome::new(
                    item,
                    Status::Failed,
                    format!("清理 APT 代理失败: {}", e),
                    format!("Failed to clean APT proxy: {}", e),
                ),
            });
        }

        if outcomes.is_empty() {
            outcomes.push(Outcome::new(
                "apt_proxy",
                Status::NotFound,
                "APT 代理文件不存在",
                "No APT proxy files found",
            ));
        }
        outcomes
    }

    fn clean_sources_proxy(&self) -> Vec<Outcome> {
        let mut outcomes = Vec::new();

        // The main sources.list always gets an outcome; fragments only when
        // they actually carry something to remove, so a directory full of
        // ordinary vendor lists does not flood the report.
        for (index, src_file) in self.sources_files().iter().enumerate() {
            let is_main = index == 0;

            if !src_file.exists() {
                if is_main {
                    outcomes.push(Outcome::new(
                        "sources_proxy",
                        Status::NotFound,
                        "软件源文件不存在",
                        "Sources file not found",
                    ));
                }
                continue;
            }

            let content = match fs::read_to_string(src_file) {
                Ok(content) => content,
                Err(e) => {
                    outcomes.push(
                        Outcome::new(
                            "sources_proxy",
                            Status::Failed,
                            format!("读取软件源失败: {}", e),
                            format!("Failed to read sources: {}", e),
                        )
                        .with_details(src_file.display().to_string()),
                    );
                    continue;
                }
            };

            let (stripped, changed) = ToolRule::SourcesList.strip(&content);
            if !changed {
                if is_main {
                    outcomes.push(Outcome::new(
                        "sources_proxy",
                        Status::Skipped,
                        "软件源无需清理",
                        "Sources need no cleaning",
                    ));
                }
                continue;
            }

            if !locate::can_write(src_file) {
                outcomes.push(
                    Outcome::new(
                        "sources_proxy",
                        Status::Skipped,
                        "需要 root 权限清理软件源",
                        "Root permission required for sources",
                    )
                    .with_details(src_file.display().to_string()),
                );
                continue;
            }

            outcomes.push(match atomic_write_text(src_file, &stripped) {
                Ok(()) => Outcome::new(
                    "sources_proxy",
                    Status::Success,
                    "软件源代理已清理",
                    "Sources proxy cleaned",
                )
                .with_details(src_file.display().to_string()),
                Err(e) => Outcome::new(
                    "sources_proxy",
                    Status::Failed,
                    format!("清理软件源失败: {}", e),
                    format!("Failed to clean sources: {}", e),
                ),
            });
        }

        outcomes
    }

    fn clean_npm_yarn_proxy(&self) -> Outcome {
        let mut cleaned: Vec<&str> = Vec::new();

        let npm_cli = run_tool(
            "npm",
            &["config", "delete", "proxy"],
            runner::DEFAULT_TIMEOUT,
        );
        if tool_attempted(&npm_cli) {
            let _ = run_tool(
                "npm",
                &["config", "delete", "https-proxy"],
                runner::DEFAULT_TIMEOUT,
            );
            cleaned.push("npm");
        }

        for (path, rule, label) in [
            (&self.paths.npmrc, ToolRule::Npmrc, ".npmrc"),
            (&self.paths.yarnrc, ToolRule::Yarnrc, ".yarnrc"),
        ] {
            if let Ok(content) = fs::read_to_string(path) {
                let (stripped, changed) = rule.strip(&content);
                if changed && atomic_write_text(path, &stripped).is_ok() {
                    cleaned.push(label);
                }
            }
        }

        if cleaned.is_empty() {
            Outcome::new(
                "npm_yarn_proxy",
                Status::Skipped,
                "NPM/Yarn 代理未设置",
                "NPM/Yarn proxy not set",
            )
        } else {
            Outcome::new(
                "npm_yarn_proxy",
                Status::Success,
                "NPM/Yarn 代理已清理",
                "NPM/Yarn proxy cleaned",
            )
            .with_details(cleaned.join(", "))
        }
    }

    fn clean_pip_proxy(&self) -> Vec<Outcome> {
        let mut outcomes = Vec::new();

        for pip_conf in &self.paths.pip_confs {
            if !pip_conf.exists() {
                continue;
            }

            let outcome = match fs::read_to_string(pip_conf) {
                Ok(content) => {
                    let (stripped, changed) = ToolRule::PipConf.strip(&content);
                    if !changed {
                        Outcome::new(
                            "pip_proxy",
                            Status::Skipped,
                            "Pip 代理未设置",
                            "Pip proxy not set",
                        )
                        .with_details(pip_conf.display().to_string())
                    } else {
                        match atomic_write_text(pip_conf, &stripped) {
                            Ok(()) => Outcome::new(
                                "pip_proxy",
                                Status::Success,
                                "Pip 代理已清理",
                                "Pip proxy cleaned",
                            )
                            .with_details(pip_conf.display().to_string()),
                            Err(e) => Outcome::new(
                                "pip_proxy",
                                Status::Failed,
                                format!("清理 Pip 代理失败: {}", e),
                                format!("Failed to clean Pip proxy: {}", e),
                            ),
                        }
                    }
                }
                Err(e) => Outcome::new(
                    "pip_proxy",
                    Status::Failed,
                    format!("读取 Pip 配置失败: {}", e),
                    format!("Failed to read pip config: {}", e),
                ),
            };
            outcomes.push(outcome);
        }

        if outcomes.is_empty() {
            outcomes.push(Outcome::new(
                "pip_proxy",
                Status::NotFound,
                "Pip 配置文件不存在",
                "No pip config file found",
            ));
        }
        outcomes
    }

    fn clean_download_tools_proxy(&self) -> Outcome {
        let mut cleaned: Vec<&str> = Vec::new();

        for (path, rule, label) in [
            (&self.paths.wgetrc, ToolRule::Wgetrc, ".wgetrc"),
            (&self.paths.curlrc, ToolRule::Curlrc, ".curlrc"),
        ] {
            if let Ok(content) = fs::read_to_string(path) {
                let (stripped, changed) = rule.strip(&content);
                if changed && atomic_write_text(path, &stripped).is_ok() {
                    cleaned.push(label);
                }
            }
        }

        if cleaned.is_empty() {
            Outcome::new(
                "download_tools_proxy",
                Status::Skipped,
                "Wget/Curl 代理未设置",
                "Wget/Curl proxy not set",
            )
        } else {
            Outcome::new(
                "download_tools_proxy",
                Status::Success,
                "Wget/Curl 代理已清理",
                "Wget/Curl proxy cleaned",
            )
            .with_details(cleaned.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::write_file;
    use serial_test::serial;
    use tempfile::TempDir;

    fn paths_in(root: &Path) -> ToolPaths {
        ToolPaths {
            shell_profiles: vec![root.join(".bashrc"), root.join(".zshrc")],
            apt_proxy_files: vec![
                root.join("apt/apt.conf.d/proxy.conf"),
                root.join("apt/apt.conf.d/01proxy"),
            ],
            sources_list: root.join("apt/sources.list"),
            sources_list_dir: root.join("apt/sources.list.d"),
            kde_proxy_files: vec![root.join(".config/kioslaverc")],
            npmrc: root.join(".npmrc"),
            yarnrc: root.join(".yarnrc"),
            pip_confs: vec![root.join(".pip/pip.conf"), root.join(".config/pip/pip.conf")],
            wgetrc: root.join(".wgetrc"),
            curlrc: root.join(".curlrc"),
            os_release: root.join("os-release"),
        }
    }

    fn backend_in(root: &Path) -> LinuxBackend {
        LinuxBackend::with_paths(paths_in(root), root.join("backups"))
    }

    #[test]
    #[serial]
    fn scan_finds_rc_file_proxy_with_value() {
        let temp = TempDir::new().unwrap();
        write_file(
            &temp.path().join(".bashrc"),
            "alias ll='ls -l'\nexport HTTP_PROXY=http://127.0.0.1:7890\n",
        );

        let backend = backend_in(temp.path());
        let report = backend.clean_all(&CleanOptions {
            system_proxy: false,
            env_variables: true,
            git_proxy: false,
            apt_proxy: false,
        });

        let env_outcome = report
            .outcomes
            .iter()
            .find(|o| o.item == "env_variables")
            .unwrap();
        assert_eq!(env_outcome.status, Status::Success);
        assert!(env_outcome.details.as_deref().unwrap().contains(".bashrc"));

        let content = fs::read_to_string(temp.path().join(".bashrc")).unwrap();
        assert!(content.contains("alias ll='ls -l'"));
        assert!(!content.contains("HTTP_PROXY"));
    }

    #[test]
    fn scan_reports_both_pip_configs_separately() {
        let temp = TempDir::new().unwrap();
        write_file(
            &temp.path().join(".pip/pip.conf"),
            "[global]\nproxy = http://127.0.0.1:7890\n",
        );
        write_file(
            &temp.path().join(".config/pip/pip.conf"),
            "[global]\nproxy = http://127.0.0.1:1080\n",
        );

        let backend = backend_in(temp.path());
        let findings = backend.detect_all();

        let pip_findings: Vec<_> = findings.iter().filter(|f| f.item == "pip_proxy").collect();
        assert_eq!(pip_findings.len(), 2);
        assert_ne!(pip_findings[0].value, pip_findings[1].value);
    }

    #[test]
    #[serial]
    fn scan_orders_categories_stably() {
        let temp = TempDir::new().unwrap();
        let backend = backend_in(temp.path());

        let first: Vec<String> = backend.detect_all().iter().map(|f| f.item.clone()).collect();
        let second: Vec<String> = backend.detect_all().iter().map(|f| f.item.clone()).collect();
        assert_eq!(first, second);

        // Desktop findings come before package-manager findings.
        let desktop_at = first.iter().position(|i| i == "desktop_proxy").unwrap();
        let sources_at = first.iter().position(|i| i == "sources_proxy").unwrap();
        assert!(desktop_at < sources_at);
    }

    #[test]
    fn scan_survives_binary_garbage() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path()).unwrap();
        std::fs::write(temp.path().join(".npmrc"), [0x00u8, 0xFF, 0xFE, 0x80]).unwrap();
        write_file(&temp.path().join(".wgetrc"), "");

        let backend = backend_in(temp.path());
        let findings = backend.detect_all();
        assert!(findings.iter().all(|f| f.item != "npm_proxy"));
    }

    #[test]
    fn clean_strips_npm_yarn_and_download_tools() {
        let temp = TempDir::new().unwrap();
        write_file(
            &temp.path().join(".npmrc"),
            "proxy=http://127.0.0.1:7890\nregistry=https://r\n",
        );
        write_file(&temp.path().join(".yarnrc"), "proxy \"http://127.0.0.1:7890\"\n");
        write_file(
            &temp.path().join(".wgetrc"),
            "use_proxy = on\ntimeout = 10\n",
        );

        let backend = backend_in(temp.path());
        let report = backend.clean_all(&CleanOptions {
            system_proxy: false,
            env_variables: false,
            git_proxy: false,
            apt_proxy: false,
        });

        let npm_outcome = report
            .outcomes
            .iter()
            .find(|o| o.item == "npm_yarn_proxy")
            .unwrap();
        assert_eq!(npm_outcome.status, Status::Success);

        let npmrc = fs::read_to_string(temp.path().join(".npmrc")).unwrap();
        assert!(npmrc.contains("registry=https://r"));
        assert!(!npmrc.contains("proxy="));

        let wgetrc = fs::read_to_string(temp.path().join(".wgetrc")).unwrap();
        assert_eq!(wgetrc.trim(), "timeout = 10");
    }

    #[test]
    fn clean_removes_apt_file_reduced_to_nothing() {
        let temp = TempDir::new().unwrap();
        let apt_file = temp.path().join("apt/apt.conf.d/proxy.conf");
        write_file(&apt_file, "Acquire::http::Proxy \"http://127.0.0.1:7890\";\n");

        let backend = backend_in(temp.path());
        let report = backend.clean_all(&CleanOptions {
            system_proxy: false,
            env_variables: false,
            git_proxy: false,
            apt_proxy: true,
        });

        let outcome = report
            .outcomes
            .iter()
            .find(|o| o.item == "apt_proxy_proxy.conf")
            .unwrap();
        assert_eq!(outcome.status, Status::Success);
        assert!(!apt_file.exists());
    }

    #[test]
    fn clean_reports_each_apt_file_separately() {
        let temp = TempDir::new().unwrap();
        write_file(
            &temp.path().join("apt/apt.conf.d/proxy.conf"),
            "Acquire::http::Proxy \"http://127.0.0.1:7890\";\nAcquire::Retries \"3\";\n",
        );
        write_file(
            &temp.path().join("apt/apt.conf.d/01proxy"),
            "Acquire::Retries \"3\";\n",
        );

        let backend = backend_in(temp.path());
        let report = backend.clean_all(&CleanOptions {
            system_proxy: false,
            env_variables: false,
            git_proxy: false,
            apt_proxy: true,
        });

        let cleaned = report
            .outcomes
            .iter()
            .find(|o| o.item == "apt_proxy_proxy.conf")
            .unwrap();
        assert_eq!(cleaned.status, Status::Success);

        // Nothing to remove in the second file: reported, not merged.
        let untouched = report
            .outcomes
            .iter()
            .find(|o| o.item == "apt_proxy_01proxy")
            .unwrap();
        assert_eq!(untouched.status, Status::Skipped);
    }

    #[test]
    fn scan_reports_each_proxied_sources_file() {
        let temp = TempDir::new().unwrap();
        write_file(
            &temp.path().join("apt/sources.list"),
            "deb http://127.0.0.1:7890/ubuntu jammy main\n",
        );
        write_file(
            &temp.path().join("apt/sources.list.d/vendor.list"),
            "deb http://localhost:1080/vendor stable main\n",
        );
        write_file(
            &temp.path().join("apt/sources.list.d/clean.list"),
            "deb https://mirrors.ustc.edu.cn/ubuntu jammy main\n",
        );

        let backend = backend_in(temp.path());
        let findings = backend.detect_all();

        let sources: Vec<_> = findings
            .iter()
            .filter(|f| f.item == "sources_proxy" && f.found)
            .collect();
        assert_eq!(sources.len(), 2);
        assert!(sources.iter().any(|f| f.value.as_deref().unwrap().contains("vendor.list")));
    }

    #[test]
    fn clean_strips_proxied_fragment_files() {
        let temp = TempDir::new().unwrap();
        write_file(
            &temp.path().join("apt/sources.list"),
            "deb https://mirrors.ustc.edu.cn/ubuntu jammy main\n",
        );
        let fragment = temp.path().join("apt/sources.list.d/vendor.list");
        write_file(&fragment, "deb http://127.0.0.1:7890/vendor stable main\n");

        let backend = backend_in(temp.path());
        let report = backend.clean_all(&CleanOptions {
            system_proxy: false,
            env_variables: false,
            git_proxy: false,
            apt_proxy: true,
        });

        let fragment_outcome = report
            .outcomes
            .iter()
            .find(|o| {
                o.item == "sources_proxy"
                    && o.details.as_deref().is_some_and(|d| d.contains("vendor.list"))
            })
            .unwrap();
        assert_eq!(fragment_outcome.status, Status::Success);
        assert!(!fs::read_to_string(&fragment).unwrap().contains("127.0.0.1"));

        // The clean main file is reported once, untouched.
        let main_outcome = report
            .outcomes
            .iter()
            .find(|o| o.item == "sources_proxy" && o.details.is_none())
            .unwrap();
        assert_eq!(main_outcome.status, Status::Skipped);
    }

    #[test]
    fn clean_run_continues_past_backup_failure() {
        let temp = TempDir::new().unwrap();
        write_file(
            &temp.path().join("apt/sources.list"),
            "deb http://127.0.0.1:7890/ubuntu jammy main\n",
        );
        // A file where the backup directory should be forces snapshot failure.
        write_file(&temp.path().join("backups"), "in the way");

        let backend = backend_in(temp.path());
        let report = backend.clean_all(&CleanOptions {
            system_proxy: false,
            env_variables: false,
            git_proxy: false,
            apt_proxy: true,
        });

        let backup_outcome = report
            .outcomes
            .iter()
            .find(|o| o.item == "backup_sources")
            .unwrap();
        assert_eq!(backup_outcome.status, Status::Failed);
        assert!(report.failed_count >= 1);

        // The run still cleaned the sources file.
        let sources_outcome = report
            .outcomes
            .iter()
            .find(|o| o.item == "sources_proxy")
            .unwrap();
        assert_eq!(sources_outcome.status, Status::Success);
        let content = fs::read_to_string(temp.path().join("apt/sources.list")).unwrap();
        assert!(!content.contains("127.0.0.1"));
    }

    #[test]
    fn clean_snapshots_sources_before_mutation() {
        let temp = TempDir::new().unwrap();
        write_file(
            &temp.path().join("apt/sources.list"),
            "deb http://127.0.0.1:7890/ubuntu jammy main\n",
        );

        let backend = backend_in(temp.path());
        let report = backend.clean_all(&CleanOptions {
            system_proxy: false,
            env_variables: false,
            git_proxy: false,
            apt_proxy: true,
        });

        let backup_outcome = report
            .outcomes
            .iter()
            .find(|o| o.item == "backup_sources")
            .unwrap();
        assert_eq!(backup_outcome.status, Status::Success);

        let manager = BackupManager::new(temp.path().join("backups"), "sources");
        assert_eq!(manager.list().len(), 1);
    }

    #[test]
    fn disabled_categories_are_omitted_from_report() {
        let temp = TempDir::new().unwrap();
        write_file(&temp.path().join(".bashrc"), "export HTTP_PROXY=x\n");

        let backend = backend_in(temp.path());
        let report = backend.clean_all(&CleanOptions {
            system_proxy: false,
            env_variables: false,
            git_proxy: false,
            apt_proxy: false,
        });

        assert!(report.outcomes.iter().all(|o| o.item != "env_variables"));
        assert!(report.outcomes.iter().all(|o| o.item != "system_proxy"));
        // The rc file was left alone.
        let content = fs::read_to_string(temp.path().join(".bashrc")).unwrap();
        assert!(content.contains("HTTP_PROXY"));
    }

    #[test]
    #[serial]
    fn clean_clears_process_environment() {
        let temp = TempDir::new().unwrap();
        // Safety: #[serial] keeps environment mutations exclusive.
        unsafe { std::env::set_var("FTP_PROXY", "http://127.0.0.1:7890") };

        let backend = backend_in(temp.path());
        let findings = backend.detect_all();
        assert!(findings.iter().any(|f| f.item == "env_FTP_PROXY"));

        backend.clean_all(&CleanOptions {
            system_proxy: false,
            env_variables: true,
            git_proxy: false,
            apt_proxy: false,
        });

        assert!(std::env::var_os("FTP_PROXY").is_none());
    }

    #[test]
    #[serial]
    fn report_counts_match_outcomes() {
        let temp = TempDir::new().unwrap();
        write_file(&temp.path().join(".npmrc"), "proxy=http://127.0.0.1:7890\n");

        let backend = backend_in(temp.path());
        let report = backend.clean_all(&CleanOptions::default());

        let total = report.success_count + report.failed_count + report.skipped_count;
        assert_eq!(total, report.outcomes.len());
    }
}

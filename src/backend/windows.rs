//! Windows proxy detection and cleaning.
//!
//! Covers the WinINet system proxy (Internet Settings registry key), proxy
//! environment variables in the process and HKCU\Environment, Git's global
//! proxy, npm/yarn/pip configs, UWP loopback exemptions, and the DNS cache.

use crate::config::CleanOptions;
use crate::fs::atomic_write_text;
use crate::locate::{PROXY_ENV_VARS, ToolPaths};
use crate::report::{CleanReport, Finding, Outcome, Status};
use crate::rules::ToolRule;
use crate::runner::{self, ToolFailure, ToolOutput, probe_tool, run_tool};
use std::fs;
use winreg::RegKey;
use winreg::enums::{HKEY_CURRENT_USER, KEY_READ, KEY_SET_VALUE};

const INTERNET_SETTINGS: &str = r"Software\Microsoft\Windows\CurrentVersion\Internet Settings";

pub struct WindowsBackend {
    paths: ToolPaths,
}

impl WindowsBackend {
    pub fn new() -> Self {
        Self {
            paths: ToolPaths::resolve(),
        }
    }
}

impl Default for WindowsBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl super::ProxyBackend for WindowsBackend {
    fn detect_all(&self) -> Vec<Finding> {
        let mut findings = Vec::new();

        findings.push(self.detect_system_proxy());
        findings.extend(self.detect_env_variables());
        findings.push(self.detect_git_proxy());
        findings.extend(self.detect_package_manager_proxy());
        findings.push(self.detect_uwp_loopback());

        findings
    }

    fn clean_all(&self, options: &CleanOptions) -> CleanReport {
        let mut report = CleanReport::new();

        if options.system_proxy {
            report.push(self.clean_system_proxy());
        }
        if options.env_variables {
            report.push(self.clean_env_variables());
        }
        if options.git_proxy {
            report.push(self.clean_git_proxy());
        }
        report.push(self.clean_npm_yarn_proxy());
        for outcome in self.clean_pip_proxy() {
            report.push(outcome);
        }
        report.push(self.flush_dns_cache());

        // Winsock reset needs an elevated shell; unprivileged runs skip it.
        if crate::platform::is_elevated() {
            report.push(self.reset_winsock());
        }

        report
    }
}

fn tool_attempted(result: &Result<ToolOutput, ToolFailure>) -> bool {
    matches!(result, Ok(_) | Err(ToolFailure::Exited { .. }))
}

/// Tell WinINet consumers that the proxy settings changed.
fn refresh_internet_settings() {
    const INTERNET_OPTION_REFRESH: u32 = 37;
    const INTERNET_OPTION_SETTINGS_CHANGED: u32 = 39;

    #[link(name = "wininet")]
    unsafe extern "system" {
        fn InternetSetOptionW(
            h_internet: *mut core::ffi::c_void,
            dw_option: u32,
            lp_buffer: *mut core::ffi::c_void,
            dw_buffer_length: u32,
        ) -> i32;
    }

    unsafe {
        InternetSetOptionW(
            std::ptr::null_mut(),
            INTERNET_OPTION_SETTINGS_CHANGED,
            std::ptr::null_mut(),
            0,
        );
        InternetSetOptionW(
            std::ptr::null_mut(),
            INTERNET_OPTION_REFRESH,
            std::ptr::null_mut(),
            0,
        );
    }
}

impl WindowsBackend {
    // ---- detection ----

    fn detect_system_proxy(&self) -> Finding {
        let key = match RegKey::predef(HKEY_CURRENT_USER)
            .open_subkey_with_flags(INTERNET_SETTINGS, KEY_READ)
        {
            Ok(key) => key,
            Err(e) => {
                return Finding::absent(
                    "system_proxy",
                    format!("检测失败: {}", e),
                    format!("Detection failed: {}", e),
                );
            }
        };

        let proxy_enable: u32 = key.get_value("ProxyEnable").unwrap_or(0);
        let proxy_server: String = key.get_value("ProxyServer").unwrap_or_default();

        if proxy_enable != 0 {
            Finding::found(
                "system_proxy",
                Some(proxy_server.clone()),
                format!("系统代理已启用: {}", proxy_server),
                format!("System proxy enabled: {}", proxy_server),
            )
        } else {
            Finding::absent("system_proxy", "系统代理未启用", "System proxy not enabled")
        }
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

    fn detect_uwp_loopback(&self) -> Finding {
        if let Ok(output) = run_tool(
            "CheckNetIsolation",
            &["LoopbackExempt", "-s"],
            runner::LONG_TIMEOUT,
        ) {
            let lines = output.stdout.lines().filter(|l| !l.trim().is_empty()).count();
            if lines > 1 {
                let count = lines - 1;
                return Finding::found(
                    "uwp_loopback",
                    Some(format!("{} apps", count)),
                    format!("UWP 回环豁免: {} 个应用", count),
                    format!("UWP loopback exempt: {} apps", count),
                );
            }
        }

        Finding::absent("uwp_loopback", "UWP 回环无豁免", "No UWP loopback exemptions")
    }

    // ---- cleaning ----

    fn clean_system_proxy(&self) -> Outcome {
        let key = match RegKey::predef(HKEY_CURRENT_USER)
            .open_subkey_with_flags(INTERNET_SETTINGS, KEY_SET_VALUE)
        {
            Ok(key) => key,
            Err(e) => {
                return Outcome::new(
                    "system_proxy",
                    Status::Failed,
                    format!("清理系统代理失败: {}", e),
                    format!("Failed to clean system proxy: {}", e),
                );
            }
        };

        if let Err(e) = key.set_value("ProxyEnable", &0u32) {
            return Outcome::new(
                "system_proxy",
                Status::Failed,
                format!("清理系统代理失败: {}", e),
                format!("Failed to clean system proxy: {}", e),
            );
        }
        // Absent values are already clean.
        let _ = key.delete_value("ProxyServer");
        let _ = key.delete_value("ProxyOverride");

        refresh_internet_settings();

        Outcome::new(
            "system_proxy",
            Status::Success,
            "系统代理已清理",
            "System proxy cleaned",
        )
    }

    fn clean_env_variables(&self) -> Outcome {
        let mut failed: Vec<&str> = Vec::new();

        let env_key = RegKey::predef(HKEY_CURRENT_USER)
            .open_subkey_with_flags("Environment", KEY_READ | KEY_SET_VALUE);

        for var in PROXY_ENV_VARS {
            if std::env::var_os(var).is_some() {
                // Safety: single-threaded CLI; no other thread reads the
                // environment concurrently.
                unsafe { std::env::remove_var(var) };
            }

            // Persisted user environment lives in the registry.
            match &env_key {
                Ok(key) => {
                    let _ = key.delete_value(var);
                }
                Err(_) => failed.push(var),
            }
        }

        if failed.is_empty() {
            Outcome::new(
                "env_variables",
                Status::Success,
                "环境变量已清理",
                "Environment variables cleaned",
            )
        } else {
            Outcome::new(
                "env_variables",
                Status::Failed,
                format!("部分环境变量清理失败: {}", failed.join(", ")),
                format!("Some env vars failed to clean: {}", failed.join(", ")),
            )
        }
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

    fn flush_dns_cache(&self) -> Outcome {
        match run_tool("ipconfig", &["/flushdns"], runner::LONG_TIMEOUT) {
            Ok(_) => Outcome::new(
                "dns_cache",
                Status::Success,
                "DNS 缓存已刷新",
                "DNS cache flushed",
            ),
            Err(e) => Outcome::new(
                "dns_cache",
                Status::Failed,
                format!("刷新 DNS 缓存失败: {}", e),
                format!("Failed to flush DNS cache: {}", e),
            ),
        }
    }

    /// Reset the Winsock catalog. Only attempted from an elevated process;
    /// netsh refuses it otherwise.
    fn reset_winsock(&self) -> Outcome {
        match run_tool("netsh", &["winsock", "reset"], runner::LONG_TIMEOUT) {
            Ok(_) => Outcome::new(
                "winsock_reset",
                Status::Success,
                "Winsock 已重置 (建议重启)",
                "Winsock reset (restart recommended)",
            ),
            Err(_) => Outcome::new(
                "winsock_reset",
                Status::Skipped,
                "Winsock 重置需要管理员权限",
                "Winsock reset requires admin",
            ),
        }
    }
}

//! Mirror provider catalog.
//!
//! A small fixed set of mirror operators, each with per-tool endpoint URLs.
//! The built-in table can be overridden field-by-field from an external JSON
//! document: `{ "providers": { "<key>": { "npm_registry": "...", ... } } }`.
//! Absent fields fall back to the built-in values, so a partial override
//! never blanks an endpoint.

use crate::error::{Result, SweepError};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Named mirror operators with known endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MirrorProvider {
    Tsinghua,
    Aliyun,
    Ustc,
    Huawei,
    Tencent,
}

impl MirrorProvider {
    /// Stable key used in the override document and the CLI.
    pub fn key(self) -> &'static str {
        match self {
            MirrorProvider::Tsinghua => "tsinghua",
            MirrorProvider::Aliyun => "aliyun",
            MirrorProvider::Ustc => "ustc",
            MirrorProvider::Huawei => "huawei",
            MirrorProvider::Tencent => "tencent",
        }
    }

    pub fn all() -> [MirrorProvider; 5] {
        [
            MirrorProvider::Tsinghua,
            MirrorProvider::Aliyun,
            MirrorProvider::Ustc,
            MirrorProvider::Huawei,
            MirrorProvider::Tencent,
        ]
    }
}

/// Resolved endpoint set for one provider.
///
/// `snap_url` and `git_url` are empty for providers without that service;
/// the corresponding configure operation fails closed on an empty endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEndpoints {
    pub name: String,
    pub name_zh: String,
    pub apt_url: String,
    pub npm_registry: String,
    pub pip_index: String,
    pub pip_trusted_host: String,
    pub snap_url: String,
    pub git_url: String,
}

/// Built-in endpoint table.
pub fn builtin(provider: MirrorProvider) -> ProviderEndpoints {
    match provider {
        MirrorProvider::Tsinghua => ProviderEndpoints {
            name: "Tsinghua".to_string(),
            name_zh: "清华大学".to_string(),
            apt_url: "https://mirrors.tuna.tsinghua.edu.cn".to_string(),
            npm_registry: "https://registry.npmmirror.com".to_string(),
            pip_index: "https://pypi.tuna.tsinghua.edu.cn/simple".to_string(),
            pip_trusted_host: "pypi.tuna.tsinghua.edu.cn".to_string(),
            snap_url: "https://snap.tuna.tsinghua.edu.cn".to_string(),
            git_url: "https://mirrors.tuna.tsinghua.edu.cn/git".to_string(),
        },
        MirrorProvider::Aliyun => ProviderEndpoints {
            name: "Aliyun".to_string(),
            name_zh: "阿里云".to_string(),
            apt_url: "https://mirrors.aliyun.com".to_string(),
            npm_registry: "https://registry.npmmirror.com".to_string(),
            pip_index: "https://mirrors.aliyun.com/pypi/simple".to_string(),
            pip_trusted_host: "mirrors.aliyun.com".to_string(),
            snap_url: String::new(),
            git_url: String::new(),
        },
        MirrorProvider::Ustc => ProviderEndpoints {
            name: "USTC".to_string(),
            name_zh: "中国科技大学".to_string(),
            apt_url: "https://mirrors.ustc.edu.cn".to_string(),
            npm_registry: "https://registry.npmmirror.com".to_string(),
            pip_index: "https://mirrors.ustc.edu.cn/pypi/web/simple".to_string(),
            pip_trusted_host: "mirrors.ustc.edu.cn".to_string(),
            snap_url: "https://snap.mirrors.ustc.edu.cn".to_string(),
            git_url: String::new(),
        },
        MirrorProvider::Huawei => ProviderEndpoints {
            name: "Huawei".to_string(),
            name_zh: "华为云".to_string(),
            apt_url: "https://repo.huaweicloud.com".to_string(),
            npm_registry: "https://registry.npmmirror.com".to_string(),
            pip_index: "https://repo.huaweicloud.com/repository/pypi/simple".to_string(),
            pip_trusted_host: "repo.huaweicloud.com".to_string(),
            snap_url: String::new(),
            git_url: String::new(),
        },
        MirrorProvider::Tencent => ProviderEndpoints {
            name: "Tencent".to_string(),
            name_zh: "腾讯云".to_string(),
            apt_url: "https://mirrors.cloud.tencent.com".to_string(),
            npm_registry: "https://mirrors.cloud.tencent.com/npm/".to_string(),
            pip_index: "https://mirrors.cloud.tencent.com/pypi/simple".to_string(),
            pip_trusted_host: "mirrors.cloud.tencent.com".to_string(),
            snap_url: String::new(),
            git_url: String::new(),
        },
    }
}

/// Per-provider override entry; any subset of fields may be present.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProviderOverride {
    pub name: Option<String>,
    pub name_zh: Option<String>,
    pub apt_url: Option<String>,
    pub npm_registry: Option<String>,
    pub pip_index: Option<String>,
    pub pip_trusted_host: Option<String>,
    pub snap_url: Option<String>,
    pub git_url: Option<String>,
}

/// Externally supplied catalog override, keyed by provider key.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CatalogOverride {
    pub providers: BTreeMap<String, ProviderOverride>,
}

impl CatalogOverride {
    /// Load an override document from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            SweepError::UserError(format!(
                "failed to read catalog override '{}': {}",
                path.display(),
                e
            ))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            SweepError::UserError(format!(
                "failed to parse catalog override '{}': {}",
                path.display(),
                e
            ))
        })
    }
}

/// Resolve a provider's endpoints, merging override fields over the
/// built-in defaults.
pub fn resolve(
    provider: MirrorProvider,
    override_table: Option<&CatalogOverride>,
) -> ProviderEndpoints {
    let mut endpoints = builtin(provider);

    if let Some(table) = override_table
        && let Some(entry) = table.providers.get(provider.key())
    {
        merge_field(&mut endpoints.name, &entry.name);
        merge_field(&mut endpoints.name_zh, &entry.name_zh);
        merge_field(&mut endpoints.apt_url, &entry.apt_url);
        merge_field(&mut endpoints.npm_registry, &entry.npm_registry);
        merge_field(&mut endpoints.pip_index, &entry.pip_index);
        merge_field(&mut endpoints.pip_trusted_host, &entry.pip_trusted_host);
        merge_field(&mut endpoints.snap_url, &entry.snap_url);
        merge_field(&mut endpoints.git_url, &entry.git_url);
    }

    endpoints
}

fn merge_field(target: &mut String, value: &Option<String>) {
    if let Some(v) = value {
        *target = v.clone();
    }
}

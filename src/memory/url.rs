//! URL 去重记忆：新闻文章与技术工具
//!
//! 以规范化 URL 作为主标识精确比较；可选的次级标识（文章标题 / 工具名称）
//! 独立比较，忽略大小写。同一资源换了 URL 别名但名称相同，也会被判为重复。
//!
//! ## URL 规范化规则
//!
//! 1. 去首尾空白；必须形如 `scheme://host...`，否则返回 [`CandidateError::InvalidUrl`]
//! 2. scheme 与 host 转小写，丢弃 userinfo，去掉默认端口（http `:80`、https `:443`）
//! 3. 丢弃 `#fragment`
//! 4. 去掉路径末尾所有 `/`（路径大小写保留）
//! 5. 去掉空参数与追踪参数（`utm_*`、`fbclid`、`gclid` 等，键名忽略大小写），
//!    其余参数排序；没有剩余参数时不保留 `?`

use super::record::{StoreDocument, UrlRecord};
use super::retention::{RetentionPolicy, append_bounded};
use super::similarity::normalize_text;
use super::store::JsonStore;
use crate::config::MemoryConfig;
use crate::error::{CandidateError, Result};
use chrono::Utc;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, info};

const TRACKING_PARAMS: &[&str] = &[
    "fbclid", "gclid", "dclid", "msclkid", "mc_cid", "mc_eid", "igshid", "yclid", "_ga",
    "_hsenc", "_hsmi", "ref_src",
];

fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([A-Za-z][A-Za-z0-9+.\-]*)://([^/?#]*)([^?#]*)(?:\?([^#]*))?(?:#.*)?$")
            .expect("URL regex is valid")
    })
}

fn is_tracking_param(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key.as_str())
}

fn invalid(url: &str, reason: &str) -> CandidateError {
    CandidateError::InvalidUrl {
        url: url.to_string(),
        reason: reason.to_string(),
    }
}

/// 按模块文档中的规则规范化 URL
pub fn normalize_url(url: &str) -> std::result::Result<String, CandidateError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(invalid(url, "empty"));
    }
    let caps = url_regex()
        .captures(trimmed)
        .ok_or_else(|| invalid(url, "expected scheme://host"))?;

    let scheme = caps[1].to_ascii_lowercase();
    let authority = &caps[2];
    let path = caps.get(3).map_or("", |m| m.as_str()).trim_end_matches('/');
    let query = caps.get(4).map_or("", |m| m.as_str());

    // userinfo 不参与比较
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, hp)| hp);
    let (host, port) =
        split_host_port(host_port).ok_or_else(|| invalid(url, "bad host or port"))?;
    if host.is_empty() {
        return Err(invalid(url, "missing host"));
    }
    let host = host.to_lowercase();
    let port = match (scheme.as_str(), port) {
        ("http", Some("80")) | ("https", Some("443")) | (_, None) => String::new(),
        (_, Some(p)) => format!(":{p}"),
    };

    let mut params: Vec<&str> = query
        .split('&')
        .filter(|p| !p.is_empty())
        .filter(|p| {
            let key = p.split_once('=').map_or(*p, |(k, _)| k);
            !key.is_empty() && !is_tracking_param(key)
        })
        .collect();
    params.sort_unstable();
    let query = if params.is_empty() {
        String::new()
    } else {
        format!("?{}", params.join("&"))
    };

    Ok(format!("{scheme}://{host}{port}{path}{query}"))
}

/// 拆分 `host[:port]`，支持 `[::1]:8080`；端口非数字或 IPv6 地址未加方括号时返回 `None`
fn split_host_port(host_port: &str) -> Option<(&str, Option<&str>)> {
    let (host, port) = if host_port.starts_with('[') {
        match host_port.find(']') {
            Some(end) => {
                let rest = &host_port[end + 1..];
                (&host_port[..=end], rest.strip_prefix(':'))
            }
            None => return None,
        }
    } else {
        match host_port.rsplit_once(':') {
            Some((h, _)) if h.contains(':') => return None,
            Some((h, p)) => (h, Some(p)),
            None => (host_port, None),
        }
    };
    match port {
        Some(p) if p.is_empty() => Some((host, None)),
        Some(p) if !p.bytes().all(|b| b.is_ascii_digit()) => None,
        _ => Some((host, port)),
    }
}

/// 命中方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Url,
    Secondary,
}

/// 命中的已有记录
#[derive(Debug, Clone, PartialEq)]
pub struct UrlMatch {
    pub record: UrlRecord,
    pub kind: MatchKind,
}

/// 新闻 URL / 工具 URL 存储
///
/// 每次调用都重新读盘，不缓存；调用方应先 `check` 再 `save`。
#[derive(Debug, Clone)]
pub struct UrlMemory {
    store: JsonStore<UrlRecord>,
    policy: RetentionPolicy,
}

impl UrlMemory {
    pub fn new(path: impl Into<std::path::PathBuf>, policy: RetentionPolicy) -> Self {
        Self {
            store: JsonStore::new(path),
            policy,
        }
    }

    /// 已发布新闻的 URL 存储
    pub fn news(config: &MemoryConfig) -> Self {
        Self::new(config.news_path(), RetentionPolicy::new(config.max_entries))
    }

    /// 已介绍工具的 URL 存储
    pub fn tools(config: &MemoryConfig) -> Self {
        Self::new(config.tools_path(), RetentionPolicy::new(config.max_entries))
    }

    pub fn path(&self) -> &Path {
        self.store.path()
    }

    pub fn max_entries(&self) -> usize {
        self.policy.max_entries()
    }

    /// URL 或次级标识与已有记录相同即为重复
    pub fn check(&self, candidate_key: &str, candidate_secondary: Option<&str>) -> Result<bool> {
        Ok(self
            .find_match(candidate_key, candidate_secondary)?
            .is_some())
    }

    /// 同 [`check`](Self::check)，返回命中的记录；URL 命中优先
    pub fn find_match(
        &self,
        candidate_key: &str,
        candidate_secondary: Option<&str>,
    ) -> Result<Option<UrlMatch>> {
        let key = normalize_url(candidate_key)?;
        let secondary = candidate_secondary
            .map(normalize_text)
            .filter(|s| !s.is_empty());
        let doc = self.store.load()?;

        let found = match doc.entries.iter().rev().find(|r| r.key == key) {
            Some(record) => Some(UrlMatch {
                record: record.clone(),
                kind: MatchKind::Url,
            }),
            None => secondary
                .and_then(|s| find_secondary(&doc, &s))
                .map(|record| UrlMatch {
                    record,
                    kind: MatchKind::Secondary,
                }),
        };
        debug!(
            path = %self.store.path().display(),
            key = %key,
            duplicate = found.is_some(),
            "🔍 URL 去重检查"
        );
        Ok(found)
    }

    /// 仅按次级标识（标题 / 工具名称）检查
    pub fn check_secondary(&self, name: &str) -> Result<bool> {
        let name = normalize_text(name);
        if name.is_empty() {
            return Err(CandidateError::EmptyText.into());
        }
        let doc = self.store.load()?;
        Ok(find_secondary(&doc, &name).is_some())
    }

    /// 追加一条记录并持久化；不拒绝重复
    pub fn save(&self, key: &str, secondary: Option<&str>, raw: Option<&str>) -> Result<UrlRecord> {
        let record = UrlRecord {
            key: normalize_url(key)?,
            secondary: secondary
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from),
            raw: raw.unwrap_or(key).to_string(),
            saved_at: Utc::now(),
        };
        let doc = append_bounded(self.store.load()?, record.clone(), self.policy.max_entries());
        self.store.save(&doc)?;
        info!(
            path = %self.store.path().display(),
            key = %record.key,
            entries = doc.len(),
            "📌 URL 已记录"
        );
        Ok(record)
    }

    /// 最近 `n` 条，按写入顺序（最新在末尾）；只读
    pub fn list_recent(&self, n: usize) -> Result<Vec<UrlRecord>> {
        Ok(self.store.snapshot()?.recent(n).to_vec())
    }
}

fn find_secondary(doc: &StoreDocument<UrlRecord>, normalized: &str) -> Option<UrlRecord> {
    doc.entries
        .iter()
        .rev()
        .find(|r| {
            r.secondary
                .as_deref()
                .is_some_and(|s| normalize_text(s) == normalized)
        })
        .cloned()
}

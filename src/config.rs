//! 记忆子系统配置
//!
//! 加载顺序：默认值 → YAML 配置文件（可选）→ 环境变量（`.env` 亦可）。
//!
//! ```text
//! NEWSLETTER_MEMORY_DIR=memory
//! NEWSLETTER_MEMORY_MAX_ENTRIES=90
//! NEWSLETTER_FACT_SIMILARITY_THRESHOLD=0.6
//! ```
//!
//! YAML 文件字段与 [`MemoryConfig`] 一一对应，缺省字段取默认值：
//!
//! ```yaml
//! memory_dir: ~/.newsletter/memory
//! max_entries: 120
//! similarity_threshold: 0.5
//! ```

use crate::error::{ConfigError, Result};
use crate::memory::retention::DEFAULT_MAX_ENTRIES;
use crate::memory::similarity::DEFAULT_SIMILARITY_THRESHOLD;
use dotenv::dotenv;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_MEMORY_DIR: &str = "NEWSLETTER_MEMORY_DIR";
pub const ENV_MAX_ENTRIES: &str = "NEWSLETTER_MEMORY_MAX_ENTRIES";
pub const ENV_SIMILARITY_THRESHOLD: &str = "NEWSLETTER_FACT_SIMILARITY_THRESHOLD";

/// 三个去重存储共用的配置
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct MemoryConfig {
    /// 存储文件所在目录，支持 `~/` 前缀
    pub memory_dir: PathBuf,
    /// 每个存储保留的最大条目数
    pub max_entries: usize,
    /// 事实相似度阈值，取值 (0, 1]
    pub similarity_threshold: f64,
    pub news_file: String,
    pub tools_file: String,
    pub facts_file: String,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            memory_dir: PathBuf::from("memory"),
            max_entries: DEFAULT_MAX_ENTRIES,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            news_file: "used_news_urls.json".to_string(),
            tools_file: "used_tools.json".to_string(),
            facts_file: "used_facts.json".to_string(),
        }
    }
}

impl MemoryConfig {
    /// 从 YAML 文件加载
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::FileNotFound(path.display().to_string()).into());
            }
            Err(e) => return Err(e.into()),
        };
        let config: MemoryConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// 默认值 + 环境变量
    pub fn from_env() -> Result<Self> {
        Self::resolve(None)
    }

    /// 可选 YAML 文件 + 环境变量覆盖
    pub fn resolve(config_path: Option<&Path>) -> Result<Self> {
        dotenv().ok();
        let base = match config_path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        let config = base.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_memory_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.memory_dir = dir.into();
        self
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    pub fn with_similarity_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(dir) = lookup(ENV_MEMORY_DIR).filter(|v| !v.trim().is_empty()) {
            self.memory_dir = PathBuf::from(dir.trim());
        }
        if let Some(raw) = lookup(ENV_MAX_ENTRIES) {
            self.max_entries =
                raw.trim()
                    .parse()
                    .map_err(|e| ConfigError::InvalidValue {
                        field: ENV_MAX_ENTRIES.to_string(),
                        message: format!("'{}': {}", raw, e),
                    })?;
        }
        if let Some(raw) = lookup(ENV_SIMILARITY_THRESHOLD) {
            self.similarity_threshold =
                raw.trim()
                    .parse()
                    .map_err(|e| ConfigError::InvalidValue {
                        field: ENV_SIMILARITY_THRESHOLD.to_string(),
                        message: format!("'{}': {}", raw, e),
                    })?;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_entries == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_entries".to_string(),
                message: "must be at least 1".to_string(),
            }
            .into());
        }
        // NaN 也会落入此分支
        if !(self.similarity_threshold > 0.0 && self.similarity_threshold <= 1.0) {
            return Err(ConfigError::InvalidValue {
                field: "similarity_threshold".to_string(),
                message: format!("{} is outside (0, 1]", self.similarity_threshold),
            }
            .into());
        }
        for (field, name) in [
            ("news_file", &self.news_file),
            ("tools_file", &self.tools_file),
            ("facts_file", &self.facts_file),
        ] {
            if name.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: "file name is empty".to_string(),
                }
                .into());
            }
        }
        Ok(())
    }

    /// 展开 `~/` 后的存储目录
    pub fn memory_dir(&self) -> PathBuf {
        expand_tilde(&self.memory_dir)
    }

    pub fn news_path(&self) -> PathBuf {
        self.memory_dir().join(&self.news_file)
    }

    pub fn tools_path(&self) -> PathBuf {
        self.memory_dir().join(&self.tools_file)
    }

    pub fn facts_path(&self) -> PathBuf {
        self.memory_dir().join(&self.facts_file)
    }
}

fn expand_tilde(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    if let Some(rest) = s.strip_prefix("~/")
        && let Some(home) = std::env::var("HOME")
            .ok()
            .or_else(|| std::env::var("USERPROFILE").ok())
    {
        return PathBuf::from(home).join(rest);
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MemoryError;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = MemoryConfig::default();
        assert_eq!(config.max_entries, 90);
        assert_eq!(config.similarity_threshold, 0.6);
        assert!(config.validate().is_ok());
        assert_eq!(
            config.facts_path(),
            PathBuf::from("memory").join("used_facts.json")
        );
    }

    #[test]
    fn test_env_overrides() {
        let config = MemoryConfig::default()
            .apply_overrides(lookup_from(&[
                (ENV_MEMORY_DIR, "/var/lib/newsletter"),
                (ENV_MAX_ENTRIES, " 30 "),
                (ENV_SIMILARITY_THRESHOLD, "0.45"),
            ]))
            .unwrap();
        assert_eq!(config.memory_dir, PathBuf::from("/var/lib/newsletter"));
        assert_eq!(config.max_entries, 30);
        assert_eq!(config.similarity_threshold, 0.45);
    }

    #[test]
    fn test_invalid_env_value() {
        let err = MemoryConfig::default()
            .apply_overrides(lookup_from(&[(ENV_MAX_ENTRIES, "lots")]))
            .unwrap_err();
        match err {
            MemoryError::Config(ConfigError::InvalidValue { field, .. }) => {
                assert_eq!(field, ENV_MAX_ENTRIES)
            }
            other => panic!("应返回 InvalidValue，实际为 {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        assert!(MemoryConfig::default().with_max_entries(0).validate().is_err());
        assert!(
            MemoryConfig::default()
                .with_similarity_threshold(0.0)
                .validate()
                .is_err()
        );
        assert!(
            MemoryConfig::default()
                .with_similarity_threshold(1.5)
                .validate()
                .is_err()
        );
        assert!(
            MemoryConfig::default()
                .with_similarity_threshold(f64::NAN)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_load_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.yaml");
        std::fs::write(&path, "memory_dir: /tmp/news\nmax_entries: 12\n").unwrap();

        let config = MemoryConfig::load(&path).unwrap();
        assert_eq!(config.memory_dir, PathBuf::from("/tmp/news"));
        assert_eq!(config.max_entries, 12);
        // 未写出的字段取默认值
        assert_eq!(config.similarity_threshold, 0.6);
        assert_eq!(config.news_file, "used_news_urls.json");
    }

    #[test]
    fn test_load_missing_file() {
        let err = MemoryConfig::load("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(
            err,
            MemoryError::Config(ConfigError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_load_unreadable_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        // 路径存在但不是文件
        let err = MemoryConfig::load(dir.path()).unwrap_err();
        assert!(matches!(err, MemoryError::Io(_)), "应返回 IO 错误，实际为 {err:?}");
    }

    #[test]
    fn test_load_malformed_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.yaml");
        std::fs::write(&path, "max_entries: [not, a, number]\n").unwrap();
        let err = MemoryConfig::load(&path).unwrap_err();
        assert!(matches!(err, MemoryError::Config(ConfigError::ParseFailed(_))));
    }
}

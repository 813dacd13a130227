//! 存储记录与 JSON 文档外壳
//!
//! 每种存储使用各自的记录类型，共享同一个 [`StoreDocument`] 外壳：
//!
//! ```json
//! {
//!   "entries": [
//!     { "key": "https://x.com/a", "secondary": "Some title", "raw": "https://x.com/a/", "saved_at": "2026-10-19T08:00:00Z" }
//!   ]
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// 可被 [`JsonStore`](super::store::JsonStore) 持久化的记录
pub trait StoreRecord: Serialize + DeserializeOwned + Clone + Send + Sync {
    /// 用于精确去重的规范化标识
    fn key(&self) -> &str;
    /// 原始输入，仅用于展示
    fn raw(&self) -> &str;
    fn saved_at(&self) -> DateTime<Utc>;
    /// 列表展示用的标签
    fn label(&self) -> &str {
        self.raw()
    }
}

/// 存储文件的完整内容，`entries` 按写入顺序排列（最新的在末尾）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "R: DeserializeOwned"))]
pub struct StoreDocument<R> {
    pub entries: Vec<R>,
}

impl<R> Default for StoreDocument<R> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<R> StoreDocument<R> {
    pub fn new(entries: Vec<R>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 最近写入的 `n` 条，保持写入顺序
    pub fn recent(&self, n: usize) -> &[R] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }
}

/// 新闻 / 工具 URL 记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlRecord {
    /// 规范化后的 URL
    pub key: String,
    /// 文章标题或工具名称，独立于 URL 参与比较
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<String>,
    pub raw: String,
    pub saved_at: DateTime<Utc>,
}

impl StoreRecord for UrlRecord {
    fn key(&self) -> &str {
        &self.key
    }

    fn raw(&self) -> &str {
        &self.raw
    }

    fn saved_at(&self) -> DateTime<Utc> {
        self.saved_at
    }

    fn label(&self) -> &str {
        self.secondary.as_deref().unwrap_or(&self.raw)
    }
}

/// 趣味事实记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactRecord {
    /// 规范化文本（小写、合并空白）
    pub key: String,
    pub raw: String,
    pub saved_at: DateTime<Utc>,
}

impl StoreRecord for FactRecord {
    fn key(&self) -> &str {
        &self.key
    }

    fn raw(&self) -> &str {
        &self.raw
    }

    fn saved_at(&self) -> DateTime<Utc> {
        self.saved_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_record_wire_format() {
        let json = r#"{
            "entries": [
                {"key": "https://x.com/a", "secondary": "A", "raw": "https://X.com/a/", "saved_at": "2026-10-19T08:00:00Z"},
                {"key": "https://x.com/b", "raw": "https://x.com/b", "saved_at": "2026-10-19T09:30:00+02:00"}
            ]
        }"#;
        let doc: StoreDocument<UrlRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.entries[0].label(), "A");
        assert_eq!(doc.entries[1].secondary, None);
        assert_eq!(doc.entries[1].label(), "https://x.com/b");

        // secondary 缺省时不写出
        let out = serde_json::to_value(&doc.entries[1]).unwrap();
        assert!(out.get("secondary").is_none());
        assert_eq!(out["saved_at"], "2026-10-19T07:30:00Z");
    }

    #[test]
    fn test_missing_entries_is_rejected() {
        assert!(serde_json::from_str::<StoreDocument<FactRecord>>(r#"{"facts": []}"#).is_err());
        assert!(
            serde_json::from_str::<StoreDocument<FactRecord>>(r#"{"entries": [{"key": "x"}]}"#)
                .is_err()
        );
    }

    #[test]
    fn test_recent_slice() {
        let doc = StoreDocument::new(vec![1, 2, 3, 4]);
        assert_eq!(doc.recent(2), &[3, 4]);
        assert_eq!(doc.recent(10), &[1, 2, 3, 4]);
        assert!(doc.recent(0).is_empty());
    }
}

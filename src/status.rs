//! 记忆状态报告
//!
//! 只读：不备份损坏文件，也不改写任何存储，可以在流水线运行期间随时执行。

use crate::config::MemoryConfig;
use crate::memory::{FactRecord, JsonStore, ReadOutcome, StoreRecord, UrlRecord};
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub enum StoreState {
    /// 文件不存在（尚未写入过）
    Missing,
    /// 条目数
    Ok(usize),
    Unreadable(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecentItem {
    pub saved_at: DateTime<Utc>,
    pub label: String,
}

#[derive(Debug, Clone)]
pub struct StoreStatus {
    pub label: &'static str,
    pub path: PathBuf,
    pub state: StoreState,
    pub max_entries: usize,
    /// 最新在前
    pub recent: Vec<RecentItem>,
}

#[derive(Debug, Clone)]
pub struct StatusReport {
    pub memory_dir: PathBuf,
    pub stores: Vec<StoreStatus>,
}

impl StatusReport {
    /// 收集三个存储的状态，每个附带最近 `recent` 条
    pub fn collect(config: &MemoryConfig, recent: usize) -> Self {
        let max = config.max_entries;
        Self {
            memory_dir: config.memory_dir(),
            stores: vec![
                store_status::<UrlRecord>("新闻 URL", config.news_path(), max, recent),
                store_status::<UrlRecord>("工具", config.tools_path(), max, recent),
                store_status::<FactRecord>("事实", config.facts_path(), max, recent),
            ],
        }
    }

    /// 是否有存储无法读取
    pub fn has_errors(&self) -> bool {
        self.stores
            .iter()
            .any(|s| matches!(s.state, StoreState::Unreadable(_)))
    }
}

fn store_status<R: StoreRecord>(
    label: &'static str,
    path: PathBuf,
    max_entries: usize,
    recent: usize,
) -> StoreStatus {
    let store = JsonStore::<R>::new(path);
    let (state, recent) = match store.inspect() {
        Ok(ReadOutcome::Missing) => (StoreState::Missing, Vec::new()),
        Ok(ReadOutcome::Corrupt(reason)) => (StoreState::Unreadable(reason), Vec::new()),
        Err(e) => (StoreState::Unreadable(e.to_string()), Vec::new()),
        Ok(ReadOutcome::Parsed(doc)) => {
            let items = doc
                .recent(recent)
                .iter()
                .rev()
                .map(|r| RecentItem {
                    saved_at: r.saved_at(),
                    label: r.label().to_string(),
                })
                .collect();
            (StoreState::Ok(doc.len()), items)
        }
    };
    StoreStatus {
        label,
        path: store.path().to_path_buf(),
        state,
        max_entries,
        recent,
    }
}

impl fmt::Display for StoreStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.state {
            StoreState::Missing => write!(f, "  {}: 未初始化", self.label)?,
            StoreState::Ok(count) => {
                write!(f, "  {}: {}/{} 条", self.label, count, self.max_entries)?
            }
            StoreState::Unreadable(reason) => {
                write!(f, "  {}: 读取失败 ({})", self.label, reason)?
            }
        }
        for item in &self.recent {
            write!(
                f,
                "\n      [{}] {}",
                item.saved_at.format("%Y-%m-%d"),
                item.label
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(50);
        writeln!(f, "{rule}")?;
        writeln!(f, "Newsletter 记忆状态")?;
        writeln!(f, "{rule}")?;
        writeln!(f, "记忆目录: {}", self.memory_dir.display())?;
        writeln!(f)?;
        for store in &self.stores {
            writeln!(f, "{store}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{FactMemory, UrlMemory};

    #[test]
    fn test_collect_reports_each_state() {
        let dir = tempfile::tempdir().unwrap();
        let config = MemoryConfig::default().with_memory_dir(dir.path());

        let news = UrlMemory::news(&config);
        news.save("https://x.com/1", Some("One"), None).unwrap();
        news.save("https://x.com/2", Some("Two"), None).unwrap();
        news.save("https://x.com/3", None, None).unwrap();
        std::fs::write(config.facts_path(), "not json").unwrap();

        let report = StatusReport::collect(&config, 2);
        assert_eq!(report.stores.len(), 3);

        let news = &report.stores[0];
        assert_eq!(news.state, StoreState::Ok(3));
        let labels: Vec<&str> = news.recent.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["https://x.com/3", "Two"]);

        assert_eq!(report.stores[1].state, StoreState::Missing);
        assert!(matches!(report.stores[2].state, StoreState::Unreadable(_)));
        assert!(report.has_errors());
    }

    #[test]
    fn test_collect_is_read_only() {
        let dir = tempfile::tempdir().unwrap();
        let config = MemoryConfig::default().with_memory_dir(dir.path());
        std::fs::write(config.news_path(), "{ broken").unwrap();

        StatusReport::collect(&config, 5);

        assert_eq!(std::fs::read_to_string(config.news_path()).unwrap(), "{ broken");
        assert!(!dir.path().join("used_news_urls.json.bak").exists());
        assert!(!config.tools_path().exists());
        assert!(!config.facts_path().exists());
    }

    #[test]
    fn test_display() {
        let dir = tempfile::tempdir().unwrap();
        let config = MemoryConfig::default()
            .with_memory_dir(dir.path())
            .with_max_entries(30);
        FactMemory::new(&config)
            .save("Linux was first released in 1991.")
            .unwrap();

        let text = StatusReport::collect(&config, 1).to_string();
        assert!(text.contains("新闻 URL: 未初始化"), "{text}");
        assert!(text.contains("事实: 1/30 条"), "{text}");
        assert!(text.contains("Linux was first released in 1991."), "{text}");
        assert!(!StatusReport::collect(&config, 0).has_errors());
    }
}

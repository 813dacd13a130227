//! 保留策略：每个存储只保留最近写入的 N 条，最旧的先淘汰

use super::record::StoreDocument;
use tracing::debug;

pub const DEFAULT_MAX_ENTRIES: usize = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    max_entries: usize,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

impl RetentionPolicy {
    /// `max_entries` 至少为 1
    pub fn new(max_entries: usize) -> Self {
        Self {
            max_entries: max_entries.max(1),
        }
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// 从头部淘汰直到满足上限，返回淘汰条数
    pub fn enforce<R>(&self, entries: &mut Vec<R>) -> usize {
        let excess = entries.len().saturating_sub(self.max_entries);
        if excess > 0 {
            entries.drain(..excess);
            debug!(evicted = excess, max_entries = self.max_entries, "🧹 淘汰最旧记录");
        }
        excess
    }
}

/// 追加一条记录并按上限淘汰，不落盘
pub fn append_bounded<R>(
    mut store: StoreDocument<R>,
    record: R,
    max_entries: usize,
) -> StoreDocument<R> {
    store.entries.push(record);
    RetentionPolicy::new(max_entries).enforce(&mut store.entries);
    store
}

//! 趣味事实去重记忆
//!
//! 同一事实常被换一种说法重新提出，仅靠精确比较不够：
//! 先比较规范化文本，再按关键词重叠率（见 [`similarity`](super::similarity)）判断近似重复。
//! 空文本一律视为重复，避免把空事实写进存储。

use super::record::FactRecord;
use super::retention::{RetentionPolicy, append_bounded};
use super::similarity::{extract_keywords, keyword_overlap, normalize_text};
use super::store::JsonStore;
use crate::config::MemoryConfig;
use crate::error::{CandidateError, Result};
use chrono::Utc;
use std::path::Path;
use tracing::{debug, info, warn};

/// 事实检查结果
#[derive(Debug, Clone, PartialEq)]
pub enum FactVerdict {
    /// 候选为空或仅含空白
    Empty,
    /// 与已有事实的规范化文本完全相同
    Exact(FactRecord),
    /// 关键词重叠率达到阈值
    Similar { record: FactRecord, score: f64 },
    New,
}

impl FactVerdict {
    pub fn is_duplicate(&self) -> bool {
        !matches!(self, FactVerdict::New)
    }
}

#[derive(Debug, Clone)]
pub struct FactMemory {
    store: JsonStore<FactRecord>,
    policy: RetentionPolicy,
    threshold: f64,
}

impl FactMemory {
    pub fn new(config: &MemoryConfig) -> Self {
        Self::with_path(
            config.facts_path(),
            RetentionPolicy::new(config.max_entries),
            config.similarity_threshold,
        )
    }

    pub fn with_path(
        path: impl Into<std::path::PathBuf>,
        policy: RetentionPolicy,
        threshold: f64,
    ) -> Self {
        Self {
            store: JsonStore::new(path),
            policy,
            threshold,
        }
    }

    pub fn path(&self) -> &Path {
        self.store.path()
    }

    pub fn max_entries(&self) -> usize {
        self.policy.max_entries()
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn check(&self, candidate_text: &str) -> Result<bool> {
        Ok(self.verdict(candidate_text)?.is_duplicate())
    }

    /// 先精确比较，再按相似度比较；相似度取最高的一条
    pub fn verdict(&self, candidate_text: &str) -> Result<FactVerdict> {
        let normalized = normalize_text(candidate_text);
        if normalized.is_empty() {
            warn!("⚠️ 空事实文本，按重复处理");
            return Ok(FactVerdict::Empty);
        }

        let doc = self.store.load()?;
        if let Some(record) = doc
            .entries
            .iter()
            .rev()
            .find(|r| r.key == normalized || normalize_text(&r.raw) == normalized)
        {
            return Ok(FactVerdict::Exact(record.clone()));
        }

        let candidate = extract_keywords(candidate_text);
        let best = doc
            .entries
            .iter()
            .rev()
            .map(|r| (r, keyword_overlap(&candidate, &extract_keywords(&r.raw))))
            .filter(|(_, score)| *score >= self.threshold)
            .max_by(|a, b| a.1.total_cmp(&b.1));

        Ok(match best {
            Some((record, score)) => {
                debug!(score, threshold = self.threshold, existing = %record.raw, "🔍 命中相似事实");
                FactVerdict::Similar {
                    record: record.clone(),
                    score,
                }
            }
            None => FactVerdict::New,
        })
    }

    /// 追加一条事实并持久化；不拒绝重复，空文本返回错误
    pub fn save(&self, text: &str) -> Result<FactRecord> {
        let key = normalize_text(text);
        if key.is_empty() {
            return Err(CandidateError::EmptyText.into());
        }
        let record = FactRecord {
            key,
            raw: text.to_string(),
            saved_at: Utc::now(),
        };
        let doc = append_bounded(self.store.load()?, record.clone(), self.policy.max_entries());
        self.store.save(&doc)?;
        info!(path = %self.store.path().display(), entries = doc.len(), "📌 事实已记录");
        Ok(record)
    }

    /// 最近 `n` 条，按写入顺序（最新在末尾）；只读
    pub fn list_recent(&self, n: usize) -> Result<Vec<FactRecord>> {
        Ok(self.store.snapshot()?.recent(n).to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MemoryError;

    const MOTH: &str = "The first computer bug was a real moth found in the Harvard Mark II in 1947.";

    fn memory(dir: &Path) -> FactMemory {
        FactMemory::with_path(
            dir.join("used_facts.json"),
            RetentionPolicy::default(),
            0.6,
        )
    }

    #[test]
    fn test_paraphrase_is_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let mem = memory(dir.path());
        mem.save(MOTH).unwrap();

        let verdict = mem
            .verdict("In 1947, a moth was found inside the Harvard Mark II — the origin of the word 'bug'.")
            .unwrap();
        match verdict {
            FactVerdict::Similar { record, score } => {
                assert_eq!(record.raw, MOTH);
                assert!(score >= 0.6);
            }
            other => panic!("应判为相似，实际为 {other:?}"),
        }
    }

    #[test]
    fn test_exact_ignores_case_and_spacing() {
        let dir = tempfile::tempdir().unwrap();
        let mem = memory(dir.path());
        mem.save(MOTH).unwrap();

        let verdict = mem.verdict(&format!("  {}  ", MOTH.to_uppercase())).unwrap();
        assert!(matches!(verdict, FactVerdict::Exact(_)));
        assert!(mem.check(MOTH).unwrap());
    }

    #[test]
    fn test_threshold_boundary() {
        let dir = tempfile::tempdir().unwrap();
        let mem = memory(dir.path());
        mem.save("alpha bravo charlie delta kilo").unwrap();

        // 3/5 = 0.6，达到阈值
        assert!(mem.check("alpha bravo charlie xray yankee").unwrap());
        // 2/5 = 0.4，低于阈值
        assert!(!mem.check("alpha bravo xray yankee zulu").unwrap());
    }

    #[test]
    fn test_configurable_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let strict = FactMemory::with_path(
            dir.path().join("used_facts.json"),
            RetentionPolicy::default(),
            0.9,
        );
        strict.save("alpha bravo charlie delta kilo").unwrap();
        assert!(!strict.check("alpha bravo charlie xray yankee").unwrap());
    }

    #[test]
    fn test_empty_candidate_is_always_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let mem = memory(dir.path());
        assert_eq!(mem.verdict("   \n\t").unwrap(), FactVerdict::Empty);
        assert!(mem.check("").unwrap());

        let err = mem.save("  ").unwrap_err();
        assert!(matches!(
            err,
            MemoryError::Candidate(CandidateError::EmptyText)
        ));
        assert!(!mem.path().exists());
    }

    #[test]
    fn test_new_fact() {
        let dir = tempfile::tempdir().unwrap();
        let mem = memory(dir.path());
        mem.save(MOTH).unwrap();
        assert_eq!(
            mem.verdict("The QWERTY layout was designed in the 1870s for typewriters.")
                .unwrap(),
            FactVerdict::New
        );
    }

    #[test]
    fn test_save_stores_normalized_key_and_raw() {
        let dir = tempfile::tempdir().unwrap();
        let mem = memory(dir.path());
        let record = mem.save("  Ada   Lovelace wrote the FIRST program ").unwrap();
        assert_eq!(record.key, "ada lovelace wrote the first program");
        assert_eq!(record.raw, "  Ada   Lovelace wrote the FIRST program ");

        let recent = mem.list_recent(1).unwrap();
        assert_eq!(recent, vec![record]);
    }

    #[test]
    fn test_check_after_save_for_many_facts() {
        let dir = tempfile::tempdir().unwrap();
        let mem = memory(dir.path());
        let facts = [
            "Linux was first released by Linus Torvalds in 1991.",
            "The @ symbol was chosen for email addresses by Ray Tomlinson.",
            "COBOL is still running a large share of banking transactions.",
        ];
        for fact in facts {
            mem.save(fact).unwrap();
            assert!(mem.check(fact).unwrap());
        }
        assert_eq!(mem.list_recent(10).unwrap().len(), 3);
    }
}

//! 防重复记忆
//!
//! 每期简报发布前，研究步骤先用 `check` 确认内容未出现过，定稿后再 `save`。
//!
//! | 存储 | 实现 | 主标识 | 次级标识 / 近似匹配 |
//! |------|------|--------|--------------------|
//! | 新闻 | [`UrlMemory::news`] | 规范化 URL | 文章标题 |
//! | 工具 | [`UrlMemory::tools`] | 规范化 URL | 工具名称 |
//! | 事实 | [`FactMemory`] | 规范化文本 | 关键词重叠率 |
//!
//! 三者共用 [`JsonStore`]（原子写入、损坏恢复）与 [`RetentionPolicy`]（默认保留 90 条）。
//!
//! ```rust,no_run
//! use newsletter_memory::config::MemoryConfig;
//! use newsletter_memory::memory::UrlMemory;
//!
//! # fn example() -> newsletter_memory::error::Result<()> {
//! let config = MemoryConfig::from_env()?;
//! let news = UrlMemory::news(&config);
//! let url = "https://example.com/article?utm_source=rss";
//! if !news.check(url, Some("Example article"))? {
//!     // ... 采用该文章，定稿后：
//!     news.save(url, Some("Example article"), None)?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod fact;
pub mod record;
pub mod retention;
pub mod similarity;
pub mod store;
pub mod url;

pub use fact::{FactMemory, FactVerdict};
pub use record::{FactRecord, StoreDocument, StoreRecord, UrlRecord};
pub use retention::{DEFAULT_MAX_ENTRIES, RetentionPolicy, append_bounded};
pub use similarity::{DEFAULT_SIMILARITY_THRESHOLD, similarity};
pub use store::{JsonStore, ReadOutcome};
pub use url::{MatchKind, UrlMatch, UrlMemory, normalize_url};

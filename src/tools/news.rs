//! 新闻 URL 工具：check_news_url / save_news_url / list_used_news_urls

use super::{
    Tool, ToolParameters, ToolResult, candidate_failure, display_date, format_recent,
    limit_param, optional_str, required_str, run_blocking,
};
use crate::config::MemoryConfig;
use crate::error::Result;
use crate::memory::{MatchKind, StoreRecord, UrlMatch, UrlMemory};
use serde_json::{Value, json};
use tracing::debug;

/// 命中结果的说明文字，`check` 与 `save` 共用
fn describe_news_match(found: &UrlMatch) -> String {
    let date = display_date(found.record.saved_at);
    match found.kind {
        MatchKind::Url => format!(
            "该文章 URL 已于 {date} 使用过：{}",
            found.record.label()
        ),
        MatchKind::Secondary => format!(
            "标题与 {date} 使用过的文章相同：{} ({})",
            found.record.label(),
            found.record.raw
        ),
    }
}

// ── CheckNewsUrlTool ─────────────────────────────────────────────────────────

/// 检查新闻文章是否已在往期简报中使用过
pub struct CheckNewsUrlTool {
    memory: UrlMemory,
}

impl CheckNewsUrlTool {
    pub fn new(config: &MemoryConfig) -> Self {
        Self {
            memory: UrlMemory::news(config),
        }
    }
}

#[async_trait::async_trait]
impl Tool for CheckNewsUrlTool {
    fn name(&self) -> &str {
        "check_news_url"
    }

    fn description(&self) -> &str {
        "检查一篇新闻文章是否已在往期简报中使用过。\
         选用任何文章之前必须先调用。URL 会先规范化（去掉 utm_* 等追踪参数），\
         提供标题时也会按标题比较。输出以 DUPLICATE 或 NEW 开头。"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "文章 URL"
                },
                "title": {
                    "type": "string",
                    "description": "文章标题（可选），用于识别同一文章的不同 URL"
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, parameters: ToolParameters) -> Result<ToolResult> {
        let url = required_str(&parameters, "url")?.to_string();
        let title = optional_str(&parameters, "title").map(String::from);

        let memory = self.memory.clone();
        run_blocking(move || match memory.find_match(&url, title.as_deref()) {
            Ok(Some(found)) => Ok(ToolResult::success(format!(
                "DUPLICATE: {}。请换一篇文章。",
                describe_news_match(&found)
            ))),
            Ok(None) => Ok(ToolResult::success(
                "NEW: 该文章未使用过，可以采用。".to_string(),
            )),
            Err(e) => candidate_failure(e),
        })
        .await
    }
}

// ── SaveNewsUrlTool ──────────────────────────────────────────────────────────

/// 记录已在简报中使用的新闻文章
pub struct SaveNewsUrlTool {
    memory: UrlMemory,
}

impl SaveNewsUrlTool {
    pub fn new(config: &MemoryConfig) -> Self {
        Self {
            memory: UrlMemory::news(config),
        }
    }
}

#[async_trait::async_trait]
impl Tool for SaveNewsUrlTool {
    fn name(&self) -> &str {
        "save_news_url"
    }

    fn description(&self) -> &str {
        "简报定稿后，记录已采用的新闻文章，避免以后重复使用。\
         已存在的文章不会重复保存。"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "文章 URL"
                },
                "title": {
                    "type": "string",
                    "description": "文章标题"
                }
            },
            "required": ["url", "title"]
        })
    }

    async fn execute(&self, parameters: ToolParameters) -> Result<ToolResult> {
        let url = required_str(&parameters, "url")?.to_string();
        let title = required_str(&parameters, "title")?.to_string();

        let memory = self.memory.clone();
        run_blocking(move || {
            match memory.find_match(&url, Some(&title)) {
                Ok(Some(found)) => {
                    debug!(url = %url, "⏭️ 文章已存在，跳过保存");
                    return Ok(ToolResult::success(format!(
                        "DUPLICATE: {}，未重复保存。",
                        describe_news_match(&found)
                    )));
                }
                Ok(None) => {}
                Err(e) => return candidate_failure(e),
            }

            let record = memory.save(&url, Some(&title), None)?;
            Ok(ToolResult::success(format!(
                "SAVED: 已记录文章「{}」({})",
                record.label(),
                record.key
            )))
        })
        .await
    }
}

// ── ListUsedNewsUrlsTool ─────────────────────────────────────────────────────

/// 列出最近使用过的新闻文章
pub struct ListUsedNewsUrlsTool {
    memory: UrlMemory,
}

impl ListUsedNewsUrlsTool {
    pub fn new(config: &MemoryConfig) -> Self {
        Self {
            memory: UrlMemory::news(config),
        }
    }
}

#[async_trait::async_trait]
impl Tool for ListUsedNewsUrlsTool {
    fn name(&self) -> &str {
        "list_used_news_urls"
    }

    fn description(&self) -> &str {
        "列出最近使用过的新闻文章（最新在前），用于了解近期已覆盖的话题。"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "limit": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": self.memory.max_entries(),
                    "description": "返回条数，默认 10"
                }
            }
        })
    }

    async fn execute(&self, parameters: ToolParameters) -> Result<ToolResult> {
        let limit = limit_param(&parameters, self.memory.max_entries())?;
        let memory = self.memory.clone();
        let records = run_blocking(move || memory.list_recent(limit)).await?;
        Ok(ToolResult::success(format_recent("已使用的新闻", &records)))
    }
}

//! 技术工具 URL 工具：check_tool_url / check_tool / save_tool_url / list_used_tools_urls
//!
//! 同一个工具常有多个入口（官网、GitHub、文档站），所以工具名称与 URL 同等重要：
//! 任一命中即视为已介绍过。

use super::{
    Tool, ToolParameters, ToolResult, candidate_failure, display_date, format_recent,
    limit_param, optional_str, required_str, run_blocking,
};
use crate::config::MemoryConfig;
use crate::error::{CandidateError, Result};
use crate::memory::{MatchKind, StoreRecord, UrlMatch, UrlMemory};
use serde_json::{Value, json};
use tracing::debug;

fn describe_tool_match(found: &UrlMatch) -> String {
    let date = display_date(found.record.saved_at);
    match found.kind {
        MatchKind::Url => format!(
            "该工具 URL 已于 {date} 介绍过：{} ({})",
            found.record.label(),
            found.record.key
        ),
        MatchKind::Secondary => format!(
            "同名工具已于 {date} 介绍过：{} ({})",
            found.record.label(),
            found.record.raw
        ),
    }
}

// ── CheckToolUrlTool ─────────────────────────────────────────────────────────

pub struct CheckToolUrlTool {
    memory: UrlMemory,
}

impl CheckToolUrlTool {
    pub fn new(config: &MemoryConfig) -> Self {
        Self {
            memory: UrlMemory::tools(config),
        }
    }
}

#[async_trait::async_trait]
impl Tool for CheckToolUrlTool {
    fn name(&self) -> &str {
        "check_tool_url"
    }

    fn description(&self) -> &str {
        "检查一个技术工具是否已在往期简报中介绍过。按规范化 URL 比较，\
         提供工具名称时也按名称比较。输出以 DUPLICATE 或 NEW 开头。"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "工具主页或仓库 URL"
                },
                "tool_name": {
                    "type": "string",
                    "description": "工具名称（可选）"
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, parameters: ToolParameters) -> Result<ToolResult> {
        let url = required_str(&parameters, "url")?.to_string();
        let name = optional_str(&parameters, "tool_name").map(String::from);

        let memory = self.memory.clone();
        run_blocking(move || match memory.find_match(&url, name.as_deref()) {
            Ok(Some(found)) => Ok(ToolResult::success(format!(
                "DUPLICATE: {}。请选择其他工具。",
                describe_tool_match(&found)
            ))),
            Ok(None) => Ok(ToolResult::success(
                "NEW: 该工具未介绍过，可以采用。".to_string(),
            )),
            Err(e) => candidate_failure(e),
        })
        .await
    }
}

// ── CheckToolNameTool ────────────────────────────────────────────────────────

/// 只按名称检查，适合还没确定 URL 的时候
pub struct CheckToolNameTool {
    memory: UrlMemory,
}

impl CheckToolNameTool {
    pub fn new(config: &MemoryConfig) -> Self {
        Self {
            memory: UrlMemory::tools(config),
        }
    }
}

#[async_trait::async_trait]
impl Tool for CheckToolNameTool {
    fn name(&self) -> &str {
        "check_tool"
    }

    fn description(&self) -> &str {
        "按名称检查一个技术工具是否已介绍过（忽略大小写）。输出以 DUPLICATE 或 NEW 开头。"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "tool_name": {
                    "type": "string",
                    "description": "工具名称"
                }
            },
            "required": ["tool_name"]
        })
    }

    async fn execute(&self, parameters: ToolParameters) -> Result<ToolResult> {
        let name = required_str(&parameters, "tool_name")?.trim().to_string();
        let memory = self.memory.clone();
        run_blocking(move || match memory.check_secondary(&name) {
            Ok(true) => Ok(ToolResult::success(format!(
                "DUPLICATE: 工具「{name}」已介绍过。请选择其他工具。"
            ))),
            Ok(false) => Ok(ToolResult::success(format!("NEW: 工具「{name}」未介绍过。"))),
            Err(e) => candidate_failure(e),
        })
        .await
    }
}

// ── SaveToolTool ─────────────────────────────────────────────────────────────

pub struct SaveToolTool {
    memory: UrlMemory,
}

impl SaveToolTool {
    pub fn new(config: &MemoryConfig) -> Self {
        Self {
            memory: UrlMemory::tools(config),
        }
    }
}

#[async_trait::async_trait]
impl Tool for SaveToolTool {
    fn name(&self) -> &str {
        "save_tool_url"
    }

    fn description(&self) -> &str {
        "简报定稿后，记录已介绍的技术工具（名称和 URL）。名称或 URL 已存在时不会重复保存。"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "tool_name": {
                    "type": "string",
                    "description": "工具名称"
                },
                "tool_url": {
                    "type": "string",
                    "description": "工具主页或仓库 URL"
                }
            },
            "required": ["tool_name", "tool_url"]
        })
    }

    async fn execute(&self, parameters: ToolParameters) -> Result<ToolResult> {
        let name = required_str(&parameters, "tool_name")?.to_string();
        let url = required_str(&parameters, "tool_url")?.to_string();
        if name.trim().is_empty() {
            return candidate_failure(CandidateError::EmptyText.into());
        }

        let memory = self.memory.clone();
        run_blocking(move || {
            match memory.find_match(&url, Some(&name)) {
                Ok(Some(found)) => {
                    debug!(tool = %name, "⏭️ 工具已存在，跳过保存");
                    return Ok(ToolResult::success(format!(
                        "DUPLICATE: {}，未重复保存。",
                        describe_tool_match(&found)
                    )));
                }
                Ok(None) => {}
                Err(e) => return candidate_failure(e),
            }

            let record = memory.save(&url, Some(&name), None)?;
            Ok(ToolResult::success(format!(
                "SAVED: 已记录工具「{}」({})",
                record.label(),
                record.key
            )))
        })
        .await
    }
}

// ── ListUsedToolsTool ────────────────────────────────────────────────────────

pub struct ListUsedToolsTool {
    memory: UrlMemory,
}

impl ListUsedToolsTool {
    pub fn new(config: &MemoryConfig) -> Self {
        Self {
            memory: UrlMemory::tools(config),
        }
    }
}

#[async_trait::async_trait]
impl Tool for ListUsedToolsTool {
    fn name(&self) -> &str {
        "list_used_tools_urls"
    }

    fn description(&self) -> &str {
        "列出最近介绍过的技术工具（最新在前）。"
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
        Ok(ToolResult::success(format_recent("已介绍的工具", &records)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> ToolParameters {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), json!(v)))
            .collect()
    }

    #[tokio::test]
    async fn test_name_alias_is_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let config = MemoryConfig::default().with_memory_dir(dir.path());

        let result = SaveToolTool::new(&config)
            .execute(params(&[
                ("tool_name", "ripgrep"),
                ("tool_url", "https://github.com/BurntSushi/ripgrep"),
            ]))
            .await
            .unwrap();
        assert!(result.output.starts_with("SAVED"), "{}", result.output);

        let by_name = CheckToolNameTool::new(&config)
            .execute(params(&[("tool_name", "RipGrep")]))
            .await
            .unwrap();
        assert!(by_name.output.starts_with("DUPLICATE"), "{}", by_name.output);

        let other_url = CheckToolUrlTool::new(&config)
            .execute(params(&[
                ("url", "https://ripgrep.dev"),
                ("tool_name", "ripgrep"),
            ]))
            .await
            .unwrap();
        assert!(other_url.output.starts_with("DUPLICATE"));
        assert!(other_url.output.contains("同名工具"));

        let fresh = CheckToolUrlTool::new(&config)
            .execute(params(&[("url", "https://github.com/sharkdp/fd")]))
            .await
            .unwrap();
        assert!(fresh.output.starts_with("NEW"));
    }

    #[tokio::test]
    async fn test_save_skips_known_url_under_new_name() {
        let dir = tempfile::tempdir().unwrap();
        let config = MemoryConfig::default().with_memory_dir(dir.path());
        let save = SaveToolTool::new(&config);
        save.execute(params(&[("tool_name", "bat"), ("tool_url", "https://github.com/sharkdp/bat")]))
            .await
            .unwrap();

        let result = save
            .execute(params(&[
                ("tool_name", "bat-cat"),
                ("tool_url", "https://GitHub.com/sharkdp/bat/?utm_medium=social"),
            ]))
            .await
            .unwrap();
        assert!(result.output.starts_with("DUPLICATE"));
        assert_eq!(UrlMemory::tools(&config).list_recent(10).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_blank_name_is_failed_result() {
        let dir = tempfile::tempdir().unwrap();
        let config = MemoryConfig::default().with_memory_dir(dir.path());

        let check = CheckToolNameTool::new(&config)
            .execute(params(&[("tool_name", "   ")]))
            .await
            .unwrap();
        assert!(!check.success);

        let save = SaveToolTool::new(&config)
            .execute(params(&[("tool_name", " "), ("tool_url", "https://x.dev")]))
            .await
            .unwrap();
        assert!(!save.success);
        assert!(!config.tools_path().exists());
    }

    #[tokio::test]
    async fn test_list_shows_name_and_url() {
        let dir = tempfile::tempdir().unwrap();
        let config = MemoryConfig::default().with_memory_dir(dir.path());
        UrlMemory::tools(&config)
            .save("https://github.com/astral-sh/uv", Some("uv"), None)
            .unwrap();

        let result = ListUsedToolsTool::new(&config)
            .execute(ToolParameters::new())
            .await
            .unwrap();
        assert!(result.output.contains("1. ["));
        assert!(result.output.contains("uv (https://github.com/astral-sh/uv)"));
    }
}

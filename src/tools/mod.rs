//! 工具系统
//!
//! 定义 [`Tool`] trait 和 [`ToolManager`]（注册、执行、超时）。
//! 研究 Agent 通过这些工具访问去重记忆：
//!
//! | 模块 | 工具 |
//! |------|------|
//! | [`news`] | `check_news_url` / `save_news_url` / `list_used_news_urls` |
//! | [`tech`] | `check_tool_url` / `check_tool` / `save_tool_url` / `list_used_tools_urls` |
//! | [`facts`] | `check_fact` / `save_fact` / `list_used_facts` |
//!
//! 检查类工具的输出以固定标记开头，便于 Agent 判断：`DUPLICATE`、`SIMILAR`、`NEW`。

pub mod facts;
pub mod news;
pub mod tech;

use crate::config::MemoryConfig;
use crate::error::{MemoryError, Result, ToolError};
use crate::memory::StoreRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// 列表类工具默认返回条数
pub const DEFAULT_LIST_LIMIT: usize = 10;

/// 工具执行结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    pub output: String,
    pub error: Option<String>,
}

impl ToolResult {
    pub fn success(output: String) -> Self {
        Self {
            success: true,
            output,
            error: None,
        }
    }

    pub fn error(error: String) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(error),
        }
    }
}

/// 工具执行配置
#[derive(Debug, Clone)]
pub struct ToolExecutionConfig {
    /// 单次工具执行超时（毫秒）。0 = 不限制。默认 30_000（30 秒）
    pub timeout_ms: u64,
}

impl Default for ToolExecutionConfig {
    fn default() -> Self {
        Self { timeout_ms: 30_000 }
    }
}

pub type ToolParameters = HashMap<String, serde_json::Value>;

/// 工具接口，所有记忆工具均实现此 trait
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    /// 工具参数的 JSON Schema 定义
    fn parameters(&self) -> serde_json::Value;
    async fn execute(&self, parameters: ToolParameters) -> Result<ToolResult>;
}

/// 发送给 LLM 的工具定义（对应 OpenAI tools 数组元素）
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: FunctionSpec,
}

/// 工具的函数声明（name、描述和 JSON Schema 参数定义）
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FunctionSpec {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    pub fn from_tool(tool: &dyn Tool) -> Self {
        Self {
            tool_type: "function".to_string(),
            function: FunctionSpec {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters(),
            },
        }
    }
}

pub struct ToolManager {
    tools: HashMap<String, Box<dyn Tool>>,
    config: ToolExecutionConfig,
}

impl Default for ToolManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolManager {
    pub fn new() -> Self {
        Self::new_with_config(ToolExecutionConfig::default())
    }

    pub fn new_with_config(config: ToolExecutionConfig) -> Self {
        Self {
            tools: HashMap::new(),
            config,
        }
    }

    /// 注册全部记忆工具
    pub fn with_newsletter_tools(config: &MemoryConfig) -> Self {
        let mut manager = Self::new();
        manager.register_tools(newsletter_tools(config));
        manager
    }

    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn register_tools(&mut self, tools: Vec<Box<dyn Tool>>) {
        for tool in tools {
            self.register(tool);
        }
    }

    /// 已注册工具名，按字母序
    pub fn list_tools(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|name| name.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn get_tool(&self, tool_name: &str) -> Option<&dyn Tool> {
        self.tools.get(tool_name).map(|tool| &**tool)
    }

    pub fn get_tool_definitions(&self) -> Vec<ToolDefinition> {
        self.list_tools()
            .into_iter()
            .filter_map(|name| self.get_tool(name))
            .map(ToolDefinition::from_tool)
            .collect()
    }

    pub async fn execute_tool(
        &self,
        tool_name: &str,
        parameters: ToolParameters,
    ) -> Result<ToolResult> {
        let tool = self
            .get_tool(tool_name)
            .ok_or_else(|| ToolError::NotFound(tool_name.to_string()))?;

        debug!(tool = %tool_name, "🔧 执行工具");
        if self.config.timeout_ms == 0 {
            return tool.execute(parameters).await;
        }
        match tokio::time::timeout(
            Duration::from_millis(self.config.timeout_ms),
            tool.execute(parameters),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ToolError::Timeout(tool_name.to_string()).into()),
        }
    }
}

/// 三个存储的全部记忆工具
pub fn newsletter_tools(config: &MemoryConfig) -> Vec<Box<dyn Tool>> {
    vec![
        Box::new(news::CheckNewsUrlTool::new(config)),
        Box::new(news::SaveNewsUrlTool::new(config)),
        Box::new(news::ListUsedNewsUrlsTool::new(config)),
        Box::new(tech::CheckToolUrlTool::new(config)),
        Box::new(tech::CheckToolNameTool::new(config)),
        Box::new(tech::SaveToolTool::new(config)),
        Box::new(tech::ListUsedToolsTool::new(config)),
        Box::new(facts::CheckFactTool::new(config)),
        Box::new(facts::SaveFactTool::new(config)),
        Box::new(facts::ListUsedFactsTool::new(config)),
    ]
}

/// 在阻塞线程池中执行存储读写，让执行超时可以生效，也不占用异步工作线程
async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| MemoryError::Io(std::io::Error::other(e)))?
}

// ── 参数解析 ──────────────────────────────────────────────────────────────────

fn required_str<'a>(parameters: &'a ToolParameters, name: &str) -> Result<&'a str> {
    parameters
        .get(name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ToolError::MissingParameter(name.to_string()).into())
}

fn optional_str<'a>(parameters: &'a ToolParameters, name: &str) -> Option<&'a str> {
    parameters
        .get(name)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// `limit` 参数，缺省为 [`DEFAULT_LIST_LIMIT`]，限制在 `1..=max`
fn limit_param(parameters: &ToolParameters, max: usize) -> Result<usize> {
    match parameters.get("limit") {
        None | Some(serde_json::Value::Null) => Ok(DEFAULT_LIST_LIMIT.min(max)),
        Some(v) => v
            .as_u64()
            .map(|n| (n as usize).clamp(1, max.max(1)))
            .ok_or_else(|| {
                ToolError::InvalidParameter {
                    name: "limit".to_string(),
                    message: format!("expected a positive integer, got {v}"),
                }
                .into()
            }),
    }
}

/// 候选内容错误转为失败结果交给 Agent，其余错误向上传递
fn candidate_failure(err: MemoryError) -> Result<ToolResult> {
    match err {
        MemoryError::Candidate(e) => Ok(ToolResult::error(e.to_string())),
        other => Err(other),
    }
}

/// 列表展示用的日期
fn display_date(saved_at: chrono::DateTime<chrono::Utc>) -> String {
    saved_at.format("%Y-%m-%d").to_string()
}

/// 列表工具的输出：最新在前，每行 `序号. [日期] 展示名`
fn format_recent<R: StoreRecord>(heading: &str, records: &[R]) -> String {
    if records.is_empty() {
        return format!("{heading}：暂无记录");
    }
    let mut out = format!("{heading}（最近 {} 条，最新在前）：", records.len());
    for (i, record) in records.iter().rev().enumerate() {
        out.push_str(&format!(
            "\n{}. [{}] {}",
            i + 1,
            display_date(record.saved_at()),
            record.label()
        ));
        if record.label() != record.raw() {
            out.push_str(&format!(" ({})", record.raw()));
        }
    }
    out
}

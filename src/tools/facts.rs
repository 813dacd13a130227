//! 趣味事实工具：check_fact / save_fact / list_used_facts

use super::{
    Tool, ToolParameters, ToolResult, candidate_failure, display_date, format_recent,
    limit_param, required_str, run_blocking,
};
use crate::config::MemoryConfig;
use crate::error::Result;
use crate::memory::{FactMemory, FactVerdict};
use serde_json::{Value, json};
use tracing::debug;

fn fact_parameters() -> Value {
    json!({
        "type": "object",
        "properties": {
            "fact_summary": {
                "type": "string",
                "description": "事实的一句话概要，例如 \"1947 年在 Harvard Mark II 中发现的飞蛾是第一个计算机 bug\""
            }
        },
        "required": ["fact_summary"]
    })
}

// ── CheckFactTool ────────────────────────────────────────────────────────────

/// 检查趣味事实是否与已用过的事实相同或近似
pub struct CheckFactTool {
    memory: FactMemory,
}

impl CheckFactTool {
    pub fn new(config: &MemoryConfig) -> Self {
        Self {
            memory: FactMemory::new(config),
        }
    }
}

#[async_trait::async_trait]
impl Tool for CheckFactTool {
    fn name(&self) -> &str {
        "check_fact"
    }

    fn description(&self) -> &str {
        "检查一条趣味事实是否已在往期简报中用过。换一种说法的同一事实也会被识别\
         （关键词重叠）。输出以 DUPLICATE、SIMILAR 或 NEW 开头。"
    }

    fn parameters(&self) -> Value {
        fact_parameters()
    }

    async fn execute(&self, parameters: ToolParameters) -> Result<ToolResult> {
        let summary = required_str(&parameters, "fact_summary")?.to_string();

        let memory = self.memory.clone();
        let verdict = run_blocking(move || memory.verdict(&summary)).await?;
        let output = match verdict {
            FactVerdict::Empty => "DUPLICATE: 事实内容为空，请提供具体的事实概要。".to_string(),
            FactVerdict::Exact(record) => format!(
                "DUPLICATE: 该事实已于 {} 使用过：{}",
                display_date(record.saved_at),
                record.raw
            ),
            FactVerdict::Similar { record, score } => format!(
                "SIMILAR: 与 {} 使用过的事实相似度 {:.0}%：{}。请换一个事实。",
                display_date(record.saved_at),
                score * 100.0,
                record.raw
            ),
            FactVerdict::New => "NEW: 该事实未使用过，可以采用。".to_string(),
        };
        Ok(ToolResult::success(output))
    }
}

// ── SaveFactTool ─────────────────────────────────────────────────────────────

pub struct SaveFactTool {
    memory: FactMemory,
}

impl SaveFactTool {
    pub fn new(config: &MemoryConfig) -> Self {
        Self {
            memory: FactMemory::new(config),
        }
    }
}

#[async_trait::async_trait]
impl Tool for SaveFactTool {
    fn name(&self) -> &str {
        "save_fact"
    }

    fn description(&self) -> &str {
        "简报定稿后，记录已使用的趣味事实。完全相同的事实不会重复保存。"
    }

    fn parameters(&self) -> Value {
        fact_parameters()
    }

    async fn execute(&self, parameters: ToolParameters) -> Result<ToolResult> {
        let summary = required_str(&parameters, "fact_summary")?.to_string();

        let memory = self.memory.clone();
        run_blocking(move || {
            // 只跳过完全相同的；相似事实是否采用由调用方在 check 阶段决定
            if let FactVerdict::Exact(record) = memory.verdict(&summary)? {
                debug!(fact = %record.key, "⏭️ 事实已存在，跳过保存");
                return Ok(ToolResult::success(format!(
                    "DUPLICATE: 该事实已于 {} 记录过，未重复保存。",
                    display_date(record.saved_at)
                )));
            }

            match memory.save(&summary) {
                Ok(record) => Ok(ToolResult::success(format!("SAVED: 已记录事实：{}", record.raw))),
                Err(e) => candidate_failure(e),
            }
        })
        .await
    }
}

// ── ListUsedFactsTool ────────────────────────────────────────────────────────

pub struct ListUsedFactsTool {
    memory: FactMemory,
}

impl ListUsedFactsTool {
    pub fn new(config: &MemoryConfig) -> Self {
        Self {
            memory: FactMemory::new(config),
        }
    }
}

#[async_trait::async_trait]
impl Tool for ListUsedFactsTool {
    fn name(&self) -> &str {
        "list_used_facts"
    }

    fn description(&self) -> &str {
        "列出最近使用过的趣味事实（最新在前），挑选新事实前先看看。"
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
        Ok(ToolResult::success(format_recent("已使用的事实", &records)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(text: &str) -> ToolParameters {
        ToolParameters::from([("fact_summary".to_string(), json!(text))])
    }

    #[tokio::test]
    async fn test_paraphrase_reported_as_similar() {
        let dir = tempfile::tempdir().unwrap();
        let config = MemoryConfig::default().with_memory_dir(dir.path());

        let saved = SaveFactTool::new(&config)
            .execute(summary(
                "The first computer bug was a real moth found in the Harvard Mark II in 1947.",
            ))
            .await
            .unwrap();
        assert!(saved.output.starts_with("SAVED"), "{}", saved.output);

        let check = CheckFactTool::new(&config);
        let result = check
            .execute(summary(
                "In 1947, a moth was found inside the Harvard Mark II, the origin of the word 'bug'.",
            ))
            .await
            .unwrap();
        assert!(result.output.starts_with("SIMILAR"), "{}", result.output);

        let fresh = check
            .execute(summary("Ada Lovelace published the first algorithm for a machine in 1843."))
            .await
            .unwrap();
        assert!(fresh.output.starts_with("NEW"), "{}", fresh.output);
    }

    #[tokio::test]
    async fn test_empty_summary_is_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let config = MemoryConfig::default().with_memory_dir(dir.path());

        let result = CheckFactTool::new(&config).execute(summary("  ")).await.unwrap();
        assert!(result.success);
        assert!(result.output.starts_with("DUPLICATE"));

        let saved = SaveFactTool::new(&config).execute(summary("")).await.unwrap();
        assert!(!saved.success);
        assert!(!config.facts_path().exists());
    }

    #[tokio::test]
    async fn test_save_skips_exact_repeat() {
        let dir = tempfile::tempdir().unwrap();
        let config = MemoryConfig::default().with_memory_dir(dir.path());
        let save = SaveFactTool::new(&config);

        save.execute(summary("Linux was first released in 1991."))
            .await
            .unwrap();
        let again = save
            .execute(summary("  LINUX was first released in 1991. "))
            .await
            .unwrap();
        assert!(again.output.starts_with("DUPLICATE"), "{}", again.output);

        let list = ListUsedFactsTool::new(&config)
            .execute(ToolParameters::new())
            .await
            .unwrap();
        assert!(list.output.contains("最近 1 条"), "{}", list.output);
    }
}

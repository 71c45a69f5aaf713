//! 工具执行器
//!
//! 持有 ToolRegistry 与单次调用超时。未注册的工具名返回 AgentError::UnknownTool（本轮失败）；
//! 工具自身失败与超时都转为说明文字，本轮照常继续。每次调用输出一条结构化审计日志（JSON）。

use std::time::{Duration, Instant};

use tokio::time::timeout;

use crate::core::AgentError;
use crate::llm::ToolSpec;
use crate::tools::{Tool, ToolRegistry};

const PREVIEW_CHARS: usize = 200;

pub struct ToolExecutor {
    registry: ToolRegistry,
    timeout: Duration,
}

impl ToolExecutor {
    pub fn new(registry: ToolRegistry, timeout_secs: u64) -> Self {
        Self {
            registry,
            timeout: Duration::from_secs(timeout_secs.max(1)),
        }
    }

    /// 调用指定工具
    pub async fn invoke(&self, tool_name: &str, input: &str) -> Result<String, AgentError> {
        let tool = self
            .registry
            .get(tool_name)
            .ok_or_else(|| AgentError::UnknownTool(tool_name.to_string()))?;

        let start = Instant::now();
        let result = timeout(self.timeout, tool.invoke(input)).await;
        let (outcome, output) = match result {
            Ok(output) => ("ok", output),
            Err(_) => (
                "timeout",
                format!("工具 {tool_name} 执行超时（{} 秒）", self.timeout.as_secs()),
            ),
        };

        let audit = serde_json::json!({
            "event": "tool_audit",
            "tool": tool_name,
            "ok": outcome == "ok",
            "outcome": outcome,
            "duration_ms": start.elapsed().as_millis() as u64,
            "input_preview": preview(input),
        });
        tracing::info!(audit = %audit, "tool");

        Ok(output)
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.registry.tool_names()
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        self.registry.specs()
    }
}

fn preview(input: &str) -> String {
    if input.chars().count() > PREVIEW_CHARS {
        format!("{}...", input.chars().take(PREVIEW_CHARS).collect::<String>())
    } else {
        input.to_string()
    }
}

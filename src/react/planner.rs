//! Planner：系统提示词、消息组装与单次 THINK 调用
//!
//! 提示词顺序固定：system（人设与规则 + 长期记忆摘要）-> 短期对话 -> 本轮用户输入 -> 本轮 scratchpad。

use std::sync::Arc;

use crate::core::AgentError;
use crate::llm::{ChatRequest, LlmClient, LlmReply, ToolSpec};
use crate::memory::{MemoryContext, Message};

/// 基础系统指令
pub const SYSTEM_PROMPT: &str = "你是一个乐于助人的中文智能助手，回答简洁、准确。

规则：
1. 需要外部信息时调用工具，否则直接回答。
2. 涉及当前时间、日期、天气、气温、降水、风、空气质量、日程的问题，必须调用对应工具（get_current_time、get_weather、get_air_quality、get_calendar_events），不得凭记忆或猜测回答。
3. 用户没有说明地点时默认西安，没有说明时区时默认 Asia/Shanghai。
4. 长期记忆只用于了解用户偏好与历史话题，其中的时间、天气、空气质量等实时信息一律视为过期。
5. 只能通过工具调用接口调用工具。禁止在回答正文里输出任何形式的伪工具调用，例如 \"Action: None\"、\"functions.xxx\"、JSON 格式的工具调用或工具名。
6. 回答空气质量时，第一句必须是「当前<城市>的空气质量是<AQI>」，随后给出美标 AQI 等级（0-50 优，51-100 中等，101-150 对敏感人群不健康，151-200 不健康，201-300 非常不健康，301 以上 危险）和一句出行或健康建议；不要使用 Markdown。";

/// 组装 system 消息内容
pub fn build_system_prompt(base: &str, long_term_summary: &str) -> String {
    let summary = long_term_summary.trim();
    if summary.is_empty() {
        return base.to_string();
    }
    format!("{base}\n\n以下是可能相关的长期记忆（仅供参考，实时信息必须调用工具）：\n{summary}")
}

/// 组装一次 THINK 的完整消息序列
pub fn build_messages(
    base: &str,
    memory: &MemoryContext,
    user_input: &str,
    scratchpad: &[Message],
) -> Vec<Message> {
    let mut messages = Vec::with_capacity(memory.short_term.len() + scratchpad.len() + 2);
    messages.push(Message::system(build_system_prompt(base, &memory.long_term_summary)));
    messages.extend(memory.short_term.iter().cloned());
    messages.push(Message::user(user_input.to_string()));
    messages.extend(scratchpad.iter().cloned());
    messages
}

/// Planner：持有 LLM 与基础 system prompt
pub struct Planner {
    llm: Arc<dyn LlmClient>,
    system_prompt: String,
    temperature: f32,
}

impl Planner {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            system_prompt: SYSTEM_PROMPT.to_string(),
            temperature: 0.2,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn base_system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// 一次 THINK：提交消息与工具目录，返回结构化回复
    pub async fn think(
        &self,
        model: &str,
        messages: Vec<Message>,
        tools: Vec<ToolSpec>,
    ) -> Result<LlmReply, AgentError> {
        let request = ChatRequest {
            model: model.to_string(),
            messages,
            tools,
            temperature: self.temperature,
        };
        self.llm.complete(&request).await.map_err(AgentError::from)
    }
}

//! 短期记忆：逐字对话缓冲
//!
//! 按时间顺序保存 user/assistant 轮次（只追加），供 LLM 上下文使用；
//! 上下文窗口由 LLM 后端自行约束，这里不做淘汰。

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::llm::ToolInvocation;

/// 消息角色（与 OpenAI 兼容 API 一致）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
    /// 工具输出（回写到 scratchpad）
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
            Role::Tool => "tool",
        }
    }
}

/// 发给 LLM 的单条消息；assistant 消息可携带一次结构化工具调用，tool 消息携带对应的调用 id
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call: Option<ToolInvocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    fn plain(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_call: None,
            tool_call_id: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(Role::System, content)
    }

    /// assistant 发起的工具调用（content 为空）
    pub fn tool_request(call: ToolInvocation) -> Self {
        Self {
            role: Role::Assistant,
            content: String::new(),
            tool_call: Some(call),
            tool_call_id: None,
        }
    }

    /// 工具执行结果
    pub fn tool_result(call_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: output.into(),
            tool_call: None,
            tool_call_id: Some(call_id.into()),
        }
    }
}

/// 一轮对话中的一条记录
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Local>,
}

impl ConversationTurn {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: Local::now(),
        }
    }

    pub fn to_message(&self) -> Message {
        Message::plain(self.role, self.text.clone())
    }
}

/// 短期记忆：只追加的有序对话缓冲（最旧在前）
#[derive(Clone, Debug, Default)]
pub struct ConversationMemory {
    turns: Vec<ConversationTurn>,
}

impl ConversationMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一对 user/assistant
    pub fn push_exchange(&mut self, input: &str, output: &str) {
        self.turns.push(ConversationTurn::new(Role::User, input));
        self.turns.push(ConversationTurn::new(Role::Assistant, output));
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn to_messages(&self) -> Vec<Message> {
        self.turns.iter().map(ConversationTurn::to_message).collect()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

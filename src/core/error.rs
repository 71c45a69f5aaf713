//! Agent 错误类型与恢复动作
//!
//! 与 RecoveryEngine 配合：内容审查拒绝换备用模型重试一次，其余错误直接上报。
//! 伪工具调用、迭代超限、长期记忆不可用由循环与记忆层内部消化，这里没有对应变体。

use thiserror::Error;

use crate::llm::LlmError;

#[derive(Error, Debug)]
pub enum AgentError {
    /// 上游内容审查拒绝；fallback_tried 表示是否已在备用模型上重试过
    #[error("upstream content policy rejection: {message}")]
    UpstreamContentPolicy { message: String, fallback_tried: bool },

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("LLM error: {0}")]
    Llm(LlmError),

    #[error("config error: {0}")]
    Config(String),
}

impl From<LlmError> for AgentError {
    fn from(e: LlmError) -> Self {
        if e.is_content_policy() {
            let message = match e {
                LlmError::ContentPolicy(m) | LlmError::Api { message: m, .. } => m,
                other => other.to_string(),
            };
            return AgentError::UpstreamContentPolicy {
                message,
                fallback_tried: false,
            };
        }
        AgentError::Llm(e)
    }
}

impl AgentError {
    pub fn is_content_policy(&self) -> bool {
        matches!(self, AgentError::UpstreamContentPolicy { .. })
    }

    /// 面向用户的结构化说明（含可操作的修复建议）
    pub fn user_message(&self) -> String {
        match self {
            AgentError::UpstreamContentPolicy {
                fallback_tried: true,
                ..
            } => "抱歉，当前模型和备用模型都因内容审查拒绝了这个请求。请换一种说法，或更换备用模型（环境变量 LLM_FALLBACK_MODEL / WREN__LLM__FALLBACK_MODEL）后重试。".to_string(),
            AgentError::UpstreamContentPolicy { .. } => "抱歉，上游模型因内容审查拒绝了这个请求。可设置备用模型（环境变量 LLM_FALLBACK_MODEL 或 WREN__LLM__FALLBACK_MODEL）后自动重试，或换一种说法。".to_string(),
            AgentError::UnknownTool(name) => {
                format!("模型请求了未注册的工具「{name}」，本轮已终止，请重新提问。")
            }
            AgentError::Llm(LlmError::Auth(_)) => {
                "模型服务鉴权失败，请检查环境变量 OPENAI_API_KEY（或 WREN__LLM__API_KEY）。".to_string()
            }
            AgentError::Llm(LlmError::Network(e)) => {
                format!("无法连接模型服务（{e}），请检查网络或 OPENAI_BASE_URL 配置后重试。")
            }
            AgentError::Llm(e) => format!("模型服务出错：{e}"),
            AgentError::Config(e) => format!("配置错误：{e}"),
        }
    }
}

/// 恢复引擎根据错误类型给出的动作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryAction {
    /// 以新的会话绑定该模型重跑本轮
    SwitchModel(String),
    /// 直接上报
    Surface,
}

//! LLM 客户端抽象
//!
//! 后端只通过结构化通道返回工具调用：LlmReply 要么是最终文本，要么是一次具名工具调用。
//! 文本里长得像工具调用的内容一律视为最终文本，由伪调用检测处理，绝不当作指令执行。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::memory::Message;

/// 上游内容审核拒绝的已知特征（小写匹配）
const CONTENT_POLICY_SIGNATURES: &[&str] = &[
    "content_filter",
    "content_policy_violation",
    "content management policy",
    "responsibleaipolicyviolation",
    "data_inspection_failed",
    "inappropriate content",
    "sensitive content",
    "safety system",
    "output data may contain inappropriate content",
];

/// 文本是否匹配内容审核拒绝特征
pub fn is_content_policy_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    CONTENT_POLICY_SIGNATURES.iter().any(|sig| lower.contains(sig))
}

#[derive(Error, Debug, Clone)]
pub enum LlmError {
    #[error("network error: {0}")]
    Network(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("upstream content policy rejection: {0}")]
    ContentPolicy(String),

    #[error("API error ({}): {message}", .code.as_deref().unwrap_or("unknown"))]
    Api {
        code: Option<String>,
        message: String,
    },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl LlmError {
    /// 由上游错误对象（type / code / message）构造错误，任一字段命中审核特征即为 ContentPolicy
    pub fn from_api_error(kind: Option<&str>, code: Option<&str>, message: &str) -> Self {
        let kind = kind.unwrap_or_default();
        let code_str = code.unwrap_or_default();
        if [kind, code_str, message].iter().any(|f| is_content_policy_message(f)) {
            let detail = if message.trim().is_empty() { code_str } else { message };
            return LlmError::ContentPolicy(detail.to_string());
        }
        if [kind, code_str]
            .iter()
            .any(|f| f.contains("api_key") || f.contains("authentication"))
        {
            return LlmError::Auth(message.to_string());
        }
        LlmError::Api {
            code: code.map(str::to_string),
            message: message.to_string(),
        }
    }

    pub fn is_content_policy(&self) -> bool {
        match self {
            LlmError::ContentPolicy(_) => true,
            LlmError::Api { message, .. } => is_content_policy_message(message),
            _ => false,
        }
    }
}

/// 提供给 LLM 的工具目录条目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// 参数 JSON Schema
    pub parameters: serde_json::Value,
}

/// 一次结构化工具调用：工具名 + 参数字符串
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub id: String,
    pub name: String,
    pub input: String,
}

/// 后端回复：只可能是两者之一
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmReply {
    Final(String),
    ToolCall(ToolInvocation),
}

/// 单次补全请求
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub tools: Vec<ToolSpec>,
    pub temperature: f32,
}

/// LLM 客户端 trait：模型名随请求传入，同一客户端可服务主模型与备用模型
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<LlmReply, LlmError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_policy_signatures() {
        assert!(is_content_policy_message(
            r#"{"error":{"code":"content_filter","message":"The response was filtered"}}"#
        ));
        assert!(is_content_policy_message("Output data may contain inappropriate content."));
        assert!(is_content_policy_message("ResponsibleAIPolicyViolation"));
        assert!(!is_content_policy_message("rate limit exceeded"));
    }

    #[test]
    fn test_from_api_error_classification() {
        let err = LlmError::from_api_error(
            Some("invalid_request_error"),
            Some("content_policy_violation"),
            "Your request was rejected",
        );
        assert!(err.is_content_policy());
        let err = LlmError::from_api_error(None, Some("data_inspection_failed"), "");
        assert!(matches!(err, LlmError::ContentPolicy(ref m) if m == "data_inspection_failed"));
        assert!(matches!(
            LlmError::from_api_error(Some("invalid_request_error"), Some("invalid_api_key"), "bad key"),
            LlmError::Auth(_)
        ));
        let err = LlmError::from_api_error(Some("server_error"), None, "internal");
        assert!(matches!(err, LlmError::Api { code: None, .. }));
        assert!(!err.is_content_policy());
        assert!(!LlmError::Network("timeout".into()).is_content_policy());
    }
}

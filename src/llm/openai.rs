//! OpenAI 兼容 API 客户端（带 function calling）
//!
//! 通过 async_openai 调用任意 OpenAI 兼容端点（可配置 base_url）。工具以 function 形式下发，
//! 回复只看结构化 tool_calls 字段：有则为工具调用（取第一个），否则为最终文本。
//! finish_reason == content_filter 或错误对象命中审核特征时返回 LlmError::ContentPolicy。

use std::time::Duration;

use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::chat::{
    ChatChoice, ChatCompletionMessageToolCall, ChatCompletionMessageToolCalls,
    ChatCompletionRequestAssistantMessage, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestToolMessage, ChatCompletionRequestUserMessage, ChatCompletionTool,
    ChatCompletionToolChoiceOption, ChatCompletionTools, CreateChatCompletionRequestArgs,
    FinishReason, FunctionCall, FunctionObject, ToolChoiceOptions,
};
use async_openai::Client;
use async_trait::async_trait;

use crate::llm::{
    is_content_policy_message, ChatRequest, LlmClient, LlmError, LlmReply, ToolInvocation, ToolSpec,
};
use crate::memory::{Message, Role};

pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
}

impl OpenAiClient {
    pub fn new(base_url: Option<&str>, api_key: &str, timeout_secs: u64) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();
        let config = match base_url {
            Some(url) => OpenAIConfig::new()
                .with_api_base(url.trim_end_matches('/'))
                .with_api_key(api_key),
            None => OpenAIConfig::new().with_api_key(api_key),
        };
        Self {
            client: Client::with_config(config).with_http_client(http),
        }
    }

    fn to_request_messages(
        messages: &[Message],
    ) -> Result<Vec<ChatCompletionRequestMessage>, LlmError> {
        messages
            .iter()
            .map(|m| {
                let msg: ChatCompletionRequestMessage = match m.role {
                    Role::System => ChatCompletionRequestSystemMessage::from(m.content.as_str()).into(),
                    Role::User => ChatCompletionRequestUserMessage::from(m.content.as_str()).into(),
                    Role::Assistant => match &m.tool_call {
                        Some(tc) => ChatCompletionRequestAssistantMessageArgs::default()
                            .tool_calls(vec![ChatCompletionMessageToolCalls::Function(
                                ChatCompletionMessageToolCall {
                                    id: tc.id.clone(),
                                    function: FunctionCall {
                                        name: tc.name.clone(),
                                        arguments: encode_tool_arguments(&tc.input),
                                    },
                                },
                            )])
                            .build()
                            .map_err(map_openai_error)?
                            .into(),
                        None => ChatCompletionRequestAssistantMessage::from(m.content.as_str()).into(),
                    },
                    Role::Tool => ChatCompletionRequestToolMessage {
                        content: m.content.clone().into(),
                        tool_call_id: m.tool_call_id.clone().unwrap_or_default(),
                    }
                    .into(),
                };
                Ok(msg)
            })
            .collect()
    }

    fn to_request_tools(tools: &[ToolSpec]) -> Vec<ChatCompletionTools> {
        tools
            .iter()
            .map(|t| {
                ChatCompletionTools::Function(ChatCompletionTool {
                    function: FunctionObject {
                        name: t.name.clone(),
                        description: Some(t.description.clone()),
                        parameters: Some(t.parameters.clone()),
                        strict: None,
                    },
                })
            })
            .collect()
    }
}

/// 工具调用回写到 scratchpad 时的 arguments：已是 JSON 对象的原样保留，其余包成 {"input": ...}
pub(crate) fn encode_tool_arguments(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.starts_with('{') {
        if let Ok(serde_json::Value::Object(_)) = serde_json::from_str::<serde_json::Value>(trimmed) {
            return trimmed.to_string();
        }
    }
    serde_json::json!({ "input": input }).to_string()
}

/// 从 function.arguments 中还原参数字符串：对象取 input 字段，空对象为空串，其余原样返回
pub(crate) fn decode_tool_input(arguments: &str) -> String {
    let trimmed = arguments.trim();
    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(serde_json::Value::Object(map)) => {
            if let Some(v) = map.get("input") {
                return match v {
                    serde_json::Value::String(s) => s.clone(),
                    serde_json::Value::Null => String::new(),
                    other => other.to_string(),
                };
            }
            if map.is_empty() {
                return String::new();
            }
            trimmed.to_string()
        }
        Ok(serde_json::Value::String(s)) => s,
        _ => trimmed.to_string(),
    }
}

/// async_openai 错误归类：错误对象按 type/code/message 识别审核拒绝，
/// 无法解析为错误对象的响应体也检查一遍审核特征
fn map_openai_error(e: OpenAIError) -> LlmError {
    match e {
        OpenAIError::Reqwest(e) => LlmError::Network(e.to_string()),
        OpenAIError::ApiError(api) => {
            LlmError::from_api_error(api.r#type.as_deref(), api.code.as_deref(), &api.message)
        }
        OpenAIError::JSONDeserialize(err, body) => {
            if is_content_policy_message(&body) {
                LlmError::ContentPolicy(body)
            } else {
                LlmError::InvalidResponse(format!("{err}: {body}"))
            }
        }
        other => LlmError::InvalidResponse(other.to_string()),
    }
}

/// 将 choice 分类为最终文本或工具调用
fn classify_choice(choice: ChatChoice) -> Result<LlmReply, LlmError> {
    if choice.finish_reason == Some(FinishReason::ContentFilter) {
        return Err(LlmError::ContentPolicy(
            "response blocked by upstream content filter".to_string(),
        ));
    }
    let message = choice.message;
    let call = message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .find_map(|tc| match tc {
            ChatCompletionMessageToolCalls::Function(f) => Some(f),
            _ => None,
        });
    if let Some(tc) = call {
        return Ok(LlmReply::ToolCall(ToolInvocation {
            id: tc.id,
            input: decode_tool_input(&tc.function.arguments),
            name: tc.function.name,
        }));
    }
    Ok(LlmReply::Final(message.content.unwrap_or_default()))
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, request: &ChatRequest) -> Result<LlmReply, LlmError> {
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(request.model.as_str())
            .messages(Self::to_request_messages(&request.messages)?)
            .temperature(request.temperature);
        if !request.tools.is_empty() {
            args.tools(Self::to_request_tools(&request.tools))
                .tool_choice(ChatCompletionToolChoiceOption::Mode(ToolChoiceOptions::Auto));
        }
        let body = args.build().map_err(map_openai_error)?;

        tracing::debug!(model = %request.model, messages = request.messages.len(), "chat completion request");

        let response = self.client.chat().create(body).await.map_err(|e| {
            let err = map_openai_error(e);
            tracing::warn!(error = %err, "LLM backend returned error");
            err
        })?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("no choices in response".into()))?;
        classify_choice(choice)
    }
}

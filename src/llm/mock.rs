//! Mock LLM 客户端（用于测试，无需 API）
//!
//! 按脚本顺序返回预设回复；脚本耗尽后返回 repeating 设置的回复（未设置则为空的最终文本）。
//! 记录每次请求，便于断言使用的模型、消息与工具目录。

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::{ChatRequest, LlmClient, LlmError, LlmReply, ToolInvocation};

static CALL_SEQ: AtomicUsize = AtomicUsize::new(0);

/// 构造一次结构化工具调用回复（id 自增）
pub fn tool_call(name: &str, input: &str) -> LlmReply {
    let n = CALL_SEQ.fetch_add(1, Ordering::Relaxed);
    LlmReply::ToolCall(ToolInvocation {
        id: format!("call_mock_{n}"),
        name: name.to_string(),
        input: input.to_string(),
    })
}

/// 构造最终文本回复
pub fn final_text(text: &str) -> LlmReply {
    LlmReply::Final(text.to_string())
}

#[derive(Default)]
pub struct MockLlmClient {
    script: Mutex<VecDeque<Result<LlmReply, LlmError>>>,
    repeating: Option<Result<LlmReply, LlmError>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按顺序返回给定回复
    pub fn with_replies(replies: impl IntoIterator<Item = Result<LlmReply, LlmError>>) -> Self {
        Self {
            script: Mutex::new(replies.into_iter().collect()),
            ..Self::default()
        }
    }

    /// 脚本耗尽后每次都返回该回复
    pub fn repeating(mut self, reply: Result<LlmReply, LlmError>) -> Self {
        self.repeating = Some(reply);
        self
    }

    pub fn push(&self, reply: Result<LlmReply, LlmError>) {
        if let Ok(mut s) = self.script.lock() {
            s.push_back(reply);
        }
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn models_used(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.model).collect()
    }

    fn next_reply(&self) -> Result<LlmReply, LlmError> {
        let scripted = self.script.lock().ok().and_then(|mut s| s.pop_front());
        match scripted {
            Some(reply) => reply,
            None => match &self.repeating {
                // 重复的工具调用每次换一个 id
                Some(Ok(LlmReply::ToolCall(tc))) => Ok(tool_call(&tc.name, &tc.input)),
                Some(reply) => reply.clone(),
                None => Ok(LlmReply::Final(String::new())),
            },
        }
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, request: &ChatRequest) -> Result<LlmReply, LlmError> {
        if let Ok(mut r) = self.requests.lock() {
            r.push(request.clone());
        }
        self.next_reply()
    }
}

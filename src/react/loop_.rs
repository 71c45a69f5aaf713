//! 工具调用执行循环
//!
//! START -> THINK -> (TOOL_CALL -> THINK)* -> ANSWER | ABORTED。
//! 每次 THINK 最多跟一次 TOOL_CALL，单次尝试最多 MAX_ITERATIONS 轮；
//! 最终回答若是伪工具调用，丢弃并以全新会话（无短期历史、无 scratchpad）重跑一次，仅一次。

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;

use crate::core::{AgentError, AgentSession};
use crate::llm::LlmReply;
use crate::memory::Message;
use crate::react::{build_messages, detect_pseudo_call, Planner, ReactEvent};
use crate::tools::ToolExecutor;

/// 单次尝试内 THINK/TOOL_CALL 往返上限
pub const MAX_ITERATIONS: usize = 15;
/// Observation 预览最大字符数
const OBSERVATION_PREVIEW_CHARS: usize = 200;

/// 超出迭代上限时返回给用户的文本
pub const ABORTED_RESPONSE: &str = "抱歉，我尝试了多次工具调用仍未得到结论，暂时无法完成这个请求。请换个问法或稍后再试。";

/// 一轮对话的结果
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub response: String,
    /// 最后一次尝试的往返次数
    pub iterations: usize,
    /// 是否因伪工具调用重试过
    pub retried: bool,
    /// 是否因超出迭代上限终止
    pub aborted: bool,
}

struct Attempt {
    response: String,
    iterations: usize,
    aborted: bool,
}

fn send_event(tx: &Option<UnboundedSender<ReactEvent>>, ev: ReactEvent) {
    if let Some(t) = tx {
        let _ = t.send(ev);
    }
}

fn preview(text: &str) -> String {
    if text.chars().count() > OBSERVATION_PREVIEW_CHARS {
        format!("{}...", text.chars().take(OBSERVATION_PREVIEW_CHARS).collect::<String>())
    } else {
        text.to_string()
    }
}

/// 执行循环：Planner + 工具执行器，可选事件通道
pub struct ReactLoop {
    planner: Planner,
    executor: Arc<ToolExecutor>,
    event_tx: Option<UnboundedSender<ReactEvent>>,
}

impl ReactLoop {
    pub fn new(planner: Planner, executor: Arc<ToolExecutor>) -> Self {
        Self {
            planner,
            executor,
            event_tx: None,
        }
    }

    pub fn with_event_tx(mut self, tx: UnboundedSender<ReactEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    /// 处理一轮用户输入；正常回答写入会话记忆，中止文本与重试后仍为伪调用的回答不写入
    pub async fn run_turn(
        &self,
        session: &mut AgentSession,
        user_input: &str,
    ) -> Result<TurnOutcome, AgentError> {
        let first = self.attempt(session, user_input).await?;
        let mut outcome = TurnOutcome {
            response: first.response,
            iterations: first.iterations,
            retried: false,
            aborted: first.aborted,
        };

        let tool_names = self.executor.tool_names();
        if !outcome.aborted {
            if let Some(reason) = detect_pseudo_call(&outcome.response, &tool_names) {
                tracing::warn!(%reason, model = %session.model, "pseudo tool call, retrying in fresh session");
                send_event(&self.event_tx, ReactEvent::PseudoCallRetry { reason });
                let fresh = session.fresh();
                let second = self.attempt(&fresh, user_input).await?;
                outcome = TurnOutcome {
                    response: second.response,
                    iterations: second.iterations,
                    retried: true,
                    aborted: second.aborted,
                };
            }
        }

        session.iteration_count = outcome.iterations;
        if outcome.aborted {
            send_event(&self.event_tx, ReactEvent::Aborted {
                iterations: outcome.iterations,
            });
            return Ok(outcome);
        }

        // 重试后仍是伪调用：原样返回，但不进入任何记忆，避免污染后续轮次
        let persistent_pseudo =
            outcome.retried && detect_pseudo_call(&outcome.response, &tool_names).is_some();
        if persistent_pseudo {
            tracing::warn!(model = %session.model, "pseudo tool call persisted after retry, turn not saved");
        } else {
            session.memory.save_turn(user_input, &outcome.response).await;
        }
        send_event(&self.event_tx, ReactEvent::Answer {
            text: outcome.response.clone(),
        });
        Ok(outcome)
    }

    /// 单次尝试：从 START 跑到 ANSWER 或 ABORTED
    async fn attempt(&self, session: &AgentSession, user_input: &str) -> Result<Attempt, AgentError> {
        let memory = session.memory.load_context(user_input).await;
        let tools = self.executor.specs();
        let mut scratchpad: Vec<Message> = Vec::new();

        for iteration in 1..=MAX_ITERATIONS {
            send_event(&self.event_tx, ReactEvent::Thinking {
                iteration,
                max_iterations: MAX_ITERATIONS,
            });
            let messages = build_messages(
                self.planner.base_system_prompt(),
                &memory,
                user_input,
                &scratchpad,
            );
            let reply = self
                .planner
                .think(&session.model, messages, tools.clone())
                .await?;

            match reply {
                LlmReply::Final(text) => {
                    tracing::debug!(iteration, "final answer");
                    return Ok(Attempt {
                        response: text,
                        iterations: iteration,
                        aborted: false,
                    });
                }
                LlmReply::ToolCall(call) => {
                    send_event(&self.event_tx, ReactEvent::ToolCall {
                        tool: call.name.clone(),
                        input: call.input.clone(),
                    });
                    let observation = self.executor.invoke(&call.name, &call.input).await?;
                    send_event(&self.event_tx, ReactEvent::Observation {
                        tool: call.name.clone(),
                        preview: preview(&observation),
                    });
                    let call_id = call.id.clone();
                    scratchpad.push(Message::tool_request(call));
                    scratchpad.push(Message::tool_result(call_id, observation));
                }
            }
        }

        tracing::warn!(max = MAX_ITERATIONS, model = %session.model, "iteration bound exceeded");
        Ok(Attempt {
            response: ABORTED_RESPONSE.to_string(),
            iterations: MAX_ITERATIONS,
            aborted: true,
        })
    }
}

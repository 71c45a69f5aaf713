//! 失败恢复控制器
//!
//! 包裹一次完整的执行循环：内容审查拒绝且配置了备用模型时，以绑定备用模型的新会话重跑一次；
//! 其余错误原样上报。控制器不原地修改会话，新会话随结果交还调用方。

use crate::core::{AgentError, AgentSession, RecoveryAction};
use crate::react::{ReactLoop, TurnOutcome};

#[derive(Debug, Default, Clone)]
pub struct RecoveryEngine {
    fallback_model: Option<String>,
}

impl RecoveryEngine {
    pub fn new(fallback_model: Option<String>) -> Self {
        Self {
            fallback_model: fallback_model
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty()),
        }
    }

    pub fn fallback_model(&self) -> Option<&str> {
        self.fallback_model.as_deref()
    }

    /// 根据错误与当前模型给出恢复动作
    pub fn handle(&self, err: &AgentError, current_model: &str) -> RecoveryAction {
        match (err, &self.fallback_model) {
            (AgentError::UpstreamContentPolicy { .. }, Some(fallback)) if fallback != current_model => {
                RecoveryAction::SwitchModel(fallback.clone())
            }
            _ => RecoveryAction::Surface,
        }
    }
}

fn mark_fallback_tried(err: AgentError) -> AgentError {
    match err {
        AgentError::UpstreamContentPolicy { message, .. } => AgentError::UpstreamContentPolicy {
            message,
            fallback_tried: true,
        },
        other => other,
    }
}

/// 执行一轮并按需切换备用模型（最多一次）；返回调用方应继续使用的会话
pub async fn run_turn_with_recovery(
    react: &ReactLoop,
    recovery: &RecoveryEngine,
    mut session: AgentSession,
    user_input: &str,
) -> (AgentSession, Result<TurnOutcome, AgentError>) {
    let err = match react.run_turn(&mut session, user_input).await {
        Ok(outcome) => return (session, Ok(outcome)),
        Err(e) => e,
    };

    match recovery.handle(&err, &session.model) {
        RecoveryAction::SwitchModel(model) => {
            tracing::warn!(from = %session.model, to = %model, error = %err, "content policy rejection, switching to fallback model");
            let mut next = session.with_model(model);
            match react.run_turn(&mut next, user_input).await {
                Ok(outcome) => (next, Ok(outcome)),
                Err(e) => {
                    tracing::warn!(model = %next.model, error = %e, "fallback model failed");
                    (session, Err(mark_fallback_tried(e)))
                }
            }
        }
        RecoveryAction::Surface => {
            let already_on_fallback = recovery.fallback_model() == Some(session.model.as_str());
            let err = if already_on_fallback { mark_fallback_tried(err) } else { err };
            tracing::warn!(model = %session.model, error = %err, "turn failed");
            (session, Err(err))
        }
    }
}

//! 会话句柄
//!
//! AgentSession 是值：换模型时构造新会话（记忆句柄不变），由调用方重新赋值，控制器不做原地修改。

use std::sync::Arc;

use crate::memory::MemoryHandle;

#[derive(Clone)]
pub struct AgentSession {
    pub model: String,
    pub memory: MemoryHandle,
    /// 最近一轮执行的 THINK/TOOL_CALL 往返次数
    pub iteration_count: usize,
}

impl AgentSession {
    pub fn new(model: impl Into<String>, memory: MemoryHandle) -> Self {
        Self {
            model: model.into(),
            memory,
            iteration_count: 0,
        }
    }

    /// 绑定到另一个模型的新会话，记忆状态保留
    pub fn with_model(&self, model: impl Into<String>) -> Self {
        Self::new(model, Arc::clone(&self.memory))
    }

    /// 同模型的全新会话：短期记忆为空，只共享长期存储
    pub fn fresh(&self) -> Self {
        Self::new(self.model.clone(), self.memory.detached().into_handle())
    }
}

impl std::fmt::Debug for AgentSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentSession")
            .field("model", &self.model)
            .field("short_term_len", &self.memory.short_term_turns().len())
            .field("iteration_count", &self.iteration_count)
            .finish()
    }
}

//! 双记忆协调：短期逐字缓冲 + 长期语义存储
//!
//! load_context / save_turn 是 Agent 循环读写记忆的唯一入口。实时查询（见 realtime）
//! 既不读也不写长期记忆；长期存储不可用时退化为仅短期上下文，绝不让本轮失败。

use std::sync::{Arc, RwLock};

use crate::memory::long_term::{LongTermStore, MemoryRecord};
use crate::memory::realtime::realtime_pattern;
use crate::memory::{ConversationMemory, ConversationTurn, Message};

/// 截断标记
pub const TRUNCATION_MARKER: &str = "\n...(truncated)";

/// 按字符（非字节）截断，超出时追加截断标记；max_chars 为 0 时返回空串
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if max_chars == 0 {
        return String::new();
    }
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((idx, _)) => format!("{}{}", &text[..idx], TRUNCATION_MARKER),
    }
}

/// 记忆参数
#[derive(Debug, Clone)]
pub struct MemorySettings {
    /// 每次召回的长期记忆条数
    pub top_k: usize,
    /// 注入 prompt 的长期记忆字符上限
    pub load_max_chars: usize,
    /// 单条长期记忆写入的字符上限
    pub save_max_chars: usize,
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            top_k: 5,
            load_max_chars: 6000,
            save_max_chars: 4000,
        }
    }
}

/// 一轮对话开始时的记忆上下文
#[derive(Debug, Clone, Default)]
pub struct MemoryContext {
    /// 完整短期对话（最旧在前）
    pub short_term: Vec<Message>,
    /// 长期记忆摘要，实时查询或无召回时为空
    pub long_term_summary: String,
}

pub struct MemoryManager {
    short_term: RwLock<ConversationMemory>,
    long_term: Option<Arc<dyn LongTermStore>>,
    settings: MemorySettings,
}

/// 会话间共享的记忆句柄（切换模型时记忆状态保持不变）
pub type MemoryHandle = Arc<MemoryManager>;

impl MemoryManager {
    pub fn new(long_term: Option<Arc<dyn LongTermStore>>, settings: MemorySettings) -> Self {
        Self {
            short_term: RwLock::new(ConversationMemory::new()),
            long_term,
            settings,
        }
    }

    /// 仅短期记忆
    pub fn short_term_only() -> Self {
        Self::new(None, MemorySettings::default())
    }

    /// 空白短期记忆的新管理器，共享同一长期存储
    pub fn detached(&self) -> Self {
        Self::new(self.long_term.clone(), self.settings.clone())
    }

    pub fn into_handle(self) -> MemoryHandle {
        Arc::new(self)
    }

    pub fn short_term_messages(&self) -> Vec<Message> {
        self.short_term
            .read()
            .map(|m| m.to_messages())
            .unwrap_or_default()
    }

    pub fn short_term_turns(&self) -> Vec<ConversationTurn> {
        self.short_term
            .read()
            .map(|m| m.turns().to_vec())
            .unwrap_or_default()
    }

    /// 组装本轮记忆上下文
    pub async fn load_context(&self, input: &str) -> MemoryContext {
        let short_term = self.short_term_messages();
        let input = input.trim();

        if let Some(pattern) = realtime_pattern(input) {
            tracing::debug!(pattern, "realtime query, long-term memory skipped");
            return MemoryContext {
                short_term,
                long_term_summary: String::new(),
            };
        }

        let Some(store) = &self.long_term else {
            return MemoryContext {
                short_term,
                long_term_summary: String::new(),
            };
        };

        let long_term_summary = match store.query(input, self.settings.top_k).await {
            Ok(hits) => truncate_chars(&hits.join("\n"), self.settings.load_max_chars),
            Err(e) => {
                tracing::warn!(error = %e, "long-term memory unavailable, using short-term only");
                String::new()
            }
        };

        MemoryContext {
            short_term,
            long_term_summary,
        }
    }

    /// 记录一轮问答：短期总是追加，长期仅对非实时查询写入一条
    pub async fn save_turn(&self, input: &str, output: &str) {
        if let Ok(mut m) = self.short_term.write() {
            m.push_exchange(input, output);
        }

        let input = input.trim();
        let output = output.trim();
        if let Some(pattern) = realtime_pattern(input) {
            tracing::debug!(pattern, "realtime query, long-term write skipped");
            return;
        }
        let Some(store) = &self.long_term else {
            return;
        };

        let raw = format!("input: {input}\noutput: {output}");
        let content = truncate_chars(raw.trim(), self.settings.save_max_chars);
        if content.is_empty() {
            return;
        }
        if let Err(e) = store.insert(MemoryRecord::new(content)).await {
            tracing::warn!(error = %e, "long-term memory write failed");
        }
    }
}

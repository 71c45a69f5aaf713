//! 记忆层：短期（逐字对话）、长期（语义检索）、实时查询分类与双记忆协调

pub mod conversation;
pub mod long_term;
pub mod manager;
pub mod realtime;
pub mod sqlite;
pub mod tokenizer;

pub use conversation::{ConversationMemory, ConversationTurn, Message, Role};
pub use long_term::{
    InMemoryLongTerm, LongTermStore, MemoryError, MemoryRecord, RecordMetadata, LONG_MEMORY_SOURCE,
};
pub use manager::{
    truncate_chars, MemoryContext, MemoryHandle, MemoryManager, MemorySettings, TRUNCATION_MARKER,
};
pub use realtime::{classify_realtime, realtime_pattern, REALTIME_PATTERNS};
pub use sqlite::SqliteLongTerm;

//! 长期记忆：语义相似度存储，跨会话检索过往问答
//!
//! LongTermStore 只有 query / insert 两个操作；MemoryRecord 写入后不可修改，
//! 删除属于外部存储管理。InMemoryLongTerm 用词重叠打分，适合测试与未配置存储路径时使用。

use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::memory::tokenizer::{lexical_similarity, tokenize_to_set};

/// 长期记忆写入的 metadata.source
pub const LONG_MEMORY_SOURCE: &str = "long_memory";

#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("long-term store unavailable: {0}")]
    Unavailable(String),

    #[error("invalid memory record: {0}")]
    InvalidRecord(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub source: String,
    pub timestamp: DateTime<Local>,
}

/// 一条长期记忆
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub content: String,
    pub metadata: RecordMetadata,
}

impl MemoryRecord {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: RecordMetadata {
                source: LONG_MEMORY_SOURCE.to_string(),
                timestamp: Local::now(),
            },
        }
    }

    /// 存储侧校验：内容与 source 不能为空
    pub fn validate(&self) -> Result<(), MemoryError> {
        if self.content.trim().is_empty() {
            return Err(MemoryError::InvalidRecord("empty content".to_string()));
        }
        if self.metadata.source.trim().is_empty() {
            return Err(MemoryError::InvalidRecord("empty metadata.source".to_string()));
        }
        Ok(())
    }
}

/// 长期记忆存储：按相似度返回前 k 条内容（最相关在前）
#[async_trait]
pub trait LongTermStore: Send + Sync {
    async fn query(&self, text: &str, k: usize) -> Result<Vec<String>, MemoryError>;

    async fn insert(&self, record: MemoryRecord) -> Result<(), MemoryError>;
}

/// 内存实现：词重叠相似度，同分按写入顺序
#[derive(Default)]
pub struct InMemoryLongTerm {
    records: RwLock<Vec<MemoryRecord>>,
}

impl InMemoryLongTerm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn records(&self) -> Vec<MemoryRecord> {
        self.records.read().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LongTermStore for InMemoryLongTerm {
    async fn query(&self, text: &str, k: usize) -> Result<Vec<String>, MemoryError> {
        let query_tokens = tokenize_to_set(text);
        let records = self
            .records
            .read()
            .map_err(|e| MemoryError::Unavailable(e.to_string()))?;
        let mut scored: Vec<(f32, &MemoryRecord)> = records
            .iter()
            .map(|r| (lexical_similarity(&query_tokens, &tokenize_to_set(&r.content)), r))
            .filter(|(s, _)| *s > 0.0)
            .collect();
        // sort_by 是稳定排序，同分保持写入顺序
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        Ok(scored
            .into_iter()
            .take(k)
            .map(|(_, r)| r.content.clone())
            .collect())
    }

    async fn insert(&self, record: MemoryRecord) -> Result<(), MemoryError> {
        record.validate()?;
        self.records
            .write()
            .map_err(|e| MemoryError::Unavailable(e.to_string()))?
            .push(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_query_ranks_by_overlap() {
        let store = InMemoryLongTerm::new();
        store
            .insert(MemoryRecord::new("input: rust borrow checker\noutput: it checks borrows"))
            .await
            .unwrap();
        store
            .insert(MemoryRecord::new("input: favourite colour\noutput: blue"))
            .await
            .unwrap();
        let hits = store.query("how does the rust borrow checker work", 5).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].contains("borrow checker"));
    }

    #[tokio::test]
    async fn test_in_memory_respects_k() {
        let store = InMemoryLongTerm::new();
        for i in 0..8 {
            store
                .insert(MemoryRecord::new(format!("input: cats {i}\noutput: meow")))
                .await
                .unwrap();
        }
        let hits = store.query("cats", 5).await.unwrap();
        assert_eq!(hits.len(), 5);
        assert!(hits[0].contains("cats 0"));
    }

    #[tokio::test]
    async fn test_insert_rejects_empty_source() {
        let store = InMemoryLongTerm::new();
        let mut record = MemoryRecord::new("input: a\noutput: b");
        record.metadata.source = String::new();
        let err = store.insert(record).await.unwrap_err();
        assert!(matches!(err, MemoryError::InvalidRecord(_)));
        assert!(store.is_empty());
    }
}

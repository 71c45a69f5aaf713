//! SQLite 长期记忆：单文件持久化，跨进程保留过往问答
//!
//! 有嵌入模型时按余弦相似度检索（写入时同时保存向量），否则退化为词重叠打分。
//! rusqlite 为同步 API，所有读写在 spawn_blocking 中执行。

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Local};
use rusqlite::{params, Connection};

use crate::llm::embedding::cosine_similarity;
use crate::llm::EmbeddingProvider;
use crate::memory::long_term::{LongTermStore, MemoryError, MemoryRecord};
use crate::memory::tokenizer::{lexical_similarity, tokenize_to_set};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS long_memory (
    id TEXT PRIMARY KEY,
    seq INTEGER NOT NULL,
    content TEXT NOT NULL,
    source TEXT NOT NULL,
    created_at TEXT NOT NULL,
    embedding BLOB
)";

pub struct SqliteLongTerm {
    conn: Arc<Mutex<Connection>>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
}

struct StoredRow {
    content: String,
    embedding: Option<Vec<f32>>,
}

fn unavailable(e: impl std::fmt::Display) -> MemoryError {
    MemoryError::Unavailable(e.to_string())
}

fn encode_vector(v: &[f32]) -> Vec<u8> {
    v.iter().flat_map(|x| x.to_le_bytes()).collect()
}

fn decode_vector(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

impl SqliteLongTerm {
    /// 打开（或创建）存储文件；父目录不存在时自动创建
    pub fn open(
        path: impl AsRef<Path>,
        embedder: Option<Arc<dyn EmbeddingProvider>>,
    ) -> Result<Self, MemoryError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(unavailable)?;
            }
        }
        let conn = Connection::open(path).map_err(unavailable)?;
        conn.execute(SCHEMA, []).map_err(unavailable)?;
        tracing::debug!(path = %path.display(), "long-term store opened");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            embedder,
        })
    }

    async fn embed(&self, text: &str) -> Option<Vec<f32>> {
        let embedder = self.embedder.as_ref()?;
        match embedder.embed(text).await {
            Ok(v) if !v.is_empty() => Some(v),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, "embedding failed, using lexical similarity");
                None
            }
        }
    }

    pub async fn count(&self) -> Result<usize, MemoryError> {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(unavailable)?;
            let n: i64 = conn
                .query_row("SELECT COUNT(*) FROM long_memory", [], |row| row.get(0))
                .map_err(unavailable)?;
            Ok::<usize, MemoryError>(n as usize)
        })
        .await
        .map_err(unavailable)?
    }
}

#[async_trait]
impl LongTermStore for SqliteLongTerm {
    async fn query(&self, text: &str, k: usize) -> Result<Vec<String>, MemoryError> {
        let query_vec = self.embed(text).await;
        let conn = self.conn.clone();
        let rows: Vec<StoredRow> = tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(unavailable)?;
            let mut stmt = conn
                .prepare("SELECT content, embedding FROM long_memory ORDER BY seq ASC")
                .map_err(unavailable)?;
            let rows = stmt
                .query_map([], |row| {
                    let blob: Option<Vec<u8>> = row.get(1)?;
                    Ok(StoredRow {
                        content: row.get(0)?,
                        embedding: blob.map(|b| decode_vector(&b)),
                    })
                })
                .map_err(unavailable)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(unavailable)?;
            Ok::<_, MemoryError>(rows)
        })
        .await
        .map_err(unavailable)??;

        let query_tokens = tokenize_to_set(text);
        let mut scored: Vec<(f32, String)> = rows
            .into_iter()
            .map(|row| {
                let score = match (&query_vec, &row.embedding) {
                    (Some(q), Some(d)) => cosine_similarity(q, d),
                    _ => lexical_similarity(&query_tokens, &tokenize_to_set(&row.content)),
                };
                (score, row.content)
            })
            .filter(|(s, _)| *s > 0.0)
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        Ok(scored.into_iter().take(k).map(|(_, c)| c).collect())
    }

    async fn insert(&self, record: MemoryRecord) -> Result<(), MemoryError> {
        record.validate()?;
        let embedding = self.embed(&record.content).await.map(|v| encode_vector(&v));
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(unavailable)?;
            let created_at: DateTime<Local> = record.metadata.timestamp;
            conn.execute(
                "INSERT INTO long_memory (id, seq, content, source, created_at, embedding)
                 VALUES (?1, (SELECT COALESCE(MAX(seq), 0) + 1 FROM long_memory), ?2, ?3, ?4, ?5)",
                params![
                    uuid::Uuid::new_v4().to_string(),
                    record.content,
                    record.metadata.source,
                    created_at.to_rfc3339(),
                    embedding,
                ],
            )
            .map_err(unavailable)?;
            Ok::<(), MemoryError>(())
        })
        .await
        .map_err(unavailable)?
    }
}

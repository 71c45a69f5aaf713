//! 双记忆一致性集成测试：实时查询绕过长期记忆、存储故障降级、写入截断

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use wren::memory::{
    classify_realtime, InMemoryLongTerm, LongTermStore, MemoryError, MemoryManager, MemoryRecord,
    MemorySettings, LONG_MEMORY_SOURCE, TRUNCATION_MARKER,
};

/// 记录调用次数的存储；failing 为真时所有调用都失败
#[derive(Default)]
struct CountingStore {
    queries: AtomicUsize,
    inserts: AtomicUsize,
    failing: bool,
}

#[async_trait]
impl LongTermStore for CountingStore {
    async fn query(&self, _text: &str, _k: usize) -> Result<Vec<String>, MemoryError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(MemoryError::Unavailable("connection refused".into()));
        }
        Ok(vec!["input: 旧问题\noutput: 旧回答".into()])
    }

    async fn insert(&self, _record: MemoryRecord) -> Result<(), MemoryError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(MemoryError::Unavailable("connection refused".into()));
        }
        Ok(())
    }
}

const REALTIME_INPUTS: &[&str] = &[
    "今天空气质量怎么样",
    "北京的AQI是多少",
    "PM2.5 高吗",
    "明天天气如何",
    "现在气温多少度",
    "现在几点了",
    "今天几号",
    "What time is it in Tokyo?",
    "weather in Paris",
    "Is it windy today?",
];

#[tokio::test]
async fn test_realtime_turns_never_touch_long_term() {
    let store = Arc::new(CountingStore::default());
    let manager = MemoryManager::new(Some(store.clone()), MemorySettings::default());
    for input in REALTIME_INPUTS {
        assert!(classify_realtime(input), "{input}");
        let ctx = manager.load_context(input).await;
        assert!(ctx.long_term_summary.is_empty());
        manager.save_turn(input, "实时回答").await;
    }
    assert_eq!(store.queries.load(Ordering::SeqCst), 0);
    assert_eq!(store.inserts.load(Ordering::SeqCst), 0);
    // 短期记忆照常追加
    assert_eq!(manager.short_term_turns().len(), REALTIME_INPUTS.len() * 2);
}

#[tokio::test]
async fn test_non_realtime_round_trip() {
    let store = Arc::new(InMemoryLongTerm::new());
    let manager = MemoryManager::new(Some(store.clone()), MemorySettings::default());
    manager.save_turn("我最喜欢的水果是芒果", "好的，我记住了").await;

    let records = store.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].content, "input: 我最喜欢的水果是芒果\noutput: 好的，我记住了");
    assert_eq!(records[0].metadata.source, LONG_MEMORY_SOURCE);

    let fresh = MemoryManager::new(Some(store), MemorySettings::default());
    let ctx = fresh.load_context("我最喜欢的水果是什么").await;
    assert!(ctx.long_term_summary.contains("芒果"), "{}", ctx.long_term_summary);
    assert!(ctx.short_term.is_empty());
}

#[tokio::test]
async fn test_store_failure_degrades_to_short_term() {
    let store = Arc::new(CountingStore {
        failing: true,
        ..CountingStore::default()
    });
    let manager = MemoryManager::new(Some(store.clone()), MemorySettings::default());
    manager.save_turn("介绍一下 Rust", "Rust 是一门系统编程语言").await;
    let ctx = manager.load_context("再说说所有权").await;
    assert!(ctx.long_term_summary.is_empty());
    assert_eq!(ctx.short_term.len(), 2);
    assert_eq!(store.queries.load(Ordering::SeqCst), 1);
    assert_eq!(store.inserts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_long_record_truncated_on_save() {
    let store = Arc::new(InMemoryLongTerm::new());
    let manager = MemoryManager::new(Some(store.clone()), MemorySettings::default());
    let long_answer = "很长的回答".repeat(2000);
    manager.save_turn("写一篇长文章", &long_answer).await;
    let content = &store.records()[0].content;
    assert!(content.ends_with(TRUNCATION_MARKER));
    assert_eq!(
        content.chars().count(),
        4000 + TRUNCATION_MARKER.chars().count()
    );
}

//! 执行循环与失败恢复集成测试（MockLlmClient，无网络）

use std::sync::Arc;

use async_trait::async_trait;
use wren::core::{run_turn_with_recovery, AgentError, AgentSession, RecoveryEngine};
use wren::llm::mock::{final_text, tool_call};
use wren::llm::{LlmError, MockLlmClient};
use wren::memory::{InMemoryLongTerm, MemoryManager, MemorySettings};
use wren::react::{Planner, ReactLoop, MAX_ITERATIONS};
use wren::tools::{aqi_category, Tool, ToolExecutor, ToolRegistry};

struct StubAirQuality;

#[async_trait]
impl Tool for StubAirQuality {
    fn name(&self) -> &str {
        "get_air_quality"
    }
    fn description(&self) -> &str {
        "查询实时空气质量"
    }
    async fn invoke(&self, _input: &str) -> String {
        "167".to_string()
    }
}

fn react(mock: Arc<MockLlmClient>) -> ReactLoop {
    let mut registry = ToolRegistry::new();
    registry.register(StubAirQuality);
    ReactLoop::new(Planner::new(mock), Arc::new(ToolExecutor::new(registry, 5)))
}

fn session(model: &str) -> AgentSession {
    let memory = MemoryManager::new(
        Some(Arc::new(InMemoryLongTerm::new())),
        MemorySettings::default(),
    );
    AgentSession::new(model, memory.into_handle())
}

#[tokio::test]
async fn test_air_quality_scenario() {
    let mock = Arc::new(MockLlmClient::with_replies([
        Ok(tool_call("get_air_quality", "")),
        Ok(final_text(
            "当前西安的空气质量是167，属于不健康等级，建议减少户外活动并佩戴口罩。",
        )),
    ]));
    let agent = react(mock.clone());
    let recovery = RecoveryEngine::new(None);

    let (session, result) =
        run_turn_with_recovery(&agent, &recovery, session("primary"), "今天空气质量怎么样").await;
    let outcome = result.unwrap();

    assert!(outcome.response.starts_with("当前西安的空气质量是167"));
    assert!(outcome.response.contains(aqi_category(167)));
    assert_eq!(aqi_category(167), "不健康");
    assert_eq!(outcome.iterations, 2);

    let requests = mock.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].tools[0].name, "get_air_quality");
    assert!(requests[0].messages[0].content.contains("当前<城市>的空气质量是<AQI>"));
    assert_eq!(requests[1].messages.last().unwrap().content, "167");
    assert_eq!(session.memory.short_term_turns().len(), 2);
}

#[tokio::test]
async fn test_iteration_bound_never_exceeded() {
    let mock = Arc::new(MockLlmClient::new().repeating(Ok(tool_call("get_air_quality", ""))));
    let agent = react(mock.clone());
    let recovery = RecoveryEngine::new(None);

    let (session, result) = run_turn_with_recovery(&agent, &recovery, session("primary"), "一直查").await;
    let outcome = result.unwrap();
    assert!(outcome.aborted);
    assert_eq!(outcome.iterations, MAX_ITERATIONS);
    assert_eq!(mock.call_count(), MAX_ITERATIONS);
    assert_eq!(session.iteration_count, MAX_ITERATIONS);
}

#[tokio::test]
async fn test_pseudo_call_retries_exactly_once() {
    let mock = Arc::new(MockLlmClient::new().repeating(Ok(final_text("Action: get_air_quality"))));
    let agent = react(mock.clone());
    let recovery = RecoveryEngine::new(None);

    let (_, result) = run_turn_with_recovery(&agent, &recovery, session("primary"), "你好").await;
    let outcome = result.unwrap();
    assert!(outcome.retried);
    assert_eq!(outcome.response, "Action: get_air_quality");
    assert_eq!(mock.call_count(), 2);
}

#[tokio::test]
async fn test_persistent_pseudo_call_stays_out_of_memory() {
    let mock = Arc::new(MockLlmClient::with_replies([
        Ok(final_text("Action: get_air_quality")),
        Ok(final_text("Action: get_air_quality")),
        Ok(final_text("Rust 是一门系统编程语言")),
    ]));
    let agent = react(mock.clone());
    let recovery = RecoveryEngine::new(None);
    let store = Arc::new(InMemoryLongTerm::new());
    let memory = MemoryManager::new(Some(store.clone()), MemorySettings::default());
    let session = AgentSession::new("primary", memory.into_handle());

    let (session, result) = run_turn_with_recovery(&agent, &recovery, session, "讲讲 Rust").await;
    let outcome = result.unwrap();
    assert!(outcome.retried);
    assert_eq!(outcome.response, "Action: get_air_quality");
    assert!(store.is_empty());
    assert!(session.memory.short_term_turns().is_empty());

    let (_, result) = run_turn_with_recovery(&agent, &recovery, session, "再讲讲 Rust").await;
    assert_eq!(result.unwrap().response, "Rust 是一门系统编程语言");
    let next = mock.requests().pop().unwrap();
    assert!(next.messages.iter().all(|m| !m.content.contains("Action: get_air_quality")));
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_pseudo_call_retry_recovers() {
    let mock = Arc::new(MockLlmClient::with_replies([
        Ok(final_text("functions.get_air_quality({})")),
        Ok(final_text("你好，有什么可以帮你？")),
    ]));
    let agent = react(mock.clone());
    let recovery = RecoveryEngine::new(None);

    let (session, result) = run_turn_with_recovery(&agent, &recovery, session("primary"), "你好").await;
    let outcome = result.unwrap();
    assert!(outcome.retried);
    assert_eq!(outcome.response, "你好，有什么可以帮你？");
    let turns = session.memory.short_term_turns();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[1].text, "你好，有什么可以帮你？");
}

#[tokio::test]
async fn test_content_policy_switches_to_fallback() {
    let mock = Arc::new(MockLlmClient::with_replies([
        Err(LlmError::ContentPolicy("content_filter".into())),
        Ok(final_text("备用模型的回答")),
    ]));
    let agent = react(mock.clone());
    let recovery = RecoveryEngine::new(Some("backup".into()));

    let (session, result) = run_turn_with_recovery(&agent, &recovery, session("primary"), "讲个故事").await;
    assert_eq!(result.unwrap().response, "备用模型的回答");
    assert_eq!(mock.models_used(), vec!["primary", "backup"]);
    assert_eq!(session.model, "backup");
    assert_eq!(session.memory.short_term_turns().len(), 2);

    // 之后的轮次继续使用备用模型
    mock.push(Ok(final_text("继续")));
    let (session, result) = run_turn_with_recovery(&agent, &recovery, session, "然后呢").await;
    assert_eq!(result.unwrap().response, "继续");
    assert_eq!(mock.models_used().last().map(String::as_str), Some("backup"));
    assert_eq!(session.memory.short_term_turns().len(), 4);
}

#[tokio::test]
async fn test_content_policy_fallback_also_rejected() {
    let mock = Arc::new(MockLlmClient::new().repeating(Err(LlmError::Api {
        code: Some("content_policy_violation".into()),
        message: "content_policy_violation".into(),
    })));
    let agent = react(mock.clone());
    let recovery = RecoveryEngine::new(Some("backup".into()));

    let (session, result) = run_turn_with_recovery(&agent, &recovery, session("primary"), "讲个故事").await;
    let err = result.unwrap_err();
    assert!(matches!(err, AgentError::UpstreamContentPolicy { fallback_tried: true, .. }));
    assert!(err.user_message().contains("LLM_FALLBACK_MODEL"));
    assert_eq!(mock.call_count(), 2);
    assert_eq!(session.model, "primary");
    assert!(session.memory.short_term_turns().is_empty());
}

#[tokio::test]
async fn test_content_policy_without_fallback_surfaces() {
    let mock = Arc::new(MockLlmClient::with_replies([Err(LlmError::ContentPolicy(
        "data_inspection_failed".into(),
    ))]));
    let agent = react(mock.clone());
    let recovery = RecoveryEngine::new(None);

    let (_, result) = run_turn_with_recovery(&agent, &recovery, session("primary"), "讲个故事").await;
    let err = result.unwrap_err();
    assert!(err.is_content_policy());
    assert!(err.user_message().contains("WREN__LLM__FALLBACK_MODEL"));
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn test_other_errors_not_retried() {
    let mock = Arc::new(MockLlmClient::with_replies([Err(LlmError::Network("refused".into()))]));
    let agent = react(mock.clone());
    let recovery = RecoveryEngine::new(Some("backup".into()));

    let (session, result) = run_turn_with_recovery(&agent, &recovery, session("primary"), "你好").await;
    assert!(matches!(result.unwrap_err(), AgentError::Llm(LlmError::Network(_))));
    assert_eq!(mock.call_count(), 1);
    assert_eq!(session.model, "primary");
}

#[tokio::test]
async fn test_unknown_tool_is_fatal_and_not_retried() {
    let mock = Arc::new(MockLlmClient::with_replies([Ok(tool_call("launch_rocket", ""))]));
    let agent = react(mock.clone());
    let recovery = RecoveryEngine::new(Some("backup".into()));

    let (_, result) = run_turn_with_recovery(&agent, &recovery, session("primary"), "发射").await;
    let err = result.unwrap_err();
    assert!(matches!(err, AgentError::UnknownTool(ref n) if n == "launch_rocket"));
    assert!(err.user_message().contains("launch_rocket"));
    assert_eq!(mock.call_count(), 1);
}

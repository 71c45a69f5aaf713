//! Agent 运行时装配
//!
//! create_agent_components 按配置构建执行循环（Planner + ToolExecutor）与恢复引擎，
//! create_session 构建带双记忆的会话，process_message 对单条输入跑一轮（含备用模型恢复）。

use std::sync::Arc;

use crate::config::AppConfig;
use crate::core::{run_turn_with_recovery, AgentError, AgentSession, RecoveryEngine};
use crate::llm::{create_embedder_from_config, LlmClient, OpenAiClient};
use crate::memory::{InMemoryLongTerm, LongTermStore, MemoryManager, SqliteLongTerm};
use crate::react::{Planner, ReactLoop};
use crate::tools::{create_default_registry, ToolExecutor};

/// 工具执行超时在 HTTP 超时基础上留出余量
const TOOL_TIMEOUT_MARGIN_SECS: u64 = 5;

/// 预构建的 Agent 组件，可被多轮对话共享
pub struct AgentComponents {
    pub react: ReactLoop,
    pub recovery: RecoveryEngine,
}

/// 由配置创建 OpenAI 兼容的 LLM 客户端
pub fn create_llm_from_config(cfg: &AppConfig) -> Arc<dyn LlmClient> {
    Arc::new(OpenAiClient::new(
        cfg.llm.base_url.as_deref(),
        cfg.llm.api_key.as_deref().unwrap_or_default(),
        cfg.llm.request_timeout_secs,
    ))
}

/// 使用给定 LLM 客户端组装组件（测试可注入 MockLlmClient）
pub fn create_agent_components_with_llm(cfg: &AppConfig, llm: Arc<dyn LlmClient>) -> AgentComponents {
    let registry = create_default_registry(&cfg.tools);
    tracing::info!(tools = ?registry.tool_names(), model = %cfg.llm.model, "agent components ready");
    let executor = ToolExecutor::new(
        registry,
        cfg.tools.http_timeout_secs + TOOL_TIMEOUT_MARGIN_SECS,
    );
    let planner = Planner::new(llm).with_temperature(cfg.llm.temperature);
    AgentComponents {
        react: ReactLoop::new(planner, Arc::new(executor)),
        recovery: RecoveryEngine::new(cfg.llm.fallback_model.clone()),
    }
}

pub fn create_agent_components(cfg: &AppConfig) -> AgentComponents {
    create_agent_components_with_llm(cfg, create_llm_from_config(cfg))
}

/// 长期记忆存储：默认 SQLite 文件，打开失败或 store_path 为空时退化为进程内存储
pub fn create_long_term_store(cfg: &AppConfig) -> Arc<dyn LongTermStore> {
    let Some(path) = cfg
        .memory
        .store_path
        .as_ref()
        .filter(|p| !p.as_os_str().is_empty())
    else {
        tracing::info!("no long-term store path, using in-memory store");
        return Arc::new(InMemoryLongTerm::new());
    };
    let embedder = create_embedder_from_config(
        cfg.llm.base_url.as_deref(),
        &cfg.memory.embedding_model,
        cfg.llm.api_key.as_deref(),
    );
    match SqliteLongTerm::open(path, embedder) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "long-term store unavailable, using in-memory store");
            Arc::new(InMemoryLongTerm::new())
        }
    }
}

/// 新会话：主模型 + 空短期记忆 + 给定长期存储
pub fn create_session(cfg: &AppConfig, long_term: Arc<dyn LongTermStore>) -> AgentSession {
    let memory = MemoryManager::new(Some(long_term), cfg.memory.settings());
    AgentSession::new(cfg.llm.model.clone(), memory.into_handle())
}

/// 处理单条用户消息，返回调用方应继续使用的会话与最终回复
pub async fn process_message(
    components: &AgentComponents,
    session: AgentSession,
    user_input: &str,
) -> (AgentSession, Result<String, AgentError>) {
    let (session, result) =
        run_turn_with_recovery(&components.react, &components.recovery, session, user_input).await;
    (session, result.map(|outcome| outcome.response))
}

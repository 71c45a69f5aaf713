//! LLM 层：客户端抽象、OpenAI 兼容实现（function calling）、嵌入、Mock

pub mod embedding;
pub mod mock;
pub mod openai;
pub mod traits;

pub use embedding::{create_embedder_from_config, EmbeddingProvider, OpenAiEmbedder};
pub use mock::MockLlmClient;
pub use openai::OpenAiClient;
pub use traits::{
    is_content_policy_message, ChatRequest, LlmClient, LlmError, LlmReply, ToolInvocation,
    ToolSpec,
};

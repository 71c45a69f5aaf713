//! 核心层：错误分类、会话句柄、失败恢复控制器

pub mod error;
pub mod recovery;
pub mod session;

pub use error::{AgentError, RecoveryAction};
pub use recovery::{run_turn_with_recovery, RecoveryEngine};
pub use session::AgentSession;

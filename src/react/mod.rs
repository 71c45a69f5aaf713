//! 认知层：Planner、伪工具调用检测、有界执行循环

pub mod events;
pub mod loop_;
pub mod planner;
pub mod pseudo_call;

pub use events::ReactEvent;
pub use loop_::{ReactLoop, TurnOutcome, ABORTED_RESPONSE, MAX_ITERATIONS};
pub use planner::{build_messages, build_system_prompt, Planner, SYSTEM_PROMPT};
pub use pseudo_call::detect_pseudo_call;

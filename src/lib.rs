//! Wren - Rust 中文对话助手
//!
//! 模块划分：
//! - **agent**: 运行时装配（组件、会话、单条消息处理）
//! - **calendar**: 日历文本解析与区间 / 关键词查询
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误分类、会话句柄、失败恢复控制器
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / Mock）、嵌入
//! - **memory**: 短期对话缓冲、长期语义记忆、实时查询分类
//! - **observability**: tracing 初始化
//! - **react**: Planner、伪工具调用检测、有界执行循环
//! - **speech**: 可取消的语音播报
//! - **tools**: 工具注册表、执行器与内置工具

pub mod agent;
pub mod calendar;
pub mod config;
pub mod core;
pub mod llm;
pub mod memory;
pub mod observability;
pub mod react;
pub mod speech;
pub mod tools;

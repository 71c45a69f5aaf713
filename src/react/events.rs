//! 执行循环过程事件：供前端展示思考、工具调用、观察与最终回答

use serde::Serialize;

/// 单步过程事件（可序列化为 JSON）
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReactEvent {
    /// 第几次 THINK
    Thinking { iteration: usize, max_iterations: usize },
    ToolCall { tool: String, input: String },
    /// 工具返回（预览）
    Observation { tool: String, preview: String },
    /// 检测到伪工具调用，丢弃结果并以全新会话重试
    PseudoCallRetry { reason: String },
    /// 超出迭代上限
    Aborted { iterations: usize },
    Answer { text: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_tagged() {
        let v = serde_json::to_value(ReactEvent::ToolCall {
            tool: "get_weather".into(),
            input: "西安".into(),
        })
        .unwrap();
        assert_eq!(v["type"], "tool_call");
        assert_eq!(v["tool"], "get_weather");
        let v = serde_json::to_value(ReactEvent::PseudoCallRetry { reason: "x".into() }).unwrap();
        assert_eq!(v["type"], "pseudo_call_retry");
    }
}

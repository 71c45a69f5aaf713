//! 伪工具调用检测
//!
//! 模型有时把工具调用写进正文而不是走结构化通道。这类文本从不执行，只用来判定是否需要干净重试。

use std::sync::OnceLock;

use regex::Regex;

/// 原样出现即视为伪调用的标记
const PSEUDO_CALL_TOKENS: &[&str] = &["functions.", "multi_tool_use", "<tool_call>", "\"tool_calls\""];

fn action_line() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?mi)^\s*action\s*(?:input)?\s*:").ok())
        .as_ref()
}

fn name_arguments() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?s)"name"\s*:.*"arguments"\s*:"#).ok())
        .as_ref()
}

/// 若文本像一次未执行的工具调用，返回命中原因
pub fn detect_pseudo_call(text: &str, tool_names: &[String]) -> Option<String> {
    if let Some(token) = PSEUDO_CALL_TOKENS.iter().find(|t| text.contains(*t)) {
        return Some(format!("token {token}"));
    }
    if action_line().is_some_and(|re| re.is_match(text)) {
        return Some("action line".to_string());
    }
    if name_arguments().is_some_and(|re| re.is_match(text)) {
        return Some("name/arguments payload".to_string());
    }
    tool_names
        .iter()
        .find(|name| !name.is_empty() && text.contains(name.as_str()))
        .map(|name| format!("tool name {name}"))
}

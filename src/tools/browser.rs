//! 打开系统浏览器 open_browser
//!
//! URL 直接打开；其余文本转成 Google 搜索；空输入只打开浏览器。
//! 按平台选择启动命令，未知平台返回“不支持的操作系统”。

use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;

use crate::tools::schema::input_schema;
use crate::tools::Tool;

pub const UNSUPPORTED_OS: &str = "不支持的操作系统";

const SEARCH_URL: &str = "https://www.google.com/search";
const HOME_URL: &str = "https://www.google.com";

/// 输入 -> 要打开的地址
pub fn target_url(input: &str) -> String {
    let text = input.trim();
    if text.is_empty() {
        return HOME_URL.to_string();
    }
    if let Ok(url) = Url::parse(text) {
        if matches!(url.scheme(), "http" | "https") {
            return url.to_string();
        }
    }
    match Url::parse_with_params(SEARCH_URL, &[("q", text)]) {
        Ok(url) => url.to_string(),
        Err(_) => HOME_URL.to_string(),
    }
}

/// 平台对应的启动命令（程序, 参数）
pub fn browser_command(os: &str, target: &str) -> Option<(&'static str, Vec<String>)> {
    match os {
        "macos" => Some(("open", vec![target.to_string()])),
        "windows" => Some((
            "cmd",
            vec!["/C".into(), "start".into(), String::new(), target.to_string()],
        )),
        "linux" => Some(("xdg-open", vec![target.to_string()])),
        _ => None,
    }
}

pub struct BrowserTool;

#[async_trait]
impl Tool for BrowserTool {
    fn name(&self) -> &str {
        "open_browser"
    }

    fn description(&self) -> &str {
        "打开系统默认浏览器。输入网址则直接打开，输入其他文本则进行网页搜索，为空则只打开浏览器。"
    }

    fn parameters_schema(&self) -> Value {
        input_schema("网址或搜索内容，可为空")
    }

    async fn invoke(&self, input: &str) -> String {
        let target = target_url(input);
        let Some((program, args)) = browser_command(std::env::consts::OS, &target) else {
            return UNSUPPORTED_OS.to_string();
        };
        match tokio::process::Command::new(program).args(&args).spawn() {
            Ok(_) => format!("已在浏览器中打开：{target}"),
            Err(e) => {
                tracing::warn!(program, error = %e, "open_browser failed");
                format!("打开浏览器失败：{e}")
            }
        }
    }
}

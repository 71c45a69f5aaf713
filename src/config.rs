//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：TOML 文件 -> 显式配置文件 -> 环境变量 `WREN__*`（双下划线表示嵌套，如 `WREN__LLM__MODEL`）
//! -> 传统环境变量（OPENAI_API_KEY、LLM_MODEL、CALENDAR_ICS_PATH 等，优先级最高）。

use std::path::PathBuf;

use serde::Deserialize;

use crate::core::AgentError;
use crate::memory::MemorySettings;

/// 传统环境变量 -> 配置键
pub const LEGACY_ENV_KEYS: &[(&str, &str)] = &[
    ("OPENAI_BASE_URL", "llm.base_url"),
    ("OPENAI_API_KEY", "llm.api_key"),
    ("LLM_MODEL", "llm.model"),
    ("LLM_FALLBACK_MODEL", "llm.fallback_model"),
    ("CALENDAR_ICS_PATH", "tools.calendar_path"),
    ("TTS_ENABLED", "speech.enabled"),
    ("TTS_VOICE", "speech.voice"),
    ("TTS_RATE", "speech.rate"),
];

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
    pub memory: MemorySection,
    pub tools: ToolsSection,
    pub speech: SpeechSection,
}

/// [app] 段
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppSection {
    pub name: Option<String>,
    /// RUST_LOG 未设置时的默认日志级别
    pub log_level: String,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: None,
            log_level: "warn".to_string(),
        }
    }
}

/// [llm] 段
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// OpenAI 兼容接口地址，未设置时用官方地址
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub model: String,
    /// 内容审查拒绝时切换的备用模型
    pub fallback_model: Option<String>,
    pub temperature: f32,
    pub request_timeout_secs: u64,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            fallback_model: None,
            temperature: 0.2,
            request_timeout_secs: 60,
        }
    }
}

/// 默认长期记忆文件（相对工作目录）
pub const DEFAULT_STORE_PATH: &str = "data/long_memory.db";

/// [memory] 段
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MemorySection {
    /// SQLite 长期记忆文件；显式设为空串时长期记忆只存在于进程内
    pub store_path: Option<PathBuf>,
    pub embedding_model: String,
    pub top_k: usize,
    pub load_max_chars: usize,
    pub save_max_chars: usize,
}

impl Default for MemorySection {
    fn default() -> Self {
        let settings = MemorySettings::default();
        Self {
            store_path: Some(PathBuf::from(DEFAULT_STORE_PATH)),
            embedding_model: "text-embedding-3-small".to_string(),
            top_k: settings.top_k,
            load_max_chars: settings.load_max_chars,
            save_max_chars: settings.save_max_chars,
        }
    }
}

impl MemorySection {
    pub fn settings(&self) -> MemorySettings {
        MemorySettings {
            top_k: self.top_k.max(1),
            load_max_chars: self.load_max_chars,
            save_max_chars: self.save_max_chars,
        }
    }
}

/// [tools] 段
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolsSection {
    /// 本地日历文件；未设置时日历工具返回配置提示
    pub calendar_path: Option<PathBuf>,
    pub default_location: String,
    pub default_latitude: f64,
    pub default_longitude: f64,
    pub default_timezone: String,
    /// 外部 HTTP 请求超时（秒）
    pub http_timeout_secs: u64,
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            calendar_path: None,
            default_location: "西安".to_string(),
            default_latitude: 34.3416,
            default_longitude: 108.9398,
            default_timezone: "Asia/Shanghai".to_string(),
            http_timeout_secs: 15,
        }
    }
}

/// [speech] 段
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SpeechSection {
    pub enabled: bool,
    pub voice: Option<String>,
    /// 每分钟字数
    pub rate: Option<u32>,
}

impl AppConfig {
    /// 启动前校验：只有缺少 API Key 会阻止启动，其余缺省一律降级
    pub fn validate(&self) -> Result<(), AgentError> {
        let has_key = self
            .llm
            .api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty());
        if !has_key {
            return Err(AgentError::Config(
                "缺少 LLM API Key，请设置环境变量 OPENAI_API_KEY 或 WREN__LLM__API_KEY".to_string(),
            ));
        }
        Ok(())
    }
}

/// 收集已设置的传统环境变量（空值忽略）
pub fn legacy_overrides(lookup: impl Fn(&str) -> Option<String>) -> Vec<(&'static str, String)> {
    LEGACY_ENV_KEYS
        .iter()
        .filter_map(|(var, key)| {
            lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(|v| (*key, v))
        })
        .collect()
}

/// 从 config 目录加载配置，环境变量可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件
/// 3. 叠加环境变量 WREN__*
/// 4. 传统环境变量最后覆盖
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    load_config_with_env(config_path, |var| std::env::var(var).ok())
}

pub fn load_config_with_env(
    config_path: Option<PathBuf>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    for name in ["config/default", "../config/default", "default"] {
        if std::path::Path::new(&format!("{name}.toml")).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("WREN")
            .separator("__")
            .try_parsing(true),
    );

    for (key, value) in legacy_overrides(lookup) {
        builder = builder.set_override(key, value)?;
    }

    builder.build()?.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.llm.model, "gpt-4o-mini");
        assert_eq!(cfg.memory.top_k, 5);
        assert_eq!(cfg.memory.load_max_chars, 6000);
        assert_eq!(cfg.memory.save_max_chars, 4000);
        assert_eq!(cfg.tools.default_location, "西安");
        assert_eq!(cfg.tools.default_timezone, "Asia/Shanghai");
        assert!(!cfg.speech.enabled);
        assert_eq!(cfg.memory.store_path, Some(PathBuf::from(DEFAULT_STORE_PATH)));
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let err = AppConfig::default().validate().unwrap_err();
        assert!(matches!(err, AgentError::Config(_)));
        assert!(err.user_message().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_legacy_overrides_skip_empty() {
        let env: HashMap<&str, &str> =
            [("OPENAI_API_KEY", "sk-test"), ("LLM_FALLBACK_MODEL", "  ")].into();
        let got = legacy_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(got, vec![("llm.api_key", "sk-test".to_string())]);
    }

    #[test]
    fn test_file_then_legacy_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wren.toml");
        std::fs::write(
            &path,
            "[llm]\nmodel = \"file-model\"\napi_key = \"file-key\"\n[tools]\ndefault_location = \"北京\"\n",
        )
        .unwrap();
        let env: HashMap<&str, &str> = [
            ("LLM_MODEL", "env-model"),
            ("LLM_FALLBACK_MODEL", "backup"),
            ("CALENDAR_ICS_PATH", "/tmp/cal.ics"),
            ("TTS_ENABLED", "true"),
            ("TTS_RATE", "180"),
        ]
        .into();
        let cfg = load_config_with_env(Some(path), |k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(cfg.llm.model, "env-model");
        assert_eq!(cfg.llm.api_key.as_deref(), Some("file-key"));
        assert_eq!(cfg.llm.fallback_model.as_deref(), Some("backup"));
        assert_eq!(cfg.tools.default_location, "北京");
        assert_eq!(cfg.tools.default_timezone, "Asia/Shanghai");
        assert_eq!(cfg.tools.calendar_path, Some(PathBuf::from("/tmp/cal.ics")));
        assert!(cfg.speech.enabled);
        assert_eq!(cfg.speech.rate, Some(180));
        assert!(cfg.validate().is_ok());
    }
}

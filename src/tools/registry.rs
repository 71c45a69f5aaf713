//! 工具注册表
//!
//! 所有工具实现 Tool trait（name / description / parameters_schema / invoke），会话开始时注册一次，
//! 之后只读。注册顺序即下发给 LLM 的目录顺序。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::llm::ToolSpec;
use crate::tools::schema::input_schema;

/// 工具 trait：输入为参数字符串，输出永远是字符串。
/// 网络 / 文件 / 进程失败由工具自己转成可读文本返回，不向上抛错。
#[async_trait]
pub trait Tool: Send + Sync {
    /// 工具名（全局唯一）
    fn name(&self) -> &str;

    /// 自然语言描述，LLM 据此决定是否调用
    fn description(&self) -> &str;

    /// 参数 JSON Schema；默认是单个可选字符串参数 input
    fn parameters_schema(&self) -> Value {
        input_schema("工具输入，可为空")
    }

    async fn invoke(&self, input: &str) -> String;
}

/// 工具注册表：按名称查找，保留注册顺序
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册工具；同名工具后注册的替换先注册的（位置不变）
    pub fn register(&mut self, tool: impl Tool + 'static) {
        self.register_arc(Arc::new(tool));
    }

    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        match self.index.get(&name) {
            Some(&i) => self.tools[i] = tool,
            None => {
                self.index.insert(name, self.tools.len());
                self.tools.push(tool);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.index.get(name).map(|&i| self.tools[i].clone())
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name().to_string()).collect()
    }

    /// 返回 (name, description) 列表
    pub fn tool_descriptions(&self) -> Vec<(String, String)> {
        self.tools
            .iter()
            .map(|t| (t.name().to_string(), t.description().to_string()))
            .collect()
    }

    /// 下发给 LLM 的工具目录
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools
            .iter()
            .map(|t| ToolSpec {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters_schema(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str, &'static str);

    #[async_trait]
    impl Tool for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn description(&self) -> &str {
            self.1
        }

        async fn invoke(&self, input: &str) -> String {
            format!("{}:{}", self.0, input)
        }
    }

    #[tokio::test]
    async fn test_register_keeps_order_and_replaces() {
        let mut reg = ToolRegistry::new();
        reg.register(Named("b", "first b"));
        reg.register(Named("a", "a"));
        reg.register(Named("b", "second b"));
        assert_eq!(reg.tool_names(), vec!["b", "a"]);
        assert_eq!(reg.tool_descriptions()[0].1, "second b");
        assert_eq!(reg.get("a").unwrap().invoke("x").await, "a:x");
        assert!(reg.get("missing").is_none());
    }

    #[test]
    fn test_specs_default_schema() {
        let mut reg = ToolRegistry::new();
        reg.register(Named("t", "desc"));
        let specs = reg.specs();
        assert_eq!(specs[0].parameters["properties"]["input"]["type"], "string");
    }
}

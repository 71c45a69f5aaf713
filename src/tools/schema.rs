//! 工具参数 JSON Schema
//!
//! 简单工具统一使用单个字符串参数 input；结构化参数（如日历查询）用 schemars 从类型生成。

use schemars::{schema_for, JsonSchema};
use serde_json::{json, Value};

/// 单个可选字符串参数 `input` 的 schema
pub fn input_schema(description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "input": { "type": "string", "description": description }
        },
        "required": []
    })
}

/// 由类型生成 function 参数 schema（去掉 $schema / title 等顶层元信息）
pub fn schema_of<T: JsonSchema>() -> Value {
    let mut value = serde_json::to_value(schema_for!(T)).unwrap_or_else(|_| json!({}));
    if let Some(obj) = value.as_object_mut() {
        obj.remove("$schema");
        obj.remove("title");
        obj.entry("type").or_insert_with(|| json!("object"));
    }
    value
}

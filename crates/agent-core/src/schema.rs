//! Tool-Schema Bridge
//!
//! Tool servers describe arguments with full JSON Schema, including
//! annotation keys that function-calling dialects reject. This module
//! rewrites a schema tree into the portable subset.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::protocol::ToolDescriptor;

/// Keys the function-declaration dialect does not accept
pub const NON_PORTABLE_KEYS: &[&str] = &["title", "default"];

/// Function declaration offered to the model
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Remove every mapping entry whose key is in `keys`, at any depth.
///
/// Total over any JSON tree: objects and arrays are rebuilt, scalars are
/// returned as they are.
pub fn strip_keys(value: &Value, keys: &[&str]) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(k, _)| !keys.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), strip_keys(v, keys)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(|v| strip_keys(v, keys)).collect()),
        scalar => scalar.clone(),
    }
}

impl From<&ToolDescriptor> for FunctionDeclaration {
    fn from(tool: &ToolDescriptor) -> Self {
        Self {
            name: tool.name.clone(),
            description: tool.description.clone().unwrap_or_default(),
            parameters: strip_keys(&tool.input_schema, NON_PORTABLE_KEYS),
        }
    }
}

/// Translate a server tool list into function declarations
pub fn to_function_declarations(tools: &[ToolDescriptor]) -> Vec<FunctionDeclaration> {
    tools.iter().map(FunctionDeclaration::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn news_schema() -> Value {
        json!({
            "type": "object",
            "title": "get_realtime_newsArguments",
            "properties": {
                "hours": {
                    "title": "Hours",
                    "type": "integer",
                    "default": 1,
                    "description": "Lookback window"
                }
            },
            "anyOf": [
                {"title": "A", "type": "object", "properties": {"x": {"default": [1, {"title": "deep"}]}}},
                "title"
            ]
        })
    }

    fn contains_key(value: &Value, key: &str) -> bool {
        match value {
            Value::Object(map) => map.contains_key(key) || map.values().any(|v| contains_key(v, key)),
            Value::Array(items) => items.iter().any(|v| contains_key(v, key)),
            _ => false,
        }
    }

    #[test]
    fn test_strips_designated_keys_at_every_depth() {
        let stripped = strip_keys(&news_schema(), NON_PORTABLE_KEYS);
        assert!(!contains_key(&stripped, "title"));
        assert!(!contains_key(&stripped, "default"));
        assert_eq!(
            stripped,
            json!({
                "type": "object",
                "properties": {
                    "hours": {"type": "integer", "description": "Lookback window"}
                },
                "anyOf": [
                    {"type": "object", "properties": {"x": {}}},
                    "title"
                ]
            })
        );
    }

    #[test]
    fn test_idempotent() {
        let once = strip_keys(&news_schema(), NON_PORTABLE_KEYS);
        let twice = strip_keys(&once, NON_PORTABLE_KEYS);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_scalars_pass_through() {
        for scalar in [json!(null), json!(true), json!(3), json!("title")] {
            assert_eq!(strip_keys(&scalar, NON_PORTABLE_KEYS), scalar);
        }
    }

    #[test]
    fn test_custom_key_set() {
        let value = json!({"a": 1, "b": {"a": 2, "c": 3}});
        assert_eq!(strip_keys(&value, &["a"]), json!({"b": {"c": 3}}));
        assert_eq!(strip_keys(&value, &[]), value);
    }

    #[test]
    fn test_declaration_from_descriptor() {
        let tool = ToolDescriptor {
            name: "get_realtime_news".into(),
            description: Some("Latest headlines".into()),
            input_schema: news_schema(),
        };
        let decls = to_function_declarations(std::slice::from_ref(&tool));
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].name, "get_realtime_news");
        assert_eq!(decls[0].description, "Latest headlines");
        assert_eq!(decls[0].parameters["properties"]["hours"]["type"], "integer");
    }
}

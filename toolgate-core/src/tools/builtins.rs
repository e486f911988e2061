//! A handful of statically compiled example tools so `GET /tools` and the
//! tool-call loop are exercisable without plugin loading (out of scope).

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

use super::error::ToolError;
use super::r#trait::Tool;
use crate::model::ToolFunctionSpec;

/// Returns the current UTC time as an RFC 3339 string.
pub struct NowTool;

#[async_trait]
impl Tool for NowTool {
    fn name(&self) -> &str {
        "now"
    }

    fn spec(&self) -> ToolFunctionSpec {
        ToolFunctionSpec {
            name: "now".to_string(),
            description: Some("Returns the current UTC time in RFC 3339 format.".to_string()),
            parameters: Some(serde_json::json!({
                "type": "object",
                "properties": {},
            })),
        }
    }

    async fn call(&self, _args: Value) -> Result<Value, ToolError> {
        Ok(Value::String(Utc::now().to_rfc3339()))
    }
}

/// Returns its `text` argument unchanged. Deterministic, used in tests.
pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn spec(&self) -> ToolFunctionSpec {
        ToolFunctionSpec {
            name: "echo".to_string(),
            description: Some("Echoes the `text` argument back unchanged.".to_string()),
            parameters: Some(serde_json::json!({
                "type": "object",
                "properties": {
                    "text": {"type": "string"},
                },
                "required": ["text"],
            })),
        }
    }

    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        args.get("text")
            .and_then(Value::as_str)
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(|| ToolError::InvalidArguments("missing `text` field".to_string()))
    }
}

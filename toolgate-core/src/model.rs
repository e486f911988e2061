//! Wire types for the OpenAI-compatible Chat Completions surface.
//!
//! Fields this crate doesn't touch are preserved through `extra` catch-alls so a
//! rewrite round-trip doesn't drop vendor extensions (e.g. `reasoning_content`).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An OpenAI Chat Completions request body.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDescriptor>>,
    #[serde(default)]
    pub stream: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A single message. `role` is one of `system`, `user`, `assistant`, `tool`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Message {
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<MessageContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: Some(MessageContent::Text(content.into())),
            tool_calls: None,
            tool_call_id: None,
            extra: Map::new(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: Some(MessageContent::Text(content.into())),
            tool_calls: None,
            tool_call_id: None,
            extra: Map::new(),
        }
    }

    pub fn assistant_with_tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: None,
            tool_calls: Some(tool_calls),
            tool_call_id: None,
            extra: Map::new(),
        }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: "tool".to_string(),
            content: Some(MessageContent::Text(content.into())),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.into()),
            extra: Map::new(),
        }
    }

    pub fn text(&self) -> String {
        self.content.as_ref().map(|c| c.as_text()).unwrap_or_default()
    }
}

/// Message content: a plain string, or OpenAI's multimodal content-part array.
///
/// Both shapes are accepted on the way in; only the text variant is produced
/// by the rewriter on the way out.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    pub fn as_text(&self) -> String {
        match self {
            MessageContent::Text(s) => s.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|p| p.text.as_deref())
                .collect::<Vec<_>>()
                .join(""),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContentPart {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub part_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A tool call, either complete (non-streaming) or a delta chunk (streaming),
/// keyed for accumulation by `index`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToolCall {
    #[serde(default)]
    pub index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default = "function_type", skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
    pub function: ToolCallFunction,
}

fn function_type() -> Option<String> {
    Some("function".to_string())
}

impl ToolCall {
    pub fn id_str(&self) -> &str {
        self.id.as_deref().unwrap_or_default()
    }

    /// Merges an incoming streaming delta chunk into this accumulated call by
    /// string-wise concatenation of id, function name and arguments.
    pub fn accumulate(&mut self, delta: &ToolCall) {
        if let Some(ref id) = delta.id {
            let mut current = self.id.take().unwrap_or_default();
            current.push_str(id);
            self.id = Some(current);
        }
        if let Some(ref name) = delta.function.name {
            let mut current = self.function.name.take().unwrap_or_default();
            current.push_str(name);
            self.function.name = Some(current);
        }
        if let Some(ref args) = delta.function.arguments {
            let mut current = self.function.arguments.take().unwrap_or_default();
            current.push_str(args);
            self.function.arguments = Some(current);
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToolCallFunction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

/// JSON-Schema-shaped descriptor of a callable, as sent in `ChatRequest.tools`
/// and returned from `GET /tools`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolDescriptor {
    #[serde(default = "function_type_str")]
    pub r#type: String,
    pub function: ToolFunctionSpec,
}

fn function_type_str() -> String {
    "function".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolFunctionSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

/// Result of invoking one tool call. Invariant: `id == tool_call.id`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolCallResult {
    pub id: String,
    pub result: String,
    pub tool_call: ToolCall,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_content_text_variant_round_trips() {
        let content = MessageContent::Text("hello".to_string());
        assert_eq!(content.as_text(), "hello");
    }

    #[test]
    fn message_content_parts_concatenates_text_fields() {
        let content = MessageContent::Parts(vec![
            ContentPart {
                part_type: Some("text".to_string()),
                text: Some("hello ".to_string()),
                extra: Map::new(),
            },
            ContentPart {
                part_type: Some("image_url".to_string()),
                text: None,
                extra: Map::new(),
            },
            ContentPart {
                part_type: Some("text".to_string()),
                text: Some("world".to_string()),
                extra: Map::new(),
            },
        ]);
        assert_eq!(content.as_text(), "hello world");
    }

    #[test]
    fn tool_call_accumulate_concatenates_across_chunks() {
        let mut acc = ToolCall {
            index: 0,
            id: Some("call_".to_string()),
            r#type: Some("function".to_string()),
            function: ToolCallFunction {
                name: Some("get_".to_string()),
                arguments: Some("{\"a\":".to_string()),
            },
        };
        let delta = ToolCall {
            index: 0,
            id: Some("0".to_string()),
            r#type: None,
            function: ToolCallFunction {
                name: Some("weather".to_string()),
                arguments: Some("1}".to_string()),
            },
        };
        acc.accumulate(&delta);
        assert_eq!(acc.id_str(), "call_0");
        assert_eq!(acc.function.name.as_deref(), Some("get_weather"));
        assert_eq!(acc.function.arguments.as_deref(), Some("{\"a\":1}"));
    }

    #[test]
    fn unknown_message_fields_survive_round_trip() {
        let json = serde_json::json!({
            "role": "assistant",
            "content": "hi",
            "reasoning_content": "because"
        });
        let msg: Message = serde_json::from_value(json).unwrap();
        assert_eq!(msg.extra.get("reasoning_content").unwrap(), "because");
        let back = serde_json::to_value(&msg).unwrap();
        assert_eq!(back["reasoning_content"], "because");
    }
}

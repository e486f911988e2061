//! Reads an upstream Chat Completions response — JSON or SSE — into an
//! accumulated `(tool_calls, content)` pair, tolerating the two known
//! omissions some upstreams make.

use serde_json::Value;

use crate::model::ToolCall;
use crate::partial_json::parse_partial;

/// Result of reading one upstream response: the tool calls the assistant
/// asked for (structured or prose-extracted) and the accumulated text.
#[derive(Debug, Clone, Default)]
pub struct ReadOutcome {
    pub tool_calls: Vec<ToolCall>,
    pub content: String,
}

/// Reads a response body given its `Content-Type`, dispatching to the
/// non-stream or SSE branch, then falling back to prose extraction if no
/// structured tool calls were found.
pub fn read_response(content_type: &str, body: &str) -> ReadOutcome {
    let mut outcome = if is_event_stream(content_type) {
        read_sse(body)
    } else {
        read_json(body)
    };

    if outcome.tool_calls.is_empty() {
        if let Some(extracted) = extract_tool_calls_from_prose(&outcome.content) {
            outcome.tool_calls = extracted;
        }
    }

    outcome
}

pub fn is_event_stream(content_type: &str) -> bool {
    content_type.to_ascii_lowercase().starts_with("text/event-stream")
}

/// Non-stream branch: parses the body as (partial-tolerant) JSON, patches a
/// missing `finish_reason`, and reads `message.tool_calls` / `message.content`.
pub fn read_json(body: &str) -> ReadOutcome {
    let Some(mut value) = parse_partial(body) else {
        return ReadOutcome::default();
    };
    normalize_finish_reason(&mut value);

    let message = &value["choices"][0]["message"];
    let tool_calls = message["tool_calls"]
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|v| serde_json::from_value::<ToolCall>(v.clone()).ok())
                .collect()
        })
        .unwrap_or_default();
    let content = message["content"].as_str().unwrap_or_default().to_string();

    ReadOutcome { tool_calls, content }
}

/// Patches `choices[0].finish_reason` to `"stop"` when the upstream omitted it.
pub fn normalize_finish_reason(value: &mut Value) {
    let Some(choice) = value["choices"].get_mut(0) else {
        return;
    };
    let missing = choice
        .get("finish_reason")
        .map(|v| v.is_null())
        .unwrap_or(true);
    if missing {
        choice["finish_reason"] = Value::String("stop".to_string());
    }
}

/// SSE branch: reads `data: <json>\n\n` lines until `[DONE]`, accumulating
/// content and tool-call deltas keyed by `index`.
pub fn read_sse(body: &str) -> ReadOutcome {
    let mut tool_calls: Vec<ToolCall> = Vec::new();
    let mut content = String::new();

    for line in body.lines() {
        let Some(payload) = sse_data_payload(line) else {
            continue;
        };
        if payload.starts_with("[DONE]") {
            break;
        }
        let Some(mut chunk) = parse_partial(payload) else {
            continue;
        };
        patch_chunk_indices(&mut chunk);

        let delta = &chunk["choices"][0]["delta"];
        if let Some(text) = delta["content"].as_str() {
            content.push_str(text);
        }
        if let Some(deltas) = delta["tool_calls"].as_array() {
            for raw in deltas {
                let Ok(delta_call) = serde_json::from_value::<ToolCall>(raw.clone()) else {
                    continue;
                };
                accumulate_tool_call(&mut tool_calls, delta_call);
            }
        }
    }

    ReadOutcome { tool_calls, content }
}

/// Returns the payload after `data: ` for a valid SSE data line, or `None`
/// for blank/short/non-data lines (including a trailing `\r`).
fn sse_data_payload(line: &str) -> Option<&str> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    if line.len() < 6 || &line[..6] != "data: " {
        return None;
    }
    Some(&line[6..])
}

/// Patches the two known omissions: `choices[0].index` and
/// `choices[0].delta.tool_calls[0].index`, both defaulting to 0.
fn patch_chunk_indices(chunk: &mut Value) {
    if let Some(choice) = chunk["choices"].get_mut(0) {
        if choice.get("index").map(|v| v.is_null()).unwrap_or(true) {
            choice["index"] = Value::from(0);
        }
        if let Some(first) = choice["delta"]["tool_calls"].get_mut(0) {
            if first.get("index").map(|v| v.is_null()).unwrap_or(true) {
                first["index"] = Value::from(0);
            }
        }
    }
}

fn accumulate_tool_call(tool_calls: &mut Vec<ToolCall>, delta: ToolCall) {
    let index = delta.index as usize;
    if index >= tool_calls.len() {
        tool_calls.resize_with(index + 1, ToolCall::default);
    }
    tool_calls[index].accumulate(&delta);
    tool_calls[index].index = delta.index;
}

/// Scans `text` for the first `[` and the last `]`; if found, parses the
/// slice as partial-tolerant JSON and, for each object, re-stringifies its
/// `function.arguments` as JSON text (tools expect arguments as a string).
/// Returns `None` on any failure — callers treat that as "no tool calls".
pub fn extract_tool_calls_from_prose(text: &str) -> Option<Vec<ToolCall>> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end < start {
        return None;
    }
    let slice = &text[start..=end];
    let mut list = parse_partial(slice)?;
    let array = list.as_array_mut()?;

    for obj in array.iter_mut() {
        let args = obj.get("function").and_then(|f| f.get("arguments")).cloned();
        if let Some(args) = args {
            if !args.is_string() {
                let encoded = serde_json::to_string(&args).ok()?;
                obj["function"]["arguments"] = Value::String(encoded);
            }
        }
    }

    let tool_calls: Vec<ToolCall> = array
        .iter()
        .filter_map(|v| serde_json::from_value(v.clone()).ok())
        .collect();
    if tool_calls.is_empty() {
        None
    } else {
        Some(tool_calls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_json_extracts_tool_calls_and_patches_finish_reason() {
        let body = serde_json::json!({
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{"index": 0, "id": "call_0", "type": "function", "function": {"name": "now", "arguments": "{}"}}]
                }
            }]
        })
        .to_string();
        let outcome = read_json(&body);
        assert_eq!(outcome.tool_calls.len(), 1);
        assert_eq!(outcome.tool_calls[0].id_str(), "call_0");
    }

    #[test]
    fn read_json_extracts_content_when_no_tool_calls() {
        let body = serde_json::json!({
            "choices": [{"finish_reason": "stop", "message": {"content": "hello"}}]
        })
        .to_string();
        let outcome = read_json(&body);
        assert!(outcome.tool_calls.is_empty());
        assert_eq!(outcome.content, "hello");
    }

    #[test]
    fn read_sse_accumulates_content_across_chunks() {
        let body = "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n\
                     data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n\
                     data: [DONE]\n\n";
        let outcome = read_sse(body);
        assert_eq!(outcome.content, "Hello");
    }

    #[test]
    fn read_sse_accumulates_tool_call_deltas_by_index() {
        let body = "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"id\":\"call_\",\"function\":{\"name\":\"get_\",\"arguments\":\"{\"}}]}}]}\n\n\
                     data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"id\":\"0\",\"function\":{\"name\":\"weather\",\"arguments\":\"}\"}}]}}]}\n\n\
                     data: [DONE]\n\n";
        let outcome = read_sse(body);
        assert_eq!(outcome.tool_calls.len(), 1);
        assert_eq!(outcome.tool_calls[0].id_str(), "call_0");
        assert_eq!(outcome.tool_calls[0].function.name.as_deref(), Some("get_weather"));
    }

    #[test]
    fn read_sse_ignores_short_and_non_data_lines() {
        let body = ": comment\n\nshort\ndata: {\"choices\":[{\"delta\":{\"content\":\"x\"}}]}\n\ndata: [DONE]\n\n";
        let outcome = read_sse(body);
        assert_eq!(outcome.content, "x");
    }

    #[test]
    fn read_sse_defaults_missing_indices_to_zero() {
        let body = "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"id\":\"call_0\",\"function\":{\"name\":\"now\",\"arguments\":\"{}\"}}]}}]}\n\ndata: [DONE]\n\n";
        let outcome = read_sse(body);
        assert_eq!(outcome.tool_calls.len(), 1);
        assert_eq!(outcome.tool_calls[0].index, 0);
    }

    #[test]
    fn extract_tool_calls_from_prose_restringifies_object_arguments() {
        let text = r#"Sure: [{"index":0,"id":"call_0","function":{"arguments":{"x":1},"name":"f"},"type":"function"}]"#;
        let tool_calls = extract_tool_calls_from_prose(text).unwrap();
        assert_eq!(tool_calls.len(), 1);
        assert_eq!(tool_calls[0].function.arguments.as_deref(), Some("{\"x\":1}"));
    }

    #[test]
    fn extract_tool_calls_from_prose_returns_none_without_brackets() {
        assert!(extract_tool_calls_from_prose("just some text").is_none());
    }

    #[test]
    fn read_response_dispatches_on_content_type() {
        let json_outcome = read_response(
            "application/json",
            &serde_json::json!({"choices":[{"finish_reason":"stop","message":{"content":"hi"}}]}).to_string(),
        );
        assert_eq!(json_outcome.content, "hi");

        let sse_outcome = read_response(
            "text/event-stream; charset=utf-8",
            "data: {\"choices\":[{\"delta\":{\"content\":\"hi\"}}]}\n\ndata: [DONE]\n\n",
        );
        assert_eq!(sse_outcome.content, "hi");
    }
}

//! Builds the synthetic tool-call response handed back to the client when a
//! tool-call loop iteration surfaces client-owned calls (§4.6).

use serde_json::Value;

use crate::model::ToolCall;
use crate::partial_json::parse_partial;
use crate::response::{is_event_stream, normalize_finish_reason};

/// Builds the response body for the client-owned subset of a tool-call
/// response, given the upstream body that produced it.
///
/// Non-stream: re-encodes the ChatCompletion with `finish_reason:
/// "tool_calls"`, `message.tool_calls` set to `client_calls`, and
/// `message.content` cleared.
///
/// Stream: emits exactly two SSE events — the first valid chunk (patched and
/// rewritten the same way) followed by `data: [DONE]`.
pub fn synthesize_for_client(content_type: &str, body: &str, client_calls: &[ToolCall]) -> Option<String> {
    if is_event_stream(content_type) {
        synthesize_stream(body, client_calls)
    } else {
        synthesize_non_stream(body, client_calls)
    }
}

fn synthesize_non_stream(body: &str, client_calls: &[ToolCall]) -> Option<String> {
    let mut value = parse_partial(body)?;
    normalize_finish_reason(&mut value);

    let choice = value["choices"].get_mut(0)?;
    choice["finish_reason"] = Value::String("tool_calls".to_string());
    choice["message"]["tool_calls"] = serde_json::to_value(client_calls).ok()?;
    choice["message"]["content"] = Value::String(String::new());

    serde_json::to_string(&value).ok()
}

fn synthesize_stream(body: &str, client_calls: &[ToolCall]) -> Option<String> {
    let mut chunk: Option<Value> = None;
    for line in body.lines() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.len() < 6 || &line[..6] != "data: " {
            continue;
        }
        let payload = &line[6..];
        if payload.starts_with("[DONE]") {
            break;
        }
        if let Some(v) = parse_partial(payload) {
            chunk = Some(v);
            break;
        }
    }
    let mut chunk = chunk?;

    if let Some(choice) = chunk["choices"].get_mut(0) {
        if choice.get("index").map(|v| v.is_null()).unwrap_or(true) {
            choice["index"] = Value::from(0);
        }
        choice["finish_reason"] = Value::String("tool_calls".to_string());
        choice["delta"]["role"] = Value::String("assistant".to_string());
        choice["delta"]["content"] = Value::String(String::new());
        choice["delta"]["tool_calls"] = serde_json::to_value(client_calls).ok()?;
    }

    let encoded = serde_json::to_string(&chunk).ok()?;
    Some(format!("data: {encoded}\n\ndata: [DONE]\n\n"))
}

/// Headers to preserve from the upstream response onto any outgoing response
/// (synthesized or pass-through): everything except `connection` and
/// `content-length`, which this proxy's own transport recomputes.
pub fn is_hop_by_hop_header(name: &str) -> bool {
    matches!(name.to_ascii_lowercase().as_str(), "connection" | "content-length")
}

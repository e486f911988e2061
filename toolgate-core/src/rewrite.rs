//! Pure transformations over a [`ChatRequest`] that make a model without native
//! tool calling imitate one.

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::model::{ChatRequest, Message, MessageContent, ToolCall, ToolCallResult, ToolDescriptor};
use crate::prompt::function_calling_prompt;

/// Runs the full rewrite pipeline in the fixed order required by the wire
/// contract: replacement splice, then (1) strip model prefix, (2) inject the
/// fake-tool prompt, (3) collapse assistant `tool_calls` into content, (4)
/// merge tool-role messages into one user message.
///
/// `server_tools` are appended to `request.tools` and any `replacements` are
/// spliced in unconditionally, before the `enabled` gate is even consulted —
/// both happen regardless of whether this model gets the fake-tool-calling
/// treatment. When `enabled` is `false`, steps (1)-(4) are skipped entirely
/// and the request is forwarded with its native `tools` array intact.
pub fn rewrite_request(
    request: &mut ChatRequest,
    server_tools: &[ToolDescriptor],
    replacements: &[ToolCallResult],
    enabled: bool,
) {
    let mut tools = request.tools.take().unwrap_or_default();
    tools.splice(0..0, server_tools.iter().cloned());
    request.tools = Some(tools);

    if !replacements.is_empty() {
        splice_replacement_results(request, replacements);
    }

    if !enabled {
        return;
    }

    strip_model_prefix(request);
    inject_fake_tool_prompt(request);
    collapse_assistant_tool_calls_to_content(request);
    merge_tool_messages_into_user(request);
}

/// Step 1: replaces `model` by everything after the last `|`. Idempotent: a
/// model with no `|` is unchanged, and re-running on an already-stripped name
/// is a no-op.
pub fn strip_model_prefix(request: &mut ChatRequest) {
    if let Some(stripped) = request.model.rsplit('|').next() {
        request.model = stripped.to_string();
    }
}

/// Step 2: if `tools` is non-empty, builds the fake-tool-calling system
/// message and inserts it immediately before the first non-system message,
/// then clears `tools`.
pub fn inject_fake_tool_prompt(request: &mut ChatRequest) {
    let has_tools = request.tools.as_ref().is_some_and(|t| !t.is_empty());
    if !has_tools {
        return;
    }

    let tools_json = serde_json::to_string_pretty(&request.tools).unwrap_or_default();
    let prompt = function_calling_prompt(&tools_json);

    let insert_at = request
        .messages
        .iter()
        .position(|m| m.role != "system")
        .unwrap_or(request.messages.len());
    request.messages.insert(insert_at, Message::system(prompt));

    request.tools = None;
}

/// Step 3: for every assistant message carrying `tool_calls`, sets `content`
/// to the compact JSON encoding of those calls and clears `tool_calls`.
pub fn collapse_assistant_tool_calls_to_content(request: &mut ChatRequest) {
    for message in &mut request.messages {
        if let Some(tool_calls) = message.tool_calls.take() {
            let json = serde_json::to_string(&tool_calls).unwrap_or_default();
            message.content = Some(MessageContent::Text(json));
        }
    }
}

/// Step 4: collects all tool-role messages in order; if any exist, removes
/// them and appends one `user` message summarizing their results.
pub fn merge_tool_messages_into_user(request: &mut ChatRequest) {
    let (tool_messages, rest): (Vec<Message>, Vec<Message>) = request
        .messages
        .drain(..)
        .partition(|m| m.role == "tool");

    request.messages = rest;
    if tool_messages.is_empty() {
        return;
    }

    request
        .messages
        .push(Message::user(tool_results_block(&tool_messages)));
}

fn tool_results_block(tool_messages: &[Message]) -> String {
    let mut out = String::from("# Tool Call Results:\n");
    for message in tool_messages {
        let id = message.tool_call_id.as_deref().unwrap_or_default();
        let content = message.text();
        let _ = writeln!(out, "- id: `{id}`\n```\n{content}\n```");
    }
    out
}

/// Splices replacement tool-call results into the conversation before the
/// rest of the pipeline runs: truncates `messages` to end at the last
/// assistant message carrying `tool_calls`, overwrites that message's
/// `tool_calls` with `replacements`, and appends one tool-role message per
/// replacement.
///
/// Precondition: such an assistant message exists whenever `replacements` is
/// non-empty (callers only supply replacements derived from a prior
/// assistant-with-tool_calls turn).
pub fn splice_replacement_results(request: &mut ChatRequest, replacements: &[ToolCallResult]) {
    let Some(last_idx) = request
        .messages
        .iter()
        .rposition(|m| m.tool_calls.as_ref().is_some_and(|tc| !tc.is_empty()))
    else {
        return;
    };

    request.messages.truncate(last_idx + 1);
    request.messages[last_idx].tool_calls =
        Some(replacements.iter().map(|r| r.tool_call.clone()).collect());

    for replacement in replacements {
        request
            .messages
            .push(Message::tool_result(&replacement.id, &replacement.result));
    }
}

/// Appends tool-call results for the non-rewritten (native tool-calling)
/// shape: one assistant message with `tool_calls`, followed by one tool-role
/// message per result.
pub fn append_tool_results_native(request: &mut ChatRequest, results: &[ToolCallResult]) {
    if results.is_empty() {
        return;
    }
    let calls: Vec<ToolCall> = results.iter().map(|r| r.tool_call.clone()).collect();
    request.messages.push(Message::assistant_with_tool_calls(calls));
    for r in results {
        request.messages.push(Message::tool_result(&r.id, &r.result));
    }
}

/// Appends tool-call results for the rewritten (faked tool-calling) shape:
/// one assistant message whose content is the pretty-printed JSON of the
/// tool calls, followed by one merged user message with the results block.
pub fn append_tool_results_faked(request: &mut ChatRequest, results: &[ToolCallResult]) {
    if results.is_empty() {
        return;
    }
    let calls: Vec<ToolCall> = results.iter().map(|r| r.tool_call.clone()).collect();
    let json = serde_json::to_string_pretty(&calls).unwrap_or_default();
    request.messages.push(Message {
        role: "assistant".to_string(),
        content: Some(MessageContent::Text(json)),
        tool_calls: None,
        tool_call_id: None,
        extra: Default::default(),
    });

    let tool_messages: Vec<Message> = results
        .iter()
        .map(|r| Message::tool_result(&r.id, &r.result))
        .collect();
    request
        .messages
        .push(Message::user(tool_results_block(&tool_messages)));
}

/// Pairs each tool-role message with the assistant `tool_calls` entry it
/// answers (by `tool_call_id`), producing one [`ToolCallResult`] per
/// tool-role message.
pub fn parse_tool_messages_to_results(request: &ChatRequest) -> Vec<ToolCallResult> {
    let mut by_id: HashMap<&str, &ToolCall> = HashMap::new();
    for message in &request.messages {
        if let Some(tool_calls) = &message.tool_calls {
            for tc in tool_calls {
                by_id.insert(tc.id_str(), tc);
            }
        }
    }

    request
        .messages
        .iter()
        .filter(|m| m.role == "tool")
        .filter_map(|m| {
            let id = m.tool_call_id.as_deref()?;
            let tool_call = by_id.get(id)?;
            Some(ToolCallResult {
                id: id.to_string(),
                result: m.text(),
                tool_call: (*tool_call).clone(),
            })
        })
        .collect()
}

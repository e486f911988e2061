//! Holds the set of locally callable tools and dispatches invocations on a
//! bounded pool so a slow tool can't starve the rest of the server.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Semaphore;

use super::r#trait::Tool;
use crate::model::{ToolCall, ToolCallResult, ToolDescriptor};

/// Registered tools plus a semaphore bounding how many run concurrently.
///
/// Stands in for the original's `ThreadPoolExecutor(max_workers=5)`: each
/// `submit` acquires a permit before calling the tool and releases it on
/// completion, so at most `pool_size` invocations run at once regardless of
/// how many are submitted.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    pool: Arc<Semaphore>,
}

impl ToolRegistry {
    pub fn new(pool_size: usize) -> Self {
        Self {
            tools: HashMap::new(),
            pool: Arc::new(Semaphore::new(pool_size.max(1))),
        }
    }

    /// Registry seeded with the built-in example tools (`now`, `echo`).
    pub fn with_builtins(pool_size: usize) -> Self {
        let mut registry = Self::new(pool_size);
        registry.register(Arc::new(super::builtins::NowTool));
        registry.register(Arc::new(super::builtins::EchoTool));
        registry
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn list_tools(&self) -> Vec<ToolDescriptor> {
        self.tools
            .values()
            .map(|t| ToolDescriptor {
                r#type: "function".to_string(),
                function: t.spec(),
            })
            .collect()
    }

    /// Invokes a tool call synchronously against the registry.
    ///
    /// Never propagates an error: unknown tool names yield an empty result,
    /// invocation failures yield the literal `"call [<name>] error"`.
    pub async fn invoke(&self, tool_call: &ToolCall) -> ToolCallResult {
        let name = tool_call.function.name.clone().unwrap_or_default();
        let id = tool_call.id_str().to_string();

        let Some(tool) = self.tools.get(&name) else {
            return ToolCallResult {
                id,
                result: String::new(),
                tool_call: tool_call.clone(),
            };
        };

        let raw_args = tool_call.function.arguments.clone().unwrap_or_default();
        let result = match invoke_with_retry(tool.as_ref(), &raw_args, &name).await {
            Ok(value) => coerce_result(value),
            Err(()) => format!("call [{name}] error"),
        };

        ToolCallResult {
            id,
            result,
            tool_call: tool_call.clone(),
        }
    }

    /// Submits a tool call onto the bounded pool, returning its result once a
    /// permit frees up and the invocation completes.
    pub async fn submit(self: &Arc<Self>, tool_call: ToolCall) -> ToolCallResult {
        let registry = Arc::clone(self);
        let permit = Arc::clone(&registry.pool)
            .acquire_owned()
            .await
            .expect("semaphore never closed");
        let result = registry.invoke(&tool_call).await;
        drop(permit);
        result
    }
}

/// Parses `arguments` as JSON and calls the tool; if that fails and the parsed
/// value happened to be a JSON string, re-parses that string once and retries.
async fn invoke_with_retry(tool: &dyn Tool, raw_args: &str, name: &str) -> Result<Value, ()> {
    let parsed: Value = serde_json::from_str(raw_args).unwrap_or(Value::Null);

    if let Ok(value) = tool.call(parsed.clone()).await {
        return Ok(value);
    }

    if let Value::String(inner) = &parsed {
        if let Ok(reparsed) = serde_json::from_str::<Value>(inner) {
            if let Ok(value) = tool.call(reparsed).await {
                return Ok(value);
            }
        }
    }

    tracing::debug!(tool = name, "tool invocation failed");
    Err(())
}

/// Coerces a tool's JSON return value to text: strings pass through as-is,
/// anything else is JSON-encoded with 2-space indent.
fn coerce_result(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => serde_json::to_string_pretty(&other).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ToolCallFunction;

    fn call(name: &str, args: &str) -> ToolCall {
        ToolCall {
            index: 0,
            id: Some("call_0".to_string()),
            r#type: Some("function".to_string()),
            function: ToolCallFunction {
                name: Some(name.to_string()),
                arguments: Some(args.to_string()),
            },
        }
    }

    #[tokio::test]
    async fn unknown_tool_returns_empty_result() {
        let registry = ToolRegistry::with_builtins(5);
        let result = registry.invoke(&call("nonexistent", "{}")).await;
        assert_eq!(result.result, "");
        assert_eq!(result.id, "call_0");
    }

    #[tokio::test]
    async fn echo_tool_returns_text_argument() {
        let registry = ToolRegistry::with_builtins(5);
        let result = registry
            .invoke(&call("echo", r#"{"text": "hello"}"#))
            .await;
        assert_eq!(result.result, "hello");
    }

    #[tokio::test]
    async fn now_tool_returns_rfc3339_timestamp() {
        let registry = ToolRegistry::with_builtins(5);
        let result = registry.invoke(&call("now", "{}")).await;
        assert!(result.result.contains('T'));
        assert!(result.result.ends_with('Z') || result.result.contains('+'));
    }

    #[tokio::test]
    async fn string_encoded_arguments_are_reparsed_once() {
        let registry = ToolRegistry::with_builtins(5);
        // arguments is a JSON string containing a JSON object (double-encoded).
        let args = serde_json::to_string(r#"{"text":"nested"}"#).unwrap();
        let result = registry.invoke(&call("echo", &args)).await;
        assert_eq!(result.result, "nested");
    }

    #[tokio::test]
    async fn list_tools_includes_builtins() {
        let registry = ToolRegistry::with_builtins(5);
        let names: Vec<_> = registry
            .list_tools()
            .into_iter()
            .map(|d| d.function.name)
            .collect();
        assert!(names.contains(&"now".to_string()));
        assert!(names.contains(&"echo".to_string()));
    }

    #[tokio::test]
    async fn submit_bounds_concurrency_via_pool() {
        let registry = Arc::new(ToolRegistry::with_builtins(1));
        let a = registry.submit(call("now", "{}"));
        let b = registry.submit(call("echo", r#"{"text":"b"}"#));
        let (ra, rb) = tokio::join!(a, b);
        assert!(!ra.result.is_empty());
        assert_eq!(rb.result, "b");
    }
}

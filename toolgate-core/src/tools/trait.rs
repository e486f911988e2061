use async_trait::async_trait;
use serde_json::Value;

use super::error::ToolError;
use crate::model::ToolFunctionSpec;

/// A single tool that can be called by name with JSON arguments.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use serde_json::Value;
/// use toolgate_core::model::ToolFunctionSpec;
/// use toolgate_core::tools::{Tool, ToolError};
///
/// struct Echo;
///
/// #[async_trait]
/// impl Tool for Echo {
///     fn name(&self) -> &str {
///         "echo"
///     }
///
///     fn spec(&self) -> ToolFunctionSpec {
///         ToolFunctionSpec {
///             name: "echo".to_string(),
///             description: Some("Echoes input back".to_string()),
///             parameters: Some(serde_json::json!({"type": "object"})),
///         }
///     }
///
///     async fn call(&self, args: Value) -> Result<Value, ToolError> {
///         Ok(args)
///     }
/// }
/// ```
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name; must match across registry lookups and JSON-Schema `function.name`.
    fn name(&self) -> &str;

    /// Descriptor surfaced via `GET /tools` and embedded in the fake-tool prompt.
    fn spec(&self) -> ToolFunctionSpec;

    /// Executes the tool given its parsed JSON arguments object.
    ///
    /// Called through [`super::ToolRegistry::submit`], which gates invocations on a
    /// semaphore so at most the configured pool size run at once.
    async fn call(&self, args: Value) -> Result<Value, ToolError>;
}

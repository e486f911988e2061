//! Tool invocation errors.

use thiserror::Error;

/// Errors a [`super::Tool`] implementation may return from `call`.
///
/// Never escapes [`super::ToolRegistry::invoke`] — it is always caught and
/// turned into a benign `ToolCallResult`.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("tool execution failed: {0}")]
    Execution(String),
}

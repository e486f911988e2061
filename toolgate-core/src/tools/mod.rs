//! The tool registry: locally callable tools, their JSON-Schema descriptors,
//! and a bounded-concurrency dispatcher.

mod builtins;
mod error;
mod registry;
#[allow(clippy::module_inception)]
mod r#trait;

pub use builtins::{EchoTool, NowTool};
pub use error::ToolError;
pub use registry::ToolRegistry;
pub use r#trait::Tool;

//! # toolgate-core
//!
//! Conversation rewriting, tool registry and tool-call loop for making a
//! model without native tool calling imitate one in front of an
//! OpenAI-compatible Chat Completions endpoint.
//!
//! ## Main modules
//!
//! - [`model`]: wire types for the Chat Completions surface ([`model::ChatRequest`],
//!   [`model::Message`], [`model::ToolCall`], [`model::ToolCallResult`]).
//! - [`rewrite`]: the pure conversation-rewriting steps ([`rewrite::rewrite_request`],
//!   [`rewrite::inject_fake_tool_prompt`], [`rewrite::merge_tool_messages_into_user`]) plus
//!   the native/faked append helpers used between loop iterations.
//! - [`prompt`]: the fixed fake-tool-calling system prompt ([`prompt::function_calling_prompt`]).
//! - [`response`]: reads a buffered upstream response — JSON or SSE — into accumulated
//!   tool calls and content ([`response::read_response`]), including the prose fallback.
//! - [`synth`]: builds the synthetic tool-call response returned to the client when a loop
//!   iteration surfaces client-owned calls ([`synth::synthesize_for_client`]).
//! - [`partial_json`]: best-effort JSON parsing for truncated SSE/prose input.
//! - [`tools`]: the local tool registry and bounded worker pool ([`tools::Tool`],
//!   [`tools::ToolRegistry`]).
//! - [`cache`]: generic TTL cache ([`cache::Cache`], [`cache::TtlCache`]) backing both the
//!   in-flight request coalescing cache and the cross-request stitching cache.
//! - [`upstream`]: the [`upstream::UpstreamClient`] trait the loop sends requests through,
//!   implemented against a real HTTP client by the server crate.
//! - [`orchestrate`]: the tool-call loop itself ([`orchestrate::ToolCallLoop`]), tying the
//!   above together into one buffered `proxy_chat` call.
//!
//! Key types are re-exported at the crate root.

pub mod cache;
pub mod model;
pub mod orchestrate;
pub mod partial_json;
pub mod prompt;
pub mod response;
pub mod rewrite;
pub mod synth;
pub mod tools;
pub mod upstream;

pub use cache::{Cache, CacheError, TtlCache};
pub use model::{
    ChatRequest, ContentPart, Message, MessageContent, ToolCall, ToolCallFunction, ToolCallResult,
    ToolDescriptor, ToolFunctionSpec,
};
pub use orchestrate::{ProxyOutcome, Residual, ToolCallLoop, ToolCallsInProcessCache, MAX_UPSTREAM_CALLS};
pub use partial_json::parse_partial;
pub use prompt::function_calling_prompt;
pub use response::{read_response, ReadOutcome};
pub use rewrite::{
    append_tool_results_faked, append_tool_results_native, collapse_assistant_tool_calls_to_content,
    inject_fake_tool_prompt, merge_tool_messages_into_user, parse_tool_messages_to_results, rewrite_request,
    splice_replacement_results, strip_model_prefix,
};
pub use synth::{is_hop_by_hop_header, synthesize_for_client};
pub use tools::{EchoTool, NowTool, Tool, ToolError, ToolRegistry};
pub use upstream::{UpstreamClient, UpstreamError, UpstreamResponse};

/// When running `cargo test -p toolgate-core`, initializes tracing from `RUST_LOG` so unit
/// tests can print logs with `--nocapture`.
#[cfg(test)]
mod test_logging {
    use ctor::ctor;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::Layer;

    #[ctor]
    fn init() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .with_filter(filter),
            )
            .try_init();
    }
}

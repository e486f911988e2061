//! Ties the rewriter, tool registry and upstream client together into the
//! tool-call loop: the component that actually drives a proxied chat
//! completion through as many upstream round-trips as it takes to resolve
//! every server-owned tool call.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use toolgate_config::Settings;

use crate::cache::{Cache, TtlCache};
use crate::model::{ChatRequest, ToolCall, ToolCallResult, ToolDescriptor};
use crate::response::read_response;
use crate::rewrite::{
    append_tool_results_faked, append_tool_results_native, parse_tool_messages_to_results, rewrite_request,
};
use crate::synth::{is_hop_by_hop_header, synthesize_for_client};
use crate::tools::ToolRegistry;
use crate::upstream::{UpstreamClient, UpstreamError, UpstreamResponse};

/// At most this many upstream calls per `proxy_chat`; the last one is
/// returned to the client verbatim regardless of whether it still asks for
/// tool calls.
pub const MAX_UPSTREAM_CALLS: usize = 10;

/// The TTL-keyed cache that stitches a client's tool-call results for a
/// client-owned batch back into the loop on the client's *next* request.
pub type ToolCallsInProcessCache = TtlCache<String, Vec<Residual>>;

/// One entry of a cached tool-call batch: either already resolved, still
/// running on the worker pool (as of when the batch was cached), or a
/// placeholder for a result the client owns and hasn't sent back yet.
#[derive(Clone)]
pub enum Residual {
    Resolved(ToolCallResult),
    Pending(String),
    InFlight(watch::Receiver<Option<ToolCallResult>>),
}

impl Residual {
    fn pending_id(&self) -> Option<&str> {
        match self {
            Residual::Pending(id) => Some(id.as_str()),
            _ => None,
        }
    }

    /// Waits out an in-flight entry if needed; `Pending` resolves to `None`
    /// (the client never sent that id back, nothing to stitch).
    async fn into_result(self) -> Option<ToolCallResult> {
        match self {
            Residual::Resolved(r) => Some(r),
            Residual::Pending(_) => None,
            Residual::InFlight(mut rx) => loop {
                if let Some(value) = rx.borrow().clone() {
                    return Some(value);
                }
                if rx.changed().await.is_err() {
                    return rx.borrow().clone();
                }
            },
        }
    }
}

/// The buffered result of one `proxy_chat` call: an upstream (or synthesized)
/// response to hand back to the client, plus — only when that response
/// surfaced client-owned tool calls — the residual batch to park in
/// [`ToolCallsInProcessCache`] under each of those calls' ids.
#[derive(Clone)]
pub struct ProxyOutcome {
    pub status: u16,
    pub content_type: String,
    pub body: String,
    pub headers: Vec<(String, String)>,
    pub residual: Option<Vec<Residual>>,
}

impl ProxyOutcome {
    fn bad_request(message: String) -> Self {
        Self {
            status: 400,
            content_type: "text/plain".to_string(),
            body: message,
            headers: Vec::new(),
            residual: None,
        }
    }

    fn upstream_error(err: UpstreamError) -> Self {
        Self {
            status: 502,
            content_type: "text/plain".to_string(),
            body: err.to_string(),
            headers: Vec::new(),
            residual: None,
        }
    }

    fn from_upstream(resp: UpstreamResponse, body: Option<String>, residual: Option<Vec<Residual>>) -> Self {
        Self {
            status: resp.status,
            content_type: resp.content_type.clone(),
            body: body.unwrap_or(resp.body),
            headers: filter_headers(resp.headers),
            residual,
        }
    }
}

fn filter_headers(headers: Vec<(String, String)>) -> Vec<(String, String)> {
    headers.into_iter().filter(|(k, _)| !is_hop_by_hop_header(k)).collect()
}

/// Drives one client chat-completion request through the tool-call loop.
pub struct ToolCallLoop<C: UpstreamClient> {
    client: Arc<C>,
    registry: Arc<ToolRegistry>,
    in_process_cache: Arc<ToolCallsInProcessCache>,
    settings: Settings,
}

impl<C: UpstreamClient> ToolCallLoop<C> {
    pub fn new(
        client: Arc<C>,
        registry: Arc<ToolRegistry>,
        in_process_cache: Arc<ToolCallsInProcessCache>,
        settings: Settings,
    ) -> Self {
        Self {
            client,
            registry,
            in_process_cache,
            settings,
        }
    }

    pub async fn proxy_chat(&self, upstream_url: &str, headers: Vec<(String, String)>, body: &[u8]) -> ProxyOutcome {
        let mut request: ChatRequest = match serde_json::from_slice(body) {
            Ok(request) => request,
            Err(err) => return ProxyOutcome::bad_request(err.to_string()),
        };

        let client_tool_names: HashSet<String> = request
            .tools
            .as_ref()
            .map(|tools| tools.iter().map(|t| t.function.name.clone()).collect())
            .unwrap_or_default();

        let server_tools: Vec<ToolDescriptor> = self
            .registry
            .list_tools()
            .into_iter()
            .filter(|d| !client_tool_names.contains(&d.function.name))
            .collect();

        let prior_results = parse_tool_messages_to_results(&request);
        let replacements = self.stitch_from_cache(prior_results).await;

        let rewrite_enabled =
            self.settings.fake_all_model || !self.settings.is_fake_disabled_for(&request.model);

        rewrite_request(&mut request, &server_tools, &replacements, rewrite_enabled);
        let faked_shape = request.tools.is_none();

        for iteration in 0..MAX_UPSTREAM_CALLS {
            let payload = match serde_json::to_vec(&request) {
                Ok(payload) => payload,
                Err(err) => return ProxyOutcome::bad_request(err.to_string()),
            };

            let resp = match self.client.post(upstream_url, &headers, payload).await {
                Ok(resp) => resp,
                Err(err) => return ProxyOutcome::upstream_error(err),
            };

            if resp.status != 200 {
                return ProxyOutcome::from_upstream(resp, None, None);
            }

            let outcome = read_response(&resp.content_type, &resp.body);
            let is_last_iteration = iteration == MAX_UPSTREAM_CALLS - 1;
            if outcome.tool_calls.is_empty() || is_last_iteration {
                return ProxyOutcome::from_upstream(resp, None, None);
            }

            let (client_calls, residual_batch) = self.dispatch_tool_calls(outcome.tool_calls, &client_tool_names);

            if !client_calls.is_empty() {
                let body = synthesize_for_client(&resp.content_type, &resp.body, &client_calls);
                return ProxyOutcome::from_upstream(resp, body, Some(residual_batch));
            }

            let mut results = Vec::with_capacity(residual_batch.len());
            for residual in residual_batch {
                if let Some(result) = residual.into_result().await {
                    results.push(result);
                }
            }

            if faked_shape {
                append_tool_results_faked(&mut request, &results);
            } else {
                append_tool_results_native(&mut request, &results);
            }
        }

        unreachable!("loop always returns by the last iteration")
    }

    /// Partitions one response's tool calls into client-owned (returned to
    /// the caller verbatim, tracked as `Pending` in the residual batch) and
    /// server-owned (submitted to the worker pool immediately, tracked as
    /// `InFlight`).
    fn dispatch_tool_calls(
        &self,
        tool_calls: Vec<ToolCall>,
        client_tool_names: &HashSet<String>,
    ) -> (Vec<ToolCall>, Vec<Residual>) {
        let mut client_calls = Vec::new();
        let mut residual = Vec::with_capacity(tool_calls.len());

        for tc in tool_calls {
            let name = tc.function.name.clone().unwrap_or_default();
            if client_tool_names.contains(&name) {
                residual.push(Residual::Pending(tc.id_str().to_string()));
                client_calls.push(tc);
                continue;
            }

            let (tx, rx) = watch::channel(None);
            let registry = Arc::clone(&self.registry);
            tokio::spawn(async move {
                let result = registry.submit(tc).await;
                let _ = tx.send(Some(result));
            });
            residual.push(Residual::InFlight(rx));
        }

        (client_calls, residual)
    }

    /// Stitches prior tool-call results (parsed off the client's own request)
    /// against anything parked in the in-process cache under the same id —
    /// the other half of a batch whose client-owned calls are only now
    /// coming back. Matches the one quirk of the original algorithm this was
    /// ported from: only the last cache hit's batch is retained across the
    /// loop, so a request answering ids from two different cached batches in
    /// one shot only stitches the second.
    async fn stitch_from_cache(&self, prior_results: Vec<ToolCallResult>) -> Vec<ToolCallResult> {
        let mut new_results = Vec::new();
        let mut cached_batch: Option<Vec<Residual>> = None;

        for result in prior_results {
            if let Some(mut batch) = self.in_process_cache.pop(&result.id).await {
                if let Some(pos) = batch.iter().position(|r| r.pending_id() == Some(result.id.as_str())) {
                    batch[pos] = Residual::Resolved(result);
                }
                cached_batch = Some(batch);
            } else {
                new_results.push(result);
            }
        }

        if let Some(batch) = cached_batch {
            for residual in batch {
                if let Residual::Pending(_) = residual {
                    continue;
                }
                if let Some(result) = residual.into_result().await {
                    new_results.push(result);
                }
            }
        }

        new_results
    }

    /// TTL used for [`ToolCallsInProcessCache`] entries, per the cross-request
    /// stitching window.
    pub fn in_process_cache_ttl() -> Duration {
        Duration::from_secs(60)
    }
}

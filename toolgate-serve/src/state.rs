//! Shared axum application state: the tool registry, the tool-call loop, and
//! the two caches it and the front-end need.

use std::sync::Arc;
use std::time::Duration;

use toolgate_config::Settings;
use toolgate_core::{ToolCallLoop, ToolCallsInProcessCache, ToolRegistry};

use crate::proxy_cache::{ChatProxyCache, CHAT_PROXY_CACHE_TTL};
use crate::upstream_client::ReqwestUpstreamClient;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ToolRegistry>,
    pub tool_call_loop: Arc<ToolCallLoop<ReqwestUpstreamClient>>,
    pub chat_proxy_cache: Arc<ChatProxyCache>,
    pub in_process_cache: Arc<ToolCallsInProcessCache>,
    pub http_client: reqwest::Client,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let registry = Arc::new(ToolRegistry::with_builtins(settings.worker_pool_size));
        let in_process_cache = Arc::new(ToolCallsInProcessCache::new(
            ToolCallLoop::<ReqwestUpstreamClient>::in_process_cache_ttl(),
        ));

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.upstream_timeout_secs))
            .build()
            .expect("building the upstream reqwest client failed");

        let upstream_client = Arc::new(ReqwestUpstreamClient::new(http_client.clone()));
        let tool_call_loop = Arc::new(ToolCallLoop::new(
            upstream_client,
            Arc::clone(&registry),
            Arc::clone(&in_process_cache),
            settings,
        ));

        Self {
            registry,
            tool_call_loop,
            chat_proxy_cache: Arc::new(ChatProxyCache::new(CHAT_PROXY_CACHE_TTL)),
            in_process_cache,
            http_client,
        }
    }
}

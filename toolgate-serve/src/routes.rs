//! Axum handlers: the two first-class JSON routes, a health check, and the
//! catch-all reverse proxy that drives the tool-call loop for chat
//! completions and streams everything else through untouched.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tokio::sync::OnceCell;

use toolgate_core::{Cache, ProxyOutcome, Residual, ToolCall, ToolCallResult, ToolDescriptor};

use crate::proxy_cache::fingerprint;
use crate::state::AppState;

const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

pub async fn tools_handler(State(state): State<AppState>) -> Json<Vec<ToolDescriptor>> {
    Json(state.registry.list_tools())
}

#[derive(Serialize)]
pub struct ToolCallsResponse {
    results: Vec<ToolCallResult>,
    unknown_tool_calls: Vec<ToolCall>,
}

pub async fn toolcalls_handler(
    State(state): State<AppState>,
    Json(calls): Json<Vec<ToolCall>>,
) -> Json<ToolCallsResponse> {
    let (known, unknown): (Vec<ToolCall>, Vec<ToolCall>) = calls
        .into_iter()
        .partition(|c| state.registry.contains(&c.function.name.clone().unwrap_or_default()));

    let submissions = known.into_iter().map(|call| {
        let registry = Arc::clone(&state.registry);
        async move { registry.submit(call).await }
    });
    let results = futures::future::join_all(submissions).await;

    Json(ToolCallsResponse {
        results,
        unknown_tool_calls: unknown,
    })
}

pub async fn healthz_handler() -> &'static str {
    "ok"
}

/// `ANY /{*path}`: detects chat-completions requests and drives the tool-call
/// loop for them; everything else is streamed through to `upstream_url`
/// untouched beyond the header filtering in §4.7.
pub async fn proxy_handler(State(state): State<AppState>, req: Request) -> Response {
    let (parts, body) = req.into_parts();
    let method = parts.method.clone();
    let upstream_url = decode_upstream_url(&parts.uri);

    let body = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(body) => body,
        Err(err) => return (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
    };

    let is_chat_completions =
        method == Method::POST && parts.uri.path().to_ascii_lowercase().ends_with("/v1/chat/completions");

    if is_chat_completions {
        handle_chat_completions(state, parts.headers, body, &upstream_url).await
    } else {
        handle_passthrough(state, method, parts.headers, body, &upstream_url).await
    }
}

fn decode_upstream_url(uri: &axum::http::Uri) -> String {
    let raw = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path())
        .trim_start_matches('/');
    percent_encoding::percent_decode_str(raw)
        .decode_utf8_lossy()
        .into_owned()
}

fn filter_request_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            let name = name.as_str();
            if matches!(name.to_ascii_lowercase().as_str(), "host" | "connection" | "content-length") {
                return None;
            }
            value.to_str().ok().map(|v| (name.to_string(), v.to_string()))
        })
        .collect()
}

/// §4.7: fingerprint, coalesce via `ChatProxyCache`, drive the tool-call loop,
/// register client-owned residuals into `ToolCallsInProcessCache`, evict the
/// fingerprint on non-2xx.
async fn handle_chat_completions(
    state: AppState,
    headers: HeaderMap,
    body: bytes::Bytes,
    upstream_url: &str,
) -> Response {
    let forward_headers = filter_request_headers(&headers);
    let key = fingerprint(&body);

    let cell = state
        .chat_proxy_cache
        .get_or_insert_with(key.clone(), None, || Arc::new(OnceCell::new()))
        .await;

    let outcome = cell
        .get_or_init(|| async { state.tool_call_loop.proxy_chat(upstream_url, forward_headers, &body).await })
        .await
        .clone();

    if let Some(residual) = &outcome.residual {
        for entry in residual {
            if let Residual::Pending(id) = entry {
                let _ = state.in_process_cache.put(id.clone(), residual.clone(), None).await;
            }
        }
    }

    if outcome.status != 200 {
        let _ = state.chat_proxy_cache.delete(&key).await;
    }

    build_response(outcome)
}

fn build_response(outcome: ProxyOutcome) -> Response {
    let has_content_type = outcome.headers.iter().any(|(k, _)| k.eq_ignore_ascii_case("content-type"));
    let mut builder = Response::builder().status(outcome.status);
    for (name, value) in &outcome.headers {
        builder = builder.header(name, value);
    }
    if !has_content_type {
        builder = builder.header(axum::http::header::CONTENT_TYPE, outcome.content_type);
    }
    builder.body(Body::from(outcome.body)).unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

/// Non-chat requests: stream-forward verbatim, stripping the same hop-by-hop
/// headers on the way back.
async fn handle_passthrough(
    state: AppState,
    method: Method,
    headers: HeaderMap,
    body: bytes::Bytes,
    upstream_url: &str,
) -> Response {
    let mut builder = state.http_client.request(method, upstream_url).body(body);
    for (name, value) in filter_request_headers(&headers) {
        builder = builder.header(name, value);
    }

    let upstream_response = match builder.send().await {
        Ok(resp) => resp,
        Err(err) => return (StatusCode::BAD_GATEWAY, err.to_string()).into_response(),
    };

    let status = upstream_response.status();
    let mut response_builder = Response::builder().status(status);
    for (name, value) in upstream_response.headers() {
        let name_str = name.as_str();
        if matches!(name_str.to_ascii_lowercase().as_str(), "connection" | "content-length") {
            continue;
        }
        response_builder = response_builder.header(name, value);
    }

    let stream = upstream_response.bytes_stream();
    response_builder
        .body(Body::from_stream(stream))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

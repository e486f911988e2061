//! Abstraction over the HTTP client that sends requests to `upstream_url`.
//!
//! Kept as a trait so this crate stays free of any particular HTTP client
//! dependency; `toolgate-serve` supplies the real `reqwest`-backed
//! implementation.

use async_trait::async_trait;
use thiserror::Error;

/// One upstream HTTP response, already fully buffered.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub content_type: String,
    pub body: String,
    pub headers: Vec<(String, String)>,
}

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream request failed: {0}")]
    Request(String),
}

/// Sends a POST request to `url` and buffers the full response before
/// returning, per the resource-cleanup policy in the concurrency model.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    async fn post(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: Vec<u8>,
    ) -> Result<UpstreamResponse, UpstreamError>;
}

//! The in-flight chat-proxy coalescing cache (§4.7) and its fingerprint key.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::OnceCell;
use toolgate_core::{ProxyOutcome, TtlCache};

/// Keyed by fingerprint; value is a handle shared by every concurrent request
/// with the same body bytes. The first arrival drives `proxy_chat` to
/// completion inside `get_or_init`; later arrivals just await the same cell.
pub type ChatProxyCache = TtlCache<String, Arc<OnceCell<ProxyOutcome>>>;

pub const CHAT_PROXY_CACHE_TTL: Duration = Duration::from_secs(300);

/// MD5 of the raw request body, hex-encoded — the coalescing key.
pub fn fingerprint(body: &[u8]) -> String {
    format!("{:x}", md5::compute(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_stable_and_content_sensitive() {
        assert_eq!(fingerprint(b"hello"), fingerprint(b"hello"));
        assert_ne!(fingerprint(b"hello"), fingerprint(b"world"));
    }
}

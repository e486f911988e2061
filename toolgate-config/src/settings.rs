//! Typed view over the process environment, read once after [`crate::load_and_apply`]
//! has had a chance to populate it from `.env` / XDG config.

use std::net::SocketAddr;

/// Runtime settings for the proxy, mirroring the original's `settings.py`
/// plus the bind/timeout/pool knobs this Rust service adds.
#[derive(Debug, Clone)]
pub struct Settings {
    pub log_level: String,
    pub fake_all_model: bool,
    pub no_fake_models: Vec<String>,
    pub web_search_engine: String,
    pub bind_addr: SocketAddr,
    pub upstream_timeout_secs: u64,
    pub worker_pool_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: "INFO".to_string(),
            fake_all_model: false,
            no_fake_models: Vec::new(),
            web_search_engine: "bing".to_string(),
            bind_addr: "0.0.0.0:8000".parse().unwrap(),
            upstream_timeout_secs: 600,
            worker_pool_size: 5,
        }
    }
}

impl Settings {
    /// Reads settings from the process environment, falling back to defaults for
    /// anything unset or unparsable. Never fails — a bad value just keeps the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            log_level: std::env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            fake_all_model: std::env::var("FAKE_ALL_MODEL")
                .ok()
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.fake_all_model),
            no_fake_models: std::env::var("NO_FAKE_MODELS")
                .ok()
                .map(|v| split_csv(&v))
                .unwrap_or(defaults.no_fake_models),
            web_search_engine: std::env::var("WEB_SEARCH_ENGINE").unwrap_or(defaults.web_search_engine),
            bind_addr: std::env::var("BIND_ADDR")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.bind_addr),
            upstream_timeout_secs: std::env::var("UPSTREAM_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.upstream_timeout_secs),
            worker_pool_size: std::env::var("WORKER_POOL_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.worker_pool_size),
        }
    }

    /// Returns true if the given model name should skip fake tool-calling rewriting.
    pub fn is_fake_disabled_for(&self, model: &str) -> bool {
        self.no_fake_models.iter().any(|m| m == model)
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn split_csv(v: &str) -> Vec<String> {
    v.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

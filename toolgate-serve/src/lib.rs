//! HTTP proxy front-end (axum) wiring `toolgate-core`'s tool-call loop to
//! the network.
//!
//! **Public API**: [`router`], [`AppState`].

pub mod proxy_cache;
mod routes;
pub mod state;
mod upstream_client;

use axum::routing::{any, get, post};
use axum::Router;

pub use state::AppState;

/// Builds the full router: `/tools`, `/toolcalls`, `/healthz`, and the
/// catch-all reverse proxy at every other path.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/tools", get(routes::tools_handler))
        .route("/toolcalls", post(routes::toolcalls_handler))
        .route("/healthz", get(routes::healthz_handler))
        .route("/*path", any(routes::proxy_handler))
        .with_state(state)
}

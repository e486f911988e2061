//! `toolgate-serve` binary: loads config, sets up logging, and serves the
//! proxy front-end.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use toolgate_config::Settings;
use toolgate_serve::{router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let _ = toolgate_config::load_and_apply("toolgate", None);
    let settings = Settings::from_env();

    let filter = EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .try_init();

    let bind_addr = settings.bind_addr;
    let state = AppState::new(settings);
    let app = router(state);

    tracing::info!(%bind_addr, "toolgate listening");
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use freshlens::api::{api_router, ApiContext};
use freshlens::config::{self, EstimatorConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Arc::new(EstimatorConfig::from_env());
    info!(
        version = config::APP_VERSION,
        remote_configured = config.remote_enabled(),
        model = %config.remote_model,
        "Starting {}",
        config::APP_NAME
    );
    if !config.remote_enabled() {
        info!("No remote endpoint configured; serving heuristic-only estimates");
    }

    let addr = config::bind_addr_from_env();
    let ctx = ApiContext::from_config(config);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Listening");
    axum::serve(listener, api_router(ctx)).await?;

    Ok(())
}

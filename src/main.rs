use std::net::SocketAddr;

use anyhow::Result;
use tracing::info;

use lead_gateway::{build_router, startup, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration (.env first, then the process environment)
    let config = Config::from_env()?;

    startup::init_tracing(&config);
    info!("Loaded configuration for environment: {}", config.environment);

    let metrics_handle = startup::install_metrics_recorder()?;
    info!("Prometheus metrics initialized");

    let app_state = startup::initialize_app(&config, Some(metrics_handle));
    let app = build_router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Starting lead gateway on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(startup::shutdown_signal())
        .await?;

    Ok(())
}

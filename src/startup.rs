//! Application startup and initialization logic.

use anyhow::Result;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::config::Config;

/// Install the global tracing subscriber. `json` selects the JSON formatter.
pub fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("lead_gateway={},tower_http=debug", config.log_level).into());

    if config.log_format.eq_ignore_ascii_case("json") {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Install the Prometheus recorder backing `GET /metrics`.
pub fn install_metrics_recorder() -> Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus recorder: {}", e))
}

/// Create the AppState and report what was configured.
pub fn initialize_app(config: &Config, metrics_handle: Option<PrometheusHandle>) -> AppState {
    let app_state = AppState::new(config.clone(), metrics_handle);

    info!(
        webhooks = app_state.registry.len(),
        fallback = %config.pipeline.fallback,
        "Webhook registry loaded"
    );
    for key in app_state.registry.keys() {
        if let Some(webhook) = app_state.registry.find(&key) {
            info!(webhook_key = %key, url = %webhook.url, enabled = webhook.enabled, "Webhook destination");
        }
    }

    if !config.pipeline.webhooks_enabled {
        warn!("Webhooks disabled (VITE_N8N_ENABLED=false), submissions will be skipped");
    }
    if config.pipeline.webhook_secret.is_none() && config.is_production() {
        warn!("VITE_WEBHOOK_SECRET not set, webhook payloads will be unsigned");
    }

    app_state
}

/// Wait for shutdown signal.
pub async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully");
        },
        _ = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully");
        },
    }
}

//! Router configuration module - v1 lead API.

use axum::{
    http::StatusCode,
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::app_state::AppState;
use crate::services::DispatchSettings;
use crate::handlers::{health, leads, metrics};
use crate::middleware::{metrics_middleware, request_logger_middleware};

/// Headroom over the slowest possible dispatch
const ROUTE_TIMEOUT_MARGIN_SECS: u64 = 5;

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(title = "Lead Gateway API", version = "0.1.0"),
    paths(
        health::health_check,
        metrics::get_prometheus_metrics,
        leads::submit_lead_by_key,
        leads::submit_lead_by_path,
        leads::resolve_webhook,
        leads::format_phone,
    ),
    components(schemas(
        health::HealthStatus,
        leads::LeadSubmissionResponse,
        leads::ResolveResponse,
        leads::PhoneFormatResponse,
        crate::error::ErrorResponse,
    )),
    tags(
        (name = "leads", description = "Lead form submission"),
        (name = "webhooks", description = "Webhook registry"),
        (name = "phone", description = "Phone mask"),
        (name = "health", description = "Service health"),
        (name = "metrics", description = "Prometheus metrics"),
    )
)]
pub struct ApiDoc;

/// Build the application router.
pub fn build_router(app_state: AppState) -> Router {
    let config = &app_state.config;
    let timeout = DispatchSettings::from(&config.pipeline)
        .worst_case_duration(Duration::from_secs(config.request_timeout))
        .saturating_add(Duration::from_secs(ROUTE_TIMEOUT_MARGIN_SECS));

    // Health check routes (always at root)
    let health = Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(metrics::get_prometheus_metrics));

    let v1_api = Router::new()
        .route("/leads", post(leads::submit_lead_by_path))
        .route("/leads/{key}", post(leads::submit_lead_by_key))
        .route("/webhooks/resolve", get(leads::resolve_webhook))
        .route("/phone/format", get(leads::format_phone));

    health
        .nest("/api/v1", v1_api)
        .merge(SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(request_logger_middleware))
                .layer(axum::middleware::from_fn(metrics_middleware))
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout))
                .layer(CorsLayer::permissive()),
        )
        .with_state(app_state)
}

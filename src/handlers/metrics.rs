// Metrics endpoint for Prometheus

use crate::{app_state::AppState, error::ApiError, error::ErrorCode};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::Response,
};

/// Prometheus metrics endpoint
///
/// # Errors
///
/// Returns an error if no Prometheus recorder was installed at startup
#[utoipa::path(
    get,
    path = "/metrics",
    tag = "metrics",
    summary = "Prometheus metrics",
    responses(
        (status = 200, description = "Prometheus metrics", content_type = "text/plain"),
        (status = 500, description = "Metrics recorder not installed")
    )
)]
pub async fn get_prometheus_metrics(State(state): State<AppState>) -> Result<Response, ApiError> {
    let handle = state.metrics_handle.as_ref().ok_or_else(|| {
        ApiError::with_code(
            ErrorCode::ConfigurationError,
            "Metrics recorder not installed",
        )
    })?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; version=0.0.4")
        .body(handle.render().into())
        .map_err(|_| ApiError::Internal("Failed to create response".to_string()))
}

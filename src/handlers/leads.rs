//! Lead submission endpoints.
//!
//! Each request runs a fresh form controller for the resolved registry
//! entry, so the HTTP surface follows the same state machine a landing
//! page form does.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header::SET_COOKIE, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::Url;
use utoipa::{IntoParams, ToSchema};

use crate::app_state::AppState;
use crate::error::ApiError;
use crate::handlers::response::ApiResponse;
use crate::models::{ClientContext, LeadFormData, LeadRecord, SubmissionResult, WebhookConfig};
use crate::services::{lead_store::cookies_for, phone_formatter, FormController, FormStatus, WebhookRegistry};
use crate::utils::{extract_ip_address, extract_language, extract_referer, extract_user_agent};

/// Lead form body: the form fields plus optional page context
#[derive(Debug, Deserialize, ToSchema)]
pub struct LeadSubmissionRequest {
    /// Page the form was submitted from; falls back to the Referer header
    #[serde(default)]
    pub page_url: Option<String>,
    #[serde(default)]
    pub referrer: Option<String>,
    #[serde(flatten)]
    pub form: LeadFormData,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LeadSubmissionResponse {
    pub webhook_key: String,
    pub state: FormStatus,
    /// Absent when the webhook call was detached behind a checkout redirect
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<SubmissionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ResolveQuery {
    /// Page path, e.g. `/bootcamp/ai-data-engineer`
    pub path: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ResolveResponse {
    pub key: String,
    /// True when the path resolved to the newsletter fallback
    pub fallback: bool,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct PhoneFormatQuery {
    pub raw: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PhoneFormatResponse {
    pub formatted: String,
    pub digits: String,
}

/// Submit a lead to an explicit registry key
#[utoipa::path(
    post,
    path = "/api/v1/leads/{key}",
    tag = "leads",
    params(("key" = String, Path, description = "Registry key, e.g. `community`")),
    responses(
        (status = 200, description = "Lead accepted", body = LeadSubmissionResponse),
        (status = 400, description = "Validation failed, nothing was sent"),
        (status = 502, description = "Webhook failed under the block policy")
    )
)]
pub async fn submit_lead_by_key(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<LeadSubmissionRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    let config = state.registry.lookup(&key);

    run_submission(&state, config, request, &headers).await
}

/// Submit a lead, deriving the registry key from the page URL
#[utoipa::path(
    post,
    path = "/api/v1/leads",
    tag = "leads",
    responses(
        (status = 200, description = "Lead accepted", body = LeadSubmissionResponse),
        (status = 400, description = "Validation failed, nothing was sent"),
        (status = 502, description = "Webhook failed under the block policy")
    )
)]
pub async fn submit_lead_by_path(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<LeadSubmissionRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;

    let page_url = request
        .page_url
        .clone()
        .or_else(|| extract_referer(&headers))
        .unwrap_or_default();
    let path = page_path(&page_url);
    let config = if path.is_empty() {
        state.registry.fallback()
    } else {
        state.registry.lookup_by_path(&path)
    };

    run_submission(&state, config, request, &headers).await
}

/// Which registry entry a page path resolves to
#[utoipa::path(
    get,
    path = "/api/v1/webhooks/resolve",
    tag = "webhooks",
    params(ResolveQuery),
    responses((status = 200, description = "Resolved registry key", body = ResolveResponse))
)]
pub async fn resolve_webhook(
    State(state): State<AppState>,
    Query(query): Query<ResolveQuery>,
) -> Json<ApiResponse<ResolveResponse>> {
    let fallback = WebhookRegistry::key_for_path(&query.path)
        .and_then(|key| state.registry.find(&key))
        .is_none();
    let key = state.registry.lookup_by_path(&query.path).key.clone();

    Json(ApiResponse::success(ResolveResponse { key, fallback }))
}

/// Apply the phone mask to a raw value
#[utoipa::path(
    get,
    path = "/api/v1/phone/format",
    tag = "phone",
    params(PhoneFormatQuery),
    responses((status = 200, description = "Masked phone number", body = PhoneFormatResponse))
)]
pub async fn format_phone(Query(query): Query<PhoneFormatQuery>) -> Json<ApiResponse<PhoneFormatResponse>> {
    Json(ApiResponse::success(PhoneFormatResponse {
        formatted: phone_formatter::format(&query.raw),
        digits: phone_formatter::digits(&query.raw),
    }))
}

async fn run_submission(
    state: &AppState,
    config: Arc<WebhookConfig>,
    request: LeadSubmissionRequest,
    headers: &HeaderMap,
) -> Result<Response, ApiError> {
    let referer = extract_referer(headers);
    let context = ClientContext {
        page_url: request
            .page_url
            .or_else(|| referer.clone())
            .unwrap_or_default(),
        user_agent: extract_user_agent(headers).unwrap_or_default(),
        language: extract_language(headers).unwrap_or_default(),
        referrer: request.referrer.or(referer).unwrap_or_default(),
    };
    let webhook_key = config.key.clone();

    info!(
        webhook_key = %webhook_key,
        page_url = %context.page_url,
        client_ip = %extract_ip_address(headers).unwrap_or_default(),
        "Lead submission received"
    );

    let mut controller = FormController::new(
        config,
        state.enricher,
        state.dispatcher.clone(),
        context,
        state.success_display(),
    );
    for (field, value) in request.form.fields() {
        controller.set_field(field, value);
    }

    let outcome = controller.submit().await?;

    if outcome.status == FormStatus::Error {
        let message = outcome
            .result
            .and_then(|r| r.error)
            .unwrap_or_else(|| "Webhook delivery failed".to_string());
        return Err(ApiError::ExternalService(message));
    }

    let cookies = outcome
        .result
        .as_ref()
        .and_then(|r| r.data.as_ref())
        .map(|data| cookies_for(&LeadRecord::from_payload(data)))
        .unwrap_or_default();

    let body = ApiResponse::success(LeadSubmissionResponse {
        webhook_key,
        state: outcome.status,
        result: outcome.result,
        redirect_url: outcome.redirect_url,
    });

    let mut response = body.into_response();
    for cookie in cookies {
        match HeaderValue::from_str(&cookie.to_header_value()) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => warn!(cookie = %cookie.name, error = %e, "Skipping unencodable cookie"),
        }
    }

    Ok(response)
}

/// Path component of a page URL; bare paths are passed through
fn page_path(page_url: &str) -> String {
    match Url::parse(page_url) {
        Ok(url) => url.path().to_string(),
        Err(_) => page_url.to_string(),
    }
}

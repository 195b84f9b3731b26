//! Webhook dispatch.
//!
//! One POST per attempt, signed when a secret is configured. Failures are
//! folded into a `SubmissionResult` according to the entry's fallback policy.

use hmac::{Hmac, Mac};
use metrics::{counter, histogram};
use reqwest::{header::CONTENT_TYPE, Client};
use sha2::Sha256;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::PipelineConfig;
use crate::constants::webhooks::{INITIAL_BACKOFF_MS, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use crate::error::{PipelineError, ValidationErrors};
use crate::models::{EnrichedPayload, FallbackPolicy, LeadRecord, SubmissionResult, WebhookConfig};
use crate::services::lead_store::AnalyticsSink;

/// Shown to the user when dispatch errors are hidden
const GENERIC_FAILURE: &str = "We could not confirm your registration";

/// Dispatcher behaviour derived from the pipeline flags
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub log_errors: bool,
    pub show_errors: bool,
    pub track_events: bool,
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub webhook_secret: Option<String>,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self::from(&PipelineConfig::default())
    }
}

impl DispatchSettings {
    /// Attempts made under the `retry` policy
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    /// Longest a single `dispatch` can take: every attempt timing out plus
    /// the doubling sleeps between them.
    pub fn worst_case_duration(&self, request_timeout: Duration) -> Duration {
        let attempts = self.max_attempts();
        let backoff_units = 2u32
            .checked_pow(attempts - 1)
            .map(|n| n - 1)
            .unwrap_or(u32::MAX);

        request_timeout
            .saturating_mul(attempts)
            .saturating_add(self.initial_backoff.saturating_mul(backoff_units))
    }
}

impl From<&PipelineConfig> for DispatchSettings {
    fn from(pipeline: &PipelineConfig) -> Self {
        Self {
            log_errors: pipeline.log_errors,
            show_errors: pipeline.show_errors,
            track_events: pipeline.track_events,
            max_retries: pipeline.max_retries,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
            webhook_secret: pipeline.webhook_secret.clone(),
        }
    }
}

/// Submission Dispatcher
///
/// POSTs enriched payloads to webhooks and applies the fallback policy.
/// Confirmed leads are mirrored into the analytics sink.
#[derive(Clone)]
pub struct SubmissionDispatcher {
    client: Client,
    sink: Arc<dyn AnalyticsSink>,
    settings: DispatchSettings,
}

impl SubmissionDispatcher {
    pub fn new(timeout: Duration, settings: DispatchSettings, sink: Arc<dyn AnalyticsSink>) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            client,
            sink,
            settings,
        }
    }

    /// Send one payload and report the outcome.
    ///
    /// Only a payload missing a required field is an `Err`; transport
    /// failures are folded into the result according to `config.fallback`.
    pub async fn dispatch(
        &self,
        payload: &EnrichedPayload,
        config: &WebhookConfig,
    ) -> Result<SubmissionResult, PipelineError> {
        ensure_required(payload, config).map_err(PipelineError::Validation)?;

        if !config.enabled {
            info!(webhook_key = %config.key, "Webhooks disabled, skipping dispatch");
            counter!("lead_submissions_total", "webhook" => config.key.clone(), "outcome" => "skipped")
                .increment(1);
            return Ok(SubmissionResult::skipped());
        }

        let max_attempts = match config.fallback {
            FallbackPolicy::Retry => self.settings.max_attempts(),
            _ => 1,
        };

        let started = Instant::now();
        let mut attempts = 0;
        let mut backoff = self.settings.initial_backoff;

        let outcome = loop {
            attempts += 1;
            match self.send_once(payload, config).await {
                Ok(()) => break Ok(()),
                Err(e) => {
                    if self.settings.log_errors {
                        warn!(
                            webhook_key = %config.key,
                            attempt = attempts,
                            error = %e,
                            "Webhook delivery failed"
                        );
                    } else {
                        debug!(webhook_key = %config.key, attempt = attempts, error = %e, "Webhook delivery failed");
                    }

                    if attempts >= max_attempts {
                        break Err(e);
                    }
                }
            }

            tokio::time::sleep(backoff).await;
            backoff *= 2;
        };

        histogram!("webhook_dispatch_duration_seconds", "webhook" => config.key.clone())
            .record(started.elapsed().as_secs_f64());

        match outcome {
            Ok(()) => {
                info!(webhook_key = %config.key, attempts, "Lead delivered to webhook");
                counter!("lead_submissions_total", "webhook" => config.key.clone(), "outcome" => "delivered")
                    .increment(1);

                self.sink.record(&LeadRecord::from_payload(payload));
                self.track_event(payload, config);

                Ok(SubmissionResult::delivered(payload.clone()))
            }
            Err(e) => {
                let message = if self.settings.show_errors {
                    e.to_string()
                } else {
                    GENERIC_FAILURE.to_string()
                };

                match config.fallback {
                    FallbackPolicy::Block => {
                        if self.settings.log_errors {
                            error!(webhook_key = %config.key, attempts, error = %e, "Webhook delivery failed, blocking submission");
                        }
                        counter!("lead_submissions_total", "webhook" => config.key.clone(), "outcome" => "blocked")
                            .increment(1);
                        Ok(SubmissionResult::failed(message))
                    }
                    FallbackPolicy::Continue | FallbackPolicy::Retry => {
                        counter!("lead_submissions_total", "webhook" => config.key.clone(), "outcome" => "degraded")
                            .increment(1);
                        Ok(SubmissionResult::degraded(message))
                    }
                }
            }
        }
    }

    /// Run `dispatch` on its own task. The handle can be awaited, detached
    /// or aborted.
    pub fn spawn(&self, payload: EnrichedPayload, config: Arc<WebhookConfig>) -> DispatchHandle {
        let (tx, rx) = oneshot::channel();
        let dispatcher = self.clone();

        let task = tokio::spawn(async move {
            let result = dispatcher.dispatch(&payload, &config).await;
            // receiver gone means the caller detached
            let _ = tx.send(result);
        });

        DispatchHandle { rx, task }
    }

    async fn send_once(
        &self,
        payload: &EnrichedPayload,
        config: &WebhookConfig,
    ) -> Result<(), PipelineError> {
        let body = serde_json::to_vec(payload).map_err(|e| PipelineError::Transport(e.to_string()))?;

        let mut request = self
            .client
            .post(&config.url)
            .header(CONTENT_TYPE, "application/json");

        if let Some(secret) = &self.settings.webhook_secret {
            let timestamp = chrono::Utc::now().timestamp().to_string();
            match sign_body(secret, &timestamp, &body) {
                Some(signature) => {
                    request = request
                        .header(SIGNATURE_HEADER, format!("sha256={}", signature))
                        .header(TIMESTAMP_HEADER, timestamp);
                }
                None => warn!(webhook_key = %config.key, "Could not sign webhook payload"),
            }
        }

        let response = request
            .body(body)
            .send()
            .await
            .map_err(|e| PipelineError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!(webhook_key = %config.key, status = %status, "Webhook accepted payload");
            Ok(())
        } else {
            Err(PipelineError::UnexpectedStatus(status.as_u16()))
        }
    }

    fn track_event(&self, payload: &EnrichedPayload, config: &WebhookConfig) {
        if !self.settings.track_events {
            return;
        }

        info!(
            target: "analytics",
            event = "lead_submitted",
            webhook_key = %config.key,
            utm_source = payload.get("utm_source").unwrap_or_default(),
            utm_medium = payload.get("utm_medium").unwrap_or_default(),
            utm_campaign = payload.get("utm_campaign").unwrap_or_default(),
            "Lead submitted"
        );
    }
}

/// One-shot dispatch running on a tokio task
pub struct DispatchHandle {
    rx: oneshot::Receiver<Result<SubmissionResult, PipelineError>>,
    task: JoinHandle<()>,
}

impl DispatchHandle {
    /// Wait for the outcome; an aborted task yields `Cancelled`
    pub async fn wait(self) -> Result<SubmissionResult, PipelineError> {
        self.rx.await.unwrap_or(Err(PipelineError::Cancelled))
    }

    /// Let the request finish in the background without observing it
    pub fn detach(self) {
        drop(self.rx);
    }

    pub fn abort(&self) {
        self.task.abort();
    }
}

/// Every required field must be present and non-blank
pub fn ensure_required(payload: &EnrichedPayload, config: &WebhookConfig) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    for field in &config.required_fields {
        if payload.get(field).map(|v| v.trim().is_empty()).unwrap_or(true) {
            errors.push(field, format!("{} is required", field));
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// HMAC-SHA256 over `timestamp.body`, hex encoded
fn sign_body(secret: &str, timestamp: &str, body: &[u8]) -> Option<String> {
    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;

    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(body);

    Some(hex::encode(mac.finalize().into_bytes()))
}

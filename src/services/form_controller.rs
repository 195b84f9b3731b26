//! Form Controller
//!
//! Per-form state machine: `Idle -> Submitting -> Success | Error`, with
//! `Success` returning to `Idle` once its display time has elapsed.
//! Only an explicit `block` failure ends in `Error`; every other dispatch
//! outcome is shown to the user as a success.

use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use crate::error::{PipelineError, ValidationErrors};
use crate::models::{ClientContext, LeadFormData, SubmissionResult, WebhookConfig};
use crate::services::checkout::build_checkout_url;
use crate::services::enricher::SubmissionEnricher;
use crate::services::phone_formatter;
use crate::services::validation::validate_lead;
use crate::services::webhook_service::SubmissionDispatcher;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormState {
    Idle,
    Submitting,
    Success {
        since: Instant,
        redirect_url: Option<String>,
    },
    Error {
        message: String,
    },
}

/// Serializable view of `FormState`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FormStatus {
    Idle,
    Submitting,
    Success,
    Error,
}

impl FormState {
    pub fn status(&self) -> FormStatus {
        match self {
            FormState::Idle => FormStatus::Idle,
            FormState::Submitting => FormStatus::Submitting,
            FormState::Success { .. } => FormStatus::Success,
            FormState::Error { .. } => FormStatus::Error,
        }
    }
}

/// What one `submit` call produced
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOutcome {
    pub status: FormStatus,
    /// `None` when the dispatch was detached behind a checkout redirect
    pub result: Option<SubmissionResult>,
    pub redirect_url: Option<String>,
}

pub struct FormController {
    config: Arc<WebhookConfig>,
    enricher: SubmissionEnricher,
    dispatcher: SubmissionDispatcher,
    context: ClientContext,
    form: LeadFormData,
    field_errors: ValidationErrors,
    state: FormState,
    modal_open: bool,
    success_display: Duration,
}

impl FormController {
    pub fn new(
        config: Arc<WebhookConfig>,
        enricher: SubmissionEnricher,
        dispatcher: SubmissionDispatcher,
        context: ClientContext,
        success_display: Duration,
    ) -> Self {
        Self {
            config,
            enricher,
            dispatcher,
            context,
            form: LeadFormData::default(),
            field_errors: ValidationErrors::default(),
            state: FormState::Idle,
            modal_open: false,
            success_display,
        }
    }

    pub fn config(&self) -> &WebhookConfig {
        &self.config
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn form(&self) -> &LeadFormData {
        &self.form
    }

    pub fn field_errors(&self) -> &ValidationErrors {
        &self.field_errors
    }

    pub fn is_modal_open(&self) -> bool {
        self.modal_open
    }

    /// Record one field edit. The phone field is masked as it is typed.
    pub fn set_field(&mut self, field: &str, value: &str) {
        let value = if field == "phone" {
            phone_formatter::format(value)
        } else {
            value.to_string()
        };

        self.form.set(field, value);
        self.field_errors.0.retain(|e| e.field != field);
    }

    pub fn open_modal(&mut self) {
        self.modal_open = true;
    }

    /// Closing the modal never cancels an in-flight dispatch
    pub fn close_modal(&mut self) {
        self.modal_open = false;
    }

    /// Validate, enrich and dispatch the current form.
    ///
    /// Validation failures leave the controller in `Idle` with field errors
    /// and never touch the network.
    pub async fn submit(&mut self) -> Result<SubmitOutcome, PipelineError> {
        if self.state == FormState::Submitting {
            return Err(PipelineError::AlreadySubmitting);
        }

        self.field_errors = ValidationErrors::default();
        if let Err(errors) = validate_lead(&self.form, &self.config) {
            debug!(webhook_key = %self.config.key, fields = %errors, "Lead failed validation");
            counter!("lead_validation_failures_total", "webhook" => self.config.key.clone())
                .increment(1);

            self.field_errors = errors.clone();
            self.state = FormState::Idle;
            return Err(PipelineError::Validation(errors));
        }

        self.state = FormState::Submitting;

        let payload = self.enricher.enrich(&self.form, &self.config, &self.context);
        let redirect_url = self.redirect_url();
        let gating = self
            .config
            .checkout
            .as_ref()
            .map(|c| c.await_webhook)
            .unwrap_or(true);

        let result = if gating {
            match self.dispatcher.dispatch(&payload, &self.config).await {
                Ok(result) => Some(result),
                Err(e) => {
                    self.state = FormState::Idle;
                    return Err(e);
                }
            }
        } else {
            info!(webhook_key = %self.config.key, "Redirecting without waiting for webhook");
            self.dispatcher
                .spawn(payload, self.config.clone())
                .detach();
            None
        };

        if let Some(failed) = result.as_ref().filter(|r| !r.success) {
            let message = failed.error.clone().unwrap_or_default();
            self.state = FormState::Error { message };
            return Ok(SubmitOutcome {
                status: FormStatus::Error,
                result,
                redirect_url: None,
            });
        }

        self.form.clear();
        self.modal_open = false;
        self.state = FormState::Success {
            since: Instant::now(),
            redirect_url: redirect_url.clone(),
        };

        Ok(SubmitOutcome {
            status: FormStatus::Success,
            result,
            redirect_url,
        })
    }

    /// Advance timers. Returns true when `Success` expired back to `Idle`.
    pub fn tick(&mut self, now: Instant) -> bool {
        match &self.state {
            FormState::Success { since, .. }
                if now.saturating_duration_since(*since) >= self.success_display =>
            {
                self.state = FormState::Idle;
                self.modal_open = false;
                true
            }
            _ => false,
        }
    }

    /// Acknowledge an error so the form can be submitted again
    pub fn dismiss_error(&mut self) {
        if matches!(self.state, FormState::Error { .. }) {
            self.state = FormState::Idle;
        }
    }

    /// Force the controller back to `Idle`, e.g. after a dropped submit future
    pub fn reset(&mut self) {
        self.state = FormState::Idle;
        self.field_errors = ValidationErrors::default();
    }

    fn redirect_url(&self) -> Option<String> {
        let checkout = self.config.checkout.as_ref()?;
        let utm = self.enricher.utm(&self.context);

        match build_checkout_url(&checkout.base_url, &self.form, &utm, &checkout.phone_param) {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(
                    webhook_key = %self.config.key,
                    base_url = %checkout.base_url,
                    error = %e,
                    "Invalid checkout URL, skipping redirect"
                );
                None
            }
        }
    }
}

//! Application state shared across all handlers.

use std::sync::Arc;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusHandle;

use crate::config::Config;
use crate::services::{
    AnalyticsSink, DispatchSettings, LeadDataStore, SubmissionDispatcher, SubmissionEnricher,
    WebhookRegistry,
};

/// Application state shared across handlers.
///
/// Everything here is built once at startup and read-only afterwards.
/// Confirmed leads are mirrored into a `LeadDataStore` owned by the
/// dispatcher.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Config,
    /// Webhook destinations by page key
    pub registry: WebhookRegistry,
    pub dispatcher: SubmissionDispatcher,
    pub enricher: SubmissionEnricher,
    /// Prometheus render handle, absent when no recorder was installed
    pub metrics_handle: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(config: Config, metrics_handle: Option<PrometheusHandle>) -> Self {
        let sink: Arc<dyn AnalyticsSink> = Arc::new(LeadDataStore::new());

        let dispatcher = SubmissionDispatcher::new(
            Duration::from_secs(config.request_timeout),
            DispatchSettings::from(&config.pipeline),
            sink,
        );

        Self {
            registry: WebhookRegistry::new(config.webhooks.clone()),
            enricher: SubmissionEnricher::new(&config.pipeline),
            dispatcher,
            metrics_handle,
            config,
        }
    }

    /// How long a form stays in `Success`
    pub fn success_display(&self) -> Duration {
        Duration::from_millis(self.config.pipeline.success_display_ms)
    }
}

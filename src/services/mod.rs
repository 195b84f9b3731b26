// Lead submission pipeline
// Registry lookup, enrichment, dispatch and the per-form state machine

pub mod checkout;
pub mod enricher;
pub mod form_controller;
pub mod lead_store;
pub mod phone_formatter;
pub mod validation;
pub mod webhook_registry;
pub mod webhook_service;

pub use checkout::build_checkout_url;
pub use enricher::{SubmissionEnricher, UtmParams};
pub use form_controller::{FormController, FormState, FormStatus, SubmitOutcome};
pub use lead_store::{noop_sink, AnalyticsSink, CaptureSink, LeadCookie, LeadDataStore, NoopSink};
pub use validation::validate_lead;
pub use webhook_registry::WebhookRegistry;
pub use webhook_service::{DispatchHandle, DispatchSettings, SubmissionDispatcher};

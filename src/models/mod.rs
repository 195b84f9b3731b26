// Data models and DTOs shared by the pipeline and the HTTP layer

pub mod lead;
pub mod webhook;

pub use lead::{ClientContext, EnrichedPayload, LeadFormData, LeadRecord, SubmissionResult};
pub use webhook::{CheckoutConfig, FallbackPolicy, WebhookConfig};

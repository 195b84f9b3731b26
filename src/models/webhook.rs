//! Webhook Models
//!
//! Per-page destination configuration held by the webhook registry.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// What the dispatcher does when the webhook call fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Log the failure and let the user proceed as if it succeeded
    #[default]
    Continue,
    /// Surface the failure and halt the flow
    Block,
    /// Re-attempt with backoff, then behave like `Continue`
    Retry,
}

impl std::fmt::Display for FallbackPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FallbackPolicy::Continue => write!(f, "continue"),
            FallbackPolicy::Block => write!(f, "block"),
            FallbackPolicy::Retry => write!(f, "retry"),
        }
    }
}

impl FromStr for FallbackPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "continue" => Ok(FallbackPolicy::Continue),
            "block" => Ok(FallbackPolicy::Block),
            "retry" => Ok(FallbackPolicy::Retry),
            other => Err(format!("unknown fallback policy '{}'", other)),
        }
    }
}

/// Payment checkout reached after a successful submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CheckoutConfig {
    /// Checkout link the query string is appended to
    pub base_url: String,
    /// Query parameter carrying the local phone number (`celular`, `phone` or `cellphone`)
    pub phone_param: String,
    /// Whether the redirect waits for the webhook call to settle
    pub await_webhook: bool,
}

/// Destination for one page or category of lead forms.
///
/// Built once at startup from static defaults and environment overrides,
/// then shared read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WebhookConfig {
    /// Registry key (`community`, `bootcamps.ai-data-engineer`, ...)
    pub key: String,
    pub url: String,
    /// Fields that must be non-empty before any network call
    pub required_fields: Vec<String>,
    /// Fixed values attached to every submission
    pub metadata: BTreeMap<String, String>,
    /// When false the dispatcher skips the network call entirely
    pub enabled: bool,
    pub fallback: FallbackPolicy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout: Option<CheckoutConfig>,
}

impl WebhookConfig {
    pub fn new(key: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            url: url.into(),
            required_fields: Vec::new(),
            metadata: BTreeMap::new(),
            enabled: true,
            fallback: FallbackPolicy::default(),
            checkout: None,
        }
    }

    pub fn with_required(mut self, fields: &[&str]) -> Self {
        for field in fields {
            if !self.required_fields.iter().any(|f| f == field) {
                self.required_fields.push(field.to_string());
            }
        }
        self
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_checkout(mut self, checkout: CheckoutConfig) -> Self {
        self.checkout = Some(checkout);
        self
    }
}

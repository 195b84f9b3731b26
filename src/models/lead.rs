//! Lead Models
//!
//! Form data collected on landing pages, the enriched payload sent to
//! webhooks and the per-attempt submission result.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lead form state, one per form instance.
///
/// `name`, `email` and `phone` are always present (possibly empty); any
/// page-specific field lands in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LeadFormData {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl LeadFormData {
    pub fn new(name: &str, email: &str, phone: &str) -> Self {
        Self {
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            extra: BTreeMap::new(),
        }
    }

    /// Value of a field by name, `None` when the field was never set
    pub fn get(&self, field: &str) -> Option<&str> {
        match field {
            "name" => Some(self.name.as_str()),
            "email" => Some(self.email.as_str()),
            "phone" => Some(self.phone.as_str()),
            other => self.extra.get(other).map(String::as_str),
        }
    }

    pub fn set(&mut self, field: &str, value: impl Into<String>) {
        let value = value.into();
        match field {
            "name" => self.name = value,
            "email" => self.email = value,
            "phone" => self.phone = value,
            other => {
                self.extra.insert(other.to_string(), value);
            }
        }
    }

    /// Reset every field to an empty string, keeping page-specific keys
    pub fn clear(&mut self) {
        self.name.clear();
        self.email.clear();
        self.phone.clear();
        for value in self.extra.values_mut() {
            value.clear();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
            && self.email.is_empty()
            && self.phone.is_empty()
            && self.extra.values().all(String::is_empty)
    }

    /// All fields as `(name, value)` pairs, fixed fields first
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        [
            ("name", self.name.as_str()),
            ("email", self.email.as_str()),
            ("phone", self.phone.as_str()),
        ]
        .into_iter()
        .chain(self.extra.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }
}

/// Flat string map POSTed to the webhook.
///
/// Later inserts win on key collisions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct EnrichedPayload(pub BTreeMap<String, String>);

impl EnrichedPayload {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Outcome of one dispatch attempt, consumed by the form controller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SubmissionResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<EnrichedPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub skipped: bool,
}

impl SubmissionResult {
    pub fn delivered(payload: EnrichedPayload) -> Self {
        Self {
            success: true,
            data: Some(payload),
            error: None,
            skipped: false,
        }
    }

    pub fn skipped() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
            skipped: true,
        }
    }

    /// Failed call that the fallback policy lets through
    pub fn degraded(error: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            error: Some(error.into()),
            skipped: false,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            skipped: false,
        }
    }

    /// True only when the webhook confirmed receipt
    pub fn is_delivered(&self) -> bool {
        self.success && self.data.is_some()
    }
}

/// Subset of a lead mirrored for analytics consumers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LeadRecord {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl LeadRecord {
    pub fn from_payload(payload: &EnrichedPayload) -> Self {
        Self {
            name: payload.get("name").unwrap_or_default().to_string(),
            email: payload.get("email").unwrap_or_default().to_string(),
            phone: payload.get("phone").unwrap_or_default().to_string(),
        }
    }
}

/// Browser-side context captured alongside a submission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientContext {
    /// Full URL of the page the form lives on, query string included
    pub page_url: String,
    pub user_agent: String,
    pub language: String,
    pub referrer: String,
}

//! Submission Enricher
//!
//! Builds the outbound webhook payload from the form, the registry entry's
//! fixed metadata, the browser context and the page's UTM parameters.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::PipelineConfig;
use crate::constants::enrichment::{DEFAULT_REFERRER, DEFAULT_UTM_MEDIUM, DEFAULT_UTM_SOURCE};
use crate::models::{ClientContext, EnrichedPayload, LeadFormData, WebhookConfig};

/// UTM parameters with their defaults already applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtmParams {
    pub source: String,
    pub medium: String,
    pub campaign: String,
    pub term: String,
    pub content: String,
}

impl Default for UtmParams {
    fn default() -> Self {
        Self {
            source: DEFAULT_UTM_SOURCE.to_string(),
            medium: DEFAULT_UTM_MEDIUM.to_string(),
            campaign: String::new(),
            term: String::new(),
            content: String::new(),
        }
    }
}

impl UtmParams {
    /// Parse from a full page URL. Unparseable URLs and empty values give
    /// the defaults.
    pub fn from_page_url(page_url: &str) -> Self {
        let mut utm = Self::default();
        let Ok(url) = Url::parse(page_url) else {
            return utm;
        };

        for (key, value) in url.query_pairs() {
            if value.is_empty() {
                continue;
            }
            let value = value.into_owned();
            match key.as_ref() {
                "utm_source" => utm.source = value,
                "utm_medium" => utm.medium = value,
                "utm_campaign" => utm.campaign = value,
                "utm_term" => utm.term = value,
                "utm_content" => utm.content = value,
                _ => {}
            }
        }
        utm
    }

    fn pairs(&self) -> [(&'static str, &str); 5] {
        [
            ("utm_source", self.source.as_str()),
            ("utm_medium", self.medium.as_str()),
            ("utm_campaign", self.campaign.as_str()),
            ("utm_term", self.term.as_str()),
            ("utm_content", self.content.as_str()),
        ]
    }
}

/// Which optional context the enricher is allowed to collect
#[derive(Debug, Clone, Copy)]
pub struct SubmissionEnricher {
    track_utm: bool,
    track_device: bool,
}

impl Default for SubmissionEnricher {
    fn default() -> Self {
        Self {
            track_utm: true,
            track_device: true,
        }
    }
}

impl SubmissionEnricher {
    pub fn new(pipeline: &PipelineConfig) -> Self {
        Self {
            track_utm: pipeline.track_utm,
            track_device: pipeline.track_device,
        }
    }

    pub fn utm(&self, context: &ClientContext) -> UtmParams {
        if self.track_utm {
            UtmParams::from_page_url(&context.page_url)
        } else {
            UtmParams::default()
        }
    }

    /// Enrich against the current clock
    pub fn enrich(
        &self,
        form: &LeadFormData,
        config: &WebhookConfig,
        context: &ClientContext,
    ) -> EnrichedPayload {
        self.enrich_at(form, config, context, Utc::now())
    }

    /// Enrich with an explicit timestamp. Pure: equal inputs give equal payloads.
    pub fn enrich_at(
        &self,
        form: &LeadFormData,
        config: &WebhookConfig,
        context: &ClientContext,
        now: DateTime<Utc>,
    ) -> EnrichedPayload {
        let mut payload = EnrichedPayload::new();

        for (field, value) in form.fields() {
            payload.insert(field, value.trim());
        }

        for (key, value) in &config.metadata {
            payload.insert(key.as_str(), value.as_str());
        }

        payload.insert("timestamp", now.to_rfc3339_opts(SecondsFormat::Millis, false));
        payload.insert("page_url", context.page_url.as_str());

        let (user_agent, language) = if self.track_device {
            (context.user_agent.as_str(), context.language.as_str())
        } else {
            ("", "")
        };
        payload.insert("user_agent", user_agent);
        payload.insert("language", language);

        let referrer = context.referrer.trim();
        payload.insert(
            "referrer",
            if referrer.is_empty() { DEFAULT_REFERRER } else { referrer },
        );

        for (key, value) in self.utm(context).pairs() {
            payload.insert(key, value);
        }

        payload
    }
}

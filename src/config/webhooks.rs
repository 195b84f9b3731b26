//! Static webhook registry definitions and their environment overrides.

use tracing::debug;

use super::PipelineConfig;
use crate::constants::{phone, webhooks};
use crate::models::{CheckoutConfig, WebhookConfig};

/// Checkout link attached to a sales page
#[derive(Debug, Clone, Copy)]
pub struct CheckoutDefinition {
    pub default_url: &'static str,
    /// Variable overriding `default_url`
    pub env_var: &'static str,
    pub phone_param: &'static str,
    pub await_webhook: bool,
}

/// One registry entry before environment resolution
#[derive(Debug, Clone, Copy)]
pub struct WebhookDefinition {
    pub key: &'static str,
    /// Specific URL override, checked before the shared one
    pub env_var: &'static str,
    /// Path segment under the default webhook base
    pub slug: &'static str,
    pub required_fields: &'static [&'static str],
    pub metadata: &'static [(&'static str, &'static str)],
    pub checkout: Option<CheckoutDefinition>,
}

const LEAD_FIELDS: &[&str] = &["name", "email", "phone"];

pub const WEBHOOK_DEFINITIONS: &[WebhookDefinition] = &[
    WebhookDefinition {
        key: "community",
        env_var: "VITE_WEBHOOK_COMMUNITY",
        slug: "community",
        required_fields: &["name", "email"],
        metadata: &[("source", "community-page"), ("category", "community")],
        checkout: None,
    },
    WebhookDefinition {
        key: "newsletter",
        env_var: "VITE_WEBHOOK_NEWSLETTER",
        slug: "newsletter",
        required_fields: &["email"],
        metadata: &[("source", "newsletter"), ("category", "newsletter")],
        checkout: None,
    },
    WebhookDefinition {
        key: "contact",
        env_var: "VITE_WEBHOOK_CONTACT",
        slug: "contact",
        required_fields: &["name", "email", "message"],
        metadata: &[("source", "contact-form"), ("category", "contact")],
        checkout: None,
    },
    WebhookDefinition {
        key: "bootcamps.ai-data-engineer",
        env_var: "VITE_WEBHOOK_BOOTCAMP_AI_DE",
        slug: "bootcamp-ai-data-engineer",
        required_fields: LEAD_FIELDS,
        metadata: &[
            ("source", "bootcamp-page"),
            ("category", "bootcamp"),
            ("product", "ai-data-engineer"),
        ],
        checkout: Some(CheckoutDefinition {
            default_url: "https://pay.example.com/checkout/ai-data-engineer",
            env_var: "VITE_CHECKOUT_BOOTCAMP_AI_DE",
            phone_param: "celular",
            await_webhook: false,
        }),
    },
    WebhookDefinition {
        key: "bootcamps.data-engineering",
        env_var: "VITE_WEBHOOK_BOOTCAMP_DE",
        slug: "bootcamp-data-engineering",
        required_fields: LEAD_FIELDS,
        metadata: &[
            ("source", "bootcamp-page"),
            ("category", "bootcamp"),
            ("product", "data-engineering"),
        ],
        checkout: Some(CheckoutDefinition {
            default_url: "https://pay.example.com/checkout/data-engineering",
            env_var: "VITE_CHECKOUT_BOOTCAMP_DE",
            phone_param: "phone",
            await_webhook: true,
        }),
    },
    WebhookDefinition {
        key: "webinars.domine-claude-code",
        env_var: "VITE_WEBHOOK_WEBINAR_CLAUDE_CODE",
        slug: "webinar-domine-claude-code",
        required_fields: LEAD_FIELDS,
        metadata: &[
            ("source", "webinar-page"),
            ("category", "webinar"),
            ("event", "domine-claude-code"),
        ],
        checkout: None,
    },
    WebhookDefinition {
        key: "webinars.agentes-de-ia",
        env_var: "VITE_WEBHOOK_WEBINAR_AI_AGENTS",
        slug: "webinar-agentes-de-ia",
        required_fields: LEAD_FIELDS,
        metadata: &[
            ("source", "webinar-page"),
            ("category", "webinar"),
            ("event", "agentes-de-ia"),
        ],
        checkout: None,
    },
];

impl WebhookDefinition {
    pub fn default_url(&self) -> String {
        format!("{}/{}", webhooks::DEFAULT_BASE_URL, self.slug)
    }

    /// Resolve into a registry entry: specific variable, then the shared
    /// variable, then the hardcoded default.
    pub fn resolve(
        &self,
        pipeline: &PipelineConfig,
        lookup: &impl Fn(&str) -> Option<String>,
    ) -> WebhookConfig {
        let url = lookup(self.env_var)
            .filter(|v| !v.trim().is_empty())
            .or_else(|| lookup(webhooks::SHARED_URL_ENV).filter(|v| !v.trim().is_empty()))
            .unwrap_or_else(|| self.default_url());

        debug!(webhook_key = %self.key, url = %url, "Resolved webhook destination");

        let mut config = WebhookConfig::new(self.key, url)
            .with_required(self.required_fields)
            .with_enabled(pipeline.webhooks_enabled)
            .with_fallback(pipeline.fallback);

        for (key, value) in self.metadata {
            config = config.with_metadata(key, value);
        }

        if let Some(checkout) = self.checkout {
            let base_url = lookup(checkout.env_var)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| checkout.default_url.to_string());
            let phone_param = if checkout.phone_param.is_empty() {
                phone::DEFAULT_CHECKOUT_PHONE_PARAM
            } else {
                checkout.phone_param
            };

            config = config.with_checkout(CheckoutConfig {
                base_url,
                phone_param: phone_param.to_string(),
                await_webhook: checkout.await_webhook,
            });
        }

        config
    }
}

/// Resolve every static definition against the environment
pub fn build_webhook_configs(
    pipeline: &PipelineConfig,
    lookup: &impl Fn(&str) -> Option<String>,
) -> Vec<WebhookConfig> {
    WEBHOOK_DEFINITIONS
        .iter()
        .map(|def| def.resolve(pipeline, lookup))
        .collect()
}

//! Webhook Registry
//!
//! Maps page/category keys to their webhook destination. Lookups never
//! fail: unknown keys resolve to the newsletter entry so a lead is still
//! captured somewhere.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::constants::webhooks::{DEFAULT_BASE_URL, FALLBACK_KEY};
use crate::models::WebhookConfig;

/// `(pattern, key prefix)`: the captured slug is appended to the prefix
static PATH_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"^/bootcamps?/([a-z0-9][a-z0-9-]*)$", "bootcamps."),
        (r"^/webinars?/([a-z0-9][a-z0-9-]*)$", "webinars."),
    ]
    .into_iter()
    .filter_map(|(pattern, prefix)| Regex::new(pattern).ok().map(|re| (re, prefix)))
    .collect()
});

/// Single-segment paths with a fixed key
const FLAT_PATHS: &[(&str, &str)] = &[
    ("/", "community"),
    ("/community", "community"),
    ("/comunidade", "community"),
    ("/newsletter", "newsletter"),
    ("/contact", "contact"),
    ("/contato", "contact"),
];

#[derive(Debug, Clone)]
pub struct WebhookRegistry {
    entries: Arc<HashMap<String, Arc<WebhookConfig>>>,
    fallback: Arc<WebhookConfig>,
}

impl WebhookRegistry {
    /// Build from resolved configs. If no newsletter entry is present a
    /// placeholder one is synthesized so the fallback always exists.
    pub fn new(configs: Vec<WebhookConfig>) -> Self {
        let entries: HashMap<String, Arc<WebhookConfig>> = configs
            .into_iter()
            .map(|c| (c.key.clone(), Arc::new(c)))
            .collect();

        let fallback = entries.get(FALLBACK_KEY).cloned().unwrap_or_else(|| {
            warn!("No '{}' webhook configured, using default destination", FALLBACK_KEY);
            Arc::new(
                WebhookConfig::new(FALLBACK_KEY, format!("{}/{}", DEFAULT_BASE_URL, FALLBACK_KEY))
                    .with_required(&["email"]),
            )
        });

        Self {
            entries: Arc::new(entries),
            fallback,
        }
    }

    /// Exact lookup, `None` for unknown keys
    pub fn find(&self, key: &str) -> Option<Arc<WebhookConfig>> {
        self.entries.get(key).cloned()
    }

    /// Lookup that degrades to the newsletter entry for unknown keys
    pub fn lookup(&self, key: &str) -> Arc<WebhookConfig> {
        match self.find(key) {
            Some(config) => config,
            None => {
                warn!(webhook_key = %key, fallback = %FALLBACK_KEY, "Unknown webhook key, using fallback");
                self.fallback.clone()
            }
        }
    }

    /// Derive the key from a URL path, `None` when no pattern matches
    pub fn key_for_path(path: &str) -> Option<String> {
        let path = normalize_path(path);

        if let Some((_, key)) = FLAT_PATHS.iter().find(|(p, _)| *p == path) {
            return Some(key.to_string());
        }

        PATH_PATTERNS.iter().find_map(|(re, prefix)| {
            re.captures(&path)
                .and_then(|caps| caps.get(1))
                .map(|slug| format!("{}{}", prefix, slug.as_str()))
        })
    }

    /// Path-based lookup; unmatched paths and unknown derived keys both
    /// fall back to the newsletter entry.
    pub fn lookup_by_path(&self, path: &str) -> Arc<WebhookConfig> {
        match Self::key_for_path(path) {
            Some(key) => {
                debug!(path = %path, webhook_key = %key, "Resolved webhook key from path");
                self.lookup(&key)
            }
            None => {
                debug!(path = %path, "No webhook pattern matched path, using fallback");
                self.fallback.clone()
            }
        }
    }

    pub fn fallback(&self) -> Arc<WebhookConfig> {
        self.fallback.clone()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Lowercase, drop query/fragment and trailing slashes
fn normalize_path(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_ascii_lowercase()
    }
}

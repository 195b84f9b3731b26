use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use tracing::warn;

use crate::constants;
use crate::models::FallbackPolicy;

pub mod webhooks;
pub use webhooks::{build_webhook_configs, WebhookDefinition, WEBHOOK_DEFINITIONS};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub environment: String,
    pub port: u16,
    /// Outbound webhook timeout in seconds
    pub request_timeout: u64,
    pub log_level: String,
    /// `json` switches the subscriber to the JSON formatter
    pub log_format: String,
    pub pipeline: PipelineConfig,
    /// Fully resolved registry entries
    pub webhooks: Vec<crate::models::WebhookConfig>,
}

/// Lead pipeline feature flags
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// `VITE_N8N_ENABLED`; false marks every registry entry disabled
    pub webhooks_enabled: bool,
    pub log_errors: bool,
    /// Expose dispatch error text to the client
    pub show_errors: bool,
    pub track_events: bool,
    pub track_utm: bool,
    pub track_device: bool,
    pub fallback: FallbackPolicy,
    pub max_retries: u32,
    #[serde(skip_serializing)]
    pub webhook_secret: Option<String>,
    pub success_display_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            webhooks_enabled: true,
            log_errors: true,
            show_errors: false,
            track_events: true,
            track_utm: true,
            track_device: true,
            fallback: FallbackPolicy::Continue,
            max_retries: constants::webhooks::DEFAULT_MAX_RETRIES,
            webhook_secret: None,
            success_display_ms: constants::form::SUCCESS_DISPLAY_MS,
        }
    }
}

impl PipelineConfig {
    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let fallback = match lookup("VITE_WEBHOOK_FALLBACK") {
            Some(raw) => raw
                .parse::<FallbackPolicy>()
                .map_err(|e| anyhow::anyhow!("VITE_WEBHOOK_FALLBACK: {}", e))?,
            None => defaults.fallback,
        };

        Ok(Self {
            webhooks_enabled: env_bool(lookup, "VITE_N8N_ENABLED", defaults.webhooks_enabled),
            log_errors: env_bool(lookup, "VITE_LOG_ERRORS", defaults.log_errors),
            show_errors: env_bool(lookup, "VITE_SHOW_ERRORS", defaults.show_errors),
            track_events: env_bool(lookup, "VITE_TRACK_EVENTS", defaults.track_events),
            track_utm: env_bool(lookup, "VITE_TRACK_UTM", defaults.track_utm),
            track_device: env_bool(lookup, "VITE_TRACK_DEVICE", defaults.track_device),
            fallback,
            max_retries: env_parse(lookup, "VITE_WEBHOOK_MAX_RETRIES", defaults.max_retries)?,
            webhook_secret: lookup("VITE_WEBHOOK_SECRET").filter(|s| !s.trim().is_empty()),
            success_display_ms: env_parse(
                lookup,
                "VITE_SUCCESS_DISPLAY_MS",
                defaults.success_display_ms,
            )?,
        })
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an explicit variable map instead of the process environment
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self> {
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let pipeline = PipelineConfig::from_lookup(&lookup)?;
        let webhooks = build_webhook_configs(&pipeline, &lookup);

        Ok(Config {
            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            port: env_parse(&lookup, "PORT", 8080)?,
            request_timeout: env_parse(
                &lookup,
                "REQUEST_TIMEOUT",
                constants::webhooks::DEFAULT_TIMEOUT_SECS,
            )?,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "debug".to_string()),
            log_format: lookup("LOG_FORMAT").unwrap_or_else(|| "pretty".to_string()),
            pipeline,
            webhooks,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Parse a boolean flag, falling back to `default` on absent or unreadable values
pub fn env_bool(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> bool {
    let Some(raw) = lookup(key) else {
        return default;
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => true,
        "false" | "0" | "no" | "off" => false,
        "" => default,
        other => {
            warn!(key = %key, value = %other, "Unrecognized boolean value, using default {}", default);
            default
        }
    }
}

fn env_parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} must be a valid number: {}", key, e)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = Config::from_vars(&HashMap::new()).unwrap();

        assert_eq!(config.environment, "development");
        assert_eq!(config.port, 8080);
        assert_eq!(config.request_timeout, 10);
        assert!(config.pipeline.webhooks_enabled);
        assert!(!config.pipeline.show_errors);
        assert_eq!(config.pipeline.fallback, FallbackPolicy::Continue);
        assert_eq!(config.pipeline.success_display_ms, 3000);
        assert!(!config.webhooks.is_empty());
    }

    #[test]
    fn test_flags_accept_common_spellings() {
        let config = Config::from_vars(&vars(&[
            ("VITE_N8N_ENABLED", "0"),
            ("VITE_SHOW_ERRORS", "YES"),
            ("VITE_TRACK_UTM", "off"),
            ("VITE_TRACK_DEVICE", "maybe"),
        ]))
        .unwrap();

        assert!(!config.pipeline.webhooks_enabled);
        assert!(config.pipeline.show_errors);
        assert!(!config.pipeline.track_utm);
        // unreadable value keeps the default
        assert!(config.pipeline.track_device);
        assert!(config.webhooks.iter().all(|w| !w.enabled));
    }

    #[test]
    fn test_fallback_policy_from_env() {
        let config = Config::from_vars(&vars(&[("VITE_WEBHOOK_FALLBACK", "block")])).unwrap();
        assert_eq!(config.pipeline.fallback, FallbackPolicy::Block);
        assert!(config.webhooks.iter().all(|w| w.fallback == FallbackPolicy::Block));

        assert!(Config::from_vars(&vars(&[("VITE_WEBHOOK_FALLBACK", "panic")])).is_err());
    }

    #[test]
    fn test_invalid_port_is_an_error() {
        assert!(Config::from_vars(&vars(&[("PORT", "http")])).is_err());
    }

    #[test]
    fn test_blank_secret_is_ignored() {
        let config = Config::from_vars(&vars(&[("VITE_WEBHOOK_SECRET", "  ")])).unwrap();
        assert!(config.pipeline.webhook_secret.is_none());
    }
}

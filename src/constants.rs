//! Application constants and configuration values.
//!
//! This module centralizes hardcoded defaults so the registry, the
//! dispatcher and the HTTP layer agree on them.

/// Webhook registry constants
pub mod webhooks {
    /// Key used when a lookup misses
    pub const FALLBACK_KEY: &str = "newsletter";

    /// Base for the hardcoded default webhook URLs
    pub const DEFAULT_BASE_URL: &str = "https://hooks.example.com/webhook";

    /// Shared override applied to every entry without a specific variable
    pub const SHARED_URL_ENV: &str = "VITE_N8N_WEBHOOK_URL";

    /// Request timeout for outbound webhook calls, in seconds
    pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

    /// Maximum attempts under the `retry` fallback policy
    pub const DEFAULT_MAX_RETRIES: u32 = 3;

    /// First backoff delay under the `retry` fallback policy
    pub const INITIAL_BACKOFF_MS: u64 = 500;

    /// Header carrying the HMAC signature of the body
    pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";

    /// Header carrying the signing timestamp
    pub const TIMESTAMP_HEADER: &str = "X-Webhook-Timestamp";
}

/// Enrichment defaults
pub mod enrichment {
    pub const DEFAULT_REFERRER: &str = "direct";
    pub const DEFAULT_UTM_SOURCE: &str = "direct";
    pub const DEFAULT_UTM_MEDIUM: &str = "organic";
}

/// Phone and checkout constants
pub mod phone {
    /// Country calling code sent to the checkout as `ddi`
    pub const BRAZIL_DDI: &str = "55";

    /// Digits in a full mobile number (area code + 9 digits)
    pub const MOBILE_DIGITS: usize = 11;

    /// Digits in a full landline number (area code + 8 digits)
    pub const LANDLINE_DIGITS: usize = 10;

    /// Checkout query parameter for the local number when none is configured
    pub const DEFAULT_CHECKOUT_PHONE_PARAM: &str = "celular";
}

/// Lead-data cookie constants
pub mod cookies {
    /// Cookie lifetime in days
    pub const MAX_AGE_DAYS: i64 = 30;

    pub const NAME_ALIASES: &[&str] = &["user-name", "lead_name"];
    pub const EMAIL_ALIASES: &[&str] = &["user-email", "lead_email", "email"];
    pub const PHONE_ALIASES: &[&str] = &["user-phone", "lead_phone", "phone"];
}

/// Form controller constants
pub mod form {
    /// How long the success message stays up before the form resets
    pub const SUCCESS_DISPLAY_MS: u64 = 3000;
}

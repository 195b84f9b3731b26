//! Lead-data mirror for downstream analytics consumers.
//!
//! The dispatcher hands every confirmed lead to an `AnalyticsSink`. The
//! in-process `LeadDataStore` keeps the last lead (last write wins) and the
//! cookie set tag managers read from.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, RwLock};

use serde::Serialize;
use tracing::debug;

use crate::constants::cookies::{EMAIL_ALIASES, MAX_AGE_DAYS, NAME_ALIASES, PHONE_ALIASES};
use crate::models::LeadRecord;

/// Receives leads confirmed by the webhook
pub trait AnalyticsSink: Send + Sync {
    fn record(&self, lead: &LeadRecord);
}

/// Sink for embedders that don't mirror lead data.
pub struct NoopSink;

impl AnalyticsSink for NoopSink {
    fn record(&self, _lead: &LeadRecord) {}
}

/// In-memory sink that captures leads for testing.
#[derive(Default)]
pub struct CaptureSink {
    leads: Mutex<Vec<LeadRecord>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn leads(&self) -> Vec<LeadRecord> {
        self.leads.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn count(&self) -> usize {
        self.leads.lock().map(|l| l.len()).unwrap_or_default()
    }
}

impl AnalyticsSink for CaptureSink {
    fn record(&self, lead: &LeadRecord) {
        if let Ok(mut leads) = self.leads.lock() {
            leads.push(lead.clone());
        }
    }
}

pub fn noop_sink() -> Arc<dyn AnalyticsSink> {
    Arc::new(NoopSink)
}

/// First-party cookie carrying one lead field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeadCookie {
    pub name: String,
    pub value: String,
    pub max_age_days: i64,
}

impl LeadCookie {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            max_age_days: MAX_AGE_DAYS,
        }
    }

    /// `Set-Cookie` header value: `SameSite=Lax`, site-wide path
    pub fn to_header_value(&self) -> String {
        format!(
            "{}={}; Max-Age={}; Path=/; SameSite=Lax",
            self.name,
            encode_cookie_value(&self.value),
            self.max_age_days * 24 * 60 * 60
        )
    }
}

fn encode_cookie_value(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Every aliased cookie for one lead. Empty fields produce no cookie.
pub fn cookies_for(lead: &LeadRecord) -> Vec<LeadCookie> {
    let groups: [(&[&str], &str); 3] = [
        (NAME_ALIASES, lead.name.as_str()),
        (EMAIL_ALIASES, lead.email.as_str()),
        (PHONE_ALIASES, lead.phone.as_str()),
    ];

    groups
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .flat_map(|(aliases, value)| aliases.iter().map(move |alias| LeadCookie::new(alias, value)))
        .collect()
}

/// Process-wide last-write-wins lead mirror
#[derive(Default)]
pub struct LeadDataStore {
    latest: RwLock<Option<LeadRecord>>,
    cookies: RwLock<BTreeMap<String, LeadCookie>>,
}

impl LeadDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self) -> Option<LeadRecord> {
        self.latest.read().map(|l| l.clone()).unwrap_or_default()
    }

    /// Cookie value by name
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.cookies
            .read()
            .ok()
            .and_then(|c| c.get(name).map(|cookie| cookie.value.clone()))
    }

    pub fn cookies(&self) -> Vec<LeadCookie> {
        self.cookies
            .read()
            .map(|c| c.values().cloned().collect())
            .unwrap_or_default()
    }
}

impl AnalyticsSink for LeadDataStore {
    fn record(&self, lead: &LeadRecord) {
        if let Ok(mut latest) = self.latest.write() {
            *latest = Some(lead.clone());
        }
        if let Ok(mut cookies) = self.cookies.write() {
            for cookie in cookies_for(lead) {
                cookies.insert(cookie.name.clone(), cookie);
            }
        }
        debug!(email = %lead.email, "Mirrored lead data");
    }
}

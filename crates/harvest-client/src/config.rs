//! Settings for reaching the API and retrying failed calls.
//!
//! Both structs deserialize from the `api` and `retry` sections of
//! `harvest-config.yaml`. Every field has a default so partial sections are
//! valid.

use std::time::Duration;

use serde::Deserialize;

/// Upper bound on the backoff multiplier (`2^attempt` is capped here).
const MAX_BACKOFF_FACTOR: u64 = 64;

/// Where and how to call the API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiConfig {
    /// API root, without a trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Site selector sent with every call.
    #[serde(default = "default_site")]
    pub site: String,

    /// Application key sent with every call. Never logged.
    #[serde(default)]
    pub key: String,

    /// Tag filter applied to stats and question listings.
    #[serde(default = "default_tagged")]
    pub tagged: Option<String>,

    /// `User-Agent` header value.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            site: default_site(),
            key: String::new(),
            tagged: default_tagged(),
            user_agent: default_user_agent(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl ApiConfig {
    /// Request timeout as a [`Duration`].
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Apply environment overrides. `HARVEST_API_KEY` replaces `key`.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("HARVEST_API_KEY") {
            self.key = key;
        }
    }
}

/// How many times to try a call and how long to wait between tries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts per call, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay in milliseconds; attempt `n` waits `base * min(64, 2^n)`.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with explicit values.
    pub const fn new(max_attempts: u32, base_delay_ms: u64) -> Self {
        Self {
            max_attempts,
            base_delay_ms,
        }
    }

    /// Delay to wait after the failed attempt `attempt` (counted from 1).
    ///
    /// `base * min(64, 2^attempt)`, saturating on overflow.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 1_u64
            .checked_shl(attempt)
            .unwrap_or(u64::MAX)
            .min(MAX_BACKOFF_FACTOR);
        Duration::from_millis(self.base_delay_ms.saturating_mul(factor))
    }

    /// Longest delay this policy can ever produce.
    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms.saturating_mul(MAX_BACKOFF_FACTOR))
    }
}

fn default_base_url() -> String {
    "https://api.stackexchange.com/2.3".to_owned()
}

fn default_site() -> String {
    "stackoverflow".to_owned()
}

#[allow(clippy::unnecessary_wraps)]
fn default_tagged() -> Option<String> {
    Some("java".to_owned())
}

fn default_user_agent() -> String {
    concat!("harvest/", env!("CARGO_PKG_VERSION")).to_owned()
}

const fn default_request_timeout_ms() -> u64 {
    30_000
}

const fn default_max_attempts() -> u32 {
    10
}

const fn default_base_delay_ms() -> u64 {
    1_000
}

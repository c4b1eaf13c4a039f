//! Client configuration.
//!
//! Provides [`SdkConfig`] and [`RetryConfig`]. Values come from defaults, the
//! typed builder, or environment variables following the usual AWS SDK names.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::middleware::{Decider, DelayFn, default_decider, exponential_delay};

/// Upper bound of any single retry delay, in milliseconds.
///
/// Retries resend the request signed for the first attempt, and SigV4
/// signatures expire 15 minutes after signing.
pub const MAX_RETRY_DELAY_MS: u64 = 60_000;

/// Retry policy settings.
///
/// # Examples
///
/// ```
/// use rustack_sdk_core::config::RetryConfig;
///
/// let retry = RetryConfig::default();
/// assert_eq!(retry.max_attempts, 3);
/// assert_eq!(retry.max_retries(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct RetryConfig {
    /// Total attempts, including the first one.
    #[builder(default = 3)]
    pub max_attempts: u32,

    /// Base delay of the exponential backoff, in milliseconds.
    #[builder(default = 100)]
    pub base_delay_ms: u64,

    /// Upper bound of any single backoff delay, in milliseconds; values above
    /// [`MAX_RETRY_DELAY_MS`] are clamped.
    #[builder(default = 20_000)]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 100,
            max_delay_ms: 20_000,
        }
    }
}

impl RetryConfig {
    /// Retries allowed after the first attempt.
    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_attempts.saturating_sub(1)
    }

    /// The [`default_decider`] for this policy.
    #[must_use]
    pub fn decider(&self) -> Decider {
        default_decider(self.max_retries())
    }

    /// The [`exponential_delay`] for this policy.
    #[must_use]
    pub fn delay(&self) -> DelayFn {
        exponential_delay(
            Duration::from_millis(self.base_delay_ms),
            Duration::from_millis(self.max_delay_ms.min(MAX_RETRY_DELAY_MS)),
        )
    }
}

/// Client settings.
///
/// # Examples
///
/// ```
/// use rustack_sdk_core::config::SdkConfig;
///
/// let config = SdkConfig::default();
/// assert_eq!(config.region, "us-east-1");
/// assert!(config.validate_params);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct SdkConfig {
    /// Region used for endpoints and signing.
    #[builder(default = String::from("us-east-1"))]
    pub region: String,

    /// Endpoint override, e.g. a local emulator.
    #[builder(default)]
    pub endpoint_url: Option<String>,

    /// Retry policy.
    #[builder(default)]
    pub retry: RetryConfig,

    /// Whether the validation middleware is installed.
    #[builder(default = true)]
    pub validate_params: bool,

    /// Entries kept by the client's history; `0` disables history.
    #[builder(default = DEFAULT_HISTORY_CAPACITY)]
    pub history_capacity: usize,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            region: String::from("us-east-1"),
            endpoint_url: None,
            retry: RetryConfig::default(),
            validate_params: true,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            log_level: String::from("info"),
        }
    }
}

impl SdkConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `AWS_REGION` (or `DEFAULT_REGION`) | `us-east-1` |
    /// | `AWS_ENDPOINT_URL` | none |
    /// | `AWS_MAX_ATTEMPTS` | `3` |
    /// | `AWS_RETRY_BASE_DELAY_MS` | `100` |
    /// | `AWS_RETRY_MAX_DELAY_MS` | `20000` |
    /// | `SDK_VALIDATE_PARAMS` | `true` |
    /// | `SDK_HISTORY_CAPACITY` | `10` |
    /// | `LOG_LEVEL` | `info` |
    ///
    /// Unparseable numbers keep their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(v) = lookup("AWS_REGION").or_else(|| lookup("DEFAULT_REGION")) {
            config.region = v;
        }
        if let Some(v) = lookup("AWS_ENDPOINT_URL") {
            if !v.is_empty() {
                config.endpoint_url = Some(v);
            }
        }
        if let Some(n) = lookup("AWS_MAX_ATTEMPTS").and_then(|v| v.parse().ok()) {
            config.retry.max_attempts = n;
        }
        if let Some(n) = lookup("AWS_RETRY_BASE_DELAY_MS").and_then(|v| v.parse().ok()) {
            config.retry.base_delay_ms = n;
        }
        if let Some(n) = lookup("AWS_RETRY_MAX_DELAY_MS").and_then(|v| v.parse().ok()) {
            config.retry.max_delay_ms = n;
        }
        if let Some(v) = lookup("SDK_VALIDATE_PARAMS") {
            config.validate_params = parse_bool(&v);
        }
        if let Some(n) = lookup("SDK_HISTORY_CAPACITY").and_then(|v| v.parse().ok()) {
            config.history_capacity = n;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            config.log_level = v;
        }

        config
    }

    /// The endpoint for a service: the override when set, otherwise
    /// `https://{endpoint_prefix}.{region}.amazonaws.com/`.
    #[must_use]
    pub fn endpoint_for(&self, endpoint_prefix: &str) -> String {
        self.endpoint_url.clone().unwrap_or_else(|| {
            format!("https://{endpoint_prefix}.{}.amazonaws.com/", self.region)
        })
    }
}

/// Parse a string as a boolean, accepting `"1"` and `"true"` (case-insensitive).
fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

//! Per-model middleware configuration.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Retry strategy selector.
///
/// The five built-in strategies parse from their snake_case names. Any other
/// name becomes [`RetryStrategyKind::Custom`] and is resolved against the
/// retry registry at compose time.
///
/// # Examples
///
/// ```
/// use tollgate_core::RetryStrategyKind;
///
/// let kind: RetryStrategyKind = "exponential_backoff".parse().unwrap();
/// assert_eq!(kind, RetryStrategyKind::ExponentialBackoff);
/// assert_eq!(kind.as_str(), "exponential_backoff");
///
/// let custom: RetryStrategyKind = "fibonacci".parse().unwrap();
/// assert_eq!(custom, RetryStrategyKind::Custom("fibonacci".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum RetryStrategyKind {
    /// Retry immediately without waiting
    #[default]
    Native,
    /// Wait `base_delay^attempt` seconds, optionally plus jitter
    ExponentialBackoff,
    /// Wait a uniform random time up to `max_retry_wait`
    RandomWait,
    /// Wait `max_retry_wait / max_retries * attempt` seconds
    IncrementalWait,
    /// Disable the retry layer entirely
    None,
    /// A strategy registered at runtime
    #[strum(default)]
    Custom(String),
}

impl RetryStrategyKind {
    /// Registry name of this strategy.
    pub fn as_str(&self) -> &str {
        match self {
            RetryStrategyKind::Native => "native",
            RetryStrategyKind::ExponentialBackoff => "exponential_backoff",
            RetryStrategyKind::RandomWait => "random_wait",
            RetryStrategyKind::IncrementalWait => "incremental_wait",
            RetryStrategyKind::None => "none",
            RetryStrategyKind::Custom(name) => name,
        }
    }
}

impl fmt::Display for RetryStrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for RetryStrategyKind {
    fn from(name: String) -> Self {
        RetryStrategyKind::from_str(&name).unwrap_or(RetryStrategyKind::Custom(name))
    }
}

impl From<RetryStrategyKind> for String {
    fn from(kind: RetryStrategyKind) -> Self {
        kind.as_str().to_string()
    }
}

impl Serialize for RetryStrategyKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RetryStrategyKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(RetryStrategyKind::from)
    }
}

/// Configuration consumed by the composer for one logical model.
///
/// `None` for both `requests_per_minute` and `tokens_per_minute` means the
/// model gets no rate limiter at all.
///
/// # Example
///
/// ```toml
/// [models.default_chat]
/// model = "gpt-4o-mini"
/// requests_per_minute = 500
/// tokens_per_minute = 200_000
/// retry_strategy = "exponential_backoff"
/// max_retries = 5
/// ```
///
/// ```
/// use tollgate_core::{ModelConfig, RetryStrategyKind};
///
/// let config = ModelConfig::builder()
///     .model("gpt-4o-mini")
///     .requests_per_minute(500u32)
///     .retry_strategy(RetryStrategyKind::IncrementalWait)
///     .build()
///     .unwrap();
///
/// assert_eq!(*config.requests_per_minute(), Some(500));
/// assert_eq!(*config.max_retries(), 10);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, derive_builder::Builder)]
#[builder(default)]
pub struct ModelConfig {
    /// Model identity; part of every cache key
    #[builder(setter(into))]
    model: String,

    /// Requests admitted per rate-limit period
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(setter(into, strip_option))]
    requests_per_minute: Option<u32>,

    /// Tokens admitted per rate-limit period
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(setter(into, strip_option))]
    tokens_per_minute: Option<u64>,

    /// Length of the trailing admission window in seconds
    #[serde(default = "default_period")]
    rate_limit_period_secs: f64,

    /// Minimum gap between admissions when the stagger is not derived from RPM
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(setter(into, strip_option))]
    default_stagger_secs: Option<f64>,

    /// Name of the rate limiter constructor in the registry
    #[serde(default = "default_rate_limit_strategy")]
    #[builder(setter(into))]
    rate_limit_strategy: String,

    /// Retry strategy
    #[serde(default)]
    retry_strategy: RetryStrategyKind,

    /// Retries allowed after the first attempt
    #[serde(default = "default_max_retries")]
    max_retries: u32,

    /// Upper bound used by the random and incremental strategies, in seconds
    #[serde(default = "default_max_retry_wait")]
    max_retry_wait: f64,

    /// Base of the exponential backoff, in seconds
    #[serde(default = "default_base_delay")]
    base_delay: f64,

    /// Add uniform jitter in `[0, 1)` seconds to exponential delays
    #[serde(default = "default_jitter")]
    jitter: bool,

    /// Completion budget charged to requests that set no `max_tokens`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(setter(into, strip_option))]
    max_tokens: Option<u32>,
}

fn default_period() -> f64 {
    60.0
}

fn default_rate_limit_strategy() -> String {
    "sliding_window".to_string()
}

fn default_max_retries() -> u32 {
    10
}

fn default_max_retry_wait() -> f64 {
    10.0
}

fn default_base_delay() -> f64 {
    2.0
}

fn default_jitter() -> bool {
    true
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: String::new(),
            requests_per_minute: None,
            tokens_per_minute: None,
            rate_limit_period_secs: default_period(),
            default_stagger_secs: None,
            rate_limit_strategy: default_rate_limit_strategy(),
            retry_strategy: RetryStrategyKind::default(),
            max_retries: default_max_retries(),
            max_retry_wait: default_max_retry_wait(),
            base_delay: default_base_delay(),
            jitter: default_jitter(),
            max_tokens: None,
        }
    }
}

impl ModelConfig {
    /// Creates a new model config builder.
    pub fn builder() -> ModelConfigBuilder {
        ModelConfigBuilder::default()
    }

    /// Whether this configuration asks for a rate limiter.
    pub fn is_rate_limited(&self) -> bool {
        self.requests_per_minute.is_some() || self.tokens_per_minute.is_some()
    }
}

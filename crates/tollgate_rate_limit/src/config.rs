//! Rate limit parameters.

use derive_getters::Getters;
use std::time::Duration;
use tollgate_core::ModelConfig;
use tollgate_error::{ConfigError, TollgateResult};

/// Admission thresholds for one rate limiter.
///
/// At least one of `rpm` / `tpm` must be set and positive, and `period`
/// must be positive. Violations are reported by [`RateLimitConfig::validate`]
/// and by every limiter constructor.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use tollgate_rate_limit::RateLimitConfig;
///
/// let config = RateLimitConfig::per_minute()
///     .with_rpm(500)
///     .with_tpm(200_000);
/// assert!(config.validate().is_ok());
///
/// // Neither limit set
/// assert!(RateLimitConfig::new(Duration::from_secs(60)).validate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct RateLimitConfig {
    /// Requests admitted per period
    rpm: Option<u32>,
    /// Tokens admitted per period
    tpm: Option<u64>,
    /// Length of the trailing window
    period: Duration,
    /// Stagger used when it is not derived from `rpm`
    default_stagger: Option<Duration>,
}

impl RateLimitConfig {
    /// Config with the given window and no limits set.
    pub fn new(period: Duration) -> Self {
        Self {
            rpm: None,
            tpm: None,
            period,
            default_stagger: None,
        }
    }

    /// Config with a one minute window.
    pub fn per_minute() -> Self {
        Self::new(Duration::from_secs(60))
    }

    /// Set the request limit.
    pub fn with_rpm(mut self, rpm: u32) -> Self {
        self.rpm = Some(rpm);
        self
    }

    /// Set the token limit.
    pub fn with_tpm(mut self, tpm: u64) -> Self {
        self.tpm = Some(tpm);
        self
    }

    /// Set the stagger applied when `tpm` is configured.
    pub fn with_default_stagger(mut self, stagger: Duration) -> Self {
        self.default_stagger = Some(stagger);
        self
    }

    /// Extract rate limit parameters from a model configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the period or stagger is not a
    /// finite, non-negative number of seconds.
    pub fn from_model(model: &ModelConfig) -> TollgateResult<Self> {
        let period = seconds("rate_limit_period_secs", *model.rate_limit_period_secs())?;
        let default_stagger = model
            .default_stagger_secs()
            .map(|secs| seconds("default_stagger_secs", secs))
            .transpose()?;

        Ok(Self {
            rpm: *model.requests_per_minute(),
            tpm: *model.tokens_per_minute(),
            period,
            default_stagger,
        })
    }

    /// Check the construction rules.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no positive limit is set or the
    /// period is zero.
    pub fn validate(&self) -> TollgateResult<()> {
        if self.rpm.is_none() && self.tpm.is_none() {
            return Err(ConfigError::new(
                "Rate limiter requires requests_per_minute or tokens_per_minute",
            )
            .into());
        }
        if self.rpm == Some(0) {
            return Err(ConfigError::new("requests_per_minute must be positive").into());
        }
        if self.tpm == Some(0) {
            return Err(ConfigError::new("tokens_per_minute must be positive").into());
        }
        if self.period.is_zero() {
            return Err(ConfigError::new("Rate limit period must be positive").into());
        }
        Ok(())
    }

    /// Minimum gap between consecutive admissions.
    ///
    /// Derived as `period / rpm` when only `rpm` is set; otherwise the
    /// configured default stagger, if any.
    pub fn stagger(&self) -> Option<Duration> {
        match (self.rpm, self.tpm) {
            (Some(rpm), None) if rpm > 0 => Some(self.period / rpm),
            _ => self.default_stagger,
        }
    }
}

fn seconds(field: &str, secs: f64) -> TollgateResult<Duration> {
    Duration::try_from_secs_f64(secs).map_err(|e| {
        ConfigError::new(format!(
            "{} must be a non-negative number of seconds, got {}: {}",
            field, secs, e
        ))
        .into()
    })
}

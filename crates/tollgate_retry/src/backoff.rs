//! Backoff strategies.

use crate::RetryPolicy;
use rand::Rng;
use std::fmt;
use std::time::Duration;
use tollgate_core::RetryStrategyKind;
use tollgate_error::{ConfigError, TollgateResult};

/// Delay schedule between attempts of a retried call.
///
/// Attempt numbers start at 1: `delay(1)` is the wait after the first
/// failure, before the first retry.
pub trait Backoff: Send + Sync + fmt::Debug {
    /// Registry name of the strategy.
    fn name(&self) -> &str;

    /// Retries allowed after the first attempt.
    fn max_retries(&self) -> u32;

    /// Wait before retry number `attempt`.
    fn delay(&self, attempt: u32) -> Duration;
}

/// The built-in retrying strategies.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use tollgate_retry::{Backoff, BuiltinBackoff};
///
/// let backoff = BuiltinBackoff::incremental_wait(4, 2.0).unwrap();
/// assert_eq!(backoff.delay(1), Duration::from_millis(500));
/// assert_eq!(backoff.delay(4), Duration::from_secs(2));
///
/// assert!(BuiltinBackoff::exponential(3, 1.0, false).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum BuiltinBackoff {
    /// Retry immediately
    Native {
        /// Retries allowed after the first attempt
        max_retries: u32,
    },
    /// Wait `base_delay^attempt` seconds, plus jitter if enabled
    ExponentialBackoff {
        /// Retries allowed after the first attempt
        max_retries: u32,
        /// Base of the exponent, in seconds
        base_delay: f64,
        /// Add uniform jitter in `[0, 1)` seconds
        jitter: bool,
    },
    /// Wait a uniform random time in `[0, max_retry_wait]`
    RandomWait {
        /// Retries allowed after the first attempt
        max_retries: u32,
        /// Upper bound of the wait, in seconds
        max_retry_wait: f64,
    },
    /// Wait `max_retry_wait / max_retries * attempt`
    IncrementalWait {
        /// Retries allowed after the first attempt
        max_retries: u32,
        /// Wait before the final retry, in seconds
        max_retry_wait: f64,
    },
}

impl BuiltinBackoff {
    /// Immediate retries.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `max_retries` is zero.
    pub fn native(max_retries: u32) -> TollgateResult<Self> {
        check_retries(max_retries)?;
        Ok(Self::Native { max_retries })
    }

    /// Exponential backoff.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `max_retries` is zero or
    /// `base_delay` is not greater than 1.
    pub fn exponential(max_retries: u32, base_delay: f64, jitter: bool) -> TollgateResult<Self> {
        check_retries(max_retries)?;
        if !base_delay.is_finite() || base_delay <= 1.0 {
            return Err(ConfigError::new(format!(
                "base_delay must be greater than 1.0, got {}",
                base_delay
            ))
            .into());
        }
        Ok(Self::ExponentialBackoff {
            max_retries,
            base_delay,
            jitter,
        })
    }

    /// Uniform random waits.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `max_retries` is zero or
    /// `max_retry_wait` is not positive.
    pub fn random_wait(max_retries: u32, max_retry_wait: f64) -> TollgateResult<Self> {
        check_retries(max_retries)?;
        check_max_wait(max_retry_wait)?;
        Ok(Self::RandomWait {
            max_retries,
            max_retry_wait,
        })
    }

    /// Linearly growing waits.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `max_retries` is zero or
    /// `max_retry_wait` is not positive.
    pub fn incremental_wait(max_retries: u32, max_retry_wait: f64) -> TollgateResult<Self> {
        check_retries(max_retries)?;
        check_max_wait(max_retry_wait)?;
        Ok(Self::IncrementalWait {
            max_retries,
            max_retry_wait,
        })
    }

    /// Build the built-in strategy a policy names.
    ///
    /// Returns `Ok(None)` for [`RetryStrategyKind::None`].
    ///
    /// # Errors
    ///
    /// Returns a configuration error for invalid parameters or for a custom
    /// strategy name, which only a registry can resolve.
    pub fn from_policy(policy: &RetryPolicy) -> TollgateResult<Option<Self>> {
        let max_retries = *policy.max_retries();
        let backoff = match policy.strategy() {
            RetryStrategyKind::Native => Self::native(max_retries)?,
            RetryStrategyKind::ExponentialBackoff => {
                Self::exponential(max_retries, *policy.base_delay(), *policy.jitter())?
            }
            RetryStrategyKind::RandomWait => {
                Self::random_wait(max_retries, *policy.max_retry_wait())?
            }
            RetryStrategyKind::IncrementalWait => {
                Self::incremental_wait(max_retries, *policy.max_retry_wait())?
            }
            RetryStrategyKind::None => return Ok(None),
            RetryStrategyKind::Custom(name) => {
                return Err(
                    ConfigError::new(format!("{} is not a built-in retry strategy", name)).into(),
                );
            }
        };
        Ok(Some(backoff))
    }
}

fn check_retries(max_retries: u32) -> TollgateResult<()> {
    if max_retries == 0 {
        return Err(ConfigError::new("max_retries must be greater than 0").into());
    }
    Ok(())
}

fn check_max_wait(max_retry_wait: f64) -> TollgateResult<()> {
    if !max_retry_wait.is_finite() || max_retry_wait <= 0.0 {
        return Err(ConfigError::new(format!(
            "max_retry_wait must be greater than 0, got {}",
            max_retry_wait
        ))
        .into());
    }
    Ok(())
}

/// Seconds to a duration, saturating on overflow.
fn seconds(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

impl Backoff for BuiltinBackoff {
    fn name(&self) -> &str {
        match self {
            Self::Native { .. } => "native",
            Self::ExponentialBackoff { .. } => "exponential_backoff",
            Self::RandomWait { .. } => "random_wait",
            Self::IncrementalWait { .. } => "incremental_wait",
        }
    }

    fn max_retries(&self) -> u32 {
        match self {
            Self::Native { max_retries }
            | Self::ExponentialBackoff { max_retries, .. }
            | Self::RandomWait { max_retries, .. }
            | Self::IncrementalWait { max_retries, .. } => *max_retries,
        }
    }

    fn delay(&self, attempt: u32) -> Duration {
        match self {
            Self::Native { .. } => Duration::ZERO,
            Self::ExponentialBackoff {
                base_delay, jitter, ..
            } => {
                let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
                let mut secs = base_delay.powi(exponent);
                if *jitter {
                    secs += rand::thread_rng().gen_range(0.0..1.0);
                }
                seconds(secs)
            }
            Self::RandomWait { max_retry_wait, .. } => {
                seconds(rand::thread_rng().gen_range(0.0..=*max_retry_wait))
            }
            Self::IncrementalWait {
                max_retries,
                max_retry_wait,
            } => seconds(max_retry_wait / f64::from(*max_retries) * f64::from(attempt)),
        }
    }
}

//! Sliding-window rate limiter.
//!
//! This module provides the `RateLimiter` struct which admits requests against
//! a trailing time window:
//! - **RPM**: at most `rpm` admissions inside any window of length `period`
//! - **TPM**: at most `tpm` estimated tokens inside any window of length `period`
//! - **Stagger**: a minimum gap between consecutive admissions
//!
//! Blocking callers (OS threads) and suspending callers (tokio tasks) share
//! one instance and one lock. The lock only guards the bookkeeping; waiting
//! always happens outside it, for exactly as long as the earliest event that
//! could unblock the caller.

use crate::RateLimitConfig;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};
use tollgate_error::TollgateResult;
use tracing::{debug, instrument, trace};

/// Shared admission control for one logical model.
///
/// Implemented by [`RateLimiter`]; third-party limiters register with the
/// [`RateLimiterFactory`](crate::RateLimiterFactory).
#[async_trait]
pub trait Limiter: Send + Sync + fmt::Debug {
    /// Registry name of this limiter.
    fn name(&self) -> &str;

    /// Block the current thread until a request costing `tokens` may proceed.
    fn acquire_blocking(&self, tokens: u64) -> RateLimiterGuard;

    /// Suspend the current task until a request costing `tokens` may proceed.
    async fn acquire(&self, tokens: u64) -> RateLimiterGuard;

    /// Requests and tokens currently inside the window.
    fn snapshot(&self) -> WindowSnapshot;
}

/// Proof of admission.
///
/// The admission is recorded when the guard is issued; dropping it has no
/// further effect on the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "the guard documents an admission; bind it for the duration of the call"]
pub struct RateLimiterGuard {
    admitted_at: Instant,
    tokens: u64,
}

impl RateLimiterGuard {
    /// When the request was admitted.
    pub fn admitted_at(&self) -> Instant {
        self.admitted_at
    }

    /// Token cost charged to the window.
    pub fn tokens(&self) -> u64 {
        self.tokens
    }
}

/// Requests and tokens currently inside the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowSnapshot {
    /// Admissions inside the trailing window
    pub requests: usize,
    /// Sum of token costs inside the trailing window
    pub tokens: u64,
}

#[derive(Debug, Default)]
struct WindowState {
    timestamps: VecDeque<Instant>,
    token_costs: VecDeque<u64>,
    token_sum: u64,
    last_admit: Option<Instant>,
}

impl WindowState {
    /// Drop admissions that have left the window.
    fn evict(&mut self, now: Instant, period: Duration) {
        while let Some(&oldest) = self.timestamps.front() {
            if now.saturating_duration_since(oldest) < period {
                break;
            }
            self.timestamps.pop_front();
            if let Some(cost) = self.token_costs.pop_front() {
                self.token_sum -= cost;
            }
        }
    }

    /// Time until the `index`-th oldest admission leaves the window.
    fn expiry_of(&self, index: usize, now: Instant, period: Duration) -> Duration {
        self.timestamps
            .get(index)
            .map(|&at| (at + period).saturating_duration_since(now))
            .unwrap_or(Duration::ZERO)
    }

    /// Time until enough token cost leaves the window for `fits` to hold.
    fn wait_for_tokens(
        &self,
        now: Instant,
        period: Duration,
        fits: impl Fn(u64) -> bool,
    ) -> Duration {
        let mut remaining = self.token_sum;
        for (index, cost) in self.token_costs.iter().enumerate() {
            remaining -= cost;
            if fits(remaining) {
                return self.expiry_of(index, now, period);
            }
        }
        self.expiry_of(self.timestamps.len().saturating_sub(1), now, period)
    }

    fn record(&mut self, now: Instant, tokens: u64) {
        self.timestamps.push_back(now);
        self.token_costs.push_back(tokens);
        self.token_sum += tokens;
        self.last_admit = Some(now);
    }
}

/// Sliding-window limiter over request count and token cost.
///
/// # Example
///
/// ```rust,ignore
/// use std::time::Duration;
/// use tollgate_rate_limit::{RateLimitConfig, RateLimiter};
///
/// let limiter = RateLimiter::new(RateLimitConfig::per_minute().with_rpm(60))?;
///
/// // Suspending callers
/// let _guard = limiter.acquire(1_200).await;
///
/// // Blocking callers share the same window
/// let _guard = limiter.acquire_blocking(800);
/// ```
pub struct RateLimiter {
    config: RateLimitConfig,
    stagger: Option<Duration>,
    state: Mutex<WindowState>,
}

impl RateLimiter {
    /// Registry name of the sliding-window limiter.
    pub const NAME: &'static str = "sliding_window";

    /// Create a limiter, validating the configuration immediately.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if neither `rpm` nor `tpm` is a
    /// positive number, or if `period` is zero.
    #[instrument(skip_all, fields(rpm = ?config.rpm(), tpm = ?config.tpm(), period = ?config.period()))]
    pub fn new(config: RateLimitConfig) -> TollgateResult<Self> {
        config.validate()?;
        let stagger = config.stagger();
        debug!(stagger = ?stagger, "Creating sliding-window rate limiter");
        Ok(Self {
            config,
            stagger,
            state: Mutex::new(WindowState::default()),
        })
    }

    /// The limiter's configuration.
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Minimum gap enforced between admissions.
    pub fn stagger(&self) -> Option<Duration> {
        self.stagger
    }

    /// Make one admission attempt under the lock.
    ///
    /// Returns how long to wait before the next attempt when the request
    /// cannot be admitted yet.
    fn try_admit(&self, tokens: u64) -> Result<RateLimiterGuard, Duration> {
        let period = *self.config.period();
        let mut state = self.state.lock();
        let now = Instant::now();
        state.evict(now, period);

        if let Some(rpm) = *self.config.rpm()
            && state.timestamps.len() >= rpm as usize
        {
            let excess = state.timestamps.len() - rpm as usize;
            return Err(state.expiry_of(excess, now, period));
        }

        // Zero-cost requests never wait on the token budget.
        if let Some(tpm) = *self.config.tpm()
            && tokens > 0
        {
            if tokens > tpm {
                // Oversized requests get the window to themselves.
                if state.token_sum > 0 {
                    return Err(state.wait_for_tokens(now, period, |sum| sum == 0));
                }
            } else if state.token_sum >= tpm || state.token_sum + tokens > tpm {
                return Err(state.wait_for_tokens(now, period, |sum| {
                    sum < tpm && sum + tokens <= tpm
                }));
            }
        }

        if let (Some(stagger), Some(last)) = (self.stagger, state.last_admit) {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < stagger {
                return Err(stagger - elapsed);
            }
        }

        state.record(now, tokens);
        trace!(
            tokens,
            window_requests = state.timestamps.len(),
            window_tokens = state.token_sum,
            "Admitted request"
        );
        Ok(RateLimiterGuard {
            admitted_at: now,
            tokens,
        })
    }

    /// Block the current thread until a request costing `tokens` is admitted.
    ///
    /// Never fails: contention only delays.
    pub fn acquire_blocking(&self, tokens: u64) -> RateLimiterGuard {
        loop {
            match self.try_admit(tokens) {
                Ok(guard) => return guard,
                Err(wait) => {
                    trace!(tokens, wait_ms = wait.as_millis() as u64, "Waiting for capacity");
                    std::thread::sleep(wait);
                }
            }
        }
    }

    /// Suspend until a request costing `tokens` is admitted.
    ///
    /// Dropping the future while it waits leaves no trace in the window.
    pub async fn acquire(&self, tokens: u64) -> RateLimiterGuard {
        loop {
            match self.try_admit(tokens) {
                Ok(guard) => return guard,
                Err(wait) => {
                    trace!(tokens, wait_ms = wait.as_millis() as u64, "Waiting for capacity");
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }

    /// Admit a request only if it can proceed right now.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// if let Some(guard) = limiter.try_acquire(1000) {
    ///     // Rate limits allow request
    /// } else {
    ///     // Rate limited, try again later
    /// }
    /// ```
    pub fn try_acquire(&self, tokens: u64) -> Option<RateLimiterGuard> {
        self.try_admit(tokens).ok()
    }

    /// Requests and tokens currently inside the window.
    pub fn snapshot(&self) -> WindowSnapshot {
        let mut state = self.state.lock();
        state.evict(Instant::now(), *self.config.period());
        WindowSnapshot {
            requests: state.timestamps.len(),
            tokens: state.token_sum,
        }
    }
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("config", &self.config)
            .field("stagger", &self.stagger)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Limiter for RateLimiter {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn acquire_blocking(&self, tokens: u64) -> RateLimiterGuard {
        RateLimiter::acquire_blocking(self, tokens)
    }

    async fn acquire(&self, tokens: u64) -> RateLimiterGuard {
        RateLimiter::acquire(self, tokens).await
    }

    fn snapshot(&self) -> WindowSnapshot {
        RateLimiter::snapshot(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(config: RateLimitConfig) -> RateLimiter {
        RateLimiter::new(config).unwrap()
    }

    #[test]
    fn test_try_acquire_respects_rpm() {
        let limiter = limiter(
            RateLimitConfig::new(Duration::from_secs(60))
                .with_rpm(2)
                .with_tpm(1_000_000),
        );
        assert!(limiter.try_acquire(1).is_some());
        assert!(limiter.try_acquire(1).is_some());
        assert!(limiter.try_acquire(1).is_none());
        assert_eq!(limiter.snapshot().requests, 2);
    }

    #[test]
    fn test_try_acquire_respects_tpm() {
        let limiter = limiter(RateLimitConfig::new(Duration::from_secs(60)).with_tpm(100));
        assert!(limiter.try_acquire(60).is_some());
        assert!(limiter.try_acquire(50).is_none());
        assert!(limiter.try_acquire(40).is_some());
        assert!(limiter.try_acquire(1).is_none());
        assert_eq!(limiter.snapshot().tokens, 100);
    }

    #[test]
    fn test_zero_cost_requests_ignore_full_token_budget() {
        let limiter = limiter(RateLimitConfig::new(Duration::from_secs(60)).with_tpm(10));
        assert!(limiter.try_acquire(10).is_some());
        assert!(limiter.try_acquire(0).is_some());
    }

    #[test]
    fn test_oversized_request_admitted_alone() {
        let limiter = limiter(RateLimitConfig::new(Duration::from_secs(60)).with_tpm(10));
        assert!(limiter.try_acquire(5).is_some());
        assert!(limiter.try_acquire(50).is_none());

        let fresh = RateLimiter::new(RateLimitConfig::new(Duration::from_secs(60)).with_tpm(10))
            .unwrap();
        assert!(fresh.try_acquire(50).is_some());
        assert!(fresh.try_acquire(1).is_none());
    }

    #[test]
    fn test_stagger_blocks_back_to_back_admissions() {
        let limiter = limiter(RateLimitConfig::new(Duration::from_secs(10)).with_rpm(10));
        assert!(limiter.try_acquire(0).is_some());
        assert!(limiter.try_acquire(0).is_none());
    }

    #[test]
    fn test_window_slides() {
        let limiter = limiter(
            RateLimitConfig::new(Duration::from_millis(100))
                .with_rpm(1)
                .with_tpm(1_000),
        );
        assert!(limiter.try_acquire(1).is_some());
        assert!(limiter.try_acquire(1).is_none());
        std::thread::sleep(Duration::from_millis(120));
        assert!(limiter.try_acquire(1).is_some());
    }

    #[test]
    fn test_wait_for_tokens_targets_first_sufficient_expiry() {
        let start = Instant::now();
        let period = Duration::from_secs(10);
        let mut state = WindowState::default();
        state.record(start, 30);
        state.record(start + Duration::from_secs(1), 30);
        state.record(start + Duration::from_secs(2), 30);

        // Need 50 free of 100: two entries must leave.
        let wait = state.wait_for_tokens(start, period, |sum| sum + 50 <= 100);
        assert_eq!(wait, Duration::from_secs(11));
    }
}

//! In-process retry counters.

use std::sync::atomic::{AtomicU64, Ordering};
use tollgate_error::ObserverError;
use tollgate_interface::RetryObserver;

/// Retry observer that keeps running totals.
///
/// Share one instance between the blocking and suspending chains of a model
/// to count both together.
#[derive(Debug, Default)]
pub struct RetryMetrics {
    calls: AtomicU64,
    retries: AtomicU64,
    max_retries: AtomicU64,
}

impl RetryMetrics {
    /// Empty counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Completed calls observed.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    /// Retries summed over all completed calls.
    pub fn retries(&self) -> u64 {
        self.retries.load(Ordering::Relaxed)
    }

    /// Most retries any single call needed.
    pub fn max_retries(&self) -> u64 {
        self.max_retries.load(Ordering::Relaxed)
    }
}

impl RetryObserver for RetryMetrics {
    fn record_retries(&self, count: u32) -> Result<(), ObserverError> {
        let count = u64::from(count);
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.retries.fetch_add(count, Ordering::Relaxed);
        self.max_retries.fetch_max(count, Ordering::Relaxed);
        Ok(())
    }
}

//! Retry observation.

use tollgate_error::ObserverError;

/// Sink for the number of retries a completed call needed.
///
/// The retry service reports once per call, after success or exhaustion.
/// Failures returned here are logged and ignored.
pub trait RetryObserver: Send + Sync {
    /// Record the retry count of one completed call.
    fn record_retries(&self, count: u32) -> Result<(), ObserverError>;
}

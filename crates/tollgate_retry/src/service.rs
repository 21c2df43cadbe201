//! Retry execution.

use crate::Backoff;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tokio_retry2::{Retry, RetryError};
use tollgate_interface::RetryObserver;
use tracing::{debug, instrument, warn};

/// Runs fallible calls under a backoff strategy.
///
/// A call is invoked at most `max_retries + 1` times. When every attempt
/// fails, the error from the last attempt is returned unchanged. An attached
/// [`RetryObserver`] receives the retry count of every completed call;
/// observer errors and panics are logged and otherwise ignored.
///
/// One service is shared by the blocking and suspending call chains of a
/// model, so both report to the same observer.
#[derive(Clone)]
pub struct RetryService {
    backoff: Arc<dyn Backoff>,
    observer: Option<Arc<dyn RetryObserver>>,
}

impl RetryService {
    /// Service using `backoff`, with no observer.
    pub fn new(backoff: Arc<dyn Backoff>) -> Self {
        Self {
            backoff,
            observer: None,
        }
    }

    /// Attach an observer for retry counts.
    pub fn with_observer(mut self, observer: Arc<dyn RetryObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Strategy name.
    pub fn name(&self) -> &str {
        self.backoff.name()
    }

    /// The backoff schedule.
    pub fn backoff(&self) -> &Arc<dyn Backoff> {
        &self.backoff
    }

    /// Blocking retry of `f`, treating every error as transient.
    ///
    /// Backoff delays put the current thread to sleep.
    pub fn retry<R, E, F>(&self, f: F) -> Result<R, E>
    where
        F: FnMut() -> Result<R, E>,
        E: fmt::Display,
    {
        self.retry_if(f, |_| true)
    }

    /// Blocking retry of `f`; errors rejected by `is_transient` are returned
    /// at once.
    #[instrument(skip_all, fields(strategy = self.name(), max_retries = self.backoff.max_retries()))]
    pub fn retry_if<R, E, F, P>(&self, mut f: F, is_transient: P) -> Result<R, E>
    where
        F: FnMut() -> Result<R, E>,
        E: fmt::Display,
        P: Fn(&E) -> bool,
    {
        let max_retries = self.backoff.max_retries();
        let mut attempt = 0;
        loop {
            attempt += 1;
            match f() {
                Ok(value) => {
                    self.report(attempt - 1);
                    return Ok(value);
                }
                Err(e) if attempt > max_retries || !is_transient(&e) => {
                    warn!(attempt, error = %e, "Giving up");
                    self.report(attempt - 1);
                    return Err(e);
                }
                Err(e) => {
                    let delay = self.backoff.delay(attempt);
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Call failed, will retry"
                    );
                    std::thread::sleep(delay);
                }
            }
        }
    }

    /// Suspending retry of `f`, treating every error as transient.
    ///
    /// Dropping the returned future during a backoff delay abandons the call
    /// without reporting to the observer.
    pub async fn aretry<R, E, F, Fut>(&self, f: F) -> Result<R, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<R, E>>,
        E: fmt::Display,
    {
        self.aretry_if(f, |_| true).await
    }

    /// Suspending retry of `f`; errors rejected by `is_transient` are
    /// returned at once.
    #[instrument(skip_all, fields(strategy = self.name(), max_retries = self.backoff.max_retries()))]
    pub async fn aretry_if<R, E, F, Fut, P>(&self, mut f: F, is_transient: P) -> Result<R, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<R, E>>,
        E: fmt::Display,
        P: Fn(&E) -> bool,
    {
        let backoff = Arc::clone(&self.backoff);
        let schedule = (1..=backoff.max_retries()).map(move |attempt| backoff.delay(attempt));
        let is_transient = &is_transient;
        let mut attempts: u32 = 0;

        let result = Retry::spawn(schedule, || {
            attempts += 1;
            let attempt = attempts;
            let call = f();
            async move {
                match call.await {
                    Ok(value) => Ok(value),
                    Err(e) if is_transient(&e) => {
                        warn!(attempt, error = %e, "Call failed, will retry");
                        Err(RetryError::Transient {
                            err: e,
                            retry_after: None,
                        })
                    }
                    Err(e) => {
                        warn!(attempt, error = %e, "Permanent error, failing immediately");
                        Err(RetryError::Permanent(e))
                    }
                }
            }
        })
        .await;

        self.report(attempts.saturating_sub(1));
        result
    }

    fn report(&self, retries: u32) {
        debug!(retries, "Call completed");
        let Some(observer) = &self.observer else {
            return;
        };
        // A panicking observer counts as a failed one.
        match panic::catch_unwind(AssertUnwindSafe(|| observer.record_retries(retries))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "Retry observer failed"),
            Err(_) => warn!(retries, "Retry observer panicked"),
        }
    }
}

impl fmt::Debug for RetryService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryService")
            .field("backoff", &self.backoff)
            .field("observed", &self.observer.is_some())
            .finish()
    }
}

//! Rate-limiting middleware layer.

use crate::Limiter;
use async_trait::async_trait;
use std::sync::Arc;
use tollgate_core::{CompletionRequest, TokenEstimator};
use tollgate_interface::{AsyncInvoke, Invoke};

/// Waits for admission before every call to the inner layer.
///
/// The blocking and suspending impls consult the same shared [`Limiter`], so
/// a model used from threads and tasks at once is throttled as a whole.
#[derive(Debug, Clone)]
pub struct RateLimitedCall<I> {
    inner: I,
    limiter: Arc<dyn Limiter>,
    estimator: Arc<dyn TokenEstimator>,
}

impl<I> RateLimitedCall<I> {
    /// Wrap `inner` with admission control.
    pub fn new(inner: I, limiter: Arc<dyn Limiter>, estimator: Arc<dyn TokenEstimator>) -> Self {
        Self {
            inner,
            limiter,
            estimator,
        }
    }

    /// The shared limiter.
    pub fn limiter(&self) -> &Arc<dyn Limiter> {
        &self.limiter
    }
}

impl<I, R, E> Invoke<R, E> for RateLimitedCall<I>
where
    I: Invoke<R, E>,
{
    fn invoke(&self, request: &CompletionRequest) -> Result<R, E> {
        let tokens = self.estimator.estimate(request);
        let _guard = self.limiter.acquire_blocking(tokens);
        Invoke::invoke(&self.inner, request)
    }
}

#[async_trait]
impl<I, R, E> AsyncInvoke<R, E> for RateLimitedCall<I>
where
    I: AsyncInvoke<R, E>,
    R: Send + 'static,
    E: Send + 'static,
{
    async fn invoke(&self, request: &CompletionRequest) -> Result<R, E> {
        let tokens = self.estimator.estimate(request);
        let _guard = self.limiter.acquire(tokens).await;
        AsyncInvoke::invoke(&self.inner, request).await
    }
}

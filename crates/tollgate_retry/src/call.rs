//! Retrying middleware layer.

use crate::RetryService;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tollgate_core::CompletionRequest;
use tollgate_interface::{AsyncInvoke, Invoke};

/// Re-invokes the inner layer on failure according to a shared
/// [`RetryService`].
#[derive(Debug, Clone)]
pub struct RetryingCall<I> {
    inner: I,
    service: Arc<RetryService>,
}

impl<I> RetryingCall<I> {
    /// Wrap `inner` with retries.
    pub fn new(inner: I, service: Arc<RetryService>) -> Self {
        Self { inner, service }
    }

    /// The shared retry service.
    pub fn service(&self) -> &Arc<RetryService> {
        &self.service
    }
}

impl<I, R, E> Invoke<R, E> for RetryingCall<I>
where
    I: Invoke<R, E>,
    E: fmt::Display,
{
    fn invoke(&self, request: &CompletionRequest) -> Result<R, E> {
        let inner = &self.inner;
        self.service.retry(|| Invoke::invoke(inner, request))
    }
}

#[async_trait]
impl<I, R, E> AsyncInvoke<R, E> for RetryingCall<I>
where
    I: AsyncInvoke<R, E>,
    R: Send + 'static,
    E: fmt::Display + Send + 'static,
{
    async fn invoke(&self, request: &CompletionRequest) -> Result<R, E> {
        let inner = &self.inner;
        self.service
            .aretry(move || AsyncInvoke::invoke(inner, request))
            .await
    }
}

//! Outermost logging layer.

use async_trait::async_trait;
use std::fmt;
use tollgate_core::CompletionRequest;
use tollgate_interface::{AsyncInvoke, Invoke};
use tracing::error;

/// Logs every failure of the inner chain, then returns it untouched.
///
/// One `error` event is emitted per failed call, carrying the model, the
/// retry strategy the call ran under and a summary of the request.
#[derive(Debug, Clone)]
pub struct LoggedCall<I> {
    inner: I,
    model: String,
    strategy: String,
}

impl<I> LoggedCall<I> {
    /// Wrap `inner`. `strategy` names the retry strategy in log events.
    pub fn new(inner: I, model: impl Into<String>, strategy: impl Into<String>) -> Self {
        Self {
            inner,
            model: model.into(),
            strategy: strategy.into(),
        }
    }

    fn log_failure(&self, request: &CompletionRequest, e: &dyn fmt::Display) {
        error!(
            model = %self.model,
            strategy = %self.strategy,
            request_name = request.name().as_deref().unwrap_or(""),
            streaming = *request.streaming(),
            message_count = request.input().len(),
            error = %e,
            "Model call failed"
        );
    }
}

impl<I, R, E> Invoke<R, E> for LoggedCall<I>
where
    I: Invoke<R, E>,
    E: fmt::Display,
{
    fn invoke(&self, request: &CompletionRequest) -> Result<R, E> {
        Invoke::invoke(&self.inner, request).inspect_err(|e| self.log_failure(request, e))
    }
}

#[async_trait]
impl<I, R, E> AsyncInvoke<R, E> for LoggedCall<I>
where
    I: AsyncInvoke<R, E>,
    R: Send + 'static,
    E: fmt::Display + Send + 'static,
{
    async fn invoke(&self, request: &CompletionRequest) -> Result<R, E> {
        AsyncInvoke::invoke(&self.inner, request)
            .await
            .inspect_err(|e| self.log_failure(request, e))
    }
}

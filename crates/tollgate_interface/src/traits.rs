//! Call traits shared by the base call and every middleware layer.

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use tollgate_core::CompletionRequest;

/// A blocking call that turns a request into a response.
///
/// Implemented by the caller's base call and by every middleware layer, so
/// layers compose by wrapping one `Invoke` in another. Use [`invoke_fn`] to
/// turn a closure into an `Invoke`.
///
/// # Examples
///
/// ```
/// use tollgate_core::{CompletionRequest, Message};
/// use tollgate_interface::{Invoke, invoke_fn};
///
/// let echo = invoke_fn(|request: &CompletionRequest| -> Result<usize, String> {
///     Ok(request.input().len())
/// });
///
/// let request = CompletionRequest::messages(vec![Message::user("hi")]);
/// assert_eq!(echo.invoke(&request), Ok(1));
/// ```
pub trait Invoke<R, E>: Send + Sync {
    /// Perform the call.
    fn invoke(&self, request: &CompletionRequest) -> Result<R, E>;
}

impl<T, R, E> Invoke<R, E> for Arc<T>
where
    T: Invoke<R, E> + ?Sized,
{
    fn invoke(&self, request: &CompletionRequest) -> Result<R, E> {
        (**self).invoke(request)
    }
}

/// A suspending call that turns a request into a response.
///
/// Use [`async_invoke_fn`] to turn a closure returning a future into an
/// `AsyncInvoke`.
#[async_trait]
pub trait AsyncInvoke<R, E>: Send + Sync {
    /// Perform the call.
    async fn invoke(&self, request: &CompletionRequest) -> Result<R, E>;
}

#[async_trait]
impl<T, R, E> AsyncInvoke<R, E> for Arc<T>
where
    T: AsyncInvoke<R, E> + ?Sized,
    R: Send + 'static,
    E: Send + 'static,
{
    async fn invoke(&self, request: &CompletionRequest) -> Result<R, E> {
        (**self).invoke(request).await
    }
}

/// Blocking call built from a closure. See [`invoke_fn`].
#[derive(Clone, Copy)]
pub struct InvokeFn<F> {
    f: F,
}

/// Wrap a closure `Fn(&CompletionRequest) -> Result<R, E>` as an [`Invoke`].
pub fn invoke_fn<F>(f: F) -> InvokeFn<F> {
    InvokeFn { f }
}

impl<F, R, E> Invoke<R, E> for InvokeFn<F>
where
    F: Fn(&CompletionRequest) -> Result<R, E> + Send + Sync,
{
    fn invoke(&self, request: &CompletionRequest) -> Result<R, E> {
        (self.f)(request)
    }
}

/// Suspending call built from a closure. See [`async_invoke_fn`].
#[derive(Clone, Copy)]
pub struct AsyncInvokeFn<F> {
    f: F,
}

/// Wrap a closure `Fn(CompletionRequest) -> impl Future<Output = Result<R, E>>`
/// as an [`AsyncInvoke`]. The request is cloned for every invocation.
pub fn async_invoke_fn<F>(f: F) -> AsyncInvokeFn<F> {
    AsyncInvokeFn { f }
}

#[async_trait]
impl<F, Fut, R, E> AsyncInvoke<R, E> for AsyncInvokeFn<F>
where
    F: Fn(CompletionRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
{
    async fn invoke(&self, request: &CompletionRequest) -> Result<R, E> {
        (self.f)(request.clone()).await
    }
}

//! Trait definitions for the Tollgate request middleware.
//!
//! These are the seams between the middleware and its collaborators:
//! - [`Invoke`] / [`AsyncInvoke`]: the base call and every layer wrapped around it
//! - [`Cache`]: the response store consulted by the cache layer
//! - [`RetryObserver`]: an optional sink for retry counts

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod observer;
mod traits;

pub use cache::Cache;
pub use observer::RetryObserver;
pub use traits::{AsyncInvoke, AsyncInvokeFn, Invoke, InvokeFn, async_invoke_fn, invoke_fn};

//! Retry execution for outbound model calls.
//!
//! A [`RetryService`] runs a fallible call, waits according to a [`Backoff`]
//! strategy after each failure, and re-invokes the call until it succeeds or
//! the retry budget is spent. Exhaustion hands back the error from the final
//! attempt exactly as the call produced it.
//!
//! # Strategies
//!
//! | name | delay before retry `n` |
//! |---|---|
//! | `native` | none |
//! | `exponential_backoff` | `base_delay^n` seconds, plus jitter in `[0, 1)` |
//! | `random_wait` | uniform in `[0, max_retry_wait]` seconds |
//! | `incremental_wait` | `max_retry_wait / max_retries * n` seconds |
//!
//! Strategies are resolved by name through a [`RetryFactory`], which also
//! accepts new strategies at runtime.
//!
//! # Example
//!
//! ```
//! use tollgate_core::RetryStrategyKind;
//! use tollgate_retry::{RetryFactory, RetryPolicy};
//!
//! let factory = RetryFactory::default();
//! let service = factory
//!     .create(&RetryPolicy::new(RetryStrategyKind::Native).with_max_retries(2))
//!     .unwrap()
//!     .unwrap();
//!
//! let mut calls = 0;
//! let result: Result<(), String> = service.retry(|| {
//!     calls += 1;
//!     Err(format!("attempt {} failed", calls))
//! });
//!
//! assert_eq!(calls, 3);
//! assert_eq!(result.unwrap_err(), "attempt 3 failed");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod backoff;
mod call;
mod factory;
mod metrics;
mod policy;
mod service;

pub use backoff::{Backoff, BuiltinBackoff};
pub use call::RetryingCall;
pub use factory::{BackoffConstructor, RetryFactory};
pub use metrics::RetryMetrics;
pub use policy::RetryPolicy;
pub use service::RetryService;

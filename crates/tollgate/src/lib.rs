//! Tollgate - resilient middleware for outbound LLM calls
//!
//! Tollgate wraps the calls an indexing or query pipeline makes to external
//! completion and embedding services. Each configured model gets one fixed
//! chain of layers, built identically for blocking and async callers:
//!
//! ```text
//! Logging ─▶ Cache ─▶ Retry ─▶ RateLimiter ─▶ base call
//! ```
//!
//! # Features
//!
//! - **Rate limiting**: sliding-window limits on requests and estimated
//!   tokens per period, shared by threads and tasks
//! - **Retries**: `native`, `exponential_backoff`, `random_wait` and
//!   `incremental_wait` strategies that hand back the original error
//! - **Caching**: content-addressed response cache; streaming requests
//!   bypass it and corrupt entries degrade to a live call
//! - **Logging**: one structured event per failed call
//! - **Extension**: strategy registries accept new limiters and backoffs
//!   at runtime
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tollgate::{Composer, FileCache, RetryMetrics, TollgateConfig};
//!
//! let config = TollgateConfig::load()?;
//! let metrics = Arc::new(RetryMetrics::new());
//!
//! let chat = Composer::default().compose(
//!     config.model("default_chat")?,
//!     invoke_fn(|request| client.complete(request)),
//!     async_invoke_fn(|request| async move { client.acomplete(&request).await }),
//!     Some(Arc::new(FileCache::new("cache")?)),
//!     Some(metrics.clone()),
//! )?;
//!
//! let response = chat.ainvoke(&request).await?;
//! ```
//!
//! # Architecture
//!
//! - `tollgate_error` - Error types
//! - `tollgate_core` - Requests, model configuration, token estimation
//! - `tollgate_interface` - Call, cache and observer traits
//! - `tollgate_rate_limit` - Sliding-window rate limiting
//! - `tollgate_retry` - Retry strategies
//! - `tollgate_cache` - Response caching
//!
//! This crate adds the logging layer, the composer and configuration
//! loading, and re-exports everything for convenience.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod composer;
mod config;
mod logging;

pub use composer::{ComposedModel, Composer};
pub use config::TollgateConfig;
pub use logging::LoggedCall;

pub use tollgate_cache::*;
pub use tollgate_core::*;
pub use tollgate_error::*;
pub use tollgate_interface::*;
pub use tollgate_rate_limit::*;
pub use tollgate_retry::*;

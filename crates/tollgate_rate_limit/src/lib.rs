//! Rate limiting for outbound model calls.
//!
//! This crate admits requests against a trailing time window, limiting both
//! the number of requests and their estimated token cost per period. One
//! limiter instance is shared by every caller of a model, whether the caller
//! blocks a thread or suspends a task.
//!
//! - [`RateLimiter`]: the sliding-window limiter
//! - [`Limiter`]: the trait limiters expose to the middleware
//! - [`RateLimiterFactory`]: named constructors, open for registration
//! - [`RateLimitedCall`]: the middleware layer wrapping a call

mod call;
mod config;
mod factory;
mod limiter;

pub use call::RateLimitedCall;
pub use config::RateLimitConfig;
pub use factory::{LimiterConstructor, RateLimiterFactory};
pub use limiter::{Limiter, RateLimiter, RateLimiterGuard, WindowSnapshot};

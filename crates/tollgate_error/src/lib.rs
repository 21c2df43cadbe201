//! Error types for the Tollgate middleware.
//!
//! This crate provides the error types shared by every Tollgate layer.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! Errors produced by the wrapped base call are *not* represented here. The
//! middleware is generic over the caller's error type and hands it back
//! untouched; these types only cover the middleware's own failure modes.
//!
//! # Examples
//!
//! ```
//! use tollgate_error::{ConfigError, TollgateResult};
//!
//! fn validate_rpm(rpm: u32) -> TollgateResult<u32> {
//!     if rpm == 0 {
//!         Err(ConfigError::new("requests_per_minute must be positive"))?
//!     }
//!     Ok(rpm)
//! }
//!
//! assert!(validate_rpm(0).is_err());
//! assert_eq!(validate_rpm(60).unwrap(), 60);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod config;
mod error;
mod observer;
mod registry;

pub use cache::{CacheError, CacheErrorKind};
pub use config::ConfigError;
pub use error::{TollgateError, TollgateErrorKind, TollgateResult};
pub use observer::ObserverError;
pub use registry::{RegistryError, RegistryErrorKind};

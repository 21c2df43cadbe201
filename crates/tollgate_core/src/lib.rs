//! Core data types for the Tollgate request middleware.
//!
//! This crate provides the request model every middleware layer reads, the
//! per-model configuration the composer consumes, token estimation for rate
//! limiting, and tracing initialization.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod message;
mod model_config;
mod request;
mod role;
mod telemetry;
mod token_counting;

pub use message::Message;
pub use model_config::{ModelConfig, ModelConfigBuilder, ModelConfigBuilderError, RetryStrategyKind};
pub use request::{CompletionRequest, ModelParameters, RequestInput};
pub use role::Role;
pub use telemetry::{init_tracing, init_tracing_json};
pub use token_counting::{BudgetedEstimator, CharEstimator, TiktokenEstimator, TokenEstimator};

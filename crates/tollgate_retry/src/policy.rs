//! Retry policy parameters.

use derive_getters::Getters;
use derive_setters::Setters;
use tollgate_core::{ModelConfig, RetryStrategyKind};

/// Strategy tag plus the numeric parameters every strategy draws from.
///
/// Immutable once handed to a [`RetryFactory`](crate::RetryFactory); the
/// factory validates it against the chosen strategy.
#[derive(Debug, Clone, PartialEq, Getters, Setters)]
#[setters(prefix = "with_")]
pub struct RetryPolicy {
    /// Which strategy to build
    strategy: RetryStrategyKind,
    /// Retries allowed after the first attempt
    max_retries: u32,
    /// Base of the exponential backoff, in seconds
    base_delay: f64,
    /// Upper bound for random and incremental waits, in seconds
    max_retry_wait: f64,
    /// Add uniform jitter to exponential delays
    jitter: bool,
}

impl RetryPolicy {
    /// Policy for `strategy` with default parameters.
    pub fn new(strategy: RetryStrategyKind) -> Self {
        Self {
            strategy,
            ..Default::default()
        }
    }

    /// Extract the retry parameters of a model configuration.
    pub fn from_model(model: &ModelConfig) -> Self {
        Self {
            strategy: model.retry_strategy().clone(),
            max_retries: *model.max_retries(),
            base_delay: *model.base_delay(),
            max_retry_wait: *model.max_retry_wait(),
            jitter: *model.jitter(),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            strategy: RetryStrategyKind::Native,
            max_retries: 10,
            base_delay: 2.0,
            max_retry_wait: 10.0,
            jitter: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_model_copies_retry_fields() {
        let model = ModelConfig::builder()
            .model("gpt-4o")
            .retry_strategy(RetryStrategyKind::RandomWait)
            .max_retries(4u32)
            .max_retry_wait(3.5)
            .build()
            .unwrap();

        let policy = RetryPolicy::from_model(&model);
        assert_eq!(*policy.strategy(), RetryStrategyKind::RandomWait);
        assert_eq!(*policy.max_retries(), 4);
        assert_eq!(*policy.max_retry_wait(), 3.5);
        assert!(*policy.jitter());
    }
}

//! Token estimation for rate limiting.

use crate::CompletionRequest;
use std::fmt;
use std::sync::Arc;
use tiktoken_rs::CoreBPE;
use tollgate_error::{ConfigError, TollgateResult};

/// Estimates the token cost of a request before it is sent.
///
/// The rate limiter charges this estimate against the tokens-per-period
/// budget at admission time.
pub trait TokenEstimator: Send + Sync + fmt::Debug {
    /// Number of tokens in a text fragment.
    fn count(&self, text: &str) -> u64;

    /// Prompt tokens plus the requested completion budget.
    fn estimate(&self, request: &CompletionRequest) -> u64 {
        let prompt: u64 = request
            .input()
            .texts()
            .into_iter()
            .map(|text| self.count(text))
            .sum();
        let completion = request.parameters().max_tokens.map(u64::from).unwrap_or(0);
        prompt + completion
    }
}

/// BPE-accurate estimator backed by `tiktoken-rs`.
#[derive(Clone)]
pub struct TiktokenEstimator {
    bpe: Arc<CoreBPE>,
    encoding: String,
}

impl TiktokenEstimator {
    /// Load the tokenizer for a model, falling back to `cl100k_base` for
    /// models tiktoken does not know.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no tokenizer can be loaded at all.
    pub fn for_model(model: &str) -> TollgateResult<Self> {
        match tiktoken_rs::get_bpe_from_model(model) {
            Ok(bpe) => Ok(Self {
                bpe: Arc::new(bpe),
                encoding: model.to_string(),
            }),
            Err(e) => {
                tracing::debug!(model, error = %e, "No model-specific tokenizer, using cl100k_base");
                Self::cl100k()
            }
        }
    }

    /// The `cl100k_base` encoding.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the encoding data cannot be loaded.
    pub fn cl100k() -> TollgateResult<Self> {
        let bpe = tiktoken_rs::cl100k_base()
            .map_err(|e| ConfigError::new(format!("Failed to load cl100k_base: {}", e)))?;
        Ok(Self {
            bpe: Arc::new(bpe),
            encoding: "cl100k_base".to_string(),
        })
    }
}

impl fmt::Debug for TiktokenEstimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TiktokenEstimator")
            .field("encoding", &self.encoding)
            .finish()
    }
}

impl TokenEstimator for TiktokenEstimator {
    fn count(&self, text: &str) -> u64 {
        self.bpe.encode_with_special_tokens(text).len() as u64
    }
}

/// Cheap heuristic: one token per four bytes of text.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharEstimator;

impl TokenEstimator for CharEstimator {
    fn count(&self, text: &str) -> u64 {
        if text.is_empty() {
            0
        } else {
            (text.len() / 4).max(1) as u64
        }
    }
}

/// Charges a default completion budget to requests that set none.
///
/// Requests carrying their own `max_tokens` are estimated by the inner
/// estimator unchanged.
#[derive(Debug, Clone)]
pub struct BudgetedEstimator {
    inner: Arc<dyn TokenEstimator>,
    max_tokens: u32,
}

impl BudgetedEstimator {
    /// Wrap `inner`, adding `max_tokens` when a request has no budget.
    pub fn new(inner: Arc<dyn TokenEstimator>, max_tokens: u32) -> Self {
        Self { inner, max_tokens }
    }
}

impl TokenEstimator for BudgetedEstimator {
    fn count(&self, text: &str) -> u64 {
        self.inner.count(text)
    }

    fn estimate(&self, request: &CompletionRequest) -> u64 {
        let estimate = self.inner.estimate(request);
        match request.parameters().max_tokens {
            Some(_) => estimate,
            None => estimate + u64::from(self.max_tokens),
        }
    }
}

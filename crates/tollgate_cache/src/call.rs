//! Caching middleware layer.

use crate::{CacheEnvelope, CacheLookup, cache_key};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;
use tollgate_core::{CompletionRequest, RequestInput};
use tollgate_interface::{AsyncInvoke, Cache, Invoke};
use tracing::{debug, warn};

/// Replays stored responses for repeated requests.
///
/// Streaming requests always go straight to the inner layer. For every other
/// request the layer looks up [`cache_key`]; a decodable entry is returned
/// without a live call, anything else falls through to the inner layer, and
/// only successful responses are stored.
///
/// The key prefix defaults to `chat` for message input and `embedding` for
/// batch input.
#[derive(Debug, Clone)]
pub struct CachedCall<I> {
    inner: I,
    cache: Arc<dyn Cache>,
    model: String,
    prefix: Option<String>,
}

impl<I> CachedCall<I> {
    /// Wrap `inner`, storing responses of `model` in `cache`.
    pub fn new(inner: I, cache: Arc<dyn Cache>, model: impl Into<String>) -> Self {
        Self {
            inner,
            cache,
            model: model.into(),
            prefix: None,
        }
    }

    /// Use a fixed key prefix for every request.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    fn prefix_for<'a>(&'a self, request: &CompletionRequest) -> &'a str {
        match (&self.prefix, request.input()) {
            (Some(prefix), _) => prefix,
            (None, RequestInput::Messages(_)) => "chat",
            (None, RequestInput::Batch(_)) => "embedding",
        }
    }

    /// Key for `request` and any stored response under it.
    ///
    /// `None` for the key means the request cannot be cached at all.
    fn lookup<R: DeserializeOwned>(
        &self,
        request: &CompletionRequest,
    ) -> (Option<String>, Option<R>) {
        let key = match cache_key(&self.model, request, self.prefix_for(request)) {
            Ok(key) => key,
            Err(e) => {
                warn!(error = %e, "Cannot compute cache key, calling through");
                return (None, None);
            }
        };

        let stored = match self.cache.get(&key) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache read failed, treating as miss");
                None
            }
        };

        match CacheEnvelope::decode(stored) {
            CacheLookup::Hit(response) => {
                debug!(key = %key, "Cache hit");
                (Some(key), Some(response))
            }
            CacheLookup::Miss => {
                debug!(key = %key, "Cache miss");
                (Some(key), None)
            }
            CacheLookup::Corrupt(reason) => {
                warn!(key = %key, reason = %reason, "Corrupt cache entry, calling through");
                (Some(key), None)
            }
        }
    }

    fn store<R: Serialize>(&self, key: &str, request: &CompletionRequest, response: &R) {
        let envelope = serde_json::to_value(response).and_then(|result| {
            Ok(CacheEnvelope {
                result,
                input: request.cache_parameters()?,
                model: self.model.clone(),
            })
        });
        let value = match envelope.and_then(|envelope| serde_json::to_value(&envelope)) {
            Ok(value) => value,
            Err(e) => {
                warn!(key = %key, error = %e, "Cannot serialize response, not caching");
                return;
            }
        };

        let metadata = json!({
            "model": self.model,
            "name": request.name(),
        });
        if let Err(e) = self.cache.set(key, value, Some(metadata)) {
            warn!(key = %key, error = %e, "Cache write failed");
        }
    }
}

impl<I, R, E> Invoke<R, E> for CachedCall<I>
where
    I: Invoke<R, E>,
    R: Serialize + DeserializeOwned,
{
    fn invoke(&self, request: &CompletionRequest) -> Result<R, E> {
        if *request.streaming() {
            return Invoke::invoke(&self.inner, request);
        }

        let (key, cached) = self.lookup::<R>(request);
        if let Some(response) = cached {
            return Ok(response);
        }

        let response = Invoke::invoke(&self.inner, request)?;
        if let Some(key) = key {
            self.store(&key, request, &response);
        }
        Ok(response)
    }
}

#[async_trait]
impl<I, R, E> AsyncInvoke<R, E> for CachedCall<I>
where
    I: AsyncInvoke<R, E>,
    R: Serialize + DeserializeOwned + Send + 'static,
    E: Send + 'static,
{
    async fn invoke(&self, request: &CompletionRequest) -> Result<R, E> {
        if *request.streaming() {
            return AsyncInvoke::invoke(&self.inner, request).await;
        }

        let (key, cached) = self.lookup::<R>(request);
        if let Some(response) = cached {
            return Ok(response);
        }

        let response = AsyncInvoke::invoke(&self.inner, request).await?;
        if let Some(key) = key {
            self.store(&key, request, &response);
        }
        Ok(response)
    }
}

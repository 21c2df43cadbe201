//! Builds the middleware chain for a model.

use crate::LoggedCall;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use tollgate_cache::CachedCall;
use tollgate_core::{
    BudgetedEstimator, CharEstimator, CompletionRequest, ModelConfig, TiktokenEstimator,
    TokenEstimator,
};
use tollgate_error::TollgateResult;
use tollgate_interface::{AsyncInvoke, Cache, Invoke, RetryObserver};
use tollgate_rate_limit::{Limiter, RateLimitConfig, RateLimitedCall, RateLimiterFactory};
use tollgate_retry::{RetryFactory, RetryPolicy, RetryService, RetryingCall};
use tracing::{info, instrument, warn};

/// Assembles `Logging(Cache(Retry(RateLimiter(base))))` from a
/// [`ModelConfig`].
///
/// The composer owns the strategy registries it resolves names against.
/// Build one at startup, register any custom strategies, and share it.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tollgate::{Composer, CompletionRequest, Message, MemoryCache, ModelConfig, async_invoke_fn, invoke_fn};
///
/// let config = ModelConfig::builder()
///     .model("gpt-4o-mini")
///     .requests_per_minute(600u32)
///     .build()
///     .unwrap();
///
/// let model = Composer::default()
///     .compose(
///         &config,
///         invoke_fn(|request: &CompletionRequest| {
///             Ok::<_, String>(request.input().texts().join(" ").to_uppercase())
///         }),
///         async_invoke_fn(|request: CompletionRequest| async move {
///             Ok::<_, String>(request.input().texts().join(" ").to_uppercase())
///         }),
///         Some(Arc::new(MemoryCache::default())),
///         None,
///     )
///     .unwrap();
///
/// let request = CompletionRequest::messages(vec![Message::user("hello")]);
/// assert_eq!(model.invoke(&request), Ok("HELLO".to_string()));
/// assert!(model.limiter().is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Composer {
    rate_limiters: RateLimiterFactory,
    retries: RetryFactory,
    estimator: Option<Arc<dyn TokenEstimator>>,
}

impl Composer {
    /// Composer resolving strategies against the given registries.
    pub fn new(rate_limiters: RateLimiterFactory, retries: RetryFactory) -> Self {
        Self {
            rate_limiters,
            retries,
            estimator: None,
        }
    }

    /// Use `estimator` for every model instead of a tokenizer chosen per model.
    ///
    /// A model's configured `max_tokens` is still charged to requests that
    /// set no budget of their own.
    pub fn with_estimator(mut self, estimator: Arc<dyn TokenEstimator>) -> Self {
        self.estimator = Some(estimator);
        self
    }

    /// The rate limiter registry.
    pub fn rate_limiters(&self) -> &RateLimiterFactory {
        &self.rate_limiters
    }

    /// The retry registry.
    pub fn retries(&self) -> &RetryFactory {
        &self.retries
    }

    fn estimator_for(&self, config: &ModelConfig) -> Arc<dyn TokenEstimator> {
        let model = config.model().as_str();
        let estimator: Arc<dyn TokenEstimator> = match &self.estimator {
            Some(estimator) => Arc::clone(estimator),
            None => match TiktokenEstimator::for_model(model) {
                Ok(estimator) => Arc::new(estimator),
                Err(e) => {
                    warn!(model, error = %e, "No tokenizer available, estimating from length");
                    Arc::new(CharEstimator)
                }
            },
        };
        match *config.max_tokens() {
            Some(max_tokens) => Arc::new(BudgetedEstimator::new(estimator, max_tokens)),
            None => estimator,
        }
    }

    /// Build the blocking and suspending call chains for one model.
    ///
    /// Layers are added innermost first: the rate limiter when
    /// `requests_per_minute` or `tokens_per_minute` is set, retries unless
    /// the strategy is `none`, the cache when one is supplied, and logging
    /// always. Both chains share one limiter and one retry service. The
    /// cache is scoped to the model through [`Cache::child`].
    ///
    /// # Errors
    ///
    /// Returns a configuration or registry error for invalid rate limit or
    /// retry settings.
    #[instrument(skip_all, fields(model = %config.model()))]
    pub fn compose<R, E, S, A>(
        &self,
        config: &ModelConfig,
        base_sync: S,
        base_async: A,
        cache: Option<Arc<dyn Cache>>,
        observer: Option<Arc<dyn RetryObserver>>,
    ) -> TollgateResult<ComposedModel<R, E>>
    where
        S: Invoke<R, E> + 'static,
        A: AsyncInvoke<R, E> + 'static,
        R: Serialize + DeserializeOwned + Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        let model = config.model().to_string();

        let limiter = if config.is_rate_limited() {
            let limits = RateLimitConfig::from_model(config)?;
            Some(
                self.rate_limiters
                    .create(config.rate_limit_strategy(), &limits)?,
            )
        } else {
            None
        };

        let retry = self
            .retries
            .create(&RetryPolicy::from_model(config))?
            .map(|service| match &observer {
                Some(observer) => service.with_observer(Arc::clone(observer)),
                None => service,
            })
            .map(Arc::new);

        let mut sync_chain: Arc<dyn Invoke<R, E>> = Arc::new(base_sync);
        let mut async_chain: Arc<dyn AsyncInvoke<R, E>> = Arc::new(base_async);

        if let Some(limiter) = &limiter {
            let estimator = self.estimator_for(config);
            sync_chain = Arc::new(RateLimitedCall::new(
                sync_chain,
                Arc::clone(limiter),
                Arc::clone(&estimator),
            ));
            async_chain = Arc::new(RateLimitedCall::new(
                async_chain,
                Arc::clone(limiter),
                estimator,
            ));
        }

        if let Some(service) = &retry {
            sync_chain = Arc::new(RetryingCall::new(sync_chain, Arc::clone(service)));
            async_chain = Arc::new(RetryingCall::new(async_chain, Arc::clone(service)));
        }

        if let Some(cache) = &cache {
            let scoped = cache.child(&model);
            sync_chain = Arc::new(CachedCall::new(sync_chain, Arc::clone(&scoped), &model));
            async_chain = Arc::new(CachedCall::new(async_chain, scoped, &model));
        }

        let strategy = retry
            .as_ref()
            .map(|service| service.name().to_string())
            .unwrap_or_else(|| config.retry_strategy().to_string());
        sync_chain = Arc::new(LoggedCall::new(sync_chain, &model, &strategy));
        async_chain = Arc::new(LoggedCall::new(async_chain, &model, &strategy));

        info!(
            rate_limited = limiter.is_some(),
            strategy = %strategy,
            cached = cache.is_some(),
            "Composed model"
        );

        Ok(ComposedModel {
            model,
            sync_chain,
            async_chain,
            limiter,
            retry,
        })
    }
}

/// Blocking and suspending entry points for one configured model.
///
/// Cloning is cheap and every clone shares the same limiter, retry service
/// and cache.
pub struct ComposedModel<R, E> {
    model: String,
    sync_chain: Arc<dyn Invoke<R, E>>,
    async_chain: Arc<dyn AsyncInvoke<R, E>>,
    limiter: Option<Arc<dyn Limiter>>,
    retry: Option<Arc<RetryService>>,
}

impl<R, E> ComposedModel<R, E>
where
    R: Send + 'static,
    E: Send + 'static,
{
    /// Call the model, blocking the current thread.
    pub fn invoke(&self, request: &CompletionRequest) -> Result<R, E> {
        Invoke::invoke(&*self.sync_chain, request)
    }

    /// Call the model from an async task.
    pub async fn ainvoke(&self, request: &CompletionRequest) -> Result<R, E> {
        AsyncInvoke::invoke(&*self.async_chain, request).await
    }

    /// Model identity.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// The limiter shared by both entry points, if rate limited.
    pub fn limiter(&self) -> Option<&Arc<dyn Limiter>> {
        self.limiter.as_ref()
    }

    /// The retry service shared by both entry points, if retrying.
    pub fn retry_service(&self) -> Option<&Arc<RetryService>> {
        self.retry.as_ref()
    }
}

impl<R, E> Clone for ComposedModel<R, E> {
    fn clone(&self) -> Self {
        Self {
            model: self.model.clone(),
            sync_chain: Arc::clone(&self.sync_chain),
            async_chain: Arc::clone(&self.async_chain),
            limiter: self.limiter.clone(),
            retry: self.retry.clone(),
        }
    }
}

impl<R, E> fmt::Debug for ComposedModel<R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComposedModel")
            .field("model", &self.model)
            .field("limiter", &self.limiter)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

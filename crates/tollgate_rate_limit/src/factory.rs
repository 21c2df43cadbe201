//! Named registry of rate limiter constructors.

use crate::{Limiter, RateLimitConfig, RateLimiter};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tollgate_error::{RegistryError, RegistryErrorKind, TollgateResult};
use tracing::{debug, instrument};

/// Builds a limiter from validated parameters.
pub type LimiterConstructor =
    Arc<dyn Fn(&RateLimitConfig) -> TollgateResult<Arc<dyn Limiter>> + Send + Sync>;

/// Registry mapping strategy names to limiter constructors.
///
/// Construct one at startup and hand it to the composer. The default
/// registry knows `"sliding_window"`; additional strategies are added with
/// [`RateLimiterFactory::register`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tollgate_rate_limit::{Limiter, RateLimitConfig, RateLimiter, RateLimiterFactory};
///
/// let mut factory = RateLimiterFactory::default();
/// factory
///     .register("strict_window", |config: &RateLimitConfig| {
///         let limiter: Arc<dyn Limiter> = Arc::new(RateLimiter::new(config.clone())?);
///         Ok(limiter)
///     })
///     .unwrap();
///
/// let limiter = factory
///     .create("strict_window", &RateLimitConfig::per_minute().with_rpm(10))
///     .unwrap();
/// assert_eq!(limiter.name(), "sliding_window");
/// ```
#[derive(Clone)]
pub struct RateLimiterFactory {
    constructors: HashMap<String, LimiterConstructor>,
}

impl RateLimiterFactory {
    /// Create a registry with no strategies.
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Register a constructor under `name`.
    ///
    /// # Errors
    ///
    /// Returns a registry error if `name` is already taken.
    #[instrument(skip(self, constructor))]
    pub fn register<F>(
        &mut self,
        name: impl Into<String> + fmt::Debug,
        constructor: F,
    ) -> TollgateResult<()>
    where
        F: Fn(&RateLimitConfig) -> TollgateResult<Arc<dyn Limiter>> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.constructors.contains_key(&name) {
            return Err(RegistryError::new(RegistryErrorKind::DuplicateStrategy(name)).into());
        }
        debug!(strategy = %name, "Registered rate limiter strategy");
        self.constructors.insert(name, Arc::new(constructor));
        Ok(())
    }

    /// Build a limiter with the named strategy.
    ///
    /// # Errors
    ///
    /// Returns a registry error for unknown names, or whatever configuration
    /// error the constructor reports.
    #[instrument(skip(self, config))]
    pub fn create(
        &self,
        name: &str,
        config: &RateLimitConfig,
    ) -> TollgateResult<Arc<dyn Limiter>> {
        let constructor = self.constructors.get(name).ok_or_else(|| {
            RegistryError::new(RegistryErrorKind::UnknownStrategy(name.to_string()))
        })?;
        constructor(config)
    }

    /// Whether a strategy is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Registered strategy names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for RateLimiterFactory {
    fn default() -> Self {
        let mut constructors: HashMap<String, LimiterConstructor> = HashMap::new();
        constructors.insert(
            RateLimiter::NAME.to_string(),
            Arc::new(|config: &RateLimitConfig| -> TollgateResult<Arc<dyn Limiter>> {
                let limiter: Arc<dyn Limiter> = Arc::new(RateLimiter::new(config.clone())?);
                Ok(limiter)
            }),
        );
        Self { constructors }
    }
}

impl fmt::Debug for RateLimiterFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiterFactory")
            .field("strategies", &self.names())
            .finish()
    }
}

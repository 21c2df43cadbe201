//! Named registry of retry strategies.

use crate::{Backoff, BuiltinBackoff, RetryPolicy, RetryService};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tollgate_core::RetryStrategyKind;
use tollgate_error::{ConfigError, RegistryError, RegistryErrorKind, TollgateResult};
use tracing::{debug, instrument};

/// Builds a backoff schedule from a policy.
pub type BackoffConstructor =
    Arc<dyn Fn(&RetryPolicy) -> TollgateResult<Arc<dyn Backoff>> + Send + Sync>;

/// Registry mapping strategy names to backoff constructors.
///
/// The default registry knows the four built-in retrying strategies. The
/// name `"none"` is reserved: it always resolves to no retry layer.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use tollgate_core::RetryStrategyKind;
/// use tollgate_retry::{Backoff, RetryFactory, RetryPolicy};
///
/// #[derive(Debug)]
/// struct Fixed(u32);
///
/// impl Backoff for Fixed {
///     fn name(&self) -> &str { "fixed" }
///     fn max_retries(&self) -> u32 { self.0 }
///     fn delay(&self, _attempt: u32) -> Duration { Duration::from_millis(10) }
/// }
///
/// let mut factory = RetryFactory::default();
/// factory
///     .register("fixed", |policy: &RetryPolicy| {
///         let backoff: Arc<dyn Backoff> = Arc::new(Fixed(*policy.max_retries()));
///         Ok(backoff)
///     })
///     .unwrap();
///
/// let policy = RetryPolicy::new(RetryStrategyKind::from("fixed".to_string()));
/// let service = factory.create(&policy).unwrap().unwrap();
/// assert_eq!(service.name(), "fixed");
/// ```
#[derive(Clone)]
pub struct RetryFactory {
    constructors: HashMap<String, BackoffConstructor>,
}

impl RetryFactory {
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
    /// Returns a registry error if `name` is taken or reserved.
    #[instrument(skip(self, constructor))]
    pub fn register<F>(
        &mut self,
        name: impl Into<String> + fmt::Debug,
        constructor: F,
    ) -> TollgateResult<()>
    where
        F: Fn(&RetryPolicy) -> TollgateResult<Arc<dyn Backoff>> + Send + Sync + 'static,
    {
        let name = name.into();
        if name == RetryStrategyKind::None.as_str() || self.constructors.contains_key(&name) {
            return Err(RegistryError::new(RegistryErrorKind::DuplicateStrategy(name)).into());
        }
        debug!(strategy = %name, "Registered retry strategy");
        self.constructors.insert(name, Arc::new(constructor));
        Ok(())
    }

    /// Build the retry service a policy asks for.
    ///
    /// Returns `Ok(None)` when the policy's strategy is `none`.
    ///
    /// # Errors
    ///
    /// Returns a registry error for unknown names, or the configuration
    /// error the constructor reports.
    #[instrument(skip(self), fields(strategy = %policy.strategy()))]
    pub fn create(&self, policy: &RetryPolicy) -> TollgateResult<Option<RetryService>> {
        let name = policy.strategy().as_str();
        if name == RetryStrategyKind::None.as_str() {
            debug!("Retry disabled");
            return Ok(None);
        }
        let constructor = self.constructors.get(name).ok_or_else(|| {
            RegistryError::new(RegistryErrorKind::UnknownStrategy(name.to_string()))
        })?;
        Ok(Some(RetryService::new(constructor(policy)?)))
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

fn builtin(policy: &RetryPolicy) -> TollgateResult<Arc<dyn Backoff>> {
    let backoff = BuiltinBackoff::from_policy(policy)?.ok_or_else(|| {
        ConfigError::new(format!("{} does not build a backoff", policy.strategy()))
    })?;
    Ok(Arc::new(backoff))
}

impl Default for RetryFactory {
    fn default() -> Self {
        let mut constructors: HashMap<String, BackoffConstructor> = HashMap::new();
        for kind in [
            RetryStrategyKind::Native,
            RetryStrategyKind::ExponentialBackoff,
            RetryStrategyKind::RandomWait,
            RetryStrategyKind::IncrementalWait,
        ] {
            constructors.insert(kind.as_str().to_string(), Arc::new(builtin));
        }
        Self { constructors }
    }
}

impl fmt::Debug for RetryFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFactory")
            .field("strategies", &self.names())
            .finish()
    }
}

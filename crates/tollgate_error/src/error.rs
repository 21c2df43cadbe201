//! Top-level error wrapper types.

use crate::{CacheError, ConfigError, ObserverError, RegistryError};

/// All middleware-originated error conditions.
///
/// # Examples
///
/// ```
/// use tollgate_error::{TollgateError, ConfigError};
///
/// let err: TollgateError = ConfigError::new("max_retries must be positive").into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum TollgateErrorKind {
    /// Invalid rate limit, retry or model configuration
    #[from(ConfigError)]
    Config(ConfigError),
    /// Cache backend failure
    #[from(CacheError)]
    Cache(CacheError),
    /// Strategy registry lookup or registration failure
    #[from(RegistryError)]
    Registry(RegistryError),
    /// Retry observer failure
    #[from(ObserverError)]
    Observer(ObserverError),
}

/// Tollgate error with kind discrimination.
///
/// # Examples
///
/// ```
/// use tollgate_error::{TollgateErrorKind, TollgateResult, ConfigError};
///
/// fn might_fail() -> TollgateResult<()> {
///     Err(ConfigError::new("period must be positive"))?
/// }
///
/// let err = might_fail().unwrap_err();
/// assert!(matches!(err.kind(), TollgateErrorKind::Config(_)));
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Tollgate Error: {}", _0)]
pub struct TollgateError(Box<TollgateErrorKind>);

impl TollgateError {
    /// Create a new error from a kind.
    pub fn new(kind: TollgateErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &TollgateErrorKind {
        &self.0
    }
}

impl<T> From<T> for TollgateError
where
    T: Into<TollgateErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Tollgate operations.
pub type TollgateResult<T> = std::result::Result<T, TollgateError>;

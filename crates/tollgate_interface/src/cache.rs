//! Response cache interface.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tollgate_error::TollgateResult;

/// Key/value store for serialized responses.
///
/// Implementations must tolerate concurrent `get`/`set` from multiple
/// callers. There is no cross-key transactional guarantee.
pub trait Cache: Send + Sync + fmt::Debug {
    /// Whether a value is stored under `key`.
    fn has(&self, key: &str) -> TollgateResult<bool>;

    /// Stored value for `key`, if any.
    fn get(&self, key: &str) -> TollgateResult<Option<Value>>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// `metadata` is kept alongside the value for inspection and is not
    /// returned by [`Cache::get`].
    fn set(&self, key: &str, value: Value, metadata: Option<Value>) -> TollgateResult<()>;

    /// Remove the value stored under `key`, if any.
    fn remove(&self, key: &str) -> TollgateResult<()>;

    /// Remove every value in this cache and its children.
    fn clear(&self) -> TollgateResult<()>;

    /// A namespaced sub-cache whose keys cannot collide with this one's.
    fn child(&self, name: &str) -> Arc<dyn Cache>;
}

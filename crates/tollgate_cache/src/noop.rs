//! Cache that stores nothing.

use serde_json::Value;
use std::sync::Arc;
use tollgate_error::TollgateResult;
use tollgate_interface::Cache;

/// Accepts every write and never returns a value.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

impl Cache for NoopCache {
    fn has(&self, _key: &str) -> TollgateResult<bool> {
        Ok(false)
    }

    fn get(&self, _key: &str) -> TollgateResult<Option<Value>> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: Value, _metadata: Option<Value>) -> TollgateResult<()> {
        Ok(())
    }

    fn remove(&self, _key: &str) -> TollgateResult<()> {
        Ok(())
    }

    fn clear(&self) -> TollgateResult<()> {
        Ok(())
    }

    fn child(&self, _name: &str) -> Arc<dyn Cache> {
        Arc::new(NoopCache)
    }
}

//! Stored response shape.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What the cache layer stores for one response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEnvelope {
    /// The serialized response
    pub result: Value,
    /// Normalized request parameters that produced it
    pub input: Value,
    /// Model identity
    pub model: String,
}

/// Outcome of reading a cache entry.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup<R> {
    /// Entry present and decoded
    Hit(R),
    /// No entry
    Miss,
    /// Entry present but unusable; the reason is for logs only
    Corrupt(String),
}

impl CacheEnvelope {
    /// Decode a stored value into a response.
    ///
    /// # Examples
    ///
    /// ```
    /// use serde_json::json;
    /// use tollgate_cache::{CacheEnvelope, CacheLookup};
    ///
    /// let stored = json!({"result": "Paris", "input": {}, "model": "gpt-4o"});
    /// assert_eq!(
    ///     CacheEnvelope::decode::<String>(Some(stored)),
    ///     CacheLookup::Hit("Paris".to_string())
    /// );
    ///
    /// let broken = json!({"result": 42});
    /// assert!(matches!(
    ///     CacheEnvelope::decode::<String>(Some(broken)),
    ///     CacheLookup::Corrupt(_)
    /// ));
    /// ```
    pub fn decode<R: DeserializeOwned>(stored: Option<Value>) -> CacheLookup<R> {
        let Some(stored) = stored else {
            return CacheLookup::Miss;
        };
        let envelope: CacheEnvelope = match serde_json::from_value(stored) {
            Ok(envelope) => envelope,
            Err(e) => return CacheLookup::Corrupt(format!("invalid envelope: {}", e)),
        };
        match serde_json::from_value(envelope.result) {
            Ok(response) => CacheLookup::Hit(response),
            Err(e) => CacheLookup::Corrupt(format!("invalid result: {}", e)),
        }
    }
}

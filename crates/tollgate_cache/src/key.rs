//! Content-addressed cache keys.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use tollgate_core::CompletionRequest;
use tollgate_error::{CacheError, CacheErrorKind};

/// Deterministic key for a request against a model.
///
/// The digest covers the model identity, every request field that can change
/// the response, and the namespace prefix. Object keys serialize in sorted
/// order, so equal inputs always produce equal keys. The key has the form
/// `{prefix}_{sha256 hex}`, or just the hex digest when `prefix` is empty.
///
/// # Errors
///
/// Returns a serialization error if the request parameters cannot be
/// rendered as JSON.
///
/// # Example
///
/// ```
/// use tollgate_cache::cache_key;
/// use tollgate_core::{CompletionRequest, Message};
///
/// let request = CompletionRequest::messages(vec![Message::user("Hello")]);
/// let key = cache_key("gpt-4o", &request, "chat").unwrap();
///
/// assert!(key.starts_with("chat_"));
/// assert_eq!(key, cache_key("gpt-4o", &request, "chat").unwrap());
/// assert_ne!(key, cache_key("gpt-4o-mini", &request, "chat").unwrap());
/// ```
pub fn cache_key(
    model: &str,
    request: &CompletionRequest,
    prefix: &str,
) -> Result<String, CacheError> {
    let parameters = request
        .cache_parameters()
        .map_err(|e| CacheError::new(CacheErrorKind::Serialization(e.to_string())))?;

    let mut document = Map::new();
    document.insert("model".to_string(), Value::String(model.to_string()));
    document.insert("parameters".to_string(), parameters);
    document.insert("prefix".to_string(), Value::String(prefix.to_string()));
    let canonical = serde_json::to_string(&Value::Object(document))
        .map_err(|e| CacheError::new(CacheErrorKind::Serialization(e.to_string())))?;

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let digest = format!("{:x}", hasher.finalize());

    if prefix.is_empty() {
        Ok(digest)
    } else {
        Ok(format!("{}_{}", prefix, digest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tollgate_core::{Message, ModelParameters};

    fn request(text: &str) -> CompletionRequest {
        CompletionRequest::messages(vec![Message::system("Be terse."), Message::user(text)])
    }

    #[test]
    fn test_key_ignores_name_and_streaming() {
        let plain = request("extract entities");
        let labelled = plain.clone().with_name("extract_graph").with_streaming(true);
        assert_eq!(
            cache_key("gpt-4o", &plain, "chat").unwrap(),
            cache_key("gpt-4o", &labelled, "chat").unwrap()
        );
    }

    #[test]
    fn test_key_covers_content_parameters_and_prefix() {
        let base = cache_key("gpt-4o", &request("a"), "chat").unwrap();

        assert_ne!(base, cache_key("gpt-4o", &request("b"), "chat").unwrap());
        assert_ne!(base, cache_key("gpt-4o", &request("a"), "summarize").unwrap());

        let seeded = request("a").with_parameters(ModelParameters::default().with_seed(7));
        assert_ne!(base, cache_key("gpt-4o", &seeded, "chat").unwrap());
    }

    #[test]
    fn test_empty_prefix_is_bare_digest() {
        let key = cache_key("m", &request("a"), "").unwrap();
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }
}

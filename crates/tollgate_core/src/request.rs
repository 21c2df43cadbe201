//! Request types passed through the middleware chain.

use crate::Message;
use derive_getters::Getters;
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Payload of a request: a chat transcript or a batch of embedding inputs.
///
/// # Examples
///
/// ```
/// use tollgate_core::{Message, RequestInput};
///
/// let chat = RequestInput::Messages(vec![Message::user("Hello!")]);
/// assert_eq!(chat.texts(), vec!["Hello!"]);
///
/// let batch = RequestInput::Batch(vec!["first".to_string(), "second".to_string()]);
/// assert_eq!(batch.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum RequestInput {
    /// Role/content messages for a completion call.
    Messages(Vec<Message>),
    /// Raw strings for an embedding call.
    Batch(Vec<String>),
}

impl RequestInput {
    /// All text fragments carried by this input, in order.
    pub fn texts(&self) -> Vec<&str> {
        match self {
            RequestInput::Messages(messages) => {
                messages.iter().map(|m| m.content.as_str()).collect()
            }
            RequestInput::Batch(items) => items.iter().map(String::as_str).collect(),
        }
    }

    /// Number of messages or batch items.
    pub fn len(&self) -> usize {
        match self {
            RequestInput::Messages(messages) => messages.len(),
            RequestInput::Batch(items) => items.len(),
        }
    }

    /// Whether the input carries no messages or items.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RequestInput {
    fn default() -> Self {
        RequestInput::Messages(Vec::new())
    }
}

/// Per-call sampling overrides.
///
/// Every field here can change the model's response, so all of them feed
/// the cache key.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Setters)]
#[setters(prefix = "with_", strip_option)]
pub struct ModelParameters {
    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Nucleus sampling cutoff
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Completion token budget
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Number of choices to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,
    /// Deterministic sampling seed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    /// Stop sequences
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
    /// Provider-specific overrides, kept in sorted key order
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    #[setters(skip)]
    pub extra: BTreeMap<String, Value>,
}

impl ModelParameters {
    /// Add a provider-specific override.
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// A request as seen by the middleware.
///
/// The middleware only reads requests. `name` labels the call in logs and
/// `streaming` routes it around the cache; neither is part of the cache key.
///
/// # Examples
///
/// ```
/// use tollgate_core::{CompletionRequest, Message, ModelParameters};
///
/// let request = CompletionRequest::messages(vec![Message::user("Summarize this.")])
///     .with_name("summarize")
///     .with_parameters(ModelParameters::default().with_temperature(0.0));
///
/// assert_eq!(request.name().as_deref(), Some("summarize"));
/// assert!(!*request.streaming());
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Getters, Setters)]
#[setters(prefix = "with_")]
pub struct CompletionRequest {
    /// Messages or batch input
    input: RequestInput,
    /// Sampling overrides
    #[serde(default)]
    parameters: ModelParameters,
    /// Caller-supplied label for logging
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[setters(strip_option, into)]
    name: Option<String>,
    /// Whether the response is delivered incrementally
    #[serde(default)]
    streaming: bool,
}

impl CompletionRequest {
    /// Create a request from an input payload.
    pub fn new(input: RequestInput) -> Self {
        Self {
            input,
            ..Default::default()
        }
    }

    /// Create a chat completion request.
    pub fn messages(messages: Vec<Message>) -> Self {
        Self::new(RequestInput::Messages(messages))
    }

    /// Create an embedding request.
    pub fn batch(items: Vec<String>) -> Self {
        Self::new(RequestInput::Batch(items))
    }

    /// Normalized view of every field that can change the response.
    ///
    /// Object keys serialize in sorted order, so identical requests always
    /// produce byte-identical documents.
    pub fn cache_parameters(&self) -> Result<Value, serde_json::Error> {
        let mut normalized = Map::new();
        normalized.insert("input".to_string(), serde_json::to_value(&self.input)?);
        normalized.insert(
            "parameters".to_string(),
            serde_json::to_value(&self.parameters)?,
        );
        Ok(Value::Object(normalized))
    }
}

//! Cache error types.

/// Kinds of cache errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum CacheErrorKind {
    /// Failed to read or write the backing store
    #[display("Cache I/O failed: {}", _0)]
    Io(String),
    /// Failed to serialize a value for storage
    #[display("Cache serialization failed: {}", _0)]
    Serialization(String),
    /// Stored value could not be decoded
    #[display("Cache decode failed: {}", _0)]
    Decode(String),
    /// Key or namespace cannot be mapped onto the backing store
    #[display("Invalid cache key: {}", _0)]
    InvalidKey(String),
}

/// Cache error with location tracking.
///
/// Cache errors stay inside the cache layer: a failing cache degrades to a
/// live call rather than failing the caller's request.
///
/// # Examples
///
/// ```
/// use tollgate_error::{CacheError, CacheErrorKind};
///
/// let err = CacheError::new(CacheErrorKind::Decode("missing field `result`".to_string()));
/// assert!(format!("{}", err).contains("decode"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Cache Error: {} at line {} in {}", kind, line, file)]
pub struct CacheError {
    /// The kind of error that occurred
    pub kind: CacheErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl CacheError {
    /// Create a new cache error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: CacheErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

//! Retry observer errors.

/// Failure reported by a retry observer.
///
/// The retry service logs and discards these; they never change the outcome
/// of the observed call.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Observer Error: {} at line {} in {}", message, line, file)]
pub struct ObserverError {
    /// Error message
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ObserverError {
    /// Create a new ObserverError at the current location.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}

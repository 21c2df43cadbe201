//! Strategy registry errors.

/// Specific registry error conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum RegistryErrorKind {
    /// No constructor registered under this name
    #[display("Unknown strategy: {}", _0)]
    UnknownStrategy(String),
    /// A constructor is already registered under this name
    #[display("Strategy already registered: {}", _0)]
    DuplicateStrategy(String),
}

/// Registry error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Registry Error: {} at line {} in {}", kind, line, file)]
pub struct RegistryError {
    kind: RegistryErrorKind,
    line: u32,
    file: &'static str,
}

impl RegistryError {
    /// Create a new registry error with caller location tracking.
    #[track_caller]
    pub fn new(kind: RegistryErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &RegistryErrorKind {
        &self.kind
    }
}

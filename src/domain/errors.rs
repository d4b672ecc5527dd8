//! Domain error types
//!
//! These errors are framework-agnostic and represent inventory-level failures.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// No record carries the requested ISBN
    NotFound(String),
    /// A record with this ISBN already exists
    DuplicateKey(String),
    /// A required field was absent or blank
    MissingField(String),
    /// The spreadsheet (or another remote service) failed or answered with an unexpected shape
    BackendUnavailable(String),
}

impl DomainError {
    /// Stable machine-readable name, used in API error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::NotFound(_) => "NotFound",
            DomainError::DuplicateKey(_) => "DuplicateKey",
            DomainError::MissingField(_) => "MissingField",
            DomainError::BackendUnavailable(_) => "BackendUnavailable",
        }
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::NotFound(isbn) => write!(f, "Book with ISBN {} not found", isbn),
            DomainError::DuplicateKey(isbn) => {
                write!(f, "Book with ISBN {} already exists in the library", isbn)
            }
            DomainError::MissingField(field) => write!(f, "{} is required", field),
            DomainError::BackendUnavailable(msg) => write!(f, "Backend unavailable: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}

/// Failure reported by a spreadsheet backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The tab or range does not exist (or could not be parsed)
    MissingRange(String),
    /// Transport failure, unexpected status, or unexpected payload
    Unavailable(String),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::MissingRange(range) => write!(f, "Unable to parse range: {}", range),
            BackendError::Unavailable(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

// Only reached when a missing range was not absorbed locally
impl From<BackendError> for DomainError {
    fn from(e: BackendError) -> Self {
        DomainError::BackendUnavailable(e.to_string())
    }
}

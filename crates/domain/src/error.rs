//! Domain error types

use thiserror::Error;

/// Errors raised while interpreting captured HTTP data.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The response body could not be decoded as JSON.
    #[error("invalid JSON body: {0}")]
    InvalidJsonBody(String),

    /// The HTTP method is not supported by the step library.
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

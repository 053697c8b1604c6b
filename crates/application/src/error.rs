//! Application error types

use llstep_domain::{AssertionFailure, DomainError};
use thiserror::Error;

/// Application-level errors.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// A domain error occurred.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// The HTTP client could not be created.
    #[error("HTTP client unavailable: {0}")]
    ClientUnavailable(String),

    /// An HTTP request failed before a response was received.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The request URL could not be built.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The request timed out.
    #[error("request timed out after {timeout_ms}ms")]
    Timeout {
        /// Timeout that elapsed.
        timeout_ms: u64,
    },

    /// An assertion step ran before any request was issued.
    #[error("no response captured; issue a request first")]
    NoResponse,
}

/// Result type alias for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;

/// Errors surfaced by step capabilities.
#[derive(Debug, Error)]
pub enum StepError {
    /// A check failed; the scenario must stop.
    #[error("assertion failed: {0}")]
    Assertion(#[from] AssertionFailure),

    /// The step could not run.
    #[error(transparent)]
    Application(#[from] ApplicationError),

    /// A step dispatched by name received an unusable argument.
    #[error("step `{step}`: {reason}")]
    InvalidArgument {
        /// Step name.
        step: String,
        /// What was wrong.
        reason: String,
    },

    /// No step of this name is registered for the target type.
    #[error("no step `{name}` registered on {target}")]
    UnknownStep {
        /// Target type name.
        target: &'static str,
        /// Requested step.
        name: String,
    },

    /// No property of this name is exposed on the owner type.
    #[error("no extension property `{name}` on {owner}")]
    UnknownProperty {
        /// Owner type name.
        owner: &'static str,
        /// Requested property.
        name: String,
    },

    /// The property holds a different type than requested.
    #[error("extension property `{name}` is not a {expected}")]
    PropertyType {
        /// Property name.
        name: String,
        /// Requested type name.
        expected: &'static str,
    },
}

impl StepError {
    /// Returns the assertion failure, if this error is one.
    #[must_use]
    pub const fn as_assertion(&self) -> Option<&AssertionFailure> {
        match self {
            Self::Assertion(failure) => Some(failure),
            _ => None,
        }
    }

    /// Returns true if this error is a failed check.
    #[must_use]
    pub const fn is_assertion(&self) -> bool {
        matches!(self, Self::Assertion(_))
    }
}

impl From<DomainError> for StepError {
    fn from(error: DomainError) -> Self {
        Self::Application(ApplicationError::Domain(error))
    }
}

/// Result type alias for step operations.
pub type StepResult<T = ()> = Result<T, StepError>;

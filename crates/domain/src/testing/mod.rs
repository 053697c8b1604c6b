//! Response assertions.
//!
//! The vocabulary of checks a step library runs against a captured response,
//! their outcomes, and the failure value a failed check produces.

mod runner;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::json::ExcludedFields;

pub use runner::{ResponseChecker, assert_data, compare_data};

/// A check to run against a captured response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Assertion {
    /// Status code equals the expected value.
    StatusCode {
        /// Expected status code.
        expected: u16,
    },
    /// `Content-Type` header exists and starts with the expected value.
    ContentType {
        /// Expected prefix, e.g. `application/json`.
        expected: String,
    },
    /// JSON body satisfies the expected value (subset match, no normalisation).
    ResponseJson {
        /// Expected JSON.
        expected: Value,
    },
    /// Normalised body equals the normalised expected value.
    ResponseData {
        /// Expected data.
        expected: Value,
        /// Fields stripped from both sides besides `id` and `url`.
        #[serde(default)]
        excluded_fields: ExcludedFields,
    },
    /// Body is a list whose normalised (and unwrapped) items equal the
    /// normalised expected items, position by position.
    ResponseDataList {
        /// Expected items, already unwrapped.
        expected: Vec<Value>,
        /// Fields stripped from every item besides `id` and `url`.
        #[serde(default)]
        excluded_fields: ExcludedFields,
    },
    /// Resolved response URL equals the expected value.
    ResponseUrl {
        /// Expected URL.
        expected: String,
    },
    /// `Location` header equals the expected value.
    LocationHeader {
        /// Expected header value.
        expected: String,
    },
}

impl Assertion {
    /// Get a human-readable description of this assertion.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::StatusCode { expected } => format!("Status code = {expected}"),
            Self::ContentType { expected } => {
                format!("Content-Type starts with '{expected}'")
            }
            Self::ResponseJson { expected } => {
                format!("Response JSON matches {}", preview(expected))
            }
            Self::ResponseData { expected, .. } => {
                format!("Response data equals {}", preview(expected))
            }
            Self::ResponseDataList { expected, .. } => {
                format!("Response data list equals {} item(s)", expected.len())
            }
            Self::ResponseUrl { expected } => format!("Response URL equals '{expected}'"),
            Self::LocationHeader { expected } => {
                format!("Header 'location' equals '{expected}'")
            }
        }
    }
}

/// Compact JSON rendering, cut to a readable length.
pub(crate) fn preview(value: &Value) -> String {
    const LIMIT: usize = 200;
    let rendered = value.to_string();
    match rendered.char_indices().nth(LIMIT) {
        Some((cut, _)) => format!("{}...", &rendered[..cut]),
        None => rendered,
    }
}

/// A failed check.
///
/// Returned by every assertion step; propagating it ends the scenario.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{assertion}: {message}")]
pub struct AssertionFailure {
    /// Description of the check that failed.
    pub assertion: String,
    /// What was expected and what was observed.
    pub message: String,
    /// Observed value, when there was one.
    pub actual: Option<String>,
}

impl AssertionFailure {
    /// Creates a failure without an observed value.
    #[must_use]
    pub fn new(assertion: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            assertion: assertion.into(),
            message: message.into(),
            actual: None,
        }
    }
}

/// Result of running a single assertion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssertionResult {
    /// The assertion that was run.
    pub assertion: Assertion,
    /// Whether the assertion passed.
    pub passed: bool,
    /// Actual value found (for display).
    pub actual: Option<String>,
    /// Error message if failed.
    pub error: Option<String>,
}

impl AssertionResult {
    /// Create a passed result.
    #[must_use]
    pub const fn pass(assertion: Assertion) -> Self {
        Self {
            assertion,
            passed: true,
            actual: None,
            error: None,
        }
    }

    /// Create a passed result with actual value.
    #[must_use]
    pub fn pass_with_value(assertion: Assertion, actual: impl Into<String>) -> Self {
        Self {
            assertion,
            passed: true,
            actual: Some(actual.into()),
            error: None,
        }
    }

    /// Create a failed result.
    #[must_use]
    pub fn fail(assertion: Assertion, error: impl Into<String>) -> Self {
        Self {
            assertion,
            passed: false,
            actual: None,
            error: Some(error.into()),
        }
    }

    /// Create a failed result with actual value.
    #[must_use]
    pub fn fail_with_value(
        assertion: Assertion,
        actual: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            assertion,
            passed: false,
            actual: Some(actual.into()),
            error: Some(error.into()),
        }
    }

    /// Converts a failed result into an [`AssertionFailure`].
    ///
    /// # Errors
    ///
    /// Returns the failure when the assertion did not pass.
    pub fn into_outcome(self) -> Result<(), AssertionFailure> {
        if self.passed {
            return Ok(());
        }
        Err(AssertionFailure {
            assertion: self.assertion.description(),
            message: self.error.unwrap_or_else(|| "assertion failed".to_string()),
            actual: self.actual,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_assertion_description() {
        let assertion = Assertion::StatusCode { expected: 200 };
        assert_eq!(assertion.description(), "Status code = 200");

        let assertion = Assertion::ContentType {
            expected: "application/json".to_string(),
        };
        assert_eq!(
            assertion.description(),
            "Content-Type starts with 'application/json'"
        );
    }

    #[test]
    fn test_assertion_serde_tagging() {
        let assertion: Assertion = serde_json::from_value(json!({
            "type": "response_data",
            "expected": {"name": "a"}
        }))
        .unwrap_or(Assertion::StatusCode { expected: 0 });

        assert_eq!(
            assertion,
            Assertion::ResponseData {
                expected: json!({"name": "a"}),
                excluded_fields: ExcludedFields::none(),
            }
        );
    }

    #[test]
    fn test_failed_result_becomes_failure() {
        let result = AssertionResult::fail_with_value(
            Assertion::StatusCode { expected: 200 },
            "404",
            "Expected status 200, got 404",
        );

        let failure = result.into_outcome().unwrap_err();
        assert_eq!(
            failure.to_string(),
            "Status code = 200: Expected status 200, got 404"
        );
        assert_eq!(failure.actual.as_deref(), Some("404"));
    }

    #[test]
    fn test_passed_result_is_ok() {
        let result = AssertionResult::pass(Assertion::StatusCode { expected: 200 });
        assert!(result.into_outcome().is_ok());
    }

    #[test]
    fn test_preview_truncates_long_values() {
        let long = json!("x".repeat(500));
        let shown = preview(&long);
        assert!(shown.ends_with("..."));
        assert_eq!(shown.chars().count(), 203);
    }
}

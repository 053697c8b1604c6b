//! Response checker implementation.
//!
//! Evaluates one assertion at a time against a captured response.

use serde_json::Value;

use super::{Assertion, AssertionFailure, AssertionResult, preview};
use crate::json::{ExcludedFields, find_mismatch, normalize, unwrap_items};
use crate::response::ResponseSpec;

const JSON_CONTENT_TYPE: &str = "application/json";

/// Evaluates assertions against a captured response.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResponseChecker;

impl ResponseChecker {
    /// Create a new checker.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Run a single assertion against a response.
    #[must_use]
    pub fn run_assertion(&self, assertion: &Assertion, response: &ResponseSpec) -> AssertionResult {
        match assertion {
            Assertion::StatusCode { expected } => {
                Self::check_status_code(assertion, response, *expected)
            }
            Assertion::ContentType { expected } => {
                Self::check_content_type(assertion, response, expected)
            }
            Assertion::ResponseJson { expected } => {
                Self::check_response_json(assertion, response, expected)
            }
            Assertion::ResponseData {
                expected,
                excluded_fields,
            } => Self::check_response_data(assertion, response, expected, excluded_fields),
            Assertion::ResponseDataList {
                expected,
                excluded_fields,
            } => Self::check_response_data_list(assertion, response, expected, excluded_fields),
            Assertion::ResponseUrl { expected } => {
                Self::check_response_url(assertion, response, expected)
            }
            Assertion::LocationHeader { expected } => {
                Self::check_location_header(assertion, response, expected)
            }
        }
    }

    fn check_status_code(
        assertion: &Assertion,
        response: &ResponseSpec,
        expected: u16,
    ) -> AssertionResult {
        let actual = response.status;
        if actual == expected {
            AssertionResult::pass_with_value(assertion.clone(), actual.to_string())
        } else {
            AssertionResult::fail_with_value(
                assertion.clone(),
                actual.to_string(),
                format!("Expected status {expected}, got {actual}"),
            )
        }
    }

    fn check_content_type(
        assertion: &Assertion,
        response: &ResponseSpec,
        expected: &str,
    ) -> AssertionResult {
        match response.content_type() {
            Some(actual) if actual.starts_with(expected) => {
                AssertionResult::pass_with_value(assertion.clone(), actual)
            }
            Some(actual) => AssertionResult::fail_with_value(
                assertion.clone(),
                actual,
                format!("Content-Type '{actual}' does not start with '{expected}'"),
            ),
            None => AssertionResult::fail(
                assertion.clone(),
                "No Content-Type header present".to_string(),
            ),
        }
    }

    /// Fails fast when the body is not declared as JSON.
    fn require_json(assertion: &Assertion, response: &ResponseSpec) -> Option<AssertionResult> {
        let result = Self::check_content_type(assertion, response, JSON_CONTENT_TYPE);
        (!result.passed).then_some(result)
    }

    fn check_response_json(
        assertion: &Assertion,
        response: &ResponseSpec,
        expected: &Value,
    ) -> AssertionResult {
        if let Some(failed) = Self::require_json(assertion, response) {
            return failed;
        }

        let observed = match response.json_body() {
            Ok(observed) => observed,
            Err(e) => {
                return AssertionResult::fail(
                    assertion.clone(),
                    format!("Failed to parse body as JSON: {e}"),
                );
            }
        };

        match find_mismatch(expected, &observed) {
            None => AssertionResult::pass(assertion.clone()),
            Some(mismatch) => AssertionResult::fail_with_value(
                assertion.clone(),
                preview(&observed),
                format!("Response JSON mismatch at {mismatch}"),
            ),
        }
    }

    fn check_response_data(
        assertion: &Assertion,
        response: &ResponseSpec,
        expected: &Value,
        excluded: &ExcludedFields,
    ) -> AssertionResult {
        if let Some(failed) = Self::require_json(assertion, response) {
            return failed;
        }

        let observed = match response.data() {
            Ok(observed) => observed,
            Err(e) => {
                return AssertionResult::fail(
                    assertion.clone(),
                    format!("Failed to decode response data: {e}"),
                );
            }
        };

        match compare_data(expected, &observed, excluded) {
            Ok(()) => AssertionResult::pass(assertion.clone()),
            Err(message) => {
                AssertionResult::fail_with_value(assertion.clone(), preview(&observed), message)
            }
        }
    }

    fn check_response_data_list(
        assertion: &Assertion,
        response: &ResponseSpec,
        expected: &[Value],
        excluded: &ExcludedFields,
    ) -> AssertionResult {
        if let Some(failed) = Self::require_json(assertion, response) {
            return failed;
        }

        let observed = match response.data() {
            Ok(Value::Array(items)) => items,
            Ok(other) => {
                return AssertionResult::fail_with_value(
                    assertion.clone(),
                    preview(&other),
                    "Response data is not a JSON array".to_string(),
                );
            }
            Err(e) => {
                return AssertionResult::fail(
                    assertion.clone(),
                    format!("Failed to decode response data: {e}"),
                );
            }
        };

        let (_, observed) = unwrap_items(observed);
        let observed: Vec<Value> = observed
            .iter()
            .map(|item| normalize(item, excluded))
            .collect();
        let expected: Vec<Value> = expected
            .iter()
            .map(|item| normalize(item, excluded))
            .collect();

        if expected == observed {
            return AssertionResult::pass_with_value(
                assertion.clone(),
                format!("{} item(s)", observed.len()),
            );
        }

        let actual = preview(&Value::Array(observed.clone()));
        if expected.len() != observed.len() {
            return AssertionResult::fail_with_value(
                assertion.clone(),
                actual,
                format!(
                    "Expected {} item(s), got {}",
                    expected.len(),
                    observed.len()
                ),
            );
        }

        let message = expected
            .iter()
            .zip(&observed)
            .enumerate()
            .find(|(_, (e, o))| e != o)
            .map_or_else(
                || "Lists differ".to_string(),
                |(index, (e, o))| {
                    format!(
                        "Item [{index}] differs: expected {}, got {}",
                        preview(e),
                        preview(o)
                    )
                },
            );
        AssertionResult::fail_with_value(assertion.clone(), actual, message)
    }

    fn check_response_url(
        assertion: &Assertion,
        response: &ResponseSpec,
        expected: &str,
    ) -> AssertionResult {
        if response.url == expected {
            AssertionResult::pass_with_value(assertion.clone(), response.url.clone())
        } else {
            AssertionResult::fail_with_value(
                assertion.clone(),
                response.url.clone(),
                format!("Expected URL '{expected}', got '{}'", response.url),
            )
        }
    }

    fn check_location_header(
        assertion: &Assertion,
        response: &ResponseSpec,
        expected: &str,
    ) -> AssertionResult {
        match response.location() {
            Some(actual) if actual == expected => {
                AssertionResult::pass_with_value(assertion.clone(), actual)
            }
            Some(actual) => AssertionResult::fail_with_value(
                assertion.clone(),
                actual,
                format!("Header 'location' value mismatch: expected '{expected}', got '{actual}'"),
            ),
            None => AssertionResult::fail(assertion.clone(), "Header 'location' not found"),
        }
    }
}

/// Compares two values for exact equality after normalising both.
///
/// # Errors
///
/// Returns a message naming both normalised values when they differ.
pub fn compare_data(
    expected: &Value,
    observed: &Value,
    excluded: &ExcludedFields,
) -> Result<(), String> {
    let expected = normalize(expected, excluded);
    let observed = normalize(observed, excluded);
    if expected == observed {
        Ok(())
    } else {
        Err(format!(
            "Normalized data differs: expected {}, got {}",
            preview(&expected),
            preview(&observed)
        ))
    }
}

/// Exact comparison after normalisation, independent of any response.
///
/// # Errors
///
/// Returns an [`AssertionFailure`] when the normalised values differ.
pub fn assert_data(
    expected: &Value,
    observed: &Value,
    excluded: &ExcludedFields,
) -> Result<(), AssertionFailure> {
    compare_data(expected, observed, excluded).map_err(|message| AssertionFailure {
        assertion: format!("Data equals {}", preview(expected)),
        message,
        actual: Some(preview(observed)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::HashMap;
    use std::time::Duration;

    fn create_response(status: u16, body: &str, headers: HashMap<String, String>) -> ResponseSpec {
        ResponseSpec::new(status, headers, body.as_bytes().to_vec(), Duration::from_millis(50))
    }

    fn json_response(body: &Value) -> ResponseSpec {
        ResponseSpec::json(200, body)
    }

    fn passes(assertion: &Assertion, response: &ResponseSpec) -> bool {
        ResponseChecker::new().run_assertion(assertion, response).passed
    }

    #[test]
    fn test_status_code_exact() {
        let response = create_response(201, "", HashMap::new());

        assert!(passes(&Assertion::StatusCode { expected: 201 }, &response));

        let result = ResponseChecker::new()
            .run_assertion(&Assertion::StatusCode { expected: 200 }, &response);
        assert!(!result.passed);
        assert_eq!(result.error.as_deref(), Some("Expected status 200, got 201"));
    }

    #[test]
    fn test_content_type_is_a_prefix_match() {
        let response = ResponseSpec::default()
            .with_header("Content-Type", "application/json; charset=utf-8");
        let assertion = Assertion::ContentType {
            expected: "application/json".to_string(),
        };
        assert!(passes(&assertion, &response));

        let assertion = Assertion::ContentType {
            expected: "text/html".to_string(),
        };
        assert!(!passes(&assertion, &response));
    }

    #[test]
    fn test_content_type_missing() {
        let response = create_response(200, "{}", HashMap::new());
        let result = ResponseChecker::new().run_assertion(
            &Assertion::ContentType {
                expected: "application/json".to_string(),
            },
            &response,
        );
        assert_eq!(result.error.as_deref(), Some("No Content-Type header present"));
    }

    #[test]
    fn test_json_checks_fail_fast_on_content_type() {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "text/html".to_string());
        let response = create_response(200, "<html></html>", headers);

        let result = ResponseChecker::new().run_assertion(
            &Assertion::ResponseJson {
                expected: json!({}),
            },
            &response,
        );
        assert!(!result.passed);
        assert_eq!(
            result.error.as_deref(),
            Some("Content-Type 'text/html' does not start with 'application/json'")
        );
    }

    #[test]
    fn test_response_json_is_a_subset_match() {
        let response = json_response(&json!({"id": 5, "url": "/x", "name": "a", "extra": "z"}));

        assert!(passes(
            &Assertion::ResponseJson {
                expected: json!({"name": "a"})
            },
            &response
        ));

        let result = ResponseChecker::new().run_assertion(
            &Assertion::ResponseJson {
                expected: json!({"name": "b"}),
            },
            &response,
        );
        assert_eq!(
            result.error.as_deref(),
            Some(r#"Response JSON mismatch at $.name: expected "b", got "a""#)
        );
    }

    #[test]
    fn test_response_data_is_exact_after_normalization() {
        let response = json_response(&json!({"id": 5, "url": "/x", "name": "a", "extra": "z"}));

        let data = |expected: Value, excluded: ExcludedFields| Assertion::ResponseData {
            expected,
            excluded_fields: excluded,
        };

        assert!(!passes(&data(json!({"name": "a"}), ExcludedFields::none()), &response));
        assert!(passes(
            &data(json!({"name": "a", "extra": "z"}), ExcludedFields::none()),
            &response
        ));
        assert!(passes(
            &data(json!({"name": "a"}), ExcludedFields::new(["extra"])),
            &response
        ));
        assert!(passes(
            &data(json!({"id": 99, "name": "a", "extra": "z"}), ExcludedFields::none()),
            &response
        ));
    }

    #[test]
    fn test_response_data_uses_pre_decoded_data() {
        let response = json_response(&json!({"raw": 1})).with_data(json!({"id": 1, "name": "n"}));
        assert!(passes(
            &Assertion::ResponseData {
                expected: json!({"name": "n"}),
                excluded_fields: ExcludedFields::none(),
            },
            &response
        ));
    }

    #[test]
    fn test_enveloped_list_detected_from_first_item() {
        let response = json_response(&json!([
            {"etag": "a", "content": {"id": 1, "name": "x"}},
            {"content": {"id": 2, "name": "y"}}
        ]));

        assert!(passes(
            &Assertion::ResponseDataList {
                expected: vec![json!({"name": "x"}), json!({"name": "y"})],
                excluded_fields: ExcludedFields::none(),
            },
            &response
        ));
    }

    #[test]
    fn test_flat_list_compares_positionally() {
        let response = json_response(&json!([
            {"id": 1, "name": "x", "created": "t1"},
            {"id": 2, "name": "y", "created": "t2"}
        ]));
        let excluded = ExcludedFields::new(["created"]);

        assert!(passes(
            &Assertion::ResponseDataList {
                expected: vec![json!({"name": "x"}), json!({"name": "y"})],
                excluded_fields: excluded.clone(),
            },
            &response
        ));

        let result = ResponseChecker::new().run_assertion(
            &Assertion::ResponseDataList {
                expected: vec![json!({"name": "y"}), json!({"name": "x"})],
                excluded_fields: excluded.clone(),
            },
            &response,
        );
        assert_eq!(
            result.error.as_deref(),
            Some(r#"Item [0] differs: expected {"name":"y"}, got {"name":"x"}"#)
        );

        let result = ResponseChecker::new().run_assertion(
            &Assertion::ResponseDataList {
                expected: vec![json!({"name": "x"})],
                excluded_fields: excluded,
            },
            &response,
        );
        assert_eq!(result.error.as_deref(), Some("Expected 1 item(s), got 2"));
    }

    #[test]
    fn test_data_list_requires_an_array() {
        let response = json_response(&json!({"results": []}));
        let result = ResponseChecker::new().run_assertion(
            &Assertion::ResponseDataList {
                expected: Vec::new(),
                excluded_fields: ExcludedFields::none(),
            },
            &response,
        );
        assert_eq!(result.error.as_deref(), Some("Response data is not a JSON array"));
    }

    #[test]
    fn test_url_and_location() {
        let response = ResponseSpec::default()
            .with_url("http://testserver/users/")
            .with_header("Location", "/users/7/");

        assert!(passes(
            &Assertion::ResponseUrl {
                expected: "http://testserver/users/".to_string()
            },
            &response
        ));
        assert!(passes(
            &Assertion::LocationHeader {
                expected: "/users/7/".to_string()
            },
            &response
        ));
        assert!(!passes(
            &Assertion::LocationHeader {
                expected: "/users/8/".to_string()
            },
            &response
        ));
        assert!(!passes(
            &Assertion::LocationHeader {
                expected: "/users/7/".to_string()
            },
            &ResponseSpec::default()
        ));
    }

    #[test]
    fn test_assert_data_is_response_independent() {
        let expected = json!({"name": "a", "url": "/mine"});
        let observed = json!({"id": 3, "name": "a", "url": "/theirs"});
        assert!(assert_data(&expected, &observed, &ExcludedFields::none()).is_ok());

        let failure = assert_data(&json!({"name": "b"}), &observed, &ExcludedFields::none())
            .err()
            .unwrap_or_else(|| AssertionFailure::new("", ""));
        assert_eq!(
            failure.message,
            r#"Normalized data differs: expected {"name":"b"}, got {"name":"a"}"#
        );
    }
}

//! Captured response specification
//!
//! The shape a step library reads back after a request: status, headers,
//! body, the resolved URL and, optionally, a body the client already decoded.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DomainError, DomainResult};

/// HTTP response captured by the client collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ResponseSpec {
    /// HTTP status code
    pub status: u16,
    /// Response headers as received
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Response body decoded as UTF-8 (lossy)
    pub body: String,
    /// URL the response was served from, after redirects
    #[serde(default)]
    pub url: String,
    /// Body already decoded by the client, if it did so
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Response time
    #[serde(with = "duration_millis")]
    pub duration: Duration,
}

impl ResponseSpec {
    /// Creates a `ResponseSpec` from raw response data.
    #[must_use]
    pub fn new(
        status: u16,
        headers: HashMap<String, String>,
        body: Vec<u8>,
        duration: Duration,
    ) -> Self {
        let body = String::from_utf8(body)
            .unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned());

        Self {
            status,
            headers,
            body,
            url: String::new(),
            data: None,
            duration,
        }
    }

    /// Creates a JSON response with the given status and body value.
    #[must_use]
    pub fn json(status: u16, body: &Value) -> Self {
        let headers = HashMap::from([(
            "Content-Type".to_string(),
            "application/json".to_string(),
        )]);
        Self::new(status, headers, body.to_string().into_bytes(), Duration::ZERO)
    }

    /// Sets the resolved URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Adds or replaces a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers.retain(|k, _| !k.eq_ignore_ascii_case(&name));
        self.headers.insert(name, value.into());
        self
    }

    /// Sets a pre-decoded body, as a client that parses responses itself would.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Gets a header value by name (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if a header with this name was received.
    #[must_use]
    pub fn has_header(&self, name: &str) -> bool {
        self.header(name).is_some()
    }

    /// Returns the `Content-Type` header value.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header("Content-Type")
    }

    /// Returns the `Location` header value.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.header("location")
    }

    /// Decodes the raw body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidJsonBody`] if the body is not valid JSON.
    pub fn json_body(&self) -> DomainResult<Value> {
        serde_json::from_str(&self.body).map_err(|e| DomainError::InvalidJsonBody(e.to_string()))
    }

    /// Returns the decoded body: the client's pre-decoded value when present,
    /// otherwise the raw body parsed as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidJsonBody`] if no pre-decoded value exists
    /// and the body is not valid JSON.
    pub fn data(&self) -> DomainResult<Value> {
        match &self.data {
            Some(data) => Ok(data.clone()),
            None => self.json_body(),
        }
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    #[allow(clippy::cast_possible_truncation)]
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn header_lookup_ignores_case() {
        let response = ResponseSpec::default()
            .with_header("content-type", "application/json; charset=utf-8")
            .with_header("Location", "/users/7/");

        assert_eq!(
            response.content_type(),
            Some("application/json; charset=utf-8")
        );
        assert_eq!(response.location(), Some("/users/7/"));
        assert!(response.has_header("LOCATION"));
        assert!(!response.has_header("etag"));
    }

    #[test]
    fn with_header_replaces_existing_names() {
        let response = ResponseSpec::default()
            .with_header("Content-Type", "text/html")
            .with_header("content-type", "application/json");

        assert_eq!(response.headers.len(), 1);
        assert_eq!(response.content_type(), Some("application/json"));
    }

    #[test]
    fn data_prefers_the_pre_decoded_value() {
        let response = ResponseSpec::json(200, &json!({"raw": true})).with_data(json!({"decoded": true}));

        assert_eq!(response.json_body().unwrap(), json!({"raw": true}));
        assert_eq!(response.data().unwrap(), json!({"decoded": true}));
    }

    #[test]
    fn invalid_json_is_reported() {
        let response = ResponseSpec::new(200, HashMap::new(), b"<html/>".to_vec(), Duration::ZERO);
        assert!(matches!(
            response.data(),
            Err(DomainError::InvalidJsonBody(_))
        ));
    }

    #[test]
    fn lossy_body_decoding() {
        let response = ResponseSpec::new(200, HashMap::new(), vec![b'o', b'k', 0xFF], Duration::ZERO);
        assert!(response.body.starts_with("ok"));
    }
}

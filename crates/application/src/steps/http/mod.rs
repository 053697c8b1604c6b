//! The HTTP step library.
//!
//! [`Http`] is the capability a scenario reaches through `prefix.http()`:
//! request steps issue a call through the client collaborator and keep the
//! response, assertion steps check the kept response. Every step is also
//! registered by name through [`HttpSteps`].

mod context;
mod library;

use std::sync::Arc;

use llstep_domain::{
    Assertion, Credentials, ExcludedFields, RequestSpec, ResponseChecker, ResponseSpec,
};
use serde_json::Value;
use tracing::info;

pub use context::HttpContext;
pub use library::HttpSteps;

use crate::extension::{ExtensionHost, ExtensionRegistry, TestStepPrefix};
use crate::ports::{ClientFactory, HttpClient};
use crate::{StepError, StepResult};

/// Property name the capability is exposed under.
pub const HTTP_PROPERTY: &str = "http";

/// HTTP request and response-assertion steps over one [`HttpContext`].
#[derive(Debug)]
pub struct Http {
    context: HttpContext,
    checker: ResponseChecker,
}

impl Http {
    /// Creates the capability; the client is built by `factory` on first use.
    #[must_use]
    pub fn new(factory: ClientFactory) -> Self {
        Self::from_context(HttpContext::new(factory))
    }

    /// Creates the capability around an already built client.
    #[must_use]
    pub fn with_client(client: impl HttpClient + 'static) -> Self {
        Self::from_context(HttpContext::with_client(client))
    }

    fn from_context(context: HttpContext) -> Self {
        Self {
            context,
            checker: ResponseChecker::new(),
        }
    }

    /// The underlying context.
    #[must_use]
    pub const fn context(&self) -> &HttpContext {
        &self.context
    }

    /// Mutable access to the underlying context.
    pub const fn context_mut(&mut self) -> &mut HttpContext {
        &mut self.context
    }

    // --- client steps ---

    /// Returns the scenario's client, creating it on first use.
    ///
    /// # Errors
    ///
    /// Fails if the client cannot be created.
    pub fn http_client(&mut self) -> StepResult<&mut dyn HttpClient> {
        Ok(self.context.client()?)
    }

    /// Merges header overrides into the client's defaults.
    ///
    /// # Errors
    ///
    /// Fails if the client cannot be created.
    pub fn with_defaults<I, K, V>(&mut self, overrides: I) -> StepResult
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.http_client()?
            .merge_defaults(overrides.into_iter().collect());
        Ok(())
    }

    /// Attaches `credentials` to every later request, or clears them.
    ///
    /// # Errors
    ///
    /// Fails if the client cannot be created.
    pub fn force_authenticate(&mut self, credentials: Option<Credentials>) -> StepResult {
        self.http_client()?.force_authenticate(credentials);
        Ok(())
    }

    /// Sends later requests as `username` without a credential check.
    ///
    /// # Errors
    ///
    /// Fails if the client cannot be created.
    pub fn force_login(&mut self, username: &str) -> StepResult {
        self.http_client()?.force_login(username);
        Ok(())
    }

    /// Logs in; returns whether the credentials were accepted.
    ///
    /// # Errors
    ///
    /// Fails if the client cannot be created or the login call fails.
    pub fn login(&mut self, username: &str, password: &str) -> StepResult<bool> {
        Ok(self.http_client()?.login(username, password)?)
    }

    // --- request steps ---

    /// Issues GET and keeps the response.
    ///
    /// # Errors
    ///
    /// Fails if no response could be obtained.
    pub fn get(&mut self, path: &str) -> StepResult<&ResponseSpec> {
        self.request(&RequestSpec::get(path))
    }

    /// Issues DELETE and keeps the response.
    ///
    /// # Errors
    ///
    /// Fails if no response could be obtained.
    pub fn delete(&mut self, path: &str) -> StepResult<&ResponseSpec> {
        self.request(&RequestSpec::delete(path))
    }

    /// Issues POST with a JSON body and keeps the response.
    ///
    /// # Errors
    ///
    /// Fails if no response could be obtained.
    pub fn post(&mut self, path: &str, data: Value) -> StepResult<&ResponseSpec> {
        self.request(&RequestSpec::post(path, data))
    }

    /// Issues PUT with a JSON body and keeps the response.
    ///
    /// # Errors
    ///
    /// Fails if no response could be obtained.
    pub fn put(&mut self, path: &str, data: Value) -> StepResult<&ResponseSpec> {
        self.request(&RequestSpec::put(path, data))
    }

    /// Issues an arbitrary request and keeps the response, replacing the
    /// previous one.
    ///
    /// # Errors
    ///
    /// Fails if the client cannot be created or no response was obtained.
    pub fn request(&mut self, request: &RequestSpec) -> StepResult<&ResponseSpec> {
        let response = self.context.client()?.execute(request)?;
        info!(
            method = %request.method,
            path = %request.path,
            status = response.status,
            "Request completed"
        );
        Ok(self.context.store_response(response))
    }

    /// The kept response.
    ///
    /// # Errors
    ///
    /// Fails if no request has been issued yet.
    pub fn response(&self) -> StepResult<&ResponseSpec> {
        Ok(self.context.response()?)
    }

    // --- assertion steps ---

    /// Checks the status code.
    ///
    /// # Errors
    ///
    /// Returns an assertion failure on mismatch.
    pub fn status_code_is(&self, expected: u16) -> StepResult {
        self.check(Assertion::StatusCode { expected })
    }

    /// Checks that `Content-Type` starts with `expected`.
    ///
    /// # Errors
    ///
    /// Returns an assertion failure if the header is missing or differs.
    pub fn content_type_is(&self, expected: &str) -> StepResult {
        self.check(Assertion::ContentType {
            expected: expected.to_string(),
        })
    }

    /// Checks that the JSON body satisfies `expected`; extra observed keys
    /// are ignored.
    ///
    /// # Errors
    ///
    /// Returns an assertion failure if the body is not JSON or does not
    /// satisfy `expected`.
    pub fn response_json_is(&self, expected: &Value) -> StepResult {
        self.check(Assertion::ResponseJson {
            expected: expected.clone(),
        })
    }

    /// Checks that the normalised body equals the normalised `expected`.
    ///
    /// # Errors
    ///
    /// Returns an assertion failure if the body is not JSON or differs.
    pub fn response_data_is(&self, expected: &Value, excluded: &ExcludedFields) -> StepResult {
        self.check(Assertion::ResponseData {
            expected: expected.clone(),
            excluded_fields: excluded.clone(),
        })
    }

    /// Compares two values after normalising both. Does not touch the kept
    /// response.
    ///
    /// # Errors
    ///
    /// Returns an assertion failure if the values differ.
    pub fn assert_data(
        &self,
        expected: &Value,
        observed: &Value,
        excluded: &ExcludedFields,
    ) -> StepResult {
        Ok(llstep_domain::assert_data(expected, observed, excluded)?)
    }

    /// Checks a list body item by item, unwrapping enveloped items first.
    ///
    /// # Errors
    ///
    /// Returns an assertion failure if the body is not a JSON list or any
    /// normalised item differs.
    pub fn response_data_list_is(&self, expected: &[Value], excluded: &ExcludedFields) -> StepResult {
        self.check(Assertion::ResponseDataList {
            expected: expected.to_vec(),
            excluded_fields: excluded.clone(),
        })
    }

    /// Checks the resolved response URL.
    ///
    /// # Errors
    ///
    /// Returns an assertion failure on mismatch.
    pub fn response_url_is(&self, expected: &str) -> StepResult {
        self.check(Assertion::ResponseUrl {
            expected: expected.to_string(),
        })
    }

    /// Checks the `Location` header.
    ///
    /// # Errors
    ///
    /// Returns an assertion failure if the header is missing or differs.
    pub fn response_location_header_is(&self, expected: &str) -> StepResult {
        self.check(Assertion::LocationHeader {
            expected: expected.to_string(),
        })
    }

    fn check(&self, assertion: Assertion) -> StepResult {
        let response = self.response()?;
        self.checker
            .run_assertion(&assertion, response)
            .into_outcome()
            .map_err(StepError::from)
    }
}

/// `prefix.http()` on the step context.
pub trait HttpPrefixExt {
    /// The HTTP capability of this context.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP library was not installed on the registry.
    fn http(&mut self) -> StepResult<&mut Http>;
}

impl HttpPrefixExt for TestStepPrefix {
    fn http(&mut self) -> StepResult<&mut Http> {
        self.extension::<Http>(HTTP_PROPERTY)
    }
}

/// Registers the HTTP steps and exposes [`Http`] on owner type `O` under
/// [`HTTP_PROPERTY`]. Each owner instance gets its own client from
/// `factory`.
///
/// Returns the number of steps registered.
pub fn install<O>(registry: &mut ExtensionRegistry, factory: ClientFactory) -> usize
where
    O: ExtensionHost + 'static,
{
    let registered = registry.register_all_from(&HttpSteps);
    registry.expose_as_property::<O, Http, _>(HTTP_PROPERTY, move || {
        Http::new(Arc::clone(&factory))
    });
    registered
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ApplicationError;
    use crate::ports::{ScriptedHttpClient, client_factory};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn http() -> (Http, ScriptedHttpClient) {
        let handle = ScriptedHttpClient::new();
        (Http::with_client(handle.clone()), handle)
    }

    #[test]
    fn assertions_before_any_request_fail_with_no_response() {
        let (http, _) = http();
        let err = http.status_code_is(200).unwrap_err();
        assert!(matches!(err, StepError::Application(ApplicationError::NoResponse)));
        assert!(!err.is_assertion());
    }

    #[test]
    fn each_request_replaces_the_kept_response() {
        let (mut http, handle) = http();
        handle.respond_with(ResponseSpec::json(200, &json!({"n": 1})));
        handle.respond_with(ResponseSpec::json(404, &json!({"n": 2})));

        http.get("/a/").unwrap();
        http.status_code_is(200).unwrap();
        http.get("/b/").unwrap();
        http.status_code_is(404).unwrap();
        assert!(http.status_code_is(200).unwrap_err().is_assertion());
    }

    #[test]
    fn json_subset_versus_exact_data() {
        let (mut http, handle) = http();
        handle.respond_with(ResponseSpec::json(
            200,
            &json!({"id": 5, "url": "/x", "name": "a", "extra": "z"}),
        ));
        http.get("/x").unwrap();

        http.response_json_is(&json!({"name": "a"})).unwrap();
        http.response_data_is(&json!({"name": "a", "extra": "z"}), &ExcludedFields::none())
            .unwrap();
        http.response_data_is(&json!({"name": "a"}), &ExcludedFields::new(["extra"]))
            .unwrap();

        let err = http
            .response_data_is(&json!({"name": "a"}), &ExcludedFields::none())
            .unwrap_err();
        assert!(err.is_assertion());
    }

    #[test]
    fn list_with_envelope_detected_from_first_item() {
        let (mut http, handle) = http();
        handle.respond_with(ResponseSpec::json(
            200,
            &json!([
                {"etag": "a", "content": {"id": 1, "name": "x"}},
                {"content": {"id": 2, "name": "y"}}
            ]),
        ));
        http.get("/items/").unwrap();

        http.response_data_list_is(&[json!({"name": "x"}), json!({"name": "y"})], &ExcludedFields::none())
            .unwrap();
    }

    #[test]
    fn content_type_is_a_prefix_match() {
        let (mut http, handle) = http();
        handle.respond_with(
            ResponseSpec::json(200, &json!({}))
                .with_header("Content-Type", "application/json; charset=utf-8"),
        );
        http.get("/").unwrap();

        http.content_type_is("application/json").unwrap();
        let failure = http.content_type_is("text/html").unwrap_err();
        assert!(failure.as_assertion().unwrap().message.contains("text/html"));
    }

    #[test]
    fn url_and_location_checks() {
        let (mut http, handle) = http();
        handle.respond_with(
            ResponseSpec::json(201, &json!({})).with_header("Location", "/users/7/"),
        );
        http.post("/users/", json!({"name": "n"})).unwrap();

        http.response_url_is("http://testserver/users/").unwrap();
        http.response_location_header_is("/users/7/").unwrap();
        assert!(http.response_location_header_is("/users/8/").is_err());
    }

    #[test]
    fn assert_data_ignores_the_kept_response() {
        let (http, _) = http();
        http.assert_data(&json!({"id": 1, "a": 1}), &json!({"id": 2, "a": 1}), &ExcludedFields::none())
            .unwrap();
        assert!(
            http.assert_data(&json!({"a": 1}), &json!({"a": 2}), &ExcludedFields::none())
                .unwrap_err()
                .is_assertion()
        );
    }

    #[test]
    fn auth_steps_reach_the_client() {
        let (mut http, handle) = http();
        http.with_defaults([("Accept", "application/json")]).unwrap();
        http.force_authenticate(Some(Credentials::bearer("t"))).unwrap();
        http.force_login("ada").unwrap();
        handle.respond_with(ResponseSpec::default());
        http.put("/me/", json!({"x": 1})).unwrap();

        let recorded = handle.last_request().unwrap();
        assert_eq!(recorded.credentials, Some(Credentials::bearer("t")));
        assert_eq!(recorded.user.as_deref(), Some("ada"));
        assert_eq!(recorded.defaults.len(), 1);

        http.force_authenticate(None).unwrap();
        assert_eq!(handle.credentials(), None);
    }

    #[test]
    fn client_is_created_once_and_lazily() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let built = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&built);
        let mut http = Http::new(client_factory(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(ScriptedHttpClient::new())
        }));

        assert!(!http.context().has_client());
        http.http_client().unwrap();
        http.with_defaults([("A", "1")]).unwrap();
        assert_eq!(built.load(Ordering::SeqCst), 1);
        assert_eq!(http.http_client().unwrap().defaults().get("A"), Some("1"));
    }
}

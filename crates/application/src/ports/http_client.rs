//! HTTP Client port

use std::sync::Arc;

use indexmap::IndexMap;
use llstep_domain::{Credentials, RequestSpec, ResponseSpec};
use serde_json::Value;

use crate::ApplicationResult;

/// Port for issuing requests against the API under test.
///
/// Calls are synchronous: each one blocks until the response is available.
/// Implementations own their transport, their default headers and whatever
/// authentication state the `force_*`/`login` calls install.
pub trait HttpClient: Send {
    /// Executes a request and returns the captured response.
    ///
    /// # Errors
    ///
    /// Returns an error if no response could be obtained (network failure,
    /// timeout, malformed URL). Non-2xx statuses are responses, not errors.
    fn execute(&mut self, request: &RequestSpec) -> ApplicationResult<ResponseSpec>;

    /// Snapshot of the default headers sent with every request.
    fn defaults(&self) -> RequestDefaults;

    /// Merges `overrides` into the default headers; an override wins over
    /// an existing value for the same name.
    fn merge_defaults(&mut self, overrides: RequestDefaults);

    /// Attaches credentials to every subsequent request; `None` clears them.
    fn force_authenticate(&mut self, credentials: Option<Credentials>);

    /// Marks subsequent requests as coming from `username`, skipping any
    /// credential check.
    fn force_login(&mut self, username: &str);

    /// Logs in with a username and password.
    ///
    /// Returns whether the login was accepted.
    ///
    /// # Errors
    ///
    /// Returns an error if the login request itself could not be made.
    fn login(&mut self, username: &str, password: &str) -> ApplicationResult<bool>;

    /// Performs HTTP GET.
    ///
    /// # Errors
    ///
    /// See [`HttpClient::execute`].
    fn get(&mut self, path: &str) -> ApplicationResult<ResponseSpec> {
        self.execute(&RequestSpec::get(path))
    }

    /// Performs HTTP DELETE.
    ///
    /// # Errors
    ///
    /// See [`HttpClient::execute`].
    fn delete(&mut self, path: &str) -> ApplicationResult<ResponseSpec> {
        self.execute(&RequestSpec::delete(path))
    }

    /// Performs HTTP POST with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`HttpClient::execute`].
    fn post(&mut self, path: &str, body: Value) -> ApplicationResult<ResponseSpec> {
        self.execute(&RequestSpec::post(path, body))
    }

    /// Performs HTTP PUT with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`HttpClient::execute`].
    fn put(&mut self, path: &str, body: Value) -> ApplicationResult<ResponseSpec> {
        self.execute(&RequestSpec::put(path, body))
    }
}

/// Creates the client for a context on first use.
pub type ClientFactory = Arc<dyn Fn() -> ApplicationResult<Box<dyn HttpClient>> + Send + Sync>;

/// Wraps a constructor of a concrete client as a [`ClientFactory`].
pub fn client_factory<C, F>(make: F) -> ClientFactory
where
    C: HttpClient + 'static,
    F: Fn() -> ApplicationResult<C> + Send + Sync + 'static,
{
    Arc::new(move || make().map(|client| Box::new(client) as Box<dyn HttpClient>))
}

/// Default request headers, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestDefaults {
    headers: IndexMap<String, String>,
}

impl RequestDefaults {
    /// Creates an empty set of defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges `overrides` into the defaults; an override wins over an
    /// existing value for the same name.
    pub fn merge<I, K, V>(&mut self, overrides: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in overrides {
            self.headers.insert(name.into(), value.into());
        }
    }

    /// Gets a default by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Iterates over the defaults in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the number of defaults.
    #[must_use]
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// Returns true if no defaults are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RequestDefaults {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut defaults = Self::new();
        defaults.merge(iter);
        defaults
    }
}

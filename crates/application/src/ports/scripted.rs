//! In-memory HTTP client that replays queued responses.
//!
//! Lets a suite exercise its steps without a server: responses are queued up
//! front, every issued request is recorded together with the defaults and
//! authentication in force when it was sent. Clones share the same script,
//! defaults included, so a test can keep a handle after handing a clone to a
//! step context.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use llstep_domain::{Credentials, RequestSpec, ResponseSpec};

use super::{HttpClient, RequestDefaults};
use crate::{ApplicationError, ApplicationResult};

const DEFAULT_BASE_URL: &str = "http://testserver";

/// A request as the scripted client received it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    /// The request itself.
    pub request: RequestSpec,
    /// Default headers in force when it was sent.
    pub defaults: Vec<(String, String)>,
    /// Credentials in force when it was sent.
    pub credentials: Option<Credentials>,
    /// User forced in via `force_login`, if any.
    pub user: Option<String>,
}

#[derive(Debug, Default)]
struct Script {
    base_url: String,
    responses: VecDeque<ApplicationResult<ResponseSpec>>,
    requests: Vec<RecordedRequest>,
    defaults: RequestDefaults,
    credentials: Option<Credentials>,
    user: Option<String>,
    accounts: HashMap<String, String>,
}

/// Scripted [`HttpClient`] for offline suites.
#[derive(Debug, Clone)]
pub struct ScriptedHttpClient {
    script: Arc<Mutex<Script>>,
}

impl Default for ScriptedHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedHttpClient {
    /// Creates a client with an empty script serving `http://testserver`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(Script {
                base_url: DEFAULT_BASE_URL.to_string(),
                ..Script::default()
            })),
        }
    }

    /// Sets the base URL used to resolve relative request paths.
    #[must_use]
    pub fn with_base_url(self, base_url: impl Into<String>) -> Self {
        self.script().base_url = base_url.into();
        self
    }

    /// Registers an account accepted by [`HttpClient::login`].
    #[must_use]
    pub fn with_account(self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.script()
            .accounts
            .insert(username.into(), password.into());
        self
    }

    /// Queues the next response.
    pub fn respond_with(&self, response: ResponseSpec) {
        self.script().responses.push_back(Ok(response));
    }

    /// Queues a transport failure for the next request.
    pub fn fail_with(&self, error: ApplicationError) {
        self.script().responses.push_back(Err(error));
    }

    /// Requests received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.script().requests.clone()
    }

    /// The most recent request.
    #[must_use]
    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.script().requests.last().cloned()
    }

    /// Number of queued responses not yet served.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.script().responses.len()
    }

    /// Credentials currently in force.
    #[must_use]
    pub fn credentials(&self) -> Option<Credentials> {
        self.script().credentials.clone()
    }

    /// User currently logged in, if any.
    #[must_use]
    pub fn user(&self) -> Option<String> {
        self.script().user.clone()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl HttpClient for ScriptedHttpClient {
    fn execute(&mut self, request: &RequestSpec) -> ApplicationResult<ResponseSpec> {
        let mut script = self.script();
        let recorded = RecordedRequest {
            request: request.clone(),
            defaults: script
                .defaults
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            credentials: script.credentials.clone(),
            user: script.user.clone(),
        };
        script.requests.push(recorded);

        let url = if request.is_absolute() {
            request.path.clone()
        } else {
            format!("{}{}", script.base_url.trim_end_matches('/'), request.path)
        };

        let response = script.responses.pop_front().ok_or_else(|| {
            ApplicationError::Http(format!(
                "no scripted response left for {} {}",
                request.method, request.path
            ))
        })??;

        if response.url.is_empty() {
            Ok(response.with_url(url))
        } else {
            Ok(response)
        }
    }

    fn defaults(&self) -> RequestDefaults {
        self.script().defaults.clone()
    }

    fn merge_defaults(&mut self, overrides: RequestDefaults) {
        self.script().defaults.merge(overrides.iter());
    }

    fn force_authenticate(&mut self, credentials: Option<Credentials>) {
        self.script().credentials = credentials;
    }

    fn force_login(&mut self, username: &str) {
        self.script().user = Some(username.to_string());
    }

    fn login(&mut self, username: &str, password: &str) -> ApplicationResult<bool> {
        let mut script = self.script();
        let accepted = script
            .accounts
            .get(username)
            .is_some_and(|known| known == password);
        if accepted {
            script.credentials = Some(Credentials::basic(username, password));
            script.user = Some(username.to_string());
        }
        Ok(accepted)
    }
}

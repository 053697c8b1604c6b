//! HTTP Client implementation using reqwest.
//!
//! This adapter implements the `HttpClient` port with the reqwest library.
//! Steps are synchronous, so every call is driven to completion on a private
//! current-thread tokio runtime owned by the client. It must therefore not be
//! called from inside another tokio runtime.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use llstep_application::{ApplicationError, ApplicationResult, HttpClient, RequestDefaults};
use llstep_domain::{Credentials, HttpMethod, RequestSpec, ResponseSpec};
use reqwest::header::{AUTHORIZATION, HeaderMap};
use reqwest::{Client, Method, RequestBuilder, Url};
use serde_json::{Value, json};
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

use crate::settings::ClientSettings;

/// HTTP client issuing real requests against the API under test.
pub struct ReqwestHttpClient {
    client: Client,
    runtime: Runtime,
    settings: ClientSettings,
    base_url: Url,
    defaults: RequestDefaults,
    credentials: Option<Credentials>,
    user: Option<String>,
}

impl ReqwestHttpClient {
    /// Creates a client from `settings`.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the client or its
    /// runtime cannot be created.
    pub fn new(settings: ClientSettings) -> ApplicationResult<Self> {
        let base_url = settings
            .base_url()
            .map_err(|e| ApplicationError::InvalidUrl(e.to_string()))?;

        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(Duration::from_millis(settings.timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(settings.max_redirects))
            .build()
            .map_err(|e| ApplicationError::ClientUnavailable(e.to_string()))?;

        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ApplicationError::ClientUnavailable(e.to_string()))?;

        debug!(base_url = %base_url, "Created reqwest client");
        Ok(Self {
            client,
            runtime,
            settings,
            base_url,
            defaults: RequestDefaults::new(),
            credentials: None,
            user: None,
        })
    }

    /// The settings this client was built with.
    #[must_use]
    pub const fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Converts domain `HttpMethod` to reqwest `Method`.
    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
        }
    }

    /// Resolves the request path against the base URL and appends the query.
    fn resolve(&self, request: &RequestSpec) -> ApplicationResult<Url> {
        let parsed = if request.is_absolute() {
            Url::parse(&request.path)
        } else {
            self.base_url.join(&request.path)
        };
        let mut url =
            parsed.map_err(|e| ApplicationError::InvalidUrl(format!("{e}: {}", request.path)))?;

        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }
        Ok(url)
    }

    /// Adds credentials and the forced user, if any.
    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = match &self.credentials {
            Some(Credentials::Bearer { token, prefix }) => {
                builder.header(AUTHORIZATION, format!("{prefix} {token}"))
            }
            Some(Credentials::Basic { username, password }) => {
                builder.basic_auth(username, Some(password))
            }
            Some(Credentials::ApiKey { name, key }) => builder.header(name.as_str(), key.as_str()),
            None => builder,
        };
        match &self.user {
            Some(user) => builder.header(self.settings.remote_user_header.as_str(), user.as_str()),
            None => builder,
        }
    }

    /// Flattens response headers into one value per name.
    ///
    /// Non-ASCII bytes are decoded lossily as UTF-8 and repeated headers are
    /// joined with `", "` in arrival order.
    fn collect_headers(headers: &HeaderMap) -> HashMap<String, String> {
        let mut collected: HashMap<String, String> = HashMap::with_capacity(headers.keys_len());
        for (name, value) in headers {
            let value = String::from_utf8_lossy(value.as_bytes());
            collected
                .entry(name.as_str().to_owned())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(&value);
                })
                .or_insert_with(|| value.into_owned());
        }
        collected
    }

    /// Maps reqwest errors to `ApplicationError`.
    fn map_error(error: &reqwest::Error, timeout_ms: u64) -> ApplicationError {
        if error.is_timeout() {
            return ApplicationError::Timeout { timeout_ms };
        }

        if error.is_connect() {
            let host = error
                .url()
                .and_then(|u| u.host_str().map(str::to_owned))
                .unwrap_or_else(|| "unknown".to_string());
            return ApplicationError::Http(format!("connection to {host} failed: {error}"));
        }

        if error.is_redirect() {
            return ApplicationError::Http(format!("too many redirects: {error}"));
        }

        if error.is_builder() {
            return ApplicationError::Http(format!("invalid request: {error}"));
        }

        ApplicationError::Http(error.to_string())
    }
}

impl HttpClient for ReqwestHttpClient {
    fn execute(&mut self, request: &RequestSpec) -> ApplicationResult<ResponseSpec> {
        let url = self.resolve(request)?;
        let timeout_ms = self.settings.timeout_ms;

        let mut headers = self.defaults.clone();
        headers.merge(request.headers.iter().cloned());

        let mut builder = self
            .client
            .request(Self::to_reqwest_method(request.method), url);
        for (name, value) in headers.iter() {
            builder = builder.header(name, value);
        }
        builder = self.authorize(builder);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        self.runtime.block_on(async move {
            let start = Instant::now();

            let response = builder
                .send()
                .await
                .map_err(|e| Self::map_error(&e, timeout_ms))?;

            let status = response.status().as_u16();
            let final_url = response.url().to_string();
            let response_headers = Self::collect_headers(response.headers());

            let body = response
                .bytes()
                .await
                .map_err(|e| ApplicationError::Http(format!("failed to read body: {e}")))?
                .to_vec();

            Ok(ResponseSpec::new(status, response_headers, body, start.elapsed()).with_url(final_url))
        })
    }

    fn defaults(&self) -> RequestDefaults {
        self.defaults.clone()
    }

    fn merge_defaults(&mut self, overrides: RequestDefaults) {
        self.defaults.merge(overrides.iter());
    }

    fn force_authenticate(&mut self, credentials: Option<Credentials>) {
        debug!(
            scheme = credentials.as_ref().map_or("none", Credentials::scheme),
            "Forcing authentication"
        );
        self.credentials = credentials;
    }

    fn force_login(&mut self, username: &str) {
        debug!(user = username, "Forcing login");
        self.user = Some(username.to_string());
    }

    fn login(&mut self, username: &str, password: &str) -> ApplicationResult<bool> {
        let request = RequestSpec::post(
            self.settings.login_path.clone(),
            json!({"username": username, "password": password}),
        );
        let response = self.execute(&request)?;
        if !(200..300).contains(&response.status) {
            debug!(user = username, status = response.status, "Login rejected");
            return Ok(false);
        }

        let token = response
            .json_body()
            .ok()
            .and_then(|body| body.get("token").and_then(Value::as_str).map(str::to_owned));
        self.credentials = Some(match token {
            Some(token) => Credentials::bearer(token),
            None => Credentials::basic(username, password),
        });
        debug!(user = username, "Logged in");
        Ok(true)
    }
}

//! Client settings.
//!
//! Loaded in layers, later layers winning: built-in defaults, an optional
//! settings file, then `LLSTEP_*` environment variables.

use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Prefix of the environment variables read by [`ClientSettings::load`].
pub const ENV_PREFIX: &str = "LLSTEP";

/// Errors raised while loading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A source could not be read or deserialized.
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    /// The configured base URL is not an absolute URL.
    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl {
        /// The configured value.
        url: String,
        /// Parser message.
        reason: String,
    },
}

/// Settings of the reqwest-backed client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    /// Relative request paths are joined onto this URL.
    pub base_url: String,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Redirects followed before giving up.
    pub max_redirects: usize,
    /// `User-Agent` header value.
    pub user_agent: String,
    /// Path the `login` step posts credentials to.
    pub login_path: String,
    /// Header carrying the user set by `force_login`.
    pub remote_user_header: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_ms: 30_000,
            max_redirects: 10,
            user_agent: concat!("llstep/", env!("CARGO_PKG_VERSION")).to_string(),
            login_path: "/api/login/".to_string(),
            remote_user_header: "Remote-User".to_string(),
        }
    }
}

impl ClientSettings {
    /// Loads settings from defaults, `file` (if given) and the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, a value has the wrong
    /// type, or the base URL is invalid.
    pub fn load(file: Option<&Path>) -> Result<Self, SettingsError> {
        Self::load_from(file, None)
    }

    /// Like [`ClientSettings::load`], reading variables from `env` instead
    /// of the process environment when it is given.
    ///
    /// # Errors
    ///
    /// See [`ClientSettings::load`].
    pub fn load_from(
        file: Option<&Path>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self, SettingsError> {
        let mut builder = Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .source(env),
        );

        let settings: Self = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Sets the base URL (builder pattern).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Parses the base URL.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidBaseUrl`] if it is not an absolute URL.
    pub fn base_url(&self) -> Result<Url, SettingsError> {
        Url::parse(&self.base_url).map_err(|e| SettingsError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })
    }

    fn validate(&self) -> Result<(), SettingsError> {
        self.base_url().map(|_| ())
    }
}

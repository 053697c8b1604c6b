//! Credentials forwarded to the HTTP client collaborator

use serde::{Deserialize, Serialize};

/// Credentials a client attaches to the requests it issues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Credentials {
    /// Bearer token authentication
    Bearer {
        /// The token
        token: String,
        /// Scheme prefix, defaults to "Bearer"
        #[serde(default = "default_bearer_prefix")]
        prefix: String,
    },
    /// Basic authentication
    Basic {
        /// Username
        username: String,
        /// Password
        password: String,
    },
    /// API key sent in a header
    ApiKey {
        /// Header name
        name: String,
        /// The key
        key: String,
    },
}

fn default_bearer_prefix() -> String {
    "Bearer".to_string()
}

impl Credentials {
    /// Creates bearer token credentials.
    #[must_use]
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer {
            token: token.into(),
            prefix: default_bearer_prefix(),
        }
    }

    /// Creates basic credentials.
    #[must_use]
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Creates API key credentials sent in the named header.
    #[must_use]
    pub fn api_key(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self::ApiKey {
            name: name.into(),
            key: key.into(),
        }
    }

    /// Short label for logs; never includes the secret.
    #[must_use]
    pub const fn scheme(&self) -> &'static str {
        match self {
            Self::Bearer { .. } => "bearer",
            Self::Basic { .. } => "basic",
            Self::ApiKey { .. } => "api_key",
        }
    }
}

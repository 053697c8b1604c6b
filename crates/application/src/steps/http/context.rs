//! Per-scenario HTTP state.

use std::fmt;
use std::sync::Arc;

use llstep_domain::ResponseSpec;
use tracing::debug;

use crate::ports::{ClientFactory, HttpClient};
use crate::{ApplicationError, ApplicationResult};

/// The client and the last response of one scenario.
///
/// Request steps write the response slot; assertion steps read it. The
/// client is created from the factory on first use.
pub struct HttpContext {
    factory: ClientFactory,
    client: Option<Box<dyn HttpClient>>,
    response: Option<ResponseSpec>,
}

impl HttpContext {
    /// Creates a context whose client will be built by `factory`.
    #[must_use]
    pub fn new(factory: ClientFactory) -> Self {
        Self {
            factory,
            client: None,
            response: None,
        }
    }

    /// Creates a context around an already built client.
    #[must_use]
    pub fn with_client(client: impl HttpClient + 'static) -> Self {
        let factory: ClientFactory = Arc::new(|| -> ApplicationResult<Box<dyn HttpClient>> {
            Err(ApplicationError::ClientUnavailable(
                "client was supplied directly and cannot be rebuilt".to_string(),
            ))
        });
        Self {
            factory,
            client: Some(Box::new(client)),
            response: None,
        }
    }

    /// Returns the client, creating it on first use.
    ///
    /// # Errors
    ///
    /// Returns the factory's error if the client cannot be created.
    pub fn client(&mut self) -> ApplicationResult<&mut dyn HttpClient> {
        let client = match self.client.take() {
            Some(client) => client,
            None => {
                debug!("Creating HTTP client");
                (self.factory)()?
            }
        };
        Ok(&mut **self.client.insert(client))
    }

    /// Returns true if the client has been created.
    #[must_use]
    pub const fn has_client(&self) -> bool {
        self.client.is_some()
    }

    /// The last captured response.
    ///
    /// # Errors
    ///
    /// Returns [`ApplicationError::NoResponse`] if no request was issued yet.
    pub fn response(&self) -> ApplicationResult<&ResponseSpec> {
        self.response.as_ref().ok_or(ApplicationError::NoResponse)
    }

    /// Replaces the stored response.
    pub fn store_response(&mut self, response: ResponseSpec) -> &ResponseSpec {
        self.response.insert(response)
    }

    /// Forgets the stored response; the client is kept.
    pub fn clear_response(&mut self) {
        self.response = None;
    }
}

impl fmt::Debug for HttpContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpContext")
            .field("has_client", &self.client.is_some())
            .field("response", &self.response)
            .finish_non_exhaustive()
    }
}

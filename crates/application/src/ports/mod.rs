//! Port definitions (interfaces)
//!
//! Ports define the boundary between the step library and the HTTP client
//! collaborator that actually talks to the API under test.

mod http_client;
mod scripted;

pub use http_client::{ClientFactory, HttpClient, RequestDefaults, client_factory};
pub use scripted::{RecordedRequest, ScriptedHttpClient};

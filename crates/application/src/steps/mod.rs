//! Step libraries.

pub mod http;

pub use http::{HTTP_PROPERTY, Http, HttpContext, HttpPrefixExt, HttpSteps, install};

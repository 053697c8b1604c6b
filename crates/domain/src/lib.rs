//! llstep Domain - Core matching and assertion types
//!
//! This crate defines what the HTTP step library compares and how: the
//! structural JSON matcher, response normalisation, envelope detection for
//! list responses, and the assertion vocabulary evaluated against captured
//! responses. All types here are pure Rust with no I/O dependencies.

pub mod auth;
pub mod error;
pub mod json;
pub mod request;
pub mod response;
pub mod testing;

pub use auth::Credentials;
pub use error::{DomainError, DomainResult};
pub use json::{
    EnvelopeShape, ExcludedFields, Mismatch, MismatchKind, find_mismatch, json_values_match,
    normalize,
};
pub use request::{HttpMethod, RequestSpec};
pub use response::ResponseSpec;
pub use testing::{Assertion, AssertionFailure, AssertionResult, ResponseChecker, assert_data};

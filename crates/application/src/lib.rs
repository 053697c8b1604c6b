//! llstep Application - Step registry and HTTP steps
//!
//! This crate defines the application layer with:
//! - Port traits for the HTTP client collaborator
//! - The step extension registry and the per-scenario step context
//! - The HTTP step library
//! - Application-level error handling

pub mod error;
pub mod extension;
pub mod ports;
pub mod steps;

pub use error::{ApplicationError, ApplicationResult, StepError, StepResult};
pub use extension::{
    ExtensionHost, ExtensionRegistry, ExtensionSlots, StepDefinition, StepLibrary, StepOutcome,
    TestStepPrefix, Visibility,
};
pub use ports::{ClientFactory, HttpClient, RequestDefaults, ScriptedHttpClient, client_factory};
pub use steps::{HTTP_PROPERTY, Http, HttpContext, HttpPrefixExt, HttpSteps, install};

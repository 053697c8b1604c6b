//! llstep Infrastructure - Adapters and implementations
//!
//! This crate provides the reqwest-backed implementation of the HTTP client
//! port, settings loading, logging setup, and a ready-made step registry.

pub mod adapters;
pub mod compose;
pub mod logging;
pub mod settings;

pub use adapters::ReqwestHttpClient;
pub use compose::{default_registry, reqwest_client_factory};
pub use settings::{ClientSettings, SettingsError};

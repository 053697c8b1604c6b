//! Captured HTTP responses

mod spec;

pub use spec::ResponseSpec;

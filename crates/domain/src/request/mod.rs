//! Request types issued by HTTP steps

mod method;
mod spec;

pub use method::HttpMethod;
pub use spec::RequestSpec;

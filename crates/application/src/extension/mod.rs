//! Step extension registry.
//!
//! Step libraries contribute named steps for a target type, and capabilities
//! are exposed as lazily created, per-owner properties of a step context
//! such as [`TestStepPrefix`].

mod host;
mod prefix;
mod registry;
mod step;

pub use host::{Capability, ExtensionHost, ExtensionSlots};
pub use prefix::TestStepPrefix;
pub use registry::ExtensionRegistry;
pub use step::{StepDefinition, StepFn, StepLibrary, StepOutcome, StepTable, Visibility};

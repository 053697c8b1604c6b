//! The per-scenario step context.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::host::{ExtensionHost, ExtensionSlots};
use super::registry::ExtensionRegistry;
use super::step::StepOutcome;
use crate::StepResult;

/// Context handed to every step of a scenario.
///
/// Capabilities exposed on `TestStepPrefix` are created on first access and
/// live as long as the prefix does, so a fresh prefix per scenario gives
/// every scenario its own client and its own last response.
pub struct TestStepPrefix {
    registry: Arc<ExtensionRegistry>,
    slots: ExtensionSlots,
}

impl TestStepPrefix {
    /// Creates a context backed by `registry`.
    #[must_use]
    pub fn new(registry: Arc<ExtensionRegistry>) -> Self {
        Self {
            registry,
            slots: ExtensionSlots::new(),
        }
    }

    /// The registry this context resolves steps and properties against.
    #[must_use]
    pub fn registry(&self) -> &ExtensionRegistry {
        &self.registry
    }

    /// Reads the capability exposed under `name`.
    ///
    /// # Errors
    ///
    /// Fails if `name` is not exposed on `TestStepPrefix` or is not a `C`.
    pub fn extension<C: 'static>(&mut self, name: &str) -> StepResult<&mut C> {
        let registry = Arc::clone(&self.registry);
        registry.property::<Self, C>(self, name)
    }

    /// Runs step `step` on the capability exposed under `property`.
    ///
    /// # Errors
    ///
    /// Fails if the property or step is unknown, or if the step fails.
    pub fn call(&mut self, property: &str, step: &str, args: &[Value]) -> StepOutcome {
        let registry = Arc::clone(&self.registry);
        registry.call_property(self, property, step, args)
    }

    /// Returns true if the capability under `name` has been created.
    #[must_use]
    pub fn is_initialized(&self, name: &str) -> bool {
        self.slots.is_initialized(name)
    }

    /// Drops every created capability; the next read creates fresh ones.
    pub fn reset(&mut self) {
        self.slots.clear();
    }
}

impl ExtensionHost for TestStepPrefix {
    fn extension_slots(&mut self) -> &mut ExtensionSlots {
        &mut self.slots
    }
}

impl fmt::Debug for TestStepPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestStepPrefix")
            .field("slots", &self.slots)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::extension::StepDefinition;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[derive(Default)]
    struct Tally(u32);

    fn registry() -> Arc<ExtensionRegistry> {
        let mut registry = ExtensionRegistry::new();
        registry.register_definition(StepDefinition::public("bump", |t: &mut Tally, _: &[Value]| {
            t.0 += 1;
            Ok(json!(t.0))
        }));
        registry.expose_as_property::<TestStepPrefix, Tally, _>("tally", Tally::default);
        Arc::new(registry)
    }

    #[test]
    fn capability_is_created_lazily() {
        let mut prefix = TestStepPrefix::new(registry());
        assert!(!prefix.is_initialized("tally"));

        prefix.extension::<Tally>("tally").unwrap();
        assert!(prefix.is_initialized("tally"));
    }

    #[test]
    fn state_persists_between_steps() {
        let mut prefix = TestStepPrefix::new(registry());
        prefix.call("tally", "bump", &[]).unwrap();
        assert_eq!(prefix.call("tally", "bump", &[]).unwrap(), json!(2));
        assert_eq!(prefix.extension::<Tally>("tally").unwrap().0, 2);
    }

    #[test]
    fn prefixes_do_not_share_capabilities() {
        let registry = registry();
        let mut a = TestStepPrefix::new(Arc::clone(&registry));
        let mut b = TestStepPrefix::new(registry);

        a.call("tally", "bump", &[]).unwrap();
        assert_eq!(b.extension::<Tally>("tally").unwrap().0, 0);
    }

    #[test]
    fn reset_starts_over() {
        let mut prefix = TestStepPrefix::new(registry());
        prefix.call("tally", "bump", &[]).unwrap();
        prefix.reset();
        assert_eq!(prefix.extension::<Tally>("tally").unwrap().0, 0);
    }
}

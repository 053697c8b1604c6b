//! Per-owner storage for capabilities created on first access.

use std::any::Any;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;

use tracing::debug;

/// A type-erased capability instance.
pub type Capability = dyn Any + Send;

/// Capability instances owned by one host, keyed by property name.
///
/// A slot is filled the first time its property is read and then reused for
/// the rest of the host's life.
#[derive(Default)]
pub struct ExtensionSlots {
    values: HashMap<String, Box<Capability>>,
}

impl ExtensionSlots {
    /// Creates an empty set of slots.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the instance stored under `name`, creating it with `create`
    /// if the slot is empty.
    pub fn get_or_insert_with(
        &mut self,
        name: &str,
        create: impl FnOnce() -> Box<Capability>,
    ) -> &mut Capability {
        let boxed = match self.values.entry(name.to_string()) {
            Entry::Occupied(slot) => slot.into_mut(),
            Entry::Vacant(slot) => {
                debug!(property = name, "Creating capability");
                slot.insert(create())
            }
        };
        &mut **boxed
    }

    /// Returns true if the property has been read at least once.
    #[must_use]
    pub fn is_initialized(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Returns the number of created capabilities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if nothing has been created yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Drops every created capability.
    pub fn clear(&mut self) {
        self.values.clear();
    }
}

impl fmt::Debug for ExtensionSlots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.values.keys()).finish()
    }
}

/// A type that capabilities can be exposed on.
pub trait ExtensionHost {
    /// The host's capability storage.
    fn extension_slots(&mut self) -> &mut ExtensionSlots;
}

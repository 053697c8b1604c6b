//! Registry of steps and exposed capabilities, keyed by target type.
//!
//! Steps are bound per target type, so registering steps for one type never
//! affects another. A later registration under an existing name replaces the
//! earlier one.
//!
//! Capabilities are exposed on an owner type under a property name. The
//! first read of the property on an owner instance creates the capability
//! from its factory; later reads on the same instance return that same
//! capability. Each owner instance gets its own.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, trace};

use super::host::{Capability, ExtensionHost};
use super::step::{StepDefinition, StepLibrary, StepOutcome, StepTable};
use crate::{StepError, StepResult};

type CapabilityFactory = Arc<dyn Fn() -> Box<Capability> + Send + Sync>;

type Dispatch = fn(&ExtensionRegistry, &str, &mut Capability, &str, &[Value]) -> StepOutcome;

struct PropertyBinding {
    capability: &'static str,
    factory: CapabilityFactory,
    dispatch: Dispatch,
}

/// Steps and capability properties available to a suite.
#[derive(Default)]
pub struct ExtensionRegistry {
    steps: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
    properties: HashMap<TypeId, IndexMap<String, PropertyBinding>>,
}

impl ExtensionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `func` as a step named `name` on target type `T`.
    ///
    /// Returns true if an earlier binding was replaced.
    pub fn register<T, F>(&mut self, name: impl Into<String>, func: F) -> bool
    where
        T: 'static,
        F: Fn(&mut T, &[Value]) -> StepOutcome + Send + Sync + 'static,
    {
        self.register_definition(StepDefinition::<T>::public(name, func))
    }

    /// Binds a single definition, regardless of its visibility.
    pub fn register_definition<T: 'static>(&mut self, definition: StepDefinition<T>) -> bool {
        let mut table = self.take_steps::<T>();
        let replaced = Self::bind(&mut table, definition);
        self.put_steps(table);
        replaced
    }

    /// Binds every public definition of `library` on target type `T`.
    ///
    /// Internal definitions are skipped. Returns the number of steps bound.
    pub fn register_all_from<T, L>(&mut self, library: &L) -> usize
    where
        T: 'static,
        L: StepLibrary<T> + ?Sized,
    {
        let mut table = self.take_steps::<T>();
        let mut bound = 0;
        for definition in library.definitions() {
            if !definition.is_public() {
                trace!(library = library.name(), step = definition.name(), "Skipping internal definition");
                continue;
            }
            Self::bind(&mut table, definition);
            bound += 1;
        }
        self.put_steps(table);
        debug!(library = library.name(), steps = bound, "Registered step library");
        bound
    }

    /// Steps bound on target type `T`, if any.
    #[must_use]
    pub fn steps<T: 'static>(&self) -> Option<&StepTable<T>> {
        self.steps
            .get(&TypeId::of::<T>())
            .and_then(|table| table.downcast_ref::<StepTable<T>>())
    }

    /// Runs the step `name` bound on `T` against `target`.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::UnknownStep`] if no such step is bound, otherwise
    /// the step's own result.
    pub fn call<T: 'static>(&self, target: &mut T, name: &str, args: &[Value]) -> StepOutcome {
        match self.steps::<T>() {
            Some(table) => table.call(target, name, args),
            None => Err(StepError::UnknownStep {
                target: type_name::<T>(),
                name: name.to_string(),
            }),
        }
    }

    /// Exposes a capability of type `C` on owner type `O` under `name`.
    ///
    /// `factory` runs once per owner instance, on the first read of the
    /// property. Returns true if an earlier property of that name was
    /// replaced.
    pub fn expose_as_property<O, C, F>(&mut self, name: impl Into<String>, factory: F) -> bool
    where
        O: ExtensionHost + 'static,
        C: Send + 'static,
        F: Fn() -> C + Send + Sync + 'static,
    {
        let name = name.into();
        debug!(owner = type_name::<O>(), property = %name, capability = type_name::<C>(), "Exposing property");
        let binding = PropertyBinding {
            capability: type_name::<C>(),
            factory: Arc::new(move || Box::new(factory()) as Box<Capability>),
            dispatch: dispatch_to::<C>,
        };
        self.properties
            .entry(TypeId::of::<O>())
            .or_default()
            .insert(name, binding)
            .is_some()
    }

    /// Returns true if `name` is exposed on owner type `O`.
    #[must_use]
    pub fn has_property<O: 'static>(&self, name: &str) -> bool {
        self.properties
            .get(&TypeId::of::<O>())
            .is_some_and(|bindings| bindings.contains_key(name))
    }

    /// Property names exposed on owner type `O`, in exposure order.
    #[must_use]
    pub fn property_names<O: 'static>(&self) -> Vec<&str> {
        self.properties
            .get(&TypeId::of::<O>())
            .map(|bindings| bindings.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Reads property `name` on `owner`, creating the capability on first
    /// access.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::UnknownProperty`] if nothing is exposed under
    /// `name`, or [`StepError::PropertyType`] if the capability is not a `C`.
    pub fn property<'o, O, C>(&self, owner: &'o mut O, name: &str) -> StepResult<&'o mut C>
    where
        O: ExtensionHost + 'static,
        C: 'static,
    {
        let binding = self.binding::<O>(name)?;
        owner
            .extension_slots()
            .get_or_insert_with(name, || (binding.factory)())
            .downcast_mut::<C>()
            .ok_or_else(|| StepError::PropertyType {
                name: name.to_string(),
                expected: type_name::<C>(),
            })
    }

    /// Runs step `step` on the capability behind property `property`.
    ///
    /// The capability is created if this is the first read of the property
    /// on `owner`. The step is looked up on the capability's own type.
    ///
    /// # Errors
    ///
    /// Returns an error if the property or the step is unknown, otherwise the
    /// step's own result.
    pub fn call_property<O>(&self, owner: &mut O, property: &str, step: &str, args: &[Value]) -> StepOutcome
    where
        O: ExtensionHost + 'static,
    {
        let binding = self.binding::<O>(property)?;
        let capability = owner
            .extension_slots()
            .get_or_insert_with(property, || (binding.factory)());
        (binding.dispatch)(self, property, capability, step, args)
    }

    fn binding<O: 'static>(&self, name: &str) -> StepResult<&PropertyBinding> {
        self.properties
            .get(&TypeId::of::<O>())
            .and_then(|bindings| bindings.get(name))
            .ok_or_else(|| StepError::UnknownProperty {
                owner: type_name::<O>(),
                name: name.to_string(),
            })
    }

    fn bind<T>(table: &mut StepTable<T>, definition: StepDefinition<T>) -> bool {
        let (name, func) = definition.into_parts();
        let replaced = table.register(name.clone(), func).is_some();
        if replaced {
            debug!(step = %name, target = type_name::<T>(), "Replaced step binding");
        } else {
            trace!(step = %name, target = type_name::<T>(), "Registered step");
        }
        replaced
    }

    fn take_steps<T: 'static>(&mut self) -> StepTable<T> {
        self.steps
            .remove(&TypeId::of::<T>())
            .and_then(|table| table.downcast::<StepTable<T>>().ok())
            .map_or_else(StepTable::new, |table| *table)
    }

    fn put_steps<T: 'static>(&mut self, table: StepTable<T>) {
        self.steps.insert(TypeId::of::<T>(), Box::new(table));
    }
}

fn dispatch_to<C: 'static>(
    registry: &ExtensionRegistry,
    property: &str,
    capability: &mut Capability,
    step: &str,
    args: &[Value],
) -> StepOutcome {
    let target = capability
        .downcast_mut::<C>()
        .ok_or_else(|| StepError::PropertyType {
            name: property.to_string(),
            expected: type_name::<C>(),
        })?;
    registry.call(target, step, args)
}

impl fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let properties: Vec<(&str, &str)> = self
            .properties
            .values()
            .flat_map(|bindings| {
                bindings
                    .iter()
                    .map(|(name, binding)| (name.as_str(), binding.capability))
            })
            .collect();
        f.debug_struct("ExtensionRegistry")
            .field("step_targets", &self.steps.len())
            .field("properties", &properties)
            .finish()
    }
}

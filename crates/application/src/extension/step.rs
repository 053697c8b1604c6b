//! Step functions and the tables they are registered in.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::{StepError, StepResult};

/// What a step dispatched by name returns: `null` for plain steps, a value
/// for steps that report something back.
pub type StepOutcome = StepResult<Value>;

/// A step bound to its target type. The first parameter is the instance the
/// step runs on; the rest arrive as JSON arguments.
pub type StepFn<T> = Arc<dyn Fn(&mut T, &[Value]) -> StepOutcome + Send + Sync>;

/// Whether a library exposes a definition as a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Registered as a callable step.
    Public,
    /// A helper kept inside the library; never registered.
    Internal,
}

/// A named step function offered by a [`StepLibrary`].
pub struct StepDefinition<T> {
    name: String,
    visibility: Visibility,
    func: StepFn<T>,
}

impl<T> StepDefinition<T> {
    /// A definition that is registered as a step.
    pub fn public<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&mut T, &[Value]) -> StepOutcome + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            visibility: Visibility::Public,
            func: Arc::new(func),
        }
    }

    /// A helper definition that registration skips.
    pub fn internal<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&mut T, &[Value]) -> StepOutcome + Send + Sync + 'static,
    {
        Self {
            visibility: Visibility::Internal,
            ..Self::public(name, func)
        }
    }

    /// The step name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The definition's visibility.
    #[must_use]
    pub const fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Returns true if registration should expose this definition.
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    pub(crate) fn into_parts(self) -> (String, StepFn<T>) {
        (self.name, self.func)
    }
}

impl<T> Clone for StepDefinition<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            visibility: self.visibility,
            func: Arc::clone(&self.func),
        }
    }
}

impl<T> fmt::Debug for StepDefinition<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepDefinition")
            .field("name", &self.name)
            .field("visibility", &self.visibility)
            .finish_non_exhaustive()
    }
}

/// A module of related steps for one target type.
///
/// Implementations list every definition they contain; helpers are marked
/// [`Visibility::Internal`] and stay out of the registry.
pub trait StepLibrary<T> {
    /// Library name, for logs.
    fn name(&self) -> &'static str;

    /// All definitions in the library.
    fn definitions(&self) -> Vec<StepDefinition<T>>;
}

/// Steps registered for one target type, by name.
pub struct StepTable<T> {
    steps: IndexMap<String, StepFn<T>>,
}

impl<T> Default for StepTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> StepTable<T> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            steps: IndexMap::new(),
        }
    }

    /// Binds `func` under `name`, replacing any earlier binding.
    ///
    /// Returns the replaced binding.
    pub fn register(&mut self, name: impl Into<String>, func: StepFn<T>) -> Option<StepFn<T>> {
        self.steps.insert(name.into(), func)
    }

    /// Looks up a step.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&StepFn<T>> {
        self.steps.get(name)
    }

    /// Returns true if a step of this name is bound.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.steps.contains_key(name)
    }

    /// Step names in first-registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.steps.keys().map(String::as_str)
    }

    /// Returns the number of bound steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true if no steps are bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Runs the named step on `target`.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::UnknownStep`] if nothing is bound under `name`,
    /// otherwise whatever the step returns.
    pub fn call(&self, target: &mut T, name: &str, args: &[Value]) -> StepOutcome {
        let step = self.get(name).ok_or_else(|| StepError::UnknownStep {
            target: std::any::type_name::<T>(),
            name: name.to_string(),
        })?;
        step(target, args)
    }
}

impl<T> fmt::Debug for StepTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.steps.keys()).finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[derive(Default)]
    struct Counter {
        value: i64,
    }

    fn add(counter: &mut Counter, args: &[Value]) -> StepOutcome {
        counter.value += args.first().and_then(Value::as_i64).unwrap_or(1);
        Ok(json!(counter.value))
    }

    #[test]
    fn call_passes_the_target_as_first_argument() {
        let mut table = StepTable::new();
        table.register("add", Arc::new(add) as StepFn<Counter>);

        let mut counter = Counter::default();
        assert_eq!(table.call(&mut counter, "add", &[json!(5)]).unwrap(), json!(5));
        assert_eq!(table.call(&mut counter, "add", &[]).unwrap(), json!(6));
    }

    #[test]
    fn unknown_steps_are_reported() {
        let table = StepTable::<Counter>::new();
        let err = table.call(&mut Counter::default(), "nope", &[]).unwrap_err();
        assert!(matches!(err, StepError::UnknownStep { ref name, .. } if name == "nope"));
    }

    #[test]
    fn internal_definitions_keep_their_visibility() {
        let def = StepDefinition::<Counter>::internal("_helper", add);
        assert!(!def.is_public());
        assert_eq!(def.name(), "_helper");
        assert_eq!(def.clone().visibility(), Visibility::Internal);
    }
}

//! Stripping of volatile fields before exact comparison.
//!
//! Server-assigned identifiers (`id`, `url`) and any caller-named fields are
//! removed from the top level of a mapping. Non-mapping values pass through
//! unchanged. The input is never mutated.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fields removed from every normalised item.
pub const VOLATILE_FIELDS: [&str; 2] = ["id", "url"];

/// Additional field names to strip during normalisation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExcludedFields(Vec<String>);

impl ExcludedFields {
    /// No exclusions beyond [`VOLATILE_FIELDS`].
    #[must_use]
    pub const fn none() -> Self {
        Self(Vec::new())
    }

    /// Creates an exclusion list from field names.
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(fields.into_iter().map(Into::into).collect())
    }

    /// Reads an exclusion list from a loosely typed argument.
    ///
    /// Only a JSON array counts; its string items become exclusions and
    /// anything else in it is skipped. `None`, `null` or any non-array value
    /// means no exclusions.
    #[must_use]
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Array(items)) => Self(
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_owned)
                    .collect(),
            ),
            _ => Self::none(),
        }
    }

    /// Returns the excluded field names.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Returns true if nothing beyond the volatile fields is excluded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ExcludedFields {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self::new(iter)
    }
}

/// Returns a copy of `item` without volatile and excluded top-level fields.
#[must_use]
pub fn normalize(item: &Value, excluded: &ExcludedFields) -> Value {
    let mut copy = item.clone();
    strip_fields(&mut copy, excluded);
    copy
}

/// Strips volatile and excluded top-level fields from an owned value.
pub fn strip_fields(item: &mut Value, excluded: &ExcludedFields) {
    if let Value::Object(fields) = item {
        for name in VOLATILE_FIELDS.into_iter().chain(excluded.iter()) {
            fields.shift_remove(name);
        }
    }
}

//! Detection and unwrapping of enveloped list items.
//!
//! Some list endpoints wrap each item as `{"etag": ..., "content": {...}}`.
//! The shape is decided once, from the first item, and applied to the whole
//! list. A list that mixes wrapped and bare items is not supported.

use serde_json::Value;

/// Key whose presence on the first item marks an enveloped list.
pub const ENVELOPE_MARKER: &str = "etag";

/// Key holding the payload of an enveloped item.
pub const ENVELOPE_PAYLOAD: &str = "content";

/// Shape of the items of a list response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnvelopeShape {
    /// Not decided yet (empty list).
    #[default]
    Unknown,
    /// Items are wrapped; the payload sits under [`ENVELOPE_PAYLOAD`].
    Enveloped,
    /// Items are bare.
    Flat,
}

impl EnvelopeShape {
    /// Decides the shape from a list's first item.
    #[must_use]
    pub fn detect(first: &Value) -> Self {
        match first {
            Value::Object(fields) if fields.contains_key(ENVELOPE_MARKER) => Self::Enveloped,
            _ => Self::Flat,
        }
    }

    /// Returns the payload of `item` under this shape.
    ///
    /// An enveloped item without a payload unwraps to `null`.
    #[must_use]
    pub fn payload(self, item: Value) -> Value {
        match (self, item) {
            (Self::Enveloped, Value::Object(mut fields)) => fields
                .shift_remove(ENVELOPE_PAYLOAD)
                .unwrap_or(Value::Null),
            (Self::Enveloped, _) => Value::Null,
            (_, item) => item,
        }
    }
}

/// Unwraps every item using the shape of the first one.
#[must_use]
pub fn unwrap_items(items: Vec<Value>) -> (EnvelopeShape, Vec<Value>) {
    let shape = items.first().map_or(EnvelopeShape::Unknown, EnvelopeShape::detect);
    let items = items.into_iter().map(|item| shape.payload(item)).collect();
    (shape, items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn first_item_decides_for_the_whole_list() {
        let items = vec![
            json!({"etag": "a", "content": {"id": 1, "name": "x"}}),
            json!({"content": {"id": 2, "name": "y"}}),
        ];

        let (shape, unwrapped) = unwrap_items(items);

        assert_eq!(shape, EnvelopeShape::Enveloped);
        assert_eq!(
            unwrapped,
            vec![json!({"id": 1, "name": "x"}), json!({"id": 2, "name": "y"})]
        );
    }

    #[test]
    fn flat_lists_are_left_alone() {
        let items = vec![json!({"id": 1}), json!({"etag": "late", "content": 3})];

        let (shape, unwrapped) = unwrap_items(items.clone());

        assert_eq!(shape, EnvelopeShape::Flat);
        assert_eq!(unwrapped, items);
    }

    #[test]
    fn empty_lists_stay_undecided() {
        let (shape, unwrapped) = unwrap_items(Vec::new());
        assert_eq!(shape, EnvelopeShape::Unknown);
        assert!(unwrapped.is_empty());
    }

    #[test]
    fn missing_payload_unwraps_to_null() {
        assert_eq!(EnvelopeShape::Enveloped.payload(json!({"etag": "a"})), Value::Null);
        assert_eq!(EnvelopeShape::detect(&json!("etag")), EnvelopeShape::Flat);
    }
}

//! JSON comparison primitives used by the response assertions.

pub mod envelope;
pub mod matcher;
pub mod normalize;

pub use envelope::{ENVELOPE_MARKER, ENVELOPE_PAYLOAD, EnvelopeShape, unwrap_items};
pub use matcher::{Mismatch, MismatchKind, find_mismatch, json_values_match};
pub use normalize::{ExcludedFields, VOLATILE_FIELDS, normalize, strip_fields};

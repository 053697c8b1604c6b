//! Structural matching of an expected JSON value against an observed one.
//!
//! Mappings are compared with subset semantics: every key of the expected
//! mapping must be satisfied by the observed one, extra observed keys are
//! ignored. Sequences must have the same length and match position by
//! position. Everything else compares by plain equality, so `1` does not
//! match `"1"`.
//!
//! A missing observed key is treated like `null`: an expected `null` is
//! satisfied by an absent key, an expected mapping is not.
//!
//! The walk keeps its own stack, so deeply nested documents do not grow the
//! call stack.

use std::fmt;

use serde_json::{Map, Value};

/// Returns true if `observed` satisfies `expected`.
#[must_use]
pub fn json_values_match(expected: &Value, observed: &Value) -> bool {
    find_mismatch(expected, observed).is_none()
}

/// Walks `expected` and returns the first place where `observed` fails to
/// satisfy it, in document order.
#[must_use]
pub fn find_mismatch(expected: &Value, observed: &Value) -> Option<Mismatch> {
    let mut trail = Trail::default();
    let mut pending = vec![Pending {
        at: None,
        expected,
        observed: Some(observed),
    }];

    while let Some(next) = pending.pop() {
        let verdict = match next.expected {
            Value::Array(items) => sequences_match(items, &next, &mut trail, &mut pending),
            Value::Object(fields) => mappings_match(fields, &next, &mut trail, &mut pending),
            scalar => scalars_match(scalar, next.observed),
        };
        if let Err(kind) = verdict {
            return Some(Mismatch {
                path: trail.render(next.at),
                expected: next.expected.clone(),
                observed: next.observed.cloned(),
                kind,
            });
        }
    }

    None
}

/// Where and why an observed value failed to satisfy the expected one.
#[derive(Debug, Clone, PartialEq)]
pub struct Mismatch {
    /// Location in JSONPath-like syntax, e.g. `$.items[2].name`.
    pub path: String,
    /// The expected value at `path`.
    pub expected: Value,
    /// The observed value at `path`, `None` when the key is absent.
    pub observed: Option<Value>,
    /// Why the values did not match.
    pub kind: MismatchKind,
}

/// Reason for a [`Mismatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MismatchKind {
    /// Expected a sequence, observed something else.
    NotASequence,
    /// Sequences of different lengths.
    LengthDiffers {
        /// Expected length.
        expected: usize,
        /// Observed length.
        observed: usize,
    },
    /// Expected a mapping, observed `null`, an absent key, or a non-mapping.
    NotAMapping,
    /// Scalars differ.
    ValueDiffers,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let observed = self
            .observed
            .as_ref()
            .map_or_else(|| "<missing>".to_string(), Value::to_string);
        match self.kind {
            MismatchKind::NotASequence => {
                write!(f, "{}: expected an array, got {observed}", self.path)
            }
            MismatchKind::LengthDiffers { expected, observed } => write!(
                f,
                "{}: expected {expected} items, got {observed}",
                self.path
            ),
            MismatchKind::NotAMapping => {
                write!(f, "{}: expected an object, got {observed}", self.path)
            }
            MismatchKind::ValueDiffers => write!(
                f,
                "{}: expected {}, got {observed}",
                self.path, self.expected
            ),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Segment<'a> {
    Key(&'a str),
    Index(usize),
}

/// Path segments of every visited node, each linked to its parent.
#[derive(Default)]
struct Trail<'a> {
    nodes: Vec<(Option<usize>, Segment<'a>)>,
}

impl<'a> Trail<'a> {
    fn push(&mut self, parent: Option<usize>, segment: Segment<'a>) -> usize {
        self.nodes.push((parent, segment));
        self.nodes.len() - 1
    }

    fn render(&self, mut at: Option<usize>) -> String {
        let mut segments = Vec::new();
        while let Some(index) = at {
            let (parent, segment) = self.nodes[index];
            segments.push(segment);
            at = parent;
        }

        let mut out = String::from("$");
        for segment in segments.iter().rev() {
            match segment {
                Segment::Key(key) => {
                    out.push('.');
                    out.push_str(key);
                }
                Segment::Index(index) => {
                    out.push('[');
                    out.push_str(&index.to_string());
                    out.push(']');
                }
            }
        }
        out
    }
}

struct Pending<'a> {
    at: Option<usize>,
    expected: &'a Value,
    observed: Option<&'a Value>,
}

fn sequences_match<'a>(
    expected: &'a [Value],
    node: &Pending<'a>,
    trail: &mut Trail<'a>,
    pending: &mut Vec<Pending<'a>>,
) -> Result<(), MismatchKind> {
    let Some(Value::Array(observed)) = node.observed else {
        return Err(MismatchKind::NotASequence);
    };
    if expected.len() != observed.len() {
        return Err(MismatchKind::LengthDiffers {
            expected: expected.len(),
            observed: observed.len(),
        });
    }
    // Reverse so the stack yields items in document order.
    for (index, (e, o)) in expected.iter().zip(observed).enumerate().rev() {
        pending.push(Pending {
            at: Some(trail.push(node.at, Segment::Index(index))),
            expected: e,
            observed: Some(o),
        });
    }
    Ok(())
}

fn mappings_match<'a>(
    expected: &'a Map<String, Value>,
    node: &Pending<'a>,
    trail: &mut Trail<'a>,
    pending: &mut Vec<Pending<'a>>,
) -> Result<(), MismatchKind> {
    let Some(Value::Object(observed)) = node.observed else {
        return Err(MismatchKind::NotAMapping);
    };
    for (key, e) in expected.iter().rev() {
        pending.push(Pending {
            at: Some(trail.push(node.at, Segment::Key(key))),
            expected: e,
            observed: observed.get(key),
        });
    }
    Ok(())
}

fn scalars_match(expected: &Value, observed: Option<&Value>) -> Result<(), MismatchKind> {
    if observed.unwrap_or(&Value::Null) == expected {
        Ok(())
    } else {
        Err(MismatchKind::ValueDiffers)
    }
}

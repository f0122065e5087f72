//! JSON representation of spaces and their elements.
use super::Space;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A JSON-serializable summary of a space.
///
/// Strict JSON has no representation for infinite values so box bounds are always finite;
/// see [`normalize_infs`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name")]
pub enum SpaceDescriptor {
    /// Integers `0 .. n`.
    Discrete { n: usize },
    /// A product of closed intervals, bounds flattened in row-major order.
    Box {
        shape: Vec<usize>,
        low: Vec<f64>,
        high: Vec<f64>,
    },
}

/// A space whose elements can be converted to and from JSON values.
pub trait JsonSpace: Space {
    /// Summary of this space.
    fn descriptor(&self) -> SpaceDescriptor;

    /// Convert an element to JSON.
    fn to_json(&self, element: &Self::Element) -> Value;

    /// Parse an element from JSON.
    ///
    /// Returns `None` if the value does not have the form of an element.
    /// The parsed element is not necessarily contained in the space.
    fn from_json(&self, value: &Value) -> Option<Self::Element>;

    /// Whether a JSON value represents an element of this space.
    fn contains_json(&self, value: &Value) -> bool {
        self.from_json(value)
            .map_or(false, |element| self.contains(&element))
    }
}

/// Replace an infinite value with the most extreme finite value of the same sign.
#[inline]
pub fn replace_inf(x: f64) -> f64 {
    if x == f64::NEG_INFINITY {
        f64::MIN
    } else if x == f64::INFINITY {
        f64::MAX
    } else {
        x
    }
}

/// Copy values with infinities replaced by finite sentinels.
pub fn normalize_infs(values: &[f64]) -> Vec<f64> {
    values.iter().copied().map(replace_inf).collect()
}

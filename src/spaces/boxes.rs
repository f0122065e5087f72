//! `BoxSpace` definition
use super::{normalize_infs, IntervalSpace, JsonSpace, Space, SpaceDescriptor};
use rand::distributions::Distribution;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// An n-dimensional box: a product of closed intervals.
///
/// Elements are stored flattened in row-major order,
/// so an element always has `shape.iter().product()` values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxSpace {
    shape: Vec<usize>,
    intervals: Vec<IntervalSpace>,
}

impl BoxSpace {
    /// Create a box from per-element lower and upper bounds with a 1D shape.
    ///
    /// # Panics
    /// If `low` and `high` differ in length or if any `low > high`.
    pub fn new(low: &[f64], high: &[f64]) -> Self {
        assert_eq!(low.len(), high.len(), "low and high must have the same length");
        Self {
            shape: vec![low.len()],
            intervals: low
                .iter()
                .zip(high)
                .map(|(&l, &h)| IntervalSpace::new(l, h))
                .collect(),
        }
    }

    /// Create a box with the given shape where every element has the same bounds.
    pub fn uniform(shape: Vec<usize>, low: f64, high: f64) -> Self {
        let interval = IntervalSpace::new(low, high);
        let size = shape.iter().product();
        Self {
            shape,
            intervals: vec![interval; size],
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Total number of (flattened) values in an element.
    pub fn size(&self) -> usize {
        self.intervals.len()
    }

    pub fn low(&self) -> Vec<f64> {
        self.intervals.iter().map(|i| i.low).collect()
    }

    pub fn high(&self) -> Vec<f64> {
        self.intervals.iter().map(|i| i.high).collect()
    }

    /// Clip each value of an element into its interval.
    pub fn clip(&self, element: &mut [f64]) {
        for (x, interval) in element.iter_mut().zip(&self.intervals) {
            *x = interval.clamp(*x);
        }
    }
}

impl fmt::Display for BoxSpace {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Box({:?})", self.shape)
    }
}

impl Space for BoxSpace {
    type Element = Vec<f64>;

    fn contains(&self, value: &Self::Element) -> bool {
        value.len() == self.intervals.len()
            && value
                .iter()
                .zip(&self.intervals)
                .all(|(x, interval)| interval.contains(x))
    }
}

impl Distribution<Vec<f64>> for BoxSpace {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<f64> {
        self.intervals.iter().map(|i| i.sample(rng)).collect()
    }
}

/// Elements are flat JSON arrays of numbers.
///
/// Nested arrays are accepted and flattened,
/// and a bare number is accepted for a box with a single value.
impl JsonSpace for BoxSpace {
    fn descriptor(&self) -> SpaceDescriptor {
        SpaceDescriptor::Box {
            shape: self.shape.clone(),
            low: normalize_infs(&self.low()),
            high: normalize_infs(&self.high()),
        }
    }

    fn to_json(&self, element: &Self::Element) -> Value {
        Value::from(normalize_infs(element))
    }

    fn from_json(&self, value: &Value) -> Option<Self::Element> {
        let mut values = Vec::with_capacity(self.size());
        flatten_numbers(value, &mut values)?;
        if values.len() == self.size() {
            Some(values)
        } else {
            None
        }
    }
}

/// Append every number in a (possibly nested) JSON array to `out`.
///
/// Returns `None` if a non-numeric value is encountered.
fn flatten_numbers(value: &Value, out: &mut Vec<f64>) -> Option<()> {
    match value {
        Value::Number(n) => out.push(n.as_f64()?),
        Value::Array(items) => {
            for item in items {
                flatten_numbers(item, out)?;
            }
        }
        _ => return None,
    }
    Some(())
}

#[cfg(test)]
mod tests {
    use super::super::testing;
    use super::*;
    use serde_json::json;

    #[test]
    fn contains_inside() {
        let space = BoxSpace::new(&[0.0, -1.0], &[1.0, 1.0]);
        assert!(space.contains(&vec![0.5, 0.0]));
    }

    #[test]
    fn not_contains_outside() {
        let space = BoxSpace::new(&[0.0, -1.0], &[1.0, 1.0]);
        assert!(!space.contains(&vec![0.5, 2.0]));
    }

    #[test]
    fn not_contains_wrong_len() {
        let space = BoxSpace::new(&[0.0, -1.0], &[1.0, 1.0]);
        assert!(!space.contains(&vec![0.5]));
    }

    #[test]
    fn mixed_bounds_contains_samples() {
        let space = BoxSpace::new(
            &[0.0, f64::NEG_INFINITY, 1.0, f64::NEG_INFINITY],
            &[1.0, f64::INFINITY, f64::INFINITY, -1.0],
        );
        testing::check_contains_samples(&space, 50);
    }

    #[test]
    fn uniform_shape_size() {
        let space = BoxSpace::uniform(vec![2, 3], -1.0, 1.0);
        assert_eq!(space.size(), 6);
        assert_eq!(space.shape(), &[2, 3]);
    }

    #[test]
    fn clip_into_bounds() {
        let space = BoxSpace::new(&[-1.0, -1.0], &[1.0, 1.0]);
        let mut element = vec![-3.0, 0.25];
        space.clip(&mut element);
        assert_eq!(element, vec![-1.0, 0.25]);
    }

    #[test]
    fn descriptor_replaces_infinities() {
        let space = BoxSpace::new(&[f64::NEG_INFINITY, 0.0], &[f64::INFINITY, 1.0]);
        assert_eq!(
            space.descriptor(),
            SpaceDescriptor::Box {
                shape: vec![2],
                low: vec![f64::MIN, 0.0],
                high: vec![f64::MAX, 1.0],
            }
        );
    }

    #[test]
    fn from_json_flat() {
        let space = BoxSpace::new(&[-1.0, -1.0], &[1.0, 1.0]);
        assert_eq!(space.from_json(&json!([0.5, -0.5])), Some(vec![0.5, -0.5]));
    }

    #[test]
    fn from_json_nested() {
        let space = BoxSpace::uniform(vec![2, 2], -1.0, 1.0);
        assert_eq!(
            space.from_json(&json!([[0, 1], [0.5, -1]])),
            Some(vec![0.0, 1.0, 0.5, -1.0])
        );
    }

    #[test]
    fn from_json_scalar_single() {
        let space = BoxSpace::new(&[-1.0], &[1.0]);
        assert_eq!(space.from_json(&json!(0.25)), Some(vec![0.25]));
    }

    #[test]
    fn from_json_wrong_len() {
        let space = BoxSpace::new(&[-1.0, -1.0], &[1.0, 1.0]);
        assert_eq!(space.from_json(&json!([0.5])), None);
    }

    #[test]
    fn from_json_not_numeric() {
        let space = BoxSpace::new(&[-1.0], &[1.0]);
        assert_eq!(space.from_json(&json!(["a"])), None);
    }
}

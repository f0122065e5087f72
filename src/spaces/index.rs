use super::{JsonSpace, Space, SpaceDescriptor};
use rand::distributions::Distribution;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// An index space; integers 0 .. size-1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexSpace {
    pub size: usize,
}

impl IndexSpace {
    pub const fn new(size: usize) -> Self {
        Self { size }
    }
}

impl fmt::Display for IndexSpace {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Discrete({})", self.size)
    }
}

impl Space for IndexSpace {
    type Element = usize;

    fn contains(&self, value: &Self::Element) -> bool {
        value < &self.size
    }
}

impl Distribution<<Self as Space>::Element> for IndexSpace {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> <Self as Space>::Element {
        rng.gen_range(0..self.size)
    }
}

/// Elements are plain JSON integers.
///
/// A one-element array is also accepted since observations are always sent as arrays.
impl JsonSpace for IndexSpace {
    fn descriptor(&self) -> SpaceDescriptor {
        SpaceDescriptor::Discrete { n: self.size }
    }

    fn to_json(&self, element: &Self::Element) -> Value {
        Value::from(*element)
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    fn from_json(&self, value: &Value) -> Option<Self::Element> {
        match value {
            Value::Number(n) => {
                if let Some(i) = n.as_u64() {
                    usize::try_from(i).ok()
                } else {
                    // Integral floats such as `1.0`
                    let x = n.as_f64()?;
                    if x >= 0.0 && x.fract() == 0.0 && x <= usize::MAX as f64 {
                        Some(x as usize)
                    } else {
                        None
                    }
                }
            }
            Value::Array(items) if items.len() == 1 => self.from_json(&items[0]),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing;
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn contains_zero() {
        assert!(IndexSpace::new(3).contains(&0));
    }

    #[test]
    fn contains_last() {
        assert!(IndexSpace::new(3).contains(&2));
    }

    #[test]
    fn not_contains_size() {
        assert!(!IndexSpace::new(3).contains(&3));
    }

    #[test]
    fn contains_samples() {
        testing::check_contains_samples(&IndexSpace::new(5), 100);
    }

    #[test]
    fn descriptor() {
        assert_eq!(
            serde_json::to_value(IndexSpace::new(4).descriptor()).unwrap(),
            json!({"name": "Discrete", "n": 4})
        );
    }

    #[rstest]
    #[case(json!(1), Some(1))]
    #[case(json!([2]), Some(2))]
    #[case(json!(1.0), Some(1))]
    #[case(json!(-1), None)]
    #[case(json!(0.5), None)]
    #[case(json!([0, 1]), None)]
    #[case(json!("1"), None)]
    fn from_json(#[case] value: Value, #[case] expected: Option<usize>) {
        assert_eq!(IndexSpace::new(4).from_json(&value), expected);
    }

    #[test]
    fn contains_json_out_of_range() {
        assert!(!IndexSpace::new(2).contains_json(&json!(2)));
    }
}

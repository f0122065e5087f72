//! `IntervalSpace` definition
use super::{replace_inf, JsonSpace, Space, SpaceDescriptor};
use rand::distributions::Distribution;
use rand::Rng;
use rand_distr::{Exp1, StandardNormal};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A closed interval of real numbers; either bound may be infinite.
///
/// Infinite values themselves are never contained.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntervalSpace {
    pub low: f64,
    pub high: f64,
}

impl IntervalSpace {
    /// # Panics
    /// If `low > high` or either bound is NaN.
    pub fn new(low: f64, high: f64) -> Self {
        assert!(low <= high, "require low <= high");
        Self { low, high }
    }

    /// The nearest value of the interval.
    pub fn clamp(&self, x: f64) -> f64 {
        x.clamp(self.low, self.high)
    }
}

/// The default interval is the full real number line.
impl Default for IntervalSpace {
    fn default() -> Self {
        Self {
            low: f64::NEG_INFINITY,
            high: f64::INFINITY,
        }
    }
}

impl fmt::Display for IntervalSpace {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}, {}]", self.low, self.high)
    }
}

impl Space for IntervalSpace {
    type Element = f64;

    fn contains(&self, value: &f64) -> bool {
        value.is_finite() && self.low <= *value && *value <= self.high
    }
}

/// Uniform on a bounded interval.
/// A half-bounded interval samples an exponential offset from its finite bound
/// and the real line samples a standard normal.
impl Distribution<f64> for IntervalSpace {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match (self.low.is_finite(), self.high.is_finite()) {
            (true, true) => rng.gen_range(self.low..=self.high),
            (true, false) => self.low + <Exp1 as Distribution<f64>>::sample(&Exp1, rng),
            (false, true) => self.high - <Exp1 as Distribution<f64>>::sample(&Exp1, rng),
            (false, false) => StandardNormal.sample(rng),
        }
    }
}

/// A one-element box; elements are bare JSON numbers.
impl JsonSpace for IntervalSpace {
    fn descriptor(&self) -> SpaceDescriptor {
        SpaceDescriptor::Box {
            shape: vec![1],
            low: vec![replace_inf(self.low)],
            high: vec![replace_inf(self.high)],
        }
    }

    fn to_json(&self, element: &f64) -> Value {
        Value::from(replace_inf(*element))
    }

    fn from_json(&self, value: &Value) -> Option<f64> {
        match value {
            Value::Array(items) if items.len() == 1 => items[0].as_f64(),
            other => other.as_f64(),
        }
    }
}

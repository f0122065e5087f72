//! Spaces: sets of observations and actions.
mod boxes;
mod index;
mod interval;
mod json;
#[cfg(test)]
pub mod testing;

pub use boxes::BoxSpace;
pub use index::IndexSpace;
pub use interval::IntervalSpace;
pub use json::{normalize_infs, replace_inf, JsonSpace, SpaceDescriptor};

use rand::distributions::Distribution;

/// A space: a set of values with a sampling distribution.
pub trait Space: Distribution<<Self as Space>::Element> {
    type Element;

    /// Check if the space contains a particular value
    fn contains(&self, value: &Self::Element) -> bool;
}

//! Space test utilities
use super::{JsonSpace, Space};
use rand::prelude::*;

/// Check that space contains samples it generates
pub fn check_contains_samples<S: Space>(space: &S, num_samples: u32) {
    let mut rng = StdRng::seed_from_u64(1);
    for _ in 0..num_samples {
        let element = space.sample(&mut rng);
        assert!(space.contains(&element));
    }
}

/// Check that sampled elements survive conversion to JSON and back.
pub fn check_json_samples<S>(space: &S, num_samples: u32)
where
    S: JsonSpace,
    S::Element: PartialEq + std::fmt::Debug,
{
    let mut rng = StdRng::seed_from_u64(2);
    for _ in 0..num_samples {
        let element = space.sample(&mut rng);
        let value = space.to_json(&element);
        assert!(space.contains_json(&value));
        assert_eq!(space.from_json(&value), Some(element));
    }
}

//! Table of live environment instances
use crate::envs::StatefulEnvironment;
use crate::error::ApiError;
use crate::Prng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use tracing::info;

/// A live environment instance.
pub struct Instance {
    /// ID of the registered environment, like `CartPole-v1`.
    pub env_id: String,
    pub env: Box<dyn StatefulEnvironment>,
}

/// Environment instances keyed by short random identifiers.
pub struct InstanceTable {
    instances: BTreeMap<String, Instance>,
    rng: Prng,
}

impl Default for InstanceTable {
    fn default() -> Self {
        Self::new()
    }
}

impl InstanceTable {
    /// Create an empty table generating identifiers from system entropy.
    pub fn new() -> Self {
        Self::with_rng(Prng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(Prng::seed_from_u64(seed))
    }

    fn with_rng(rng: Prng) -> Self {
        Self {
            instances: BTreeMap::new(),
            rng,
        }
    }

    /// Store an environment under a fresh 8 character hexadecimal identifier.
    pub fn insert(&mut self, env_id: String, env: Box<dyn StatefulEnvironment>) -> String {
        let instance_id = loop {
            let candidate = format!("{:08x}", self.rng.gen::<u32>());
            if !self.instances.contains_key(&candidate) {
                break candidate;
            }
        };
        info!(%instance_id, %env_id, "created environment instance");
        self.instances
            .insert(instance_id.clone(), Instance { env_id, env });
        instance_id
    }

    pub fn get(&self, instance_id: &str) -> Result<&Instance, ApiError> {
        self.instances
            .get(instance_id)
            .ok_or_else(|| ApiError::UnknownInstance(instance_id.to_string()))
    }

    pub fn get_mut(&mut self, instance_id: &str) -> Result<&mut Instance, ApiError> {
        self.instances
            .get_mut(instance_id)
            .ok_or_else(|| ApiError::UnknownInstance(instance_id.to_string()))
    }

    /// Remove an instance, closing its environment.
    pub fn remove(&mut self, instance_id: &str) -> Result<(), ApiError> {
        let mut instance = self
            .instances
            .remove(instance_id)
            .ok_or_else(|| ApiError::UnknownInstance(instance_id.to_string()))?;
        instance.env.close();
        info!(%instance_id, env_id = %instance.env_id, "closed environment instance");
        Ok(())
    }

    /// Iterate over `(instance_id, env_id)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.instances
            .iter()
            .map(|(instance_id, instance)| (instance_id.as_str(), instance.env_id.as_str()))
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envs::{make, MakeOptions};
    use rstest::{fixture, rstest};

    fn chain() -> Box<dyn StatefulEnvironment> {
        make("Chain-v0", MakeOptions::default()).unwrap().1
    }

    #[fixture]
    fn table() -> InstanceTable {
        InstanceTable::with_seed(0)
    }

    #[rstest]
    fn insert_lookup(mut table: InstanceTable) {
        let id = table.insert("Chain-v0".into(), chain());
        assert_eq!(id.len(), 8);
        assert!(id
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(table.get(&id).unwrap().env_id, "Chain-v0");
        assert!(table.get_mut(&id).is_ok());
    }

    #[rstest]
    fn ids_unique(mut table: InstanceTable) {
        let a = table.insert("Chain-v0".into(), chain());
        let b = table.insert("Chain-v0".into(), chain());
        assert_ne!(a, b);
        assert_eq!(table.len(), 2);
    }

    #[rstest]
    fn remove_then_unknown(mut table: InstanceTable) {
        let id = table.insert("Chain-v0".into(), chain());
        table.remove(&id).unwrap();
        assert!(table.is_empty());
        assert_eq!(
            table.get(&id).err(),
            Some(ApiError::UnknownInstance(id.clone()))
        );
        assert_eq!(table.remove(&id), Err(ApiError::UnknownInstance(id)));
    }

    #[rstest]
    fn enumerate(mut table: InstanceTable) {
        let id = table.insert("Chain-v0".into(), chain());
        let all: Vec<_> = table.iter().collect();
        assert_eq!(all, vec![(id.as_str(), "Chain-v0")]);
    }
}

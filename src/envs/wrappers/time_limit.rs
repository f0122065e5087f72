use super::super::{EnvError, Info, StatefulEnvironment, StepOutcome};
use super::EnvWrapper;
use serde_json::Value;

/// Environment wrapper that cuts off episodes after a set number of steps.
///
/// Episodes that reach the limit are marked `truncated`.
/// They may also be `terminated` if the final step ends the episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeLimit {
    /// Maximum number of steps per episode
    pub max_episode_steps: u64,
    /// Steps taken in the current episode
    elapsed_steps: u64,
}

impl TimeLimit {
    pub const fn new(max_episode_steps: u64) -> Self {
        Self {
            max_episode_steps,
            elapsed_steps: 0,
        }
    }

    pub const fn elapsed_steps(&self) -> u64 {
        self.elapsed_steps
    }
}

impl Default for TimeLimit {
    fn default() -> Self {
        Self::new(100)
    }
}

impl EnvWrapper for TimeLimit {
    fn reset(
        &mut self,
        inner: &mut dyn StatefulEnvironment,
        seed: Option<u64>,
    ) -> Result<(Value, Info), EnvError> {
        self.elapsed_steps = 0;
        inner.reset(seed)
    }

    fn step(
        &mut self,
        inner: &mut dyn StatefulEnvironment,
        action: &Value,
    ) -> Result<StepOutcome, EnvError> {
        let mut outcome = inner.step(action)?;
        self.elapsed_steps += 1;

        // Cut off the episode but do not mark it as terminated
        if self.elapsed_steps >= self.max_episode_steps {
            outcome.truncated = true;
        }
        Ok(outcome)
    }
}

use super::super::{EnvError, StatefulEnvironment, StepOutcome};
use super::EnvWrapper;
use serde_json::Value;
use tracing::debug;

/// Environment wrapper that resets the environment as soon as an episode ends.
///
/// The step that ends an episode keeps its reward, `terminated` and `truncated` flags
/// but reports the observation and info of the new episode.
/// The last observation and info of the finished episode are stored in `info`
/// under `final_observation` and `final_info`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AutoReset;

impl EnvWrapper for AutoReset {
    fn step(
        &mut self,
        inner: &mut dyn StatefulEnvironment,
        action: &Value,
    ) -> Result<StepOutcome, EnvError> {
        let outcome = inner.step(action)?;
        if !(outcome.terminated || outcome.truncated) {
            return Ok(outcome);
        }
        debug!(
            terminated = outcome.terminated,
            truncated = outcome.truncated,
            "episode done, resetting"
        );
        let (observation, mut info) = inner.reset(None)?;
        info.insert("final_observation".into(), outcome.observation);
        info.insert("final_info".into(), Value::Object(outcome.info));
        Ok(StepOutcome {
            observation,
            reward: outcome.reward,
            terminated: outcome.terminated,
            truncated: outcome.truncated,
            info,
        })
    }
}

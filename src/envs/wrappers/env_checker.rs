use super::super::{EnvError, Info, StatefulEnvironment, StepOutcome};
use super::EnvWrapper;
use serde_json::Value;
use tracing::warn;

/// Environment wrapper that checks the first `reset` and `step` for suspicious output.
///
/// Problems are logged as warnings; the environment output is passed through unchanged.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PassiveEnvChecker {
    checked_reset: bool,
    checked_step: bool,
}

impl PassiveEnvChecker {
    pub const fn new() -> Self {
        Self {
            checked_reset: false,
            checked_step: false,
        }
    }
}

/// Check an observation and return whether it passed.
fn check_observation(inner: &dyn StatefulEnvironment, observation: &Value, method: &str) -> bool {
    if inner.contains_observation(observation) {
        return true;
    }
    warn!(
        %observation,
        "the observation returned by `{}()` is not within the observation space", method
    );
    false
}

impl EnvWrapper for PassiveEnvChecker {
    fn reset(
        &mut self,
        inner: &mut dyn StatefulEnvironment,
        seed: Option<u64>,
    ) -> Result<(Value, Info), EnvError> {
        let (observation, info) = inner.reset(seed)?;
        if !self.checked_reset {
            self.checked_reset = true;
            check_observation(inner, &observation, "reset");
        }
        Ok((observation, info))
    }

    fn step(
        &mut self,
        inner: &mut dyn StatefulEnvironment,
        action: &Value,
    ) -> Result<StepOutcome, EnvError> {
        if self.checked_step {
            return inner.step(action);
        }
        if !inner.contains_action(action) {
            warn!(%action, "the action passed to `step()` is not within the action space");
        }
        let outcome = inner.step(action)?;
        self.checked_step = true;
        check_observation(inner, &outcome.observation, "step");
        if !outcome.reward.is_finite() {
            warn!(reward = outcome.reward, "the reward returned by `step()` is not finite");
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::super::super::{Chain, EnvWithState};
    use super::super::Wrap;
    use super::*;
    use serde_json::json;

    #[test]
    fn passes_output_through() {
        let mut checked =
            EnvWithState::with_seed(Chain::default(), None, 3).wrap(PassiveEnvChecker::new());
        let mut plain = EnvWithState::with_seed(Chain::default(), None, 3);
        assert_eq!(checked.reset(None).unwrap(), plain.reset(None).unwrap());
        for _ in 0..5 {
            assert_eq!(
                checked.step(&json!(1)).unwrap(),
                plain.step(&json!(1)).unwrap()
            );
        }
    }

    #[test]
    fn checks_only_first_calls() {
        let mut env =
            EnvWithState::with_seed(Chain::default(), None, 0).wrap(PassiveEnvChecker::new());
        env.reset(None).unwrap();
        assert!(!env.wrapper.checked_step);
        env.step(&json!(0)).unwrap();
        assert!(env.wrapper.checked_reset);
        assert!(env.wrapper.checked_step);
    }

    #[test]
    fn invalid_action_still_errors() {
        let mut env =
            EnvWithState::with_seed(Chain::default(), None, 0).wrap(PassiveEnvChecker::new());
        env.reset(None).unwrap();
        assert!(env.step(&json!(9)).is_err());
        assert!(!env.wrapper.checked_step);
    }
}

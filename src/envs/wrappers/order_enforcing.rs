use super::super::{EnvError, Info, StatefulEnvironment, StepOutcome};
use super::EnvWrapper;
use crate::render::RenderFrame;
use serde_json::Value;

/// Environment wrapper that rejects `step` and `render` before the first `reset`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OrderEnforcing {
    has_reset: bool,
}

impl OrderEnforcing {
    pub const fn new() -> Self {
        Self { has_reset: false }
    }

    pub const fn has_reset(&self) -> bool {
        self.has_reset
    }
}

impl EnvWrapper for OrderEnforcing {
    fn reset(
        &mut self,
        inner: &mut dyn StatefulEnvironment,
        seed: Option<u64>,
    ) -> Result<(Value, Info), EnvError> {
        let result = inner.reset(seed)?;
        self.has_reset = true;
        Ok(result)
    }

    fn step(
        &mut self,
        inner: &mut dyn StatefulEnvironment,
        action: &Value,
    ) -> Result<StepOutcome, EnvError> {
        if !self.has_reset {
            return Err(EnvError::ResetNeeded("step"));
        }
        inner.step(action)
    }

    fn render(&mut self, inner: &mut dyn StatefulEnvironment) -> Result<RenderFrame, EnvError> {
        if !self.has_reset {
            return Err(EnvError::ResetNeeded("render"));
        }
        inner.render()
    }
}

#[cfg(test)]
mod tests {
    use super::super::super::{Chain, EnvWithState};
    use super::super::Wrap;
    use super::*;
    use serde_json::json;

    #[test]
    fn step_requires_reset() {
        let mut env =
            EnvWithState::with_seed(Chain::default(), None, 0).wrap(OrderEnforcing::new());
        assert_eq!(env.step(&json!(0)), Err(EnvError::ResetNeeded("step")));
        env.reset(None).unwrap();
        assert!(env.wrapper.has_reset());
        assert!(env.step(&json!(0)).is_ok());
    }

    #[test]
    fn render_requires_reset() {
        let mut env =
            EnvWithState::with_seed(Chain::default(), None, 0).wrap(OrderEnforcing::new());
        assert_eq!(env.render(), Err(EnvError::ResetNeeded("render")));
        env.reset(None).unwrap();
        assert_eq!(env.render(), Ok(RenderFrame::Empty));
    }
}

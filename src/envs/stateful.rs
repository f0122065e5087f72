//! Converting an `Environment` into a `StatefulEnvironment`
use super::{
    Action, EnvError, EnvStructure, Environment, Info, StatefulEnvironment, StepOutcome,
    TransitionTable,
};
use crate::render::{RenderFrame, RenderMode};
use crate::spaces::{JsonSpace, Space, SpaceDescriptor};
use crate::Prng;
use rand::distributions::Distribution;
use rand::SeedableRng;
use serde_json::Value;
use tracing::warn;

/// Wraps an [`Environment`] as a [`StatefulEnvironment`].
///
/// Environment dynamics and action sampling use separate random number generators
/// so that re-seeding on reset does not affect sampled actions.
pub struct EnvWithState<E: Environment> {
    pub env: E,
    state: Option<E::State>,
    last_action: Option<Action<E>>,
    terminated: bool,
    render_mode: Option<RenderMode>,
    rng: Prng,
    action_rng: Prng,
}

impl<E: Environment> EnvWithState<E> {
    /// Initialize with random number generators seeded from system entropy.
    pub fn new(env: E, render_mode: Option<RenderMode>) -> Self {
        Self::from_rngs(env, render_mode, Prng::from_entropy(), Prng::from_entropy())
    }

    /// Initialize with deterministic random number generators.
    pub fn with_seed(env: E, render_mode: Option<RenderMode>, seed: u64) -> Self {
        // Arbitrary offset for the action seed to avoid correlation with the dynamics.
        let action_seed = seed.wrapping_add(135);
        Self::from_rngs(
            env,
            render_mode,
            Prng::seed_from_u64(seed),
            Prng::seed_from_u64(action_seed),
        )
    }

    fn from_rngs(
        env: E,
        render_mode: Option<RenderMode>,
        rng: Prng,
        action_rng: Prng,
    ) -> Self {
        Self {
            env,
            state: None,
            last_action: None,
            terminated: false,
            render_mode,
            rng,
            action_rng,
        }
    }

    pub fn render_mode(&self) -> Option<RenderMode> {
        self.render_mode
    }

    /// Observation of a state as a flat JSON array.
    fn observation_json(&self, state: &E::State) -> Value {
        let observation = self.env.observe(state);
        flatten_observation(self.env.observation_space().to_json(&observation))
    }
}

/// Observations are always sent as arrays; a scalar `x` becomes `[x]`.
fn flatten_observation(value: Value) -> Value {
    match value {
        Value::Array(_) => value,
        other => Value::Array(vec![other]),
    }
}

impl<E> StatefulEnvironment for EnvWithState<E>
where
    E: Environment + Send,
    E::State: Send,
    Action<E>: Send,
{
    fn observation_space(&self) -> SpaceDescriptor {
        self.env.observation_space().descriptor()
    }

    fn action_space(&self) -> SpaceDescriptor {
        self.env.action_space().descriptor()
    }

    fn reset(&mut self, seed: Option<u64>) -> Result<(Value, Info), EnvError> {
        if let Some(seed) = seed {
            self.rng = Prng::seed_from_u64(seed);
        }
        let state = self.env.initial_state(&mut self.rng);
        let observation = self.observation_json(&state);
        let info = self.env.reset_info(&state);
        self.state = Some(state);
        self.last_action = None;
        self.terminated = false;
        Ok((observation, info))
    }

    fn step(&mut self, action: &Value) -> Result<StepOutcome, EnvError> {
        if self.state.is_none() {
            return Err(EnvError::ResetNeeded("step"));
        }
        let action_space = self.env.action_space();
        let parsed_action = action_space
            .from_json(action)
            .filter(|a| action_space.contains(a))
            .ok_or_else(|| EnvError::InvalidAction(action.clone()))?;

        let state = self.state.take().ok_or(EnvError::ResetNeeded("step"))?;
        if self.terminated {
            warn!("step called after the episode terminated, returning zero reward");
            let observation = self.observation_json(&state);
            self.state = Some(state);
            return Ok(StepOutcome {
                observation,
                reward: 0.0,
                terminated: true,
                truncated: false,
                info: Info::new(),
            });
        }

        let (successor, reward, info) = self.env.step(state, &parsed_action, &mut self.rng);
        self.terminated = successor.is_terminal();
        let state = successor.into_state();
        let observation = self.observation_json(&state);
        self.state = Some(state);
        self.last_action = Some(parsed_action);
        Ok(StepOutcome {
            observation,
            reward,
            terminated: self.terminated,
            truncated: false,
            info,
        })
    }

    fn render(&mut self) -> Result<RenderFrame, EnvError> {
        let mode = match self.render_mode {
            Some(mode) => mode,
            None => {
                warn!("render called without a render mode set at environment creation");
                return Ok(RenderFrame::Empty);
            }
        };
        let state = self.state.as_ref().ok_or(EnvError::ResetNeeded("render"))?;
        Ok(self.env.render(state, self.last_action.as_ref(), mode))
    }

    fn sample_action(&mut self) -> Value {
        let action_space = self.env.action_space();
        let action = action_space.sample(&mut self.action_rng);
        action_space.to_json(&action)
    }

    fn contains_action(&self, action: &Value) -> bool {
        self.env.action_space().contains_json(action)
    }

    fn contains_observation(&self, observation: &Value) -> bool {
        self.env.observation_space().contains_json(observation)
    }

    fn transitions(&self) -> Result<TransitionTable, EnvError> {
        self.env.transitions().ok_or(EnvError::NoTransitionTable)
    }
}

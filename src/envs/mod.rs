//! Reinforcement learning environments
mod builder;
mod cartpole;
mod chain;
mod frozen_lake;
mod mountain_car;
mod registry;
mod stateful;
#[cfg(test)]
pub mod testing;
pub mod wrappers;

pub use builder::{BuildEnv, BuildEnvError};
pub use cartpole::{CartPole, CartPoleConfig, KinematicsIntegrator};
pub use chain::{Chain, ChainConfig, Move};
pub use frozen_lake::{FrozenLake, FrozenLakeConfig, Tile};
pub use mountain_car::{
    MountainCar, MountainCarConfig, MountainCarContinuous, MountainCarContinuousConfig,
};
pub use registry::{make, parse_env_id, registered_ids, EnvId, MakeOptions};
pub use stateful::EnvWithState;

use crate::render::{RenderFrame, RenderMode};
use crate::spaces::{JsonSpace, Space, SpaceDescriptor};
use crate::Prng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

/// Auxiliary information returned by `reset` and `step`.
pub type Info = Map<String, Value>;

/// Observation type of an environment.
pub type Observation<E> = <<E as EnvStructure>::ObservationSpace as Space>::Element;
/// Action type of an environment.
pub type Action<E> = <<E as EnvStructure>::ActionSpace as Space>::Element;

/// The external structure of a reinforcement learning environment.
pub trait EnvStructure {
    type ObservationSpace: JsonSpace;
    type ActionSpace: JsonSpace;

    /// Space containing all possible observations.
    ///
    /// This is not required to be tight:
    /// the space may contain elements that can never be produced as a state observation.
    fn observation_space(&self) -> Self::ObservationSpace;

    /// The space of all possible actions.
    ///
    /// Every element in this space must be a valid action.
    fn action_space(&self) -> Self::ActionSpace;

    /// A lower and upper bound on possible reward values.
    ///
    /// These bounds are not required to be tight but ideally will be as tight as possible.
    fn reward_range(&self) -> (f64, f64);
}

/// The successor of a state transition.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Successor<S> {
    /// The episode continues from this state.
    Continue(S),
    /// The episode ended in this state. All future rewards are zero.
    Terminate(S),
}

impl<S> Successor<S> {
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminate(_))
    }

    pub const fn state(&self) -> &S {
        match self {
            Self::Continue(s) | Self::Terminate(s) => s,
        }
    }

    #[allow(clippy::missing_const_for_fn)] // not allowed to be const at time of writing
    pub fn into_state(self) -> S {
        match self {
            Self::Continue(s) | Self::Terminate(s) => s,
        }
    }
}

/// A reinforcement learning environment.
///
/// This defines the environment dynamics and structure.
/// It does not internally manage state.
pub trait Environment: EnvStructure {
    type State;

    /// Sample a new initial state.
    fn initial_state(&self, rng: &mut Prng) -> Self::State;

    /// Observation of a state.
    fn observe(&self, state: &Self::State) -> Observation<Self>;

    /// Sample a state transition.
    ///
    /// # Returns
    /// * `successor`: The resulting state, marked as terminal if it ends the episode.
    /// * `reward`: The reward value for this transition.
    /// * `info`: Auxiliary information about the transition.
    fn step(
        &self,
        state: Self::State,
        action: &Action<Self>,
        rng: &mut Prng,
    ) -> (Successor<Self::State>, f64, Info);

    /// Auxiliary information about an initial state.
    fn reset_info(&self, _state: &Self::State) -> Info {
        Info::new()
    }

    /// Render modes supported by [`Environment::render`].
    fn render_modes(&self) -> &'static [RenderMode] {
        &[]
    }

    /// Render a state.
    ///
    /// `last_action` is the action that led to `state`, if any.
    /// Only called with modes listed by [`Environment::render_modes`].
    fn render(
        &self,
        _state: &Self::State,
        _last_action: Option<&Action<Self>>,
        _mode: RenderMode,
    ) -> RenderFrame {
        RenderFrame::Empty
    }

    /// The full transition table, if the environment is a small finite MDP.
    fn transitions(&self) -> Option<TransitionTable> {
        None
    }
}

/// A possible outcome of taking an action in a state.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "(f64, usize, f64, bool)",
    into = "(f64, usize, f64, bool)"
)]
pub struct Transition {
    pub probability: f64,
    pub next_state: usize,
    pub reward: f64,
    pub done: bool,
}

impl From<(f64, usize, f64, bool)> for Transition {
    fn from((probability, next_state, reward, done): (f64, usize, f64, bool)) -> Self {
        Self {
            probability,
            next_state,
            reward,
            done,
        }
    }
}

impl From<Transition> for (f64, usize, f64, bool) {
    fn from(t: Transition) -> Self {
        (t.probability, t.next_state, t.reward, t.done)
    }
}

/// All transitions of a finite MDP: `table[state][action]` lists the possible outcomes.
pub type TransitionTable = BTreeMap<usize, BTreeMap<usize, Vec<Transition>>>;

/// Error from interacting with an environment instance.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EnvError {
    #[error("action {0} is not an element of the action space")]
    InvalidAction(Value),
    #[error("cannot call env.{0}() before calling env.reset()")]
    ResetNeeded(&'static str),
    #[error("environment does not have a transition table")]
    NoTransitionTable,
}

/// The result of a step of a [`StatefulEnvironment`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    /// Observation of the resulting state as a flat JSON array.
    pub observation: Value,
    pub reward: f64,
    /// The episode reached a terminal state.
    pub terminated: bool,
    /// The episode was cut off before reaching a terminal state.
    pub truncated: bool,
    pub info: Info,
}

/// A reinforcement learning environment with internal state and a JSON interface.
///
/// This is the object-safe view of an environment held by the server.
/// Prefer implementing [`Environment`] since [`EnvWithState`] can be used
/// to create a `StatefulEnvironment` out of an `Environment`.
pub trait StatefulEnvironment: Send {
    fn observation_space(&self) -> SpaceDescriptor;

    fn action_space(&self) -> SpaceDescriptor;

    /// Reset to an initial state and return its observation and info.
    ///
    /// Providing a seed re-seeds the environment dynamics.
    fn reset(&mut self, seed: Option<u64>) -> Result<(Value, Info), EnvError>;

    /// Take a step with an action given as JSON.
    fn step(&mut self, action: &Value) -> Result<StepOutcome, EnvError>;

    /// Render the current state with the render mode chosen at construction.
    fn render(&mut self) -> Result<RenderFrame, EnvError>;

    /// Sample a random action.
    fn sample_action(&mut self) -> Value;

    fn contains_action(&self, action: &Value) -> bool;

    fn contains_observation(&self, observation: &Value) -> bool;

    fn transitions(&self) -> Result<TransitionTable, EnvError>;

    /// Release any resources held by the environment.
    fn close(&mut self) {}
}

impl<E: StatefulEnvironment + ?Sized> StatefulEnvironment for Box<E> {
    fn observation_space(&self) -> SpaceDescriptor {
        E::observation_space(self)
    }
    fn action_space(&self) -> SpaceDescriptor {
        E::action_space(self)
    }
    fn reset(&mut self, seed: Option<u64>) -> Result<(Value, Info), EnvError> {
        E::reset(self, seed)
    }
    fn step(&mut self, action: &Value) -> Result<StepOutcome, EnvError> {
        E::step(self, action)
    }
    fn render(&mut self) -> Result<RenderFrame, EnvError> {
        E::render(self)
    }
    fn sample_action(&mut self) -> Value {
        E::sample_action(self)
    }
    fn contains_action(&self, action: &Value) -> bool {
        E::contains_action(self, action)
    }
    fn contains_observation(&self, observation: &Value) -> bool {
        E::contains_observation(self, observation)
    }
    fn transitions(&self) -> Result<TransitionTable, EnvError> {
        E::transitions(self)
    }
    fn close(&mut self) {
        E::close(self)
    }
}

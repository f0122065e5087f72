//! Environment wrappers
mod auto_reset;
mod env_checker;
mod order_enforcing;
mod time_limit;

pub use auto_reset::AutoReset;
pub use env_checker::PassiveEnvChecker;
pub use order_enforcing::OrderEnforcing;
pub use time_limit::TimeLimit;

use super::{EnvError, Info, StatefulEnvironment, StepOutcome, TransitionTable};
use crate::render::RenderFrame;
use crate::spaces::SpaceDescriptor;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Trait providing a `wrap` method for all sized types.
pub trait Wrap: Sized {
    /// Wrap in the given wrapper.
    #[inline]
    fn wrap<W>(self, wrapper: W) -> Wrapped<Self, W> {
        Wrapped {
            inner: self,
            wrapper,
        }
    }
}

impl<T> Wrap for T {}

/// A basic wrapped object.
///
/// Consists of the inner object and the wrapper state.
///
/// # Implementation
/// To implement a wrapper type, define `struct MyWrapper` and implement [`EnvWrapper`]
/// for it, overriding the hooks that it modifies.
/// `Wrapped<E, MyWrapper>` is then a [`StatefulEnvironment`] for any inner `E`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Wrapped<T, W> {
    /// Wrapped object
    pub inner: T,
    /// The wrapper
    pub wrapper: W,
}

impl<T, W> Wrapped<T, W> {
    pub const fn new(inner: T, wrapper: W) -> Self {
        Self { inner, wrapper }
    }
}

/// Hooks through which a wrapper modifies the behaviour of a [`StatefulEnvironment`].
///
/// Every hook receives the inner environment and by default forwards to it unchanged.
pub trait EnvWrapper: Send {
    #[inline]
    fn reset(
        &mut self,
        inner: &mut dyn StatefulEnvironment,
        seed: Option<u64>,
    ) -> Result<(Value, Info), EnvError> {
        inner.reset(seed)
    }

    #[inline]
    fn step(
        &mut self,
        inner: &mut dyn StatefulEnvironment,
        action: &Value,
    ) -> Result<StepOutcome, EnvError> {
        inner.step(action)
    }

    #[inline]
    fn render(&mut self, inner: &mut dyn StatefulEnvironment) -> Result<RenderFrame, EnvError> {
        inner.render()
    }
}

impl<T, W> StatefulEnvironment for Wrapped<T, W>
where
    T: StatefulEnvironment,
    W: EnvWrapper,
{
    #[inline]
    fn observation_space(&self) -> SpaceDescriptor {
        self.inner.observation_space()
    }
    #[inline]
    fn action_space(&self) -> SpaceDescriptor {
        self.inner.action_space()
    }
    #[inline]
    fn reset(&mut self, seed: Option<u64>) -> Result<(Value, Info), EnvError> {
        self.wrapper.reset(&mut self.inner, seed)
    }
    #[inline]
    fn step(&mut self, action: &Value) -> Result<StepOutcome, EnvError> {
        self.wrapper.step(&mut self.inner, action)
    }
    #[inline]
    fn render(&mut self) -> Result<RenderFrame, EnvError> {
        self.wrapper.render(&mut self.inner)
    }
    #[inline]
    fn sample_action(&mut self) -> Value {
        self.inner.sample_action()
    }
    #[inline]
    fn contains_action(&self, action: &Value) -> bool {
        self.inner.contains_action(action)
    }
    #[inline]
    fn contains_observation(&self, observation: &Value) -> bool {
        self.inner.contains_observation(observation)
    }
    #[inline]
    fn transitions(&self) -> Result<TransitionTable, EnvError> {
        self.inner.transitions()
    }
    #[inline]
    fn close(&mut self) {
        self.inner.close()
    }
}

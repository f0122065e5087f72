//! Chain environment
use super::{
    BuildEnv, BuildEnvError, EnvStructure, Environment, Info, Successor, Transition,
    TransitionTable,
};
use crate::render::{RenderFrame, RenderMode};
use crate::spaces::IndexSpace;
use crate::Prng;
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use yansi::{Color, Paint};

/// Configuration for [`Chain`].
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChainConfig {
    /// Number of states.
    pub size: usize,
    /// Probability that an action is swapped for the other one.
    pub slip_probability: f64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        let Chain {
            size,
            slip_probability,
        } = Chain::default();
        Self {
            size,
            slip_probability,
        }
    }
}

impl BuildEnv for ChainConfig {
    type Environment = Chain;

    fn build_env(&self, _: &mut Prng) -> Result<Self::Environment, BuildEnvError> {
        if self.size == 0 {
            return Err(BuildEnvError::InvalidParameter {
                name: "size",
                reason: "must be at least 1".into(),
            });
        }
        if !(0.0..=1.0).contains(&self.slip_probability) {
            return Err(BuildEnvError::InvalidParameter {
                name: "slip_probability",
                reason: format!("must be in [0, 1], got {}", self.slip_probability),
            });
        }
        Ok(Chain::new(self.size, self.slip_probability))
    }
}

/// Chain Environment
///
/// Consists of n states in a line with 2 actions.
/// * Action 0 moves back to the start for 2 reward.
/// * Action 1 moves forward for 0 reward in all states but the last.
///     In the last state, taking action 1 is a self-transition with 10 reward.
/// * Every action has a 0.2 chance of "slipping" and taking the opposite action.
///
/// Described in "Bayesian Q-learning" by Dearden, Friedman and Russel (1998)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Chain {
    pub size: usize,
    pub slip_probability: f64,
}

impl Chain {
    pub const fn new(size: usize, slip_probability: f64) -> Self {
        Self {
            size,
            slip_probability,
        }
    }

    /// Deterministic outcome of a move.
    const fn apply(&self, state: usize, action: Move) -> (usize, f64) {
        match action {
            Move::Left => (0, 2.0),
            Move::Right => {
                if state + 1 >= self.size {
                    (state, 10.0)
                } else {
                    (state + 1, 0.0)
                }
            }
        }
    }
}

impl Default for Chain {
    fn default() -> Self {
        Self {
            size: 5,
            slip_probability: 0.2,
        }
    }
}

impl EnvStructure for Chain {
    type ObservationSpace = IndexSpace;
    type ActionSpace = IndexSpace;

    fn observation_space(&self) -> Self::ObservationSpace {
        IndexSpace::new(self.size)
    }

    fn action_space(&self) -> Self::ActionSpace {
        IndexSpace::new(2)
    }

    fn reward_range(&self) -> (f64, f64) {
        (0.0, 10.0)
    }
}

impl Environment for Chain {
    type State = usize;

    fn initial_state(&self, _: &mut Prng) -> Self::State {
        0
    }

    fn observe(&self, state: &Self::State) -> usize {
        *state
    }

    fn step(
        &self,
        state: Self::State,
        action: &usize,
        rng: &mut Prng,
    ) -> (Successor<Self::State>, f64, Info) {
        let mut action = Move::from_index(*action);
        if rng.gen::<f64>() < self.slip_probability {
            action = action.swap();
        }
        let (state, reward) = self.apply(state, action);
        (Successor::Continue(state), reward, Info::new())
    }

    fn render_modes(&self) -> &'static [RenderMode] {
        &[RenderMode::Ansi]
    }

    fn render(
        &self,
        state: &Self::State,
        last_action: Option<&usize>,
        mode: RenderMode,
    ) -> RenderFrame {
        if mode != RenderMode::Ansi {
            return RenderFrame::Empty;
        }
        let mut out = String::new();
        match last_action {
            Some(&action) => {
                let _ = writeln!(out, "  ({:?})", Move::from_index(action));
            }
            None => out.push('\n'),
        }
        for i in 0..self.size {
            if i > 0 {
                out.push('-');
            }
            if i == *state {
                let _ = write!(out, "{}", Paint::new('o').bg(Color::Red));
            } else {
                out.push('o');
            }
        }
        out.push('\n');
        RenderFrame::Ansi(out)
    }

    fn transitions(&self) -> Option<TransitionTable> {
        let mut table = TransitionTable::new();
        for state in 0..self.size {
            let actions = table.entry(state).or_default();
            for action in [Move::Left, Move::Right] {
                let outcomes = [
                    (action, 1.0 - self.slip_probability),
                    (action.swap(), self.slip_probability),
                ]
                .iter()
                .filter(|(_, p)| *p > 0.0)
                .map(|&(a, probability)| {
                    let (next_state, reward) = self.apply(state, a);
                    Transition {
                        probability,
                        next_state,
                        reward,
                        done: false,
                    }
                })
                .collect();
                actions.insert(action as usize, outcomes);
            }
        }
        Some(table)
    }
}

/// A chain action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Move {
    Left = 0,
    Right = 1,
}

impl Move {
    /// Action from its index; any nonzero index moves right.
    const fn from_index(index: usize) -> Self {
        if index == 0 {
            Self::Left
        } else {
            Self::Right
        }
    }

    const fn swap(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing;
    use super::*;

    #[test]
    fn run_default() {
        testing::run_stateless(Chain::default(), 1000, 0);
    }

    #[test]
    fn no_slip_forward_to_end() {
        let env = Chain::new(3, 0.0);
        let mut rng = Prng::seed_from_u64(0);
        let (s, r, _) = env.step(0, &1, &mut rng);
        assert_eq!((s, r), (Successor::Continue(1), 0.0));
        let (s, r, _) = env.step(2, &1, &mut rng);
        assert_eq!((s, r), (Successor::Continue(2), 10.0));
        let (s, r, _) = env.step(2, &0, &mut rng);
        assert_eq!((s, r), (Successor::Continue(0), 2.0));
    }

    #[test]
    fn always_slip_reverses() {
        let env = Chain::new(3, 1.0);
        let (s, r, _) = env.step(1, &0, &mut Prng::seed_from_u64(0));
        assert_eq!((s, r), (Successor::Continue(2), 0.0));
    }

    #[test]
    fn transitions_sum_to_one() {
        let env = Chain::default();
        let table = env.transitions().unwrap();
        assert_eq!(table.len(), 5);
        for actions in table.values() {
            for outcomes in actions.values() {
                let total: f64 = outcomes.iter().map(|t| t.probability).sum();
                assert!((total - 1.0).abs() < 1e-12);
            }
        }
        assert_eq!(table[&4][&1][0].reward, 10.0);
    }

    #[test]
    fn render_highlights_state() {
        let env = Chain::new(3, 0.2);
        match env.render(&1, Some(&0), RenderMode::Ansi) {
            RenderFrame::Ansi(text) => {
                assert_eq!(text, "  (Left)\no-\u{1b}[41mo\u{1b}[0m-o\n")
            }
            frame => panic!("unexpected frame {:?}", frame),
        }
    }

    #[test]
    fn zero_size_fails() {
        let config = ChainConfig {
            size: 0,
            ..ChainConfig::default()
        };
        assert!(config.build_env(&mut Prng::seed_from_u64(0)).is_err());
    }
}

//! Environment testing utilities
use super::{Action, EnvStructure, EnvWithState, Environment, StatefulEnvironment};
use crate::spaces::JsonSpace;

/// Run a stateless environment and check that invariants are satisfied.
pub fn run_stateless<E>(env: E, num_steps: u64, seed: u64)
where
    E: Environment + Send,
    E::State: Send,
    Action<E>: Send,
{
    let mut env = EnvWithState::with_seed(env, None, seed);
    assert_eq!(
        env.observation_space(),
        env.env.observation_space().descriptor()
    );
    run_stateful(&mut env, num_steps, seed);
}

/// Run a stateful environment with random actions and check that invariants are satisfied.
///
/// Episodes are restarted whenever they terminate and at least every 200 steps.
pub fn run_stateful<E>(env: &mut EnvWithState<E>, num_steps: u64, seed: u64)
where
    E: Environment + Send,
    E::State: Send,
    Action<E>: Send,
{
    let (min_reward, max_reward) = env.env.reward_range();
    let (observation, _) = env.reset(Some(seed)).unwrap();
    assert!(env.contains_observation(&observation));

    let mut episode_steps = 0;
    for _ in 0..num_steps {
        let action = env.sample_action();
        assert!(env.contains_action(&action));
        let outcome = env.step(&action).unwrap();
        assert!(
            outcome.reward >= min_reward && outcome.reward <= max_reward,
            "reward {} outside of [{}, {}]",
            outcome.reward,
            min_reward,
            max_reward
        );
        assert!(
            env.contains_observation(&outcome.observation),
            "observation {} outside of the observation space",
            outcome.observation
        );

        episode_steps += 1;
        if outcome.terminated || episode_steps >= 200 {
            let (observation, _) = env.reset(None).unwrap();
            assert!(env.contains_observation(&observation));
            episode_steps = 0;
        }
    }
}

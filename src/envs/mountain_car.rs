//! Mountain car environments
use super::{BuildEnv, BuildEnvError, EnvStructure, Environment, Info, Successor};
use crate::render::{rotate, Canvas, RenderFrame, RenderMode, BLACK, WHITE};
use crate::spaces::{BoxSpace, IndexSpace};
use crate::Prng;
use rand::Rng;
use serde::{Deserialize, Serialize};

const MIN_POSITION: f64 = -1.2;
const MAX_POSITION: f64 = 0.6;
const MAX_SPEED: f64 = 0.07;
const GRAVITY: f64 = 0.0025;

/// Configuration for [`MountainCar`].
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MountainCarConfig {
    /// Minimum velocity at the goal position for the episode to end.
    pub goal_velocity: f64,
}

impl BuildEnv for MountainCarConfig {
    type Environment = MountainCar;

    fn build_env(&self, _: &mut Prng) -> Result<Self::Environment, BuildEnvError> {
        Ok(MountainCar {
            goal_velocity: self.goal_velocity,
            ..MountainCar::default()
        })
    }
}

/// Mountain Car with discrete actions.
///
/// An under-powered car sits in a valley and must rock back and forth
/// to build enough momentum to reach the flag on top of the right hill.
/// Described by Moore (1990) "Efficient Memory-based Learning for Robot Control";
/// constants are those of the Gym `MountainCar-v0` environment.
///
/// Observations are `[position, velocity]`.
/// Actions are `0` (accelerate left), `1` (no acceleration) and `2` (accelerate right).
/// Every step has reward `-1`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct MountainCar {
    pub force: f64,
    pub goal_position: f64,
    pub goal_velocity: f64,
}

impl Default for MountainCar {
    fn default() -> Self {
        Self {
            force: 0.001,
            goal_position: 0.5,
            goal_velocity: 0.0,
        }
    }
}

/// State of a mountain car: `(position, velocity)`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarState {
    pub position: f64,
    pub velocity: f64,
}

impl CarState {
    /// Apply an acceleration, then update position with the new velocity.
    fn accelerate(self, acceleration: f64) -> Self {
        let velocity =
            (self.velocity + acceleration - (3.0 * self.position).cos() * GRAVITY)
                .clamp(-MAX_SPEED, MAX_SPEED);
        let position = (self.position + velocity).clamp(MIN_POSITION, MAX_POSITION);
        // The left boundary is an inelastic wall
        let velocity = if position <= MIN_POSITION && velocity < 0.0 {
            0.0
        } else {
            velocity
        };
        Self { position, velocity }
    }

    fn reached(&self, goal_position: f64, goal_velocity: f64) -> bool {
        self.position >= goal_position && self.velocity >= goal_velocity
    }
}

fn initial_car_state(rng: &mut Prng) -> CarState {
    CarState {
        position: rng.gen_range(-0.6..-0.4),
        velocity: 0.0,
    }
}

fn car_observation_space() -> BoxSpace {
    BoxSpace::new(&[MIN_POSITION, -MAX_SPEED], &[MAX_POSITION, MAX_SPEED])
}

impl EnvStructure for MountainCar {
    type ObservationSpace = BoxSpace;
    type ActionSpace = IndexSpace;

    fn observation_space(&self) -> Self::ObservationSpace {
        car_observation_space()
    }

    fn action_space(&self) -> Self::ActionSpace {
        IndexSpace::new(3)
    }

    fn reward_range(&self) -> (f64, f64) {
        (-1.0, -1.0)
    }
}

impl Environment for MountainCar {
    type State = CarState;

    fn initial_state(&self, rng: &mut Prng) -> Self::State {
        initial_car_state(rng)
    }

    fn observe(&self, state: &Self::State) -> Vec<f64> {
        vec![state.position, state.velocity]
    }

    #[allow(clippy::cast_precision_loss)]
    fn step(
        &self,
        state: Self::State,
        action: &usize,
        _: &mut Prng,
    ) -> (Successor<Self::State>, f64, Info) {
        let direction = *action as f64 - 1.0;
        let next_state = state.accelerate(direction * self.force);
        let successor = if next_state.reached(self.goal_position, self.goal_velocity) {
            Successor::Terminate(next_state)
        } else {
            Successor::Continue(next_state)
        };
        (successor, -1.0, Info::new())
    }

    fn render_modes(&self) -> &'static [RenderMode] {
        &[RenderMode::RgbArray]
    }

    fn render(&self, state: &Self::State, _: Option<&usize>, mode: RenderMode) -> RenderFrame {
        match mode {
            RenderMode::RgbArray => draw(state.position, self.goal_position).into(),
            RenderMode::Ansi => RenderFrame::Empty,
        }
    }
}

/// Configuration for [`MountainCarContinuous`].
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MountainCarContinuousConfig {
    /// Minimum velocity at the goal position for the episode to end.
    pub goal_velocity: f64,
}

impl BuildEnv for MountainCarContinuousConfig {
    type Environment = MountainCarContinuous;

    fn build_env(&self, _: &mut Prng) -> Result<Self::Environment, BuildEnvError> {
        Ok(MountainCarContinuous {
            goal_velocity: self.goal_velocity,
            ..MountainCarContinuous::default()
        })
    }
}

/// Mountain Car with a continuous force.
///
/// The single action in `[-1, 1]` scales the engine power.
/// Reaching the goal gives reward `100` and every step costs `0.1 * action^2`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct MountainCarContinuous {
    pub power: f64,
    pub goal_position: f64,
    pub goal_velocity: f64,
}

impl Default for MountainCarContinuous {
    fn default() -> Self {
        Self {
            power: 0.0015,
            goal_position: 0.45,
            goal_velocity: 0.0,
        }
    }
}

impl EnvStructure for MountainCarContinuous {
    type ObservationSpace = BoxSpace;
    type ActionSpace = BoxSpace;

    fn observation_space(&self) -> Self::ObservationSpace {
        car_observation_space()
    }

    fn action_space(&self) -> Self::ActionSpace {
        BoxSpace::new(&[-1.0], &[1.0])
    }

    fn reward_range(&self) -> (f64, f64) {
        (-0.1, 100.0)
    }
}

impl Environment for MountainCarContinuous {
    type State = CarState;

    fn initial_state(&self, rng: &mut Prng) -> Self::State {
        initial_car_state(rng)
    }

    fn observe(&self, state: &Self::State) -> Vec<f64> {
        vec![state.position, state.velocity]
    }

    fn step(
        &self,
        state: Self::State,
        action: &Vec<f64>,
        _: &mut Prng,
    ) -> (Successor<Self::State>, f64, Info) {
        let action = action.first().copied().unwrap_or(0.0);
        let force = action.clamp(-1.0, 1.0);
        let next_state = state.accelerate(force * self.power);
        let terminal = next_state.reached(self.goal_position, self.goal_velocity);
        let mut reward = if terminal { 100.0 } else { 0.0 };
        reward -= action * action * 0.1;
        let successor = if terminal {
            Successor::Terminate(next_state)
        } else {
            Successor::Continue(next_state)
        };
        (successor, reward, Info::new())
    }

    fn render_modes(&self) -> &'static [RenderMode] {
        &[RenderMode::RgbArray]
    }

    fn render(
        &self,
        state: &Self::State,
        _: Option<&Vec<f64>>,
        mode: RenderMode,
    ) -> RenderFrame {
        match mode {
            RenderMode::RgbArray => draw(state.position, self.goal_position).into(),
            RenderMode::Ansi => RenderFrame::Empty,
        }
    }
}

const SCREEN_WIDTH: usize = 600;
const SCREEN_HEIGHT: usize = 400;

/// Height of the track at a position.
fn height(position: f64) -> f64 {
    (3.0 * position).sin() * 0.45 + 0.55
}

/// Draw the track, the car and the goal flag.
#[allow(clippy::cast_precision_loss)]
fn draw(position: f64, goal_position: f64) -> Canvas {
    let world_width = MAX_POSITION - MIN_POSITION;
    let scale = SCREEN_WIDTH as f64 / world_width;
    let car_width = 40.0;
    let car_height = 20.0;
    let clearance = 10.0;

    let mut canvas = Canvas::new(SCREEN_WIDTH, SCREEN_HEIGHT, WHITE);

    let track: Vec<_> = (0..100)
        .map(|i| {
            let x = MIN_POSITION + world_width * f64::from(i) / 99.0;
            ((x - MIN_POSITION) * scale, height(x) * scale)
        })
        .collect();
    canvas.polyline(&track, BLACK);

    let angle = (3.0 * position).cos();
    let offset = |corner: (f64, f64)| {
        let (x, y) = rotate(corner, angle);
        (
            x + (position - MIN_POSITION) * scale,
            y + clearance + height(position) * scale,
        )
    };
    let (l, r, t, b) = (-car_width / 2.0, car_width / 2.0, car_height, 0.0);
    let car: Vec<_> = [(l, b), (l, t), (r, t), (r, b)]
        .iter()
        .map(|&corner| offset(corner))
        .collect();
    canvas.fill_polygon(&car, BLACK);
    for wheel in [(car_width / 4.0, 0.0), (-car_width / 4.0, 0.0)] {
        canvas.fill_circle(offset(wheel), car_height / 2.5, [128, 128, 128]);
    }

    let flag_x = ((goal_position - MIN_POSITION) * scale).floor();
    let flag_y1 = (height(goal_position) * scale).floor();
    let flag_y2 = flag_y1 + 50.0;
    canvas.line((flag_x, flag_y1), (flag_x, flag_y2), BLACK);
    canvas.fill_polygon(
        &[
            (flag_x, flag_y2),
            (flag_x, flag_y2 - 10.0),
            (flag_x + 25.0, flag_y2 - 5.0),
        ],
        [204, 204, 0],
    );
    canvas
}

#[cfg(test)]
mod tests {
    use super::super::testing;
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn run_default() {
        testing::run_stateless(MountainCar::default(), 1000, 0);
    }

    #[test]
    fn run_continuous() {
        testing::run_stateless(MountainCarContinuous::default(), 1000, 0);
    }

    #[test]
    fn initial_position_in_valley() {
        let env = MountainCar::default();
        let mut rng = Prng::seed_from_u64(3);
        for _ in 0..100 {
            let state = env.initial_state(&mut rng);
            assert!((-0.6..-0.4).contains(&state.position));
            assert_eq!(state.velocity, 0.0);
        }
    }

    #[test]
    fn left_wall_stops_car() {
        let state = CarState {
            position: MIN_POSITION,
            velocity: -0.05,
        };
        let next = state.accelerate(-0.001);
        assert_eq!(next.position, MIN_POSITION);
        assert_eq!(next.velocity, 0.0);
    }

    #[test]
    fn speed_is_clipped() {
        let state = CarState {
            position: -0.5,
            velocity: MAX_SPEED,
        };
        let next = state.accelerate(0.01);
        assert_eq!(next.velocity, MAX_SPEED);
    }

    #[test]
    fn reaching_goal_terminates() {
        let env = MountainCar::default();
        let state = CarState {
            position: 0.49,
            velocity: 0.05,
        };
        let (successor, reward, _) = env.step(state, &2, &mut Prng::seed_from_u64(0));
        assert!(successor.is_terminal());
        assert_eq!(reward, -1.0);
    }

    #[test]
    fn goal_velocity_blocks_termination() {
        let env = MountainCarConfig { goal_velocity: 0.1 }
            .build_env(&mut Prng::seed_from_u64(0))
            .unwrap();
        let state = CarState {
            position: 0.49,
            velocity: 0.05,
        };
        let (successor, _, _) = env.step(state, &2, &mut Prng::seed_from_u64(0));
        assert!(!successor.is_terminal());
    }

    #[test]
    fn continuous_reward() {
        let env = MountainCarContinuous::default();
        let state = CarState {
            position: -0.5,
            velocity: 0.0,
        };
        let (successor, reward, _) = env.step(state, &vec![0.5], &mut Prng::seed_from_u64(0));
        assert!(!successor.is_terminal());
        assert!((reward + 0.025).abs() < 1e-12);

        let state = CarState {
            position: 0.44,
            velocity: 0.05,
        };
        let (successor, reward, _) = env.step(state, &vec![1.0], &mut Prng::seed_from_u64(0));
        assert!(successor.is_terminal());
        assert!((reward - 99.9).abs() < 1e-12);
    }

    #[test]
    fn render_shape() {
        let env = MountainCar::default();
        let state = CarState {
            position: -0.5,
            velocity: 0.0,
        };
        match env.render(&state, None, RenderMode::RgbArray) {
            RenderFrame::Rgb(pixels) => assert_eq!(pixels.shape(), &[400, 600, 3]),
            frame => panic!("unexpected frame {:?}", frame),
        }
    }
}

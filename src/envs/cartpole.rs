use super::{BuildEnv, BuildEnvError, EnvStructure, Environment, Info, Successor};
use crate::render::{rotate, Canvas, RenderFrame, RenderMode, BLACK, WHITE};
use crate::spaces::{BoxSpace, IndexSpace};
use crate::Prng;
use rand::distributions::{Distribution, Uniform};
use serde::{Deserialize, Serialize};

/// Configuration for the [`CartPole`] environment.
///
/// All fields are optional when deserializing and default to the classic `CartPole-v1` values.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CartPoleConfig {
    /// Downward force of gravity (m/s^2)
    pub gravity: f64,
    /// Mass of the cart (kg)
    pub mass_cart: f64,
    /// Mass of the pole (kg)
    pub mass_pole: f64,
    /// Half the length of the pole (m)
    pub length_half_pole: f64,
    /// Coefficient of friction between the cart and the track (unitless).
    pub friction_cart: f64,
    /// Coefficient of friction between the pole and the cart at the hinge (unitless).
    pub friction_pole: f64,
    /// Simulation time step (s)
    pub time_step: f64,
    /// Numerical integration scheme.
    pub kinematics_integrator: KinematicsIntegrator,
    /// Magnitude of the force (N) applied by actions.
    pub action_force: f64,
    /// Maximum absolute position (meters) before the episode is ended.
    pub max_pos: f64,
    /// Maximum absolute pole angle from vertical (radians) before the episode is ended.
    pub max_angle: f64,
    /// Reward 0 on every step and -1 on failure instead of 1 on every step.
    pub sutton_barto_reward: bool,
}

impl Default for CartPoleConfig {
    fn default() -> Self {
        Self {
            gravity: 9.8,
            mass_cart: 1.0,
            mass_pole: 0.1,
            length_half_pole: 0.5,
            friction_cart: 0.0,
            friction_pole: 0.0,
            time_step: 0.02,
            kinematics_integrator: KinematicsIntegrator::Euler,
            action_force: 10.0,
            max_pos: 2.4,
            max_angle: 12.0f64.to_radians(),
            sutton_barto_reward: false,
        }
    }
}

impl BuildEnv for CartPoleConfig {
    type Environment = CartPole;

    fn build_env(&self, _: &mut Prng) -> Result<Self::Environment, BuildEnvError> {
        for (name, value) in [
            ("mass_cart", self.mass_cart),
            ("mass_pole", self.mass_pole),
            ("length_half_pole", self.length_half_pole),
            ("time_step", self.time_step),
            ("max_pos", self.max_pos),
            ("max_angle", self.max_angle),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(BuildEnvError::InvalidParameter {
                    name,
                    reason: format!("must be positive, got {}", value),
                });
            }
        }
        Ok(CartPole::new(*self))
    }
}

/// Cart-Pole environment
///
/// Consists of a simulated cart on a track with a vertical pole attached by a hinge on the top.
/// The goal is to keep the pole upright by applying left and right forces to the cart.
///
/// The environment is based on [Barto et al. (1983)][barto1983] with updated dynamics equations
/// from [Florian (2005)][florian2005], who corrects the friction term.
/// The default dynamics constants and episode parameters are those of the
/// [OpenAI Gym][gym_cartpole] [CartPole-v1 environment][cartpole_source],
/// which has no friction.
///
/// Observations are `[cart_position, cart_velocity, pole_angle, pole_angular_velocity]`.
/// Action `0` pushes the cart left and action `1` pushes it right.
///
/// [barto1983]: https://ieeexplore.ieee.org/document/6313077
/// [florian2005]: https://coneural.org/florian/papers/05_cart_pole.pdf
/// [gym_cartpole]: https://gym.openai.com/envs/CartPole-v1/
/// [cartpole_source]: https://github.com/openai/gym/blob/master/gym/envs/classic_control/cartpole.py
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CartPole {
    config: CartPoleConfig,
    /// Gravitational weight of the combined system (N): `gravity * (mass_cart + mass_pole)`.
    total_weight: f64,
    /// `1 / (mass_cart + mass_pole)`
    inv_total_mass: f64,
    /// `mass_pole * length_half_pole`
    mass_length_pole: f64,
}

impl CartPole {
    pub fn new(config: CartPoleConfig) -> Self {
        let total_mass = config.mass_cart + config.mass_pole;
        Self {
            config,
            total_weight: config.gravity * total_mass,
            inv_total_mass: total_mass.recip(),
            mass_length_pole: config.mass_pole * config.length_half_pole,
        }
    }
}

impl Default for CartPole {
    fn default() -> Self {
        Self::new(CartPoleConfig::default())
    }
}

impl EnvStructure for CartPole {
    type ObservationSpace = BoxSpace;
    type ActionSpace = IndexSpace;

    fn observation_space(&self) -> Self::ObservationSpace {
        // Observation bounds are twice the termination thresholds
        // so that the state that ends an episode is still contained.
        let max_pos = 2.0 * self.config.max_pos;
        let max_angle = 2.0 * self.config.max_angle;
        BoxSpace::new(
            &[-max_pos, f64::NEG_INFINITY, -max_angle, f64::NEG_INFINITY],
            &[max_pos, f64::INFINITY, max_angle, f64::INFINITY],
        )
    }

    fn action_space(&self) -> Self::ActionSpace {
        IndexSpace::new(2)
    }

    fn reward_range(&self) -> (f64, f64) {
        if self.config.sutton_barto_reward {
            (-1.0, 0.0)
        } else {
            (0.0, 1.0)
        }
    }
}

impl Environment for CartPole {
    type State = CartPoleInternalState;

    fn initial_state(&self, rng: &mut Prng) -> Self::State {
        // All parameters are sampled from the same range of values
        let dist = Uniform::new_inclusive(-0.05, 0.05);
        CartPoleInternalState {
            physical: CartPolePhysicalState {
                cart_position: dist.sample(rng),
                cart_velocity: dist.sample(rng),
                pole_angle: dist.sample(rng),
                pole_angular_velocity: dist.sample(rng),
            },
            cached_normal_velocity_is_positive: true,
        }
    }

    fn observe(&self, state: &Self::State) -> Vec<f64> {
        let phys = &state.physical;
        vec![
            phys.cart_position,
            phys.cart_velocity,
            phys.pole_angle,
            phys.pole_angular_velocity,
        ]
    }

    fn step(
        &self,
        state: Self::State,
        action: &usize,
        _: &mut Prng,
    ) -> (Successor<Self::State>, f64, Info) {
        let applied_force = if *action == 0 {
            -self.config.action_force
        } else {
            self.config.action_force
        };
        let next_state = self.next_state(&state, applied_force);
        let terminal = next_state.physical.cart_position.abs() > self.config.max_pos
            || next_state.physical.pole_angle.abs() > self.config.max_angle;
        let reward = match (self.config.sutton_barto_reward, terminal) {
            (false, _) => 1.0,
            (true, false) => 0.0,
            (true, true) => -1.0,
        };
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

    fn render(&self, state: &Self::State, _: Option<&usize>, mode: RenderMode) -> RenderFrame {
        match mode {
            RenderMode::RgbArray => self.draw(&state.physical).into(),
            RenderMode::Ansi => RenderFrame::Empty,
        }
    }
}

const SCREEN_WIDTH: usize = 600;
const SCREEN_HEIGHT: usize = 400;

impl CartPole {
    /// Draw the cart and pole.
    #[allow(clippy::cast_precision_loss)]
    fn draw(&self, phys: &CartPolePhysicalState) -> Canvas {
        let world_width = 2.0 * self.config.max_pos;
        let scale = SCREEN_WIDTH as f64 / world_width;
        let pole_width = 10.0;
        let pole_len = scale * (2.0 * self.config.length_half_pole);
        let cart_width = 50.0;
        let cart_height = 30.0;
        let axle_offset = cart_height / 4.0;
        let cart_x = phys.cart_position * scale + SCREEN_WIDTH as f64 / 2.0;
        let cart_y = 100.0;

        let mut canvas = Canvas::new(SCREEN_WIDTH, SCREEN_HEIGHT, WHITE);

        let (l, r, t, b) = (
            -cart_width / 2.0,
            cart_width / 2.0,
            cart_height / 2.0,
            -cart_height / 2.0,
        );
        let cart: Vec<_> = [(l, b), (l, t), (r, t), (r, b)]
            .iter()
            .map(|(x, y)| (x + cart_x, y + cart_y))
            .collect();
        canvas.fill_polygon(&cart, BLACK);

        let (l, r, t, b) = (
            -pole_width / 2.0,
            pole_width / 2.0,
            pole_len - pole_width / 2.0,
            -pole_width / 2.0,
        );
        let pole: Vec<_> = [(l, b), (l, t), (r, t), (r, b)]
            .iter()
            .map(|&corner| {
                let (x, y) = rotate(corner, -phys.pole_angle);
                (x + cart_x, y + cart_y + axle_offset)
            })
            .collect();
        canvas.fill_polygon(&pole, [202, 152, 101]);
        canvas.fill_circle(
            (cart_x, cart_y + axle_offset),
            pole_width / 2.0,
            [129, 132, 203],
        );
        canvas.line((0.0, cart_y), (SCREEN_WIDTH as f64, cart_y), BLACK);
        canvas
    }
}

/// Numerical integration scheme for the [`CartPole`] dynamics.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KinematicsIntegrator {
    /// Positions are updated with the velocities from the start of the step.
    Euler,
    /// Positions are updated with the velocities from the end of the step.
    SemiImplicitEuler,
}

impl Default for KinematicsIntegrator {
    fn default() -> Self {
        Self::Euler
    }
}

/// Physical state of the [`CartPole`] environment.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartPolePhysicalState {
    /// Cart position from the track midpoint (m).
    pub cart_position: f64,
    /// Cart velocity (m/s).
    pub cart_velocity: f64,
    /// Angle of the pole from vertical (radians).
    pub pole_angle: f64,
    /// Pole angular velocity about the hinge (radians / s).
    pub pole_angular_velocity: f64,
}

/// State of the [`CartPole`] environment.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartPoleInternalState {
    physical: CartPolePhysicalState,

    /// Sign of `normal_force * cart_velocity` from the previous step.
    ///
    /// The friction term depends on this sign, which in turn depends on the friction term.
    /// Each step starts from the cached sign and flips it once if the result disagrees.
    cached_normal_velocity_is_positive: bool,
}

impl CartPole {
    /// Simulate the state for one time step with an applied force on the cart (in N).
    fn next_state(
        &self,
        state: &CartPoleInternalState,
        applied_force: f64,
    ) -> CartPoleInternalState {
        // Reference:
        // "Correct equations for the dynamics of the cart-pole system" by Florian (2005)
        let phys = &state.physical;

        let mut signed_cart_friction = if state.cached_normal_velocity_is_positive {
            self.config.friction_cart
        } else {
            -self.config.friction_cart
        };
        let (sin_angle, cos_angle) = phys.pole_angle.sin_cos();
        let angular_velocity_squared = phys.pole_angular_velocity * phys.pole_angular_velocity;

        let mut angular_acceleration = self.angular_acceleration(
            phys,
            applied_force,
            signed_cart_friction,
            angular_velocity_squared,
            sin_angle,
            cos_angle,
        );
        let mut normal_force = self.normal_force(
            angular_acceleration,
            angular_velocity_squared,
            sin_angle,
            cos_angle,
        );
        let normal_velocity_is_positive = (normal_force * phys.cart_velocity).is_sign_positive();

        if normal_velocity_is_positive != state.cached_normal_velocity_is_positive {
            // Re-calculate angular acceleration and normal force with the new signed friction
            signed_cart_friction = -signed_cart_friction;
            angular_acceleration = self.angular_acceleration(
                phys,
                applied_force,
                signed_cart_friction,
                angular_velocity_squared,
                sin_angle,
                cos_angle,
            );
            normal_force = self.normal_force(
                angular_acceleration,
                angular_velocity_squared,
                sin_angle,
                cos_angle,
            );
        }

        // Horizontal acceleration of the cart (m/s^2)
        let force_pole = self.mass_length_pole
            * (angular_velocity_squared * sin_angle - angular_acceleration * cos_angle);
        let force_friction = -signed_cart_friction * normal_force;
        let net_force = applied_force + force_pole + force_friction;
        let cart_acceleration = net_force * self.inv_total_mass;

        let dt = self.config.time_step;
        let (cart_position, cart_velocity, pole_angle, pole_angular_velocity) =
            match self.config.kinematics_integrator {
                KinematicsIntegrator::Euler => (
                    phys.cart_position + dt * phys.cart_velocity,
                    phys.cart_velocity + dt * cart_acceleration,
                    phys.pole_angle + dt * phys.pole_angular_velocity,
                    phys.pole_angular_velocity + dt * angular_acceleration,
                ),
                KinematicsIntegrator::SemiImplicitEuler => {
                    let cart_velocity = phys.cart_velocity + dt * cart_acceleration;
                    let pole_angular_velocity =
                        phys.pole_angular_velocity + dt * angular_acceleration;
                    (
                        phys.cart_position + dt * cart_velocity,
                        cart_velocity,
                        phys.pole_angle + dt * pole_angular_velocity,
                        pole_angular_velocity,
                    )
                }
            };

        CartPoleInternalState {
            physical: CartPolePhysicalState {
                cart_position,
                cart_velocity,
                pole_angle,
                pole_angular_velocity,
            },
            cached_normal_velocity_is_positive: normal_velocity_is_positive,
        }
    }

    /// The pole angular acceleration
    ///
    /// # Args
    /// * `applied_force`            - Applied horizontal force on the cart (N).
    /// * `signed_cart_friction`     - Signed cart friction coefficient:
    ///                                    `friction_cart * sign(normal_force * cart_velocity)`
    /// * `angular_velocity_squared` - `pole_angular_velocity ** 2`
    /// * `sin_angle`                - `sin(pole_angle)`.
    /// * `cos_angle`                - `cos(pole_angle)`.
    fn angular_acceleration(
        &self,
        state: &CartPolePhysicalState,
        applied_force: f64,
        signed_cart_friction: f64,
        angular_velocity_squared: f64,
        sin_angle: f64,
        cos_angle: f64,
    ) -> f64 {
        // Decompose equation (21) of Florian (2005) as numerator / denominator where
        // numerator = (g*sin(theta) + cos(theta)*(alpha + g*signed_cart_friction) - beta)
        let alpha = (-applied_force
            - self.mass_length_pole
                * angular_velocity_squared
                * (sin_angle + signed_cart_friction * cos_angle))
            * self.inv_total_mass;
        let beta = self.config.friction_pole * state.pole_angular_velocity / self.mass_length_pole;
        let numerator = self.config.gravity * sin_angle
            + cos_angle * (alpha + self.config.gravity * signed_cart_friction)
            - beta;

        let denominator = self.config.length_half_pole
            * (4.0 / 3.0
                - self.config.mass_pole
                    * cos_angle
                    * self.inv_total_mass
                    * (cos_angle - signed_cart_friction));
        numerator / denominator
    }

    /// Normal force of the cart against the track (N).
    ///
    /// Positive for downward normal force and negative for upward.
    fn normal_force(
        &self,
        angular_acceleration: f64,
        angular_velocity_squared: f64,
        sin_angle: f64,
        cos_angle: f64,
    ) -> f64 {
        self.total_weight
            - self.mass_length_pole
                * (angular_acceleration * sin_angle + angular_velocity_squared * cos_angle)
    }
}

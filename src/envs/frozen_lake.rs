//! Frozen lake grid world
use super::{
    BuildEnv, BuildEnvError, EnvStructure, Environment, Info, Successor, Transition,
    TransitionTable,
};
use crate::render::{RenderFrame, RenderMode};
use crate::spaces::IndexSpace;
use crate::Prng;
use ndarray::Array2;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Write;
use yansi::{Color, Paint};

const MAP_4X4: [&str; 4] = ["SFFF", "FHFH", "FFFH", "HFFG"];
const MAP_8X8: [&str; 8] = [
    "SFFFFFFF", "FFFFFFFF", "FFFHFFFF", "FFFFFHFF", "FFFHFFFF", "FHHFFFHF", "FHFFHFHF",
    "FFFHFFFG",
];

/// Names of the actions, in order.
const ACTION_NAMES: [&str; 4] = ["Left", "Down", "Right", "Up"];

/// A cell of the lake.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tile {
    Start,
    Frozen,
    Hole,
    Goal,
}

impl Tile {
    const fn from_char(c: char) -> Option<Self> {
        match c {
            'S' => Some(Self::Start),
            'F' => Some(Self::Frozen),
            'H' => Some(Self::Hole),
            'G' => Some(Self::Goal),
            _ => None,
        }
    }

    const fn as_char(self) -> char {
        match self {
            Self::Start => 'S',
            Self::Frozen => 'F',
            Self::Hole => 'H',
            Self::Goal => 'G',
        }
    }

    /// Whether entering this tile ends the episode.
    const fn is_terminal(self) -> bool {
        matches!(self, Self::Hole | Self::Goal)
    }
}

fn default_map_name() -> Option<String> {
    Some("4x4".into())
}

const fn default_is_slippery() -> bool {
    true
}

fn default_success_rate() -> f64 {
    1.0 / 3.0
}

const fn default_reward_schedule() -> [f64; 3] {
    [1.0, 0.0, 0.0]
}

/// Configuration for [`FrozenLake`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FrozenLakeConfig {
    /// Custom map, one string per row using the letters `S`, `F`, `H` and `G`.
    ///
    /// Takes precedence over `map_name`.
    #[serde(default)]
    pub desc: Option<Vec<String>>,
    /// Name of a predefined map: `"4x4"` or `"8x8"`.
    ///
    /// `None` generates a random solvable 8x8 map.
    #[serde(default = "default_map_name")]
    pub map_name: Option<String>,
    /// Whether moves may slip to a perpendicular direction.
    #[serde(default = "default_is_slippery")]
    pub is_slippery: bool,
    /// Probability that a slippery move goes in the intended direction.
    ///
    /// Each perpendicular direction has half of the remaining probability.
    #[serde(default = "default_success_rate")]
    pub success_rate: f64,
    /// Rewards for entering `[goal, hole, frozen]` tiles.
    #[serde(default = "default_reward_schedule")]
    pub reward_schedule: [f64; 3],
}

impl Default for FrozenLakeConfig {
    fn default() -> Self {
        Self {
            desc: None,
            map_name: default_map_name(),
            is_slippery: default_is_slippery(),
            success_rate: default_success_rate(),
            reward_schedule: default_reward_schedule(),
        }
    }
}

impl BuildEnv for FrozenLakeConfig {
    type Environment = FrozenLake;

    fn build_env(&self, rng: &mut Prng) -> Result<Self::Environment, BuildEnvError> {
        if !(0.0..=1.0).contains(&self.success_rate) {
            return Err(BuildEnvError::InvalidParameter {
                name: "success_rate",
                reason: format!("must be in [0, 1], got {}", self.success_rate),
            });
        }
        let map = match (&self.desc, &self.map_name) {
            (Some(desc), _) => parse_map(desc)?,
            (None, Some(name)) => match name.as_str() {
                "4x4" => builtin_map(&MAP_4X4),
                "8x8" => builtin_map(&MAP_8X8),
                _ => {
                    return Err(BuildEnvError::InvalidParameter {
                        name: "map_name",
                        reason: format!("unknown map '{}', expected '4x4' or '8x8'", name),
                    })
                }
            },
            (None, None) => generate_random_map(8, 0.8, rng),
        };
        Ok(FrozenLake::new(
            map,
            self.is_slippery,
            self.success_rate,
            self.reward_schedule,
        ))
    }
}

/// One of the predefined maps.
fn builtin_map(rows: &[&str]) -> Array2<Tile> {
    Array2::from_shape_fn((rows.len(), rows[0].len()), |(row, col)| {
        Tile::from_char(char::from(rows[row].as_bytes()[col])).unwrap_or(Tile::Frozen)
    })
}

/// Parse a map from rows of tile letters.
fn parse_map<S: AsRef<str>>(rows: &[S]) -> Result<Array2<Tile>, BuildEnvError> {
    let invalid = |reason: String| BuildEnvError::InvalidParameter {
        name: "desc",
        reason,
    };
    let num_cols = rows.first().map_or(0, |row| row.as_ref().chars().count());
    if num_cols == 0 {
        return Err(invalid("map must be non-empty".into()));
    }
    let mut tiles = Vec::with_capacity(rows.len() * num_cols);
    for row in rows {
        let row = row.as_ref();
        if row.chars().count() != num_cols {
            return Err(invalid("all rows must have the same length".into()));
        }
        for c in row.chars() {
            tiles.push(
                Tile::from_char(c).ok_or_else(|| invalid(format!("unknown tile '{}'", c)))?,
            );
        }
    }
    if !tiles.contains(&Tile::Start) {
        return Err(invalid("map has no start tile 'S'".into()));
    }
    Array2::from_shape_vec((rows.len(), num_cols), tiles)
        .map_err(|err| invalid(err.to_string()))
}

/// Generate a random `size x size` map with a path from the start to the goal.
///
/// Each tile other than the start and goal is frozen with probability `p_frozen`.
pub fn generate_random_map(size: usize, p_frozen: f64, rng: &mut Prng) -> Array2<Tile> {
    loop {
        let mut map = Array2::from_shape_fn((size, size), |_| {
            if rng.gen_bool(p_frozen) {
                Tile::Frozen
            } else {
                Tile::Hole
            }
        });
        map[(0, 0)] = Tile::Start;
        map[(size - 1, size - 1)] = Tile::Goal;
        if has_path_to_goal(&map) {
            return map;
        }
    }
}

/// Depth-first search from the top-left corner to any goal tile.
fn has_path_to_goal(map: &Array2<Tile>) -> bool {
    let (num_rows, num_cols) = map.dim();
    let mut discovered = Array2::from_elem((num_rows, num_cols), false);
    let mut frontier = vec![(0, 0)];
    while let Some((row, col)) = frontier.pop() {
        if discovered[(row, col)] {
            continue;
        }
        discovered[(row, col)] = true;
        for (dr, dc) in [(1, 0), (0, 1), (-1, 0), (0, -1)] {
            let (r, c) = (row as isize + dr, col as isize + dc);
            if r < 0 || c < 0 || r >= num_rows as isize || c >= num_cols as isize {
                continue;
            }
            let (r, c) = (r as usize, c as usize);
            match map[(r, c)] {
                Tile::Goal => return true,
                Tile::Hole => {}
                _ => frontier.push((r, c)),
            }
        }
    }
    false
}

/// Frozen Lake environment
///
/// The agent walks across a frozen lake from the start tile to the goal tile
/// without falling into any holes.
/// On a slippery lake a move may instead go in one of the two perpendicular directions.
/// Moves off the edge of the lake leave the agent in place.
///
/// States are cell indices `row * num_cols + col`.
/// Actions are `0` (left), `1` (down), `2` (right) and `3` (up).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrozenLake {
    map: Array2<Tile>,
    /// Transition table: `transitions[state][action]`
    transitions: Vec<[Vec<Transition>; 4]>,
    /// States with a start tile.
    start_states: Vec<usize>,
    reward_schedule: [f64; 3],
}

impl Default for FrozenLake {
    fn default() -> Self {
        Self::new(
            builtin_map(&MAP_4X4),
            default_is_slippery(),
            default_success_rate(),
            default_reward_schedule(),
        )
    }
}

impl FrozenLake {
    pub fn new(
        map: Array2<Tile>,
        is_slippery: bool,
        success_rate: f64,
        reward_schedule: [f64; 3],
    ) -> Self {
        let (num_rows, num_cols) = map.dim();
        let fail_rate = (1.0 - success_rate) / 2.0;
        let outcome = |row: usize, col: usize, action: usize, probability: f64| {
            let (row, col) = step_position(row, col, action, num_rows, num_cols);
            let tile = map[(row, col)];
            Transition {
                probability,
                next_state: row * num_cols + col,
                reward: tile_reward(tile, &reward_schedule),
                done: tile.is_terminal(),
            }
        };

        let mut transitions = Vec::with_capacity(num_rows * num_cols);
        for ((row, col), tile) in map.indexed_iter() {
            let state = row * num_cols + col;
            let for_action = |action: usize| {
                if tile.is_terminal() {
                    vec![Transition {
                        probability: 1.0,
                        next_state: state,
                        reward: 0.0,
                        done: true,
                    }]
                } else if is_slippery {
                    [(action + 3) % 4, action, (action + 1) % 4]
                        .iter()
                        .map(|&b| {
                            let p = if b == action { success_rate } else { fail_rate };
                            outcome(row, col, b, p)
                        })
                        .collect()
                } else {
                    vec![outcome(row, col, action, 1.0)]
                }
            };
            transitions.push([for_action(0), for_action(1), for_action(2), for_action(3)]);
        }

        let start_states = map
            .indexed_iter()
            .filter(|&(_, &tile)| tile == Tile::Start)
            .map(|((row, col), _)| row * num_cols + col)
            .collect();

        Self {
            map,
            transitions,
            start_states,
            reward_schedule,
        }
    }

    pub fn num_states(&self) -> usize {
        self.map.len()
    }

    pub fn tile(&self, state: usize) -> Tile {
        let num_cols = self.map.ncols();
        self.map[(state / num_cols, state % num_cols)]
    }

    /// The ANSI text rendering of a state.
    fn render_ansi(&self, state: usize, last_action: Option<&usize>) -> String {
        let mut out = String::new();
        match last_action {
            Some(&action) => {
                let _ = writeln!(out, "  ({})", ACTION_NAMES[action]);
            }
            None => out.push('\n'),
        }
        let num_cols = self.map.ncols();
        for (row, line) in self.map.outer_iter().enumerate() {
            for (col, tile) in line.iter().enumerate() {
                let c = tile.as_char();
                if row * num_cols + col == state {
                    let _ = write!(out, "{}", Paint::new(c).bg(Color::Red));
                } else {
                    out.push(c);
                }
            }
            out.push('\n');
        }
        out
    }
}

fn tile_reward(tile: Tile, reward_schedule: &[f64; 3]) -> f64 {
    match tile {
        Tile::Goal => reward_schedule[0],
        Tile::Hole => reward_schedule[1],
        Tile::Start | Tile::Frozen => reward_schedule[2],
    }
}

/// Position after moving in a direction, staying in place at the edges.
const fn step_position(
    row: usize,
    col: usize,
    action: usize,
    num_rows: usize,
    num_cols: usize,
) -> (usize, usize) {
    match action {
        0 => (row, col.saturating_sub(1)),
        1 => (if row + 1 < num_rows { row + 1 } else { row }, col),
        2 => (row, if col + 1 < num_cols { col + 1 } else { col }),
        _ => (row.saturating_sub(1), col),
    }
}

impl EnvStructure for FrozenLake {
    type ObservationSpace = IndexSpace;
    type ActionSpace = IndexSpace;

    fn observation_space(&self) -> Self::ObservationSpace {
        IndexSpace::new(self.num_states())
    }

    fn action_space(&self) -> Self::ActionSpace {
        IndexSpace::new(4)
    }

    fn reward_range(&self) -> (f64, f64) {
        let min = self.reward_schedule.iter().copied().fold(0.0, f64::min);
        let max = self.reward_schedule.iter().copied().fold(0.0, f64::max);
        (min, max)
    }
}

impl Environment for FrozenLake {
    type State = usize;

    fn initial_state(&self, rng: &mut Prng) -> Self::State {
        self.start_states[rng.gen_range(0..self.start_states.len())]
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
        let outcomes = &self.transitions[state][*action];
        let index = if outcomes.len() == 1 {
            0
        } else {
            WeightedIndex::new(outcomes.iter().map(|t| t.probability))
                .map_or(0, |dist| dist.sample(rng))
        };
        let transition = outcomes[index];
        let mut info = Info::new();
        info.insert("prob".into(), Value::from(transition.probability));
        let successor = if transition.done {
            Successor::Terminate(transition.next_state)
        } else {
            Successor::Continue(transition.next_state)
        };
        (successor, transition.reward, info)
    }

    fn reset_info(&self, _: &Self::State) -> Info {
        let mut info = Info::new();
        info.insert("prob".into(), Value::from(1));
        info
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
        match mode {
            RenderMode::Ansi => RenderFrame::Ansi(self.render_ansi(*state, last_action)),
            RenderMode::RgbArray => RenderFrame::Empty,
        }
    }

    fn transitions(&self) -> Option<TransitionTable> {
        Some(
            self.transitions
                .iter()
                .enumerate()
                .map(|(state, actions)| {
                    let actions = actions.iter().cloned().enumerate().collect();
                    (state, actions)
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing;
    use super::*;
    use rand::SeedableRng;
    use rstest::{fixture, rstest};

    #[fixture]
    fn rng() -> Prng {
        Prng::seed_from_u64(0)
    }

    fn build(config: &FrozenLakeConfig) -> FrozenLake {
        config.build_env(&mut Prng::seed_from_u64(0)).unwrap()
    }

    fn custom_lake() -> FrozenLake {
        build(&FrozenLakeConfig {
            desc: Some(vec!["GGGH".into(), "GSGH".into(), "GGGF".into(), "FFFG".into()]),
            is_slippery: false,
            ..FrozenLakeConfig::default()
        })
    }

    #[test]
    fn run_default() {
        testing::run_stateless(FrozenLake::default(), 1000, 0);
    }

    #[test]
    fn run_random_map() {
        let env = build(&FrozenLakeConfig {
            map_name: None,
            ..FrozenLakeConfig::default()
        });
        assert_eq!(env.num_states(), 64);
        testing::run_stateless(env, 1000, 0);
    }

    #[rstest]
    fn custom_map_start(mut rng: Prng) {
        let env = custom_lake();
        assert_eq!(env.initial_state(&mut rng), 5);
    }

    #[rstest]
    fn custom_map_down_reaches_goal(mut rng: Prng) {
        let env = custom_lake();
        let (successor, reward, info) = env.step(5, &1, &mut rng);
        assert_eq!(successor, Successor::Terminate(9));
        assert_eq!(reward, 1.0);
        assert_eq!(info["prob"], Value::from(1.0));
    }

    #[rstest]
    fn left_edge_stays_in_place(mut rng: Prng) {
        let env = build(&FrozenLakeConfig {
            is_slippery: false,
            ..FrozenLakeConfig::default()
        });
        let (successor, reward, _) = env.step(0, &0, &mut rng);
        assert_eq!(successor, Successor::Continue(0));
        assert_eq!(reward, 0.0);
    }

    #[test]
    fn slippery_transitions() {
        let env = FrozenLake::default();
        let table = env.transitions().unwrap();
        let outcomes = &table[&0][&1];
        assert_eq!(outcomes.len(), 3);
        // Left (slip), down, right (slip)
        let next: Vec<_> = outcomes.iter().map(|t| t.next_state).collect();
        assert_eq!(next, vec![0, 4, 1]);
        let total: f64 = outcomes.iter().map(|t| t.probability).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn success_rate_weights() {
        let env = build(&FrozenLakeConfig {
            success_rate: 0.8,
            ..FrozenLakeConfig::default()
        });
        let table = env.transitions().unwrap();
        let probabilities: Vec<_> = table[&0][&1].iter().map(|t| t.probability).collect();
        assert!((probabilities[0] - 0.1).abs() < 1e-12);
        assert!((probabilities[1] - 0.8).abs() < 1e-12);
        assert!((probabilities[2] - 0.1).abs() < 1e-12);
    }

    #[test]
    fn terminal_states_self_loop() {
        let env = FrozenLake::default();
        let table = env.transitions().unwrap();
        // State 5 is a hole
        for action in 0..4 {
            assert_eq!(
                table[&5][&action],
                vec![Transition {
                    probability: 1.0,
                    next_state: 5,
                    reward: 0.0,
                    done: true
                }]
            );
        }
    }

    #[test]
    fn reward_schedule() {
        let env = build(&FrozenLakeConfig {
            is_slippery: false,
            reward_schedule: [10.0, -1.0, -0.1],
            ..FrozenLakeConfig::default()
        });
        let table = env.transitions().unwrap();
        assert_eq!(table[&0][&2][0].reward, -0.1);
        assert_eq!(table[&1][&1][0].reward, -1.0);
        assert_eq!(table[&14][&2][0].reward, 10.0);
        assert_eq!(env.reward_range(), (-1.0, 10.0));
    }

    #[test]
    fn render_initial() {
        let env = FrozenLake::default();
        match env.render(&0, None, RenderMode::Ansi) {
            RenderFrame::Ansi(text) => {
                assert_eq!(text, "\n\u{1b}[41mS\u{1b}[0mFFF\nFHFH\nFFFH\nHFFG\n")
            }
            frame => panic!("unexpected frame {:?}", frame),
        }
    }

    #[test]
    fn render_after_action() {
        let env = FrozenLake::default();
        match env.render(&4, Some(&1), RenderMode::Ansi) {
            RenderFrame::Ansi(text) => {
                assert_eq!(text, "  (Down)\nSFFF\n\u{1b}[41mF\u{1b}[0mHFH\nFFFH\nHFFG\n")
            }
            frame => panic!("unexpected frame {:?}", frame),
        }
    }

    #[test]
    fn config_map_name_null_is_random() {
        let config: FrozenLakeConfig =
            serde_json::from_value(serde_json::json!({"map_name": null})).unwrap();
        assert_eq!(config.map_name, None);
    }

    #[test]
    fn config_map_name_default() {
        let config: FrozenLakeConfig = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(config, FrozenLakeConfig::default());
    }

    #[test]
    fn unknown_map_name_fails() {
        let config = FrozenLakeConfig {
            map_name: Some("5x5".into()),
            ..FrozenLakeConfig::default()
        };
        assert!(config.build_env(&mut Prng::seed_from_u64(0)).is_err());
    }

    #[rstest]
    #[case(vec!["SFF", "FF"])]
    #[case(vec!["SFX"])]
    #[case(vec!["FFF"])]
    fn invalid_desc_fails(#[case] desc: Vec<&str>) {
        let config = FrozenLakeConfig {
            desc: Some(desc.into_iter().map(String::from).collect()),
            ..FrozenLakeConfig::default()
        };
        assert!(matches!(
            config.build_env(&mut Prng::seed_from_u64(0)),
            Err(BuildEnvError::InvalidParameter { name: "desc", .. })
        ));
    }

    #[rstest]
    fn random_map_is_solvable(mut rng: Prng) {
        for _ in 0..20 {
            let map = generate_random_map(8, 0.5, &mut rng);
            assert_eq!(map[(0, 0)], Tile::Start);
            assert_eq!(map[(7, 7)], Tile::Goal);
            assert!(has_path_to_goal(&map));
        }
    }
}

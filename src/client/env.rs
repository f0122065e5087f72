//! Typed handle to a remote environment instance
use super::{Client, ClientError};
use crate::envs::{Info, TransitionTable};
use crate::spaces::SpaceDescriptor;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ndarray::Array3;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An observation decoded according to the observation space.
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    Discrete(usize),
    /// Row-major flattened box values.
    Box(Vec<f64>),
}

impl Observation {
    /// Decode an observation sent by the server.
    pub fn from_json(space: &SpaceDescriptor, value: &Value) -> Result<Self, ClientError> {
        let invalid = || ClientError::Decode(format!("invalid observation {}", value));
        let items = match value {
            Value::Array(items) => items.as_slice(),
            other => std::slice::from_ref(other),
        };
        match space {
            SpaceDescriptor::Discrete { .. } => match items {
                [item] => item
                    .as_u64()
                    .and_then(|n| usize::try_from(n).ok())
                    .map(Self::Discrete)
                    .ok_or_else(invalid),
                _ => Err(invalid()),
            },
            SpaceDescriptor::Box { .. } => items
                .iter()
                .map(Value::as_f64)
                .collect::<Option<Vec<_>>>()
                .map(Self::Box)
                .ok_or_else(invalid),
        }
    }

    pub const fn as_discrete(&self) -> Option<usize> {
        match self {
            Self::Discrete(n) => Some(*n),
            Self::Box(_) => None,
        }
    }

    pub fn as_box(&self) -> Option<&[f64]> {
        match self {
            Self::Box(values) => Some(values),
            Self::Discrete(_) => None,
        }
    }
}

/// An action in JSON form: an integer for discrete spaces, an array for boxes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Action {
    Discrete(usize),
    Box(Vec<f64>),
}

impl Action {
    fn to_json(&self) -> Value {
        match self {
            Self::Discrete(n) => Value::from(*n),
            Self::Box(values) => Value::from(values.clone()),
        }
    }
}

/// The result of a step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepInfo {
    pub observation: Observation,
    pub reward: f64,
    pub terminated: bool,
    pub truncated: bool,
    pub info: Info,
}

impl StepInfo {
    /// Whether the episode has ended.
    pub const fn done(&self) -> bool {
        self.terminated || self.truncated
    }
}

/// A decoded render frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Ansi(String),
    /// Pixels with shape `[rows, cols, 4]`.
    Rgba(Array3<u8>),
    /// The instance has no render mode.
    Empty,
}

impl Frame {
    /// Decode a frame sent by the server.
    pub fn from_json(value: &Value) -> Result<Self, ClientError> {
        match value {
            Value::Null => Ok(Self::Empty),
            Value::String(text) => Ok(Self::Ansi(text.clone())),
            Value::Object(fields) => {
                let dim = |name: &str| {
                    fields
                        .get(name)
                        .and_then(Value::as_u64)
                        .and_then(|n| usize::try_from(n).ok())
                        .ok_or_else(|| ClientError::Decode(format!("frame is missing '{}'", name)))
                };
                let rows = dim("rows")?;
                let cols = dim("cols")?;
                let data = fields
                    .get("data")
                    .and_then(Value::as_str)
                    .ok_or_else(|| ClientError::Decode("frame is missing 'data'".into()))?;
                let bytes = STANDARD
                    .decode(data)
                    .map_err(|err| ClientError::Decode(format!("frame data: {}", err)))?;
                let pixels = Array3::from_shape_vec((rows, cols, 4), bytes)
                    .map_err(|err| ClientError::Decode(format!("frame shape: {}", err)))?;
                Ok(Self::Rgba(pixels))
            }
            other => Err(ClientError::Decode(format!("invalid frame {}", other))),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Ansi(text) => Some(text),
            _ => None,
        }
    }

    pub const fn as_rgba(&self) -> Option<&Array3<u8>> {
        match self {
            Self::Rgba(pixels) => Some(pixels),
            _ => None,
        }
    }
}

/// One step of an episode sampled by the server.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeEvent {
    /// Observation
    pub s: Observation,
    /// Reward of the step leading to the observation
    pub r: f64,
}

#[derive(Deserialize)]
struct RawEpisodeEvent {
    s: Value,
    r: f64,
}

/// Handle to an environment instance on a server.
///
/// The space descriptors are fetched once on connection.
#[derive(Debug, Clone)]
pub struct RemoteEnv {
    client: Client,
    env_id: String,
    instance_id: String,
    observation_space: SpaceDescriptor,
    action_space: SpaceDescriptor,
}

impl RemoteEnv {
    /// Connect to an existing instance.
    pub fn connect(client: Client, instance_id: &str) -> Result<Self, ClientError> {
        let env_id = client.env_id(instance_id)?;
        let observation_space = client.observation_space(instance_id)?;
        let action_space = client.action_space(instance_id)?;
        Ok(Self {
            client,
            env_id,
            instance_id: instance_id.to_string(),
            observation_space,
            action_space,
        })
    }

    pub fn env_id(&self) -> &str {
        &self.env_id
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub const fn observation_space(&self) -> &SpaceDescriptor {
        &self.observation_space
    }

    pub const fn action_space(&self) -> &SpaceDescriptor {
        &self.action_space
    }

    fn observation(&self, value: &Value) -> Result<Observation, ClientError> {
        Observation::from_json(&self.observation_space, value)
    }

    pub fn reset(&self, seed: Option<u64>) -> Result<Observation, ClientError> {
        let value = self.client.reset(&self.instance_id, seed)?;
        self.observation(&value)
    }

    pub fn step(&self, action: &Action) -> Result<StepInfo, ClientError> {
        let outcome = self.client.step(&self.instance_id, &action.to_json())?;
        Ok(StepInfo {
            observation: self.observation(&outcome.observation)?,
            reward: outcome.reward,
            terminated: outcome.terminated,
            truncated: outcome.truncated,
            info: outcome.info,
        })
    }

    pub fn render(&self) -> Result<Frame, ClientError> {
        Frame::from_json(&self.client.render(&self.instance_id)?)
    }

    pub fn sample_action(&self) -> Result<Action, ClientError> {
        let value = self.client.sample_action(&self.instance_id)?;
        serde_json::from_value(value).map_err(|err| ClientError::Decode(err.to_string()))
    }

    pub fn contains_action(&self, action: &Action) -> Result<bool, ClientError> {
        self.client
            .action_contains(&self.instance_id, &action.to_json())
    }

    pub fn transitions(&self) -> Result<TransitionTable, ClientError> {
        self.client.transitions(&self.instance_id)
    }

    /// Sample episodes with random actions on the server.
    pub fn episodes(
        &self,
        count: u64,
        seed: Option<u64>,
    ) -> Result<Vec<Vec<EpisodeEvent>>, ClientError> {
        self.client
            .episodes(&self.instance_id, count, seed)?
            .into_iter()
            .map(|episode| {
                episode
                    .into_iter()
                    .map(|event| {
                        let event: RawEpisodeEvent = serde_json::from_value(event)
                            .map_err(|err| ClientError::Decode(err.to_string()))?;
                        Ok(EpisodeEvent {
                            s: self.observation(&event.s)?,
                            r: event.r,
                        })
                    })
                    .collect::<Result<Vec<_>, ClientError>>()
            })
            .collect()
    }

    /// Close the instance on the server.
    pub fn close(self) -> Result<(), ClientError> {
        self.client.close(&self.instance_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn discrete_observation() {
        let space = SpaceDescriptor::Discrete { n: 16 };
        assert_eq!(
            Observation::from_json(&space, &json!([3])).unwrap(),
            Observation::Discrete(3)
        );
        assert!(Observation::from_json(&space, &json!([1, 2])).is_err());
    }

    #[test]
    fn box_observation() {
        let space = SpaceDescriptor::Box {
            shape: vec![2],
            low: vec![-1.0, -1.0],
            high: vec![1.0, 1.0],
        };
        let observation = Observation::from_json(&space, &json!([0.5, -0.25])).unwrap();
        assert_eq!(observation.as_box(), Some(&[0.5, -0.25][..]));
        assert_eq!(observation.as_discrete(), None);
    }

    #[test]
    fn action_json() {
        assert_eq!(Action::Discrete(1).to_json(), json!(1));
        assert_eq!(Action::Box(vec![0.5]).to_json(), json!([0.5]));
        assert_eq!(
            serde_json::from_value::<Action>(json!(2)).unwrap(),
            Action::Discrete(2)
        );
        assert_eq!(
            serde_json::from_value::<Action>(json!([-0.5])).unwrap(),
            Action::Box(vec![-0.5])
        );
    }

    #[test]
    fn frame_variants() {
        assert_eq!(Frame::from_json(&Value::Null).unwrap(), Frame::Empty);
        assert_eq!(
            Frame::from_json(&json!("SFFF\n")).unwrap().as_str(),
            Some("SFFF\n")
        );
    }

    #[test]
    fn frame_rgba() {
        let data = STANDARD.encode([1u8, 2, 3, 255, 4, 5, 6, 255]);
        let frame = Frame::from_json(&json!({"rows": 1, "cols": 2, "data": data})).unwrap();
        let pixels = frame.as_rgba().unwrap();
        assert_eq!(pixels.dim(), (1, 2, 4));
        assert_eq!(pixels[[0, 1, 2]], 6);
    }

    #[test]
    fn frame_rgba_wrong_size() {
        let data = STANDARD.encode([0u8; 7]);
        assert!(Frame::from_json(&json!({"rows": 1, "cols": 2, "data": data})).is_err());
    }
}

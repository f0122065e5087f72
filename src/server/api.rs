//! JSON API over the instance table
use super::instances::InstanceTable;
use super::jsonable;
use super::params::{self, Body};
use super::routes::{Method, Route};
use crate::envs::{make, MakeOptions, StepOutcome, TransitionTable};
use crate::error::ApiError;
use crate::spaces::SpaceDescriptor;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

/// Response to an API request.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    /// JSON body; `None` for an empty body.
    pub body: Option<Value>,
}

impl Reply {
    pub const fn ok(body: Value) -> Self {
        Self {
            status: 200,
            body: Some(body),
        }
    }

    pub const fn empty() -> Self {
        Self {
            status: 200,
            body: None,
        }
    }

    pub fn error(err: &ApiError) -> Self {
        Self {
            status: err.status_code(),
            body: Some(err.to_json()),
        }
    }
}

/// One step of a sampled episode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeEvent {
    /// Observation
    pub s: Value,
    /// Reward of the step leading to the observation
    pub r: f64,
}

/// The gym HTTP API.
///
/// Holds the environment instances and answers requests one at a time.
#[derive(Default)]
pub struct Api {
    instances: InstanceTable,
}

impl Api {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn with_instances(instances: InstanceTable) -> Self {
        Self { instances }
    }

    pub const fn instances(&self) -> &InstanceTable {
        &self.instances
    }

    /// Answer a request.
    pub fn handle(&mut self, method: Method, url: &str, body: &str) -> Reply {
        debug!(%method, url, "request");
        match self.dispatch(method, url, body) {
            Ok(reply) => reply,
            Err(err) => {
                info!(%method, url, status = err.status_code(), "{}", err);
                Reply::error(&err)
            }
        }
    }

    fn dispatch(&mut self, method: Method, url: &str, body: &str) -> Result<Reply, ApiError> {
        let route = Route::parse(url).ok_or(ApiError::NotFound)?;
        if !route.allows(method) {
            return Err(ApiError::MethodNotAllowed);
        }
        let body = if method == Method::Post {
            params::parse_body(body)?
        } else {
            Body::new()
        };

        let reply = match route {
            Route::Envs if method == Method::Post => {
                let instance_id = self.create(&body)?;
                Reply::ok(json!({ "instance_id": instance_id }))
            }
            Route::Envs => Reply::ok(json!({ "all_envs": self.list_all() })),
            Route::Instance(id) if method == Method::Delete => {
                self.close(&id)?;
                Reply::empty()
            }
            Route::Instance(id) => Reply::ok(json!({ "id": self.env_id(&id)? })),
            Route::Reset(id) => {
                let seed = params::optional(&body, "seed")
                    .map(|seed| params::to_u64("seed", seed))
                    .transpose()?;
                Reply::ok(json!({ "observation": self.reset(&id, seed)? }))
            }
            Route::Render(id) => Reply::ok(json!({ "render_frame": self.render(&id)? })),
            Route::Step(id) => {
                let action = params::required(&body, "action")?;
                Reply::ok(to_json(self.step(&id, action)?))
            }
            Route::ActionSpace(id) => Reply::ok(json!({ "info": self.action_space(&id)? })),
            Route::ActionSample(id) => {
                Reply::ok(json!({ "action": self.sample_action(&id)? }))
            }
            Route::ActionContains(id, x) => {
                Reply::ok(json!({ "member": self.action_contains(&id, &x)? }))
            }
            Route::ObservationSpace(id) => {
                Reply::ok(json!({ "info": self.observation_space(&id)? }))
            }
            Route::ObservationContains(id) => {
                Reply::ok(json!({ "member": self.observation_contains(&id, &body)? }))
            }
            Route::Transitions(id) => {
                Reply::ok(json!({ "transitions": self.transitions(&id)? }))
            }
            Route::Episodes(id) => {
                let count = params::to_u64("count", params::required(&body, "count")?)?;
                let seed = params::optional(&body, "seed")
                    .map(|seed| params::to_u64("seed", seed))
                    .transpose()?;
                Reply::ok(json!({ "episodes": self.episodes(&id, count, seed)? }))
            }
        };
        Ok(reply)
    }

    /// Create an environment instance from the parameters of a create request.
    ///
    /// Returns the new instance ID.
    pub fn create(&mut self, body: &Body) -> Result<String, ApiError> {
        let env_id = params::required(body, "env_id")?;
        let env_id = env_id
            .as_str()
            .ok_or_else(|| ApiError::invalid_parameter("env_id", "expected a string"))?;

        let mut options = MakeOptions::default();
        if let Some(value) = params::optional(body, "max_episode_steps") {
            options.max_episode_steps = Some(params::to_u64("max_episode_steps", value)?);
        }
        if let Some(value) = params::optional(body, "auto_reset") {
            options.auto_reset = params::to_bool("auto_reset", value)?;
        }
        if let Some(value) = params::optional(body, "disable_env_checker") {
            options.disable_env_checker = params::to_bool("disable_env_checker", value)?;
        }
        if let Some(value) = params::optional(body, "kwargs") {
            options.kwargs = params::to_object("kwargs", value)?;
        }

        let (spec_id, env) = make(env_id, options).map_err(|err| {
            info!(env_id, error = %err, "failed to make environment");
            ApiError::make_env(env_id, err)
        })?;
        Ok(self.instances.insert(spec_id.to_string(), env))
    }

    /// Map from instance ID to environment ID of all instances.
    pub fn list_all(&self) -> Map<String, Value> {
        self.instances
            .iter()
            .map(|(instance_id, env_id)| (instance_id.to_string(), Value::from(env_id)))
            .collect()
    }

    pub fn env_id(&self, instance_id: &str) -> Result<&str, ApiError> {
        Ok(&self.instances.get(instance_id)?.env_id)
    }

    pub fn reset(&mut self, instance_id: &str, seed: Option<u64>) -> Result<Value, ApiError> {
        let env = &mut self.instances.get_mut(instance_id)?.env;
        let (observation, _info) = env.reset(seed)?;
        Ok(observation)
    }

    pub fn render(&mut self, instance_id: &str) -> Result<Value, ApiError> {
        let frame = self.instances.get_mut(instance_id)?.env.render()?;
        Ok(jsonable::render_frame(&frame))
    }

    pub fn step(&mut self, instance_id: &str, action: &Value) -> Result<StepOutcome, ApiError> {
        Ok(self.instances.get_mut(instance_id)?.env.step(action)?)
    }

    pub fn action_space(&self, instance_id: &str) -> Result<SpaceDescriptor, ApiError> {
        Ok(self.instances.get(instance_id)?.env.action_space())
    }

    pub fn sample_action(&mut self, instance_id: &str) -> Result<Value, ApiError> {
        Ok(self.instances.get_mut(instance_id)?.env.sample_action())
    }

    /// Whether an action given as a JSON string is in the action space.
    pub fn action_contains(&self, instance_id: &str, x: &str) -> Result<bool, ApiError> {
        let env = &self.instances.get(instance_id)?.env;
        let action: Value = serde_json::from_str(x)
            .map_err(|_| ApiError::invalid_parameter("x", format!("'{}' is not valid JSON", x)))?;
        Ok(env.contains_action(&action))
    }

    pub fn observation_space(&self, instance_id: &str) -> Result<SpaceDescriptor, ApiError> {
        Ok(self.instances.get(instance_id)?.env.observation_space())
    }

    /// Whether every given field matches the same field of the observation space descriptor.
    pub fn observation_contains(&self, instance_id: &str, fields: &Body) -> Result<bool, ApiError> {
        let descriptor = to_json(self.observation_space(instance_id)?);
        for (key, value) in fields {
            let observed = descriptor.get(key);
            if observed != Some(value) {
                info!(
                    key = %key,
                    passed = %value,
                    observed = ?observed,
                    "observation space values do not match"
                );
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub fn transitions(&self, instance_id: &str) -> Result<TransitionTable, ApiError> {
        Ok(self.instances.get(instance_id)?.env.transitions()?)
    }

    /// Sample episodes with uniformly random actions.
    ///
    /// Each episode starts from `reset(seed)` and runs until it terminates or is truncated.
    /// The first event of an episode is the initial observation with zero reward.
    pub fn episodes(
        &mut self,
        instance_id: &str,
        count: u64,
        seed: Option<u64>,
    ) -> Result<Vec<Vec<EpisodeEvent>>, ApiError> {
        let env = &mut self.instances.get_mut(instance_id)?.env;
        let mut episodes = Vec::new();
        for _ in 0..count {
            let (observation, _) = env.reset(seed)?;
            let mut episode = vec![EpisodeEvent {
                s: observation,
                r: 0.0,
            }];
            loop {
                let action = env.sample_action();
                let outcome = env.step(&action)?;
                episode.push(EpisodeEvent {
                    s: outcome.observation,
                    r: outcome.reward,
                });
                if outcome.terminated || outcome.truncated {
                    break;
                }
            }
            episodes.push(episode);
        }
        Ok(episodes)
    }

    /// Close and remove an instance.
    pub fn close(&mut self, instance_id: &str) -> Result<(), ApiError> {
        self.instances.remove(instance_id)
    }
}

/// Serialize a value that always has a JSON representation.
fn to_json<T: Serialize>(value: T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

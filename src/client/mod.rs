//! Blocking HTTP client for the environment server
mod env;

pub use env::{Action, EpisodeEvent, Frame, Observation, RemoteEnv, StepInfo};

use crate::envs::{MakeOptions, StepOutcome, TransitionTable};
use crate::spaces::SpaceDescriptor;
use reqwest::blocking::{RequestBuilder, Response};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

/// Error from a client request.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server responded with status {status}: {message}")]
    Server { status: u16, message: String },
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("unexpected response: {0}")]
    Decode(String),
}

/// Client of the environment server API.
///
/// Each method corresponds to one API endpoint.
/// Use [`Client::make_env`] for a typed handle to a single instance.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    http: reqwest::blocking::Client,
}

/// Normalize a server base URL.
///
/// Adds a missing `http://` scheme, uses `127.0.0.1` for `localhost`
/// and removes trailing slashes.
fn normalize_base_url(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');
    let url = if url.contains("://") {
        url.to_string()
    } else {
        format!("http://{}", url)
    };
    match url.split_once("://localhost") {
        Some((scheme, rest)) if rest.is_empty() || rest.starts_with([':', '/']) => {
            format!("{}://127.0.0.1{}", scheme, rest)
        }
        _ => url,
    }
}

impl Client {
    /// Client of the server listening on `host` and `port`.
    ///
    /// The host may include a scheme, like `http://localhost`.
    pub fn new(host: &str, port: u16) -> Self {
        let host = host.trim().trim_end_matches('/');
        Self::from_url(&format!("{}:{}", host, port))
    }

    /// Client of the server at a base URL like `http://127.0.0.1:40004`.
    pub fn from_url(base_url: &str) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            http: reqwest::blocking::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn instance_url(&self, instance_id: &str, endpoint: &str) -> String {
        self.url(&format!("/v1/envs/{}/{}", instance_id, endpoint))
    }

    fn send(&self, request: RequestBuilder) -> Result<Value, ClientError> {
        decode_response(request.send()?)
    }

    fn get<T: DeserializeOwned>(&self, url: &str, field: &str) -> Result<T, ClientError> {
        debug!(url, "GET");
        let value = self.send(self.http.get(url))?;
        take_field(value, field)
    }

    fn post<T: DeserializeOwned>(
        &self,
        url: &str,
        body: &Value,
        field: &str,
    ) -> Result<T, ClientError> {
        debug!(url, %body, "POST");
        let value = self.send(self.http.post(url).json(body))?;
        take_field(value, field)
    }

    /// Map from instance ID to environment ID of every instance on the server.
    pub fn list_envs(&self) -> Result<BTreeMap<String, String>, ClientError> {
        self.get(&self.url("/v1/envs/"), "all_envs")
    }

    /// Create an environment instance and return its instance ID.
    pub fn create(&self, env_id: &str, options: &MakeOptions) -> Result<String, ClientError> {
        let mut body = json!({
            "env_id": env_id,
            "auto_reset": options.auto_reset,
            "disable_env_checker": options.disable_env_checker,
            "kwargs": options.kwargs,
        });
        if let Some(max_episode_steps) = options.max_episode_steps {
            body["max_episode_steps"] = json!(max_episode_steps);
        }
        self.post(&self.url("/v1/envs/"), &body, "instance_id")
    }

    /// Create an environment instance and return a typed handle to it.
    pub fn make_env(&self, env_id: &str, options: &MakeOptions) -> Result<RemoteEnv, ClientError> {
        let instance_id = self.create(env_id, options)?;
        RemoteEnv::connect(self.clone(), &instance_id)
    }

    /// Environment ID of an instance.
    pub fn env_id(&self, instance_id: &str) -> Result<String, ClientError> {
        self.get(&self.instance_url(instance_id, ""), "id")
    }

    /// Reset an instance and return its initial observation.
    pub fn reset(&self, instance_id: &str, seed: Option<u64>) -> Result<Value, ClientError> {
        let body = match seed {
            Some(seed) => json!({ "seed": seed }),
            None => json!({}),
        };
        self.post(&self.instance_url(instance_id, "reset/"), &body, "observation")
    }

    pub fn step(&self, instance_id: &str, action: &Value) -> Result<StepOutcome, ClientError> {
        let url = self.instance_url(instance_id, "step/");
        let value = self.send(self.http.post(&url).json(&json!({ "action": action })))?;
        serde_json::from_value(value).map_err(|err| ClientError::Decode(err.to_string()))
    }

    /// Render frame as sent by the server: a string, `{rows, cols, data}` or `null`.
    pub fn render(&self, instance_id: &str) -> Result<Value, ClientError> {
        self.get(&self.instance_url(instance_id, "render/"), "render_frame")
    }

    pub fn action_space(&self, instance_id: &str) -> Result<SpaceDescriptor, ClientError> {
        self.get(&self.instance_url(instance_id, "action_space/"), "info")
    }

    pub fn sample_action(&self, instance_id: &str) -> Result<Value, ClientError> {
        self.get(&self.instance_url(instance_id, "action_space/sample/"), "action")
    }

    pub fn action_contains(&self, instance_id: &str, action: &Value) -> Result<bool, ClientError> {
        let mut url = Url::parse(&self.instance_url(instance_id, "action_space/contains/"))
            .map_err(|err| ClientError::InvalidUrl(err.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .push(&action.to_string())
            .push("");
        self.get(url.as_str(), "member")
    }

    pub fn observation_space(&self, instance_id: &str) -> Result<SpaceDescriptor, ClientError> {
        self.get(&self.instance_url(instance_id, "observation_space/"), "info")
    }

    /// Whether the given fields match the observation space descriptor.
    pub fn observation_contains(
        &self,
        instance_id: &str,
        fields: &Map<String, Value>,
    ) -> Result<bool, ClientError> {
        let url = self.instance_url(instance_id, "observation_space/contains/");
        self.post(&url, &Value::Object(fields.clone()), "member")
    }

    pub fn transitions(&self, instance_id: &str) -> Result<TransitionTable, ClientError> {
        self.get(&self.instance_url(instance_id, "transitions/"), "transitions")
    }

    /// Sample episodes with random actions on the server.
    pub fn episodes(
        &self,
        instance_id: &str,
        count: u64,
        seed: Option<u64>,
    ) -> Result<Vec<Vec<Value>>, ClientError> {
        let mut body = json!({ "count": count });
        if let Some(seed) = seed {
            body["seed"] = json!(seed);
        }
        self.post(&self.instance_url(instance_id, "episodes/"), &body, "episodes")
    }

    /// Close an instance.
    pub fn close(&self, instance_id: &str) -> Result<(), ClientError> {
        let url = self.instance_url(instance_id, "");
        debug!(url = %url, "DELETE");
        self.send(self.http.delete(&url)).map(|_| ())
    }
}

/// Check the response status and parse the body as JSON.
///
/// An empty body is `null`.
fn decode_response(response: Response) -> Result<Value, ClientError> {
    let status = response.status();
    let text = response.text()?;
    if !status.is_success() {
        let message = serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|value| value.get("message")?.as_str().map(str::to_string))
            .unwrap_or(text);
        return Err(ClientError::Server {
            status: status.as_u16(),
            message,
        });
    }
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&text).map_err(|err| ClientError::Decode(err.to_string()))
}

/// Deserialize one field of a JSON response object.
fn take_field<T: DeserializeOwned>(mut value: Value, field: &str) -> Result<T, ClientError> {
    let field_value = value
        .get_mut(field)
        .map(Value::take)
        .ok_or_else(|| ClientError::Decode(format!("missing field '{}'", field)))?;
    serde_json::from_value(field_value)
        .map_err(|err| ClientError::Decode(format!("field '{}': {}", field, err)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("http://localhost:40004", "http://127.0.0.1:40004")]
    #[case("localhost:40004/", "http://127.0.0.1:40004")]
    #[case("http://localhost", "http://127.0.0.1")]
    #[case("http://localhostname:80", "http://localhostname:80")]
    #[case("https://example.com:8080//", "https://example.com:8080")]
    fn base_url(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_base_url(input), expected);
    }

    #[test]
    fn new_joins_port() {
        assert_eq!(
            Client::new("http://localhost", 5000).base_url(),
            "http://127.0.0.1:5000"
        );
    }

    #[test]
    fn instance_urls() {
        let client = Client::new("127.0.0.1", 1);
        assert_eq!(
            client.instance_url("abc", "reset/"),
            "http://127.0.0.1:1/v1/envs/abc/reset/"
        );
        assert_eq!(
            client.instance_url("abc", ""),
            "http://127.0.0.1:1/v1/envs/abc/"
        );
    }

    #[test]
    fn take_field_missing() {
        let result: Result<u32, _> = take_field(json!({"a": 1}), "b");
        assert!(matches!(result, Err(ClientError::Decode(_))));
    }

    #[test]
    fn take_field_typed() {
        let n: u32 = take_field(json!({"a": 1}), "a").unwrap();
        assert_eq!(n, 1);
    }
}

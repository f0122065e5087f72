//! Error type
use crate::envs::{BuildEnvError, EnvError};
use serde_json::{json, Value};
use thiserror::Error;

/// Error answering an API request.
///
/// Every error is reported to the client as a JSON object `{"message": ...}`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    #[error("Instance_id {0} unknown")]
    UnknownInstance(String),
    #[error("A required request parameter '{0}' was not provided")]
    MissingParameter(String),
    #[error("Request is not a valid json")]
    InvalidJson,
    #[error("Invalid value for request parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },
    #[error("Attempted to look up malformed environment ID '{0}'")]
    MalformedEnvId(String),
    #[error("{0}")]
    MakeEnv(BuildEnvError),
    #[error("{0}")]
    Env(#[from] EnvError),
    #[error("The requested URL was not found on the server")]
    NotFound,
    #[error("The method is not allowed for the requested URL")]
    MethodNotAllowed,
}

impl ApiError {
    /// Create from an error making the environment `env_id`.
    ///
    /// Failures to find the ID in the registry all report a malformed ID.
    pub fn make_env(env_id: &str, err: BuildEnvError) -> Self {
        if err.is_lookup_error() {
            Self::MalformedEnvId(env_id.to_string())
        } else {
            Self::MakeEnv(err)
        }
    }

    pub fn invalid_parameter<S: ToString>(name: &str, reason: S) -> Self {
        Self::InvalidParameter {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }

    /// HTTP status code of the error response.
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::MethodNotAllowed => 405,
            _ => 400,
        }
    }

    /// JSON body of the error response.
    pub fn to_json(&self) -> Value {
        json!({ "message": self.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_instance_message() {
        let err = ApiError::UnknownInstance("abc".into());
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_json(), json!({"message": "Instance_id abc unknown"}));
    }

    #[test]
    fn lookup_errors_are_malformed_ids() {
        let err = ApiError::make_env("Nope-v0", BuildEnvError::NameNotFound("Nope".into()));
        assert_eq!(
            err.to_string(),
            "Attempted to look up malformed environment ID 'Nope-v0'"
        );
    }

    #[test]
    fn other_build_errors_keep_message() {
        let build_err = BuildEnvError::InvalidKwargs("bad".into());
        let err = ApiError::make_env("CartPole-v1", build_err.clone());
        assert_eq!(err.to_string(), build_err.to_string());
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn routing_status_codes() {
        assert_eq!(ApiError::NotFound.status_code(), 404);
        assert_eq!(ApiError::MethodNotAllowed.status_code(), 405);
    }
}

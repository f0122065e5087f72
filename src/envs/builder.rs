use super::Environment;
use crate::Prng;
use thiserror::Error;

/// Build an environment from a configuration.
pub trait BuildEnv {
    type Environment: Environment;

    /// Build an environment instance.
    ///
    /// # Args
    /// * `rng` - Random number generator for any randomness in the environment structure.
    fn build_env(&self, rng: &mut Prng) -> Result<Self::Environment, BuildEnvError>;
}

/// Error building an environment
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildEnvError {
    #[error("malformed environment ID '{0}'")]
    MalformedId(String),
    #[error("namespace '{0}' not found")]
    NamespaceNotFound(String),
    #[error("environment '{0}' doesn't exist")]
    NameNotFound(String),
    #[error("environment version v{version} for '{name}' doesn't exist")]
    VersionNotFound { name: String, version: u32 },
    #[error("invalid environment arguments: {0}")]
    InvalidKwargs(String),
    #[error("render mode '{mode}' is not supported, expected one of {supported:?}")]
    UnsupportedRenderMode {
        mode: String,
        supported: Vec<&'static str>,
    },
    #[error("invalid value for {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

impl BuildEnvError {
    /// Whether the error came from looking up the environment ID in the registry.
    pub const fn is_lookup_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedId(_)
                | Self::NamespaceNotFound(_)
                | Self::NameNotFound(_)
                | Self::VersionNotFound { .. }
        )
    }
}

impl From<serde_json::Error> for BuildEnvError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidKwargs(err.to_string())
    }
}

//! Registry of named environments
use super::wrappers::{AutoReset, OrderEnforcing, PassiveEnvChecker, TimeLimit, Wrap};
use super::{
    Action, BuildEnv, BuildEnvError, CartPoleConfig, ChainConfig, Environment,
    EnvWithState, FrozenLakeConfig, MountainCarConfig, MountainCarContinuousConfig,
    StatefulEnvironment,
};
use crate::render::RenderMode;
use crate::Prng;
use rand::SeedableRng;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fmt;
use tracing::{debug, warn};

/// A parsed environment ID of the form `[namespace/]name[-vN]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnvId {
    pub namespace: Option<String>,
    pub name: String,
    pub version: Option<u32>,
}

impl fmt::Display for EnvId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(namespace) = &self.namespace {
            write!(f, "{}/", namespace)?;
        }
        f.write_str(&self.name)?;
        if let Some(version) = self.version {
            write!(f, "-v{}", version)?;
        }
        Ok(())
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Parse an environment ID.
///
/// Namespaces may contain word characters, `:` and `-`.
/// Names may additionally contain `.`.
/// A trailing `-v` followed by digits is the version.
pub fn parse_env_id(id: &str) -> Result<EnvId, BuildEnvError> {
    let malformed = || BuildEnvError::MalformedId(id.to_string());

    let (namespace, rest) = match id.split_once('/') {
        Some((namespace, rest)) => {
            if namespace.is_empty()
                || !namespace.chars().all(|c| is_word_char(c) || c == ':' || c == '-')
            {
                return Err(malformed());
            }
            (Some(namespace.to_string()), rest)
        }
        None => (None, id),
    };

    let (name, version) = match rest.rsplit_once("-v") {
        Some((name, digits))
            if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) =>
        {
            let version = digits.parse().map_err(|_| malformed())?;
            (name, Some(version))
        }
        _ => (rest, None),
    };
    if name.is_empty()
        || !name
            .chars()
            .all(|c| is_word_char(c) || c == ':' || c == '-' || c == '.')
    {
        return Err(malformed());
    }

    Ok(EnvId {
        namespace,
        name: name.to_string(),
        version,
    })
}

/// Environment implementations available in the registry.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum EntryPoint {
    CartPole,
    MountainCar,
    MountainCarContinuous,
    FrozenLake,
    Chain,
}

/// A registered environment.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct EnvSpec {
    name: &'static str,
    version: u32,
    entry_point: EntryPoint,
    max_episode_steps: u64,
    /// Keyword arguments applied before those passed to [`make`], as a JSON object.
    default_kwargs: &'static str,
}

impl EnvSpec {
    const fn new(
        name: &'static str,
        version: u32,
        entry_point: EntryPoint,
        max_episode_steps: u64,
    ) -> Self {
        Self {
            name,
            version,
            entry_point,
            max_episode_steps,
            default_kwargs: "{}",
        }
    }

    fn id(&self) -> EnvId {
        EnvId {
            namespace: None,
            name: self.name.to_string(),
            version: Some(self.version),
        }
    }
}

static REGISTRY: [EnvSpec; 7] = [
    EnvSpec::new("CartPole", 0, EntryPoint::CartPole, 200),
    EnvSpec::new("CartPole", 1, EntryPoint::CartPole, 500),
    EnvSpec::new("MountainCar", 0, EntryPoint::MountainCar, 200),
    EnvSpec::new(
        "MountainCarContinuous",
        0,
        EntryPoint::MountainCarContinuous,
        999,
    ),
    EnvSpec::new("FrozenLake", 1, EntryPoint::FrozenLake, 100),
    EnvSpec {
        default_kwargs: r#"{"map_name": "8x8"}"#,
        ..EnvSpec::new("FrozenLake8x8", 1, EntryPoint::FrozenLake, 200)
    },
    EnvSpec::new("Chain", 0, EntryPoint::Chain, 100),
];

/// IDs of all registered environments.
pub fn registered_ids() -> Vec<String> {
    REGISTRY.iter().map(|spec| spec.id().to_string()).collect()
}

/// Find the registered environment for an ID.
///
/// An ID without a version resolves to the latest registered version.
fn find_spec(id: &EnvId) -> Result<&'static EnvSpec, BuildEnvError> {
    if let Some(namespace) = &id.namespace {
        return Err(BuildEnvError::NamespaceNotFound(namespace.clone()));
    }
    let mut versions = REGISTRY.iter().filter(|spec| spec.name == id.name).peekable();
    if versions.peek().is_none() {
        return Err(BuildEnvError::NameNotFound(id.name.clone()));
    }
    match id.version {
        Some(version) => versions
            .find(|spec| spec.version == version)
            .ok_or_else(|| BuildEnvError::VersionNotFound {
                name: id.name.clone(),
                version,
            }),
        None => {
            let spec = versions
                .max_by_key(|spec| spec.version)
                .ok_or_else(|| BuildEnvError::NameNotFound(id.name.clone()))?;
            warn!(
                "using the latest version `{}` for the unversioned environment `{}`",
                spec.id(),
                id
            );
            Ok(spec)
        }
    }
}

/// Options for [`make`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MakeOptions {
    /// Override the registered step limit per episode.
    pub max_episode_steps: Option<u64>,
    /// Automatically reset the environment when an episode ends.
    pub auto_reset: bool,
    /// Skip the passive environment checker.
    pub disable_env_checker: bool,
    /// Environment arguments, including an optional `render_mode`.
    pub kwargs: Map<String, Value>,
}

/// Create an environment from its ID.
///
/// Returns the resolved ID of the registered environment and the wrapped environment.
pub fn make(
    env_id: &str,
    options: MakeOptions,
) -> Result<(EnvId, Box<dyn StatefulEnvironment>), BuildEnvError> {
    let spec = find_spec(&parse_env_id(env_id)?)?;

    let mut kwargs = match serde_json::from_str(spec.default_kwargs)? {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    kwargs.extend(options.kwargs);
    let render_mode = match kwargs.remove("render_mode") {
        None | Some(Value::Null) => None,
        Some(Value::String(mode)) => Some(mode),
        Some(other) => {
            return Err(BuildEnvError::InvalidKwargs(format!(
                "render_mode must be a string, got {}",
                other
            )))
        }
    };
    debug!(env_id = %spec.id(), ?kwargs, ?render_mode, "making environment");

    let kwargs = Value::Object(kwargs);
    let mut rng = Prng::from_entropy();
    let render_mode = render_mode.as_deref();
    let mut env = match spec.entry_point {
        EntryPoint::CartPole => build::<CartPoleConfig>(kwargs, render_mode, &mut rng),
        EntryPoint::MountainCar => build::<MountainCarConfig>(kwargs, render_mode, &mut rng),
        EntryPoint::MountainCarContinuous => {
            build::<MountainCarContinuousConfig>(kwargs, render_mode, &mut rng)
        }
        EntryPoint::FrozenLake => build::<FrozenLakeConfig>(kwargs, render_mode, &mut rng),
        EntryPoint::Chain => build::<ChainConfig>(kwargs, render_mode, &mut rng),
    }?;

    if !options.disable_env_checker {
        env = Box::new(env.wrap(PassiveEnvChecker::new()));
    }
    env = Box::new(env.wrap(OrderEnforcing::new()));
    let max_episode_steps = options
        .max_episode_steps
        .unwrap_or(spec.max_episode_steps);
    env = Box::new(env.wrap(TimeLimit::new(max_episode_steps)));
    if options.auto_reset {
        env = Box::new(env.wrap(AutoReset));
    }
    Ok((spec.id(), env))
}

/// Build an environment from its configuration given as JSON keyword arguments.
fn build<C>(
    kwargs: Value,
    render_mode: Option<&str>,
    rng: &mut Prng,
) -> Result<Box<dyn StatefulEnvironment>, BuildEnvError>
where
    C: BuildEnv + DeserializeOwned,
    C::Environment: Send + 'static,
    <C::Environment as Environment>::State: Send + 'static,
    Action<C::Environment>: Send + 'static,
{
    let config: C = serde_json::from_value(kwargs)?;
    let env = config.build_env(rng)?;
    let supported = env.render_modes();
    let render_mode = match render_mode {
        None => None,
        Some(name) => Some(
            name.parse::<RenderMode>()
                .ok()
                .filter(|mode| supported.contains(mode))
                .ok_or_else(|| BuildEnvError::UnsupportedRenderMode {
                    mode: name.to_string(),
                    supported: supported.iter().map(|mode| mode.as_str()).collect(),
                })?,
        ),
    };
    Ok(Box::new(EnvWithState::new(env, render_mode)))
}

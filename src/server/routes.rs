//! Request routing
use std::fmt;

/// HTTP request method.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Delete,
    Other,
}

impl From<&tiny_http::Method> for Method {
    fn from(method: &tiny_http::Method) -> Self {
        match method {
            tiny_http::Method::Get => Self::Get,
            tiny_http::Method::Post => Self::Post,
            tiny_http::Method::Delete => Self::Delete,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Delete => "DELETE",
            Self::Other => "OTHER",
        })
    }
}

/// An API endpoint with its path parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/v1/envs/`
    Envs,
    /// `/v1/envs/{id}/`
    Instance(String),
    /// `/v1/envs/{id}/reset/`
    Reset(String),
    /// `/v1/envs/{id}/render/`
    Render(String),
    /// `/v1/envs/{id}/step/`
    Step(String),
    /// `/v1/envs/{id}/action_space/`
    ActionSpace(String),
    /// `/v1/envs/{id}/action_space/sample/`
    ActionSample(String),
    /// `/v1/envs/{id}/action_space/contains/{x}/`
    ActionContains(String, String),
    /// `/v1/envs/{id}/observation_space/`
    ObservationSpace(String),
    /// `/v1/envs/{id}/observation_space/contains/`
    ObservationContains(String),
    /// `/v1/envs/{id}/transitions/`
    Transitions(String),
    /// `/v1/envs/{id}/episodes/`
    Episodes(String),
}

impl Route {
    /// Parse a request URL into a route.
    ///
    /// The query string is ignored and the trailing slash is optional.
    /// Path segments are percent-decoded.
    pub fn parse(url: &str) -> Option<Self> {
        let path = url.split(['?', '#']).next().unwrap_or_default();
        let path = path.strip_suffix('/').unwrap_or(path);
        let rest = path.strip_prefix("/v1/envs")?;
        if rest.is_empty() {
            return Some(Self::Envs);
        }
        let segments = rest
            .strip_prefix('/')?
            .split('/')
            .map(percent_decode)
            .collect::<Option<Vec<_>>>()?;
        if segments.iter().any(String::is_empty) {
            return None;
        }

        let route = match segments.as_slice() {
            [id] => Self::Instance(id.clone()),
            [id, endpoint] => {
                let id = id.clone();
                match endpoint.as_str() {
                    "reset" => Self::Reset(id),
                    "render" => Self::Render(id),
                    "step" => Self::Step(id),
                    "action_space" => Self::ActionSpace(id),
                    "observation_space" => Self::ObservationSpace(id),
                    "transitions" => Self::Transitions(id),
                    "episodes" => Self::Episodes(id),
                    _ => return None,
                }
            }
            [id, space, op] => match (space.as_str(), op.as_str()) {
                ("action_space", "sample") => Self::ActionSample(id.clone()),
                ("observation_space", "contains") => Self::ObservationContains(id.clone()),
                _ => return None,
            },
            [id, space, op, x] if space == "action_space" && op == "contains" => {
                Self::ActionContains(id.clone(), x.clone())
            }
            _ => return None,
        };
        Some(route)
    }

    /// Whether the route accepts a request method.
    pub fn allows(&self, method: Method) -> bool {
        match self {
            Self::Envs => matches!(method, Method::Get | Method::Post),
            Self::Instance(_) => matches!(method, Method::Get | Method::Delete),
            Self::Reset(_)
            | Self::Step(_)
            | Self::ObservationContains(_)
            | Self::Episodes(_) => method == Method::Post,
            Self::Render(_)
            | Self::ActionSpace(_)
            | Self::ActionSample(_)
            | Self::ActionContains(..)
            | Self::ObservationSpace(_)
            | Self::Transitions(_) => method == Method::Get,
        }
    }
}

/// Decode `%XX` escapes in a path segment.
///
/// Returns `None` for invalid escapes or if the result is not UTF-8.
fn percent_decode(segment: &str) -> Option<String> {
    let bytes = segment.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = segment.get(i + 1..i + 3)?;
            decoded.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            decoded.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(decoded).ok()
}

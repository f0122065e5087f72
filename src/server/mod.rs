//! HTTP server exposing environment instances
//!
//! Instances are created with `POST /v1/envs/` and addressed by their
//! instance ID under `/v1/envs/{id}/`.
mod api;
mod http;
mod instances;
mod jsonable;
mod params;
mod routes;

pub use api::{Api, EpisodeEvent, Reply};
pub use http::{BindError, Server, ServerHandle};
pub use instances::{Instance, InstanceTable};
pub use routes::{Method, Route};

//! Reinforcement learning environments served over HTTP.
//!
//! The [`server`] holds live environment instances keyed by short identifiers and exposes
//! them through a JSON REST API; the [`client`] issues the same calls from Rust.
//! Environments themselves live in [`envs`] with their [`spaces`] and [`render`] support.
#![warn(clippy::cast_lossless)]
#![warn(clippy::cast_possible_truncation)]
#![warn(clippy::doc_markdown)]
#![warn(clippy::explicit_iter_loop)]
#![warn(clippy::for_kv_map)]
#![warn(clippy::missing_const_for_fn)] // has some false positives
#![warn(clippy::needless_borrow)]
#![warn(clippy::needless_pass_by_value)]
#![warn(clippy::redundant_closure_for_method_calls)]
#![warn(clippy::use_self)] // also triggered by macro expansions
pub mod cli;
pub mod client;
pub mod config;
pub mod envs;
mod error;
pub mod logging;
pub mod render;
pub mod server;
pub mod spaces;

pub use client::{Client, ClientError, RemoteEnv};
pub use config::ServerConfig;
pub use envs::{make, EnvStructure, Environment, MakeOptions, StatefulEnvironment};
pub use error::ApiError;
pub use server::{Server, ServerHandle};

/// Pseudo-random number generator type used by environments.
pub type Prng = rand_chacha::ChaCha8Rng;

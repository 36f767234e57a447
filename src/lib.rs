//! # Codesage
//!
//! Code assistant backend: local heuristic analysis of source snippets plus
//! explanations and free-form answers from hosted language models.
//!
//! ## Modules
//!
//! - [`analyzer`] - Style findings, duplicate-function hints and a formatter
//! - [`cache`] - Bounded TTL cache for computed results
//! - [`gateway`] - Client for the hosted-model chat completions API
//! - [`server`] - HTTP/JSON API (`explain`, `analyze`, `infer`)
//! - [`ui`] - Browser page and terminal renderer
//! - [`cli`] - Command line interface
//! - [`types`] - Shared types (config, errors, requests, responses)

pub mod analyzer;
pub mod cache;
pub mod cli;
pub mod gateway;
pub mod server;
pub mod types;
pub mod ui;

pub use types::config::Config;
pub use types::errors::{CodesageError, CodesageResult, GatewayError};

//! Shared utilities: tracing setup and environment configuration helpers

pub mod config;
pub mod logging;

pub use config::{EnvError, env_any, env_parse_or, load_env_file, require_env};
pub use logging::{LogFormat, init_tracing, init_tracing_with};

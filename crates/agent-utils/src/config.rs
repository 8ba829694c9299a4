//! Environment-backed configuration helpers
//!
//! Configuration is read once at process start: an optional `.env` file is
//! loaded with `dotenvy`, then typed values are pulled from the environment.
//! Nothing here is cached; callers build their own config struct and share it.

use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Error reading configuration from the environment
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvError {
    /// None of the accepted variable names is set
    #[error("missing environment variable {0}")]
    Missing(String),

    /// The variable is set but does not parse
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },

    /// The `.env` file exists but cannot be read
    #[error("failed to load env file: {0}")]
    File(String),
}

/// Load a `.env` file into the process environment
///
/// With `path` set the file must exist. Without it the usual `.env` lookup
/// runs and a missing file is fine. Returns whether a file was loaded.
pub fn load_env_file(path: Option<&Path>) -> Result<bool, EnvError> {
    match path {
        Some(path) => dotenvy::from_path(path)
            .map(|()| true)
            .map_err(|e| EnvError::File(format!("{}: {e}", path.display()))),
        None => match dotenvy::dotenv() {
            Ok(_) => Ok(true),
            Err(e) if e.not_found() => Ok(false),
            Err(e) => Err(EnvError::File(e.to_string())),
        },
    }
}

/// First non-blank value among `keys`
pub fn env_any(keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| std::env::var(key).ok())
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

/// Required value, accepting any of `keys`
pub fn require_env(keys: &[&str]) -> Result<String, EnvError> {
    env_any(keys).ok_or_else(|| EnvError::Missing(keys.join(" or ")))
}

/// Parsed value of `key`, or `default` when unset
pub fn env_parse_or<T>(key: &str, default: T) -> Result<T, EnvError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_any(&[key]) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e: T::Err| EnvError::Invalid {
            key: key.to_string(),
            reason: e.to_string(),
        }),
    }
}

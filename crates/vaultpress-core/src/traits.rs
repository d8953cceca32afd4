//! Core traits shared across vaultpress crates.
//!
//! [`ConfigManager`] abstracts the load/locate/serialize operations that
//! the generic `config` subcommands need, so those handlers work for any
//! configuration type.

use std::path::PathBuf;

use serde::{de::DeserializeOwned, Serialize};

use crate::Result;

/// Configuration types that can be located, loaded, and written back.
///
/// # Bounds
///
/// - `Default`: `config init` writes the default configuration
/// - `Serialize + DeserializeOwned`: values are read and written as TOML
pub trait ConfigManager: Default + Serialize + DeserializeOwned + Clone + Send + Sync {
    /// Project name used in messages and default paths.
    fn project_name() -> &'static str;

    /// Default location of the config file, if the platform has one.
    fn default_config_path() -> Option<PathBuf>;

    /// Resolve the config path from an explicit flag, env var, or default.
    fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf>;

    /// Load configuration from file, environment, and defaults.
    fn load(config_path: Option<&str>) -> Result<Self>;

    /// Serialize to a pretty-printed TOML string.
    fn to_toml_string(&self) -> Result<String>;

    /// Flatten into `KEY=value` environment variable pairs.
    fn to_env_vars(&self) -> Result<Vec<(String, String)>>;
}

//! Handlers for the `config` subcommands.
//!
//! The handlers are generic over [`ConfigManager`], so they only know how to
//! locate, load, and serialize a configuration. `config set` edits the file
//! in place with `toml_edit`, keeping comments and key order.

use std::path::PathBuf;

use toml_edit::DocumentMut;
use vaultpress_core::traits::ConfigManager;
use vaultpress_core::{Error, Result};

use crate::cli::ConfigAction;
use crate::config::VaultpressConfig;

// ============================================================================
// Command dispatch
// ============================================================================

pub fn handle_config_command(config_path: Option<&str>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Path => cmd_config_path::<VaultpressConfig>(config_path),
        ConfigAction::Get { key } => cmd_config_get::<VaultpressConfig>(config_path, &key),
        ConfigAction::Set { key, value } => {
            cmd_config_set::<VaultpressConfig>(config_path, &key, &value)
        }
        ConfigAction::Init { file, force } => {
            cmd_config_init::<VaultpressConfig>(file.as_deref(), force)
        }
        ConfigAction::Export { docker_env } => {
            let config = VaultpressConfig::load(config_path)?;
            cmd_config_export(&config, docker_env)
        }
    }
}

// ============================================================================
// Generic command handlers
// ============================================================================

/// Show the resolved config file path.
pub fn cmd_config_path<C: ConfigManager>(config_path: Option<&str>) -> Result<()> {
    let path = C::resolve_config_path(config_path)
        .ok_or_else(|| Error::config("Could not determine config directory for this platform"))?;
    println!("{}", path.display());
    if !path.exists() {
        eprintln!(
            "(file does not exist; run `{} config init` to create it)",
            C::project_name()
        );
    }
    Ok(())
}

/// Look up a dotted key in the loaded configuration.
pub fn config_value<C: ConfigManager>(config_path: Option<&str>, key: &str) -> Result<String> {
    let config = C::load(config_path)?;
    let value = toml::Value::try_from(&config).map_err(|e| Error::config(e.to_string()))?;
    get_nested_value(&value, key)
        .map(format_toml_value)
        .ok_or_else(|| Error::config(format!("Key '{key}' not found in configuration")))
}

/// Print a configuration value by dotted key.
pub fn cmd_config_get<C: ConfigManager>(config_path: Option<&str>, key: &str) -> Result<()> {
    println!("{}", config_value::<C>(config_path, key)?);
    Ok(())
}

/// Set a configuration value by dotted key in the config file.
///
/// The edited file must still load as `C`; otherwise nothing is written.
pub fn cmd_config_set<C: ConfigManager>(config_path: Option<&str>, key: &str, value: &str) -> Result<()> {
    let path = C::resolve_config_path(config_path)
        .ok_or_else(|| Error::config("Could not determine config directory"))?;
    if !path.exists() {
        return Err(Error::config(format!(
            "Config file does not exist at {}. Run `{} config init` first.",
            path.display(),
            C::project_name()
        )));
    }

    let content = std::fs::read_to_string(&path).map_err(|e| Error::io_with_path(e, &path))?;
    let mut doc: DocumentMut = content
        .parse()
        .map_err(|e| Error::config(format!("Failed to parse {}: {e}", path.display())))?;

    set_nested_value(&mut doc, key, parse_value(value))?;

    let updated = doc.to_string();
    toml::from_str::<C>(&updated)
        .map_err(|e| Error::config(format!("Refusing to set {key} = {value}: {e}")))?;
    std::fs::write(&path, updated).map_err(|e| Error::io_with_path(e, &path))?;

    println!("Set {key} = {value} in {}", path.display());
    Ok(())
}

/// Create a default configuration file.
pub fn cmd_config_init<C: ConfigManager>(file: Option<&str>, force: bool) -> Result<()> {
    let path = match file {
        Some(p) => PathBuf::from(p),
        None => C::default_config_path()
            .ok_or_else(|| Error::config("Could not determine config directory"))?,
    };

    if path.exists() && !force {
        return Err(Error::config(format!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        )));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::io_with_path(e, parent))?;
    }

    let toml_str = C::default().to_toml_string()?;
    std::fs::write(&path, &toml_str).map_err(|e| Error::io_with_path(e, &path))?;

    println!("Config file created at {}", path.display());
    Ok(())
}

/// Export configuration as environment variables.
pub fn cmd_config_export<C: ConfigManager>(config: &C, docker_env: bool) -> Result<()> {
    for (key, value) in config.to_env_vars()? {
        if docker_env {
            println!("--env {key}={value}");
        } else {
            println!("{key}={value}");
        }
    }
    Ok(())
}

// ============================================================================
// Dotted-key helpers
// ============================================================================

/// Navigate a dotted key path in a TOML value tree.
pub fn get_nested_value<'a>(value: &'a toml::Value, key: &str) -> Option<&'a toml::Value> {
    key.split('.')
        .try_fold(value, |current, part| current.as_table()?.get(part))
}

/// Set a value at a dotted key path, creating intermediate tables as needed.
pub fn set_nested_value(doc: &mut DocumentMut, key: &str, value: toml_edit::Value) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();
    let Some((last, parents)) = parts.split_last() else {
        return Err(Error::config("Empty key path"));
    };
    if parts.iter().any(|part| part.trim().is_empty()) {
        return Err(Error::config(format!("Invalid key path '{key}'")));
    }

    let mut table = doc.as_table_mut();
    for part in parents {
        table = table
            .entry(part)
            .or_insert_with(toml_edit::table)
            .as_table_mut()
            .ok_or_else(|| Error::config(format!("Cannot navigate into non-table key '{part}'")))?;
    }
    table.insert(last, toml_edit::value(value));
    Ok(())
}

/// Parse a string value into a TOML value, auto-detecting the type.
///
/// Priority: bool, then integer, then float, then string.
pub fn parse_value(s: &str) -> toml_edit::Value {
    match s {
        "true" => return true.into(),
        "false" => return false.into(),
        _ => {}
    }
    if let Ok(i) = s.parse::<i64>() {
        return i.into();
    }
    if let Ok(f) = s.parse::<f64>()
        && f.is_finite()
    {
        return f.into();
    }
    s.into()
}

/// Format a TOML value for display on stdout.
pub fn format_toml_value(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Array(_) | toml::Value::Table(_) => {
            toml::to_string_pretty(value).unwrap_or_else(|_| format!("{value:?}"))
        }
        other => other.to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================

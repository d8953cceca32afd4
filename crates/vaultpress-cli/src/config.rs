//! Configuration for the vaultpress CLI.
//!
//! [`VaultpressConfig`] loads from a TOML file, environment variables, and
//! defaults using the `confyg` crate.
//!
//! # Loading Priority
//!
//! 1. Explicit `--config <path>` flag
//! 2. `VAULTPRESS_CONFIG` environment variable
//! 3. XDG default: `~/.config/vaultpress/config.toml`
//! 4. Built-in defaults
//!
//! Relative paths in the file resolve against the file's directory; `~` is
//! expanded everywhere.

use std::path::{Path, PathBuf};
use std::time::Duration;

use confyg::{Confygery, env};
use serde::{Deserialize, Serialize};
use vaultpress_content::newsletter::DEFAULT_NEWSLETTER_DIR;
use vaultpress_core::traits::ConfigManager;
use vaultpress_core::{Error, Result, expand_tilde, resolve_against};
use vaultpress_sync::publish::{DEFAULT_MAX_OUTPUT_BYTES, DEFAULT_TIMEOUT};
use vaultpress_sync::{FilterConfig, GitPublisher, SyncConfig, SyncOptions};

const ENV_PREFIX: &str = "VAULTPRESS";

// ============================================================================
// Configuration structs
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultpressConfig {
    pub vault: VaultConfig,
    pub content: ContentConfig,
    pub sync: SyncOptions,
    pub filters: FilterConfig,
    pub publish: PublishConfig,

    /// Directory of the file this config was loaded from.
    #[serde(skip)]
    pub config_dir: Option<PathBuf>,
}

/// The Obsidian vault.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    pub path: Option<String>,
    /// Table file, relative to `path`.
    pub table_file: String,
}

/// The site content root that synced files land in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    pub path: Option<String>,
}

/// The site repository that newsletters are published from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    pub repo_root: Option<String>,
    /// Newsletter directory, relative to `repo_root`.
    pub newsletter_dir: String,
    pub remote: String,
    pub branch: String,
    pub git_binary: String,
    pub timeout_secs: u64,
    pub max_output_bytes: usize,
}

// ============================================================================
// Default implementations
// ============================================================================

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            path: None,
            table_file: "资讯汇总.md".to_string(),
        }
    }
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            repo_root: None,
            newsletter_dir: DEFAULT_NEWSLETTER_DIR.to_string(),
            remote: "origin".to_string(),
            branch: "main".to_string(),
            git_binary: "git".to_string(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }
}

// ============================================================================
// Resolved paths
// ============================================================================

fn required<'a>(value: &'a Option<String>, key: &str) -> Result<&'a str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::config(format!("{key} is not set; run `vaultpress config set {key} <path>`")))
}

impl VaultpressConfig {
    /// Expand `~` and resolve `path` against the config file's directory.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        let expanded = expand_tilde(path);
        match &self.config_dir {
            Some(dir) => resolve_against(dir, expanded),
            None => expanded,
        }
    }

    pub fn vault_path(&self) -> Result<PathBuf> {
        Ok(self.resolve_path(required(&self.vault.path, "vault.path")?))
    }

    /// The table file: `explicit` if given, else `vault.table_file` in the vault.
    pub fn table_path(&self, explicit: Option<&str>) -> Result<PathBuf> {
        match explicit {
            Some(path) => Ok(expand_tilde(path)),
            None => Ok(self.vault_path()?.join(&self.vault.table_file)),
        }
    }

    pub fn content_path(&self) -> Result<PathBuf> {
        Ok(self.resolve_path(required(&self.content.path, "content.path")?))
    }

    pub fn repo_root(&self) -> Result<PathBuf> {
        Ok(self.resolve_path(required(&self.publish.repo_root, "publish.repo_root")?))
    }

    /// Where newsletter issues are saved.
    pub fn newsletter_path(&self) -> Result<PathBuf> {
        Ok(self.repo_root()?.join(&self.publish.newsletter_dir))
    }

    pub fn sync_config(&self) -> Result<SyncConfig> {
        Ok(SyncConfig {
            vault_path: self.vault_path()?,
            content_path: self.content_path()?,
            options: self.sync.clone(),
        })
    }

    pub fn publisher(&self) -> Result<GitPublisher> {
        let publish = &self.publish;
        Ok(GitPublisher::new(self.repo_root()?)
            .with_newsletter_dir(&publish.newsletter_dir)
            .with_remote(&publish.remote, &publish.branch)
            .with_timeout(Duration::from_secs(publish.timeout_secs))
            .with_git_binary(&publish.git_binary)
            .with_max_output_bytes(publish.max_output_bytes))
    }
}

// ============================================================================
// Config loading
// ============================================================================

impl ConfigManager for VaultpressConfig {
    fn project_name() -> &'static str {
        "vaultpress"
    }

    fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("vaultpress").join("config.toml"))
    }

    fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(PathBuf::from(path));
        }
        if let Ok(path) = std::env::var("VAULTPRESS_CONFIG") {
            return Some(PathBuf::from(path));
        }
        Self::default_config_path()
    }

    fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder =
            Confygery::new().map_err(|e| Error::config(format!("config init: {e}")))?;

        let mut config_dir = None;
        if let Some(path) = Self::resolve_config_path(config_path)
            && path.exists()
        {
            builder
                .add_file(&path.to_string_lossy())
                .map_err(|e| Error::config(format!("config file: {e}")))?;
            config_dir = path.parent().map(Path::to_path_buf);
            log::debug!("Loading config from {}", path.display());
        }

        let mut env_opts = env::Options::with_top_level(ENV_PREFIX);
        for section in ["vault", "content", "sync", "filters", "publish"] {
            env_opts.add_section(section);
        }
        builder
            .add_env(env_opts)
            .map_err(|e| Error::config(format!("config env: {e}")))?;

        let mut config: Self = builder
            .build()
            .map_err(|e| Error::config(format!("config build: {e}")))?;
        config.config_dir = config_dir;
        Ok(config)
    }

    fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    fn to_env_vars(&self) -> Result<Vec<(String, String)>> {
        let value = toml::Value::try_from(self).map_err(|e| Error::config(e.to_string()))?;
        let mut vars = Vec::new();
        flatten_toml_value(&value, ENV_PREFIX, &mut vars);
        Ok(vars)
    }
}

/// Recursively flatten a TOML value into `KEY=value` pairs.
fn flatten_toml_value(value: &toml::Value, prefix: &str, out: &mut Vec<(String, String)>) {
    match value {
        toml::Value::Table(table) => {
            for (key, val) in table {
                flatten_toml_value(val, &format!("{prefix}_{}", key.to_uppercase()), out);
            }
        }
        toml::Value::Array(arr) => {
            if let Ok(json) = serde_json::to_string(arr) {
                out.push((prefix.to_string(), json));
            }
        }
        toml::Value::String(s) => out.push((prefix.to_string(), s.clone())),
        other => out.push((prefix.to_string(), other.to_string())),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use vaultpress_sync::SyncMode;

    const SAMPLE: &str = r#"
[vault]
path = "vault"
table_file = "表格.md"

[content]
path = "/srv/site/内容"

[sync]
mode = "generate"
incremental = false

[filters]
tags = ["AI"]
min_score = 7.5

[filters.date_range]
custom = "最近7天"

[publish]
repo_root = "~/site"
branch = "release"
"#;

    fn write_sample() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        (dir, path)
    }

    // ------------------------------------------------------------------------
    // Default tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_default_config() {
        let config = VaultpressConfig::default();
        assert!(config.vault.path.is_none());
        assert_eq!(config.vault.table_file, "资讯汇总.md");
        assert_eq!(config.sync.mode, SyncMode::Copy);
        assert!(config.sync.preserve_structure);
        assert!(config.filters.is_empty());
        assert_eq!(config.publish.remote, "origin");
        assert_eq!(config.publish.timeout_secs, 60);
        assert_eq!(config.publish.max_output_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_missing_paths_are_config_errors() {
        let config = VaultpressConfig::default();
        let err = config.vault_path().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("vault.path"));
        assert!(config.sync_config().is_err());
        assert!(config.publisher().is_err());
    }

    // ------------------------------------------------------------------------
    // Serialization tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_config_from_toml() {
        let config: VaultpressConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.vault.table_file, "表格.md");
        assert_eq!(config.sync.mode, SyncMode::Generate);
        assert!(!config.sync.incremental);
        assert!(config.sync.sync_attachments);
        assert_eq!(config.filters.min_score, Some(7.5));
        assert_eq!(
            config.filters.date_range.as_ref().unwrap().custom.as_deref(),
            Some("最近7天")
        );
        assert_eq!(config.publish.branch, "release");
        assert_eq!(config.publish.remote, "origin");
    }

    #[test]
    fn test_config_to_toml_round_trip() {
        let config = VaultpressConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        assert!(toml_str.contains("[publish]"));
        assert!(toml_str.contains("mode = \"copy\""));
        let parsed: VaultpressConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.publish.newsletter_dir, DEFAULT_NEWSLETTER_DIR);
    }

    #[test]
    fn test_to_env_vars() {
        let config: VaultpressConfig = toml::from_str(SAMPLE).unwrap();
        let vars = config.to_env_vars().unwrap();
        let get = |key: &str| {
            vars.iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("VAULTPRESS_SYNC_MODE"), Some("generate"));
        assert_eq!(get("VAULTPRESS_FILTERS_TAGS"), Some(r#"["AI"]"#));
        assert_eq!(get("VAULTPRESS_PUBLISH_TIMEOUT_SECS"), Some("60"));
        assert_eq!(get("VAULTPRESS_FILTERS_DATE_RANGE_CUSTOM"), Some("最近7天"));
    }

    // ------------------------------------------------------------------------
    // Loading tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_load_resolves_relative_paths() {
        let (dir, path) = write_sample();
        let config = VaultpressConfig::load(Some(path.to_str().unwrap())).unwrap();

        assert_eq!(config.vault_path().unwrap(), dir.path().join("vault"));
        assert_eq!(
            config.table_path(None).unwrap(),
            dir.path().join("vault").join("表格.md")
        );
        assert_eq!(config.content_path().unwrap(), PathBuf::from("/srv/site/内容"));
        assert!(!config.repo_root().unwrap().starts_with("~"));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = VaultpressConfig::load(Some("/nonexistent/vaultpress.toml")).unwrap();
        assert!(config.config_dir.is_none());
        assert_eq!(config.publish.branch, "main");
    }

    #[test]
    fn test_explicit_table_path_wins() {
        let config = VaultpressConfig::default();
        assert_eq!(config.table_path(Some("/tmp/t.md")).unwrap(), PathBuf::from("/tmp/t.md"));
    }

    #[test]
    fn test_publisher_from_config() {
        let (dir, path) = write_sample();
        let mut config = VaultpressConfig::load(Some(path.to_str().unwrap())).unwrap();
        config.publish.repo_root = Some("site".to_string());
        let publisher = config.publisher().unwrap();
        assert_eq!(publisher.repo_root, dir.path().join("site"));
        assert_eq!(publisher.branch, "release");
        assert_eq!(publisher.timeout, Duration::from_secs(60));
        assert_eq!(
            config.newsletter_path().unwrap(),
            dir.path().join("site").join(DEFAULT_NEWSLETTER_DIR)
        );
    }

    #[test]
    fn test_resolve_config_path_explicit() {
        assert_eq!(
            VaultpressConfig::resolve_config_path(Some("/explicit/config.toml")),
            Some(PathBuf::from("/explicit/config.toml"))
        );
    }
}

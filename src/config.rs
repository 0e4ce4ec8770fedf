//! Configuration management for doclassify.
//!
//! Settings come from an optional config file (TOML, YAML or JSON, chosen by
//! extension) with `DOCLASSIFY_*` environment variables layered on top.
//! Provider credentials are never stored here; they are read from the
//! environment when a backend is resolved.

use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::classify::CategorySet;
use crate::llm::{Provider, ProviderConfig, ProviderOverrides, DEFAULT_TIMEOUT_SECS};
use crate::pipeline::FailurePolicy;

/// Config file looked up in the working directory.
pub const CONFIG_FILENAME: &str = "doclassify.toml";

/// Default input directory when neither config nor CLI names one.
pub const DEFAULT_INPUT_DIR: &str = "~/Downloads";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {format} config {}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        format: &'static str,
        message: String,
    },
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory searched for documents.
    #[serde(default = "default_input_dir")]
    pub input_dir: String,

    /// Backend used for summarization. Classification picks its own.
    #[serde(default)]
    pub summary_provider: Provider,

    /// Per-request timeout for backend calls, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub on_backend_error: FailurePolicy,

    /// Endpoint/model overrides keyed by provider name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub providers: BTreeMap<String, ProviderOverrides>,

    #[serde(default)]
    pub categories: CategorySet,

    /// Path the config was loaded from, if any.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

fn default_input_dir() -> String {
    DEFAULT_INPUT_DIR.to_string()
}

fn default_request_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            summary_provider: Provider::default(),
            request_timeout_secs: default_request_timeout(),
            on_backend_error: FailurePolicy::default(),
            providers: BTreeMap::new(),
            categories: CategorySet::default(),
            source_path: None,
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// Priority: `explicit` path, then `./doclassify.toml`, then
    /// `<config_dir>/doclassify/config.toml`, then built-in defaults.
    /// Environment overrides are applied in every case.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match explicit {
            Some(path) => Self::load_from_path(path)?,
            None => match find_config_file() {
                Some(path) => {
                    debug!("Using config file {}", path.display());
                    Self::load_from_path(&path)?
                }
                None => {
                    debug!("No config file found, using defaults");
                    Self::default()
                }
            },
        };

        Ok(config.with_env_overrides())
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");
        let parse_error = |format: &'static str, message: String| ConfigError::Parse {
            path: path.to_path_buf(),
            format,
            message,
        };

        let mut config: Config = match ext {
            "json" => {
                serde_json::from_str(&contents).map_err(|e| parse_error("JSON", e.to_string()))?
            }
            "yaml" | "yml" => {
                serde_yaml::from_str(&contents).map_err(|e| parse_error("YAML", e.to_string()))?
            }
            _ => toml::from_str(&contents).map_err(|e| parse_error("TOML", e.to_string()))?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Apply `DOCLASSIFY_*` environment overrides.
    pub fn with_env_overrides(self) -> Self {
        self.apply_env(|name| env::var(name).ok())
    }

    /// Apply overrides read through `lookup`. Unparseable values are ignored
    /// with a warning.
    pub fn apply_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if let Some(dir) = get("DOCLASSIFY_INPUT_DIR") {
            self.input_dir = dir;
        }

        if let Some(value) = get("DOCLASSIFY_SUMMARY_PROVIDER") {
            match Provider::from_str(&value) {
                Some(provider) => self.summary_provider = provider,
                None => warn!("Ignoring unknown DOCLASSIFY_SUMMARY_PROVIDER '{}'", value),
            }
        }

        if let Some(value) = get("DOCLASSIFY_REQUEST_TIMEOUT") {
            match value.parse::<u64>() {
                Ok(secs) if secs > 0 => self.request_timeout_secs = secs,
                _ => warn!("Ignoring invalid DOCLASSIFY_REQUEST_TIMEOUT '{}'", value),
            }
        }

        if let Some(value) = get("DOCLASSIFY_ON_BACKEND_ERROR") {
            match FailurePolicy::from_str(&value) {
                Some(policy) => self.on_backend_error = policy,
                None => warn!("Ignoring unknown DOCLASSIFY_ON_BACKEND_ERROR '{}'", value),
            }
        }

        self
    }

    /// Get the base directory for resolving relative paths.
    /// Returns the config file's parent directory if available, otherwise None.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Input directory with `~` expanded. Relative paths resolve against the
    /// config file's directory, or the working directory without one.
    pub fn input_dir(&self) -> PathBuf {
        let base = self.base_dir().unwrap_or_else(|| PathBuf::from("."));
        resolve_path(&self.input_dir, &base)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Overrides configured for `provider`, if any.
    pub fn provider_overrides(&self, provider: Provider) -> Option<&ProviderOverrides> {
        self.providers.get(provider.as_str())
    }

    /// Resolve `provider` against this config and the process environment.
    pub fn provider_config(&self, provider: Provider) -> ProviderConfig {
        ProviderConfig::from_env(provider, self.provider_overrides(provider))
    }
}

/// Expand `~` and make `path_str` absolute against `base_dir` when relative.
pub fn resolve_path(path_str: &str, base_dir: &Path) -> PathBuf {
    let expanded = shellexpand::tilde(path_str);
    let path = Path::new(expanded.as_ref());

    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// User-level config file location.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("doclassify").join("config.toml"))
}

fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILENAME);
    if local.is_file() {
        return Some(local);
    }
    user_config_path().filter(|p| p.is_file())
}

//! Service configuration loading
//!
//! Every setting is resolved independently in this priority order:
//! 1. Command-line flag or `CUE_*` environment variable (handled by clap in the binary)
//! 2. TOML config file
//! 3. Compiled default (fallback)
//!
//! A missing or unreadable TOML file never stops startup: a warning is logged
//! and the compiled defaults are used.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit TOML config file
pub const CONFIG_ENV_VAR: &str = "CUE_CONFIG";

/// Compiled defaults used when neither CLI nor TOML provide a value
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
    pub session_ttl_secs: u64,
    pub log_level: String,
}

impl Default for CompiledDefaults {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            max_upload_bytes: 20 * 1024 * 1024,
            session_ttl_secs: 3600,
            log_level: "info".to_string(),
        }
    }
}

/// Contents of `config.toml`; every key is optional
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct TomlConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub max_upload_bytes: Option<usize>,
    pub session_ttl_secs: Option<u64>,
    pub log_level: Option<String>,
}

/// Values supplied on the command line (or through their `CUE_*` env fallbacks)
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub max_upload_bytes: Option<usize>,
    pub session_ttl_secs: Option<u64>,
    pub log_level: Option<String>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound for a single multipart upload body
    pub max_upload_bytes: usize,
    /// Idle sessions older than this are evicted
    pub session_ttl_secs: u64,
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::merge(&ConfigOverrides::default(), &TomlConfig::default())
    }
}

impl ServiceConfig {
    /// Resolve configuration from CLI overrides and an optional TOML file
    ///
    /// `explicit_path` is the `--config` flag; when absent the `CUE_CONFIG`
    /// variable and then the platform config directory are consulted.
    pub fn resolve(overrides: &ConfigOverrides, explicit_path: Option<&Path>) -> Self {
        let toml_config = match locate_config_file(explicit_path) {
            Some(path) => match load_toml_config(&path) {
                Ok(config) => {
                    info!("Loaded config file: {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("Ignoring config file {}: {}", path.display(), e);
                    TomlConfig::default()
                }
            },
            None => TomlConfig::default(),
        };

        Self::merge(overrides, &toml_config)
    }

    /// Combine the three tiers field by field
    pub fn merge(overrides: &ConfigOverrides, toml_config: &TomlConfig) -> Self {
        let defaults = CompiledDefaults::default();

        Self {
            host: overrides
                .host
                .clone()
                .or_else(|| toml_config.host.clone())
                .unwrap_or(defaults.host),
            port: overrides.port.or(toml_config.port).unwrap_or(defaults.port),
            max_upload_bytes: overrides
                .max_upload_bytes
                .or(toml_config.max_upload_bytes)
                .unwrap_or(defaults.max_upload_bytes),
            session_ttl_secs: overrides
                .session_ttl_secs
                .or(toml_config.session_ttl_secs)
                .unwrap_or(defaults.session_ttl_secs),
            log_level: overrides
                .log_level
                .clone()
                .or_else(|| toml_config.log_level.clone())
                .unwrap_or(defaults.log_level),
        }
    }

    /// Socket address string for `TcpListener::bind`
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))
}

/// Default config file location for the platform
///
/// `~/.config/cue-tools/config.toml` on Linux, the equivalent user config
/// directory on macOS and Windows.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("cue-tools").join("config.toml"))
}

/// Find the config file to load, if any
///
/// An explicit path or `CUE_CONFIG` is returned even when the file is missing,
/// so the caller can warn about it. The platform default is only returned when
/// it exists.
pub fn locate_config_file(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    default_config_path().filter(|p| p.exists())
}

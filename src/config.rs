//! Bridge configuration
//!
//! Loaded from a TOML file or from `HOSTLINK_*` environment variables.
//! Every field has a default, so an empty file is a valid configuration.

use crate::error::ConfigError;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

static CONFIG: OnceCell<BridgeConfig> = OnceCell::new();

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub log: LogConfig,

    #[serde(default)]
    pub dispatch: DispatchConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// `EnvFilter` directive, e.g. `"info"` or `"dispatch=trace,info"`
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default = "default_false")]
    pub json_format: bool,

    /// Emit span open/close events
    #[serde(default = "default_false")]
    pub show_spans: bool,

    /// Write to this file instead of stderr
    #[serde(default)]
    pub log_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Cache resolved method binds per (class, method)
    #[serde(default = "default_true")]
    pub method_cache: bool,

    /// Cache resolved utility function pointers per name
    #[serde(default = "default_true")]
    pub utility_cache: bool,

    /// Log rejected calls at debug level
    #[serde(default = "default_true")]
    pub log_failed_calls: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json_format: false,
            show_spans: false,
            log_path: None,
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            method_cache: true,
            utility_cache: true,
            log_failed_calls: true,
        }
    }
}

fn default_level() -> String { "info".to_string() }
fn default_true() -> bool { true }
fn default_false() -> bool { false }

fn env_flag(value: &str) -> bool {
    !matches!(value.trim().to_lowercase().as_str(), "" | "0" | "false" | "off" | "no")
}

impl LogConfig {
    /// Defaults overridden by `HOSTLINK_LOG_*`
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    fn apply_env(&mut self) {
        // HOSTLINK_LOG_LEVEL: any EnvFilter directive
        if let Ok(level) = std::env::var("HOSTLINK_LOG_LEVEL") {
            self.level = level;
        }
        if let Ok(path) = std::env::var("HOSTLINK_LOG_FILE") {
            self.log_path = Some(PathBuf::from(path));
        }
        if let Ok(value) = std::env::var("HOSTLINK_LOG_JSON") {
            self.json_format = env_flag(&value);
        }
        if let Ok(value) = std::env::var("HOSTLINK_LOG_SPANS") {
            self.show_spans = env_flag(&value);
        }
    }
}

impl BridgeConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Defaults overridden by `HOSTLINK_*` environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Apply `HOSTLINK_*` overrides on top of this configuration
    pub fn apply_env(&mut self) {
        self.log.apply_env();
        if let Ok(value) = std::env::var("HOSTLINK_METHOD_CACHE") {
            self.dispatch.method_cache = env_flag(&value);
        }
    }
}

/// Install the process-wide configuration; the first call wins
pub(crate) fn install(config: BridgeConfig) -> &'static BridgeConfig {
    CONFIG.get_or_init(|| config)
}

/// Active configuration (environment defaults until `initialize_with_config`)
pub fn current() -> &'static BridgeConfig {
    CONFIG.get_or_init(BridgeConfig::from_env)
}

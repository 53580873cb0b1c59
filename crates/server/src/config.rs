//! Configuration management for the Coloring Gallery server.
//!
//! This module provides TOML-based configuration file loading and saving.
//! The default configuration path is `~/.config/coloring-gallery/config.toml`.

use std::fs;
use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use gallery::{
    AllowedExtensions, GallerySettings, DEFAULT_ALLOWED_EXTENSIONS, DEFAULT_MAX_UPLOAD_SIZE,
    DEFAULT_PAGE_SIZE,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default listen address.
pub const DEFAULT_BIND: &str = "0.0.0.0:5000";

/// Largest page size accepted by validation.
pub const MAX_PAGE_SIZE: usize = 1000;

pub const ENV_BIND: &str = "COLORING_GALLERY_BIND";
pub const ENV_LOG_LEVEL: &str = "COLORING_GALLERY_LOG_LEVEL";
pub const ENV_SOURCE_DIR: &str = "COLORING_GALLERY_SOURCE_DIR";
pub const ENV_SAVED_DIR: &str = "COLORING_GALLERY_SAVED_DIR";

/// An environment variable that replaced a configured value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvOverride {
    pub variable: &'static str,
    pub value: String,
}

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("bind must be a socket address like 0.0.0.0:5000, got {0}")]
    InvalidBind(String),

    #[error("max_size must be greater than 0, got {0}")]
    InvalidMaxSize(u64),

    #[error("page_size must be between 1 and 1000, got {0}")]
    InvalidPageSize(usize),

    #[error("allowed_extensions must not be empty")]
    NoExtensions,

    #[error("allowed extension must be a bare suffix like png, got {0:?}")]
    InvalidExtension(String),

    #[error("source_dir and saved_dir must differ, both are {}", .0.display())]
    SameRoots(PathBuf),

    #[error("log_level must be one of: trace, debug, info, warn, error; got {0}")]
    InvalidLogLevel(String),
}

/// Valid log level values for tracing configuration.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Main configuration structure for the gallery server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    /// HTTP server and logging configuration.
    pub server: ServerConfig,

    /// Gallery directories.
    pub storage: StorageConfig,

    /// Upload limits.
    pub upload: UploadConfig,

    /// Listing configuration.
    pub gallery: ListingConfig,
}

/// HTTP server and logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind: String,

    /// Logging level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Directory for rolling log files. Console only when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
}

/// Gallery directories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the coloring book source images.
    pub source_dir: PathBuf,

    /// Directory receiving uploaded images.
    pub saved_dir: PathBuf,
}

/// Upload limits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UploadConfig {
    /// Maximum upload size in bytes (default: 16MB).
    pub max_size: u64,

    /// File extensions accepted for listing and upload.
    pub allowed_extensions: Vec<String>,
}

/// Listing configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ListingConfig {
    /// Images per page.
    pub page_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            log_level: "info".to_string(),
            log_dir: None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("static").join("images"),
            saved_dir: PathBuf::from("static").join("saved"),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_UPLOAD_SIZE,
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
        }
    }
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Returns the default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("coloring-gallery")
        .join("config.toml")
}

impl Config {
    /// Apply environment variable overrides to the configuration.
    ///
    /// Environment variables take precedence over config file values.
    /// Supported variables:
    /// - COLORING_GALLERY_BIND: Override listen address
    /// - COLORING_GALLERY_LOG_LEVEL: Override log level
    /// - COLORING_GALLERY_SOURCE_DIR: Override source image directory
    /// - COLORING_GALLERY_SAVED_DIR: Override saved image directory
    ///
    /// Returns the overrides that were applied. Logging is usually not set up
    /// yet at this point, so the caller reports them once it is.
    pub fn apply_env_overrides(&mut self) -> Vec<EnvOverride> {
        let mut applied = Vec::new();

        if let Some(bind) = env_override(ENV_BIND, &mut applied) {
            self.server.bind = bind;
        }

        if let Some(level) = env_override(ENV_LOG_LEVEL, &mut applied) {
            self.server.log_level = level;
        }

        if let Some(dir) = env_override(ENV_SOURCE_DIR, &mut applied) {
            self.storage.source_dir = PathBuf::from(dir);
        }

        if let Some(dir) = env_override(ENV_SAVED_DIR, &mut applied) {
            self.storage.saved_dir = PathBuf::from(dir);
        }

        applied
    }

    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.bind.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::InvalidBind(self.server.bind.clone()));
        }

        if self.upload.max_size == 0 {
            return Err(ConfigError::InvalidMaxSize(self.upload.max_size));
        }

        if self.gallery.page_size < 1 || self.gallery.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::InvalidPageSize(self.gallery.page_size));
        }

        if self.upload.allowed_extensions.is_empty() {
            return Err(ConfigError::NoExtensions);
        }

        for ext in &self.upload.allowed_extensions {
            let bare = ext.trim_start_matches('.');
            if bare.is_empty() || bare.contains(['.', '/', '\\']) {
                return Err(ConfigError::InvalidExtension(ext.clone()));
            }
        }

        if self.storage.source_dir == self.storage.saved_dir {
            return Err(ConfigError::SameRoots(self.storage.source_dir.clone()));
        }

        let level = self.server.log_level.to_lowercase();
        if !VALID_LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(self.server.log_level.clone()));
        }

        Ok(())
    }

    /// Parsed listen address.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server
            .bind
            .parse()
            .map_err(|_| ConfigError::InvalidBind(self.server.bind.clone()))
    }

    /// Build the immutable settings consumed by the gallery core.
    pub fn to_settings(&self) -> Result<GallerySettings, ConfigError> {
        let page_size = NonZeroUsize::new(self.gallery.page_size)
            .ok_or(ConfigError::InvalidPageSize(self.gallery.page_size))?;

        Ok(
            GallerySettings::new(&self.storage.source_dir, &self.storage.saved_dir)
                .with_extensions(AllowedExtensions::new(&self.upload.allowed_extensions))
                .with_max_upload_size(self.upload.max_size)
                .with_page_size(page_size),
        )
    }

    /// Load configuration from a file.
    ///
    /// If the file does not exist, returns the default configuration.
    /// If the file exists but is invalid TOML, returns an error with
    /// a helpful message.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str)
            .map_err(|e| anyhow::anyhow!("Invalid TOML configuration: {}", format_toml_error(&e)))
    }

    /// Save configuration to a file.
    ///
    /// Creates parent directories if they don't exist.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = self.to_toml()?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::debug!("Configuration saved to {:?}", path);
        Ok(())
    }

    /// Serialize configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")
    }
}

fn env_override(variable: &'static str, applied: &mut Vec<EnvOverride>) -> Option<String> {
    let value = std::env::var(variable).ok().filter(|v| !v.is_empty())?;
    applied.push(EnvOverride {
        variable,
        value: value.clone(),
    });
    Some(value)
}

/// Format a TOML deserialization error for user-friendly display.
fn format_toml_error(error: &toml::de::Error) -> String {
    let mut msg = error.message().to_string();

    if let Some(span) = error.span() {
        msg.push_str(&format!(" (at position {}..{})", span.start, span.end));
    }

    msg
}

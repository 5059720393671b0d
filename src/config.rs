//! Application configuration management.
//!
//! Configuration is layered with figment, lowest priority first:
//!
//! 1. Built-in defaults ([`Config::default`])
//! 2. TOML config file (`--config PATH`, or the platform config directory)
//! 3. Environment variables prefixed with `TMPLMERGE_` (`__` for nesting)
//! 4. Command-line flags ([`ConfigOverrides`])

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::chunk::{DEFAULT_CHUNK_PREFIX, DEFAULT_CHUNK_SIZE};
use crate::scanner::path_utils::{normalize_extensions, resolve_path};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "TMPLMERGE_";

/// Errors raised while loading or validating configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// A provider failed to parse or extract.
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Source roots, scanned in order.
    pub sources: Vec<PathBuf>,
    /// Flat corpus directory.
    pub target: PathBuf,
    /// Accepted extensions (case-insensitive, dot optional).
    pub extensions: Vec<String>,
    /// Maximum files per chunk.
    pub chunk_size: usize,
    /// Chunk directory name prefix.
    pub chunk_prefix: String,
    /// Threads used for fingerprinting.
    pub io_threads: usize,
    /// Follow symbolic links while collecting.
    pub follow_symlinks: bool,
    /// Skip hidden files and directories while collecting.
    pub skip_hidden: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sources: vec![
                PathBuf::from("~/nuclei-templates"),
                PathBuf::from("~/nucleihub-templates"),
                PathBuf::from("./community-templates"),
            ],
            target: PathBuf::from("~/master_nuclei"),
            extensions: vec!["yaml".to_string(), "yml".to_string()],
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_prefix: DEFAULT_CHUNK_PREFIX.to_string(),
            io_threads: 4,
            follow_symlinks: false,
            skip_hidden: false,
        }
    }
}

/// Command-line values layered on top of every other source.
///
/// `None` (or an empty list) leaves the lower layers untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigOverrides {
    /// Source roots, replacing the configured list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<PathBuf>>,
    /// Corpus directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<PathBuf>,
    /// Accepted extensions, replacing the configured list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Vec<String>>,
    /// Maximum files per chunk directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<usize>,
    /// Chunk directory name prefix
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_prefix: Option<String>,
    /// Fingerprinting threads
    #[serde(skip_serializing_if = "Option::is_none")]
    pub io_threads: Option<usize>,
    /// Follow symbolic links while collecting
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_symlinks: Option<bool>,
    /// Skip hidden files and directories
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_hidden: Option<bool>,
}

impl Config {
    /// Build the figment for the given (optional) config file path.
    ///
    /// When `path` is `None`, the platform default path is used if it can be
    /// determined. A missing file contributes nothing.
    #[must_use]
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));

        let file = path.map(Path::to_path_buf).or_else(Self::default_config_path);
        if let Some(file) = file {
            log::debug!("Reading config file {}", file.display());
            figment = figment.merge(Toml::file(file));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load configuration from defaults, file and environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a layer cannot be parsed or the merged
    /// result is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, &ConfigOverrides::default())
    }

    /// Load configuration with command-line overrides applied last.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a layer cannot be parsed or the merged
    /// result is invalid.
    pub fn load_with(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        let config: Config = Self::figment(path)
            .merge(Serialized::defaults(overrides))
            .extract()
            .map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid(
                "chunk_size must be at least 1".to_string(),
            ));
        }
        if self.normalized_extensions().is_empty() {
            return Err(ConfigError::Invalid(
                "at least one extension must be accepted".to_string(),
            ));
        }
        if self.target.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("target must not be empty".to_string()));
        }
        Ok(())
    }

    /// Source roots with `~` expanded, made absolute.
    #[must_use]
    pub fn resolved_sources(&self) -> Vec<PathBuf> {
        self.sources.iter().map(|p| resolve_path(p)).collect()
    }

    /// Target directory with `~` expanded, made absolute.
    #[must_use]
    pub fn resolved_target(&self) -> PathBuf {
        resolve_path(&self.target)
    }

    /// Extensions lower-cased without dots, duplicates removed.
    #[must_use]
    pub fn normalized_extensions(&self) -> Vec<String> {
        normalize_extensions(&self.extensions)
    }

    /// Thread count for fingerprinting, at least 1.
    #[must_use]
    pub fn effective_io_threads(&self) -> usize {
        self.io_threads.max(1)
    }

    /// Default platform-specific configuration path.
    #[must_use]
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "tmplmerge", "tmplmerge")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Render the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

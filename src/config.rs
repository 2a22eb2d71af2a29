//! Configuration for icdlens using the prefer crate for discovery.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::normalize::{CodePattern, PatternError, DEFAULT_EXCLUDED_LETTERS};

/// Default OCR/analysis service base URL.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8868";

/// Errors loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Code pattern settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodesConfig {
    /// Letters that may not start a code.
    #[serde(default = "default_excluded_letters")]
    pub excluded_letters: String,
}

fn default_excluded_letters() -> String {
    DEFAULT_EXCLUDED_LETTERS.to_string()
}

impl Default for CodesConfig {
    fn default() -> Self {
        Self {
            excluded_letters: default_excluded_letters(),
        }
    }
}

/// Where and how export artifacts are written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Output directory; relative paths resolve against the config file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,
    /// Name code exports `icd10_codes_<date>.txt` instead of `icd10_codes.txt`.
    #[serde(default)]
    pub date_stamp: bool,
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Request timeout in seconds. Unset means no application-level timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub codes: CodesConfig,
    #[serde(default)]
    pub export: ExportConfig,
    /// File this configuration was loaded from.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            request_timeout_secs: None,
            codes: CodesConfig::default(),
            export: ExportConfig::default(),
            source_path: None,
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path wins; otherwise prefer discovers `icdlens.*` in the
    /// standard locations. No file found means defaults. Environment
    /// overrides are applied last.
    pub async fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match explicit {
            Some(path) => Self::load_from_path(path).await?,
            None => match Self::discover().await {
                Some(path) => Self::load_from_path(&path).await?,
                None => Self::default(),
            },
        };
        Ok(config.with_env_overrides())
    }

    async fn discover() -> Option<PathBuf> {
        match prefer::load("icdlens").await {
            Ok(found) => found.source_path().map(|p| p.to_path_buf()),
            Err(_) => {
                debug!("No config file discovered; using defaults");
                None
            }
        }
    }

    /// Load configuration from a specific file path.
    /// TOML, YAML and JSON are selected by file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let mut config = Self::parse(&contents, path)?;
        config.source_path = Some(path.to_path_buf());
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    fn parse(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        let parse_error = |message: String| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        };

        match path.extension().and_then(|e| e.to_str()).unwrap_or("json") {
            "toml" => toml::from_str(contents).map_err(|e| parse_error(e.to_string())),
            "yaml" | "yml" => serde_yaml::from_str(contents).map_err(|e| parse_error(e.to_string())),
            _ => serde_json::from_str(contents).map_err(|e| parse_error(e.to_string())),
        }
    }

    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `ICDLENS_ENDPOINT`: service base URL
    /// - `ICDLENS_TIMEOUT_SECS`: request timeout in seconds
    /// - `ICDLENS_EXCLUDED_LETTERS`: letters that may not start a code
    /// - `ICDLENS_OUTPUT_DIR`: export directory
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(val) = lookup("ICDLENS_ENDPOINT") {
            self.endpoint = val;
        }
        if let Some(val) = lookup("ICDLENS_TIMEOUT_SECS") {
            if let Ok(secs) = val.trim().parse() {
                self.request_timeout_secs = Some(secs);
            }
        }
        if let Some(val) = lookup("ICDLENS_EXCLUDED_LETTERS") {
            self.codes.excluded_letters = val;
        }
        if let Some(val) = lookup("ICDLENS_OUTPUT_DIR") {
            self.export.output_dir = Some(val);
        }
        self
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Build the code pattern from the configured letter exclusions.
    pub fn code_pattern(&self) -> Result<CodePattern, PatternError> {
        CodePattern::new(&self.codes.excluded_letters)
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolved export directory. `~` is expanded; relative paths resolve
    /// against the config file's directory, or the working directory.
    pub fn output_dir(&self) -> PathBuf {
        let Some(dir) = self.export.output_dir.as_deref() else {
            return PathBuf::from(".");
        };

        let expanded = shellexpand::tilde(dir);
        let path = Path::new(expanded.as_ref());
        if path.is_absolute() {
            return path.to_path_buf();
        }
        match self.base_dir() {
            Some(base) => base.join(path),
            None => path.to_path_buf(),
        }
    }
}

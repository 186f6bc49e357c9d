//! Settings loading
//!
//! Settings resolve in this priority order (highest first):
//! 1. Environment variables (`AUDEX_OUTPUT_MODE`, `AUDEX_ON_DECODE_ERROR`,
//!    `AUDEX_MAX_DECODE_ERRORS`, `AUDEX_LOG`)
//! 2. TOML settings file (`$AUDEX_CONFIG`, then the per-user config
//!    directory, then `/etc/audex/config.toml` on Linux)
//! 3. Compiled defaults
//!
//! Input and output paths are not settings; they only come from the command line.

use crate::{Error, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Names an explicit settings file. A missing file at this path is an error.
pub const CONFIG_PATH_ENV: &str = "AUDEX_CONFIG";
pub const OUTPUT_MODE_ENV: &str = "AUDEX_OUTPUT_MODE";
pub const DECODE_ERROR_ENV: &str = "AUDEX_ON_DECODE_ERROR";
pub const MAX_DECODE_ERRORS_ENV: &str = "AUDEX_MAX_DECODE_ERRORS";
pub const LOG_FILTER_ENV: &str = "AUDEX_LOG";

const DEFAULT_LOG_FILTER: &str = "audex=info,audex_extract=info";
const DEFAULT_MAX_CONSECUTIVE_DECODE_ERRORS: u32 = 3;

/// How the output file is opened on the first write of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Discard any pre-existing content
    #[default]
    Truncate,
    /// Keep pre-existing content and write after it
    Append,
}

impl FromStr for OutputMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "truncate" => Ok(OutputMode::Truncate),
            "append" => Ok(OutputMode::Append),
            other => Err(Error::Config(format!(
                "Unknown output mode '{}' (expected 'truncate' or 'append')",
                other
            ))),
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputMode::Truncate => write!(f, "truncate"),
            OutputMode::Append => write!(f, "append"),
        }
    }
}

/// What the extractor does when the codec rejects a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodeErrorPolicy {
    /// Stop the run on the first decode error
    #[default]
    Abort,
    /// Drop the packet and resynchronize on the next one
    Skip,
}

impl FromStr for DecodeErrorPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(DecodeErrorPolicy::Abort),
            "skip" => Ok(DecodeErrorPolicy::Skip),
            other => Err(Error::Config(format!(
                "Unknown decode error policy '{}' (expected 'abort' or 'skip')",
                other
            ))),
        }
    }
}

impl fmt::Display for DecodeErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeErrorPolicy::Abort => write!(f, "abort"),
            DecodeErrorPolicy::Skip => write!(f, "skip"),
        }
    }
}

/// Extractor settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub output_mode: OutputMode,
    pub on_decode_error: DecodeErrorPolicy,
    /// Only consulted with [`DecodeErrorPolicy::Skip`]
    pub max_consecutive_decode_errors: u32,
    /// `tracing_subscriber::EnvFilter` directive, overridden by `RUST_LOG`
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_mode: OutputMode::default(),
            on_decode_error: DecodeErrorPolicy::default(),
            max_consecutive_decode_errors: DEFAULT_MAX_CONSECUTIVE_DECODE_ERRORS,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Settings {
    /// Resolve settings from the settings file (if any) and the process environment.
    pub fn load() -> Result<Self> {
        let mut settings = match locate_settings_file()? {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        settings.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    /// Parse a TOML settings file. Keys that are absent keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading settings from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|source| Error::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Apply environment-style overrides; `lookup` returns the value for a variable name.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(mode) = lookup(OUTPUT_MODE_ENV) {
            self.output_mode = mode.parse()?;
        }
        if let Some(policy) = lookup(DECODE_ERROR_ENV) {
            self.on_decode_error = policy.parse()?;
        }
        if let Some(max) = lookup(MAX_DECODE_ERRORS_ENV) {
            self.max_consecutive_decode_errors = max.trim().parse().map_err(|_| {
                Error::Config(format!(
                    "{} must be a non-negative integer, got '{}'",
                    MAX_DECODE_ERRORS_ENV, max
                ))
            })?;
        }
        if let Some(filter) = lookup(LOG_FILTER_ENV) {
            self.log_filter = filter;
        }
        Ok(())
    }
}

/// Find the settings file to load, if any.
fn locate_settings_file() -> Result<Option<PathBuf>> {
    if let Ok(explicit) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(explicit);
        if !path.exists() {
            return Err(Error::Config(format!(
                "Settings file named by {} not found: {}",
                CONFIG_PATH_ENV,
                path.display()
            )));
        }
        return Ok(Some(path));
    }

    if let Some(user_config) = dirs::config_dir().map(|d| d.join("audex").join("config.toml")) {
        if user_config.exists() {
            return Ok(Some(user_config));
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/audex/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }
    }

    Ok(None)
}

//! Application settings
//!
//! Read from a JSON file; missing fields take their defaults. Settings are
//! never written back.

use std::path::{Path, PathBuf};

use rig_control::RigParams;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors loading settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Application settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Rig session parameters
    pub rig: RigParams,
    /// Log filter used when RUST_LOG is not set
    pub log_filter: Option<String>,
}

impl Settings {
    /// Get the config directory for rigsync
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("rigsync"))
    }

    /// Get the default settings file path
    pub fn default_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.json"))
    }

    /// Load settings from `path`, or from the default location
    ///
    /// A missing file at the default location gives defaults; an explicit
    /// path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        match path {
            Some(path) => Self::load_from(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load_from(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Load settings from a file
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

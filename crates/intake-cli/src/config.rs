//! CLI configuration file.
//!
//! Looked up at `--config PATH` or, failing that, in the platform config
//! directory:
//! - macOS: ~/Library/Application Support/com.freight-intake.Freight Intake/
//! - Windows: %APPDATA%/freight-intake/Freight Intake/config/
//! - Linux: ~/.config/freightintake/
//!
//! A missing file means defaults. A file that exists but does not parse is
//! an error.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use intake_model::ProcessingOptions;
use serde::{Deserialize, Serialize};

const APP_QUALIFIER: &str = "com";
const APP_ORG: &str = "freight-intake";
const APP_NAME: &str = "Freight Intake";
const CONFIG_FILENAME: &str = "config.toml";

/// Contents of `config.toml`.
///
/// ```toml
/// [processing]
/// timezone = "America/Chicago"
/// date_order = "day_first"
///
/// [processing.extra_synonyms]
/// vehicle_id = ["rig"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    pub processing: ProcessingOptions,
}

/// Default location of the config file, when the platform has one.
pub fn config_path() -> Option<PathBuf> {
    ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME)
        .map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
}

/// Loads `explicit`, or the default location when `None`.
pub fn load_config(explicit: Option<&Path>) -> Result<IntakeConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match config_path() {
            Some(path) => path,
            None => {
                tracing::debug!("no platform config directory, using defaults");
                return Ok(IntakeConfig::default());
            }
        },
    };
    load_config_file(&path)
}

pub fn load_config_file(path: &Path) -> Result<IntakeConfig> {
    match fs::read_to_string(path) {
        Ok(content) => {
            let config = toml::from_str(&content)
                .with_context(|| format!("parse config: {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loaded config");
            Ok(config)
        }
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(IntakeConfig::default())
        }
        Err(error) => Err(error).with_context(|| format!("read config: {}", path.display())),
    }
}

// SPDX-License-Identifier: MPL-2.0
//! This module handles the player's configuration, including loading and saving
//! user preferences to a `settings.toml` file.
//!
//! # Examples
//!
//! ```no_run
//! use notchlc_player::config::{self, Config};
//!
//! // Load existing configuration
//! let mut config = config::load().unwrap_or_default();
//!
//! // Modify a setting
//! config.loop_playback = Some(true);
//!
//! // Save the modified configuration
//! config::save(&config).expect("Failed to save config");
//! ```

pub mod defaults;

use crate::error::Result;
use crate::video_player::PlayerOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "settings.toml";
const APP_NAME: &str = "NotchLcPlayer";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub loop_playback: Option<bool>,
    #[serde(default)]
    pub default_frame_rate: Option<f64>,
    #[serde(default)]
    pub log_level: Option<String>,
    #[serde(default)]
    pub snapshot_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            loop_playback: Some(defaults::DEFAULT_LOOP_PLAYBACK),
            default_frame_rate: Some(defaults::DEFAULT_FRAME_RATE),
            log_level: None,
            snapshot_dir: None,
        }
    }
}

impl Config {
    /// Builds player options, clamping the fallback frame rate into range.
    #[must_use]
    pub fn player_options(&self) -> PlayerOptions {
        let default_frame_rate = self
            .default_frame_rate
            .filter(|rate| rate.is_finite())
            .map_or(defaults::DEFAULT_FRAME_RATE, |rate| {
                rate.clamp(defaults::MIN_FRAME_RATE, defaults::MAX_FRAME_RATE)
            });

        PlayerOptions {
            loop_playback: self
                .loop_playback
                .unwrap_or(defaults::DEFAULT_LOOP_PLAYBACK),
            default_frame_rate,
        }
    }

    /// Returns the configured log filter, or the default one.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_level
            .as_deref()
            .filter(|level| !level.trim().is_empty())
            .unwrap_or(defaults::DEFAULT_LOG_LEVEL)
    }
}

fn get_default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|mut path| {
        path.push(APP_NAME);
        path.push(CONFIG_FILE);
        path
    })
}

/// Loads the configuration from the user config directory.
///
/// A missing file yields the defaults.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read.
pub fn load() -> Result<Config> {
    if let Some(path) = get_default_config_path() {
        if path.exists() {
            return load_from_path(&path);
        }
    }
    Ok(Config::default())
}

/// Saves the configuration to the user config directory.
///
/// # Errors
///
/// Returns an error if the file cannot be serialized or written.
pub fn save(config: &Config) -> Result<()> {
    if let Some(path) = get_default_config_path() {
        return save_to_path(config, &path);
    }
    Ok(())
}

/// Loads the configuration from `path`. Invalid TOML yields the defaults.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn load_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)?;
    match toml::from_str(&content) {
        Ok(config) => Ok(config),
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "invalid settings file, using defaults");
            Ok(Config::default())
        }
    }
}

/// Saves the configuration to `path`, creating parent directories.
///
/// # Errors
///
/// Returns an error if the file cannot be serialized or written.
pub fn save_to_path(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    fs::write(path, content)?;
    Ok(())
}

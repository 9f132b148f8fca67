//! On-disk settings for the viewer.
//!
//! Settings live in `<config dir>/grove/config.toml` unless a path is given
//! on the command line. Every section and field is optional:
//!
//! ```toml
//! [window]
//! width = 1024.0
//! seed = 7
//!
//! [scene.tree]
//! spread_angle = 25.0
//!
//! [scene.fade]
//! policy = "brighten"
//! ```

use anyhow::{Context, Result};
use grove_core::config::Config;
use log::{info, warn};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub window: WindowSettings,
    #[serde(default)]
    pub scene: Config,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub width: f32,
    pub height: f32,
    /// Fixed RNG seed for stars and terrain; random when absent.
    pub seed: Option<u64>,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            width: 1024.0,
            height: 720.0,
            seed: None,
        }
    }
}

impl Settings {
    /// Default location of the settings file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("grove")
            .join("config.toml")
    }

    /// Reads and validates the settings file at `path`.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        settings
            .scene
            .validate()
            .with_context(|| format!("invalid scene settings in {}", path.display()))?;
        Ok(settings)
    }

    /// Loads `explicit`, or the default path if it exists.
    ///
    /// An explicitly requested file must load. A broken default file only
    /// produces a warning and the built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            let settings = Self::load_from(path)?;
            info!("loaded settings from {}", path.display());
            return Ok(settings);
        }

        let path = Self::config_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        match Self::load_from(&path) {
            Ok(settings) => {
                info!("loaded settings from {}", path.display());
                Ok(settings)
            }
            Err(e) => {
                warn!("{e:#}; using defaults");
                Ok(Self::default())
            }
        }
    }
}

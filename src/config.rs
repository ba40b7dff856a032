use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::camera::ResolutionHint;

const SETTINGS_FILE: &str = "settings.json";

/// Startup settings. Read once, never written back.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub(crate) struct Config {
    pub(crate) device_index: u32,
    pub(crate) resolution_width: u32,
    pub(crate) resolution_height: u32,
    pub(crate) frame_rate: u32,
    pub(crate) placeholder: String,
}

impl Default for Config {
    fn default() -> Self {
        let hint = ResolutionHint::default();

        Self {
            device_index: 0,
            resolution_width: hint.width,
            resolution_height: hint.height,
            frame_rate: hint.frame_rate,
            placeholder: "Hello I am a label".to_string(),
        }
    }
}

impl Config {
    pub(crate) fn path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "example", "qr-code-scanner")
            .map(|dirs| dirs.config_dir().join(SETTINGS_FILE))
    }

    pub(crate) fn read(path: &Path) -> eyre::Result<Self> {
        let buf = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&buf)?;

        Ok(config)
    }

    /// Loads the settings file if there is one, falling back to defaults on
    /// any problem.
    #[tracing::instrument]
    pub(crate) fn load() -> Self {
        let Some(path) = Self::path() else {
            tracing::debug!("no config directory available");
            return Self::default();
        };

        if !path.exists() {
            tracing::trace!(path = %path.display(), "no settings file");
            return Self::default();
        }

        match Self::read(&path) {
            Ok(config) => {
                tracing::debug!(?config, "loaded settings");
                config
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), "could not load settings: {err}");
                Self::default()
            }
        }
    }

    pub(crate) fn resolution_hint(&self) -> ResolutionHint {
        ResolutionHint {
            width: self.resolution_width,
            height: self.resolution_height,
            frame_rate: self.frame_rate,
        }
    }
}

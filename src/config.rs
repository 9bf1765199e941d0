//! Application settings and config-file paths.
//!
//! Settings persist as JSON under the platform config directory.
//! Unknown or missing fields fall back to defaults, so settings files
//! survive version skew in both directions.

use std::path::PathBuf;

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::core::scroll::EngineConfig;

/// App-level settings, persisted across sessions.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Scroll engine tuning.
    pub engine: EngineConfig,
    /// Particle count for the starfield chapter.
    pub particle_count: usize,
    /// Ring count for the tunnel chapter.
    pub ring_count: usize,
    /// Warp flash length, seconds.
    pub warp_duration_s: f32,
    /// Show the scroll progress bar along the viewport edge.
    pub show_progress_bar: bool,
    /// Hold the preloader lock at startup.
    pub preloader: bool,
    /// Ceiling for any scroll lock before it is force-released.
    pub lock_guard_max_s: f32,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            particle_count: 600,
            ring_count: 48,
            warp_duration_s: 0.6,
            show_progress_bar: true,
            preloader: true,
            lock_guard_max_s: 6.0,
        }
    }
}

impl AppSettings {
    /// Load from the default config file; defaults when absent or
    /// unreadable (a broken settings file must not block startup).
    pub fn load_or_default() -> Self {
        let path = config_file("slipstream.json");
        match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(settings) => {
                    info!("settings loaded from {}", path.display());
                    settings
                }
                Err(e) => {
                    warn!("settings file {} unparseable ({}), using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Persist to the default config file.
    pub fn save(&self) -> Result<()> {
        let path = config_file("slipstream.json");
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating config dir {}", parent.display()))?;
        }
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, raw).with_context(|| format!("writing {}", path.display()))?;
        info!("settings saved to {}", path.display());
        Ok(())
    }
}

/// Path of a named file in the platform config directory, falling back
/// to the working directory when the platform offers none.
pub fn config_file(name: &str) -> PathBuf {
    dirs_next::config_dir()
        .map(|dir| dir.join("slipstream"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(name)
}

/// Path of a named file in the platform data directory (logs).
pub fn data_file(name: &str) -> PathBuf {
    dirs_next::data_dir()
        .map(|dir| dir.join("slipstream"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_round_trip_json() {
        let settings = AppSettings::default();
        let raw = serde_json::to_string(&settings).unwrap();
        let back: AppSettings = serde_json::from_str(&raw).unwrap();
        assert_eq!(back.particle_count, settings.particle_count);
        assert_eq!(back.engine.duration_s, settings.engine.duration_s);
    }

    #[test]
    fn test_unknown_fields_tolerated() {
        let raw = r#"{"particle_count": 123, "some_future_field": true}"#;
        let settings: AppSettings = serde_json::from_str(raw).unwrap();
        assert_eq!(settings.particle_count, 123);
        // Everything else defaulted
        assert_eq!(settings.ring_count, AppSettings::default().ring_count);
    }

    #[test]
    fn test_config_file_has_name() {
        let path = config_file("slipstream.json");
        assert!(path.to_string_lossy().ends_with("slipstream.json"));
    }
}

//! Configuration loader - YAML settings + .env overrides

use serde::{Deserialize, Serialize};
use std::path::Path;
use anyhow::Result;

use crate::interaction::DEFAULT_EMPHASIS_SCALE;
use crate::palette::ColorScale;
use crate::playback::DEFAULT_INTERVAL_MS;

/// Main configuration loaded from viewer.yaml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub playback: PlaybackSettings,
    /// Initial palette; unknown names fall back to rainbow
    pub palette: ColorScale,
    /// Mesh scale while the emphasis toggle is on
    pub emphasis_scale: f32,
    pub synthetic: SyntheticSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    pub interval_ms: u64,
    pub autoplay: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticSettings {
    /// Seconds between synthetic frames, and between payload frames that
    /// arrive without timestamps
    pub time_step_s: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub dir: String,
    pub filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            playback: PlaybackSettings::default(),
            palette: ColorScale::default(),
            emphasis_scale: DEFAULT_EMPHASIS_SCALE,
            synthetic: SyntheticSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_INTERVAL_MS,
            autoplay: false,
        }
    }
}

impl Default for SyntheticSettings {
    fn default() -> Self {
        Self { time_step_s: 0.01 }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            dir: "logs".to_string(),
            filter: "info,brain_viewer=debug".to_string(),
        }
    }
}

/// Overrides loaded from .env / process environment
#[derive(Debug, Clone, Default)]
pub struct Environment {
    pub log_dir: Option<String>,
    pub palette: Option<String>,
    pub interval_ms: Option<u64>,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_yaml::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load from `path` if it exists, defaults otherwise
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            tracing::info!("Loading settings from {:?}", path);
            Self::load(path)
        } else {
            tracing::debug!("Settings file {:?} not found, using defaults", path);
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.playback.interval_ms == 0 {
            anyhow::bail!("playback.interval_ms must be > 0");
        }
        if self.emphasis_scale.is_nan() || self.emphasis_scale <= 0.0 {
            anyhow::bail!("emphasis_scale must be > 0");
        }
        if self.synthetic.time_step_s.is_nan() || self.synthetic.time_step_s <= 0.0 {
            anyhow::bail!("synthetic.time_step_s must be > 0");
        }
        Ok(())
    }

    /// Apply environment overrides on top of file values
    pub fn with_environment(mut self, env: &Environment) -> Result<Self> {
        if let Some(dir) = &env.log_dir {
            self.logging.dir = dir.clone();
        }
        if let Some(name) = &env.palette {
            self.palette = ColorScale::from_name(name);
        }
        if let Some(ms) = env.interval_ms {
            self.playback.interval_ms = ms;
        }
        self.validate()?;
        Ok(self)
    }
}

impl Environment {
    /// Load overrides from .env file
    pub fn load() -> Self {
        dotenvy::dotenv().ok();

        Environment {
            log_dir: std::env::var("BRAIN_VIEWER_LOG_DIR").ok(),
            palette: std::env::var("BRAIN_VIEWER_PALETTE").ok(),
            interval_ms: std::env::var("BRAIN_VIEWER_INTERVAL_MS")
                .ok()
                .and_then(|s| s.parse().ok()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.playback.interval_ms, 200);
        assert!(!settings.playback.autoplay);
        assert_eq!(settings.palette, ColorScale::Rainbow);
        assert_eq!(settings.emphasis_scale, 1.1);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = "palette: heatmap\nplayback:\n  autoplay: true\n";
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(settings.palette, ColorScale::Heatmap);
        assert!(settings.playback.autoplay);
        assert_eq!(settings.playback.interval_ms, 200);
        assert_eq!(settings.logging.dir, "logs");
    }

    #[test]
    fn test_unknown_palette_in_yaml_is_rainbow() {
        let settings: Settings = serde_yaml::from_str("palette: magma\n").unwrap();
        assert_eq!(settings.palette, ColorScale::Rainbow);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("viewer.yaml");
        std::fs::write(&path, "playback:\n  interval_ms: 0\n").unwrap();

        assert!(Settings::load(&path).is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_or_default(dir.path().join("nope.yaml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_environment_overrides() {
        let env = Environment {
            log_dir: Some("/tmp/bv".to_string()),
            palette: Some("blueRed".to_string()),
            interval_ms: Some(50),
        };
        let settings = Settings::default().with_environment(&env).unwrap();

        assert_eq!(settings.logging.dir, "/tmp/bv");
        assert_eq!(settings.palette, ColorScale::BlueRed);
        assert_eq!(settings.playback.interval_ms, 50);
    }
}

//! Top-level application settings
//!
//! Loaded from an optional JSON file. Every field has a default, so a file
//! only needs the values it changes.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::game::GameConfig;
use crate::gesture::{DetectorConfig, GestureConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub game: GameConfig,
    pub gesture: GestureConfig,
    pub detector: DetectorConfig,
    /// Where the best score is kept between runs
    pub high_score_path: PathBuf,
    /// Render and gesture polling rate
    pub target_fps: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            game: GameConfig::default(),
            gesture: GestureConfig::default(),
            detector: DetectorConfig::default(),
            high_score_path: PathBuf::from("high_score.json"),
            target_fps: 60,
        }
    }
}

impl AppConfig {
    /// Read a JSON config file; missing fields take their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: Self = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.game.validate().context("Invalid game settings")?;
        self.gesture.validate().context("Invalid gesture settings")?;
        ensure!(
            (1..=240).contains(&self.target_fps),
            "target fps must be between 1 and 240"
        );
        Ok(())
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.target_fps.max(1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.target_fps, 60);
        assert_eq!(config.high_score_path, PathBuf::from("high_score.json"));
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"game": {{"grid_width": 30, "wrap_around": true}}, "gesture": {{"sensitivity": 0.1}}, "target_fps": 30}}"#
        )
        .unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.game.grid_width, 30);
        assert_eq!(config.game.grid_height, 20);
        assert!(config.game.wrap_around);
        assert_eq!(config.gesture.sensitivity, 0.1);
        assert_eq!(config.gesture.history_len, 6);
        assert_eq!(config.detector, DetectorConfig::default());
        assert_eq!(config.target_fps, 30);
    }

    #[test]
    fn test_load_rejects_bad_json() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();
        assert!(AppConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AppConfig::load(&dir.path().join("absent.json")).is_err());
    }

    #[test]
    fn test_validation_zero_fps() {
        let config = AppConfig {
            target_fps: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_frame_interval() {
        let config = AppConfig {
            target_fps: 50,
            ..Default::default()
        };
        assert_eq!(config.frame_interval(), Duration::from_millis(20));
    }
}

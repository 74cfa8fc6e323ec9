use std::time::Duration;

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

use super::landmarks::TrackedLandmark;

/// Where hand offsets are measured from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceOrigin {
    /// The middle of the (mirrored) frame
    #[default]
    FrameCenter,
    /// The smoothed hand position once the history first fills up
    FirstStable,
}

/// Camera capture and gesture classification settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Device indices tried in order when opening the camera
    pub camera_indices: Vec<i32>,
    pub capture_width: u32,
    pub capture_height: u32,
    pub capture_fps: u32,
    /// Flip frames horizontally so moving a hand left steers left
    pub mirror: bool,

    /// Frames averaged before thresholding
    pub history_len: usize,
    /// Normalized offset from the origin needed on an axis to count as a direction
    pub sensitivity: f32,
    /// Thumb-index distance below which the boost is on
    pub pinch_threshold: f32,
    /// Frames without a hand during which the last direction is held
    pub grace_frames: u32,
    /// Frames after a direction change during which another change is ignored
    pub cooldown_frames: u32,
    pub origin: ReferenceOrigin,
    pub tracked_landmark: TrackedLandmark,

    pub preview_width: u32,
    pub preview_height: u32,

    pub join_timeout_ms: u64,
    /// Pause after a failed frame read
    pub read_retry_delay_ms: u64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            camera_indices: vec![0, 1, 2],
            capture_width: 1280,
            capture_height: 720,
            capture_fps: 30,
            mirror: true,
            history_len: 6,
            sensitivity: 0.08,
            pinch_threshold: 0.05,
            grace_frames: 12,
            cooldown_frames: 4,
            origin: ReferenceOrigin::FrameCenter,
            tracked_landmark: TrackedLandmark::Wrist,
            preview_width: 64,
            preview_height: 48,
            join_timeout_ms: 2000,
            read_retry_delay_ms: 10,
        }
    }
}

impl GestureConfig {
    pub fn join_timeout(&self) -> Duration {
        Duration::from_millis(self.join_timeout_ms)
    }

    pub fn read_retry_delay(&self) -> Duration {
        Duration::from_millis(self.read_retry_delay_ms)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            !self.camera_indices.is_empty(),
            "at least one camera index is required"
        );
        ensure!(self.history_len >= 1, "history length must be at least 1");
        ensure!(
            self.sensitivity > 0.0 && self.sensitivity < 0.5,
            "sensitivity must be within (0, 0.5)"
        );
        ensure!(
            self.pinch_threshold > 0.0,
            "pinch threshold must be positive"
        );
        ensure!(
            self.preview_width > 0 && self.preview_height > 0,
            "preview size must be non-zero"
        );
        Ok(())
    }
}

/// How to launch the external hand-landmark detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub command: String,
    pub args: Vec<String>,
    /// Hands reported below this score are ignored
    pub min_confidence: f32,
    /// How long the helper may take to load its model and print `READY`
    pub ready_timeout_ms: u64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            command: "python3".to_string(),
            args: vec!["hand_detect.py".to_string()],
            min_confidence: 0.5,
            ready_timeout_ms: 30_000,
        }
    }
}

impl DetectorConfig {
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = GestureConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.camera_indices, vec![0, 1, 2]);
        assert_eq!(config.join_timeout(), Duration::from_secs(2));
    }

    #[test]
    fn test_rejects_empty_indices() {
        let config = GestureConfig {
            camera_indices: Vec::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_origin_from_json() {
        let config: GestureConfig =
            serde_json::from_str(r#"{"origin": "first_stable", "tracked_landmark": "palm_center"}"#)
                .unwrap();
        assert_eq!(config.origin, ReferenceOrigin::FirstStable);
        assert_eq!(config.tracked_landmark, TrackedLandmark::PalmCenter);
        assert_eq!(config.history_len, 6);
    }
}

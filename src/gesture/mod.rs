//! Webcam hand-gesture input.
//!
//! A background thread reads camera frames, runs the external hand-landmark
//! detector and publishes a smoothed [`GestureState`] for the game loop.

pub mod camera;
pub mod classifier;
pub mod config;
pub mod control;
pub mod detector;
pub mod error;
pub mod landmarks;
pub mod preview;

pub use camera::{default_opener, Camera, CameraOpener, CaptureSettings, Frame};
pub use classifier::{Classification, GestureClassifier};
pub use config::{DetectorConfig, GestureConfig, ReferenceOrigin};
pub use control::{CaptureStats, GestureControl, GestureSnapshot, GestureState};
pub use detector::{HandDetector, ProcessDetector};
pub use error::GestureError;
pub use landmarks::{HandLandmarks, Landmark, TrackedLandmark};
pub use preview::PreviewFrame;

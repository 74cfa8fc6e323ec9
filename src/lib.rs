//! Gesture Snake - Snake steered by webcam hand gestures
//!
//! This library provides:
//! - Core game logic with power-ups, wrap mode and particle effects (game module)
//! - Camera capture, hand detection and gesture classification (gesture module)
//! - Side-by-side TUI rendering of the game and the camera (render module)
//! - The fixed-rate driver loop (modes module)
//! - High-score persistence (persistence module)

pub mod config;
pub mod game;
pub mod gesture;
pub mod input;
pub mod metrics;
pub mod modes;
pub mod persistence;
pub mod render;

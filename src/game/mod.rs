//! Core game logic module for Snake
//!
//! This module contains all the game logic without any I/O or rendering dependencies.
//! Input from the keyboard and from hand gestures both end up as calls on
//! [`GameEngine`].

pub mod action;
pub mod config;
pub mod effects;
pub mod engine;
pub mod state;

// Re-export commonly used types
pub use action::Direction;
pub use config::GameConfig;
pub use effects::{Particle, ParticleKind, ParticleSystem};
pub use engine::{GameEngine, StepInfo, StepResult};
pub use state::{CollisionType, Consumable, GameState, GameStatus, Position, PowerUp, Snake};

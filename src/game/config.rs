use std::time::Duration;

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

/// Smallest grid edge the game accepts
pub const MIN_GRID_SIZE: usize = 4;

/// Accepted tick rates, in ticks per second
pub const SPEED_RANGE: std::ops::RangeInclusive<f32> = 0.5..=120.0;

/// Configuration for the game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Width of the game grid
    pub grid_width: usize,
    /// Height of the game grid
    pub grid_height: usize,
    /// Initial length of the snake
    pub initial_snake_length: usize,

    /// Ticks per second at normal speed
    pub base_speed: f32,
    /// Ticks per second while the pinch boost is held
    pub boost_speed: f32,

    /// Points for eating a fruit
    pub fruit_points: u32,
    /// Points for collecting a power-up
    pub power_up_points: u32,

    /// Score gained since the last power-up before another may appear
    pub power_up_score_step: u32,
    /// Chance of a power-up appearing each time a fruit respawns
    pub power_up_spawn_chance: f64,
    /// Ticks a power-up stays on the board
    pub power_up_lifespan: u32,

    /// Leaving the grid re-enters on the opposite edge instead of ending the game
    pub wrap_around: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_width: 20,
            grid_height: 20,
            initial_snake_length: 3,
            base_speed: 6.0,
            boost_speed: 12.0,
            fruit_points: 10,
            power_up_points: 20,
            power_up_score_step: 30,
            power_up_spawn_chance: 0.1,
            power_up_lifespan: 200,
            wrap_around: false,
        }
    }
}

impl GameConfig {
    /// Create a new configuration with custom grid size
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            grid_width: width,
            grid_height: height,
            ..Default::default()
        }
    }

    /// Create a small grid for testing
    pub fn small() -> Self {
        Self::new(10, 10)
    }

    /// Time between ticks for the given boost state
    pub fn tick_interval(&self, boosting: bool) -> Duration {
        let speed = if boosting {
            self.boost_speed
        } else {
            self.base_speed
        };
        // Clamped so an unvalidated config cannot overflow the conversion
        let speed = if speed.is_nan() {
            *SPEED_RANGE.start()
        } else {
            speed.clamp(*SPEED_RANGE.start(), *SPEED_RANGE.end())
        };
        Duration::from_secs_f32(1.0 / speed)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.grid_width >= MIN_GRID_SIZE && self.grid_height >= MIN_GRID_SIZE,
            "grid must be at least {MIN_GRID_SIZE}x{MIN_GRID_SIZE}, got {}x{}",
            self.grid_width,
            self.grid_height
        );
        ensure!(
            self.initial_snake_length >= 1 && self.initial_snake_length <= self.grid_width / 2 + 1,
            "initial snake length {} does not fit a grid {} cells wide",
            self.initial_snake_length,
            self.grid_width
        );
        ensure!(
            SPEED_RANGE.contains(&self.base_speed) && SPEED_RANGE.contains(&self.boost_speed),
            "tick speeds must be within {}..={} ticks per second, got {} and {}",
            SPEED_RANGE.start(),
            SPEED_RANGE.end(),
            self.base_speed,
            self.boost_speed
        );
        ensure!(
            (0.0..=1.0).contains(&self.power_up_spawn_chance),
            "power-up spawn chance must be within 0..=1"
        );
        Ok(())
    }
}

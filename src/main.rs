use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use gesture_snake::config::AppConfig;
use gesture_snake::game::GameEngine;
use gesture_snake::gesture::{default_opener, GestureControl, ProcessDetector};
use gesture_snake::modes::DualViewMode;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "gesture_snake")]
#[command(version, about = "Snake steered by hand gestures, with a live camera view")]
struct Cli {
    /// Control mode
    #[arg(long, value_enum, default_value = "gesture")]
    mode: Mode,

    /// JSON config file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Grid width
    #[arg(long)]
    width: Option<usize>,

    /// Grid height
    #[arg(long)]
    height: Option<usize>,

    /// Start with wrap-around edges instead of walls
    #[arg(long)]
    wrap: bool,

    /// Camera indices to try, in order
    #[arg(long, value_delimiter = ',')]
    camera: Option<Vec<i32>>,

    /// Hand detector executable
    #[arg(long)]
    detector_command: Option<String>,

    /// Argument passed to the hand detector (repeatable)
    #[arg(long = "detector-arg")]
    detector_args: Vec<String>,

    /// High score file
    #[arg(long)]
    high_score_file: Option<PathBuf>,

    /// Render rate
    #[arg(long)]
    fps: Option<u32>,

    /// Seed for fruit and power-up placement
    #[arg(long)]
    seed: Option<u64>,

    /// Log file (the terminal is taken by the game)
    #[arg(long, default_value = "gesture_snake.log")]
    log_file: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    /// Steer with hand gestures, keyboard still works
    Gesture,
    /// Keyboard only, no camera
    Keyboard,
}

impl Cli {
    fn app_config(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::load(path)?,
            None => AppConfig::default(),
        };

        if let Some(width) = self.width {
            config.game.grid_width = width;
        }
        if let Some(height) = self.height {
            config.game.grid_height = height;
        }
        if self.wrap {
            config.game.wrap_around = true;
        }
        if let Some(indices) = &self.camera {
            config.gesture.camera_indices = indices.clone();
        }
        if let Some(command) = &self.detector_command {
            config.detector.command = command.clone();
        }
        if !self.detector_args.is_empty() {
            config.detector.args = self.detector_args.clone();
        }
        if let Some(path) = &self.high_score_file {
            config.high_score_path = path.clone();
        }
        if let Some(fps) = self.fps {
            config.target_fps = fps;
        }

        config.validate()?;
        Ok(config)
    }
}

fn init_tracing(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create log file: {:?}", path))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gesture_snake=info".into()),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_file)?;

    info!("gesture_snake v{} starting", env!("CARGO_PKG_VERSION"));
    let config = cli.app_config()?;
    info!(mode = ?cli.mode, grid_width = config.game.grid_width, grid_height = config.game.grid_height, "configuration loaded");

    let gesture = match cli.mode {
        Mode::Gesture => Some(start_gesture_control(&config).inspect_err(|err| {
            error!(error = %format!("{err:#}"), "gesture control failed to start");
        })?),
        Mode::Keyboard => None,
    };

    let engine = match cli.seed {
        Some(seed) => GameEngine::with_seed(config.game.clone(), seed),
        None => GameEngine::new(config.game.clone()),
    };
    let mut mode = DualViewMode::with_engine(engine, &config, gesture);
    mode.run().await?;

    info!("exiting");
    Ok(())
}

fn start_gesture_control(config: &AppConfig) -> Result<GestureControl> {
    let detector =
        ProcessDetector::spawn(&config.detector).context("Failed to start hand detector")?;
    let control = GestureControl::start(
        config.gesture.clone(),
        default_opener(),
        Box::new(detector),
    )
    .context("Failed to start camera")?;
    info!(camera = control.camera_index(), "gesture control running");
    Ok(control)
}

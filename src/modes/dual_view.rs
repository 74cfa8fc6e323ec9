use anyhow::{Context, Result};
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{stderr, Stderr};
use std::time::{Duration, Instant};
use tokio::time::{interval, sleep_until, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::game::{GameEngine, GameState, ParticleSystem};
use crate::gesture::{GestureControl, GestureSnapshot, GestureState};
use crate::input::{InputHandler, KeyAction};
use crate::metrics::GameMetrics;
use crate::persistence::HighScoreStore;
use crate::render::{CameraPane, Renderer, Scene};

/// How long a game must have been over before the Up gesture restarts it,
/// so a hand still held up at the moment of death does not restart at once
const GESTURE_RESTART_DELAY: Duration = Duration::from_secs(1);

/// The game beside a live camera view, steered by gestures or the keyboard
pub struct DualViewMode {
    engine: GameEngine,
    state: GameState,
    metrics: GameMetrics,
    particles: ParticleSystem,
    renderer: Renderer,
    input_handler: InputHandler,
    high_scores: HighScoreStore,
    /// `None` in keyboard mode
    gesture: Option<GestureControl>,
    snapshot: GestureSnapshot,
    dead_zone: f32,
    frame_interval: Duration,
    should_quit: bool,
    last_tick: Instant,
    game_over_at: Option<Instant>,
}

impl DualViewMode {
    pub fn new(config: &AppConfig, gesture: Option<GestureControl>) -> Self {
        Self::with_engine(GameEngine::new(config.game.clone()), config, gesture)
    }

    /// Build around an existing engine, e.g. one with a fixed seed
    pub fn with_engine(
        mut engine: GameEngine,
        config: &AppConfig,
        gesture: Option<GestureControl>,
    ) -> Self {
        let state = engine.reset();
        let high_scores = HighScoreStore::load(&config.high_score_path);
        info!(
            best = high_scores.best(),
            path = %high_scores.path().display(),
            "loaded high score"
        );

        Self {
            engine,
            state,
            metrics: GameMetrics::with_high_score(high_scores.best()),
            particles: ParticleSystem::new(),
            renderer: Renderer::new(),
            input_handler: InputHandler::new(),
            high_scores,
            gesture,
            snapshot: GestureSnapshot::default(),
            dead_zone: config.gesture.sensitivity,
            frame_interval: config.frame_interval(),
            should_quit: false,
            last_tick: Instant::now(),
            game_over_at: None,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        // Setup terminal
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stderr = stderr();
        execute!(stderr, EnterAlternateScreen).context("Failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stderr);
        let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;
        terminal.hide_cursor().context("Failed to hide cursor")?;
        terminal.clear().context("Failed to clear terminal")?;

        // Run game loop with cleanup
        let result = self.run_game_loop(&mut terminal).await;

        // Cleanup terminal
        let cleanup = self.cleanup_terminal(&mut terminal);
        self.finish(cleanup)?;

        result
    }

    async fn run_game_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        let mut event_stream = EventStream::new();

        let mut render_timer = interval(self.frame_interval);
        render_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        self.last_tick = Instant::now();

        loop {
            // Recomputed every pass so a boost takes effect on the next tick
            let next_tick = self.last_tick + self.engine.tick_interval(self.state.boosting);

            tokio::select! {
                // Handle terminal events
                maybe_event = event_stream.next() => {
                    match maybe_event {
                        Some(Ok(event)) => self.handle_event(event)?,
                        Some(Err(err)) => warn!(error = %err, "terminal event error"),
                        None => self.should_quit = true,
                    }
                }

                // Game logic tick
                _ = sleep_until(tokio::time::Instant::from_std(next_tick)) => {
                    self.last_tick = Instant::now();
                    if self.state.is_running() {
                        self.update_game();
                    }
                }

                // Poll gestures and render frame
                _ = render_timer.tick() => {
                    self.refresh_gesture();
                    self.particles.update();
                    self.metrics.update();

                    let scene = Scene {
                        state: &self.state,
                        metrics: &self.metrics,
                        particles: &self.particles,
                        camera: match self.gesture {
                            Some(_) => CameraPane::Live {
                                snapshot: &self.snapshot,
                                dead_zone: self.dead_zone,
                            },
                            None => CameraPane::Disabled,
                        },
                    };
                    terminal.draw(|frame| {
                        self.renderer.render(frame, &scene);
                    }).context("Failed to draw frame")?;
                }

                // Handle Ctrl+C
                _ = tokio::signal::ctrl_c() => {
                    self.should_quit = true;
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) -> Result<()> {
        if let Event::Key(key) = event {
            // Only process key press events, not release
            if key.kind != KeyEventKind::Press {
                return Ok(());
            }

            match self.input_handler.handle_key_event(key) {
                KeyAction::Move(direction) => {
                    self.engine.set_direction(&mut self.state, direction);
                }
                KeyAction::TogglePause => {
                    self.state.toggle_pause();
                    debug!(status = ?self.state.status, "pause toggled");
                }
                KeyAction::ToggleWrap => {
                    self.state.wrap_around = !self.state.wrap_around;
                    info!(wrap_around = self.state.wrap_around, "wrap mode toggled");
                }
                KeyAction::Restart => {
                    self.reset_game();
                }
                KeyAction::Quit => {
                    self.should_quit = true;
                }
                KeyAction::None => {}
            }
        }

        Ok(())
    }

    /// Pull the latest gesture snapshot and feed it to the game
    fn refresh_gesture(&mut self) {
        let Some(gesture) = &self.gesture else {
            return;
        };
        self.snapshot = gesture.snapshot();
        let state = self.snapshot.state;
        self.apply_gesture(state);
    }

    fn apply_gesture(&mut self, gesture: GestureState) {
        if self.state.is_over() {
            let ready = self
                .game_over_at
                .map_or(true, |at| at.elapsed() >= GESTURE_RESTART_DELAY);
            if ready && self.engine.handle_restart(&mut self.state, gesture.direction) {
                info!("restarted by gesture");
                self.on_game_start();
            }
            return;
        }

        if let Some(direction) = gesture.direction {
            self.engine.set_direction(&mut self.state, direction);
        }
        self.state.boosting = gesture.boosting;
    }

    fn update_game(&mut self) {
        let result = self.engine.step(&mut self.state);

        if let Some(consumed) = result.info.consumed {
            self.particles.burst(self.state.snake.head(), consumed.into());
        }
        if let Some(from) = result.info.wrapped_from {
            self.particles.trail(from);
        }

        // Track game over
        if result.terminated && self.state.is_over() {
            info!(
                score = self.state.score,
                steps = self.state.steps,
                collision = ?result.info.collision_type,
                "game over"
            );
            self.metrics.on_game_over(self.state.score);
            self.game_over_at = Some(Instant::now());
            self.save_high_score();
        }
    }

    fn reset_game(&mut self) {
        // A game abandoned mid-run still counts towards the high score
        self.save_high_score();
        let wrap_around = self.state.wrap_around;
        self.state = self.engine.reset();
        self.state.wrap_around = wrap_around;
        self.on_game_start();
    }

    fn on_game_start(&mut self) {
        self.metrics.on_game_start();
        self.particles.clear();
        self.game_over_at = None;
        self.last_tick = Instant::now();
    }

    fn save_high_score(&mut self) {
        if let Err(err) = self.high_scores.record(self.state.score) {
            warn!(error = %format!("{err:#}"), "failed to save high score");
        }
    }

    /// Shut down even when restoring the terminal failed, then report that failure
    fn finish(&mut self, cleanup: Result<()>) -> Result<()> {
        self.shutdown();
        cleanup
    }

    /// Persist the score and stop the capture thread
    fn shutdown(&mut self) {
        self.save_high_score();
        if let Some(mut gesture) = self.gesture.take() {
            if let Some(stats) = gesture.stop() {
                info!(
                    frames = stats.frames,
                    read_failures = stats.read_failures,
                    detector_failures = stats.detector_failures,
                    "gesture capture stopped"
                );
            }
        }
    }

    fn cleanup_terminal(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        disable_raw_mode().context("Failed to disable raw mode")?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)
            .context("Failed to leave alternate screen")?;
        terminal.show_cursor().context("Failed to show cursor")?;
        Ok(())
    }
}

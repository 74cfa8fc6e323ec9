use std::collections::HashMap;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Gauge, Paragraph, Widget},
    Frame,
};

use crate::game::{GameState, GameStatus, ParticleKind, ParticleSystem, Position};
use crate::gesture::{GestureSnapshot, HandLandmarks, PreviewFrame};
use crate::metrics::GameMetrics;

/// What to show in the camera pane
pub enum CameraPane<'a> {
    /// Live gesture feed; `dead_zone` is the sensitivity around the centre
    Live {
        snapshot: &'a GestureSnapshot,
        dead_zone: f32,
    },
    /// Running without a camera
    Disabled,
}

/// Everything drawn in one frame
pub struct Scene<'a> {
    pub state: &'a GameState,
    pub metrics: &'a GameMetrics,
    pub particles: &'a ParticleSystem,
    pub camera: CameraPane<'a>,
}

pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, frame: &mut Frame, scene: &Scene) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(0),    // Game and camera
                Constraint::Length(3), // Footer
            ])
            .split(frame.area());

        let stats = self.render_stats(scene);
        frame.render_widget(stats, chunks[0]);

        let panes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[1]);

        if scene.state.status == GameStatus::GameOver {
            let game_over = self.render_game_over(scene);
            frame.render_widget(game_over, panes[0]);
        } else {
            let grid = self.render_grid(scene);
            frame.render_widget(grid, panes[0]);
        }

        self.render_camera(frame, panes[1], &scene.camera);

        let controls = self.render_controls(&scene.camera);
        frame.render_widget(controls, chunks[2]);
    }

    fn render_grid(&self, scene: &Scene) -> Paragraph<'_> {
        let state = scene.state;
        let sparks: HashMap<(i32, i32), (ParticleKind, f32)> = scene
            .particles
            .particles()
            .iter()
            .map(|p| (p.cell(), (p.kind, p.intensity())))
            .collect();
        let head = state.snake.head();
        let power_up = state
            .power_up
            .filter(|p| p.lifespan % 20 < 10)
            .map(|p| p.position);

        let mut lines = Vec::with_capacity(state.grid_height);
        for y in 0..state.grid_height {
            let mut spans = Vec::with_capacity(state.grid_width);

            for x in 0..state.grid_width {
                let pos = Position::new(x as i32, y as i32);

                let cell = if pos == head {
                    // Snake head - distinct color
                    Span::styled(
                        "■ ",
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    )
                } else if state.snake.contains(pos) {
                    Span::styled("□ ", Style::default().fg(Color::Green))
                } else if pos == state.fruit {
                    Span::styled(
                        "● ",
                        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                    )
                } else if Some(pos) == power_up {
                    Span::styled(
                        "★ ",
                        Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::BOLD),
                    )
                } else if let Some(&(kind, intensity)) = sparks.get(&(pos.x, pos.y)) {
                    let mut style = Style::default().fg(particle_color(kind));
                    if intensity < 0.5 {
                        style = style.add_modifier(Modifier::DIM);
                    }
                    Span::styled("* ", style)
                } else {
                    // Empty cell
                    Span::styled(". ", Style::default().fg(Color::DarkGray))
                };

                spans.push(cell);
            }

            lines.push(Line::from(spans));
        }

        let (title, border_color) = if state.status == GameStatus::Paused {
            (" Snake (PAUSED) ", Color::Yellow)
        } else if state.wrap_around {
            (" Snake ", Color::Cyan)
        } else {
            (" Snake ", Color::White)
        };
        let border_type = if state.wrap_around {
            BorderType::Plain
        } else {
            BorderType::Double
        };

        Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(border_type)
                    .border_style(Style::default().fg(border_color))
                    .title(title),
            )
            .alignment(Alignment::Center)
    }

    fn render_stats(&self, scene: &Scene) -> Paragraph<'_> {
        let state = scene.state;
        let metrics = scene.metrics;

        let mut spans = vec![
            Span::styled("Score: ", Style::default().fg(Color::Yellow)),
            Span::styled(
                state.score.to_string(),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("    "),
            Span::styled("High: ", Style::default().fg(Color::Yellow)),
            Span::styled(
                metrics.high_score.max(state.score).to_string(),
                Style::default().fg(Color::White),
            ),
            Span::raw("    "),
            Span::styled("Time: ", Style::default().fg(Color::Yellow)),
            Span::styled(metrics.format_time(), Style::default().fg(Color::White)),
            Span::raw("    "),
            Span::styled("Mode: ", Style::default().fg(Color::Yellow)),
            Span::styled(
                if state.wrap_around { "WRAP" } else { "CLASSIC" },
                Style::default().fg(Color::Cyan),
            ),
        ];
        if state.boosting && state.is_running() {
            spans.push(Span::raw("    "));
            spans.push(Span::styled(
                "SPEED BOOST!",
                Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD),
            ));
        }

        Paragraph::new(vec![Line::from(spans)]).alignment(Alignment::Center)
    }

    fn render_game_over(&self, scene: &Scene) -> Paragraph<'_> {
        let state = scene.state;

        let mut text = vec![
            Line::from(""),
            Line::from(vec![Span::styled(
                "GAME OVER",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )]),
            Line::from(""),
            Line::from(vec![
                Span::styled("Final Score: ", Style::default().fg(Color::Yellow)),
                Span::styled(
                    state.score.to_string(),
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                ),
            ]),
        ];

        if scene.metrics.new_high_score {
            text.push(Line::from(""));
            text.push(Line::from(vec![Span::styled(
                "NEW HIGH SCORE!",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )]));
        }

        text.push(Line::from(""));
        text.push(Line::from(vec![
            Span::styled("Show ", Style::default().fg(Color::Gray)),
            Span::styled(
                "UP",
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(" or press ", Style::default().fg(Color::Gray)),
            Span::styled(
                "R",
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(" to restart, ", Style::default().fg(Color::Gray)),
            Span::styled(
                "Q",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
            Span::styled(" to quit", Style::default().fg(Color::Gray)),
        ]));

        Paragraph::new(text).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red)),
        )
    }

    fn render_camera(&self, frame: &mut Frame, area: Rect, camera: &CameraPane) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Gray))
            .title(" Camera ");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let (snapshot, dead_zone) = match camera {
            CameraPane::Live {
                snapshot,
                dead_zone,
            } => (*snapshot, *dead_zone),
            CameraPane::Disabled => {
                frame.render_widget(placeholder("Camera disabled (keyboard mode)"), inner);
                return;
            }
        };

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(0),
                Constraint::Length(1), // Direction
                Constraint::Length(1), // Hand status
                Constraint::Length(1), // Confidence
            ])
            .split(inner);

        match snapshot.preview.as_deref() {
            Some(preview) => frame.render_widget(
                PreviewWidget {
                    preview,
                    landmarks: snapshot.landmarks.as_deref(),
                    dead_zone,
                },
                rows[0],
            ),
            None => frame.render_widget(placeholder("Waiting for camera..."), rows[0]),
        }

        let state = &snapshot.state;
        let mut direction = vec![
            Span::styled("Direction: ", Style::default().fg(Color::Yellow)),
            Span::styled(
                state.direction.map(|d| d.label()).unwrap_or("-"),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
        ];
        if state.boosting {
            direction.push(Span::raw("  "));
            direction.push(Span::styled(
                "PINCH: BOOST",
                Style::default().fg(Color::Magenta),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(direction)), rows[1]);

        let hand = if state.hand_detected {
            Span::styled("Hand detected", Style::default().fg(Color::Green))
        } else {
            Span::styled("No hand", Style::default().fg(Color::DarkGray))
        };
        frame.render_widget(Paragraph::new(Line::from(hand)), rows[2]);

        let confidence = f64::from(state.confidence).clamp(0.0, 1.0);
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(confidence_color(confidence)))
            .ratio(confidence)
            .label(format!("Confidence: {}%", (confidence * 100.0).round() as u32));
        frame.render_widget(gauge, rows[3]);
    }

    fn render_controls(&self, camera: &CameraPane) -> Paragraph<'_> {
        let mut spans = Vec::new();
        if matches!(camera, CameraPane::Live { .. }) {
            spans.extend([
                Span::styled("Move hand", Style::default().fg(Color::Cyan)),
                Span::raw(" to steer | "),
                Span::styled("Pinch", Style::default().fg(Color::Cyan)),
                Span::raw(" to boost | "),
            ]);
        }
        spans.extend([
            Span::styled("↑↓←→/WASD", Style::default().fg(Color::Cyan)),
            Span::raw(" move | "),
            Span::styled("Space", Style::default().fg(Color::Cyan)),
            Span::raw(" pause | "),
            Span::styled("M", Style::default().fg(Color::Cyan)),
            Span::raw(" wrap | "),
            Span::styled("Q", Style::default().fg(Color::Red)),
            Span::raw(" quit"),
        ]);

        Paragraph::new(vec![Line::from(spans)]).alignment(Alignment::Center)
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

fn placeholder(message: &str) -> Paragraph<'_> {
    Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(message, Style::default().fg(Color::Gray))),
    ])
    .alignment(Alignment::Center)
}

fn particle_color(kind: ParticleKind) -> Color {
    match kind {
        ParticleKind::Fruit => Color::Red,
        ParticleKind::PowerUp => Color::Yellow,
        ParticleKind::Wrap => Color::Cyan,
    }
}

fn confidence_color(confidence: f64) -> Color {
    if confidence > 0.8 {
        Color::Green
    } else if confidence > 0.5 {
        Color::Yellow
    } else {
        Color::Red
    }
}

/// Camera thumbnail drawn with half-block characters, two pixels per cell
struct PreviewWidget<'a> {
    preview: &'a PreviewFrame,
    landmarks: Option<&'a HandLandmarks>,
    dead_zone: f32,
}

impl PreviewWidget<'_> {
    fn cell_at(area: Rect, u: f32, v: f32) -> Option<(u16, u16)> {
        if !(0.0..1.0).contains(&u) || !(0.0..1.0).contains(&v) {
            return None;
        }
        let x = area.x + (u * area.width as f32) as u16;
        let y = area.y + (v * area.height as f32) as u16;
        Some((x, y))
    }
}

impl Widget for PreviewWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let pixel_rows = f32::from(area.height) * 2.0;
        for cy in 0..area.height {
            let top_v = (f32::from(cy) * 2.0 + 0.5) / pixel_rows;
            let bottom_v = (f32::from(cy) * 2.0 + 1.5) / pixel_rows;
            for cx in 0..area.width {
                let u = (f32::from(cx) + 0.5) / f32::from(area.width);
                let [tr, tg, tb] = self.preview.sample(u, top_v);
                let [br, bg, bb] = self.preview.sample(u, bottom_v);
                if let Some(cell) = buf.cell_mut((area.x + cx, area.y + cy)) {
                    cell.set_symbol("▀")
                        .set_fg(Color::Rgb(tr, tg, tb))
                        .set_bg(Color::Rgb(br, bg, bb));
                }
            }
        }

        // Corners of the dead zone around the frame centre
        let (lo, hi) = (0.5 - self.dead_zone, 0.5 + self.dead_zone);
        for (u, v, symbol) in [(lo, lo, "┌"), (hi, lo, "┐"), (lo, hi, "└"), (hi, hi, "┘")] {
            if let Some(cell) = Self::cell_at(area, u, v).and_then(|p| buf.cell_mut(p)) {
                cell.set_symbol(symbol).set_fg(Color::LightGreen);
            }
        }

        if let Some(hand) = self.landmarks {
            for point in &hand.points {
                if let Some(cell) = Self::cell_at(area, point.x, point.y).and_then(|p| buf.cell_mut(p)) {
                    cell.set_symbol("●").set_fg(Color::LightGreen);
                }
            }
        }
    }
}

use std::time::{Duration, Instant};

pub struct GameMetrics {
    pub start_time: Instant,
    pub elapsed_time: Duration,
    pub high_score: u32,
    pub games_played: u32,
    /// Set when the last finished game beat the previous high score
    pub new_high_score: bool,
}

impl GameMetrics {
    pub fn new() -> Self {
        Self::with_high_score(0)
    }

    /// Start from a high score loaded from disk
    pub fn with_high_score(high_score: u32) -> Self {
        Self {
            start_time: Instant::now(),
            elapsed_time: Duration::ZERO,
            high_score,
            games_played: 0,
            new_high_score: false,
        }
    }

    pub fn update(&mut self) {
        self.elapsed_time = self.start_time.elapsed();
    }

    pub fn on_game_start(&mut self) {
        self.start_time = Instant::now();
        self.elapsed_time = Duration::ZERO;
        self.new_high_score = false;
    }

    pub fn on_game_over(&mut self, final_score: u32) {
        self.games_played += 1;
        self.update();
        self.new_high_score = final_score > self.high_score;
        if self.new_high_score {
            self.high_score = final_score;
        }
    }

    pub fn format_time(&self) -> String {
        let total_secs = self.elapsed_time.as_secs();
        let minutes = total_secs / 60;
        let seconds = total_secs % 60;
        format!("{:02}:{:02}", minutes, seconds)
    }
}

impl Default for GameMetrics {
    fn default() -> Self {
        Self::new()
    }
}

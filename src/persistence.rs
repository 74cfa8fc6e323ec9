//! High-score persistence
//!
//! The best score is kept in a one-field JSON file. A missing or unreadable
//! file counts as a high score of zero; it is recreated on the next save.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct HighScoreRecord {
    high_score: u32,
}

/// The persisted best score and the file it lives in
#[derive(Debug)]
pub struct HighScoreStore {
    path: PathBuf,
    best: u32,
}

impl HighScoreStore {
    /// Load the stored high score, falling back to zero on any failure
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let best = match read_record(&path) {
            Ok(Some(record)) => record.high_score,
            Ok(None) => 0,
            Err(err) => {
                warn!(path = %path.display(), error = %format!("{err:#}"), "ignoring unreadable high score file");
                0
            }
        };

        Self { path, best }
    }

    pub fn best(&self) -> u32 {
        self.best
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record a finished score. The file is rewritten only when `score` beats
    /// the stored best; returns whether it did.
    pub fn record(&mut self, score: u32) -> Result<bool> {
        if score <= self.best {
            return Ok(false);
        }

        self.best = score;
        self.save()?;
        info!(score, "new high score saved");
        Ok(true)
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }

        let json = serde_json::to_string(&HighScoreRecord {
            high_score: self.best,
        })
        .context("Failed to serialize high score")?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write high score to {:?}", self.path))?;
        Ok(())
    }
}

fn read_record(path: &Path) -> Result<Option<HighScoreRecord>> {
    if !path.exists() {
        return Ok(None);
    }
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read high score from {:?}", path))?;
    let record = serde_json::from_str(&json).context("Failed to parse high score")?;
    Ok(Some(record))
}

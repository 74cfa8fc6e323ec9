//! Hand-landmark detection.
//!
//! The model itself runs in a helper process (MediaPipe hand landmarker). The
//! helper prints `READY` once loaded. For every frame it reads a 12-byte header
//! (width, height, channels as little-endian u32) followed by the raw BGR
//! bytes, and answers with one line of JSON:
//!
//! ```json
//! {"hands": [{"handedness": "Right", "score": 0.93,
//!             "landmarks": [{"x": 0.41, "y": 0.62, "z": 0.0}, ...]}],
//!  "error": null}
//! ```

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info, warn};

use super::camera::Frame;
use super::config::DetectorConfig;
use super::error::GestureError;
use super::landmarks::{index, HandLandmarks, Landmark};

/// Anything that can find at most one hand in a frame
pub trait HandDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Option<HandLandmarks>, GestureError>;
}

#[derive(Deserialize, Debug)]
struct HandJson {
    #[serde(default)]
    handedness: Option<String>,
    score: f32,
    landmarks: Vec<Landmark>,
}

#[derive(Deserialize, Debug)]
struct DetectionResult {
    #[serde(default)]
    hands: Vec<HandJson>,
    #[serde(default)]
    error: Option<String>,
}

/// Parse one response line into the best hand above `min_confidence`
pub fn parse_response(
    line: &str,
    min_confidence: f32,
) -> Result<Option<HandLandmarks>, GestureError> {
    let result: DetectionResult = serde_json::from_str(line.trim())
        .map_err(|e| GestureError::Detector(format!("bad response {line:?}: {e}")))?;

    if let Some(error) = result.error {
        return Err(GestureError::Detector(error));
    }

    let hand = result
        .hands
        .into_iter()
        .filter(|hand| hand.score >= min_confidence)
        .filter(|hand| {
            let complete = hand.landmarks.len() == index::COUNT;
            if !complete {
                debug!(
                    count = hand.landmarks.len(),
                    handedness = ?hand.handedness,
                    "dropping hand with incomplete landmarks"
                );
            }
            complete
        })
        .max_by(|a, b| a.score.total_cmp(&b.score));

    Ok(hand.map(|hand| HandLandmarks::new(hand.landmarks, hand.score)))
}

/// Detector backed by a long-running helper process
pub struct ProcessDetector {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    min_confidence: f32,
    line: String,
}

impl ProcessDetector {
    /// Start the helper and wait for its `READY` line
    pub fn spawn(config: &DetectorConfig) -> Result<Self, GestureError> {
        info!(command = %config.command, args = ?config.args, "starting hand detector");

        let mut process = Command::new(&config.command)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        let (stdin, stdout) = match handshake(&mut process, config.ready_timeout()) {
            Ok(pipes) => pipes,
            Err(err) => {
                let _ = process.kill();
                let _ = process.wait();
                return Err(err);
            }
        };

        info!("hand detector ready");

        Ok(Self {
            process,
            stdin,
            stdout,
            min_confidence: config.min_confidence,
            line: String::new(),
        })
    }
}

/// Take the helper's pipes and wait up to `timeout` for its `READY` line
fn handshake(
    process: &mut Child,
    timeout: Duration,
) -> Result<(ChildStdin, BufReader<ChildStdout>), GestureError> {
    let stdin = process
        .stdin
        .take()
        .ok_or_else(|| GestureError::Detector("helper has no stdin".to_string()))?;
    let stdout = process
        .stdout
        .take()
        .ok_or_else(|| GestureError::Detector("helper has no stdout".to_string()))?;

    // Read on a side thread so a helper that never answers cannot block startup.
    // Killing the helper closes the pipe and ends the read.
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("detector-handshake".to_string())
        .spawn(move || {
            let mut stdout = BufReader::new(stdout);
            let mut ready = String::new();
            let read = stdout.read_line(&mut ready).map(|_| ready);
            let _ = tx.send((stdout, read));
        })
        .map_err(GestureError::ThreadSpawn)?;

    match rx.recv_timeout(timeout) {
        Ok((stdout, Ok(line))) if line.trim() == "READY" => Ok((stdin, stdout)),
        Ok((_, Ok(line))) => Err(GestureError::Detector(format!(
            "helper did not signal ready, got {:?}",
            line.trim()
        ))),
        Ok((_, Err(err))) => Err(GestureError::DetectorIo(err)),
        Err(_) => Err(GestureError::Detector(format!(
            "helper not ready after {} ms",
            timeout.as_millis()
        ))),
    }
}

impl HandDetector for ProcessDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Option<HandLandmarks>, GestureError> {
        self.stdin.write_all(&frame.width().to_le_bytes())?;
        self.stdin.write_all(&frame.height().to_le_bytes())?;
        self.stdin.write_all(&Frame::CHANNELS.to_le_bytes())?;
        self.stdin.write_all(frame.data())?;
        self.stdin.flush()?;

        self.line.clear();
        let read = self.stdout.read_line(&mut self.line)?;
        if read == 0 {
            return Err(GestureError::Detector("helper closed its output".to_string()));
        }

        parse_response(&self.line, self.min_confidence)
    }
}

impl Drop for ProcessDetector {
    fn drop(&mut self) {
        if let Err(err) = self.process.kill() {
            warn!(error = %err, "failed to stop hand detector");
        }
        let _ = self.process.wait();
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    use std::collections::VecDeque;

    use super::*;

    /// Returns scripted detections, then repeats the last one
    pub struct ScriptedDetector {
        script: VecDeque<Option<HandLandmarks>>,
        last: Option<HandLandmarks>,
    }

    impl ScriptedDetector {
        pub fn new(script: Vec<Option<HandLandmarks>>) -> Self {
            let last = script.last().cloned().flatten();
            Self {
                script: script.into(),
                last,
            }
        }
    }

    impl HandDetector for ScriptedDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<Option<HandLandmarks>, GestureError> {
            Ok(self.script.pop_front().unwrap_or_else(|| self.last.clone()))
        }
    }

    /// Blocks inside `detect`, like a helper stuck on a frame
    pub struct StalledDetector(pub std::time::Duration);

    impl HandDetector for StalledDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<Option<HandLandmarks>, GestureError> {
            std::thread::sleep(self.0);
            Ok(None)
        }
    }

    /// Always fails, like a crashed helper
    pub struct BrokenDetector;

    impl HandDetector for BrokenDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<Option<HandLandmarks>, GestureError> {
            Err(GestureError::Detector("helper crashed".to_string()))
        }
    }
}

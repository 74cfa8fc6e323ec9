//! The gesture capture thread and the state it publishes.
//!
//! One background thread owns the camera and the detector. Each frame it
//! classifies the hand and publishes a fresh [`GestureSnapshot`] under a single
//! mutex. The game loop copies the snapshot out once per frame. Both critical
//! sections are O(1): the preview and landmarks are shared through `Arc`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::game::Direction;

use super::camera::{open_first_available, CameraOpener, CaptureSettings};
use super::classifier::{Classification, GestureClassifier};
use super::config::GestureConfig;
use super::detector::HandDetector;
use super::error::GestureError;
use super::landmarks::HandLandmarks;
use super::preview::PreviewFrame;

/// Latest smoothed gesture reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureState {
    /// `None` when the hand is centred or absent
    pub direction: Option<Direction>,
    pub boosting: bool,
    pub timestamp: Instant,
    pub hand_detected: bool,
    pub confidence: f32,
}

impl GestureState {
    fn from_classification(classification: Classification) -> Self {
        Self {
            direction: classification.direction,
            boosting: classification.boosting,
            timestamp: Instant::now(),
            hand_detected: classification.hand_detected,
            confidence: classification.confidence,
        }
    }
}

impl Default for GestureState {
    fn default() -> Self {
        Self {
            direction: None,
            boosting: false,
            timestamp: Instant::now(),
            hand_detected: false,
            confidence: 0.0,
        }
    }
}

/// Everything the capture thread publishes for one frame
#[derive(Debug, Clone, Default)]
pub struct GestureSnapshot {
    pub state: GestureState,
    /// Most recent successfully read frame, mirrored and downsampled
    pub preview: Option<Arc<PreviewFrame>>,
    pub landmarks: Option<Arc<HandLandmarks>>,
}

/// Counters reported when the capture thread exits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureStats {
    pub frames: u64,
    pub read_failures: u64,
    pub detector_failures: u64,
}

type Shared = Arc<Mutex<GestureSnapshot>>;

fn lock(shared: &Mutex<GestureSnapshot>) -> MutexGuard<'_, GestureSnapshot> {
    // The publisher replaces the snapshot in one assignment, so a poisoned
    // lock still holds a whole snapshot
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle to the running capture thread
pub struct GestureControl {
    shared: Shared,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<CaptureStats>>,
    camera_index: i32,
    join_timeout: Duration,
}

impl GestureControl {
    /// Spawn the capture thread and wait until it has a working camera.
    ///
    /// Fails with [`GestureError::CameraUnavailable`] when none of the
    /// configured indices yields a frame.
    pub fn start(
        config: GestureConfig,
        opener: CameraOpener,
        detector: Box<dyn HandDetector>,
    ) -> Result<Self, GestureError> {
        let shared: Shared = Arc::new(Mutex::new(GestureSnapshot::default()));
        let stop = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = mpsc::channel();
        let join_timeout = config.join_timeout();

        let worker = CaptureWorker {
            classifier: GestureClassifier::new(config.clone()),
            config,
            shared: Arc::clone(&shared),
            stop: Arc::clone(&stop),
            detector,
        };

        let handle = thread::Builder::new()
            .name("gesture-capture".to_string())
            .spawn(move || worker.run(opener, ready_tx))
            .map_err(GestureError::ThreadSpawn)?;

        let camera_index = match ready_rx.recv() {
            Ok(Ok(index)) => index,
            Ok(Err(err)) => {
                let _ = handle.join();
                return Err(err);
            }
            Err(_) => {
                let _ = handle.join();
                return Err(GestureError::CaptureThreadExited);
            }
        };

        Ok(Self {
            shared,
            stop,
            handle: Some(handle),
            camera_index,
            join_timeout,
        })
    }

    /// Copy of the latest gesture state
    pub fn get_state(&self) -> GestureState {
        lock(&self.shared).state
    }

    /// Copy of the latest state together with the preview and landmarks
    pub fn snapshot(&self) -> GestureSnapshot {
        lock(&self.shared).clone()
    }

    pub fn camera_index(&self) -> i32 {
        self.camera_index
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Signal the capture thread and wait for it, up to the join timeout.
    ///
    /// Returns the thread's counters when it exited in time.
    pub fn stop(&mut self) -> Option<CaptureStats> {
        self.stop.store(true, Ordering::Relaxed);
        let handle = self.handle.take()?;

        let deadline = Instant::now() + self.join_timeout;
        while !handle.is_finished() {
            if Instant::now() >= deadline {
                warn!(
                    timeout_ms = self.join_timeout.as_millis() as u64,
                    "gesture capture thread did not stop in time; detaching"
                );
                return None;
            }
            thread::sleep(Duration::from_millis(5));
        }

        match handle.join() {
            Ok(stats) => Some(stats),
            Err(_) => {
                warn!("gesture capture thread panicked");
                None
            }
        }
    }
}

impl Drop for GestureControl {
    fn drop(&mut self) {
        self.stop();
    }
}

struct CaptureWorker {
    config: GestureConfig,
    classifier: GestureClassifier,
    shared: Shared,
    stop: Arc<AtomicBool>,
    detector: Box<dyn HandDetector>,
}

impl CaptureWorker {
    fn run(mut self, mut opener: CameraOpener, ready: Sender<Result<i32, GestureError>>) -> CaptureStats {
        let settings = CaptureSettings::from(&self.config);
        let (index, mut camera) =
            match open_first_available(&mut opener, &self.config.camera_indices, &settings) {
                Ok(opened) => opened,
                Err(err) => {
                    let _ = ready.send(Err(err));
                    return CaptureStats::default();
                }
            };
        let _ = ready.send(Ok(index));
        drop(ready);

        info!(camera = index, "gesture capture started");
        let mut stats = CaptureStats::default();

        while !self.stop.load(Ordering::Relaxed) {
            let frame = match camera.read_frame() {
                Ok(frame) if self.config.mirror => Some(frame.mirrored()),
                Ok(frame) => Some(frame),
                Err(err) => {
                    stats.read_failures += 1;
                    debug!(error = %err, "frame read failed");
                    None
                }
            };

            let hand = match frame.as_ref().map(|f| self.detector.detect(f)) {
                Some(Ok(hand)) => hand,
                Some(Err(err)) => {
                    stats.detector_failures += 1;
                    debug!(error = %err, "hand detection failed");
                    None
                }
                None => None,
            };

            let classification = self.classifier.observe(hand.as_ref());
            let preview = frame.as_ref().map(|f| {
                Arc::new(PreviewFrame::from_frame(
                    f,
                    self.config.preview_width,
                    self.config.preview_height,
                ))
            });
            self.publish(classification, preview, hand);
            stats.frames += 1;

            if frame.is_none() {
                thread::sleep(self.config.read_retry_delay());
            }
        }

        info!(
            frames = stats.frames,
            read_failures = stats.read_failures,
            detector_failures = stats.detector_failures,
            "gesture capture stopped"
        );
        stats
    }

    fn publish(
        &self,
        classification: Classification,
        preview: Option<Arc<PreviewFrame>>,
        hand: Option<HandLandmarks>,
    ) {
        let state = GestureState::from_classification(classification);
        let landmarks = hand.map(Arc::new);

        let mut published = lock(&self.shared);
        published.state = state;
        published.landmarks = landmarks;
        if preview.is_some() {
            published.preview = preview;
        }
    }
}

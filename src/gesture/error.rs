use thiserror::Error;

/// Failures on the capture side.
///
/// Only [`GestureError::CameraUnavailable`] and [`GestureError::ThreadSpawn`]
/// ever reach the caller of `GestureControl::start`. Frame and detector
/// failures are absorbed by the capture loop as "no hand this frame".
#[derive(Debug, Error)]
pub enum GestureError {
    #[error("no camera could be opened (tried indices {tried:?})")]
    CameraUnavailable { tried: Vec<i32> },

    #[error("failed to open camera {index}: {reason}")]
    CameraOpen { index: i32, reason: String },

    #[error("failed to read frame: {0}")]
    FrameRead(String),

    #[error("hand detector failed: {0}")]
    Detector(String),

    #[error("hand detector I/O failed")]
    DetectorIo(#[from] std::io::Error),

    #[error("failed to spawn gesture capture thread")]
    ThreadSpawn(#[source] std::io::Error),

    #[error("gesture capture thread exited before reporting camera status")]
    CaptureThreadExited,
}

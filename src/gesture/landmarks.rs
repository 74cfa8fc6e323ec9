use serde::{Deserialize, Serialize};

/// Hand landmark indices (MediaPipe 21-point hand model)
#[allow(dead_code)]
pub mod index {
    pub const WRIST: usize = 0;
    pub const THUMB_CMC: usize = 1;
    pub const THUMB_MCP: usize = 2;
    pub const THUMB_IP: usize = 3;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_FINGER_MCP: usize = 5;
    pub const INDEX_FINGER_PIP: usize = 6;
    pub const INDEX_FINGER_DIP: usize = 7;
    pub const INDEX_FINGER_TIP: usize = 8;
    pub const MIDDLE_FINGER_MCP: usize = 9;
    pub const MIDDLE_FINGER_TIP: usize = 12;
    pub const RING_FINGER_TIP: usize = 16;
    pub const PINKY_TIP: usize = 20;

    pub const COUNT: usize = 21;
}

/// A single landmark. `x` and `y` are normalized to the image (0.0 to 1.0).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }

    pub fn distance_to(&self, other: &Landmark) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// One detected hand for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct HandLandmarks {
    pub points: Vec<Landmark>,
    /// Detector confidence (0.0 to 1.0)
    pub confidence: f32,
}

impl HandLandmarks {
    pub fn new(points: Vec<Landmark>, confidence: f32) -> Self {
        Self { points, confidence }
    }

    pub fn point(&self, idx: usize) -> Option<Landmark> {
        self.points.get(idx).copied()
    }

    pub fn wrist(&self) -> Option<Landmark> {
        self.point(index::WRIST)
    }

    /// Base of the middle finger, a stable stand-in for the palm centre
    pub fn palm_center(&self) -> Option<Landmark> {
        self.point(index::MIDDLE_FINGER_MCP)
    }

    /// Thumb tip to index tip distance, the pinch measure
    pub fn pinch_distance(&self) -> Option<f32> {
        let thumb = self.point(index::THUMB_TIP)?;
        let index = self.point(index::INDEX_FINGER_TIP)?;
        Some(thumb.distance_to(&index))
    }

    pub fn tracked(&self, landmark: TrackedLandmark) -> Option<Landmark> {
        match landmark {
            TrackedLandmark::Wrist => self.wrist(),
            TrackedLandmark::PalmCenter => self.palm_center(),
        }
    }
}

/// Which landmark steers the snake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackedLandmark {
    #[default]
    Wrist,
    PalmCenter,
}

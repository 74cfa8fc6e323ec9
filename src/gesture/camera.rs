//! Camera access. The capture thread owns the camera for its whole life; the
//! rest of the crate only ever sees [`Frame`]s and preview images.

use tracing::{info, warn};

use super::config::GestureConfig;
use super::error::GestureError;

/// A raw BGR image, 3 bytes per pixel, rows top to bottom
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Frame {
    pub const CHANNELS: u32 = 3;

    /// Wrap packed BGR bytes; `None` if the length does not match the size
    pub fn from_bgr(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        let expected = width as usize * height as usize * Self::CHANNELS as usize;
        (width > 0 && height > 0 && data.len() == expected).then_some(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Pixel at (x, y) as RGB
    pub fn rgb(&self, x: u32, y: u32) -> [u8; 3] {
        let offset = ((y * self.width + x) * Self::CHANNELS) as usize;
        [
            self.data[offset + 2],
            self.data[offset + 1],
            self.data[offset],
        ]
    }

    /// Horizontally flipped copy
    pub fn mirrored(&self) -> Self {
        let stride = (self.width * Self::CHANNELS) as usize;
        let px = Self::CHANNELS as usize;
        let mut data = Vec::with_capacity(self.data.len());
        for row in self.data.chunks_exact(stride) {
            for pixel in row.chunks_exact(px).rev() {
                data.extend_from_slice(pixel);
            }
        }
        Self {
            width: self.width,
            height: self.height,
            data,
        }
    }
}

/// Requested capture format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSettings {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl From<&GestureConfig> for CaptureSettings {
    fn from(config: &GestureConfig) -> Self {
        Self {
            width: config.capture_width,
            height: config.capture_height,
            fps: config.capture_fps,
        }
    }
}

/// A source of video frames
pub trait Camera: Send {
    fn read_frame(&mut self) -> Result<Frame, GestureError>;
}

/// Opens a camera by device index. Runs on the capture thread.
pub type CameraOpener =
    Box<dyn FnMut(i32, &CaptureSettings) -> Result<Box<dyn Camera>, GestureError> + Send>;

/// Try each index in turn and keep the first camera that opens and delivers
/// a frame.
pub fn open_first_available(
    opener: &mut CameraOpener,
    indices: &[i32],
    settings: &CaptureSettings,
) -> Result<(i32, Box<dyn Camera>), GestureError> {
    for &index in indices {
        let mut camera = match opener(index, settings) {
            Ok(camera) => camera,
            Err(err) => {
                warn!(index, error = %err, "camera did not open");
                continue;
            }
        };

        match camera.read_frame() {
            Ok(frame) => {
                info!(
                    index,
                    width = frame.width(),
                    height = frame.height(),
                    "camera initialized"
                );
                return Ok((index, camera));
            }
            Err(err) => warn!(index, error = %err, "camera opened but returned no frame"),
        }
    }

    Err(GestureError::CameraUnavailable {
        tried: indices.to_vec(),
    })
}

/// The opener used by the binary: OpenCV `VideoCapture`
#[cfg(feature = "camera")]
pub fn default_opener() -> CameraOpener {
    Box::new(|index, settings| {
        opencv_backend::OpenCvCamera::open(index, settings)
            .map(|camera| Box::new(camera) as Box<dyn Camera>)
    })
}

/// Without the `camera` feature there is no capture backend, so every index
/// fails and startup reports the camera as unavailable.
#[cfg(not(feature = "camera"))]
pub fn default_opener() -> CameraOpener {
    Box::new(|index, _settings| {
        Err(GestureError::CameraOpen {
            index,
            reason: "built without the `camera` feature".to_string(),
        })
    })
}

#[cfg(feature = "camera")]
pub mod opencv_backend {
    use opencv::{
        core::Mat,
        prelude::*,
        videoio::{self, VideoCapture},
    };

    use super::{Camera, CaptureSettings, Frame, GestureError};

    pub struct OpenCvCamera {
        capture: VideoCapture,
        mat: Mat,
    }

    impl OpenCvCamera {
        pub fn open(index: i32, settings: &CaptureSettings) -> Result<Self, GestureError> {
            let open_err = |reason: String| GestureError::CameraOpen { index, reason };

            let mut capture =
                VideoCapture::new(index, videoio::CAP_ANY).map_err(|e| open_err(e.to_string()))?;
            if !capture.is_opened().unwrap_or(false) {
                return Err(open_err("device did not open".to_string()));
            }

            // Unsupported properties are ignored by the driver
            let _ = capture.set(videoio::CAP_PROP_FRAME_WIDTH, f64::from(settings.width));
            let _ = capture.set(videoio::CAP_PROP_FRAME_HEIGHT, f64::from(settings.height));
            let _ = capture.set(videoio::CAP_PROP_FPS, f64::from(settings.fps));
            let _ = capture.set(videoio::CAP_PROP_BUFFERSIZE, 1.0);

            Ok(Self {
                capture,
                mat: Mat::default(),
            })
        }
    }

    impl Camera for OpenCvCamera {
        fn read_frame(&mut self) -> Result<Frame, GestureError> {
            let read_err = GestureError::FrameRead;

            let ok = self
                .capture
                .read(&mut self.mat)
                .map_err(|e| read_err(e.to_string()))?;
            if !ok || self.mat.empty() {
                return Err(read_err("empty frame".to_string()));
            }
            if self.mat.channels() != Frame::CHANNELS as i32 {
                return Err(read_err(format!(
                    "expected {} channels, got {}",
                    Frame::CHANNELS,
                    self.mat.channels()
                )));
            }

            let width = self.mat.cols() as u32;
            let height = self.mat.rows() as u32;
            let data = self
                .mat
                .data_bytes()
                .map_err(|e| read_err(e.to_string()))?
                .to_vec();

            Frame::from_bgr(width, height, data)
                .ok_or_else(|| read_err("unexpected frame layout".to_string()))
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fakes::*;
    use super::*;

    fn settings() -> CaptureSettings {
        CaptureSettings::from(&GestureConfig::default())
    }

    #[test]
    fn test_frame_rejects_wrong_length() {
        assert!(Frame::from_bgr(2, 2, vec![0; 11]).is_none());
        assert!(Frame::from_bgr(0, 2, Vec::new()).is_none());
        assert!(Frame::from_bgr(2, 2, vec![0; 12]).is_some());
    }

    #[test]
    fn test_rgb_swaps_channels() {
        let frame = solid_frame(1, 1, [10, 20, 30]);
        assert_eq!(frame.rgb(0, 0), [30, 20, 10]);
    }

    #[test]
    fn test_mirrored() {
        // One row: blue, green, red
        let data = vec![255, 0, 0, 0, 255, 0, 0, 0, 255];
        let frame = Frame::from_bgr(3, 1, data).unwrap();
        let mirrored = frame.mirrored();

        assert_eq!(mirrored.rgb(0, 0), [255, 0, 0]);
        assert_eq!(mirrored.rgb(1, 0), [0, 255, 0]);
        assert_eq!(mirrored.rgb(2, 0), [0, 0, 255]);
    }

    #[test]
    fn test_open_falls_back_to_next_index() {
        let mut opener = opener_for(1);
        let (index, _camera) = open_first_available(&mut opener, &[0, 1, 2], &settings()).unwrap();
        assert_eq!(index, 1);
    }

    #[test]
    fn test_open_skips_camera_without_frames() {
        let mut opener: CameraOpener = Box::new(|index, _settings| {
            let camera = if index == 0 {
                ScriptedCamera::new(vec![Err("black screen".to_string())])
            } else {
                ScriptedCamera::steady()
            };
            Ok(Box::new(camera) as Box<dyn Camera>)
        });

        let (index, _camera) = open_first_available(&mut opener, &[0, 1], &settings()).unwrap();
        assert_eq!(index, 1);
    }

    #[test]
    fn test_open_reports_unavailable() {
        let mut opener = opener_for(9);
        let err = open_first_available(&mut opener, &[0, 1, 2], &settings())
            .err()
            .unwrap();
        assert!(matches!(
            err,
            GestureError::CameraUnavailable { ref tried } if tried == &vec![0, 1, 2]
        ));
    }

    #[cfg(not(feature = "camera"))]
    #[test]
    fn test_default_opener_without_feature() {
        let mut opener = default_opener();
        assert!(opener(0, &settings()).is_err());
    }
}

use super::camera::Frame;

/// A small RGB thumbnail of the latest camera frame, sized for the terminal
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewFrame {
    width: u32,
    height: u32,
    pixels: Vec<[u8; 3]>,
}

impl PreviewFrame {
    /// Nearest-neighbour downsample of `frame` to `width` x `height`
    pub fn from_frame(frame: &Frame, width: u32, height: u32) -> Self {
        let mut pixels = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            let src_y = (y * frame.height() / height).min(frame.height() - 1);
            for x in 0..width {
                let src_x = (x * frame.width() / width).min(frame.width() - 1);
                pixels.push(frame.rgb(src_x, src_y));
            }
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        self.pixels[(y * self.width + x) as usize]
    }

    /// Pixel at normalized coordinates, clamped to the image
    pub fn sample(&self, u: f32, v: f32) -> [u8; 3] {
        let x = ((u * self.width as f32) as u32).min(self.width - 1);
        let y = ((v * self.height as f32) as u32).min(self.height - 1);
        self.pixel(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::camera::fakes::solid_frame;

    #[test]
    fn test_downsample_size() {
        let frame = solid_frame(640, 480, [0, 128, 255]);
        let preview = PreviewFrame::from_frame(&frame, 64, 48);

        assert_eq!(preview.width(), 64);
        assert_eq!(preview.height(), 48);
        assert_eq!(preview.pixel(63, 47), [255, 128, 0]);
    }

    #[test]
    fn test_keeps_left_right_layout() {
        // Left half red, right half blue (BGR)
        let mut data = Vec::new();
        for _ in 0..2 {
            data.extend_from_slice(&[0, 0, 255, 0, 0, 255, 255, 0, 0, 255, 0, 0]);
        }
        let frame = Frame::from_bgr(4, 2, data).unwrap();
        let preview = PreviewFrame::from_frame(&frame, 2, 1);

        assert_eq!(preview.pixel(0, 0), [255, 0, 0]);
        assert_eq!(preview.pixel(1, 0), [0, 0, 255]);
    }

    #[test]
    fn test_sample_clamps() {
        let frame = solid_frame(4, 4, [1, 2, 3]);
        let preview = PreviewFrame::from_frame(&frame, 4, 4);
        assert_eq!(preview.sample(1.0, 1.0), [3, 2, 1]);
        assert_eq!(preview.sample(-0.5, 0.0), [3, 2, 1]);
    }
}

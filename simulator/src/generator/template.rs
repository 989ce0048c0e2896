use image::{Rgba, RgbaImage};
use lookoutcore::interface::Frame;
use lookoutcore::FrameSource;
use std::time::{Duration, Instant};

/// Frame source painting a slowly scrolling gradient, standing in for a
/// webcam feed.
#[derive(Debug, Clone)]
pub struct SyntheticCamera {
    width: u32,
    height: u32,
    ready_at: Instant,
    captured: u64,
}

impl SyntheticCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ready_at: Instant::now(),
            captured: 0,
        }
    }

    /// Reports not-ready until `warmup` has elapsed, like a camera opening.
    pub fn with_warmup(mut self, warmup: Duration) -> Self {
        self.ready_at = Instant::now() + warmup;
        self
    }
}

impl FrameSource for SyntheticCamera {
    fn is_ready(&self) -> bool {
        Instant::now() >= self.ready_at
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn capture(&mut self) -> Option<Frame> {
        if !self.is_ready() || self.width == 0 || self.height == 0 {
            return None;
        }
        self.captured += 1;

        let shift = (self.captured % 256) as u32;
        let (width, height) = (self.width, self.height);
        let image = RgbaImage::from_fn(width, height, |x, y| {
            let r = (x * 255 / width + shift) % 256;
            let g = y * 255 / height;
            Rgba([r as u8, g as u8, 96, 255])
        });
        Some(Frame::new(image))
    }
}

use chrono::{DateTime, Local};
use image::{Rgba, RgbaImage};

/// Captured camera frame.
#[derive(Debug, Clone)]
pub struct Frame {
    image: RgbaImage,
    captured_at: DateTime<Local>,
}

impl Frame {
    pub fn new(image: RgbaImage) -> Self {
        Self::captured(image, Local::now())
    }

    pub fn captured(image: RgbaImage, captured_at: DateTime<Local>) -> Self {
        Self { image, captured_at }
    }

    /// Uniformly colored frame, handy for stand-in cameras.
    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> Self {
        Self::new(RgbaImage::from_pixel(width, height, Rgba(color)))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn is_empty(&self) -> bool {
        self.image.width() == 0 || self.image.height() == 0
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn captured_at(&self) -> DateTime<Local> {
        self.captured_at
    }
}

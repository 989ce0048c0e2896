use crate::interface::{BBox, Frame};
use serde::{Deserialize, Serialize};

/// Average glyph advance, as a fraction of the font size, used when no
/// font metrics are available.
const APPROX_GLYPH_ADVANCE: f32 = 0.55;

/// Failure to draw onto a surface.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SurfaceError {
    #[error("frame source cannot supply region {0:?}")]
    SourceUnavailable(Rect),
}

/// Straight-alpha color with 8-bit channels and a fractional alpha.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const CYAN: Color = Color::rgb(0, 255, 255);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0.0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn is_invisible(&self) -> bool {
        self.a <= 0.0
    }

    pub fn to_pixel(&self) -> image::Rgba<u8> {
        let alpha = (self.a.clamp(0.0, 1.0) * 255.0).round() as u8;
        image::Rgba([self.r, self.g, self.b, alpha])
    }
}

/// Axis-aligned rectangle in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whole-pixel region `(x, y, width, height)` of this rectangle inside
    /// a `bound_w` x `bound_h` area, or `None` when nothing overlaps.
    pub fn clip(&self, bound_w: u32, bound_h: u32) -> Option<(u32, u32, u32, u32)> {
        if !(self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite())
        {
            return None;
        }
        let x0 = self.x.round().max(0.0);
        let y0 = self.y.round().max(0.0);
        let x1 = (self.x + self.width).round().min(bound_w as f32);
        let y1 = (self.y + self.height).round().min(bound_h as f32);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some((x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32))
    }
}

impl From<BBox> for Rect {
    fn from(bbox: BBox) -> Self {
        Rect::new(bbox.x, bbox.y, bbox.width, bbox.height)
    }
}

/// Width of `text` at `font_size` without real font metrics.
pub fn approximate_text_width(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * font_size * APPROX_GLYPH_ADVANCE
}

/// Drawing target the renderer paints overlays on.
///
/// Coordinates share the pixel space of the detection bounding boxes.
pub trait DrawSurface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Resets every pixel to transparent.
    fn clear(&mut self);
    fn fill_rect(&mut self, rect: Rect, color: Color);
    fn stroke_rect(&mut self, rect: Rect, color: Color, line_width: f32);
    fn measure_text(&self, text: &str, font_size: f32) -> f32;
    /// Draws `text` with its top-left corner at `(x, y)`.
    fn fill_text(&mut self, text: &str, x: f32, y: f32, font_size: f32, color: Color);
    /// Paints a blurred copy of the frame region under `rect` at the same place.
    fn draw_blurred(&mut self, frame: &Frame, rect: Rect, radius: f32) -> Result<(), SurfaceError>;
}

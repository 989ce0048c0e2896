use crate::interface::Frame;
use crate::prelude::{DashResult, DashboardError};
use crate::render::surface::{approximate_text_width, Color, DrawSurface, Rect, SurfaceError};
use ab_glyph::{FontArc, PxScale};
use image::{imageops, DynamicImage, ImageFormat, Pixel, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use imageproc::filter::gaussian_blur_f32;
use std::io::Cursor;
use std::path::Path;

/// Pixel-buffer surface used for PNG export.
///
/// Label text needs a TrueType font; without one the label backgrounds
/// are still painted but the glyphs are skipped.
pub struct RasterSurface {
    image: RgbaImage,
    font: Option<FontArc>,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
            font: None,
        }
    }

    /// Surface that starts out as a copy of the camera image.
    pub fn from_frame(frame: &Frame) -> Self {
        Self {
            image: frame.image().clone(),
            font: None,
        }
    }

    pub fn with_font(mut self, font: FontArc) -> Self {
        self.font = Some(font);
        self
    }

    pub fn load_font<P: AsRef<Path>>(path: P) -> DashResult<FontArc> {
        let bytes = std::fs::read(path.as_ref())?;
        FontArc::try_from_vec(bytes).map_err(|err| {
            DashboardError::Font(format!("{}: {}", path.as_ref().display(), err))
        })
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Shrinks the buffer to at most `max_width` pixels wide, keeping the aspect ratio.
    pub fn downscale(&mut self, max_width: u32) {
        let (width, height) = self.image.dimensions();
        if max_width == 0 || width <= max_width {
            return;
        }
        let scaled_height = (u64::from(height) * u64::from(max_width) / u64::from(width)).max(1);
        self.image = imageops::resize(
            &self.image,
            max_width,
            scaled_height as u32,
            imageops::FilterType::Triangle,
        );
    }

    pub fn encode_png(&self) -> DashResult<Vec<u8>> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(self.image.clone())
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }

    fn blend_region(&mut self, rect: Rect, color: Color) {
        if color.is_invisible() {
            return;
        }
        let Some((x0, y0, w, h)) = rect.clip(self.image.width(), self.image.height()) else {
            return;
        };
        let pixel = color.to_pixel();
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                self.image.get_pixel_mut(x, y).blend(&pixel);
            }
        }
    }
}

impl DrawSurface for RasterSurface {
    fn width(&self) -> u32 {
        self.image.width()
    }

    fn height(&self) -> u32 {
        self.image.height()
    }

    fn clear(&mut self) {
        for pixel in self.image.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 0]);
        }
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.blend_region(rect, color);
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color, line_width: f32) {
        // The stroke straddles the outline, half inside and half outside.
        let half = line_width / 2.0;
        let outer = Rect::new(
            rect.x - half,
            rect.y - half,
            rect.width + line_width,
            rect.height + line_width,
        );
        let side_height = rect.height - line_width;
        let bands = [
            Rect::new(outer.x, outer.y, outer.width, line_width),
            Rect::new(outer.x, rect.y + rect.height - half, outer.width, line_width),
            Rect::new(outer.x, rect.y + half, line_width, side_height),
            Rect::new(rect.x + rect.width - half, rect.y + half, line_width, side_height),
        ];
        for band in bands {
            self.blend_region(band, color);
        }
    }

    fn measure_text(&self, text: &str, font_size: f32) -> f32 {
        match &self.font {
            Some(font) => text_size(PxScale::from(font_size), font, text).0 as f32,
            None => approximate_text_width(text, font_size),
        }
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, font_size: f32, color: Color) {
        if let Some(font) = &self.font {
            draw_text_mut(
                &mut self.image,
                color.to_pixel(),
                x.round() as i32,
                y.round() as i32,
                PxScale::from(font_size),
                font,
                text,
            );
        }
    }

    fn draw_blurred(&mut self, frame: &Frame, rect: Rect, radius: f32) -> Result<(), SurfaceError> {
        let bound_w = frame.width().min(self.image.width());
        let bound_h = frame.height().min(self.image.height());
        let (x, y, w, h) = rect
            .clip(bound_w, bound_h)
            .ok_or(SurfaceError::SourceUnavailable(rect))?;
        let region = imageops::crop_imm(frame.image(), x, y, w, h).to_image();
        let blurred = if radius > 0.0 {
            gaussian_blur_f32(&region, radius)
        } else {
            region
        };
        imageops::overlay(&mut self.image, &blurred, x as i64, y as i64);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downscale_keeps_aspect_ratio_and_skips_small_images() {
        let mut surface = RasterSurface::from_frame(&Frame::solid(1280, 720, [9, 9, 9, 255]));
        surface.downscale(640);
        assert_eq!(surface.image().dimensions(), (640, 360));
        assert_eq!(surface.image().get_pixel(10, 10), &Rgba([9, 9, 9, 255]));

        surface.downscale(800);
        assert_eq!(surface.image().dimensions(), (640, 360));
    }

    #[test]
    fn translucent_fill_blends_over_opaque_pixels() {
        let mut surface = RasterSurface::new(8, 8);
        surface.fill_rect(Rect::new(0.0, 0.0, 8.0, 8.0), Color::rgb(0, 0, 255));
        surface.fill_rect(Rect::new(0.0, 0.0, 4.0, 4.0), Color::rgba(255, 0, 0, 0.5));

        let mixed = surface.image().get_pixel(1, 1).0;
        assert!(mixed[0] > 100 && mixed[2] > 100);
        assert_eq!(mixed[3], 255);
        assert_eq!(surface.image().get_pixel(6, 6).0, [0, 0, 255, 255]);
    }

    #[test]
    fn invisible_fill_leaves_surface_untouched() {
        let mut surface = RasterSurface::new(4, 4);
        surface.fill_rect(Rect::new(0.0, 0.0, 4.0, 4.0), Color::rgba(255, 0, 0, 0.0));
        assert!(surface.image().pixels().all(|p| p.0 == [0, 0, 0, 0]));
    }

    #[test]
    fn stroke_paints_outline_but_not_interior() {
        let mut surface = RasterSurface::new(40, 40);
        surface.stroke_rect(Rect::new(10.0, 10.0, 20.0, 20.0), Color::RED, 4.0);

        assert_eq!(surface.image().get_pixel(10, 20).0, [255, 0, 0, 255]);
        assert_eq!(surface.image().get_pixel(8, 8).0, [255, 0, 0, 255]);
        assert_eq!(surface.image().get_pixel(20, 20).0, [0, 0, 0, 0]);
        assert_eq!(surface.image().get_pixel(5, 5).0, [0, 0, 0, 0]);
    }

    #[test]
    fn blur_copies_frame_pixels_into_region() {
        let mut surface = RasterSurface::new(32, 32);
        let frame = Frame::solid(32, 32, [40, 80, 120, 255]);
        surface
            .draw_blurred(&frame, Rect::new(4.0, 4.0, 8.0, 8.0), 12.0)
            .unwrap();

        let inside = surface.image().get_pixel(6, 6).0;
        assert_eq!(inside[3], 255);
        assert!((inside[2] as i32 - 120).abs() <= 2);
        assert_eq!(surface.image().get_pixel(20, 20).0, [0, 0, 0, 0]);
    }

    #[test]
    fn blur_fails_when_frame_is_empty() {
        let mut surface = RasterSurface::new(32, 32);
        let frame = Frame::solid(0, 0, [0, 0, 0, 255]);
        assert!(surface
            .draw_blurred(&frame, Rect::new(0.0, 0.0, 8.0, 8.0), 12.0)
            .is_err());
    }

    #[test]
    fn encodes_png_signature() {
        let surface = RasterSurface::new(4, 4);
        let bytes = surface.encode_png().unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn missing_font_file_is_an_error() {
        assert!(RasterSurface::load_font("/nonexistent/font.ttf").is_err());
    }
}

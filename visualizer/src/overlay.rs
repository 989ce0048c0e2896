use iced::{
    mouse,
    widget::canvas::{self, Frame, Geometry, Path, Stroke},
    Color, Pixels, Point, Rectangle, Renderer, Size, Theme,
};
use lookoutcore::interface::Frame as VideoFrame;
use lookoutcore::render::{self, heat_color, DisplayList, DrawSurface, Rect, SurfaceError};

fn to_iced(color: render::Color) -> Color {
    Color::from_rgba8(color.r, color.g, color.b, color.a)
}

/// Maps surface pixels into the canvas, letterboxed to keep the aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scale: f32,
    pub offset: Point,
}

impl Viewport {
    pub fn fit(surface: (u32, u32), bounds: Size) -> Option<Self> {
        let (width, height) = surface;
        if width == 0 || height == 0 || bounds.width <= 0.0 || bounds.height <= 0.0 {
            return None;
        }
        let scale = (bounds.width / width as f32).min(bounds.height / height as f32);
        Some(Self {
            scale,
            offset: Point::new(
                (bounds.width - width as f32 * scale) / 2.0,
                (bounds.height - height as f32 * scale) / 2.0,
            ),
        })
    }

    fn point(&self, x: f32, y: f32) -> Point {
        Point::new(self.offset.x + x * self.scale, self.offset.y + y * self.scale)
    }

    fn size(&self, rect: &Rect) -> Size {
        Size::new(rect.width * self.scale, rect.height * self.scale)
    }
}

/// Canvas frame seen through the core drawing interface so a recorded
/// display list can be replayed onto it.
struct CanvasSurface<'a> {
    frame: &'a mut Frame,
    surface: (u32, u32),
    viewport: Viewport,
    backdrop: bool,
}

impl DrawSurface for CanvasSurface<'_> {
    fn width(&self) -> u32 {
        self.surface.0
    }

    fn height(&self) -> u32 {
        self.surface.1
    }

    fn clear(&mut self) {
        if self.backdrop {
            return;
        }
        let origin = self.viewport.point(0.0, 0.0);
        let size = self.viewport.size(&Rect::new(
            0.0,
            0.0,
            self.surface.0 as f32,
            self.surface.1 as f32,
        ));
        self.frame
            .fill_rectangle(origin, size, Color::from_rgb(0.08, 0.08, 0.1));
    }

    fn fill_rect(&mut self, rect: Rect, color: render::Color) {
        if color.is_invisible() {
            return;
        }
        self.frame.fill_rectangle(
            self.viewport.point(rect.x, rect.y),
            self.viewport.size(&rect),
            to_iced(color),
        );
    }

    fn stroke_rect(&mut self, rect: Rect, color: render::Color, line_width: f32) {
        let path = Path::rectangle(self.viewport.point(rect.x, rect.y), self.viewport.size(&rect));
        self.frame.stroke(
            &path,
            Stroke::default()
                .with_width(line_width * self.viewport.scale)
                .with_color(to_iced(color)),
        );
    }

    fn measure_text(&self, text: &str, font_size: f32) -> f32 {
        render::surface::approximate_text_width(text, font_size)
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, font_size: f32, color: render::Color) {
        self.frame.fill_text(canvas::Text {
            content: text.to_string(),
            position: self.viewport.point(x, y),
            color: to_iced(color),
            size: Pixels(font_size * self.viewport.scale),
            ..canvas::Text::default()
        });
    }

    fn draw_blurred(
        &mut self,
        _frame: &VideoFrame,
        rect: Rect,
        _radius: f32,
    ) -> Result<(), SurfaceError> {
        // Frames stay on the session side; the backdrop arrives pre-blurred.
        Err(SurfaceError::SourceUnavailable(rect))
    }
}

/// Live overlay: replays the session's draw list scaled to the widget.
///
/// With a backdrop the canvas stays transparent so the camera image
/// stacked underneath shows through.
pub struct Overlay {
    display: DisplayList,
    backdrop: bool,
}

impl Overlay {
    pub fn new(display: &DisplayList, backdrop: bool) -> Self {
        Self {
            display: display.clone(),
            backdrop,
        }
    }
}

impl<Message> canvas::Program<Message> for Overlay {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        if !self.backdrop {
            frame.fill_rectangle(
                Point::ORIGIN,
                bounds.size(),
                Color::from_rgb(0.02, 0.02, 0.04),
            );
        }

        let surface = (self.display.width(), self.display.height());
        if let Some(viewport) = Viewport::fit(surface, bounds.size()) {
            let mut target = CanvasSurface {
                frame: &mut frame,
                surface,
                viewport,
                backdrop: self.backdrop,
            };
            self.display.replay(&mut target, None);
        }

        vec![frame.into_geometry()]
    }
}

/// Swatch strip for the heatmap ramp, low density on the left.
pub struct Legend;

const LEGEND_STEPS: usize = 10;

impl<Message> canvas::Program<Message> for Legend {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        let step = bounds.width / LEGEND_STEPS as f32;
        for index in 0..LEGEND_STEPS {
            let t = (index as f32 + 0.5) / LEGEND_STEPS as f32;
            frame.fill_rectangle(
                Point::new(index as f32 * step, 0.0),
                Size::new(step, bounds.height),
                to_iced(heat_color(t)),
            );
        }
        vec![frame.into_geometry()]
    }
}

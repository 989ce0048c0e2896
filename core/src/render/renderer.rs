use crate::interface::{Detection, Frame};
use crate::render::density::DensityGrid;
use crate::render::surface::{Color, DrawSurface, Rect};

/// Placeholder painted over a person when the blurred crop cannot be drawn.
pub const PRIVACY_FALLBACK: Color = Color::rgba(200, 200, 200, 0.7);

const PERSON_FILL: Color = Color::rgba(255, 0, 0, 0.2);
const OTHER_FILL: Color = Color::rgba(255, 0, 0, 0.0);

/// Fixed overlay styling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderStyle {
    pub font_size: f32,
    pub label_padding: f32,
    pub line_width: f32,
    pub blur_radius: f32,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            font_size: 16.0,
            label_padding: 4.0,
            line_width: 4.0,
            blur_radius: 12.0,
        }
    }
}

/// Everything one draw call needs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderRequest<'a> {
    /// Latest live batch.
    pub detections: &'a [Detection],
    /// History window that replaces the live batch when non-empty.
    pub playback: Option<&'a [Detection]>,
    pub privacy_mode: bool,
    /// Frame to take blurred crops from in privacy mode.
    pub frame: Option<&'a Frame>,
    pub heatmap: Option<&'a DensityGrid>,
}

impl<'a> RenderRequest<'a> {
    fn detections_to_draw(&self) -> &'a [Detection] {
        match self.playback {
            Some(window) if !window.is_empty() => window,
            _ => self.detections,
        }
    }
}

/// Draws heatmap cells, boxes and labels onto a surface.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    style: RenderStyle,
}

impl Renderer {
    pub fn new(style: RenderStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &RenderStyle {
        &self.style
    }

    pub fn render<S>(&self, request: &RenderRequest<'_>, surface: &mut S)
    where
        S: DrawSurface + ?Sized,
    {
        surface.clear();

        // Heatmap goes first so the boxes stay on top of it.
        if let Some(grid) = request.heatmap {
            for cell in grid.cells() {
                surface.fill_rect(cell.rect, cell.color);
            }
        }

        for detection in request.detections_to_draw() {
            self.draw_detection(detection, request, surface);
        }
    }

    fn draw_detection<S>(&self, detection: &Detection, request: &RenderRequest<'_>, surface: &mut S)
    where
        S: DrawSurface + ?Sized,
    {
        let rect = Rect::from(detection.bbox);
        let person = detection.is_person();
        let class_color = if person { Color::RED } else { Color::CYAN };

        match request.frame {
            Some(frame) if request.privacy_mode && person => {
                if surface
                    .draw_blurred(frame, rect, self.style.blur_radius)
                    .is_err()
                {
                    surface.fill_rect(rect, PRIVACY_FALLBACK);
                }
            }
            _ => {
                surface.stroke_rect(rect, class_color, self.style.line_width);
                surface.fill_rect(rect, if person { PERSON_FILL } else { OTHER_FILL });
            }
        }

        let text_width = surface.measure_text(&detection.class, self.style.font_size);
        surface.fill_rect(
            Rect::new(
                rect.x,
                rect.y,
                text_width + self.style.label_padding,
                self.style.font_size + self.style.label_padding,
            ),
            class_color,
        );
        surface.fill_text(
            &detection.class,
            rect.x,
            rect.y,
            self.style.font_size,
            Color::BLACK,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::{BBox, DensityPoint, RawDetection};
    use crate::render::display::{DisplayList, DrawCommand};
    use crate::render::surface::approximate_text_width;
    use chrono::Local;

    fn detection(class: &str, bbox: [f32; 4]) -> Detection {
        RawDetection::new(class, 0.9, BBox::from(bbox)).stamp(Local::now())
    }

    fn blur_count(list: &DisplayList) -> usize {
        list.commands()
            .iter()
            .filter(|c| matches!(c, DrawCommand::Blur { .. }))
            .count()
    }

    #[test]
    fn person_gets_red_box_label_and_text() {
        let person = [detection("person", [10.0, 10.0, 50.0, 50.0])];
        let mut list = DisplayList::new(640, 480);
        Renderer::default().render(
            &RenderRequest {
                detections: &person,
                ..Default::default()
            },
            &mut list,
        );

        let rect = Rect::new(10.0, 10.0, 50.0, 50.0);
        let label = Rect::new(10.0, 10.0, approximate_text_width("person", 16.0) + 4.0, 20.0);
        assert_eq!(
            list.commands(),
            &[
                DrawCommand::Clear,
                DrawCommand::StrokeRect {
                    rect,
                    color: Color::RED,
                    line_width: 4.0
                },
                DrawCommand::FillRect {
                    rect,
                    color: Color::rgba(255, 0, 0, 0.2)
                },
                DrawCommand::FillRect {
                    rect: label,
                    color: Color::RED
                },
                DrawCommand::FillText {
                    text: "person".into(),
                    x: 10.0,
                    y: 10.0,
                    font_size: 16.0,
                    color: Color::BLACK
                },
            ]
        );
        assert_eq!(blur_count(&list), 0);
    }

    #[test]
    fn other_classes_are_cyan_with_invisible_fill() {
        let cup = [detection("cup", [5.0, 6.0, 7.0, 8.0])];
        let mut list = DisplayList::new(64, 64);
        Renderer::default().render(
            &RenderRequest {
                detections: &cup,
                ..Default::default()
            },
            &mut list,
        );

        assert!(matches!(
            list.commands()[1],
            DrawCommand::StrokeRect { color, .. } if color == Color::CYAN
        ));
        assert!(matches!(
            list.commands()[2],
            DrawCommand::FillRect { color, .. } if color.is_invisible()
        ));
        assert!(matches!(
            list.commands()[3],
            DrawCommand::FillRect { color, .. } if color == Color::CYAN
        ));
    }

    #[test]
    fn privacy_mode_blurs_person_instead_of_outlining() {
        let person = [detection("person", [10.0, 10.0, 50.0, 50.0])];
        let frame = Frame::solid(640, 480, [30, 30, 30, 255]);
        let mut list = DisplayList::new(640, 480);
        Renderer::default().render(
            &RenderRequest {
                detections: &person,
                privacy_mode: true,
                frame: Some(&frame),
                ..Default::default()
            },
            &mut list,
        );

        assert_eq!(
            list.commands()[1],
            DrawCommand::Blur {
                rect: Rect::new(10.0, 10.0, 50.0, 50.0),
                radius: 12.0
            }
        );
        assert!(!list
            .commands()
            .iter()
            .any(|c| matches!(c, DrawCommand::StrokeRect { .. })));
    }

    #[test]
    fn privacy_blur_failure_falls_back_to_gray_fill() {
        let person = [detection("person", [700.0, 10.0, 50.0, 50.0])];
        let frame = Frame::solid(640, 480, [30, 30, 30, 255]);
        let mut list = DisplayList::new(640, 480);
        Renderer::default().render(
            &RenderRequest {
                detections: &person,
                privacy_mode: true,
                frame: Some(&frame),
                ..Default::default()
            },
            &mut list,
        );

        assert_eq!(
            list.commands()[1],
            DrawCommand::FillRect {
                rect: Rect::new(700.0, 10.0, 50.0, 50.0),
                color: PRIVACY_FALLBACK
            }
        );
        assert_eq!(blur_count(&list), 0);
    }

    #[test]
    fn privacy_without_frame_outlines_person() {
        let person = [detection("person", [10.0, 10.0, 50.0, 50.0])];
        let mut list = DisplayList::new(640, 480);
        Renderer::default().render(
            &RenderRequest {
                detections: &person,
                privacy_mode: true,
                ..Default::default()
            },
            &mut list,
        );
        assert!(matches!(list.commands()[1], DrawCommand::StrokeRect { .. }));
    }

    #[test]
    fn playback_window_replaces_live_batch() {
        let live = [detection("cup", [0.0, 0.0, 5.0, 5.0])];
        let window = [
            detection("dog", [1.0, 1.0, 5.0, 5.0]),
            detection("dog", [2.0, 2.0, 5.0, 5.0]),
        ];
        let mut list = DisplayList::new(64, 64);
        Renderer::default().render(
            &RenderRequest {
                detections: &live,
                playback: Some(&window),
                ..Default::default()
            },
            &mut list,
        );

        let texts: Vec<_> = list
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::FillText { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["dog", "dog"]);
    }

    #[test]
    fn heatmap_cells_are_painted_before_boxes() {
        let live = [detection("cup", [0.0, 0.0, 10.0, 10.0])];
        let grid = DensityGrid::from_points(vec![DensityPoint { x: 5.0, y: 5.0 }], 64, 64);
        let mut list = DisplayList::new(64, 64);
        Renderer::default().render(
            &RenderRequest {
                detections: &live,
                heatmap: Some(&grid),
                ..Default::default()
            },
            &mut list,
        );

        assert_eq!(
            list.commands()[1],
            DrawCommand::FillRect {
                rect: Rect::new(0.0, 0.0, 32.0, 32.0),
                color: Color::rgba(255, 0, 0, 0.45)
            }
        );
        assert!(matches!(list.commands()[2], DrawCommand::StrokeRect { .. }));
    }
}

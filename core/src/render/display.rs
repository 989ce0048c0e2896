use crate::interface::Frame;
use crate::render::renderer::PRIVACY_FALLBACK;
use crate::render::surface::{approximate_text_width, Color, DrawSurface, Rect, SurfaceError};
use serde::{Deserialize, Serialize};

/// One recorded drawing operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    Clear,
    FillRect {
        rect: Rect,
        color: Color,
    },
    StrokeRect {
        rect: Rect,
        color: Color,
        line_width: f32,
    },
    FillText {
        text: String,
        x: f32,
        y: f32,
        font_size: f32,
        color: Color,
    },
    Blur {
        rect: Rect,
        radius: f32,
    },
}

/// Surface that records draw calls so they can be shipped or replayed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayList {
    width: u32,
    height: u32,
    commands: Vec<DrawCommand>,
}

impl DisplayList {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn into_commands(self) -> Vec<DrawCommand> {
        self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Re-issues every recorded command on `target`.
    ///
    /// Blur regions need the frame they were recorded against; without it,
    /// or if the target cannot blur, the placeholder fill is painted.
    pub fn replay<S>(&self, target: &mut S, frame: Option<&Frame>)
    where
        S: DrawSurface + ?Sized,
    {
        for command in &self.commands {
            match command {
                DrawCommand::Clear => target.clear(),
                DrawCommand::FillRect { rect, color } => target.fill_rect(*rect, *color),
                DrawCommand::StrokeRect {
                    rect,
                    color,
                    line_width,
                } => target.stroke_rect(*rect, *color, *line_width),
                DrawCommand::FillText {
                    text,
                    x,
                    y,
                    font_size,
                    color,
                } => target.fill_text(text, *x, *y, *font_size, *color),
                DrawCommand::Blur { rect, radius } => {
                    let blurred = frame
                        .map(|frame| target.draw_blurred(frame, *rect, *radius).is_ok())
                        .unwrap_or(false);
                    if !blurred {
                        target.fill_rect(*rect, PRIVACY_FALLBACK);
                    }
                }
            }
        }
    }
}

impl DrawSurface for DisplayList {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn clear(&mut self) {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear);
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.commands.push(DrawCommand::FillRect { rect, color });
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color, line_width: f32) {
        self.commands.push(DrawCommand::StrokeRect {
            rect,
            color,
            line_width,
        });
    }

    fn measure_text(&self, text: &str, font_size: f32) -> f32 {
        approximate_text_width(text, font_size)
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, font_size: f32, color: Color) {
        self.commands.push(DrawCommand::FillText {
            text: text.to_string(),
            x,
            y,
            font_size,
            color,
        });
    }

    fn draw_blurred(&mut self, frame: &Frame, rect: Rect, radius: f32) -> Result<(), SurfaceError> {
        if frame.is_empty() || rect.clip(frame.width(), frame.height()).is_none() {
            return Err(SurfaceError::SourceUnavailable(rect));
        }
        self.commands.push(DrawCommand::Blur { rect, radius });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_drops_earlier_commands() {
        let mut list = DisplayList::new(64, 64);
        list.fill_rect(Rect::new(0.0, 0.0, 4.0, 4.0), Color::RED);
        list.clear();
        assert_eq!(list.commands(), &[DrawCommand::Clear]);
    }

    #[test]
    fn blur_outside_frame_is_refused() {
        let mut list = DisplayList::new(64, 64);
        let frame = Frame::solid(32, 32, [10, 10, 10, 255]);
        let rect = Rect::new(40.0, 40.0, 10.0, 10.0);
        assert_eq!(
            list.draw_blurred(&frame, rect, 12.0),
            Err(SurfaceError::SourceUnavailable(rect))
        );
        assert!(list.is_empty());
    }

    #[test]
    fn replay_without_frame_paints_placeholder() {
        let mut recorded = DisplayList::new(64, 64);
        let frame = Frame::solid(64, 64, [10, 10, 10, 255]);
        let rect = Rect::new(4.0, 4.0, 10.0, 10.0);
        recorded.clear();
        recorded.draw_blurred(&frame, rect, 12.0).unwrap();

        let mut target = DisplayList::new(64, 64);
        recorded.replay(&mut target, None);
        assert_eq!(
            target.commands(),
            &[
                DrawCommand::Clear,
                DrawCommand::FillRect {
                    rect,
                    color: PRIVACY_FALLBACK
                }
            ]
        );
    }

    #[test]
    fn commands_serialize_with_op_tag() {
        let command = DrawCommand::Blur {
            rect: Rect::new(1.0, 2.0, 3.0, 4.0),
            radius: 12.0,
        };
        let json = serde_json::to_value(&command).unwrap();
        assert_eq!(json["op"], "blur");
        assert_eq!(json["rect"]["width"], 3.0);
    }
}

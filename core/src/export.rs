//! Session exports offered as downloads.

use crate::history::HistoryLog;
use crate::interface::Frame;
use crate::prelude::DashResult;
use crate::render::{Color, DisplayList, DrawCommand, DrawSurface, RasterSurface};
use ab_glyph::FontArc;

pub const CSV_FILE_NAME: &str = "detection_history.csv";
pub const HEATMAP_FILE_NAME: &str = "heatmap.png";
pub const CSV_HEADER: [&str; 4] = ["Timestamp", "Class", "Score", "BBox"];
pub const FRAME_PREVIEW_WIDTH: u32 = 640;

const PRIVACY_COVER: Color = Color::rgb(200, 200, 200);

/// Serializes the history as CSV, one row per detection.
///
/// The bounding box column holds a JSON array, quoted because it contains
/// commas. An empty history yields the header row only.
pub fn history_csv(history: &HistoryLog) -> DashResult<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;
    for detection in history.iter() {
        writer.write_record([
            detection.timestamp_label(),
            detection.class.clone(),
            detection.score.to_string(),
            serde_json::to_string(&detection.bbox)?,
        ])?;
    }
    writer
        .into_inner()
        .map_err(|err| std::io::Error::other(err.to_string()).into())
}

/// Rasterizes a recorded draw list and encodes it as PNG.
pub fn surface_png(
    display: &DisplayList,
    frame: Option<&Frame>,
    font: Option<&FontArc>,
) -> DashResult<Vec<u8>> {
    let mut raster = RasterSurface::new(display.width(), display.height());
    if let Some(font) = font {
        raster = raster.with_font(font.clone());
    }
    display.replay(&mut raster, frame);
    raster.encode_png()
}

/// Encodes the camera frame shown behind the dashboard overlay.
///
/// Privacy regions recorded in `display` are blurred into the frame, or
/// covered when the frame cannot supply them, before it is encoded.
pub fn frame_preview_png(frame: &Frame, display: &DisplayList, max_width: u32) -> DashResult<Vec<u8>> {
    let mut raster = RasterSurface::from_frame(frame);
    for command in display.commands() {
        if let DrawCommand::Blur { rect, radius } = command {
            if raster.draw_blurred(frame, *rect, *radius).is_err() {
                raster.fill_rect(*rect, PRIVACY_COVER);
            }
        }
    }
    raster.downscale(max_width);
    raster.encode_png()
}

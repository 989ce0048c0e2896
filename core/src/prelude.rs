use crate::interface::{Frame, RawDetection};
use std::future::Future;

/// Common error type for the dashboard pipeline.
#[derive(thiserror::Error, Debug)]
pub enum DashboardError {
    #[error("detector unavailable: {0}")]
    DetectorUnavailable(String),
    #[error("detection failed: {0}")]
    Detection(String),
    #[error("history is empty")]
    EmptyHistory,
    #[error("heatmap display is off")]
    HeatmapDisabled,
    #[error("nothing has been drawn yet")]
    NothingRendered,
    #[error("font: {0}")]
    Font(String),
    #[error("session closed")]
    SessionClosed,
    #[error("image encoding: {0}")]
    Image(#[from] image::ImageError),
    #[error("csv encoding: {0}")]
    Csv(#[from] csv::Error),
    #[error("json encoding: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type DashResult<T> = Result<T, DashboardError>;

/// Pretrained detection model, treated as an opaque capability.
///
/// `load` runs once before the first tick; `detect` is invoked at most once
/// at a time by the session loop.
pub trait Detector: Send + 'static {
    fn load(&mut self) -> impl Future<Output = DashResult<()>> + Send;

    fn detect(
        &mut self,
        frame: &Frame,
        min_confidence: f32,
    ) -> impl Future<Output = DashResult<Vec<RawDetection>>> + Send;
}

/// Camera surface supplying the current frame on demand.
pub trait FrameSource: Send + 'static {
    /// True once a frame can be captured.
    fn is_ready(&self) -> bool;

    /// Native pixel size of the frames, `(width, height)`.
    fn dimensions(&self) -> (u32, u32);

    fn capture(&mut self) -> Option<Frame>;
}

use crate::export;
use crate::history::{count_by_class, HistoryLog, PlaybackController, PlaybackSelection};
use crate::interface::{Detection, Frame, RawDetection};
use crate::prelude::{DashResult, DashboardError};
use crate::render::{DensityGrid, DisplayList, DrawSurface, RenderRequest, Renderer};
use crate::session::control::ControlAction;
use crate::telemetry::SessionMetrics;
use ab_glyph::FontArc;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Size of the "recent detections" panel.
pub const RECENT_ENTRIES: usize = 20;

/// Model readiness as reported to viewers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Loading,
    Ready,
    Failed(String),
    Stopped,
}

impl SessionStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, SessionStatus::Ready)
    }
}

/// Snapshot of everything a dashboard viewer shows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardModel {
    pub status: SessionStatus,
    pub playback: PlaybackSelection,
    pub privacy_mode: bool,
    pub show_heatmap: bool,
    pub dark_mode: bool,
    /// Per-class counts of the latest live batch only.
    pub counts: BTreeMap<String, usize>,
    pub history_len: usize,
    /// Newest entries first.
    pub recent: Vec<Detection>,
    pub surface: DisplayList,
    pub metrics: SessionMetrics,
}

#[derive(Debug, Clone)]
struct DensityCache {
    history_len: usize,
    surface: (u32, u32),
    grid: DensityGrid,
}

/// Dashboard state owned by the session loop.
///
/// Every mutation ends in a redraw, so `display` always reflects the
/// current toggles, playback selection and history.
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    history: HistoryLog,
    live: Vec<Detection>,
    counts: BTreeMap<String, usize>,
    playback: PlaybackController,
    privacy_mode: bool,
    show_heatmap: bool,
    dark_mode: bool,
    surface: (u32, u32),
    density: Option<DensityCache>,
    display: DisplayList,
    frame: Option<Frame>,
    renderer: Renderer,
}

impl DashboardState {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            surface: (width, height),
            display: DisplayList::new(width, height),
            ..Default::default()
        }
    }

    /// Applies a live batch: counts, history, and an immediate draw.
    pub fn record_live(&mut self, frame: Frame, batch: Vec<RawDetection>) -> usize {
        let captured_at = frame.captured_at();
        let stamped: Vec<Detection> = batch
            .into_iter()
            .map(|raw| raw.stamp(captured_at))
            .collect();
        let added = stamped.len();

        self.counts = count_by_class(&stamped);
        self.history.extend(stamped.iter().cloned());
        self.surface = (frame.width(), frame.height());
        self.live = stamped;
        self.frame = Some(frame);
        self.redraw();
        added
    }

    /// Appends a batch to history without drawing it as live output.
    pub fn record_background(
        &mut self,
        batch: Vec<RawDetection>,
        captured_at: DateTime<Local>,
    ) -> usize {
        let added = self.history.append(batch, captured_at);
        if !self.playback.is_live() {
            self.redraw();
        }
        added
    }

    pub fn apply(&mut self, action: ControlAction) -> DashResult<()> {
        match action {
            ControlAction::SetPrivacy { enabled } => self.privacy_mode = enabled,
            ControlAction::SetHeatmap { enabled } => self.show_heatmap = enabled,
            ControlAction::SetDarkMode { enabled } => {
                self.dark_mode = enabled;
                return Ok(());
            }
            ControlAction::Scrub { index } => {
                self.playback.select(index, self.history.len())?;
            }
            ControlAction::ResumeLive => self.playback.resume(),
        }
        self.redraw();
        Ok(())
    }

    /// Redraws the live batch or the playback window, never both.
    pub fn redraw(&mut self) {
        if self.show_heatmap {
            self.refresh_density();
        }
        let heatmap = if self.show_heatmap {
            self.density.as_ref().map(|cache| &cache.grid)
        } else {
            None
        };
        let playback = self.playback.window(&self.history);
        let (detections, frame) = match playback {
            Some(_) => (&[][..], None),
            None => (self.live.as_slice(), self.frame.as_ref()),
        };

        let (width, height) = self.surface;
        let mut display = DisplayList::new(width, height);
        self.renderer.render(
            &RenderRequest {
                detections,
                playback,
                privacy_mode: self.privacy_mode,
                frame,
                heatmap,
            },
            &mut display,
        );
        self.display = display;
    }

    fn refresh_density(&mut self) {
        let history_len = self.history.len();
        let surface = self.surface;
        let stale = self
            .density
            .as_ref()
            .map_or(true, |cache| cache.history_len != history_len || cache.surface != surface);
        if stale {
            self.density = Some(DensityCache {
                history_len,
                surface,
                grid: DensityGrid::from_points(self.history.density_points(), surface.0, surface.1),
            });
        }
    }

    pub fn snapshot(&self, status: SessionStatus, metrics: SessionMetrics) -> DashboardModel {
        DashboardModel {
            status,
            playback: self.playback.selection(),
            privacy_mode: self.privacy_mode,
            show_heatmap: self.show_heatmap,
            dark_mode: self.dark_mode,
            counts: self.counts.clone(),
            history_len: self.history.len(),
            recent: self.history.recent(RECENT_ENTRIES).cloned().collect(),
            surface: self.display.clone(),
            metrics,
        }
    }

    pub fn export_csv(&self) -> DashResult<Vec<u8>> {
        export::history_csv(&self.history)
    }

    pub fn export_heatmap(&self, font: Option<&FontArc>) -> DashResult<Vec<u8>> {
        if !self.show_heatmap {
            return Err(DashboardError::HeatmapDisabled);
        }
        if self.display.is_empty() || self.display.width() == 0 || self.display.height() == 0 {
            return Err(DashboardError::NothingRendered);
        }
        export::surface_png(&self.display, self.frame.as_ref(), font)
    }

    /// Latest camera frame with live privacy regions blurred in, as PNG.
    pub fn frame_preview(&self) -> DashResult<Vec<u8>> {
        let frame = self
            .frame
            .as_ref()
            .filter(|frame| !frame.is_empty())
            .ok_or(DashboardError::NothingRendered)?;
        export::frame_preview_png(frame, &self.display, export::FRAME_PREVIEW_WIDTH)
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn live(&self) -> &[Detection] {
        &self.live
    }

    pub fn counts(&self) -> &BTreeMap<String, usize> {
        &self.counts
    }

    pub fn playback(&self) -> &PlaybackController {
        &self.playback
    }

    pub fn display(&self) -> &DisplayList {
        &self.display
    }

    pub fn density(&self) -> Option<&DensityGrid> {
        self.density.as_ref().map(|cache| &cache.grid)
    }

    pub fn privacy_mode(&self) -> bool {
        self.privacy_mode
    }

    pub fn show_heatmap(&self) -> bool {
        self.show_heatmap
    }

    pub fn dark_mode(&self) -> bool {
        self.dark_mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::BBox;
    use crate::render::{DrawCommand, DrawSurface};

    fn frame() -> Frame {
        Frame::solid(128, 96, [20, 20, 20, 255])
    }

    fn raw(class: &str, x: f32) -> RawDetection {
        RawDetection::new(class, 0.9, BBox::new(x, 10.0, 20.0, 20.0))
    }

    fn drawn_labels(state: &DashboardState) -> Vec<String> {
        state
            .display()
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::FillText { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn counts_follow_latest_batch_while_history_accumulates() {
        let mut state = DashboardState::new(0, 0);
        state.record_live(frame(), vec![raw("person", 0.0), raw("person", 30.0), raw("cup", 60.0)]);
        state.record_live(frame(), vec![raw("dog", 0.0)]);

        assert_eq!(state.history().len(), 4);
        assert_eq!(state.counts().len(), 1);
        assert_eq!(state.counts()["dog"], 1);
        assert_eq!(drawn_labels(&state), vec!["dog"]);
    }

    #[test]
    fn live_batch_resizes_surface_to_frame() {
        let mut state = DashboardState::new(0, 0);
        state.record_live(frame(), vec![]);
        let model = state.snapshot(SessionStatus::Ready, SessionMetrics::default());
        assert_eq!((model.surface.width(), model.surface.height()), (128, 96));
    }

    #[test]
    fn scrubbing_draws_history_window_instead_of_live() {
        let mut state = DashboardState::new(0, 0);
        state.record_live(frame(), vec![raw("cup", 0.0)]);
        state.record_live(frame(), vec![raw("dog", 0.0)]);

        state.apply(ControlAction::Scrub { index: 0 }).unwrap();
        assert_eq!(state.playback().selection(), PlaybackSelection::Paused(0));
        assert_eq!(drawn_labels(&state), vec!["cup", "dog"]);

        state.apply(ControlAction::ResumeLive).unwrap();
        assert_eq!(drawn_labels(&state), vec!["dog"]);
    }

    #[test]
    fn scrubbing_empty_history_is_rejected() {
        let mut state = DashboardState::new(64, 64);
        assert!(matches!(
            state.apply(ControlAction::Scrub { index: 3 }),
            Err(DashboardError::EmptyHistory)
        ));
        assert!(state.playback().is_live());
    }

    #[test]
    fn playback_ignores_privacy_blur() {
        let mut state = DashboardState::new(0, 0);
        state.record_live(frame(), vec![raw("person", 0.0)]);
        state.apply(ControlAction::SetPrivacy { enabled: true }).unwrap();
        assert!(state
            .display()
            .commands()
            .iter()
            .any(|c| matches!(c, DrawCommand::Blur { .. })));

        state.apply(ControlAction::Scrub { index: 0 }).unwrap();
        assert!(!state
            .display()
            .commands()
            .iter()
            .any(|c| matches!(c, DrawCommand::Blur { .. })));
    }

    #[test]
    fn heatmap_grid_tracks_history_growth() {
        let mut state = DashboardState::new(0, 0);
        state.record_live(frame(), vec![raw("cup", 0.0)]);
        state.apply(ControlAction::SetHeatmap { enabled: true }).unwrap();
        assert_eq!(state.density().unwrap().total(), 1);

        state.record_live(frame(), vec![raw("cup", 0.0), raw("cup", 40.0)]);
        assert_eq!(state.density().unwrap().total(), 3);
    }

    #[test]
    fn background_batches_extend_history_and_refresh_playback() {
        let mut state = DashboardState::new(0, 0);
        state.record_live(frame(), vec![raw("cup", 0.0)]);
        state.apply(ControlAction::Scrub { index: 0 }).unwrap();
        state.record_background(vec![raw("dog", 0.0)], Local::now());

        assert_eq!(state.history().len(), 2);
        assert_eq!(state.counts()["cup"], 1);
        assert_eq!(drawn_labels(&state), vec!["cup", "dog"]);
    }

    #[test]
    fn heatmap_export_requires_heatmap_display() {
        let mut state = DashboardState::new(0, 0);
        state.record_live(frame(), vec![raw("cup", 0.0)]);
        assert!(matches!(
            state.export_heatmap(None),
            Err(DashboardError::HeatmapDisabled)
        ));

        state.apply(ControlAction::SetHeatmap { enabled: true }).unwrap();
        let png = state.export_heatmap(None).unwrap();
        assert_eq!(&png[1..4], b"PNG");
    }

    #[test]
    fn heatmap_export_before_first_frame_has_nothing_to_render() {
        let mut state = DashboardState::new(0, 0);
        state.apply(ControlAction::SetHeatmap { enabled: true }).unwrap();
        assert!(matches!(
            state.export_heatmap(None),
            Err(DashboardError::NothingRendered)
        ));
    }

    #[test]
    fn frame_preview_needs_a_captured_frame() {
        let mut state = DashboardState::new(0, 0);
        assert!(matches!(
            state.frame_preview(),
            Err(DashboardError::NothingRendered)
        ));

        state.record_live(frame(), vec![raw("cup", 0.0)]);
        let png = state.frame_preview().unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (state.display().width(), state.display().height()));
    }

    #[test]
    fn snapshot_lists_recent_entries_newest_first() {
        let mut state = DashboardState::new(0, 0);
        for i in 0..25 {
            state.record_live(frame(), vec![raw(&format!("c{i}"), 0.0)]);
        }
        let model = state.snapshot(SessionStatus::Ready, SessionMetrics::default());
        assert_eq!(model.history_len, 25);
        assert_eq!(model.recent.len(), RECENT_ENTRIES);
        assert_eq!(model.recent[0].class, "c24");
        assert_eq!(model.recent[19].class, "c5");
    }
}

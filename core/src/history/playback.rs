use crate::history::HistoryLog;
use crate::interface::Detection;
use crate::prelude::{DashResult, DashboardError};
use serde::{Deserialize, Serialize};

/// Entries drawn on each side of the selected playback index.
pub const PLAYBACK_WINDOW: usize = 10;

/// Which detections the renderer should draw.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "index", rename_all = "snake_case")]
pub enum PlaybackSelection {
    #[default]
    Live,
    Paused(usize),
}

impl PlaybackSelection {
    pub fn is_live(&self) -> bool {
        matches!(self, PlaybackSelection::Live)
    }
}

/// Two-state controller switching between live output and history replay.
#[derive(Debug, Clone, Default)]
pub struct PlaybackController {
    selection: PlaybackSelection,
}

impl PlaybackController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> PlaybackSelection {
        self.selection
    }

    pub fn is_live(&self) -> bool {
        self.selection.is_live()
    }

    /// Pauses on `index`, clamped to the last history entry.
    pub fn select(&mut self, index: usize, history_len: usize) -> DashResult<usize> {
        if history_len == 0 {
            return Err(DashboardError::EmptyHistory);
        }
        let index = index.min(history_len - 1);
        self.selection = PlaybackSelection::Paused(index);
        Ok(index)
    }

    pub fn resume(&mut self) {
        self.selection = PlaybackSelection::Live;
    }

    /// History entries around the paused index, or `None` while live.
    pub fn window<'a>(&self, history: &'a HistoryLog) -> Option<&'a [Detection]> {
        match self.selection {
            PlaybackSelection::Live => None,
            PlaybackSelection::Paused(index) => Some(history.slice(
                index.saturating_sub(PLAYBACK_WINDOW),
                index + PLAYBACK_WINDOW + 1,
            )),
        }
    }
}

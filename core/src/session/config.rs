use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for the detect → aggregate → render loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub poll_interval_ms: u64,
    /// Detections scoring below this are dropped by the detector.
    pub min_confidence: f32,
    /// Keep polling and appending to history while playback is paused.
    pub record_while_paused: bool,
    /// Pending UI commands before senders wait.
    pub command_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            min_confidence: 0.6,
            record_while_paused: false,
            command_buffer: 32,
        }
    }
}

impl SessionConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Session counters shared between the loop and its observers.
pub struct MetricsRecorder {
    inner: Mutex<SessionMetrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMetrics {
    /// Ticks that ran the detector.
    pub ticks: u64,
    /// Ticks skipped because the frame source was not ready.
    pub skipped_not_ready: u64,
    /// Ticks skipped while playback was paused.
    pub skipped_paused: u64,
    pub detector_errors: u64,
    pub detections: u64,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(SessionMetrics::default()),
        }
    }

    pub fn record_tick(&self, detections: usize) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.ticks += 1;
            metrics.detections += detections as u64;
        }
    }

    pub fn record_not_ready(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.skipped_not_ready += 1;
        }
    }

    pub fn record_paused(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.skipped_paused += 1;
        }
    }

    pub fn record_error(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.detector_errors += 1;
        }
    }

    pub fn snapshot(&self) -> SessionMetrics {
        self.inner
            .lock()
            .map(|metrics| *metrics)
            .unwrap_or_default()
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

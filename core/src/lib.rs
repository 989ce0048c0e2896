//! Core pipeline for the Lookout live object-detection dashboard.
//!
//! Detections flow from an external detector into an append-only history,
//! are aggregated into a density grid, and are drawn onto a surface either
//! live or as a windowed replay of the history.

pub mod export;
pub mod history;
pub mod interface;
pub mod prelude;
pub mod render;
pub mod session;
pub mod telemetry;

pub use prelude::{DashResult, DashboardError, Detector, FrameSource};

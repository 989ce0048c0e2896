pub mod counts;
pub mod playback;
pub mod store;

pub use counts::count_by_class;
pub use playback::{PlaybackController, PlaybackSelection, PLAYBACK_WINDOW};
pub use store::HistoryLog;

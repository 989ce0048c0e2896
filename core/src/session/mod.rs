pub mod config;
pub mod control;
pub mod handle;
pub mod runner;
pub mod state;

pub use config::SessionConfig;
pub use control::ControlAction;
pub use handle::{SessionClient, SessionHandle};
pub use runner::{Session, TickOutcome};
pub use state::{DashboardModel, DashboardState, SessionStatus, RECENT_ENTRIES};

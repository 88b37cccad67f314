pub mod config;
pub mod providers;
pub mod session;
pub mod tracker;

pub use session::{NavigationSession, SessionEvent, SessionHandle, SessionOutcome};
pub use tracker::NavigationTracker;

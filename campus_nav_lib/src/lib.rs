pub mod coordinate;
pub mod geometry;
pub mod polyline;
pub mod route;
pub mod directions;
pub mod schedule;
pub mod floor_plan;
pub mod session_state;

mod error;

pub use error::NavigationError;

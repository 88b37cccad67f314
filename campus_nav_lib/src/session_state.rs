use serde::{Deserialize, Serialize};

use crate::{
    coordinate::{Destination, PositionSample},
    geometry::bearing,
    route::{ActiveRoute, Step, TurnMarker},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackerPhase {
    Idle,
    AwaitingFirstFix,
    RouteActive,
    RecalculatingRoute,
    Arrived,
}

/// Everything a renderer needs for one navigation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub destination: Destination,
    pub latest_position: Option<PositionSample>,
    pub previous_position: Option<PositionSample>,
    pub active_route: Option<ActiveRoute>,
    pub arrived: bool,
}

impl SessionState {
    pub fn new(destination: Destination) -> Self {
        Self {
            destination,
            latest_position: None,
            previous_position: None,
            active_route: None,
            arrived: false,
        }
    }

    pub fn steps(&self) -> &[Step] {
        self.active_route.as_ref().map(|route| route.steps.as_slice()).unwrap_or_default()
    }

    pub fn turn_markers(&self) -> &[TurnMarker] {
        self.active_route.as_ref().map(|route| route.turn_markers.as_slice()).unwrap_or_default()
    }

    /// Direction of travel between the two most recent fixes, used to rotate the map.
    pub fn heading(&self) -> Option<f64> {
        let previous = self.previous_position?;
        let latest = self.latest_position?;
        if previous.position == latest.position {
            return None;
        }
        Some(bearing(previous.position, latest.position))
    }
}

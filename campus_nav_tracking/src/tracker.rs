use campus_nav_lib::{
    coordinate::{Coordinate, Destination, PositionSample},
    geometry::{has_arrived, is_location_on_path, PATH_TOLERANCE_DEG},
    route::{ActiveRoute, Route},
    session_state::{SessionState, TrackerPhase},
    NavigationError,
};

use crate::providers::location::SubscriptionId;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteRequest {
    /// Sequence number. Only the response to the latest request is applied.
    pub id: u64,
    pub origin: Coordinate,
    pub destination: Coordinate,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrackerAction {
    None,
    RequestRoute(RouteRequest),
    /// The arrival latch was set. The subscription, if still held, must be released.
    Arrived { subscription: Option<SubscriptionId> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    Applied,
    /// Superseded by a newer request, or the session already arrived.
    Stale,
}

/// State machine for one navigation session. Performs no I/O itself: the
/// caller feeds it fixes and route responses and carries out the returned actions.
pub struct NavigationTracker {
    state: SessionState,
    phase: TrackerPhase,
    subscription: Option<SubscriptionId>,
    last_request_id: u64,
    pending_request: Option<u64>,
}

impl NavigationTracker {
    pub fn new(destination: Destination) -> Self {
        Self {
            state: SessionState::new(destination),
            phase: TrackerPhase::Idle,
            subscription: None,
            last_request_id: 0,
            pending_request: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> TrackerPhase {
        self.phase
    }

    pub fn pending_request(&self) -> Option<u64> {
        self.pending_request
    }

    /// Records the location subscription feeding this session.
    pub fn start_session(&mut self, subscription: SubscriptionId) {
        if self.phase != TrackerPhase::Idle {
            tracing::warn!("Session already started, ignoring subscription {:?}", subscription);
            return;
        }

        tracing::info!("Navigating to {} {}", self.state.destination.building_name, self.state.destination.room_number);
        self.subscription = Some(subscription);
        self.phase = TrackerPhase::AwaitingFirstFix;
    }

    pub fn on_position_update(&mut self, sample: PositionSample) -> TrackerAction {
        if self.phase == TrackerPhase::Arrived || self.subscription.is_none() {
            return TrackerAction::None;
        }

        if !sample.position.is_valid() {
            tracing::warn!("Ignoring invalid fix {:?}", sample.position);
            return TrackerAction::None;
        }

        self.state.previous_position = self.state.latest_position.replace(sample);

        if has_arrived(sample.position, self.state.destination.position) {
            tracing::info!("Arrived at {}", self.state.destination.room_number);
            self.state.arrived = true;
            self.phase = TrackerPhase::Arrived;
            self.pending_request = None;
            return TrackerAction::Arrived {
                subscription: self.end_session(),
            };
        }

        let Some(active) = &self.state.active_route else {
            if self.pending_request.is_some() {
                // First route still on its way
                return TrackerAction::None;
            }
            return TrackerAction::RequestRoute(self.issue_request(sample.position));
        };

        if is_location_on_path(sample.position, &active.route.overview_path, PATH_TOLERANCE_DEG) {
            return TrackerAction::None;
        }

        tracing::info!("Left the route at {:?}, recalculating", sample.position);
        self.phase = TrackerPhase::RecalculatingRoute;
        TrackerAction::RequestRoute(self.issue_request(sample.position))
    }

    /// Applies the response to `request_id`. A failed request keeps the previous route.
    pub fn on_route_response(&mut self, request_id: u64, result: Result<Route, NavigationError>) -> Result<RouteOutcome, NavigationError> {
        if self.phase == TrackerPhase::Arrived || self.pending_request != Some(request_id) {
            tracing::debug!("Discarding stale response to route request {request_id}");
            return Ok(RouteOutcome::Stale);
        }

        self.pending_request = None;

        match result {
            Ok(route) => {
                tracing::debug!("Route {request_id} applied with {} steps", route.steps.len());
                self.state.active_route = Some(ActiveRoute::from_route(route));
                self.phase = TrackerPhase::RouteActive;
                Ok(RouteOutcome::Applied)
            }
            Err(err) => {
                self.phase = if self.state.active_route.is_some() {
                    TrackerPhase::RouteActive
                } else {
                    TrackerPhase::AwaitingFirstFix
                };
                Err(err)
            }
        }
    }

    /// Hands back the subscription to release. Returns `None` once it has been taken.
    pub fn end_session(&mut self) -> Option<SubscriptionId> {
        self.subscription.take()
    }

    fn issue_request(&mut self, origin: Coordinate) -> RouteRequest {
        self.last_request_id += 1;
        self.pending_request = Some(self.last_request_id);

        RouteRequest {
            id: self.last_request_id,
            origin,
            destination: self.state.destination.position,
        }
    }
}

use std::pin::Pin;

use campus_nav_lib::{
    floor_plan::FloorPlan,
    route::Route,
    session_state::SessionState,
    NavigationError,
};
use futures::future::OptionFuture;
use serde::Serialize;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    oneshot,
};

use crate::{
    providers::{DestinationResolver, DirectionsProvider, LocationSource, WatchOptions},
    tracker::{NavigationTracker, RouteOutcome, RouteRequest, TrackerAction},
};

const EVENT_CAPACITY: usize = 100;

type RouteFuture<'a> = Pin<Box<dyn Future<Output = (u64, Result<Route, NavigationError>)> + Send + 'a>>;

/// What a session publishes for the presentation layer.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum SessionEvent {
    StateChanged(SessionState),
    RoutingFailed(String),
    Arrived(FloorPlan),
    /// The session stopped because of an error.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    Arrived(FloorPlan),
    Abandoned,
}

/// Runs one navigation session: resolves the destination, follows the
/// location stream and keeps at most one route request in flight.
pub struct NavigationSession<D, L> {
    directions: D,
    location: L,
    events: broadcast::Sender<SessionEvent>,
    teardown: oneshot::Receiver<()>,
}

/// The caller's side of a running session. Dropping it tears the session down.
pub struct SessionHandle {
    teardown: Option<oneshot::Sender<()>>,
    events: broadcast::Receiver<SessionEvent>,
}

impl SessionHandle {
    /// Next event, or `None` once the session has finished.
    pub async fn recv(&mut self) -> Option<SessionEvent> {
        loop {
            match self.events.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(missed)) => tracing::warn!("Session events lagged, skipped {missed}"),
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Requests teardown. Safe to call any number of times.
    pub fn end(&mut self) {
        if let Some(teardown) = self.teardown.take() {
            let _ = teardown.send(());
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.end();
    }
}

impl<D, L> NavigationSession<D, L>
where
    D: DirectionsProvider + Send + Sync,
    L: LocationSource + Send,
{
    pub fn new(directions: D, location: L) -> (Self, SessionHandle) {
        let (events, receiver) = broadcast::channel(EVENT_CAPACITY);
        let (teardown_tx, teardown) = oneshot::channel();

        let session = Self {
            directions,
            location,
            events,
            teardown,
        };
        let handle = SessionHandle {
            teardown: Some(teardown_tx),
            events: receiver,
        };

        (session, handle)
    }

    pub async fn run<R>(self, resolver: &R, schedule_id: i64) -> Result<SessionOutcome, NavigationError>
    where
        R: DestinationResolver + Sync,
    {
        let NavigationSession {
            directions,
            mut location,
            events,
            mut teardown,
        } = self;

        let destination = tokio::select! {
            biased;
            _ = &mut teardown => return Ok(SessionOutcome::Abandoned),
            destination = resolver.resolve(schedule_id) => destination,
        };

        let destination = match destination {
            Ok(destination) => destination,
            Err(err) => {
                tracing::error!("Failed to resolve schedule {schedule_id}: {err}");
                publish(&events, SessionEvent::Failed(err.to_string()));
                return Err(err);
            }
        };

        let mut tracker = NavigationTracker::new(destination);

        let mut subscription = match location.subscribe(&WatchOptions::default()) {
            Ok(subscription) => subscription,
            Err(err) => {
                tracing::error!("Could not start location tracking: {err}");
                publish(&events, SessionEvent::Failed(err.to_string()));
                return Err(err);
            }
        };

        tracker.start_session(subscription.id);
        publish(&events, SessionEvent::StateChanged(tracker.state().clone()));

        let mut in_flight: Option<RouteFuture<'_>> = None;

        let result = loop {
            tokio::select! {
                biased;
                _ = &mut teardown => {
                    tracing::info!("Session {schedule_id} torn down");
                    break Ok(SessionOutcome::Abandoned);
                }
                Some((request_id, result)) = OptionFuture::from(in_flight.as_mut()), if in_flight.is_some() => {
                    in_flight = None;
                    match tracker.on_route_response(request_id, result) {
                        Ok(RouteOutcome::Applied) => publish(&events, SessionEvent::StateChanged(tracker.state().clone())),
                        Ok(RouteOutcome::Stale) => {}
                        Err(err) => {
                            tracing::warn!("Route request {request_id} failed: {err}");
                            publish(&events, SessionEvent::RoutingFailed(err.to_string()));
                        }
                    }
                }
                event = subscription.updates.recv() => match event {
                    Some(Ok(sample)) => {
                        tracing::debug!("Fix {:?}", sample.position);
                        match tracker.on_position_update(sample) {
                            TrackerAction::None => {}
                            TrackerAction::RequestRoute(request) => {
                                if in_flight.is_some() {
                                    tracing::debug!("Route request {} supersedes the one in flight", request.id);
                                }
                                in_flight = Some(Box::pin(request_route(&directions, request)));
                            }
                            TrackerAction::Arrived { subscription: id } => {
                                if let Some(id) = id {
                                    location.unsubscribe(id);
                                }
                                let floor_plan = FloorPlan::from(&tracker.state().destination);
                                publish(&events, SessionEvent::StateChanged(tracker.state().clone()));
                                publish(&events, SessionEvent::Arrived(floor_plan.clone()));
                                break Ok(SessionOutcome::Arrived(floor_plan));
                            }
                        }
                        publish(&events, SessionEvent::StateChanged(tracker.state().clone()));
                    }
                    Some(Err(err)) => {
                        tracing::error!("Location error: {err}");
                        publish(&events, SessionEvent::Failed(err.to_string()));
                        break Err(err);
                    }
                    None => {
                        tracing::warn!("Location stream ended before arrival");
                        break Ok(SessionOutcome::Abandoned);
                    }
                },
            }
        };

        if let Some(id) = tracker.end_session() {
            location.unsubscribe(id);
        }

        result
    }
}

async fn request_route<D: DirectionsProvider>(directions: &D, request: RouteRequest) -> (u64, Result<Route, NavigationError>) {
    tracing::debug!("Requesting route {} from {:?}", request.id, request.origin);
    (request.id, directions.route(request.origin, request.destination).await)
}

fn publish(events: &broadcast::Sender<SessionEvent>, event: SessionEvent) {
    // No receivers just means nobody is watching
    let _ = events.send(event);
}

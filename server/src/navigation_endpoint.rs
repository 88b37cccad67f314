use std::{fmt::Display, sync::Arc};

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    http::{header::AUTHORIZATION, HeaderMap},
    response::Response,
};
use campus_nav_lib::coordinate::{Coordinate, PositionSample};
use campus_nav_tracking::{
    providers::{
        ChannelLocationSource, DestinationResolver, DirectionsProvider, GoogleDirections, LocationFeed,
        ScheduleApiResolver,
    },
    NavigationSession, SessionOutcome,
};
use futures::{Sink, SinkExt, Stream, StreamExt};
use serde::Deserialize;

use crate::server_state::ServerState;

#[derive(Debug, Deserialize)]
pub struct NavigateParams {
    /// Browsers cannot set headers on a WebSocket upgrade, so the token may come as a query parameter.
    pub token: Option<String>,
}

/// What the browser sends: a fix from `watchPosition`, or the error it reported.
#[derive(Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ClientMessage {
    Position { latitude: f64, longitude: f64 },
    Error { error: String },
}

pub async fn navigate(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
    Path(schedule_id): Path<i64>,
    Query(params): Query<NavigateParams>,
    headers: HeaderMap,
) -> Response {
    let authorization = authorization(&headers, params.token.as_deref(), state.config.api_token.as_deref());
    ws.on_upgrade(move |socket| handle_navigation(socket, state, schedule_id, authorization))
}

/// The `Authorization` header wins over a query token, which wins over the configured token.
pub fn authorization(headers: &HeaderMap, query_token: Option<&str>, default_token: Option<&str>) -> Option<String> {
    headers.get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(String::from)
        .or_else(|| query_token.or(default_token).map(|token| format!("Token {token}")))
}

pub async fn handle_navigation(socket: WebSocket, state: Arc<ServerState>, schedule_id: i64, authorization: Option<String>) {
    tracing::info!("Navigation session for schedule {schedule_id} opened");

    let directions = GoogleDirections::from_config(state.http.clone(), &state.config);
    let resolver = ScheduleApiResolver::with_authorization(state.http.clone(), &state.config.api_base_url, authorization);

    let (sender, receiver) = socket.split();
    relay_session(sender, receiver, directions, resolver, schedule_id).await;
}

/// Feeds client fixes into a session and sends every session event back as JSON
/// until either side finishes.
async fn relay_session<S, R, E, D, V>(mut sender: S, mut receiver: R, directions: D, resolver: V, schedule_id: i64)
where
    S: Sink<Message> + Unpin,
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
    D: DirectionsProvider + Send + Sync + 'static,
    V: DestinationResolver + Send + Sync + 'static,
{
    let (location, feed) = ChannelLocationSource::new();
    let (session, mut handle) = NavigationSession::new(directions, location);
    let session_task = tokio::spawn(async move { session.run(&resolver, schedule_id).await });

    loop {
        tokio::select! {
            message = receiver.next() => match message {
                Some(Ok(Message::Text(text))) => relay_client_message(&feed, text.as_str()),
                Some(Ok(Message::Close(_))) | None => {
                    tracing::info!("Client closed navigation for schedule {schedule_id}");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    tracing::warn!("WebSocket error: {err}");
                    break;
                }
            },
            event = handle.recv() => {
                let Some(event) = event else {
                    // Session finished and every event has been sent
                    break;
                };

                let text = match serde_json::to_string(&event) {
                    Ok(text) => text,
                    Err(err) => {
                        tracing::error!("Failed to serialize session event: {err}");
                        continue;
                    }
                };

                if sender.send(Message::Text(text.into())).await.is_err() {
                    tracing::warn!("Failed to send session event, client gone");
                    break;
                }
            }
        }
    }

    // Tears the session down if it is still running
    drop(handle);

    match session_task.await {
        Ok(Ok(SessionOutcome::Arrived(floor_plan))) => tracing::info!("Schedule {schedule_id}: arrived, showing {}", floor_plan.image_url),
        Ok(Ok(SessionOutcome::Abandoned)) => tracing::info!("Schedule {schedule_id}: navigation abandoned"),
        Ok(Err(err)) => tracing::warn!("Schedule {schedule_id}: navigation failed: {err}"),
        Err(err) => tracing::error!("Navigation task for schedule {schedule_id} panicked: {err}"),
    }

    let _ = sender.close().await;
}

fn relay_client_message(feed: &LocationFeed, text: &str) {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::Position { latitude, longitude }) => {
            feed.push(PositionSample::now(Coordinate::new(latitude, longitude)));
        }
        Ok(ClientMessage::Error { error }) => {
            tracing::warn!("Client location error: {error}");
            feed.push_error(error);
        }
        Err(err) => tracing::warn!("Ignoring malformed client message: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::http::HeaderValue;
    use campus_nav_lib::{coordinate::Destination, route::Route, NavigationError};
    use futures::channel::mpsc;
    use serde_json::Value;

    use super::*;

    #[test]
    fn parses_client_messages() {
        assert_eq!(
            serde_json::from_str::<ClientMessage>(r#"{"latitude": 34.06, "longitude": -118.25}"#).unwrap(),
            ClientMessage::Position { latitude: 34.06, longitude: -118.25 }
        );
        assert_eq!(
            serde_json::from_str::<ClientMessage>(r#"{"error": "User denied Geolocation"}"#).unwrap(),
            ClientMessage::Error { error: "User denied Geolocation".into() }
        );
        assert!(serde_json::from_str::<ClientMessage>(r#"{"latitude": 34.06}"#).is_err());
    }

    #[test]
    fn authorization_precedence() {
        let mut headers = HeaderMap::new();
        assert_eq!(authorization(&headers, None, None), None);
        assert_eq!(authorization(&headers, None, Some("cfg")), Some("Token cfg".into()));
        assert_eq!(authorization(&headers, Some("query"), Some("cfg")), Some("Token query".into()));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Token header"));
        assert_eq!(authorization(&headers, Some("query"), Some("cfg")), Some("Token header".into()));
    }

    #[tokio::test]
    async fn relays_fixes_and_errors() {
        use campus_nav_tracking::providers::{LocationSource, WatchOptions};

        let (mut source, feed) = ChannelLocationSource::new();
        let mut subscription = source.subscribe(&WatchOptions::default()).unwrap();

        relay_client_message(&feed, r#"{"latitude": 1.5, "longitude": 2.5}"#);
        relay_client_message(&feed, "garbage");
        relay_client_message(&feed, r#"{"error": "timeout"}"#);

        let fix = subscription.updates.recv().await.unwrap().unwrap();
        assert_eq!(fix.position, Coordinate::new(1.5, 2.5));
        assert_eq!(
            subscription.updates.recv().await.unwrap(),
            Err(NavigationError::LocationUnavailable("timeout".into()))
        );
    }

    const DESTINATION: Coordinate = Coordinate { latitude: 34.0700, longitude: -118.2400 };

    struct StraightLine;

    impl DirectionsProvider for StraightLine {
        async fn route(&self, origin: Coordinate, destination: Coordinate) -> Result<Route, NavigationError> {
            Ok(Route {
                steps: Vec::new(),
                overview_path: vec![origin, destination],
            })
        }
    }

    struct ScienceHall;

    impl DestinationResolver for ScienceHall {
        async fn resolve(&self, schedule_id: i64) -> Result<Destination, NavigationError> {
            Ok(Destination {
                schedule_id,
                position: DESTINATION,
                building_name: "Science Hall".into(),
                room_number: "204".into(),
            })
        }
    }

    #[tokio::test]
    async fn client_fixes_stream_back_as_session_events() {
        let (client_tx, client_rx) = mpsc::unbounded::<Result<Message, axum::Error>>();
        let (server_tx, server_rx) = mpsc::unbounded::<Message>();

        client_tx.unbounded_send(Ok(Message::Text(r#"{"latitude": 34.0600, "longitude": -118.2500}"#.into()))).unwrap();
        client_tx.unbounded_send(Ok(Message::Text(r#"{"latitude": 34.0697, "longitude": -118.2400}"#.into()))).unwrap();

        let relay = tokio::spawn(relay_session(server_tx, client_rx, StraightLine, ScienceHall, 3));

        let sent: Vec<Message> = tokio::time::timeout(Duration::from_secs(5), server_rx.collect())
            .await
            .unwrap();
        relay.await.unwrap();

        let events: Vec<Value> = sent
            .iter()
            .map(|message| match message {
                Message::Text(text) => serde_json::from_str(text.as_str()).unwrap(),
                other => panic!("Unexpected message {other:?}"),
            })
            .collect();

        assert_eq!(events[0]["type"], "StateChanged");
        assert!(events.iter().any(|event| event["type"] == "StateChanged" && event["data"]["active_route"].is_object()));

        let last = events.last().unwrap();
        assert_eq!(last["type"], "Arrived");
        assert_eq!(last["data"]["image_url"], "/images/science_hall_floor_2.jpg");

        drop(client_tx);
    }
}

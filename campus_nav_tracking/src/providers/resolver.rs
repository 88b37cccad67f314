use campus_nav_lib::{coordinate::Destination, schedule::ScheduleEntry, NavigationError};
use reqwest::header::AUTHORIZATION;

use crate::config::NavigatorConfig;

/// Turns a scheduled class into the classroom to walk to.
pub trait DestinationResolver {
    fn resolve(&self, schedule_id: i64) -> impl Future<Output = Result<Destination, NavigationError>> + Send;
}

/// Looks up schedule entries on the campus REST API.
#[derive(Clone)]
pub struct ScheduleApiResolver {
    client: reqwest::Client,
    base_url: String,
    authorization: Option<String>,
}

impl ScheduleApiResolver {
    pub fn new(client: reqwest::Client, base_url: &str, token: Option<&str>) -> Self {
        Self::with_authorization(client, base_url, token.map(|token| format!("Token {token}")))
    }

    /// Uses a complete `Authorization` header value, e.g. one relayed from a browser.
    pub fn with_authorization(client: reqwest::Client, base_url: &str, authorization: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            authorization,
        }
    }

    pub fn from_config(client: reqwest::Client, config: &NavigatorConfig) -> Self {
        Self::new(client, &config.api_base_url, config.api_token.as_deref())
    }
}

impl DestinationResolver for ScheduleApiResolver {
    async fn resolve(&self, schedule_id: i64) -> Result<Destination, NavigationError> {
        let mut request = self.client.get(format!("{}/api/schedules/{schedule_id}/", self.base_url));
        if let Some(authorization) = &self.authorization {
            request = request.header(AUTHORIZATION, authorization);
        }

        let response = request.send().await
            .map_err(|err| NavigationError::Resolver(format!("Schedule request failed: {err}")))?;

        if !response.status().is_success() {
            return Err(NavigationError::Resolver(format!("Schedule {schedule_id} answered {}", response.status())));
        }

        let entry = response.json::<ScheduleEntry>().await
            .map_err(|err| NavigationError::Resolver(format!("Malformed schedule {schedule_id}: {err}")))?;

        entry.into_destination(schedule_id)
    }
}

#[cfg(test)]
mod tests {
    use campus_nav_lib::coordinate::Coordinate;

    use super::*;
    use crate::providers::mock_http::serve_once;

    #[tokio::test]
    async fn resolves_classroom() {
        let body = r#"{ "classroom": { "latitude": 34.07, "longitude": -118.24, "room_number": "310", "building": { "name": "Science Hall" } } }"#;
        let (base_url, server) = serve_once("200 OK", body).await;
        let resolver = ScheduleApiResolver::new(reqwest::Client::new(), &base_url, Some("abc123"));

        let destination = resolver.resolve(12).await.unwrap();
        assert_eq!(destination.position, Coordinate::new(34.07, -118.24));
        assert_eq!(destination.room_number, "310");

        let request = server.await.unwrap().to_lowercase();
        assert!(request.starts_with("get /api/schedules/12/ "), "{request}");
        assert!(request.contains("authorization: token abc123"), "{request}");
    }

    #[tokio::test]
    async fn unauthorized_is_a_resolver_error() {
        let (base_url, _server) = serve_once("401 Unauthorized", r#"{ "detail": "Invalid token." }"#).await;
        let resolver = ScheduleApiResolver::new(reqwest::Client::new(), &base_url, None);

        assert!(matches!(resolver.resolve(1).await, Err(NavigationError::Resolver(_))));
    }

    #[tokio::test]
    async fn missing_classroom_is_a_resolver_error() {
        let (base_url, _server) = serve_once("200 OK", r#"{ "id": 1 }"#).await;
        let resolver = ScheduleApiResolver::new(reqwest::Client::new(), &base_url, None);

        assert!(matches!(resolver.resolve(1).await, Err(NavigationError::Resolver(_))));
    }
}

use campus_nav_lib::{coordinate::Coordinate, directions::DirectionsResponse, route::Route, NavigationError};

use crate::config::{NavigatorConfig, DIRECTIONS_PATH};

/// Computes walking routes. The routing itself is the provider's business.
pub trait DirectionsProvider {
    fn route(&self, origin: Coordinate, destination: Coordinate) -> impl Future<Output = Result<Route, NavigationError>> + Send;
}

/// The Google directions web service in walking mode.
#[derive(Clone)]
pub struct GoogleDirections {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GoogleDirections {
    pub fn new(client: reqwest::Client, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub fn from_config(client: reqwest::Client, config: &NavigatorConfig) -> Self {
        Self::new(client, &config.directions_base_url, &config.maps_api_key)
    }
}

fn lat_lng(coordinate: Coordinate) -> String {
    format!("{},{}", coordinate.latitude, coordinate.longitude)
}

impl DirectionsProvider for GoogleDirections {
    async fn route(&self, origin: Coordinate, destination: Coordinate) -> Result<Route, NavigationError> {
        let response = self.client
            .get(format!("{}{}", self.base_url, DIRECTIONS_PATH))
            .query(&[
                ("origin", lat_lng(origin)),
                ("destination", lat_lng(destination)),
                ("mode", "walking".to_string()),
                ("key", self.api_key.clone()),
            ])
            .send().await
            .map_err(|err| NavigationError::Routing(format!("Directions request failed: {err}")))?;

        if !response.status().is_success() {
            return Err(NavigationError::Routing(format!("Directions service answered {}", response.status())));
        }

        let body = response.text().await
            .map_err(|err| NavigationError::Routing(format!("Failed to read directions response: {err}")))?;

        DirectionsResponse::from_json(&body)?.into_route()
    }
}

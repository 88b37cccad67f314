//! Typed records for a directions provider response. Responses are parsed
//! into these first and then validated into a [`Route`].

use serde::Deserialize;

use crate::{
    coordinate::Coordinate,
    polyline::decode_polyline,
    route::{Route, Step},
    NavigationError,
};

pub const STATUS_OK: &str = "OK";

#[derive(Debug, Deserialize)]
pub struct DirectionsResponse {
    pub status: String,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub routes: Vec<RouteRecord>,
}

#[derive(Debug, Deserialize)]
pub struct RouteRecord {
    #[serde(default)]
    pub legs: Vec<LegRecord>,
    #[serde(default)]
    pub overview_path: Option<Vec<LatLng>>,
    #[serde(default)]
    pub overview_polyline: Option<EncodedPolyline>,
}

#[derive(Debug, Deserialize)]
pub struct LegRecord {
    #[serde(default)]
    pub steps: Vec<StepRecord>,
}

#[derive(Debug, Deserialize)]
pub struct StepRecord {
    #[serde(alias = "html_instructions")]
    pub instructions: String,
    #[serde(default)]
    pub maneuver: Option<String>,
    pub start_location: LatLng,
    pub end_location: LatLng,
    pub distance: TextValue,
    pub duration: TextValue,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl From<LatLng> for Coordinate {
    fn from(value: LatLng) -> Self {
        Coordinate::new(value.lat, value.lng)
    }
}

#[derive(Debug, Deserialize)]
pub struct TextValue {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct EncodedPolyline {
    pub points: String,
}

impl DirectionsResponse {
    pub fn from_json(body: &str) -> Result<Self, NavigationError> {
        serde_json::from_str(body)
            .map_err(|err| NavigationError::Routing(format!("Malformed directions response: {err}")))
    }

    /// Checks the status and shape, and keeps the first leg of the first route.
    pub fn into_route(self) -> Result<Route, NavigationError> {
        if self.status != STATUS_OK {
            let msg = match self.error_message {
                Some(detail) => format!("{} ({detail})", self.status),
                None => self.status,
            };
            return Err(NavigationError::Routing(msg));
        }

        let Some(route) = self.routes.into_iter().next() else {
            return Err(NavigationError::Routing("Response contained no routes".into()));
        };

        let overview_path: Vec<Coordinate> = match (route.overview_path, route.overview_polyline) {
            (Some(path), _) if !path.is_empty() => path.into_iter().map(Coordinate::from).collect(),
            (_, Some(polyline)) => decode_polyline(&polyline.points)
                .map_err(|err| NavigationError::Routing(format!("Bad overview polyline: {err}")))?,
            _ => return Err(NavigationError::Routing("Route had no overview path".into())),
        };

        if overview_path.is_empty() || overview_path.iter().any(|c| !c.is_valid()) {
            return Err(NavigationError::Routing("Route had an invalid overview path".into()));
        }

        let Some(leg) = route.legs.into_iter().next() else {
            return Err(NavigationError::Routing("Route contained no legs".into()));
        };

        let steps = leg.steps.into_iter().map(Step::from).collect::<Vec<_>>();

        if steps.iter().any(|step| !step.start.is_valid() || !step.end.is_valid()) {
            return Err(NavigationError::Routing("Step had an invalid location".into()));
        }

        Ok(Route {
            steps,
            overview_path,
        })
    }
}

impl From<StepRecord> for Step {
    fn from(record: StepRecord) -> Self {
        Step {
            instruction_text: record.instructions,
            maneuver: record.maneuver,
            start: record.start_location.into(),
            end: record.end_location.into(),
            distance_text: record.distance.text,
            duration_text: record.duration.text,
        }
    }
}

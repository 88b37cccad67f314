use chrono::{DateTime, Utc};
use geo_types::Point;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// GPX and geo types store longitude in x and latitude in y.
impl From<Point> for Coordinate {
    fn from(point: Point) -> Self {
        Self::new(point.y(), point.x())
    }
}

impl From<Coordinate> for Point {
    fn from(coordinate: Coordinate) -> Self {
        Point::new(coordinate.longitude, coordinate.latitude)
    }
}

/// A single fix delivered by a location source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    pub position: Coordinate,
    pub received_at: DateTime<Utc>,
}

impl PositionSample {
    pub fn new(position: Coordinate, received_at: DateTime<Utc>) -> Self {
        Self {
            position,
            received_at,
        }
    }

    pub fn now(position: Coordinate) -> Self {
        Self::new(position, Utc::now())
    }
}

/// The classroom a session walks to. Fixed for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    pub schedule_id: i64,
    pub position: Coordinate,
    pub building_name: String,
    pub room_number: String,
}

#[test]
fn point_conversion_swaps_axes() {
    let point = Point::new(10.196123, 56.175188);
    let coordinate = Coordinate::from(point);
    assert_eq!(coordinate.latitude, 56.175188);
    assert_eq!(coordinate.longitude, 10.196123);
    assert_eq!(Point::from(coordinate), point);
}

#[test]
fn rejects_out_of_range_coordinates() {
    assert!(Coordinate::new(34.0522, -118.2437).is_valid());
    assert!(!Coordinate::new(91.0, 0.0).is_valid());
    assert!(!Coordinate::new(0.0, f64::NAN).is_valid());
}

use geo::{Distance, Euclidean, LineString, Point};

use crate::coordinate::Coordinate;

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Distance to the destination at which the user counts as arrived.
pub const ARRIVAL_RADIUS_M: f64 = 50.0;

/// Roughly 50 meters near the equator. Only sound for a small deployment area.
pub const PATH_TOLERANCE_DEG: f64 = 0.0005;

/// Great-circle distance in meters.
pub fn haversine_distance(p1: Coordinate, p2: Coordinate) -> f64 {
    let d_lat = (p2.latitude - p1.latitude).to_radians();
    let d_lon = (p2.longitude - p1.longitude).to_radians();
    let lat1 = p1.latitude.to_radians();
    let lat2 = p2.latitude.to_radians();

    let a = f64::sin(d_lat / 2.).powi(2)
        + f64::cos(lat1) * f64::cos(lat2) * f64::sin(d_lon / 2.).powi(2);
    let c = 2. * f64::atan2(a.sqrt(), (1. - a).sqrt());

    EARTH_RADIUS_M * c
}

pub fn has_arrived(position: Coordinate, destination: Coordinate) -> bool {
    haversine_distance(position, destination) <= ARRIVAL_RADIUS_M
}

/// Initial bearing from `from` to `to` in degrees, in the range [-180, 180).
/// Zero is north, positive is clockwise.
pub fn bearing(from: Coordinate, to: Coordinate) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let d_lon = (to.longitude - from.longitude).to_radians();

    let y = d_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos();

    wrap_degrees(y.atan2(x).to_degrees())
}

fn wrap_degrees(degrees: f64) -> f64 {
    let wrapped = (degrees + 180.0).rem_euclid(360.0) - 180.0;
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 180.0 { wrapped - 360.0 } else { wrapped }
}

/// True when `point` lies within `tolerance` degrees of the polyline `path`,
/// measured in the plane with longitude as x and latitude as y.
/// A single-point path is tested as a point, an empty path never matches.
pub fn is_location_on_path(point: Coordinate, path: &[Coordinate], tolerance: f64) -> bool {
    let line: LineString = match path {
        [] => return false,
        [only] => LineString::from(vec![Point::from(*only), Point::from(*only)]),
        _ => path.iter().map(|&coordinate| Point::from(coordinate)).collect(),
    };

    Euclidean.distance(&Point::from(point), &line) <= tolerance
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn haversine_matches_known_distance() {
        let a = Coordinate::new(34.0522, -118.2437);
        let b = Coordinate::new(34.0522, -118.2400);
        let distance = haversine_distance(a, b);
        assert!((330.0..350.0).contains(&distance), "got {distance}");
        assert!(!has_arrived(a, b));
    }

    #[test]
    fn arrival_radius_is_inclusive() {
        let destination = Coordinate::new(34.0522, -118.2437);
        // 0.0004 degrees of latitude is roughly 44.5 m
        assert!(has_arrived(Coordinate::new(34.0526, -118.2437), destination));
        // 0.0009 degrees is roughly 100 m
        assert!(!has_arrived(Coordinate::new(34.0531, -118.2437), destination));
        assert!(has_arrived(destination, destination));
    }

    #[test]
    fn far_points_are_not_arrived() {
        let a = Coordinate::new(34.0522, -118.2437);
        // About 1000 m north
        let b = Coordinate::new(34.0612, -118.2437);
        let distance = haversine_distance(a, b);
        assert!((990.0..1010.0).contains(&distance), "got {distance}");
        assert!(!has_arrived(a, b));
    }

    #[test]
    fn bearing_cardinal_directions() {
        let origin = Coordinate::new(0.0, 0.0);
        assert!((bearing(origin, Coordinate::new(1.0, 0.0)) - 0.0).abs() < 1e-9);
        assert!((bearing(origin, Coordinate::new(0.0, 1.0)) - 90.0).abs() < 1e-9);
        assert!((bearing(origin, Coordinate::new(0.0, -1.0)) + 90.0).abs() < 1e-9);
        assert!((bearing(origin, Coordinate::new(-1.0, 0.0)).abs() - 180.0).abs() < 1e-9);
    }

    #[test]
    fn point_on_path_is_within_tolerance() {
        let path = [
            Coordinate::new(34.0500, -118.2500),
            Coordinate::new(34.0500, -118.2400),
            Coordinate::new(34.0600, -118.2400),
        ];

        assert!(is_location_on_path(Coordinate::new(34.0500, -118.2450), &path, PATH_TOLERANCE_DEG));
        assert!(is_location_on_path(Coordinate::new(34.0503, -118.2450), &path, PATH_TOLERANCE_DEG));
        assert!(is_location_on_path(Coordinate::new(34.0550, -118.2404), &path, PATH_TOLERANCE_DEG));
        assert!(!is_location_on_path(Coordinate::new(34.0520, -118.2450), &path, PATH_TOLERANCE_DEG));
        // Beyond the end of the last segment
        assert!(!is_location_on_path(Coordinate::new(34.0610, -118.2400), &path, PATH_TOLERANCE_DEG));
        // Diagonal offset from the corner, closer to the vertex than either axis suggests
        assert!(is_location_on_path(Coordinate::new(34.0497, -118.2397), &path, PATH_TOLERANCE_DEG));
        assert!(!is_location_on_path(Coordinate::new(34.0496, -118.2396), &path, PATH_TOLERANCE_DEG));
    }

    #[test]
    fn degenerate_paths() {
        let p = Coordinate::new(1.0, 1.0);
        assert!(!is_location_on_path(p, &[], PATH_TOLERANCE_DEG));
        assert!(is_location_on_path(p, &[Coordinate::new(1.0001, 1.0)], PATH_TOLERANCE_DEG));
        assert!(is_location_on_path(p, &[p, p], PATH_TOLERANCE_DEG));
        assert!(!is_location_on_path(p, &[Coordinate::new(1.0, 1.001)], PATH_TOLERANCE_DEG));
    }
}

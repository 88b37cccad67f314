//! Floor-plan image lookup shown once the user has arrived. Image names
//! follow `<building>_floor_<floor>.jpg` and must stay stable.

use serde::{Deserialize, Serialize};

use crate::coordinate::Destination;

pub const UNKNOWN_FLOOR: &str = "Unknown";
pub const IMAGE_DIR: &str = "/images";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorPlan {
    pub building_name: String,
    pub floor_number: String,
    pub image_url: String,
}

impl FloorPlan {
    pub fn new(building_name: &str, room_number: &str) -> Self {
        Self {
            building_name: building_name.to_string(),
            floor_number: floor_number(room_number),
            image_url: image_url(building_name, room_number),
        }
    }
}

impl From<&Destination> for FloorPlan {
    fn from(destination: &Destination) -> Self {
        FloorPlan::new(&destination.building_name, &destination.room_number)
    }
}

/// First character of the room number when it is a digit.
pub fn floor_number(room_number: &str) -> String {
    match room_number.chars().next() {
        Some(c) if c.is_ascii_digit() => c.to_string(),
        _ => UNKNOWN_FLOOR.to_string(),
    }
}

pub fn image_key(building_name: &str, room_number: &str) -> String {
    let mut formatted = String::with_capacity(building_name.len());
    let mut in_whitespace = false;

    for c in building_name.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                formatted.push('_');
            }
            in_whitespace = true;
        } else {
            formatted.push(c);
            in_whitespace = false;
        }
    }

    format!("{}_floor_{}", formatted.to_lowercase(), floor_number(room_number))
}

pub fn image_url(building_name: &str, room_number: &str) -> String {
    format!("{IMAGE_DIR}/{}.jpg", image_key(building_name, room_number))
}

#[test]
fn floor_from_room_number() {
    assert_eq!(floor_number("204"), "2");
    assert_eq!(floor_number("B12"), UNKNOWN_FLOOR);
    assert_eq!(floor_number(""), UNKNOWN_FLOOR);
}

#[test]
fn image_keys() {
    assert_eq!(image_key("Science Hall", "204"), "science_hall_floor_2");
    assert_eq!(image_key("Main  Library", "B12"), "main_library_floor_Unknown");
    assert_eq!(image_key("Engineering\tTower  West", "1A"), "engineering_tower_west_floor_1");
    assert_eq!(image_url("Science Hall", "310"), "/images/science_hall_floor_3.jpg");
}

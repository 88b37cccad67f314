use serde::{Deserialize, Serialize};

use crate::{
    coordinate::{Coordinate, Destination},
    NavigationError,
};

/// A schedule entry as returned by `GET /api/schedules/{id}/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub classroom: Classroom,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classroom {
    pub latitude: f64,
    pub longitude: f64,
    pub room_number: String,
    pub building: Building,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Building {
    pub name: String,
}

impl ScheduleEntry {
    pub fn into_destination(self, schedule_id: i64) -> Result<Destination, NavigationError> {
        let classroom = self.classroom;
        let position = Coordinate::new(classroom.latitude, classroom.longitude);

        if !position.is_valid() {
            return Err(NavigationError::Resolver(format!(
                "Classroom {} has invalid coordinates ({}, {})",
                classroom.room_number, classroom.latitude, classroom.longitude
            )));
        }

        Ok(Destination {
            schedule_id,
            position,
            building_name: classroom.building.name,
            room_number: classroom.room_number,
        })
    }
}

#[test]
fn schedule_entry_into_destination() {
    let body = r#"{
        "id": 7,
        "course_name": "Algorithms",
        "classroom": {
            "latitude": 34.0689,
            "longitude": -118.4452,
            "room_number": "204",
            "building": { "name": "Science Hall" }
        }
    }"#;

    let entry: ScheduleEntry = serde_json::from_str(body).unwrap();
    let destination = entry.into_destination(7).unwrap();

    assert_eq!(destination.schedule_id, 7);
    assert_eq!(destination.position, Coordinate::new(34.0689, -118.4452));
    assert_eq!(destination.building_name, "Science Hall");
    assert_eq!(destination.room_number, "204");
}

#[test]
fn invalid_classroom_coordinates_are_rejected() {
    let entry = ScheduleEntry {
        classroom: Classroom {
            latitude: 120.0,
            longitude: 0.0,
            room_number: "1".into(),
            building: Building { name: "X".into() },
        },
    };

    assert!(matches!(entry.into_destination(1), Err(NavigationError::Resolver(_))));
}

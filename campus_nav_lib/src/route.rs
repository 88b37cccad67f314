use serde::{Deserialize, Serialize};

use crate::{coordinate::Coordinate, geometry::bearing};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// As delivered by the provider, may contain HTML markup.
    pub instruction_text: String,
    pub maneuver: Option<String>,
    pub start: Coordinate,
    pub end: Coordinate,
    pub distance_text: String,
    pub duration_text: String,
}

impl Step {
    pub fn is_turn(&self) -> bool {
        self.maneuver.as_deref().is_some_and(|maneuver| maneuver.contains("turn"))
    }

    /// Instruction text with markup tags removed.
    pub fn plain_instructions(&self) -> String {
        let mut plain = String::with_capacity(self.instruction_text.len());
        let mut in_tag = false;

        for c in self.instruction_text.chars() {
            match c {
                '<' => in_tag = true,
                '>' if in_tag => {
                    in_tag = false;
                    // Block tags separate sentences
                    if !plain.ends_with(' ') && !plain.is_empty() {
                        plain.push(' ');
                    }
                }
                _ if !in_tag => plain.push(c),
                _ => {}
            }
        }

        plain.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    pub fn turn_marker(&self) -> Option<TurnMarker> {
        self.is_turn().then(|| TurnMarker {
            position: self.start,
            heading_degrees: bearing(self.start, self.end),
        })
    }
}

/// Directional glyph placed where a turn begins, oriented along the step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TurnMarker {
    pub position: Coordinate,
    pub heading_degrees: f64,
}

/// A walking route as returned by a directions provider.
/// Only the first leg of the first alternative is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub steps: Vec<Step>,
    pub overview_path: Vec<Coordinate>,
}

/// A route together with everything derived from it. Always built from a
/// single route response so the parts never disagree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveRoute {
    pub route: Route,
    pub turn_markers: Vec<TurnMarker>,
    pub steps: Vec<Step>,
}

impl ActiveRoute {
    pub fn from_route(route: Route) -> Self {
        let turn_markers = route.steps.iter().filter_map(Step::turn_marker).collect();
        let steps = route.steps.clone();

        Self {
            route,
            turn_markers,
            steps,
        }
    }
}

#[cfg(test)]
pub(crate) fn test_step(maneuver: Option<&str>, start: Coordinate, end: Coordinate) -> Step {
    Step {
        instruction_text: "Head <b>north</b>".into(),
        maneuver: maneuver.map(String::from),
        start,
        end,
        distance_text: "10 m".into(),
        duration_text: "1 min".into(),
    }
}

#[test]
fn only_turn_steps_produce_markers() {
    let a = Coordinate::new(0.0, 0.0);
    let b = Coordinate::new(0.0, 0.001);
    let c = Coordinate::new(0.001, 0.001);
    let d = Coordinate::new(0.001, 0.0);

    let route = Route {
        steps: vec![
            test_step(None, a, b),
            test_step(Some("turn-left"), b, c),
            test_step(Some("straight"), c, c),
            test_step(Some("turn-sharp-left"), c, d),
            test_step(Some("roundabout-right"), d, a),
        ],
        overview_path: vec![a, b, c, d],
    };

    let active = ActiveRoute::from_route(route.clone());

    assert_eq!(active.steps, route.steps);
    assert_eq!(active.turn_markers.len(), 2);
    assert_eq!(active.turn_markers[0].position, b);
    assert!((active.turn_markers[0].heading_degrees - bearing(b, c)).abs() < 1e-12);
    assert!(active.turn_markers[0].heading_degrees.abs() < 1e-6);
    assert_eq!(active.turn_markers[1].position, c);
    assert!((active.turn_markers[1].heading_degrees + 90.0).abs() < 1e-3);
}

#[test]
fn strips_instruction_markup() {
    let mut step = test_step(None, Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 0.0));
    step.instruction_text = "Turn <b>left</b> onto <b>Campus Dr</b><div style=\"font-size:0.9em\">Destination will be on the right</div>".into();
    assert_eq!(step.plain_instructions(), "Turn left onto Campus Dr Destination will be on the right");
}

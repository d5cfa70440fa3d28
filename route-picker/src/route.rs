use geo::Coord;
use geojson::Feature;
use log::{info, warn};
use serde::Deserialize;

use route_picker_graph::{distance, position_to_coord, RouteNetwork};

use crate::router::{find_path, PathError};
use crate::Config;

/// The waypoints a user has placed so far, and the path between each consecutive pair.
pub struct RouteSession {
    config: Config,
    // Something explicitly placed by the user
    waypoints: Vec<Coord>,
    // segments[i] connects waypoints[i] to waypoints[i + 1]
    segments: Vec<Segment>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Empty,
    Building,
}

/// The connection from one waypoint to the next. Never changes once created.
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    /// The segment's position in the route, for keyed rendering
    pub key: usize,
    pub coords: Vec<Coord>,
    pub kind: SegmentKind,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SegmentKind {
    /// Follows the network; `cost` is the length of the path over it
    Routed { cost: f64 },
    /// A straight guide line, when the network doesn't connect the waypoints
    Straight,
}

/// Something the drawing tools created. Only markers mean anything here.
#[derive(Clone, Debug, Deserialize)]
pub struct DrawEvent {
    pub shape: String,
    #[serde(default)]
    pub coordinates: serde_json::Value,
}

impl DrawEvent {
    pub fn marker(pt: Coord) -> DrawEvent {
        DrawEvent {
            shape: "Marker".to_string(),
            coordinates: serde_json::json!([pt.x, pt.y]),
        }
    }

    fn marker_position(&self) -> Option<Coord> {
        if self.shape != "Marker" {
            return None;
        }
        let position: Vec<f64> = serde_json::from_value(self.coordinates.clone()).ok()?;
        position_to_coord(&position)
    }
}

impl Segment {
    pub fn length(&self) -> f64 {
        self.coords
            .windows(2)
            .map(|pair| distance(pair[0], pair[1]))
            .sum()
    }
}

impl RouteSession {
    pub fn new(config: Config) -> RouteSession {
        RouteSession {
            config,
            waypoints: Vec::new(),
            segments: Vec::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Affects segments created from now on; existing ones stay as they are.
    pub fn set_config(&mut self, config: Config) {
        self.config = config;
    }

    pub fn state(&self) -> SessionState {
        if self.waypoints.is_empty() {
            SessionState::Empty
        } else {
            SessionState::Building
        }
    }

    pub fn waypoints(&self) -> &[Coord] {
        &self.waypoints
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn last_waypoint(&self) -> Option<Coord> {
        self.waypoints.last().copied()
    }

    /// The length of the whole route so far
    pub fn total_length(&self) -> f64 {
        self.segments.iter().map(Segment::length).sum()
    }

    /// Handles a drawing event against the current network. Returns true if the event placed a
    /// waypoint; anything that isn't a well-formed marker is ignored.
    pub fn handle_event(&mut self, network: &[Feature], event: &DrawEvent) -> bool {
        let Some(pt) = event.marker_position() else {
            if event.shape == "Marker" {
                warn!("Ignoring marker with bad coordinates {}", event.coordinates);
            }
            return false;
        };
        self.place_waypoint(network, pt);
        true
    }

    /// Appends a waypoint. After the first, this routes from the previous waypoint over a network
    /// freshly built from `network`, and appends the new segment. When the network doesn't connect
    /// the two, the segment is a straight line instead.
    pub fn place_waypoint(&mut self, network: &[Feature], pt: Coord) -> Option<&Segment> {
        let Some(prev) = self.last_waypoint() else {
            info!("Starting route at {pt:?}");
            self.waypoints.push(pt);
            return None;
        };

        let graph = RouteNetwork::build(network, self.config.snap_precision);
        let (coords, kind) = match find_path(&graph, prev, pt) {
            // The path already runs from the snapped prev to the snapped pt
            Ok(path) if path.coords.len() >= 2 => {
                (path.coords, SegmentKind::Routed { cost: path.cost })
            }
            // Both ends snapped to the same spot
            Ok(_) => (vec![prev, pt], SegmentKind::Straight),
            Err(PathError::NoRoute) => {
                info!("No route from {prev:?} to {pt:?}, using a straight line");
                (vec![prev, pt], SegmentKind::Straight)
            }
        };

        let key = self.segments.len();
        info!("Segment {key} to {pt:?} has {} points", coords.len());
        self.segments.push(Segment { key, coords, kind });
        self.waypoints.push(pt);
        self.segments.last()
    }
}


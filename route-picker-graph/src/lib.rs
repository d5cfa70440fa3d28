use std::collections::HashMap;

use geo::{Coord, Distance, Euclidean, Point};
use geojson::{Feature, FeatureCollection, GeoJson, Value};
use log::{debug, warn};

/// A routable graph derived from the LineStrings of a feature collection. Nodes are distinct
/// coordinates, and every edge is a straight segment between two of them.
pub struct RouteNetwork {
    pub nodes: Vec<Coord>,
    pub edges: Vec<Edge>,
    node_lookup: HashMap<NodeKey, NodeID>,
    snap_precision: Option<f64>,
}

/// An undirected edge; `length` is the Euclidean distance between the two nodes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Edge {
    pub node1: NodeID,
    pub node2: NodeID,
    pub length: f64,
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct EdgeID(pub u32);
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct NodeID(pub u32);

type NodeKey = (u64, u64);

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("invalid GeoJSON: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("input must be a FeatureCollection")]
    NotFeatureCollection,
}

impl RouteNetwork {
    /// Builds a fresh network from a snapshot of features. Only LineStrings contribute; points,
    /// polygons and everything else are ignored, and malformed lines are skipped with a warning.
    ///
    /// Without a `snap_precision`, two coordinates are the same node only if they're numerically
    /// equal. With one, coordinates rounding to the same multiple of it are merged, and the first
    /// one seen is kept as the node's position.
    pub fn build(features: &[Feature], snap_precision: Option<f64>) -> RouteNetwork {
        let mut network = RouteNetwork {
            nodes: Vec::new(),
            edges: Vec::new(),
            node_lookup: HashMap::new(),
            snap_precision: snap_precision.filter(|p| p.is_finite() && *p > 0.0),
        };

        for (idx, feature) in features.iter().enumerate() {
            let Some(Value::LineString(_)) = feature.geometry.as_ref().map(|g| &g.value) else {
                continue;
            };
            let Some(pts) = line_string_coords(feature) else {
                warn!("Skipping malformed LineString at feature {idx}");
                continue;
            };

            for pair in pts.windows(2) {
                let node1 = network.intern_node(pair[0]);
                let node2 = network.intern_node(pair[1]);
                // Zero-length edges would just be self-loops
                if node1 == node2 {
                    continue;
                }
                network.edges.push(Edge {
                    node1,
                    node2,
                    length: distance(network.node(node1), network.node(node2)),
                });
            }
        }

        debug!(
            "{} nodes and {} edges total",
            network.nodes.len(),
            network.edges.len()
        );
        network
    }

    pub fn edge(&self, id: EdgeID) -> &Edge {
        &self.edges[id.0 as usize]
    }
    pub fn node(&self, id: NodeID) -> Coord {
        self.nodes[id.0 as usize]
    }

    /// The node sitting exactly at this point (or in the same grid cell, with a precision set)
    pub fn find_node(&self, pt: Coord) -> Option<NodeID> {
        self.node_lookup
            .get(&node_key(pt, self.snap_precision))
            .copied()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    fn intern_node(&mut self, pt: Coord) -> NodeID {
        let key = node_key(pt, self.snap_precision);
        let next_id = NodeID(self.nodes.len() as u32);
        let nodes = &mut self.nodes;
        *self.node_lookup.entry(key).or_insert_with(|| {
            nodes.push(pt);
            next_id
        })
    }
}

fn node_key(pt: Coord, snap_precision: Option<f64>) -> NodeKey {
    let snap = |v: f64| match snap_precision {
        Some(precision) => (v / precision).round() * precision,
        None => v,
    };
    // Adding zero folds -0.0 into 0.0, so the bits agree whenever the values compare equal
    ((snap(pt.x) + 0.0).to_bits(), (snap(pt.y) + 0.0).to_bits())
}

pub fn distance(pt1: Coord, pt2: Coord) -> f64 {
    Euclidean.distance(Point::from(pt1), Point::from(pt2))
}

/// Parses text that must hold a GeoJSON FeatureCollection.
pub fn parse_feature_collection(input: &str) -> Result<FeatureCollection, InputError> {
    match input.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(collection) => Ok(collection),
        _ => Err(InputError::NotFeatureCollection),
    }
}

/// The coordinates of a Point feature, if it's a well-formed one
pub fn point_coord(feature: &Feature) -> Option<Coord> {
    match &feature.geometry.as_ref()?.value {
        Value::Point(position) => position_to_coord(position),
        _ => None,
    }
}

/// The coordinates of a LineString feature with at least two valid positions
pub fn line_string_coords(feature: &Feature) -> Option<Vec<Coord>> {
    let Value::LineString(positions) = &feature.geometry.as_ref()?.value else {
        return None;
    };
    if positions.len() < 2 {
        return None;
    }
    positions
        .iter()
        .map(|position| position_to_coord(position))
        .collect()
}

pub fn position_to_coord(position: &[f64]) -> Option<Coord> {
    match position {
        [x, y, ..] if x.is_finite() && y.is_finite() => Some(Coord { x: *x, y: *y }),
        _ => None,
    }
}

pub fn coord_to_position(pt: Coord) -> Vec<f64> {
    vec![pt.x, pt.y]
}

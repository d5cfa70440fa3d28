use std::collections::BTreeMap;

use geo::Coord;
use log::debug;
use petgraph::graphmap::UnGraphMap;
use rstar::primitives::{GeomWithData, Line};
use rstar::RTree;

use route_picker_graph::{distance, EdgeID, NodeID, RouteNetwork};

type Graph = UnGraphMap<NodeID, f64>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// The two points are in disconnected parts of the network, or there's no network at all.
    /// Callers are expected to recover from this.
    #[error("no route between the two points in the current network")]
    NoRoute,
}

/// A shortest path over the network, from the snapped start to the snapped end inclusive
#[derive(Clone, Debug, PartialEq)]
pub struct Path {
    pub coords: Vec<Coord>,
    /// The sum of Euclidean edge lengths along the path
    pub cost: f64,
}

// Where an arbitrary point lands on the network
#[derive(Clone, Copy, Debug, PartialEq)]
enum Snap {
    Node(NodeID),
    OnEdge { edge: EdgeID, pt: Coord },
}

/// Snaps both points onto the network, then finds the shortest path between them.
pub fn find_path(network: &RouteNetwork, from: Coord, to: Coord) -> Result<Path, PathError> {
    if network.is_empty() {
        return Err(PathError::NoRoute);
    }

    let mut router = Router::new(network);
    let start = router.snap(from).ok_or(PathError::NoRoute)?;
    let end = router.snap(to).ok_or(PathError::NoRoute)?;
    debug!("Snapped {from:?} to {start:?} and {to:?} to {end:?}");
    let [node1, node2] = router.split_edges([start, end]);

    let goal = router.pt(node2);
    let (cost, path) = petgraph::algo::astar(
        &router.graph,
        node1,
        |i| i == node2,
        |(_, _, length)| *length,
        |i| distance(router.pt(i), goal),
    )
    .ok_or(PathError::NoRoute)?;

    Ok(Path {
        coords: path.into_iter().map(|i| router.pt(i)).collect(),
        cost,
    })
}

// Lives for a single query. Temporary nodes from snapping get IDs after the network's nodes.
struct Router<'a> {
    network: &'a RouteNetwork,
    graph: Graph,
    snap_to_edges: RTree<GeomWithData<Line<[f64; 2]>, EdgeID>>,
    extra_nodes: Vec<Coord>,
}

impl<'a> Router<'a> {
    fn new(network: &'a RouteNetwork) -> Router<'a> {
        let mut graph = Graph::new();
        let mut lines = Vec::new();
        for (idx, e) in network.edges.iter().enumerate() {
            graph.add_edge(e.node1, e.node2, e.length);

            let pt1 = network.node(e.node1);
            let pt2 = network.node(e.node2);
            lines.push(GeomWithData::new(
                Line::new([pt1.x, pt1.y], [pt2.x, pt2.y]),
                EdgeID(idx as u32),
            ));
        }

        Router {
            network,
            graph,
            snap_to_edges: RTree::bulk_load(lines),
            extra_nodes: Vec::new(),
        }
    }

    fn pt(&self, id: NodeID) -> Coord {
        let idx = id.0 as usize;
        if idx < self.network.nodes.len() {
            self.network.nodes[idx]
        } else {
            self.extra_nodes[idx - self.network.nodes.len()]
        }
    }

    // Projects onto the nearest edge. When several edges are equally close, the one listed first
    // in the network wins. Only a point exactly on a node skips the projection, so with a snap
    // precision, the grid applies to where the point lands on the network, not the raw point.
    fn snap(&self, pt: Coord) -> Option<Snap> {
        if let Some(node) = self.network.find_node(pt) {
            if self.network.node(node) == pt {
                return Some(Snap::Node(node));
            }
        }

        let query = [pt.x, pt.y];
        let mut candidates = self
            .snap_to_edges
            .nearest_neighbor_iter_with_distance_2(&query);
        let (first, best_dist) = candidates.next()?;
        let nearest = candidates
            .take_while(|(_, dist)| *dist == best_dist)
            .fold(first, |best, (obj, _)| {
                if obj.data < best.data {
                    obj
                } else {
                    best
                }
            });

        let [x, y] = nearest.geom().nearest_point(&query);
        let projected = Coord { x, y };
        // Clamping at either end of the segment (or landing on a vertex) reuses that node
        if let Some(node) = self.network.find_node(projected) {
            return Some(Snap::Node(node));
        }
        Some(Snap::OnEdge {
            edge: nearest.data,
            pt: projected,
        })
    }

    // Turns snaps into nodes. Any edge with a snapped point on it is replaced by a chain of
    // sub-edges through those points.
    fn split_edges(&mut self, snaps: [Snap; 2]) -> [NodeID; 2] {
        let mut splits: BTreeMap<EdgeID, Vec<(f64, NodeID)>> = BTreeMap::new();
        let ids = snaps.map(|snap| match snap {
            Snap::Node(node) => node,
            Snap::OnEdge { edge, pt } => {
                // Both points may project to the same spot
                if let Some(idx) = self.extra_nodes.iter().position(|x| *x == pt) {
                    return NodeID((self.network.nodes.len() + idx) as u32);
                }
                let id = NodeID((self.network.nodes.len() + self.extra_nodes.len()) as u32);
                self.extra_nodes.push(pt);
                let along = distance(self.network.node(self.network.edge(edge).node1), pt);
                splits.entry(edge).or_default().push((along, id));
                id
            }
        });

        for (edge_id, mut along) in splits {
            let edge = *self.network.edge(edge_id);
            self.graph.remove_edge(edge.node1, edge.node2);

            along.sort_by(|a, b| a.0.total_cmp(&b.0));
            let mut chain = vec![edge.node1];
            chain.extend(along.into_iter().map(|(_, id)| id));
            chain.push(edge.node2);
            for pair in chain.windows(2) {
                let length = distance(self.pt(pair[0]), self.pt(pair[1]));
                self.graph.add_edge(pair[0], pair[1], length);
            }
        }

        ids
    }
}

//! The road graph: node table, adjacency and geographic lookup.
//!
//! A [RouteModel] is immutable after construction and safe to share across
//! threads behind an `Arc`. The map loader (an OSM-style reader) lives
//! outside this crate; the model is built from the nodes and undirected
//! edges it delivers.

use std::fmt;

use rand::Rng;

use crate::spatial::{euclidean, Coordinate, MapBounds};

/// Stable index of a graph vertex in the model's node table. Neighbours
/// are reached by querying the [RouteModel], not stored on the node.
pub type NodeId = usize;

/// Fatal map construction errors. These are the only errors that propagate
/// out of simulation startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    EmptyMap,
    EdgeOutOfRange { from: usize, to: usize, nodes: usize },
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::EmptyMap => write!(f, "map has no nodes"),
            MapError::EdgeOutOfRange { from, to, nodes } => write!(
                f,
                "edge ({from}, {to}) references a node outside the table of {nodes} nodes"
            ),
        }
    }
}

impl std::error::Error for MapError {}

/// Immutable road graph with geographic lookup.
#[derive(Debug)]
pub struct RouteModel {
    nodes: Vec<Coordinate>,
    adjacency: Vec<Vec<NodeId>>,
    bounds: MapBounds,
}

impl RouteModel {
    /// Builds a model from a node table and undirected edges.
    ///
    /// Adjacency preserves edge input order. Self-edges are dropped and a
    /// repeated edge is kept only once per direction. Bounds are the tight
    /// bounding box of the node table.
    pub fn from_parts(nodes: Vec<Coordinate>, edges: &[(usize, usize)]) -> Result<Self, MapError> {
        if nodes.is_empty() {
            return Err(MapError::EmptyMap);
        }

        let mut adjacency = vec![Vec::new(); nodes.len()];
        for &(from, to) in edges {
            if from >= nodes.len() || to >= nodes.len() {
                return Err(MapError::EdgeOutOfRange {
                    from,
                    to,
                    nodes: nodes.len(),
                });
            }
            if from == to {
                continue;
            }
            if !adjacency[from].contains(&to) {
                adjacency[from].push(to);
            }
            if !adjacency[to].contains(&from) {
                adjacency[to].push(from);
            }
        }

        let mut bounds = MapBounds {
            min_lon: f64::INFINITY,
            max_lon: f64::NEG_INFINITY,
            min_lat: f64::INFINITY,
            max_lat: f64::NEG_INFINITY,
        };
        for node in &nodes {
            bounds.min_lon = bounds.min_lon.min(node.x);
            bounds.max_lon = bounds.max_lon.max(node.x);
            bounds.min_lat = bounds.min_lat.min(node.y);
            bounds.max_lat = bounds.max_lat.max(node.y);
        }

        Ok(Self {
            nodes,
            adjacency,
            bounds,
        })
    }

    /// Uniform random position over the rectangular bounds. The RNG is
    /// supplied by the caller so the model itself stays immutable.
    pub fn random_position<R: Rng>(&self, rng: &mut R) -> Coordinate {
        Coordinate {
            x: rng.gen_range(self.bounds.min_lon..=self.bounds.max_lon),
            y: rng.gen_range(self.bounds.min_lat..=self.bounds.max_lat),
        }
    }

    /// Node with minimum Euclidean distance to `position`; ties go to the
    /// lowest node index.
    pub fn closest_node(&self, position: Coordinate) -> NodeId {
        let mut best = 0;
        let mut best_distance = f64::INFINITY;
        for (id, &node) in self.nodes.iter().enumerate() {
            let distance = euclidean(position, node);
            if distance < best_distance {
                best = id;
                best_distance = distance;
            }
        }
        best
    }

    /// Snaps a coordinate onto the nearest road node.
    pub fn closest_node_position(&self, position: Coordinate) -> Coordinate {
        self.nodes[self.closest_node(position)]
    }

    /// Neighbours of a node, in the deterministic order they were loaded.
    pub fn neighbours(&self, node: NodeId) -> &[NodeId] {
        &self.adjacency[node]
    }

    /// Euclidean distance in degrees between two nodes.
    pub fn distance(&self, a: NodeId, b: NodeId) -> f64 {
        euclidean(self.nodes[a], self.nodes[b])
    }

    pub fn node(&self, id: NodeId) -> Coordinate {
        self.nodes[id]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// All node positions; the renderer draws these as intersections.
    pub fn intersections(&self) -> &[Coordinate] {
        &self.nodes
    }

    pub fn bounds(&self) -> MapBounds {
        self.bounds
    }
}

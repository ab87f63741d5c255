//! A* route planning over the road graph.
//!
//! The planner snaps start and goal onto their nearest nodes and searches
//! with `f = g + h`, where `g` is accumulated Euclidean path length and `h`
//! is the Euclidean distance to the goal node (admissible and consistent on
//! the degree plane). Successful node-pair paths are memoised in an LRU
//! cache; failures are recomputed on the next attempt.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use lru::LruCache;

use crate::agents::Vehicle;
use crate::map::{NodeId, RouteModel};
use crate::spatial::Coordinate;

const PATH_CACHE_ENTRIES: usize = 4096;

/// Frontier entry. The reversed ordering makes `BinaryHeap` (a max-heap)
/// pop the lowest `f`; equal `f` prefers the lower `h` (the more
/// goal-directed node), then the lower node index for determinism.
#[derive(Debug, PartialEq)]
struct Frontier {
    f: f64,
    h: f64,
    node: NodeId,
}

impl Eq for Frontier {}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .partial_cmp(&self.f)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.h.partial_cmp(&self.h).unwrap_or(Ordering::Equal))
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A* planner over an immutable [RouteModel]. Cheap to share behind an
/// `Arc` or per-actor instance; the cache is internally synchronised.
pub struct RoutePlanner {
    model: Arc<RouteModel>,
    cache: Mutex<LruCache<(NodeId, NodeId), Vec<Coordinate>>>,
}

impl std::fmt::Debug for RoutePlanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutePlanner")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl RoutePlanner {
    pub fn new(model: Arc<RouteModel>) -> Self {
        Self {
            model,
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(PATH_CACHE_ENTRIES).expect("cache size must be non-zero"),
            )),
        }
    }

    /// Plans a route between two map positions.
    ///
    /// The returned path is a sequence of node coordinates excluding the
    /// snapped start node and including the goal node; when start and goal
    /// snap to the same node the path is just `[goal]`. An empty path means
    /// the goal is unreachable.
    pub fn plan(&self, start: Coordinate, goal: Coordinate) -> Vec<Coordinate> {
        let start_node = self.model.closest_node(start);
        let goal_node = self.model.closest_node(goal);

        let mut cache = match self.cache.lock() {
            Ok(guard) => guard,
            // Compute without the cache if the mutex is poisoned.
            Err(_) => return self.search(start_node, goal_node),
        };
        if let Some(path) = cache.get(&(start_node, goal_node)) {
            return path.clone();
        }
        drop(cache);

        let path = self.search(start_node, goal_node);
        if !path.is_empty() {
            if let Ok(mut cache) = self.cache.lock() {
                cache.put((start_node, goal_node), path.clone());
            }
        }
        path
    }

    /// Plans from the vehicle's position to its destination and writes the
    /// result back, resetting the path cursor. Returns whether a route was
    /// found.
    pub fn plan_into(&self, vehicle: &mut Vehicle) -> bool {
        let path = self.plan(vehicle.position(), vehicle.destination());
        if path.is_empty() {
            return false;
        }
        vehicle.set_path(path);
        true
    }

    fn search(&self, start: NodeId, goal: NodeId) -> Vec<Coordinate> {
        if start == goal {
            return vec![self.model.node(goal)];
        }

        let n = self.model.node_count();
        let mut visited = vec![false; n];
        let mut parent = vec![usize::MAX; n];
        let mut g = vec![0.0_f64; n];

        let mut frontier = BinaryHeap::new();
        visited[start] = true;
        frontier.push(Frontier {
            f: self.model.distance(start, goal),
            h: self.model.distance(start, goal),
            node: start,
        });

        while let Some(Frontier { node, .. }) = frontier.pop() {
            if node == goal {
                return self.reconstruct(&parent, start, goal);
            }
            for &neighbour in self.model.neighbours(node) {
                if visited[neighbour] {
                    continue;
                }
                visited[neighbour] = true;
                parent[neighbour] = node;
                g[neighbour] = g[node] + self.model.distance(node, neighbour);
                let h = self.model.distance(neighbour, goal);
                frontier.push(Frontier {
                    f: g[neighbour] + h,
                    h,
                    node: neighbour,
                });
            }
        }

        // Open set exhausted: the goal is in another component.
        Vec::new()
    }

    fn reconstruct(&self, parent: &[usize], start: NodeId, goal: NodeId) -> Vec<Coordinate> {
        let mut path = Vec::new();
        let mut current = goal;
        while current != start {
            path.push(self.model.node(current));
            current = parent[current];
        }
        path.reverse();
        path
    }
}

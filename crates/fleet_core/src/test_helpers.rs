//! Synthetic road graphs and harnesses shared across test files.

use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;

use crate::map::RouteModel;
use crate::matching::MatcherMessage;
use crate::passengers::PassengerQueue;
use crate::snapshot::SnapshotHub;
use crate::spatial::Coordinate;
use crate::telemetry::FleetTelemetry;

/// A `width` x `height` four-connected grid with `spacing` degrees between
/// adjacent nodes. Node `(col, row)` has index `row * width + col` and sits
/// at `(col * spacing, row * spacing)`.
pub fn grid_model(width: usize, height: usize, spacing: f64) -> RouteModel {
    let mut nodes = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            nodes.push(Coordinate::new(col as f64 * spacing, row as f64 * spacing));
        }
    }
    let mut edges = Vec::new();
    for row in 0..height {
        for col in 0..width {
            let here = row * width + col;
            if col + 1 < width {
                edges.push((here, here + 1));
            }
            if row + 1 < height {
                edges.push((here, here + width));
            }
        }
    }
    RouteModel::from_parts(nodes, &edges).expect("grid model is valid")
}

/// A 3x3 grid at the origin plus a two-node island near `(100, 100)`.
/// Routes between the components do not exist.
pub fn split_model() -> RouteModel {
    let mut nodes = Vec::new();
    for row in 0..3 {
        for col in 0..3 {
            nodes.push(Coordinate::new(col as f64, row as f64));
        }
    }
    let island = nodes.len();
    nodes.push(Coordinate::new(100.0, 100.0));
    nodes.push(Coordinate::new(101.0, 100.0));

    let mut edges = Vec::new();
    for row in 0..3 {
        for col in 0..3 {
            let here = row * 3 + col;
            if col + 1 < 3 {
                edges.push((here, here + 1));
            }
            if row + 1 < 3 {
                edges.push((here, here + 3));
            }
        }
    }
    edges.push((island, island + 1));
    RouteModel::from_parts(nodes, &edges).expect("split model is valid")
}

/// A passenger queue over `model` with the test holding the matcher's end
/// of the channel.
pub fn queue_harness(
    model: RouteModel,
    pool_size: usize,
    seed: u64,
) -> (PassengerQueue, Receiver<MatcherMessage>) {
    let model = Arc::new(model);
    let (matcher_tx, matcher_rx) = mpsc::channel();
    let hub = Arc::new(SnapshotHub::new(model.intersections().to_vec()));
    let queue = PassengerQueue::new(
        model,
        matcher_tx,
        Arc::new(FleetTelemetry::default()),
        hub,
        pool_size,
        seed,
    );
    (queue, matcher_rx)
}

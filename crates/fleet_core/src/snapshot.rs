//! Render snapshots: the pull-based interface between the simulation and a
//! display loop.
//!
//! Actors publish copies of their visible state into the [SnapshotHub] at
//! the end of each tick; the renderer polls at its own rate and never
//! touches live actor state.

use std::sync::Mutex;

use crate::agents::{Rgb, VehicleState};
use crate::spatial::{Coordinate, MapBounds};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleSnapshot {
    pub id: usize,
    pub position: Coordinate,
    pub state: VehicleState,
    /// Color of the carried passenger, if any.
    pub color: Option<Rgb>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassengerSnapshot {
    pub id: u64,
    pub start: Coordinate,
    pub destination: Coordinate,
    pub color: Rgb,
}

/// Maps a coordinate into pixel space for a `width` x `height` canvas.
/// Latitude grows upward on the map but pixel rows grow downward.
pub fn to_pixel(bounds: MapBounds, c: Coordinate, width: f64, height: f64) -> (f64, f64) {
    let px = (c.x - bounds.min_lon) / (bounds.max_lon - bounds.min_lon) * width;
    let py = (bounds.max_lat - c.y) / (bounds.max_lat - bounds.min_lat) * height;
    (px, py)
}

/// Snapshot store shared between the actors and the renderer.
#[derive(Debug)]
pub struct SnapshotHub {
    intersections: Vec<Coordinate>,
    vehicles: Mutex<Vec<VehicleSnapshot>>,
    passengers: Mutex<Vec<PassengerSnapshot>>,
}

impl SnapshotHub {
    pub fn new(intersections: Vec<Coordinate>) -> Self {
        Self {
            intersections,
            vehicles: Mutex::new(Vec::new()),
            passengers: Mutex::new(Vec::new()),
        }
    }

    /// Road intersections; immutable after init.
    pub fn intersections(&self) -> &[Coordinate] {
        &self.intersections
    }

    pub fn publish_vehicles(&self, snapshot: Vec<VehicleSnapshot>) {
        if let Ok(mut vehicles) = self.vehicles.lock() {
            *vehicles = snapshot;
        }
    }

    pub fn vehicles(&self) -> Vec<VehicleSnapshot> {
        match self.vehicles.lock() {
            Ok(vehicles) => vehicles.clone(),
            Err(_) => Vec::new(),
        }
    }

    pub fn publish_new_passengers(&self, snapshot: Vec<PassengerSnapshot>) {
        if let Ok(mut passengers) = self.passengers.lock() {
            *passengers = snapshot;
        }
    }

    pub fn new_passengers(&self) -> Vec<PassengerSnapshot> {
        match self.passengers.lock() {
            Ok(passengers) => passengers.clone(),
            Err(_) => Vec::new(),
        }
    }
}

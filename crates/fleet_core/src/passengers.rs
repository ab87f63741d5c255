//! The passenger queue actor: generates passengers, requests rides for
//! them, and hands ownership over to a vehicle at pickup.
//!
//! All queue state sits behind one internal mutex, so the generator loop,
//! the matcher and the vehicle manager can call in concurrently. The lock is
//! never held across a send into another actor.

use std::collections::HashSet;
use std::fmt;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, MutexGuard};

use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::agents::{Passenger, Rgb};
use crate::map::RouteModel;
use crate::matching::MatcherMessage;
use crate::snapshot::{PassengerSnapshot, SnapshotHub};
use crate::spatial::Coordinate;
use crate::telemetry::FleetTelemetry;

/// Queue protocol errors. `NotFound` on handoff signals a protocol bug on
/// the caller's side; queue state is left unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    NotFound(u64),
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueError::NotFound(id) => write!(f, "passenger #{id} is not waiting in the queue"),
        }
    }
}

impl std::error::Error for QueueError {}

#[derive(Debug)]
struct QueueState {
    new_passengers: Vec<Passenger>,
    in_transit: HashSet<u64>,
    next_id: u64,
    rng: StdRng,
}

/// Owns every passenger from generation until handoff.
#[derive(Debug)]
pub struct PassengerQueue {
    model: Arc<RouteModel>,
    matcher_tx: Sender<MatcherMessage>,
    telemetry: Arc<FleetTelemetry>,
    hub: Arc<SnapshotHub>,
    pool_size: usize,
    state: Mutex<QueueState>,
}

impl PassengerQueue {
    /// Creates the queue and generates the initial passenger pool.
    pub fn new(
        model: Arc<RouteModel>,
        matcher_tx: Sender<MatcherMessage>,
        telemetry: Arc<FleetTelemetry>,
        hub: Arc<SnapshotHub>,
        pool_size: usize,
        seed: u64,
    ) -> Self {
        let queue = Self {
            model,
            matcher_tx,
            telemetry,
            hub,
            pool_size,
            state: Mutex::new(QueueState {
                new_passengers: Vec::new(),
                in_transit: HashSet::new(),
                next_id: 0,
                rng: StdRng::seed_from_u64(seed),
            }),
        };
        queue.top_up(&mut queue.state());
        queue
    }

    fn state(&self) -> MutexGuard<'_, QueueState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Generates passengers until waiting + in-transit reaches the pool
    /// size, so replacements appear only after drop-offs.
    fn top_up(&self, state: &mut QueueState) {
        while state.new_passengers.len() + state.in_transit.len() < self.pool_size {
            let id = state.next_id;
            state.next_id += 1;
            let start = self
                .model
                .closest_node_position(self.model.random_position(&mut state.rng));
            let destination = self
                .model
                .closest_node_position(self.model.random_position(&mut state.rng));
            let color = Rgb::random(&mut state.rng);
            info!(
                "Passenger #{id} waiting at ({:.5}, {:.5}), heading to ({:.5}, {:.5})",
                start.y, start.x, destination.y, destination.x
            );
            state
                .new_passengers
                .push(Passenger::new(id, start, destination, color));
        }
    }

    /// One generator-loop iteration: top the pool back up, register every
    /// not-yet-requested passenger with the ride matcher, publish the
    /// render snapshot.
    pub fn tick(&self) {
        let requests: Vec<u64> = {
            let mut state = self.state();
            self.top_up(&mut state);
            state
                .new_passengers
                .iter_mut()
                .filter(|p| !p.requested)
                .map(|p| {
                    p.requested = true;
                    p.id
                })
                .collect()
        };

        for id in requests {
            self.telemetry.record_ride_requested(id);
            info!("Passenger #{id} is requesting a ride");
            if self
                .matcher_tx
                .send(MatcherMessage::PassengerRequestsRide { passenger_id: id })
                .is_err()
            {
                // Matcher is gone; shutdown is in progress.
                return;
            }
        }

        self.hub.publish_new_passengers(self.snapshot_new());
    }

    /// Transfers ownership of a waiting passenger to the caller and records
    /// the ride as in transit.
    pub fn hand_off(&self, id: u64) -> Result<Passenger, QueueError> {
        let mut state = self.state();
        let index = state
            .new_passengers
            .iter()
            .position(|p| p.id == id)
            .ok_or(QueueError::NotFound(id))?;
        let passenger = state.new_passengers.remove(index);
        state.in_transit.insert(id);
        Ok(passenger)
    }

    /// Start coordinate of a waiting passenger; `None` once it has been
    /// handed off (the matcher treats that as a stale entry).
    pub fn start_position(&self, id: u64) -> Option<Coordinate> {
        self.state()
            .new_passengers
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.start)
    }

    /// Retires an in-transit ride after drop-off, freeing a pool slot.
    pub fn ride_completed(&self, id: u64) {
        if !self.state().in_transit.remove(&id) {
            warn!("drop-off reported for unknown passenger #{id}");
        }
    }

    /// Puts a stranded passenger back into the pool. The passenger is
    /// cleared to unrequested so the next tick requests a fresh ride.
    pub fn reinsert(&self, mut passenger: Passenger) {
        let mut state = self.state();
        state.in_transit.remove(&passenger.id);
        passenger.requested = false;
        passenger.position = passenger.start;
        info!("Passenger #{} returned to the queue", passenger.id);
        state.new_passengers.push(passenger);
    }

    pub fn snapshot_new(&self) -> Vec<PassengerSnapshot> {
        self.state()
            .new_passengers
            .iter()
            .map(|p| PassengerSnapshot {
                id: p.id,
                start: p.start,
                destination: p.destination,
                color: p.color,
            })
            .collect()
    }

    /// Number of passengers waiting for a pickup.
    pub fn waiting_count(&self) -> usize {
        self.state().new_passengers.len()
    }

    /// Number of passengers currently riding in a vehicle.
    pub fn in_transit_count(&self) -> usize {
        self.state().in_transit.len()
    }
}

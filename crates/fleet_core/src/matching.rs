//! The ride matcher: the central dispatcher pairing open vehicles with
//! open passengers.
//!
//! The matcher's state lives on its own thread; every cross-actor operation
//! arrives as a [MatcherMessage] on its channel, so no lock is needed here.
//! When it must reach into the passenger queue (reading a start position,
//! handing a passenger off) it does so without holding anything else, and
//! commands toward the vehicle manager go out over a channel.

use std::collections::{HashMap, VecDeque};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;

use log::{info, warn};

use crate::passengers::PassengerQueue;
use crate::telemetry::FleetTelemetry;
use crate::vehicles::VehicleCommand;

/// Inbound matcher protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatcherMessage {
    /// A vehicle with no passenger wants a match.
    VehicleRequestsPassenger { vehicle_id: usize },
    /// A waiting passenger wants a ride.
    PassengerRequestsRide { passenger_id: u64 },
    /// A matched vehicle reached the pickup point.
    VehicleArrived { vehicle_id: usize },
    /// A matched vehicle could not route to the pickup point.
    PickupUnreachable { vehicle_id: usize },
    /// A vehicle gave up mid-ride (unroutable with a passenger aboard);
    /// the manager has already re-inserted the passenger into the queue.
    RideAborted {
        vehicle_id: usize,
        passenger_id: u64,
    },
}

/// FIFO dispatcher state plus its ends of the actor channels.
#[derive(Debug)]
pub struct RideMatcher {
    rx: Receiver<MatcherMessage>,
    vehicle_tx: Sender<VehicleCommand>,
    queue: Arc<PassengerQueue>,
    telemetry: Arc<FleetTelemetry>,
    open_vehicles: VecDeque<usize>,
    open_passengers: VecDeque<u64>,
    pending_arrival: HashMap<usize, u64>,
}

impl RideMatcher {
    pub fn new(
        rx: Receiver<MatcherMessage>,
        vehicle_tx: Sender<VehicleCommand>,
        queue: Arc<PassengerQueue>,
        telemetry: Arc<FleetTelemetry>,
    ) -> Self {
        Self {
            rx,
            vehicle_tx,
            queue,
            telemetry,
            open_vehicles: VecDeque::new(),
            open_passengers: VecDeque::new(),
            pending_arrival: HashMap::new(),
        }
    }

    /// One event-loop iteration: drain and handle every queued message.
    pub fn tick(&mut self) {
        while let Ok(message) = self.rx.try_recv() {
            self.handle(message);
        }
    }

    fn handle(&mut self, message: MatcherMessage) {
        match message {
            MatcherMessage::VehicleRequestsPassenger { vehicle_id } => {
                self.vehicle_requests_passenger(vehicle_id)
            }
            MatcherMessage::PassengerRequestsRide { passenger_id } => {
                self.passenger_requests_ride(passenger_id)
            }
            MatcherMessage::VehicleArrived { vehicle_id } => self.vehicle_arrived(vehicle_id),
            MatcherMessage::PickupUnreachable { vehicle_id } => {
                self.pickup_unreachable(vehicle_id)
            }
            MatcherMessage::RideAborted {
                vehicle_id,
                passenger_id,
            } => self.ride_aborted(vehicle_id, passenger_id),
        }
    }

    fn vehicle_requests_passenger(&mut self, vehicle_id: usize) {
        // Repeated requests are idempotent; a vehicle awaiting its pickup
        // arrival must not re-enter the open queue.
        if self.open_vehicles.contains(&vehicle_id)
            || self.pending_arrival.contains_key(&vehicle_id)
        {
            return;
        }
        self.open_vehicles.push_back(vehicle_id);
        self.try_match();
    }

    fn passenger_requests_ride(&mut self, passenger_id: u64) {
        if self.open_passengers.contains(&passenger_id) {
            return;
        }
        self.open_passengers.push_back(passenger_id);
        self.try_match();
    }

    /// Pairs queue heads until one side runs dry. Passengers that were
    /// already handed off are stale and dropped silently.
    fn try_match(&mut self) {
        while !self.open_vehicles.is_empty() {
            let Some(&passenger_id) = self.open_passengers.front() else {
                return;
            };
            let Some(pickup) = self.queue.start_position(passenger_id) else {
                self.open_passengers.pop_front();
                self.telemetry.record_stale_match();
                continue;
            };
            let Some(vehicle_id) = self.open_vehicles.pop_front() else {
                return;
            };
            self.open_passengers.pop_front();
            self.pending_arrival.insert(vehicle_id, passenger_id);
            self.telemetry.record_match(passenger_id, vehicle_id);
            info!("Matched vehicle #{vehicle_id} with passenger #{passenger_id}");
            if self
                .vehicle_tx
                .send(VehicleCommand::AssignPassenger { vehicle_id, pickup })
                .is_err()
            {
                return;
            }
        }
    }

    /// The vehicle is waiting at the pickup point: pull the passenger out
    /// of the queue and transfer ownership into the vehicle.
    fn vehicle_arrived(&mut self, vehicle_id: usize) {
        let Some(passenger_id) = self.pending_arrival.remove(&vehicle_id) else {
            warn!("vehicle #{vehicle_id} reported arrival without a pending match");
            return;
        };
        match self.queue.hand_off(passenger_id) {
            Ok(passenger) => {
                let _ = self.vehicle_tx.send(VehicleCommand::PassengerIntoVehicle {
                    vehicle_id,
                    passenger,
                });
            }
            Err(err) => {
                warn!("handoff to vehicle #{vehicle_id} failed: {err}");
            }
        }
    }

    /// Failure path: put the passenger back at the head of the queue and
    /// tell the vehicle the match fell through.
    fn pickup_unreachable(&mut self, vehicle_id: usize) {
        let Some(passenger_id) = self.pending_arrival.remove(&vehicle_id) else {
            warn!("vehicle #{vehicle_id} reported an unreachable pickup without a pending match");
            return;
        };
        info!("Vehicle #{vehicle_id} cannot reach passenger #{passenger_id}; re-queueing");
        if !self.open_passengers.contains(&passenger_id) {
            self.open_passengers.push_front(passenger_id);
        }
        self.telemetry.record_match_failure();
        let _ = self
            .vehicle_tx
            .send(VehicleCommand::MatchFailed { vehicle_id });
        self.try_match();
    }

    fn ride_aborted(&mut self, vehicle_id: usize, passenger_id: u64) {
        self.pending_arrival.remove(&vehicle_id);
        self.open_passengers.retain(|&id| id != passenger_id);
    }

    pub fn open_vehicle_ids(&self) -> Vec<usize> {
        self.open_vehicles.iter().copied().collect()
    }

    pub fn open_passenger_ids(&self) -> Vec<u64> {
        self.open_passengers.iter().copied().collect()
    }

    /// The passenger a matched vehicle is expected to pick up.
    pub fn pending_passenger_for(&self, vehicle_id: usize) -> Option<u64> {
        self.pending_arrival.get(&vehicle_id).copied()
    }
}

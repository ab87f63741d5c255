//! The vehicle manager: owns every vehicle and drives the per-tick state
//! machine and kinematics.
//!
//! Vehicles are mutated exclusively by the drive loop. Other actors reach a
//! vehicle through [VehicleCommand]s, which land in the manager's mailbox
//! and are applied at the tick boundary, so each command is atomic with
//! respect to the drive pass.

use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;

use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::agents::{Passenger, Vehicle, VehicleState};
use crate::map::RouteModel;
use crate::matching::MatcherMessage;
use crate::passengers::PassengerQueue;
use crate::routing::RoutePlanner;
use crate::snapshot::{SnapshotHub, VehicleSnapshot};
use crate::spatial::{euclidean, Coordinate};
use crate::telemetry::FleetTelemetry;

/// Cross-actor mutations of a single vehicle. Applied between drive passes;
/// partial updates cannot be observed.
#[derive(Debug)]
pub enum VehicleCommand {
    /// A match was made: drive to the pickup point.
    AssignPassenger {
        vehicle_id: usize,
        pickup: Coordinate,
    },
    /// The waiting passenger boards; ownership moves into the vehicle.
    PassengerIntoVehicle {
        vehicle_id: usize,
        passenger: Passenger,
    },
    /// The match fell through before pickup.
    MatchFailed { vehicle_id: usize },
}

/// Advances a vehicle one step along its path.
///
/// If the next path point is within `step`, the position snaps onto it
/// exactly (bitwise) and the cursor moves on; otherwise the vehicle moves
/// `step` toward it along the connecting line.
pub fn advance_along_path(vehicle: &mut Vehicle, step: f64) {
    let Some(&next) = vehicle.path().get(vehicle.path_index()) else {
        return;
    };
    let position = vehicle.position();
    let distance = euclidean(position, next);
    if distance <= step {
        vehicle.set_position(next);
        vehicle.increment_path_index();
    } else {
        let angle = (next.y - position.y).atan2(next.x - position.x);
        vehicle.set_position(Coordinate::new(
            position.x + step * angle.cos(),
            position.y + step * angle.sin(),
        ));
    }
}

#[derive(Debug)]
pub struct VehicleManager {
    model: Arc<RouteModel>,
    planner: RoutePlanner,
    queue: Arc<PassengerQueue>,
    matcher_tx: Sender<MatcherMessage>,
    commands: Receiver<VehicleCommand>,
    hub: Arc<SnapshotHub>,
    telemetry: Arc<FleetTelemetry>,
    vehicles: Vec<Vehicle>,
    rng: StdRng,
    distance_per_cycle: f64,
    failure_limit: u32,
}

impl VehicleManager {
    /// Creates the manager and its fixed vehicle pool, each vehicle at a
    /// random snapped position with a random snapped destination.
    ///
    /// `distance_per_cycle` falls back to the map's latitude span divided
    /// by 1000 when not overridden.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        model: Arc<RouteModel>,
        queue: Arc<PassengerQueue>,
        matcher_tx: Sender<MatcherMessage>,
        commands: Receiver<VehicleCommand>,
        hub: Arc<SnapshotHub>,
        telemetry: Arc<FleetTelemetry>,
        fleet_size: usize,
        failure_limit: u32,
        distance_per_cycle: Option<f64>,
        seed: u64,
    ) -> Self {
        let distance_per_cycle =
            distance_per_cycle.unwrap_or(model.bounds().lat_span() / 1000.0);
        let planner = RoutePlanner::new(model.clone());
        let mut manager = Self {
            model,
            planner,
            queue,
            matcher_tx,
            commands,
            hub,
            telemetry,
            vehicles: Vec::with_capacity(fleet_size),
            rng: StdRng::seed_from_u64(seed),
            distance_per_cycle,
            failure_limit,
        };
        for _ in 0..fleet_size {
            manager.generate_new();
        }
        manager
    }

    fn generate_new(&mut self) {
        let id = self.vehicles.len();
        let start = self
            .model
            .closest_node_position(self.model.random_position(&mut self.rng));
        let destination = self
            .model
            .closest_node_position(self.model.random_position(&mut self.rng));
        info!(
            "Vehicle #{id} now driving from ({:.5}, {:.5})",
            start.y, start.x
        );
        self.vehicles.push(Vehicle::new(id, start, destination));
    }

    /// One drive-loop iteration: advance the heartbeat, apply queued
    /// commands, drive every vehicle in order, publish snapshots.
    pub fn tick(&mut self) {
        self.telemetry.advance_tick();
        while let Ok(command) = self.commands.try_recv() {
            self.apply_command(command);
        }
        for index in 0..self.vehicles.len() {
            self.drive(index);
            debug_assert_eq!(
                self.vehicles[index].passenger().is_some(),
                self.vehicles[index].state() == VehicleState::DrivingPassenger,
            );
        }
        self.publish_snapshot();
    }

    fn apply_command(&mut self, command: VehicleCommand) {
        match command {
            VehicleCommand::AssignPassenger { vehicle_id, pickup } => {
                let pickup = self.model.closest_node_position(pickup);
                let Some(vehicle) = self.vehicles.get_mut(vehicle_id) else {
                    warn!("assignment for unknown vehicle #{vehicle_id}");
                    return;
                };
                vehicle.set_destination(pickup);
                vehicle.set_state(VehicleState::PassengerQueued);
            }
            VehicleCommand::PassengerIntoVehicle {
                vehicle_id,
                passenger,
            } => {
                let destination = self.model.closest_node_position(passenger.destination);
                let Some(vehicle) = self.vehicles.get_mut(vehicle_id) else {
                    warn!("passenger transfer for unknown vehicle #{vehicle_id}");
                    return;
                };
                info!(
                    "Vehicle #{vehicle_id} picked up passenger #{}",
                    passenger.id
                );
                self.telemetry.record_pickup(passenger.id);
                vehicle.set_passenger(passenger);
                vehicle.set_destination(destination);
                vehicle.set_state(VehicleState::DrivingPassenger);
            }
            VehicleCommand::MatchFailed { vehicle_id } => {
                let Some(vehicle) = self.vehicles.get_mut(vehicle_id) else {
                    warn!("match failure for unknown vehicle #{vehicle_id}");
                    return;
                };
                let failures = vehicle.record_failure();
                if failures < self.failure_limit {
                    vehicle.set_state(VehicleState::NoPassengerRequested);
                } else {
                    // Cooldown: keep the vehicle out of matching while it
                    // drives to a rotated destination.
                    vehicle.set_state(VehicleState::NoPassengerQueued);
                    self.randomize_destination(vehicle_id);
                }
            }
        }
    }

    fn drive(&mut self, index: usize) {
        if self.vehicles[index].path().is_empty() {
            let routed = self.planner.plan_into(&mut self.vehicles[index]);
            if !routed {
                self.recover_unroutable(index);
                return;
            }
        }

        if self.vehicles[index].state() == VehicleState::NoPassengerRequested {
            let id = self.vehicles[index].id();
            self.vehicles[index].set_state(VehicleState::NoPassengerQueued);
            info!("Vehicle #{id} requested a passenger match");
            let _ = self
                .matcher_tx
                .send(MatcherMessage::VehicleRequestsPassenger { vehicle_id: id });
        }

        if self.vehicles[index].state() == VehicleState::Waiting {
            return;
        }

        advance_along_path(&mut self.vehicles[index], self.distance_per_cycle);

        if self.vehicles[index].position() == self.vehicles[index].destination() {
            self.handle_arrival(index);
        }
    }

    /// The planner found no route. Recover per the vehicle's state; the
    /// vehicle keeps running toward a fresh random destination either way.
    fn recover_unroutable(&mut self, index: usize) {
        self.telemetry.record_unroutable_recovery();
        let id = self.vehicles[index].id();
        match self.vehicles[index].state() {
            VehicleState::DrivingPassenger => {
                if let Some(passenger) = self.vehicles[index].take_passenger() {
                    warn!(
                        "Vehicle #{id} cannot route with passenger #{} aboard; returning them",
                        passenger.id
                    );
                    let passenger_id = passenger.id;
                    self.queue.reinsert(passenger);
                    let _ = self.matcher_tx.send(MatcherMessage::RideAborted {
                        vehicle_id: id,
                        passenger_id,
                    });
                }
                self.vehicles[index].set_state(VehicleState::NoPassengerRequested);
            }
            VehicleState::PassengerQueued => {
                warn!("Vehicle #{id} cannot reach its pickup point");
                let _ = self
                    .matcher_tx
                    .send(MatcherMessage::PickupUnreachable { vehicle_id: id });
                // No longer bound for a pickup; the matcher's MatchFailed
                // answer decides what happens next.
                self.vehicles[index].set_state(VehicleState::NoPassengerQueued);
            }
            _ => {}
        }
        self.randomize_destination(index);
    }

    fn handle_arrival(&mut self, index: usize) {
        let id = self.vehicles[index].id();
        match self.vehicles[index].state() {
            VehicleState::NoPassengerQueued => {
                // A vehicle that finished its cooldown rotation re-enters
                // matching here.
                if self.vehicles[index].failures() >= self.failure_limit {
                    self.vehicles[index].clear_failures();
                    self.vehicles[index].set_state(VehicleState::NoPassengerRequested);
                }
                self.randomize_destination(index);
            }
            VehicleState::PassengerQueued => {
                self.vehicles[index].set_state(VehicleState::Waiting);
                info!("Vehicle #{id} arrived at the pickup point");
                let _ = self
                    .matcher_tx
                    .send(MatcherMessage::VehicleArrived { vehicle_id: id });
            }
            VehicleState::DrivingPassenger => {
                if let Some(passenger) = self.vehicles[index].drop_off() {
                    info!("Vehicle #{id} dropped off passenger #{}", passenger.id);
                    self.queue.ride_completed(passenger.id);
                    self.telemetry.record_dropoff(passenger.id, id);
                }
                self.vehicles[index].set_state(VehicleState::NoPassengerRequested);
                self.randomize_destination(index);
            }
            _ => {}
        }
    }

    fn randomize_destination(&mut self, index: usize) {
        let destination = self
            .model
            .closest_node_position(self.model.random_position(&mut self.rng));
        self.vehicles[index].set_destination(destination);
    }

    fn publish_snapshot(&self) {
        let snapshot = self
            .vehicles
            .iter()
            .map(|vehicle| VehicleSnapshot {
                id: vehicle.id(),
                position: vehicle.position(),
                state: vehicle.state(),
                color: vehicle.passenger().map(|p| p.color),
            })
            .collect();
        self.hub.publish_vehicles(snapshot);
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn vehicle(&self, id: usize) -> Option<&Vehicle> {
        self.vehicles.get(id)
    }

    /// Direct access for scenario setup; the manager still owns the pool.
    pub fn vehicle_mut(&mut self, id: usize) -> Option<&mut Vehicle> {
        self.vehicles.get_mut(id)
    }

    pub fn distance_per_cycle(&self) -> f64 {
        self.distance_per_cycle
    }

    pub fn failure_limit(&self) -> u32 {
        self.failure_limit
    }
}

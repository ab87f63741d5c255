use std::sync::mpsc;
use std::sync::Arc;

use crate::map::RouteModel;
use crate::matching::RideMatcher;
use crate::passengers::PassengerQueue;
use crate::runner::Simulation;
use crate::scenario::params::SimParams;
use crate::snapshot::SnapshotHub;
use crate::telemetry::FleetTelemetry;
use crate::vehicles::VehicleManager;

/// Seed offsets so each component draws from its own stream.
const PASSENGER_SEED_OFFSET: u64 = 0xcafe_f00d;
const VEHICLE_SEED_OFFSET: u64 = 0xdead_beef;

/// Wires channels, snapshot hub and telemetry, then constructs the three
/// actors over the given road model.
pub fn build_simulation(model: Arc<RouteModel>, params: SimParams) -> Simulation {
    let telemetry = Arc::new(FleetTelemetry::default());
    let hub = Arc::new(SnapshotHub::new(model.intersections().to_vec()));

    let (matcher_tx, matcher_rx) = mpsc::channel();
    let (vehicle_tx, vehicle_rx) = mpsc::channel();

    let queue = Arc::new(PassengerQueue::new(
        model.clone(),
        matcher_tx.clone(),
        telemetry.clone(),
        hub.clone(),
        params.max_passengers,
        params.seed.wrapping_add(PASSENGER_SEED_OFFSET),
    ));

    let vehicles = VehicleManager::new(
        model,
        queue.clone(),
        matcher_tx,
        vehicle_rx,
        hub.clone(),
        telemetry.clone(),
        params.max_vehicles,
        params.failure_limit,
        params.distance_per_cycle,
        params.seed.wrapping_add(VEHICLE_SEED_OFFSET),
    );

    let matcher = RideMatcher::new(matcher_rx, vehicle_tx, queue.clone(), telemetry.clone());

    Simulation {
        vehicles,
        matcher,
        queue,
        hub,
        telemetry,
        params,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::VehicleState;
    use crate::test_helpers::grid_model;

    #[test]
    fn build_creates_pools_and_snapshot_sources() {
        let model = Arc::new(grid_model(4, 4, 1.0));
        let params = SimParams::default()
            .with_seed(9)
            .with_fleet_size(3)
            .with_passenger_pool(5);
        let simulation = build_simulation(model.clone(), params);

        assert_eq!(simulation.vehicles.vehicles().len(), 3);
        assert_eq!(simulation.queue.waiting_count(), 5);
        assert_eq!(simulation.hub.intersections().len(), model.node_count());
        for vehicle in simulation.vehicles.vehicles() {
            assert_eq!(vehicle.state(), VehicleState::NoPassengerRequested);
            assert_eq!(
                model.closest_node_position(vehicle.position()),
                vehicle.position()
            );
        }
    }

    #[test]
    fn distance_per_cycle_derives_from_latitude_span() {
        let model = Arc::new(grid_model(3, 5, 1.0));
        let simulation = build_simulation(model, SimParams::default());
        // Latitude spans 4 degrees on a 5-row grid.
        assert!((simulation.vehicles.distance_per_cycle() - 4.0 / 1000.0).abs() < 1e-12);
    }

    #[test]
    fn same_seed_builds_identical_fleets() {
        let model = Arc::new(grid_model(4, 4, 1.0));
        let params = SimParams::default().with_seed(77);
        let a = build_simulation(model.clone(), params.clone());
        let b = build_simulation(model, params);

        for (left, right) in a.vehicles.vehicles().iter().zip(b.vehicles.vehicles()) {
            assert_eq!(left.position(), right.position());
            assert_eq!(left.destination(), right.destination());
        }
    }
}

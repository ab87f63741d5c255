#![allow(dead_code)]

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use fleet_core::map::RouteModel;
use fleet_core::matching::{MatcherMessage, RideMatcher};
use fleet_core::passengers::PassengerQueue;
use fleet_core::snapshot::SnapshotHub;
use fleet_core::telemetry::FleetTelemetry;
use fleet_core::vehicles::{VehicleCommand, VehicleManager};

/// A vehicle manager under test. The test holds the matcher's receiving end
/// (to observe outbound protocol messages) and a command sender (to play
/// the matcher's role).
pub struct ManagerBench {
    pub model: Arc<RouteModel>,
    pub manager: VehicleManager,
    pub queue: Arc<PassengerQueue>,
    pub vehicle_tx: Sender<VehicleCommand>,
    pub matcher_rx: Receiver<MatcherMessage>,
    pub telemetry: Arc<FleetTelemetry>,
    pub hub: Arc<SnapshotHub>,
}

pub fn manager_bench(
    model: RouteModel,
    fleet_size: usize,
    pool_size: usize,
    failure_limit: u32,
    step: f64,
    seed: u64,
) -> ManagerBench {
    let model = Arc::new(model);
    let telemetry = Arc::new(FleetTelemetry::default());
    let hub = Arc::new(SnapshotHub::new(model.intersections().to_vec()));
    let (matcher_tx, matcher_rx) = mpsc::channel();
    let (vehicle_tx, vehicle_rx) = mpsc::channel();

    let queue = Arc::new(PassengerQueue::new(
        model.clone(),
        matcher_tx.clone(),
        telemetry.clone(),
        hub.clone(),
        pool_size,
        seed.wrapping_add(1),
    ));
    let manager = VehicleManager::new(
        model.clone(),
        queue.clone(),
        matcher_tx,
        vehicle_rx,
        hub.clone(),
        telemetry.clone(),
        fleet_size,
        failure_limit,
        Some(step),
        seed,
    );

    ManagerBench {
        model,
        manager,
        queue,
        vehicle_tx,
        matcher_rx,
        telemetry,
        hub,
    }
}

/// A ride matcher under test. The test holds the matcher's inbound sender
/// (to play both other actors) and the vehicle manager's receiving end.
pub struct MatcherBench {
    pub matcher: RideMatcher,
    pub queue: Arc<PassengerQueue>,
    pub matcher_tx: Sender<MatcherMessage>,
    pub vehicle_rx: Receiver<VehicleCommand>,
    pub telemetry: Arc<FleetTelemetry>,
}

pub fn matcher_bench(model: RouteModel, pool_size: usize, seed: u64) -> MatcherBench {
    let model = Arc::new(model);
    let telemetry = Arc::new(FleetTelemetry::default());
    let hub = Arc::new(SnapshotHub::new(model.intersections().to_vec()));
    let (matcher_tx, matcher_rx) = mpsc::channel();
    let (vehicle_tx, vehicle_rx) = mpsc::channel();

    let queue = Arc::new(PassengerQueue::new(
        model,
        matcher_tx.clone(),
        telemetry.clone(),
        hub,
        pool_size,
        seed,
    ));
    let matcher = RideMatcher::new(matcher_rx, vehicle_tx, queue.clone(), telemetry.clone());

    MatcherBench {
        matcher,
        queue,
        matcher_tx,
        vehicle_rx,
        telemetry,
    }
}

/// Drains every queued message from a receiver.
pub fn drain<T>(rx: &Receiver<T>) -> Vec<T> {
    std::iter::from_fn(|| rx.try_recv().ok()).collect()
}

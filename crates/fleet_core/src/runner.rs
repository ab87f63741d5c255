//! Simulation runner: owns the actor threads and their cooperative
//! shutdown.
//!
//! [start] consumes a built [Simulation] and spawns one thread per actor,
//! each ticking at its configured period. [run_steps] drives the same
//! actors deterministically on the calling thread, which is how the tests
//! and headless tools exercise the full protocol without timing.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::clock::{Shutdown, Ticker};
use crate::matching::RideMatcher;
use crate::passengers::PassengerQueue;
use crate::scenario::SimParams;
use crate::snapshot::SnapshotHub;
use crate::telemetry::FleetTelemetry;
use crate::vehicles::VehicleManager;

/// A fully wired simulation, ready to run threaded or stepped.
#[derive(Debug)]
pub struct Simulation {
    pub vehicles: VehicleManager,
    pub matcher: RideMatcher,
    pub queue: Arc<PassengerQueue>,
    pub hub: Arc<SnapshotHub>,
    pub telemetry: Arc<FleetTelemetry>,
    pub params: SimParams,
}

/// Handle to a running simulation: shared snapshot/telemetry views plus
/// the stop switch.
#[derive(Debug)]
pub struct FleetHandle {
    shutdown: Arc<Shutdown>,
    threads: Vec<JoinHandle<()>>,
    hub: Arc<SnapshotHub>,
    telemetry: Arc<FleetTelemetry>,
}

impl FleetHandle {
    pub fn hub(&self) -> &Arc<SnapshotHub> {
        &self.hub
    }

    pub fn telemetry(&self) -> &Arc<FleetTelemetry> {
        &self.telemetry
    }

    /// Signals every actor loop and joins the threads. Loops exit at their
    /// next tick boundary; there is no forced cancellation.
    pub fn stop(self) {
        self.shutdown.trigger();
        for handle in self.threads {
            let _ = handle.join();
        }
    }
}

/// Spawns the drive, generator and matcher loops.
pub fn start(simulation: Simulation) -> FleetHandle {
    let Simulation {
        mut vehicles,
        mut matcher,
        queue,
        hub,
        telemetry,
        params,
    } = simulation;

    let shutdown = Arc::new(Shutdown::default());
    let mut threads = Vec::new();

    let ticker = Ticker::new(shutdown.clone(), Duration::from_millis(params.tick_ms));
    threads.push(
        thread::Builder::new()
            .name("fleet-drive".into())
            .spawn(move || {
                while ticker.next() {
                    vehicles.tick();
                }
            })
            .expect("failed to spawn the drive loop"),
    );

    let ticker = Ticker::new(shutdown.clone(), Duration::from_millis(params.queue_tick_ms));
    let generator_queue = queue.clone();
    threads.push(
        thread::Builder::new()
            .name("fleet-passengers".into())
            .spawn(move || {
                while ticker.next() {
                    generator_queue.tick();
                }
            })
            .expect("failed to spawn the passenger loop"),
    );

    let ticker = Ticker::new(
        shutdown.clone(),
        Duration::from_millis(params.matcher_tick_ms),
    );
    threads.push(
        thread::Builder::new()
            .name("fleet-matcher".into())
            .spawn(move || {
                while ticker.next() {
                    matcher.tick();
                }
            })
            .expect("failed to spawn the matcher loop"),
    );

    FleetHandle {
        shutdown,
        threads,
        hub,
        telemetry,
    }
}

/// Runs `steps` deterministic iterations on the calling thread: generator,
/// matcher, then the drive loop, once each per step.
pub fn run_steps(simulation: &mut Simulation, steps: usize) {
    for _ in 0..steps {
        simulation.queue.tick();
        simulation.matcher.tick();
        simulation.vehicles.tick();
    }
}

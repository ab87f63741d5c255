//! Run a small fleet on a synthetic street grid and print ride KPIs.
//!
//! Run with: cargo run -p fleet_core --example fleet_run

use std::sync::Arc;
use std::time::{Duration, Instant};

use fleet_core::runner::start;
use fleet_core::scenario::{build_simulation, SimParams};
use fleet_core::test_helpers::grid_model;

fn main() {
    env_logger::init();

    const RUN_SECS: u64 = 3;

    let params = SimParams::default()
        .with_seed(123)
        .with_fleet_size(8)
        .with_passenger_pool(12)
        // Grid spacing is one degree; let vehicles cross an edge in ~20 ticks.
        .with_distance_per_cycle(0.05);
    let render_ms = params.render_ms;

    let model = Arc::new(grid_model(12, 12, 1.0));
    let bounds = model.bounds();
    println!(
        "City: {} intersections, {:.0} km across",
        model.node_count(),
        fleet_core::spatial::haversine_km(
            fleet_core::spatial::Coordinate::new(bounds.min_lon, bounds.min_lat),
            fleet_core::spatial::Coordinate::new(bounds.max_lon, bounds.max_lat),
        )
    );
    let handle = start(build_simulation(model, params));

    // Poll snapshots the way a display loop would.
    let deadline = Instant::now() + Duration::from_secs(RUN_SECS);
    while Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(render_ms));
        let vehicles = handle.hub().vehicles();
        let waiting = handle.hub().new_passengers();
        println!(
            "t={}ticks vehicles={} waiting_passengers={}",
            handle.telemetry().now(),
            vehicles.len(),
            waiting.len()
        );
    }

    let telemetry = handle.telemetry().clone();
    handle.stop();

    let counters = telemetry.counters();
    let completed = telemetry.completed_rides();
    println!("--- Fleet run (seed 123, {RUN_SECS}s wall clock) ---");
    println!("Rides requested: {}", counters.rides_requested);
    println!("Matches made:    {}", counters.matches_made);
    println!("Pickups:         {}", counters.pickups);
    println!("Drop-offs:       {}", counters.dropoffs);

    if completed.is_empty() {
        println!("No rides completed; try a longer run or a larger step.");
    } else {
        println!("\nCompleted rides:");
        for ride in &completed {
            println!(
                "  passenger #{} in vehicle #{}: match {}t, pickup {}t, ride {}t",
                ride.passenger_id,
                ride.vehicle_id,
                ride.time_to_match(),
                ride.time_to_pickup(),
                ride.ride_duration()
            );
        }
    }
}

mod support;

use fleet_core::matching::MatcherMessage;
use fleet_core::test_helpers::grid_model;
use fleet_core::vehicles::VehicleCommand;
use support::{drain, matcher_bench};

#[test]
fn fifo_pairing_matches_heads_in_arrival_order() {
    let mut bench = matcher_bench(grid_model(3, 3, 1.0), 2, 3);

    // Queue tick registers passengers 0 and 1, in order.
    bench.queue.tick();
    bench
        .matcher_tx
        .send(MatcherMessage::VehicleRequestsPassenger { vehicle_id: 5 })
        .expect("send");
    bench
        .matcher_tx
        .send(MatcherMessage::VehicleRequestsPassenger { vehicle_id: 9 })
        .expect("send");
    bench.matcher.tick();

    let assignments: Vec<(usize, u64)> = drain(&bench.vehicle_rx)
        .into_iter()
        .map(|command| match command {
            VehicleCommand::AssignPassenger { vehicle_id, .. } => {
                (vehicle_id, bench.matcher.pending_passenger_for(vehicle_id).expect("pending"))
            }
            other => panic!("unexpected command {other:?}"),
        })
        .collect();
    assert_eq!(assignments, vec![(5, 0), (9, 1)]);
    assert!(bench.matcher.open_vehicle_ids().is_empty());
    assert!(bench.matcher.open_passenger_ids().is_empty());
}

#[test]
fn repeated_vehicle_requests_are_idempotent() {
    let mut bench = matcher_bench(grid_model(3, 3, 1.0), 0, 3);

    for _ in 0..2 {
        bench
            .matcher_tx
            .send(MatcherMessage::VehicleRequestsPassenger { vehicle_id: 7 })
            .expect("send");
    }
    bench.matcher.tick();

    assert_eq!(bench.matcher.open_vehicle_ids(), vec![7]);
}

#[test]
fn one_passenger_cannot_serve_two_requesting_vehicles() {
    let mut bench = matcher_bench(grid_model(3, 3, 1.0), 1, 3);

    bench.queue.tick();
    bench
        .matcher_tx
        .send(MatcherMessage::VehicleRequestsPassenger { vehicle_id: 0 })
        .expect("send");
    bench
        .matcher_tx
        .send(MatcherMessage::VehicleRequestsPassenger { vehicle_id: 1 })
        .expect("send");
    bench.matcher.tick();

    // First requester wins; the second stays open.
    let commands = drain(&bench.vehicle_rx);
    assert_eq!(commands.len(), 1);
    assert!(matches!(
        commands[0],
        VehicleCommand::AssignPassenger { vehicle_id: 0, .. }
    ));
    assert_eq!(bench.matcher.open_vehicle_ids(), vec![1]);
    assert_eq!(bench.matcher.pending_passenger_for(0), Some(0));
    assert_eq!(bench.matcher.pending_passenger_for(1), None);
}

#[test]
fn a_matched_vehicle_cannot_request_again_until_resolved() {
    let mut bench = matcher_bench(grid_model(3, 3, 1.0), 1, 3);

    bench.queue.tick();
    bench
        .matcher_tx
        .send(MatcherMessage::VehicleRequestsPassenger { vehicle_id: 0 })
        .expect("send");
    bench.matcher.tick();
    assert_eq!(bench.matcher.pending_passenger_for(0), Some(0));

    // A stray repeat request while the pickup is pending is ignored.
    bench
        .matcher_tx
        .send(MatcherMessage::VehicleRequestsPassenger { vehicle_id: 0 })
        .expect("send");
    bench.matcher.tick();
    assert!(bench.matcher.open_vehicle_ids().is_empty());
}

#[test]
fn stale_passengers_are_discarded_silently() {
    let mut bench = matcher_bench(grid_model(3, 3, 1.0), 1, 3);

    bench.queue.tick();
    // The passenger is handed off before any vehicle shows up.
    bench.queue.hand_off(0).expect("hand off");

    bench
        .matcher_tx
        .send(MatcherMessage::VehicleRequestsPassenger { vehicle_id: 0 })
        .expect("send");
    bench.matcher.tick();

    assert!(drain(&bench.vehicle_rx).is_empty());
    assert!(bench.matcher.open_passenger_ids().is_empty());
    assert_eq!(bench.matcher.open_vehicle_ids(), vec![0]);
    assert_eq!(bench.telemetry.counters().stale_matches, 1);
}

#[test]
fn arrival_hands_the_passenger_into_the_vehicle() {
    let mut bench = matcher_bench(grid_model(3, 3, 1.0), 1, 3);

    bench.queue.tick();
    bench
        .matcher_tx
        .send(MatcherMessage::VehicleRequestsPassenger { vehicle_id: 0 })
        .expect("send");
    bench.matcher.tick();
    drain(&bench.vehicle_rx);

    bench
        .matcher_tx
        .send(MatcherMessage::VehicleArrived { vehicle_id: 0 })
        .expect("send");
    bench.matcher.tick();

    let commands = drain(&bench.vehicle_rx);
    assert_eq!(commands.len(), 1);
    match &commands[0] {
        VehicleCommand::PassengerIntoVehicle {
            vehicle_id,
            passenger,
        } => {
            assert_eq!(*vehicle_id, 0);
            assert_eq!(passenger.id, 0);
        }
        other => panic!("unexpected command {other:?}"),
    }
    assert_eq!(bench.queue.in_transit_count(), 1);
    assert_eq!(bench.matcher.pending_passenger_for(0), None);

    // A duplicate arrival has nothing to hand off; state is unchanged.
    bench
        .matcher_tx
        .send(MatcherMessage::VehicleArrived { vehicle_id: 0 })
        .expect("send");
    bench.matcher.tick();
    assert!(drain(&bench.vehicle_rx).is_empty());
}

#[test]
fn unreachable_pickup_requeues_the_passenger_at_the_head() {
    let mut bench = matcher_bench(grid_model(3, 3, 1.0), 1, 3);

    bench.queue.tick();
    bench
        .matcher_tx
        .send(MatcherMessage::VehicleRequestsPassenger { vehicle_id: 0 })
        .expect("send");
    bench.matcher.tick();
    drain(&bench.vehicle_rx);

    bench
        .matcher_tx
        .send(MatcherMessage::PickupUnreachable { vehicle_id: 0 })
        .expect("send");
    bench.matcher.tick();

    let commands = drain(&bench.vehicle_rx);
    assert_eq!(commands.len(), 1);
    assert!(matches!(
        commands[0],
        VehicleCommand::MatchFailed { vehicle_id: 0 }
    ));
    assert_eq!(bench.matcher.open_passenger_ids(), vec![0]);
    assert_eq!(bench.matcher.pending_passenger_for(0), None);
    assert_eq!(bench.telemetry.counters().match_failures, 1);

    // Another vehicle picks the re-queued passenger up immediately.
    bench
        .matcher_tx
        .send(MatcherMessage::VehicleRequestsPassenger { vehicle_id: 1 })
        .expect("send");
    bench.matcher.tick();
    assert!(matches!(
        drain(&bench.vehicle_rx).as_slice(),
        [VehicleCommand::AssignPassenger { vehicle_id: 1, .. }]
    ));
    assert_eq!(bench.matcher.pending_passenger_for(1), Some(0));
}

#[test]
fn aborted_rides_clear_matcher_bookkeeping() {
    let mut bench = matcher_bench(grid_model(3, 3, 1.0), 1, 3);

    bench.queue.tick();
    bench
        .matcher_tx
        .send(MatcherMessage::VehicleRequestsPassenger { vehicle_id: 0 })
        .expect("send");
    bench.matcher.tick();

    bench
        .matcher_tx
        .send(MatcherMessage::RideAborted {
            vehicle_id: 0,
            passenger_id: 0,
        })
        .expect("send");
    bench.matcher.tick();

    assert_eq!(bench.matcher.pending_passenger_for(0), None);
    assert!(bench.matcher.open_passenger_ids().is_empty());
}

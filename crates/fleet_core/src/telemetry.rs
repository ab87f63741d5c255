//! Telemetry / KPIs: ride lifecycle records and event counters.
//!
//! Timestamps are drive-loop ticks; the vehicle manager advances the shared
//! tick counter once per iteration and every actor stamps events against it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// One completed ride, recorded at drop-off. Use the helper methods for
/// derived KPIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RideRecord {
    pub passenger_id: u64,
    pub vehicle_id: usize,
    pub requested_at: u64,
    pub matched_at: u64,
    pub picked_up_at: u64,
    pub dropped_off_at: u64,
}

impl RideRecord {
    /// Ticks from ride request to match.
    pub fn time_to_match(&self) -> u64 {
        self.matched_at.saturating_sub(self.requested_at)
    }

    /// Ticks from match to pickup.
    pub fn time_to_pickup(&self) -> u64 {
        self.picked_up_at.saturating_sub(self.matched_at)
    }

    /// Ticks with the passenger on board.
    pub fn ride_duration(&self) -> u64 {
        self.dropped_off_at.saturating_sub(self.picked_up_at)
    }
}

/// Counter snapshot returned by [FleetTelemetry::counters].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TelemetryCounters {
    pub rides_requested: u64,
    pub matches_made: u64,
    pub match_failures: u64,
    pub stale_matches: u64,
    pub unroutable_recoveries: u64,
    pub pickups: u64,
    pub dropoffs: u64,
}

#[derive(Debug, Default)]
struct OpenRide {
    vehicle_id: usize,
    requested_at: u64,
    matched_at: u64,
    picked_up_at: u64,
}

/// Shared telemetry sink. All methods are safe to call from any actor.
#[derive(Debug, Default)]
pub struct FleetTelemetry {
    tick: AtomicU64,
    rides_requested: AtomicU64,
    matches_made: AtomicU64,
    match_failures: AtomicU64,
    stale_matches: AtomicU64,
    unroutable_recoveries: AtomicU64,
    pickups: AtomicU64,
    dropoffs: AtomicU64,
    open_rides: Mutex<HashMap<u64, OpenRide>>,
    completed: Mutex<Vec<RideRecord>>,
}

impl FleetTelemetry {
    /// Advances the simulation heartbeat; called once per drive tick.
    pub fn advance_tick(&self) -> u64 {
        self.tick.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn now(&self) -> u64 {
        self.tick.load(Ordering::Relaxed)
    }

    pub fn record_ride_requested(&self, passenger_id: u64) {
        self.rides_requested.fetch_add(1, Ordering::Relaxed);
        let now = self.now();
        if let Ok(mut open) = self.open_rides.lock() {
            let ride = open.entry(passenger_id).or_default();
            ride.requested_at = now;
        }
    }

    pub fn record_match(&self, passenger_id: u64, vehicle_id: usize) {
        self.matches_made.fetch_add(1, Ordering::Relaxed);
        let now = self.now();
        if let Ok(mut open) = self.open_rides.lock() {
            let ride = open.entry(passenger_id).or_default();
            ride.vehicle_id = vehicle_id;
            ride.matched_at = now;
        }
    }

    pub fn record_match_failure(&self) {
        self.match_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale_match(&self) {
        self.stale_matches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unroutable_recovery(&self) {
        self.unroutable_recoveries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_pickup(&self, passenger_id: u64) {
        self.pickups.fetch_add(1, Ordering::Relaxed);
        let now = self.now();
        if let Ok(mut open) = self.open_rides.lock() {
            let ride = open.entry(passenger_id).or_default();
            ride.picked_up_at = now;
        }
    }

    pub fn record_dropoff(&self, passenger_id: u64, vehicle_id: usize) {
        self.dropoffs.fetch_add(1, Ordering::Relaxed);
        let now = self.now();
        let open = match self.open_rides.lock() {
            Ok(mut open) => open.remove(&passenger_id),
            Err(_) => None,
        };
        let ride = open.unwrap_or_default();
        let record = RideRecord {
            passenger_id,
            vehicle_id,
            requested_at: ride.requested_at,
            matched_at: ride.matched_at,
            picked_up_at: ride.picked_up_at,
            dropped_off_at: now,
        };
        if let Ok(mut completed) = self.completed.lock() {
            completed.push(record);
        }
    }

    pub fn counters(&self) -> TelemetryCounters {
        TelemetryCounters {
            rides_requested: self.rides_requested.load(Ordering::Relaxed),
            matches_made: self.matches_made.load(Ordering::Relaxed),
            match_failures: self.match_failures.load(Ordering::Relaxed),
            stale_matches: self.stale_matches.load(Ordering::Relaxed),
            unroutable_recoveries: self.unroutable_recoveries.load(Ordering::Relaxed),
            pickups: self.pickups.load(Ordering::Relaxed),
            dropoffs: self.dropoffs.load(Ordering::Relaxed),
        }
    }

    pub fn completed_rides(&self) -> Vec<RideRecord> {
        match self.completed.lock() {
            Ok(completed) => completed.clone(),
            Err(_) => Vec::new(),
        }
    }
}

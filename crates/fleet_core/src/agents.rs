//! Simulation entities: vehicles and passengers.
//!
//! Ownership follows the ride lifecycle. The passenger queue owns a
//! [Passenger] until handoff; a [Vehicle] then owns it exclusively while
//! driving; drop-off destroys it. The passenger keeps no link back to the
//! vehicle — position updates are pushed into it by value.

use rand::Rng;

use crate::spatial::Coordinate;

/// Render-only color assigned to each passenger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self {
            r: rng.gen(),
            g: rng.gen(),
            b: rng.gen(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleState {
    NoPassengerRequested,
    NoPassengerQueued,
    PassengerQueued,
    DrivingPassenger,
    Waiting,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Passenger {
    pub id: u64,
    pub start: Coordinate,
    pub destination: Coordinate,
    pub position: Coordinate,
    pub color: Rgb,
    pub requested: bool,
}

impl Passenger {
    pub fn new(id: u64, start: Coordinate, destination: Coordinate, color: Rgb) -> Self {
        Self {
            id,
            start,
            destination,
            position: start,
            color,
            requested: false,
        }
    }
}

/// Per-vehicle state: position, current route and the ride state machine.
///
/// Invariant: `passenger.is_some()` exactly when the state is
/// [VehicleState::DrivingPassenger]. The path is empty at any state entry
/// that requires re-routing; `path_index == path.len()` means the route is
/// fully consumed.
#[derive(Debug)]
pub struct Vehicle {
    id: usize,
    position: Coordinate,
    destination: Coordinate,
    path: Vec<Coordinate>,
    path_index: usize,
    passenger: Option<Passenger>,
    state: VehicleState,
    failures: u32,
}

impl Vehicle {
    pub fn new(id: usize, position: Coordinate, destination: Coordinate) -> Self {
        Self {
            id,
            position,
            destination,
            path: Vec::new(),
            path_index: 0,
            passenger: None,
            state: VehicleState::NoPassengerRequested,
            failures: 0,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn state(&self) -> VehicleState {
        self.state
    }

    pub fn set_state(&mut self, state: VehicleState) {
        self.state = state;
    }

    pub fn position(&self) -> Coordinate {
        self.position
    }

    /// Moves the vehicle; a carried passenger moves with it.
    pub fn set_position(&mut self, position: Coordinate) {
        self.position = position;
        if let Some(passenger) = &mut self.passenger {
            passenger.position = position;
        }
    }

    pub fn destination(&self) -> Coordinate {
        self.destination
    }

    /// Changes the destination and clears the route so the next drive tick
    /// re-plans.
    pub fn set_destination(&mut self, destination: Coordinate) {
        self.destination = destination;
        self.reset_path();
    }

    pub fn passenger(&self) -> Option<&Passenger> {
        self.passenger.as_ref()
    }

    /// Takes ownership of a passenger; the passenger's destination becomes
    /// the vehicle's destination.
    pub fn set_passenger(&mut self, passenger: Passenger) {
        self.set_destination(passenger.destination);
        self.passenger = Some(passenger);
    }

    /// Removes the passenger without completing the ride (unroutable
    /// recovery). Does not touch the failure counter.
    pub fn take_passenger(&mut self) -> Option<Passenger> {
        self.passenger.take()
    }

    /// Completes the ride: returns the passenger and clears the failure
    /// counter.
    pub fn drop_off(&mut self) -> Option<Passenger> {
        self.failures = 0;
        self.passenger.take()
    }

    pub fn path(&self) -> &[Coordinate] {
        &self.path
    }

    pub fn path_index(&self) -> usize {
        self.path_index
    }

    pub fn set_path(&mut self, path: Vec<Coordinate>) {
        self.path = path;
        self.path_index = 0;
    }

    pub fn reset_path(&mut self) {
        self.path.clear();
        self.path_index = 0;
    }

    pub fn increment_path_index(&mut self) {
        self.path_index += 1;
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn record_failure(&mut self) -> u32 {
        self.failures += 1;
        self.failures
    }

    pub fn clear_failures(&mut self) {
        self.failures = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn passenger(id: u64) -> Passenger {
        let mut rng = StdRng::seed_from_u64(id);
        Passenger::new(
            id,
            Coordinate::new(1.0, 1.0),
            Coordinate::new(5.0, 5.0),
            Rgb::random(&mut rng),
        )
    }

    #[test]
    fn set_passenger_adopts_its_destination_and_clears_path() {
        let mut vehicle = Vehicle::new(0, Coordinate::new(0.0, 0.0), Coordinate::new(2.0, 2.0));
        vehicle.set_path(vec![Coordinate::new(2.0, 2.0)]);
        vehicle.increment_path_index();

        vehicle.set_passenger(passenger(9));

        assert_eq!(vehicle.destination(), Coordinate::new(5.0, 5.0));
        assert!(vehicle.path().is_empty());
        assert_eq!(vehicle.path_index(), 0);
        assert_eq!(vehicle.passenger().map(|p| p.id), Some(9));
    }

    #[test]
    fn position_updates_propagate_to_carried_passenger() {
        let mut vehicle = Vehicle::new(0, Coordinate::new(0.0, 0.0), Coordinate::new(2.0, 2.0));
        vehicle.set_passenger(passenger(1));

        vehicle.set_position(Coordinate::new(3.0, 4.0));

        let carried = vehicle.passenger().expect("passenger");
        assert_eq!(carried.position, Coordinate::new(3.0, 4.0));
    }

    #[test]
    fn drop_off_returns_passenger_and_clears_failures() {
        let mut vehicle = Vehicle::new(0, Coordinate::new(0.0, 0.0), Coordinate::new(2.0, 2.0));
        vehicle.record_failure();
        vehicle.record_failure();
        vehicle.set_passenger(passenger(4));

        let dropped = vehicle.drop_off();

        assert_eq!(dropped.map(|p| p.id), Some(4));
        assert!(vehicle.passenger().is_none());
        assert_eq!(vehicle.failures(), 0);
    }
}

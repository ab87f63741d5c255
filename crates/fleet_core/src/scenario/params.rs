use serde::{Deserialize, Serialize};

/// Default vehicle pool size.
const DEFAULT_MAX_VEHICLES: usize = 10;
/// Default passenger pool size.
const DEFAULT_MAX_PASSENGERS: usize = 10;
/// Drive-loop interval in milliseconds.
const DEFAULT_TICK_MS: u64 = 10;
/// Renderer poll interval in milliseconds (consumed by the display loop;
/// the core only carries it).
const DEFAULT_RENDER_MS: u64 = 33;
/// Passenger generator interval in milliseconds.
const DEFAULT_QUEUE_TICK_MS: u64 = 50;
/// Matcher event-loop interval in milliseconds.
const DEFAULT_MATCHER_TICK_MS: u64 = 20;
/// Consecutive match failures before a vehicle is cooled down.
const DEFAULT_FAILURE_LIMIT: u32 = 10;

/// Parameters for building a simulation. Fields omitted from a serialized
/// config fall back to the defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimParams {
    pub max_vehicles: usize,
    pub max_passengers: usize,
    pub tick_ms: u64,
    pub render_ms: u64,
    pub queue_tick_ms: u64,
    pub matcher_tick_ms: u64,
    pub failure_limit: u32,
    /// Max distance (degrees) a vehicle moves per drive tick. If `None`,
    /// computed from the map as latitude span / 1000.
    pub distance_per_cycle: Option<f64>,
    /// Master seed; per-component seeds are derived from it.
    pub seed: u64,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            max_vehicles: DEFAULT_MAX_VEHICLES,
            max_passengers: DEFAULT_MAX_PASSENGERS,
            tick_ms: DEFAULT_TICK_MS,
            render_ms: DEFAULT_RENDER_MS,
            queue_tick_ms: DEFAULT_QUEUE_TICK_MS,
            matcher_tick_ms: DEFAULT_MATCHER_TICK_MS,
            failure_limit: DEFAULT_FAILURE_LIMIT,
            distance_per_cycle: None,
            seed: 0,
        }
    }
}

impl SimParams {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_fleet_size(mut self, max_vehicles: usize) -> Self {
        self.max_vehicles = max_vehicles;
        self
    }

    pub fn with_passenger_pool(mut self, max_passengers: usize) -> Self {
        self.max_passengers = max_passengers;
        self
    }

    pub fn with_tick_ms(mut self, tick_ms: u64) -> Self {
        self.tick_ms = tick_ms;
        self
    }

    pub fn with_failure_limit(mut self, failure_limit: u32) -> Self {
        self.failure_limit = failure_limit;
        self
    }

    /// Overrides the per-tick step instead of deriving it from the map.
    pub fn with_distance_per_cycle(mut self, step: f64) -> Self {
        self.distance_per_cycle = Some(step);
        self
    }
}

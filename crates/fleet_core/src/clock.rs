//! Shutdown-aware tick timing for the actor loops.
//!
//! Every actor loop waits one period per iteration instead of sleeping
//! unconditionally, so a stop signal wakes it immediately and the loop can
//! exit at a tick boundary. Tests bypass the clock entirely and call the
//! actors' tick methods directly.

use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Duration;

/// Cooperative stop signal shared by all actor loops.
#[derive(Debug, Default)]
pub struct Shutdown {
    stopped: Mutex<bool>,
    signal: Condvar,
}

impl Shutdown {
    fn stopped(&self) -> MutexGuard<'_, bool> {
        match self.stopped.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Flips the flag and wakes every waiting loop.
    pub fn trigger(&self) {
        *self.stopped() = true;
        self.signal.notify_all();
    }

    pub fn is_triggered(&self) -> bool {
        *self.stopped()
    }

    /// Waits up to `period` or until triggered, whichever comes first.
    /// Returns `false` once shutdown has been requested.
    pub fn wait_for(&self, period: Duration) -> bool {
        let guard = self.stopped();
        if *guard {
            return false;
        }
        match self.signal.wait_timeout(guard, period) {
            Ok((guard, _)) => !*guard,
            Err(poisoned) => !*poisoned.into_inner().0,
        }
    }
}

/// Fixed-period ticker bound to a [Shutdown] flag.
#[derive(Debug)]
pub struct Ticker {
    shutdown: std::sync::Arc<Shutdown>,
    period: Duration,
}

impl Ticker {
    pub fn new(shutdown: std::sync::Arc<Shutdown>, period: Duration) -> Self {
        Self { shutdown, period }
    }

    /// Blocks for one period. Returns `false` when the loop should exit.
    pub fn next(&self) -> bool {
        self.shutdown.wait_for(self.period)
    }
}

// Time sources for the control loop, in seconds

use std::time::Instant;

/// Monotonic clock returning seconds as f64
pub trait TimeSource {
    fn now(&self) -> f64;
}

impl<F: Fn() -> f64> TimeSource for F {
    fn now(&self) -> f64 {
        self()
    }
}

/// Seconds elapsed since the clock was created
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

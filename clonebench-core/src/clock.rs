// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Timing sources.
//!
//! Timestamps are real-valued milliseconds with sub-millisecond resolution,
//! monotonic within a process.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// A monotonic clock.
pub trait Clock: Send + Sync {
    /// Milliseconds since an arbitrary, fixed origin.
    fn now(&self) -> f64;
}

/// Wall clock backed by [`Instant`].
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

impl Clock for MonotonicClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_nanos() as f64 / 1_000_000.0
    }
}

/// Deterministic clock: every read advances time by a fixed step.
///
/// Reads are counted in nanoseconds internally so repeated sessions see
/// bit-identical timestamps.
#[derive(Debug)]
pub struct SteppingClock {
    step_ns: u64,
    ticks: AtomicU64,
}

impl SteppingClock {
    /// Create a clock advancing `step_ms` milliseconds per read.
    pub fn new(step_ms: f64) -> Self {
        Self {
            step_ns: (step_ms * 1_000_000.0).round().max(0.0) as u64,
            ticks: AtomicU64::new(0),
        }
    }

    /// Number of reads so far.
    pub fn reads(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> f64 {
        let tick = self.ticks.fetch_add(1, Ordering::Relaxed);
        (tick * self.step_ns) as f64 / 1_000_000.0
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> f64 {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> f64 {
        (**self).now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_monotonic_clock_advances() {
        let clock = MonotonicClock::new();
        let first = clock.now();
        std::thread::sleep(Duration::from_millis(2));
        let second = clock.now();
        assert!(second >= first + 2.0, "{} -> {}", first, second);
    }

    #[test]
    fn test_stepping_clock() {
        let clock = SteppingClock::new(0.5);
        assert_eq!(clock.now(), 0.0);
        assert_eq!(clock.now(), 0.5);
        assert_eq!(clock.now(), 1.0);
        assert_eq!(clock.reads(), 3);
    }
}

// Copyright 2026 the Aspect Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Timestamps for trace sinks.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

use aspect_core::time::{Duration, HostTime, Timebase};

/// A source of event timestamps.
pub trait Clock {
    /// The current time.
    fn now(&mut self) -> HostTime;

    /// The unit of the returned times.
    fn timebase(&self) -> Timebase;
}

/// Wall-clock nanoseconds since the clock was created.
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Starts a clock at zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&mut self) -> HostTime {
        let nanos = self.origin.elapsed().as_nanos();
        HostTime(u64::try_from(nanos).unwrap_or(u64::MAX))
    }

    fn timebase(&self) -> Timebase {
        Timebase::NANOS
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Clone, Debug)]
pub struct ManualClock {
    ticks: Rc<Cell<u64>>,
    timebase: Timebase,
}

impl ManualClock {
    /// Creates a clock at zero in the given timebase.
    #[must_use]
    pub fn new(timebase: Timebase) -> Self {
        Self {
            ticks: Rc::new(Cell::new(0)),
            timebase,
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        self.ticks.set(self.ticks.get().saturating_add(by.ticks()));
    }

    /// Sets the clock to `at`.
    pub fn set(&self, at: HostTime) {
        self.ticks.set(at.ticks());
    }

    /// The current time without advancing.
    #[must_use]
    pub fn get(&self) -> HostTime {
        HostTime(self.ticks.get())
    }
}

impl Clock for ManualClock {
    fn now(&mut self) -> HostTime {
        self.get()
    }

    fn timebase(&self) -> Timebase {
        self.timebase
    }
}

// Copyright 2026 the Aspect Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Timer-fallback coalescing of raw resize events.
//!
//! Hosts with native resize observation get batched notifications for free.
//! Hosts that only have a window `resize` event fire it continuously while
//! the user drags; [`Debouncer`] turns such a burst into a single signal that
//! fires once the burst has been quiet for [`ResizeConfig::fallback_delay`].
//!
//! The debouncer is a pure state machine over [`HostTime`]: the backend feeds
//! it event times and asks it, from a timer callback, whether to fire.

use crate::time::{Duration, HostTime, Timebase};

/// How a backend should turn host resize events into coordinator ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResizeConfig {
    /// Quiet period after the last raw resize event before a tick fires, in
    /// backend ticks. Only used when native observation is unavailable.
    pub fallback_delay: Duration,
    /// Try native resize observation before falling back to events.
    pub prefer_observer: bool,
}

impl ResizeConfig {
    /// Default configuration for the web backend (microsecond ticks):
    /// native observation first, 200 ms debounce otherwise.
    #[must_use]
    pub const fn web() -> Self {
        Self {
            fallback_delay: Duration::from_millis(200, Timebase::MICROS),
            prefer_observer: true,
        }
    }
}

/// Trailing-edge debouncer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Debouncer {
    delay: Duration,
    last_signal: Option<HostTime>,
}

impl Debouncer {
    /// Creates an idle debouncer with the given quiet period.
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_signal: None,
        }
    }

    /// Creates a debouncer using `config.fallback_delay`.
    #[must_use]
    pub const fn from_config(config: &ResizeConfig) -> Self {
        Self::new(config.fallback_delay)
    }

    /// Records a raw resize event at `now`, pushing the deadline back.
    pub fn signal(&mut self, now: HostTime) {
        self.last_signal = Some(now);
    }

    /// When the pending signal will fire, if one is pending.
    #[must_use]
    pub fn deadline(&self) -> Option<HostTime> {
        self.last_signal.map(|t| t.saturating_add(self.delay))
    }

    /// Time left until the deadline, or `None` when idle.
    #[must_use]
    pub fn remaining(&self, now: HostTime) -> Option<Duration> {
        self.deadline().map(|d| d.saturating_duration_since(now))
    }

    /// Returns `true` exactly once per burst, at the first poll on or after
    /// the deadline. The debouncer is idle again afterwards.
    pub fn poll(&mut self, now: HostTime) -> bool {
        match self.deadline() {
            Some(deadline) if now >= deadline => {
                self.last_signal = None;
                true
            }
            _ => false,
        }
    }

    /// Returns `true` while a signal is waiting to fire.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.last_signal.is_some()
    }

    /// Drops any pending signal.
    pub fn cancel(&mut self) {
        self.last_signal = None;
    }
}

// Copyright 2026 the Aspect Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web backend for aspect.
//!
//! This crate provides integration with browser APIs:
//!
//! - [`WindowViewport`]: window and document metrics as a
//!   [`ViewportSource`](aspect_core::viewport::ViewportSource)
//! - [`ResizeSignal`]: `ResizeObserver` resize source with a debounced
//!   `resize` event fallback
//! - [`DomRatioHost`]: inline `padding-bottom` writes on container elements
//! - [`WebRatios`]: the wired-up runtime that mounts containers from their
//!   `data-b-*` attributes

#![no_std]

extern crate alloc;

mod attrs;
mod host;
mod runtime;
mod signal;
mod viewport;

pub use attrs::{GROUP_ATTR, GroupNames, MountAttrs, RATIO_ATTR, RATIOS_ATTR};
pub use host::DomRatioHost;
pub use runtime::WebRatios;
pub use signal::{ResizeSignal, SignalMode};
pub use viewport::WindowViewport;

use aspect_core::time::{HostTime, Timebase};

/// Returns the current host time from `performance.now()`.
///
/// The returned [`HostTime`] is in microsecond ticks. Use [`timebase`] to
/// convert to nanoseconds.
#[must_use]
pub fn now() -> HostTime {
    let ms = signal::performance_now();
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "performance.now() returns small positive f64; µs fits in u64"
    )]
    let us = (ms * 1000.0) as u64;
    HostTime(us)
}

/// Returns the web [`Timebase`]: 1 tick = 1 µs = 1000 ns.
#[must_use]
pub fn timebase() -> Timebase {
    Timebase::MICROS
}

#[cfg(test)]
mod tests {
    use super::*;
    use aspect_core::debounce::ResizeConfig;

    #[test]
    fn timebase_is_microsecond() {
        let tb = timebase();
        assert_eq!(tb.ticks_to_nanos(1), 1000);
        assert_eq!(tb.ticks_to_nanos(1_000_000), 1_000_000_000);
    }

    #[test]
    fn web_fallback_delay_is_in_timebase_ticks() {
        let delay = ResizeConfig::web().fallback_delay;
        assert_eq!(timebase().ticks_to_nanos(delay.ticks()), 200_000_000);
    }
}

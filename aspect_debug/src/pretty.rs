// Copyright 2026 the Aspect Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Lines are
//! stamped in microseconds from the sink's [`Clock`].

use std::io::Write;

use aspect_core::coordinator::TickReport;
use aspect_core::trace::{
    CallbackFailedEvent, DatasetRejectedEvent, RatioAppliedEvent, RatioSource, TickBeginEvent,
    TraceSink, UniformBroadcastEvent,
};

use crate::clock::{Clock, SystemClock};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    clock: Box<dyn Clock>,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("timebase", &self.clock.timebase())
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self::with_writer(writer)
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            clock: Box::new(SystemClock::new()),
        }
    }

    /// Replaces the timestamp source.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Consumes the sink and returns its writer.
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn now_us(&mut self) -> f64 {
        let now = self.clock.now();
        self.clock.timebase().ticks_to_nanos(now.ticks()) as f64 / 1000.0
    }
}

fn source_name(source: RatioSource) -> &'static str {
    match source {
        RatioSource::Resolved => "resolved",
        RatioSource::Fallback => "fallback",
        RatioSource::Uniform => "uniform",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_tick_begin(&mut self, e: &TickBeginEvent) {
        let t = self.now_us();
        let _ = writeln!(
            self.writer,
            "[tick:begin] tick={} viewport={}x{}@{} registered={} t={t:.1}µs",
            e.tick.get(),
            e.metrics.width,
            e.metrics.height,
            e.metrics.device_pixel_ratio,
            e.registered,
        );
    }

    fn on_tick_end(&mut self, r: &TickReport) {
        let t = self.now_us();
        let _ = writeln!(
            self.writer,
            "[tick:end] tick={} invoked={} failed={} skipped={} t={t:.1}µs",
            r.tick.get(),
            r.invoked,
            r.failed,
            r.skipped,
        );
    }

    fn on_callback_failed(&mut self, e: &CallbackFailedEvent<'_>) {
        let t = self.now_us();
        let _ = writeln!(
            self.writer,
            "[callback:FAILED] tick={} position={} error=\"{}\" t={t:.1}µs",
            e.tick.get(),
            e.position,
            e.error,
        );
    }

    fn on_ratio_applied(&mut self, e: &RatioAppliedEvent) {
        let t = self.now_us();
        let _ = writeln!(
            self.writer,
            "[ratio] tick={} element={:?} padding-bottom={} ({}) t={t:.1}µs",
            e.tick.get(),
            e.element,
            e.ratio,
            source_name(e.source),
        );
    }

    fn on_uniform_broadcast(&mut self, e: &UniformBroadcastEvent) {
        let t = self.now_us();
        let _ = writeln!(
            self.writer,
            "[uniform] tick={} group={} ratio={} notified={} t={t:.1}µs",
            e.tick.get(),
            e.group.0,
            e.ratio,
            e.notified,
        );
    }

    fn on_dataset_rejected(&mut self, e: &DatasetRejectedEvent<'_>) {
        let t = self.now_us();
        let _ = writeln!(self.writer, "[dataset:rejected] {} t={t:.1}µs", e.error);
    }
}

// Copyright 2026 the Aspect Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for resize ticks.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! coordinator, the ratio layer, and dataset parsing call as they work. All
//! method bodies default to no-ops, so implementing only the events you care
//! about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! Failures that the core recovers from locally (a rejected dataset, a
//! callback returning an error) are only ever visible here.

use crate::coordinator::{CallbackError, Tick, TickReport};
use crate::dataset::{DatasetError, Ratio};
use crate::element::{ElementId, GroupId};
use crate::viewport::ViewportMetrics;

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when the coordinator starts a tick.
#[derive(Clone, Copy, Debug)]
pub struct TickBeginEvent {
    /// The tick being started.
    pub tick: Tick,
    /// The snapshot every callback in this tick receives.
    pub metrics: ViewportMetrics,
    /// Number of registrations in the tick's snapshot.
    pub registered: usize,
}

/// Emitted when a registered callback returns an error.
///
/// The fan-out continues with the next registration.
#[derive(Clone, Copy, Debug)]
pub struct CallbackFailedEvent<'a> {
    /// The tick during which the callback failed.
    pub tick: Tick,
    /// Position of the registration in the tick's snapshot.
    pub position: usize,
    /// The error the callback returned.
    pub error: &'a CallbackError,
}

/// Where an applied ratio came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RatioSource {
    /// Resolved from the element's breakpoint dataset.
    Resolved,
    /// The element's static fallback ratio.
    Fallback,
    /// Adopted from a uniform broadcast in the element's group.
    Uniform,
}

/// Emitted when a padding ratio is written to an element.
#[derive(Clone, Copy, Debug)]
pub struct RatioAppliedEvent {
    /// The tick the write belongs to (0 before the first tick).
    pub tick: Tick,
    /// The element written to.
    pub element: ElementId,
    /// The written ratio.
    pub ratio: Ratio,
    /// How the ratio was obtained.
    pub source: RatioSource,
}

/// Emitted when a uniform broadcast notifies at least one group member.
#[derive(Clone, Copy, Debug)]
pub struct UniformBroadcastEvent {
    /// The tick of the broadcast.
    pub tick: Tick,
    /// The group that was sized uniformly.
    pub group: GroupId,
    /// The broadcast ratio.
    pub ratio: Ratio,
    /// Number of group members that adopted it.
    pub notified: usize,
}

/// Emitted when a dataset attribute is rejected and replaced by an empty
/// dataset.
#[derive(Clone, Copy, Debug)]
pub struct DatasetRejectedEvent<'a> {
    /// Why parsing failed.
    pub error: &'a DatasetError,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a tick starts, before any callback runs.
    fn on_tick_begin(&mut self, e: &TickBeginEvent) {
        _ = e;
    }

    /// Called when a tick has invoked every live callback.
    fn on_tick_end(&mut self, r: &TickReport) {
        _ = r;
    }

    /// Called when a callback returned an error.
    fn on_callback_failed(&mut self, e: &CallbackFailedEvent<'_>) {
        _ = e;
    }

    /// Called when a ratio is written to an element.
    fn on_ratio_applied(&mut self, e: &RatioAppliedEvent) {
        _ = e;
    }

    /// Called when a uniform broadcast notified group members.
    fn on_uniform_broadcast(&mut self, e: &UniformBroadcastEvent) {
        _ = e;
    }

    /// Called when a dataset could not be parsed.
    fn on_dataset_rejected(&mut self, e: &DatasetRejectedEvent<'_>) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`TickBeginEvent`].
    #[inline]
    pub fn tick_begin(&mut self, e: &TickBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_tick_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`TickReport`] at the end of a tick.
    #[inline]
    pub fn tick_end(&mut self, r: &TickReport) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_tick_end(r);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = r;
        }
    }

    /// Emits a [`CallbackFailedEvent`].
    #[inline]
    pub fn callback_failed(&mut self, e: &CallbackFailedEvent<'_>) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_callback_failed(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`RatioAppliedEvent`].
    #[inline]
    pub fn ratio_applied(&mut self, e: &RatioAppliedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_ratio_applied(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`UniformBroadcastEvent`].
    #[inline]
    pub fn uniform_broadcast(&mut self, e: &UniformBroadcastEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_uniform_broadcast(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`DatasetRejectedEvent`].
    #[inline]
    pub fn dataset_rejected(&mut self, e: &DatasetRejectedEvent<'_>) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_dataset_rejected(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

// Copyright 2026 the Aspect Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as little-endian records, each stamped with the sink's
//! [`Clock`]. [`decode`] reads them back as an iterator of [`Record`].
//!
//! Borrowed error values are stored as their `Display` text.

use aspect_core::coordinator::{Tick, TickReport};
use aspect_core::element::GroupId;
use aspect_core::time::{HostTime, Timebase};
use aspect_core::trace::{
    CallbackFailedEvent, DatasetRejectedEvent, RatioAppliedEvent, RatioSource, TickBeginEvent,
    TraceSink, UniformBroadcastEvent,
};
use aspect_core::viewport::ViewportMetrics;

use crate::clock::{Clock, SystemClock};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_TICK_BEGIN: u8 = 1;
const TAG_TICK_END: u8 = 2;
const TAG_CALLBACK_FAILED: u8 = 3;
const TAG_RATIO_APPLIED: u8 = 4;
const TAG_UNIFORM_BROADCAST: u8 = 5;
const TAG_DATASET_REJECTED: u8 = 6;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink<C: Clock = SystemClock> {
    buf: Vec<u8>,
    clock: C,
}

impl RecorderSink {
    /// Creates an empty recorder stamped by wall-clock nanoseconds.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(SystemClock::new())
    }
}

impl<C: Clock> RecorderSink<C> {
    /// Creates an empty recorder stamped by `clock`.
    #[must_use]
    pub fn with_clock(clock: C) -> Self {
        Self {
            buf: Vec::new(),
            clock,
        }
    }

    /// The timebase of recorded timestamps.
    #[must_use]
    pub fn timebase(&self) -> Timebase {
        self.clock.timebase()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn begin(&mut self, tag: u8) {
        let at = self.clock.now();
        self.write_u8(tag);
        self.write_u64(at.ticks());
    }

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_f64(&mut self, v: f64) {
        self.write_u64(v.to_bits());
    }

    fn write_count(&mut self, v: usize) {
        self.write_u32(u32::try_from(v).unwrap_or(u32::MAX));
    }

    fn write_str(&mut self, s: &str) {
        let bytes = &s.as_bytes()[..s.len().min(u32::MAX as usize)];
        self.write_count(bytes.len());
        self.buf.extend_from_slice(bytes);
    }

    fn write_source(&mut self, source: RatioSource) {
        self.write_u8(match source {
            RatioSource::Resolved => 0,
            RatioSource::Fallback => 1,
            RatioSource::Uniform => 2,
        });
    }
}

impl<C: Clock> TraceSink for RecorderSink<C> {
    fn on_tick_begin(&mut self, e: &TickBeginEvent) {
        self.begin(TAG_TICK_BEGIN);
        self.write_u64(e.tick.get());
        self.write_u32(e.metrics.width);
        self.write_u32(e.metrics.height);
        self.write_f64(e.metrics.device_pixel_ratio);
        self.write_count(e.registered);
    }

    fn on_tick_end(&mut self, r: &TickReport) {
        self.begin(TAG_TICK_END);
        self.write_u64(r.tick.get());
        self.write_count(r.invoked);
        self.write_count(r.failed);
        self.write_count(r.skipped);
    }

    fn on_callback_failed(&mut self, e: &CallbackFailedEvent<'_>) {
        self.begin(TAG_CALLBACK_FAILED);
        self.write_u64(e.tick.get());
        self.write_count(e.position);
        self.write_str(&e.error.to_string());
    }

    fn on_ratio_applied(&mut self, e: &RatioAppliedEvent) {
        self.begin(TAG_RATIO_APPLIED);
        self.write_u64(e.tick.get());
        self.write_u32(e.element.index());
        self.write_u32(e.element.generation());
        self.write_f64(e.ratio.percent());
        self.write_source(e.source);
    }

    fn on_uniform_broadcast(&mut self, e: &UniformBroadcastEvent) {
        self.begin(TAG_UNIFORM_BROADCAST);
        self.write_u64(e.tick.get());
        self.write_u64(e.group.0);
        self.write_f64(e.ratio.percent());
        self.write_count(e.notified);
    }

    fn on_dataset_rejected(&mut self, e: &DatasetRejectedEvent<'_>) {
        self.begin(TAG_DATASET_REJECTED);
        self.write_str(&e.error.to_string());
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded, timestamped event.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    /// When the sink received the event, in the recorder's timebase.
    pub at: HostTime,
    /// The event.
    pub event: RecordedEvent,
}

/// A decoded event from a binary recording.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedEvent {
    /// A [`TickBeginEvent`].
    TickBegin {
        /// The tick that started.
        tick: Tick,
        /// The tick's metrics snapshot.
        metrics: ViewportMetrics,
        /// Registrations in the snapshot.
        registered: u32,
    },
    /// A [`TickReport`].
    TickEnd {
        /// The tick that finished.
        tick: Tick,
        /// Callbacks invoked.
        invoked: u32,
        /// Callbacks that failed.
        failed: u32,
        /// Entries skipped.
        skipped: u32,
    },
    /// A [`CallbackFailedEvent`].
    CallbackFailed {
        /// The tick of the failure.
        tick: Tick,
        /// Position in the tick's snapshot.
        position: u32,
        /// The error's display text.
        message: String,
    },
    /// A [`RatioAppliedEvent`].
    RatioApplied {
        /// The tick of the write.
        tick: Tick,
        /// Slot index of the element.
        element_index: u32,
        /// Generation of the element handle.
        element_generation: u32,
        /// The written percentage.
        percent: f64,
        /// How the ratio was obtained.
        source: RatioSource,
    },
    /// A [`UniformBroadcastEvent`].
    UniformBroadcast {
        /// The tick of the broadcast.
        tick: Tick,
        /// The group.
        group: GroupId,
        /// The broadcast percentage.
        percent: f64,
        /// Members that adopted it.
        notified: u32,
    },
    /// A [`DatasetRejectedEvent`].
    DatasetRejected {
        /// The parse error's display text.
        message: String,
    },
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`Record`]s.
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded records.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn read_bytes(&mut self, n: usize) -> Option<&[u8]> {
        let end = self.pos.checked_add(n)?;
        let bytes = self.data.get(self.pos..end)?;
        self.pos = end;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.read_bytes(1).map(|b| b[0])
    }

    fn read_u32(&mut self) -> Option<u32> {
        Some(u32::from_le_bytes(self.read_bytes(4)?.try_into().ok()?))
    }

    fn read_u64(&mut self) -> Option<u64> {
        Some(u64::from_le_bytes(self.read_bytes(8)?.try_into().ok()?))
    }

    fn read_f64(&mut self) -> Option<f64> {
        self.read_u64().map(f64::from_bits)
    }

    fn read_tick(&mut self) -> Option<Tick> {
        self.read_u64().map(Tick)
    }

    fn read_string(&mut self) -> Option<String> {
        let len = self.read_u32()? as usize;
        let bytes = self.read_bytes(len)?;
        Some(String::from_utf8_lossy(bytes).into_owned())
    }

    fn read_source(&mut self) -> Option<RatioSource> {
        Some(match self.read_u8()? {
            0 => RatioSource::Resolved,
            1 => RatioSource::Fallback,
            _ => RatioSource::Uniform,
        })
    }

    fn decode_tick_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::TickBegin {
            tick: self.read_tick()?,
            metrics: ViewportMetrics {
                width: self.read_u32()?,
                height: self.read_u32()?,
                device_pixel_ratio: self.read_f64()?,
            },
            registered: self.read_u32()?,
        })
    }

    fn decode_tick_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::TickEnd {
            tick: self.read_tick()?,
            invoked: self.read_u32()?,
            failed: self.read_u32()?,
            skipped: self.read_u32()?,
        })
    }

    fn decode_callback_failed(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::CallbackFailed {
            tick: self.read_tick()?,
            position: self.read_u32()?,
            message: self.read_string()?,
        })
    }

    fn decode_ratio_applied(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::RatioApplied {
            tick: self.read_tick()?,
            element_index: self.read_u32()?,
            element_generation: self.read_u32()?,
            percent: self.read_f64()?,
            source: self.read_source()?,
        })
    }

    fn decode_uniform_broadcast(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::UniformBroadcast {
            tick: self.read_tick()?,
            group: GroupId(self.read_u64()?),
            percent: self.read_f64()?,
            notified: self.read_u32()?,
        })
    }

    fn decode_dataset_rejected(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::DatasetRejected {
            message: self.read_string()?,
        })
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = Record;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        let at = HostTime(self.read_u64()?);
        let event = match tag {
            TAG_TICK_BEGIN => self.decode_tick_begin(),
            TAG_TICK_END => self.decode_tick_end(),
            TAG_CALLBACK_FAILED => self.decode_callback_failed(),
            TAG_RATIO_APPLIED => self.decode_ratio_applied(),
            TAG_UNIFORM_BROADCAST => self.decode_uniform_broadcast(),
            TAG_DATASET_REJECTED => self.decode_dataset_rejected(),
            _ => None, // unknown tag → stop iteration
        }?;
        Some(Record { at, event })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use aspect_core::coordinator::{CallbackError, ResizeCoordinator};
    use aspect_core::dataset::{DatasetError, Ratio, RatioDataset};
    use aspect_core::element::ElementTable;
    use aspect_core::time::Duration;
    use aspect_core::trace::Tracer;

    fn manual() -> (ManualClock, RecorderSink<ManualClock>) {
        let clock = ManualClock::new(Timebase::MICROS);
        let sink = RecorderSink::with_clock(clock.clone());
        (clock, sink)
    }

    #[test]
    fn records_are_timestamped_by_the_clock() {
        let (clock, mut rec) = manual();
        rec.on_tick_begin(&TickBeginEvent {
            tick: Tick(1),
            metrics: ViewportMetrics::new(1280, 720, 2.0),
            registered: 3,
        });
        clock.advance(Duration(150));
        rec.on_tick_end(&TickReport {
            tick: Tick(1),
            invoked: 3,
            failed: 1,
            skipped: 0,
        });

        let records: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].at, HostTime(0));
        assert_eq!(
            records[0].event,
            RecordedEvent::TickBegin {
                tick: Tick(1),
                metrics: ViewportMetrics::new(1280, 720, 2.0),
                registered: 3,
            }
        );
        assert_eq!(records[1].at, HostTime(150));
        assert!(matches!(
            records[1].event,
            RecordedEvent::TickEnd { invoked: 3, failed: 1, .. }
        ));
    }

    #[test]
    fn ratio_events_keep_handles_and_sources() {
        let (_, mut rec) = manual();
        let mut table = ElementTable::new();
        let id = table.insert(());
        rec.on_ratio_applied(&RatioAppliedEvent {
            tick: Tick(4),
            element: id,
            ratio: Ratio::new(56.25).unwrap(),
            source: RatioSource::Uniform,
        });
        rec.on_uniform_broadcast(&UniformBroadcastEvent {
            tick: Tick(4),
            group: GroupId(9),
            ratio: Ratio::new(56.25).unwrap(),
            notified: 5,
        });

        let events: Vec<_> = decode(rec.as_bytes()).map(|r| r.event).collect();
        assert_eq!(
            events,
            vec![
                RecordedEvent::RatioApplied {
                    tick: Tick(4),
                    element_index: id.index(),
                    element_generation: id.generation(),
                    percent: 56.25,
                    source: RatioSource::Uniform,
                },
                RecordedEvent::UniformBroadcast {
                    tick: Tick(4),
                    group: GroupId(9),
                    percent: 56.25,
                    notified: 5,
                },
            ]
        );
    }

    #[test]
    fn errors_are_recorded_as_text() {
        let (_, mut rec) = manual();
        let dataset = RatioDataset::parse_lenient("[1, 2]", &mut Tracer::new(&mut rec));
        assert!(dataset.is_empty());
        let error: CallbackError = Box::new(DatasetError::NotAnObject);
        rec.on_callback_failed(&CallbackFailedEvent {
            tick: Tick(2),
            position: 1,
            error: &error,
        });

        let events: Vec<_> = decode(rec.as_bytes()).map(|r| r.event).collect();
        let expected = DatasetError::NotAnObject.to_string();
        assert_eq!(
            events,
            vec![
                RecordedEvent::DatasetRejected {
                    message: expected.clone()
                },
                RecordedEvent::CallbackFailed {
                    tick: Tick(2),
                    position: 1,
                    message: expected,
                },
            ]
        );
    }

    #[test]
    fn records_a_full_coordinator_tick() {
        let (_, mut rec) = manual();
        let coord = ResizeCoordinator::new();
        coord.register(1_u32, |_: &u32, _: &ViewportMetrics, _, _: &mut Tracer<'_>| Ok(()));
        coord.register(2_u32, |_: &u32, _: &ViewportMetrics, _, _: &mut Tracer<'_>| {
            Err(Box::new(DatasetError::NotAnObject) as CallbackError)
        });
        coord.dispatch(&ViewportMetrics::new(800, 600, 1.0), &mut Tracer::new(&mut rec));

        let events: Vec<_> = decode(rec.as_bytes()).map(|r| r.event).collect();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], RecordedEvent::TickBegin { registered: 2, .. }));
        assert!(matches!(
            events[1],
            RecordedEvent::CallbackFailed { position: 1, .. }
        ));
        assert!(matches!(
            events[2],
            RecordedEvent::TickEnd { invoked: 2, failed: 1, skipped: 0, .. }
        ));
    }

    #[test]
    fn truncated_buffer_stops_decoding() {
        let (_, mut rec) = manual();
        rec.on_dataset_rejected(&DatasetRejectedEvent {
            error: &DatasetError::NotAnObject,
        });
        let bytes = rec.into_bytes();
        assert_eq!(decode(&bytes[..bytes.len() - 1]).count(), 0);
        assert_eq!(decode(&[]).count(), 0);
    }
}

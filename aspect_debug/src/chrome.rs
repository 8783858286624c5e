// Copyright 2026 the Aspect Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//! Each tick becomes a duration slice; everything else is an instant event
//! inside it.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use aspect_core::time::Timebase;

use crate::recorder::{Record, RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// Timestamps are converted to microseconds using the provided [`Timebase`].
pub fn export(bytes: &[u8], timebase: Timebase, writer: &mut dyn Write) -> io::Result<()> {
    let events: Vec<Value> = decode(bytes)
        .map(|record| to_trace_event(&record, timebase))
        .collect();
    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn to_trace_event(record: &Record, timebase: Timebase) -> Value {
    let ts = ticks_to_us(record.at.ticks(), timebase);
    match &record.event {
        RecordedEvent::TickBegin {
            tick,
            metrics,
            registered,
        } => json!({
            "ph": "B",
            "name": "Tick",
            "cat": "Coordinator",
            "ts": ts,
            "pid": 0,
            "tid": 0,
            "args": {
                "tick": tick.get(),
                "width": metrics.width,
                "height": metrics.height,
                "device_pixel_ratio": metrics.device_pixel_ratio,
                "registered": registered,
            }
        }),
        RecordedEvent::TickEnd {
            tick,
            invoked,
            failed,
            skipped,
        } => json!({
            "ph": "E",
            "name": "Tick",
            "cat": "Coordinator",
            "ts": ts,
            "pid": 0,
            "tid": 0,
            "args": {
                "tick": tick.get(),
                "invoked": invoked,
                "failed": failed,
                "skipped": skipped,
            }
        }),
        RecordedEvent::CallbackFailed {
            tick,
            position,
            message,
        } => json!({
            "ph": "i",
            "name": "CallbackFailed",
            "cat": "Coordinator",
            "ts": ts,
            "pid": 0,
            "tid": 0,
            "s": "t",
            "args": {
                "tick": tick.get(),
                "position": position,
                "error": message,
            }
        }),
        RecordedEvent::RatioApplied {
            tick,
            element_index,
            element_generation,
            percent,
            source,
        } => json!({
            "ph": "i",
            "name": "RatioApplied",
            "cat": "Ratio",
            "ts": ts,
            "pid": 0,
            "tid": 0,
            "s": "t",
            "args": {
                "tick": tick.get(),
                "element": element_index,
                "generation": element_generation,
                "percent": percent,
                "source": format!("{source:?}"),
            }
        }),
        RecordedEvent::UniformBroadcast {
            tick,
            group,
            percent,
            notified,
        } => json!({
            "ph": "i",
            "name": "UniformBroadcast",
            "cat": "Ratio",
            "ts": ts,
            "pid": 0,
            "tid": 0,
            "s": "p",
            "args": {
                "tick": tick.get(),
                "group": group.0,
                "percent": percent,
                "notified": notified,
            }
        }),
        RecordedEvent::DatasetRejected { message } => json!({
            "ph": "i",
            "name": "DatasetRejected",
            "cat": "Dataset",
            "ts": ts,
            "pid": 0,
            "tid": 0,
            "s": "g",
            "args": {
                "error": message,
            }
        }),
    }
}

fn ticks_to_us(ticks: u64, timebase: Timebase) -> f64 {
    timebase.ticks_to_nanos(ticks) as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::recorder::RecorderSink;
    use aspect_core::coordinator::{Tick, TickReport};
    use aspect_core::dataset::DatasetError;
    use aspect_core::time::Duration;
    use aspect_core::trace::{DatasetRejectedEvent, TickBeginEvent, TraceSink};
    use aspect_core::viewport::ViewportMetrics;

    #[test]
    fn export_produces_valid_json() {
        let clock = ManualClock::new(Timebase::MICROS);
        let mut rec = RecorderSink::with_clock(clock.clone());
        clock.advance(Duration(1_000));
        rec.on_tick_begin(&TickBeginEvent {
            tick: Tick(1),
            metrics: ViewportMetrics::new(800, 600, 1.0),
            registered: 2,
        });
        rec.on_dataset_rejected(&DatasetRejectedEvent {
            error: &DatasetError::NotAnObject,
        });
        clock.advance(Duration(250));
        rec.on_tick_end(&TickReport {
            tick: Tick(1),
            invoked: 2,
            failed: 0,
            skipped: 0,
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), rec.timebase(), &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();

        // Should parse as a JSON array.
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert_eq!(parsed.len(), 3);

        assert_eq!(parsed[0]["ph"], "B");
        assert_eq!(parsed[0]["name"], "Tick");
        assert_eq!(parsed[0]["ts"], 1000.0);
        assert_eq!(parsed[0]["args"]["width"], 800);

        assert_eq!(parsed[1]["ph"], "i");
        assert_eq!(parsed[1]["name"], "DatasetRejected");

        assert_eq!(parsed[2]["ph"], "E");
        assert_eq!(parsed[2]["ts"], 1250.0);
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], Timebase::NANOS, &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert!(parsed.is_empty());
    }
}

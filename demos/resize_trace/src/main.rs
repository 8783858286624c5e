// Copyright 2026 the Aspect Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated resize storm that exercises the coordinator, the ratio layer,
//! and the diagnostics pipeline.
//!
//! Mounts a small page (a uniform gallery, a hero image, a container with a
//! broken dataset), then drags a fake window through two resize bursts. Raw
//! resize events are coalesced by a [`Debouncer`] exactly as the web
//! backend's fallback mode does. Events go to both a
//! [`PrettyPrintSink`](aspect_debug::pretty::PrettyPrintSink) and a
//! [`RecorderSink`](aspect_debug::recorder::RecorderSink), and the recording
//! is exported as a Chrome trace JSON file.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter};
use std::rc::Rc;

use aspect_core::coordinator::{ResizeCoordinator, TickReport};
use aspect_core::dataset::{Ratio, RatioDataset};
use aspect_core::debounce::{Debouncer, ResizeConfig};
use aspect_core::element::{ElementId, GroupId};
use aspect_core::ratio::{MountSpec, RatioConfig, RatioHost, RatioLayer, ratio_callback};
use aspect_core::time::{Duration, HostTime, Timebase};
use aspect_core::trace::{
    CallbackFailedEvent, DatasetRejectedEvent, RatioAppliedEvent, TickBeginEvent, TraceSink,
    Tracer, UniformBroadcastEvent,
};
use aspect_core::viewport::FixedViewport;

use aspect_debug::clock::ManualClock;
use aspect_debug::pretty::PrettyPrintSink;
use aspect_debug::recorder::RecorderSink;

/// One simulated animation frame, in microseconds.
const FRAME: Duration = Duration(16_667);

/// Forwards every event to two sinks.
struct Tee<A, B>(A, B);

impl<A: TraceSink, B: TraceSink> TraceSink for Tee<A, B> {
    fn on_tick_begin(&mut self, e: &TickBeginEvent) {
        self.0.on_tick_begin(e);
        self.1.on_tick_begin(e);
    }

    fn on_tick_end(&mut self, r: &TickReport) {
        self.0.on_tick_end(r);
        self.1.on_tick_end(r);
    }

    fn on_callback_failed(&mut self, e: &CallbackFailedEvent<'_>) {
        self.0.on_callback_failed(e);
        self.1.on_callback_failed(e);
    }

    fn on_ratio_applied(&mut self, e: &RatioAppliedEvent) {
        self.0.on_ratio_applied(e);
        self.1.on_ratio_applied(e);
    }

    fn on_uniform_broadcast(&mut self, e: &UniformBroadcastEvent) {
        self.0.on_uniform_broadcast(e);
        self.1.on_uniform_broadcast(e);
    }

    fn on_dataset_rejected(&mut self, e: &DatasetRejectedEvent<'_>) {
        self.0.on_dataset_rejected(e);
        self.1.on_dataset_rejected(e);
    }
}

/// Stands in for the DOM: remembers the last padding written per element.
#[derive(Debug, Default)]
struct PageHost {
    padding: BTreeMap<ElementId, String>,
}

impl RatioHost for PageHost {
    fn set_padding_bottom(&mut self, id: ElementId, value: &str) {
        self.padding.insert(id, value.to_owned());
    }

    fn has_inline_padding(&self, id: ElementId) -> bool {
        self.padding.contains_key(&id)
    }
}

fn main() -> io::Result<()> {
    let timebase = Timebase::MICROS;
    let clock = ManualClock::new(timebase);
    clock.set(HostTime(1_000_000)); // start at 1s

    // -- sinks -------------------------------------------------------------
    let pretty = PrettyPrintSink::new(Box::new(io::stdout())).with_clock(clock.clone());
    let recorder = RecorderSink::with_clock(clock.clone());
    let mut sinks = Tee(pretty, recorder);

    // -- page --------------------------------------------------------------
    let layer = Rc::new(RefCell::new(RatioLayer::new(RatioConfig::DEFAULT)));
    let host = Rc::new(RefCell::new(PageHost::default()));
    let coordinator = ResizeCoordinator::new();
    let gallery = GroupId(1);

    let mounted = {
        let mut tracer = Tracer::new(&mut sinks);
        let mut layer = layer.borrow_mut();
        let mut ids = Vec::new();

        // Gallery: the first item knows its ratios, the rest follow it.
        ids.push(layer.mount(MountSpec {
            dataset: RatioDataset::parse_lenient(
                r#"{"320": 75, "768": 56.25, "1200": 42.5}"#,
                &mut tracer,
            ),
            group: Some(gallery),
            picture: true,
            fallback: None,
        }));
        for _ in 0..3 {
            ids.push(layer.mount(MountSpec {
                group: Some(gallery),
                ..MountSpec::default()
            }));
        }

        // Hero: desktop-first breakpoints, scaled by pixel ratio.
        ids.push(layer.mount(MountSpec {
            dataset: RatioDataset::parse_lenient(
                r#"{"640": "66.6%", "1024": "50%", "1920": "37.5%"}"#,
                &mut tracer,
            ),
            ..MountSpec::default()
        }));

        // Broken dataset: degrades to its static fallback.
        ids.push(layer.mount(MountSpec {
            dataset: RatioDataset::parse_lenient(r#"{"320": 56.25"#, &mut tracer),
            fallback: Ratio::new(100.0),
            ..MountSpec::default()
        }));

        ids
    };

    for id in &mounted {
        coordinator.register(*id, ratio_callback(Rc::clone(&layer), Rc::clone(&host)));
    }

    // A registration whose element went away without unregistering. Its
    // callback fails every tick without disturbing the others.
    let orphan = layer.borrow_mut().mount(MountSpec::default());
    coordinator.register(orphan, ratio_callback(Rc::clone(&layer), Rc::clone(&host)));
    layer.borrow_mut().unmount(orphan);

    // -- initial paint -----------------------------------------------------
    let viewport = FixedViewport::new(1280.0, 800.0, 1.0);
    coordinator.notify(&viewport, &mut Tracer::new(&mut sinks));

    // -- resize storms -----------------------------------------------------
    let mut debouncer = Debouncer::from_config(&ResizeConfig::web());
    let storms: [(f64, f64, f64); 2] = [(1280.0, 600.0, 1.0), (600.0, 1600.0, 2.0)];
    let mut raw_events = 0_u32;

    for (from, to, pixel_ratio) in storms {
        viewport.set_pixel_ratio(pixel_ratio);
        let steps = 30;
        for step in 1..=steps {
            let width = from + (to - from) * f64::from(step) / f64::from(steps);
            viewport.set_width(width);
            debouncer.signal(clock.get());
            raw_events += 1;
            clock.advance(FRAME);
            if debouncer.poll(clock.get()) {
                coordinator.notify(&viewport, &mut Tracer::new(&mut sinks));
            }
        }
        // The user lets go; the burst settles.
        while debouncer.is_pending() {
            clock.advance(FRAME);
            if debouncer.poll(clock.get()) {
                coordinator.notify(&viewport, &mut Tracer::new(&mut sinks));
            }
        }
    }

    // -- summary -----------------------------------------------------------
    println!(
        "{raw_events} raw resize events → {} ticks",
        coordinator.tick().get()
    );
    for (id, padding) in &host.borrow().padding {
        println!("  {id:?}: padding-bottom {padding}");
    }

    // -- export Chrome trace -----------------------------------------------
    let Tee(_, recorder) = sinks;
    let path = "resize_trace.json";
    let mut writer = BufWriter::new(File::create(path)?);
    aspect_debug::chrome::export(recorder.as_bytes(), recorder.timebase(), &mut writer)?;
    println!("Wrote {path}");
    Ok(())
}

// Copyright 2026 the Aspect Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host-independent runtime.
//!
//! [`RatioRuntime`] wires one [`ResizeCoordinator`], one [`RatioLayer`] and
//! one [`RatioHost`] together behind a [`ViewportSource`]. Backends own one
//! and forward their resize signal to [`on_resize`](RatioRuntime::on_resize).
//!
//! - A resize signal whose metrics resolve like the previous tick's (see
//!   [`ViewportMetrics::resolves_like`]) is dropped, so content reflow that
//!   resizes an observed root at a constant width never becomes a tick.
//! - After every tick, elements the host reports as detached are unregistered
//!   and unmounted.
//! - The last [`TickReport`] and a running count of failed callbacks are kept
//!   whether or not a trace sink is installed.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use crate::coordinator::{ResizeCoordinator, Tick, TickReport};
use crate::element::ElementId;
use crate::ratio::{MountSpec, RatioConfig, RatioError, RatioHost, RatioLayer, ratio_callback};
use crate::trace::{TraceSink, Tracer};
use crate::viewport::{ViewportMetrics, ViewportSource};

/// A coordinator, a ratio layer and a host driven by one viewport.
pub struct RatioRuntime<H, V> {
    coordinator: ResizeCoordinator<ElementId>,
    layer: Rc<RefCell<RatioLayer>>,
    host: Rc<RefCell<H>>,
    viewport: V,
    sink: RefCell<Option<Box<dyn TraceSink>>>,
    last_metrics: Cell<Option<ViewportMetrics>>,
    last_report: Cell<Option<TickReport>>,
    failed: Cell<u64>,
}

impl<H, V> core::fmt::Debug for RatioRuntime<H, V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RatioRuntime")
            .field("coordinator", &self.coordinator)
            .field("last_report", &self.last_report.get())
            .field("failed", &self.failed.get())
            .finish_non_exhaustive()
    }
}

impl<H: RatioHost + 'static, V: ViewportSource> RatioRuntime<H, V> {
    /// Creates a runtime with nothing mounted, at tick `0`.
    #[must_use]
    pub fn new(host: H, viewport: V, config: RatioConfig) -> Self {
        Self {
            coordinator: ResizeCoordinator::new(),
            layer: Rc::new(RefCell::new(RatioLayer::new(config))),
            host: Rc::new(RefCell::new(host)),
            viewport,
            sink: RefCell::new(None),
            last_metrics: Cell::new(None),
            last_report: Cell::new(None),
            failed: Cell::new(0),
        }
    }

    /// Runs `f` with a tracer over the installed sink. When the sink is
    /// already in use further up the stack, `f` gets a silent tracer.
    pub fn with_tracer<R>(&self, f: impl FnOnce(&mut Tracer<'_>) -> R) -> R {
        match self.sink.try_borrow_mut() {
            Ok(mut sink) => match sink.as_deref_mut() {
                Some(sink) => f(&mut Tracer::new(sink)),
                None => f(&mut Tracer::none()),
            },
            Err(_) => f(&mut Tracer::none()),
        }
    }

    /// Installs a trace sink for every subsequent tick and mount.
    pub fn set_trace_sink(&self, sink: impl TraceSink + 'static) {
        *self.sink.borrow_mut() = Some(Box::new(sink));
    }

    /// Removes and returns the installed trace sink.
    pub fn take_trace_sink(&self) -> Option<Box<dyn TraceSink>> {
        self.sink.borrow_mut().take()
    }

    /// The shared host.
    #[must_use]
    pub fn host(&self) -> &Rc<RefCell<H>> {
        &self.host
    }

    /// The shared ratio layer.
    #[must_use]
    pub fn layer(&self) -> &Rc<RefCell<RatioLayer>> {
        &self.layer
    }

    /// The viewport source.
    #[must_use]
    pub fn viewport(&self) -> &V {
        &self.viewport
    }

    /// Mounts a container and paints it once at the current tick.
    ///
    /// `attach` runs after the handle is allocated and before the first
    /// write, so the host can associate its element with the handle.
    ///
    /// # Errors
    ///
    /// Returns [`RatioError::Busy`] when called from inside a tick.
    pub fn mount(
        &self,
        spec: MountSpec,
        attach: impl FnOnce(&mut H, ElementId),
    ) -> Result<ElementId, RatioError> {
        let mut layer = self.layer.try_borrow_mut().map_err(|_| RatioError::Busy)?;
        let mut host = self.host.try_borrow_mut().map_err(|_| RatioError::Busy)?;

        let id = layer.mount(spec);
        attach(&mut *host, id);
        let metrics = ViewportMetrics::capture(&self.viewport);
        let tick = self.coordinator.tick();
        self.with_tracer(|tracer| {
            layer.apply_ratio(&mut *host, id, &metrics, tick, tracer);
        });
        self.coordinator
            .register(id, ratio_callback(Rc::clone(&self.layer), Rc::clone(&self.host)));
        Ok(id)
    }

    /// Unregisters and forgets a container. Inline styles already written are
    /// left in place. Returns `false` for stale handles.
    ///
    /// # Errors
    ///
    /// Returns [`RatioError::Busy`] when called from inside a tick.
    pub fn unmount(&self, id: ElementId) -> Result<bool, RatioError> {
        let mut layer = self.layer.try_borrow_mut().map_err(|_| RatioError::Busy)?;
        let mut host = self.host.try_borrow_mut().map_err(|_| RatioError::Busy)?;
        self.coordinator.unregister(&id);
        let removed = layer.unmount(id);
        host.release(id);
        Ok(removed)
    }

    /// Handles a resize signal from the host.
    ///
    /// Runs a tick unless the viewport still resolves like it did on the
    /// previous tick. Returns `None` when no tick ran (filtered, or queued
    /// behind a running tick).
    pub fn on_resize(&self) -> Option<TickReport> {
        let metrics = ViewportMetrics::capture(&self.viewport);
        if self
            .last_metrics
            .get()
            .is_some_and(|last| last.resolves_like(&metrics))
        {
            return None;
        }
        self.run(&metrics)
    }

    /// Runs a tick now, even if the viewport has not changed.
    pub fn refresh(&self) -> Option<TickReport> {
        let metrics = ViewportMetrics::capture(&self.viewport);
        self.run(&metrics)
    }

    fn run(&self, metrics: &ViewportMetrics) -> Option<TickReport> {
        self.last_metrics.set(Some(*metrics));
        let report = self.with_tracer(|tracer| self.coordinator.dispatch(metrics, tracer));
        if let Some(report) = report {
            self.last_report.set(Some(report));
            let failed = u64::try_from(report.failed).unwrap_or(u64::MAX);
            self.failed.set(self.failed.get().saturating_add(failed));
        }
        self.prune_detached();
        report
    }

    /// Unmounts every element the host no longer reports as attached.
    /// Returns how many were removed; does nothing while a tick is running.
    pub fn prune_detached(&self) -> usize {
        let (Ok(mut layer), Ok(mut host)) =
            (self.layer.try_borrow_mut(), self.host.try_borrow_mut())
        else {
            return 0;
        };
        let detached: Vec<ElementId> = layer.ids().filter(|id| !host.is_attached(*id)).collect();
        for id in &detached {
            self.coordinator.unregister(id);
            layer.unmount(*id);
            host.release(*id);
        }
        detached.len()
    }

    /// The report of the most recent completed tick.
    #[must_use]
    pub fn last_report(&self) -> Option<TickReport> {
        self.last_report.get()
    }

    /// Callbacks that returned an error, summed over every tick.
    #[must_use]
    pub fn failed_callbacks(&self) -> u64 {
        self.failed.get()
    }

    /// The most recent tick (`Tick(0)` before the first one).
    #[must_use]
    pub fn tick(&self) -> Tick {
        self.coordinator.tick()
    }

    /// Returns whether `id` is registered for ticks.
    #[must_use]
    pub fn contains(&self, id: ElementId) -> bool {
        self.coordinator.contains(&id)
    }

    /// Number of registered containers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.coordinator.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.coordinator.is_empty()
    }

    /// Forgets every container. The tick counter is kept.
    pub fn dispose(&self) {
        self.coordinator.dispose_all();
        self.last_metrics.set(None);
        if let (Ok(mut layer), Ok(mut host)) =
            (self.layer.try_borrow_mut(), self.host.try_borrow_mut())
        {
            for id in layer.ids().collect::<Vec<_>>() {
                host.release(id);
            }
            layer.clear();
        }
    }
}

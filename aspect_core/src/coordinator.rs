// Copyright 2026 the Aspect Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Coordinated resize fan-out.
//!
//! A [`ResizeCoordinator`] holds an ordered list of registrations (a key plus
//! a callback). Each resize signal becomes one *tick*: the tick counter is
//! incremented once, one [`ViewportMetrics`] snapshot is taken, and every
//! registration receives that same snapshot by shared reference. No callback
//! can observe metrics from a different moment than its neighbours in the
//! same tick.
//!
//! # Reentrancy
//!
//! The coordinator is interior-mutable so callbacks may hold a handle to it:
//!
//! - [`register`](ResizeCoordinator::register) and
//!   [`unregister`](ResizeCoordinator::unregister) may be called from inside a
//!   callback. The running tick iterates over a snapshot of the registry, so
//!   new registrations start with the next tick, and registrations removed
//!   before their turn are skipped.
//! - A [`dispatch`](ResizeCoordinator::dispatch) issued while a tick is
//!   running is queued and runs as its own tick once the current one has
//!   finished. Several queued signals coalesce into one, keeping the latest
//!   metrics.
//!
//! # Failures
//!
//! Callbacks return `Result<(), CallbackError>`. An error is reported to the
//! tracer as a [`CallbackFailedEvent`] and counted in the [`TickReport`];
//! remaining callbacks in the tick still run.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use crate::trace::{CallbackFailedEvent, TickBeginEvent, Tracer};
use crate::viewport::{ViewportMetrics, ViewportSource};

/// An error returned by a registered callback.
pub type CallbackError = Box<dyn core::error::Error + 'static>;

type Callback<K> =
    Box<dyn FnMut(&K, &ViewportMetrics, Tick, &mut Tracer<'_>) -> Result<(), CallbackError>>;

/// Monotonic tick number. Tick `0` means no tick has run yet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tick(pub u64);

impl Tick {
    /// Returns the raw counter value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns `true` for the initial paint (tick `0` or `1`), when no
    /// cross-element coordination is needed yet.
    #[inline]
    #[must_use]
    pub const fn is_initial(self) -> bool {
        self.0 <= 1
    }
}

/// Outcome of one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickReport {
    /// The tick that ran.
    pub tick: Tick,
    /// Callbacks that were invoked.
    pub invoked: usize,
    /// Invoked callbacks that returned an error.
    pub failed: usize,
    /// Snapshot entries that were unregistered before their turn.
    pub skipped: usize,
}

struct Entry<K> {
    key: K,
    callback: Rc<RefCell<Callback<K>>>,
    live: Rc<Cell<bool>>,
}

impl<K: Clone> Clone for Entry<K> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            callback: Rc::clone(&self.callback),
            live: Rc::clone(&self.live),
        }
    }
}

/// Resets the dispatching flag even if a callback panics.
struct DispatchGuard<'a>(&'a Cell<bool>);

impl<'a> DispatchGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Fans one resize signal out to every registered callback.
///
/// `K` identifies a registration; re-registering an equal key replaces the
/// callback in place. Coordinators are plain values: create one per
/// independent set of containers and drop it (or call
/// [`dispose_all`](Self::dispose_all)) to tear it down.
pub struct ResizeCoordinator<K> {
    entries: RefCell<Vec<Entry<K>>>,
    tick: Cell<u64>,
    dispatching: Cell<bool>,
    queued: Cell<Option<ViewportMetrics>>,
}

impl<K> core::fmt::Debug for ResizeCoordinator<K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ResizeCoordinator")
            .field("entries_len", &self.entries.borrow().len())
            .field("tick", &self.tick.get())
            .field("dispatching", &self.dispatching.get())
            .finish_non_exhaustive()
    }
}

impl<K: PartialEq + Clone> Default for ResizeCoordinator<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: PartialEq + Clone> ResizeCoordinator<K> {
    /// Creates a coordinator with no registrations, at tick `0`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
            tick: Cell::new(0),
            dispatching: Cell::new(false),
            queued: Cell::new(None),
        }
    }

    /// Registers `callback` for `key`.
    ///
    /// If `key` is already registered its callback is replaced and it keeps
    /// its position in the fan-out order. A replacement made during a tick
    /// takes effect from the next tick.
    pub fn register<F>(&self, key: K, callback: F)
    where
        F: FnMut(&K, &ViewportMetrics, Tick, &mut Tracer<'_>) -> Result<(), CallbackError>
            + 'static,
    {
        let entry = Entry {
            key,
            callback: Rc::new(RefCell::new(Box::new(callback))),
            live: Rc::new(Cell::new(true)),
        };
        let mut entries = self.entries.borrow_mut();
        if let Some(slot) = entries.iter_mut().find(|e| e.key == entry.key) {
            slot.live.set(false);
            *slot = entry;
        } else {
            entries.push(entry);
        }
    }

    /// Removes the registration for `key`. Returns whether one existed.
    pub fn unregister(&self, key: &K) -> bool {
        let mut entries = self.entries.borrow_mut();
        let Some(pos) = entries.iter().position(|e| e.key == *key) else {
            return false;
        };
        let entry = entries.remove(pos);
        entry.live.set(false);
        true
    }

    /// Removes every registration. The tick counter is kept.
    pub fn dispose_all(&self) {
        for entry in self.entries.borrow_mut().drain(..) {
            entry.live.set(false);
        }
    }

    /// Returns whether `key` is registered.
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.entries.borrow().iter().any(|e| e.key == *key)
    }

    /// Number of registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// The most recent tick (`Tick(0)` before the first dispatch).
    #[must_use]
    pub fn tick(&self) -> Tick {
        Tick(self.tick.get())
    }

    /// Captures one metrics snapshot from `source` and dispatches it.
    pub fn notify(
        &self,
        source: &dyn ViewportSource,
        tracer: &mut Tracer<'_>,
    ) -> Option<TickReport> {
        let metrics = ViewportMetrics::capture(source);
        self.dispatch(&metrics, tracer)
    }

    /// Runs one tick with `metrics`.
    ///
    /// Returns the report for that tick, or `None` if a tick was already
    /// running and this one was queued behind it.
    pub fn dispatch(
        &self,
        metrics: &ViewportMetrics,
        tracer: &mut Tracer<'_>,
    ) -> Option<TickReport> {
        if self.dispatching.get() {
            self.queued.set(Some(*metrics));
            return None;
        }
        let _guard = DispatchGuard::enter(&self.dispatching);

        let report = self.run_tick(metrics, tracer);
        while let Some(next) = self.queued.take() {
            self.run_tick(&next, tracer);
        }
        Some(report)
    }

    fn run_tick(&self, metrics: &ViewportMetrics, tracer: &mut Tracer<'_>) -> TickReport {
        let tick = Tick(self.tick.get() + 1);
        self.tick.set(tick.0);

        // Iterate a snapshot so callbacks may (un)register freely.
        let snapshot: Vec<Entry<K>> = self.entries.borrow().clone();
        tracer.tick_begin(&TickBeginEvent {
            tick,
            metrics: *metrics,
            registered: snapshot.len(),
        });

        let mut report = TickReport {
            tick,
            invoked: 0,
            failed: 0,
            skipped: 0,
        };
        for (position, entry) in snapshot.iter().enumerate() {
            if !entry.live.get() {
                report.skipped += 1;
                continue;
            }
            let Ok(mut callback) = entry.callback.try_borrow_mut() else {
                report.skipped += 1;
                continue;
            };
            report.invoked += 1;
            if let Err(error) = callback(&entry.key, metrics, tick, &mut *tracer) {
                report.failed += 1;
                tracer.callback_failed(&CallbackFailedEvent {
                    tick,
                    position,
                    error: &error,
                });
            }
        }

        tracer.tick_end(&report);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewport::FixedViewport;
    use alloc::vec;

    #[derive(Debug)]
    struct Boom;

    impl core::fmt::Display for Boom {
        fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
            f.write_str("boom")
        }
    }

    impl core::error::Error for Boom {}

    type Log = Rc<RefCell<Vec<(u32, u64, u32)>>>;

    fn recorder(
        log: Log,
    ) -> impl FnMut(&u32, &ViewportMetrics, Tick, &mut Tracer<'_>) -> Result<(), CallbackError> {
        move |key, metrics, tick, _| {
            log.borrow_mut().push((*key, tick.get(), metrics.width));
            Ok(())
        }
    }

    #[test]
    fn fans_out_in_registration_order() {
        let log: Log = Rc::default();
        let coord = ResizeCoordinator::new();
        for key in [3, 1, 2] {
            coord.register(key, recorder(Rc::clone(&log)));
        }

        let report = coord
            .dispatch(&ViewportMetrics::new(800, 600, 1.0), &mut Tracer::none())
            .unwrap();
        assert_eq!(report.tick, Tick(1));
        assert_eq!(report.invoked, 3);
        assert_eq!(*log.borrow(), vec![(3, 1, 800), (1, 1, 800), (2, 1, 800)]);
    }

    #[test]
    fn every_callback_sees_the_same_snapshot() {
        // The first callback changes the host width; later callbacks must
        // still see the width captured at the start of the tick.
        struct CountingSource {
            inner: FixedViewport,
            reads: Cell<usize>,
        }
        impl ViewportSource for CountingSource {
            fn inner_width(&self) -> Option<f64> {
                self.reads.set(self.reads.get() + 1);
                self.inner.inner_width()
            }
            fn device_pixel_ratio(&self) -> Option<f64> {
                self.inner.device_pixel_ratio()
            }
        }

        let source = Rc::new(CountingSource {
            inner: FixedViewport::new(1024.0, 768.0, 2.0),
            reads: Cell::new(0),
        });
        let seen: Rc<RefCell<Vec<(u32, f64)>>> = Rc::default();
        let coord = ResizeCoordinator::new();
        for key in 0..5_u32 {
            let source = Rc::clone(&source);
            let seen = Rc::clone(&seen);
            coord.register(key, move |_, metrics, _, _| {
                source.inner.set_width(f64::from(key) * 100.0);
                source.inner.set_pixel_ratio(3.0);
                seen.borrow_mut().push((metrics.width, metrics.device_pixel_ratio));
                Ok(())
            });
        }

        coord.notify(&*source, &mut Tracer::none());
        assert_eq!(source.reads.get(), 1, "width read once per tick");
        assert!(seen.borrow().iter().all(|m| *m == (1024, 2.0)));
        assert_eq!(seen.borrow().len(), 5);
    }

    #[test]
    fn failing_callback_does_not_stop_the_tick() {
        let log: Log = Rc::default();
        let coord = ResizeCoordinator::new();
        coord.register(1, recorder(Rc::clone(&log)));
        coord.register(2, |_, _, _, _| Err(Box::new(Boom) as CallbackError));
        coord.register(3, recorder(Rc::clone(&log)));

        let report = coord
            .dispatch(&ViewportMetrics::new(640, 480, 1.0), &mut Tracer::none())
            .unwrap();
        assert_eq!(report.invoked, 3);
        assert_eq!(report.failed, 1);
        assert_eq!(*log.borrow(), vec![(1, 1, 640), (3, 1, 640)]);
    }

    #[test]
    fn reregistering_replaces_in_place() {
        let log: Log = Rc::default();
        let coord = ResizeCoordinator::new();
        coord.register(1, |_, _, _, _| Err(Box::new(Boom) as CallbackError));
        coord.register(2, recorder(Rc::clone(&log)));
        coord.register(1, recorder(Rc::clone(&log)));
        assert_eq!(coord.len(), 2);

        let report = coord
            .dispatch(&ViewportMetrics::new(100, 100, 1.0), &mut Tracer::none())
            .unwrap();
        assert_eq!(report.failed, 0);
        assert_eq!(*log.borrow(), vec![(1, 1, 100), (2, 1, 100)]);
    }

    #[test]
    fn unregister_unknown_key_is_a_no_op() {
        let coord: ResizeCoordinator<u32> = ResizeCoordinator::new();
        assert!(!coord.unregister(&7));
        assert!(coord.is_empty());
    }

    #[test]
    fn unregister_during_tick_skips_later_entries() {
        let log: Log = Rc::default();
        let coord = Rc::new(ResizeCoordinator::new());
        let weak = Rc::downgrade(&coord);
        {
            let log = Rc::clone(&log);
            coord.register(1, move |key, m, tick, _| {
                log.borrow_mut().push((*key, tick.get(), m.width));
                if let Some(coord) = weak.upgrade() {
                    // Remove ourselves and the entry after us.
                    coord.unregister(&1);
                    coord.unregister(&2);
                }
                Ok(())
            });
        }
        coord.register(2, recorder(Rc::clone(&log)));
        coord.register(3, recorder(Rc::clone(&log)));

        let report = coord
            .dispatch(&ViewportMetrics::new(300, 300, 1.0), &mut Tracer::none())
            .unwrap();
        assert_eq!(report.invoked, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(*log.borrow(), vec![(1, 1, 300), (3, 1, 300)]);
        assert!(!coord.contains(&1));
        assert!(coord.contains(&3));
    }

    #[test]
    fn reentrant_dispatch_runs_after_current_tick() {
        let log: Log = Rc::default();
        let coord = Rc::new(ResizeCoordinator::new());
        let weak = Rc::downgrade(&coord);
        {
            let log = Rc::clone(&log);
            coord.register(1, move |key, m, tick, tracer| {
                log.borrow_mut().push((*key, tick.get(), m.width));
                if tick == Tick(1)
                    && let Some(coord) = weak.upgrade()
                {
                    let queued = coord.dispatch(&ViewportMetrics::new(900, 600, 1.0), tracer);
                    assert!(queued.is_none(), "nested dispatch must be queued");
                }
                Ok(())
            });
        }
        coord.register(2, recorder(Rc::clone(&log)));

        let report = coord
            .dispatch(&ViewportMetrics::new(500, 600, 1.0), &mut Tracer::none())
            .unwrap();
        assert_eq!(report.tick, Tick(1));
        assert_eq!(coord.tick(), Tick(2));
        assert_eq!(
            *log.borrow(),
            vec![(1, 1, 500), (2, 1, 500), (1, 2, 900), (2, 2, 900)]
        );
    }

    #[test]
    fn ticks_increase_once_per_dispatch() {
        let coord: ResizeCoordinator<u32> = ResizeCoordinator::new();
        assert!(coord.tick().is_initial());
        let m = ViewportMetrics::new(1, 1, 1.0);
        coord.dispatch(&m, &mut Tracer::none());
        assert_eq!(coord.tick(), Tick(1));
        assert!(coord.tick().is_initial());
        coord.dispatch(&m, &mut Tracer::none());
        assert_eq!(coord.tick(), Tick(2));
        assert!(!coord.tick().is_initial());
    }

    #[test]
    fn dispose_all_drops_registrations() {
        let log: Log = Rc::default();
        let coord = ResizeCoordinator::new();
        coord.register(1, recorder(Rc::clone(&log)));
        coord.register(2, recorder(Rc::clone(&log)));
        coord.dispose_all();
        assert!(coord.is_empty());

        let report = coord
            .dispatch(&ViewportMetrics::new(10, 10, 1.0), &mut Tracer::none())
            .unwrap();
        assert_eq!(report.invoked, 0);
        assert!(log.borrow().is_empty());
    }
}

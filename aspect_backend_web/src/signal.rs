// Copyright 2026 the Aspect Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Resize signal source.
//!
//! [`ResizeSignal`] calls its callback once per coalesced viewport resize.
//! Three strategies are tried in order:
//!
//! 1. [`SignalMode::Observer`]: a `ResizeObserver` on the document root. The
//!    browser batches notifications itself (and fires once on observe, which
//!    becomes the initial tick). The root also resizes when content reflows;
//!    the runtime drops those signals when width and pixel ratio are
//!    unchanged.
//! 2. [`SignalMode::Debounced`]: the window `resize` event, coalesced by a
//!    [`Debouncer`] and a `setTimeout` timer.
//! 3. [`SignalMode::Unsupported`]: neither is available; the signal never
//!    fires and nothing is reported.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::{Cell, RefCell};

use aspect_core::debounce::{Debouncer, ResizeConfig};
use aspect_core::time::Duration;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{ResizeObserver, Window};

// Direct global bindings; the timer and clock are needed on every event.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = performance, js_name = "now")]
    pub(crate) fn performance_now() -> f64;

    #[wasm_bindgen(js_name = "setTimeout")]
    fn set_timeout(handler: &JsValue, timeout_ms: i32) -> i32;

    #[wasm_bindgen(js_name = "clearTimeout")]
    fn clear_timeout(id: i32);
}

/// How a [`ResizeSignal`] is receiving resizes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SignalMode {
    /// Not started, or stopped.
    #[default]
    Idle,
    /// Native `ResizeObserver` on the document root.
    Observer,
    /// Window `resize` events with a trailing debounce.
    Debounced,
    /// No resize source available; the signal stays silent.
    Unsupported,
}

type EventClosure = Closure<dyn FnMut(JsValue)>;
type TimerClosure = Closure<dyn FnMut()>;

/// Turns browser resize notifications into coalesced callbacks.
///
/// Create with [`ResizeSignal::new`], then call [`start`](Self::start).
/// Everything registered with the browser is released by
/// [`stop`](Self::stop) or on drop.
pub struct ResizeSignal {
    inner: Rc<SignalInner>,
}

struct SignalInner {
    /// The user-supplied callback, once per coalesced resize.
    callback: RefCell<Box<dyn FnMut()>>,

    mode: Cell<SignalMode>,

    observer: RefCell<Option<ResizeObserver>>,

    /// Handler for `ResizeObserver` entries or `resize` events.
    event_closure: RefCell<Option<EventClosure>>,

    /// `setTimeout` handler for the debounced mode.
    timer_closure: RefCell<Option<TimerClosure>>,

    debouncer: Cell<Debouncer>,

    /// Pending `setTimeout` id.
    timer_id: Cell<Option<i32>>,

    window: RefCell<Option<Window>>,
}

impl SignalInner {
    fn fire(&self) {
        self.callback.borrow_mut()();
    }

    /// Records a raw `resize` event and pushes the timer back.
    fn on_raw_resize(&self) {
        let now = crate::now();
        let mut debouncer = self.debouncer.get();
        debouncer.signal(now);
        self.debouncer.set(debouncer);
        if let Some(remaining) = debouncer.remaining(now) {
            self.arm_timer(remaining);
        }
    }

    /// Timer expiry: fires if the burst has been quiet long enough,
    /// re-arms otherwise.
    fn on_timer(&self) {
        self.timer_id.set(None);
        let now = crate::now();
        let mut debouncer = self.debouncer.get();
        let fired = debouncer.poll(now);
        self.debouncer.set(debouncer);
        if fired {
            self.fire();
        } else if let Some(remaining) = debouncer.remaining(now) {
            self.arm_timer(remaining);
        }
    }

    fn arm_timer(&self, delay: Duration) {
        if let Some(id) = self.timer_id.take() {
            clear_timeout(id);
        }
        if let Some(ref closure) = *self.timer_closure.borrow() {
            let ms = i32::try_from(delay.as_millis(crate::timebase())).unwrap_or(i32::MAX);
            let id = set_timeout(closure.as_ref().unchecked_ref(), ms.max(1));
            self.timer_id.set(Some(id));
        }
    }
}

impl ResizeSignal {
    /// Creates a signal that is **not yet started**.
    pub fn new(callback: impl FnMut() + 'static) -> Self {
        Self {
            inner: Rc::new(SignalInner {
                callback: RefCell::new(Box::new(callback)),
                mode: Cell::new(SignalMode::Idle),
                observer: RefCell::new(None),
                event_closure: RefCell::new(None),
                timer_closure: RefCell::new(None),
                debouncer: Cell::new(Debouncer::new(Duration::ZERO)),
                timer_id: Cell::new(None),
                window: RefCell::new(None),
            }),
        }
    }

    /// Starts listening and returns the strategy in use.
    ///
    /// If already started, returns the current mode.
    pub fn start(&self, config: &ResizeConfig) -> SignalMode {
        let current = self.inner.mode.get();
        if current != SignalMode::Idle {
            return current;
        }

        let mode = match web_sys::window() {
            None => SignalMode::Unsupported,
            Some(window) => {
                if config.prefer_observer && self.try_observe(&window) {
                    SignalMode::Observer
                } else if self.try_listen(&window, config) {
                    SignalMode::Debounced
                } else {
                    SignalMode::Unsupported
                }
            }
        };
        self.inner.mode.set(mode);
        mode
    }

    fn try_observe(&self, window: &Window) -> bool {
        let Some(root) = window.document().and_then(|doc| doc.document_element()) else {
            return false;
        };
        let inner = Rc::clone(&self.inner);
        let closure = Closure::wrap(Box::new(move |_entries: JsValue| {
            inner.fire();
        }) as Box<dyn FnMut(JsValue)>);

        // The constructor throws where `ResizeObserver` is not defined.
        let Ok(observer) = ResizeObserver::new(closure.as_ref().unchecked_ref()) else {
            return false;
        };
        observer.observe(&root);
        *self.inner.observer.borrow_mut() = Some(observer);
        *self.inner.event_closure.borrow_mut() = Some(closure);
        true
    }

    fn try_listen(&self, window: &Window, config: &ResizeConfig) -> bool {
        self.inner.debouncer.set(Debouncer::from_config(config));

        let inner = Rc::clone(&self.inner);
        let timer = Closure::wrap(Box::new(move || {
            inner.on_timer();
        }) as Box<dyn FnMut()>);

        let inner = Rc::clone(&self.inner);
        let listener = Closure::wrap(Box::new(move |_event: JsValue| {
            inner.on_raw_resize();
        }) as Box<dyn FnMut(JsValue)>);

        if window
            .add_event_listener_with_callback("resize", listener.as_ref().unchecked_ref())
            .is_err()
        {
            return false;
        }
        *self.inner.timer_closure.borrow_mut() = Some(timer);
        *self.inner.event_closure.borrow_mut() = Some(listener);
        *self.inner.window.borrow_mut() = Some(window.clone());
        true
    }

    /// Stops listening and releases every browser registration.
    ///
    /// Can be restarted by calling [`start`](Self::start) again.
    pub fn stop(&self) {
        if let Some(observer) = self.inner.observer.borrow_mut().take() {
            observer.disconnect();
        }
        if let Some(id) = self.inner.timer_id.take() {
            clear_timeout(id);
        }
        let closure = self.inner.event_closure.borrow_mut().take();
        if let (Some(window), Some(closure)) = (self.inner.window.borrow_mut().take(), &closure) {
            let _ = window
                .remove_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        }
        self.inner.timer_closure.borrow_mut().take();
        let mut debouncer = self.inner.debouncer.get();
        debouncer.cancel();
        self.inner.debouncer.set(debouncer);
        self.inner.mode.set(SignalMode::Idle);
    }

    /// The strategy currently in use.
    #[must_use]
    pub fn mode(&self) -> SignalMode {
        self.inner.mode.get()
    }
}

impl Drop for ResizeSignal {
    fn drop(&mut self) {
        // Breaks the closure → inner reference cycles.
        self.stop();
    }
}

impl core::fmt::Debug for ResizeSignal {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ResizeSignal")
            .field("mode", &self.inner.mode.get())
            .field("timer_pending", &self.inner.timer_id.get().is_some())
            .finish_non_exhaustive()
    }
}

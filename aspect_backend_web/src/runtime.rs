// Copyright 2026 the Aspect Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The wired-up browser runtime.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::RefCell;

use aspect_core::coordinator::TickReport;
use aspect_core::debounce::ResizeConfig;
use aspect_core::element::ElementId;
use aspect_core::ratio::{RatioConfig, RatioError};
use aspect_core::runtime::RatioRuntime;
use aspect_core::trace::TraceSink;
use wasm_bindgen::JsValue;
use web_sys::HtmlElement;

use crate::attrs::{GroupNames, MountAttrs};
use crate::host::DomRatioHost;
use crate::signal::{ResizeSignal, SignalMode};
use crate::viewport::WindowViewport;

/// Ratio containers kept in sync with the browser viewport.
///
/// One instance owns a [`RatioRuntime`] over the DOM and the resize signal.
/// Every resize that changes the viewport width or pixel ratio becomes one
/// coordinator tick that re-resolves every mounted container. Containers
/// removed from the document are dropped after the next tick.
///
/// ```ignore
/// let ratios = WebRatios::new(ResizeConfig::web(), RatioConfig::DEFAULT)?;
/// let id = ratios.mount(container)?;
/// // ...
/// ratios.unmount(id)?;
/// ```
pub struct WebRatios {
    runtime: Rc<RatioRuntime<DomRatioHost, WindowViewport>>,
    groups: RefCell<GroupNames>,
    signal: ResizeSignal,
}

impl WebRatios {
    /// Creates the runtime and starts listening for resizes.
    ///
    /// # Errors
    ///
    /// Returns an error when there is no global `window`.
    pub fn new(resize: ResizeConfig, ratios: RatioConfig) -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;
        let runtime = Rc::new(RatioRuntime::new(
            DomRatioHost::new(),
            WindowViewport::new(window),
            ratios,
        ));

        let tick_runtime = Rc::clone(&runtime);
        let signal = ResizeSignal::new(move || {
            tick_runtime.on_resize();
        });
        signal.start(&resize);
        Ok(Self {
            runtime,
            groups: RefCell::new(GroupNames::new()),
            signal,
        })
    }

    /// Installs a trace sink for every subsequent tick and mount.
    pub fn set_trace_sink(&self, sink: impl TraceSink + 'static) {
        self.runtime.set_trace_sink(sink);
    }

    /// Removes and returns the installed trace sink.
    pub fn take_trace_sink(&self) -> Option<Box<dyn TraceSink>> {
        self.runtime.take_trace_sink()
    }

    /// How resizes are being received.
    #[must_use]
    pub fn mode(&self) -> SignalMode {
        self.signal.mode()
    }

    /// Mounts a container described by its `data-b-*` attributes and paints
    /// it once against the current viewport.
    ///
    /// # Errors
    ///
    /// Returns [`RatioError::Busy`] when called from inside a tick.
    pub fn mount(&self, el: HtmlElement) -> Result<ElementId, RatioError> {
        let attrs = MountAttrs::read(&el);
        let spec = {
            let mut groups = self.groups.try_borrow_mut().map_err(|_| RatioError::Busy)?;
            self.runtime.with_tracer(|tracer| attrs.to_spec(&mut groups, tracer))
        };
        self.runtime.mount(spec, |host, id| host.attach(id, el))
    }

    /// Unregisters and forgets a container, returning its element.
    /// Inline styles already written are left in place.
    ///
    /// # Errors
    ///
    /// Returns [`RatioError::Busy`] when called from inside a tick.
    pub fn unmount(&self, id: ElementId) -> Result<Option<HtmlElement>, RatioError> {
        let el = self
            .runtime
            .host()
            .try_borrow()
            .map_err(|_| RatioError::Busy)?
            .element(id)
            .cloned();
        self.runtime.unmount(id)?;
        Ok(el)
    }

    /// Runs a tick now, as if the viewport had been resized.
    pub fn refresh(&self) -> Option<TickReport> {
        self.runtime.refresh()
    }

    /// The report of the most recent completed tick.
    #[must_use]
    pub fn last_report(&self) -> Option<TickReport> {
        self.runtime.last_report()
    }

    /// Callbacks that returned an error, summed over every tick.
    #[must_use]
    pub fn failed_callbacks(&self) -> u64 {
        self.runtime.failed_callbacks()
    }

    /// Number of mounted containers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.runtime.len()
    }

    /// Returns `true` if nothing is mounted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runtime.is_empty()
    }

    /// Stops the resize signal and forgets every container.
    pub fn dispose(&self) {
        self.signal.stop();
        self.runtime.dispose();
    }
}

impl core::fmt::Debug for WebRatios {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WebRatios")
            .field("mode", &self.signal.mode())
            .field("runtime", &self.runtime)
            .finish_non_exhaustive()
    }
}

// Copyright 2026 the Aspect Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Window metrics.

use aspect_core::viewport::ViewportSource;
use web_sys::{Element, Window};

/// Reads viewport metrics from a browser window.
///
/// Every reading goes straight to the DOM; the coordinator captures them
/// once per tick.
pub struct WindowViewport {
    window: Window,
}

impl core::fmt::Debug for WindowViewport {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WindowViewport").finish_non_exhaustive()
    }
}

impl WindowViewport {
    /// Wraps `window`.
    #[must_use]
    pub fn new(window: Window) -> Self {
        Self { window }
    }

    /// Returns the wrapped window.
    #[must_use]
    pub fn window(&self) -> &Window {
        &self.window
    }

    fn root(&self) -> Option<Element> {
        self.window.document()?.document_element()
    }
}

impl ViewportSource for WindowViewport {
    fn inner_width(&self) -> Option<f64> {
        self.window.inner_width().ok()?.as_f64()
    }

    fn client_width(&self) -> Option<f64> {
        self.root().map(|el| f64::from(el.client_width()))
    }

    fn screen_width(&self) -> Option<f64> {
        let width = self.window.screen().ok()?.width().ok()?;
        Some(f64::from(width))
    }

    fn inner_height(&self) -> Option<f64> {
        self.window.inner_height().ok()?.as_f64()
    }

    fn client_height(&self) -> Option<f64> {
        self.root().map(|el| f64::from(el.client_height()))
    }

    fn screen_height(&self) -> Option<f64> {
        let height = self.window.screen().ok()?.height().ok()?;
        Some(f64::from(height))
    }

    fn device_pixel_ratio(&self) -> Option<f64> {
        Some(self.window.device_pixel_ratio())
    }
}

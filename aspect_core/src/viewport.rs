// Copyright 2026 the Aspect Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Viewport metrics.
//!
//! A [`ViewportSource`] exposes raw host readings, each of which may be
//! unavailable. The free functions [`window_width`], [`pixel_ratio`], and
//! [`window_size`] apply the fallback chains:
//!
//! - width: inner width → document root client width → screen width → `0`
//! - height: inner height → document root client height → screen height → `0`
//! - pixel ratio: device pixel ratio → `1.0`
//!
//! A reading that is missing, non-finite, or not positive counts as
//! unavailable. A width of `0` only happens when every source is missing,
//! which callers should treat as a headless or test environment.
//!
//! [`ViewportMetrics::capture`] reads all of them once and freezes the result.

use core::cell::Cell;

use kurbo::Size;

/// Raw viewport readings from the host environment.
///
/// Every method defaults to `None`, so a host only implements what it has.
pub trait ViewportSource {
    /// The window's inner width (`window.innerWidth`).
    fn inner_width(&self) -> Option<f64> {
        None
    }

    /// The document root's client width
    /// (`document.documentElement.clientWidth`).
    fn client_width(&self) -> Option<f64> {
        None
    }

    /// The screen width (`screen.width`).
    fn screen_width(&self) -> Option<f64> {
        None
    }

    /// The window's inner height.
    fn inner_height(&self) -> Option<f64> {
        None
    }

    /// The document root's client height.
    fn client_height(&self) -> Option<f64> {
        None
    }

    /// The screen height.
    fn screen_height(&self) -> Option<f64> {
        None
    }

    /// The device pixel ratio (`window.devicePixelRatio`).
    fn device_pixel_ratio(&self) -> Option<f64> {
        None
    }
}

fn usable(reading: Option<f64>) -> Option<f64> {
    reading.filter(|v| v.is_finite() && *v > 0.0)
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "readings are positive CSS pixel counts; saturating float-to-int cast is intended"
)]
fn to_px(reading: f64) -> u32 {
    reading as u32
}

/// Returns the effective viewport width in CSS pixels.
#[must_use]
pub fn window_width(source: &dyn ViewportSource) -> u32 {
    usable(source.inner_width())
        .or_else(|| usable(source.client_width()))
        .or_else(|| usable(source.screen_width()))
        .map_or(0, to_px)
}

/// Returns the effective viewport height in CSS pixels.
#[must_use]
pub fn window_height(source: &dyn ViewportSource) -> u32 {
    usable(source.inner_height())
        .or_else(|| usable(source.client_height()))
        .or_else(|| usable(source.screen_height()))
        .map_or(0, to_px)
}

/// Returns the device pixel ratio, defaulting to `1.0`.
#[must_use]
pub fn pixel_ratio(source: &dyn ViewportSource) -> f64 {
    usable(source.device_pixel_ratio()).unwrap_or(1.0)
}

/// Returns both viewport dimensions.
#[must_use]
pub fn window_size(source: &dyn ViewportSource) -> WindowSize {
    WindowSize {
        width: window_width(source),
        height: window_height(source),
    }
}

/// Viewport dimensions in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct WindowSize {
    /// Width in CSS pixels.
    pub width: u32,
    /// Height in CSS pixels.
    pub height: u32,
}

impl WindowSize {
    /// Returns the dimensions as a [`kurbo::Size`].
    #[must_use]
    pub fn to_size(self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }
}

/// One frozen reading of the viewport, shared by every callback in a tick.
///
/// Constructed fresh for each tick and never mutated afterwards; consumers
/// only ever see it through a shared reference.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportMetrics {
    /// Viewport width in CSS pixels.
    pub width: u32,
    /// Viewport height in CSS pixels.
    pub height: u32,
    /// Device pixel ratio (always positive).
    pub device_pixel_ratio: f64,
}

impl ViewportMetrics {
    /// Creates metrics from explicit values.
    ///
    /// A non-finite or non-positive `device_pixel_ratio` is replaced by `1.0`.
    #[must_use]
    pub fn new(width: u32, height: u32, device_pixel_ratio: f64) -> Self {
        Self {
            width,
            height,
            device_pixel_ratio: usable(Some(device_pixel_ratio)).unwrap_or(1.0),
        }
    }

    /// Reads every metric from `source` exactly once.
    #[must_use]
    pub fn capture(source: &dyn ViewportSource) -> Self {
        let size = window_size(source);
        Self {
            width: size.width,
            height: size.height,
            device_pixel_ratio: pixel_ratio(source),
        }
    }

    /// Returns whether resolving against `other` gives the same result as
    /// against `self`. Only width and pixel ratio take part in resolution,
    /// so a height-only change (content reflow) compares equal.
    #[must_use]
    pub fn resolves_like(&self, other: &Self) -> bool {
        self.width == other.width && self.device_pixel_ratio == other.device_pixel_ratio
    }

    /// Returns the viewport dimensions.
    #[must_use]
    pub fn size(&self) -> WindowSize {
        WindowSize {
            width: self.width,
            height: self.height,
        }
    }
}

/// A [`ViewportSource`] with settable readings, for tests and simulations.
///
/// Readings live in [`Cell`]s so a fixture shared by reference can be
/// changed while callbacks are running.
#[derive(Debug, Default)]
pub struct FixedViewport {
    /// Inner width reading.
    pub inner_width: Cell<Option<f64>>,
    /// Client width reading.
    pub client_width: Cell<Option<f64>>,
    /// Screen width reading.
    pub screen_width: Cell<Option<f64>>,
    /// Inner height reading.
    pub inner_height: Cell<Option<f64>>,
    /// Device pixel ratio reading.
    pub device_pixel_ratio: Cell<Option<f64>>,
}

impl FixedViewport {
    /// Creates a source reporting the given inner size and pixel ratio.
    #[must_use]
    pub fn new(width: f64, height: f64, device_pixel_ratio: f64) -> Self {
        Self {
            inner_width: Cell::new(Some(width)),
            inner_height: Cell::new(Some(height)),
            device_pixel_ratio: Cell::new(Some(device_pixel_ratio)),
            ..Self::default()
        }
    }

    /// Changes the reported inner width.
    pub fn set_width(&self, width: f64) {
        self.inner_width.set(Some(width));
    }

    /// Changes the reported pixel ratio.
    pub fn set_pixel_ratio(&self, ratio: f64) {
        self.device_pixel_ratio.set(Some(ratio));
    }
}

impl ViewportSource for FixedViewport {
    fn inner_width(&self) -> Option<f64> {
        self.inner_width.get()
    }

    fn client_width(&self) -> Option<f64> {
        self.client_width.get()
    }

    fn screen_width(&self) -> Option<f64> {
        self.screen_width.get()
    }

    fn inner_height(&self) -> Option<f64> {
        self.inner_height.get()
    }

    fn device_pixel_ratio(&self) -> Option<f64> {
        self.device_pixel_ratio.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_prefers_inner_then_client_then_screen() {
        let src = FixedViewport::default();
        src.screen_width.set(Some(1920.0));
        assert_eq!(window_width(&src), 1920);

        src.client_width.set(Some(1280.0));
        assert_eq!(window_width(&src), 1280);

        src.inner_width.set(Some(1300.0));
        assert_eq!(window_width(&src), 1300);
    }

    #[test]
    fn unusable_readings_fall_through() {
        let src = FixedViewport::default();
        src.inner_width.set(Some(0.0));
        src.client_width.set(Some(f64::NAN));
        src.screen_width.set(Some(800.0));
        assert_eq!(window_width(&src), 800);
    }

    #[test]
    fn everything_missing_is_degenerate() {
        let src = FixedViewport::default();
        assert_eq!(window_width(&src), 0);
        assert_eq!(window_size(&src), WindowSize::default());
        assert_eq!(pixel_ratio(&src), 1.0);
    }

    #[test]
    fn capture_reads_all_metrics() {
        let src = FixedViewport::new(1024.0, 768.0, 2.0);
        let m = ViewportMetrics::capture(&src);
        assert_eq!(m.width, 1024);
        assert_eq!(m.height, 768);
        assert_eq!(m.device_pixel_ratio, 2.0);
        assert_eq!(m.size().to_size(), Size::new(1024.0, 768.0));
    }

    #[test]
    fn height_only_change_resolves_alike() {
        let base = ViewportMetrics::new(1024, 768, 2.0);
        assert!(base.resolves_like(&ViewportMetrics::new(1024, 4000, 2.0)));
        assert!(!base.resolves_like(&ViewportMetrics::new(1023, 768, 2.0)));
        assert!(!base.resolves_like(&ViewportMetrics::new(1024, 768, 1.0)));
    }

    #[test]
    fn bad_pixel_ratio_defaults_to_one() {
        assert_eq!(ViewportMetrics::new(10, 10, 0.0).device_pixel_ratio, 1.0);
        assert_eq!(ViewportMetrics::new(10, 10, -2.0).device_pixel_ratio, 1.0);
        assert_eq!(
            ViewportMetrics::new(10, 10, f64::INFINITY).device_pixel_ratio,
            1.0
        );
    }
}

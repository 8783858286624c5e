// Copyright 2026 the Aspect Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Breakpoint resolution.
//!
//! [`resolve`] picks the one value of a [`BreakpointDataset`] that applies to
//! a viewport. Two comparison modes exist:
//!
//! - **Mobile-first**: a breakpoint applies *from* its width upward. The
//!   reference width is the plain viewport width, and the largest breakpoint
//!   at or below it wins.
//! - **Desktop-first**: a breakpoint applies *up to* its width. The reference
//!   width is the viewport width times the device pixel ratio (a high-DPI
//!   screen needs the value meant for a wider viewport), and the smallest
//!   breakpoint at or above it wins.
//!
//! Both comparisons are inclusive. When nothing matches, the largest
//! breakpoint is used if the reference width reached it, otherwise the
//! smallest. An empty dataset resolves to `None`.

use crate::dataset::BreakpointDataset;
use crate::viewport::ViewportMetrics;

/// What to resolve a dataset against.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolveQuery {
    /// Viewport width in CSS pixels.
    pub width: u32,
    /// Mobile-first (`true`) or desktop-first (`false`) comparison.
    pub mobile_first: bool,
    /// Device pixel ratio, only consulted in desktop-first mode.
    pub pixel_ratio: f64,
}

impl ResolveQuery {
    /// A mobile-first query at `width`.
    #[must_use]
    pub const fn mobile_first(width: u32) -> Self {
        Self {
            width,
            mobile_first: true,
            pixel_ratio: 1.0,
        }
    }

    /// A desktop-first query at `width` on a screen with `pixel_ratio`.
    #[must_use]
    pub const fn desktop_first(width: u32, pixel_ratio: f64) -> Self {
        Self {
            width,
            mobile_first: false,
            pixel_ratio,
        }
    }

    /// Builds a query from a tick's metrics.
    #[must_use]
    pub const fn from_metrics(metrics: &ViewportMetrics, mobile_first: bool) -> Self {
        Self {
            width: metrics.width,
            mobile_first,
            pixel_ratio: metrics.device_pixel_ratio,
        }
    }

    /// The width breakpoints are compared against.
    #[must_use]
    pub fn reference_width(&self) -> f64 {
        let width = f64::from(self.width);
        if self.mobile_first {
            width
        } else if self.pixel_ratio.is_finite() && self.pixel_ratio > 0.0 {
            width * self.pixel_ratio
        } else {
            width
        }
    }
}

/// Resolves the value that applies to `query`.
///
/// Returns `None` only for an empty dataset. For any non-empty dataset the
/// result is one of its values.
#[must_use]
pub fn resolve<'a, V>(dataset: &'a BreakpointDataset<V>, query: &ResolveQuery) -> Option<&'a V> {
    let (_, smallest) = dataset.first()?;
    let (largest_width, largest) = dataset.last()?;
    let reference = query.reference_width();

    let matched = if query.mobile_first {
        dataset
            .iter()
            .rev()
            .find(|(width, _)| f64::from(*width) <= reference)
    } else {
        dataset
            .iter()
            .find(|(width, _)| f64::from(*width) >= reference)
    };

    if let Some((_, value)) = matched {
        return Some(value);
    }
    if reference >= f64::from(largest_width) {
        Some(largest)
    } else {
        Some(smallest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Ratio, RatioDataset};

    fn ab() -> BreakpointDataset<&'static str> {
        [(100, "a"), (200, "b")].into_iter().collect()
    }

    fn ratios() -> RatioDataset {
        RatioDataset::parse_json(r#"{"320": 56.25, "768": 42.5, "1200": 33.3}"#).unwrap()
    }

    #[test]
    fn boundary_is_inclusive() {
        assert_eq!(resolve(&ab(), &ResolveQuery::mobile_first(200)), Some(&"b"));
        assert_eq!(resolve(&ab(), &ResolveQuery::mobile_first(100)), Some(&"a"));
        assert_eq!(resolve(&ab(), &ResolveQuery::desktop_first(100, 1.0)), Some(&"a"));
        assert_eq!(resolve(&ab(), &ResolveQuery::desktop_first(200, 1.0)), Some(&"b"));
    }

    #[test]
    fn mobile_and_desktop_first_disagree_between_breakpoints() {
        assert_eq!(resolve(&ab(), &ResolveQuery::mobile_first(150)), Some(&"a"));
        assert_eq!(resolve(&ab(), &ResolveQuery::desktop_first(150, 1.0)), Some(&"b"));
    }

    #[test]
    fn single_entry_always_wins() {
        let ds: BreakpointDataset<&str> = [(50, "x")].into_iter().collect();
        for width in [0, 50, 10_000] {
            assert_eq!(resolve(&ds, &ResolveQuery::mobile_first(width)), Some(&"x"));
            assert_eq!(
                resolve(&ds, &ResolveQuery::desktop_first(width, 2.0)),
                Some(&"x")
            );
        }
    }

    #[test]
    fn empty_dataset_resolves_to_none() {
        let ds = BreakpointDataset::<u8>::new();
        assert_eq!(resolve(&ds, &ResolveQuery::mobile_first(800)), None);
        assert_eq!(resolve(&ds, &ResolveQuery::desktop_first(800, 1.0)), None);
    }

    #[test]
    fn mobile_first_picks_largest_at_or_below() {
        let ds = ratios();
        let got = resolve(&ds, &ResolveQuery::mobile_first(800));
        assert_eq!(got.copied(), Ratio::new(42.5));
    }

    #[test]
    fn desktop_first_beyond_largest_falls_back_to_largest() {
        // 800 × 2 = 1600 exceeds every breakpoint.
        let metrics = ViewportMetrics::new(800, 600, 2.0);
        let ds = ratios();
        let got = resolve(&ds, &ResolveQuery::from_metrics(&metrics, false));
        assert_eq!(got.copied(), Ratio::new(33.3));
    }

    #[test]
    fn desktop_first_applies_pixel_ratio() {
        // 500 × 1 = 500 → 768; 500 × 2 = 1000 → 1200.
        assert_eq!(
            resolve(&ratios(), &ResolveQuery::desktop_first(500, 1.0)).copied(),
            Ratio::new(42.5)
        );
        assert_eq!(
            resolve(&ratios(), &ResolveQuery::desktop_first(500, 2.0)).copied(),
            Ratio::new(33.3)
        );
    }

    #[test]
    fn mobile_first_below_smallest_falls_back_to_smallest() {
        assert_eq!(
            resolve(&ratios(), &ResolveQuery::mobile_first(200)).copied(),
            Ratio::new(56.25)
        );
    }

    #[test]
    fn mobile_first_ignores_pixel_ratio() {
        let query = ResolveQuery {
            width: 800,
            mobile_first: true,
            pixel_ratio: 3.0,
        };
        assert_eq!(query.reference_width(), 800.0);
    }

    #[test]
    fn unusable_pixel_ratio_is_treated_as_one() {
        assert_eq!(ResolveQuery::desktop_first(640, 0.0).reference_width(), 640.0);
        assert_eq!(
            ResolveQuery::desktop_first(640, f64::NAN).reference_width(),
            640.0
        );
    }
}
